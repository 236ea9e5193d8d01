// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod runtime;

use anyhow::{Context, Result, anyhow};
use config::Config;
use levellist_app::SessionOptions;
use levellist_db::Store;
use runtime::{Backend, CellEdit, HostRuntime, Plan};
use std::env;
use std::io;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

fn main() {
    init_logging();
    if let Err(error) = run() {
        eprintln!("{error:#}");
        std::process::exit(1);
    }
}

fn init_logging() {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(io::stderr)
        .init();
}

fn run() -> Result<()> {
    let options = parse_cli_args(env::args().skip(1), Config::default_path()?)?;
    if options.show_help {
        print_help();
        return Ok(());
    }

    if options.print_config_path {
        println!("{}", options.config_path.display());
        return Ok(());
    }

    if options.print_example {
        print!("{}", Config::example_config(&options.config_path));
        return Ok(());
    }

    let config = Config::load(&options.config_path).with_context(|| {
        format!(
            "load config {}; run `levellist --print-example-config` to generate a v1 template",
            options.config_path.display()
        )
    })?;

    let db_path = config.db_path()?;
    if options.print_db_path {
        println!("{}", db_path.display());
        return Ok(());
    }

    let mut backend = Backend::from_source(&config.source()?)?;
    let namespace = config.namespace(&backend.identity())?;

    let store = Store::open(&db_path).with_context(|| {
        format!(
            "open database {} -- if this path is wrong, set [storage].db_path or LEVELLIST_DB_PATH",
            db_path.display()
        )
    })?;
    store.bootstrap()?;

    if options.check_only {
        let dataset = backend.load().context("check dataset source")?;
        info!(
            source = %backend.identity(),
            %namespace,
            headers = dataset.headers.len(),
            rows = dataset.rows.len(),
            "check passed"
        );
        return Ok(());
    }

    let session_options = SessionOptions {
        layout: config.layout()?,
        hide_completed: options.hide_done || config.hide_done(),
    };
    let plan = Plan {
        reset: options.reset,
        edits: options.edits,
        add_rows: options.add_rows,
        save: options.save,
        export: options.export.then(|| {
            options
                .export_path
                .unwrap_or_else(|| PathBuf::from(config.export_file_name()))
        }),
    };

    let mut runtime = HostRuntime::new(backend, store.snapshots(namespace), session_options);
    let mut out = io::stdout().lock();
    runtime.run(&plan, &mut out)?;
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    print_config_path: bool,
    print_db_path: bool,
    print_example: bool,
    check_only: bool,
    show_help: bool,
    edits: Vec<CellEdit>,
    add_rows: usize,
    hide_done: bool,
    save: bool,
    export: bool,
    export_path: Option<PathBuf>,
    reset: bool,
}

fn parse_cli_args<I, S>(args: I, default_config_path: PathBuf) -> Result<CliOptions>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut options = CliOptions {
        config_path: default_config_path,
        print_config_path: false,
        print_db_path: false,
        print_example: false,
        check_only: false,
        show_help: false,
        edits: Vec::new(),
        add_rows: 0,
        hide_done: false,
        save: false,
        export: false,
        export_path: None,
        reset: false,
    };

    let mut iter = args.into_iter().peekable();
    while let Some(arg) = iter.next() {
        match arg.as_ref() {
            "--config" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--config requires a file path"))?;
                options.config_path = PathBuf::from(value.as_ref());
            }
            "--print-config-path" => {
                options.print_config_path = true;
            }
            "--print-path" => {
                options.print_db_path = true;
            }
            "--print-example-config" => {
                options.print_example = true;
            }
            "--check" => {
                options.check_only = true;
            }
            "--set" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--set requires ROW:KEY=VALUE"))?;
                options.edits.push(CellEdit::parse(value.as_ref())?);
            }
            "--add-row" => {
                options.add_rows += 1;
            }
            "--hide-done" => {
                options.hide_done = true;
            }
            "--save" => {
                options.save = true;
            }
            "--export" => {
                options.export = true;
                if let Some(next) = iter.peek()
                    && !next.as_ref().starts_with('-')
                {
                    options.export_path = iter.next().map(|path| PathBuf::from(path.as_ref()));
                }
            }
            "--reset" => {
                options.reset = true;
            }
            "--help" | "-h" => {
                options.show_help = true;
            }
            unknown => {
                return Err(anyhow!(
                    "unknown argument {unknown:?}; run with --help to see supported options"
                ));
            }
        }
    }

    Ok(options)
}

fn print_help() {
    println!("levellist");
    println!("  --config <path>          Use a specific config path");
    println!("  --print-config-path      Print resolved config path");
    println!("  --print-path             Print resolved database path");
    println!("  --print-example-config   Print a v1 config template");
    println!("  --check                  Validate config + DB + dataset source");
    println!("  --set ROW:KEY=VALUE      Edit one cell (repeatable)");
    println!("  --add-row                Append an empty row (repeatable)");
    println!("  --hide-done              Hide rows with a 済 status");
    println!("  --save                   Save to the shared endpoint, keeping a local copy");
    println!("  --export [path]          Write the table as CSV (default [export].file_name)");
    println!("  --reset                  Drop the local snapshot and reload the source");
    println!("  --help                   Show this help");
}
