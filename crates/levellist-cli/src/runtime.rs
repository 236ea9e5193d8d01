// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::config::SourceKind;
use anyhow::{Context, Result, anyhow};
use levellist_app::csv::EXPORT_MIME_TYPE;
use levellist_app::{
    Dataset, DatasetSource, RemoteStore, SaveOutcome, Session, SessionOptions, SnapshotStore,
    TableCommand,
};
use levellist_db::StaticFileSource;
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use tracing::info;

/// Dataset backend selected by `[source]`. A remote endpoint is both the
/// dataset source and the remote store; a static file only loads.
pub enum Backend {
    File(StaticFileSource),
    Remote(levellist_remote::Client),
}

impl Backend {
    pub fn from_source(source: &SourceKind) -> Result<Self> {
        match source {
            SourceKind::File(path) => Ok(Self::File(StaticFileSource::new(path))),
            SourceKind::Remote { url, timeout } => Ok(Self::Remote(
                levellist_remote::Client::new(url, *timeout)
                    .with_context(|| format!("invalid [source].url {url:?}"))?,
            )),
        }
    }

    pub fn identity(&self) -> String {
        self.source_ref().identity()
    }

    pub fn load(&mut self) -> Result<Dataset> {
        self.source().load()
    }

    fn source_ref(&self) -> &dyn DatasetSource {
        match self {
            Self::File(source) => source,
            Self::Remote(client) => client,
        }
    }

    fn source(&mut self) -> &mut dyn DatasetSource {
        match self {
            Self::File(source) => source,
            Self::Remote(client) => client,
        }
    }

    fn remote(&mut self) -> Option<&mut dyn RemoteStore> {
        match self {
            Self::File(_) => None,
            Self::Remote(client) => Some(client),
        }
    }
}

/// One `--set ROW:KEY=VALUE` edit. Rows are numbered as printed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellEdit {
    pub row: usize,
    pub key: String,
    pub value: String,
}

impl CellEdit {
    pub fn parse(raw: &str) -> Result<Self> {
        let usage = || anyhow!("invalid edit {raw:?}; expected ROW:KEY=VALUE (for example 0:B=済)");
        let (row, rest) = raw.split_once(':').ok_or_else(usage)?;
        let (key, value) = rest.split_once('=').ok_or_else(usage)?;
        let row = row
            .trim()
            .parse::<usize>()
            .with_context(|| format!("invalid row number in edit {raw:?}"))?;
        if key.is_empty() {
            return Err(usage());
        }
        Ok(Self {
            row,
            key: key.to_owned(),
            value: value.to_owned(),
        })
    }
}

impl fmt::Display for CellEdit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}={}", self.row, self.key, self.value)
    }
}

/// What one invocation does after the session starts, in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Plan {
    pub reset: bool,
    pub edits: Vec<CellEdit>,
    pub add_rows: usize,
    pub save: bool,
    pub export: Option<PathBuf>,
}

pub struct HostRuntime<S> {
    backend: Backend,
    local: S,
    options: SessionOptions,
}

impl<S: SnapshotStore> HostRuntime<S> {
    pub fn new(backend: Backend, local: S, options: SessionOptions) -> Self {
        Self {
            backend,
            local,
            options,
        }
    }

    pub fn run(&mut self, plan: &Plan, out: &mut dyn Write) -> Result<Session> {
        let mut session = if plan.reset {
            Session::reset(self.backend.source(), &mut self.local, self.options)?
        } else {
            Session::start(self.backend.source(), &mut self.local, self.options)?
        };

        for edit in &plan.edits {
            session
                .dispatch(TableCommand::SetCell {
                    row: edit.row,
                    key: edit.key.clone(),
                    value: edit.value.clone(),
                })
                .with_context(|| format!("apply --set {edit}"))?;
        }
        for _ in 0..plan.add_rows {
            session.dispatch(TableCommand::AddRow)?;
        }

        render_rows(&session, out)?;

        if plan.save {
            let outcome = session.save(&mut self.local, self.backend.remote())?;
            writeln!(out, "{}", describe_outcome(&outcome)).context("write save report")?;
        }

        if let Some(path) = &plan.export {
            fs::write(path, session.export_csv())
                .with_context(|| format!("write CSV export {}", path.display()))?;
            info!(
                path = %path.display(),
                rows = session.table().row_count(),
                mime = EXPORT_MIME_TYPE,
                "exported CSV"
            );
            writeln!(
                out,
                "exported {} rows to {} ({EXPORT_MIME_TYPE})",
                session.table().row_count(),
                path.display()
            )
            .context("write export report")?;
        }

        Ok(session)
    }
}

/// Tab-separated listing of the visible rows, numbered by table position.
pub fn render_rows(session: &Session, out: &mut dyn Write) -> Result<()> {
    let table = session.table();
    let labels: Vec<&str> = table
        .columns()
        .iter()
        .map(|column| column.label.as_str())
        .collect();
    writeln!(out, "#\t{}", labels.join("\t")).context("write table header")?;

    let visible = table.visible_rows();
    for &row in &visible {
        let cells: Vec<&str> = (0..labels.len())
            .map(|column| table.cell(row, column).unwrap_or(""))
            .collect();
        writeln!(out, "{row}\t{}", cells.join("\t")).context("write table row")?;
    }

    let hidden = table.row_count() - visible.len();
    if hidden > 0 {
        writeln!(out, "({hidden} completed rows hidden)").context("write table footer")?;
    }
    Ok(())
}

pub fn describe_outcome(outcome: &SaveOutcome) -> String {
    match outcome {
        SaveOutcome::Remote => "サーバーに保存しました（全員で共有）".to_owned(),
        SaveOutcome::RemoteWithoutBackup { message } => {
            format!("サーバーに保存しました（全員で共有）\nlocal backup failed: {message}")
        }
        SaveOutcome::LocalFallback { message } => {
            format!("サーバー保存に失敗しました。ローカルに退避しました。\n{message}")
        }
        SaveOutcome::LocalOnly => "ローカルに保存しました".to_owned(),
    }
}
