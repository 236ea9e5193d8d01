// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use levellist_app::csv::EXPORT_FILE_NAME;
use levellist_app::{LayoutPolicy, Namespace};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const CONFIG_VERSION: i64 = 1;
const DEFAULT_TIMEOUT: &str = "10s";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub version: i64,
    #[serde(default)]
    pub source: Source,
    #[serde(default)]
    pub storage: Storage,
    #[serde(default)]
    pub table: Table,
    #[serde(default)]
    pub export: Export,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            source: Source::default(),
            storage: Storage::default(),
            table: Table::default(),
            export: Export::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Source {
    pub url: Option<String>,
    pub path: Option<String>,
    pub timeout: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Storage {
    pub db_path: Option<String>,
    pub namespace: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Table {
    pub layout: Option<String>,
    pub hide_done: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Export {
    pub file_name: Option<String>,
}

/// Where the dataset comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceKind {
    /// Shared endpoint: read with GET, saved with POST.
    Remote { url: String, timeout: Duration },
    /// Static JSON file; saves stay local.
    File(PathBuf),
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = env::var_os("LEVELLIST_CONFIG_PATH") {
            return Ok(PathBuf::from(path));
        }

        let config_root = dirs::config_dir().ok_or_else(|| {
            anyhow!(
                "cannot resolve config directory; set LEVELLIST_CONFIG_PATH to the config file"
            )
        })?;

        let app_dir = config_root.join(levellist_db::APP_NAME);
        fs::create_dir_all(&app_dir)
            .with_context(|| format!("create config directory {}", app_dir.display()))?;
        Ok(app_dir.join("config.toml"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        let value: toml::Value = toml::from_str(&raw)
            .with_context(|| format!("parse TOML config {}", path.display()))?;

        let version = value
            .get("version")
            .and_then(toml::Value::as_integer)
            .ok_or_else(|| {
                anyhow!(
                    "config file {} is not versioned. Add `version = 1` and put values under [source], [storage], [table], and [export]",
                    path.display()
                )
            })?;

        if version != CONFIG_VERSION {
            bail!(
                "unsupported config version {} in {}; expected version = 1",
                version,
                path.display()
            );
        }

        let config: Config = value
            .try_into()
            .with_context(|| format!("decode config {}", path.display()))?;
        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        let url = non_blank(self.source.url.as_deref());
        let file = non_blank(self.source.path.as_deref());
        match (url, file) {
            (Some(_), Some(_)) => bail!(
                "config {} sets both source.url and source.path; keep exactly one",
                path.display()
            ),
            (None, None) => bail!(
                "config {} has no dataset source; set source.url or source.path",
                path.display()
            ),
            _ => {}
        }

        if let Some(timeout) = &self.source.timeout {
            let parsed = parse_duration(timeout)?;
            if parsed <= Duration::ZERO {
                bail!(
                    "source.timeout in {} must be positive, got {}",
                    path.display(),
                    timeout
                );
            }
        }

        if let Some(db_path) = &self.storage.db_path {
            levellist_db::validate_db_path(db_path)?;
        }

        if let Some(namespace) = &self.storage.namespace {
            Namespace::new(namespace)
                .with_context(|| format!("storage.namespace in {}", path.display()))?;
        }

        self.layout()
            .with_context(|| format!("table.layout in {}", path.display()))?;

        if let Some(name) = &self.export.file_name
            && name.trim().is_empty()
        {
            bail!(
                "export.file_name in {} must not be empty",
                path.display()
            );
        }

        Ok(())
    }

    pub fn source(&self) -> Result<SourceKind> {
        if let Some(url) = non_blank(self.source.url.as_deref()) {
            return Ok(SourceKind::Remote {
                url: url.to_owned(),
                timeout: self.timeout()?,
            });
        }
        if let Some(path) = non_blank(self.source.path.as_deref()) {
            return Ok(SourceKind::File(PathBuf::from(path)));
        }
        bail!("no dataset source configured; set [source].url or [source].path in the config file")
    }

    pub fn timeout(&self) -> Result<Duration> {
        parse_duration(self.source.timeout.as_deref().unwrap_or(DEFAULT_TIMEOUT))
    }

    pub fn db_path(&self) -> Result<PathBuf> {
        match &self.storage.db_path {
            Some(path) => Ok(PathBuf::from(path)),
            None => levellist_db::default_db_path(),
        }
    }

    /// Snapshot namespace: the configured one, or one derived from the
    /// dataset source identity.
    pub fn namespace(&self, source_identity: &str) -> Result<Namespace> {
        match &self.storage.namespace {
            Some(namespace) => Namespace::new(namespace),
            None => Ok(Namespace::for_source(source_identity)),
        }
    }

    pub fn layout(&self) -> Result<LayoutPolicy> {
        let Some(raw) = self.table.layout.as_deref() else {
            return Ok(LayoutPolicy::ForwardPair);
        };
        LayoutPolicy::parse(raw.trim()).ok_or_else(|| {
            let known: Vec<&str> = LayoutPolicy::ALL.iter().map(|p| p.as_str()).collect();
            anyhow!("unknown layout {raw:?}; use one of: {}", known.join(", "))
        })
    }

    pub fn hide_done(&self) -> bool {
        self.table.hide_done.unwrap_or(false)
    }

    pub fn export_file_name(&self) -> &str {
        self.export
            .file_name
            .as_deref()
            .map(str::trim)
            .unwrap_or(EXPORT_FILE_NAME)
    }

    pub fn example_config(path: &Path) -> String {
        format!(
            "# levellist config\n# Place this file at: {}\n\nversion = 1\n\n[source]\n# Exactly one of url or path.\n# url = \"https://example.com/levels\"\npath = \"/absolute/path/to/data.json\"\ntimeout = \"{}\"\n\n[storage]\n# Optional. Default is platform data dir (for example ~/.local/share/levellist/levellist.db)\n# db_path = \"/absolute/path/to/levellist.db\"\n# Optional. Default is level-list:<source>\n# namespace = \"level-list:team\"\n\n[table]\n# forward, reverse, capped or indexed\nlayout = \"forward\"\nhide_done = false\n\n[export]\nfile_name = \"{}\"\n",
            path.display(),
            DEFAULT_TIMEOUT,
            EXPORT_FILE_NAME,
        )
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

fn parse_duration(raw: &str) -> Result<Duration> {
    if let Some(value) = raw.strip_suffix("ms") {
        let millis: u64 = value
            .parse()
            .with_context(|| format!("invalid timeout duration {raw:?}"))?;
        return Ok(Duration::from_millis(millis));
    }
    if let Some(value) = raw.strip_suffix('s') {
        let secs: u64 = value
            .parse()
            .with_context(|| format!("invalid timeout duration {raw:?}"))?;
        return Ok(Duration::from_secs(secs));
    }
    if let Some(value) = raw.strip_suffix('m') {
        let mins: u64 = value
            .parse()
            .with_context(|| format!("invalid timeout duration {raw:?}"))?;
        return Ok(Duration::from_secs(mins * 60));
    }

    bail!("invalid duration {raw:?}; use one of: <N>ms, <N>s, <N>m (for example 500ms or 5s)")
}
