// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::{
    Column, DatasetSource, GatewayError, LayoutPolicy, RemoteStore, Row, SnapshotStore,
    TableCommand, TableEvent, TableState, csv, derive_columns, merge_rows,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    pub layout: LayoutPolicy,
    pub hide_completed: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            layout: LayoutPolicy::ForwardPair,
            hide_completed: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Remote write succeeded and the local backup was written.
    Remote,
    /// Remote write succeeded but the local backup failed.
    RemoteWithoutBackup { message: String },
    /// Remote write failed; the rows were written locally instead.
    LocalFallback { message: String },
    /// No remote store configured; the rows were written locally.
    LocalOnly,
}

/// One editing session: the dataset headers as loaded plus the live table.
#[derive(Debug, Clone)]
pub struct Session {
    headers: Vec<String>,
    table: TableState,
}

impl Session {
    /// Loads the dataset, merges the local snapshot over it and seeds the
    /// table. Only a failed dataset load aborts startup.
    pub fn start(
        source: &mut dyn DatasetSource,
        local: &mut dyn SnapshotStore,
        options: SessionOptions,
    ) -> Result<Self> {
        let identity = source.identity();
        let dataset = source.load().map_err(|error| {
            if GatewayError::is_load_failure(&error) {
                error
            } else {
                anyhow::Error::new(GatewayError::LoadFailed(format!("{error:#}")))
            }
        })?;
        info!(
            source = %identity,
            headers = dataset.headers.len(),
            rows = dataset.rows.len(),
            "dataset loaded"
        );

        let columns = derive_columns(&dataset.headers, options.layout);
        let saved = match local.load_local() {
            Ok(saved) => saved,
            Err(error) => {
                warn!(error = %format!("{error:#}"), "ignoring unreadable local snapshot");
                None
            }
        };
        if let Some(saved) = &saved {
            debug!(saved_rows = saved.len(), "merging local snapshot");
        }
        let rows = merge_rows(&dataset.rows, saved.as_deref());

        let mut table = TableState::new(columns);
        table.seed(&rows);
        table.apply_visibility_filter(options.hide_completed);

        Ok(Self {
            headers: dataset.headers,
            table,
        })
    }

    /// Drops the local snapshot and starts over from the source.
    pub fn reset(
        source: &mut dyn DatasetSource,
        local: &mut dyn SnapshotStore,
        options: SessionOptions,
    ) -> Result<Self> {
        local.clear_local().context("clear local snapshot")?;
        info!("local snapshot cleared");
        Self::start(source, local, options)
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn columns(&self) -> &[Column] {
        self.table.columns()
    }

    pub fn table(&self) -> &TableState {
        &self.table
    }

    pub fn rows(&self) -> Vec<Row> {
        self.table.get_rows()
    }

    pub fn dispatch(&mut self, command: TableCommand) -> Result<Vec<TableEvent>> {
        self.table.dispatch(command)
    }

    pub fn export_csv(&self) -> String {
        csv::encode(self.table.columns(), &self.table.get_rows())
    }

    /// Saves remotely when a remote store is given, keeping a local copy
    /// either way. A remote failure never loses the rows: they land in the
    /// local store and the failure comes back in the outcome.
    pub fn save(
        &self,
        local: &mut dyn SnapshotStore,
        remote: Option<&mut dyn RemoteStore>,
    ) -> Result<SaveOutcome> {
        let rows = self.table.get_rows();

        let Some(remote) = remote else {
            local.save_local(&rows).context("save local snapshot")?;
            info!(rows = rows.len(), "saved locally");
            return Ok(SaveOutcome::LocalOnly);
        };

        match remote.save_remote(&self.headers, &rows) {
            Ok(()) => match local.save_local(&rows) {
                Ok(()) => {
                    info!(rows = rows.len(), "saved remotely with local backup");
                    Ok(SaveOutcome::Remote)
                }
                Err(error) => {
                    let message = format!("{error:#}");
                    warn!(error = %message, "remote save succeeded but local backup failed");
                    Ok(SaveOutcome::RemoteWithoutBackup { message })
                }
            },
            Err(error) => {
                let message = format!("{error:#}");
                warn!(error = %message, "remote save failed; writing local snapshot instead");
                local
                    .save_local(&rows)
                    .with_context(|| format!("save local snapshot after {message}"))?;
                Ok(SaveOutcome::LocalFallback { message })
            }
        }
    }
}
