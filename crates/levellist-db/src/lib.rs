// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod source;

pub use source::StaticFileSource;

use anyhow::{Context, Result, anyhow, bail};
use levellist_app::{Namespace, Row, Snapshot, SnapshotStore};
use rusqlite::{Connection, OptionalExtension, params};
use std::collections::BTreeSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::{debug, warn};

pub const APP_NAME: &str = "levellist";

const REQUIRED_SCHEMA: &[(&str, &[&str])] = &[(
    "snapshots",
    &["namespace", "payload", "row_count", "saved_at"],
)];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotInfo {
    pub namespace: String,
    pub row_count: i64,
    pub saved_at: OffsetDateTime,
}

pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        let printable = path.to_string_lossy().to_string();
        validate_db_path(&printable)?;
        let conn = Connection::open(path)
            .with_context(|| format!("open database at {}", path.display()))?;
        configure_connection(&conn)?;
        Ok(Self { conn })
    }

    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("open in-memory database")?;
        configure_connection(&conn)?;
        Ok(Self { conn })
    }

    pub fn raw_connection(&self) -> &Connection {
        &self.conn
    }

    pub fn bootstrap(&self) -> Result<()> {
        if has_user_tables(&self.conn)? {
            validate_schema(&self.conn)
        } else {
            self.conn
                .execute_batch(include_str!("sql/schema.sql"))
                .context("create schema")
        }
    }

    pub fn put_snapshot(&self, namespace: &Namespace, snapshot: &Snapshot) -> Result<()> {
        let payload = serde_json::to_string(snapshot).context("encode snapshot")?;
        let row_count = i64::try_from(snapshot.rows.len()).context("snapshot row count")?;
        let now = now_rfc3339()?;
        self.conn
            .execute(
                "
                INSERT INTO snapshots (namespace, payload, row_count, saved_at)
                VALUES (?, ?, ?, ?)
                ON CONFLICT(namespace) DO UPDATE SET
                  payload = excluded.payload,
                  row_count = excluded.row_count,
                  saved_at = excluded.saved_at
                ",
                params![namespace.as_str(), payload, row_count, now],
            )
            .with_context(|| format!("upsert snapshot {namespace}"))?;
        Ok(())
    }

    pub fn get_snapshot_raw(&self, namespace: &Namespace) -> Result<Option<String>> {
        self.conn
            .query_row(
                "SELECT payload FROM snapshots WHERE namespace = ?",
                params![namespace.as_str()],
                |row| row.get::<_, String>(0),
            )
            .optional()
            .with_context(|| format!("read snapshot {namespace}"))
    }

    /// Reads the snapshot for `namespace`. A payload that does not decode is
    /// treated as no snapshot at all.
    pub fn get_snapshot(&self, namespace: &Namespace) -> Result<Option<Snapshot>> {
        let Some(raw) = self.get_snapshot_raw(namespace)? else {
            return Ok(None);
        };
        match serde_json::from_str::<Option<Snapshot>>(&raw) {
            Ok(snapshot) => Ok(snapshot),
            Err(error) => {
                warn!(%namespace, %error, "local snapshot is corrupt; ignoring it");
                Ok(None)
            }
        }
    }

    pub fn delete_snapshot(&self, namespace: &Namespace) -> Result<bool> {
        let removed = self
            .conn
            .execute(
                "DELETE FROM snapshots WHERE namespace = ?",
                params![namespace.as_str()],
            )
            .with_context(|| format!("delete snapshot {namespace}"))?;
        Ok(removed > 0)
    }

    pub fn list_snapshots(&self) -> Result<Vec<SnapshotInfo>> {
        let mut stmt = self
            .conn
            .prepare(
                "
                SELECT namespace, row_count, saved_at
                FROM snapshots
                ORDER BY namespace ASC
                ",
            )
            .context("prepare snapshot list")?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })
            .context("query snapshots")?;

        let mut out = Vec::new();
        for row in rows {
            let (namespace, row_count, saved_at) = row.context("read snapshot row")?;
            let saved_at = OffsetDateTime::parse(&saved_at, &Rfc3339)
                .with_context(|| format!("parse saved_at {saved_at:?} for {namespace}"))?;
            out.push(SnapshotInfo {
                namespace,
                row_count,
                saved_at,
            });
        }
        Ok(out)
    }

    /// Snapshot access scoped to one namespace.
    pub fn snapshots(&self, namespace: Namespace) -> LocalSnapshots<'_> {
        LocalSnapshots {
            store: self,
            namespace,
        }
    }
}

pub struct LocalSnapshots<'a> {
    store: &'a Store,
    namespace: Namespace,
}

impl LocalSnapshots<'_> {
    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }
}

impl SnapshotStore for LocalSnapshots<'_> {
    fn save_local(&mut self, rows: &[Row]) -> Result<()> {
        self.store.put_snapshot(
            &self.namespace,
            &Snapshot {
                rows: rows.to_vec(),
            },
        )?;
        debug!(namespace = %self.namespace, rows = rows.len(), "local snapshot written");
        Ok(())
    }

    fn load_local(&mut self) -> Result<Option<Vec<Row>>> {
        Ok(self
            .store
            .get_snapshot(&self.namespace)?
            .map(|snapshot| snapshot.rows))
    }

    fn clear_local(&mut self) -> Result<()> {
        self.store.delete_snapshot(&self.namespace)?;
        Ok(())
    }
}

pub fn default_db_path() -> Result<PathBuf> {
    if let Some(override_path) = env::var_os("LEVELLIST_DB_PATH") {
        return Ok(PathBuf::from(override_path));
    }

    let data_root = dirs::data_local_dir().ok_or_else(|| {
        anyhow!("cannot resolve data directory; set LEVELLIST_DB_PATH to a writable database path")
    })?;

    let app_dir = data_root.join(APP_NAME);
    fs::create_dir_all(&app_dir)
        .with_context(|| format!("create data directory {}", app_dir.display()))?;
    Ok(app_dir.join("levellist.db"))
}

pub fn validate_db_path(path: &str) -> Result<()> {
    if path.is_empty() {
        bail!("database path must not be empty");
    }
    if path == ":memory:" {
        return Ok(());
    }

    if let Some(index) = path.find("://")
        && index > 0
    {
        let scheme = &path[..index];
        if scheme.chars().all(char::is_alphabetic) {
            bail!(
                "database path {path:?} looks like a URI ({scheme}://); pass a filesystem path instead"
            );
        }
    }

    if path.starts_with("file:") {
        bail!("database path {path:?} uses file: URI syntax; pass a plain filesystem path");
    }

    if path.contains('?') {
        bail!(
            "database path {path:?} contains '?'; remove query parameters and use a plain file path"
        );
    }

    Ok(())
}

fn has_user_tables(conn: &Connection) -> Result<bool> {
    let count: i64 = conn
        .query_row(
            "
            SELECT COUNT(*)
            FROM sqlite_master
            WHERE type = 'table'
              AND name NOT LIKE 'sqlite_%'
            ",
            [],
            |row| row.get(0),
        )
        .context("count user tables")?;
    Ok(count > 0)
}

fn validate_schema(conn: &Connection) -> Result<()> {
    for (table, required_columns) in REQUIRED_SCHEMA {
        if !table_exists(conn, table)? {
            bail!(
                "database is missing required table `{table}`; point [storage].db_path at a levellist database"
            );
        }

        let columns = table_columns(conn, table)?;
        let missing: Vec<&str> = required_columns
            .iter()
            .copied()
            .filter(|column| !columns.contains(*column))
            .collect();

        if !missing.is_empty() {
            bail!(
                "table `{table}` is missing required columns: {}; remove the database to recreate it",
                missing.join(", ")
            );
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> Result<bool> {
    let exists = conn
        .query_row(
            "
            SELECT EXISTS(
              SELECT 1
              FROM sqlite_master
              WHERE type = 'table' AND name = ?
            )
            ",
            params![table],
            |row| row.get::<_, i64>(0),
        )
        .with_context(|| format!("check table existence for {table}"))?;
    Ok(exists == 1)
}

fn table_columns(conn: &Connection, table: &str) -> Result<BTreeSet<String>> {
    let mut stmt = conn
        .prepare(&format!("PRAGMA table_info({table})"))
        .with_context(|| format!("inspect columns for {table}"))?;
    let rows = stmt
        .query_map([], |row| row.get::<_, String>(1))
        .with_context(|| format!("query column info for {table}"))?;

    let names = rows
        .collect::<rusqlite::Result<BTreeSet<_>>>()
        .with_context(|| format!("collect columns for {table}"))?;
    Ok(names)
}

fn configure_connection(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA busy_timeout = 5000;
        ",
    )
    .context("configure sqlite pragmas")
}

fn now_rfc3339() -> Result<String> {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .context("format current timestamp")
}
