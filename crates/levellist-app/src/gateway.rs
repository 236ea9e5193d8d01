// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, bail};

use crate::{Dataset, Row};

const NAMESPACE_PREFIX: &str = "level-list:";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    LoadFailed(String),
    RemoteSaveFailed(String),
}

impl std::fmt::Display for GatewayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LoadFailed(detail) => write!(f, "dataset load failed: {detail}"),
            Self::RemoteSaveFailed(detail) => write!(f, "remote save failed: {detail}"),
        }
    }
}

impl std::error::Error for GatewayError {}

impl GatewayError {
    /// Finds a gateway error anywhere in an `anyhow` chain.
    pub fn find(error: &anyhow::Error) -> Option<&Self> {
        error.chain().find_map(|cause| cause.downcast_ref::<Self>())
    }

    pub fn is_load_failure(error: &anyhow::Error) -> bool {
        matches!(Self::find(error), Some(Self::LoadFailed(_)))
    }
}

/// Scope under which the local snapshot is stored, so distinct datasets never
/// share a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Namespace(String);

impl Namespace {
    pub fn new(value: &str) -> Result<Self> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            bail!("snapshot namespace must not be empty");
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Default namespace for a dataset source identity.
    pub fn for_source(identity: &str) -> Self {
        Self(format!("{NAMESPACE_PREFIX}{identity}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Namespace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

pub trait DatasetSource {
    /// Stable identity of the source, used for logging and the default
    /// snapshot namespace.
    fn identity(&self) -> String;

    /// Loads the full dataset. Implementations report failures as
    /// [`GatewayError::LoadFailed`].
    fn load(&mut self) -> Result<Dataset>;
}

pub trait SnapshotStore {
    fn save_local(&mut self, rows: &[Row]) -> Result<()>;
    fn load_local(&mut self) -> Result<Option<Vec<Row>>>;
    fn clear_local(&mut self) -> Result<()>;
}

pub trait RemoteStore {
    /// Writes the whole table. Implementations report failures, including a
    /// negative acknowledgement, as [`GatewayError::RemoteSaveFailed`].
    fn save_remote(&mut self, headers: &[String], rows: &[Row]) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::{GatewayError, Namespace};
    use anyhow::Context;

    #[test]
    fn namespace_defaults_to_level_list_prefix() {
        assert_eq!(
            Namespace::for_source("/progress/index.html").as_str(),
            "level-list:/progress/index.html"
        );
    }

    #[test]
    fn namespace_rejects_blank_values() {
        assert!(Namespace::new("  ").is_err());
        assert_eq!(
            Namespace::new(" team-a ").map(|ns| ns.to_string()).ok(),
            Some("team-a".to_owned())
        );
    }

    #[test]
    fn gateway_error_is_found_through_context() {
        let error: anyhow::Error = Err::<(), _>(GatewayError::LoadFailed("HTTP 503".to_owned()))
            .context("start session")
            .expect_err("error expected");
        assert!(GatewayError::is_load_failure(&error));
        assert_eq!(
            GatewayError::find(&error),
            Some(&GatewayError::LoadFailed("HTTP 503".to_owned()))
        );

        let other = anyhow::anyhow!("unrelated");
        assert!(GatewayError::find(&other).is_none());
    }
}
