// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;
use levellist_app::{Dataset, DatasetSource, GatewayError};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Dataset shipped as a static JSON file next to the app.
#[derive(Debug, Clone)]
pub struct StaticFileSource {
    path: PathBuf,
}

impl StaticFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DatasetSource for StaticFileSource {
    fn identity(&self) -> String {
        self.path.display().to_string()
    }

    fn load(&mut self) -> Result<Dataset> {
        let raw = fs::read_to_string(&self.path).map_err(|error| {
            GatewayError::LoadFailed(format!("read {}: {error}", self.path.display()))
        })?;
        let dataset: Dataset = serde_json::from_str(&raw).map_err(|error| {
            GatewayError::LoadFailed(format!(
                "{} is not a {{headers, rows}} dataset: {error}",
                self.path.display()
            ))
        })?;
        debug!(path = %self.path.display(), rows = dataset.rows.len(), "read static dataset");
        Ok(dataset)
    }
}

#[cfg(test)]
mod tests {
    use super::StaticFileSource;
    use anyhow::Result;
    use levellist_app::{DatasetSource, GatewayError};

    #[test]
    fn loads_dataset_file() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("data.json");
        std::fs::write(
            &path,
            r#"{"headers":["A","B"],"rows":[{"A":"Intro","B":"済"},{"A":2}]}"#,
        )?;

        let dataset = StaticFileSource::new(&path).load()?;
        assert_eq!(dataset.headers, vec!["A", "B"]);
        assert_eq!(dataset.rows.len(), 2);
        assert_eq!(dataset.rows[1].get("A"), "2");
        Ok(())
    }

    #[test]
    fn missing_file_is_a_load_failure() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let error = StaticFileSource::new(temp.path().join("absent.json"))
            .load()
            .expect_err("missing file should fail");
        assert!(GatewayError::is_load_failure(&error));
        Ok(())
    }

    #[test]
    fn malformed_payload_is_a_load_failure() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("data.json");
        std::fs::write(&path, r#"{"headers":["A"]}"#)?;

        let error = StaticFileSource::new(&path)
            .load()
            .expect_err("payload without rows should fail");
        assert!(GatewayError::is_load_failure(&error));
        assert!(error.to_string().contains("{headers, rows}"));
        Ok(())
    }
}
