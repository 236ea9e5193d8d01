// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use levellist_app::{BLANK, DONE, Dataset, Row};
use std::fs;
use std::path::{Path, PathBuf};

const STANDARD_HEADERS: [&str; 14] = [
    "A", "B", "C", "D", "E", "F", "G", "H", "I", "J", "K", "L", "M", "N",
];

const TOPICS: [&str; 16] = [
    "Greetings",
    "Numbers",
    "Colors",
    "Family",
    "Food",
    "Weather",
    "Travel",
    "Shopping",
    "Hobbies",
    "Health",
    "Work",
    "School",
    "Nature",
    "Music",
    "Sports",
    "History",
];

const OFF_VOCABULARY_STATUSES: [&str; 4] = ["途中", "保留", "再確認", "done?"];

const AWKWARD_CELLS: [&str; 8] = [
    "Intro, part 1",
    "say \"hello\"",
    "line one\nline two",
    "\"fully quoted\"",
    ",",
    "\"",
    "済 ",
    "",
];

#[derive(Debug, Clone)]
struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        let mut state = seed ^ 0x9E37_79B9_7F4A_7C15;
        if state == 0 {
            state = 0xA409_3822_299F_31D0;
        }
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);

        let mut x = self.state;
        x ^= x >> 13;
        x ^= x << 7;
        x ^= x >> 17;
        x
    }

    fn int_n(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        (self.next_u64() % (n as u64)) as usize
    }
}

/// Generates plausible progress rows from a seed. The same seed always yields
/// the same rows.
#[derive(Debug, Clone)]
pub struct ProgressFaker {
    rng: DeterministicRng,
    seed: u64,
}

impl ProgressFaker {
    pub fn new(seed: u64) -> Self {
        let normalized = if seed == 0 { 1 } else { seed };
        Self {
            rng: DeterministicRng::new(normalized),
            seed: normalized,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// One row over `headers`: even positions get a level title, odd
    /// positions a progress mark.
    pub fn row(&mut self, headers: &[String]) -> Row {
        headers
            .iter()
            .enumerate()
            .map(|(index, header)| {
                let value = if index % 2 == 0 {
                    self.level_title()
                } else {
                    self.progress_mark().to_owned()
                };
                (header.clone(), value)
            })
            .collect()
    }

    pub fn dataset(&mut self, rows: usize) -> Dataset {
        let headers = standard_headers();
        let rows = (0..rows).map(|_| self.row(&headers)).collect();
        Dataset { headers, rows }
    }

    pub fn level_title(&mut self) -> String {
        let topic = TOPICS[self.rng.int_n(TOPICS.len())];
        format!("{topic} {}", self.rng.int_n(9) + 1)
    }

    /// Mostly empty or done, occasionally blank or a free-form note.
    pub fn progress_mark(&mut self) -> &'static str {
        match self.rng.int_n(10) {
            0..=4 => "",
            5..=7 => DONE,
            8 => BLANK,
            _ => OFF_VOCABULARY_STATUSES[self.rng.int_n(OFF_VOCABULARY_STATUSES.len())],
        }
    }
}

pub fn standard_headers() -> Vec<String> {
    STANDARD_HEADERS.iter().map(|h| (*h).to_owned()).collect()
}

pub fn awkward_cells() -> &'static [&'static str] {
    &AWKWARD_CELLS
}

pub fn off_vocabulary_statuses() -> &'static [&'static str] {
    &OFF_VOCABULARY_STATUSES
}

pub fn temp_db_path() -> Result<(tempfile::TempDir, PathBuf)> {
    let dir = tempfile::tempdir().context("create temp dir")?;
    let db_path = dir.path().join("levellist.db");
    Ok((dir, db_path))
}

pub fn write_dataset_file(dir: &Path, dataset: &Dataset) -> Result<PathBuf> {
    let path = dir.join("data.json");
    let body = serde_json::to_string_pretty(dataset).context("encode dataset fixture")?;
    fs::write(&path, body).with_context(|| format!("write dataset fixture {}", path.display()))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::{ProgressFaker, awkward_cells, standard_headers};
    use std::collections::BTreeSet;

    #[test]
    fn new_deterministic_seed() {
        let mut left = ProgressFaker::new(42);
        let mut right = ProgressFaker::new(42);
        assert_eq!(left.dataset(5), right.dataset(5));
    }

    #[test]
    fn zero_seed_is_normalized() {
        assert_eq!(ProgressFaker::new(0).seed(), 1);
    }

    #[test]
    fn rows_cover_every_header() {
        let mut faker = ProgressFaker::new(7);
        let dataset = faker.dataset(3);
        assert_eq!(dataset.headers.len(), 14);
        for row in &dataset.rows {
            for header in standard_headers() {
                assert!(row.contains_key(&header), "missing {header}");
            }
            assert!(!row.get("A").is_empty());
        }
    }

    #[test]
    fn variety_across_seeds() {
        let titles: BTreeSet<String> = (1_u64..20)
            .map(|seed| ProgressFaker::new(seed).level_title())
            .collect();
        assert!(titles.len() > 5);
    }

    #[test]
    fn awkward_cells_include_quote_comma_and_newline() {
        let cells = awkward_cells();
        assert!(cells.iter().any(|c| c.contains(',')));
        assert!(cells.iter().any(|c| c.contains('"')));
        assert!(cells.iter().any(|c| c.contains('\n')));
    }
}
