// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};

pub const PAIR_COUNT: usize = 7;
pub const MAX_HEADERS: usize = PAIR_COUNT * 2;

pub const DONE: &str = "済";
pub const BLANK: &str = "空白";

/// Reserved key for the synthetic column appended by [`LayoutPolicy::ReversePair`].
/// A header with the same name pushes the column onto a suffixed key.
pub const FINAL_PROGRESS_KEY: &str = "__final_progress";
pub const FINAL_PROGRESS_LABEL: &str = "最終進捗";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusSet {
    Progress,
    FinalProgress,
}

impl StatusSet {
    pub const fn values(self) -> &'static [&'static str] {
        match self {
            Self::Progress => &["", DONE],
            Self::FinalProgress => &["", BLANK, DONE],
        }
    }

    pub fn contains(self, value: &str) -> bool {
        self.values().contains(&value)
    }

    /// Choices offered for a cell currently holding `current`. A stored value
    /// outside the set stays selectable so it is never silently replaced.
    pub fn options_for(self, current: &str) -> Vec<String> {
        let mut options: Vec<String> = self.values().iter().map(|v| (*v).to_owned()).collect();
        if !current.is_empty() && !self.contains(current) {
            options.push(current.to_owned());
        }
        options
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnKind {
    Text,
    Status(StatusSet),
}

impl ColumnKind {
    pub const fn is_status(self) -> bool {
        matches!(self, Self::Status(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub key: String,
    pub label: String,
    pub kind: ColumnKind,
}

impl Column {
    fn level(key: String, number: usize) -> Self {
        Self {
            key,
            label: format!("レベル{number}"),
            kind: ColumnKind::Text,
        }
    }

    fn progress(key: String, number: usize) -> Self {
        Self {
            key,
            label: format!("進捗{number}"),
            kind: ColumnKind::Status(StatusSet::Progress),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LayoutPolicy {
    ForwardPair,
    ReversePair,
    CappedForward,
    IndexLabeled,
}

impl LayoutPolicy {
    pub const ALL: [Self; 4] = [
        Self::ForwardPair,
        Self::ReversePair,
        Self::CappedForward,
        Self::IndexLabeled,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ForwardPair => "forward",
            Self::ReversePair => "reverse",
            Self::CappedForward => "capped",
            Self::IndexLabeled => "indexed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "forward" => Some(Self::ForwardPair),
            "reverse" => Some(Self::ReversePair),
            "capped" => Some(Self::CappedForward),
            "indexed" => Some(Self::IndexLabeled),
            _ => None,
        }
    }
}

/// Builds the column schema for `headers` under `policy`.
///
/// Never fails: short, odd-length or duplicated header lists degrade to
/// padded, truncated or shared-key columns depending on the policy.
pub fn derive_columns<S: AsRef<str>>(headers: &[S], policy: LayoutPolicy) -> Vec<Column> {
    match policy {
        LayoutPolicy::ForwardPair => forward_pairs(headers, PAIR_COUNT),
        LayoutPolicy::CappedForward => {
            let pairs = (headers.len().min(MAX_HEADERS) / 2).min(PAIR_COUNT);
            forward_pairs(headers, pairs)
        }
        LayoutPolicy::ReversePair => reverse_pairs(headers),
        LayoutPolicy::IndexLabeled => index_labeled(headers),
    }
}

// Synthetic keys must never alias a real header, or both columns would share
// one field.
fn reserved_key<S: AsRef<str>>(headers: &[S], base: &str) -> String {
    let taken = |key: &str| headers.iter().any(|header| header.as_ref() == key);
    if !taken(base) {
        return base.to_owned();
    }
    (1..)
        .map(|suffix| format!("{base}_{suffix}"))
        .find(|key| !taken(key))
        .unwrap_or_else(|| base.to_owned())
}

fn header_or_pad<S: AsRef<str>>(headers: &[S], index: usize) -> String {
    match headers.get(index) {
        Some(header) => header.as_ref().to_owned(),
        None => reserved_key(headers, &format!("__pad{index}")),
    }
}

fn forward_pairs<S: AsRef<str>>(headers: &[S], pairs: usize) -> Vec<Column> {
    let mut columns = Vec::with_capacity(pairs * 2);
    for i in 0..pairs {
        let number = PAIR_COUNT - i;
        columns.push(Column::level(header_or_pad(headers, 2 * i), number));
        columns.push(Column::progress(header_or_pad(headers, 2 * i + 1), number));
    }
    columns
}

fn reverse_pairs<S: AsRef<str>>(headers: &[S]) -> Vec<Column> {
    let available = headers.len() / 2;
    let start = available.min(PAIR_COUNT);
    let mut columns = Vec::with_capacity(start * 2 + 1);
    for i in 0..start {
        let raw = available - 1 - i;
        let number = start - i;
        columns.push(Column::level(headers[2 * raw].as_ref().to_owned(), number));
        columns.push(Column::progress(headers[2 * raw + 1].as_ref().to_owned(), number));
    }
    columns.push(Column {
        key: reserved_key(headers, FINAL_PROGRESS_KEY),
        label: FINAL_PROGRESS_LABEL.to_owned(),
        kind: ColumnKind::Status(StatusSet::FinalProgress),
    });
    columns
}

fn index_labeled<S: AsRef<str>>(headers: &[S]) -> Vec<Column> {
    headers
        .iter()
        .enumerate()
        .map(|(index, header)| {
            let key = header.as_ref().to_owned();
            let number = index / 2 + 1;
            if index % 2 == 0 {
                Column::level(key, number)
            } else {
                Column::progress(key, number)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{ColumnKind, FINAL_PROGRESS_KEY, LayoutPolicy, StatusSet, derive_columns};

    fn labels(columns: &[super::Column]) -> Vec<&str> {
        columns.iter().map(|c| c.label.as_str()).collect()
    }

    fn keys(columns: &[super::Column]) -> Vec<&str> {
        columns.iter().map(|c| c.key.as_str()).collect()
    }

    #[test]
    fn forward_pair_pads_short_headers_to_fourteen_columns() {
        let columns = derive_columns(&["A", "B", "C", "D"], LayoutPolicy::ForwardPair);
        assert_eq!(columns.len(), 14);
        assert_eq!(columns[0].key, "A");
        assert_eq!(columns[0].label, "レベル7");
        assert_eq!(columns[0].kind, ColumnKind::Text);
        assert_eq!(columns[1].key, "B");
        assert_eq!(columns[1].label, "進捗7");
        assert_eq!(columns[1].kind, ColumnKind::Status(StatusSet::Progress));
        assert_eq!(columns[4].key, "__pad4");
        assert_eq!(columns[13].key, "__pad13");
        assert_eq!(columns[13].label, "進捗1");
        assert_eq!(
            columns.iter().filter(|c| c.kind == ColumnKind::Text).count(),
            7
        );
    }

    #[test]
    fn forward_pair_ignores_headers_past_fourteen() {
        let headers: Vec<String> = (0..16).map(|i| format!("h{i}")).collect();
        let columns = derive_columns(&headers, LayoutPolicy::ForwardPair);
        assert_eq!(columns.len(), 14);
        assert_eq!(columns[13].key, "h13");
    }

    #[test]
    fn capped_forward_emits_only_complete_pairs() {
        let columns = derive_columns(&["A", "B", "C", "D", "E"], LayoutPolicy::CappedForward);
        assert_eq!(keys(&columns), vec!["A", "B", "C", "D"]);
        assert_eq!(labels(&columns), vec!["レベル7", "進捗7", "レベル6", "進捗6"]);
    }

    #[test]
    fn capped_forward_on_empty_headers_is_empty() {
        let columns = derive_columns::<&str>(&[], LayoutPolicy::CappedForward);
        assert!(columns.is_empty());
    }

    #[test]
    fn reverse_pair_reads_pairs_from_the_end() {
        let columns = derive_columns(
            &["A", "B", "C", "D", "E", "F", "odd"],
            LayoutPolicy::ReversePair,
        );
        assert_eq!(keys(&columns), vec!["E", "F", "C", "D", "A", "B", FINAL_PROGRESS_KEY]);
        assert_eq!(
            labels(&columns),
            vec!["レベル3", "進捗3", "レベル2", "進捗2", "レベル1", "進捗1", "最終進捗"]
        );
        assert_eq!(
            columns[6].kind,
            ColumnKind::Status(StatusSet::FinalProgress)
        );
    }

    #[test]
    fn reverse_pair_caps_start_level_at_seven() {
        let headers: Vec<String> = (0..18).map(|i| format!("h{i}")).collect();
        let columns = derive_columns(&headers, LayoutPolicy::ReversePair);
        assert_eq!(columns.len(), 15);
        assert_eq!(columns[0].key, "h16");
        assert_eq!(columns[0].label, "レベル7");
        assert_eq!(columns[13].label, "進捗1");
    }

    #[test]
    fn reverse_pair_with_no_pairs_keeps_final_column() {
        let columns = derive_columns(&["lonely"], LayoutPolicy::ReversePair);
        assert_eq!(keys(&columns), vec![FINAL_PROGRESS_KEY]);
    }

    #[test]
    fn final_progress_key_avoids_a_real_header() {
        let columns = derive_columns(
            &["__final_progress", "P", "__final_progress_1"],
            LayoutPolicy::ReversePair,
        );
        assert_eq!(
            keys(&columns),
            vec!["__final_progress", "P", "__final_progress_2"]
        );
    }

    #[test]
    fn pad_keys_avoid_real_headers() {
        let columns = derive_columns(&["A", "__pad3", "C"], LayoutPolicy::ForwardPair);
        assert_eq!(columns[1].key, "__pad3");
        assert_eq!(columns[3].key, "__pad3_1");
        let mut unique = keys(&columns);
        unique.sort_unstable();
        unique.dedup();
        assert_eq!(unique.len(), 14);
    }

    #[test]
    fn index_labeled_keeps_trailing_odd_header() {
        let columns = derive_columns(&["A", "B", "C"], LayoutPolicy::IndexLabeled);
        assert_eq!(keys(&columns), vec!["A", "B", "C"]);
        assert_eq!(labels(&columns), vec!["レベル1", "進捗1", "レベル2"]);
        assert_eq!(columns[2].kind, ColumnKind::Text);
    }

    #[test]
    fn duplicate_headers_do_not_fail() {
        let columns = derive_columns(&["A", "A", "A", "A"], LayoutPolicy::ForwardPair);
        assert_eq!(columns.iter().filter(|c| c.key == "A").count(), 4);
    }

    #[test]
    fn status_options_keep_out_of_vocabulary_value() {
        assert_eq!(StatusSet::Progress.options_for(""), vec!["", "済"]);
        assert_eq!(StatusSet::Progress.options_for("済"), vec!["", "済"]);
        assert_eq!(
            StatusSet::Progress.options_for("保留"),
            vec!["", "済", "保留"]
        );
        assert_eq!(
            StatusSet::FinalProgress.options_for("空白"),
            vec!["", "空白", "済"]
        );
    }

    #[test]
    fn layout_policy_names_round_trip() {
        for policy in LayoutPolicy::ALL {
            assert_eq!(LayoutPolicy::parse(policy.as_str()), Some(policy));
        }
        assert!(LayoutPolicy::parse("sideways").is_none());
    }
}
