// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::Row;

/// Reconciles freshly loaded rows with a locally saved snapshot.
///
/// Rows pair up by position. Saved fields override default fields with the
/// same key, default-only fields survive, saved rows past the end of the
/// default set are appended as-is, and default rows with no saved partner are
/// kept unchanged.
pub fn merge_rows(default_rows: &[Row], saved_rows: Option<&[Row]>) -> Vec<Row> {
    let Some(saved_rows) = saved_rows else {
        return default_rows.to_vec();
    };

    let mut merged: Vec<Row> = default_rows
        .iter()
        .enumerate()
        .map(|(index, row)| {
            let mut row = row.clone();
            if let Some(saved) = saved_rows.get(index) {
                row.overlay(saved);
            }
            row
        })
        .collect();

    if saved_rows.len() > default_rows.len() {
        merged.extend_from_slice(&saved_rows[default_rows.len()..]);
    }
    merged
}
