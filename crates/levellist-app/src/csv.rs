// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::borrow::Cow;

use crate::{Column, Row};

pub const EXPORT_FILE_NAME: &str = "export.csv";
pub const EXPORT_MIME_TYPE: &str = "text/csv;charset=utf-8";

/// Quotes a field containing a comma, double quote or newline, doubling
/// inner quotes. Other fields pass through untouched.
pub fn escape_field(value: &str) -> Cow<'_, str> {
    if value.contains([',', '"', '\n']) {
        Cow::Owned(format!("\"{}\"", value.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(value)
    }
}

/// Renders the header line of column labels followed by one line per row.
///
/// The header line always ends with `\n`; row lines are joined by `\n` with
/// no trailing newline.
pub fn encode(columns: &[Column], rows: &[Row]) -> String {
    let head = join_line(columns.iter().map(|column| column.label.as_str()));
    let body = rows
        .iter()
        .map(|row| join_line(columns.iter().map(|column| row.get(&column.key))))
        .collect::<Vec<_>>()
        .join("\n");

    let mut out = String::with_capacity(head.len() + body.len() + 1);
    out.push_str(&head);
    out.push('\n');
    out.push_str(&body);
    out
}

fn join_line<'a>(fields: impl Iterator<Item = &'a str>) -> String {
    fields
        .map(escape_field)
        .collect::<Vec<_>>()
        .join(",")
}
