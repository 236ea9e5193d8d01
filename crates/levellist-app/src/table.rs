// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, bail};

use crate::{Column, ColumnKind, DONE, Row};

#[derive(Debug, Clone, PartialEq, Eq)]
struct TableRow {
    cells: Vec<String>,
    hidden: bool,
}

/// The live grid. Cells are stored per schema position; columns that share a
/// key are always written together so they never disagree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableState {
    columns: Vec<Column>,
    rows: Vec<TableRow>,
    hide_completed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableCommand {
    SetCell {
        row: usize,
        key: String,
        value: String,
    },
    AddRow,
    SetFilter(bool),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableEvent {
    CellChanged { row: usize, key: String },
    RowAdded(usize),
    FilterChanged(bool),
    RowVisibilityChanged { row: usize, hidden: bool },
}

impl TableState {
    pub fn new(columns: Vec<Column>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
            hide_completed: false,
        }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn hide_completed(&self) -> bool {
        self.hide_completed
    }

    /// Replaces every row. Each cell starts from the row's value at the
    /// column key, or `""` when the row has no such field.
    pub fn seed(&mut self, rows: &[Row]) {
        self.rows = rows
            .iter()
            .map(|row| TableRow {
                cells: self
                    .columns
                    .iter()
                    .map(|column| row.get(&column.key).to_owned())
                    .collect(),
                hidden: false,
            })
            .collect();
        self.recompute_visibility();
    }

    /// Current values of every row, keyed by column key in schema order.
    /// Fields outside the schema are not part of the snapshot.
    pub fn get_rows(&self) -> Vec<Row> {
        self.rows
            .iter()
            .map(|row| {
                self.columns
                    .iter()
                    .zip(&row.cells)
                    .map(|(column, value)| (column.key.as_str(), value.as_str()))
                    .collect()
            })
            .collect()
    }

    pub fn cell(&self, row: usize, column_index: usize) -> Option<&str> {
        self.rows
            .get(row)
            .and_then(|row| row.cells.get(column_index))
            .map(String::as_str)
    }

    pub fn value(&self, row: usize, key: &str) -> Option<&str> {
        let index = self.columns.iter().position(|column| column.key == key)?;
        self.cell(row, index)
    }

    pub fn is_hidden(&self, row: usize) -> bool {
        self.rows.get(row).is_some_and(|row| row.hidden)
    }

    pub fn visible_rows(&self) -> Vec<usize> {
        self.rows
            .iter()
            .enumerate()
            .filter(|(_, row)| !row.hidden)
            .map(|(index, _)| index)
            .collect()
    }

    /// Choices to offer for a status cell, including its current value when
    /// that value is outside the enumerated set. `None` for text cells.
    pub fn status_options(&self, row: usize, column_index: usize) -> Option<Vec<String>> {
        let column = self.columns.get(column_index)?;
        let ColumnKind::Status(set) = column.kind else {
            return None;
        };
        Some(set.options_for(self.cell(row, column_index)?))
    }

    pub fn add_row(&mut self) -> Vec<TableEvent> {
        self.rows.push(TableRow {
            cells: vec![String::new(); self.columns.len()],
            hidden: false,
        });
        let index = self.rows.len() - 1;
        let mut events = vec![TableEvent::RowAdded(index)];
        events.extend(self.recompute_visibility());
        events
    }

    /// Writes `value` verbatim into every column keyed `key` on `row`.
    /// Status values are not coerced to their enumerated set.
    pub fn set_cell_value(
        &mut self,
        row: usize,
        key: &str,
        value: &str,
    ) -> Result<Vec<TableEvent>> {
        let row_count = self.rows.len();
        let Some(target) = self.rows.get_mut(row) else {
            bail!("row {row} is out of range; the table has {row_count} rows");
        };

        let mut touched_status = false;
        let mut matched = false;
        for (column, cell) in self.columns.iter().zip(target.cells.iter_mut()) {
            if column.key == key {
                matched = true;
                touched_status |= column.kind.is_status();
                value.clone_into(cell);
            }
        }
        if !matched {
            bail!("column {key:?} is not part of the table schema");
        }

        let mut events = vec![TableEvent::CellChanged {
            row,
            key: key.to_owned(),
        }];
        if touched_status {
            events.extend(self.recompute_visibility());
        }
        Ok(events)
    }

    pub fn apply_visibility_filter(&mut self, hide_completed: bool) -> Vec<TableEvent> {
        self.hide_completed = hide_completed;
        let mut events = vec![TableEvent::FilterChanged(hide_completed)];
        events.extend(self.recompute_visibility());
        events
    }

    pub fn dispatch(&mut self, command: TableCommand) -> Result<Vec<TableEvent>> {
        match command {
            TableCommand::SetCell { row, key, value } => self.set_cell_value(row, &key, &value),
            TableCommand::AddRow => Ok(self.add_row()),
            TableCommand::SetFilter(hide) => Ok(self.apply_visibility_filter(hide)),
        }
    }

    fn row_has_completed(&self, row: &TableRow) -> bool {
        self.columns
            .iter()
            .zip(&row.cells)
            .any(|(column, value)| column.kind.is_status() && value.trim() == DONE)
    }

    fn recompute_visibility(&mut self) -> Vec<TableEvent> {
        let hidden: Vec<bool> = self
            .rows
            .iter()
            .map(|row| self.hide_completed && self.row_has_completed(row))
            .collect();

        let mut events = Vec::new();
        for (index, (row, hidden)) in self.rows.iter_mut().zip(hidden).enumerate() {
            if row.hidden != hidden {
                row.hidden = hidden;
                events.push(TableEvent::RowVisibilityChanged { row: index, hidden });
            }
        }
        events
    }
}

#[cfg(test)]
mod tests {
    use super::{TableCommand, TableEvent, TableState};
    use crate::{LayoutPolicy, Row, derive_columns, merge_rows};
    use anyhow::Result;

    fn two_pair_table() -> TableState {
        TableState::new(derive_columns(&["L7", "P7", "L6", "P6"], LayoutPolicy::CappedForward))
    }

    fn row(fields: &[(&str, &str)]) -> Row {
        fields.iter().copied().collect()
    }

    #[test]
    fn seed_defaults_missing_fields_to_empty() {
        let mut table = two_pair_table();
        table.seed(&[row(&[("L7", "Intro")])]);

        assert_eq!(table.row_count(), 1);
        assert_eq!(table.value(0, "L7"), Some("Intro"));
        assert_eq!(table.value(0, "P7"), Some(""));
        assert_eq!(
            table.get_rows(),
            vec![row(&[("L7", "Intro"), ("P7", ""), ("L6", ""), ("P6", "")])]
        );
    }

    #[test]
    fn get_rows_follows_schema_order_and_drops_unknown_fields() {
        let mut table = two_pair_table();
        table.seed(&[row(&[("P6", "済"), ("extra", "x"), ("L7", "a")])]);

        let rows = table.get_rows();
        assert_eq!(
            rows[0].keys().collect::<Vec<_>>(),
            vec!["L7", "P7", "L6", "P6"]
        );
        assert!(!rows[0].contains_key("extra"));
    }

    #[test]
    fn edits_are_visible_immediately() -> Result<()> {
        let mut table = two_pair_table();
        table.seed(&[row(&[])]);

        let events = table.set_cell_value(0, "L7", "Chapter, one")?;
        assert_eq!(
            events,
            vec![TableEvent::CellChanged {
                row: 0,
                key: "L7".to_owned()
            }]
        );
        assert_eq!(table.get_rows()[0].get("L7"), "Chapter, one");
        Ok(())
    }

    #[test]
    fn add_row_appends_blank_row() {
        let mut table = two_pair_table();
        table.seed(&[row(&[("L7", "a")])]);

        let events = table.add_row();
        assert_eq!(events, vec![TableEvent::RowAdded(1)]);
        assert_eq!(table.row_count(), 2);
        assert!(table.get_rows()[1].iter().all(|(_, value)| value.is_empty()));
    }

    #[test]
    fn filter_hides_rows_with_done_status() {
        let mut table = two_pair_table();
        table.seed(&[
            row(&[("P7", "済")]),
            row(&[("P6", "済 ")]),
            row(&[("P7", "保留")]),
            row(&[("L7", "済")]),
        ]);

        assert_eq!(table.visible_rows().len(), 4);

        let events = table.apply_visibility_filter(true);
        assert_eq!(events[0], TableEvent::FilterChanged(true));
        assert!(table.is_hidden(0));
        assert!(table.is_hidden(1));
        assert!(!table.is_hidden(2));
        assert!(!table.is_hidden(3), "text columns never hide a row");
        assert_eq!(table.visible_rows(), vec![2, 3]);

        table.apply_visibility_filter(false);
        assert_eq!(table.visible_rows(), vec![0, 1, 2, 3]);
        assert_eq!(table.row_count(), 4);
    }

    #[test]
    fn status_edit_recomputes_visibility() -> Result<()> {
        let mut table = two_pair_table();
        table.seed(&[row(&[])]);
        table.apply_visibility_filter(true);

        let events = table.set_cell_value(0, "P7", "済")?;
        assert_eq!(
            events,
            vec![
                TableEvent::CellChanged {
                    row: 0,
                    key: "P7".to_owned()
                },
                TableEvent::RowVisibilityChanged {
                    row: 0,
                    hidden: true
                },
            ]
        );

        table.set_cell_value(0, "P7", "")?;
        assert!(!table.is_hidden(0));
        Ok(())
    }

    #[test]
    fn open_vocabulary_status_survives_other_edits() -> Result<()> {
        let mut table = two_pair_table();
        table.seed(&[row(&[("P7", "途中")])]);

        table.set_cell_value(0, "L7", "edited")?;
        table.set_cell_value(0, "P6", "済")?;

        assert_eq!(table.value(0, "P7"), Some("途中"));
        assert_eq!(
            table.status_options(0, 1),
            Some(vec!["".to_owned(), "済".to_owned(), "途中".to_owned()])
        );
        assert_eq!(table.status_options(0, 0), None);
        Ok(())
    }

    #[test]
    fn set_cell_rejects_unknown_row_or_column() {
        let mut table = two_pair_table();
        table.seed(&[row(&[])]);

        let error = table
            .set_cell_value(3, "L7", "x")
            .expect_err("row out of range should fail");
        assert!(error.to_string().contains("out of range"));

        let error = table
            .set_cell_value(0, "nope", "x")
            .expect_err("unknown column should fail");
        assert!(error.to_string().contains("not part of the table schema"));
    }

    #[test]
    fn duplicate_keys_stay_consistent() -> Result<()> {
        let mut table =
            TableState::new(derive_columns(&["K", "P", "K", "Q"], LayoutPolicy::CappedForward));
        table.seed(&[row(&[("K", "first")])]);
        assert_eq!(table.cell(0, 0), Some("first"));
        assert_eq!(table.cell(0, 2), Some("first"));

        table.set_cell_value(0, "K", "second")?;
        assert_eq!(table.cell(0, 0), Some("second"));
        assert_eq!(table.cell(0, 2), Some("second"));
        assert_eq!(table.get_rows()[0].get("K"), "second");
        assert_eq!(table.get_rows()[0].len(), 3);
        Ok(())
    }

    #[test]
    fn merging_own_snapshot_is_identity() {
        let rows = vec![
            row(&[("L7", "a"), ("P7", "済"), ("L6", ""), ("P6", "")]),
            row(&[("L7", "b"), ("P7", ""), ("L6", "c"), ("P6", "x")]),
        ];
        let mut table = two_pair_table();
        table.seed(&rows);
        let snapshot = table.get_rows();
        assert_eq!(merge_rows(&rows, Some(&snapshot)), rows);
    }

    #[test]
    fn merging_own_snapshot_of_sparse_padded_rows_is_identity() {
        let rows = vec![row(&[("A", "x")]), row(&[("C", "y"), ("D", "済")]), row(&[])];
        let mut table =
            TableState::new(derive_columns(&["A", "B", "C", "D"], LayoutPolicy::ForwardPair));
        table.seed(&rows);
        let snapshot = table.get_rows();
        assert!(snapshot[0].contains_key("__pad4"));
        assert_eq!(merge_rows(&rows, Some(&snapshot)), rows);
    }

    #[test]
    fn final_progress_edit_leaves_same_named_header_alone() -> Result<()> {
        let mut table =
            TableState::new(derive_columns(&["__final_progress", "P"], LayoutPolicy::ReversePair));
        table.seed(&[row(&[("__final_progress", "Level title")])]);

        let final_key = table.columns()[2].key.clone();
        table.set_cell_value(0, &final_key, "済")?;

        assert_eq!(table.value(0, "__final_progress"), Some("Level title"));
        assert_eq!(table.cell(0, 2), Some("済"));
        Ok(())
    }

    #[test]
    fn dispatch_routes_commands() -> Result<()> {
        let mut table = two_pair_table();
        table.seed(&[]);

        table.dispatch(TableCommand::AddRow)?;
        table.dispatch(TableCommand::SetCell {
            row: 0,
            key: "P6".to_owned(),
            value: "済".to_owned(),
        })?;
        let events = table.dispatch(TableCommand::SetFilter(true))?;

        assert_eq!(
            events,
            vec![
                TableEvent::FilterChanged(true),
                TableEvent::RowVisibilityChanged {
                    row: 0,
                    hidden: true
                },
            ]
        );
        assert!(table.hide_completed());
        Ok(())
    }
}
