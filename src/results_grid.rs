//! Results Grid Module for HRDesk
//!
//! Projects raw result sets into a rendering-ready tabular model and keeps
//! the model currently on display. Every projection replaces the displayed
//! model in full; rows are never merged or appended.

use crate::core::db::{CellValue, ResultSet, TableDefinition};
use crate::core::{HrdeskError, Result};
use std::collections::BTreeMap;
use std::str::FromStr;

/// Column names plus rows of driver values, ready to render
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TabularModel {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl TabularModel {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Value of the named column in the given row
    pub fn cell(&self, row: usize, column: &str) -> Option<&CellValue> {
        let index = self.columns.iter().position(|c| c == column)?;
        self.rows.get(row)?.get(index)
    }
}

/// Converts a result set into a tabular model without touching the values.
pub fn project(result: ResultSet) -> TabularModel {
    TabularModel {
        columns: result.columns,
        rows: result.rows,
    }
}

/// Supported export formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
    Markdown,
}

impl FromStr for ExportFormat {
    type Err = HrdeskError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            "markdown" | "md" => Ok(ExportFormat::Markdown),
            _ => Err(HrdeskError::Command(format!(
                "Unsupported export format: '{}'. Supported formats: csv, json, markdown",
                s
            ))),
        }
    }
}

/// The grid shown to the user
#[derive(Debug, Clone, Default)]
pub struct ResultsGrid {
    model: TabularModel,
}

impl ResultsGrid {
    pub fn new() -> Self {
        ResultsGrid::default()
    }

    pub fn model(&self) -> &TabularModel {
        &self.model
    }

    /// Replaces whatever is displayed with the given model.
    pub fn display(&mut self, model: TabularModel) {
        self.model = model;
    }

    /// Shows a table's columns with no rows, as when a table is first picked.
    pub fn reset_for(&mut self, table: &TableDefinition) {
        self.model = TabularModel {
            columns: table.column_names(),
            rows: Vec::new(),
        };
    }

    /// Renders the grid as aligned text with a header underline.
    pub fn render(&self) -> String {
        if self.model.columns.is_empty() {
            return String::new();
        }

        let cells: Vec<Vec<String>> = self
            .model
            .rows
            .iter()
            .map(|row| row.iter().map(|v| v.to_string()).collect())
            .collect();
        let widths: Vec<usize> = self
            .model
            .columns
            .iter()
            .enumerate()
            .map(|(i, header)| {
                cells
                    .iter()
                    .filter_map(|row| row.get(i))
                    .map(|c| c.chars().count())
                    .chain(std::iter::once(header.chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let pad_line = |values: Vec<&str>| -> String {
            values
                .iter()
                .zip(&widths)
                .map(|(v, w)| format!("{:<width$}", v, width = *w))
                .collect::<Vec<_>>()
                .join(" | ")
                .trim_end()
                .to_string()
        };

        let mut output = String::new();
        output.push_str(&pad_line(self.model.columns.iter().map(String::as_str).collect()));
        output.push('\n');
        output.push_str(
            &widths
                .iter()
                .map(|w| "-".repeat(*w))
                .collect::<Vec<_>>()
                .join("-|-"),
        );
        output.push('\n');
        for row in &cells {
            output.push_str(&pad_line(row.iter().map(String::as_str).collect()));
            output.push('\n');
        }
        output
    }

    /// Exports the displayed model in the given format.
    pub fn export(&self, format: ExportFormat) -> Result<String> {
        match format {
            ExportFormat::Csv => Ok(self.export_to_csv()),
            ExportFormat::Json => self.export_to_json(),
            ExportFormat::Markdown => Ok(self.export_to_markdown()),
        }
    }

    fn export_to_csv(&self) -> String {
        let mut output = String::new();
        if !self.model.columns.is_empty() {
            let headers: Vec<String> = self.model.columns.iter().map(|h| csv_field(h)).collect();
            output.push_str(&headers.join(","));
            output.push('\n');
        }
        for row in &self.model.rows {
            let fields: Vec<String> = row
                .iter()
                .map(|value| match value {
                    CellValue::Null => String::new(),
                    other => csv_field(&other.to_string()),
                })
                .collect();
            output.push_str(&fields.join(","));
            output.push('\n');
        }
        output
    }

    fn export_to_json(&self) -> Result<String> {
        let rows: Vec<BTreeMap<&str, &CellValue>> = self
            .model
            .rows
            .iter()
            .map(|row| {
                self.model
                    .columns
                    .iter()
                    .map(String::as_str)
                    .zip(row.iter())
                    .collect()
            })
            .collect();
        Ok(serde_json::to_string(&rows)?)
    }

    fn export_to_markdown(&self) -> String {
        let mut output = String::new();
        if self.model.columns.is_empty() {
            return output;
        }
        output.push_str(&format!("| {} |\n", self.model.columns.join(" | ")));
        let underline: Vec<String> = self
            .model
            .columns
            .iter()
            .map(|h| "-".repeat(h.len().max(3)))
            .collect();
        output.push_str(&format!("| {} |\n", underline.join(" | ")));
        for row in &self.model.rows {
            let values: Vec<String> = row
                .iter()
                .map(|v| v.to_string().replace('|', "\\|"))
                .collect();
            output.push_str(&format!("| {} |\n", values.join(" | ")));
        }
        output
    }
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::db::hr_schema;

    fn sample_model() -> TabularModel {
        project(ResultSet {
            columns: vec!["ID".to_string(), "Name".to_string()],
            rows: vec![
                vec![CellValue::Integer(1), CellValue::Text("Alice".into())],
                vec![CellValue::Integer(2), CellValue::Null],
            ],
        })
    }

    #[test]
    fn test_render_empty_grid() {
        let grid = ResultsGrid::new();
        assert_eq!(grid.render(), "");
    }

    #[test]
    fn test_render_with_headers_and_rows() {
        let mut grid = ResultsGrid::new();
        grid.display(sample_model());
        let rendered = grid.render();
        assert_eq!(rendered, "ID | Name\n---|------\n1  | Alice\n2  | NULL\n");
    }

    #[test]
    fn test_display_replaces_previous_model() {
        let mut grid = ResultsGrid::new();
        grid.display(sample_model());
        grid.display(TabularModel {
            columns: vec!["X".to_string()],
            rows: vec![vec![CellValue::Real(1.5)]],
        });
        assert_eq!(grid.model().columns, vec!["X"]);
        assert_eq!(grid.model().row_count(), 1);
    }

    #[test]
    fn test_reset_for_table() {
        let mut grid = ResultsGrid::new();
        grid.display(sample_model());
        grid.reset_for(hr_schema().table("Department").unwrap());
        assert_eq!(grid.model().columns, vec!["DepartmentID", "DepartmentName"]);
        assert!(grid.model().is_empty());
    }

    #[test]
    fn test_cell_lookup() {
        let model = sample_model();
        assert_eq!(model.cell(0, "Name"), Some(&CellValue::Text("Alice".into())));
        assert_eq!(model.cell(1, "Missing"), None);
        assert_eq!(model.cell(5, "ID"), None);
    }

    #[test]
    fn test_export_to_csv_quotes_fields() {
        let mut grid = ResultsGrid::new();
        grid.display(TabularModel {
            columns: vec!["Street".to_string(), "City".to_string()],
            rows: vec![vec![
                CellValue::Text("1 Main St, Apt \"B\"".into()),
                CellValue::Null,
            ]],
        });
        let csv = grid.export(ExportFormat::Csv).unwrap();
        assert_eq!(csv, "Street,City\n\"1 Main St, Apt \"\"B\"\"\",\n");
    }

    #[test]
    fn test_export_to_json_keeps_types() {
        let mut grid = ResultsGrid::new();
        grid.display(sample_model());
        let json = grid.export(ExportFormat::Json).unwrap();
        assert_eq!(json, r#"[{"ID":1,"Name":"Alice"},{"ID":2,"Name":null}]"#);
    }

    #[test]
    fn test_export_to_markdown() {
        let mut grid = ResultsGrid::new();
        grid.display(sample_model());
        let markdown = grid.export(ExportFormat::Markdown).unwrap();
        let lines: Vec<&str> = markdown.lines().collect();
        assert_eq!(lines, vec!["| ID | Name |", "| --- | ---- |", "| 1 | Alice |", "| 2 | NULL |"]);
    }

    #[test]
    fn test_export_format_parsing() {
        assert_eq!("CSV".parse::<ExportFormat>().unwrap(), ExportFormat::Csv);
        assert_eq!("md".parse::<ExportFormat>().unwrap(), ExportFormat::Markdown);
        match "xml".parse::<ExportFormat>() {
            Err(HrdeskError::Command(msg)) => {
                assert!(msg.contains("Unsupported export format"));
                assert!(msg.contains("xml"));
            }
            other => panic!("Expected Command error, got {:?}", other),
        }
    }
}
