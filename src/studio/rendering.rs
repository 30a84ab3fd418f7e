//! Result grid for the terminal, drawn with comfy-table.
use crate::studio::display::{DisplayTable, ResultView};
use comfy_table::presets::ASCII_FULL;
use comfy_table::{Cell, ContentArrangement, Table};
use serde_json::Value;
use std::fmt::{Display, Formatter};

impl DisplayTable {
    pub fn to_grid(&self) -> Table {
        let mut grid = Table::new();
        grid.load_preset(ASCII_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(self.columns.iter().map(Cell::new));

        for row in &self.rows {
            grid.add_row(row.cells().map(render_cell));
        }

        grid
    }
}

impl Display for DisplayTable {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let count = self.rows.len();

        writeln!(f, "{}", self.to_grid())?;
        write!(f, "({count} row{})", if count == 1 { "" } else { "s" })
    }
}

impl Display for ResultView {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ResultView::Error(error) => write!(f, "Error: {error}"),
            ResultView::NoResults => write!(f, "No results"),
            ResultView::Table(table) => write!(f, "{table}"),
        }
    }
}

fn render_cell(value: &Value) -> Cell {
    match value {
        Value::Null => Cell::new("NULL"),
        Value::String(text) => Cell::new(text),
        other => Cell::new(other),
    }
}

#[cfg(test)]
mod tests {
    use crate::studio::display::{deserialize_result, QueryResult, Row};
    use serde_json::json;

    /// The text of every content line, separators left out.
    fn cells(rendered: &str) -> Vec<Vec<String>> {
        rendered
            .lines()
            .filter(|line| line.starts_with('|'))
            .map(|line| {
                line.trim_matches('|')
                    .split('|')
                    .map(|cell| cell.trim().to_string())
                    .collect::<Vec<_>>()
            })
            .filter(|cells| {
                !cells
                    .iter()
                    .all(|cell| cell.chars().all(|c| matches!(c, '-' | '=' | '+')))
            })
            .collect()
    }

    #[test]
    fn renders_a_grid_with_a_row_count() {
        let result = QueryResult {
            columns: vec!["id".to_string(), "email".to_string()],
            rows: vec![
                Row::Positional(vec![json!(1), json!("ann@example.com")]),
                Row::Positional(vec![json!(12), json!(null)]),
            ],
            ..Default::default()
        };

        let rendered = deserialize_result(&result).to_string();

        assert_eq!(
            cells(&rendered),
            vec![
                vec!["id", "email"],
                vec!["1", "ann@example.com"],
                vec!["12", "NULL"],
            ]
        );
        assert!(rendered.ends_with("(2 rows)"));
    }

    #[test]
    fn a_single_row_is_not_plural() {
        let result = QueryResult {
            columns: vec!["total".to_string()],
            rows: vec![Row::Positional(vec![json!(9.5)])],
            ..Default::default()
        };

        let rendered = deserialize_result(&result).to_string();

        assert_eq!(cells(&rendered), vec![vec!["total"], vec!["9.5"]]);
        assert!(rendered.ends_with("(1 row)"));
    }

    #[test]
    fn renders_the_other_views() {
        let empty = QueryResult::default();
        let failed = QueryResult {
            error: Some("boom".to_string()),
            ..Default::default()
        };

        assert_eq!(deserialize_result(&empty).to_string(), "No results");
        assert_eq!(deserialize_result(&failed).to_string(), "Error: boom");
    }
}
