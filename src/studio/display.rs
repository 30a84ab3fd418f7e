//! Turning query responses into something that can be shown.
//!
//! Depending on the endpoint a row is either an object keyed by column name or an array in
//! column order. Both end up as a [NamedRow] before anything is rendered.
use crate::api::wire::QueryResponse;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A response to `/query` or `/users/get_table_data`, layout differences already smoothed over.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
    pub error: Option<String>,
    /// The SQL the server ran, if it told us.
    pub query: Option<String>,
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Row {
    Named(Map<String, Value>),
    Positional(Vec<Value>),
}

/// Cells in column order; a column the row has no value for holds `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedRow {
    cells: Vec<(String, Value)>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayTable {
    pub columns: Vec<String>,
    pub rows: Vec<NamedRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ResultView {
    Error(String),
    NoResults,
    Table(DisplayTable),
}

impl Row {
    pub fn normalize(&self, columns: &[String]) -> NamedRow {
        let cells = match self {
            Row::Named(values) => columns
                .iter()
                .map(|column| {
                    let value = values.get(column).cloned().unwrap_or(Value::Null);
                    (column.clone(), value)
                })
                .collect(),
            Row::Positional(values) => columns
                .iter()
                .enumerate()
                .map(|(index, column)| {
                    let value = values.get(index).cloned().unwrap_or(Value::Null);
                    (column.clone(), value)
                })
                .collect(),
        };

        NamedRow { cells }
    }
}

impl NamedRow {
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.cells
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    pub fn cells(&self) -> impl Iterator<Item = &Value> {
        self.cells.iter().map(|(_, value)| value)
    }
}

impl From<QueryResponse> for QueryResult {
    fn from(response: QueryResponse) -> Self {
        let table = response.table.unwrap_or_default();
        let error = response
            .error
            .or(table.error)
            .filter(|error| !error.is_empty());

        QueryResult {
            columns: table.columns,
            rows: table.rows,
            error,
            query: table.query.or(response.query),
            created_at: table.created_at,
        }
    }
}

/// An error wins over whatever data came with it.
pub fn deserialize_result(raw: &QueryResult) -> ResultView {
    if let Some(error) = raw.error.as_ref().filter(|error| !error.is_empty()) {
        return ResultView::Error(error.clone());
    }

    if raw.columns.is_empty() || raw.rows.is_empty() {
        return ResultView::NoResults;
    }

    ResultView::Table(DisplayTable::from(raw))
}

impl From<&QueryResult> for DisplayTable {
    fn from(raw: &QueryResult) -> Self {
        DisplayTable {
            columns: raw.columns.clone(),
            rows: raw.rows.iter().map(|row| row.normalize(&raw.columns)).collect(),
        }
    }
}

impl ResultView {
    pub fn table(&self) -> Option<&DisplayTable> {
        match self {
            ResultView::Table(table) => Some(table),
            _ => None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ResultView::Error(_))
    }
}
