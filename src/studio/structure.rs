//! The schema document: which tables can be dragged onto the canvas and what columns they have.
//!
//! It's loaded once at start up and only read after that. Everyone who needs it gets a
//! reference to the same [SchemaCatalog].
use crate::Error;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SchemaCatalog {
    tables: Vec<SchemaTable>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaTable {
    #[serde(rename = "table")]
    pub name: TableName,
    pub columns: Vec<SchemaColumn>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaColumn {
    pub name: ColumnName,
    #[serde(rename = "type")]
    pub column_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Ord, PartialOrd, Hash)]
pub struct ColumnName(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Ord, PartialOrd, Hash)]
pub struct TableName(String);

impl SchemaCatalog {
    pub fn load(path: &Path) -> Result<SchemaCatalog, Error> {
        let catalog = serde_json::from_reader(fs::File::open(path)?)?;

        Ok(catalog)
    }

    pub fn from_json(json: &str) -> Result<SchemaCatalog, Error> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn table(&self, name: &str) -> Option<&SchemaTable> {
        self.tables.iter().find(|table| table.name == name)
    }

    pub fn tables(&self) -> &[SchemaTable] {
        &self.tables
    }
}

impl From<Vec<SchemaTable>> for SchemaCatalog {
    fn from(tables: Vec<SchemaTable>) -> Self {
        SchemaCatalog { tables }
    }
}

impl SchemaTable {
    pub fn column(&self, name: &str) -> Option<&SchemaColumn> {
        self.columns.iter().find(|column| column.name == name)
    }
}

impl TableName {
    pub fn new(name: String) -> Self {
        TableName(name)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl ColumnName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl PartialEq<&str> for ColumnName {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl PartialEq<&str> for TableName {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl<T: Into<String>> From<T> for ColumnName {
    fn from(name: T) -> ColumnName {
        ColumnName(name.into())
    }
}

impl<T: Into<String>> From<T> for TableName {
    fn from(name: T) -> TableName {
        TableName::new(name.into())
    }
}

impl AsRef<str> for ColumnName {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for TableName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Display for ColumnName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Display for SchemaColumn {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.name, self.column_type)
    }
}
