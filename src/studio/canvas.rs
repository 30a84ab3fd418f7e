//! The query canvas: tables dragged onto it and what the user did to their columns.
//!
//! All mutations go through [Canvas] so the sort priority list stays in sync with the columns.
use crate::api::wire::QueryRequest;
use crate::studio::order_by::{OrderDirective, OrderEvent, OrderPriority};
use crate::studio::serializer::serialize;
use crate::studio::structure::{ColumnName, SchemaColumn, SchemaTable, TableName};
use crate::studio::{Aggregate, Operator, OrderBy};
use crate::ValidationError;
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::num::IntErrorKind;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Canvas {
    tables: Vec<TableSelection>,
    order_priority: OrderPriority,
    limit: Option<u32>,
}

/// A table placed on the canvas.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableSelection {
    pub id: TableId,
    pub name: TableName,
    pub schema_columns: Vec<SchemaColumn>,
    columns: Vec<ColumnConfig>,
    next_column_seq: u32,
}

/// One projected column and everything the user configured for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnConfig {
    pub id: ColumnId,
    pub name: ColumnName,
    pub column_type: String,
    alias: String,
    pub constraint: Constraint,
    pub group_by: bool,
    pub aggregate: Option<Aggregate>,
    order_by: OrderBy,
}

/// The value is only used when an operator is set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constraint {
    pub operator: Option<Operator>,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableId(String);

/// Unique within the owning table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnId(String);

static VALID_ALIAS: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-zA-Z_][a-zA-Z0-9_]*$").unwrap());

pub fn is_valid_alias(alias: &str) -> bool {
    alias.is_empty() || VALID_ALIAS.is_match(alias)
}

impl Canvas {
    /// Dropping a table that is already on the canvas does nothing.
    pub fn drop_table(&mut self, table: &SchemaTable) -> &TableSelection {
        let id = TableId::for_table(table.name.as_str());

        let index = match self.tables.iter().position(|selection| selection.id == id) {
            Some(index) => index,
            None => {
                debug!("{} dropped on the canvas", table.name);
                self.tables.push(TableSelection::new(id, table));
                self.tables.len() - 1
            }
        };

        &self.tables[index]
    }

    pub fn remove_table(&mut self, table_id: &TableId) -> Result<TableSelection, ValidationError> {
        let index = self
            .tables
            .iter()
            .position(|selection| selection.id == *table_id)
            .ok_or_else(|| ValidationError::TableNotOnCanvas(table_id.table_name().to_string()))?;

        self.order_priority
            .apply(OrderEvent::TableRemoved { table_id });

        Ok(self.tables.remove(index))
    }

    pub fn add_column(&mut self, table_id: &TableId, column: &str) -> Result<ColumnId, ValidationError> {
        self.table_mut(table_id)?.add_column(column)
    }

    pub fn remove_column(
        &mut self,
        table_id: &TableId,
        column_id: &ColumnId,
    ) -> Result<ColumnConfig, ValidationError> {
        let table = self.table_mut(table_id)?;
        let index = table.position(column_id)?;
        let removed = table.columns.remove(index);

        self.order_priority.apply(OrderEvent::ColumnRemoved {
            table_id,
            column: &removed.name,
        });

        Ok(removed)
    }

    /// Invalid aliases are rejected and the previous alias is kept.
    pub fn set_alias(
        &mut self,
        table_id: &TableId,
        column_id: &ColumnId,
        alias: &str,
    ) -> Result<(), ValidationError> {
        if !is_valid_alias(alias) {
            return Err(ValidationError::InvalidAlias(alias.to_string()));
        }

        self.column_mut(table_id, column_id)?.alias = alias.to_string();

        Ok(())
    }

    pub fn set_constraint_operator(
        &mut self,
        table_id: &TableId,
        column_id: &ColumnId,
        operator: Option<Operator>,
    ) -> Result<(), ValidationError> {
        self.column_mut(table_id, column_id)?.constraint.operator = operator;

        Ok(())
    }

    pub fn set_constraint_value(
        &mut self,
        table_id: &TableId,
        column_id: &ColumnId,
        value: &str,
    ) -> Result<(), ValidationError> {
        self.column_mut(table_id, column_id)?.constraint.value = value.to_string();

        Ok(())
    }

    pub fn set_group_by(
        &mut self,
        table_id: &TableId,
        column_id: &ColumnId,
        group_by: bool,
    ) -> Result<(), ValidationError> {
        self.column_mut(table_id, column_id)?.group_by = group_by;

        Ok(())
    }

    pub fn set_aggregate(
        &mut self,
        table_id: &TableId,
        column_id: &ColumnId,
        aggregate: Option<Aggregate>,
    ) -> Result<(), ValidationError> {
        self.column_mut(table_id, column_id)?.aggregate = aggregate;

        Ok(())
    }

    /// What clicking the sort button does.
    pub fn cycle_order_by(
        &mut self,
        table_id: &TableId,
        column_id: &ColumnId,
    ) -> Result<OrderBy, ValidationError> {
        let next = self.column(table_id, column_id)?.order_by.next();

        self.set_order_by(table_id, column_id, next)?;

        Ok(next)
    }

    pub fn set_order_by(
        &mut self,
        table_id: &TableId,
        column_id: &ColumnId,
        order_by: OrderBy,
    ) -> Result<(), ValidationError> {
        let table_index = self.table_index(table_id)?;
        let table = &mut self.tables[table_index];
        let column_index = table.position(column_id)?;
        table.columns[column_index].order_by = order_by;

        let table = &self.tables[table_index];
        self.order_priority.apply(OrderEvent::OrderChanged {
            table_id,
            table_name: &table.name,
            column: &table.columns[column_index].name,
            order_by,
        });

        Ok(())
    }

    pub fn move_directive_up(&mut self, index: usize) -> bool {
        self.order_priority.move_up(index)
    }

    pub fn move_directive_down(&mut self, index: usize) -> bool {
        self.order_priority.move_down(index)
    }

    pub fn order_priority(&self) -> &[OrderDirective] {
        self.order_priority.directives()
    }

    pub fn tables(&self) -> &[TableSelection] {
        &self.tables
    }

    pub fn table(&self, table_id: &TableId) -> Result<&TableSelection, ValidationError> {
        self.tables
            .iter()
            .find(|selection| selection.id == *table_id)
            .ok_or_else(|| ValidationError::TableNotOnCanvas(table_id.table_name().to_string()))
    }

    pub fn column(&self, table_id: &TableId, column_id: &ColumnId) -> Result<&ColumnConfig, ValidationError> {
        let table = self.table(table_id)?;

        Ok(&table.columns[table.position(column_id)?])
    }

    /// Columns are only configured once per table, so the name is enough to find one.
    pub fn column_id_by_name(&self, table_id: &TableId, column: &str) -> Result<ColumnId, ValidationError> {
        let table = self.table(table_id)?;

        table
            .column_by_name(column)
            .map(|config| config.id.clone())
            .ok_or_else(|| ValidationError::UnknownColumn {
                table: table.name.to_string(),
                column: column.to_string(),
            })
    }

    /// Aggregations only make sense once something is grouped.
    pub fn has_group_by(&self) -> bool {
        self.tables.iter().any(TableSelection::has_group_by)
    }

    pub fn limit(&self) -> Option<u32> {
        self.limit
    }

    pub fn set_limit(&mut self, limit: Option<u32>) {
        self.limit = limit;
    }

    /// Behaves like the limit input box: empty input clears the limit, a positive number sets
    /// it (numbers too big to store become the largest one) and anything else is ignored.
    pub fn set_limit_input(&mut self, input: &str) {
        let input = input.trim();

        if input.is_empty() {
            self.limit = None;
            return;
        }

        match input.parse::<u64>() {
            Ok(0) => {}
            Ok(limit) => self.limit = Some(u32::try_from(limit).unwrap_or(u32::MAX)),
            Err(error) if *error.kind() == IntErrorKind::PosOverflow => self.limit = Some(u32::MAX),
            Err(_) => {}
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn to_request(&self) -> QueryRequest {
        serialize(
            &self.tables,
            self.limit.map(i64::from),
            self.order_priority.directives(),
        )
    }

    fn table_index(&self, table_id: &TableId) -> Result<usize, ValidationError> {
        self.tables
            .iter()
            .position(|selection| selection.id == *table_id)
            .ok_or_else(|| ValidationError::TableNotOnCanvas(table_id.table_name().to_string()))
    }

    fn table_mut(&mut self, table_id: &TableId) -> Result<&mut TableSelection, ValidationError> {
        let index = self.table_index(table_id)?;

        Ok(&mut self.tables[index])
    }

    fn column_mut(
        &mut self,
        table_id: &TableId,
        column_id: &ColumnId,
    ) -> Result<&mut ColumnConfig, ValidationError> {
        let table = self.table_mut(table_id)?;
        let index = table.position(column_id)?;

        Ok(&mut table.columns[index])
    }
}

impl TableSelection {
    /// Starts out with one column config per schema column.
    fn new(id: TableId, table: &SchemaTable) -> Self {
        let mut selection = TableSelection {
            id,
            name: table.name.clone(),
            schema_columns: table.columns.clone(),
            columns: Vec::with_capacity(table.columns.len()),
            next_column_seq: 0,
        };

        for column in &table.columns {
            selection.push_default_column(column.clone());
        }

        selection
    }

    /// In the order they were added, which is not necessarily the schema order.
    pub fn columns(&self) -> &[ColumnConfig] {
        &self.columns
    }

    pub fn column_by_name(&self, name: &str) -> Option<&ColumnConfig> {
        self.columns.iter().find(|column| column.name == name)
    }

    /// Schema columns that could still be added.
    pub fn available_columns(&self) -> impl Iterator<Item = &SchemaColumn> {
        self.schema_columns
            .iter()
            .filter(|schema_column| self.column_by_name(schema_column.name.as_str()).is_none())
    }

    pub fn has_group_by(&self) -> bool {
        self.columns.iter().any(|column| column.group_by)
    }

    fn add_column(&mut self, column: &str) -> Result<ColumnId, ValidationError> {
        let schema_column = self
            .schema_columns
            .iter()
            .find(|schema_column| schema_column.name == column)
            .cloned()
            .ok_or_else(|| ValidationError::UnknownColumn {
                table: self.name.to_string(),
                column: column.to_string(),
            })?;

        if self.column_by_name(column).is_some() {
            return Err(ValidationError::DuplicateColumn {
                table: self.name.to_string(),
                column: column.to_string(),
            });
        }

        Ok(self.push_default_column(schema_column))
    }

    fn push_default_column(&mut self, schema_column: SchemaColumn) -> ColumnId {
        let id = ColumnId(format!(
            "{}-{}-{}",
            self.name, schema_column.name, self.next_column_seq
        ));
        self.next_column_seq += 1;

        self.columns.push(ColumnConfig {
            id: id.clone(),
            name: schema_column.name,
            column_type: schema_column.column_type,
            alias: String::new(),
            constraint: Constraint::default(),
            group_by: false,
            aggregate: None,
            order_by: OrderBy::None,
        });

        id
    }

    fn position(&self, column_id: &ColumnId) -> Result<usize, ValidationError> {
        self.columns
            .iter()
            .position(|column| column.id == *column_id)
            .ok_or_else(|| ValidationError::UnknownColumnId(column_id.to_string()))
    }
}

impl ColumnConfig {
    pub fn alias(&self) -> &str {
        &self.alias
    }

    pub fn order_by(&self) -> OrderBy {
        self.order_by
    }
}

impl Constraint {
    /// Both halves are needed before the server sees it.
    pub fn is_complete(&self) -> bool {
        self.operator.is_some() && !self.value.is_empty()
    }
}

impl TableId {
    /// A table can only be on the canvas once, so its name is enough.
    pub fn for_table(table_name: &str) -> Self {
        TableId(format!("{table_name}-table"))
    }

    pub fn table_name(&self) -> &str {
        self.0.strip_suffix("-table").unwrap_or(&self.0)
    }
}

impl Display for TableId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Display for ColumnId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
