//! The global sort priority list.
//!
//! Directives are never edited directly, they follow the `order_by` setting of the columns on
//! the canvas. [OrderPriority::apply] must be called for every change that could affect them:
//!
//! ```text
//! ABSENT --(NONE -> ASC|DESC)--> ACTIVE(direction)     appended at the end
//! ACTIVE --(ASC <-> DESC)------> ACTIVE(new direction) stays where it is
//! ACTIVE --(-> NONE | column or table removed)--> ABSENT
//! ```
//!
//! The only way to change precedence is to swap neighbours with [OrderPriority::move_up] and
//! [OrderPriority::move_down].
use crate::studio::canvas::TableId;
use crate::studio::structure::{ColumnName, TableName};
use crate::studio::{OrderBy, SortDirection};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderPriority {
    directives: Vec<OrderDirective>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DirectiveId {
    pub table_id: TableId,
    pub column: ColumnName,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderDirective {
    pub id: DirectiveId,
    pub table_name: TableName,
    pub direction: SortDirection,
}

/// Changes on the canvas the priority list has to follow.
#[derive(Debug, Clone, Copy)]
pub enum OrderEvent<'a> {
    OrderChanged {
        table_id: &'a TableId,
        table_name: &'a TableName,
        column: &'a ColumnName,
        order_by: OrderBy,
    },
    ColumnRemoved {
        table_id: &'a TableId,
        column: &'a ColumnName,
    },
    TableRemoved {
        table_id: &'a TableId,
    },
}

impl OrderPriority {
    pub fn apply(&mut self, event: OrderEvent<'_>) {
        match event {
            OrderEvent::OrderChanged {
                table_id,
                table_name,
                column,
                order_by,
            } => match order_by.direction() {
                Some(direction) => self.activate(table_id, table_name, column, direction),
                None => self.deactivate(|id| id.table_id == *table_id && id.column == *column),
            },
            OrderEvent::ColumnRemoved { table_id, column } => {
                self.deactivate(|id| id.table_id == *table_id && id.column == *column)
            }
            OrderEvent::TableRemoved { table_id } => self.deactivate(|id| id.table_id == *table_id),
        }
    }

    fn activate(
        &mut self,
        table_id: &TableId,
        table_name: &TableName,
        column: &ColumnName,
        direction: SortDirection,
    ) {
        let existing = self
            .directives
            .iter_mut()
            .find(|directive| directive.id.table_id == *table_id && directive.id.column == *column);

        match existing {
            Some(directive) => directive.direction = direction,
            None => {
                debug!("{table_name}.{column} {direction} added to the sort priority");

                self.directives.push(OrderDirective {
                    id: DirectiveId {
                        table_id: table_id.clone(),
                        column: column.clone(),
                    },
                    table_name: table_name.clone(),
                    direction,
                })
            }
        }
    }

    fn deactivate(&mut self, matches: impl Fn(&DirectiveId) -> bool) {
        self.directives.retain(|directive| !matches(&directive.id));
    }

    /// Gives the directive at `index` a higher precedence. Returns false if nothing moved.
    pub fn move_up(&mut self, index: usize) -> bool {
        if index == 0 || index >= self.directives.len() {
            return false;
        }

        self.directives.swap(index, index - 1);

        true
    }

    /// Gives the directive at `index` a lower precedence. Returns false if nothing moved.
    pub fn move_down(&mut self, index: usize) -> bool {
        if index + 1 >= self.directives.len() {
            return false;
        }

        self.directives.swap(index, index + 1);

        true
    }

    /// Most significant first.
    pub fn directives(&self) -> &[OrderDirective] {
        &self.directives
    }

    pub fn is_empty(&self) -> bool {
        self.directives.is_empty()
    }

    pub fn len(&self) -> usize {
        self.directives.len()
    }
}

impl Display for OrderDirective {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{} {}", self.table_name, self.id.column, self.direction)
    }
}
