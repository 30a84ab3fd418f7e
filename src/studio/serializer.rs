//! Flattens the canvas into the body of `POST /query`.
//!
//! This never fails: anything missing or out of range falls back to a default, and whatever
//! doesn't make sense together (aggregations without a group by) is left for the server to judge.
use crate::api::wire::{
    OrderByEntry, QueryAggregation, QueryAttribute, QueryConstraint, QueryOptions, QueryParams,
    QueryRequest,
};
use crate::studio::canvas::{ColumnConfig, TableSelection};
use crate::studio::order_by::OrderDirective;
use log::debug;

pub const MAX_LIMIT: u32 = 1000;

pub fn serialize(
    tables: &[TableSelection],
    limit: Option<i64>,
    order_priority: &[OrderDirective],
) -> QueryRequest {
    let request = QueryRequest {
        query_params: tables.iter().map(serialize_table).collect(),
        options: QueryOptions {
            limit: effective_limit(limit),
            order_by: serialize_order_by(order_priority),
        },
    };

    debug!("serialized {} table(s), limit {}", request.query_params.len(), request.options.limit);

    request
}

/// Anything outside of 1..=1000 means "as much as allowed".
pub fn effective_limit(limit: Option<i64>) -> u32 {
    match limit {
        Some(limit) if limit > 0 && limit <= MAX_LIMIT as i64 => limit as u32,
        _ => MAX_LIMIT,
    }
}

fn serialize_table(table: &TableSelection) -> QueryParams {
    let columns = table.columns();

    if columns.is_empty() {
        return QueryParams {
            table: table.name.to_string(),
            attributes: table
                .schema_columns
                .iter()
                .map(|column| QueryAttribute {
                    attribute: column.name.to_string(),
                    alias: String::new(),
                })
                .collect(),
            constraints: Vec::new(),
            group_by: Vec::new(),
            aggregations: Vec::new(),
        };
    }

    QueryParams {
        table: table.name.to_string(),
        attributes: columns.iter().map(attribute).collect(),
        constraints: columns.iter().filter_map(constraint).collect(),
        group_by: columns
            .iter()
            .filter(|column| column.group_by)
            .map(|column| column.name.to_string())
            .collect(),
        aggregations: columns.iter().filter_map(aggregation).collect(),
    }
}

fn attribute(column: &ColumnConfig) -> QueryAttribute {
    QueryAttribute {
        attribute: column.name.to_string(),
        alias: column.alias().to_string(),
    }
}

fn constraint(column: &ColumnConfig) -> Option<QueryConstraint> {
    if !column.constraint.is_complete() {
        return None;
    }

    Some(QueryConstraint {
        attribute: column.name.to_string(),
        operator: column.constraint.operator?,
        value: column.constraint.value.clone(),
    })
}

fn aggregation(column: &ColumnConfig) -> Option<QueryAggregation> {
    column.aggregate.map(|aggregate| QueryAggregation {
        attribute: column.name.to_string(),
        aggregate,
    })
}

fn serialize_order_by(order_priority: &[OrderDirective]) -> Option<Vec<OrderByEntry>> {
    if order_priority.is_empty() {
        return None;
    }

    Some(
        order_priority
            .iter()
            .map(|directive| OrderByEntry {
                table_name: directive.table_name.to_string(),
                attribute: directive.id.column.to_string(),
                sort: directive.direction,
            })
            .collect(),
    )
}
