//! Everything that happens on the query canvas before and after a request is sent.
//!
//! Nothing in here does I/O except [console::Console], which drives the api client.
pub mod canvas;
pub mod console;
pub mod display;
pub mod export;
pub mod order_by;
pub mod rendering;
pub mod serializer;
pub mod structure;
pub mod update;

use crate::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Comparison used by a column constraint or an update condition.
///
/// The pattern operators only make sense for text columns, but that is for the server to decide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operator {
    #[serde(rename = "=")]
    Equals,
    #[serde(rename = "<")]
    LesserThan,
    #[serde(rename = ">")]
    GreaterThan,
    #[serde(rename = "<=")]
    LesserOrEqual,
    #[serde(rename = ">=")]
    GreaterOrEqual,
    #[serde(rename = "!=")]
    NotEquals,
    #[serde(rename = "PREFIX")]
    Prefix,
    #[serde(rename = "SUFFIX")]
    Suffix,
    #[serde(rename = "SUBSTRING")]
    Substring,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregate {
    Sum,
    Avg,
    Min,
    Max,
    Count,
}

/// Per column sort setting. Clicking the sort button cycles through these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderBy {
    #[default]
    None,
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl Operator {
    pub const ALL: [Operator; 9] = [
        Operator::Equals,
        Operator::LesserThan,
        Operator::GreaterThan,
        Operator::LesserOrEqual,
        Operator::GreaterOrEqual,
        Operator::NotEquals,
        Operator::Prefix,
        Operator::Suffix,
        Operator::Substring,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Equals => "=",
            Operator::LesserThan => "<",
            Operator::GreaterThan => ">",
            Operator::LesserOrEqual => "<=",
            Operator::GreaterOrEqual => ">=",
            Operator::NotEquals => "!=",
            Operator::Prefix => "PREFIX",
            Operator::Suffix => "SUFFIX",
            Operator::Substring => "SUBSTRING",
        }
    }
}

impl Aggregate {
    pub fn as_str(&self) -> &'static str {
        match self {
            Aggregate::Sum => "sum",
            Aggregate::Avg => "avg",
            Aggregate::Min => "min",
            Aggregate::Max => "max",
            Aggregate::Count => "count",
        }
    }
}

impl OrderBy {
    /// NONE -> ASC -> DESC -> NONE
    pub fn next(self) -> OrderBy {
        match self {
            OrderBy::None => OrderBy::Asc,
            OrderBy::Asc => OrderBy::Desc,
            OrderBy::Desc => OrderBy::None,
        }
    }

    pub fn direction(self) -> Option<SortDirection> {
        match self {
            OrderBy::None => None,
            OrderBy::Asc => Some(SortDirection::Asc),
            OrderBy::Desc => Some(SortDirection::Desc),
        }
    }
}

impl FromStr for Operator {
    type Err = ValidationError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let upper = input.trim().to_uppercase();

        Operator::ALL
            .into_iter()
            .find(|operator| operator.as_str() == upper)
            .ok_or_else(|| ValidationError::UnknownKeyword(input.to_string(), "operator"))
    }
}

impl FromStr for Aggregate {
    type Err = ValidationError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let aggregate = match input.trim().to_lowercase().as_str() {
            "sum" => Aggregate::Sum,
            "avg" => Aggregate::Avg,
            "min" => Aggregate::Min,
            "max" => Aggregate::Max,
            "count" => Aggregate::Count,
            _ => return Err(ValidationError::UnknownKeyword(input.to_string(), "aggregate")),
        };

        Ok(aggregate)
    }
}

impl FromStr for OrderBy {
    type Err = ValidationError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let order_by = match input.trim().to_uppercase().as_str() {
            "NONE" => OrderBy::None,
            "ASC" => OrderBy::Asc,
            "DESC" => OrderBy::Desc,
            _ => return Err(ValidationError::UnknownKeyword(input.to_string(), "sort order")),
        };

        Ok(order_by)
    }
}

impl Display for Operator {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Display for Aggregate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Display for SortDirection {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SortDirection::Asc => write!(f, "ASC"),
            SortDirection::Desc => write!(f, "DESC"),
        }
    }
}

impl Display for OrderBy {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderBy::None => write!(f, "NONE"),
            OrderBy::Asc => write!(f, "ASC"),
            OrderBy::Desc => write!(f, "DESC"),
        }
    }
}
