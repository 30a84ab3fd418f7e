//! The "update table" form of a saved table.
//!
//! Rows that are only half filled in are dropped on submit, the same way the form's submit
//! button only looks at rows it can send.
use crate::api::wire::{
    Status, UpdateAttribute, UpdateConstraint, UpdateQueryParams, UpdateTableRequest,
    UpdateTableResponse,
};
use crate::studio::Operator;
use crate::ValidationError;
use std::str::FromStr;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateForm {
    pub table: String,
    pub set: Vec<SetRow>,
    pub conditions: Vec<WhereRow>,
}

/// `attribute = value`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SetRow {
    pub attribute: String,
    pub value: String,
}

/// `attribute <operator> value`, where the value may be left empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WhereRow {
    pub attribute: String,
    pub operator: Option<Operator>,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateResult {
    pub success: bool,
    pub message: Option<String>,
    pub rows_affected: u64,
}

impl UpdateForm {
    pub fn new(table: impl Into<String>) -> Self {
        UpdateForm {
            table: table.into(),
            ..Default::default()
        }
    }

    pub fn can_submit(&self) -> bool {
        self.set.iter().any(SetRow::is_usable) && self.conditions.iter().any(WhereRow::is_usable)
    }

    pub fn into_request(self) -> Result<UpdateTableRequest, ValidationError> {
        if !self.can_submit() {
            return Err(ValidationError::IncompleteUpdate);
        }

        let updates = self
            .set
            .into_iter()
            .filter(SetRow::is_usable)
            .map(|row| UpdateAttribute {
                attribute: row.attribute,
                value: row.value,
            })
            .collect();

        let constraints = self
            .conditions
            .into_iter()
            .filter_map(|row| {
                Some(UpdateConstraint {
                    operator: row.operator.filter(|_| !row.attribute.is_empty())?,
                    attribute: row.attribute,
                    value: row.value,
                })
            })
            .collect();

        Ok(UpdateTableRequest {
            query_params: UpdateQueryParams {
                table: self.table,
                updates,
                constraints,
            },
        })
    }
}

impl SetRow {
    fn is_usable(&self) -> bool {
        !self.attribute.is_empty() && !self.value.is_empty()
    }
}

impl WhereRow {
    fn is_usable(&self) -> bool {
        !self.attribute.is_empty() && self.operator.is_some()
    }
}

impl FromStr for SetRow {
    type Err = ValidationError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let (attribute, value) = input
            .split_once('=')
            .ok_or_else(|| ValidationError::UnknownKeyword(input.to_string(), "assignment"))?;

        Ok(SetRow {
            attribute: attribute.trim().to_string(),
            value: value.trim().to_string(),
        })
    }
}

impl FromStr for WhereRow {
    type Err = ValidationError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let mut parts = input.trim().splitn(3, char::is_whitespace);
        let attribute = parts.next().unwrap_or_default();
        let operator = parts
            .next()
            .ok_or_else(|| ValidationError::UnknownKeyword(input.to_string(), "condition"))?;

        Ok(WhereRow {
            attribute: attribute.to_string(),
            operator: Some(operator.parse()?),
            value: parts.next().unwrap_or_default().trim().to_string(),
        })
    }
}

impl From<UpdateTableResponse> for UpdateResult {
    fn from(response: UpdateTableResponse) -> Self {
        let (success, message) = match response.status {
            Some(status) => (status.status == Status::Success, status.message),
            None => (true, None),
        };

        UpdateResult {
            success,
            message,
            rows_affected: response.rows_affected.unwrap_or_default(),
        }
    }
}
