//! JSON bodies exchanged with the server.
//!
//! Responses are lenient: older server versions put the status envelope under `details`
//! instead of `status`, and some query responses carry `query`/`error` at the top level.
use crate::studio::display::Row;
use crate::studio::{Aggregate, Operator, SortDirection};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryRequest {
    pub query_params: Vec<QueryParams>,
    pub options: QueryOptions,
}

/// One table of the composed query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryParams {
    pub table: String,
    pub attributes: Vec<QueryAttribute>,
    pub constraints: Vec<QueryConstraint>,
    pub group_by: Vec<String>,
    pub aggregations: Vec<QueryAggregation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryAttribute {
    pub attribute: String,
    pub alias: String,
}

/// The value is always sent as a string, the server interprets it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryConstraint {
    pub attribute: String,
    pub operator: Operator,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryAggregation {
    pub attribute: String,
    #[serde(rename = "type")]
    pub aggregate: Aggregate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryOptions {
    pub limit: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_by: Option<Vec<OrderByEntry>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderByEntry {
    pub table_name: String,
    pub attribute: String,
    pub sort: SortDirection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Error,
    Warning,
}

/// The envelope most responses carry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<u16>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    #[serde(default, alias = "details")]
    pub status: Option<StatusResponse>,
    #[serde(default)]
    pub table: Option<WireTable>,
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WireTable {
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default)]
    pub rows: Vec<Row>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveTableRequest {
    pub table_name: String,
    pub query: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteTablesRequest {
    pub table_names: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeleteTablesResponse {
    #[serde(default, alias = "details")]
    pub status: Option<StatusResponse>,
    #[serde(default)]
    pub deleted_tables: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedTable {
    pub table_name: String,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GetTablesResponse {
    #[serde(default, alias = "details")]
    pub status: Option<StatusResponse>,
    #[serde(default)]
    pub tables: Vec<SavedTable>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateTableRequest {
    pub query_params: UpdateQueryParams,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateQueryParams {
    pub table: String,
    pub updates: Vec<UpdateAttribute>,
    pub constraints: Vec<UpdateConstraint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateAttribute {
    pub attribute: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateConstraint {
    pub attribute: String,
    pub operator: Operator,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateTableResponse {
    #[serde(default, alias = "details")]
    pub status: Option<StatusResponse>,
    #[serde(default)]
    pub rows_affected: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoginResponse {
    #[serde(default, alias = "details")]
    pub status: Option<StatusResponse>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserInfoResponse {
    #[serde(default, alias = "details")]
    pub status: Option<StatusResponse>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// For endpoints that only answer with the envelope.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnvelopeResponse {
    #[serde(default, alias = "details")]
    pub status: Option<StatusResponse>,
}

/// Responses that may carry a status envelope saying something went wrong even with a 2xx.
pub trait Enveloped {
    fn envelope(&self) -> Option<&StatusResponse>;

    fn failure_message(&self) -> Option<String> {
        match self.envelope() {
            Some(StatusResponse {
                status: Status::Error,
                message,
                ..
            }) => Some(
                message
                    .clone()
                    .unwrap_or_else(|| "Unknown error".to_string()),
            ),
            _ => None,
        }
    }

    fn message(&self) -> Option<&str> {
        self.envelope().and_then(|envelope| envelope.message.as_deref())
    }
}

macro_rules! enveloped {
    ($($response:ty),* $(,)?) => {
        $(
            impl Enveloped for $response {
                fn envelope(&self) -> Option<&StatusResponse> {
                    self.status.as_ref()
                }
            }
        )*
    };
}

enveloped!(
    QueryResponse,
    DeleteTablesResponse,
    GetTablesResponse,
    UpdateTableResponse,
    LoginResponse,
    UserInfoResponse,
    EnvelopeResponse,
);
