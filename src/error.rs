use std::env::VarError;
use std::fmt::{Display, Formatter};
use thiserror::Error;

#[derive(Debug, Error)]
#[error(transparent)]
pub struct Error(Box<ErrorKind>);

impl<E> From<E> for Error
where
    ErrorKind: From<E>,
{
    fn from(value: E) -> Self {
        Error(Box::new(value.into()))
    }
}

#[derive(Debug, Error)]
#[allow(clippy::enum_variant_names)]
pub enum ErrorKind {
    /// Input we rejected before anything was sent over the network.
    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationError),
    #[error("Your session is not valid anymore, please log in again")]
    Unauthorized,
    #[error("You are not logged in")]
    NotLoggedIn,
    /// The server answered, but not with a 2xx.
    #[error("{message}")]
    Api { status: u16, message: String },
    #[error("Could not reach the server:\n{0}")]
    Http(#[from] reqwest::Error),
    #[error("Still busy: {0}")]
    Busy(Action),
    #[error("Internal error:\n{0}")]
    InternalError(#[from] InternalError),
    #[error("Could not find environment variable: \n{0}")]
    EnvVarError(#[from] VarError),
    #[error("IO error:\n{0}")]
    IoError(#[from] std::io::Error),
    #[error("JSON error:\n{0}")]
    JsonError(#[from] serde_json::Error),
    #[error("Error reading data from stdin")]
    DialogueError(#[from] dialoguer::Error),
}

#[derive(Error, Debug)]
pub struct InternalError(pub String);

impl Display for InternalError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("`{0}` is not a valid alias; use letters, digits and underscores, not starting with a digit")]
    InvalidAlias(String),
    #[error("The {0} table is not part of the schema")]
    UnknownTable(String),
    #[error("The {table} table has no {column} column")]
    UnknownColumn { table: String, column: String },
    #[error("The {0} table is not on the canvas")]
    TableNotOnCanvas(String),
    #[error("The {table} table already selects {column}")]
    DuplicateColumn { table: String, column: String },
    #[error("No column with id {0}")]
    UnknownColumnId(String),
    #[error("Please enter a valid table name")]
    EmptyTableName,
    #[error("An update needs at least one value to set and one condition")]
    IncompleteUpdate,
    #[error("There is no query to save, run one first")]
    NothingToSave,
    #[error("`{0}` is not a valid {1}")]
    UnknownKeyword(String, &'static str),
}

/// Every user triggered request has its own in-flight flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    RunQuery,
    SaveTable,
    UpdateTable,
    DeleteTables,
    FetchTables,
    FetchTableData,
    Login,
    Register,
}

impl Display for Action {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Action::RunQuery => "Running the query",
            Action::SaveTable => "Saving the table",
            Action::UpdateTable => "Updating the table",
            Action::DeleteTables => "Deleting tables",
            Action::FetchTables => "Fetching your tables",
            Action::FetchTableData => "Fetching table data",
            Action::Login => "Logging in",
            Action::Register => "Registering",
        };

        write!(f, "{name}")
    }
}

impl Error {
    pub fn kind(&self) -> &ErrorKind {
        &self.0
    }

    pub fn into_inner(self) -> ErrorKind {
        *self.0
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(*self.0, ErrorKind::Unauthorized)
    }
}
