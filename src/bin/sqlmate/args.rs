use clap::{Parser, Subcommand};
use sqlmate::studio::update::{SetRow, WhereRow};
use sqlmate::studio::{Aggregate, Operator, OrderBy};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Creates an account. You will be asked for a password.
    Register { username: String, email: String },
    /// Logs in and remembers the session for the configured server.
    Login { username: String },
    /// Forgets the session token.
    Logout,
    /// Shows who the server thinks you are.
    Whoami,
    /// Deletes your account and everything saved with it.
    DeleteAccount {
        /// Don't ask for confirmation
        #[arg(long)]
        yes: bool,
    },
    /// Lists the tables of the schema document, the ones you can put on the canvas.
    Schema,
    /// Builds the query, one change at a time.
    #[command(subcommand)]
    Canvas(CanvasCommand),
    /// Sets the row limit. An empty value clears it, anything above 1000 is capped.
    Limit { value: Option<String> },
    /// Runs the query on the canvas and shows the result.
    Run,
    /// Shows the output of the last run again.
    Console,
    /// Saves the SQL of the last successful run as a table.
    Save { name: String },
    /// Lists your saved tables.
    Tables,
    /// Shows the contents of a saved table.
    Show { name: String },
    /// Exports a saved table, or the last result, as CSV.
    Export {
        /// Saved table to export. Without it the last result is exported.
        name: Option<String>,
        /// Where to write the CSV. Defaults to stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Deletes saved tables.
    Delete {
        #[arg(required = true)]
        names: Vec<String>,
        /// Don't ask for confirmation
        #[arg(long)]
        yes: bool,
    },
    /// Updates rows of a saved table.
    ///
    /// sqlmate update big_orders --set "status = shipped" --where "id <= 10"
    Update {
        table: String,
        /// attribute = value
        #[arg(long = "set", required = true)]
        set: Vec<SetRow>,
        /// attribute operator value, e.g. "email SUFFIX @example.com"
        #[arg(long = "where", required = true)]
        conditions: Vec<WhereRow>,
    },
}

#[derive(Subcommand, Debug)]
pub enum CanvasCommand {
    /// Shows the tables on the canvas, their columns and the sort priority.
    Show,
    /// Puts a table from the schema on the canvas.
    Add { table: String },
    /// Takes a table off the canvas.
    Remove { table: String },
    /// Removes everything from the canvas.
    Clear,
    /// Selects a column of the table again after it was removed.
    AddColumn { table: String, column: String },
    /// Stops selecting a column.
    RemoveColumn { table: String, column: String },
    /// Renames a column in the output. Leave the alias out to remove it.
    Alias {
        table: String,
        column: String,
        alias: Option<String>,
    },
    /// Filters on a column. Leave the operator out to remove the filter.
    Filter {
        table: String,
        column: String,
        operator: Option<Operator>,
        value: Option<String>,
    },
    /// Groups by a column.
    GroupBy {
        table: String,
        column: String,
        /// Stop grouping by the column
        #[arg(long)]
        off: bool,
    },
    /// Aggregates a column. Leave the function out to remove it.
    Aggregate {
        table: String,
        column: String,
        function: Option<Aggregate>,
    },
    /// Sorts by a column. Without an order it cycles NONE, ASC, DESC.
    Sort {
        table: String,
        column: String,
        order: Option<OrderBy>,
    },
    /// Gives a sort directive higher precedence. Positions start at 1.
    Up { position: usize },
    /// Gives a sort directive lower precedence. Positions start at 1.
    Down { position: usize },
}
