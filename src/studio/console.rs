//! The console panel: what the last run produced, and which actions are still waiting on the
//! server.
//!
//! Every user action gets one in-flight flag. Starting an action that is already running fails
//! with [ErrorKind::Busy]. Results that come back after they were given up on are dropped
//! instead of overwriting newer state.
use crate::api::{ApiClient, Transport};
use crate::studio::canvas::Canvas;
use crate::studio::display::{deserialize_result, QueryResult, ResultView};
use crate::{Action, Error, ErrorKind, ValidationError};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::future::Future;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsoleOutput {
    pub view: ResultView,
    pub query_text: String,
    succeeded: bool,
}

#[derive(Debug, Default)]
pub struct Console {
    output: Option<ConsoleOutput>,
    in_flight: HashSet<Action>,
    latest: HashMap<Action, u64>,
    issued: u64,
}

/// Proof that an action was started. Only the newest ticket of an action may apply its result.
#[derive(Debug, PartialEq, Eq)]
#[must_use]
pub struct Ticket {
    action: Action,
    serial: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Applied,
    Stale,
}

impl ConsoleOutput {
    /// A failed run shows the error instead of the old rows.
    pub fn failed(message: &str) -> Self {
        ConsoleOutput {
            view: ResultView::Error(message.to_string()),
            query_text: format!("--Error: {message}"),
            succeeded: false,
        }
    }

    pub fn from_result(result: &QueryResult) -> Self {
        let view = deserialize_result(result);
        let succeeded = !view.is_error();
        let query_text = match (&view, &result.query) {
            (ResultView::Error(message), _) => format!("--Error: {message}"),
            (_, Some(query)) => query.clone(),
            (_, None) => String::new(),
        };

        ConsoleOutput {
            view,
            query_text,
            succeeded,
        }
    }

    /// The SQL of the last successful run, the thing "save" stores.
    pub fn last_query(&self) -> Option<&str> {
        Some(self.query_text.as_str()).filter(|query| self.succeeded && !query.is_empty())
    }
}

impl Console {
    pub fn new() -> Self {
        Console::default()
    }

    pub fn restore(output: ConsoleOutput) -> Self {
        Console {
            output: Some(output),
            ..Default::default()
        }
    }

    pub fn output(&self) -> Option<&ConsoleOutput> {
        self.output.as_ref()
    }

    pub fn is_in_flight(&self, action: Action) -> bool {
        self.in_flight.contains(&action)
    }

    pub fn begin(&mut self, action: Action) -> Result<Ticket, Error> {
        if !self.in_flight.insert(action) {
            return Err(ErrorKind::Busy(action).into());
        }

        self.issued += 1;
        self.latest.insert(action, self.issued);

        Ok(Ticket {
            action,
            serial: self.issued,
        })
    }

    /// Clears the flag if this is still the newest ticket for its action.
    pub fn finish(&mut self, ticket: Ticket) -> Resolution {
        if self.latest.get(&ticket.action) != Some(&ticket.serial) {
            warn!("{} finished after it was abandoned, ignoring the result", ticket.action);

            return Resolution::Stale;
        }

        self.in_flight.remove(&ticket.action);

        Resolution::Applied
    }

    /// Gives up on everything still running, like the page going away. Tickets handed out so far
    /// resolve as [Resolution::Stale].
    pub fn abandon_all(&mut self) {
        self.in_flight.clear();
        self.latest.clear();
    }

    /// Unauthorized errors are handed back untouched so the caller can send the user to log in;
    /// every other failure becomes the displayed result.
    pub fn finish_query(
        &mut self,
        ticket: Ticket,
        outcome: Result<QueryResult, Error>,
    ) -> Result<Resolution, Error> {
        if self.finish(ticket) == Resolution::Stale {
            return Ok(Resolution::Stale);
        }

        self.output = Some(match outcome {
            Ok(result) => ConsoleOutput::from_result(&result),
            Err(error) if error.is_unauthorized() => return Err(error),
            Err(error) => ConsoleOutput::failed(&error.to_string()),
        });

        Ok(Resolution::Applied)
    }

    /// Runs a request under the action's flag. `None` means the result arrived too late.
    pub async fn perform<F, R>(&mut self, action: Action, request: F) -> Result<Option<R>, Error>
    where
        F: Future<Output = Result<R, Error>>,
    {
        let ticket = self.begin(action)?;
        let outcome = request.await;

        match self.finish(ticket) {
            Resolution::Applied => outcome.map(Some),
            Resolution::Stale => Ok(None),
        }
    }

    pub async fn run_query<T: Transport>(
        &mut self,
        canvas: &Canvas,
        client: &mut ApiClient<T>,
    ) -> Result<Resolution, Error> {
        let ticket = self.begin(Action::RunQuery)?;
        let request = canvas.to_request();

        let outcome = client.run_query(&request).await;

        self.finish_query(ticket, outcome)
    }

    /// Saves the SQL of the last successful run under `table_name`.
    pub async fn save_table<T: Transport>(
        &mut self,
        table_name: &str,
        client: &mut ApiClient<T>,
    ) -> Result<Option<String>, Error> {
        let query = self
            .output
            .as_ref()
            .and_then(ConsoleOutput::last_query)
            .ok_or(ValidationError::NothingToSave)?
            .to_string();

        let saved = self
            .perform(Action::SaveTable, client.save_table(table_name, &query))
            .await?;

        if saved.is_some() {
            info!("saved the last query as {}", table_name.trim());
        }

        Ok(saved.flatten())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::transport::testing::MockTransport;
    use crate::session::Session;
    use crate::studio::display::Row;
    use crate::studio::structure::tests::users_and_orders;
    use crate::studio::update::UpdateForm;
    use serde_json::json;

    fn result(query: &str) -> QueryResult {
        QueryResult {
            columns: vec!["id".to_string()],
            rows: vec![Row::Positional(vec![json!(1)])],
            query: Some(query.to_string()),
            ..Default::default()
        }
    }

    fn client(responses: Vec<(u16, serde_json::Value)>) -> ApiClient<MockTransport> {
        ApiClient::new(
            MockTransport::answering(responses),
            Session::logged_in("http://localhost:8080", "t0k3n".to_string()),
        )
    }

    #[test]
    fn one_request_per_action() {
        let mut console = Console::new();

        let ticket = console.begin(Action::RunQuery).unwrap();
        let busy = console.begin(Action::RunQuery).unwrap_err();
        let other = console.begin(Action::SaveTable);

        assert!(matches!(busy.kind(), ErrorKind::Busy(Action::RunQuery)));
        assert!(other.is_ok());
        assert!(console.is_in_flight(Action::RunQuery));

        assert_eq!(console.finish(ticket), Resolution::Applied);
        assert!(!console.is_in_flight(Action::RunQuery));
        assert!(console.begin(Action::RunQuery).is_ok());
    }

    #[test]
    fn late_results_are_dropped() {
        let mut console = Console::new();
        let abandoned = console.begin(Action::RunQuery).unwrap();

        console.abandon_all();
        let current = console.begin(Action::RunQuery).unwrap();
        console.finish_query(current, Ok(result("SELECT 2"))).unwrap();

        let resolution = console.finish_query(abandoned, Ok(result("SELECT 1"))).unwrap();

        assert_eq!(resolution, Resolution::Stale);
        assert_eq!(console.output().unwrap().query_text, "SELECT 2");
    }

    #[test]
    fn failures_replace_the_previous_result() {
        let mut console = Console::new();
        let ticket = console.begin(Action::RunQuery).unwrap();
        console.finish_query(ticket, Ok(result("SELECT 1"))).unwrap();

        let ticket = console.begin(Action::RunQuery).unwrap();
        let failure = Error::from(ErrorKind::Api {
            status: 500,
            message: "relation does not exist".to_string(),
        });
        console.finish_query(ticket, Err(failure)).unwrap();

        let output = console.output().unwrap();
        assert_eq!(output.view, ResultView::Error("relation does not exist".to_string()));
        assert_eq!(output.query_text, "--Error: relation does not exist");
        assert_eq!(output.last_query(), None);
    }

    #[test]
    fn unauthorized_leaves_the_output_alone() {
        let mut console = Console::new();
        let ticket = console.begin(Action::RunQuery).unwrap();
        console.finish_query(ticket, Ok(result("SELECT 1"))).unwrap();

        let ticket = console.begin(Action::RunQuery).unwrap();
        let error = console
            .finish_query(ticket, Err(ErrorKind::Unauthorized.into()))
            .unwrap_err();

        assert!(error.is_unauthorized());
        assert_eq!(console.output().unwrap().last_query(), Some("SELECT 1"));
        assert!(!console.is_in_flight(Action::RunQuery));
    }

    #[tokio::test]
    async fn runs_the_canvas_and_saves_the_result() {
        let mut canvas = Canvas::default();
        canvas.drop_table(users_and_orders().table("users").unwrap());
        let mut client = client(vec![
            (
                200,
                json!({
                    "status": {"status": "success"},
                    "table": {
                        "query": "SELECT id, email FROM users LIMIT 1000",
                        "columns": ["id", "email"],
                        "rows": [[1, "ann@example.com"]]
                    }
                }),
            ),
            (200, json!({"status": {"status": "success", "message": "Table saved"}})),
        ]);
        let mut console = Console::new();

        let resolution = console.run_query(&canvas, &mut client).await.unwrap();
        let saved = console.save_table("all_users", &mut client).await.unwrap();

        assert_eq!(resolution, Resolution::Applied);
        assert!(console.output().unwrap().view.table().is_some());
        assert_eq!(saved.as_deref(), Some("Table saved"));
    }

    #[tokio::test]
    async fn every_action_has_its_own_flag() {
        let mut console = Console::new();
        let mut client = client(vec![(200, json!({"status": {"status": "success"}, "rows_affected": 3}))]);
        let request = UpdateForm {
            table: "big_orders".to_string(),
            set: vec!["status = shipped".parse().unwrap()],
            conditions: vec!["id <= 10".parse().unwrap()],
        }
        .into_request()
        .unwrap();

        let running = console.begin(Action::UpdateTable).unwrap();
        let busy = console
            .perform(Action::UpdateTable, client.update_table(&request))
            .await
            .unwrap_err();
        assert!(matches!(busy.kind(), ErrorKind::Busy(Action::UpdateTable)));
        assert!(client.transport().sent().is_empty());

        console.begin(Action::FetchTables).unwrap();
        assert!(console.is_in_flight(Action::FetchTables));

        assert_eq!(console.finish(running), Resolution::Applied);
        let updated = console
            .perform(Action::UpdateTable, client.update_table(&request))
            .await
            .unwrap();

        assert_eq!(updated.map(|update| update.rows_affected), Some(3));
        assert!(!console.is_in_flight(Action::UpdateTable));
        assert!(console.is_in_flight(Action::FetchTables));
    }

    #[tokio::test]
    async fn nothing_to_save_before_a_successful_run() {
        let mut console = Console::restore(ConsoleOutput::failed("boom"));
        let mut client = client(vec![]);

        let error = console.save_table("t", &mut client).await.unwrap_err();

        assert!(matches!(
            error.kind(),
            ErrorKind::Validation(ValidationError::NothingToSave)
        ));
    }

    #[tokio::test]
    async fn server_errors_in_the_body_are_shown() {
        let canvas = Canvas::default();
        let mut client = client(vec![(200, json!({"query": "SELECT", "error": "no tables selected"}))]);
        let mut console = Console::new();

        console.run_query(&canvas, &mut client).await.unwrap();

        let output = console.output().unwrap();
        assert!(output.view.is_error());
        assert_eq!(output.query_text, "--Error: no tables selected");
    }
}
