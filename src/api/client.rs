use crate::api::transport::{ApiRequest, Method, Transport};
use crate::api::wire::{
    DeleteTablesRequest, DeleteTablesResponse, Enveloped, EnvelopeResponse, GetTablesResponse,
    LoginRequest, LoginResponse, QueryRequest, QueryResponse, RegisterRequest, SaveTableRequest,
    SavedTable, UpdateTableRequest, UpdateTableResponse, UserInfoResponse,
};
use crate::session::{Identity, Session};
use crate::studio::display::QueryResult;
use crate::studio::update::UpdateResult;
use crate::{Error, ErrorKind, InternalError, ValidationError};
use log::{debug, info};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// One method per server endpoint.
///
/// Protected endpoints fail with [ErrorKind::NotLoggedIn] without touching the network when
/// there's no token. An [ErrorKind::Unauthorized] answer drops the token from the session.
pub struct ApiClient<T: Transport> {
    transport: T,
    session: Session,
}

impl<T: Transport> ApiClient<T> {
    pub fn new(transport: T, session: Session) -> Self {
        ApiClient { transport, session }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn into_session(self) -> Session {
        self.session
    }

    #[cfg(test)]
    pub(crate) fn transport(&self) -> &T {
        &self.transport
    }

    pub async fn register(&self, username: &str, password: &str, email: &str) -> Result<Option<String>, Error> {
        let request = RegisterRequest {
            username: username.to_string(),
            password: password.to_string(),
            email: email.to_string(),
        };

        let response: EnvelopeResponse = self
            .call(Method::Post, "/auth/register", vec![], Some(&request), false)
            .await?;

        Ok(response.message().map(ToString::to_string))
    }

    /// Keeps the token in the session on success.
    pub async fn login(&mut self, username: &str, password: &str) -> Result<(), Error> {
        let request = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };

        let response: LoginResponse = self
            .call(Method::Post, "/auth/login", vec![], Some(&request), false)
            .await?;

        let token = response
            .token
            .filter(|token| !token.is_empty())
            .ok_or_else(|| InternalError("The server did not hand out a token".to_string()))?;

        info!("logged in as {username}");
        self.session = Session::logged_in(&self.session.api_url, token);

        Ok(())
    }

    pub async fn me(&mut self) -> Result<Identity, Error> {
        let response: UserInfoResponse = self.protected(Method::Get, "/auth/me", vec![], None::<&()>).await?;

        let identity = Identity {
            username: response.username.unwrap_or_default(),
            email: response.email.unwrap_or_default(),
        };
        self.session.identity = Some(identity.clone());

        Ok(identity)
    }

    pub async fn delete_user(&mut self) -> Result<(), Error> {
        let _: EnvelopeResponse = self
            .protected(Method::Delete, "/auth/delete_user", vec![], None::<&()>)
            .await?;

        info!("account deleted");
        self.session.forget();

        Ok(())
    }

    /// Having no saved tables is a 404 for the server, for us it's an empty list.
    pub async fn get_tables(&mut self) -> Result<Vec<SavedTable>, Error> {
        let result: Result<GetTablesResponse, Error> = self
            .protected(Method::Get, "/users/get_tables", vec![], None::<&()>)
            .await;

        match result {
            Ok(response) => Ok(response.tables),
            Err(error) if matches!(error.kind(), ErrorKind::Api { status: 404, .. }) => Ok(Vec::new()),
            Err(error) => Err(error),
        }
    }

    pub async fn get_table_data(&mut self, table_name: &str) -> Result<QueryResult, Error> {
        let response: QueryResponse = self
            .protected(
                Method::Get,
                "/users/get_table_data",
                vec![("table_name", table_name.to_string())],
                None::<&()>,
            )
            .await?;

        Ok(response.into())
    }

    pub async fn save_table(&mut self, table_name: &str, query: &str) -> Result<Option<String>, Error> {
        let table_name = table_name.trim();
        if table_name.is_empty() {
            return Err(ValidationError::EmptyTableName.into());
        }

        let request = SaveTableRequest {
            table_name: table_name.to_string(),
            query: query.to_string(),
        };

        let response: EnvelopeResponse = self
            .protected(Method::Post, "/users/save_table", vec![], Some(&request))
            .await?;

        Ok(response.message().map(ToString::to_string))
    }

    /// Returns the names the server says it deleted.
    pub async fn delete_tables(&mut self, table_names: &[String]) -> Result<Vec<String>, Error> {
        let request = DeleteTablesRequest {
            table_names: table_names.to_vec(),
        };

        let response: DeleteTablesResponse = self
            .protected(Method::Post, "/users/delete_table", vec![], Some(&request))
            .await?;

        Ok(response.deleted_tables)
    }

    pub async fn update_table(&mut self, request: &UpdateTableRequest) -> Result<UpdateResult, Error> {
        let response: UpdateTableResponse = self
            .protected(Method::Post, "/users/update_table", vec![], Some(request))
            .await?;

        Ok(response.into())
    }

    pub async fn run_query(&mut self, request: &QueryRequest) -> Result<QueryResult, Error> {
        debug!("running query: {}", serde_json::to_string(request)?);

        let response: QueryResponse = self
            .protected(Method::Post, "/query", vec![], Some(request))
            .await?;

        Ok(response.into())
    }

    async fn protected<B, R>(
        &mut self,
        method: Method,
        path: &'static str,
        query: Vec<(&'static str, String)>,
        body: Option<&B>,
    ) -> Result<R, Error>
    where
        B: Serialize + ?Sized + Sync,
        R: DeserializeOwned + Enveloped,
    {
        if !self.session.is_authenticated() {
            return Err(ErrorKind::NotLoggedIn.into());
        }

        let result = self.call(method, path, query, body, true).await;

        if let Err(error) = &result {
            if error.is_unauthorized() {
                info!("session rejected by the server, forgetting the token");
                self.session.forget();
            }
        }

        result
    }

    async fn call<B, R>(
        &self,
        method: Method,
        path: &'static str,
        query: Vec<(&'static str, String)>,
        body: Option<&B>,
        authenticated: bool,
    ) -> Result<R, Error>
    where
        B: Serialize + ?Sized + Sync,
        R: DeserializeOwned + Enveloped,
    {
        let body = body.map(serde_json::to_value).transpose()?;
        let request = ApiRequest {
            method,
            path,
            query,
            body,
            authenticated,
        };

        let value = self
            .transport
            .send(request, self.session.token())
            .await?
            .into_result(authenticated)?;

        let response: R = match value {
            Value::Null => serde_json::from_value(Value::Object(Default::default()))?,
            value => serde_json::from_value(value)?,
        };

        if let Some(message) = response.failure_message() {
            return Err(ErrorKind::Api { status: 200, message }.into());
        }

        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::transport::testing::MockTransport;
    use crate::api::wire::{UpdateAttribute, UpdateConstraint, UpdateQueryParams};
    use crate::studio::Operator;
    use serde_json::json;

    const URL: &str = "http://localhost:8080";

    fn logged_in(responses: Vec<(u16, Value)>) -> ApiClient<MockTransport> {
        ApiClient::new(
            MockTransport::answering(responses),
            Session::logged_in(URL, "t0k3n".to_string()),
        )
    }

    #[tokio::test]
    async fn login_stores_the_token() {
        let mut client = ApiClient::new(
            MockTransport::answering(vec![(200, json!({"message": "Login successful", "token": "abc"}))]),
            Session::anonymous(URL),
        );

        client.login("ann", "hunter2").await.unwrap();

        assert_eq!(client.session().token(), Some("abc"));
        let (request, token) = &client.transport.sent()[0];
        assert_eq!(request.path, "/auth/login");
        assert!(!request.authenticated);
        assert_eq!(*token, None);
        assert_eq!(
            request.body,
            Some(json!({"username": "ann", "password": "hunter2"}))
        );
    }

    #[tokio::test]
    async fn failed_login_reports_the_server_message() {
        let mut client = ApiClient::new(
            MockTransport::answering(vec![(401, json!({"error": "Invalid credentials"}))]),
            Session::anonymous(URL),
        );

        let error = client.login("ann", "nope").await.unwrap_err();

        assert_eq!(error.to_string(), "Invalid credentials");
        assert!(!client.session().is_authenticated());
    }

    #[tokio::test]
    async fn protected_calls_need_a_token() {
        let mut client = ApiClient::new(MockTransport::default(), Session::anonymous(URL));

        let error = client.get_tables().await.unwrap_err();

        assert!(matches!(error.kind(), ErrorKind::NotLoggedIn));
        assert!(client.transport.sent().is_empty());
    }

    #[tokio::test]
    async fn unauthorized_answers_drop_the_token() {
        let mut client = logged_in(vec![(401, json!({"details": {"message": "Token expired"}}))]);

        let error = client.me().await.unwrap_err();

        assert!(error.is_unauthorized());
        assert!(!client.session().is_authenticated());
    }

    #[tokio::test]
    async fn no_saved_tables_is_an_empty_list() {
        let mut client = logged_in(vec![(404, json!({"details": {"status": "error", "message": "No tables found"}}))]);

        assert!(client.get_tables().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn table_data_is_requested_by_name() {
        let mut client = logged_in(vec![(
            200,
            json!({
                "status": {"status": "success"},
                "table": {"query": "SELECT * FROM users", "columns": ["id"], "rows": [{"id": 1}]}
            }),
        )]);

        let result = client.get_table_data("active users").await.unwrap();

        assert_eq!(result.columns, vec!["id"]);
        let (request, token) = &client.transport.sent()[0];
        assert_eq!(request.query, vec![("table_name", "active users".to_string())]);
        assert_eq!(token.as_deref(), Some("t0k3n"));
        assert!(request.authenticated);
    }

    #[tokio::test]
    async fn save_table_trims_the_name() {
        let mut client = logged_in(vec![(200, json!({"status": {"status": "success", "message": "Saved"}}))]);

        let message = client.save_table("  big_orders ", "SELECT 1").await.unwrap();

        assert_eq!(message.as_deref(), Some("Saved"));
        assert_eq!(
            client.transport.sent()[0].0.body,
            Some(json!({"table_name": "big_orders", "query": "SELECT 1"}))
        );

        let error = client.save_table("   ", "SELECT 1").await.unwrap_err();
        assert!(matches!(
            error.kind(),
            ErrorKind::Validation(ValidationError::EmptyTableName)
        ));
    }

    #[tokio::test]
    async fn error_envelopes_fail_even_on_success_status() {
        let mut client = logged_in(vec![(200, json!({"status": {"status": "error", "message": "Nothing deleted"}}))]);

        let error = client.delete_tables(&["a".to_string()]).await.unwrap_err();

        assert_eq!(error.to_string(), "Nothing deleted");
    }

    #[tokio::test]
    async fn update_reports_affected_rows() {
        let mut client = logged_in(vec![(200, json!({"status": {"status": "success"}, "rows_affected": 2}))]);
        let request = UpdateTableRequest {
            query_params: UpdateQueryParams {
                table: "orders".to_string(),
                updates: vec![UpdateAttribute {
                    attribute: "status".to_string(),
                    value: "shipped".to_string(),
                }],
                constraints: vec![UpdateConstraint {
                    attribute: "id".to_string(),
                    operator: Operator::LesserThan,
                    value: "10".to_string(),
                }],
            },
        };

        let result = client.update_table(&request).await.unwrap();

        assert!(result.success);
        assert_eq!(result.rows_affected, 2);
        assert_eq!(client.transport.sent()[0].0.path, "/users/update_table");
    }
}
