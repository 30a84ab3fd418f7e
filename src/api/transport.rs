use crate::{Error, ErrorKind};
use async_trait::async_trait;
use log::debug;
use serde_json::Value;
use std::fmt::{Display, Formatter};

/// Where the server keeps the reason a request failed, in the order we look for it.
const ERROR_POINTERS: [&str; 4] = ["/details/message", "/status/message", "/error_msg", "/error"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Delete,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: &'static str,
    pub query: Vec<(&'static str, String)>,
    pub body: Option<Value>,
    /// Protected endpoints get the bearer token.
    pub authenticated: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Option<Value>,
}

/// Moves one request to the server and back. Status codes are not interpreted here, see
/// [ApiResponse::into_result].
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: ApiRequest, token: Option<&str>) -> Result<ApiResponse, Error>;
}

pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: &str) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(client: reqwest::Client, base_url: &str) -> Self {
        HttpTransport {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: ApiRequest, token: Option<&str>) -> Result<ApiResponse, Error> {
        let url = self.url(request.path);
        debug!("{} {url}", request.method);

        let mut builder = match request.method {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
            Method::Delete => self.client.delete(&url),
        }
        .header(reqwest::header::CONTENT_TYPE, "application/json");

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }

        if let (true, Some(token)) = (request.authenticated, token) {
            builder = builder.bearer_auth(token);
        }

        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let text = response.text().await?;

        debug!("{url} answered {status}");

        Ok(ApiResponse {
            status,
            // Error pages are not always JSON.
            body: serde_json::from_str(&text).ok(),
        })
    }
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Non-2xx answers become errors. On an authenticated request a 401, or anything that calls
    /// itself unauthorized, means the session is gone; on a login it just means bad credentials.
    pub fn into_result(self, authenticated: bool) -> Result<Value, Error> {
        if self.is_success() {
            return Ok(self.body.unwrap_or(Value::Null));
        }

        let message = extract_error_message(self.body.as_ref());

        let unauthorized = self.status == 401 || message.to_lowercase().contains("unauthorized");
        if authenticated && unauthorized {
            return Err(ErrorKind::Unauthorized.into());
        }

        Err(ErrorKind::Api {
            status: self.status,
            message,
        }
        .into())
    }
}

pub fn extract_error_message(body: Option<&Value>) -> String {
    body.and_then(|body| {
        ERROR_POINTERS
            .iter()
            .filter_map(|pointer| body.pointer(pointer))
            .find_map(Value::as_str)
    })
    .unwrap_or("Unknown error")
    .to_string()
}

impl Display for Method {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Method::Get => write!(f, "GET"),
            Method::Post => write!(f, "POST"),
            Method::Delete => write!(f, "DELETE"),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn failure(status: u16, body: Value) -> ErrorKind {
        ApiResponse {
            status,
            body: Some(body),
        }
        .into_result(true)
        .unwrap_err()
        .into_inner()
    }

    #[test]
    fn error_messages_are_looked_up_in_order() {
        let body = json!({"details": {"message": "Table exists"}, "error": "other"});
        assert_eq!(extract_error_message(Some(&body)), "Table exists");

        let body = json!({"status": {"status": "error", "message": "Bad operator"}});
        assert_eq!(extract_error_message(Some(&body)), "Bad operator");

        let body = json!({"error_msg": "Invalid credentials"});
        assert_eq!(extract_error_message(Some(&body)), "Invalid credentials");

        let body = json!({"detail": [{"msg": "field required"}]});
        assert_eq!(extract_error_message(Some(&body)), "Unknown error");
        assert_eq!(extract_error_message(None), "Unknown error");
    }

    #[test]
    fn unauthorized_is_its_own_error() {
        assert!(matches!(failure(401, json!({})), ErrorKind::Unauthorized));
        assert!(matches!(
            failure(403, json!({"details": {"message": "Unauthorized access"}})),
            ErrorKind::Unauthorized
        ));
    }

    #[test]
    fn other_failures_keep_status_and_message() {
        match failure(409, json!({"details": {"message": "Table exists"}})) {
            ErrorKind::Api { status, message } => {
                assert_eq!(status, 409);
                assert_eq!(message, "Table exists");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn successful_bodies_pass_through() {
        let response = ApiResponse {
            status: 204,
            body: None,
        };

        assert_eq!(response.into_result(true).unwrap(), Value::Null);
    }

    #[test]
    fn bad_credentials_are_not_a_lost_session() {
        let response = ApiResponse {
            status: 401,
            body: Some(json!({"error": "Invalid credentials"})),
        };

        let error = response.into_result(false).unwrap_err();

        assert!(!error.is_unauthorized());
        assert_eq!(error.to_string(), "Invalid credentials");
    }

    mod http {
        use super::*;
        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        use tokio::net::{TcpListener, TcpStream};
        use tokio::task::JoinHandle;

        /// Answers exactly one request with a canned response and hands back what was sent.
        async fn serve_once(
            status_line: &'static str,
            content_type: &'static str,
            body: &'static str,
        ) -> (String, JoinHandle<String>) {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            let base_url = format!("http://{}/", listener.local_addr().unwrap());

            let server = tokio::spawn(async move {
                let (mut socket, _) = listener.accept().await.unwrap();
                let request = read_request(&mut socket).await;

                let response = format!(
                    "HTTP/1.1 {status_line}\r\ncontent-type: {content_type}\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                    body.len()
                );
                socket.write_all(response.as_bytes()).await.unwrap();
                socket.shutdown().await.unwrap();

                request
            });

            (base_url, server)
        }

        fn transport(base_url: &str) -> HttpTransport {
            let client = reqwest::Client::builder().no_proxy().build().unwrap();

            HttpTransport::with_client(client, base_url)
        }

        async fn read_request(socket: &mut TcpStream) -> String {
            let mut buffer = Vec::new();
            let mut chunk = [0u8; 1024];

            loop {
                let read = socket.read(&mut chunk).await.unwrap();
                if read == 0 {
                    break;
                }
                buffer.extend_from_slice(&chunk[..read]);

                let text = String::from_utf8_lossy(&buffer);
                if let Some(end) = text.find("\r\n\r\n") {
                    let length = text[..end]
                        .lines()
                        .filter_map(|line| line.split_once(':'))
                        .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
                        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
                        .unwrap_or(0);

                    if buffer.len() >= end + 4 + length {
                        break;
                    }
                }
            }

            String::from_utf8(buffer).unwrap()
        }

        #[tokio::test]
        async fn protected_requests_carry_the_token_and_an_encoded_query() {
            let (base_url, server) = serve_once("200 OK", "application/json", r#"{"table": {"columns": []}}"#).await;
            let transport = transport(&base_url);

            let response = transport
                .send(
                    ApiRequest {
                        method: Method::Get,
                        path: "/users/get_table_data",
                        query: vec![("table_name", "big orders & co".to_string())],
                        body: None,
                        authenticated: true,
                    },
                    Some("t0k3n"),
                )
                .await
                .unwrap();

            let request = server.await.unwrap();
            let headers = request.to_lowercase();

            assert!(request.starts_with("GET /users/get_table_data?table_name=big+orders+%26+co HTTP/1.1\r\n"));
            assert!(headers.contains("\r\nauthorization: bearer t0k3n\r\n"));
            assert!(headers.contains("\r\ncontent-type: application/json\r\n"));
            assert_eq!(response.status, 200);
            assert_eq!(response.body, Some(json!({"table": {"columns": []}})));
        }

        #[tokio::test]
        async fn public_requests_send_json_without_a_token() {
            let (base_url, server) = serve_once("500 Internal Server Error", "text/html", "<html>oops</html>").await;
            let transport = transport(&base_url);

            let response = transport
                .send(
                    ApiRequest {
                        method: Method::Post,
                        path: "/auth/login",
                        query: vec![],
                        body: Some(json!({"username": "ann"})),
                        authenticated: false,
                    },
                    Some("t0k3n"),
                )
                .await
                .unwrap();

            let request = server.await.unwrap();
            let headers = request.to_lowercase();

            assert!(request.starts_with("POST /auth/login HTTP/1.1\r\n"));
            assert!(!headers.contains("authorization:"));
            assert!(headers.contains("\r\ncontent-type: application/json\r\n"));
            assert!(request.ends_with(r#"{"username":"ann"}"#));
            assert_eq!(
                response,
                ApiResponse {
                    status: 500,
                    body: None,
                }
            );
        }
    }
}
