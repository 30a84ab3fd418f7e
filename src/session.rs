use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Who is logged in to which server.
///
/// The token is the only credential we keep, passwords are never stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub api_url: String,
    token: Option<Token>,
    pub identity: Option<Identity>,
}

#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Token(String);

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Identity {
    pub username: String,
    pub email: String,
}

/// Sessions are stored per server, so switching servers does not log you out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionKey(String);

impl Session {
    pub fn anonymous(api_url: &str) -> Self {
        Session {
            api_url: api_url.to_string(),
            token: None,
            identity: None,
        }
    }

    pub fn logged_in(api_url: &str, token: String) -> Self {
        Session {
            api_url: api_url.to_string(),
            token: Some(Token(token)),
            identity: None,
        }
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_ref().map(|token| token.0.as_str())
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// What happens after a 401: the token is useless, so we drop it along with the identity.
    pub fn forget(&mut self) {
        self.token = None;
        self.identity = None;
    }
}

impl SessionKey {
    pub fn for_server(api_url: &str) -> Self {
        // URLs have plenty of characters that have no business in a file name.
        let sanitized = api_url
            .trim_end_matches('/')
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect();

        SessionKey(sanitized)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Tokens end up in debug logs otherwise.
impl std::fmt::Debug for Token {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Token(***)")
    }
}

impl Display for Identity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} <{}>", self.username, self.email)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forgetting_drops_token_and_identity() {
        let mut session = Session::logged_in("http://localhost:8080", "abc".to_string());
        session.identity = Some(Identity {
            username: "ana".to_string(),
            email: "ana@example.com".to_string(),
        });

        session.forget();

        assert!(!session.is_authenticated());
        assert!(session.identity.is_none());
    }

    #[test]
    fn session_keys_are_file_name_safe() {
        let key = SessionKey::for_server("http://127.0.0.1:8080/");

        assert_eq!(key.as_str(), "http___127_0_0_1_8080");
    }

    #[test]
    fn tokens_do_not_leak_into_debug_output() {
        let session = Session::logged_in("http://localhost", "very-secret".to_string());

        assert!(!format!("{session:?}").contains("very-secret"));
    }
}
