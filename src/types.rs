use http::Method;
use serde_json::Value;

use crate::signer::SigningParams;

/// A request handed to the [`Transport`](crate::Transport): everything except
/// the credentials, which travel separately as [`RequestAuth`].
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub form: Option<Vec<(String, String)>>,
}

impl OutboundRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            form: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::POST, url)
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_form(mut self, form: Vec<(String, String)>) -> Self {
        self.form = Some(form);
        self
    }
}

/// How the transport should authenticate an outgoing request.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestAuth {
    None,
    /// Sign with the OAuth1 parameter set (the transport owns the signature
    /// algorithm, see [`Transport`](crate::Transport)).
    OAuth1(SigningParams),
    /// Attach an `Authorization: Bearer <token>` header.
    Bearer(String),
}

/// What the transport got back: status, headers and body text, uninterpreted.
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl RawResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Successful outcome of a token-acquisition step: the raw provider response
/// plus its normalized body.
#[derive(Debug, Clone)]
pub struct TokenExchange {
    pub response: RawResponse,
    pub body: Value,
}
