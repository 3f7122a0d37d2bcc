//! HTTP transport types for the host-does-IO pattern.
//!
//! # Design
//! These types describe requests and responses as plain data. The core
//! builds `HttpRequest` values and decodes `HttpResponse` values without
//! touching the network; an executor (or the host) performs the exchange.
//! Every endpoint of the API is a GET with all inputs in the query string,
//! so a request is fully described by its URL.

/// A GET request described as plain data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    /// Absolute URL including the query string. Contains the auth token;
    /// use [`HttpRequest::redacted_url`] for logs.
    pub url: String,
}

impl HttpRequest {
    /// The URL with the `auth_token` value masked.
    pub fn redacted_url(&self) -> String {
        let Some((base, query)) = self.url.split_once('?') else {
            return self.url.clone();
        };
        let query = query
            .split('&')
            .map(|pair| match pair.split_once('=') {
                Some(("auth_token", _)) => "auth_token=***",
                _ => pair,
            })
            .collect::<Vec<_>>()
            .join("&");
        format!("{base}?{query}")
    }
}

/// An HTTP response described as plain data.
///
/// Executors must hand back non-2xx responses as values: mutation outcomes
/// are judged from the body as well as the status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}
