//! Remote JSON API access.
//!
//! [`ApiClient`] wraps a base URL and issues one outbound request per call,
//! normalizing every outcome into an [`ApiReply`]. The remote banking
//! service signals business errors inside 200-status JSON bodies as well as
//! via non-2xx statuses, so callers get *data* back in all cases and inspect
//! it through one handling path; nothing at this layer raises.

/// Banking API client (login, claim, transfer, and the rest of the surface)
pub mod bank;
/// Castle project-lookup client used by the scanner
pub mod castle;

use reqwest::Method;
use serde_json::{Value, json};
use tracing::debug;

/// A normalized remote reply: either the parsed JSON body, or a synthetic
/// error-shaped document when the body was not JSON or the request never
/// completed.
#[derive(Debug, Clone)]
pub struct ApiReply(Value);

impl ApiReply {
    /// Wraps an already-parsed JSON document.
    #[must_use]
    pub const fn from_value(value: Value) -> Self {
        Self(value)
    }

    /// Builds a reply from a raw response body, falling back to the
    /// synthetic `{ok: false, status, text}` shape when it is not JSON.
    #[must_use]
    pub fn from_body(status: u16, text: &str) -> Self {
        match serde_json::from_str::<Value>(text) {
            Ok(value) => Self(value),
            Err(_) => Self(json!({ "ok": false, "status": status, "text": text })),
        }
    }

    /// Builds an error-shaped reply for a request that never produced a
    /// response (connection refused, DNS failure, ...).
    #[must_use]
    pub fn transport_failure(detail: &str) -> Self {
        Self(json!({
            "error": true,
            "message": "Falha na conexão com o banco",
            "detail": detail,
        }))
    }

    /// Whether the remote flagged this reply as an error.
    ///
    /// Covers both conventions the banking API uses: a truthy `error` field
    /// and an explicit `ok: false` (the latter also marks synthetic
    /// replies built by this client).
    #[must_use]
    pub fn is_error(&self) -> bool {
        let error_flagged = match self.0.get("error") {
            None | Some(Value::Null) | Some(Value::Bool(false)) => false,
            Some(_) => true,
        };
        error_flagged || self.0.get("ok").and_then(Value::as_bool) == Some(false)
    }

    /// Human-readable error message, favoring the fields the remote
    /// actually populates.
    #[must_use]
    pub fn message(&self) -> String {
        for key in ["message", "error", "text"] {
            if let Some(text) = self.0.get(key).and_then(Value::as_str) {
                return text.to_string();
            }
        }
        "Erro desconhecido.".to_string()
    }

    /// String field accessor.
    #[must_use]
    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// Field rendered for display: strings pass through, numbers are
    /// formatted. The remote is loose about whether amounts are strings or
    /// numbers, so money fields go through this.
    #[must_use]
    pub fn display_field(&self, key: &str) -> Option<String> {
        match self.0.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// The underlying JSON document.
    #[must_use]
    pub const fn value(&self) -> &Value {
        &self.0
    }

    /// Pretty-printed body, for commands that surface raw payloads.
    #[must_use]
    pub fn pretty(&self) -> String {
        serde_json::to_string_pretty(&self.0).unwrap_or_else(|_| self.0.to_string())
    }
}

/// Minimal percent-encoding for a URL path segment.
///
/// Everything outside the unreserved set is escaped, so a user-supplied id
/// cannot smuggle `/`, `?` or `#` into the request path.
#[must_use]
pub fn encode_path_segment(input: &str) -> String {
    let mut encoded = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                encoded.push(byte as char);
            }
            _ => encoded.push_str(&format!("%{byte:02X}")),
        }
    }
    encoded
}

/// Thin JSON-over-HTTPS client for one remote base URL.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base: String,
}

impl ApiClient {
    /// Creates a client for `base` (no trailing slash) reusing a shared
    /// reqwest client.
    #[must_use]
    pub fn new(http: reqwest::Client, base: impl Into<String>) -> Self {
        Self {
            http,
            base: base.into(),
        }
    }

    /// Issues exactly one request and normalizes the outcome.
    ///
    /// A JSON body sets the content type; a token becomes a bearer
    /// authorization header. No retries, no timeout beyond the transport
    /// default.
    pub async fn call(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&Value>,
        token: Option<&str>,
    ) -> ApiReply {
        self.call_with_query(method, endpoint, &[], body, token)
            .await
    }

    /// [`call`](Self::call) with query parameters, percent-encoded by
    /// reqwest.
    pub async fn call_with_query(
        &self,
        method: Method,
        endpoint: &str,
        query: &[(&str, &str)],
        body: Option<&Value>,
        token: Option<&str>,
    ) -> ApiReply {
        let url = format!("{}{}", self.base, endpoint);
        debug!(%method, %url, "bank api call");

        let mut request = self.http.request(method, &url);
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => return ApiReply::transport_failure(&e.to_string()),
        };

        let status = response.status().as_u16();
        match response.text().await {
            Ok(text) => ApiReply::from_body(status, &text),
            Err(e) => ApiReply::transport_failure(&e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_body_passes_through() {
        let reply = ApiReply::from_body(200, r#"{"sessionId":"s1","saldo":"10.00000000"}"#);
        assert!(!reply.is_error());
        assert_eq!(reply.str_field("sessionId"), Some("s1"));
        assert_eq!(reply.display_field("saldo").as_deref(), Some("10.00000000"));
    }

    #[test]
    fn non_json_body_becomes_synthetic_error() {
        let reply = ApiReply::from_body(502, "<html>bad gateway</html>");
        assert!(reply.is_error());
        assert_eq!(reply.message(), "<html>bad gateway</html>");
        assert_eq!(
            reply.value().get("status").and_then(serde_json::Value::as_u64),
            Some(502)
        );
    }

    #[test]
    fn business_error_in_200_body_is_detected() {
        let reply = ApiReply::from_body(200, r#"{"error":true,"message":"Cooldown active"}"#);
        assert!(reply.is_error());
        assert_eq!(reply.message(), "Cooldown active");
    }

    #[test]
    fn string_error_field_counts_as_error() {
        let reply = ApiReply::from_body(200, r#"{"error":"invalid credentials"}"#);
        assert!(reply.is_error());
        assert_eq!(reply.message(), "invalid credentials");
    }

    #[test]
    fn explicit_error_false_is_not_error() {
        let reply = ApiReply::from_body(200, r#"{"error":false,"txId":"t1"}"#);
        assert!(!reply.is_error());
    }

    #[test]
    fn numeric_fields_are_displayable() {
        let reply = ApiReply::from_body(200, r#"{"claimed":1.5}"#);
        assert_eq!(reply.display_field("claimed").as_deref(), Some("1.5"));
    }

    #[test]
    fn path_segments_are_percent_encoded() {
        assert_eq!(encode_path_segment("t1"), "t1");
        assert_eq!(encode_path_segment("a b&c#d"), "a%20b%26c%23d");
        assert_eq!(encode_path_segment("caf\u{e9}"), "caf%C3%A9");
    }

    #[test]
    fn transport_failure_is_error_shaped() {
        let reply = ApiReply::transport_failure("connection refused");
        assert!(reply.is_error());
        assert_eq!(reply.message(), "Falha na conexão com o banco");
    }
}
