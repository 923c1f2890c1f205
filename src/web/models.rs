use serde::de::{DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::Mode;
use crate::model::Token;

// Fields of the wrong JSON type read as absent instead of rejecting the body.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

#[derive(Debug, Default, Deserialize)]
pub struct AskRequest {
    #[serde(default, deserialize_with = "lenient")]
    pub repo: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub query: Option<String>,
    #[serde(default, deserialize_with = "lenient", alias = "timestamp")]
    pub t: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct QueryRequest {
    #[serde(default, deserialize_with = "lenient")]
    pub query: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub context: Option<Map<String, Value>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TokenRequest {
    #[serde(default, deserialize_with = "lenient")]
    pub repo: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub action: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MongooseInfo {
    pub operator: String,
    pub mode: Mode,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct AskResponse {
    pub ok: bool,
    pub repo: String,
    pub answer: String,
    pub token: Token,
    pub mongoose: MongooseInfo,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub healthy: bool,
    pub status: &'static str,
    pub mode: Mode,
    pub operator: String,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub success: bool,
    pub mode: Mode,
    pub operator: String,
    pub authenticated: bool,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct QueryResponse {
    pub ok: bool,
    pub answer: String,
    pub context: Map<String, Value>,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub ok: bool,
    pub token: Token,
}

/// Parse a request body into `T`. Empty or malformed bodies, and bodies that
/// are not JSON objects, count as no data.
pub fn parse_body<T: DeserializeOwned>(body: &[u8]) -> Option<T> {
    match serde_json::from_slice::<Value>(body).ok()? {
        object @ Value::Object(_) => serde_json::from_value(object).ok(),
        _ => None,
    }
}

/// Empty strings are treated like a missing field.
pub fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_and_malformed_bodies_are_no_data() {
        assert!(parse_body::<AskRequest>(b"").is_none());
        assert!(parse_body::<AskRequest>(b"{not json").is_none());
        assert!(parse_body::<AskRequest>(b"null").is_none());
        assert!(parse_body::<AskRequest>(b"[1, 2]").is_none());
    }

    #[test]
    fn empty_object_is_data_without_fields() {
        let req = parse_body::<AskRequest>(b"{}").unwrap();

        assert!(req.query.is_none());
        assert!(req.repo.is_none());
    }

    #[test]
    fn timestamp_alias_is_accepted() {
        let req = parse_body::<AskRequest>(br#"{"query": "hi", "timestamp": 5}"#).unwrap();

        assert_eq!(req.t, Some(5));
    }

    #[test]
    fn wrong_field_types_read_as_absent() {
        let req =
            parse_body::<AskRequest>(br#"{"repo": 42, "query": "status", "t": "x"}"#).unwrap();

        assert_eq!(req.query.as_deref(), Some("status"));
        assert!(req.repo.is_none());
        assert!(req.t.is_none());

        let req = parse_body::<AskRequest>(br#"{"query": "status", "t": 1.7e12}"#).unwrap();
        assert!(req.t.is_none());

        let req = parse_body::<QueryRequest>(br#"{"query": "hi", "context": [1]}"#).unwrap();
        assert!(req.context.is_none());
    }

    #[test]
    fn query_context_is_kept() {
        let req =
            parse_body::<QueryRequest>(br#"{"query": "hi", "context": {"repo": "acme", "n": 1}}"#)
                .unwrap();
        let context = req.context.unwrap();

        assert_eq!(context["repo"], "acme");
        assert_eq!(context["n"], 1);
    }

    #[test]
    fn empty_strings_are_missing() {
        assert_eq!(non_empty(Some(String::new())), None);
        assert_eq!(non_empty(Some(" ".to_string())), Some(" ".to_string()));
        assert_eq!(non_empty(None), None);
    }
}
