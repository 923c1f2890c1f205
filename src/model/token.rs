use chrono::Utc;
use serde::Serialize;

const TOKEN_PREFIX: &str = "tok";
const TOKEN_TYPE: &str = "c13b0";

/// Illustrative token handed back with each answer. Nothing validates it and
/// ids only differ by millisecond, so two tokens for the same repo minted in
/// the same millisecond share an id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    pub id: String,
    pub value: i64,
    #[serde(rename = "type")]
    pub kind: String,
    pub repo: String,
    pub action: String,
    pub timestamp: i64,
}

impl Token {
    pub fn at(repo: &str, action: &str, timestamp: i64) -> Self {
        Self {
            id: format!("{}_{}_{}", TOKEN_PREFIX, repo, timestamp),
            value: timestamp.rem_euclid(100),
            kind: TOKEN_TYPE.to_string(),
            repo: repo.to_string(),
            action: action.to_string(),
            timestamp,
        }
    }
}

pub fn make_token(repo: &str, action: &str) -> Token {
    Token::at(repo, action, Utc::now().timestamp_millis())
}
