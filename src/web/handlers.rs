use actix_web::{web, HttpRequest, HttpResponse, Responder};
use chrono::Utc;
use log::{debug, error, info};
use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::config::now_iso;
use crate::model::make_token;
use crate::web::error::ApiError;
use crate::web::models::{
    non_empty, parse_body, AskRequest, AskResponse, AuthResponse, HealthResponse, MongooseInfo,
    QueryRequest, QueryResponse, TokenRequest, TokenResponse,
};
use crate::AppState;

const UNKNOWN_REPO: &str = "unknown";
const DEFAULT_ACTION: &str = "query";
const OPERATOR_HEADER: &str = "X-Mongoose-Operator";

// Serialize here rather than through `HttpResponse::json` so that failures
// keep the `{ok: false, error}` shape.
fn json_ok<T: Serialize>(body: &T) -> Result<HttpResponse, ApiError> {
    let payload = serde_json::to_vec(body).map_err(|e| {
        error!("Failed to serialize response: {}", e);
        ApiError::from(e)
    })?;
    Ok(HttpResponse::Ok()
        .content_type("application/json")
        .body(payload))
}

fn log_operator_header(req: &HttpRequest) {
    if let Some(operator) = req
        .headers()
        .get(OPERATOR_HEADER)
        .and_then(|v| v.to_str().ok())
    {
        debug!("{} header: {}", OPERATOR_HEADER, operator);
    }
}

// Chat widget endpoint
pub async fn ask(
    data: web::Data<AppState>,
    req: HttpRequest,
    body: web::Bytes,
) -> Result<HttpResponse, ApiError> {
    log_operator_header(&req);

    let ask: AskRequest = parse_body(&body).ok_or(ApiError::NoData)?;
    let repo = ask.repo.unwrap_or_else(|| UNKNOWN_REPO.to_string());
    let query = non_empty(ask.query).ok_or(ApiError::MissingQuery)?;
    let timestamp = ask.t.unwrap_or_else(|| Utc::now().timestamp_millis());

    info!("Ask request for repo {}: {}", repo, query);

    let mut context = Map::new();
    context.insert("timestamp".to_string(), json!(timestamp));
    context.insert("operator".to_string(), json!(data.config.operator));

    let answer = data.model.respond(&query, &repo, Some(&context));
    let token = make_token(&repo, DEFAULT_ACTION);

    json_ok(&AskResponse {
        ok: true,
        repo,
        answer,
        token,
        mongoose: MongooseInfo {
            operator: data.config.operator.clone(),
            mode: data.config.mode.clone(),
            timestamp: now_iso(),
        },
    })
}

// Availability probe used by the browser router module
pub async fn ask_probe() -> impl Responder {
    HttpResponse::Ok().finish()
}

pub async fn health(data: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        healthy: true,
        status: "operational",
        mode: data.config.mode.clone(),
        operator: data.config.operator.clone(),
        timestamp: now_iso(),
    })
}

// Always authenticates; only an unparseable body is rejected.
pub async fn auth(
    data: web::Data<AppState>,
    req: HttpRequest,
    body: web::Bytes,
) -> impl Responder {
    log_operator_header(&req);

    let blank = body.iter().all(u8::is_ascii_whitespace);
    if !blank {
        if let Err(e) = serde_json::from_slice::<Value>(&body) {
            error!("Invalid auth body: {}", e);
            return HttpResponse::InternalServerError().json(json!({
                "success": false,
                "error": e.to_string(),
            }));
        }
    }

    HttpResponse::Ok().json(AuthResponse {
        success: true,
        mode: data.config.mode.clone(),
        operator: data.config.operator.clone(),
        authenticated: true,
        timestamp: now_iso(),
    })
}

pub async fn query(
    data: web::Data<AppState>,
    req: HttpRequest,
    body: web::Bytes,
) -> Result<HttpResponse, ApiError> {
    log_operator_header(&req);

    let request: QueryRequest = parse_body(&body).unwrap_or_default();
    let query = non_empty(request.query).ok_or(ApiError::MissingQuery)?;
    let context = request.context.unwrap_or_default();
    let repo = context
        .get("repo")
        .and_then(Value::as_str)
        .unwrap_or(UNKNOWN_REPO);

    info!("Direct query for repo {}: {}", repo, query);

    let answer = data.model.respond(&query, repo, Some(&context));

    json_ok(&QueryResponse {
        ok: true,
        answer,
        context,
        timestamp: now_iso(),
    })
}

pub async fn token(req: HttpRequest, body: web::Bytes) -> Result<HttpResponse, ApiError> {
    log_operator_header(&req);

    let request: TokenRequest = parse_body(&body).unwrap_or_default();
    let repo = request.repo.unwrap_or_else(|| UNKNOWN_REPO.to_string());
    let action = request.action.unwrap_or_else(|| DEFAULT_ACTION.to_string());

    let token = make_token(&repo, &action);
    debug!("Issued token {}", token.id);

    json_ok(&TokenResponse { ok: true, token })
}
