use crate::core::error::LoginError;
use crate::core::state::AppState;
use crate::models::login::{LoginReason, LoginResponse};
use crate::utils::client_ip::client_ip;
use crate::utils::time::current_timestamp;
use axum::{
    body::Bytes,
    extract::{ConnectInfo, State},
    http::{header::CONTENT_TYPE, HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};

/// What the login route knows about a request once the decision is made
#[derive(Debug, Clone)]
pub struct LoginContext {
    pub ip: String,
    pub login: Option<String>,
    pub headers: HeaderMap,
}

/// Formats the HTTP response for a login decision.
///
/// Plain closures `Fn(LoginContext, LoginReason) -> Response` work too.
pub trait LoginResponder: Send + Sync {
    fn respond(&self, context: LoginContext, reason: LoginReason) -> Response;
}

impl<F> LoginResponder for F
where
    F: Fn(LoginContext, LoginReason) -> Response + Send + Sync,
{
    fn respond(&self, context: LoginContext, reason: LoginReason) -> Response {
        self(context, reason)
    }
}

/// Default responder: `{ "success": bool, "reason": "..." }`
pub struct JsonLoginResponder;

impl LoginResponder for JsonLoginResponder {
    fn respond(&self, _context: LoginContext, reason: LoginReason) -> Response {
        let status = match reason {
            LoginReason::Logged => StatusCode::OK,
            LoginReason::NoParameters => StatusCode::BAD_REQUEST,
            LoginReason::NoUser => StatusCode::NOT_FOUND,
            LoginReason::InvalidPassword => StatusCode::UNAUTHORIZED,
        };

        (
            status,
            Json(LoginResponse {
                success: reason.is_logged(),
                reason,
            }),
        )
            .into_response()
    }
}

/// Pull the two credential fields out of a JSON or form-urlencoded body
pub fn extract_credentials(
    headers: &HeaderMap,
    body: &[u8],
    login_field: &str,
    password_field: &str,
) -> Result<(Option<String>, Option<String>), LoginError> {
    if body.is_empty() {
        return Ok((None, None));
    }

    let is_json = headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("application/json"));

    let mut fields: HashMap<String, String> = if is_json {
        let values: HashMap<String, serde_json::Value> = serde_json::from_slice(body)
            .map_err(|e| LoginError::MalformedBody(e.to_string()))?;

        values
            .into_iter()
            .filter_map(|(key, value)| match value {
                serde_json::Value::String(s) => Some((key, s)),
                serde_json::Value::Number(n) => Some((key, n.to_string())),
                _ => None,
            })
            .collect()
    } else {
        serde_urlencoded::from_bytes(body)
            .map_err(|e| LoginError::MalformedBody(e.to_string()))?
    };

    Ok((fields.remove(login_field), fields.remove(password_field)))
}

/// Login endpoint
///
/// POST <login_route> with the configured login/password fields
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, LoginError> {
    let ip = client_ip(&headers, peer, state.config.server.trust_forwarded_headers);

    if !state.login_limiter.check_and_increment(&ip, current_timestamp()) {
        warn!(ip = %ip, "Login rate limit exceeded");
        return Err(LoginError::RateLimited);
    }

    let (login, password) = extract_credentials(
        &headers,
        &body,
        &state.config.auth.login_field,
        &state.config.auth.password_field,
    )?;

    let reason = state
        .users
        .login(login.as_deref(), password.as_deref(), &ip)
        .await?;

    if reason.is_logged() {
        info!(ip = %ip, login = ?login, "Login succeeded");
    } else {
        warn!(ip = %ip, login = ?login, reason = %reason, "Login refused");
    }

    let context = LoginContext { ip, login, headers };
    Ok(state.login_responder.respond(context, reason))
}
