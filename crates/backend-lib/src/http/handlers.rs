// ============================
// canary-backend-lib/src/http/handlers.rs
// ============================
//! Route handlers wrapping the auth service.
use axum::{
    body::Bytes,
    extract::State,
    http::{
        header::{CONTENT_TYPE, LOCATION, SET_COOKIE},
        HeaderMap, StatusCode,
    },
    response::{IntoResponse, Response},
    Json,
};
use canary_common::{Credentials, LoginResponse, SessionInfo, UserCreatedResponse};
use std::sync::Arc;
use tracing::{debug, warn};

use super::cookie::{clear_session_cookie, session_cookie, session_token};
use super::negotiate::{negotiate, RequestFormat};
use crate::error::AppError;
use crate::AppState;

/// `POST /login`: form posts get redirects, JSON callers get status codes
pub async fn login(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let format = negotiate(headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok()));

    let credentials = match format {
        RequestFormat::Form => parse_form(&body),
        RequestFormat::Json => match parse_json(&body) {
            Ok(credentials) => credentials,
            Err(err) => return err.into_response(),
        },
    };

    match state
        .auth
        .login(&credentials.username, &credentials.password)
        .await
    {
        Ok(token) => {
            let cookie = session_cookie(
                &token,
                state.settings.session.ttl().num_seconds(),
                state.settings.server.secure_cookies,
            );
            match format {
                RequestFormat::Form => {
                    (StatusCode::SEE_OTHER, [(SET_COOKIE, cookie), (LOCATION, "/".to_string())])
                        .into_response()
                },
                RequestFormat::Json => (
                    [(SET_COOKIE, cookie)],
                    Json(LoginResponse {
                        success: "true".to_string(),
                    }),
                )
                    .into_response(),
            }
        },
        Err(err) => match format {
            RequestFormat::Form => redirect(login_error_location(&err)),
            RequestFormat::Json => err.into_response(),
        },
    }
}

/// `POST /logout`: always clears the cookie and sends the browser to the login page
pub async fn logout(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    if let Some(token) = session_token(&headers) {
        if let Err(e) = state.auth.logout(&token).await {
            warn!("Failed to end session on logout: {}", e);
        }
    }

    (
        StatusCode::SEE_OTHER,
        [
            (SET_COOKIE, clear_session_cookie(state.settings.server.secure_cookies)),
            (LOCATION, "/login".to_string()),
        ],
    )
        .into_response()
}

/// `POST /api/users`
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<UserCreatedResponse>, AppError> {
    let credentials = parse_json(&body)?;
    let user = state
        .auth
        .create_user(&credentials.username, &credentials.password)
        .await?;

    Ok(Json(UserCreatedResponse {
        success: "true".to_string(),
        username: user.username,
    }))
}

/// `GET /api/session`
pub async fn current_session(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<SessionInfo>, AppError> {
    let token = session_token(&headers).ok_or(AppError::InvalidSession)?;
    Ok(Json(state.auth.validate_session(&token).await?))
}

/// `GET /health`
pub async fn health() -> &'static str {
    "Healthy"
}

fn parse_json(body: &[u8]) -> Result<Credentials, AppError> {
    serde_json::from_slice(body).map_err(|e| {
        debug!("Rejected request body: {}", e);
        AppError::InvalidInput(format!("Malformed JSON body: {e}"))
    })
}

fn parse_form(body: &[u8]) -> Credentials {
    let mut credentials = Credentials::default();
    for (key, value) in url::form_urlencoded::parse(body) {
        match key.as_ref() {
            "username" => credentials.username = value.into_owned(),
            "password" => credentials.password = value.into_owned(),
            _ => {},
        }
    }
    credentials
}

fn login_error_location(err: &AppError) -> &'static str {
    match err {
        err if err.is_auth_failure() => "/login?error=Invalid+credentials",
        AppError::InvalidInput(_) => "/login?error=Invalid+credentials",
        AppError::SessionCreationFailed => "/login?error=Failed+to+create+session",
        _ => "/login?error=Service+unavailable",
    }
}

fn redirect(location: &'static str) -> Response {
    (StatusCode::SEE_OTHER, [(LOCATION, location)]).into_response()
}
