//! Authentication endpoints.

use axum::{Json, Router, extract::State, routing::post};
use axum_extra::extract::{
    CookieJar,
    cookie::{Cookie, SameSite},
};
use foodify_common::{AppError, AppResult, config::AuthConfig};
use foodify_core::SigninInput;
use foodify_db::entities::user_account;
use serde::Serialize;

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// Create auth router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/signin", post(signin))
        .route("/signout", post(signout))
}

/// Signin response.
#[derive(Serialize)]
pub struct SigninResponse {
    pub token: String,
    pub user: user_account::Model,
}

/// Sign in as a team officer.
async fn signin(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(input): Json<SigninInput>,
) -> AppResult<(CookieJar, ApiResponse<SigninResponse>)> {
    let (user, token) = state.auth_service.signin(input).await?;
    let cookie = session_cookie(&state.auth_config, &token)?;

    Ok((
        jar.add(cookie),
        ApiResponse::with_message("Login successful!", SigninResponse { token, user }),
    ))
}

/// Sign out and drop the session cookie.
async fn signout(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    jar: CookieJar,
) -> AppResult<(CookieJar, ApiResponse<()>)> {
    state.auth_service.signout(&user).await?;

    let removal = Cookie::build(state.auth_config.cookie_name.clone()).path("/");
    Ok((jar.remove(removal), ApiResponse::message("Signed out.")))
}

fn session_cookie(config: &AuthConfig, token: &str) -> AppResult<Cookie<'static>> {
    let mut cookie = Cookie::parse(format!(
        "{}={token}; Max-Age={}",
        config.cookie_name, config.cookie_max_age_secs
    ))
    .map_err(|e| AppError::Internal(format!("Invalid session cookie: {e}")))?;

    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    cookie.set_secure(config.secure_cookie);
    Ok(cookie)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_cookie_attributes() {
        let cookie = session_cookie(&AuthConfig::default(), "abc123").ok();
        let rendered = cookie.map(|c| c.to_string()).unwrap_or_default();

        assert!(rendered.starts_with("token=abc123"));
        assert!(rendered.contains("HttpOnly"));
        assert!(rendered.contains("SameSite=Lax"));
        assert!(rendered.contains("Max-Age=604800"));
        assert!(!rendered.contains("Secure"));
    }
}
