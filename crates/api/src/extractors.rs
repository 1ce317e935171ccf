//! Request extractors.

use std::convert::Infallible;
use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, FromRequestParts},
    http::{HeaderMap, request::Parts},
};
use foodify_common::AppError;
use foodify_core::{ClientInfo, OFFICER_REQUIRED};
use foodify_db::entities::user_account;

/// Authenticated user extractor.
#[derive(Debug, Clone)]
pub struct AuthUser(pub user_account::Model);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Set by auth middleware
        parts
            .extensions
            .get::<user_account::Model>()
            .cloned()
            .map(AuthUser)
            .ok_or(AppError::Unauthorized)
    }
}

/// Team officer or admin extractor.
#[derive(Debug, Clone)]
pub struct OfficerUser(pub user_account::Model);

impl<S> FromRequestParts<S> for OfficerUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let AuthUser(user) = AuthUser::from_request_parts(parts, state).await?;
        if !user.is_officer() {
            return Err(AppError::Forbidden(OFFICER_REQUIRED.to_string()));
        }
        Ok(Self(user))
    }
}

/// Caller IP and user agent for the moderation log.
#[derive(Debug, Clone, Default)]
pub struct RequestMeta(pub ClientInfo);

impl<S> FromRequestParts<S> for RequestMeta
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string());

        Ok(Self(ClientInfo {
            ip_address: forwarded_ip(&parts.headers).or(peer),
            user_agent: parts
                .headers
                .get(axum::http::header::USER_AGENT)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string),
        }))
    }
}

/// First hop of `X-Forwarded-For`.
fn forwarded_ip(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .map(str::to_string)
}
