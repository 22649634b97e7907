//! Viewer resolution.
//!
//! Admin requests are recognised by a pre-shared key compared in constant time.
//! Regular users are identified by the headers the upstream auth provider
//! forwards; everybody else is anonymous.

use axum::{
    extract::{FromRequestParts, Request},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use subtle::ConstantTimeEq;

use crate::errors::AppError;

/// Header name for the admin API key.
pub const API_KEY_HEADER: &str = "x-api-key";
/// Header carrying the signed-in user's email.
pub const USER_EMAIL_HEADER: &str = "x-user-email";
/// Header carrying the signed-in user's display name.
pub const USER_NAME_HEADER: &str = "x-user-name";

/// Proof that the request was authenticated as admin.
///
/// Only this module can mint one, so holding it is the admin capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdminToken(());

impl AdminToken {
    pub(crate) fn grant() -> Self {
        AdminToken(())
    }
}

/// Who is making the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Viewer {
    Anonymous,
    User { email: String, name: String },
    Admin(AdminToken),
}

impl Viewer {
    pub fn admin_token(&self) -> Option<AdminToken> {
        match self {
            Viewer::Admin(token) => Some(*token),
            _ => None,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.admin_token().is_some()
    }
}

/// Middleware resolving the [`Viewer`] and storing it in request extensions.
pub async fn viewer_layer(
    expected_psk: Option<String>,
    mut request: Request,
    next: Next,
) -> Response {
    match resolve_viewer(expected_psk.as_deref(), request.headers()) {
        Ok(viewer) => {
            request.extensions_mut().insert(viewer);
            next.run(request).await
        }
        Err(e) => e.into_response(),
    }
}

impl<S> FromRequestParts<S> for Viewer
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<Viewer>()
            .cloned()
            .unwrap_or(Viewer::Anonymous))
    }
}

/// Extractor that only succeeds for admin requests.
#[derive(Debug, Clone, Copy)]
pub struct AdminOnly;

impl<S> FromRequestParts<S> for AdminOnly
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let viewer = Viewer::from_request_parts(parts, state).await?;
        viewer
            .admin_token()
            .map(|_| AdminOnly)
            .ok_or_else(|| AppError::Unauthorized("Admin API key required".to_string()))
    }
}

fn resolve_viewer(expected_psk: Option<&str>, headers: &HeaderMap) -> Result<Viewer, AppError> {
    if let Some(provided) = provided_key(headers) {
        // No configured key means no admin, so any presented key is wrong.
        let Some(expected) = expected_psk else {
            return Err(AppError::Unauthorized("Invalid API key".to_string()));
        };
        if constant_time_compare(&provided, expected) {
            return Ok(Viewer::Admin(AdminToken::grant()));
        }
        return Err(AppError::Unauthorized("Invalid API key".to_string()));
    }

    let email = header_value(headers, USER_EMAIL_HEADER);
    match email {
        Some(email) if !email.trim().is_empty() => {
            let name = header_value(headers, USER_NAME_HEADER)
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| email.clone());
            Ok(Viewer::User { email, name })
        }
        _ => Ok(Viewer::Anonymous),
    }
}

fn provided_key(headers: &HeaderMap) -> Option<String> {
    header_value(headers, API_KEY_HEADER).or_else(|| {
        headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.strip_prefix("Bearer "))
            .map(|s| s.to_string())
    })
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}

/// Perform constant-time string comparison.
fn constant_time_compare(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}
