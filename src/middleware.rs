//! Bearer token gate with per-route role allow-lists.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};

use crate::error::ApiError;
use crate::models::Role;
use crate::state::AppState;
use crate::users;

pub const USER_EMAIL_HEADER: HeaderName = HeaderName::from_static("x-user-email");

/// Identity resolved by the gate, available to handlers as an extension.
#[derive(Debug, Clone)]
pub struct Caller {
    pub email: String,
    pub role: Role,
}

#[derive(Clone)]
pub struct RoleGate {
    state: AppState,
    allowed: &'static [Role],
}

impl RoleGate {
    pub fn new(state: AppState, allowed: &'static [Role]) -> Self {
        Self { state, allowed }
    }

    pub fn admits(&self, role: Role) -> bool {
        self.allowed.contains(&role)
    }
}

pub async fn require_role(
    State(gate): State<RoleGate>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let claims = {
        let token = bearer_token(request.headers())?;
        gate.state
            .tokens
            .verify(token)
            .map_err(|err| ApiError::Unauthorized(format!("Invalid token: {err}")))?
    };

    let email = claims.email;
    let lookup = email.clone();
    let role = gate
        .state
        .with_conn(move |conn| Ok(users::role_for_email(conn, &lookup)?))
        .await?
        .ok_or_else(|| ApiError::Unauthorized("user not found".to_owned()))?;

    if !gate.admits(role) {
        tracing::debug!(%email, %role, "role not permitted on this route");
        return Err(ApiError::Forbidden("Forbidden: Insufficient role".to_owned()));
    }

    let header_value = HeaderValue::from_str(&email).ok();
    request.extensions_mut().insert(Caller { email, role });

    let mut response = next.run(request).await;
    if let Some(value) = header_value {
        response.headers_mut().insert(USER_EMAIL_HEADER, value);
    }
    Ok(response)
}

fn bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or_else(|| ApiError::Unauthorized("Unauthorized: Missing token".to_owned()))?;
    let invalid_format = || ApiError::Unauthorized("Unauthorized: Invalid token format".to_owned());
    let value = value.to_str().map_err(|_| invalid_format())?;

    let mut parts = value.split(' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some("Bearer"), Some(token), None) if !token.is_empty() => Ok(token),
        _ => Err(invalid_format()),
    }
}
