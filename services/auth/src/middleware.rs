//! Middleware for JWT token validation and authentication

use axum::{
    Json,
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use serde_json::json;
use tracing::warn;

use crate::jwt::{AuthUser, JwtService};

/// Rejection returned for every authentication failure on protected routes
#[derive(Debug)]
pub struct Unauthorized;

impl IntoResponse for Unauthorized {
    fn into_response(self) -> Response {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": "Not authorized" })),
        )
            .into_response()
    }
}

/// Validate the bearer token and insert the caller's [`AuthUser`] into the
/// request extensions.
pub async fn auth_middleware(
    State(jwt_service): State<JwtService>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, Unauthorized> {
    let TypedHeader(Authorization(bearer)) = bearer.ok_or(Unauthorized)?;

    let claims = jwt_service.validate_token(bearer.token()).map_err(|e| {
        warn!("Rejected bearer token: {}", e);
        Unauthorized
    })?;

    req.extensions_mut().insert(AuthUser::from(claims));

    Ok(next.run(req).await)
}
