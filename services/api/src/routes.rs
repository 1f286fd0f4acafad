//! API service routes

use auth::{AuthUser, middleware::auth_middleware, notifier::account_created_email, password};
use axum::{
    Extension, Json, Router,
    extract::{DefaultBodyLimit, Path, State, rejection::JsonRejection},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post, put},
};
use common::error::DatabaseError;
use serde_json::json;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult, internal},
    models::{LoginRequest, NewUser, RegisterRequest, UpdateBioRequest, User, UserProfile},
    state::AppState,
    uploads::UPLOAD_BODY_LIMIT,
};

pub mod media;

/// Create the router for the API service
pub fn create_router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/api/users/me", get(get_current_user))
        .route("/api/users/bio", put(update_bio))
        .route(
            "/api/uploads/profile-picture",
            post(media::upload_profile_picture).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .route(
            "/api/uploads/video",
            post(media::upload_video).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .route_layer(middleware::from_fn_with_state(
            state.jwt_service.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .route("/api/users/register", post(register))
        .route("/api/users/login", post(login))
        .route("/api/users/all", get(get_all_users))
        .route("/api/users/:user_id", get(get_user_by_id))
        .merge(protected_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "clipshare-api",
        "database": state.user_repository.is_healthy().await,
    }))
}

/// Register a new account and mail its generated password
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(payload) = payload?;
    if let Some(field) = payload.missing_field() {
        return Err(ApiError::Validation(format!("{} is required", field)));
    }

    info!("Registration attempt for {}", payload.email);

    let existing = state
        .user_repository
        .find_by_email(&payload.email)
        .await
        .map_err(internal("Error registering user"))?;
    if existing.is_some() {
        return Err(ApiError::UserExists);
    }

    let password = password::generate_password(&payload.firstname, &payload.email, &payload.mobile);
    let password_hash =
        password::hash_password(&password).map_err(internal("Error registering user"))?;

    let new_user = NewUser {
        firstname: payload.firstname,
        lastname: payload.lastname,
        email: payload.email,
        mobile: payload.mobile,
        password_hash,
    };

    let user = match state.user_repository.create(&new_user).await {
        Ok(user) => user,
        Err(DatabaseError::Conflict(_)) => return Err(ApiError::UserExists),
        Err(e) => return Err(internal("Error registering user")(e)),
    };

    // The account stands even if the mail does not go out.
    let email = account_created_email(&user.email, &password, &state.login_url);
    if let Err(e) = state.notifier.send(&email).await {
        warn!("Failed to send account email to {}: {}", user.email, e);
    }

    info!("Registered user {}", user.id);

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "User registered successfully. Please check your email for your password."
        })),
    ))
}

/// Exchange credentials for a session token
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(payload) = payload?;
    let email = payload.email.as_deref().filter(|e| !e.is_empty());
    let firstname = payload.firstname.as_deref().filter(|f| !f.is_empty());

    let user = match (email, firstname) {
        (Some(email), _) => state.user_repository.find_by_email(email).await,
        (None, Some(firstname)) => state.user_repository.find_by_firstname(firstname).await,
        (None, None) => {
            return Err(ApiError::Validation(
                "email or firstname is required".to_string(),
            ));
        }
    }
    .map_err(internal("Error logging in user"))?
    .ok_or(ApiError::UnknownLogin)?;

    if !password::verify_password(&payload.password, &user.password_hash)
        .map_err(internal("Error logging in user"))?
    {
        return Err(ApiError::InvalidCredentials);
    }

    let token = state
        .jwt_service
        .issue(user.id, &user.firstname, &user.email)
        .map_err(internal("Error logging in user"))?;

    if !user.email_registered {
        state
            .user_repository
            .mark_logged_in(user.id)
            .await
            .map_err(internal("Error logging in user"))?;
    }

    info!("User {} logged in", user.id);

    Ok(Json(json!({
        "message": "Login successful",
        "token": token,
    })))
}

/// Attach a user's videos to form the public projection
async fn load_profile(state: &AppState, user: User) -> Result<UserProfile, DatabaseError> {
    let videos = state.user_repository.videos_of(user.id).await?;
    Ok(UserProfile::new(user, videos))
}

/// Profile of the authenticated caller
pub async fn get_current_user(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> ApiResult<Json<UserProfile>> {
    let user = state
        .user_repository
        .find_by_id(auth_user.id)
        .await
        .map_err(internal("Error fetching user details"))?
        .ok_or(ApiError::NotFound)?;

    let profile = load_profile(&state, user)
        .await
        .map_err(internal("Error fetching user details"))?;

    Ok(Json(profile))
}

/// Public profile of any user
pub async fn get_user_by_id(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<UserProfile>> {
    let user_id = Uuid::parse_str(&user_id).map_err(|_| ApiError::NotFound)?;

    let user = state
        .user_repository
        .find_by_id(user_id)
        .await
        .map_err(internal("Error fetching user details"))?
        .ok_or(ApiError::NotFound)?;

    let profile = load_profile(&state, user)
        .await
        .map_err(internal("Error fetching user details"))?;

    Ok(Json(profile))
}

/// Every user with their videos
pub async fn get_all_users(State(state): State<AppState>) -> ApiResult<Json<Vec<UserProfile>>> {
    let users = state
        .user_repository
        .list()
        .await
        .map_err(internal("Error fetching users"))?;

    let mut profiles = Vec::with_capacity(users.len());
    for user in users {
        profiles.push(
            load_profile(&state, user)
                .await
                .map_err(internal("Error fetching users"))?,
        );
    }

    Ok(Json(profiles))
}

/// Overwrite the caller's bio
pub async fn update_bio(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    payload: Result<Json<UpdateBioRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(payload) = payload?;
    let updated = state
        .user_repository
        .update_bio(auth_user.id, payload.bio.as_deref())
        .await
        .map_err(internal("Error updating bio"))?;

    if !updated {
        return Err(ApiError::NotFound);
    }

    Ok(Json(json!({
        "message": "Bio updated successfully",
        "success": true,
    })))
}
