//! Signup, login and session endpoints

use axum::{extract::State, http::StatusCode, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Serialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    error::AppResult,
    models::user::{LoginRequest, SignupRequest, User, UserDetails},
};

use super::{session_token, AuthenticatedUser};

/// Session opened by signup or login
#[derive(Serialize, ToSchema)]
pub struct LoginResponse {
    /// Session token, also set as an HTTP-only cookie
    pub token: String,
    /// Session lifetime in seconds
    pub expires_in: u64,
    pub user: User,
}

fn session_cookie(state: &crate::AppState, token: String) -> Cookie<'static> {
    Cookie::build((state.config.auth.cookie_name.clone(), token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(state.config.auth.secure_cookies)
        .build()
}

async fn open_session(
    state: &crate::AppState,
    jar: CookieJar,
    user: User,
) -> AppResult<(CookieJar, LoginResponse)> {
    let token = state.services.users.open_session(user.id).await?;
    let jar = jar.add(session_cookie(state, token.clone()));
    Ok((
        jar,
        LoginResponse {
            token,
            expires_in: state.services.users.session_ttl_seconds(),
            user,
        },
    ))
}

/// Register a student account and log it in
#[utoipa::path(
    post,
    path = "/auth/signup",
    tag = "auth",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "Account created", body = LoginResponse),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Username already exists")
    )
)]
pub async fn signup(
    State(state): State<crate::AppState>,
    jar: CookieJar,
    Json(request): Json<SignupRequest>,
) -> AppResult<(StatusCode, CookieJar, Json<LoginResponse>)> {
    request.validate()?;

    let user = state.services.users.signup(request).await?;
    let (jar, response) = open_session(&state, jar, user).await?;
    Ok((StatusCode::CREATED, jar, Json(response)))
}

/// Authenticate with username and password
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 401, description = "Invalid credentials or disabled account")
    )
)]
pub async fn login(
    State(state): State<crate::AppState>,
    jar: CookieJar,
    Json(request): Json<LoginRequest>,
) -> AppResult<(CookieJar, Json<LoginResponse>)> {
    let user = state
        .services
        .users
        .authenticate(&request.username, &request.password)
        .await?;
    let (jar, response) = open_session(&state, jar, user).await?;
    Ok((jar, Json(response)))
}

/// End the current session
#[utoipa::path(
    post,
    path = "/auth/logout",
    tag = "auth",
    responses(
        (status = 204, description = "Logged out")
    )
)]
pub async fn logout(
    State(state): State<crate::AppState>,
    headers: axum::http::HeaderMap,
    jar: CookieJar,
) -> AppResult<(CookieJar, StatusCode)> {
    if let Some(token) = session_token(&headers, &state.config.auth.cookie_name) {
        state.services.users.close_session(&token).await?;
    }

    let removal = Cookie::build((state.config.auth.cookie_name.clone(), "")).path("/");
    Ok((jar.remove(removal), StatusCode::NO_CONTENT))
}

/// Get the current user with profiles
#[utoipa::path(
    get,
    path = "/auth/me",
    tag = "auth",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current user", body = UserDetails),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn me(
    State(state): State<crate::AppState>,
    AuthenticatedUser(current): AuthenticatedUser,
) -> AppResult<Json<UserDetails>> {
    let details = state.services.users.get_details(current.id).await?;
    Ok(Json(details))
}
