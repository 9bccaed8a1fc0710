//! Account endpoints: signup, login, logout and the caller's profile.

use api_types::{
    Message,
    user::{Login, LoginResponse, ProfileUpdate, Signup, UserView},
};
use axum::{Extension, Json, extract::State, http::StatusCode};
use axum_extra::extract::WithRejection;
use engine::{Identity, User, UserUpdate};

use crate::{ServerError, server::ServerState};

fn map_user(user: User) -> UserView {
    UserView {
        id: user.id,
        name: user.name,
        email: user.email,
        profile_pic: user.profile_pic,
        about: user.about,
    }
}

pub async fn signup(
    State(state): State<ServerState>,
    WithRejection(Json(payload), _): WithRejection<Json<Signup>, ServerError>,
) -> Result<(StatusCode, Json<Message>), ServerError> {
    let user_id = state
        .engine
        .create_user(
            &payload.email,
            &payload.password,
            &payload.name,
            payload.profile_pic.as_deref(),
        )
        .await?;
    tracing::info!(user_id, "user signed up");

    Ok((
        StatusCode::CREATED,
        Json(Message {
            message: "Signup successful. Now you can login.".to_string(),
        }),
    ))
}

pub async fn login(
    State(state): State<ServerState>,
    WithRejection(Json(payload), _): WithRejection<Json<Login>, ServerError>,
) -> Result<Json<LoginResponse>, ServerError> {
    let token = state
        .engine
        .login(&payload.email, &payload.password)
        .await
        .inspect_err(|_| tracing::warn!("failed login attempt"))?;
    Ok(Json(LoginResponse { token }))
}

/// Tokens are stateless: the client just forgets its token.
pub async fn logout(Extension(_): Extension<Identity>) -> Json<Message> {
    Json(Message {
        message: "Logged out successfully".to_string(),
    })
}

pub async fn list(
    Extension(_): Extension<Identity>,
    State(state): State<ServerState>,
) -> Result<Json<Vec<UserView>>, ServerError> {
    let users = state
        .engine
        .list_users()
        .await?
        .into_iter()
        .map(map_user)
        .collect();
    Ok(Json(users))
}

pub async fn profile(
    Extension(identity): Extension<Identity>,
    State(state): State<ServerState>,
) -> Result<Json<UserView>, ServerError> {
    let user = state.engine.user_profile(identity.user_id).await?;
    Ok(Json(map_user(user)))
}

pub async fn update_profile(
    Extension(identity): Extension<Identity>,
    State(state): State<ServerState>,
    WithRejection(Json(payload), _): WithRejection<Json<ProfileUpdate>, ServerError>,
) -> Result<Json<UserView>, ServerError> {
    let update = UserUpdate {
        name: payload.name,
        about: payload.about,
        profile_pic: payload.profile_pic,
    };
    let user = state.engine.update_user(identity.user_id, update).await?;
    Ok(Json(map_user(user)))
}
