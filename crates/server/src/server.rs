use axum::{
    Router,
    extract::{Request, State},
    middleware::{self, Next},
    response::Response,
    routing::{get, post, put},
};
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Bearer};

use std::sync::Arc;

use crate::{ServerError, expenses, user};
use engine::{Engine, EngineError};

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
}

/// Resolve the bearer token into an [`engine::Identity`] request extension.
///
/// A missing, malformed or expired token stops the request with 401.
async fn auth(
    State(state): State<ServerState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ServerError> {
    let Some(bearer) = request.headers().typed_get::<Authorization<Bearer>>() else {
        return Err(EngineError::Unauthorized("Missing bearer token".to_string()).into());
    };

    let identity = state
        .engine
        .authenticate(bearer.token())
        .inspect_err(|err| tracing::warn!("rejected bearer token: {err}"))?;

    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}

pub fn router(state: ServerState) -> Router {
    let protected = Router::new()
        .route(
            "/api/expenses",
            get(expenses::list).post(expenses::create),
        )
        .route(
            "/api/expenses/{id}",
            put(expenses::update).delete(expenses::delete),
        )
        .route("/auth/logout", post(user::logout))
        .route("/auth/users", get(user::list))
        .route("/auth/profile", get(user::profile).put(user::update_profile))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth));

    Router::new()
        .route("/auth/signup", post(user::signup))
        .route("/auth/login", post(user::login))
        .merge(protected)
        .with_state(state)
}

pub async fn run_with_listener(
    engine: Engine,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    let state = ServerState {
        engine: Arc::new(engine),
    };

    axum::serve(listener, router(state)).await
}
