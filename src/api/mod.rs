//! HTTP server wiring: router, middleware stack, and startup.

use anyhow::{Context, Result};
use axum::{
    Extension, Router,
    body::Body,
    extract::MatchedPath,
    http::{
        HeaderName, HeaderValue, Method, Request,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    routing::{get, post},
};
use secrecy::ExposeSecret;
use sqlx::postgres::PgPoolOptions;
use std::{sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    request_id::PropagateRequestIdLayer,
    set_header::SetRequestHeaderLayer,
    trace::TraceLayer,
};
use tracing::{Span, error, info, info_span};
use ulid::Ulid;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::password;
use crate::store::{DynStore, NewUser, StoreError, postgres::PgStore};

pub mod handlers;
mod openapi;

use handlers::auth::{AuthConfig, AuthState};
use handlers::{auth, health, items, root, users};

/// Connect to the database, bootstrap the configured superuser, and serve
/// until interrupted.
///
/// # Errors
///
/// Returns an error if the database is unreachable, the bootstrap superuser
/// cannot be created, or the listener fails to bind.
pub async fn new(port: u16, dsn: String, config: AuthConfig) -> Result<()> {
    let pool = PgPoolOptions::new()
        .min_connections(1)
        .max_connections(5)
        .max_lifetime(Duration::from_secs(60 * 2))
        .test_before_acquire(true)
        .connect(&dsn)
        .await
        .context("Failed to connect to database")?;

    let store: DynStore = Arc::new(PgStore::new(pool));
    let state = Arc::new(AuthState::new(config));

    bootstrap_superuser(&store, state.config()).await?;

    let app = router(state, store);

    let listener = TcpListener::bind(format!("::0:{port}")).await?;

    info!("Listening on [::]:{}", port);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Build the full application router for the given state and store.
///
/// Exposed separately from [`new`] so tests can drive it without a listener.
#[must_use]
pub fn router(state: Arc<AuthState>, store: DynStore) -> Router {
    let cors = cors_layer(state.config().cors_origins());

    let api = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/refresh", post(auth::refresh))
        .route("/auth/test-token", post(auth::test_token))
        .route("/users", get(users::list_users))
        .route("/users/me", get(users::me).put(users::update_me))
        .route("/users/:id", get(users::get_user).delete(users::delete_user))
        .route("/items", get(items::list_items).post(items::create_item))
        .route("/items/my-items", get(items::my_items))
        .route(
            "/items/:id",
            get(items::get_item)
                .put(items::update_item)
                .delete(items::delete_item),
        );

    Router::new()
        .nest("/api/v1", api)
        .route("/", get(root::root))
        .route("/health", get(health::health))
        .merge(
            SwaggerUi::new("/docs").url("/api/v1/openapi.json", openapi::ApiDoc::openapi()),
        )
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static("x-request-id"),
                    |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    "x-request-id",
                )))
                .layer(TraceLayer::new_for_http().make_span_with(make_span))
                .layer(cors)
                .layer(Extension(state))
                .layer(Extension(store)),
        )
}

/// Create the configured superuser on first start; a concurrent or earlier
/// registration of the same email wins harmlessly.
///
/// # Errors
///
/// Returns an error only for backend failures, never for an existing account.
pub async fn bootstrap_superuser(store: &DynStore, config: &AuthConfig) -> Result<()> {
    let password_hash = password::hash(config.superuser_password().expose_secret())?;

    match store
        .insert_user(NewUser {
            email: config.superuser_email().to_string(),
            password_hash,
            full_name: Some("Admin User".to_string()),
            is_active: true,
            is_superuser: true,
        })
        .await
    {
        Ok(user) => info!("Created superuser: {}", user.email),
        Err(StoreError::Conflict(_)) => {
            info!("Superuser already exists: {}", config.superuser_email());
        }
        Err(err) => return Err(err).context("Failed to bootstrap superuser"),
    }

    Ok(())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    // An empty allow-list means no cross-origin access; same effect as not
    // configuring CORS at all.
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {err}");
        return;
    }
    info!("Gracefully shutdown");
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}
