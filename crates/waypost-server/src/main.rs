use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Router, middleware,
    routing::{delete, get, post, put},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use waypost_api::auth::{self, AppState, AppStateInner};
use waypost_api::middleware::{require_admin, require_auth};
use waypost_api::{assignments, links, users};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "waypost=debug,tower_http=debug".into()),
        )
        .init();

    // Config
    let jwt_secret =
        std::env::var("WAYPOST_JWT_SECRET").unwrap_or_else(|_| "dev-secret-change-me".into());
    if jwt_secret == "dev-secret-change-me" {
        warn!("WAYPOST_JWT_SECRET not set, using the dev secret");
    }
    let db_path = std::env::var("WAYPOST_DB_PATH").unwrap_or_else(|_| "waypost.db".into());
    let host = std::env::var("WAYPOST_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("WAYPOST_PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()?;
    let admin_username =
        std::env::var("WAYPOST_ADMIN_USERNAME").unwrap_or_else(|_| "admin".into());
    let admin_password =
        std::env::var("WAYPOST_ADMIN_PASSWORD").unwrap_or_else(|_| "admin123".into());

    // Init database
    let db = waypost_db::Database::open(&PathBuf::from(&db_path))?;

    // One-time bootstrap: the portal is unusable without an admin account
    if auth::ensure_bootstrap_admin(&db, &admin_username, &admin_password)?
        && admin_password == "admin123"
    {
        warn!("Bootstrap admin uses the default password, change it after first login");
    }

    // Shared state
    let app_state: AppState = Arc::new(AppStateInner {
        db,
        jwt_secret,
        protected_admin: admin_username,
    });

    // Routes
    let public_routes = Router::new()
        .route("/api/auth/login", post(auth::login))
        .route("/api/links", get(links::list_links))
        .with_state(app_state.clone());

    let session_routes = Router::new()
        .route("/api/links/user-assigned", get(links::user_assigned_links))
        .layer(middleware::from_fn(require_auth))
        .with_state(app_state.clone());

    let admin_routes = Router::new()
        .route("/api/links", post(links::create_link))
        .route(
            "/api/links/{id}",
            put(links::update_link).delete(links::delete_link),
        )
        .route("/api/users", get(users::list_users).post(users::create_user))
        .route("/api/users/{id}", delete(users::delete_user))
        .route(
            "/api/assignments",
            get(assignments::list_assignments)
                .post(assignments::create_assignment)
                .delete(assignments::remove_assignment_body),
        )
        .route(
            "/api/assignments/{user_id}/{link_id}",
            delete(assignments::remove_assignment),
        )
        .layer(middleware::from_fn(require_admin))
        .with_state(app_state);

    let app = Router::new()
        .merge(public_routes)
        .merge(session_routes)
        .merge(admin_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Waypost server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
