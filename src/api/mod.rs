#![allow(clippy::needless_for_each)]

use crate::{
    api::handlers::{
        health, health::__path_health, pages, session::__path_logout, todos,
        todos::__path_create_todo, todos::__path_delete_todo, todos::__path_list_todos,
        todos::__path_update_todo, types, user_login, user_login::__path_login, user_register,
        user_register::__path_register, AuthState,
    },
    cli::telemetry,
};
use anyhow::{Context, Result};
use axum::{
    body::Body,
    extract::MatchedPath,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderName, HeaderValue, Method, Request,
    },
    middleware,
    routing::{get, post},
    Extension, Router,
};
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::PropagateRequestIdLayer,
    set_header::SetRequestHeaderLayer,
    trace::TraceLayer,
};
use tracing::{info, info_span, Span};
use ulid::Ulid;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

pub mod handlers;

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        register,
        login,
        logout,
        list_todos,
        create_todo,
        update_todo,
        delete_todo
    ),
    components(schemas(
        health::Health,
        user_register::UserRegister,
        user_register::RegisterResponse,
        user_login::UserLogin,
        user_login::LoginResponse,
        todos::CreateTodo,
        todos::UpdateTodo,
        todos::DeleteTodo,
        types::Todo,
        types::UserSummary,
        types::ErrorBody,
        types::MessageBody
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Registration, login and logout"),
        (name = "todo", description = "Todo items owned by the caller"),
        (name = "health", description = "Service health")
    )
)]
struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

/// Build the application router: JSON API under `/api`, guarded HTML pages,
/// `/health` and the Swagger UI at `/docs`.
pub fn router(pool: PgPool, auth_state: Arc<AuthState>) -> Router {
    let cors = CorsLayer::new()
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_origin(Any);

    let api = Router::new()
        .route("/register", post(handlers::register))
        .route("/login", post(handlers::login))
        .route("/logout", post(handlers::logout))
        .route(
            "/todo",
            get(handlers::list_todos)
                .post(handlers::create_todo)
                .put(handlers::update_todo)
                .delete(handlers::delete_todo),
        );

    let page_routes = Router::new()
        .route("/", get(pages::home))
        .route("/login", get(pages::login_page))
        .route("/register", get(pages::register_page))
        .route("/dashboard", get(pages::dashboard))
        .route_layer(middleware::from_fn_with_state(
            auth_state.clone(),
            handlers::page_guard,
        ));

    Router::new()
        .nest("/api", api)
        .merge(page_routes)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", openapi()))
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
                .layer(Extension(auth_state))
                .layer(Extension(pool.clone())),
        )
        .route("/health", get(handlers::health).options(handlers::health))
        .layer(Extension(pool))
}

/// Start the server
/// # Errors
/// Return error if failed to connect to the database or to start the server
pub async fn new(port: u16, dsn: String, auth_state: Arc<AuthState>) -> Result<()> {
    // Connect to database
    let pool = PgPoolOptions::new()
        .min_connections(1)
        .max_connections(5)
        .max_lifetime(Duration::from_secs(60 * 2))
        .test_before_acquire(true)
        .connect(&dsn)
        .await
        .context("Failed to connect to database")?;

    let app = router(pool, auth_state);

    let listener = TcpListener::bind(format!("::0:{port}")).await?;

    info!("Listening on [::]:{}", port);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    telemetry::shutdown_tracer();

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for ctrl-c: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
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

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::api::handlers::state::fixtures;
    use axum::http::{header::LOCATION, StatusCode};
    use tower::ServiceExt;

    fn app() -> Router {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://todos@127.0.0.1:1/todos")
            .unwrap();
        router(pool, fixtures::auth_state())
    }

    async fn fetch(uri: &str) -> axum::response::Response {
        app()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    #[test]
    fn openapi_lists_every_endpoint() {
        let doc = openapi();
        for path in ["/health", "/api/register", "/api/login", "/api/logout", "/api/todo"] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
        let todo = &doc.paths.paths["/api/todo"];
        assert!(todo.get.is_some());
        assert!(todo.post.is_some());
        assert!(todo.put.is_some());
        assert!(todo.delete.is_some());
    }

    #[test]
    fn openapi_declares_bearer_scheme() {
        let doc = openapi();
        let components = doc.components.unwrap();
        assert!(components.security_schemes.contains_key("bearer"));
    }

    #[tokio::test]
    async fn request_id_is_generated() {
        let response = fetch("/").await;
        assert_eq!(response.status(), StatusCode::OK);
        let request_id = response.headers().get("x-request-id").unwrap();
        assert!(Ulid::from_string(request_id.to_str().unwrap()).is_ok());
    }

    #[tokio::test]
    async fn guarded_page_redirects() {
        let response = fetch("/dashboard").await;
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(response.headers().get(LOCATION).unwrap(), "/");
    }

    #[tokio::test]
    async fn api_is_not_redirected() {
        let response = fetch("/api/todo").await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn unknown_page_is_not_found() {
        let response = fetch("/settings").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
