//! Documentation of the PubliPUCP API.
//!
//! The portfolio site is statically built; this server covers the few routes
//! that must run at request time.
//!
//!
//!
//! # Routes
//! - `GET /api/students`: id, full name and code of every student, for the
//!   author picker in the ticket form
//! - `POST /api/tickets`: files an update request (`update-users`,
//!   `update-images`, `update-videos`) against a project
//! - `POST /api/webhook-discord`: Vercel deploy events reposted to Discord
//! - `GET /api/projects`, `GET /api/projects/{slug}`, `GET /api/users`:
//!   projected catalog views
//!
//! Errors come back as `{ "error": ..., "details": ... }`.
//!
//!
//!
//! # Data
//!
//! Everything lives in an Airtable base (users, categories, courses, projects,
//! tickets). Nothing is cached: each request fetches the tables it needs
//! concurrently and joins them in memory. With a few hundred records this is
//! well within a request budget, and edits in Airtable show up immediately.
//!
//!
//!
//! # Setup
//!
//! Required.
//! ```sh
//! export AIRTABLE_API_KEY=pat...
//! ```
//!
//! Optional: `AIRTABLE_BASE_ID`, `AIRTABLE_API_URL`, `DISCORD_WEBHOOK_URL`,
//! `PUBLIC_POSTHOG_KEY` (only checked, a warning is logged when unset),
//! `RUST_PORT`. Secrets may also be mounted under `/run/secrets/<NAME>`; a `.env` file is read when present.
//!
//! Run.
//! ```sh
//! RUST_LOG=info cargo run --bin server
//! ```
//!
//! Export data for a site build.
//! ```sh
//! cargo run --bin catalog -- --out projects.json projects
//! ```
use std::{sync::Arc, time::Duration};

use axum::{
    Router,
    http::{Method, header::CONTENT_TYPE},
    routing::{get, post},
};

use signal::{
    ctrl_c,
    unix::{SignalKind, signal},
};
use tokio::{net::TcpListener, signal};
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

pub mod config;
pub mod discord;
pub mod error;
pub mod routes;
pub mod state;

use config::Config;
use routes::{
    method_not_allowed, project_handler, projects_handler, students_handler, tickets_handler,
    users_handler, webhook_handler,
};
use state::State;

pub async fn start_server() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    info!("Loading config...");
    let config = Config::load()?;

    info!("Initializing state...");
    let state = State::new(config)?;

    info!("Starting server...");

    let address = format!("0.0.0.0:{}", state.config.port);
    info!("Binding to {address}");

    let listener = TcpListener::bind(&address).await?;
    info!("Server running on {address}");

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");

    Ok(())
}

pub fn app(state: Arc<State>) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    Router::new()
        .route("/api/students", get(students_handler))
        .route("/api/users", get(users_handler))
        .route("/api/projects", get(projects_handler))
        .route("/api/projects/{slug}", get(project_handler))
        .route("/api/tickets", post(tickets_handler))
        .route(
            "/api/webhook-discord",
            post(webhook_handler).fallback(method_not_allowed),
        )
        .layer(cors)
        .with_state(state)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        ctrl_c().await.expect("Failed to install Ctrl+C handler");

        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        signal(SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;

        info!("Received terminate signal, shutting down");
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use axum::{
        Json,
        body::Body,
        extract::State as AxumState,
        http::{Request, StatusCode},
    };
    use http_body_util::BodyExt;
    use serde_json::{Value, json};
    use store::{MemoryStore, RecordStore, Table};
    use tower::ServiceExt;

    use super::*;

    fn config(discord_webhook_url: Option<String>) -> Config {
        Config {
            port: 0,
            airtable_api_key: "key-test".to_string(),
            airtable_base_id: store::DEFAULT_BASE_ID.to_string(),
            airtable_api_url: store::DEFAULT_API_URL.to_string(),
            discord_webhook_url,
        }
    }

    fn seeded() -> MemoryStore {
        MemoryStore::new()
            .with_table(Table::Users, vec![
                ("u1", json!({ "first_name": "Ana", "last_name": "Quispe", "code": "20201234" })),
                ("u2", json!({ "first_name": "Luis" })),
            ])
            .with_table(Table::Projects, vec![
                ("p1", json!({ "id": 1, "title": "Café de París!", "authors": ["u1", "u404"] })),
            ])
    }

    fn router(store: Arc<dyn RecordStore>, webhook: Option<String>) -> Router {
        app(State::with_store(config(webhook), store))
    }

    async fn call(app: Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(CONTENT_TYPE, "application/json")
            .body(match body {
                Some(body) => Body::from(body.to_string()),
                None => Body::empty(),
            })
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();

        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    #[tokio::test]
    async fn test_students() {
        let app = router(Arc::new(seeded()), None);

        let (status, body) = call(app, Method::GET, "/api/students", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!([
                { "id": "u1", "fullName": "Ana Quispe", "code": "20201234" },
                { "id": "u2", "fullName": "Luis" }
            ])
        );
    }

    #[tokio::test]
    async fn test_students_store_down() {
        let app = router(Arc::new(MemoryStore::unavailable()), None);

        let (status, body) = call(app, Method::GET, "/api/students", None).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Failed to fetch students");
        assert!(body["details"].as_str().unwrap().contains("unavailable"));
    }

    #[tokio::test]
    async fn test_users_with_counts() {
        let app = router(Arc::new(seeded()), None);

        let (status, body) = call(app, Method::GET, "/api/users", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["projectCount"], 1);
        assert_eq!(body[1]["projectCount"], 0);
    }

    #[tokio::test]
    async fn test_project_by_slug() {
        let store: Arc<dyn RecordStore> = Arc::new(seeded());

        let (status, body) =
            call(router(store.clone(), None), Method::GET, "/api/projects/cafe-de-paris", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["title"], "Café de París!");
        assert_eq!(body["authors"].as_array().unwrap().len(), 1);

        let (status, body) =
            call(router(store, None), Method::GET, "/api/projects/missing-slug", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Project not found");
    }

    #[tokio::test]
    async fn test_projects() {
        let app = router(Arc::new(seeded()), None);

        let (status, body) = call(app, Method::GET, "/api/projects", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["slug"], "cafe-de-paris");
    }

    #[tokio::test]
    async fn test_create_ticket() {
        let store = Arc::new(MemoryStore::new());
        let app = router(store.clone(), None);

        let (status, body) = call(
            app,
            Method::POST,
            "/api/tickets",
            Some(json!({ "type": "update-users", "projectId": "p1", "userIds": ["u1"], "notes": "" })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);

        let tickets = store.records(Table::Tickets);
        assert_eq!(body["ticketId"], tickets[0].id.as_str());
        assert_eq!(
            tickets[0].fields,
            json!({ "type": "update-users", "project": ["p1"], "update-users": ["u1"] })
        );
    }

    #[tokio::test]
    async fn test_ticket_validation() {
        let store = Arc::new(MemoryStore::new());

        let cases = [
            (json!({ "type": "bogus", "projectId": "p1" }), "Invalid type"),
            (json!({ "projectId": "p1" }), "Missing required fields: type and projectId"),
            (json!({ "type": "update-images", "projectId": "" }), "Missing required fields: type and projectId"),
        ];

        for (payload, message) in cases {
            let (status, body) =
                call(router(store.clone(), None), Method::POST, "/api/tickets", Some(payload)).await;

            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body["error"], message);
        }

        assert!(store.records(Table::Tickets).is_empty());
    }

    #[tokio::test]
    async fn test_ticket_with_malformed_user_ids() {
        let store = Arc::new(MemoryStore::new());

        let (status, body) = call(
            router(store.clone(), None),
            Method::POST,
            "/api/tickets",
            Some(json!({ "type": "update-users", "projectId": "p1", "userIds": "u1" })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);

        let tickets = store.records(Table::Tickets);
        assert_eq!(tickets.len(), 1);
        assert_eq!(tickets[0].fields, json!({ "type": "update-users", "project": ["p1"] }));
    }

    #[tokio::test]
    async fn test_ticket_store_down() {
        let app = router(Arc::new(MemoryStore::unavailable()), None);

        let (status, body) = call(
            app,
            Method::POST,
            "/api/tickets",
            Some(json!({ "type": "update-videos", "projectId": "p1" })),
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Failed to create ticket");
    }

    #[tokio::test]
    async fn test_webhook_method_not_allowed() {
        let app = router(Arc::new(MemoryStore::new()), Some("http://127.0.0.1:9".to_string()));

        let (status, body) = call(app, Method::GET, "/api/webhook-discord", None).await;

        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body["error"], "Method not allowed");
    }

    #[tokio::test]
    async fn test_webhook_not_configured() {
        let app = router(Arc::new(MemoryStore::new()), None);

        let (status, body) = call(
            app,
            Method::POST,
            "/api/webhook-discord",
            Some(json!({ "payload": { "type": "deployment.succeeded" } })),
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Webhook URL not configured");
    }

    type Received = Arc<Mutex<Vec<Value>>>;

    async fn fake_discord(status: StatusCode) -> (String, Received) {
        let received = Received::default();

        let app = Router::new()
            .route(
                "/webhook",
                post(
                    move |AxumState(received): AxumState<Received>, Json(body): Json<Value>| async move {
                        received.lock().unwrap().push(body);
                        status
                    },
                ),
            )
            .with_state(received.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (format!("http://{address}/webhook"), received)
    }

    #[tokio::test]
    async fn test_webhook_forwards() {
        let (url, received) = fake_discord(StatusCode::NO_CONTENT).await;
        let app = router(Arc::new(MemoryStore::new()), Some(url));

        let (status, body) = call(
            app,
            Method::POST,
            "/api/webhook-discord",
            Some(json!({
                "payload": {
                    "type": "deployment.succeeded",
                    "deployment": { "url": "publipucp.vercel.app", "state": "READY" },
                    "project": { "name": "publipucp" }
                }
            })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "success": true }));

        let received = received.lock().unwrap();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0]["username"], "Vercel Deploy");
        assert_eq!(received[0]["embeds"][0]["title"], "✅ Deployment Successful");
        assert_eq!(received[0]["embeds"][0]["url"], "https://publipucp.vercel.app");
    }

    #[tokio::test]
    async fn test_webhook_downstream_failure() {
        let (url, _) = fake_discord(StatusCode::BAD_REQUEST).await;
        let app = router(Arc::new(MemoryStore::new()), Some(url));

        let (status, body) = call(
            app,
            Method::POST,
            "/api/webhook-discord",
            Some(json!({ "payload": {} })),
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Failed to send to Discord");
    }
}
