//! Polling channel over HTTP.
//!
//! | Route                          | Call                        |
//! |--------------------------------|-----------------------------|
//! | `POST /episodes`               | create + reset              |
//! | `POST /episodes/{id}/reset`    | reset                       |
//! | `GET /episodes/{id}/state`     | state                       |
//! | `GET /episodes/{id}/prompt`    | valid_actions               |
//! | `POST /episodes/{id}/decision` | step                        |
//! | `DELETE /episodes/{id}`        | close                       |
//! | `GET /health`                  | liveness                    |
//!
//! Controller calls block until the engine settles, so every handler hands
//! its call to actix's blocking pool. Rejections carry a JSON body
//! `{ "error": "..." }` with a status chosen by [`status_of`].

use std::sync::Arc;
use std::time::Duration;

use actix_web::http::StatusCode;
use actix_web::middleware::Logger;
use actix_web::web;
use actix_web::App;
use actix_web::HttpResponse;
use actix_web::HttpServer;
use actix_web::Responder;
use serde::Serialize;

use crate::core::{EpisodeId, MatchConfig};
use crate::episode::EpisodeRegistry;
use crate::error::{EngineFault, EnvError, LifecycleError, ProtocolError};

/// Shared state of the HTTP surface.
pub struct ServerState {
    pub registry: Arc<EpisodeRegistry>,
    /// Upper bound on how long a request waits for the engine to settle.
    pub settle: Duration,
}

impl ServerState {
    pub fn new(registry: Arc<EpisodeRegistry>, settle: Duration) -> Self {
        Self { registry, settle }
    }
}

/// Register every route on an app.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health)).service(
        web::scope("/episodes")
            .route("", web::post().to(create))
            .route("/{id}", web::delete().to(close))
            .route("/{id}/reset", web::post().to(reset))
            .route("/{id}/state", web::get().to(state))
            .route("/{id}/prompt", web::get().to(prompt))
            .route("/{id}/decision", web::post().to(decision)),
    );
}

/// Serve `state` on `bind` until shut down.
pub async fn serve(bind: &str, state: ServerState, workers: usize) -> std::io::Result<()> {
    let data = web::Data::new(state);
    log::info!("starting episode server on {}", bind);
    HttpServer::new(move || {
        App::new()
            .wrap(Logger::new("%r %s %Ts"))
            .app_data(data.clone())
            .configure(configure)
    })
    .workers(workers)
    .bind(bind)?
    .run()
    .await
}

/// HTTP status for a rejected call.
pub fn status_of(err: &EnvError) -> StatusCode {
    match err {
        EnvError::Protocol(ProtocolError::Stale { .. })
        | EnvError::Protocol(ProtocolError::Premature { .. })
        | EnvError::Protocol(ProtocolError::Terminal)
        | EnvError::Protocol(ProtocolError::NoPendingPrompt)
        | EnvError::Protocol(ProtocolError::ResponderAttached) => StatusCode::CONFLICT,
        EnvError::Protocol(ProtocolError::Malformed(_)) => StatusCode::BAD_REQUEST,
        EnvError::Protocol(_) => StatusCode::UNPROCESSABLE_ENTITY,
        EnvError::Lifecycle(LifecycleError::UnknownEpisode(_)) => StatusCode::NOT_FOUND,
        EnvError::Lifecycle(LifecycleError::Closed) => StatusCode::GONE,
        EnvError::Lifecycle(LifecycleError::NotStarted) => StatusCode::CONFLICT,
        EnvError::Engine(EngineFault::Config(_)) => StatusCode::BAD_REQUEST,
        EnvError::Engine(_) => StatusCode::INTERNAL_SERVER_ERROR,
        EnvError::Channel(_) => StatusCode::BAD_GATEWAY,
    }
}

fn reject(err: &EnvError) -> HttpResponse {
    HttpResponse::build(status_of(err)).json(serde_json::json!({ "error": err.to_string() }))
}

/// Run a blocking controller call off the async workers.
async fn blocking<T, F>(call: F) -> HttpResponse
where
    T: Serialize + Send + 'static,
    F: FnOnce() -> Result<T, EnvError> + Send + 'static,
{
    match web::block(call).await {
        Ok(Ok(value)) => HttpResponse::Ok().json(value),
        Ok(Err(e)) => reject(&e),
        Err(e) => HttpResponse::InternalServerError().body(e.to_string()),
    }
}

async fn health() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

async fn create(data: web::Data<ServerState>, body: Option<web::Json<MatchConfig>>) -> impl Responder {
    let config = body.map(web::Json::into_inner).unwrap_or_default();
    let registry = Arc::clone(&data.registry);
    let settle = data.settle;
    blocking(move || {
        let controller = registry.create();
        let id = controller.id();
        match controller.reset(config, Some(settle)) {
            Ok(transition) => Ok(serde_json::json!({ "episode": id, "transition": transition })),
            Err(e) => {
                let _ = registry.close(id);
                Err(e)
            }
        }
    })
    .await
}

/// Start a new match under the same episode id. Prompt generations restart
/// at 1, so clients drop decisions prepared for the previous match.
async fn reset(
    data: web::Data<ServerState>,
    path: web::Path<u64>,
    body: Option<web::Json<MatchConfig>>,
) -> impl Responder {
    let id = EpisodeId::new(path.into_inner());
    let config = body.map(web::Json::into_inner).unwrap_or_default();
    let registry = Arc::clone(&data.registry);
    let settle = data.settle;
    blocking(move || registry.get(id)?.reset(config, Some(settle))).await
}

async fn state(data: web::Data<ServerState>, path: web::Path<u64>) -> impl Responder {
    let id = EpisodeId::new(path.into_inner());
    let registry = Arc::clone(&data.registry);
    blocking(move || registry.get(id)?.state()).await
}

async fn prompt(data: web::Data<ServerState>, path: web::Path<u64>) -> impl Responder {
    let id = EpisodeId::new(path.into_inner());
    let registry = Arc::clone(&data.registry);
    blocking(move || {
        let prompt = registry.get(id)?.valid_actions()?;
        Ok((*prompt).clone())
    })
    .await
}

async fn decision(data: web::Data<ServerState>, path: web::Path<u64>, body: web::Bytes) -> impl Responder {
    let id = EpisodeId::new(path.into_inner());
    let registry = Arc::clone(&data.registry);
    let settle = data.settle;
    blocking(move || registry.get(id)?.step_json(&body, Some(settle))).await
}

async fn close(data: web::Data<ServerState>, path: web::Path<u64>) -> impl Responder {
    let id = EpisodeId::new(path.into_inner());
    let registry = Arc::clone(&data.registry);
    blocking(move || {
        registry.close(id)?;
        Ok(serde_json::json!({ "status": "closed" }))
    })
    .await
}
