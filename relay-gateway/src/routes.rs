//! Demo endpoints built with relay, mounted on an axum router.
//!
//! Every route delegates to a relay [`Endpoint`]: axum only matches paths
//! and collects bodies, while method dispatch, authentication, validation,
//! and error formatting happen in the endpoint pipeline.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    extract::{Path, Request},
    response::Response,
    routing::any,
    Router,
};
use chrono::Utc;
use http::{header, HeaderValue, Method, StatusCode};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use uuid::Uuid;

use relay_endpoint::{
    fail_with_code, succeed_with_code, ApiRequest, Decorator, Endpoint, EndpointError,
    EndpointFactory, EndpointHandler, FactoryConfig, HandlerContext, MethodDefinition, Reply,
};

use crate::auth::TokenAuthenticator;
use crate::store::NoteStore;

/// Largest request body the gateway will buffer.
const MAX_BODY_BYTES: usize = 1024 * 1024;

// ── Router ────────────────────────────────────────────────────────────────────

/// Build the application router over the given note store.
///
/// `token` is the service token checked by the [`TokenAuthenticator`].
///
/// # Panics
/// Panics if an endpoint definition is invalid; that is a programming error
/// caught at startup, never per-request.
#[must_use]
pub fn create_router(store: Arc<NoteStore>, token: &str) -> Router {
    let factory = EndpointFactory::new(
        FactoryConfig::new()
            .authenticate(TokenAuthenticator::for_token(token))
            .extra_api(|_req, options| {
                let mut extra = serde_json::Map::new();
                extra.insert("request_id".to_owned(), json!(Uuid::new_v4()));
                let timestamp = options
                    .and_then(|options| options.get("timestamp"))
                    .and_then(Value::as_bool)
                    .unwrap_or(false);
                if timestamp {
                    extra.insert("received_at".to_owned(), json!(Utc::now()));
                }
                Value::Object(extra)
            }),
    );

    let notes = notes_endpoint(&factory, Arc::clone(&store));
    let note = note_endpoint(&factory, Arc::clone(&store));
    let export = export_endpoint(&factory, Arc::clone(&store));
    let health = health_endpoint(&factory);

    Router::new()
        .route("/v1/notes", any(move |req: Request| mount(notes.clone(), req, None)))
        .route(
            "/v1/notes/export",
            any(move |req: Request| mount(export.clone(), req, None)),
        )
        .route(
            "/v1/notes/{id}",
            any(move |Path(id): Path<String>, req: Request| {
                mount(note.clone(), req, Some(("id", id)))
            }),
        )
        .route("/health", any(move |req: Request| mount(health.clone(), req, None)))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Collect the body, hand the request to the endpoint, and adapt the
/// response back to axum. Path captures are merged into the query mapping.
async fn mount(
    endpoint: Endpoint,
    req: Request,
    path_param: Option<(&'static str, String)>,
) -> Response {
    let (parts, body) = req.into_parts();
    let Ok(body) = axum::body::to_bytes(body, MAX_BODY_BYTES).await else {
        let mut response = Response::new(Body::empty());
        *response.status_mut() = StatusCode::PAYLOAD_TOO_LARGE;
        return response;
    };
    let mut api_req = ApiRequest::new(parts.method, parts.uri, parts.headers, body);
    if let Some((key, value)) = path_param {
        api_req = api_req.with_query_param(key, value);
    }
    endpoint.handle(api_req).await.map(Body::from)
}

// ── Endpoints ─────────────────────────────────────────────────────────────────

/// `GET /v1/notes` — list notes; `POST /v1/notes` — create one.
fn notes_endpoint(factory: &EndpointFactory, store: Arc<NoteStore>) -> Endpoint {
    let list_store = Arc::clone(&store);
    let create_store = store;
    let endpoint = factory
        .endpoint()
        .method(
            Method::GET,
            MethodDefinition::new(move |ctx: HandlerContext| {
                let store = Arc::clone(&list_store);
                async move {
                    let notes =
                        serde_json::to_value(store.list()).map_err(EndpointError::internal)?;
                    Ok(json!({ "notes": notes, "meta": ctx.extra.unwrap_or(Value::Null) }))
                }
            })
            .extra_options(json!({ "timestamp": true })),
        )
        .method(
            Method::POST,
            MethodDefinition::new(move |ctx: HandlerContext| {
                let store = Arc::clone(&create_store);
                async move {
                    let title = ctx.body["title"].as_str().unwrap_or_default().to_owned();
                    let body = ctx.body["body"].as_str().unwrap_or_default().to_owned();
                    let id = store.create(title, body);
                    Ok(succeed_with_code(201, json!({ "id": id })))
                }
            })
            .body_validator(|body| {
                let has_title = body
                    .get("title")
                    .and_then(Value::as_str)
                    .is_some_and(|title| !title.trim().is_empty());
                Ok(has_title)
            }),
        )
        .decorate(trace_requests())
        .build();
    expect_built(endpoint)
}

/// `GET /v1/notes/{id}` — fetch one note; `DELETE /v1/notes/{id}` — remove it.
fn note_endpoint(factory: &EndpointFactory, store: Arc<NoteStore>) -> Endpoint {
    let get_store = Arc::clone(&store);
    let delete_store = store;
    let endpoint = factory
        .endpoint()
        .method(
            Method::GET,
            MethodDefinition::new(move |ctx: HandlerContext| {
                let store = Arc::clone(&get_store);
                async move {
                    let id = note_id(&ctx)?;
                    let note = store
                        .get(id)
                        .ok_or_else(|| fail_with_code(404, format!("note not found: {id}")))?;
                    serde_json::to_value(note).map_err(EndpointError::internal)
                }
            }),
        )
        .method(
            Method::DELETE,
            MethodDefinition::new(move |ctx: HandlerContext| {
                let store = Arc::clone(&delete_store);
                async move {
                    let id = note_id(&ctx)?;
                    if store.remove(id) {
                        Ok(())
                    } else {
                        Err(fail_with_code(404, format!("note not found: {id}")).into())
                    }
                }
            }),
        )
        .decorate(trace_requests())
        .build();
    expect_built(endpoint)
}

/// `GET /v1/notes/export` — write the note list directly through the
/// response writer and return the sentinel.
fn export_endpoint(factory: &EndpointFactory, store: Arc<NoteStore>) -> Endpoint {
    let endpoint = factory
        .endpoint()
        .method(
            Method::GET,
            MethodDefinition::new(move |ctx: HandlerContext| {
                let store = Arc::clone(&store);
                async move {
                    let notes =
                        serde_json::to_value(store.list()).map_err(EndpointError::internal)?;
                    ctx.res.set_header(
                        header::CONTENT_DISPOSITION,
                        HeaderValue::from_static("attachment; filename=\"notes.json\""),
                    );
                    ctx.res.status(StatusCode::OK).json(&notes);
                    Ok(Reply::Sent)
                }
            }),
        )
        .build();
    expect_built(endpoint)
}

/// `GET /health` — liveness probe, open to unauthenticated callers.
fn health_endpoint(factory: &EndpointFactory) -> Endpoint {
    let endpoint = factory
        .endpoint()
        .method(
            Method::GET,
            MethodDefinition::new(|_ctx| async { Ok(json!({ "status": "ok" })) }),
        )
        .disable_authentication()
        .build();
    expect_built(endpoint)
}

fn expect_built(result: Result<Endpoint, relay_endpoint::BuildError>) -> Endpoint {
    match result {
        Ok(endpoint) => endpoint,
        Err(e) => panic!("endpoint definition invalid: {e}"),
    }
}

/// Decorator logging method, path, status, and latency for each request.
fn trace_requests() -> impl Decorator + 'static {
    |next: EndpointHandler| -> EndpointHandler {
        Arc::new(move |req| {
            let next = Arc::clone(&next);
            let method = req.method().clone();
            let path = req.uri().path().to_owned();
            Box::pin(async move {
                let started = Instant::now();
                let response = next(req).await;
                tracing::info!(
                    %method,
                    path,
                    status = %response.status(),
                    elapsed_ms = started.elapsed().as_millis(),
                    "request served"
                );
                response
            })
        })
    }
}

fn note_id(ctx: &HandlerContext) -> Result<Uuid, EndpointError> {
    let raw = ctx.query["id"].as_str().unwrap_or_default();
    raw.parse()
        .map_err(|_| EndpointError::from(fail_with_code(400, format!("invalid note id '{raw}'"))))
}
