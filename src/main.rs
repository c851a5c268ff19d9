//! Campaign journal - session notes and characters for a tabletop campaign,
//! linked many-to-many, behind a shared-password gate.

mod auth;
mod blob;
mod data;
mod error;
mod mapper;
mod merge;
mod mutations;
mod numbering;
mod reconcile;
mod sanitize;
mod schema;
mod store;
mod supabase;

use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{middleware, Json, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use auth::AuthGate;
use blob::{BlobStore, SupabaseBlobStore};
use error::Error;
use schema::{Character, CharacterInput, Note, NoteInput};
use store::Store;
use supabase::SupabaseStore;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub blobs: Arc<dyn BlobStore>,
    pub auth: Arc<AuthGate>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "campaign_journal=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let store = SupabaseStore::from_env()?;
    let blobs = SupabaseBlobStore::from_env()?;
    let auth = AuthGate::from_env()?;
    info!("Supabase clients initialized");

    // Build application state
    let state = AppState {
        store: Arc::new(store),
        blobs: Arc::new(blobs),
        auth: Arc::new(auth),
    };

    // Everything under /api except login sits behind the cookie gate.
    let protected = Router::new()
        .route("/notes", get(list_notes).post(create_note))
        .route(
            "/notes/{id}",
            get(get_note).put(update_note).delete(delete_note),
        )
        .route("/notes/{id}/characters", post(link_character))
        .route(
            "/notes/{id}/characters/{character_id}",
            delete(unlink_character),
        )
        .route("/characters", get(list_characters).post(create_character))
        .route(
            "/characters/{id}",
            get(get_character).put(update_character).delete(delete_character),
        )
        .route("/upload", post(upload_image))
        .route("/logout", post(logout))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_auth,
        ));

    // Build router
    let app = Router::new()
        .route("/health", get(health))
        .nest(
            "/api",
            Router::new().route("/login", post(login)).merge(protected),
        )
        .layer(DefaultBodyLimit::max(10 * 1024 * 1024)) // 10MB, image uploads
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    // Run server
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(3000);
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    info!("Server listening on http://0.0.0.0:{port}");
    axum::serve(listener, app).await?;

    Ok(())
}

// ============================================================================
// Auth handlers
// ============================================================================

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

#[derive(serde::Deserialize)]
struct LoginRequest {
    password: String,
}

/// Trade the shared password for a session cookie.
async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Response, Error> {
    if !state.auth.check_password(&body.password) {
        return Err(Error::Unauthorized);
    }
    let token = state.auth.issue_token()?;
    Ok((
        [(header::SET_COOKIE, auth::session_cookie(&token))],
        Json(serde_json::json!({ "success": true })),
    )
        .into_response())
}

async fn logout() -> Response {
    (
        [(header::SET_COOKIE, auth::clear_cookie())],
        Json(serde_json::json!({ "success": true })),
    )
        .into_response()
}

// ============================================================================
// Note handlers
// ============================================================================

/// List sessions, newest first, numbered oldest-first.
async fn list_notes(State(state): State<AppState>) -> Result<Json<Vec<Note>>, Error> {
    data::list_notes(state.store.as_ref()).await.map(Json)
}

async fn get_note(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Note>, Error> {
    data::get_note(state.store.as_ref(), id).await.map(Json)
}

async fn create_note(
    State(state): State<AppState>,
    Json(input): Json<NoteInput>,
) -> Result<(StatusCode, Json<Note>), Error> {
    let note = mutations::create_note(state.store.as_ref(), input).await?;
    Ok((StatusCode::CREATED, Json(note)))
}

async fn update_note(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(input): Json<NoteInput>,
) -> Result<Json<Note>, Error> {
    mutations::update_note(state.store.as_ref(), id, input)
        .await
        .map(Json)
}

async fn delete_note(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, Error> {
    mutations::delete_note(state.store.as_ref(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct LinkCharacterRequest {
    character_id: i64,
}

/// Add a single note↔character link.
async fn link_character(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<LinkCharacterRequest>,
) -> Result<StatusCode, Error> {
    mutations::link_character(state.store.as_ref(), id, body.character_id).await?;
    Ok(StatusCode::CREATED)
}

/// Remove a single note↔character link.
async fn unlink_character(
    State(state): State<AppState>,
    Path((id, character_id)): Path<(i64, i64)>,
) -> Result<StatusCode, Error> {
    mutations::unlink_character(state.store.as_ref(), id, character_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Character handlers
// ============================================================================

/// List characters by name with the sessions each appeared in.
async fn list_characters(State(state): State<AppState>) -> Result<Json<Vec<Character>>, Error> {
    data::list_characters(state.store.as_ref()).await.map(Json)
}

async fn get_character(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Character>, Error> {
    data::get_character(state.store.as_ref(), id).await.map(Json)
}

async fn create_character(
    State(state): State<AppState>,
    Json(input): Json<CharacterInput>,
) -> Result<(StatusCode, Json<Character>), Error> {
    let character = mutations::create_character(state.store.as_ref(), input).await?;
    Ok((StatusCode::CREATED, Json(character)))
}

async fn update_character(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(input): Json<CharacterInput>,
) -> Result<Json<Character>, Error> {
    mutations::update_character(state.store.as_ref(), id, input)
        .await
        .map(Json)
}

async fn delete_character(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, Error> {
    mutations::delete_character(state.store.as_ref(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Upload handler
// ============================================================================

#[derive(serde::Serialize)]
struct UploadResponse {
    url: String,
}

/// Accept a multipart image and hand back its public URL.
async fn upload_image(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, Error> {
    let mut filename = String::new();
    let mut content_type = "application/octet-stream".to_string();
    let mut file_data = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::Validation(format!("multipart error: {e}")))?
    {
        if field.name() == Some("file") {
            filename = field.file_name().unwrap_or("upload").to_string();
            if let Some(ct) = field.content_type() {
                content_type = ct.to_string();
            }
            file_data = field
                .bytes()
                .await
                .map_err(|e| Error::Validation(format!("failed to read file: {e}")))?
                .to_vec();
            break;
        }
    }

    if file_data.is_empty() {
        return Err(Error::Validation("no file uploaded".to_string()));
    }

    let url = state
        .blobs
        .upload(file_data, &filename, &content_type)
        .await?;
    Ok(Json(UploadResponse { url }))
}
