//! REST API layer (Axum)
//!
//! JSON endpoints for the notebook:
//! - public: home, health, signup, login
//! - session-guarded: dashboard, notebook view, note saving, logout
//!
//! The guard accepts a Bearer token or the `session` cookie set at login and
//! hands the decoded claims to the handlers; the stores never see sessions.

use axum::{
    extract::{Path, Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use crate::auth::SessionKeys;
use crate::catalog::{Catalog, Game};
use crate::config::Config;
use crate::credentials::CredentialStore;
use crate::error::{ApiError, StoreError};
use crate::models::AuthPayload;
use crate::notes::NotesStore;
use crate::storage::Keyspace;

pub const SESSION_COOKIE: &str = "session";

/// Shared app state for REST handlers
pub struct AppState<K: Keyspace> {
    pub credentials: CredentialStore<K>,
    pub notes: NotesStore<K>,
    pub catalog: Arc<Catalog>,
    pub sessions: SessionKeys,
    pub min_password_len: usize,
}

impl<K: Keyspace> AppState<K> {
    pub fn new(config: &Config, users: K, notes: K, catalog: Arc<Catalog>) -> Self {
        Self {
            credentials: CredentialStore::new(users, config.password_hasher()),
            notes: NotesStore::new(notes),
            catalog,
            sessions: config.session_keys(),
            min_password_len: config.min_password_len,
        }
    }
}

#[derive(Deserialize)]
pub struct HomeForm {
    pub textbox: String,
}

/// Missing fields deserialize as empty so they hit the "required" check.
#[derive(Deserialize, Default)]
#[serde(default)]
pub struct SignupForm {
    pub username: String,
    pub email: String,
    pub password: String,
    pub password_confirm: String,
}

#[derive(Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Serialize, Deserialize)]
pub struct LoginResponse {
    pub success: bool,
    pub message: String,
    pub username: String,
    pub token: String,
}

#[derive(Deserialize)]
pub struct SaveNotesForm {
    pub game: Option<String>,
    pub character: Option<String>,
    #[serde(default)]
    pub content: String,
}

/// Generic REST response (JSON)
#[derive(Serialize, Deserialize)]
pub struct RestResponse {
    pub success: bool,
    pub message: String,
}

impl RestResponse {
    fn ok(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            success: true,
            message: message.into(),
        })
    }
}

#[derive(Serialize, Deserialize)]
pub struct HomeResponse {
    pub success: bool,
    pub games: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub users_text: Option<String>,
}

#[derive(Serialize)]
pub struct DashboardResponse<'a> {
    pub username: String,
    pub games: &'a [Game],
}

#[derive(Serialize, Deserialize)]
pub struct NotebookResponse {
    pub game: String,
    pub game_name: String,
    pub characters: Vec<String>,
    pub selected_character: String,
    pub notes: String,
    pub characters_with_notes: Vec<String>,
    pub username: String,
}

fn session_token(req: &Request) -> Option<&str> {
    let headers = req.headers();

    if let Some(bearer) = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
    {
        return Some(bearer);
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|cookies| cookies.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value)
}

async fn auth_middleware<K: Keyspace>(
    State(state): State<Arc<AppState<K>>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = session_token(&req).ok_or(ApiError::Unauthorized)?;
    let claims = state
        .sessions
        .validate_jwt(token)
        .map_err(|_| ApiError::Unauthorized)?;

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

/// Create Axum router with the notebook endpoints
pub fn create_router<K: Keyspace>(state: AppState<K>) -> Router {
    let state = Arc::new(state);

    let protected = Router::new()
        .route("/dashboard", get(dashboard_handler::<K>))
        .route("/notebook/:game/:character", get(notebook_handler::<K>))
        .route("/save_notes", post(save_notes_handler::<K>))
        .route("/logout", post(logout_handler))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware::<K>));

    Router::new()
        .route("/", get(home_handler::<K>).post(home_echo_handler::<K>))
        .route("/health", get(health_handler))
        .route("/signup", post(signup_handler::<K>))
        .route("/login", post(login_handler::<K>))
        .merge(protected)
        .with_state(state)
}

fn game_ids(catalog: &Catalog) -> Vec<String> {
    catalog.games().iter().map(|g| g.id.clone()).collect()
}

async fn home_handler<K: Keyspace>(State(state): State<Arc<AppState<K>>>) -> Json<HomeResponse> {
    Json(HomeResponse {
        success: true,
        games: game_ids(&state.catalog),
        users_text: None,
    })
}

async fn home_echo_handler<K: Keyspace>(
    State(state): State<Arc<AppState<K>>>,
    Json(form): Json<HomeForm>,
) -> Json<HomeResponse> {
    Json(HomeResponse {
        success: true,
        games: game_ids(&state.catalog),
        users_text: Some(form.textbox.trim().to_string()),
    })
}

async fn health_handler() -> Json<RestResponse> {
    RestResponse::ok("fgc_notes healthy")
}

async fn signup_handler<K: Keyspace>(
    State(state): State<Arc<AppState<K>>>,
    Json(form): Json<SignupForm>,
) -> Result<(StatusCode, Json<RestResponse>), ApiError> {
    let username = form.username.trim().to_lowercase();
    let email = form.email.trim();
    let password = form.password.trim();
    let password_confirm = form.password_confirm.trim();

    if username.is_empty() || email.is_empty() || password.is_empty() || password_confirm.is_empty() {
        return Err(ApiError::Validation("All fields are required".into()));
    }
    if password != password_confirm {
        return Err(ApiError::Validation("Passwords do not match".into()));
    }
    if password.chars().count() < state.min_password_len {
        return Err(ApiError::Validation(format!(
            "Password must be at least {} characters",
            state.min_password_len
        )));
    }

    state.credentials.register(&username, email, password)?;
    Ok((StatusCode::CREATED, RestResponse::ok("Account has been created")))
}

async fn login_handler<K: Keyspace>(
    State(state): State<Arc<AppState<K>>>,
    Json(form): Json<LoginForm>,
) -> Result<impl IntoResponse, ApiError> {
    let username = form.username.trim().to_lowercase();
    let password = form.password.trim();

    let user = state
        .credentials
        .authenticate(&username, password)
        .inspect_err(|e| {
            if matches!(e, StoreError::UserNotFound | StoreError::InvalidPassword) {
                warn!(username = %username, reason = %e, "Login failed");
            }
        })?;

    let token = state.sessions.create_jwt(&user.username)?;
    let cookie = format!(
        "{SESSION_COOKIE}={token}; HttpOnly; Path=/; SameSite=Lax; Max-Age={}",
        state.sessions.ttl_secs()
    );
    info!(username = %user.username, "Login successful");

    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(LoginResponse {
            success: true,
            message: "Login Successful".to_string(),
            username: user.username,
            token,
        }),
    ))
}

async fn logout_handler(Extension(claims): Extension<AuthPayload>) -> impl IntoResponse {
    info!(username = %claims.sub, "Logged out");
    (
        [(
            header::SET_COOKIE,
            format!("{SESSION_COOKIE}=; HttpOnly; Path=/; SameSite=Lax; Max-Age=0"),
        )],
        RestResponse::ok("You have been logged out"),
    )
}

async fn dashboard_handler<K: Keyspace>(
    State(state): State<Arc<AppState<K>>>,
    Extension(claims): Extension<AuthPayload>,
) -> Response {
    Json(DashboardResponse {
        username: claims.sub,
        games: state.catalog.games(),
    })
    .into_response()
}

async fn notebook_handler<K: Keyspace>(
    State(state): State<Arc<AppState<K>>>,
    Extension(claims): Extension<AuthPayload>,
    Path((game, character)): Path<(String, String)>,
) -> Result<Json<NotebookResponse>, ApiError> {
    let entry = state.catalog.game(&game).ok_or(ApiError::InvalidGame)?;
    if !state.catalog.is_valid_character(&game, &character) {
        return Err(ApiError::InvalidCharacter);
    }

    let all_notes = state.notes.load_all(&claims.sub, &game)?;
    let notes = all_notes.get(&character).cloned().unwrap_or_default();
    let characters_with_notes = all_notes.into_keys().collect();

    Ok(Json(NotebookResponse {
        game_name: entry.name.clone(),
        characters: entry.characters.clone(),
        game,
        selected_character: character,
        notes,
        characters_with_notes,
        username: claims.sub,
    }))
}

async fn save_notes_handler<K: Keyspace>(
    State(state): State<Arc<AppState<K>>>,
    Extension(claims): Extension<AuthPayload>,
    Json(form): Json<SaveNotesForm>,
) -> Result<Json<RestResponse>, ApiError> {
    let character = form
        .character
        .filter(|c| !c.is_empty())
        .ok_or_else(|| ApiError::Validation("No character selected".into()))?;
    let game = form.game.unwrap_or_default();

    if !state.catalog.is_valid_game(&game) {
        return Err(ApiError::InvalidGame);
    }
    if !state.catalog.is_valid_character(&game, &character) {
        return Err(ApiError::InvalidCharacter);
    }

    state.notes.save_one(&claims.sub, &game, &character, &form.content)?;
    Ok(RestResponse::ok("Notes saved successfully"))
}
