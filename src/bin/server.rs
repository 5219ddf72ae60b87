//! acledit REST API server
//!
//! Run with: cargo run --features server --bin acledit-server
//!
//! Endpoints:
//!   GET  /health             - Health check
//!   POST /init               - Initialize the ACL store
//!   GET  /acl/:type/:id      - Build the edit forms for an object
//!   POST /acl/:type/:id      - Apply submitted checkbox state

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;

use acledit::{
    AclCandidate, AclError, AclManipulator, AclSecurityHandler, AclSubject, Admin, CheckboxField,
    ObjectIdentity, SecurityIdentity,
};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Deserialize)]
struct InitRequest {
    db_path: String,
}

#[derive(Deserialize)]
struct FormQuery {
    /// Identity of the editor, e.g. "user:alice"
    editor: String,
    /// Comma-separated usernames to configure
    users: Option<String>,
    /// Comma-separated role names to configure
    roles: Option<String>,
}

#[derive(Deserialize)]
struct UpdateAclRequest {
    editor: String,
    #[serde(default)]
    users: Vec<String>,
    #[serde(default)]
    roles: Vec<String>,
    /// Field name -> checked, keyed "<candidate>_<PERMISSION>"
    fields: HashMap<String, bool>,
}

#[derive(Serialize)]
struct FormsResponse {
    users: Vec<CheckboxField>,
    roles: Vec<CheckboxField>,
}

#[derive(Serialize)]
struct AceView {
    identity: String,
    mask: u64,
    permissions: Vec<&'static str>,
}

#[derive(Serialize)]
struct AclResponse {
    object: String,
    aces: Vec<AceView>,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn bad_request(msg: impl Into<String>) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(ErrorResponse { error: msg.into() }))
}

fn map_err(e: AclError) -> ApiError {
    let status = match e {
        AclError::NotInitialized
        | AclError::AlreadyInitialized(_)
        | AclError::UnknownPermission(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(ErrorResponse { error: e.to_string() }))
}

// ============================================================================
// State
// ============================================================================

#[derive(Clone)]
struct AppState {
    initialized: Arc<AtomicBool>,
}

impl AppState {
    fn new() -> Self {
        AppState { initialized: Arc::new(AtomicBool::new(false)) }
    }

    fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    fn set_initialized(&self) {
        self.initialized.store(true, Ordering::SeqCst);
    }

    fn require_initialized(&self) -> Result<(), ApiError> {
        if self.is_initialized() {
            Ok(())
        } else {
            Err(bad_request("Store not initialized"))
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn init_store(
    State(state): State<AppState>,
    Json(req): Json<InitRequest>,
) -> Result<StatusCode, ApiError> {
    acledit::init(&req.db_path).map_err(map_err)?;
    state.set_initialized();
    Ok(StatusCode::NO_CONTENT)
}

fn split_csv(s: &Option<String>) -> Vec<String> {
    s.as_deref()
        .unwrap_or("")
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_editor(editor: &str) -> Result<SecurityIdentity, ApiError> {
    SecurityIdentity::parse(editor)
        .ok_or_else(|| bad_request(format!("Invalid editor identity: {}", editor)))
}

fn candidates(users: &[String], roles: &[String]) -> (Vec<AclCandidate>, Vec<AclCandidate>) {
    let users = users.iter().map(|u| AclCandidate::user(u.as_str())).collect();
    let roles = roles.iter().map(|r| AclCandidate::role(r.as_str())).collect();
    (users, roles)
}

async fn get_acl_forms(
    State(state): State<AppState>,
    Path((object_type, id)): Path<(String, String)>,
    Query(query): Query<FormQuery>,
) -> Result<Json<FormsResponse>, ApiError> {
    state.require_initialized()?;
    let editor = parse_editor(&query.editor)?;
    let (users, roles) = candidates(&split_csv(&query.users), &split_csv(&query.roles));

    let admin = Admin::new(AclSecurityHandler::new(), editor);
    let object = ObjectIdentity::new(object_type, id);
    let mut subject = AclSubject::new(&admin, object, users, roles);

    let manipulator = AclManipulator::new();
    let users_form = manipulator.create_users_form(&mut subject).map_err(map_err)?;
    let roles_form = manipulator.create_roles_form(&mut subject).map_err(map_err)?;

    Ok(Json(FormsResponse {
        users: users_form.fields().cloned().collect(),
        roles: roles_form.fields().cloned().collect(),
    }))
}

async fn update_acl(
    State(state): State<AppState>,
    Path((object_type, id)): Path<(String, String)>,
    Json(req): Json<UpdateAclRequest>,
) -> Result<Json<AclResponse>, ApiError> {
    state.require_initialized()?;
    let editor = parse_editor(&req.editor)?;
    let (users, roles) = candidates(&req.users, &req.roles);

    let admin = Admin::new(AclSecurityHandler::new(), editor);
    let object = ObjectIdentity::new(object_type, id);
    let mut subject = AclSubject::new(&admin, object, users, roles);

    let manipulator = AclManipulator::new();
    manipulator.create_users_form(&mut subject).map_err(map_err)?;
    manipulator.create_roles_form(&mut subject).map_err(map_err)?;

    // Disabled fields reject submitted values; raw client input replays
    // onto the built forms
    if let Some(form) = subject.users_form_mut() {
        for (name, checked) in &req.fields {
            form.set_data(name, *checked);
        }
    }
    if let Some(form) = subject.roles_form_mut() {
        for (name, checked) in &req.fields {
            form.set_data(name, *checked);
        }
    }

    manipulator.update_users_acl(&mut subject).map_err(map_err)?;
    manipulator.update_roles_acl(&mut subject).map_err(map_err)?;

    let acl = subject.acl().ok_or_else(|| map_err(AclError::MissingAcl))?;
    Ok(Json(AclResponse {
        object: acl.object_identity().to_string(),
        aces: acl
            .object_aces()
            .iter()
            .map(|ace| AceView {
                identity: ace.security_identity().to_string(),
                mask: ace.mask(),
                permissions: ace.permission_names(),
            })
            .collect(),
    }))
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() {
    env_logger::init();

    let state = AppState::new();

    let args: Vec<String> = std::env::args().collect();
    let mut db_path: Option<String> = None;
    let mut port: u16 = 3000;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db-path" | "-d" => {
                if i + 1 < args.len() {
                    db_path = Some(args[i + 1].clone());
                    i += 1;
                }
            }
            "--port" | "-p" => {
                if i + 1 < args.len() {
                    port = args[i + 1].parse().unwrap_or(3000);
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("acledit-server - Object ACL editing server\n");
                println!("USAGE:");
                println!("    acledit-server [OPTIONS]\n");
                println!("OPTIONS:");
                println!("    -d, --db-path <PATH>  Initialize the ACL store at PATH");
                println!("    -p, --port <PORT>     Listen on PORT (default: 3000)");
                println!("    -h, --help            Show this help message");
                return;
            }
            _ => {}
        }
        i += 1;
    }

    if let Some(path) = db_path {
        match acledit::init(&path) {
            Ok(()) => {
                state.set_initialized();
                println!("ACL store initialized at: {}", path);
            }
            Err(e) => {
                eprintln!("Failed to initialize ACL store: {}", e);
                std::process::exit(1);
            }
        }
    }

    let app = Router::new()
        .route("/health", get(health))
        .route("/init", post(init_store))
        .route("/acl/:object_type/:id", get(get_acl_forms).post(update_acl))
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = format!("0.0.0.0:{}", port);
    println!("acledit-server v{} listening on {}", env!("CARGO_PKG_VERSION"), addr);
    println!("\nEndpoints:");
    println!("  GET  /health           Health check");
    println!("  POST /init             Initialize the ACL store");
    println!("  GET  /acl/:type/:id    Build the edit forms for an object");
    println!("  POST /acl/:type/:id    Apply submitted checkbox state");

    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
