//! Operator REST API for the field stock inventory.
//!
//! Run with: `cargo run --example server`
//!
//! ## Endpoints
//!
//! - `POST /users` - Register a user (technician or operator)
//! - `POST /equipment` - Add an equipment type to the catalog
//! - `GET /equipment` - List the catalog
//! - `GET /equipment/{id}` - Get one equipment type
//! - `GET /technicians/{id}/wallets` - Units held by a technician
//! - `POST /movements` - Record a single withdrawal, return or write-off
//! - `GET /movements` - Search movements (`technician`, `kind`, `equipment`, `q`)
//! - `POST /batches` - Open a batch
//! - `GET /batches/{id}` - Get a batch
//! - `POST /batches/{id}/commit` - Commit a batch, all lines or none
//! - `GET /report` - Stock report as text
//!
//! ## Example Usage
//!
//! ```bash
//! # Register a technician
//! curl -X POST http://localhost:3000/users \
//!   -H "Content-Type: application/json" -d '{"username": "joao"}'
//!
//! # Add equipment
//! curl -X POST http://localhost:3000/equipment \
//!   -H "Content-Type: application/json" \
//!   -d '{"name": "Fiber Splicer", "category": "fiber", "quantity": 10}'
//!
//! # Withdraw three units
//! curl -X POST http://localhost:3000/movements \
//!   -H "Content-Type: application/json" \
//!   -d '{"technician": 1, "equipment": 1, "kind": "WITHDRAW", "quantity": 3, "recorded_by": 1}'
//!
//! # Open and commit a batch
//! curl -X POST http://localhost:3000/batches \
//!   -H "Content-Type: application/json" \
//!   -d '{"technician": 1, "kind": "WITHDRAW", "note": "OS 1234", "lines": [{"equipment": 1, "quantity": 2}]}'
//! curl -X POST http://localhost:3000/batches/1/commit \
//!   -H "Content-Type: application/json" -d '{"recorded_by": 1}'
//! ```

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use field_stock_rs::config::Settings;
use field_stock_rs::{
    Batch, BatchId, CommitOutcome, Equipment, EquipmentId, Inventory, InventoryError, Movement,
    MovementFilter, MovementKind, MovementRequest, NewBatch, NewEquipment, StockReport, UserId,
    Wallet, logging,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::net::TcpListener;

// === Request/Response DTOs ===

#[derive(Debug, Deserialize)]
pub struct CreateUser {
    pub username: String,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: UserId,
    pub username: String,
}

/// Request body for a single movement.
///
/// ```json
/// {"technician": 1, "equipment": 1, "kind": "WITHDRAW", "quantity": 3, "recorded_by": 1}
/// ```
#[derive(Debug, Deserialize)]
pub struct CreateMovement {
    pub technician: UserId,
    pub equipment: EquipmentId,
    pub kind: MovementKind,
    pub quantity: u32,
    #[serde(default)]
    pub note: Option<String>,
    pub recorded_by: UserId,
}

impl CreateMovement {
    fn into_request(self) -> (MovementRequest, UserId) {
        let request = MovementRequest {
            technician: self.technician,
            equipment: self.equipment,
            kind: self.kind,
            quantity: self.quantity,
            note: self.note,
        };
        (request, self.recorded_by)
    }
}

#[derive(Debug, Deserialize)]
pub struct CommitRequest {
    pub recorded_by: UserId,
}

#[derive(Debug, Serialize)]
pub struct BatchCreated {
    pub id: BatchId,
}

#[derive(Debug, Serialize)]
pub struct CommitResponse {
    #[serde(flatten)]
    pub outcome: CommitOutcome,
    pub message: String,
}

/// Query string for `GET /movements`.
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub technician: Option<u32>,
    pub kind: Option<String>,
    pub equipment: Option<u32>,
    pub q: Option<String>,
}

/// Response body for errors.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

// === Application State ===

/// Shared application state containing the inventory.
#[derive(Clone)]
pub struct AppState {
    pub inventory: Arc<Inventory>,
    pub settings: Arc<Settings>,
}

// === Error Handling ===

/// Wrapper for converting `InventoryError` into HTTP responses.
pub struct AppError(InventoryError);

impl From<InventoryError> for AppError {
    fn from(err: InventoryError) -> Self {
        AppError(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = match &self.0 {
            InventoryError::InvalidQuantity => (StatusCode::BAD_REQUEST, "INVALID_QUANTITY"),
            InventoryError::InsufficientCompanyStock { .. } => {
                (StatusCode::UNPROCESSABLE_ENTITY, "INSUFFICIENT_COMPANY_STOCK")
            }
            InventoryError::InsufficientTechnicianBalance { .. } => {
                (StatusCode::UNPROCESSABLE_ENTITY, "INSUFFICIENT_TECHNICIAN_BALANCE")
            }
            InventoryError::QuantityOverflow { .. } => {
                (StatusCode::UNPROCESSABLE_ENTITY, "QUANTITY_OVERFLOW")
            }
            InventoryError::EquipmentNotFound(_) => (StatusCode::NOT_FOUND, "EQUIPMENT_NOT_FOUND"),
            InventoryError::DuplicateEquipment(_) => (StatusCode::CONFLICT, "DUPLICATE_EQUIPMENT"),
            InventoryError::BatchNotFound(_) => (StatusCode::NOT_FOUND, "BATCH_NOT_FOUND"),
            InventoryError::BatchLocked(_) => (StatusCode::CONFLICT, "BATCH_LOCKED"),
            InventoryError::EmptyBatch(_) => (StatusCode::BAD_REQUEST, "EMPTY_BATCH"),
            InventoryError::BatchMismatch { .. } => (StatusCode::CONFLICT, "BATCH_MISMATCH"),
            InventoryError::BatchRejected { .. } => {
                (StatusCode::UNPROCESSABLE_ENTITY, "BATCH_REJECTED")
            }
        };

        error_response(status, code, self.0.to_string())
    }
}

fn error_response(status: StatusCode, code: &str, error: String) -> Response {
    (
        status,
        Json(ErrorResponse {
            error,
            code: code.to_string(),
        }),
    )
        .into_response()
}

// === Handlers ===

/// POST /users - Register a user; returns the existing id for a known username.
async fn create_user(
    State(state): State<AppState>,
    Json(request): Json<CreateUser>,
) -> (StatusCode, Json<UserResponse>) {
    let id = state.inventory.register_user(&request.username);
    let username = state.inventory.display_name(id);
    (StatusCode::CREATED, Json(UserResponse { id, username }))
}

/// POST /equipment - Add an equipment type.
async fn create_equipment(
    State(state): State<AppState>,
    Json(request): Json<NewEquipment>,
) -> Result<(StatusCode, Json<Equipment>), AppError> {
    let id = state.inventory.register_equipment(request)?;
    let equipment = state.inventory.equipment(id)?;
    Ok((StatusCode::CREATED, Json(equipment)))
}

/// GET /equipment - List the catalog ordered by name.
async fn list_equipment(State(state): State<AppState>) -> Json<Vec<Equipment>> {
    Json(state.inventory.equipment_list())
}

/// GET /equipment/{id} - Get one equipment type.
async fn get_equipment(
    State(state): State<AppState>,
    Path(id): Path<u32>,
) -> Result<Json<Equipment>, AppError> {
    Ok(Json(state.inventory.equipment(EquipmentId(id))?))
}

/// GET /technicians/{id}/wallets - Wallets of a technician.
async fn technician_wallets(
    State(state): State<AppState>,
    Path(id): Path<u32>,
) -> Json<Vec<Wallet>> {
    Json(state.inventory.wallets_for(UserId(id)))
}

/// POST /movements - Record a single movement.
async fn create_movement(
    State(state): State<AppState>,
    Json(request): Json<CreateMovement>,
) -> Result<(StatusCode, Json<Movement>), AppError> {
    let (request, recorded_by) = request.into_request();
    let movement = state.inventory.record_movement(request, recorded_by)?;
    Ok((StatusCode::CREATED, Json(movement)))
}

/// GET /movements - Search the history, newest first.
async fn search_movements(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<Movement>>, Response> {
    let kind = match params.kind.as_deref().filter(|k| !k.is_empty()) {
        Some(kind) => Some(kind.parse::<MovementKind>().map_err(|e| {
            error_response(StatusCode::BAD_REQUEST, "UNKNOWN_KIND", e.to_string())
        })?),
        None => None,
    };
    let filter = MovementFilter {
        technician: params.technician.map(UserId),
        kind,
        equipment: params.equipment.map(EquipmentId),
        batch: None,
        note: params.q.filter(|q| !q.is_empty()),
    };
    Ok(Json(state.inventory.search_movements(&filter)))
}

/// POST /batches - Open a batch in draft state.
async fn create_batch(
    State(state): State<AppState>,
    Json(request): Json<NewBatch>,
) -> Result<(StatusCode, Json<BatchCreated>), AppError> {
    let id = state.inventory.open_batch(request)?;
    Ok((StatusCode::CREATED, Json(BatchCreated { id })))
}

/// GET /batches/{id} - Get a batch.
async fn get_batch(
    State(state): State<AppState>,
    Path(id): Path<u32>,
) -> Result<Json<Batch>, AppError> {
    let id = BatchId(id);
    state
        .inventory
        .batch(id)
        .map(Json)
        .ok_or(AppError(InventoryError::BatchNotFound(id)))
}

/// POST /batches/{id}/commit - Commit a batch.
async fn commit_batch(
    State(state): State<AppState>,
    Path(id): Path<u32>,
    Json(request): Json<CommitRequest>,
) -> Result<Json<CommitResponse>, AppError> {
    let outcome = state
        .inventory
        .commit_batch(BatchId(id), request.recorded_by)?;
    Ok(Json(CommitResponse {
        outcome,
        message: outcome.to_string(),
    }))
}

/// GET /report - Paginated text report.
async fn report(State(state): State<AppState>) -> String {
    let report = StockReport::capture(
        &state.inventory,
        state.settings.report.title.clone(),
        state.settings.report.recent_movements,
    );
    report.render_text(state.settings.report.lines_per_page)
}

// === Router ===

fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/users", post(create_user))
        .route("/equipment", post(create_equipment).get(list_equipment))
        .route("/equipment/{id}", get(get_equipment))
        .route("/technicians/{id}/wallets", get(technician_wallets))
        .route("/movements", post(create_movement).get(search_movements))
        .route("/batches", post(create_batch))
        .route("/batches/{id}", get(get_batch))
        .route("/batches/{id}/commit", post(commit_batch))
        .route("/report", get(report))
        .with_state(state)
}

// === Main ===

#[tokio::main]
async fn main() {
    let settings = match Settings::load_or_default(None) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Error loading settings: {}", e);
            std::process::exit(1);
        }
    };
    logging::init(&settings.logging);

    let state = AppState {
        inventory: Arc::new(Inventory::new()),
        settings: Arc::new(settings),
    };

    let app = create_router(state);

    let listener = TcpListener::bind("127.0.0.1:3000").await.unwrap();
    println!("Field stock API server running on http://127.0.0.1:3000");
    println!();
    println!("Endpoints:");
    println!("  POST /users                    - Register a user");
    println!("  POST /equipment                - Add equipment");
    println!("  GET  /equipment                - List equipment");
    println!("  GET  /equipment/:id            - Get equipment by ID");
    println!("  GET  /technicians/:id/wallets  - Technician wallets");
    println!("  POST /movements                - Record a movement");
    println!("  GET  /movements                - Search movements");
    println!("  POST /batches                  - Open a batch");
    println!("  GET  /batches/:id              - Get a batch");
    println!("  POST /batches/:id/commit       - Commit a batch");
    println!("  GET  /report                   - Stock report");

    axum::serve(listener, app).await.unwrap();
}
