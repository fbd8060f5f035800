//! Cart read and mutation endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use cart::{Cart, CartEngine, InMemoryCatalog, InMemoryStockOracle, ItemId, TracingSink};
use cart_store::SnapshotStore;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// The engine served by this process.
pub type Engine<S> = CartEngine<InMemoryCatalog, InMemoryStockOracle, S, TracingSink>;

/// Shared application state accessible from all handlers.
pub struct AppState<S> {
    pub engine: Engine<S>,
    pub stock: InMemoryStockOracle,
}

// -- Request types --

/// Body of `PUT /cart/items/{id}`.
///
/// `amount` is taken as any JSON value so that a missing, fractional or
/// non-numeric amount is rejected by the engine as `invalid_amount`.
#[derive(Deserialize)]
pub struct SetAmountRequest {
    #[serde(default)]
    pub amount: serde_json::Value,
}

// -- Response types --

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct CartResponse {
    pub lines: Vec<CartLineResponse>,
    pub total_units: u64,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct CartLineResponse {
    pub id: u64,
    pub title: String,
    pub price_cents: i64,
    pub image: String,
    pub amount: u32,
}

impl From<&Cart> for CartResponse {
    fn from(cart: &Cart) -> Self {
        let lines = cart
            .lines()
            .iter()
            .map(|line| CartLineResponse {
                id: line.id().as_u64(),
                title: line.item().title.clone(),
                price_cents: line.item().price.cents(),
                image: line.item().image.clone(),
                amount: line.amount(),
            })
            .collect();

        Self {
            lines,
            total_units: cart.total_units(),
        }
    }
}

// -- Handlers --

/// GET /cart — the last committed cart.
pub async fn show<S: SnapshotStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Json<CartResponse> {
    Json(CartResponse::from(&state.engine.cart()))
}

/// POST /cart/items/{id} — add one unit.
#[tracing::instrument(skip(state))]
pub async fn add<S: SnapshotStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<CartResponse>, ApiError> {
    let item_id = parse_item_id(&id)?;
    let cart = state.engine.add(item_id).await?;
    Ok(Json(CartResponse::from(&cart)))
}

/// DELETE /cart/items/{id} — drop the whole line.
#[tracing::instrument(skip(state))]
pub async fn remove<S: SnapshotStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<CartResponse>, ApiError> {
    let item_id = parse_item_id(&id)?;
    let cart = state.engine.remove(item_id).await?;
    Ok(Json(CartResponse::from(&cart)))
}

/// PUT /cart/items/{id} — set the line amount exactly.
#[tracing::instrument(skip(state, body))]
pub async fn set_amount<S: SnapshotStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    body: Result<Json<SetAmountRequest>, JsonRejection>,
) -> Result<Json<CartResponse>, ApiError> {
    let item_id = parse_item_id(&id)?;
    let Json(req) = body.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
    let cart = state
        .engine
        .set_requested_amount(item_id, req.amount.into())
        .await?;
    Ok(Json(CartResponse::from(&cart)))
}

fn parse_item_id(id: &str) -> Result<ItemId, ApiError> {
    id.parse()
        .map_err(|e| ApiError::BadRequest(format!("Invalid item id '{id}': {e}")))
}
