//! HTTP routes.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::{Deserialize, Deserializer, Serialize};
use sponsora_core::models::campaign::{
    CampaignProgress, CreateDonationCampaign, DonationCampaign, UpdateDonationCampaign,
};
use sponsora_core::models::donation::{
    CreateDonation, Donation, DonationStatus, DonationWithItems,
};
use sponsora_core::models::inventory::{InventoryAdjustment, InventoryStock};
use sponsora_core::repository::{PaginatedResult, Pagination};
use sponsora_donations::{StockAdjustment, TransferSummary};
use surrealdb::Connection;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::actor::Actor;
use crate::error::ApiError;
use crate::state::SharedState;

const MAX_PAGE_SIZE: u64 = 200;

type ApiResult<T> = Result<Json<T>, ApiError>;

pub fn router<C: Connection>(state: SharedState<C>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/donations", post(record_donation::<C>))
        .route(
            "/api/donations/{id}",
            get(get_donation::<C>).delete(delete_donation::<C>),
        )
        .route("/api/donations/{id}/status", put(update_status::<C>))
        .route("/api/donations/{id}/transfer", post(transfer::<C>))
        .route(
            "/api/campaigns",
            post(create_campaign::<C>).get(list_campaigns::<C>),
        )
        .route("/api/campaigns/reconcile", post(reconcile_campaigns::<C>))
        .route(
            "/api/campaigns/{id}",
            get(get_campaign::<C>)
                .put(update_campaign::<C>)
                .delete(delete_campaign::<C>),
        )
        .route("/api/campaigns/{id}/progress", get(campaign_progress::<C>))
        .route("/api/campaigns/{id}/donations", get(campaign_donations::<C>))
        .route("/api/inventory", get(list_stock::<C>))
        .route("/api/inventory/adjustments", post(adjust_stock::<C>))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Debug, Default, Deserialize)]
struct PageParams {
    offset: Option<u64>,
    limit: Option<u64>,
}

impl From<PageParams> for Pagination {
    fn from(params: PageParams) -> Self {
        let defaults = Pagination::default();
        Pagination {
            offset: params.offset.unwrap_or(defaults.offset),
            limit: params
                .limit
                .unwrap_or(defaults.limit)
                .clamp(1, MAX_PAGE_SIZE),
        }
    }
}

#[derive(Debug, Deserialize)]
struct StatusRequest {
    status: DonationStatus,
}

/// Distinguishes an absent field from an explicit `null`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Deserialize)]
struct UpdateCampaignRequest {
    title: Option<String>,
    #[serde(default, deserialize_with = "present")]
    description: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    target_amount: Option<Option<i64>>,
}

impl From<UpdateCampaignRequest> for UpdateDonationCampaign {
    fn from(req: UpdateCampaignRequest) -> Self {
        UpdateDonationCampaign {
            title: req.title,
            description: req.description,
            target_amount: req.target_amount,
        }
    }
}

#[derive(Debug, Serialize)]
struct ReconcileResponse {
    changed: usize,
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

// ---------------------------------------------------------------------------
// Donations
// ---------------------------------------------------------------------------

async fn record_donation<C: Connection>(
    State(state): State<SharedState<C>>,
    body: Result<Json<CreateDonation>, JsonRejection>,
) -> Result<(StatusCode, Json<Donation>), ApiError> {
    let Json(input) = body?;
    let donation = state.donations.record_donation(input).await?;
    Ok((StatusCode::CREATED, Json(donation)))
}

async fn get_donation<C: Connection>(
    State(state): State<SharedState<C>>,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<DonationWithItems> {
    let Path(id) = id?;
    Ok(Json(state.donations.get_donation(id).await?))
}

async fn update_status<C: Connection>(
    State(state): State<SharedState<C>>,
    id: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<StatusRequest>, JsonRejection>,
) -> ApiResult<Donation> {
    let Path(id) = id?;
    let Json(req) = body?;
    Ok(Json(state.donations.update_status(id, req.status).await?))
}

async fn delete_donation<C: Connection>(
    State(state): State<SharedState<C>>,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Donation> {
    let Path(id) = id?;
    Ok(Json(state.donations.delete_donation(id).await?))
}

async fn transfer<C: Connection>(
    State(state): State<SharedState<C>>,
    Actor(actor_id): Actor,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<TransferSummary> {
    let Path(id) = id?;
    Ok(Json(state.inventory.transfer_to_inventory(id, actor_id).await?))
}

// ---------------------------------------------------------------------------
// Campaigns
// ---------------------------------------------------------------------------

async fn create_campaign<C: Connection>(
    State(state): State<SharedState<C>>,
    body: Result<Json<CreateDonationCampaign>, JsonRejection>,
) -> Result<(StatusCode, Json<DonationCampaign>), ApiError> {
    let Json(input) = body?;
    let campaign = state.campaigns.create(input).await?;
    Ok((StatusCode::CREATED, Json(campaign)))
}

async fn list_campaigns<C: Connection>(
    State(state): State<SharedState<C>>,
    params: Result<Query<PageParams>, QueryRejection>,
) -> ApiResult<PaginatedResult<DonationCampaign>> {
    let Query(params) = params?;
    Ok(Json(state.campaigns.list(params.into()).await?))
}

async fn get_campaign<C: Connection>(
    State(state): State<SharedState<C>>,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<DonationCampaign> {
    let Path(id) = id?;
    Ok(Json(state.campaigns.get(id).await?))
}

async fn update_campaign<C: Connection>(
    State(state): State<SharedState<C>>,
    id: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<UpdateCampaignRequest>, JsonRejection>,
) -> ApiResult<DonationCampaign> {
    let Path(id) = id?;
    let Json(req) = body?;
    Ok(Json(state.campaigns.update(id, req.into()).await?))
}

async fn delete_campaign<C: Connection>(
    State(state): State<SharedState<C>>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let Path(id) = id?;
    state.campaigns.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn campaign_progress<C: Connection>(
    State(state): State<SharedState<C>>,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<CampaignProgress> {
    let Path(id) = id?;
    Ok(Json(state.campaigns.progress(id).await?))
}

async fn campaign_donations<C: Connection>(
    State(state): State<SharedState<C>>,
    id: Result<Path<Uuid>, PathRejection>,
    params: Result<Query<PageParams>, QueryRejection>,
) -> ApiResult<PaginatedResult<Donation>> {
    let Path(id) = id?;
    let Query(params) = params?;
    Ok(Json(
        state
            .donations
            .list_campaign_donations(id, params.into())
            .await?,
    ))
}

async fn reconcile_campaigns<C: Connection>(
    State(state): State<SharedState<C>>,
    _actor: Actor,
) -> ApiResult<ReconcileResponse> {
    let changed = state.campaigns.reconcile_all().await?;
    Ok(Json(ReconcileResponse { changed }))
}

// ---------------------------------------------------------------------------
// Inventory
// ---------------------------------------------------------------------------

async fn list_stock<C: Connection>(
    State(state): State<SharedState<C>>,
    params: Result<Query<PageParams>, QueryRejection>,
) -> ApiResult<PaginatedResult<InventoryStock>> {
    let Query(params) = params?;
    Ok(Json(state.inventory.list_stock(params.into()).await?))
}

async fn adjust_stock<C: Connection>(
    State(state): State<SharedState<C>>,
    Actor(actor_id): Actor,
    body: Result<Json<StockAdjustment>, JsonRejection>,
) -> Result<(StatusCode, Json<InventoryAdjustment>), ApiError> {
    let Json(input) = body?;
    let adjustment = state
        .inventory
        .adjust_stock(StockAdjustment { actor_id, ..input })
        .await?;
    Ok((StatusCode::CREATED, Json(adjustment)))
}
