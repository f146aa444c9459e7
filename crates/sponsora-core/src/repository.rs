//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. Writes that other writers may
//! race on are conditional: they name the state they expect to replace
//! and fail with [`SponsoraError::Conflict`] when it has changed.
//!
//! [`SponsoraError::Conflict`]: crate::error::SponsoraError::Conflict

use uuid::Uuid;

use crate::error::SponsoraResult;
use crate::models::{
    campaign::{CreateDonationCampaign, DonationCampaign, UpdateDonationCampaign},
    donation::{CreateDonation, DonatedItem, Donation, DonationStatus},
    inventory::{InventoryAdjustment, InventoryStock, RecordAdjustment},
};

/// Pagination parameters for list queries.
#[derive(Debug, Clone)]
pub struct Pagination {
    pub offset: u64,
    pub limit: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 50,
        }
    }
}

/// A paginated result set.
#[derive(Debug, Clone, serde::Serialize)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
}

// ---------------------------------------------------------------------------
// Donations
// ---------------------------------------------------------------------------

pub trait DonationRepository: Send + Sync {
    /// Persist a donation and all of its items in one transaction.
    /// Fails with `Conflict` if the referenced campaign has been deleted.
    fn create(
        &self,
        input: CreateDonation,
    ) -> impl Future<Output = SponsoraResult<Donation>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = SponsoraResult<Donation>> + Send;

    /// Move a donation from `from` to `to`. Fails with `Conflict` if the
    /// stored status is no longer `from`.
    fn update_status(
        &self,
        id: Uuid,
        from: DonationStatus,
        to: DonationStatus,
    ) -> impl Future<Output = SponsoraResult<Donation>> + Send;

    /// Delete a donation and its items in one transaction.
    fn delete(&self, id: Uuid) -> impl Future<Output = SponsoraResult<()>> + Send;

    fn list_by_campaign(
        &self,
        campaign_id: Uuid,
        pagination: Pagination,
    ) -> impl Future<Output = SponsoraResult<PaginatedResult<Donation>>> + Send;

    /// Number of donations attributed to a campaign, in any status.
    fn count_by_campaign(&self, campaign_id: Uuid)
    -> impl Future<Output = SponsoraResult<u64>> + Send;

    /// Sum of amounts of received money donations for a campaign.
    fn received_money_total(
        &self,
        campaign_id: Uuid,
    ) -> impl Future<Output = SponsoraResult<i64>> + Send;

    /// Items of a donation in the order they were submitted.
    fn list_items(
        &self,
        donation_id: Uuid,
    ) -> impl Future<Output = SponsoraResult<Vec<DonatedItem>>> + Send;
}

// ---------------------------------------------------------------------------
// Campaigns
// ---------------------------------------------------------------------------

pub trait CampaignRepository: Send + Sync {
    fn create(
        &self,
        input: CreateDonationCampaign,
    ) -> impl Future<Output = SponsoraResult<DonationCampaign>> + Send;
    fn get_by_id(
        &self,
        id: Uuid,
    ) -> impl Future<Output = SponsoraResult<DonationCampaign>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateDonationCampaign,
    ) -> impl Future<Output = SponsoraResult<DonationCampaign>> + Send;

    /// Delete a campaign unless a donation is attributed to it, in which
    /// case nothing is deleted and the call fails with `Conflict`.
    fn delete(&self, id: Uuid) -> impl Future<Output = SponsoraResult<()>> + Send;
    fn list(
        &self,
        pagination: Pagination,
    ) -> impl Future<Output = SponsoraResult<PaginatedResult<DonationCampaign>>> + Send;

    /// Compare-and-swap the completion flag. Fails with `Conflict` if the
    /// stored flag is not `expected`.
    fn set_completed(
        &self,
        id: Uuid,
        expected: bool,
        completed: bool,
    ) -> impl Future<Output = SponsoraResult<DonationCampaign>> + Send;
}

// ---------------------------------------------------------------------------
// Inventory
// ---------------------------------------------------------------------------

pub trait InventoryRepository: Send + Sync {
    /// Look up stock by item name (case-insensitive).
    fn get_stock(
        &self,
        item_name: &str,
    ) -> impl Future<Output = SponsoraResult<InventoryStock>> + Send;
    fn list_stock(
        &self,
        pagination: Pagination,
    ) -> impl Future<Output = SponsoraResult<PaginatedResult<InventoryStock>>> + Send;

    /// Apply a stock change atomically: flag the donated item (if any),
    /// write the new stock level and append the audit record. Nothing is
    /// written if any step fails.
    fn record_adjustment(
        &self,
        input: RecordAdjustment,
    ) -> impl Future<Output = SponsoraResult<InventoryAdjustment>> + Send;

    fn list_adjustments_for_donation(
        &self,
        donation_id: Uuid,
    ) -> impl Future<Output = SponsoraResult<Vec<InventoryAdjustment>>> + Send;
    fn list_adjustments_for_item(
        &self,
        item_name: &str,
    ) -> impl Future<Output = SponsoraResult<Vec<InventoryAdjustment>>> + Send;
}
