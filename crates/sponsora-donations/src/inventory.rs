//! Moving received goods into stock, and manual stock changes.
//!
//! Each donated item is transferred as one atomic unit (adjustment
//! record, stock level, `in_inventory` flag), written by the inventory
//! repository against the stock level it was planned on. A unit that loses
//! a race is re-planned from fresh state; a unit that still fails is
//! reported in the [`TransferSummary`] without blocking the other items.

use serde::{Deserialize, Serialize};
use sponsora_core::error::{SponsoraError, SponsoraResult};
use sponsora_core::models::donation::{DonatedItem, DonationKind, DonationStatus};
use sponsora_core::models::inventory::{
    AdjustmentType, InventoryAdjustment, InventoryStock, RecordAdjustment,
};
use sponsora_core::repository::{
    DonationRepository, InventoryRepository, PaginatedResult, Pagination,
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::DonationsConfig;
use crate::error::DonationError;

/// Result of one transfer run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferSummary {
    pub donation_id: Uuid,
    pub added_count: usize,
    pub skipped_count: usize,
    /// Donated items whose transfer did not apply.
    pub failures: Vec<Uuid>,
}

/// A manual stock change by an inventory manager.
#[derive(Debug, Clone, Deserialize)]
pub struct StockAdjustment {
    pub item_name: String,
    /// Positive to add stock, negative to remove it.
    pub quantity_change: i64,
    pub reason: String,
    #[serde(skip)]
    pub actor_id: Uuid,
}

enum ItemOutcome {
    Added,
    AlreadyInInventory,
}

pub struct InventoryService<D: DonationRepository, I: InventoryRepository> {
    donations: D,
    inventory: I,
    config: DonationsConfig,
}

impl<D: DonationRepository, I: InventoryRepository> InventoryService<D, I> {
    pub fn new(donations: D, inventory: I, config: DonationsConfig) -> Self {
        Self {
            donations,
            inventory,
            config,
        }
    }

    /// Transfer every not-yet-stocked item of a received goods donation.
    /// Safe to call again; items already in stock are skipped.
    pub async fn transfer_to_inventory(
        &self,
        donation_id: Uuid,
        actor_id: Uuid,
    ) -> SponsoraResult<TransferSummary> {
        let donation = self.donations.get_by_id(donation_id).await?;
        if donation.kind != DonationKind::Goods {
            return Err(DonationError::NotGoods.into());
        }
        if donation.status != DonationStatus::Received {
            return Err(DonationError::NotReceived(donation.status).into());
        }

        let items = self.donations.list_items(donation_id).await?;
        let mut summary = TransferSummary {
            donation_id,
            added_count: 0,
            skipped_count: 0,
            failures: Vec::new(),
        };

        for item in items {
            if item.in_inventory {
                summary.skipped_count += 1;
                continue;
            }
            match self.transfer_item(item.clone(), actor_id).await {
                Ok(ItemOutcome::Added) => summary.added_count += 1,
                Ok(ItemOutcome::AlreadyInInventory) => summary.skipped_count += 1,
                Err(e) => {
                    warn!(
                        %donation_id,
                        item_id = %item.id,
                        item = %item.name,
                        error = %e,
                        "Donated item transfer failed"
                    );
                    summary.failures.push(item.id);
                }
            }
        }

        info!(
            %donation_id,
            %actor_id,
            added = summary.added_count,
            skipped = summary.skipped_count,
            failed = summary.failures.len(),
            "Donation transferred to inventory"
        );
        Ok(summary)
    }

    async fn transfer_item(
        &self,
        mut item: DonatedItem,
        actor_id: Uuid,
    ) -> SponsoraResult<ItemOutcome> {
        let mut attempt = 0;

        loop {
            let planned = match self.inventory.get_stock(&item.name).await {
                Ok(stock) => (AdjustmentType::Increase, stock.quantity, stock.item_name),
                Err(SponsoraError::NotFound { .. }) => {
                    (AdjustmentType::NewItem, 0, item.name.clone())
                }
                Err(e) => return Err(e),
            };
            let (adjustment_type, before, name) = planned;

            let plan = RecordAdjustment {
                item_name: name,
                adjustment_type,
                quantity_before: before,
                quantity_change: item.quantity,
                reason: self.config.transfer_reason.clone(),
                source_donation_id: Some(item.donation_id),
                donated_item_id: Some(item.id),
                actor_id,
            };

            match self.inventory.record_adjustment(plan).await {
                Ok(adjustment) => {
                    debug!(
                        item_id = %item.id,
                        item = %adjustment.item_name,
                        before = adjustment.quantity_before,
                        after = adjustment.quantity_after,
                        "Stocked donated item"
                    );
                    return Ok(ItemOutcome::Added);
                }
                Err(SponsoraError::Conflict { .. })
                    if attempt < self.config.transfer_conflict_retries =>
                {
                    attempt += 1;
                    let fresh = self
                        .donations
                        .list_items(item.donation_id)
                        .await?
                        .into_iter()
                        .find(|i| i.id == item.id)
                        .ok_or_else(|| SponsoraError::not_found("donated_item", item.id))?;
                    if fresh.in_inventory {
                        return Ok(ItemOutcome::AlreadyInInventory);
                    }
                    debug!(
                        item_id = %item.id,
                        attempt,
                        "Stock moved underneath transfer, re-planning"
                    );
                    item = fresh;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Apply a manual stock change.
    pub async fn adjust_stock(
        &self,
        input: StockAdjustment,
    ) -> SponsoraResult<InventoryAdjustment> {
        if input.quantity_change == 0 {
            return Err(DonationError::ZeroAdjustment.into());
        }
        if input.item_name.trim().is_empty() {
            return Err(DonationError::ItemNameEmpty.into());
        }
        if input.item_name.trim().chars().count() > self.config.max_item_name_length {
            return Err(DonationError::ItemNameTooLong {
                max: self.config.max_item_name_length,
            }
            .into());
        }

        let current = self.inventory.get_stock(&input.item_name).await;
        let (adjustment_type, before, name) = match current {
            Ok(stock) => {
                let kind = if input.quantity_change > 0 {
                    AdjustmentType::Increase
                } else {
                    AdjustmentType::Decrease
                };
                (kind, stock.quantity, stock.item_name)
            }
            Err(SponsoraError::NotFound { .. }) if input.quantity_change > 0 => {
                (AdjustmentType::NewItem, 0, input.item_name.trim().to_string())
            }
            Err(e) => return Err(e),
        };

        match before.checked_add(input.quantity_change) {
            Some(after) if after >= 0 => {}
            Some(_) => {
                return Err(DonationError::InsufficientStock {
                    item: name,
                    available: before,
                    requested: input.quantity_change.unsigned_abs(),
                }
                .into());
            }
            None => {
                return Err(DonationError::StockOverflow {
                    item: name,
                    change: input.quantity_change,
                }
                .into());
            }
        }

        let adjustment = self
            .inventory
            .record_adjustment(RecordAdjustment {
                item_name: name,
                adjustment_type,
                quantity_before: before,
                quantity_change: input.quantity_change,
                reason: input.reason,
                source_donation_id: None,
                donated_item_id: None,
                actor_id: input.actor_id,
            })
            .await?;

        info!(
            item = %adjustment.item_name,
            change = adjustment.quantity_change,
            after = adjustment.quantity_after,
            actor_id = %adjustment.actor_id,
            "Stock adjusted"
        );
        Ok(adjustment)
    }

    pub async fn stock(&self, item_name: &str) -> SponsoraResult<InventoryStock> {
        self.inventory.get_stock(item_name).await
    }

    pub async fn list_stock(
        &self,
        pagination: Pagination,
    ) -> SponsoraResult<PaginatedResult<InventoryStock>> {
        self.inventory.list_stock(pagination).await
    }

    pub async fn adjustments_for_donation(
        &self,
        donation_id: Uuid,
    ) -> SponsoraResult<Vec<InventoryAdjustment>> {
        self.donations.get_by_id(donation_id).await?;
        self.inventory.list_adjustments_for_donation(donation_id).await
    }

    pub async fn adjustments_for_item(
        &self,
        item_name: &str,
    ) -> SponsoraResult<Vec<InventoryAdjustment>> {
        self.inventory.list_adjustments_for_item(item_name).await
    }
}
