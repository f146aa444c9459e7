//! Donation service configuration.

use serde::Deserialize;

/// Configuration for the donation services.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DonationsConfig {
    /// How many times a campaign completion write that lost a race is
    /// retried before reconciliation is deferred (default: 1).
    pub reconcile_conflict_retries: u32,
    /// How many times an inventory transfer re-plans an item whose stock
    /// changed underneath it (default: 1).
    pub transfer_conflict_retries: u32,
    /// Maximum number of line items on one goods donation (default: 100).
    pub max_items_per_donation: usize,
    /// Maximum length of a donated item name (default: 200).
    pub max_item_name_length: usize,
    /// Reason recorded on adjustments created by inventory transfer.
    pub transfer_reason: String,
}

impl Default for DonationsConfig {
    fn default() -> Self {
        Self {
            reconcile_conflict_retries: 1,
            transfer_conflict_retries: 1,
            max_items_per_donation: 100,
            max_item_name_length: 200,
            transfer_reason: "Donation received".into(),
        }
    }
}
