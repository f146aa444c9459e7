//! Inventory stock and adjustment domain models.
//!
//! Stock is aggregated per item name. The catalogue is case-insensitive:
//! "Blankets" and " blankets" refer to the same stock record (see
//! [`catalogue_key`]). Every change to a stock level is recorded as an
//! immutable [`InventoryAdjustment`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum AdjustmentType {
    Increase,
    Decrease,
    NewItem,
}

impl AdjustmentType {
    /// Whether `change` has the sign this adjustment type requires.
    pub fn accepts_change(self, change: i64) -> bool {
        match self {
            AdjustmentType::Increase | AdjustmentType::NewItem => change > 0,
            AdjustmentType::Decrease => change < 0,
        }
    }
}

/// Normalized key under which an item name is stocked.
pub fn catalogue_key(item_name: &str) -> String {
    item_name.trim().to_lowercase()
}

/// Aggregate stock level for one catalogue item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryStock {
    /// Item name as first entered into the catalogue.
    pub item_name: String,
    pub quantity: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Append-only audit record of a single stock change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryAdjustment {
    pub id: Uuid,
    pub item_name: String,
    pub adjustment_type: AdjustmentType,
    pub quantity_before: i64,
    pub quantity_after: i64,
    pub quantity_change: i64,
    pub reason: String,
    pub source_donation_id: Option<Uuid>,
    pub donated_item_id: Option<Uuid>,
    pub actor_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// A planned stock change, applied atomically by the inventory
/// repository together with its audit record.
///
/// When `donated_item_id` is set the donated item is flagged
/// `in_inventory` in the same unit of work; the whole change is refused
/// if the item was already flagged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordAdjustment {
    pub item_name: String,
    pub adjustment_type: AdjustmentType,
    /// Stock level the change was planned against. The write is refused
    /// if the stored level differs.
    pub quantity_before: i64,
    pub quantity_change: i64,
    pub reason: String,
    pub source_donation_id: Option<Uuid>,
    pub donated_item_id: Option<Uuid>,
    pub actor_id: Uuid,
}

impl RecordAdjustment {
    /// Stock level after the change, or `None` if it does not fit an `i64`.
    pub fn quantity_after(&self) -> Option<i64> {
        self.quantity_before.checked_add(self.quantity_change)
    }

    /// Checks the adjustment invariants: the change sign matches the
    /// type, a new item starts from zero, and stock never goes negative.
    /// Returns the resulting stock level.
    pub fn check(&self) -> Result<i64, String> {
        if !self.adjustment_type.accepts_change(self.quantity_change) {
            return Err(format!(
                "quantity change {} does not match adjustment type {:?}",
                self.quantity_change, self.adjustment_type
            ));
        }
        if self.adjustment_type == AdjustmentType::NewItem && self.quantity_before != 0 {
            return Err("new item must start from zero stock".into());
        }
        if catalogue_key(&self.item_name).is_empty() {
            return Err("item name must not be empty".into());
        }
        let after = self.quantity_after().ok_or_else(|| {
            format!("stock for '{}' would exceed the largest quantity", self.item_name)
        })?;
        if after < 0 {
            return Err(format!(
                "stock for '{}' would drop below zero",
                self.item_name
            ));
        }
        Ok(after)
    }
}
