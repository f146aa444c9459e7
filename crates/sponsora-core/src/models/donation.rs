//! Donation and donated-item domain models.
//!
//! A donation is either money (carrying an amount in the currency's
//! minor unit) or goods (carrying one or more donated items). Donations
//! are owned by nobody; donated items are owned by their donation and
//! are removed with it.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum DonationKind {
    Money,
    Goods,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum DonationStatus {
    Pending,
    Received,
    Failed,
}

impl DonationStatus {
    /// Whether a donation may move from `self` to `next`.
    ///
    /// Only pending donations move; received and failed are terminal.
    /// Corrections happen by deleting the donation.
    pub fn can_transition_to(self, next: DonationStatus) -> bool {
        matches!(
            (self, next),
            (DonationStatus::Pending, DonationStatus::Received)
                | (DonationStatus::Pending, DonationStatus::Failed)
        )
    }
}

impl fmt::Display for DonationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DonationStatus::Pending => "Pending",
            DonationStatus::Received => "Received",
            DonationStatus::Failed => "Failed",
        };
        f.write_str(s)
    }
}

/// A single contribution, either money or goods.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Donation {
    pub id: Uuid,
    /// Registered donor. `None` exactly when the donation is anonymous.
    pub user_id: Option<Uuid>,
    pub is_anonymous: bool,
    pub anonymous_name: Option<String>,
    pub anonymous_email: Option<String>,
    pub kind: DonationKind,
    /// Amount in minor currency units; only set for money donations.
    pub amount: Option<i64>,
    pub status: DonationStatus,
    pub campaign_id: Option<Uuid>,
    /// Beneficiary child, if the donation is earmarked.
    pub child_id: Option<Uuid>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields required to record a new donation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDonation {
    pub user_id: Option<Uuid>,
    pub is_anonymous: bool,
    pub anonymous_name: Option<String>,
    pub anonymous_email: Option<String>,
    pub kind: DonationKind,
    pub amount: Option<i64>,
    /// `Pending` normally; `Received` when payment confirmed synchronously.
    pub status: DonationStatus,
    pub campaign_id: Option<Uuid>,
    pub child_id: Option<Uuid>,
    pub notes: Option<String>,
    /// Line items of a goods donation. Empty for money donations.
    #[serde(default)]
    pub items: Vec<CreateDonatedItem>,
}

/// One line item of a goods donation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DonatedItem {
    pub id: Uuid,
    pub donation_id: Uuid,
    pub name: String,
    pub quantity: i64,
    /// Estimated value of the whole line in minor currency units.
    pub estimated_value: Option<i64>,
    /// Set once, when the item has been moved into inventory stock.
    pub in_inventory: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDonatedItem {
    pub name: String,
    pub quantity: i64,
    pub estimated_value: Option<i64>,
}

/// A donation together with its line items.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DonationWithItems {
    #[serde(flatten)]
    pub donation: Donation,
    pub items: Vec<DonatedItem>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_pending_moves() {
        use DonationStatus::*;
        assert!(Pending.can_transition_to(Received));
        assert!(Pending.can_transition_to(Failed));
        assert!(!Pending.can_transition_to(Pending));
        assert!(!Received.can_transition_to(Pending));
        assert!(!Received.can_transition_to(Failed));
        assert!(!Received.can_transition_to(Received));
        assert!(!Failed.can_transition_to(Received));
        assert!(!Failed.can_transition_to(Pending));
    }
}
