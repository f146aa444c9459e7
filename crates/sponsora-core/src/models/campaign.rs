//! Donation campaign domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A fundraising goal that donations may be attributed to.
///
/// `is_completed` is derived state: it is kept equal to
/// [`DonationCampaign::goal_reached`] by the reconciler, never written by
/// callers directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DonationCampaign {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    /// Goal in minor currency units. Campaigns without a target never
    /// auto-complete.
    pub target_amount: Option<i64>,
    pub is_completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DonationCampaign {
    /// Whether `raised` meets the target. `None` when no target is set.
    pub fn goal_reached(&self, raised: i64) -> Option<bool> {
        self.target_amount.map(|target| raised >= target)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDonationCampaign {
    pub title: String,
    pub description: Option<String>,
    pub target_amount: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateDonationCampaign {
    pub title: Option<String>,
    /// `Some(Some(val))` = set, `Some(None)` = clear, `None` = no change.
    pub description: Option<Option<String>>,
    /// `Some(Some(val))` = set, `Some(None)` = clear, `None` = no change.
    pub target_amount: Option<Option<i64>>,
}

/// Point-in-time view of a campaign's fundraising progress.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CampaignProgress {
    pub campaign_id: Uuid,
    pub target_amount: Option<i64>,
    pub raised_amount: i64,
    pub goal_reached: Option<bool>,
    pub is_completed: bool,
    /// Whole percent of the target raised, capped at 100.
    pub percent_of_target: Option<u8>,
}

impl CampaignProgress {
    pub fn compute(campaign: &DonationCampaign, raised: i64) -> Self {
        let percent_of_target = campaign.target_amount.map(|target| {
            if target <= 0 {
                100
            } else {
                let pct = (raised.max(0) as i128 * 100) / target as i128;
                pct.min(100) as u8
            }
        });
        Self {
            campaign_id: campaign.id,
            target_amount: campaign.target_amount,
            raised_amount: raised,
            goal_reached: campaign.goal_reached(raised),
            is_completed: campaign.is_completed,
            percent_of_target,
        }
    }
}
