//! Campaign completion reconciliation.
//!
//! A campaign's `is_completed` flag mirrors whether the received money
//! donations attributed to it meet its target. The flag is recomputed
//! from authoritative storage after every donation change, and written
//! with a compare-and-swap so two racing reconciliations cannot leave a
//! stale value behind.

use sponsora_core::error::{SponsoraError, SponsoraResult};
use sponsora_core::repository::{CampaignRepository, DonationRepository, Pagination};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// What a single reconciliation run did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// The campaign no longer exists.
    CampaignMissing,
    /// The campaign has no target, so it never auto-completes.
    NoTarget,
    /// The flag already matched; nothing was written.
    Unchanged { is_completed: bool, raised: i64 },
    /// The flag was flipped.
    Updated { is_completed: bool, raised: i64 },
    /// Every write attempt lost a race; the next donation change will
    /// reconcile again.
    Deferred,
}

impl ReconcileOutcome {
    pub fn wrote(&self) -> bool {
        matches!(self, ReconcileOutcome::Updated { .. })
    }
}

pub struct CampaignReconciler<C: CampaignRepository, D: DonationRepository> {
    campaigns: C,
    donations: D,
    conflict_retries: u32,
}

impl<C: CampaignRepository, D: DonationRepository> CampaignReconciler<C, D> {
    pub fn new(campaigns: C, donations: D, conflict_retries: u32) -> Self {
        Self {
            campaigns,
            donations,
            conflict_retries,
        }
    }

    /// Bring one campaign's completion flag in line with its received
    /// money total. Safe to run any number of times.
    pub async fn reconcile(&self, campaign_id: Uuid) -> SponsoraResult<ReconcileOutcome> {
        for attempt in 0..=self.conflict_retries {
            let campaign = match self.campaigns.get_by_id(campaign_id).await {
                Ok(c) => c,
                Err(SponsoraError::NotFound { .. }) => {
                    debug!(%campaign_id, "Campaign gone, skipping reconciliation");
                    return Ok(ReconcileOutcome::CampaignMissing);
                }
                Err(e) => return Err(e),
            };

            let raised = self.donations.received_money_total(campaign_id).await?;
            let Some(goal_reached) = campaign.goal_reached(raised) else {
                return Ok(ReconcileOutcome::NoTarget);
            };

            if goal_reached == campaign.is_completed {
                return Ok(ReconcileOutcome::Unchanged {
                    is_completed: campaign.is_completed,
                    raised,
                });
            }

            match self
                .campaigns
                .set_completed(campaign_id, campaign.is_completed, goal_reached)
                .await
            {
                Ok(updated) => {
                    info!(
                        %campaign_id,
                        raised,
                        target = campaign.target_amount.unwrap_or_default(),
                        is_completed = updated.is_completed,
                        "Campaign completion updated"
                    );
                    return Ok(ReconcileOutcome::Updated {
                        is_completed: updated.is_completed,
                        raised,
                    });
                }
                Err(SponsoraError::Conflict { .. }) => {
                    debug!(%campaign_id, attempt, "Campaign completion write lost a race");
                }
                Err(SponsoraError::NotFound { .. }) => {
                    return Ok(ReconcileOutcome::CampaignMissing);
                }
                Err(e) => return Err(e),
            }
        }

        warn!(
            %campaign_id,
            "Campaign completion still conflicting, deferring to next donation change"
        );
        Ok(ReconcileOutcome::Deferred)
    }

    /// Reconcile every campaign. Returns how many flags were changed.
    pub async fn reconcile_all(&self) -> SponsoraResult<usize> {
        let mut pagination = Pagination::default();
        let mut changed = 0;

        loop {
            let page = self.campaigns.list(pagination.clone()).await?;
            let fetched = page.items.len() as u64;
            for campaign in page.items {
                if self.reconcile(campaign.id).await?.wrote() {
                    changed += 1;
                }
            }
            pagination.offset += fetched;
            if fetched == 0 || pagination.offset >= page.total {
                break;
            }
        }

        info!(changed, "Reconciled all campaigns");
        Ok(changed)
    }
}
