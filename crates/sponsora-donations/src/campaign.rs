//! Campaign management.

use sponsora_core::error::{SponsoraError, SponsoraResult};
use sponsora_core::models::campaign::{
    CampaignProgress, CreateDonationCampaign, DonationCampaign, UpdateDonationCampaign,
};
use sponsora_core::repository::{
    CampaignRepository, DonationRepository, PaginatedResult, Pagination,
};
use tracing::{error, info};
use uuid::Uuid;

use crate::config::DonationsConfig;
use crate::error::DonationError;
use crate::reconcile::CampaignReconciler;

fn check_title(title: &str) -> Result<(), DonationError> {
    if title.trim().is_empty() {
        return Err(DonationError::CampaignTitleEmpty);
    }
    Ok(())
}

fn check_target(target: Option<i64>) -> Result<(), DonationError> {
    if target.is_some_and(|t| t <= 0) {
        return Err(DonationError::TargetNotPositive);
    }
    Ok(())
}

pub struct CampaignService<C: CampaignRepository, D: DonationRepository> {
    campaigns: C,
    donations: D,
    reconciler: CampaignReconciler<C, D>,
}

impl<C, D> CampaignService<C, D>
where
    C: CampaignRepository + Clone,
    D: DonationRepository + Clone,
{
    pub fn new(campaigns: C, donations: D, config: &DonationsConfig) -> Self {
        let reconciler = CampaignReconciler::new(
            campaigns.clone(),
            donations.clone(),
            config.reconcile_conflict_retries,
        );
        Self {
            campaigns,
            donations,
            reconciler,
        }
    }

    pub async fn create(
        &self,
        input: CreateDonationCampaign,
    ) -> SponsoraResult<DonationCampaign> {
        check_title(&input.title)?;
        check_target(input.target_amount)?;

        let campaign = self
            .campaigns
            .create(CreateDonationCampaign {
                title: input.title.trim().to_string(),
                ..input
            })
            .await?;
        info!(
            campaign_id = %campaign.id,
            target = ?campaign.target_amount,
            "Campaign created"
        );
        Ok(campaign)
    }

    pub async fn get(&self, campaign_id: Uuid) -> SponsoraResult<DonationCampaign> {
        self.campaigns.get_by_id(campaign_id).await
    }

    pub async fn list(
        &self,
        pagination: Pagination,
    ) -> SponsoraResult<PaginatedResult<DonationCampaign>> {
        self.campaigns.list(pagination).await
    }

    /// Update a campaign. A changed target re-evaluates completion.
    pub async fn update(
        &self,
        campaign_id: Uuid,
        input: UpdateDonationCampaign,
    ) -> SponsoraResult<DonationCampaign> {
        if let Some(title) = &input.title {
            check_title(title)?;
        }
        if let Some(target) = input.target_amount {
            check_target(target)?;
        }

        let retarget = input.target_amount.is_some();
        let input = UpdateDonationCampaign {
            title: input.title.map(|t| t.trim().to_string()),
            ..input
        };
        let campaign = self.campaigns.update(campaign_id, input).await?;

        if !retarget {
            return Ok(campaign);
        }
        // The update has committed; a failed reconciliation is repaired by
        // the next donation change or a reconcile-all run.
        if let Err(e) = self.reconciler.reconcile(campaign_id).await {
            error!(
                %campaign_id,
                error = %e,
                "Campaign reconciliation after retarget failed"
            );
        }
        self.campaigns.get_by_id(campaign_id).await
    }

    /// Delete a campaign that no donation refers to.
    pub async fn delete(&self, campaign_id: Uuid) -> SponsoraResult<()> {
        self.campaigns.get_by_id(campaign_id).await?;

        match self.campaigns.delete(campaign_id).await {
            Ok(()) => {}
            Err(SponsoraError::Conflict { .. }) => {
                let attributed = self.donations.count_by_campaign(campaign_id).await?;
                return Err(DonationError::CampaignHasDonations(attributed).into());
            }
            Err(e) => return Err(e),
        }
        info!(%campaign_id, "Campaign deleted");
        Ok(())
    }

    pub async fn progress(&self, campaign_id: Uuid) -> SponsoraResult<CampaignProgress> {
        let campaign = self.campaigns.get_by_id(campaign_id).await?;
        let raised = self.donations.received_money_total(campaign_id).await?;
        Ok(CampaignProgress::compute(&campaign, raised))
    }

    /// Re-run reconciliation for every campaign.
    pub async fn reconcile_all(&self) -> SponsoraResult<usize> {
        self.reconciler.reconcile_all().await
    }
}
