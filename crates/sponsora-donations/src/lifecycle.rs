//! Donation lifecycle: the single entry point for donation state
//! changes.
//!
//! Every mutating operation persists its change first, then reconciles
//! the affected campaign against freshly read state, then hands settled
//! donations to the document boundary.

use sponsora_core::error::{SponsoraError, SponsoraResult};
use sponsora_core::models::donation::{
    CreateDonation, Donation, DonationKind, DonationStatus, DonationWithItems,
};
use sponsora_core::repository::{
    CampaignRepository, DonationRepository, PaginatedResult, Pagination,
};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::DonationsConfig;
use crate::documents::DonationDocuments;
use crate::error::DonationError;
use crate::reconcile::CampaignReconciler;

/// Check a new donation against the recording rules.
pub fn validate_new_donation(
    input: &CreateDonation,
    config: &DonationsConfig,
) -> Result<(), DonationError> {
    match input.status {
        DonationStatus::Pending | DonationStatus::Received => {}
        other => return Err(DonationError::InvalidInitialStatus(other)),
    }

    if input.is_anonymous {
        if input.user_id.is_some() {
            return Err(DonationError::DonorOnAnonymous);
        }
        let name = input.anonymous_name.as_deref().map(str::trim);
        let email = input.anonymous_email.as_deref().map(str::trim);
        match (name, email) {
            (Some(n), Some(e)) if !n.is_empty() && !e.is_empty() => {
                if !looks_like_email(e) {
                    return Err(DonationError::InvalidAnonymousEmail);
                }
            }
            _ => return Err(DonationError::AnonymousContactRequired),
        }
    } else if input.user_id.is_none() {
        return Err(DonationError::DonorRequired);
    }

    match input.kind {
        DonationKind::Money => {
            match input.amount {
                None => return Err(DonationError::AmountRequired),
                Some(a) if a <= 0 => return Err(DonationError::AmountNotPositive),
                Some(_) => {}
            }
            if !input.items.is_empty() {
                return Err(DonationError::ItemsOnMoney);
            }
        }
        DonationKind::Goods => {
            if input.amount.is_some() {
                return Err(DonationError::AmountOnGoods);
            }
            if input.items.is_empty() {
                return Err(DonationError::ItemsRequired);
            }
            if input.items.len() > config.max_items_per_donation {
                return Err(DonationError::TooManyItems {
                    max: config.max_items_per_donation,
                });
            }
            for item in &input.items {
                let name = item.name.trim();
                if name.is_empty() {
                    return Err(DonationError::ItemNameEmpty);
                }
                if name.chars().count() > config.max_item_name_length {
                    return Err(DonationError::ItemNameTooLong {
                        max: config.max_item_name_length,
                    });
                }
                if item.quantity <= 0 {
                    return Err(DonationError::QuantityNotPositive {
                        name: name.to_string(),
                    });
                }
                if item.estimated_value.is_some_and(|v| v < 0) {
                    return Err(DonationError::EstimatedValueNegative {
                        name: name.to_string(),
                    });
                }
            }
        }
    }

    Ok(())
}

fn looks_like_email(s: &str) -> bool {
    match s.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.contains('@')
        }
        None => false,
    }
}

/// Donation lifecycle service.
///
/// Generic over repository implementations so that the lifecycle has no
/// dependency on the database crate.
pub struct DonationService<D, C, N>
where
    D: DonationRepository,
    C: CampaignRepository,
    N: DonationDocuments,
{
    donations: D,
    campaigns: C,
    reconciler: CampaignReconciler<C, D>,
    documents: N,
    config: DonationsConfig,
}

impl<D, C, N> DonationService<D, C, N>
where
    D: DonationRepository + Clone,
    C: CampaignRepository + Clone,
    N: DonationDocuments,
{
    pub fn new(donations: D, campaigns: C, documents: N, config: DonationsConfig) -> Self {
        let reconciler = CampaignReconciler::new(
            campaigns.clone(),
            donations.clone(),
            config.reconcile_conflict_retries,
        );
        Self {
            donations,
            campaigns,
            reconciler,
            documents,
            config,
        }
    }

    /// Validate and persist a new donation, then reconcile its campaign.
    pub async fn record_donation(&self, input: CreateDonation) -> SponsoraResult<Donation> {
        validate_new_donation(&input, &self.config)?;

        if let Some(campaign_id) = input.campaign_id {
            self.campaigns.get_by_id(campaign_id).await?;
        }

        let mut input = input;
        if input.is_anonymous {
            input.anonymous_name = input.anonymous_name.map(|n| n.trim().to_string());
            input.anonymous_email = input.anonymous_email.map(|e| e.trim().to_string());
        } else {
            input.anonymous_name = None;
            input.anonymous_email = None;
        }

        let donation = self.donations.create(input).await?;
        info!(
            donation_id = %donation.id,
            kind = ?donation.kind,
            status = %donation.status,
            campaign_id = ?donation.campaign_id,
            "Donation recorded"
        );

        self.reconcile_after(&donation).await;
        if donation.status == DonationStatus::Received {
            self.hand_off(&donation).await;
        }

        Ok(donation)
    }

    /// Move a pending donation to received or failed.
    pub async fn update_status(
        &self,
        donation_id: Uuid,
        new_status: DonationStatus,
    ) -> SponsoraResult<Donation> {
        let current = self.donations.get_by_id(donation_id).await?;

        if !current.status.can_transition_to(new_status) {
            return Err(DonationError::InvalidTransition {
                from: current.status,
                to: new_status,
            }
            .into());
        }

        let donation = match self
            .donations
            .update_status(donation_id, current.status, new_status)
            .await
        {
            Ok(d) => d,
            Err(SponsoraError::Conflict { .. }) => {
                // Someone settled it first; report against what is stored now.
                let latest = self.donations.get_by_id(donation_id).await?;
                return Err(DonationError::InvalidTransition {
                    from: latest.status,
                    to: new_status,
                }
                .into());
            }
            Err(e) => return Err(e),
        };

        info!(
            donation_id = %donation.id,
            from = %current.status,
            to = %donation.status,
            "Donation status changed"
        );

        self.reconcile_after(&donation).await;
        if donation.status == DonationStatus::Received {
            self.hand_off(&donation).await;
        }

        Ok(donation)
    }

    /// Remove a donation and its items. Returns the removed record.
    pub async fn delete_donation(&self, donation_id: Uuid) -> SponsoraResult<Donation> {
        let donation = self.donations.get_by_id(donation_id).await?;
        self.donations.delete(donation_id).await?;

        info!(
            donation_id = %donation.id,
            campaign_id = ?donation.campaign_id,
            "Donation deleted"
        );

        self.reconcile_after(&donation).await;
        Ok(donation)
    }

    pub async fn get_donation(&self, donation_id: Uuid) -> SponsoraResult<DonationWithItems> {
        let donation = self.donations.get_by_id(donation_id).await?;
        let items = self.donations.list_items(donation_id).await?;
        Ok(DonationWithItems { donation, items })
    }

    pub async fn list_campaign_donations(
        &self,
        campaign_id: Uuid,
        pagination: Pagination,
    ) -> SponsoraResult<PaginatedResult<Donation>> {
        self.campaigns.get_by_id(campaign_id).await?;
        self.donations.list_by_campaign(campaign_id, pagination).await
    }

    pub fn reconciler(&self) -> &CampaignReconciler<C, D> {
        &self.reconciler
    }

    /// Reconcile the donation's campaign. The donation write has already
    /// committed, so failures here are logged rather than returned.
    async fn reconcile_after(&self, donation: &Donation) {
        let Some(campaign_id) = donation.campaign_id else {
            return;
        };
        if let Err(e) = self.reconciler.reconcile(campaign_id).await {
            error!(
                donation_id = %donation.id,
                %campaign_id,
                error = %e,
                "Campaign reconciliation failed"
            );
        }
    }

    async fn hand_off(&self, donation: &Donation) {
        if let Err(e) = self.documents.donation_settled(donation).await {
            warn!(
                donation_id = %donation.id,
                error = %e,
                "Settled donation hand-off failed"
            );
        }
    }
}
