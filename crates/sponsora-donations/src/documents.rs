//! Hand-off of settled donations to receipt and thank-you letter
//! generation.

use sponsora_core::error::SponsoraResult;
use sponsora_core::models::donation::{Donation, DonationKind};
use tracing::info;

/// Receives donations once they have been settled as received.
///
/// Implementations render receipts, queue thank-you letters, or both.
/// The donation services treat a failure here as non-fatal.
pub trait DonationDocuments: Send + Sync {
    fn donation_settled(
        &self,
        donation: &Donation,
    ) -> impl Future<Output = SponsoraResult<()>> + Send;
}

/// Logs each settled donation instead of producing documents.
#[derive(Debug, Clone, Default)]
pub struct TracingDocuments;

impl DonationDocuments for TracingDocuments {
    async fn donation_settled(&self, donation: &Donation) -> SponsoraResult<()> {
        let recipient = if donation.is_anonymous {
            donation.anonymous_email.clone()
        } else {
            donation.user_id.map(|u| u.to_string())
        };
        info!(
            donation_id = %donation.id,
            kind = ?donation.kind,
            amount = donation.amount.unwrap_or_default(),
            recipient = recipient.as_deref().unwrap_or("-"),
            receipt = donation.kind == DonationKind::Money,
            "Donation settled, receipt and thank-you letter requested"
        );
        Ok(())
    }
}
