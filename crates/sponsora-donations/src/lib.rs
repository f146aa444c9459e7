//! Sponsora Donations — donation lifecycle, campaign completion
//! reconciliation and the transfer of donated goods into inventory.
//!
//! Every service is generic over the `sponsora-core` repository traits,
//! so this crate has no dependency on the database crate.

pub mod campaign;
pub mod config;
pub mod documents;
pub mod error;
pub mod inventory;
pub mod lifecycle;
pub mod reconcile;

pub use campaign::CampaignService;
pub use config::DonationsConfig;
pub use documents::{DonationDocuments, TracingDocuments};
pub use error::DonationError;
pub use inventory::{InventoryService, StockAdjustment, TransferSummary};
pub use lifecycle::DonationService;
pub use reconcile::{CampaignReconciler, ReconcileOutcome};
