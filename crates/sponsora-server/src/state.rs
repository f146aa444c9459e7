//! Shared application state.

use std::sync::Arc;

use sponsora_db::repository::{
    SurrealCampaignRepository, SurrealDonationRepository, SurrealInventoryRepository,
};
use sponsora_donations::{
    CampaignService, DonationService, DonationsConfig, InventoryService, TracingDocuments,
};
use surrealdb::{Connection, Surreal};

pub type SharedState<C> = Arc<AppState<C>>;

pub struct AppState<C: Connection> {
    pub donations: DonationService<
        SurrealDonationRepository<C>,
        SurrealCampaignRepository<C>,
        TracingDocuments,
    >,
    pub campaigns: CampaignService<SurrealCampaignRepository<C>, SurrealDonationRepository<C>>,
    pub inventory: InventoryService<SurrealDonationRepository<C>, SurrealInventoryRepository<C>>,
}

impl<C: Connection> AppState<C> {
    pub fn new(db: Surreal<C>, config: DonationsConfig) -> SharedState<C> {
        let donations = SurrealDonationRepository::new(db.clone());
        let campaigns = SurrealCampaignRepository::new(db.clone());
        let inventory = SurrealInventoryRepository::new(db);

        Arc::new(Self {
            campaigns: CampaignService::new(campaigns.clone(), donations.clone(), &config),
            inventory: InventoryService::new(donations.clone(), inventory, config.clone()),
            donations: DonationService::new(donations, campaigns, TracingDocuments, config),
        })
    }
}
