//! Integration tests for moving donated goods into inventory and for
//! manual stock changes, using in-memory SurrealDB.

use sponsora_core::error::SponsoraError;
use sponsora_core::models::donation::{
    CreateDonatedItem, CreateDonation, DonationKind, DonationStatus,
};
use sponsora_core::models::inventory::AdjustmentType;
use sponsora_core::repository::{DonationRepository, Pagination};
use sponsora_db::repository::{SurrealDonationRepository, SurrealInventoryRepository};
use sponsora_donations::{DonationsConfig, InventoryService, StockAdjustment};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use uuid::Uuid;

type Service = InventoryService<SurrealDonationRepository<Db>, SurrealInventoryRepository<Db>>;

async fn setup() -> (Service, SurrealDonationRepository<Db>) {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    sponsora_db::run_migrations(&db).await.unwrap();

    let donations = SurrealDonationRepository::new(db.clone());
    let service = InventoryService::new(
        donations.clone(),
        SurrealInventoryRepository::new(db),
        DonationsConfig::default(),
    );
    (service, donations)
}

fn goods(items: &[(&str, i64)], status: DonationStatus) -> CreateDonation {
    CreateDonation {
        user_id: Some(Uuid::new_v4()),
        is_anonymous: false,
        anonymous_name: None,
        anonymous_email: None,
        kind: DonationKind::Goods,
        amount: None,
        status,
        campaign_id: None,
        child_id: None,
        notes: None,
        items: items
            .iter()
            .map(|(name, quantity)| CreateDonatedItem {
                name: (*name).into(),
                quantity: *quantity,
                estimated_value: None,
            })
            .collect(),
    }
}

fn adjust(name: &str, change: i64) -> StockAdjustment {
    StockAdjustment {
        item_name: name.into(),
        quantity_change: change,
        reason: "Stock count".into(),
        actor_id: Uuid::new_v4(),
    }
}

#[tokio::test]
async fn transfer_is_exactly_once() {
    let (service, donations) = setup().await;
    let actor = Uuid::new_v4();
    let donation = donations
        .create(goods(
            &[("Blankets", 10), ("Shoes", 5)],
            DonationStatus::Received,
        ))
        .await
        .unwrap();

    let first = service
        .transfer_to_inventory(donation.id, actor)
        .await
        .unwrap();
    assert_eq!(first.added_count, 2);
    assert_eq!(first.skipped_count, 0);
    assert!(first.failures.is_empty());

    let items = donations.list_items(donation.id).await.unwrap();
    assert!(items.iter().all(|i| i.in_inventory));

    let adjustments = service.adjustments_for_donation(donation.id).await.unwrap();
    let mut changes: Vec<_> = adjustments.iter().map(|a| a.quantity_change).collect();
    changes.sort();
    assert_eq!(changes, [5, 10]);
    assert!(
        adjustments
            .iter()
            .all(|a| a.adjustment_type == AdjustmentType::NewItem && a.actor_id == actor)
    );

    let second = service
        .transfer_to_inventory(donation.id, actor)
        .await
        .unwrap();
    assert_eq!(second.added_count, 0);
    assert_eq!(second.skipped_count, 2);
    assert_eq!(
        service
            .adjustments_for_donation(donation.id)
            .await
            .unwrap()
            .len(),
        2
    );
    assert_eq!(service.stock("Blankets").await.unwrap().quantity, 10);
    assert_eq!(service.stock("Shoes").await.unwrap().quantity, 5);
}

#[tokio::test]
async fn known_items_are_increased() {
    let (service, donations) = setup().await;
    service.adjust_stock(adjust("Blankets", 3)).await.unwrap();

    let donation = donations
        .create(goods(&[("blankets", 10)], DonationStatus::Received))
        .await
        .unwrap();
    service
        .transfer_to_inventory(donation.id, Uuid::new_v4())
        .await
        .unwrap();

    let adjustments = service.adjustments_for_donation(donation.id).await.unwrap();
    assert_eq!(adjustments.len(), 1);
    assert_eq!(adjustments[0].adjustment_type, AdjustmentType::Increase);
    assert_eq!(adjustments[0].quantity_before, 3);
    assert_eq!(adjustments[0].quantity_after, 13);

    let stock = service.stock("BLANKETS").await.unwrap();
    assert_eq!(stock.quantity, 13);
    assert_eq!(stock.item_name, "Blankets");
}

#[tokio::test]
async fn repeated_item_names_accumulate() {
    let (service, donations) = setup().await;
    let donation = donations
        .create(goods(
            &[("Coats", 2), ("Coats", 3)],
            DonationStatus::Received,
        ))
        .await
        .unwrap();

    let summary = service
        .transfer_to_inventory(donation.id, Uuid::new_v4())
        .await
        .unwrap();
    assert_eq!(summary.added_count, 2);
    assert_eq!(service.stock("Coats").await.unwrap().quantity, 5);
}

#[tokio::test]
async fn ineligible_donations_are_refused() {
    let (service, donations) = setup().await;

    let pending = donations
        .create(goods(&[("Shoes", 1)], DonationStatus::Pending))
        .await
        .unwrap();
    let err = service
        .transfer_to_inventory(pending.id, Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, SponsoraError::InvalidState { .. }));

    let cash = donations
        .create(CreateDonation {
            kind: DonationKind::Money,
            amount: Some(100),
            items: Vec::new(),
            ..goods(&[], DonationStatus::Received)
        })
        .await
        .unwrap();
    let err = service
        .transfer_to_inventory(cash.id, Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, SponsoraError::InvalidState { .. }));

    let err = service
        .transfer_to_inventory(Uuid::new_v4(), Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, SponsoraError::NotFound { .. }));

    assert!(
        service
            .list_stock(Pagination::default())
            .await
            .unwrap()
            .items
            .is_empty()
    );
}

#[tokio::test]
async fn manual_adjustments() {
    let (service, _) = setup().await;

    let created = service.adjust_stock(adjust("Rice", 20)).await.unwrap();
    assert_eq!(created.adjustment_type, AdjustmentType::NewItem);

    let taken = service.adjust_stock(adjust("rice", -5)).await.unwrap();
    assert_eq!(taken.adjustment_type, AdjustmentType::Decrease);
    assert_eq!(taken.quantity_after, 15);

    let err = service.adjust_stock(adjust("Rice", -16)).await.unwrap_err();
    assert!(matches!(err, SponsoraError::InvalidState { .. }));

    let err = service.adjust_stock(adjust("Beans", -1)).await.unwrap_err();
    assert!(matches!(err, SponsoraError::NotFound { .. }));

    let err = service.adjust_stock(adjust("Rice", 0)).await.unwrap_err();
    assert!(matches!(err, SponsoraError::Validation { .. }));

    assert_eq!(service.stock("Rice").await.unwrap().quantity, 15);
    assert_eq!(service.adjustments_for_item("RICE").await.unwrap().len(), 2);
}

#[tokio::test]
async fn extreme_adjustments_are_refused() {
    let (service, _) = setup().await;
    service.adjust_stock(adjust("Rice", 5)).await.unwrap();

    let err = service
        .adjust_stock(adjust("Rice", i64::MAX))
        .await
        .unwrap_err();
    assert!(matches!(err, SponsoraError::Validation { .. }));

    let err = service
        .adjust_stock(adjust("Rice", i64::MIN))
        .await
        .unwrap_err();
    assert!(matches!(err, SponsoraError::InvalidState { .. }));

    assert_eq!(service.stock("Rice").await.unwrap().quantity, 5);
    assert_eq!(service.adjustments_for_item("Rice").await.unwrap().len(), 1);
}
