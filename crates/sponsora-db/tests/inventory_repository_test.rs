//! Integration tests for the Inventory repository using in-memory SurrealDB.

use sponsora_core::error::SponsoraError;
use sponsora_core::models::donation::{
    CreateDonatedItem, CreateDonation, DonationKind, DonationStatus,
};
use sponsora_core::models::inventory::{AdjustmentType, RecordAdjustment};
use sponsora_core::repository::{DonationRepository, InventoryRepository, Pagination};
use sponsora_db::repository::{SurrealDonationRepository, SurrealInventoryRepository};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use uuid::Uuid;

async fn setup() -> Surreal<Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    sponsora_db::run_migrations(&db).await.unwrap();
    db
}

fn manual(name: &str, kind: AdjustmentType, before: i64, change: i64) -> RecordAdjustment {
    RecordAdjustment {
        item_name: name.into(),
        adjustment_type: kind,
        quantity_before: before,
        quantity_change: change,
        reason: "Stock count".into(),
        source_donation_id: None,
        donated_item_id: None,
        actor_id: Uuid::new_v4(),
    }
}

#[tokio::test]
async fn new_item_then_increase() {
    let repo = SurrealInventoryRepository::new(setup().await);

    let first = repo
        .record_adjustment(manual("Blankets", AdjustmentType::NewItem, 0, 10))
        .await
        .unwrap();
    assert_eq!(first.adjustment_type, AdjustmentType::NewItem);
    assert_eq!(first.quantity_after, 10);

    let second = repo
        .record_adjustment(manual("blankets ", AdjustmentType::Increase, 10, 4))
        .await
        .unwrap();
    assert_eq!(second.quantity_before, 10);
    assert_eq!(second.quantity_after, 14);

    let stock = repo.get_stock("BLANKETS").await.unwrap();
    assert_eq!(stock.item_name, "Blankets");
    assert_eq!(stock.quantity, 14);

    let history = repo.list_adjustments_for_item("Blankets").await.unwrap();
    assert_eq!(history.len(), 2);
}

#[tokio::test]
async fn stale_plan_is_a_conflict() {
    let repo = SurrealInventoryRepository::new(setup().await);
    repo.record_adjustment(manual("Shoes", AdjustmentType::NewItem, 0, 5))
        .await
        .unwrap();

    let err = repo
        .record_adjustment(manual("Shoes", AdjustmentType::Increase, 3, 1))
        .await
        .unwrap_err();
    assert!(matches!(err, SponsoraError::Conflict { .. }));

    let err = repo
        .record_adjustment(manual("Shoes", AdjustmentType::NewItem, 0, 1))
        .await
        .unwrap_err();
    assert!(matches!(err, SponsoraError::Conflict { .. }));

    assert_eq!(repo.get_stock("Shoes").await.unwrap().quantity, 5);
    assert_eq!(repo.list_adjustments_for_item("Shoes").await.unwrap().len(), 1);
}

#[tokio::test]
async fn invalid_plan_is_rejected_before_writing() {
    let repo = SurrealInventoryRepository::new(setup().await);

    let err = repo
        .record_adjustment(manual("Coats", AdjustmentType::NewItem, 0, -1))
        .await
        .unwrap_err();
    assert!(matches!(err, SponsoraError::Validation { .. }));
    assert!(repo.get_stock("Coats").await.is_err());
}

#[tokio::test]
async fn donated_item_is_flagged_once() {
    let db = setup().await;
    let donations = SurrealDonationRepository::new(db.clone());
    let repo = SurrealInventoryRepository::new(db);

    let donation = donations
        .create(CreateDonation {
            user_id: Some(Uuid::new_v4()),
            is_anonymous: false,
            anonymous_name: None,
            anonymous_email: None,
            kind: DonationKind::Goods,
            amount: None,
            status: DonationStatus::Received,
            campaign_id: None,
            child_id: None,
            notes: None,
            items: vec![CreateDonatedItem {
                name: "Blankets".into(),
                quantity: 10,
                estimated_value: Some(2_000),
            }],
        })
        .await
        .unwrap();
    let item = donations.list_items(donation.id).await.unwrap().remove(0);

    let plan = RecordAdjustment {
        source_donation_id: Some(donation.id),
        donated_item_id: Some(item.id),
        ..manual("Blankets", AdjustmentType::NewItem, 0, 10)
    };
    repo.record_adjustment(plan.clone()).await.unwrap();

    let items = donations.list_items(donation.id).await.unwrap();
    assert!(items[0].in_inventory);

    // A second attempt for the same item must leave everything untouched.
    let err = repo
        .record_adjustment(RecordAdjustment {
            adjustment_type: AdjustmentType::Increase,
            quantity_before: 10,
            ..plan
        })
        .await
        .unwrap_err();
    assert!(matches!(err, SponsoraError::Conflict { .. }));
    assert_eq!(repo.get_stock("Blankets").await.unwrap().quantity, 10);

    let adjustments = repo
        .list_adjustments_for_donation(donation.id)
        .await
        .unwrap();
    assert_eq!(adjustments.len(), 1);
    assert_eq!(adjustments[0].donated_item_id, Some(item.id));
}

#[tokio::test]
async fn list_stock_is_sorted_by_name() {
    let repo = SurrealInventoryRepository::new(setup().await);
    for name in ["Shoes", "Blankets", "Coats"] {
        repo.record_adjustment(manual(name, AdjustmentType::NewItem, 0, 1))
            .await
            .unwrap();
    }

    let page = repo.list_stock(Pagination::default()).await.unwrap();
    assert_eq!(page.total, 3);
    let names: Vec<_> = page.items.iter().map(|s| s.item_name.as_str()).collect();
    assert_eq!(names, ["Blankets", "Coats", "Shoes"]);
}
