//! Integration tests for the Donation repository using in-memory SurrealDB.

use sponsora_core::error::SponsoraError;
use sponsora_core::models::campaign::CreateDonationCampaign;
use sponsora_core::models::donation::{
    CreateDonatedItem, CreateDonation, DonationKind, DonationStatus,
};
use sponsora_core::repository::{CampaignRepository, DonationRepository, Pagination};
use sponsora_db::repository::{SurrealCampaignRepository, SurrealDonationRepository};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use uuid::Uuid;

/// Helper: spin up in-memory DB, run migrations, create one campaign.
async fn setup() -> (Surreal<Db>, Uuid) {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    sponsora_db::run_migrations(&db).await.unwrap();

    let campaign = SurrealCampaignRepository::new(db.clone())
        .create(CreateDonationCampaign {
            title: "School books".into(),
            description: None,
            target_amount: Some(100_000),
        })
        .await
        .unwrap();

    (db, campaign.id)
}

fn money(campaign_id: Option<Uuid>, amount: i64, status: DonationStatus) -> CreateDonation {
    CreateDonation {
        user_id: Some(Uuid::new_v4()),
        is_anonymous: false,
        anonymous_name: None,
        anonymous_email: None,
        kind: DonationKind::Money,
        amount: Some(amount),
        status,
        campaign_id,
        child_id: None,
        notes: None,
        items: Vec::new(),
    }
}

fn goods(names: &[(&str, i64)]) -> CreateDonation {
    CreateDonation {
        kind: DonationKind::Goods,
        amount: None,
        status: DonationStatus::Received,
        items: names
            .iter()
            .map(|(name, quantity)| CreateDonatedItem {
                name: (*name).into(),
                quantity: *quantity,
                estimated_value: None,
            })
            .collect(),
        ..money(None, 0, DonationStatus::Pending)
    }
}

#[tokio::test]
async fn create_and_get_donation() {
    let (db, campaign_id) = setup().await;
    let repo = SurrealDonationRepository::new(db);

    let input = money(Some(campaign_id), 2_500, DonationStatus::Pending);
    let donor = input.user_id;
    let created = repo.create(input).await.unwrap();

    assert_eq!(created.kind, DonationKind::Money);
    assert_eq!(created.amount, Some(2_500));
    assert_eq!(created.status, DonationStatus::Pending);
    assert_eq!(created.campaign_id, Some(campaign_id));
    assert_eq!(created.user_id, donor);

    let fetched = repo.get_by_id(created.id).await.unwrap();
    assert_eq!(fetched.id, created.id);
    assert_eq!(fetched.amount, Some(2_500));
}

#[tokio::test]
async fn get_missing_donation_is_not_found() {
    let (db, _) = setup().await;
    let repo = SurrealDonationRepository::new(db);

    let err = repo.get_by_id(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, SponsoraError::NotFound { .. }));
}

#[tokio::test]
async fn goods_items_keep_submission_order() {
    let (db, _) = setup().await;
    let repo = SurrealDonationRepository::new(db);

    let donation = repo
        .create(goods(&[("Blankets", 10), ("Shoes", 5), ("Coats", 2)]))
        .await
        .unwrap();

    let items = repo.list_items(donation.id).await.unwrap();
    let names: Vec<_> = items.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names, ["Blankets", "Shoes", "Coats"]);
    assert!(items.iter().all(|i| !i.in_inventory));
    assert!(items.iter().all(|i| i.donation_id == donation.id));
}

#[tokio::test]
async fn status_update_is_conditional() {
    let (db, _) = setup().await;
    let repo = SurrealDonationRepository::new(db);

    let donation = repo
        .create(money(None, 1_000, DonationStatus::Pending))
        .await
        .unwrap();

    let received = repo
        .update_status(donation.id, DonationStatus::Pending, DonationStatus::Received)
        .await
        .unwrap();
    assert_eq!(received.status, DonationStatus::Received);

    let err = repo
        .update_status(donation.id, DonationStatus::Pending, DonationStatus::Failed)
        .await
        .unwrap_err();
    assert!(matches!(err, SponsoraError::Conflict { .. }));
    assert_eq!(
        repo.get_by_id(donation.id).await.unwrap().status,
        DonationStatus::Received
    );

    let err = repo
        .update_status(Uuid::new_v4(), DonationStatus::Pending, DonationStatus::Failed)
        .await
        .unwrap_err();
    assert!(matches!(err, SponsoraError::NotFound { .. }));
}

#[tokio::test]
async fn delete_removes_items() {
    let (db, _) = setup().await;
    let repo = SurrealDonationRepository::new(db);

    let donation = repo.create(goods(&[("Blankets", 10)])).await.unwrap();
    repo.delete(donation.id).await.unwrap();

    assert!(repo.get_by_id(donation.id).await.is_err());
    assert!(repo.list_items(donation.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn received_total_counts_only_received_money() {
    let (db, campaign_id) = setup().await;
    let repo = SurrealDonationRepository::new(db);

    assert_eq!(repo.received_money_total(campaign_id).await.unwrap(), 0);

    repo.create(money(Some(campaign_id), 60_000, DonationStatus::Received))
        .await
        .unwrap();
    repo.create(money(Some(campaign_id), 45_000, DonationStatus::Received))
        .await
        .unwrap();
    repo.create(money(Some(campaign_id), 9_999, DonationStatus::Pending))
        .await
        .unwrap();
    repo.create(money(None, 1_000, DonationStatus::Received))
        .await
        .unwrap();
    repo.create(CreateDonation {
        campaign_id: Some(campaign_id),
        ..goods(&[("Shoes", 1)])
    })
    .await
    .unwrap();

    assert_eq!(
        repo.received_money_total(campaign_id).await.unwrap(),
        105_000
    );
    assert_eq!(repo.count_by_campaign(campaign_id).await.unwrap(), 4);
}

#[tokio::test]
async fn list_by_campaign_paginates() {
    let (db, campaign_id) = setup().await;
    let repo = SurrealDonationRepository::new(db);

    for amount in [100, 200, 300] {
        repo.create(money(Some(campaign_id), amount, DonationStatus::Pending))
            .await
            .unwrap();
    }

    let page = repo
        .list_by_campaign(
            campaign_id,
            Pagination {
                offset: 0,
                limit: 2,
            },
        )
        .await
        .unwrap();
    assert_eq!(page.total, 3);
    assert_eq!(page.items.len(), 2);

    let rest = repo
        .list_by_campaign(
            campaign_id,
            Pagination {
                offset: 2,
                limit: 2,
            },
        )
        .await
        .unwrap();
    assert_eq!(rest.items.len(), 1);
}

#[tokio::test]
async fn donation_for_deleted_campaign_is_refused() {
    let (db, campaign_id) = setup().await;
    let repo = SurrealDonationRepository::new(db.clone());
    SurrealCampaignRepository::new(db)
        .delete(campaign_id)
        .await
        .unwrap();

    let err = repo
        .create(money(Some(campaign_id), 500, DonationStatus::Received))
        .await
        .unwrap_err();
    assert!(matches!(err, SponsoraError::Conflict { .. }));
    assert_eq!(repo.count_by_campaign(campaign_id).await.unwrap(), 0);
}
