//! SurrealDB implementation of [`DonationRepository`].
//!
//! A donation and its items are written and removed together inside a
//! single SurrealQL transaction, so readers never observe a donation
//! with a partial set of items.

use chrono::{DateTime, Utc};
use sponsora_core::error::SponsoraResult;
use sponsora_core::models::donation::{
    CreateDonation, DonatedItem, Donation, DonationKind, DonationStatus,
};
use sponsora_core::repository::{DonationRepository, PaginatedResult, Pagination};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::debug;
use uuid::Uuid;

use super::{CountRow, parse_opt_uuid, parse_uuid};
use crate::error::DbError;

/// Raised inside the create transaction when the campaign is gone.
const CAMPAIGN_GONE: &str = "campaign no longer exists";

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct DonationRow {
    user_id: Option<String>,
    is_anonymous: bool,
    anonymous_name: Option<String>,
    anonymous_email: Option<String>,
    kind: String,
    amount: Option<i64>,
    status: String,
    campaign_id: Option<String>,
    child_id: Option<String>,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct DonationRowWithId {
    record_id: String,
    user_id: Option<String>,
    is_anonymous: bool,
    anonymous_name: Option<String>,
    anonymous_email: Option<String>,
    kind: String,
    amount: Option<i64>,
    status: String,
    campaign_id: Option<String>,
    child_id: Option<String>,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct DonatedItemRowWithId {
    record_id: String,
    donation_id: String,
    name: String,
    quantity: i64,
    estimated_value: Option<i64>,
    in_inventory: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct TotalRow {
    total: i64,
}

fn parse_kind(s: &str) -> Result<DonationKind, DbError> {
    match s {
        "Money" => Ok(DonationKind::Money),
        "Goods" => Ok(DonationKind::Goods),
        other => Err(DbError::InvalidRow(format!("unknown donation kind: {other}"))),
    }
}

fn kind_to_string(k: DonationKind) -> &'static str {
    match k {
        DonationKind::Money => "Money",
        DonationKind::Goods => "Goods",
    }
}

fn parse_status(s: &str) -> Result<DonationStatus, DbError> {
    match s {
        "Pending" => Ok(DonationStatus::Pending),
        "Received" => Ok(DonationStatus::Received),
        "Failed" => Ok(DonationStatus::Failed),
        other => Err(DbError::InvalidRow(format!(
            "unknown donation status: {other}"
        ))),
    }
}

fn status_to_string(s: DonationStatus) -> &'static str {
    match s {
        DonationStatus::Pending => "Pending",
        DonationStatus::Received => "Received",
        DonationStatus::Failed => "Failed",
    }
}

impl DonationRow {
    fn into_donation(self, id: Uuid) -> Result<Donation, DbError> {
        Ok(Donation {
            id,
            user_id: parse_opt_uuid(self.user_id, "user")?,
            is_anonymous: self.is_anonymous,
            anonymous_name: self.anonymous_name,
            anonymous_email: self.anonymous_email,
            kind: parse_kind(&self.kind)?,
            amount: self.amount,
            status: parse_status(&self.status)?,
            campaign_id: parse_opt_uuid(self.campaign_id, "campaign")?,
            child_id: parse_opt_uuid(self.child_id, "child")?,
            notes: self.notes,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl DonationRowWithId {
    fn try_into_donation(self) -> Result<Donation, DbError> {
        Ok(Donation {
            id: parse_uuid(&self.record_id, "donation")?,
            user_id: parse_opt_uuid(self.user_id, "user")?,
            is_anonymous: self.is_anonymous,
            anonymous_name: self.anonymous_name,
            anonymous_email: self.anonymous_email,
            kind: parse_kind(&self.kind)?,
            amount: self.amount,
            status: parse_status(&self.status)?,
            campaign_id: parse_opt_uuid(self.campaign_id, "campaign")?,
            child_id: parse_opt_uuid(self.child_id, "child")?,
            notes: self.notes,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl DonatedItemRowWithId {
    fn try_into_item(self) -> Result<DonatedItem, DbError> {
        Ok(DonatedItem {
            id: parse_uuid(&self.record_id, "donated item")?,
            donation_id: parse_uuid(&self.donation_id, "donation")?,
            name: self.name,
            quantity: self.quantity,
            estimated_value: self.estimated_value,
            in_inventory: self.in_inventory,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// SurrealDB implementation of the Donation repository.
pub struct SurrealDonationRepository<C: Connection> {
    db: Surreal<C>,
}

// Not derived: that would require the engine type to be `Clone`.
impl<C: Connection> Clone for SurrealDonationRepository<C> {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
        }
    }
}

impl<C: Connection> SurrealDonationRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> DonationRepository for SurrealDonationRepository<C> {
    async fn create(&self, input: CreateDonation) -> SponsoraResult<Donation> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        // Item statements bind their own numbered parameters so the
        // donation and every item land in one transaction.
        let mut query = String::from(
            "BEGIN TRANSACTION; \
             CREATE type::record('donation', $id) SET \
             user_id = $user_id, \
             is_anonymous = $is_anonymous, \
             anonymous_name = $anonymous_name, \
             anonymous_email = $anonymous_email, \
             kind = $kind, amount = $amount, status = $status, \
             campaign_id = $campaign_id, child_id = $child_id, \
             notes = $notes; ",
        );
        if input.campaign_id.is_some() {
            query.push_str(&format!(
                "LET $campaign = type::record('donation_campaign', $campaign_id); \
                 IF record::exists($campaign) = false {{ THROW '{CAMPAIGN_GONE}'; }}; "
            ));
        }
        for i in 0..input.items.len() {
            query.push_str(&format!(
                "CREATE type::record('donated_item', $item_id_{i}) SET \
                 donation_id = $id, position = {i}, \
                 name = $item_name_{i}, quantity = $item_quantity_{i}, \
                 estimated_value = $item_value_{i}, in_inventory = false; "
            ));
        }
        query.push_str("COMMIT TRANSACTION;");

        let mut builder = self
            .db
            .query(query)
            .bind(("id", id_str.clone()))
            .bind(("user_id", input.user_id.map(|u| u.to_string())))
            .bind(("is_anonymous", input.is_anonymous))
            .bind(("anonymous_name", input.anonymous_name))
            .bind(("anonymous_email", input.anonymous_email))
            .bind(("kind", kind_to_string(input.kind).to_string()))
            .bind(("amount", input.amount))
            .bind(("status", status_to_string(input.status).to_string()))
            .bind(("campaign_id", input.campaign_id.map(|c| c.to_string())))
            .bind(("child_id", input.child_id.map(|c| c.to_string())))
            .bind(("notes", input.notes));

        for (i, item) in input.items.into_iter().enumerate() {
            builder = builder
                .bind((format!("item_id_{i}"), Uuid::new_v4().to_string()))
                .bind((format!("item_name_{i}"), item.name.trim().to_string()))
                .bind((format!("item_quantity_{i}"), item.quantity))
                .bind((format!("item_value_{i}"), item.estimated_value));
        }

        let campaign_id = input.campaign_id;
        builder
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| {
                let reason = e.to_string();
                match campaign_id {
                    Some(campaign_id) if reason.contains(CAMPAIGN_GONE) => DbError::Conflict {
                        entity: "donation_campaign".into(),
                        id: campaign_id.to_string(),
                        reason,
                    },
                    _ => DbError::Query(reason),
                }
            })?;

        debug!(donation_id = %id, "Donation row written");

        self.get_by_id(id).await
    }

    async fn get_by_id(&self, id: Uuid) -> SponsoraResult<Donation> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('donation', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<DonationRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "donation".into(),
            id: id_str,
        })?;

        Ok(row.into_donation(id)?)
    }

    async fn update_status(
        &self,
        id: Uuid,
        from: DonationStatus,
        to: DonationStatus,
    ) -> SponsoraResult<Donation> {
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "UPDATE type::record('donation', $id) SET \
                 status = $to, updated_at = time::now() \
                 WHERE status = $from",
            )
            .bind(("id", id_str.clone()))
            .bind(("from", status_to_string(from).to_string()))
            .bind(("to", status_to_string(to).to_string()))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<DonationRow> = result.take(0).map_err(DbError::from)?;
        match rows.into_iter().next() {
            Some(row) => Ok(row.into_donation(id)?),
            None => {
                // Either the donation is gone or someone else moved it.
                self.get_by_id(id).await?;
                Err(DbError::Conflict {
                    entity: "donation".into(),
                    id: id_str,
                    reason: format!("status is no longer {from}"),
                }
                .into())
            }
        }
    }

    async fn delete(&self, id: Uuid) -> SponsoraResult<()> {
        self.db
            .query(
                "BEGIN TRANSACTION; \
                 DELETE donated_item WHERE donation_id = $id; \
                 DELETE type::record('donation', $id); \
                 COMMIT TRANSACTION;",
            )
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        Ok(())
    }

    async fn list_by_campaign(
        &self,
        campaign_id: Uuid,
        pagination: Pagination,
    ) -> SponsoraResult<PaginatedResult<Donation>> {
        let campaign_id_str = campaign_id.to_string();
        let total = self.count_by_campaign(campaign_id).await?;

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM donation \
                 WHERE campaign_id = $campaign_id \
                 ORDER BY created_at ASC \
                 LIMIT $limit START $offset",
            )
            .bind(("campaign_id", campaign_id_str))
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<DonationRowWithId> = result.take(0).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(|row| row.try_into_donation())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }

    async fn count_by_campaign(&self, campaign_id: Uuid) -> SponsoraResult<u64> {
        let mut result = self
            .db
            .query(
                "SELECT count() AS total FROM donation \
                 WHERE campaign_id = $campaign_id GROUP ALL",
            )
            .bind(("campaign_id", campaign_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.first().map(|r| r.total).unwrap_or(0))
    }

    async fn received_money_total(&self, campaign_id: Uuid) -> SponsoraResult<i64> {
        let mut result = self
            .db
            .query(
                "SELECT math::sum(amount) AS total FROM donation \
                 WHERE campaign_id = $campaign_id \
                 AND kind = 'Money' AND status = 'Received' \
                 GROUP ALL",
            )
            .bind(("campaign_id", campaign_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<TotalRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.first().map(|r| r.total).unwrap_or(0))
    }

    async fn list_items(&self, donation_id: Uuid) -> SponsoraResult<Vec<DonatedItem>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM donated_item \
                 WHERE donation_id = $donation_id \
                 ORDER BY position ASC",
            )
            .bind(("donation_id", donation_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<DonatedItemRowWithId> = result.take(0).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(|row| row.try_into_item())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(items)
    }
}
