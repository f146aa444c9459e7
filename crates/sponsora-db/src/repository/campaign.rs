//! SurrealDB implementation of [`CampaignRepository`].

use chrono::{DateTime, Utc};
use sponsora_core::error::SponsoraResult;
use sponsora_core::models::campaign::{
    CreateDonationCampaign, DonationCampaign, UpdateDonationCampaign,
};
use sponsora_core::repository::{CampaignRepository, PaginatedResult, Pagination};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::{CountRow, parse_uuid};
use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct CampaignRow {
    title: String,
    description: Option<String>,
    target_amount: Option<i64>,
    is_completed: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct CampaignRowWithId {
    record_id: String,
    title: String,
    description: Option<String>,
    target_amount: Option<i64>,
    is_completed: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl CampaignRow {
    fn into_campaign(self, id: Uuid) -> DonationCampaign {
        DonationCampaign {
            id,
            title: self.title,
            description: self.description,
            target_amount: self.target_amount,
            is_completed: self.is_completed,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

impl CampaignRowWithId {
    fn try_into_campaign(self) -> Result<DonationCampaign, DbError> {
        Ok(DonationCampaign {
            id: parse_uuid(&self.record_id, "campaign")?,
            title: self.title,
            description: self.description,
            target_amount: self.target_amount,
            is_completed: self.is_completed,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// SurrealDB implementation of the Campaign repository.
pub struct SurrealCampaignRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> Clone for SurrealCampaignRepository<C> {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
        }
    }
}

impl<C: Connection> SurrealCampaignRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> CampaignRepository for SurrealCampaignRepository<C> {
    async fn create(&self, input: CreateDonationCampaign) -> SponsoraResult<DonationCampaign> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('donation_campaign', $id) SET \
                 title = $title, description = $description, \
                 target_amount = $target_amount, is_completed = false",
            )
            .bind(("id", id_str.clone()))
            .bind(("title", input.title))
            .bind(("description", input.description))
            .bind(("target_amount", input.target_amount))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<CampaignRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "donation_campaign".into(),
            id: id_str,
        })?;

        Ok(row.into_campaign(id))
    }

    async fn get_by_id(&self, id: Uuid) -> SponsoraResult<DonationCampaign> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('donation_campaign', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CampaignRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "donation_campaign".into(),
            id: id_str,
        })?;

        Ok(row.into_campaign(id))
    }

    async fn update(
        &self,
        id: Uuid,
        input: UpdateDonationCampaign,
    ) -> SponsoraResult<DonationCampaign> {
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.title.is_some() {
            sets.push("title = $title");
        }
        if input.description.is_some() {
            sets.push("description = $description");
        }
        if input.target_amount.is_some() {
            sets.push("target_amount = $target_amount");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('donation_campaign', $id) SET {}",
            sets.join(", ")
        );

        let mut builder = self.db.query(&query).bind(("id", id_str.clone()));

        if let Some(title) = input.title {
            builder = builder.bind(("title", title));
        }
        if let Some(description) = input.description {
            builder = builder.bind(("description", description));
        }
        if let Some(target_amount) = input.target_amount {
            builder = builder.bind(("target_amount", target_amount));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<CampaignRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "donation_campaign".into(),
            id: id_str,
        })?;

        Ok(row.into_campaign(id))
    }

    async fn delete(&self, id: Uuid) -> SponsoraResult<()> {
        let id_str = id.to_string();

        // The attribution check and the delete commit together, so a
        // donation recorded meanwhile aborts the delete.
        let response = self
            .db
            .query(
                "BEGIN TRANSACTION; \
                 LET $attributed = (SELECT VALUE id FROM donation \
                 WHERE campaign_id = $id LIMIT 1); \
                 IF array::len($attributed) > 0 { \
                 THROW 'donations are attributed to this campaign'; \
                 }; \
                 DELETE type::record('donation_campaign', $id); \
                 COMMIT TRANSACTION;",
            )
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        response.check().map_err(|e| DbError::Conflict {
            entity: "donation_campaign".into(),
            id: id_str,
            reason: e.to_string(),
        })?;

        Ok(())
    }

    async fn list(
        &self,
        pagination: Pagination,
    ) -> SponsoraResult<PaginatedResult<DonationCampaign>> {
        let mut count_result = self
            .db
            .query("SELECT count() AS total FROM donation_campaign GROUP ALL")
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM donation_campaign \
                 ORDER BY created_at ASC \
                 LIMIT $limit START $offset",
            )
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CampaignRowWithId> = result.take(0).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(|row| row.try_into_campaign())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }

    async fn set_completed(
        &self,
        id: Uuid,
        expected: bool,
        completed: bool,
    ) -> SponsoraResult<DonationCampaign> {
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "UPDATE type::record('donation_campaign', $id) SET \
                 is_completed = $completed, updated_at = time::now() \
                 WHERE is_completed = $expected",
            )
            .bind(("id", id_str.clone()))
            .bind(("expected", expected))
            .bind(("completed", completed))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<CampaignRow> = result.take(0).map_err(DbError::from)?;
        match rows.into_iter().next() {
            Some(row) => Ok(row.into_campaign(id)),
            None => {
                self.get_by_id(id).await?;
                Err(DbError::Conflict {
                    entity: "donation_campaign".into(),
                    id: id_str,
                    reason: format!("is_completed is no longer {expected}"),
                }
                .into())
            }
        }
    }
}
