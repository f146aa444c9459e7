//! SurrealDB implementation of [`InventoryRepository`].
//!
//! Stock rows are keyed by the catalogue key of the item name, so every
//! write to one item's stock targets the same record. A stock change is
//! written as one transaction that
//!
//! 1. flags the donated item `in_inventory` (only if it was not yet),
//! 2. creates the stock row, or moves it from the expected level,
//! 3. appends the adjustment record.
//!
//! A `THROW` in any step cancels the transaction, leaving all three
//! untouched; the caller sees [`DbError::Conflict`].

use chrono::{DateTime, Utc};
use sponsora_core::error::{SponsoraError, SponsoraResult};
use sponsora_core::models::inventory::{
    AdjustmentType, InventoryAdjustment, InventoryStock, RecordAdjustment, catalogue_key,
};
use sponsora_core::repository::{InventoryRepository, PaginatedResult, Pagination};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::{CountRow, parse_opt_uuid, parse_uuid};
use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct StockRow {
    item_name: String,
    quantity: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct AdjustmentRowWithId {
    record_id: String,
    item_name: String,
    adjustment_type: String,
    quantity_before: i64,
    quantity_after: i64,
    quantity_change: i64,
    reason: String,
    source_donation_id: Option<String>,
    donated_item_id: Option<String>,
    actor_id: String,
    created_at: DateTime<Utc>,
}

fn parse_adjustment_type(s: &str) -> Result<AdjustmentType, DbError> {
    match s {
        "Increase" => Ok(AdjustmentType::Increase),
        "Decrease" => Ok(AdjustmentType::Decrease),
        "NewItem" => Ok(AdjustmentType::NewItem),
        other => Err(DbError::InvalidRow(format!(
            "unknown adjustment type: {other}"
        ))),
    }
}

fn adjustment_type_to_string(t: AdjustmentType) -> &'static str {
    match t {
        AdjustmentType::Increase => "Increase",
        AdjustmentType::Decrease => "Decrease",
        AdjustmentType::NewItem => "NewItem",
    }
}

impl StockRow {
    fn into_stock(self) -> InventoryStock {
        InventoryStock {
            item_name: self.item_name,
            quantity: self.quantity,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

impl AdjustmentRowWithId {
    fn try_into_adjustment(self) -> Result<InventoryAdjustment, DbError> {
        Ok(InventoryAdjustment {
            id: parse_uuid(&self.record_id, "adjustment")?,
            item_name: self.item_name,
            adjustment_type: parse_adjustment_type(&self.adjustment_type)?,
            quantity_before: self.quantity_before,
            quantity_after: self.quantity_after,
            quantity_change: self.quantity_change,
            reason: self.reason,
            source_donation_id: parse_opt_uuid(self.source_donation_id, "donation")?,
            donated_item_id: parse_opt_uuid(self.donated_item_id, "donated item")?,
            actor_id: parse_uuid(&self.actor_id, "actor")?,
            created_at: self.created_at,
        })
    }
}

/// Builds the transaction script for one stock change.
fn adjustment_script(flag_item: bool, adjustment_type: AdjustmentType) -> String {
    let mut script = String::from("BEGIN TRANSACTION; ");

    if flag_item {
        script.push_str(
            "LET $flagged = (UPDATE type::record('donated_item', $donated_item_id) SET \
             in_inventory = true, updated_at = time::now() \
             WHERE in_inventory = false); \
             IF array::len($flagged) = 0 { \
             THROW 'donated item is missing or already in inventory'; \
             }; ",
        );
    }

    match adjustment_type {
        AdjustmentType::NewItem => script.push_str(
            "CREATE type::record('inventory_stock', $item_key) SET \
             item_name = $item_name, quantity = $quantity_after; ",
        ),
        AdjustmentType::Increase | AdjustmentType::Decrease => script.push_str(
            "LET $moved = (UPDATE type::record('inventory_stock', $item_key) SET \
             quantity = $quantity_after, updated_at = time::now() \
             WHERE quantity = $quantity_before); \
             IF array::len($moved) = 0 { \
             THROW 'stock level changed concurrently'; \
             }; ",
        ),
    }

    script.push_str(
        "CREATE type::record('inventory_adjustment', $id) SET \
         item_key = $item_key, item_name = $item_name, \
         adjustment_type = $adjustment_type, \
         quantity_before = $quantity_before, \
         quantity_after = $quantity_after, \
         quantity_change = $quantity_change, \
         reason = $reason, \
         source_donation_id = $source_donation_id, \
         donated_item_id = $donated_item_id, \
         actor_id = $actor_id; \
         COMMIT TRANSACTION;",
    );

    script
}

/// SurrealDB implementation of the Inventory repository.
pub struct SurrealInventoryRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> Clone for SurrealInventoryRepository<C> {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
        }
    }
}

impl<C: Connection> SurrealInventoryRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn get_adjustment(&self, id: Uuid) -> SponsoraResult<InventoryAdjustment> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * \
                 FROM type::record('inventory_adjustment', $id)",
            )
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<AdjustmentRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "inventory_adjustment".into(),
            id: id_str,
        })?;

        Ok(row.try_into_adjustment()?)
    }
}

impl<C: Connection> InventoryRepository for SurrealInventoryRepository<C> {
    async fn get_stock(&self, item_name: &str) -> SponsoraResult<InventoryStock> {
        let key = catalogue_key(item_name);
        if key.is_empty() {
            return Err(SponsoraError::not_found("inventory_stock", item_name));
        }

        let mut result = self
            .db
            .query("SELECT * FROM type::record('inventory_stock', $key)")
            .bind(("key", key.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<StockRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "inventory_stock".into(),
            id: key,
        })?;

        Ok(row.into_stock())
    }

    async fn list_stock(
        &self,
        pagination: Pagination,
    ) -> SponsoraResult<PaginatedResult<InventoryStock>> {
        let mut count_result = self
            .db
            .query("SELECT count() AS total FROM inventory_stock GROUP ALL")
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut result = self
            .db
            .query(
                "SELECT * FROM inventory_stock \
                 ORDER BY item_name ASC \
                 LIMIT $limit START $offset",
            )
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<StockRow> = result.take(0).map_err(DbError::from)?;

        Ok(PaginatedResult {
            items: rows.into_iter().map(StockRow::into_stock).collect(),
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }

    async fn record_adjustment(
        &self,
        input: RecordAdjustment,
    ) -> SponsoraResult<InventoryAdjustment> {
        let quantity_after = input.check().map_err(SponsoraError::validation)?;

        let id = Uuid::new_v4();
        let item_key = catalogue_key(&input.item_name);
        let script = adjustment_script(input.donated_item_id.is_some(), input.adjustment_type);

        let response = self
            .db
            .query(script)
            .bind(("id", id.to_string()))
            .bind(("item_key", item_key.clone()))
            .bind(("item_name", input.item_name.trim().to_string()))
            .bind((
                "adjustment_type",
                adjustment_type_to_string(input.adjustment_type).to_string(),
            ))
            .bind(("quantity_before", input.quantity_before))
            .bind(("quantity_after", quantity_after))
            .bind(("quantity_change", input.quantity_change))
            .bind(("reason", input.reason))
            .bind((
                "source_donation_id",
                input.source_donation_id.map(|d| d.to_string()),
            ))
            .bind((
                "donated_item_id",
                input.donated_item_id.map(|d| d.to_string()),
            ))
            .bind(("actor_id", input.actor_id.to_string()))
            .await
            .map_err(DbError::from)?;

        response.check().map_err(|e| DbError::Conflict {
            entity: "inventory_stock".into(),
            id: item_key,
            reason: e.to_string(),
        })?;

        self.get_adjustment(id).await
    }

    async fn list_adjustments_for_donation(
        &self,
        donation_id: Uuid,
    ) -> SponsoraResult<Vec<InventoryAdjustment>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM inventory_adjustment \
                 WHERE source_donation_id = $donation_id \
                 ORDER BY created_at ASC",
            )
            .bind(("donation_id", donation_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<AdjustmentRowWithId> = result.take(0).map_err(DbError::from)?;
        let adjustments = rows
            .into_iter()
            .map(|row| row.try_into_adjustment())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(adjustments)
    }

    async fn list_adjustments_for_item(
        &self,
        item_name: &str,
    ) -> SponsoraResult<Vec<InventoryAdjustment>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM inventory_adjustment \
                 WHERE item_key = $item_key \
                 ORDER BY created_at ASC",
            )
            .bind(("item_key", catalogue_key(item_name)))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<AdjustmentRowWithId> = result.take(0).map_err(DbError::from)?;
        let adjustments = rows
            .into_iter()
            .map(|row| row.try_into_adjustment())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(adjustments)
    }
}
