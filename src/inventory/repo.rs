use serde::Serialize;
use sqlx::{FromRow, PgPool};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct InventoryItem {
    pub id: Uuid,
    pub user_id: Uuid,
    pub food_id: Option<Uuid>,
    pub item_name: String,
    pub quantity: f64,
    pub unit: String,
    pub purchase_date: Option<Date>,
    pub expiry_date: Option<Date>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewItem {
    pub user_id: Uuid,
    pub food_id: Option<Uuid>,
    pub item_name: String,
    pub quantity: f64,
    pub unit: String,
    pub purchase_date: Option<Date>,
    pub expiry_date: Option<Date>,
}

#[derive(Debug, Clone, Default)]
pub struct ItemPatch {
    pub food_id: Option<Uuid>,
    pub item_name: Option<String>,
    pub quantity: Option<f64>,
    pub unit: Option<String>,
    pub purchase_date: Option<Date>,
    pub expiry_date: Option<Date>,
}

const ITEM_COLUMNS: &str = "id, user_id, food_id, item_name, quantity, unit, purchase_date, \
                            expiry_date, created_at, updated_at";

pub async fn list_by_user(db: &PgPool, user_id: Uuid) -> sqlx::Result<Vec<InventoryItem>> {
    sqlx::query_as::<_, InventoryItem>(&format!(
        "SELECT {ITEM_COLUMNS} FROM inventory_items WHERE user_id = $1 ORDER BY item_name ASC"
    ))
    .bind(user_id)
    .fetch_all(db)
    .await
}

pub async fn insert(db: &PgPool, new: &NewItem) -> sqlx::Result<InventoryItem> {
    sqlx::query_as::<_, InventoryItem>(&format!(
        r#"
        INSERT INTO inventory_items (user_id, food_id, item_name, quantity, unit,
                                     purchase_date, expiry_date)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING {ITEM_COLUMNS}
        "#
    ))
    .bind(new.user_id)
    .bind(new.food_id)
    .bind(&new.item_name)
    .bind(new.quantity)
    .bind(&new.unit)
    .bind(new.purchase_date)
    .bind(new.expiry_date)
    .fetch_one(db)
    .await
}

/// Partial update scoped to the owning user; absent fields keep their stored
/// values. `None` means the item does not exist or belongs to someone else.
pub async fn update(
    db: &PgPool,
    user_id: Uuid,
    item_id: Uuid,
    patch: &ItemPatch,
) -> sqlx::Result<Option<InventoryItem>> {
    sqlx::query_as::<_, InventoryItem>(&format!(
        r#"
        UPDATE inventory_items SET
            food_id = COALESCE($3, food_id),
            item_name = COALESCE($4, item_name),
            quantity = COALESCE($5, quantity),
            unit = COALESCE($6, unit),
            purchase_date = COALESCE($7, purchase_date),
            expiry_date = COALESCE($8, expiry_date),
            updated_at = now()
        WHERE id = $1 AND user_id = $2
        RETURNING {ITEM_COLUMNS}
        "#
    ))
    .bind(item_id)
    .bind(user_id)
    .bind(patch.food_id)
    .bind(&patch.item_name)
    .bind(patch.quantity)
    .bind(&patch.unit)
    .bind(patch.purchase_date)
    .bind(patch.expiry_date)
    .fetch_optional(db)
    .await
}

pub async fn delete(db: &PgPool, user_id: Uuid, item_id: Uuid) -> sqlx::Result<bool> {
    let result = sqlx::query("DELETE FROM inventory_items WHERE id = $1 AND user_id = $2")
        .bind(item_id)
        .bind(user_id)
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Unique item names feeding the suggestion prompt.
pub async fn distinct_item_names(db: &PgPool, user_id: Uuid) -> sqlx::Result<Vec<String>> {
    sqlx::query_scalar::<_, String>(
        "SELECT DISTINCT item_name FROM inventory_items WHERE user_id = $1 ORDER BY item_name ASC",
    )
    .bind(user_id)
    .fetch_all(db)
    .await
}
