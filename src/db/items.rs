//! Receipt item database operations

use serde::Deserialize;
use sqlx::SqlitePool;

use crate::error::Result;
use crate::ocr::BoundingBox;

/// Receipt item record
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ReceiptItem {
    pub id: i64,
    pub receipt_id: i64,
    pub description: String,
    pub price: f64,
    pub bound_left: Option<i64>,
    pub bound_top: Option<i64>,
    pub bound_right: Option<i64>,
    pub bound_bottom: Option<i64>,
    pub category_id: Option<i64>,
}

impl ReceiptItem {
    /// An item is OCR-derived exactly when it carries a bounding box.
    pub fn is_auto(&self) -> bool {
        self.bounds().is_some()
    }

    /// Stored bounding box, present only on auto items
    pub fn bounds(&self) -> Option<BoundingBox> {
        match (
            self.bound_left,
            self.bound_top,
            self.bound_right,
            self.bound_bottom,
        ) {
            (Some(left), Some(top), Some(right), Some(bottom)) => Some(BoundingBox {
                left,
                top,
                right,
                bottom,
            }),
            _ => None,
        }
    }
}

/// Manual item creation request
#[derive(Debug, Clone, Deserialize)]
pub struct CreateItem {
    pub description: String,
    pub price: f64,
    pub category: Option<i64>,
}

/// Item edit request.
///
/// `category` distinguishes an absent field (keep the current category)
/// from an explicit `null` (clear it).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateItem {
    pub description: Option<String>,
    pub price: Option<f64>,
    #[serde(default, deserialize_with = "double_option")]
    pub category: Option<Option<i64>>,
}

fn double_option<'de, D>(deserializer: D) -> std::result::Result<Option<Option<i64>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<i64>::deserialize(deserializer).map(Some)
}

/// Receipt item repository
pub struct ItemRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ItemRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Get an item within a receipt
    pub async fn get(&self, id: i64, receipt_id: i64) -> Result<Option<ReceiptItem>> {
        let item = sqlx::query_as::<_, ReceiptItem>(
            r#"
            SELECT id, receipt_id, description, price,
                   bound_left, bound_top, bound_right, bound_bottom, category_id
            FROM receipt_items
            WHERE id = ? AND receipt_id = ?
            "#,
        )
        .bind(id)
        .bind(receipt_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(item)
    }

    /// List a receipt's items in insertion order
    pub async fn list(&self, receipt_id: i64) -> Result<Vec<ReceiptItem>> {
        let items = sqlx::query_as::<_, ReceiptItem>(
            r#"
            SELECT id, receipt_id, description, price,
                   bound_left, bound_top, bound_right, bound_bottom, category_id
            FROM receipt_items
            WHERE receipt_id = ?
            ORDER BY id ASC
            "#,
        )
        .bind(receipt_id)
        .fetch_all(self.pool)
        .await?;

        Ok(items)
    }

    /// Add a manually entered item. Manual items never carry a bounding box.
    pub async fn create(&self, receipt_id: i64, data: &CreateItem) -> Result<ReceiptItem> {
        let result = sqlx::query(
            r#"
            INSERT INTO receipt_items (receipt_id, description, price, category_id)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(receipt_id)
        .bind(&data.description)
        .bind(data.price)
        .bind(data.category)
        .execute(self.pool)
        .await?;

        self.get(result.last_insert_rowid(), receipt_id)
            .await?
            .ok_or_else(|| {
                crate::error::AppError::Internal("Failed to fetch created item".to_string())
            })
    }

    /// Edit an item.
    ///
    /// Any edit clears the bounding box: the stored crop no longer matches
    /// what the user typed, so the item stops being "auto".
    pub async fn update(
        &self,
        id: i64,
        receipt_id: i64,
        data: &UpdateItem,
    ) -> Result<Option<ReceiptItem>> {
        let Some(current) = self.get(id, receipt_id).await? else {
            return Ok(None);
        };

        let description = data.description.clone().unwrap_or(current.description);
        let price = data.price.unwrap_or(current.price);
        let category = match data.category {
            Some(category) => category,
            None => current.category_id,
        };

        sqlx::query(
            r#"
            UPDATE receipt_items
            SET description = ?, price = ?, category_id = ?,
                bound_left = NULL, bound_top = NULL,
                bound_right = NULL, bound_bottom = NULL
            WHERE id = ? AND receipt_id = ?
            "#,
        )
        .bind(&description)
        .bind(price)
        .bind(category)
        .bind(id)
        .bind(receipt_id)
        .execute(self.pool)
        .await?;

        self.get(id, receipt_id).await
    }

    /// Delete an item
    pub async fn delete(&self, id: i64, receipt_id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM receipt_items WHERE id = ? AND receipt_id = ?")
            .bind(id)
            .bind(receipt_id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
