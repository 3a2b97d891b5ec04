//! Receipt database operations

use serde::Deserialize;
use sqlx::SqlitePool;

use crate::error::Result;
use crate::ocr::BoundingBox;

/// Receipt record
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Receipt {
    pub id: i64,
    pub owner_id: i64,
    pub date: String,
    pub merchant_name: String,
    pub merchant_address: String,
    pub merchant_domain: String,
    pub payment_method: String,
    pub tax: f64,
    pub clean: bool,
}

/// Fields for a new receipt row
#[derive(Debug, Clone)]
pub struct NewReceipt {
    pub owner_id: i64,
    pub date: String,
    pub merchant_name: String,
    pub merchant_address: String,
    pub merchant_domain: String,
    pub payment_method: String,
    pub tax: f64,
    pub clean: bool,
}

/// An OCR-derived item ready for insertion, bbox included
#[derive(Debug, Clone)]
pub struct AutoItem {
    pub description: String,
    pub price: f64,
    pub bounds: BoundingBox,
}

/// One row of the receipt list view
#[derive(Debug, Clone, serde::Serialize, sqlx::FromRow)]
pub struct ReceiptPreview {
    pub id: i64,
    pub date: String,
    pub merchant: String,
    pub total: f64,
    pub clean: bool,
}

/// Merchant/date correction request
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateReceipt {
    pub merchant_name: Option<String>,
    pub date: Option<String>,
}

/// Receipt repository
pub struct ReceiptRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ReceiptRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a receipt and its auto items atomically.
    ///
    /// Items land in the given order. If any insert fails the whole
    /// transaction rolls back and no receipt row remains.
    pub async fn create_ingested(
        &self,
        receipt: &NewReceipt,
        items: &[AutoItem],
    ) -> Result<i64> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            INSERT INTO receipts
                (owner_id, date, merchant_name, merchant_address,
                 merchant_domain, payment_method, tax, clean)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(receipt.owner_id)
        .bind(&receipt.date)
        .bind(&receipt.merchant_name)
        .bind(&receipt.merchant_address)
        .bind(&receipt.merchant_domain)
        .bind(&receipt.payment_method)
        .bind(receipt.tax)
        .bind(receipt.clean)
        .execute(&mut *tx)
        .await?;

        let receipt_id = result.last_insert_rowid();

        for item in items {
            sqlx::query(
                r#"
                INSERT INTO receipt_items
                    (receipt_id, description, price,
                     bound_left, bound_top, bound_right, bound_bottom)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(receipt_id)
            .bind(&item.description)
            .bind(item.price)
            .bind(item.bounds.left)
            .bind(item.bounds.top)
            .bind(item.bounds.right)
            .bind(item.bounds.bottom)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(receipt_id)
    }

    /// List an owner's receipts, newest first, with the item sum + tax total
    pub async fn list(&self, owner_id: i64) -> Result<Vec<ReceiptPreview>> {
        let previews = sqlx::query_as::<_, ReceiptPreview>(
            r#"
            SELECT r.id, r.date, r.merchant_name AS merchant,
                   COALESCE(SUM(i.price), 0) + r.tax AS total, r.clean
            FROM receipts r
            LEFT JOIN receipt_items i ON i.receipt_id = r.id
            WHERE r.owner_id = ?
            GROUP BY r.id
            ORDER BY r.id DESC
            "#,
        )
        .bind(owner_id)
        .fetch_all(self.pool)
        .await?;

        Ok(previews)
    }

    /// Get a receipt owned by the given user
    pub async fn get(&self, id: i64, owner_id: i64) -> Result<Option<Receipt>> {
        let receipt = sqlx::query_as::<_, Receipt>(
            r#"
            SELECT id, owner_id, date, merchant_name, merchant_address,
                   merchant_domain, payment_method, tax, clean
            FROM receipts
            WHERE id = ? AND owner_id = ?
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(receipt)
    }

    /// Correct merchant name and/or date
    pub async fn update(
        &self,
        id: i64,
        owner_id: i64,
        data: &UpdateReceipt,
    ) -> Result<Option<Receipt>> {
        let mut set_clauses: Vec<&str> = Vec::new();
        let mut binds: Vec<String> = Vec::new();

        if let Some(ref merchant_name) = data.merchant_name {
            set_clauses.push("merchant_name = ?");
            binds.push(merchant_name.clone());
        }

        if let Some(ref date) = data.date {
            set_clauses.push("date = ?");
            binds.push(date.clone());
        }

        if !set_clauses.is_empty() {
            let query = format!(
                "UPDATE receipts SET {} WHERE id = ? AND owner_id = ?",
                set_clauses.join(", ")
            );

            let mut sql_query = sqlx::query(&query);
            for bind in binds {
                sql_query = sql_query.bind(bind);
            }
            sql_query = sql_query.bind(id).bind(owner_id);

            sql_query.execute(self.pool).await?;
        }

        self.get(id, owner_id).await
    }

    /// Delete a receipt; items cascade
    pub async fn delete(&self, id: i64, owner_id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM receipts WHERE id = ? AND owner_id = ?")
            .bind(id)
            .bind(owner_id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{test_pool, ItemRepository, UserRepository};

    async fn seed_user(pool: &SqlitePool) -> i64 {
        let repo = UserRepository::new(pool);
        let token = repo.login("owner@example.com", "Owner").await.unwrap();
        repo.find_by_session(&token).await.unwrap().unwrap().id
    }

    fn new_receipt(owner_id: i64) -> NewReceipt {
        NewReceipt {
            owner_id,
            date: "03-14-2025".into(),
            merchant_name: "Corner Cafe".into(),
            merchant_address: "12 Main St".into(),
            merchant_domain: "cornercafe.com".into(),
            payment_method: "VISA 1234".into(),
            tax: 0.38,
            clean: true,
        }
    }

    fn auto_item(description: &str, price: f64) -> AutoItem {
        AutoItem {
            description: description.into(),
            price,
            bounds: BoundingBox {
                left: 10,
                top: 100,
                right: 230,
                bottom: 114,
            },
        }
    }

    #[tokio::test]
    async fn ingested_receipt_round_trips_with_items() {
        let pool = test_pool().await;
        let owner = seed_user(&pool).await;
        let repo = ReceiptRepository::new(&pool);

        let id = repo
            .create_ingested(
                &new_receipt(owner),
                &[auto_item("Coffee", 2.50), auto_item("Bagel", 1.75)],
            )
            .await
            .unwrap();

        let receipt = repo.get(id, owner).await.unwrap().unwrap();
        assert_eq!(receipt.merchant_name, "Corner Cafe");
        assert!(receipt.clean);

        let items = ItemRepository::new(&pool).list(id).await.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].description, "Coffee");
        assert_eq!(items[1].description, "Bagel");
        assert!(items.iter().all(|i| i.is_auto()));
    }

    #[tokio::test]
    async fn failed_item_insert_rolls_back_the_receipt() {
        let pool = test_pool().await;
        let owner = seed_user(&pool).await;
        let repo = ReceiptRepository::new(&pool);

        // Make the second item insert fail mid-transaction.
        sqlx::query(
            "CREATE TRIGGER reject_negative_prices BEFORE INSERT ON receipt_items \
             WHEN NEW.price < 0 BEGIN SELECT RAISE(ABORT, 'negative price'); END",
        )
        .execute(&pool)
        .await
        .unwrap();

        let result = repo
            .create_ingested(
                &new_receipt(owner),
                &[auto_item("Coffee", 2.50), auto_item("Refund", -1.00)],
            )
            .await;

        assert!(result.is_err());
        assert!(repo.list(owner).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn list_totals_sum_items_plus_tax() {
        let pool = test_pool().await;
        let owner = seed_user(&pool).await;
        let repo = ReceiptRepository::new(&pool);

        repo.create_ingested(
            &new_receipt(owner),
            &[auto_item("Coffee", 2.50), auto_item("Bagel", 1.75)],
        )
        .await
        .unwrap();

        let previews = repo.list(owner).await.unwrap();
        assert_eq!(previews.len(), 1);
        assert!((previews[0].total - 4.63).abs() < 1e-9);
    }

    #[tokio::test]
    async fn delete_cascades_items() {
        let pool = test_pool().await;
        let owner = seed_user(&pool).await;
        let repo = ReceiptRepository::new(&pool);

        let id = repo
            .create_ingested(&new_receipt(owner), &[auto_item("Coffee", 2.50)])
            .await
            .unwrap();

        assert!(repo.delete(id, owner).await.unwrap());
        assert!(ItemRepository::new(&pool).list(id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn foreign_owner_sees_nothing() {
        let pool = test_pool().await;
        let owner = seed_user(&pool).await;
        let repo = ReceiptRepository::new(&pool);

        let id = repo
            .create_ingested(&new_receipt(owner), &[])
            .await
            .unwrap();

        let stranger = owner + 1;
        assert!(repo.get(id, stranger).await.unwrap().is_none());
        assert!(!repo.delete(id, stranger).await.unwrap());
    }

    #[tokio::test]
    async fn update_corrects_merchant_and_date() {
        let pool = test_pool().await;
        let owner = seed_user(&pool).await;
        let repo = ReceiptRepository::new(&pool);

        let id = repo
            .create_ingested(&new_receipt(owner), &[])
            .await
            .unwrap();

        let updated = repo
            .update(
                id,
                owner,
                &UpdateReceipt {
                    merchant_name: Some("Corner Cafe LLC".into()),
                    date: None,
                },
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.merchant_name, "Corner Cafe LLC");
        assert_eq!(updated.date, "03-14-2025");
    }
}
