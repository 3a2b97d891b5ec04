//! Budget category database operations
//!
//! Categories group items for monthly budget rollups; the spend figure is a
//! plain sum over item prices joined through their receipts.

use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::error::Result;

/// Category with its rolled-up spend
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CategorySummary {
    pub id: i64,
    pub name: String,
    pub monthly_goal: Option<f64>,
    pub spend: f64,
}

/// Category creation request
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCategory {
    pub name: String,
    pub monthly_goal: Option<f64>,
}

/// Category edit request
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateCategory {
    pub name: Option<String>,
    pub monthly_goal: Option<f64>,
}

/// Category repository
pub struct CategoryRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> CategoryRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// List an owner's categories with spend, optionally restricted to one
    /// month (receipt dates are MM-DD-YYYY).
    pub async fn list(
        &self,
        owner_id: i64,
        year: Option<i32>,
        month: Option<u32>,
    ) -> Result<Vec<CategorySummary>> {
        let month_filter = month.map(|m| format!("{:02}", m));
        let year_filter = year.map(|y| format!("{:04}", y));

        let summaries = sqlx::query_as::<_, CategorySummary>(
            r#"
            SELECT c.id, c.name, c.monthly_goal,
                   COALESCE(SUM(CASE WHEN r.id IS NOT NULL THEN i.price ELSE 0.0 END), 0.0) AS spend
            FROM categories c
            LEFT JOIN receipt_items i ON i.category_id = c.id
            LEFT JOIN receipts r ON r.id = i.receipt_id
                AND (? IS NULL OR substr(r.date, 1, 2) = ?)
                AND (? IS NULL OR substr(r.date, 7, 4) = ?)
            WHERE c.owner_id = ?
            GROUP BY c.id
            ORDER BY c.name ASC
            "#,
        )
        .bind(&month_filter)
        .bind(&month_filter)
        .bind(&year_filter)
        .bind(&year_filter)
        .bind(owner_id)
        .fetch_all(self.pool)
        .await?;

        Ok(summaries)
    }

    /// Create a category
    pub async fn create(&self, owner_id: i64, data: &CreateCategory) -> Result<i64> {
        let result = sqlx::query(
            "INSERT INTO categories (owner_id, name, monthly_goal) VALUES (?, ?, ?)",
        )
        .bind(owner_id)
        .bind(&data.name)
        .bind(data.monthly_goal)
        .execute(self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Rename or re-budget a category
    pub async fn update(
        &self,
        id: i64,
        owner_id: i64,
        data: &UpdateCategory,
    ) -> Result<bool> {
        let mut set_clauses: Vec<&str> = Vec::new();

        if data.name.is_some() {
            set_clauses.push("name = ?");
        }
        if data.monthly_goal.is_some() {
            set_clauses.push("monthly_goal = ?");
        }

        if set_clauses.is_empty() {
            return Ok(self.exists(id, owner_id).await?);
        }

        let query = format!(
            "UPDATE categories SET {} WHERE id = ? AND owner_id = ?",
            set_clauses.join(", ")
        );

        let mut sql_query = sqlx::query(&query);
        if let Some(ref name) = data.name {
            sql_query = sql_query.bind(name);
        }
        if let Some(goal) = data.monthly_goal {
            sql_query = sql_query.bind(goal);
        }
        sql_query = sql_query.bind(id).bind(owner_id);

        let result = sql_query.execute(self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete a category; items referencing it fall back to uncategorized
    pub async fn delete(&self, id: i64, owner_id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM categories WHERE id = ? AND owner_id = ?")
            .bind(id)
            .bind(owner_id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn exists(&self, id: i64, owner_id: i64) -> Result<bool> {
        let row: Option<(i64,)> =
            sqlx::query_as("SELECT id FROM categories WHERE id = ? AND owner_id = ?")
                .bind(id)
                .bind(owner_id)
                .fetch_optional(self.pool)
                .await?;
        Ok(row.is_some())
    }
}
