//! Database schema initialization

use sqlx::SqlitePool;

use crate::error::Result;

/// Initialize the database schema
pub async fn initialize_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query(SCHEMA_SQL).execute(pool).await?;

    Ok(())
}

const SCHEMA_SQL: &str = r#"
-- Users table (session tokens issued on Google sign-in)
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    email TEXT NOT NULL UNIQUE,
    full_name TEXT NOT NULL,
    session_token TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_users_session_token ON users(session_token);

-- Receipts table
CREATE TABLE IF NOT EXISTS receipts (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    owner_id INTEGER NOT NULL REFERENCES users(id),
    -- MM-DD-YYYY, as reported by extraction
    date TEXT NOT NULL,
    merchant_name TEXT NOT NULL,
    merchant_address TEXT NOT NULL DEFAULT '',
    merchant_domain TEXT NOT NULL DEFAULT '',
    payment_method TEXT NOT NULL DEFAULT '',
    tax REAL NOT NULL DEFAULT 0,
    clean INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_receipts_owner_id ON receipts(owner_id);

-- Budget categories table
CREATE TABLE IF NOT EXISTS categories (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    owner_id INTEGER NOT NULL REFERENCES users(id),
    name TEXT NOT NULL,
    monthly_goal REAL
);

CREATE INDEX IF NOT EXISTS idx_categories_owner_id ON categories(owner_id);

-- Receipt items table
-- A present bounding box marks the item as OCR-derived ("auto").
CREATE TABLE IF NOT EXISTS receipt_items (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    receipt_id INTEGER NOT NULL REFERENCES receipts(id) ON DELETE CASCADE,
    description TEXT NOT NULL,
    price REAL NOT NULL,
    bound_left INTEGER,
    bound_top INTEGER,
    bound_right INTEGER,
    bound_bottom INTEGER,
    category_id INTEGER REFERENCES categories(id) ON DELETE SET NULL
);

CREATE INDEX IF NOT EXISTS idx_receipt_items_receipt_id ON receipt_items(receipt_id);
CREATE INDEX IF NOT EXISTS idx_receipt_items_category_id ON receipt_items(category_id);
"#;
