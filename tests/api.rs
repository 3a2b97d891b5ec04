//! End-to-end API tests
//!
//! Exercises the HTTP surface with doubles for the OCR engine and the
//! extraction service, a temp-file SQLite database, and in-memory scan
//! storage.

use std::sync::Arc;

use async_trait::async_trait;
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::routing::get;
use axum::Router;
use axum_test::TestServer;
use serde_json::Value;

use receipt_server::config::Config;
use receipt_server::db::{self, UserRepository};
use receipt_server::extraction::{ExtractionClient, ExtractionError, RawDraft};
use receipt_server::ocr::{OcrEngine, OcrError, OcrToken};
use receipt_server::routes;
use receipt_server::state::AppState;
use receipt_server::storage::ScanStore;

struct FixedOcr {
    tokens: Vec<OcrToken>,
}

#[async_trait]
impl OcrEngine for FixedOcr {
    async fn is_available(&self) -> bool {
        true
    }

    async fn scan(&self, _image_data: &[u8]) -> Result<Vec<OcrToken>, OcrError> {
        Ok(self.tokens.clone())
    }
}

struct FixedExtractor {
    payload: String,
}

#[async_trait]
impl ExtractionClient for FixedExtractor {
    async fn extract(&self, _numbered_lines: &str) -> Result<RawDraft, ExtractionError> {
        RawDraft::from_json(&self.payload)
    }
}

fn token(text: &str, left: i64, top: i64, width: i64, height: i64, line: usize) -> OcrToken {
    OcrToken {
        text: text.to_string(),
        left,
        top,
        width,
        height,
        line_index: line,
    }
}

fn cafe_tokens() -> Vec<OcrToken> {
    vec![
        token("Coffee", 10, 100, 60, 12, 0),
        token("2.50", 200, 100, 30, 12, 0),
        token("Bagel", 10, 120, 50, 12, 1),
        token("1.75", 200, 120, 30, 12, 1),
    ]
}

const CAFE_PAYLOAD: &str = r#"{
    "name": "Corner Cafe",
    "date": "03-14-2025",
    "merchant_address": "12 Main St",
    "merchant_website": "cornercafe.com",
    "payment_method": "VISA 1234",
    "items": [
        {"description": "Coffee", "cost": 2.50, "line_number": 0},
        {"description": "Bagel", "cost": 1.75, "line_number": 1}
    ],
    "subtotal": 4.25,
    "total": 4.25
}"#;

fn test_jpeg() -> Vec<u8> {
    let img = image::RgbImage::from_fn(400, 300, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });
    let mut buffer = Vec::new();
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut std::io::Cursor::new(&mut buffer), image::ImageFormat::Jpeg)
        .unwrap();
    buffer
}

struct TestApp {
    server: TestServer,
    session: String,
    _db_dir: tempfile::TempDir,
}

async fn spawn_app(tokens: Vec<OcrToken>, payload: &str) -> TestApp {
    let db_dir = tempfile::tempdir().unwrap();
    let db_url = format!("sqlite:{}", db_dir.path().join("test.db").display());
    let pool = db::create_pool(&db_url).await.unwrap();

    let session = UserRepository::new(&pool)
        .login("scanner@example.com", "Scanner")
        .await
        .unwrap();

    let state = AppState::new(
        Config::default(),
        pool,
        ScanStore::in_memory(),
        Arc::new(FixedOcr { tokens }),
        Arc::new(FixedExtractor {
            payload: payload.to_string(),
        }),
    );

    let app = Router::new()
        .route("/health", get(|| async { "ok" }))
        .nest(
            "/receipts",
            routes::receipts::router().merge(routes::items::router()),
        )
        .nest("/categories", routes::categories::router())
        .with_state(state);

    TestApp {
        server: TestServer::new(app).unwrap(),
        session,
        _db_dir: db_dir,
    }
}

fn auth_header(session: &str) -> (HeaderName, HeaderValue) {
    (
        HeaderName::from_static("authorization"),
        HeaderValue::from_str(session).unwrap(),
    )
}

#[tokio::test]
async fn receipts_require_a_session() {
    let app = spawn_app(cafe_tokens(), CAFE_PAYLOAD).await;

    let response = app.server.get("/receipts").await;
    response.assert_status(StatusCode::UNAUTHORIZED);

    let (name, _) = auth_header(&app.session);
    let response = app
        .server
        .get("/receipts")
        .add_header(name, HeaderValue::from_static("stale-token"))
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn scan_ingests_lists_and_serves_crops() {
    let app = spawn_app(cafe_tokens(), CAFE_PAYLOAD).await;
    let (name, value) = auth_header(&app.session);

    // Ingest
    let response = app
        .server
        .post("/receipts/auto")
        .add_header(name.clone(), value.clone())
        .bytes(test_jpeg().into())
        .await;
    response.assert_status_ok();
    let scan: Value = response.json();
    assert_eq!(scan["success"], Value::Bool(true));
    let receipt_id = scan["receipt_id"].as_i64().unwrap();

    // List
    let response = app
        .server
        .get("/receipts")
        .add_header(name.clone(), value.clone())
        .await;
    response.assert_status_ok();
    let list: Value = response.json();
    assert_eq!(list["receipts"].as_array().unwrap().len(), 1);
    assert_eq!(list["receipts"][0]["merchant"], "Corner Cafe");
    assert_eq!(list["receipts"][0]["clean"], Value::Bool(true));

    // Details
    let response = app
        .server
        .get(&format!("/receipts/{}", receipt_id))
        .add_header(name.clone(), value.clone())
        .await;
    response.assert_status_ok();
    let details: Value = response.json();
    assert_eq!(details["merchant"]["name"], "Corner Cafe");
    assert_eq!(details["tax"], 0.0);
    let items = details["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["auto"], Value::Bool(true));

    // Item crop
    let item_id = items[0]["id"].as_i64().unwrap();
    let response = app
        .server
        .get(&format!("/receipts/{}/items/{}/scan.png", receipt_id, item_id))
        .add_header(name.clone(), value.clone())
        .await;
    response.assert_status_ok();
    let cropped = image::load_from_memory(&response.as_bytes()).unwrap();
    assert_eq!(cropped.width(), 220); // union of "Coffee" and "2.50" boxes
    assert_eq!(cropped.height(), 12);

    // Full scan
    let response = app
        .server
        .get(&format!("/receipts/{}/scan.png", receipt_id))
        .add_header(name, value)
        .await;
    response.assert_status_ok();
}

#[tokio::test]
async fn shape_failure_reports_unsuccessful_scan() {
    // Extraction result missing `total`
    let payload = r#"{
        "name": "Corner Cafe", "date": "03-14-2025",
        "items": [{"description": "Coffee", "cost": 2.50, "line_number": 0}],
        "subtotal": 2.50
    }"#;
    let app = spawn_app(cafe_tokens(), payload).await;
    let (name, value) = auth_header(&app.session);

    let response = app
        .server
        .post("/receipts/auto")
        .add_header(name.clone(), value.clone())
        .bytes(test_jpeg().into())
        .await;
    response.assert_status_ok();
    let scan: Value = response.json();
    assert_eq!(scan["success"], Value::Bool(false));
    assert!(scan.get("receipt_id").is_none());

    let response = app
        .server
        .get("/receipts")
        .add_header(name, value)
        .await;
    let list: Value = response.json();
    assert!(list["receipts"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn edited_item_loses_its_crop() {
    let app = spawn_app(cafe_tokens(), CAFE_PAYLOAD).await;
    let (name, value) = auth_header(&app.session);

    let response = app
        .server
        .post("/receipts/auto")
        .add_header(name.clone(), value.clone())
        .bytes(test_jpeg().into())
        .await;
    let scan: Value = response.json();
    let receipt_id = scan["receipt_id"].as_i64().unwrap();

    let response = app
        .server
        .get(&format!("/receipts/{}", receipt_id))
        .add_header(name.clone(), value.clone())
        .await;
    let details: Value = response.json();
    let item_id = details["items"][0]["id"].as_i64().unwrap();

    // Edit the price
    let response = app
        .server
        .patch(&format!("/receipts/{}/items/{}", receipt_id, item_id))
        .add_header(name.clone(), value.clone())
        .json(&serde_json::json!({ "price": 2.75 }))
        .await;
    response.assert_status_ok();
    let edited: Value = response.json();
    assert_eq!(edited["auto"], Value::Bool(false));

    // The crop is gone
    let response = app
        .server
        .get(&format!("/receipts/{}/items/{}/scan.png", receipt_id, item_id))
        .add_header(name, value)
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn receipt_date_corrections_must_be_well_formed() {
    let app = spawn_app(cafe_tokens(), CAFE_PAYLOAD).await;
    let (name, value) = auth_header(&app.session);

    let response = app
        .server
        .post("/receipts/auto")
        .add_header(name.clone(), value.clone())
        .bytes(test_jpeg().into())
        .await;
    let scan: Value = response.json();
    let receipt_id = scan["receipt_id"].as_i64().unwrap();

    let response = app
        .server
        .patch(&format!("/receipts/{}", receipt_id))
        .add_header(name.clone(), value.clone())
        .json(&serde_json::json!({ "date": "March 15th" }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let response = app
        .server
        .patch(&format!("/receipts/{}", receipt_id))
        .add_header(name.clone(), value.clone())
        .json(&serde_json::json!({ "date": "03-15-2025" }))
        .await;
    response.assert_status_ok();
    let details: Value = response.json();
    assert_eq!(details["date"], "03-15-2025");

    // The rejected value was never stored.
    let response = app
        .server
        .get(&format!("/receipts/{}", receipt_id))
        .add_header(name, value)
        .await;
    let details: Value = response.json();
    assert_eq!(details["date"], "03-15-2025");
}

#[tokio::test]
async fn deleting_a_receipt_removes_it() {
    let app = spawn_app(cafe_tokens(), CAFE_PAYLOAD).await;
    let (name, value) = auth_header(&app.session);

    let response = app
        .server
        .post("/receipts/auto")
        .add_header(name.clone(), value.clone())
        .bytes(test_jpeg().into())
        .await;
    let scan: Value = response.json();
    let receipt_id = scan["receipt_id"].as_i64().unwrap();

    let response = app
        .server
        .delete(&format!("/receipts/{}", receipt_id))
        .add_header(name.clone(), value.clone())
        .await;
    response.assert_status(StatusCode::NO_CONTENT);

    let response = app
        .server
        .get(&format!("/receipts/{}", receipt_id))
        .add_header(name, value)
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
}
