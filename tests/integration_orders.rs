#![allow(clippy::unwrap_used, clippy::panic, clippy::todo, clippy::missing_panics_doc, clippy::must_use_candidate, missing_debug_implementations, clippy::cast_precision_loss, clippy::clone_on_ref_ptr, clippy::match_same_arms, clippy::items_after_statements, unreachable_pub, clippy::print_stdout, clippy::similar_names)]
use reqwest::StatusCode;
use serde_json::{Value, json};
mod common;

struct Catalogue {
    token: String,
    user_id: String,
    supplier_id: String,
    medication_id: String,
}

async fn setup(app: &common::TestApp) -> Catalogue {
    let session = app.session(common::ADMIN_EMAIL, common::ADMIN_PASSWORD).await;
    let token = session["accessToken"].as_str().unwrap().to_string();
    let user_id = session["user"]["id"].as_str().unwrap().to_string();

    let supplier: Value = app
        .post("/suppliers", &token, &json!({ "name": "MedSupply", "phone": "555-0100", "email": "sales@medsupply.test" }))
        .await
        .json()
        .await
        .unwrap();
    let medication: Value = app
        .post("/medications", &token, &common::medication_body("Amoxil", 20, 5, "2026-01-01"))
        .await
        .json()
        .await
        .unwrap();

    Catalogue {
        token,
        user_id,
        supplier_id: supplier["id"].as_str().unwrap().to_string(),
        medication_id: medication["id"].as_str().unwrap().to_string(),
    }
}

fn order_body(c: &Catalogue, number: &str) -> Value {
    json!({
        "orderNumber": number,
        "supplierId": c.supplier_id,
        "expectedDelivery": "2025-06-15",
        "items": [
            { "medicationId": c.medication_id, "quantity": 10, "unitPrice": 2.5, "amount": 999 },
            { "medicationId": c.medication_id, "quantity": 4, "unitPrice": 1.25 }
        ]
    })
}

#[tokio::test]
async fn test_supplier_crud() {
    let app = common::TestApp::spawn().await;
    let c = setup(&app).await;
    let path = format!("/suppliers/{}", c.supplier_id);

    let fetched: Value = app.get(&path, &c.token).await.json().await.unwrap();
    assert_eq!(fetched["name"], "MedSupply");
    assert!(fetched["createdAt"].is_string());

    let updated = app.put(&path, &c.token, &json!({ "name": "MedSupply Ltd", "phone": "555-0101" })).await;
    assert_eq!(updated.status(), StatusCode::OK);
    let updated: Value = updated.json().await.unwrap();
    assert_eq!(updated["name"], "MedSupply Ltd");
    assert!(updated.get("email").is_none());

    let invalid = app.post("/suppliers", &c.token, &json!({ "name": "No phone", "phone": " " })).await;
    assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);

    assert_eq!(app.delete(&path, &c.token).await.status(), StatusCode::OK);
    assert_eq!(app.get(&path, &c.token).await.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_order_totals_are_computed_by_server() {
    let app = common::TestApp::spawn().await;
    let c = setup(&app).await;

    let resp = app.post("/orders", &c.token, &order_body(&c, "PO-1001")).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let order: Value = resp.json().await.unwrap();

    assert_eq!(order["status"], "PENDING");
    assert_eq!(order["userId"], c.user_id.as_str());
    assert_eq!(order["items"][0]["amount"], 25.0);
    assert_eq!(order["items"][1]["amount"], 5.0);
    assert_eq!(order["totalAmount"], 30.0);

    let listed: Vec<Value> = app.get("/orders", &c.token).await.json().await.unwrap();
    assert_eq!(listed.len(), 1);
}

#[tokio::test]
async fn test_order_validation() {
    let app = common::TestApp::spawn().await;
    let c = setup(&app).await;

    app.post("/orders", &c.token, &order_body(&c, "PO-1")).await;
    let dup = app.post("/orders", &c.token, &order_body(&c, "PO-1")).await;
    assert_eq!(dup.status(), StatusCode::CONFLICT);

    let mut unknown_supplier = order_body(&c, "PO-2");
    unknown_supplier["supplierId"] = json!(uuid::Uuid::new_v4());
    assert_eq!(app.post("/orders", &c.token, &unknown_supplier).await.status(), StatusCode::BAD_REQUEST);

    let mut zero_quantity = order_body(&c, "PO-3");
    zero_quantity["items"][0]["quantity"] = json!(0);
    assert_eq!(app.post("/orders", &c.token, &zero_quantity).await.status(), StatusCode::BAD_REQUEST);

    let mut bad_status = order_body(&c, "PO-4");
    bad_status["status"] = json!("LOST");
    assert_eq!(app.post("/orders", &c.token, &bad_status).await.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_order_status_transitions() {
    let app = common::TestApp::spawn().await;
    let c = setup(&app).await;
    let order: Value = app.post("/orders", &c.token, &order_body(&c, "PO-9")).await.json().await.unwrap();
    let path = format!("/orders/{}/status", order["id"].as_str().unwrap());

    let shipped = app.client.patch(app.url(&path)).header("x-auth-token", &c.token).json(&json!({ "status": "SHIPPED" })).send().await.unwrap();
    assert_eq!(shipped.status(), StatusCode::OK);
    let shipped: Value = shipped.json().await.unwrap();
    assert!(shipped.get("actualDelivery").is_none());

    let delivered: Value = app
        .client
        .patch(app.url(&path))
        .header("x-auth-token", &c.token)
        .json(&json!({ "status": "DELIVERED" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(delivered["status"], "DELIVERED");
    assert_eq!(delivered["actualDelivery"], "2025-06-01T12:00:00Z");
}

#[tokio::test]
async fn test_transactions() {
    let app = common::TestApp::spawn().await;
    let c = setup(&app).await;

    let resp = app
        .post(
            "/transactions",
            &c.token,
            &json!({
                "type": "SALE",
                "items": [{ "medicationId": c.medication_id, "quantity": 3, "unitPrice": 9.5 }],
                "notes": "walk-in"
            }),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let sale: Value = resp.json().await.unwrap();
    assert_eq!(sale["type"], "SALE");
    assert_eq!(sale["totalAmount"], 28.5);
    assert_eq!(sale["userId"], c.user_id.as_str());
    assert_eq!(sale["date"], "2025-06-01T12:00:00Z");

    let path = format!("/transactions/{}", sale["id"].as_str().unwrap());
    let fetched: Value = app.get(&path, &c.token).await.json().await.unwrap();
    assert_eq!(fetched["id"], sale["id"]);

    let bad_type = app
        .post(
            "/transactions",
            &c.token,
            &json!({ "type": "GIFT", "items": [{ "medicationId": c.medication_id, "quantity": 1, "unitPrice": 1.0 }] }),
        )
        .await;
    assert_eq!(bad_type.status(), StatusCode::BAD_REQUEST);

    assert_eq!(app.delete(&path, &c.token).await.status(), StatusCode::OK);
    assert_eq!(app.delete(&path, &c.token).await.status(), StatusCode::NOT_FOUND);
}
