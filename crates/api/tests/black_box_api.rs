use reqwest::StatusCode;
use serde_json::{Value, json};

use stockledger_infra::{ApprovalPolicy, LedgerConfig};

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn(config: LedgerConfig) -> Self {
        // Build app (same router as prod), but bind to an ephemeral port.
        let app = stockledger_api::app::build_app(config);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn put_product(client: &reqwest::Client, server: &TestServer, sku: &str, quantity: i64) {
    let resp = client
        .put(server.url(&format!("/products/{sku}")))
        .json(&json!({ "name": format!("Product {sku}"), "quantity": quantity, "unitCost": "12.50", "reorderLevel": 5 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

async fn quantity(client: &reqwest::Client, server: &TestServer, sku: &str) -> i64 {
    let body: Value = client
        .get(server.url(&format!("/products/{sku}")))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    body["quantity"].as_i64().unwrap()
}

#[tokio::test]
async fn health_is_ok() {
    let server = TestServer::spawn(LedgerConfig::default()).await;
    let resp = reqwest::get(server.url("/health")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn manual_policy_flow_over_the_wire() {
    let server = TestServer::spawn(LedgerConfig::default()).await;
    let client = reqwest::Client::new();
    put_product(&client, &server, "A", 20).await;
    put_product(&client, &server, "B", 4).await;

    let resp = client
        .post(server.url("/adjustments"))
        .json(&json!({
            "adjustmentType": "increase",
            "reason": "Supplier Bonus",
            "createdBy": "clerk",
            "items": [
                { "sku": "A", "quantity": 5 },
                { "sku": "B", "quantity": 3, "reason": "extra pallet" }
            ]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Value = resp.json().await.unwrap();
    assert_eq!(created["status"], "pending");
    assert_eq!(created["totalQuantity"], 8);
    assert_eq!(created["totalValue"], "100.00");
    let id = created["id"].as_str().unwrap().to_string();

    let low: Value = client
        .get(server.url("/products/low-stock"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(low["items"][0]["sku"], "B");

    let resp = client
        .post(server.url(&format!("/adjustments/{id}/approve")))
        .json(&json!({ "actor": "manager" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(quantity(&client, &server, "A").await, 25);
    assert_eq!(quantity(&client, &server, "B").await, 7);

    let summary: Value = client
        .get(server.url("/reports/adjustments/summary?type=increase"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(summary["grandTotal"]["count"], 1);
    assert_eq!(summary["netStockEffect"], 8);
}

#[tokio::test]
async fn auto_approve_policy_applies_on_create() {
    let server = TestServer::spawn(LedgerConfig {
        approval_policy: ApprovalPolicy::AutoApprove,
        ..LedgerConfig::default()
    })
    .await;
    let client = reqwest::Client::new();
    put_product(&client, &server, "A", 20).await;

    let created: Value = client
        .post(server.url("/adjustments"))
        .json(&json!({
            "adjustmentType": "decrease",
            "reason": "Theft/Loss",
            "createdBy": "clerk",
            "items": [{ "sku": "A", "quantity": 6 }]
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(created["status"], "approved");
    assert_eq!(quantity(&client, &server, "A").await, 14);
}
