//! HTTP-level tests for the admin API client

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use glossy_client::{
    AdminApi, ApiClient, ClientError, CredentialStore, Credentials, ErrorKind,
    FileCredentialStore, Session,
};
use glossy_core::types::{LoginRequest, OrderFilter, UserFilter};
use glossy_core::{OrderStatus, PageCursor, PaymentStatus, Role};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use std::sync::Arc;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ADMIN_ID: &str = "0b6f1a52-3c1d-4e6f-8a9b-1c2d3e4f5a6b";
const ORDER_ID: &str = "7f1c2a4e-5b6d-4c3e-9f10-2a3b4c5d6e7f";

fn user_json(role: &str) -> Value {
    json!({
        "id": ADMIN_ID,
        "email": "admin@glossy.test",
        "name": "Admin",
        "role": role,
        "isActive": true,
        "createdAt": "2024-01-10T09:30:00"
    })
}

fn order_json(status: &str, tracking: Option<&str>) -> Value {
    json!({
        "id": ORDER_ID,
        "orderNumber": "PG-0001",
        "customerName": "Ana Souza",
        "customerEmail": "ana@example.com",
        "status": status,
        "paymentStatus": "PAID",
        "subtotal": 25.00,
        "shipping": 8.00,
        "total": 33.00,
        "trackingNumber": tracking,
        "createdAt": "2024-01-10T09:30:00"
    })
}

fn page_json(content: Vec<Value>, total_pages: u32) -> Value {
    let total_elements = content.len();
    json!({
        "content": content,
        "totalElements": total_elements,
        "totalPages": total_pages,
        "size": 20,
        "number": 0
    })
}

/// Client whose session already holds `token`, persisted in a temp file
fn signed_in_client(
    server: &MockServer,
    token: &str,
) -> (ApiClient, Arc<FileCredentialStore>, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(FileCredentialStore::new(dir.path().join("credentials.json")));
    let session = Arc::new(Session::new(store.clone()));
    session
        .establish(Credentials {
            token: glossy_client::BearerToken::new(token),
            user: serde_json::from_value(user_json("ADMIN")).unwrap(),
        })
        .unwrap();

    (ApiClient::new(server.uri(), session), store, dir)
}

#[tokio::test]
async fn test_login_persists_credentials() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .and(body_json(json!({"email": "admin@glossy.test", "password": "secret"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token": "tok-abc",
            "user": user_json("ADMIN")
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(FileCredentialStore::new(dir.path().join("credentials.json")));
    let client = ApiClient::new(server.uri(), Arc::new(Session::new(store.clone())));

    let user = client
        .login(&LoginRequest {
            email: "admin@glossy.test".to_string(),
            password: "secret".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(user.role, Role::Admin);
    assert!(client.session().is_authenticated());
    assert_eq!(store.load().unwrap().unwrap().token.expose(), "tok-abc");
}

#[tokio::test]
async fn test_login_with_invalid_email_is_not_sent() {
    let server = MockServer::start().await;
    let client = ApiClient::new(server.uri(), Arc::new(Session::in_memory()));

    let result = client
        .login(&LoginRequest {
            email: "not-an-email".to_string(),
            password: "secret".to_string(),
        })
        .await;

    assert!(matches!(result, Err(ClientError::Validation(_))));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_failed_login_keeps_existing_session() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let (client, store, _dir) = signed_in_client(&server, "tok-123");
    let result = client
        .login(&LoginRequest {
            email: "other@glossy.test".to_string(),
            password: "secret".to_string(),
        })
        .await;

    assert!(matches!(result, Err(ClientError::Server { status: 503, .. })));
    assert!(client.session().is_authenticated());
    assert_eq!(client.session().token().unwrap().expose(), "tok-123");
    assert_eq!(store.load().unwrap().unwrap().token.expose(), "tok-123");
}

#[tokio::test]
async fn test_bearer_and_query_parameters() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/admin/orders"))
        .and(header("authorization", "Bearer tok-123"))
        .and(query_param("page", "0"))
        .and(query_param("size", "20"))
        .and(query_param("status", "PROCESSING"))
        .and(query_param("paymentStatus", "PAID"))
        .and(query_param("customerState", "Rio de Janeiro"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(page_json(vec![order_json("PROCESSING", None)], 1)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let (client, _store, _dir) = signed_in_client(&server, "tok-123");
    let filter = OrderFilter {
        status: Some(OrderStatus::Processing),
        payment_status: Some(PaymentStatus::Paid),
        customer_state: Some("Rio de Janeiro".to_string()),
    };

    let page = client.list_orders(&PageCursor::default(), &filter).await.unwrap();

    assert_eq!(page.total_pages, 1);
    assert_eq!(page.content[0].order_number, "PG-0001");
}

#[tokio::test]
async fn test_user_search_is_url_encoded() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/admin/users"))
        .and(query_param("role", "PACKER"))
        .and(query_param("search", "ana & co"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_json(vec![], 0)))
        .expect(1)
        .mount(&server)
        .await;

    let (client, _store, _dir) = signed_in_client(&server, "tok-123");
    let filter = UserFilter {
        role: Some(Role::Packer),
        search: Some("ana & co".to_string()),
    };

    let page = client.list_users(&PageCursor::default(), &filter).await.unwrap();
    assert!(page.content.is_empty());
}

#[tokio::test]
async fn test_unauthorized_clears_persisted_credentials() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/admin/stats/overview"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let (client, store, _dir) = signed_in_client(&server, "expired");

    let error = client.stats_overview().await.unwrap_err();

    assert!(matches!(error, ClientError::Unauthorized));
    assert_eq!(error.kind(), ErrorKind::Authentication);
    assert!(!client.session().is_authenticated());
    assert!(store.load().unwrap().is_none());

    // Nothing further is sent without a credential
    let next = client.me().await.unwrap_err();
    assert!(matches!(next, ClientError::NotAuthenticated));
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_rejection_keeps_session() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path(format!("/admin/orders/{ORDER_ID}/status")))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "message": "Invalid status transition"
        })))
        .mount(&server)
        .await;

    let (client, _store, _dir) = signed_in_client(&server, "tok-123");

    let error = client
        .update_order_status(ORDER_ID.parse().unwrap(), OrderStatus::Delivered, None)
        .await
        .unwrap_err();

    assert_eq!(error.kind(), ErrorKind::Rejected);
    assert_eq!(
        error.to_string(),
        "Request rejected (400): Invalid status transition"
    );
    assert!(client.session().is_authenticated());
}

#[tokio::test]
async fn test_server_error_is_transport_kind() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/admin/orders/{ORDER_ID}")))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let (client, _store, _dir) = signed_in_client(&server, "tok-123");

    let error = client.get_order(ORDER_ID.parse().unwrap()).await.unwrap_err();

    assert!(matches!(error, ClientError::Server { status: 503, .. }));
    assert_eq!(error.kind(), ErrorKind::Transport);
    assert!(client.session().is_authenticated());
}

#[tokio::test]
async fn test_malformed_body_is_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/auth/me"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .mount(&server)
        .await;

    let (client, _store, _dir) = signed_in_client(&server, "tok-123");

    let error = client.me().await.unwrap_err();
    assert!(matches!(error, ClientError::Decode { .. }));
}

#[tokio::test]
async fn test_tracking_update_then_refetch() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path(format!("/admin/orders/{ORDER_ID}/tracking")))
        .and(body_json(json!({"trackingNumber": "BR123456789"})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(order_json("POSTED", Some("BR123456789"))),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/admin/orders/{ORDER_ID}")))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(order_json("POSTED", Some("BR123456789"))),
        )
        .expect(1)
        .mount(&server)
        .await;

    let (client, _store, _dir) = signed_in_client(&server, "tok-123");
    let id = ORDER_ID.parse().unwrap();

    client.update_tracking(id, "BR123456789").await.unwrap();
    let order = client.get_order(id).await.unwrap();

    assert_eq!(order.tracking_number.as_deref(), Some("BR123456789"));
}

#[tokio::test]
async fn test_stats_breakdowns() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/admin/stats/orders-by-status"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"PENDING": 4, "POSTED": 2})),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/admin/stats/top-sizes"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([["4x6", 120], ["5x7", 40]])),
        )
        .mount(&server)
        .await;

    let (client, _store, _dir) = signed_in_client(&server, "tok-123");

    let by_status = client.orders_by_status().await.unwrap();
    let sizes = client.top_sizes().await.unwrap();

    assert_eq!(by_status.get(&OrderStatus::Pending), Some(&4));
    assert_eq!(by_status.get(&OrderStatus::Posted), Some(&2));
    assert_eq!(sizes[0].size_name, "4x6");
    assert_eq!(sizes[1].quantity, 40);
}

#[tokio::test]
async fn test_resume_keeps_identity_on_transport_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/auth/me"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(FileCredentialStore::new(dir.path().join("credentials.json")));
    store
        .save(&Credentials {
            token: glossy_client::BearerToken::new("tok-123"),
            user: serde_json::from_value(user_json("MARKETING")).unwrap(),
        })
        .unwrap();
    let client = ApiClient::new(server.uri(), Arc::new(Session::new(store)));

    let user = client.resume().await.unwrap().unwrap();

    assert_eq!(user.role, Role::Marketing);
    assert!(client.session().is_authenticated());
}

#[tokio::test]
async fn test_resume_with_rejected_token_signs_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/auth/me"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(FileCredentialStore::new(dir.path().join("credentials.json")));
    store
        .save(&Credentials {
            token: glossy_client::BearerToken::new("stale"),
            user: serde_json::from_value(user_json("ADMIN")).unwrap(),
        })
        .unwrap();
    let client = ApiClient::new(server.uri(), Arc::new(Session::new(store.clone())));

    assert!(client.resume().await.unwrap().is_none());
    assert!(!client.session().is_authenticated());
    assert!(store.load().unwrap().is_none());
}
