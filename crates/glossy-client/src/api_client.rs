//! HTTP client for the order-management API

use crate::api::AdminApi;
use crate::error::{ClientError, ClientResult};
use crate::session::{Credentials, Session, TeardownReason};
use async_trait::async_trait;
use glossy_core::config::ApiConfig;
use glossy_core::types::{
    AuthResponse, LoginRequest, NotesUpdate, OrderFilter, OrdersByStatus, ProfileUpdate,
    RegisterRequest, RoleUpdate, StatusUpdate, TopSize, TrackingUpdate, UserFilter,
};
use glossy_core::{Order, OrderStatus, Page, PageCursor, Role, StatsOverview, User};
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use uuid::Uuid;
use validator::Validate;

/// API client for the admin endpoints
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    session: Arc<Session>,
}

impl ApiClient {
    /// Create a client for `base_url` with the default transport settings
    pub fn new(base_url: impl Into<String>, session: Arc<Session>) -> Self {
        Self {
            client: Client::new(),
            base_url: normalize_base_url(base_url.into()),
            session,
        }
    }

    /// Create a client from configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is not a URL or the HTTP client
    /// cannot be built.
    pub fn from_config(config: &ApiConfig, session: Arc<Session>) -> ClientResult<Self> {
        reqwest::Url::parse(&config.base_url)
            .map_err(|e| ClientError::InvalidUrl(format!("{}: {e}", config.base_url)))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(concat!("glossy-admin/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: normalize_base_url(config.base_url.clone()),
            session,
        })
    }

    /// Base URL every path is appended to
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Shared session handle
    #[must_use]
    pub fn session_handle(&self) -> Arc<Session> {
        Arc::clone(&self.session)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client.request(method, self.url(path))
    }

    /// Attach the bearer credential, or refuse to send without one
    fn authorized(&self, request: RequestBuilder) -> ClientResult<RequestBuilder> {
        let token = self.session.token().ok_or(ClientError::NotAuthenticated)?;
        Ok(request.bearer_auth(token.expose()))
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        let request = self.authorized(self.request(Method::GET, path))?;
        self.send(request, path).await
    }

    async fn write<B, T>(&self, method: Method, path: &str, body: &B) -> ClientResult<T>
    where
        B: Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.authorized(self.request(method, path))?.json(body);
        self.send(request, path).await
    }

    async fn authenticate<B>(&self, path: &str, body: &B) -> ClientResult<User>
    where
        B: Serialize + Sync + ?Sized,
    {
        let previous = self.session.begin_authentication();

        let request = self.request(Method::POST, path).json(body);
        match self.send::<AuthResponse>(request, path).await {
            Ok(response) => {
                let user = response.user.clone();
                self.session.establish(Credentials::from(response))?;
                Ok(user)
            }
            Err(e) => {
                // A 401 has already torn the session down
                if !matches!(e, ClientError::Unauthorized) {
                    self.session.abandon_authentication(previous);
                }
                Err(e)
            }
        }
    }

    /// Send a request and classify the response
    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        endpoint: &str,
    ) -> ClientResult<T> {
        let response = request.send().await.map_err(|e| {
            error!(endpoint, error = %e, "Request failed");
            ClientError::Transport(e)
        })?;

        let status = response.status();
        debug!(endpoint, status = status.as_u16(), "Response received");

        if status == StatusCode::UNAUTHORIZED {
            warn!(endpoint, "Credential rejected, clearing session");
            self.session.teardown(TeardownReason::Unauthorized);
            return Err(ClientError::Unauthorized);
        }

        let body = response.bytes().await.map_err(|e| {
            error!(endpoint, error = %e, "Failed to read response body");
            ClientError::Transport(e)
        })?;

        if status.is_client_error() {
            let message = error_message(status, &body);
            warn!(endpoint, status = status.as_u16(), %message, "Request rejected");
            return Err(ClientError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        if !status.is_success() {
            let message = error_message(status, &body);
            error!(endpoint, status = status.as_u16(), %message, "Server error");
            return Err(ClientError::Server {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_slice(&body).map_err(|source| {
            error!(endpoint, error = %source, "Failed to parse response");
            ClientError::Decode {
                context: endpoint.to_string(),
                source,
            }
        })
    }
}

#[async_trait]
impl AdminApi for ApiClient {
    fn session(&self) -> &Session {
        &self.session
    }

    async fn login(&self, request: &LoginRequest) -> ClientResult<User> {
        request.validate()?;
        let user = self.authenticate("/auth/login", request).await?;
        info!(user_id = %user.id, role = %user.role, "Logged in");
        Ok(user)
    }

    async fn register(&self, request: &RegisterRequest) -> ClientResult<User> {
        request.validate()?;
        let user = self.authenticate("/auth/register", request).await?;
        info!(user_id = %user.id, "Registered new account");
        Ok(user)
    }

    async fn me(&self) -> ClientResult<User> {
        self.get("/auth/me").await
    }

    async fn update_profile(&self, update: &ProfileUpdate) -> ClientResult<User> {
        update.validate()?;
        let user: User = self.write(Method::PUT, "/auth/profile", update).await?;
        self.session.refresh_user(user.clone())?;
        Ok(user)
    }

    async fn list_orders(
        &self,
        cursor: &PageCursor,
        filter: &OrderFilter,
    ) -> ClientResult<Page<Order>> {
        let mut query_params = page_params(cursor);

        if let Some(status) = filter.status {
            query_params.push(format!("status={status}"));
        }
        if let Some(payment_status) = filter.payment_status {
            query_params.push(format!("paymentStatus={payment_status}"));
        }
        if let Some(ref state) = filter.customer_state {
            query_params.push(format!("customerState={}", urlencoding::encode(state)));
        }

        debug!(page = cursor.page, status = ?filter.status, "Fetching orders");
        self.get(&with_query("/admin/orders", &query_params)).await
    }

    async fn get_order(&self, id: Uuid) -> ClientResult<Order> {
        self.get(&format!("/admin/orders/{id}")).await
    }

    async fn update_order_status(
        &self,
        id: Uuid,
        status: OrderStatus,
        message: Option<String>,
    ) -> ClientResult<Order> {
        let body = StatusUpdate { status, message };
        let order: Order = self
            .write(Method::PATCH, &format!("/admin/orders/{id}/status"), &body)
            .await?;
        info!(order_id = %id, %status, "Order status updated");
        Ok(order)
    }

    async fn update_tracking(&self, id: Uuid, tracking_number: &str) -> ClientResult<Order> {
        let body = TrackingUpdate {
            tracking_number: tracking_number.to_string(),
        };
        let order: Order = self
            .write(Method::PATCH, &format!("/admin/orders/{id}/tracking"), &body)
            .await?;
        info!(order_id = %id, "Tracking number updated");
        Ok(order)
    }

    async fn add_notes(&self, id: Uuid, notes: &str) -> ClientResult<Order> {
        let body = NotesUpdate {
            notes: notes.to_string(),
        };
        self.write(Method::POST, &format!("/admin/orders/{id}/notes"), &body)
            .await
    }

    async fn list_users(
        &self,
        cursor: &PageCursor,
        filter: &UserFilter,
    ) -> ClientResult<Page<User>> {
        let mut query_params = page_params(cursor);

        if let Some(role) = filter.role {
            query_params.push(format!("role={role}"));
        }
        if let Some(ref search) = filter.search {
            query_params.push(format!("search={}", urlencoding::encode(search)));
        }

        debug!(page = cursor.page, role = ?filter.role, "Fetching users");
        self.get(&with_query("/admin/users", &query_params)).await
    }

    async fn get_user(&self, id: Uuid) -> ClientResult<User> {
        self.get(&format!("/admin/users/{id}")).await
    }

    async fn update_user_role(&self, id: Uuid, role: Role) -> ClientResult<User> {
        let user: User = self
            .write(
                Method::PATCH,
                &format!("/admin/users/{id}/role"),
                &RoleUpdate { role },
            )
            .await?;
        info!(user_id = %id, %role, "User role updated");
        Ok(user)
    }

    async fn stats_overview(&self) -> ClientResult<StatsOverview> {
        self.get("/admin/stats/overview").await
    }

    async fn orders_by_status(&self) -> ClientResult<OrdersByStatus> {
        self.get("/admin/stats/orders-by-status").await
    }

    async fn top_sizes(&self) -> ClientResult<Vec<TopSize>> {
        self.get("/admin/stats/top-sizes").await
    }
}

fn normalize_base_url(mut base_url: String) -> String {
    while base_url.ends_with('/') {
        base_url.pop();
    }
    base_url
}

fn page_params(cursor: &PageCursor) -> Vec<String> {
    cursor
        .query_pairs()
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect()
}

fn with_query(path: &str, query_params: &[String]) -> String {
    if query_params.is_empty() {
        path.to_string()
    } else {
        format!("{path}?{}", query_params.join("&"))
    }
}

/// Explanation for a failed request: the body's `message` or `error` field,
/// else the raw body, else the status reason.
fn error_message(status: StatusCode, body: &[u8]) -> String {
    if let Ok(value) = serde_json::from_slice::<serde_json::Value>(body) {
        for field in ["message", "error"] {
            if let Some(message) = value.get(field).and_then(serde_json::Value::as_str)
                && !message.is_empty()
            {
                return message.to_string();
            }
        }
    }

    let text = String::from_utf8_lossy(body);
    let text = text.trim();
    if text.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("Unknown error")
            .to_string()
    } else {
        text.to_string()
    }
}
