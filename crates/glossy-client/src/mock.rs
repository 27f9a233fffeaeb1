//! In-memory admin API for testing
//!
//! [`MockAdminApi`] keeps accounts and orders in memory, answers every
//! [`AdminApi`] call from them, counts calls per endpoint and can be told to
//! fail specific endpoints. Injected 401s tear the session down exactly like
//! the HTTP client does.

use crate::api::AdminApi;
use crate::error::{ClientError, ClientResult};
use crate::session::{BearerToken, Credentials, Session, TeardownReason};
use async_trait::async_trait;
use chrono::Local;
use glossy_core::types::{
    LoginRequest, OrderFilter, OrderItem, OrdersByStatus, ProfileUpdate, RegisterRequest,
    StatusHistoryEntry, TopSize, UserFilter,
};
use glossy_core::{Order, OrderStatus, Page, PageCursor, PaymentStatus, Role, StatsOverview, User};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

/// A failure the mock should answer with
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Failure {
    /// Answer 401 and tear the session down
    Unauthorized,
    /// Answer a 4xx
    Rejected {
        /// HTTP status code
        status: u16,
        /// Server explanation
        message: String,
    },
    /// Answer a 5xx
    Server {
        /// HTTP status code
        status: u16,
        /// Server explanation
        message: String,
    },
}

impl Failure {
    /// A 400 with `message`
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::Rejected {
            status: 400,
            message: message.into(),
        }
    }

    /// A 503
    #[must_use]
    pub fn unavailable() -> Self {
        Self::Server {
            status: 503,
            message: "Service Unavailable".to_string(),
        }
    }

    fn into_error(self) -> ClientError {
        match self {
            Self::Unauthorized => ClientError::Unauthorized,
            Self::Rejected { status, message } => ClientError::Rejected { status, message },
            Self::Server { status, message } => ClientError::Server { status, message },
        }
    }
}

#[derive(Debug, Default)]
struct MockState {
    accounts: Vec<(User, String)>,
    orders: Vec<Order>,
    failures: HashMap<&'static str, VecDeque<Failure>>,
    calls: HashMap<&'static str, usize>,
    last_order_query: Option<(PageCursor, OrderFilter)>,
    last_user_query: Option<(PageCursor, UserFilter)>,
}

impl MockState {
    fn order_mut(&mut self, id: Uuid) -> ClientResult<&mut Order> {
        self.orders
            .iter_mut()
            .find(|order| order.id == id)
            .ok_or_else(|| not_found("Order"))
    }

    fn user_mut(&mut self, id: Uuid) -> ClientResult<&mut User> {
        self.accounts
            .iter_mut()
            .map(|(user, _)| user)
            .find(|user| user.id == id)
            .ok_or_else(|| not_found("User"))
    }
}

/// In-memory implementation of [`AdminApi`]
#[derive(Debug)]
pub struct MockAdminApi {
    session: Arc<Session>,
    state: Mutex<MockState>,
}

impl Default for MockAdminApi {
    fn default() -> Self {
        Self::new()
    }
}

impl MockAdminApi {
    /// Empty mock with an in-memory session
    #[must_use]
    pub fn new() -> Self {
        Self::with_session(Arc::new(Session::in_memory()))
    }

    /// Empty mock sharing `session`
    #[must_use]
    pub fn with_session(session: Arc<Session>) -> Self {
        Self {
            session,
            state: Mutex::new(MockState::default()),
        }
    }

    /// Add an account that can log in with `password`
    #[must_use]
    pub fn with_account(self, user: User, password: impl Into<String>) -> Self {
        self.state.lock().accounts.push((user, password.into()));
        self
    }

    /// Add orders
    #[must_use]
    pub fn with_orders(self, orders: impl IntoIterator<Item = Order>) -> Self {
        self.state.lock().orders.extend(orders);
        self
    }

    /// Shared session handle
    #[must_use]
    pub fn session_handle(&self) -> Arc<Session> {
        Arc::clone(&self.session)
    }

    /// Establish a session for `user` without going through login
    ///
    /// # Errors
    ///
    /// Returns an error if the session store refuses the credential.
    pub fn sign_in_as(&self, user: &User) -> ClientResult<()> {
        self.session.establish(Credentials {
            token: BearerToken::new(format!("mock-{}", user.id)),
            user: user.clone(),
        })
    }

    /// Make the next call to `endpoint` fail; calls queue up in order
    pub fn fail_next(&self, endpoint: &'static str, failure: Failure) {
        self.state
            .lock()
            .failures
            .entry(endpoint)
            .or_default()
            .push_back(failure);
    }

    /// How many times `endpoint` was called
    #[must_use]
    pub fn call_count(&self, endpoint: &str) -> usize {
        self.state.lock().calls.get(endpoint).copied().unwrap_or(0)
    }

    /// Cursor and filter of the latest order listing
    #[must_use]
    pub fn last_order_query(&self) -> Option<(PageCursor, OrderFilter)> {
        self.state.lock().last_order_query.clone()
    }

    /// Cursor and filter of the latest user listing
    #[must_use]
    pub fn last_user_query(&self) -> Option<(PageCursor, UserFilter)> {
        self.state.lock().last_user_query.clone()
    }

    /// Current server-side copy of an order
    #[must_use]
    pub fn order(&self, id: Uuid) -> Option<Order> {
        self.state.lock().orders.iter().find(|o| o.id == id).cloned()
    }

    /// Current server-side copy of an account
    #[must_use]
    pub fn user(&self, id: Uuid) -> Option<User> {
        self.state
            .lock()
            .accounts
            .iter()
            .find(|(user, _)| user.id == id)
            .map(|(user, _)| user.clone())
    }

    /// Record the call, then apply any queued failure
    fn enter(&self, endpoint: &'static str, authenticated: bool) -> ClientResult<()> {
        let failure = {
            let mut state = self.state.lock();
            *state.calls.entry(endpoint).or_default() += 1;
            state
                .failures
                .get_mut(endpoint)
                .and_then(VecDeque::pop_front)
        };

        if authenticated && self.session.token().is_none() {
            return Err(ClientError::NotAuthenticated);
        }

        match failure {
            Some(Failure::Unauthorized) => {
                self.session.teardown(TeardownReason::Unauthorized);
                Err(ClientError::Unauthorized)
            }
            Some(failure) => Err(failure.into_error()),
            None => Ok(()),
        }
    }

    fn current_user_id(&self) -> ClientResult<Uuid> {
        self.session
            .current_user()
            .map(|user| user.id)
            .ok_or(ClientError::NotAuthenticated)
    }
}

fn not_found(what: &str) -> ClientError {
    ClientError::Rejected {
        status: 404,
        message: format!("{what} not found"),
    }
}

fn paginate<T: Clone>(items: &[T], cursor: &PageCursor) -> Page<T> {
    let size = cursor.size.max(1);
    let total_elements = items.len() as u64;
    let total_pages = u32::try_from(items.len().div_ceil(size as usize)).unwrap_or(u32::MAX);
    let content = items
        .chunks(size as usize)
        .nth(cursor.page as usize)
        .map(<[T]>::to_vec)
        .unwrap_or_default();

    Page {
        content,
        total_elements,
        total_pages,
        size,
        number: cursor.page,
    }
}

#[async_trait]
impl AdminApi for MockAdminApi {
    fn session(&self) -> &Session {
        &self.session
    }

    async fn login(&self, request: &LoginRequest) -> ClientResult<User> {
        request.validate()?;
        let previous = self.session.begin_authentication();
        if let Err(e) = self.enter("login", false) {
            if !matches!(e, ClientError::Unauthorized) {
                self.session.abandon_authentication(previous);
            }
            return Err(e);
        }

        let user = self
            .state
            .lock()
            .accounts
            .iter()
            .find(|(user, password)| {
                user.email.eq_ignore_ascii_case(&request.email) && *password == request.password
            })
            .map(|(user, _)| user.clone());

        let Some(user) = user else {
            self.session.teardown(TeardownReason::Unauthorized);
            return Err(ClientError::Unauthorized);
        };

        self.sign_in_as(&user)?;
        Ok(user)
    }

    async fn register(&self, request: &RegisterRequest) -> ClientResult<User> {
        self.enter("register", false)?;
        request.validate()?;

        let user = {
            let mut state = self.state.lock();
            if state
                .accounts
                .iter()
                .any(|(user, _)| user.email.eq_ignore_ascii_case(&request.email))
            {
                return Err(Failure::bad_request("Email already registered").into_error());
            }

            let now = Local::now().naive_local();
            let user = User {
                id: Uuid::new_v4(),
                email: request.email.clone(),
                name: request.name.clone(),
                phone: request.phone.clone(),
                avatar_url: None,
                role: Role::Customer,
                affiliate_code: None,
                referred_by: None,
                active: Some(true),
                created_at: Some(now),
                updated_at: Some(now),
            };
            state.accounts.push((user.clone(), request.password.clone()));
            user
        };

        self.sign_in_as(&user)?;
        Ok(user)
    }

    async fn me(&self) -> ClientResult<User> {
        self.enter("me", true)?;
        let id = self.current_user_id()?;
        self.user(id).ok_or_else(|| not_found("User"))
    }

    async fn update_profile(&self, update: &ProfileUpdate) -> ClientResult<User> {
        self.enter("update_profile", true)?;
        update.validate()?;
        let id = self.current_user_id()?;

        let user = {
            let mut state = self.state.lock();
            let user = state.user_mut(id)?;
            if let Some(name) = &update.name {
                user.name.clone_from(name);
            }
            if let Some(phone) = &update.phone {
                user.phone = Some(phone.clone());
            }
            user.clone()
        };

        self.session.refresh_user(user.clone())?;
        Ok(user)
    }

    async fn list_orders(
        &self,
        cursor: &PageCursor,
        filter: &OrderFilter,
    ) -> ClientResult<Page<Order>> {
        self.enter("list_orders", true)?;
        let mut state = self.state.lock();
        state.last_order_query = Some((*cursor, filter.clone()));

        let matching: Vec<Order> = state
            .orders
            .iter()
            .filter(|order| filter.status.is_none_or(|s| order.status == s))
            .filter(|order| filter.payment_status.is_none_or(|s| order.payment_status == s))
            .filter(|order| {
                filter
                    .customer_state
                    .as_deref()
                    .is_none_or(|s| order.customer_state.as_deref() == Some(s))
            })
            .cloned()
            .collect();

        Ok(paginate(&matching, cursor))
    }

    async fn get_order(&self, id: Uuid) -> ClientResult<Order> {
        self.enter("get_order", true)?;
        self.order(id).ok_or_else(|| not_found("Order"))
    }

    async fn update_order_status(
        &self,
        id: Uuid,
        status: OrderStatus,
        message: Option<String>,
    ) -> ClientResult<Order> {
        self.enter("update_order_status", true)?;
        let mut state = self.state.lock();
        let order = state.order_mut(id)?;
        let now = Local::now().naive_local();

        order.status = status;
        order.updated_at = Some(now);
        match status {
            OrderStatus::Posted => order.shipped_at = Some(now),
            OrderStatus::Delivered => order.delivered_at = Some(now),
            OrderStatus::Cancelled => order.cancelled_at = Some(now),
            _ => {}
        }
        order
            .status_history
            .get_or_insert_with(Vec::new)
            .push(StatusHistoryEntry {
                id: Uuid::new_v4().to_string(),
                status,
                message,
                created_at: Some(now),
            });

        Ok(order.clone())
    }

    async fn update_tracking(&self, id: Uuid, tracking_number: &str) -> ClientResult<Order> {
        self.enter("update_tracking", true)?;
        let mut state = self.state.lock();
        let order = state.order_mut(id)?;
        order.tracking_number = Some(tracking_number.to_string());
        Ok(order.clone())
    }

    async fn add_notes(&self, id: Uuid, notes: &str) -> ClientResult<Order> {
        self.enter("add_notes", true)?;
        let mut state = self.state.lock();
        let order = state.order_mut(id)?;
        order.notes = Some(notes.to_string());
        Ok(order.clone())
    }

    async fn list_users(
        &self,
        cursor: &PageCursor,
        filter: &UserFilter,
    ) -> ClientResult<Page<User>> {
        self.enter("list_users", true)?;
        let mut state = self.state.lock();
        state.last_user_query = Some((*cursor, filter.clone()));

        let needle = filter.search.as_deref().map(str::to_lowercase);
        let matching: Vec<User> = state
            .accounts
            .iter()
            .map(|(user, _)| user)
            .filter(|user| filter.role.is_none_or(|r| user.role == r))
            .filter(|user| {
                needle.as_deref().is_none_or(|n| {
                    user.name.to_lowercase().contains(n) || user.email.to_lowercase().contains(n)
                })
            })
            .cloned()
            .collect();

        Ok(paginate(&matching, cursor))
    }

    async fn get_user(&self, id: Uuid) -> ClientResult<User> {
        self.enter("get_user", true)?;
        self.user(id).ok_or_else(|| not_found("User"))
    }

    async fn update_user_role(&self, id: Uuid, role: Role) -> ClientResult<User> {
        self.enter("update_user_role", true)?;
        let mut state = self.state.lock();
        let user = state.user_mut(id)?;
        user.role = role;
        user.updated_at = Some(Local::now().naive_local());
        Ok(user.clone())
    }

    async fn stats_overview(&self) -> ClientResult<StatsOverview> {
        self.enter("stats_overview", true)?;
        let state = self.state.lock();
        let count = |pred: &dyn Fn(&Order) -> bool| {
            state.orders.iter().filter(|o| pred(o)).count() as u64
        };

        Ok(StatsOverview {
            total_orders: state.orders.len() as u64,
            pending_orders: count(&|o| o.status == OrderStatus::Pending),
            processing_orders: count(&|o| o.status == OrderStatus::Processing),
            delivered_orders: count(&|o| o.status == OrderStatus::Delivered),
            cancelled_orders: count(&|o| o.status == OrderStatus::Cancelled),
            paid_orders: count(&|o| o.payment_status == PaymentStatus::Paid),
            pending_payments: count(&|o| o.payment_status == PaymentStatus::Pending),
            total_customers: state
                .accounts
                .iter()
                .filter(|(user, _)| user.role == Role::Customer)
                .count() as u64,
            total_revenue: Some(
                state
                    .orders
                    .iter()
                    .filter(|o| o.payment_status == PaymentStatus::Paid)
                    .map(|o| o.total)
                    .sum(),
            ),
        })
    }

    async fn orders_by_status(&self) -> ClientResult<OrdersByStatus> {
        self.enter("orders_by_status", true)?;
        let mut counts = OrdersByStatus::new();
        for order in &self.state.lock().orders {
            *counts.entry(order.status).or_default() += 1;
        }
        Ok(counts)
    }

    async fn top_sizes(&self) -> ClientResult<Vec<TopSize>> {
        self.enter("top_sizes", true)?;
        let mut totals: BTreeMap<String, u64> = BTreeMap::new();
        for item in self
            .state
            .lock()
            .orders
            .iter()
            .filter(|o| o.payment_status == PaymentStatus::Paid)
            .filter_map(|o| o.items.as_ref())
            .flatten()
        {
            *totals.entry(item.size_name.clone()).or_default() += u64::from(item.quantity);
        }

        let mut sizes: Vec<TopSize> = totals.into_iter().map(TopSize::from).collect();
        sizes.sort_by(|a, b| b.quantity.cmp(&a.quantity));
        Ok(sizes)
    }
}

/// Sample records for tests
pub mod fixtures {
    use super::{Decimal, Local, Order, OrderItem, OrderStatus, PaymentStatus, Role, User, Uuid};

    /// An active account with `role`
    #[must_use]
    pub fn user(name: &str, role: Role) -> User {
        let now = Local::now().naive_local();
        User {
            id: Uuid::new_v4(),
            email: format!("{}@glossy.test", name.to_lowercase().replace(' ', ".")),
            name: name.to_string(),
            phone: None,
            avatar_url: None,
            role,
            affiliate_code: None,
            referred_by: None,
            active: Some(true),
            created_at: Some(now),
            updated_at: Some(now),
        }
    }

    /// A paid order for two 4x6 prints in `status`
    #[must_use]
    pub fn order(order_number: &str, status: OrderStatus) -> Order {
        let now = Local::now().naive_local();
        let unit_price = Decimal::new(1250, 2);
        let subtotal = unit_price * Decimal::from(2);
        let shipping = Decimal::new(800, 2);

        Order {
            id: Uuid::new_v4(),
            order_number: order_number.to_string(),
            user_id: None,
            affiliate_id: None,
            customer_name: "Ana Souza".to_string(),
            customer_email: "ana@example.com".to_string(),
            customer_phone: None,
            customer_state: Some("SP".to_string()),
            status,
            payment_status: PaymentStatus::Paid,
            payment_method: Some("PIX".to_string()),
            subtotal,
            shipping,
            total: subtotal + shipping,
            paid_at: Some(now),
            tracking_number: None,
            shipped_at: None,
            delivered_at: None,
            cancelled_at: None,
            cancel_reason: None,
            notes: None,
            items: Some(vec![OrderItem {
                id: Uuid::new_v4().to_string(),
                size_id: None,
                size_name: "4x6".to_string(),
                quantity: 2,
                unit_price,
                total_price: subtotal,
            }]),
            status_history: Some(Vec::new()),
            created_at: Some(now),
            updated_at: Some(now),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn admin_api() -> (MockAdminApi, User) {
        let admin = fixtures::user("Admin", Role::Admin);
        let api = MockAdminApi::new()
            .with_account(admin.clone(), "secret")
            .with_orders(
                (1..=25).map(|n| fixtures::order(&format!("PG-{n:04}"), OrderStatus::Processing)),
            );
        (api, admin)
    }

    #[tokio::test]
    async fn test_login_establishes_session() {
        let (api, admin) = admin_api();
        let request = LoginRequest {
            email: admin.email.clone(),
            password: "secret".to_string(),
        };

        let user = api.login(&request).await.unwrap();

        assert_eq!(user.id, admin.id);
        assert!(api.session().is_authenticated());
    }

    #[tokio::test]
    async fn test_wrong_password_is_unauthorized() {
        let (api, admin) = admin_api();
        let request = LoginRequest {
            email: admin.email,
            password: "wrong".to_string(),
        };

        let result = api.login(&request).await;

        assert!(matches!(result, Err(ClientError::Unauthorized)));
        assert!(!api.session().is_authenticated());
    }

    #[tokio::test]
    async fn test_requests_need_a_session() {
        let (api, _) = admin_api();
        let result = api.list_orders(&PageCursor::default(), &OrderFilter::default()).await;
        assert!(matches!(result, Err(ClientError::NotAuthenticated)));
    }

    #[tokio::test]
    async fn test_pagination() {
        let (api, admin) = admin_api();
        api.sign_in_as(&admin).unwrap();

        let mut cursor = PageCursor::new(10);
        cursor.page = 2;
        let page = api.list_orders(&cursor, &OrderFilter::default()).await.unwrap();

        assert_eq!(page.total_elements, 25);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.content.len(), 5);
        assert_eq!(page.number, 2);
    }

    #[tokio::test]
    async fn test_injected_unauthorized_tears_down() {
        let (api, admin) = admin_api();
        api.sign_in_as(&admin).unwrap();
        api.fail_next("stats_overview", Failure::Unauthorized);

        let result = api.stats_overview().await;

        assert!(matches!(result, Err(ClientError::Unauthorized)));
        assert!(!api.session().is_authenticated());
        assert_eq!(api.call_count("stats_overview"), 1);
    }

    #[tokio::test]
    async fn test_status_update_appends_history() {
        let (api, admin) = admin_api();
        api.sign_in_as(&admin).unwrap();
        let id = api
            .list_orders(&PageCursor::default(), &OrderFilter::default())
            .await
            .unwrap()
            .content[0]
            .id;

        let order = api
            .update_order_status(id, OrderStatus::Posted, Some("Sent".to_string()))
            .await
            .unwrap();

        assert_eq!(order.status, OrderStatus::Posted);
        assert!(order.shipped_at.is_some());
        assert_eq!(order.status_history.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_stats_from_orders() {
        let (api, admin) = admin_api();
        api.sign_in_as(&admin).unwrap();

        let stats = api.stats_overview().await.unwrap();
        let sizes = api.top_sizes().await.unwrap();

        assert_eq!(stats.total_orders, 25);
        assert_eq!(stats.processing_orders, 25);
        assert_eq!(stats.total_revenue, Some(Decimal::new(3300, 2) * Decimal::from(25)));
        assert_eq!(sizes, vec![TopSize::from(("4x6".to_string(), 50))]);
    }
}
