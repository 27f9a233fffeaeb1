//! The admin API surface the console talks to

use crate::error::{ClientError, ClientResult};
use crate::session::Session;
use async_trait::async_trait;
use glossy_core::types::{
    LoginRequest, OrderFilter, OrdersByStatus, ProfileUpdate, RegisterRequest, TopSize,
    UserFilter,
};
use glossy_core::{Order, OrderStatus, Page, PageCursor, Role, StatsOverview, User};
use tracing::{debug, warn};
use uuid::Uuid;

/// Operations of the order-management API used by the dashboard.
///
/// Every method except [`login`](Self::login) and [`register`](Self::register)
/// needs a held credential. An implementation that sees a 401 tears down
/// [`session`](Self::session) before returning [`ClientError::Unauthorized`].
#[async_trait]
pub trait AdminApi: Send + Sync {
    /// The session context requests are made under
    fn session(&self) -> &Session;

    /// Exchange credentials for a bearer token and establish the session
    async fn login(&self, request: &LoginRequest) -> ClientResult<User>;

    /// Create an account and establish the session for it
    async fn register(&self, request: &RegisterRequest) -> ClientResult<User>;

    /// Identity behind the held credential
    async fn me(&self) -> ClientResult<User>;

    /// Change the signed-in user's name or phone
    async fn update_profile(&self, update: &ProfileUpdate) -> ClientResult<User>;

    /// One page of orders
    async fn list_orders(&self, cursor: &PageCursor, filter: &OrderFilter)
    -> ClientResult<Page<Order>>;

    /// A single order
    async fn get_order(&self, id: Uuid) -> ClientResult<Order>;

    /// Move an order to `status`, recording `message` in its history
    async fn update_order_status(
        &self,
        id: Uuid,
        status: OrderStatus,
        message: Option<String>,
    ) -> ClientResult<Order>;

    /// Set the courier tracking number
    async fn update_tracking(&self, id: Uuid, tracking_number: &str) -> ClientResult<Order>;

    /// Replace the internal notes
    async fn add_notes(&self, id: Uuid, notes: &str) -> ClientResult<Order>;

    /// One page of user accounts
    async fn list_users(&self, cursor: &PageCursor, filter: &UserFilter)
    -> ClientResult<Page<User>>;

    /// A single user account
    async fn get_user(&self, id: Uuid) -> ClientResult<User>;

    /// Change an account's role
    async fn update_user_role(&self, id: Uuid, role: Role) -> ClientResult<User>;

    /// Aggregate dashboard counters
    async fn stats_overview(&self) -> ClientResult<StatsOverview>;

    /// Order counts per status
    async fn orders_by_status(&self) -> ClientResult<OrdersByStatus>;

    /// Best-selling print sizes
    async fn top_sizes(&self) -> ClientResult<Vec<TopSize>>;

    /// Pick up a persisted credential and confirm it is still accepted.
    ///
    /// A 401 leaves the session torn down and yields `None`. Any other
    /// failure keeps the stored identity so the console works offline from
    /// its last known state.
    async fn resume(&self) -> ClientResult<Option<User>> {
        let Some(stored) = self.session().restore()? else {
            debug!("No stored credentials to resume");
            return Ok(None);
        };

        match self.me().await {
            Ok(user) => {
                self.session().refresh_user(user.clone())?;
                Ok(Some(user))
            }
            Err(ClientError::Unauthorized) => Ok(None),
            Err(e) => {
                warn!(error = %e, "Could not re-validate stored credentials, keeping them");
                Ok(Some(stored))
            }
        }
    }

    /// Forget the credential; no request is made
    fn logout(&self) {
        self.session().logout();
    }
}
