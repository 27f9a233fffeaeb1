//! Process-wide console context

use crate::error::ScreenResult;
use crate::navigation::{MenuItem, Navigator, Route, menu_for};
use crate::screens::{DashboardScreen, OrdersScreen, UsersScreen};
use glossy_client::AdminApi;
use glossy_core::types::{LoginRequest, RegisterRequest};
use glossy_core::{Action, User, is_allowed};
use std::sync::Arc;
use tracing::info;

/// Session, routing and screen factory for one console run
pub struct Console {
    api: Arc<dyn AdminApi>,
    navigator: Navigator,
    page_size: u32,
}

impl std::fmt::Debug for Console {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Console")
            .field("route", &self.navigator.current())
            .field("page_size", &self.page_size)
            .finish_non_exhaustive()
    }
}

impl Console {
    /// Console over `api`, listing `page_size` rows per page
    #[must_use]
    pub fn new(api: Arc<dyn AdminApi>, page_size: u32) -> Self {
        Self {
            api,
            navigator: Navigator::new(),
            page_size,
        }
    }

    /// The API the screens talk to
    #[must_use]
    pub const fn api(&self) -> &Arc<dyn AdminApi> {
        &self.api
    }

    /// Route currently shown
    #[must_use]
    pub const fn route(&self) -> Route {
        self.navigator.current()
    }

    /// Signed-in user, if any
    #[must_use]
    pub fn current_user(&self) -> Option<User> {
        self.api.session().current_user()
    }

    /// Resume a stored session and land on the dashboard, or on `/login`
    /// when there is none
    ///
    /// # Errors
    ///
    /// Returns an error if stored credentials cannot be read.
    pub async fn start(&mut self) -> ScreenResult<Route> {
        let resumed = self.api.resume().await?;
        if let Some(user) = &resumed {
            info!(user_id = %user.id, role = %user.role, "Resumed session");
        }
        Ok(self.open(Route::Dashboard))
    }

    /// Sign in and go to the dashboard
    ///
    /// # Errors
    ///
    /// Returns the login failure; the console stays on `/login`.
    pub async fn login(&mut self, request: &LoginRequest) -> ScreenResult<User> {
        let result = self.api.login(request).await.map_err(Into::into);
        let user = self.observe(result)?;
        self.open(Route::Dashboard);
        Ok(user)
    }

    /// Create an account, sign in as it and go to the dashboard
    ///
    /// # Errors
    ///
    /// Returns the registration failure.
    pub async fn register(&mut self, request: &RegisterRequest) -> ScreenResult<User> {
        let result = self.api.register(request).await.map_err(Into::into);
        let user = self.observe(result)?;
        self.open(Route::Dashboard);
        Ok(user)
    }

    /// Drop the session and return to `/login`
    pub fn logout(&mut self) {
        self.api.logout();
        self.open(Route::Login);
    }

    /// Navigate, subject to the route guards
    pub fn open(&mut self, route: Route) -> Route {
        self.navigator.navigate(self.api.session(), route)
    }

    /// Navigation entries for the signed-in role
    #[must_use]
    pub fn menu(&self) -> Vec<MenuItem> {
        self.api.session().role().map(menu_for).unwrap_or_default()
    }

    /// Whether the signed-in role may perform `action`
    #[must_use]
    pub fn allows(&self, action: Action) -> bool {
        self.api
            .session()
            .role()
            .is_some_and(|role| is_allowed(role, action))
    }

    /// Pass a screen result through, sending the console to `/login` when
    /// the credential was rejected
    ///
    /// # Errors
    ///
    /// Returns `result`'s error unchanged.
    pub fn observe<T>(&mut self, result: ScreenResult<T>) -> ScreenResult<T> {
        if let Err(e) = &result {
            self.navigator.observe(e);
        }
        result
    }

    /// A fresh orders screen
    #[must_use]
    pub fn orders(&self) -> OrdersScreen {
        OrdersScreen::new(Arc::clone(&self.api), self.page_size)
    }

    /// A fresh users screen
    #[must_use]
    pub fn users(&self) -> UsersScreen {
        UsersScreen::new(Arc::clone(&self.api), self.page_size)
    }

    /// A fresh dashboard
    #[must_use]
    pub fn dashboard(&self) -> DashboardScreen {
        DashboardScreen::new(Arc::clone(&self.api))
    }
}
