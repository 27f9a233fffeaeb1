//! User list and detail

use super::{ListQuery, ListState, follow_up, require};
use crate::error::{ScreenError, ScreenResult};
use glossy_client::{AdminApi, ClientResult};
use glossy_core::types::UserFilter;
use glossy_core::{Action, PageCursor, Role, User, can_edit_role};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

/// Users screen state
pub struct UsersScreen {
    api: Arc<dyn AdminApi>,
    list: ListState<User, UserFilter>,
    selected: Option<User>,
    diagnostic: Option<String>,
}

impl std::fmt::Debug for UsersScreen {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UsersScreen")
            .field("cursor", self.list.cursor())
            .field("filter", self.list.filter())
            .field("selected", &self.selected.as_ref().map(|u| u.id))
            .finish_non_exhaustive()
    }
}

impl UsersScreen {
    /// Open the screen; nothing is fetched until [`refresh`](Self::refresh)
    #[must_use]
    pub fn new(api: Arc<dyn AdminApi>, page_size: u32) -> Self {
        Self {
            api,
            list: ListState::new(page_size),
            selected: None,
            diagnostic: None,
        }
    }

    /// Accounts on the current page
    #[must_use]
    pub fn users(&self) -> &[User] {
        self.list.rows()
    }

    /// Current page position
    #[must_use]
    pub const fn cursor(&self) -> &PageCursor {
        self.list.cursor()
    }

    /// Accounts across all pages
    #[must_use]
    pub const fn total_elements(&self) -> u64 {
        self.list.total_elements()
    }

    /// Active filter
    #[must_use]
    pub const fn filter(&self) -> &UserFilter {
        self.list.filter()
    }

    /// Account shown in the detail panel
    #[must_use]
    pub const fn selected(&self) -> Option<&User> {
        self.selected.as_ref()
    }

    /// Latest problem to show the operator
    #[must_use]
    pub fn diagnostic(&self) -> Option<&str> {
        self.diagnostic.as_deref().or_else(|| self.list.diagnostic())
    }

    /// Whether the role control is enabled for the selected account.
    ///
    /// Disabled without a selection and always for the operator's own row.
    #[must_use]
    pub fn can_edit_selected_role(&self) -> bool {
        match (self.api.session().current_user(), &self.selected) {
            (Some(operator), Some(target)) => can_edit_role(&operator, target.id),
            _ => false,
        }
    }

    /// Fetch the current page
    ///
    /// # Errors
    ///
    /// Returns the fetch error; prior rows stay in place.
    pub async fn refresh(&mut self) -> ScreenResult<()> {
        let query = self.list.current();
        self.fetch(query).await
    }

    /// Replace the filter and fetch from the first page
    ///
    /// # Errors
    ///
    /// Returns the fetch error.
    pub async fn apply_filter(&mut self, filter: UserFilter) -> ScreenResult<()> {
        self.query(filter, 0).await
    }

    /// Fetch `page` of `filter` in one request.
    ///
    /// The screen keeps its previous filter and page unless the fetch
    /// succeeds and the page exists.
    ///
    /// # Errors
    ///
    /// Returns the fetch error or [`ScreenError::PageOutOfRange`].
    pub async fn query(&mut self, filter: UserFilter, page: u32) -> ScreenResult<()> {
        let query = self.list.filtered(filter, page);
        self.fetch(query).await
    }

    /// Jump to `page` and fetch it
    ///
    /// # Errors
    ///
    /// [`ScreenError::PageOutOfRange`] without a request when the list is
    /// known to be shorter, otherwise the fetch error.
    pub async fn go_to_page(&mut self, page: u32) -> ScreenResult<()> {
        let query = self.list.page(page)?;
        self.fetch(query).await
    }

    /// Advance one page; `false` when already on the last page
    ///
    /// # Errors
    ///
    /// Returns the fetch error.
    pub async fn next_page(&mut self) -> ScreenResult<bool> {
        let Some(next) = self.list.cursor().next_page() else {
            return Ok(false);
        };
        self.go_to_page(next).await?;
        Ok(true)
    }

    /// Go back one page; `false` on page 0
    ///
    /// # Errors
    ///
    /// Returns the fetch error.
    pub async fn previous_page(&mut self) -> ScreenResult<bool> {
        if !self.list.cursor().has_previous() {
            return Ok(false);
        }
        let previous = self.list.cursor().previous_page();
        self.go_to_page(previous).await?;
        Ok(true)
    }

    async fn fetch(&mut self, query: ListQuery<UserFilter>) -> ScreenResult<()> {
        let ticket = self.list.issue();
        debug!(page = query.cursor.page, role = ?query.filter.role, "Fetching users");
        let outcome = self.api.list_users(&query.cursor, &query.filter).await;
        self.list.settle(ticket, query, outcome)
    }

    /// Load an account into the detail panel
    ///
    /// # Errors
    ///
    /// Returns the fetch error; the previous selection stays.
    pub async fn select(&mut self, id: Uuid) -> ScreenResult<&User> {
        let result = self.api.get_user(id).await;
        let user = self.record(result)?;
        Ok(&*self.selected.insert(user))
    }

    /// Change the selected account's role
    ///
    /// # Errors
    ///
    /// [`ScreenError::Denied`] when the operator is not an administrator or
    /// the selection is their own account, [`ScreenError::NoSelection`]
    /// without a selection, or the request error.
    pub async fn update_role(&mut self, role: Role) -> ScreenResult<&User> {
        let operator = require(self.api.as_ref(), Action::UpdateUserRole)?;
        let id = self
            .selected
            .as_ref()
            .map(|user| user.id)
            .ok_or(ScreenError::NoSelection)?;

        if !can_edit_role(&operator, id) {
            debug!(user_id = %id, "Refusing to change own role");
            return Err(ScreenError::Denied(Action::UpdateUserRole));
        }

        let result = self.api.update_user_role(id, role).await;
        let updated = self.record(result)?;
        info!(user_id = %id, %role, "Role change accepted");
        self.selected = Some(updated);

        let refreshed = self.refresh().await;
        follow_up(refreshed, &mut self.diagnostic)?;

        let detail = match self.api.get_user(id).await {
            Ok(user) => {
                self.selected = Some(user);
                Ok(())
            }
            Err(e) => Err(e.into()),
        };
        follow_up(detail, &mut self.diagnostic)?;

        self.selected.as_ref().ok_or(ScreenError::NoSelection)
    }

    fn record(&mut self, result: ClientResult<User>) -> ScreenResult<User> {
        match result {
            Ok(user) => {
                self.diagnostic = None;
                Ok(user)
            }
            Err(e) => {
                self.diagnostic = Some(e.to_string());
                Err(e.into())
            }
        }
    }
}
