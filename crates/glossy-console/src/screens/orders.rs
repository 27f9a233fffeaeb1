//! Order list and detail

use super::{ListQuery, ListState, follow_up, require};
use crate::error::{ScreenError, ScreenResult};
use glossy_client::{AdminApi, ClientResult};
use glossy_core::types::OrderFilter;
use glossy_core::{Action, Order, OrderStatus, PageCursor, is_allowed};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

/// Orders screen state
pub struct OrdersScreen {
    api: Arc<dyn AdminApi>,
    list: ListState<Order, OrderFilter>,
    selected: Option<Order>,
    diagnostic: Option<String>,
}

impl std::fmt::Debug for OrdersScreen {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrdersScreen")
            .field("cursor", self.list.cursor())
            .field("filter", self.list.filter())
            .field("selected", &self.selected.as_ref().map(|o| o.id))
            .finish_non_exhaustive()
    }
}

impl OrdersScreen {
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

    /// Orders on the current page
    #[must_use]
    pub fn orders(&self) -> &[Order] {
        self.list.rows()
    }

    /// Current page position
    #[must_use]
    pub const fn cursor(&self) -> &PageCursor {
        self.list.cursor()
    }

    /// Orders across all pages
    #[must_use]
    pub const fn total_elements(&self) -> u64 {
        self.list.total_elements()
    }

    /// Active filter
    #[must_use]
    pub const fn filter(&self) -> &OrderFilter {
        self.list.filter()
    }

    /// Order shown in the detail panel
    #[must_use]
    pub const fn selected(&self) -> Option<&Order> {
        self.selected.as_ref()
    }

    /// Latest problem to show the operator, list or detail
    #[must_use]
    pub fn diagnostic(&self) -> Option<&str> {
        self.diagnostic.as_deref().or_else(|| self.list.diagnostic())
    }

    /// Whether the status control is enabled for the signed-in role
    #[must_use]
    pub fn can_update_status(&self) -> bool {
        self.allows(Action::UpdateOrderStatus)
    }

    /// Whether the tracking and notes controls are enabled
    #[must_use]
    pub fn can_update_fulfilment(&self) -> bool {
        self.allows(Action::UpdateOrderFulfilment)
    }

    fn allows(&self, action: Action) -> bool {
        self.api
            .session()
            .role()
            .is_some_and(|role| is_allowed(role, action))
    }

    /// Fetch the current page with the current filter
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
    pub async fn apply_filter(&mut self, filter: OrderFilter) -> ScreenResult<()> {
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
    pub async fn query(&mut self, filter: OrderFilter, page: u32) -> ScreenResult<()> {
        let query = self.list.filtered(filter, page);
        self.fetch(query).await
    }

    /// Filter by status only, or clear the status filter with `None`
    ///
    /// # Errors
    ///
    /// Returns the fetch error.
    pub async fn filter_by_status(&mut self, status: Option<OrderStatus>) -> ScreenResult<()> {
        let filter = OrderFilter {
            status,
            ..self.list.filter().clone()
        };
        self.apply_filter(filter).await
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

    /// Advance one page; returns `false` without fetching on the last page
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

    /// Go back one page; returns `false` without fetching on page 0
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

    async fn fetch(&mut self, query: ListQuery<OrderFilter>) -> ScreenResult<()> {
        let ticket = self.list.issue();
        debug!(page = query.cursor.page, status = ?query.filter.status, "Fetching orders");
        let outcome = self.api.list_orders(&query.cursor, &query.filter).await;
        self.list.settle(ticket, query, outcome)
    }

    /// Load an order into the detail panel
    ///
    /// # Errors
    ///
    /// Returns the fetch error; the previous selection stays.
    pub async fn select(&mut self, id: Uuid) -> ScreenResult<&Order> {
        let result = self.api.get_order(id).await;
        let order = self.record(result)?;
        Ok(&*self.selected.insert(order))
    }

    /// Close the detail panel
    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    /// Move the selected order to `status`
    ///
    /// # Errors
    ///
    /// [`ScreenError::Denied`] if the role may not change status,
    /// [`ScreenError::NoSelection`] without a selection, or the request error.
    pub async fn update_status(
        &mut self,
        status: OrderStatus,
        message: Option<String>,
    ) -> ScreenResult<&Order> {
        require(self.api.as_ref(), Action::UpdateOrderStatus)?;
        let id = self.selected_id()?;

        let result = self.api.update_order_status(id, status, message).await;
        let updated = self.record(result)?;
        info!(order_id = %id, %status, "Status change accepted");
        self.reconcile(updated).await
    }

    /// Set the selected order's tracking number
    ///
    /// # Errors
    ///
    /// As for [`update_status`](Self::update_status).
    pub async fn update_tracking(&mut self, tracking_number: &str) -> ScreenResult<&Order> {
        require(self.api.as_ref(), Action::UpdateOrderFulfilment)?;
        let id = self.selected_id()?;

        let result = self.api.update_tracking(id, tracking_number).await;
        let updated = self.record(result)?;
        self.reconcile(updated).await
    }

    /// Replace the selected order's notes
    ///
    /// # Errors
    ///
    /// As for [`update_status`](Self::update_status).
    pub async fn update_notes(&mut self, notes: &str) -> ScreenResult<&Order> {
        require(self.api.as_ref(), Action::UpdateOrderFulfilment)?;
        let id = self.selected_id()?;

        let result = self.api.add_notes(id, notes).await;
        let updated = self.record(result)?;
        self.reconcile(updated).await
    }

    fn selected_id(&self) -> ScreenResult<Uuid> {
        self.selected
            .as_ref()
            .map(|order| order.id)
            .ok_or(ScreenError::NoSelection)
    }

    fn record(&mut self, result: ClientResult<Order>) -> ScreenResult<Order> {
        match result {
            Ok(order) => {
                self.diagnostic = None;
                Ok(order)
            }
            Err(e) => {
                self.diagnostic = Some(e.to_string());
                Err(e.into())
            }
        }
    }

    /// Show the mutation result, then reload the list and the detail from
    /// the server
    async fn reconcile(&mut self, updated: Order) -> ScreenResult<&Order> {
        let id = updated.id;
        self.selected = Some(updated);

        let refreshed = self.refresh().await;
        follow_up(refreshed, &mut self.diagnostic)?;

        let detail = match self.api.get_order(id).await {
            Ok(order) => {
                self.selected = Some(order);
                Ok(())
            }
            Err(e) => Err(e.into()),
        };
        follow_up(detail, &mut self.diagnostic)?;

        self.selected.as_ref().ok_or(ScreenError::NoSelection)
    }
}
