//! List and detail screens
//!
//! Every screen owns its view state for as long as it is open. List screens
//! share [`ListState`], which pairs the page cursor with the rows last
//! received and discards responses that were overtaken by a newer fetch.

pub mod dashboard;
pub mod orders;
pub mod users;

pub use dashboard::{DashboardScreen, StatCard};
pub use orders::OrdersScreen;
pub use users::UsersScreen;

use crate::error::{ScreenError, ScreenResult};
use glossy_client::{AdminApi, ClientError, ClientResult};
use glossy_core::{Action, Page, PageCursor, User, is_allowed};
use tracing::{debug, warn};

/// Sequence number of a list fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ticket(u64);

/// Page and filter a list fetch is issued with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery<F> {
    /// Page to fetch
    pub cursor: PageCursor,
    /// Filter to apply
    pub filter: F,
}

/// Rows, position and filter of a paginated list.
///
/// Position and filter only change when a fetch for them succeeds, so the
/// cursor always describes the rows on screen.
#[derive(Debug, Clone)]
pub struct ListState<T, F> {
    query: ListQuery<F>,
    loaded: bool,
    rows: Vec<T>,
    total_elements: u64,
    latest: u64,
    diagnostic: Option<String>,
}

impl<T, F: Clone + Default> ListState<T, F> {
    /// Empty, unfiltered list on page 0
    #[must_use]
    pub fn new(page_size: u32) -> Self {
        Self {
            query: ListQuery {
                cursor: PageCursor::new(page_size),
                filter: F::default(),
            },
            loaded: false,
            rows: Vec::new(),
            total_elements: 0,
            latest: 0,
            diagnostic: None,
        }
    }

    /// Position of the rows on screen
    #[must_use]
    pub const fn cursor(&self) -> &PageCursor {
        &self.query.cursor
    }

    /// Filter of the rows on screen
    #[must_use]
    pub const fn filter(&self) -> &F {
        &self.query.filter
    }

    /// Rows of the last accepted page
    #[must_use]
    pub fn rows(&self) -> &[T] {
        &self.rows
    }

    /// Items across all pages, as last reported
    #[must_use]
    pub const fn total_elements(&self) -> u64 {
        self.total_elements
    }

    /// Message from the last failed fetch, cleared by the next success
    #[must_use]
    pub fn diagnostic(&self) -> Option<&str> {
        self.diagnostic.as_deref()
    }

    /// The query behind the rows on screen, for a reload
    #[must_use]
    pub fn current(&self) -> ListQuery<F> {
        self.query.clone()
    }

    /// The current filter on `page`
    ///
    /// # Errors
    ///
    /// [`ScreenError::PageOutOfRange`] once a fetch has reported fewer pages.
    pub fn page(&self, page: u32) -> ScreenResult<ListQuery<F>> {
        let cursor = self.query.cursor;
        if self.loaded && page > 0 && page >= cursor.total_pages {
            return Err(ScreenError::PageOutOfRange {
                page,
                total_pages: cursor.total_pages,
            });
        }
        Ok(ListQuery {
            cursor: PageCursor { page, ..cursor },
            filter: self.query.filter.clone(),
        })
    }

    /// `filter` on `page`; the page count of the current filter does not
    /// carry over
    #[must_use]
    pub const fn filtered(&self, filter: F, page: u32) -> ListQuery<F> {
        ListQuery {
            cursor: PageCursor {
                page,
                size: self.query.cursor.size,
                total_pages: 0,
            },
            filter,
        }
    }

    /// Start a fetch; only the newest ticket's response is kept
    pub const fn issue(&mut self) -> Ticket {
        self.latest += 1;
        Ticket(self.latest)
    }

    /// Whether `ticket` belongs to the newest fetch
    #[must_use]
    pub const fn is_current(&self, ticket: Ticket) -> bool {
        ticket.0 == self.latest
    }

    /// Apply the outcome of the fetch of `query` started with `ticket`.
    ///
    /// A stale outcome is dropped. A failure, or a page past the end,
    /// keeps the prior rows, position and filter and records a diagnostic.
    /// Success adopts `query` and the rows.
    ///
    /// # Errors
    ///
    /// Returns the fetch error, or [`ScreenError::PageOutOfRange`], when
    /// `ticket` is current.
    pub fn settle(
        &mut self,
        ticket: Ticket,
        query: ListQuery<F>,
        outcome: ClientResult<Page<T>>,
    ) -> ScreenResult<()> {
        if !self.is_current(ticket) {
            debug!(ticket = ticket.0, latest = self.latest, "Dropping stale list response");
            return Ok(());
        }

        let requested = query.cursor.page;
        match outcome {
            Ok(page) if requested > 0 && requested >= page.total_pages => {
                let error = ScreenError::PageOutOfRange {
                    page: requested,
                    total_pages: page.total_pages,
                };
                warn!(page = requested, total_pages = page.total_pages, "Page past the end");
                self.diagnostic = Some(error.to_string());
                Err(error)
            }
            Ok(page) => {
                self.query = query;
                self.query.cursor.absorb(&page);
                self.loaded = true;
                self.total_elements = page.total_elements;
                self.rows = page.content;
                self.diagnostic = None;
                Ok(())
            }
            Err(e) => {
                warn!(page = requested, error = %e, "List fetch failed");
                self.diagnostic = Some(e.to_string());
                Err(e.into())
            }
        }
    }
}

/// The signed-in user, or a login-forcing error
pub(crate) fn actor(api: &dyn AdminApi) -> ScreenResult<User> {
    api.session()
        .current_user()
        .ok_or(ScreenError::Client(ClientError::NotAuthenticated))
}

/// Refuse `action` unless the signed-in role allows it
pub(crate) fn require(api: &dyn AdminApi, action: Action) -> ScreenResult<User> {
    let user = actor(api)?;
    if is_allowed(user.role, action) {
        Ok(user)
    } else {
        debug!(role = %user.role, %action, "Action denied");
        Err(ScreenError::Denied(action))
    }
}

/// Outcome of a re-fetch after a mutation that already succeeded.
///
/// A rejected credential still propagates; anything else only leaves a
/// diagnostic behind.
pub(crate) fn follow_up(
    result: ScreenResult<()>,
    diagnostic: &mut Option<String>,
) -> ScreenResult<()> {
    match result {
        Err(e) if e.requires_login() => Err(e),
        Err(e) => {
            warn!(error = %e, "Refresh after update failed");
            *diagnostic = Some(e.to_string());
            Ok(())
        }
        Ok(()) => Ok(()),
    }
}
