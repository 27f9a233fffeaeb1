//! Statistics overview

use super::actor;
use crate::error::ScreenResult;
use glossy_client::AdminApi;
use glossy_core::types::{OrdersByStatus, TopSize};
use glossy_core::{Action, Role, StatsOverview, is_allowed};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{debug, warn};

/// One figure on the dashboard
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatCard {
    /// Card title
    pub label: &'static str,
    /// Formatted figure
    pub value: String,
}

impl StatCard {
    fn count(label: &'static str, value: u64) -> Self {
        Self {
            label,
            value: value.to_string(),
        }
    }
}

/// Dashboard screen state
pub struct DashboardScreen {
    api: Arc<dyn AdminApi>,
    role: Option<Role>,
    overview: Option<StatsOverview>,
    by_status: Option<OrdersByStatus>,
    top_sizes: Option<Vec<TopSize>>,
    diagnostic: Option<String>,
}

impl std::fmt::Debug for DashboardScreen {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DashboardScreen")
            .field("role", &self.role)
            .field("overview", &self.overview)
            .finish_non_exhaustive()
    }
}

impl DashboardScreen {
    /// Open the dashboard
    #[must_use]
    pub fn new(api: Arc<dyn AdminApi>) -> Self {
        Self {
            api,
            role: None,
            overview: None,
            by_status: None,
            top_sizes: None,
            diagnostic: None,
        }
    }

    /// Whether the signed-in role gets statistics at all
    #[must_use]
    pub fn shows_stats(&self) -> bool {
        self.role
            .is_some_and(|role| is_allowed(role, Action::ViewDashboardStats))
    }

    /// Load the counters the signed-in role may see.
    ///
    /// Roles without access to statistics make no request. A failed
    /// breakdown leaves a diagnostic and keeps what was loaded before.
    ///
    /// # Errors
    ///
    /// Returns an error when the session is gone, or when the overview
    /// request fails.
    pub async fn refresh(&mut self) -> ScreenResult<()> {
        let user = actor(self.api.as_ref())?;
        self.role = Some(user.role);

        if !self.shows_stats() {
            debug!(role = %user.role, "Statistics hidden for role");
            return Ok(());
        }

        match self.api.stats_overview().await {
            Ok(overview) => {
                self.overview = Some(overview);
                self.diagnostic = None;
            }
            Err(e) => {
                warn!(error = %e, "Failed to load statistics");
                self.diagnostic = Some(e.to_string());
                return Err(e.into());
            }
        }

        match self.api.orders_by_status().await {
            Ok(counts) => self.by_status = Some(counts),
            Err(e) if e.requires_login() => return Err(e.into()),
            Err(e) => self.diagnostic = Some(e.to_string()),
        }

        match self.api.top_sizes().await {
            Ok(sizes) => self.top_sizes = Some(sizes),
            Err(e) if e.requires_login() => return Err(e.into()),
            Err(e) => self.diagnostic = Some(e.to_string()),
        }

        Ok(())
    }

    /// Cards to display; revenue only for roles that may see it
    #[must_use]
    pub fn cards(&self) -> Vec<StatCard> {
        let (Some(role), Some(stats)) = (self.role, self.overview.as_ref()) else {
            return Vec::new();
        };

        let mut cards = vec![
            StatCard::count("Total Orders", stats.total_orders),
            StatCard::count("Pending", stats.pending_orders),
            StatCard::count("Processing", stats.processing_orders),
            StatCard::count("Delivered", stats.delivered_orders),
            StatCard::count("Cancelled", stats.cancelled_orders),
            StatCard::count("Awaiting Payment", stats.pending_payments),
        ];

        if is_allowed(role, Action::ViewRevenue) {
            cards.push(StatCard {
                label: "Total Revenue",
                value: format_money(stats.total_revenue.unwrap_or_default()),
            });
        }

        cards.push(StatCard::count("Total Customers", stats.total_customers));
        cards
    }

    /// Order counts per status, when loaded
    #[must_use]
    pub const fn orders_by_status(&self) -> Option<&OrdersByStatus> {
        self.by_status.as_ref()
    }

    /// Best-selling sizes, when loaded
    #[must_use]
    pub fn top_sizes(&self) -> Option<&[TopSize]> {
        self.top_sizes.as_deref()
    }

    /// Latest problem to show the operator
    #[must_use]
    pub fn diagnostic(&self) -> Option<&str> {
        self.diagnostic.as_deref()
    }
}

/// `$1234.50`
#[must_use]
pub fn format_money(amount: Decimal) -> String {
    format!("${:.2}", amount.round_dp(2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_format_money() {
        assert_eq!(format_money(Decimal::new(123_450, 2)), "$1234.50");
        assert_eq!(format_money(Decimal::ZERO), "$0.00");
        assert_eq!(format_money(Decimal::new(19_999, 3)), "$20.00");
    }
}
