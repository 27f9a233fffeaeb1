//! Routes, the navigation menu and route guards

use crate::error::ScreenError;
use glossy_client::Session;
use glossy_core::{Action, Role, is_allowed};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info};

/// A console surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Route {
    /// Sign-in surface
    Login,
    /// Statistics overview
    Dashboard,
    /// Order list and detail
    Orders,
    /// User list and detail
    Users,
}

impl Route {
    /// Every route
    pub const ALL: &'static [Self] = &[Self::Login, Self::Dashboard, Self::Orders, Self::Users];

    /// Path of the route
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Login => "/login",
            Self::Dashboard => "/dashboard",
            Self::Orders => "/dashboard/orders",
            Self::Users => "/dashboard/users",
        }
    }

    /// Action a role needs to open the route; `None` for public routes
    #[must_use]
    pub const fn required_action(self) -> Option<Action> {
        match self {
            Self::Login => None,
            Self::Dashboard => Some(Action::ViewDashboardMenu),
            Self::Orders => Some(Action::ViewOrdersMenu),
            Self::Users => Some(Action::ViewUsersMenu),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

impl FromStr for Route {
    type Err = glossy_core::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim_end_matches('/');
        Self::ALL
            .iter()
            .copied()
            .find(|route| route.path() == trimmed)
            .ok_or_else(|| glossy_core::Error::InvalidValue {
                kind: "route",
                value: s.to_string(),
            })
    }
}

/// A navigation menu entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MenuItem {
    /// Text shown in the menu
    pub label: &'static str,
    /// Where the entry leads
    pub route: Route,
}

const MENU: &[MenuItem] = &[
    MenuItem {
        label: "Dashboard",
        route: Route::Dashboard,
    },
    MenuItem {
        label: "Orders",
        route: Route::Orders,
    },
    MenuItem {
        label: "Users",
        route: Route::Users,
    },
];

/// Menu entries visible to `role`
#[must_use]
pub fn menu_for(role: Role) -> Vec<MenuItem> {
    MENU.iter()
        .filter(|item| {
            item.route
                .required_action()
                .is_none_or(|action| is_allowed(role, action))
        })
        .copied()
        .collect()
}

/// Where a request for `requested` actually lands.
///
/// Without a session everything but `/login` goes to `/login`; a signed-in
/// user asking for `/login` or a route their role may not open lands on
/// `/dashboard`.
#[must_use]
pub fn guard(session: &Session, requested: Route) -> Route {
    let Some(role) = session.role() else {
        return Route::Login;
    };

    match requested.required_action() {
        None => Route::Dashboard,
        Some(action) if is_allowed(role, action) => requested,
        Some(_) => Route::Dashboard,
    }
}

/// Tracks the current route
#[derive(Debug, Clone)]
pub struct Navigator {
    current: Route,
}

impl Default for Navigator {
    fn default() -> Self {
        Self::new()
    }
}

impl Navigator {
    /// Start on the login surface
    #[must_use]
    pub const fn new() -> Self {
        Self {
            current: Route::Login,
        }
    }

    /// Route currently shown
    #[must_use]
    pub const fn current(&self) -> Route {
        self.current
    }

    /// Move to `requested`, subject to [`guard`]
    pub fn navigate(&mut self, session: &Session, requested: Route) -> Route {
        let landed = guard(session, requested);
        if landed != requested {
            debug!(requested = %requested, landed = %landed, "Route redirected");
        }
        self.current = landed;
        landed
    }

    /// React to a failed operation; a rejected credential forces `/login`
    pub fn observe(&mut self, error: &ScreenError) {
        if error.requires_login() && self.current != Route::Login {
            info!(from = %self.current, "Returning to login");
            self.current = Route::Login;
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use glossy_client::mock::fixtures;
    use glossy_client::{BearerToken, ClientError, Credentials};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn session_for(role: Role) -> Session {
        let session = Session::in_memory();
        session
            .establish(Credentials {
                token: BearerToken::new("tok"),
                user: fixtures::user("Someone", role),
            })
            .unwrap();
        session
    }

    #[rstest]
    #[case(Role::Admin, vec!["Dashboard", "Orders", "Users"])]
    #[case(Role::Marketing, vec!["Dashboard", "Orders"])]
    #[case(Role::Packer, vec!["Dashboard", "Orders"])]
    #[case(Role::Affiliate, vec!["Dashboard", "Orders"])]
    #[case(Role::Customer, vec!["Dashboard", "Orders"])]
    fn test_menu_for_role(#[case] role: Role, #[case] expected: Vec<&str>) {
        let labels: Vec<&str> = menu_for(role).iter().map(|item| item.label).collect();
        assert_eq!(labels, expected);
    }

    #[rstest]
    #[case(Route::Login, Route::Login)]
    #[case(Route::Dashboard, Route::Login)]
    #[case(Route::Users, Route::Login)]
    fn test_guard_without_session(#[case] requested: Route, #[case] expected: Route) {
        assert_eq!(guard(&Session::in_memory(), requested), expected);
    }

    #[rstest]
    #[case(Role::Admin, Route::Users, Route::Users)]
    #[case(Role::Packer, Route::Users, Route::Dashboard)]
    #[case(Role::Packer, Route::Orders, Route::Orders)]
    #[case(Role::Marketing, Route::Login, Route::Dashboard)]
    fn test_guard_with_session(
        #[case] role: Role,
        #[case] requested: Route,
        #[case] expected: Route,
    ) {
        assert_eq!(guard(&session_for(role), requested), expected);
    }

    #[test]
    fn test_route_paths_parse() {
        for route in Route::ALL {
            assert_eq!(route.path().parse::<Route>().unwrap(), *route);
        }
        assert_eq!("/dashboard/orders/".parse::<Route>().unwrap(), Route::Orders);
        assert!("/admin".parse::<Route>().is_err());
    }

    #[test]
    fn test_unauthorized_sends_navigator_to_login() {
        let session = session_for(Role::Admin);
        let mut navigator = Navigator::new();
        assert_eq!(navigator.navigate(&session, Route::Orders), Route::Orders);

        navigator.observe(&ScreenError::Denied(Action::UpdateUserRole));
        assert_eq!(navigator.current(), Route::Orders);

        navigator.observe(&ScreenError::Client(ClientError::Unauthorized));
        assert_eq!(navigator.current(), Route::Login);
    }
}
