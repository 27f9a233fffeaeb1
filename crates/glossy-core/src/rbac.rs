//! Role-based gating of dashboard actions
//!
//! The table below is the single source of truth for what the console lets a
//! role attempt. Both navigation visibility and form-control enablement go
//! through [`is_allowed`], so a `(role, action)` pair answers the same way on
//! every path. The gate is advisory: the API authorizes every request again.

use crate::types::{Role, User};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Something a signed-in user may try to do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// See the Dashboard entry in the navigation menu
    ViewDashboardMenu,
    /// See the Orders entry in the navigation menu
    ViewOrdersMenu,
    /// See the Users entry in the navigation menu
    ViewUsersMenu,
    /// Load the dashboard counters
    ViewDashboardStats,
    /// See the revenue figure on the dashboard
    ViewRevenue,
    /// Change an order's status
    UpdateOrderStatus,
    /// Change an order's tracking number or notes
    UpdateOrderFulfilment,
    /// Change another account's role
    UpdateUserRole,
}

const EVERYONE: &[Role] = Role::ALL;
const ADMIN_ONLY: &[Role] = &[Role::Admin];
const STAFF: &[Role] = &[Role::Admin, Role::Marketing, Role::Packer];

impl Action {
    /// Every action, in declaration order
    pub const ALL: &'static [Self] = &[
        Self::ViewDashboardMenu,
        Self::ViewOrdersMenu,
        Self::ViewUsersMenu,
        Self::ViewDashboardStats,
        Self::ViewRevenue,
        Self::UpdateOrderStatus,
        Self::UpdateOrderFulfilment,
        Self::UpdateUserRole,
    ];

    /// Roles permitted to perform this action
    #[must_use]
    pub const fn allowed_roles(self) -> &'static [Role] {
        match self {
            Self::ViewDashboardMenu | Self::ViewOrdersMenu => EVERYONE,
            Self::ViewUsersMenu | Self::ViewRevenue | Self::UpdateUserRole => ADMIN_ONLY,
            Self::ViewDashboardStats | Self::UpdateOrderStatus | Self::UpdateOrderFulfilment => {
                STAFF
            }
        }
    }

    /// Short human label
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::ViewDashboardMenu => "view dashboard",
            Self::ViewOrdersMenu => "view orders",
            Self::ViewUsersMenu => "view users",
            Self::ViewDashboardStats => "view dashboard statistics",
            Self::ViewRevenue => "view revenue",
            Self::UpdateOrderStatus => "update order status",
            Self::UpdateOrderFulfilment => "update tracking and notes",
            Self::UpdateUserRole => "update user role",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Whether `role` may perform `action`
#[must_use]
pub fn is_allowed(role: Role, action: Action) -> bool {
    action.allowed_roles().contains(&role)
}

/// Whether `actor` may change the role of the account `target`.
///
/// Nobody edits their own role, administrators included.
#[must_use]
pub fn can_edit_role(actor: &User, target: Uuid) -> bool {
    actor.id != target && is_allowed(actor.role, Action::UpdateUserRole)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn user(role: Role) -> User {
        User {
            id: Uuid::new_v4(),
            email: format!("{}@example.com", role.as_str().to_lowercase()),
            name: role.to_string(),
            phone: None,
            avatar_url: None,
            role,
            affiliate_code: None,
            referred_by: None,
            active: Some(true),
            created_at: None,
            updated_at: None,
        }
    }

    #[rstest]
    #[case(Action::ViewUsersMenu, &[Role::Admin])]
    #[case(Action::UpdateOrderStatus, &[Role::Packer, Role::Marketing, Role::Admin])]
    #[case(Action::UpdateUserRole, &[Role::Admin])]
    #[case(Action::ViewRevenue, &[Role::Admin])]
    #[case(Action::ViewDashboardStats, &[Role::Packer, Role::Marketing, Role::Admin])]
    #[case(Action::UpdateOrderFulfilment, &[Role::Packer, Role::Marketing, Role::Admin])]
    #[case(Action::ViewOrdersMenu, Role::ALL)]
    #[case(Action::ViewDashboardMenu, Role::ALL)]
    fn test_policy_table(#[case] action: Action, #[case] expected: &[Role]) {
        let allowed: Vec<Role> = Role::ALL
            .iter()
            .copied()
            .filter(|role| is_allowed(*role, action))
            .collect();
        assert_eq!(allowed, expected.to_vec());
    }

    #[test]
    fn test_every_action_has_at_least_one_role() {
        for action in Action::ALL {
            assert!(!action.allowed_roles().is_empty(), "{action} has no roles");
        }
    }

    #[rstest]
    #[case(Role::Customer)]
    #[case(Role::Affiliate)]
    #[case(Role::Packer)]
    #[case(Role::Marketing)]
    #[case(Role::Admin)]
    fn test_nobody_edits_own_role(#[case] role: Role) {
        let actor = user(role);
        assert!(!can_edit_role(&actor, actor.id));
    }

    #[test]
    fn test_admin_edits_other_accounts() {
        let admin = user(Role::Admin);
        let other = user(Role::Customer);
        assert!(can_edit_role(&admin, other.id));

        let marketing = user(Role::Marketing);
        assert!(!can_edit_role(&marketing, other.id));
    }
}
