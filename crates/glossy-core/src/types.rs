//! Domain records exchanged with the order-management API
//!
//! All records mirror the JSON the API produces (`camelCase` keys,
//! `SCREAMING_SNAKE_CASE` enum labels). Timestamps are server-local and
//! carry no offset, so they are kept as [`NaiveDateTime`].

use crate::error::Error;
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

/// Generates `Display`, `FromStr` and an `ALL` table for a wire-labelled enum.
macro_rules! wire_enum {
    ($name:ident, $kind:literal, [$($variant:ident => $label:literal),+ $(,)?]) => {
        impl $name {
            /// Every variant, in declaration order
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// Label used on the wire
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $label),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let normalized = s.trim().to_ascii_uppercase().replace('-', "_");
                match normalized.as_str() {
                    $($label => Ok(Self::$variant),)+
                    _ => Err(Error::InvalidValue {
                        kind: $kind,
                        value: s.to_string(),
                    }),
                }
            }
        }
    };
}

/// Role held by a user account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Shop customer
    Customer,
    /// Affiliate partner earning referral commission
    Affiliate,
    /// Warehouse staff packing orders
    Packer,
    /// Marketing staff
    Marketing,
    /// Administrator
    Admin,
}

wire_enum!(Role, "role", [
    Customer => "CUSTOMER",
    Affiliate => "AFFILIATE",
    Packer => "PACKER",
    Marketing => "MARKETING",
    Admin => "ADMIN",
]);

/// Fulfilment status of an order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Awaiting payment or review
    Pending,
    /// Being printed and packed
    Processing,
    /// Handed to the courier
    Posted,
    /// Out for delivery
    OnDelivery,
    /// Received by the customer
    Delivered,
    /// Cancelled before fulfilment
    Cancelled,
    /// Money returned to the customer
    Refunded,
}

wire_enum!(OrderStatus, "order status", [
    Pending => "PENDING",
    Processing => "PROCESSING",
    Posted => "POSTED",
    OnDelivery => "ON_DELIVERY",
    Delivered => "DELIVERED",
    Cancelled => "CANCELLED",
    Refunded => "REFUNDED",
]);

/// Payment status of an order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    /// Payment not yet confirmed
    Pending,
    /// Payment received
    Paid,
    /// Payment attempt failed
    Failed,
}

wire_enum!(PaymentStatus, "payment status", [
    Pending => "PENDING",
    Paid => "PAID",
    Failed => "FAILED",
]);

/// A user account as seen by the dashboard
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Account identifier
    pub id: Uuid,
    /// Login email
    pub email: String,
    /// Display name
    pub name: String,
    /// Contact phone
    #[serde(default)]
    pub phone: Option<String>,
    /// Avatar image URL
    #[serde(default)]
    pub avatar_url: Option<String>,
    /// Role of the account
    pub role: Role,
    /// Referral code for affiliates
    #[serde(default)]
    pub affiliate_code: Option<String>,
    /// Affiliate who referred this account
    #[serde(default)]
    pub referred_by: Option<String>,
    /// Whether the account is active; absent means unknown
    #[serde(default, rename = "isActive")]
    pub active: Option<bool>,
    /// Creation time
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
    /// Last update time
    #[serde(default)]
    pub updated_at: Option<NaiveDateTime>,
}

impl User {
    /// Whether the account is active (unknown counts as inactive)
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.unwrap_or(false)
    }
}

/// One printed product line of an order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    /// Line identifier
    pub id: String,
    /// Print size identifier
    #[serde(default)]
    pub size_id: Option<String>,
    /// Print size label
    pub size_name: String,
    /// Number of prints
    pub quantity: u32,
    /// Price per print
    pub unit_price: Decimal,
    /// Line total
    pub total_price: Decimal,
}

/// An entry in an order's status history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusHistoryEntry {
    /// Entry identifier
    pub id: String,
    /// Status the order moved to
    pub status: OrderStatus,
    /// Operator message attached to the change
    #[serde(default)]
    pub message: Option<String>,
    /// When the change happened
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
}

/// A customer order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    /// Order identifier
    pub id: Uuid,
    /// Human-facing order number
    pub order_number: String,
    /// Account that placed the order
    #[serde(default)]
    pub user_id: Option<String>,
    /// Affiliate credited with the order
    #[serde(default)]
    pub affiliate_id: Option<String>,
    /// Customer name snapshot
    pub customer_name: String,
    /// Customer email snapshot
    pub customer_email: String,
    /// Customer phone snapshot
    #[serde(default)]
    pub customer_phone: Option<String>,
    /// Delivery state
    #[serde(default)]
    pub customer_state: Option<String>,
    /// Fulfilment status
    pub status: OrderStatus,
    /// Payment status
    pub payment_status: PaymentStatus,
    /// Payment method label
    #[serde(default)]
    pub payment_method: Option<String>,
    /// Sum of line totals
    #[serde(default)]
    pub subtotal: Decimal,
    /// Shipping fee
    #[serde(default)]
    pub shipping: Decimal,
    /// Amount charged
    pub total: Decimal,
    /// When payment was confirmed
    #[serde(default)]
    pub paid_at: Option<NaiveDateTime>,
    /// Courier tracking number
    #[serde(default)]
    pub tracking_number: Option<String>,
    /// When the parcel was posted
    #[serde(default)]
    pub shipped_at: Option<NaiveDateTime>,
    /// When the parcel was delivered
    #[serde(default)]
    pub delivered_at: Option<NaiveDateTime>,
    /// When the order was cancelled
    #[serde(default)]
    pub cancelled_at: Option<NaiveDateTime>,
    /// Why the order was cancelled
    #[serde(default)]
    pub cancel_reason: Option<String>,
    /// Internal notes
    #[serde(default)]
    pub notes: Option<String>,
    /// Line items, when the API includes them
    #[serde(default)]
    pub items: Option<Vec<OrderItem>>,
    /// Status history, when the API includes it
    #[serde(default)]
    pub status_history: Option<Vec<StatusHistoryEntry>>,
    /// Creation time
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
    /// Last update time
    #[serde(default)]
    pub updated_at: Option<NaiveDateTime>,
}

/// Read-only aggregate counters for the dashboard
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StatsOverview {
    /// All orders
    pub total_orders: u64,
    /// Orders in `PENDING`
    pub pending_orders: u64,
    /// Orders in `PROCESSING`
    pub processing_orders: u64,
    /// Orders in `DELIVERED`
    pub delivered_orders: u64,
    /// Orders in `CANCELLED`
    pub cancelled_orders: u64,
    /// Orders whose payment was received
    pub paid_orders: u64,
    /// Orders still waiting for payment
    pub pending_payments: u64,
    /// Registered customers
    pub total_customers: u64,
    /// Revenue from paid orders, when the caller may see it
    pub total_revenue: Option<Decimal>,
}

/// Order counts keyed by status
pub type OrdersByStatus = BTreeMap<OrderStatus, u64>;

/// Print size ranked by quantity sold
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(String, u64)", into = "(String, u64)")]
pub struct TopSize {
    /// Print size label
    pub size_name: String,
    /// Prints sold
    pub quantity: u64,
}

impl From<(String, u64)> for TopSize {
    fn from((size_name, quantity): (String, u64)) -> Self {
        Self {
            size_name,
            quantity,
        }
    }
}

impl From<TopSize> for (String, u64) {
    fn from(size: TopSize) -> Self {
        (size.size_name, size.quantity)
    }
}

/// One page of a server-side collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    /// Items on this page
    pub content: Vec<T>,
    /// Items across all pages
    #[serde(default)]
    pub total_elements: u64,
    /// Number of pages
    #[serde(default)]
    pub total_pages: u32,
    /// Requested page size
    #[serde(default)]
    pub size: u32,
    /// Zero-based index of this page
    #[serde(default)]
    pub number: u32,
}

impl<T> Page<T> {
    /// A page with no items and no further pages
    #[must_use]
    pub const fn empty(size: u32) -> Self {
        Self {
            content: Vec::new(),
            total_elements: 0,
            total_pages: 0,
            size,
            number: 0,
        }
    }
}

/// Successful login or registration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    /// Bearer token for subsequent requests
    pub token: String,
    /// Refresh token, when the API issues one
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// The authenticated account
    pub user: User,
}

/// Body of `POST /auth/login`
#[derive(Debug, Clone, Serialize, Validate)]
pub struct LoginRequest {
    /// Login email
    #[validate(email)]
    pub email: String,
    /// Account password
    #[validate(length(min = 1))]
    pub password: String,
}

/// Body of `POST /auth/register`
#[derive(Debug, Clone, Serialize, Validate)]
pub struct RegisterRequest {
    /// Login email
    #[validate(email)]
    pub email: String,
    /// Account password
    #[validate(length(min = 6))]
    pub password: String,
    /// Display name
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    /// Contact phone
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// Body of `PUT /auth/profile`
#[derive(Debug, Clone, Default, Serialize, Validate)]
pub struct ProfileUpdate {
    /// New display name
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    /// New contact phone
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// Body of `PATCH /admin/orders/{id}/status`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusUpdate {
    /// Target status
    pub status: OrderStatus,
    /// Operator message recorded in the history
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Body of `PATCH /admin/orders/{id}/tracking`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingUpdate {
    /// Courier tracking number
    pub tracking_number: String,
}

/// Body of `POST /admin/orders/{id}/notes`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotesUpdate {
    /// Replacement notes
    pub notes: String,
}

/// Body of `PATCH /admin/users/{id}/role`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RoleUpdate {
    /// New role
    pub role: Role,
}

/// Filters accepted by the order listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderFilter {
    /// Only orders in this status
    pub status: Option<OrderStatus>,
    /// Only orders with this payment status
    pub payment_status: Option<PaymentStatus>,
    /// Only orders shipping to this state
    pub customer_state: Option<String>,
}

/// Filters accepted by the user listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserFilter {
    /// Only accounts with this role
    pub role: Option<Role>,
    /// Free-text search over name and email
    pub search: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn order_json() -> serde_json::Value {
        serde_json::json!({
            "id": "7f1c2a4e-5b6d-4c3e-9f10-2a3b4c5d6e7f",
            "orderNumber": "PG-20240101-0001",
            "customerName": "Aina",
            "customerEmail": "aina@example.com",
            "customerPhone": null,
            "customerState": "selangor",
            "status": "ON_DELIVERY",
            "paymentStatus": "PAID",
            "subtotal": 40,
            "shipping": 8,
            "total": 48,
            "trackingNumber": "JNT123",
            "notes": null,
            "createdAt": "2024-01-01T10:15:30",
            "statusHistory": [
                {
                    "id": "h1",
                    "status": "POSTED",
                    "message": "Posted",
                    "createdAt": "2024-01-02T09:00:00"
                }
            ]
        })
    }

    #[test]
    fn test_role_wire_labels() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"ADMIN\"");
        assert_eq!(
            serde_json::from_str::<Role>("\"MARKETING\"").unwrap(),
            Role::Marketing
        );
        assert_eq!(Role::ALL.len(), 5);
    }

    #[test]
    fn test_order_status_parsing_is_lenient_on_case_and_dashes() {
        assert_eq!("on-delivery".parse::<OrderStatus>().unwrap(), OrderStatus::OnDelivery);
        assert_eq!("posted".parse::<OrderStatus>().unwrap(), OrderStatus::Posted);
        assert!("SHIPPED".parse::<OrderStatus>().is_err());
        assert_eq!(OrderStatus::OnDelivery.to_string(), "ON_DELIVERY");
        assert_eq!(OrderStatus::ALL.len(), 7);
    }

    #[test]
    fn test_payment_status_display() {
        assert_eq!(PaymentStatus::Failed.to_string(), "FAILED");
        assert_eq!(PaymentStatus::ALL.len(), 3);
    }

    #[test]
    fn test_order_deserialization() {
        let order: Order = serde_json::from_value(order_json()).unwrap();

        assert_eq!(order.order_number, "PG-20240101-0001");
        assert_eq!(order.status, OrderStatus::OnDelivery);
        assert_eq!(order.payment_status, PaymentStatus::Paid);
        assert_eq!(order.total, Decimal::new(48, 0));
        assert_eq!(order.tracking_number.as_deref(), Some("JNT123"));
        assert!(order.notes.is_none());
        assert!(order.items.is_none());
        assert_eq!(order.status_history.unwrap().len(), 1);
        assert!(order.created_at.is_some());
    }

    #[test]
    fn test_user_without_active_flag_is_inactive() {
        let user: User = serde_json::from_value(serde_json::json!({
            "id": "0b4e7d8c-1111-4a2b-8c3d-444455556666",
            "email": "packer@example.com",
            "name": "Packer",
            "role": "PACKER",
            "isActive": null
        }))
        .unwrap();

        assert_eq!(user.role, Role::Packer);
        assert!(!user.is_active());
    }

    #[test]
    fn test_page_envelope() {
        let page: Page<u32> = serde_json::from_value(serde_json::json!({
            "content": [1, 2, 3],
            "totalElements": 43,
            "totalPages": 3,
            "size": 20,
            "number": 2,
            "first": false,
            "last": true
        }))
        .unwrap();

        assert_eq!(page.content, vec![1, 2, 3]);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.number, 2);
    }

    #[test]
    fn test_stats_overview_tolerates_missing_fields() {
        let stats: StatsOverview = serde_json::from_value(serde_json::json!({
            "totalOrders": 10,
            "pendingOrders": 2,
            "processingOrders": 3,
            "deliveredOrders": 4
        }))
        .unwrap();

        assert_eq!(stats.total_orders, 10);
        assert_eq!(stats.total_customers, 0);
        assert!(stats.total_revenue.is_none());
    }

    #[test]
    fn test_breakdowns_deserialize() {
        let by_status: OrdersByStatus =
            serde_json::from_str(r#"{"PENDING": 3, "DELIVERED": 9}"#).unwrap();
        assert_eq!(by_status.get(&OrderStatus::Delivered), Some(&9));

        let top: Vec<TopSize> = serde_json::from_str(r#"[["4R", 120], ["A4", 15]]"#).unwrap();
        assert_eq!(top[0].size_name, "4R");
        assert_eq!(top[1].quantity, 15);
    }

    #[test]
    fn test_request_bodies_skip_absent_fields() {
        let body = serde_json::to_value(StatusUpdate {
            status: OrderStatus::Posted,
            message: None,
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({"status": "POSTED"}));

        let body = serde_json::to_value(TrackingUpdate {
            tracking_number: "JNT999".to_string(),
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({"trackingNumber": "JNT999"}));
    }

    #[test]
    fn test_login_request_validation() {
        let valid = LoginRequest {
            email: "admin@example.com".to_string(),
            password: "secret".to_string(),
        };
        assert!(valid.validate().is_ok());

        let invalid = LoginRequest {
            email: "not-an-email".to_string(),
            password: String::new(),
        };
        assert!(invalid.validate().is_err());
    }
}
