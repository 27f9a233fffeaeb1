//! Plain-text rendering of screens for the terminal

use crate::navigation::MenuItem;
use crate::screens::StatCard;
use crate::screens::dashboard::format_money;
use chrono::NaiveDateTime;
use glossy_core::types::{OrdersByStatus, TopSize};
use glossy_core::{Order, PageCursor, User};
use std::fmt::Write;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

fn timestamp(value: Option<NaiveDateTime>) -> String {
    value.map_or_else(|| "-".to_string(), |t| t.format(TIMESTAMP_FORMAT).to_string())
}

fn or_dash(value: Option<&str>) -> &str {
    value.filter(|v| !v.is_empty()).unwrap_or("-")
}

fn line<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    cells
        .zip(widths)
        .map(|(cell, &width)| format!("{cell:<width$}"))
        .collect::<Vec<_>>()
        .join("  ")
        .trim_end()
        .to_string()
}

/// Left-aligned table with a header row
fn table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = line(headers.iter().copied(), &widths);
    out.push('\n');
    for row in rows {
        out.push_str(&line(row.iter().map(String::as_str), &widths));
        out.push('\n');
    }
    out
}

/// Pagination footer, e.g. `Page 1 of 3 (45 total) [next]`
#[must_use]
pub fn pager(cursor: &PageCursor, total_elements: u64) -> String {
    let mut footer = format!("{} ({total_elements} total)", cursor.label());
    if cursor.has_previous() {
        footer.push_str(" [previous]");
    }
    if cursor.has_next() {
        footer.push_str(" [next]");
    }
    footer
}

/// Order list
#[must_use]
pub fn orders_table(orders: &[Order]) -> String {
    if orders.is_empty() {
        return "No orders found.\n".to_string();
    }

    let rows: Vec<Vec<String>> = orders
        .iter()
        .map(|order| {
            vec![
                order.order_number.clone(),
                order.customer_name.clone(),
                order.status.to_string(),
                order.payment_status.to_string(),
                format_money(order.total),
                timestamp(order.created_at),
                order.id.to_string(),
            ]
        })
        .collect();

    table(
        &["NUMBER", "CUSTOMER", "STATUS", "PAYMENT", "TOTAL", "CREATED", "ID"],
        &rows,
    )
}

/// Order detail panel
#[must_use]
pub fn order_detail(order: &Order) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Order {}", order.order_number);
    let _ = writeln!(out, "  ID:        {}", order.id);
    let _ = writeln!(out, "  Customer:  {} <{}>", order.customer_name, order.customer_email);
    let _ = writeln!(out, "  Phone:     {}", or_dash(order.customer_phone.as_deref()));
    let _ = writeln!(out, "  State:     {}", or_dash(order.customer_state.as_deref()));
    let _ = writeln!(out, "  Status:    {}", order.status);
    let method = or_dash(order.payment_method.as_deref());
    let _ = writeln!(out, "  Payment:   {} ({method})", order.payment_status);
    let _ = writeln!(out, "  Subtotal:  {}", format_money(order.subtotal));
    let _ = writeln!(out, "  Shipping:  {}", format_money(order.shipping));
    let _ = writeln!(out, "  Total:     {}", format_money(order.total));
    let _ = writeln!(out, "  Tracking:  {}", or_dash(order.tracking_number.as_deref()));
    let _ = writeln!(out, "  Notes:     {}", or_dash(order.notes.as_deref()));
    let _ = writeln!(out, "  Created:   {}", timestamp(order.created_at));
    if order.paid_at.is_some() {
        let _ = writeln!(out, "  Paid:      {}", timestamp(order.paid_at));
    }
    if order.shipped_at.is_some() {
        let _ = writeln!(out, "  Shipped:   {}", timestamp(order.shipped_at));
    }
    if order.delivered_at.is_some() {
        let _ = writeln!(out, "  Delivered: {}", timestamp(order.delivered_at));
    }
    if let Some(reason) = order.cancel_reason.as_deref() {
        let _ = writeln!(out, "  Cancelled: {} ({reason})", timestamp(order.cancelled_at));
    }

    if let Some(items) = order.items.as_deref().filter(|items| !items.is_empty()) {
        out.push_str("\nItems\n");
        let rows: Vec<Vec<String>> = items
            .iter()
            .map(|item| {
                vec![
                    item.size_name.clone(),
                    item.quantity.to_string(),
                    format_money(item.unit_price),
                    format_money(item.total_price),
                ]
            })
            .collect();
        out.push_str(&table(&["SIZE", "QTY", "UNIT", "TOTAL"], &rows));
    }

    if let Some(history) = order.status_history.as_deref().filter(|h| !h.is_empty()) {
        out.push_str("\nHistory\n");
        let rows: Vec<Vec<String>> = history
            .iter()
            .map(|entry| {
                vec![
                    timestamp(entry.created_at),
                    entry.status.to_string(),
                    or_dash(entry.message.as_deref()).to_string(),
                ]
            })
            .collect();
        out.push_str(&table(&["WHEN", "STATUS", "MESSAGE"], &rows));
    }

    out
}

/// User list
#[must_use]
pub fn users_table(users: &[User]) -> String {
    if users.is_empty() {
        return "No users found.\n".to_string();
    }

    let rows: Vec<Vec<String>> = users
        .iter()
        .map(|user| {
            vec![
                user.name.clone(),
                user.email.clone(),
                user.role.to_string(),
                if user.is_active() { "yes" } else { "no" }.to_string(),
                timestamp(user.created_at),
                user.id.to_string(),
            ]
        })
        .collect();

    table(&["NAME", "EMAIL", "ROLE", "ACTIVE", "JOINED", "ID"], &rows)
}

/// User detail panel
#[must_use]
pub fn user_detail(user: &User) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", user.name);
    let _ = writeln!(out, "  ID:        {}", user.id);
    let _ = writeln!(out, "  Email:     {}", user.email);
    let _ = writeln!(out, "  Phone:     {}", or_dash(user.phone.as_deref()));
    let _ = writeln!(out, "  Role:      {}", user.role);
    let _ = writeln!(out, "  Active:    {}", if user.is_active() { "yes" } else { "no" });
    if let Some(code) = user.affiliate_code.as_deref() {
        let _ = writeln!(out, "  Affiliate: {code}");
    }
    let _ = writeln!(out, "  Joined:    {}", timestamp(user.created_at));
    if user.updated_at.is_some() {
        let _ = writeln!(out, "  Updated:   {}", timestamp(user.updated_at));
    }
    out
}

/// Dashboard cards and breakdowns
#[must_use]
pub fn dashboard(
    cards: &[StatCard],
    by_status: Option<&OrdersByStatus>,
    top_sizes: Option<&[TopSize]>,
) -> String {
    if cards.is_empty() {
        return "No statistics available for your role.\n".to_string();
    }

    let width = cards.iter().map(|c| c.label.len()).max().unwrap_or(0);
    let mut out = String::new();
    for card in cards {
        let _ = writeln!(out, "{:<width$}  {}", card.label, card.value);
    }

    if let Some(counts) = by_status.filter(|c| !c.is_empty()) {
        out.push_str("\nOrders by status\n");
        let rows: Vec<Vec<String>> = counts
            .iter()
            .map(|(status, count)| vec![status.to_string(), count.to_string()])
            .collect();
        out.push_str(&table(&["STATUS", "ORDERS"], &rows));
    }

    if let Some(sizes) = top_sizes.filter(|s| !s.is_empty()) {
        out.push_str("\nTop sizes\n");
        let rows: Vec<Vec<String>> = sizes
            .iter()
            .map(|size| vec![size.size_name.clone(), size.quantity.to_string()])
            .collect();
        out.push_str(&table(&["SIZE", "PRINTS"], &rows));
    }

    out
}

/// Navigation menu, marking the current entry
#[must_use]
pub fn menu(items: &[MenuItem], current: Option<crate::navigation::Route>) -> String {
    let mut out = String::new();
    for item in items {
        let marker = if Some(item.route) == current { '*' } else { ' ' };
        let _ = writeln!(out, "{marker} {:<10} {}", item.label, item.route);
    }
    out
}
