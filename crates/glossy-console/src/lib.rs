//! Admin console for the Polaroid Glossy order-management API
//!
//! The console is a thin presentation layer: [`screens`] hold list and detail
//! state, [`navigation`] decides which surface a role may open, and every
//! mutation goes through the shared [`glossy_client::AdminApi`]. Access
//! checks here only gate controls; the API authorizes each request again.

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

pub mod app;
pub mod error;
pub mod navigation;
pub mod render;
pub mod screens;

pub use app::Console;
pub use error::{ConsoleError, ScreenError, ScreenResult};
pub use navigation::{MenuItem, Navigator, Route, guard, menu_for};
pub use screens::{
    DashboardScreen, ListQuery, ListState, OrdersScreen, StatCard, Ticket, UsersScreen,
};
