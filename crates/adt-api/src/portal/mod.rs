// Self-care portal
//
// Session login, dashboard fetch/parse and command submission against
// the JSF-based web dashboard.

pub mod action;
pub mod auth;
pub mod client;
pub mod dashboard;
pub(crate) mod document;
pub mod models;

pub use client::{PortalClient, Session};
pub use dashboard::parse_dashboard;
pub use models::{
    ActionHandles, BatteryTier, Dashboard, DashboardDocument, PanelAction, PanelStatus,
    SensorReading,
};
