// adt-api: Async Rust client for the ADT Smart Security self-care portal

pub mod error;
pub mod portal;
pub mod transport;

pub use error::Error;
pub use portal::{
    ActionHandles, BatteryTier, Dashboard, DashboardDocument, PanelAction, PanelStatus,
    PortalClient, SensorReading, Session, parse_dashboard,
};
pub use transport::{TlsMode, TransportConfig};
