// Portal wire types
//
// Raw values as they appear on the self-care dashboard. `adt-core`
// converts these into its canonical `SystemState`.

/// A fetched dashboard page, not yet interpreted.
#[derive(Debug, Clone)]
pub struct DashboardDocument {
    html: String,
}

impl DashboardDocument {
    pub fn new(html: impl Into<String>) -> Self {
        Self { html: html.into() }
    }

    pub fn html(&self) -> &str {
        &self.html
    }
}

/// Which activation button the dashboard highlights.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelStatus {
    Disarmed,
    Home,
    Away,
    /// Disarmed, and the panel refuses to arm until a fault is cleared.
    NotReady,
}

/// Coarse battery tier derived from the battery icon's `levN` class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatteryTier {
    Low,
    Medium,
    Full,
}

impl BatteryTier {
    pub fn percent(self) -> u8 {
        match self {
            Self::Low => 10,
            Self::Medium => 50,
            Self::Full => 100,
        }
    }

    pub fn is_low(self) -> bool {
        self == Self::Low
    }
}

/// One door/window marker on the dashboard.
///
/// The portal exposes no sensor ids; the enclosing container's title
/// is the only stable identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensorReading {
    pub name: String,
    pub open: bool,
}

/// The three commands the activation buttons trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelAction {
    Home,
    Away,
    Disarm,
}

/// Tokens scraped from a dashboard page that a command submission must
/// echo back. Only valid until the next scrape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionHandles {
    /// `javax.faces.ViewState` hidden field.
    pub view_state: String,
    pub home_action: String,
    pub away_action: String,
    pub disarm_action: String,
}

impl ActionHandles {
    /// The JSF component id that triggers `action`.
    pub fn action_id(&self, action: PanelAction) -> &str {
        match action {
            PanelAction::Home => &self.home_action,
            PanelAction::Away => &self.away_action,
            PanelAction::Disarm => &self.disarm_action,
        }
    }
}

/// Everything one dashboard scrape yields, produced atomically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dashboard {
    pub status: PanelStatus,
    pub battery: BatteryTier,
    pub sensors: Vec<SensorReading>,
    pub handles: ActionHandles,
}
