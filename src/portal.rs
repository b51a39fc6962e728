//! Portal endpoints
//!
//! [`Portal`] is the set of pages one refresh cycle reads. [`PortalConnector`]
//! produces a freshly logged-in portal for each cycle.

use crate::error::Result;
use crate::session::{Credentials, PortalSession, PortalSettings, login};

/// Pages served to a logged-in account
#[async_trait::async_trait]
pub trait Portal: Send + Sync {
    /// Trailing-year summary table (month, kWh, cost)
    async fn yearly_table(&self) -> Result<String>;

    /// Daily table of the current month
    async fn current_month_table(&self) -> Result<String>;

    /// JSON price-list document
    async fn price_lists(&self) -> Result<String>;

    /// Daily table of the month starting at the given epoch second
    async fn month_table(&self, month_start_epoch: i64) -> Result<String>;

    /// Rolling 24-hour table
    async fn latest_day_table(&self) -> Result<String>;

    /// Release the session
    async fn close(&mut self) {}
}

#[async_trait::async_trait]
impl Portal for PortalSession {
    async fn yearly_table(&self) -> Result<String> {
        let suffix = format!(
            "/consumption/ViewLatestYearConsumptionTable?UtilityCode={}",
            self.settings().utility_code
        );
        self.get_text(&suffix).await
    }

    async fn current_month_table(&self) -> Result<String> {
        let suffix = format!(
            "/consumption/ViewCurrentMonthTable?UtilityCode={}",
            self.settings().utility_code
        );
        self.get_text(&suffix).await
    }

    async fn price_lists(&self) -> Result<String> {
        self.get_text("/pricelists").await
    }

    async fn month_table(&self, month_start_epoch: i64) -> Result<String> {
        let suffix = format!(
            "/consumption/ViewMonthTable/{}?UtilityCode={}",
            month_start_epoch,
            self.settings().utility_code
        );
        self.get_text(&suffix).await
    }

    async fn latest_day_table(&self) -> Result<String> {
        // This endpoint spells the parameter in lower camel case
        let suffix = format!(
            "/consumption/ViewLatestDayTable?utilityCode={}",
            self.settings().utility_code
        );
        self.get_text(&suffix).await
    }

    async fn close(&mut self) {
        PortalSession::close(self);
    }
}

/// Source of logged-in portals, one per refresh cycle
#[async_trait::async_trait]
pub trait PortalConnector: Send + Sync {
    type Portal: Portal;

    async fn connect(&self) -> Result<Self::Portal>;
}

/// Logs in over HTTPS with the configured credentials
#[derive(Debug, Clone)]
pub struct HttpConnector {
    settings: PortalSettings,
    credentials: Credentials,
}

impl HttpConnector {
    pub fn new(settings: PortalSettings, credentials: Credentials) -> Self {
        Self {
            settings,
            credentials,
        }
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }
}

#[async_trait::async_trait]
impl PortalConnector for HttpConnector {
    type Portal = PortalSession;

    async fn connect(&self) -> Result<PortalSession> {
        login(&self.settings, &self.credentials).await
    }
}
