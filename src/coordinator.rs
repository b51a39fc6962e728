//! Refresh cycle for one account
//!
//! A cycle logs in, reads the yearly summary, the current month, the price
//! list and the rolling hourly table, back-fills any newly closed months and
//! rebuilds the historical series. Only a failed login aborts the cycle;
//! every other failed fetch is logged and leaves its fields empty.

use crate::consumption::{
    parse_current_month_table, parse_hourly_rolling, parse_yearly_table,
};
use crate::consumption::{CostReading, Reading};
use crate::error::{EcoguardError, Result};
use crate::history::{CycleData, HistoryEngine, HistoryState};
use crate::logging::{LogContext, StructuredLogger, get_logger_with_context};
use crate::portal::{Portal, PortalConnector};
use crate::session::{AuthOutcome, AuthState};
use crate::snapshot::Snapshot;
use crate::table::extract_price;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;

pub struct Coordinator<C: PortalConnector> {
    connector: C,
    tz: Tz,
    history: HistoryEngine,
    auth_state: AuthState,
    portal: Option<C::Portal>,
    logger: StructuredLogger,
}

impl<C: PortalConnector> Coordinator<C> {
    pub fn new(connector: C, tz: Tz) -> Self {
        Self {
            connector,
            tz,
            history: HistoryEngine::new(tz),
            auth_state: AuthState::Unauthenticated,
            portal: None,
            logger: get_logger_with_context(LogContext::new("coordinator")),
        }
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    pub fn auth_state(&self) -> &AuthState {
        &self.auth_state
    }

    /// Latest reconciled energy series
    pub fn historical_entries(&self) -> &[Reading] {
        self.history.historical_entries()
    }

    /// Latest reconciled series with rates
    pub fn historical_cost_entries(&self) -> &[CostReading] {
        self.history.historical_cost_entries()
    }

    /// Cache state worth persisting
    pub fn history_state(&self) -> &HistoryState {
        self.history.state()
    }

    pub fn restore_history(&mut self, state: HistoryState) {
        self.history.restore(state);
    }

    /// Run one cycle at the current time
    pub async fn refresh(&mut self) -> Result<Snapshot> {
        let now = Utc::now().with_timezone(&self.tz);
        self.refresh_at(now).await
    }

    /// Run one cycle with `now` as reference instant
    pub async fn refresh_at(&mut self, now: DateTime<Tz>) -> Result<Snapshot> {
        let cycle_id = uuid::Uuid::new_v4().to_string();
        let logger = self.logger.for_cycle(&cycle_id);
        logger.info("Starting refresh cycle");

        // A cancelled cycle may have left its session open
        self.close_session().await;

        self.auth_state = AuthState::LoggingIn;
        let outcome = AuthOutcome::from(self.connector.connect().await);
        self.auth_state = outcome.state();
        let portal = match outcome.into_result() {
            Ok(portal) => portal,
            Err(e) => {
                logger.error(&format!("Login failed: {}", e));
                return Err(e);
            }
        };
        let portal = self.portal.insert(portal);

        let mut snapshot = Snapshot {
            refreshed_at: Some(now.fixed_offset()),
            ..Snapshot::default()
        };
        let mut data = CycleData::default();

        match portal
            .yearly_table()
            .await
            .and_then(|html| parse_yearly_table(&html))
        {
            Ok(yearly) => {
                snapshot.apply_yearly(&yearly);
                data.yearly = Some(yearly);
            }
            Err(e) => log_failed_fetch(&logger, "yearly", &e),
        }

        match portal
            .current_month_table()
            .await
            .and_then(|html| parse_current_month_table(&html))
        {
            Ok(current) => {
                snapshot.apply_current_month(&current);
                data.current = Some(current);
            }
            Err(e) => log_failed_fetch(&logger, "monthly", &e),
        }

        match portal.price_lists().await.and_then(|json| extract_price(&json)) {
            Ok(Some(price)) => {
                snapshot.apply_price(&price);
                data.current_rate = Some(price.rate);
            }
            Ok(None) => logger.warn("Price list has no current rate"),
            Err(e) => log_failed_fetch(&logger, "pricelists", &e),
        }

        match portal
            .latest_day_table()
            .await
            .and_then(|html| parse_hourly_rolling(&html, &now))
        {
            Ok(hourly) => data.hourly = hourly,
            Err(e) => log_failed_fetch(&logger, "hourly", &e),
        }

        self.history.reconcile(&*portal, &data, &now).await;
        self.close_session().await;

        logger.info(&format!(
            "Refresh cycle complete: {} readings, {} cached months",
            self.history.historical_entries().len(),
            self.history.month_cache().len()
        ));
        Ok(snapshot)
    }

    /// Release any open session
    pub async fn shutdown(&mut self) {
        self.close_session().await;
        self.auth_state = AuthState::Unauthenticated;
        self.logger.info("Coordinator shut down");
    }

    async fn close_session(&mut self) {
        if let Some(mut portal) = self.portal.take() {
            portal.close().await;
        }
    }
}

fn log_failed_fetch(logger: &StructuredLogger, name: &str, err: &EcoguardError) {
    logger.warn(&format!("Failed to fetch {} data: {}", name, err));
}
