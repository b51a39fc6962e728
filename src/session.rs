//! Portal session and login handshake
//!
//! A session is a cookie-bearing HTTP client that has completed the
//! anti-forgery login form. Sessions are single use: one is created at the
//! start of every refresh cycle and closed at its end.

use crate::error::{EcoguardError, Result};
use crate::logging::get_logger;
use crate::normalize::domain_path;
use crate::table::extract_input_value;
use reqwest::Client;
use std::time::Duration;

/// Name of the hidden anti-forgery field on the login page
pub const TOKEN_FIELD: &str = "__RequestVerificationToken";

/// Maximum redirects followed by one request
const MAX_REDIRECTS: usize = 10;

/// Account credentials
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Rentable object number
    pub username: String,
    pub password: String,
    /// Housing database name as shown on the login page
    pub database: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .field("database", &self.database)
            .finish()
    }
}

/// Connection settings for the portal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortalSettings {
    /// Base URL without trailing slash
    pub base_url: String,
    pub login_path: String,
    pub utility_code: String,
    pub timeout: Duration,
    pub user_agent: String,
}

/// Authentication state of an account
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    Unauthenticated,
    LoggingIn,
    Authenticated,
    /// Credentials rejected; carries the portal's reason
    AuthFailed(String),
}

/// Result of a login attempt
#[derive(Debug)]
pub enum AuthOutcome<S = PortalSession> {
    Authenticated(S),
    /// Credentials rejected by the portal
    AuthFailed(String),
    /// Network failure or error status; may succeed on a later attempt
    TransportFailed(String),
    /// The login page did not have the expected structure
    ProtocolFailed(String),
}

impl<S> From<Result<S>> for AuthOutcome<S> {
    fn from(result: Result<S>) -> Self {
        match result {
            Ok(session) => AuthOutcome::Authenticated(session),
            Err(e @ EcoguardError::Authentication { .. }) => {
                AuthOutcome::AuthFailed(e.message().to_string())
            }
            Err(e @ EcoguardError::Transport { .. }) => {
                AuthOutcome::TransportFailed(e.message().to_string())
            }
            Err(e) => AuthOutcome::ProtocolFailed(e.message().to_string()),
        }
    }
}

impl<S> AuthOutcome<S> {
    /// State the account is in after this outcome
    pub fn state(&self) -> AuthState {
        match self {
            AuthOutcome::Authenticated(_) => AuthState::Authenticated,
            AuthOutcome::AuthFailed(reason) => AuthState::AuthFailed(reason.clone()),
            AuthOutcome::TransportFailed(_) | AuthOutcome::ProtocolFailed(_) => {
                AuthState::Unauthenticated
            }
        }
    }

    /// Back to an error for callers that propagate with `?`
    pub fn into_result(self) -> Result<S> {
        match self {
            AuthOutcome::Authenticated(session) => Ok(session),
            AuthOutcome::AuthFailed(reason) => Err(EcoguardError::authentication(reason)),
            AuthOutcome::TransportFailed(reason) => Err(EcoguardError::transport(reason)),
            AuthOutcome::ProtocolFailed(reason) => Err(EcoguardError::protocol(reason)),
        }
    }
}

/// An authenticated portal session
#[derive(Debug)]
pub struct PortalSession {
    client: Client,
    settings: PortalSettings,
    domain_path: String,
    closed: bool,
}

impl PortalSession {
    pub fn settings(&self) -> &PortalSettings {
        &self.settings
    }

    /// URL prefix of every data endpoint for this account
    pub fn domain_path(&self) -> &str {
        &self.domain_path
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Body of `<base><domain path><suffix>`
    pub async fn get_text(&self, suffix: &str) -> Result<String> {
        if self.closed {
            return Err(EcoguardError::protocol("Session is closed"));
        }
        let url = format!("{}{}{}", self.settings.base_url, self.domain_path, suffix);
        let resp = self.client.get(&url).send().await?.error_for_status()?;
        if is_login_page(resp.url(), &self.settings.login_path) {
            return Err(EcoguardError::authentication(
                "Session expired, redirected to login page",
            ));
        }
        Ok(resp.text().await?)
    }

    /// Release the session; later requests are refused
    pub fn close(&mut self) {
        self.closed = true;
    }
}

fn is_login_page(url: &reqwest::Url, login_path: &str) -> bool {
    url.path()
        .to_lowercase()
        .contains(&login_path.to_lowercase())
}

fn build_client(settings: &PortalSettings) -> Result<Client> {
    Ok(Client::builder()
        .cookie_store(true)
        .timeout(settings.timeout)
        .user_agent(settings.user_agent.clone())
        .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
        .build()?)
}

/// Log in and return a fresh session.
///
/// Fetches the landing page for its anti-forgery token, posts the login form
/// and follows redirects. Landing back on the login page means the
/// credentials were rejected.
pub async fn login(settings: &PortalSettings, credentials: &Credentials) -> Result<PortalSession> {
    let logger = get_logger("session");
    let client = build_client(settings)?;

    logger.debug(&format!("Fetching login page {}", settings.base_url));
    let landing = client
        .get(format!("{}/", settings.base_url))
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;

    let token = extract_input_value(&landing, TOKEN_FIELD).ok_or_else(|| {
        EcoguardError::protocol("Could not find antiforgery token on login page")
    })?;

    let form = [
        ("RentableObjectNumber", credentials.username.as_str()),
        ("Password", credentials.password.as_str()),
        ("DatabaseName", credentials.database.as_str()),
        ("RememberMe", "true"),
        (TOKEN_FIELD, token.as_str()),
    ];
    let resp = client
        .post(format!("{}{}", settings.base_url, settings.login_path))
        .form(&form)
        .send()
        .await?
        .error_for_status()?;

    if is_login_page(resp.url(), &settings.login_path) {
        logger.warn(&format!(
            "Login rejected for object {}",
            credentials.username
        ));
        return Err(EcoguardError::authentication(
            "Login failed - check credentials",
        ));
    }

    logger.info(&format!("Logged in as object {}", credentials.username));
    Ok(PortalSession {
        client,
        settings: settings.clone(),
        domain_path: domain_path(&credentials.database, &credentials.username),
        closed: false,
    })
}

/// Log in on a throw-away session to confirm the credentials
pub async fn validate_credentials(
    settings: &PortalSettings,
    credentials: &Credentials,
) -> Result<()> {
    let mut session = login(settings, credentials).await?;
    session.close();
    Ok(())
}
