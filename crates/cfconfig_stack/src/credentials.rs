//! Temporary credentials and the provider that caches them.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::api::RoleAssumer;
use crate::error::StackResult;

/// Profile name that skips role assumption and uses the ambient chain.
pub const ROOT_PROFILE: &str = "root";

/// Session name passed to every role assumption.
pub const SESSION_NAME: &str = "CFBuildSession";

/// Default margin before expiry at which cached credentials are refreshed.
pub const DEFAULT_REFRESH_MARGIN_SECS: i64 = 300;

/// Temporary credentials returned by role assumption.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Credentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: String,
    #[serde(default)]
    pub expiration: Option<DateTime<Utc>>,
}

impl Credentials {
    pub fn new(
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        session_token: impl Into<String>,
    ) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            session_token: session_token.into(),
            expiration: None,
        }
    }

    pub fn with_expiration(mut self, expiration: DateTime<Utc>) -> Self {
        self.expiration = Some(expiration);
        self
    }

    /// True when the credentials expire within `margin` from now.
    /// Credentials without an expiration never expire.
    pub fn expires_within(&self, margin: Duration) -> bool {
        match self.expiration {
            Some(expiration) => expiration - Utc::now() <= margin,
            None => false,
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("session_token", &"<redacted>")
            .field("expiration", &self.expiration)
            .finish()
    }
}

/// Identity an API call runs under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Session {
    /// Whatever the adapter's own credential chain resolves.
    Ambient,
    /// Temporary credentials from role assumption.
    Assumed(Credentials),
}

/// Who deploys, with which base identity, into which environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployContext {
    /// ARN of the role to assume.
    pub role: String,
    /// Base profile; [`ROOT_PROFILE`] disables role assumption.
    pub profile: String,
    pub environment: String,
}

impl DeployContext {
    pub fn new(
        role: impl Into<String>,
        profile: impl Into<String>,
        environment: impl Into<String>,
    ) -> Self {
        Self {
            role: role.into(),
            profile: profile.into(),
            environment: environment.into(),
        }
    }

    pub fn is_root(&self) -> bool {
        self.profile == ROOT_PROFILE
    }
}

/// Provider state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialState {
    Unresolved,
    Cached(Session),
}

/// Resolves and caches the session used for stack operations.
pub struct CredentialProvider {
    role: String,
    profile: String,
    assumer: Arc<dyn RoleAssumer>,
    refresh_margin: Duration,
    state: CredentialState,
}

impl CredentialProvider {
    pub fn new(context: &DeployContext, assumer: Arc<dyn RoleAssumer>) -> Self {
        Self {
            role: context.role.clone(),
            profile: context.profile.clone(),
            assumer,
            refresh_margin: Duration::seconds(DEFAULT_REFRESH_MARGIN_SECS),
            state: CredentialState::Unresolved,
        }
    }

    pub fn with_refresh_margin(mut self, margin: Duration) -> Self {
        self.refresh_margin = margin;
        self
    }

    pub fn state(&self) -> &CredentialState {
        &self.state
    }

    pub fn is_cached(&self) -> bool {
        matches!(self.state, CredentialState::Cached(_))
    }

    /// Session for the next API call.
    ///
    /// Cached sessions are returned without a network call unless they are
    /// about to expire.
    pub async fn credentials(&mut self) -> StackResult<Session> {
        if let CredentialState::Cached(session) = &self.state {
            match session {
                Session::Assumed(creds) if creds.expires_within(self.refresh_margin) => {
                    debug!("Cached credentials for {} expire soon, refreshing", self.role);
                }
                _ => return Ok(session.clone()),
            }
        }

        let session = self.resolve().await?;
        self.state = CredentialState::Cached(session.clone());
        Ok(session)
    }

    /// Drop the cached session; the next call resolves again.
    pub fn invalidate(&mut self) {
        debug!("Invalidating cached credentials");
        self.state = CredentialState::Unresolved;
    }

    async fn resolve(&self) -> StackResult<Session> {
        if self.profile == ROOT_PROFILE {
            info!("Profile '{}' uses ambient credentials", ROOT_PROFILE);
            return Ok(Session::Ambient);
        }

        info!("Assuming role {}", self.role);
        let credentials = self.assumer.assume_role(&self.role, SESSION_NAME).await?;
        Ok(Session::Assumed(credentials))
    }
}

impl std::fmt::Debug for CredentialProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialProvider")
            .field("role", &self.role)
            .field("profile", &self.profile)
            .field("refresh_margin", &self.refresh_margin)
            .field("cached", &self.is_cached())
            .finish()
    }
}
