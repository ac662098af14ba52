//! Session guard for the role dashboards.
//!
//! One policy is chosen per deployment. `PermissiveDemo` manufactures a demo
//! session when none is present; `StrictRedirect` sends the caller to the
//! landing page. The two are never mixed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{info, warn};

use crate::error::Result;
use crate::models::{Role, SessionRole};
use crate::seed;
use crate::storage::Store;

pub(crate) const ROLE_KEY: &str = "sb_role_v1";
pub(crate) const TOKEN_KEY: &str = "sb_token_v1";
pub(crate) const USER_KEY: &str = "sb_user_v1";

/// Keys cleared together with the collections on a full reset
pub(crate) const SESSION_KEYS: [&str; 3] = [ROLE_KEY, TOKEN_KEY, USER_KEY];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SessionPolicy {
    /// Seed demo data and mint a demo token when no valid session exists
    PermissiveDemo,
    /// Redirect to the landing page when no valid session exists
    StrictRedirect,
}

impl FromStr for SessionPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "permissive-demo" => Ok(Self::PermissiveDemo),
            "strict-redirect" => Ok(Self::StrictRedirect),
            other => Err(format!("unknown session policy: {other:?}")),
        }
    }
}

impl fmt::Display for SessionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::PermissiveDemo => "permissive-demo",
            Self::StrictRedirect => "strict-redirect",
        })
    }
}

/// Result of guarding a dashboard
#[derive(Debug, Clone, PartialEq)]
pub enum Access {
    /// A valid session for the role was already present
    Granted(SessionRole),
    /// No valid session; a demo session was created
    DemoSession(SessionRole),
    /// No valid session; the caller must go to this page
    Redirect(String),
}

impl Access {
    #[must_use]
    pub const fn is_granted(&self) -> bool {
        !matches!(self, Self::Redirect(_))
    }
}

#[derive(Debug, Clone)]
pub struct SessionGuard {
    store: Store,
    policy: SessionPolicy,
    landing_page: String,
    demo_token: String,
}

impl SessionGuard {
    pub fn new(store: Store, policy: SessionPolicy, landing_page: impl Into<String>, demo_token: impl Into<String>) -> Self {
        Self {
            store,
            policy,
            landing_page: landing_page.into(),
            demo_token: demo_token.into(),
        }
    }

    #[must_use]
    pub const fn policy(&self) -> SessionPolicy {
        self.policy
    }

    #[must_use]
    pub fn landing_page(&self) -> &str {
        &self.landing_page
    }

    /// Current session, if both role and token are present and well formed.
    pub fn current(&self) -> Result<Option<SessionRole>> {
        let role = self.store.read_key(ROLE_KEY)?;
        let token = self.store.read_key(TOKEN_KEY)?;
        let (Some(role), Some(token)) = (role, token) else {
            return Ok(None);
        };
        if token.trim().is_empty() {
            return Ok(None);
        }
        let Ok(role) = role.parse::<Role>() else {
            warn!(role = %role, "ignoring session with unknown role");
            return Ok(None);
        };
        let user = self
            .store
            .read_key(USER_KEY)?
            .and_then(|raw| serde_json::from_str(&raw).ok());
        Ok(Some(SessionRole { role, token, user }))
    }

    /// Gate access to the dashboard for `required`.
    pub fn protect(&self, required: Role, now: DateTime<Utc>) -> Result<Access> {
        if let Some(session) = self.current()? {
            if session.role == required {
                return Ok(Access::Granted(session));
            }
        }

        match self.policy {
            SessionPolicy::PermissiveDemo => {
                seed::ensure_seeded(&self.store, now)?;
                let session = SessionRole {
                    role: required,
                    token: self.demo_token.clone(),
                    user: None,
                };
                self.persist(&session)?;
                info!(role = %required, "demo session created");
                Ok(Access::DemoSession(session))
            }
            SessionPolicy::StrictRedirect => {
                info!(role = %required, landing = %self.landing_page, "no valid session, redirecting");
                Ok(Access::Redirect(self.landing_page.clone()))
            }
        }
    }

    /// Page an already authenticated visitor of the landing page goes to.
    pub fn resume(&self) -> Result<Option<&'static str>> {
        Ok(self.current()?.map(|s| s.role.dashboard_page()))
    }

    /// Store a session returned by login (or minted for demo mode).
    pub fn persist(&self, session: &SessionRole) -> Result<()> {
        self.store.write_key(ROLE_KEY, session.role.as_str())?;
        self.store.write_key(TOKEN_KEY, &session.token)?;
        match &session.user {
            Some(user) => self.store.write_key(USER_KEY, &serde_json::to_string(user)?)?,
            None => self.store.remove_key(USER_KEY)?,
        }
        Ok(())
    }

    /// Drop role, token and user; returns the landing page.
    pub fn logout(&self) -> Result<&str> {
        for key in SESSION_KEYS {
            self.store.remove_key(key)?;
        }
        info!("session cleared");
        Ok(self.landing_page.as_str())
    }
}
