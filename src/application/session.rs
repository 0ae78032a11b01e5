//! Request-scoped identity.
//!
//! Authentication itself happens upstream; services only ever see a
//! [`Session`] value passed in by the caller.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;
use uuid::Uuid;

use crate::application::error::AppError;
use crate::application::repos::{Actor, ProfilesRepo};
use crate::domain::types::UserRole;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: Uuid,
    pub name: String,
    pub role: UserRole,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Session {
    #[default]
    Anonymous,
    Authenticated(Identity),
}

impl Session {
    pub fn authenticated(user_id: Uuid, name: impl Into<String>, role: UserRole) -> Self {
        Session::Authenticated(Identity {
            user_id,
            name: name.into(),
            role,
        })
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Session::Authenticated(_))
    }

    pub fn identity(&self) -> Option<&Identity> {
        match self {
            Session::Authenticated(identity) => Some(identity),
            Session::Anonymous => None,
        }
    }

    pub fn require_authenticated(&self) -> Result<&Identity, AppError> {
        self.identity().ok_or(AppError::Unauthenticated)
    }

    /// The store-level actor for a mutating call.
    pub fn actor(&self) -> Result<Actor, AppError> {
        let identity = self.require_authenticated()?;
        Ok(Actor {
            user_id: identity.user_id,
            role: identity.role,
        })
    }
}

/// A user id the gateway authenticated. It may not have a profile yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subject(Uuid);

impl Subject {
    pub fn new(user_id: Uuid) -> Self {
        Self(user_id)
    }

    /// Parse the forwarded subject. A missing or blank value is `None`.
    pub fn parse(raw: Option<&str>) -> Result<Option<Self>, AppError> {
        let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
            return Ok(None);
        };
        let user_id = Uuid::parse_str(raw).map_err(|_| {
            debug!(subject = raw, "Rejected malformed identity subject");
            AppError::Unauthenticated
        })?;
        Ok(Some(Self(user_id)))
    }

    pub fn user_id(&self) -> Uuid {
        self.0
    }
}

/// Resolves the subject forwarded by the authentication gateway into a session.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// `None` means no subject was presented; the session is anonymous.
    async fn current_session(&self, subject: Option<&str>) -> Result<Session, AppError>;
}

/// Trusts the gateway's subject id and looks it up in the profiles table.
#[derive(Clone)]
pub struct ProfileIdentityProvider {
    profiles: Arc<dyn ProfilesRepo>,
}

impl ProfileIdentityProvider {
    pub fn new(profiles: Arc<dyn ProfilesRepo>) -> Self {
        Self { profiles }
    }
}

#[async_trait]
impl IdentityProvider for ProfileIdentityProvider {
    async fn current_session(&self, subject: Option<&str>) -> Result<Session, AppError> {
        let Some(subject) = Subject::parse(subject)? else {
            return Ok(Session::Anonymous);
        };
        let user_id = subject.user_id();

        match self.profiles.find_profile(user_id).await? {
            Some(profile) => Ok(Session::authenticated(profile.id, profile.name, profile.role)),
            None => {
                debug!(%user_id, "Identity subject has no profile");
                Err(AppError::Unauthenticated)
            }
        }
    }
}
