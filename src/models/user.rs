use crate::models::permission::PermLevel;
use crate::users::hasher::PasswordHasher;
use serde::{Deserialize, Serialize};

/// Allowance entries older than this are dropped by the daily sweep
pub const CONNECTION_TTL_MILLIS: i64 = 86_400_000;

/// An IP address granted access at `date` (Unix epoch milliseconds)
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllowedConnection {
    pub ip: String,
    pub date: i64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct User {
    /// Opaque unique identifier (UUID v4)
    pub id: String,
    /// Case-sensitive unique login
    pub login: String,
    /// Hex digest of the password
    pub password: String,
    pub perm: PermLevel,
    /// At most one entry per IP
    pub allowed_on: Vec<AllowedConnection>,
}

impl User {
    pub fn new(id: String, login: String, password: String, perm: PermLevel) -> Self {
        Self {
            id,
            login,
            password,
            perm,
            allowed_on: Vec::new(),
        }
    }

    /// Grant `ip`, refreshing the timestamp if it is already granted
    pub fn allow(&mut self, ip: &str, now: i64) {
        match self.allowed_on.iter_mut().find(|conn| conn.ip == ip) {
            Some(conn) => conn.date = now,
            None => self.allowed_on.push(AllowedConnection {
                ip: ip.to_string(),
                date: now,
            }),
        }
    }

    pub fn disallow(&mut self, ip: &str) {
        self.allowed_on.retain(|conn| conn.ip != ip);
    }

    /// Does not look at freshness; expiry is the sweep's job.
    pub fn is_allowed(&self, ip: &str) -> bool {
        self.allowed_on.iter().any(|conn| conn.ip == ip)
    }

    /// Keep entries younger than [`CONNECTION_TTL_MILLIS`] and hand back
    /// both partitions as `(fresh, stale)`.
    pub fn clean_connections(&mut self, now: i64) -> (Vec<AllowedConnection>, Vec<AllowedConnection>) {
        let (fresh, stale): (Vec<_>, Vec<_>) = std::mem::take(&mut self.allowed_on)
            .into_iter()
            .partition(|conn| now - conn.date < CONNECTION_TTL_MILLIS);

        self.allowed_on = fresh.clone();
        (fresh, stale)
    }

    pub fn matches(&self, candidate: &str, hasher: &PasswordHasher) -> bool {
        hasher.hash(candidate) == self.password
    }
}

/// Explicit patch for [`User`]; the allowance list is not patchable.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct UserUpdate {
    pub id: String,
    #[serde(default)]
    pub login: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub perm: Option<PermLevel>,
}

impl UserUpdate {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn login(mut self, login: impl Into<String>) -> Self {
        self.login = Some(login.into());
        self
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn perm(mut self, perm: PermLevel) -> Self {
        self.perm = Some(perm);
        self
    }

    /// True when the patch carries nothing besides the id
    pub fn is_empty(&self) -> bool {
        self.login.is_none() && self.password.is_none() && self.perm.is_none()
    }

    /// True when the patch sets the login or the password to an empty string
    pub fn has_blank_field(&self) -> bool {
        self.login.as_deref().is_some_and(str::is_empty)
            || self.password.as_deref().is_some_and(str::is_empty)
    }
}

/// Field changes as written to the store, password already hashed
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UserChanges {
    pub login: Option<String>,
    pub password_hash: Option<String>,
    pub perm: Option<PermLevel>,
}

/// Public view of a user; never exposes the password hash.
#[derive(Debug, Serialize)]
pub struct UserView {
    pub id: String,
    pub login: String,
    pub perm: PermLevel,
    pub allowed_on: Vec<AllowedConnection>,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            login: user.login.clone(),
            perm: user.perm,
            allowed_on: user.allowed_on.clone(),
        }
    }
}
