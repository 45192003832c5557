use crate::core::error::{StartupError, StoreError};
use crate::models::login::LoginReason;
use crate::models::permission::{CompareMode, PermComparison, PermLevel};
use crate::models::user::{User, UserChanges, UserUpdate};
use crate::stores::UserStore;
use crate::users::hasher::PasswordHasher;
use crate::utils::time::Clock;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, error, info};

/// Counters from one allowance sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub users: usize,
    pub removed: usize,
}

/// Owner of the user cache.
///
/// Reads only take the cache lock. Mutations also hold `writes` from the
/// cache change until the store call returns, so the store sees writes in
/// the same order as the cache. When the store call fails the error is
/// returned with the cache already updated.
pub struct UserManager {
    cache: Mutex<HashMap<String, User>>,
    writes: tokio::sync::Mutex<()>,
    store: Arc<dyn UserStore>,
    hasher: PasswordHasher,
    clock: Arc<dyn Clock>,
}

impl UserManager {
    /// Manager with an empty cache; nothing is read from the store.
    pub fn new(store: Arc<dyn UserStore>, hasher: PasswordHasher, clock: Arc<dyn Clock>) -> Self {
        Self {
            cache: Mutex::new(HashMap::new()),
            writes: tokio::sync::Mutex::new(()),
            store,
            hasher,
            clock,
        }
    }

    /// Ensure the backing table exists and fill the cache from it
    pub async fn start(
        store: Arc<dyn UserStore>,
        hasher: PasswordHasher,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, StartupError> {
        store
            .ensure_schema()
            .await
            .map_err(|e| StartupError::InvalidDatabase(e.to_string()))?;

        let users = store
            .load_all()
            .await
            .map_err(|e| StartupError::LoadUsers(e.to_string()))?;

        let manager = Self::new(store, hasher, clock);
        {
            let mut cache = manager.cache();
            for user in users {
                cache.insert(user.id.clone(), user);
            }
        }

        info!(
            users = manager.len(),
            hash_algorithm = %manager.hasher().algorithm(),
            "User cache populated"
        );

        Ok(manager)
    }

    fn cache(&self) -> MutexGuard<'_, HashMap<String, User>> {
        self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub fn hasher(&self) -> &PasswordHasher {
        &self.hasher
    }

    /// Snapshot of every cached user, ordered by login
    pub fn users(&self) -> Vec<User> {
        let mut users: Vec<User> = self.cache().values().cloned().collect();
        users.sort_by(|a, b| a.login.cmp(&b.login));
        users
    }

    pub fn len(&self) -> usize {
        self.cache().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache().is_empty()
    }

    pub fn get_user(&self, id: &str) -> Option<User> {
        self.cache().get(id).cloned()
    }

    /// Linear scan over the cache
    pub fn get_user_by_login(&self, login: &str) -> Option<User> {
        self.cache().values().find(|user| user.login == login).cloned()
    }

    pub fn has_user(&self, id: &str) -> bool {
        self.cache().contains_key(id)
    }

    pub fn compare_permission(&self, candidate: PermLevel, reference: PermLevel, mode: CompareMode) -> PermComparison {
        candidate.compare(reference, mode)
    }

    pub fn hash(&self, input: &str) -> String {
        self.hasher.hash(input)
    }

    pub fn matches(&self, user: &User, candidate: &str) -> bool {
        user.matches(candidate, &self.hasher)
    }

    /// Returns `Ok(None)` when the login is already taken.
    pub async fn create_user(&self, login: &str, password: &str, perm: PermLevel) -> Result<Option<User>, StoreError> {
        let _write = self.writes.lock().await;
        let user = {
            let mut cache = self.cache();
            if cache.values().any(|user| user.login == login) {
                debug!(login = %login, "Login already taken");
                return Ok(None);
            }

            let user = User::new(
                uuid::Uuid::new_v4().to_string(),
                login.to_string(),
                self.hasher.hash(password),
                perm,
            );
            cache.insert(user.id.clone(), user.clone());
            user
        };

        self.store.insert(&user).await?;

        info!(user_id = %user.id, login = %user.login, perm = %user.perm, "User created");
        Ok(Some(user))
    }

    pub async fn delete_user(&self, id: &str) -> Result<bool, StoreError> {
        let _write = self.writes.lock().await;
        let removed = self.cache().remove(id);
        if removed.is_none() {
            return Ok(false);
        }

        self.store.delete(id).await?;

        info!(user_id = %id, "User deleted");
        Ok(true)
    }

    /// Apply a patch.
    ///
    /// `Ok(false)` when the id is unknown, the patch only names the id, sets
    /// an empty login or password, or the new login belongs to someone else.
    pub async fn update_user(&self, update: &UserUpdate) -> Result<bool, StoreError> {
        if update.is_empty() || update.has_blank_field() {
            return Ok(false);
        }

        let _write = self.writes.lock().await;

        let changes = UserChanges {
            login: update.login.clone(),
            password_hash: update.password.as_deref().map(|password| self.hasher.hash(password)),
            perm: update.perm,
        };

        {
            let mut cache = self.cache();

            let login_taken = changes.login.as_ref().is_some_and(|login| {
                cache
                    .values()
                    .any(|user| user.id != update.id && &user.login == login)
            });
            if login_taken {
                debug!(user_id = %update.id, "Login already taken by another user");
                return Ok(false);
            }

            let Some(user) = cache.get_mut(&update.id) else {
                return Ok(false);
            };

            if let Some(login) = &changes.login {
                user.login = login.clone();
            }
            if let Some(hash) = &changes.password_hash {
                user.password = hash.clone();
            }
            if let Some(perm) = changes.perm {
                user.perm = perm;
            }
        }

        self.store.update(&update.id, &changes).await?;

        info!(
            user_id = %update.id,
            login_changed = changes.login.is_some(),
            password_changed = changes.password_hash.is_some(),
            perm_changed = changes.perm.is_some(),
            "User updated"
        );
        Ok(true)
    }

    /// Grant `ip` to the user, `Ok(false)` for an unknown id
    pub async fn allow(&self, user_id: &str, ip: &str) -> Result<bool, StoreError> {
        let _write = self.writes.lock().await;
        let now = self.clock.now_millis();
        let allowed_on = {
            let mut cache = self.cache();
            let Some(user) = cache.get_mut(user_id) else {
                return Ok(false);
            };
            user.allow(ip, now);
            user.allowed_on.clone()
        };

        self.store.save_allowed_on(user_id, &allowed_on).await?;

        debug!(user_id = %user_id, ip = %ip, "IP allowed");
        Ok(true)
    }

    pub async fn disallow(&self, user_id: &str, ip: &str) -> Result<bool, StoreError> {
        let _write = self.writes.lock().await;
        let allowed_on = {
            let mut cache = self.cache();
            let Some(user) = cache.get_mut(user_id) else {
                return Ok(false);
            };
            user.disallow(ip);
            user.allowed_on.clone()
        };

        self.store.save_allowed_on(user_id, &allowed_on).await?;

        debug!(user_id = %user_id, ip = %ip, "IP disallowed");
        Ok(true)
    }

    /// Check credentials and, on success, grant `ip` to the user.
    ///
    /// Empty fields count as missing.
    pub async fn login(
        &self,
        login: Option<&str>,
        password: Option<&str>,
        ip: &str,
    ) -> Result<LoginReason, StoreError> {
        let (Some(login), Some(password)) = (
            login.filter(|value| !value.is_empty()),
            password.filter(|value| !value.is_empty()),
        ) else {
            return Ok(LoginReason::NoParameters);
        };

        let Some(user) = self.get_user_by_login(login) else {
            return Ok(LoginReason::NoUser);
        };

        if !self.matches(&user, password) {
            return Ok(LoginReason::InvalidPassword);
        }

        self.allow(&user.id, ip).await?;
        Ok(LoginReason::Logged)
    }

    /// Drop allowance entries older than 24 hours from every user and
    /// persist what is left.
    ///
    /// Every user is written even when an earlier write fails; the first
    /// failure is returned.
    pub async fn clean_connections(&self) -> Result<CleanupReport, StoreError> {
        let _write = self.writes.lock().await;
        let now = self.clock.now_millis();
        let swept: Vec<_> = {
            let mut cache = self.cache();
            cache
                .values_mut()
                .map(|user| {
                    let (fresh, stale) = user.clean_connections(now);
                    (user.id.clone(), fresh, stale.len())
                })
                .collect()
        };

        let mut report = CleanupReport {
            users: swept.len(),
            removed: 0,
        };
        let mut first_error = None;
        for (id, fresh, removed) in swept {
            report.removed += removed;
            if let Err(e) = self.store.save_allowed_on(&id, &fresh).await {
                error!(user_id = %id, error = %e, "Failed to persist cleaned connections");
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(report),
        }
    }
}
