//! Process-wide session context
//!
//! The session moves through
//! `Unauthenticated -> Authenticating -> Authenticated -> Unauthenticated`.
//! It is created once at startup, resumed from the [`CredentialStore`], and
//! torn down by logout or by any 401 the API client observes.

use crate::error::{ClientError, ClientResult};
use glossy_core::{Role, User};
use glossy_core::types::AuthResponse;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Opaque bearer credential. `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BearerToken(String);

impl BearerToken {
    /// Wrap a raw token
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw token, for the `Authorization` header
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BearerToken(***)")
    }
}

/// What gets persisted between runs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// Bearer credential
    pub token: BearerToken,
    /// Identity the credential belongs to
    pub user: User,
}

impl From<AuthResponse> for Credentials {
    fn from(response: AuthResponse) -> Self {
        Self {
            token: BearerToken::new(response.token),
            user: response.user,
        }
    }
}

/// Persistent client-side storage for the credential
pub trait CredentialStore: Send + Sync + fmt::Debug {
    /// Read the stored credential, if any
    ///
    /// # Errors
    ///
    /// Returns an error if storage exists but cannot be read.
    fn load(&self) -> ClientResult<Option<Credentials>>;

    /// Replace the stored credential
    ///
    /// # Errors
    ///
    /// Returns an error if storage cannot be written.
    fn save(&self, credentials: &Credentials) -> ClientResult<()>;

    /// Remove the stored credential; removing nothing is not an error
    ///
    /// # Errors
    ///
    /// Returns an error if storage exists but cannot be removed.
    fn clear(&self) -> ClientResult<()>;
}

/// Credential store backed by a JSON file
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    /// Store credentials at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the credential file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CredentialStore for FileCredentialStore {
    fn load(&self) -> ClientResult<Option<Credentials>> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        serde_json::from_str(&contents)
            .map(Some)
            .map_err(ClientError::CorruptCredentials)
    }

    fn save(&self, credentials: &Credentials) -> ClientResult<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(credentials)
            .map_err(ClientError::CorruptCredentials)?;
        std::fs::write(&self.path, json)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))?;
        }

        Ok(())
    }

    fn clear(&self) -> ClientResult<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Credential store that lives only as long as the process
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    slot: RwLock<Option<Credentials>>,
}

impl MemoryCredentialStore {
    /// Empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn load(&self) -> ClientResult<Option<Credentials>> {
        Ok(self.slot.read().clone())
    }

    fn save(&self, credentials: &Credentials) -> ClientResult<()> {
        *self.slot.write() = Some(credentials.clone());
        Ok(())
    }

    fn clear(&self) -> ClientResult<()> {
        *self.slot.write() = None;
        Ok(())
    }
}

/// Lifecycle state of the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// No credential held
    Unauthenticated,
    /// A login or resume is in flight
    Authenticating,
    /// A credential is held for this user
    Authenticated(Credentials),
}

/// Why a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeardownReason {
    /// The user logged out
    Logout,
    /// The API answered 401
    Unauthorized,
}

impl fmt::Display for TeardownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Logout => write!(f, "logout"),
            Self::Unauthorized => write!(f, "credential rejected"),
        }
    }
}

/// Shared session context
#[derive(Debug)]
pub struct Session {
    store: Arc<dyn CredentialStore>,
    state: RwLock<SessionState>,
}

impl Session {
    /// Unauthenticated session persisting through `store`
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self {
            store,
            state: RwLock::new(SessionState::Unauthenticated),
        }
    }

    /// Session backed by an in-memory store
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryCredentialStore::new()))
    }

    /// Snapshot of the current state
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state.read().clone()
    }

    /// Whether a credential is held
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        matches!(*self.state.read(), SessionState::Authenticated(_))
    }

    /// Credential to attach to outgoing requests
    #[must_use]
    pub fn token(&self) -> Option<BearerToken> {
        match &*self.state.read() {
            SessionState::Authenticated(credentials) => Some(credentials.token.clone()),
            _ => None,
        }
    }

    /// Identity of the signed-in user
    #[must_use]
    pub fn current_user(&self) -> Option<User> {
        match &*self.state.read() {
            SessionState::Authenticated(credentials) => Some(credentials.user.clone()),
            _ => None,
        }
    }

    /// Role of the signed-in user
    #[must_use]
    pub fn role(&self) -> Option<Role> {
        match &*self.state.read() {
            SessionState::Authenticated(credentials) => Some(credentials.user.role),
            _ => None,
        }
    }

    /// Adopt persisted credentials, if any, without contacting the API
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read. A corrupt file is
    /// discarded and treated as no credential.
    pub fn restore(&self) -> ClientResult<Option<User>> {
        let credentials = match self.store.load() {
            Ok(credentials) => credentials,
            Err(ClientError::CorruptCredentials(e)) => {
                warn!(error = %e, "Discarding unreadable stored credentials");
                self.store.clear()?;
                None
            }
            Err(e) => return Err(e),
        };

        let mut state = self.state.write();
        match credentials {
            Some(credentials) => {
                let user = credentials.user.clone();
                debug!(user_id = %user.id, role = %user.role, "Restored stored credentials");
                *state = SessionState::Authenticated(credentials);
                Ok(Some(user))
            }
            None => {
                *state = SessionState::Unauthenticated;
                Ok(None)
            }
        }
    }

    /// Mark a login as in flight, returning the state to fall back to
    #[must_use = "pass the previous state to abandon_authentication on failure"]
    pub fn begin_authentication(&self) -> SessionState {
        std::mem::replace(&mut *self.state.write(), SessionState::Authenticating)
    }

    /// Go back to `previous` after a login that failed without the API
    /// rejecting anything; stored credentials are left untouched
    pub fn abandon_authentication(&self, previous: SessionState) {
        let mut state = self.state.write();
        if *state == SessionState::Authenticating {
            debug!(
                authenticated = matches!(previous, SessionState::Authenticated(_)),
                "Login abandoned"
            );
            *state = previous;
        }
    }

    /// Hold and persist a fresh credential
    ///
    /// # Errors
    ///
    /// Returns an error if the credential cannot be persisted; the session
    /// still holds it for the life of the process.
    pub fn establish(&self, credentials: Credentials) -> ClientResult<()> {
        info!(user_id = %credentials.user.id, role = %credentials.user.role, "Session established");
        let persisted = self.store.save(&credentials);
        *self.state.write() = SessionState::Authenticated(credentials);
        persisted
    }

    /// Replace the cached identity after the API returned a newer copy
    ///
    /// # Errors
    ///
    /// Returns an error if the updated credential cannot be persisted.
    pub fn refresh_user(&self, user: User) -> ClientResult<()> {
        let updated = {
            let mut state = self.state.write();
            match &mut *state {
                SessionState::Authenticated(credentials) => {
                    credentials.user = user;
                    Some(credentials.clone())
                }
                _ => None,
            }
        };

        match updated {
            Some(credentials) => self.store.save(&credentials),
            None => Ok(()),
        }
    }

    /// Drop the credential from memory and storage
    pub fn teardown(&self, reason: TeardownReason) {
        let previous = std::mem::replace(&mut *self.state.write(), SessionState::Unauthenticated);
        if let SessionState::Authenticated(credentials) = previous {
            info!(user_id = %credentials.user.id, %reason, "Session cleared");
        } else {
            debug!(%reason, "Session cleared");
        }

        if let Err(e) = self.store.clear() {
            warn!(error = %e, "Failed to remove stored credentials");
        }
    }

    /// User-initiated logout; no server round trip
    pub fn logout(&self) {
        self.teardown(TeardownReason::Logout);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use uuid::Uuid;

    fn credentials(role: Role) -> Credentials {
        Credentials {
            token: BearerToken::new("tok-123"),
            user: User {
                id: Uuid::new_v4(),
                email: "admin@example.com".to_string(),
                name: "Admin".to_string(),
                phone: None,
                avatar_url: None,
                role,
                affiliate_code: None,
                referred_by: None,
                active: Some(true),
                created_at: None,
                updated_at: None,
            },
        }
    }

    #[test]
    fn test_token_debug_is_redacted() {
        let token = BearerToken::new("super-secret");
        assert_eq!(format!("{token:?}"), "BearerToken(***)");
        assert_eq!(token.expose(), "super-secret");
    }

    #[test]
    fn test_abandoned_login_keeps_stored_credential() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(FileCredentialStore::new(dir.path().join("credentials.json")));
        let session = Session::new(store.clone());
        session.establish(credentials(Role::Packer)).unwrap();

        let previous = session.begin_authentication();
        assert!(!session.is_authenticated());
        session.abandon_authentication(previous);

        assert_eq!(session.role(), Some(Role::Packer));
        assert_eq!(session.token().unwrap().expose(), "tok-123");
        assert!(store.load().unwrap().is_some());
    }

    #[test]
    fn test_lifecycle() {
        let session = Session::in_memory();
        assert_eq!(session.state(), SessionState::Unauthenticated);

        let previous = session.begin_authentication();
        assert_eq!(previous, SessionState::Unauthenticated);
        assert_eq!(session.state(), SessionState::Authenticating);
        assert!(session.token().is_none());

        session.establish(credentials(Role::Admin)).unwrap();
        assert!(session.is_authenticated());
        assert_eq!(session.role(), Some(Role::Admin));

        session.teardown(TeardownReason::Unauthorized);
        assert_eq!(session.state(), SessionState::Unauthenticated);
        assert!(session.current_user().is_none());
    }

    #[test]
    fn test_restore_from_store() {
        let store = Arc::new(MemoryCredentialStore::new());
        store.save(&credentials(Role::Packer)).unwrap();

        let session = Session::new(store.clone());
        let user = session.restore().unwrap().unwrap();

        assert_eq!(user.role, Role::Packer);
        assert_eq!(session.token().unwrap().expose(), "tok-123");

        session.logout();
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::new(dir.path().join("nested").join("credentials.json"));

        assert!(store.load().unwrap().is_none());

        let saved = credentials(Role::Marketing);
        store.save(&saved).unwrap();
        assert_eq!(store.load().unwrap(), Some(saved));

        store.clear().unwrap();
        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_corrupt_file_is_discarded_on_restore() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        std::fs::write(&path, "{not json").unwrap();

        let session = Session::new(Arc::new(FileCredentialStore::new(&path)));
        assert!(session.restore().unwrap().is_none());
        assert!(!path.exists());
    }

    #[test]
    fn test_refresh_user_persists() {
        let store = Arc::new(MemoryCredentialStore::new());
        let session = Session::new(store.clone());
        let mut creds = credentials(Role::Admin);
        session.establish(creds.clone()).unwrap();

        creds.user.name = "Renamed".to_string();
        session.refresh_user(creds.user.clone()).unwrap();

        assert_eq!(session.current_user().unwrap().name, "Renamed");
        assert_eq!(store.load().unwrap().unwrap().user.name, "Renamed");
    }
}
