//! Authentication Context
//!
//! Credential handling for the chat client. The browser original kept the
//! bearer token in ambient local storage; here it is an explicit capability:
//! a [`TokenStore`] injected into [`AuthContext`], which is handed to the
//! session at construction. Nothing in the core reads ambient credential
//! state.
//!
//! Login talks to the auth collaborator (`POST {base}/auth/login`) and
//! persists the returned token plus the cached user record. Logout clears
//! both.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from the auth layer
///
/// Unlike agent-boundary failures, auth failures are surfaced: the login
/// form shows them to the user.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The auth endpoint rejected the credentials
    #[error("Login failed: {0}")]
    Rejected(String),

    /// The auth endpoint could not be reached
    #[error("Auth request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The token store could not be read or written
    #[error("Failed to access token store: {0}")]
    Store(#[from] std::io::Error),

    /// The token store holds unparseable data
    #[error("Malformed token store: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Stored credentials: the bearer token plus the cached user record
///
/// The user record is kept opaque; the client caches whatever the auth
/// endpoint returned.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StoredAuth {
    /// Bearer token returned by the login endpoint
    pub token: String,
    /// Cached user record (opaque JSON)
    #[serde(default)]
    pub user: serde_json::Value,
}

/// Persisted client-side credential storage
pub trait TokenStore: Send + Sync {
    /// Load the stored credentials, if any
    fn load(&self) -> Result<Option<StoredAuth>, AuthError>;

    /// Persist credentials
    fn save(&self, auth: &StoredAuth) -> Result<(), AuthError>;

    /// Remove any stored credentials
    fn clear(&self) -> Result<(), AuthError>;
}

/// File-backed token store
///
/// Keeps credentials as JSON under the XDG config directory
/// (`~/.config/cortex/auth.json`).
#[derive(Clone, Debug)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    /// Create a store at an explicit path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Default credential path, if a config directory exists
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("cortex").join("auth.json"))
    }

    /// The backing file path
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<StoredAuth>, AuthError> {
        let data = match std::fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let auth: StoredAuth = serde_json::from_str(&data)?;
        Ok(Some(auth))
    }

    fn save(&self, auth: &StoredAuth) -> Result<(), AuthError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_string_pretty(auth)?;
        std::fs::write(&self.path, data)?;
        Ok(())
    }

    fn clear(&self) -> Result<(), AuthError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Explicit authentication capability handed to the session at construction
#[derive(Clone)]
pub struct AuthContext {
    store: Arc<dyn TokenStore>,
}

impl AuthContext {
    /// Wrap a token store
    pub fn new(store: Arc<dyn TokenStore>) -> Self {
        Self { store }
    }

    /// Whether a non-empty bearer token is present
    ///
    /// Store errors read as unauthenticated; the caller falls through to
    /// the login surface.
    pub fn is_authenticated(&self) -> bool {
        matches!(self.store.load(), Ok(Some(auth)) if !auth.token.is_empty())
    }

    /// The stored credentials, if any
    pub fn stored(&self) -> Option<StoredAuth> {
        self.store.load().ok().flatten()
    }

    /// Persist credentials after a successful login
    pub fn save(&self, auth: &StoredAuth) -> Result<(), AuthError> {
        self.store.save(auth)
    }

    /// Clear the token and the cached user record
    pub fn logout(&self) -> Result<(), AuthError> {
        self.store.clear()
    }
}

impl std::fmt::Debug for AuthContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthContext")
            .field("authenticated", &self.is_authenticated())
            .finish()
    }
}

/// Wire shape of the login request
#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    username_or_email: &'a str,
    password: &'a str,
}

/// Wire shape of a successful login response
#[derive(Debug, Deserialize)]
struct LoginResponse {
    access_token: String,
    #[serde(default)]
    user: serde_json::Value,
}

/// Client for the auth collaborator endpoint
#[derive(Clone, Debug)]
pub struct AuthClient {
    base_url: String,
    http: reqwest::Client,
}

impl AuthClient {
    /// Create a client for the given base URL (no trailing slash)
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            base_url,
            http: reqwest::Client::new(),
        }
    }

    /// Log in with a username/email and password
    ///
    /// On rejection the endpoint's `detail` field becomes the error text,
    /// falling back to a generic message when the body is unreadable.
    pub async fn login(
        &self,
        username_or_email: &str,
        password: &str,
    ) -> Result<StoredAuth, AuthError> {
        let url = format!("{}/auth/login", self.base_url);
        let response = self
            .http
            .post(&url)
            .json(&LoginRequest {
                username_or_email,
                password,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            let detail = response
                .json::<serde_json::Value>()
                .await
                .ok()
                .and_then(|body| {
                    body.get("detail")
                        .and_then(|d| d.as_str())
                        .map(ToString::to_string)
                })
                .unwrap_or_else(|| "Invalid credentials".to_string());
            return Err(AuthError::Rejected(detail));
        }

        let body: LoginResponse = response.json().await?;
        Ok(StoredAuth {
            token: body.access_token,
            user: body.user,
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Mutex;

    use pretty_assertions::assert_eq;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// In-memory token store for unit tests
    #[derive(Default)]
    pub(crate) struct MemoryTokenStore {
        auth: Mutex<Option<StoredAuth>>,
    }

    impl TokenStore for MemoryTokenStore {
        fn load(&self) -> Result<Option<StoredAuth>, AuthError> {
            Ok(self.auth.lock().unwrap().clone())
        }

        fn save(&self, auth: &StoredAuth) -> Result<(), AuthError> {
            *self.auth.lock().unwrap() = Some(auth.clone());
            Ok(())
        }

        fn clear(&self) -> Result<(), AuthError> {
            *self.auth.lock().unwrap() = None;
            Ok(())
        }
    }

    /// An auth context pre-populated with a token
    pub(crate) fn memory_auth() -> AuthContext {
        let store = MemoryTokenStore::default();
        store
            .save(&StoredAuth {
                token: "test-token".to_string(),
                user: serde_json::json!({ "username": "tester" }),
            })
            .unwrap();
        AuthContext::new(Arc::new(store))
    }

    #[test]
    fn test_file_store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::new(dir.path().join("auth.json"));

        assert!(store.load().unwrap().is_none());

        let auth = StoredAuth {
            token: "abc123".to_string(),
            user: serde_json::json!({ "username": "sam" }),
        };
        store.save(&auth).unwrap();
        assert_eq!(store.load().unwrap(), Some(auth));

        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
        // Clearing an empty store is fine
        store.clear().unwrap();
    }

    #[test]
    fn test_file_store_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::new(dir.path().join("nested").join("deep").join("auth.json"));
        store
            .save(&StoredAuth {
                token: "t".to_string(),
                user: serde_json::Value::Null,
            })
            .unwrap();
        assert!(store.load().unwrap().is_some());
    }

    #[test]
    fn test_auth_context_requires_nonempty_token() {
        let store = MemoryTokenStore::default();
        store
            .save(&StoredAuth {
                token: String::new(),
                user: serde_json::Value::Null,
            })
            .unwrap();
        let auth = AuthContext::new(Arc::new(store));
        assert!(!auth.is_authenticated());
    }

    #[test]
    fn test_auth_context_logout_clears() {
        let auth = memory_auth();
        assert!(auth.is_authenticated());
        auth.logout().unwrap();
        assert!(!auth.is_authenticated());
        assert!(auth.stored().is_none());
    }

    #[tokio::test]
    async fn test_login_success_returns_stored_auth() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .and(body_json(serde_json::json!({
                "username_or_email": "sam@example.com",
                "password": "hunter2",
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "jwt-token",
                "user": { "username": "sam" },
            })))
            .mount(&server)
            .await;

        let client = AuthClient::new(server.uri());
        let auth = client.login("sam@example.com", "hunter2").await.unwrap();
        assert_eq!(auth.token, "jwt-token");
        assert_eq!(auth.user["username"], "sam");
    }

    #[tokio::test]
    async fn test_login_rejection_surfaces_detail() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .respond_with(
                ResponseTemplate::new(401)
                    .set_body_json(serde_json::json!({ "detail": "Bad password" })),
            )
            .mount(&server)
            .await;

        let client = AuthClient::new(server.uri());
        let error = client.login("sam", "wrong").await.unwrap_err();
        match error {
            AuthError::Rejected(detail) => assert_eq!(detail, "Bad password"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_login_rejection_without_detail_is_generic() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = AuthClient::new(server.uri());
        let error = client.login("sam", "pw").await.unwrap_err();
        match error {
            AuthError::Rejected(detail) => assert_eq!(detail, "Invalid credentials"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
