//! Credential source. The authentication layer publishes the current bearer
//! token here and the connection manager re-reads it on every connect.

use std::sync::Arc;

use tokio::sync::watch;

use notify_core::types::Credential;

/// Observable holder of the current credential.
///
/// Cloning shares the same underlying value.
#[derive(Debug, Clone)]
pub struct CredentialSource {
    tx: Arc<watch::Sender<Option<Credential>>>,
}

impl CredentialSource {
    /// Creates a source with no credential (logged out).
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx: Arc::new(tx) }
    }

    /// Creates a source already holding `token`.
    pub fn with_token(token: impl Into<String>) -> Self {
        let source = Self::new();
        source.set(Credential::new(token));
        source
    }

    /// Replaces the credential. Returns `false` if the value did not change,
    /// in which case observers are not notified.
    pub fn set(&self, credential: Option<Credential>) -> bool {
        self.tx.send_if_modified(|current| {
            if *current == credential {
                false
            } else {
                *current = credential;
                true
            }
        })
    }

    /// Replaces the credential with a raw token. Blank tokens log out.
    pub fn set_token(&self, token: impl Into<String>) -> bool {
        self.set(Credential::new(token))
    }

    /// Logs out.
    pub fn clear(&self) -> bool {
        self.set(None)
    }

    /// The current credential, if any.
    pub fn current(&self) -> Option<Credential> {
        self.tx.borrow().clone()
    }

    /// A receiver notified on every credential change.
    pub fn watch(&self) -> watch::Receiver<Option<Credential>> {
        self.tx.subscribe()
    }
}

impl Default for CredentialSource {
    fn default() -> Self {
        Self::new()
    }
}
