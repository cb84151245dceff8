//! Process-wide observable authentication state.

use std::sync::Arc;

use tokio::sync::watch;

use super::user::User;

/// Snapshot of the authentication state.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AuthState {
    /// The signed-in user.
    pub user: Option<User>,
    /// Whether a user is signed in.
    pub is_authenticated: bool,
    /// Whether the startup session check has finished.
    ///
    /// Gates must not redirect before this turns true.
    pub has_hydrated: bool,
}

/// Process-wide observable authentication state.
///
/// Cloning shares the same state. Every change is published to subscribers
/// obtained from [`AuthStore::subscribe`]; changes are serialized by the
/// underlying channel.
#[derive(Clone, Debug)]
pub struct AuthStore {
    sender: Arc<watch::Sender<AuthState>>,
}

impl Default for AuthStore {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthStore {
    /// Creates a signed-out, not yet hydrated store.
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = watch::channel(AuthState::default());

        Self {
            sender: Arc::new(sender),
        }
    }

    /// A copy of the current state.
    #[must_use]
    pub fn state(&self) -> AuthState {
        self.sender.borrow().clone()
    }

    /// The signed-in user, if any.
    #[must_use]
    pub fn user(&self) -> Option<User> {
        self.sender.borrow().user.clone()
    }

    /// Whether a user is signed in.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.sender.borrow().is_authenticated
    }

    /// Whether the startup session check has finished.
    #[must_use]
    pub fn has_hydrated(&self) -> bool {
        self.sender.borrow().has_hydrated
    }

    /// Receives every subsequent state change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.sender.subscribe()
    }

    /// Replaces the user. `Some` signs in, `None` signs out.
    pub fn set_user(&self, user: Option<User>) {
        self.sender.send_if_modified(|state| {
            let is_authenticated = user.is_some();
            let changed = state.user != user || state.is_authenticated != is_authenticated;

            state.user = user;
            state.is_authenticated = is_authenticated;
            changed
        });
    }

    /// Replaces the details of the signed-in user. Ignored when signed out.
    pub fn update_user(&self, user: User) {
        self.sender.send_if_modified(|state| {
            if !state.is_authenticated || state.user.as_ref() == Some(&user) {
                return false;
            }

            state.user = Some(user);
            true
        });
    }

    /// Signs out, keeping the hydration flag.
    pub fn clear_auth(&self) {
        self.set_user(None);
    }

    /// Marks the startup session check as finished (or not).
    pub fn set_has_hydrated(&self, has_hydrated: bool) {
        self.sender.send_if_modified(|state| {
            let changed = state.has_hydrated != has_hydrated;
            state.has_hydrated = has_hydrated;
            changed
        });
    }

    /// Resolves once the store has hydrated, returning the state at that point.
    pub async fn hydrated(&self) -> AuthState {
        let mut receiver = self.subscribe();

        // The sender lives as long as `self`, so the channel cannot close here.
        let state = match receiver.wait_for(|state| state.has_hydrated).await {
            Ok(state) => state.clone(),
            Err(_) => self.state(),
        };

        state
    }
}
