//! Current location and page navigation.

use std::sync::RwLock;

use reqwest::Url;

/// Path prefix shared by every authentication page.
pub const AUTH_PATH_PREFIX: &str = "/auth";
/// Where customers sign in.
pub const LOGIN_PATH: &str = "/auth/login";

/// Where the application currently is, and how it moves elsewhere.
///
/// A browser host maps `navigate` to a full page load; a CLI or a test just
/// records the new location.
pub trait Navigator: Send + Sync {
    /// The location currently displayed.
    fn current(&self) -> Url;

    /// Leaves the current location for `to`.
    fn navigate(&self, to: &Url);

    /// Path part of [`Navigator::current`].
    fn current_path(&self) -> String {
        self.current().path().to_string()
    }

    /// Whether the current location is one of the authentication pages.
    fn is_on_auth_page(&self) -> bool {
        is_auth_path(&self.current_path())
    }
}

/// Whether `path` belongs to the authentication pages.
#[must_use]
pub fn is_auth_path(path: &str) -> bool {
    path == AUTH_PATH_PREFIX || path.starts_with(&format!("{AUTH_PATH_PREFIX}/"))
}

/// Builds `path?message=<reason>` under `app_url`, with `reason` URL-encoded.
#[must_use]
pub fn location_with_message(app_url: &Url, path: &str, message: &str) -> Url {
    let mut location = app_url.clone();
    location.set_path(path);
    location.set_query(None);
    location.set_fragment(None);
    location.query_pairs_mut().append_pair("message", message);
    location
}

/// A navigator that only remembers where it is and where it was sent.
#[derive(Debug)]
pub struct MemoryNavigator {
    current: RwLock<Url>,
    history: RwLock<Vec<Url>>,
}

impl MemoryNavigator {
    /// Starts at `location`.
    #[must_use]
    pub fn new(location: Url) -> Self {
        Self {
            current: RwLock::new(location),
            history: RwLock::new(Vec::new()),
        }
    }

    /// Every location navigated to, oldest first.
    #[must_use]
    pub fn history(&self) -> Vec<Url> {
        self.history
            .read()
            .map(|history| history.clone())
            .unwrap_or_default()
    }

    /// The last location navigated to, if any.
    #[must_use]
    pub fn last_navigation(&self) -> Option<Url> {
        self.history.read().ok()?.last().cloned()
    }

    /// Moves to `location` without recording a navigation, like a user
    /// following an in-app link.
    pub fn visit(&self, location: Url) {
        if let Ok(mut current) = self.current.write() {
            *current = location;
        }
    }
}

impl Navigator for MemoryNavigator {
    fn current(&self) -> Url {
        match self.current.read() {
            Ok(current) => current.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn navigate(&self, to: &Url) {
        tracing::debug!(location = %to, "navigating");

        self.visit(to.clone());

        if let Ok(mut history) = self.history.write() {
            history.push(to.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_auth_paths() {
        assert!(is_auth_path("/auth"));
        assert!(is_auth_path("/auth/login"));
        assert!(is_auth_path("/auth/register"));
        assert!(!is_auth_path("/authors"));
        assert!(!is_auth_path("/admin"));
    }

    #[test]
    fn message_is_url_encoded() {
        let app = Url::parse("http://localhost:3000/products?page=2").unwrap();

        let location = location_with_message(&app, LOGIN_PATH, "Session expired & gone");

        assert_eq!(location.path(), "/auth/login");
        assert_eq!(location.query(), Some("message=Session+expired+%26+gone"));

        let (key, value) = location.query_pairs().next().unwrap();
        assert_eq!(key, "message");
        assert_eq!(value, "Session expired & gone");
    }

    #[test]
    fn memory_navigator_records_history() {
        let navigator = MemoryNavigator::new(Url::parse("http://localhost:3000/cart").unwrap());
        let target = Url::parse("http://localhost:3000/auth/login").unwrap();

        assert!(!navigator.is_on_auth_page());
        navigator.navigate(&target);

        assert!(navigator.is_on_auth_page());
        assert_eq!(navigator.history(), vec![target]);
    }
}
