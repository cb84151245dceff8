//! Role gates protecting the admin and staff areas.
//!
//! A gate waits for the startup check, then either authorizes the signed-in
//! user or redirects with a reason carried in the `message` query parameter.

use reqwest::Url;

use super::auth_store::AuthState;
use super::navigator::location_with_message;
use super::user::{Role, User};
use crate::FanStore;

/// Where admins sign in.
pub const ADMIN_LOGIN_PATH: &str = "/admin/login";
/// Where staff sign in.
pub const STAFF_LOGIN_PATH: &str = "/staff/login";
/// Where users with the wrong role are sent.
pub const HOME_PATH: &str = "/";

/// Why a gate refused to render its protected content.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GateRejection {
    /// No access token is stored.
    MissingToken,
    /// A token is stored but the store holds no signed-in user.
    NotAuthenticated,
    /// Signed in with a role other than the required one.
    WrongRole {
        /// Role the gate requires.
        required: Role,
        /// Role the user holds.
        actual: Role,
    },
}

/// Outcome of evaluating a gate against the current state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GateDecision {
    /// The startup session check has not finished: show a loading indicator.
    Hydrating,
    /// Leave for `location`. Protected content must not render.
    Redirect {
        /// Destination, with the reason in its `message` query parameter.
        location: Url,
        /// Which check failed.
        reason: GateRejection,
    },
    /// Render the protected content for `user`.
    Authorized(User),
}

impl GateDecision {
    /// Whether protected content may be rendered.
    #[must_use]
    pub const fn is_authorized(&self) -> bool {
        matches!(self, Self::Authorized(_))
    }
}

/// Texts attached to gate redirects.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GateMessages {
    /// No token stored.
    pub missing_token: String,
    /// Token stored, user not signed in.
    pub not_authenticated: String,
    /// Signed in with the wrong role.
    pub wrong_role: String,
}

impl GateMessages {
    fn for_area(area: &str) -> Self {
        Self {
            missing_token: format!("Please sign in to access the {area} area."),
            not_authenticated: "Your session is no longer valid. Please sign in again.".to_string(),
            wrong_role: format!("You do not have permission to access the {area} area."),
        }
    }
}

/// Guards a section of the application behind a role.
///
/// Checks run in order: hydration, stored token, authentication, role. The
/// first failing check decides the redirect; a redirect is final for the
/// current render.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoleGate {
    required: Role,
    login_path: String,
    messages: GateMessages,
}

impl RoleGate {
    /// A gate admitting only `required`, sending signed-out users to `login_path`.
    #[must_use]
    pub fn new(required: Role, login_path: impl Into<String>, messages: GateMessages) -> Self {
        Self {
            required,
            login_path: login_path.into(),
            messages,
        }
    }

    /// The back-office gate.
    #[must_use]
    pub fn admin() -> Self {
        Self::new(Role::Admin, ADMIN_LOGIN_PATH, GateMessages::for_area("admin"))
    }

    /// The staff area gate.
    #[must_use]
    pub fn staff() -> Self {
        Self::new(Role::Staff, STAFF_LOGIN_PATH, GateMessages::for_area("staff"))
    }

    /// Replaces the redirect texts, e.g. with translated ones.
    #[must_use]
    pub fn with_messages(mut self, messages: GateMessages) -> Self {
        self.messages = messages;
        self
    }

    /// Role this gate admits.
    #[must_use]
    pub const fn required_role(&self) -> Role {
        self.required
    }

    /// Decides what to render for `state`, given whether an access token is stored.
    #[must_use]
    pub fn evaluate(&self, state: &AuthState, has_token: bool, app_url: &Url) -> GateDecision {
        if !state.has_hydrated {
            return GateDecision::Hydrating;
        }

        if !has_token {
            return self.redirect(app_url, &self.login_path, GateRejection::MissingToken);
        }

        let Some(user) = state.user.as_ref().filter(|_| state.is_authenticated) else {
            return self.redirect(app_url, &self.login_path, GateRejection::NotAuthenticated);
        };

        if !user.has_role(self.required) {
            return self.redirect(
                app_url,
                HOME_PATH,
                GateRejection::WrongRole {
                    required: self.required,
                    actual: user.role,
                },
            );
        }

        GateDecision::Authorized(user.clone())
    }

    /// Waits for hydration, evaluates the gate against `client`'s session and
    /// performs the navigation when the decision is a redirect.
    pub async fn resolve(&self, client: &FanStore) -> GateDecision {
        let state = client.auth_store().hydrated().await;
        let has_token = client.token_store().access_token().is_some();

        let decision = self.evaluate(&state, has_token, client.app_url());

        if let GateDecision::Redirect { location, reason } = &decision {
            tracing::info!(required = %self.required, ?reason, %location, "gate redirect");
            client.navigator().navigate(location);
        }

        decision
    }

    fn redirect(&self, app_url: &Url, path: &str, reason: GateRejection) -> GateDecision {
        let message = match reason {
            GateRejection::MissingToken => &self.messages.missing_token,
            GateRejection::NotAuthenticated => &self.messages.not_authenticated,
            GateRejection::WrongRole { .. } => &self.messages.wrong_role,
        };

        GateDecision::Redirect {
            location: location_with_message(app_url, path, message),
            reason,
        }
    }
}
