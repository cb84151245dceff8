//! Accounts and roles.

use serde::{Deserialize, Serialize};

/// What a user is allowed to do in the storefront.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// A shopper.
    #[default]
    Customer,
    /// Full back-office access.
    Admin,
    /// Order handling and support.
    Staff,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Customer => "CUSTOMER",
            Self::Admin => "ADMIN",
            Self::Staff => "STAFF",
        })
    }
}

/// How the account signs in.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoginProvider {
    /// Username or email and password.
    #[default]
    Local,
    /// Google sign-in.
    Google,
    /// Facebook sign-in.
    Facebook,
    /// Anything this crate does not know about yet.
    #[serde(other)]
    Other,
}

/// An account of the storefront, as returned by the backend and cached locally.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique identifier.
    #[serde(deserialize_with = "crate::resource::deserialize_id")]
    pub id: String,
    /// Display and login name.
    #[serde(default)]
    pub username: String,
    /// Email address.
    #[serde(default)]
    pub email: String,
    /// Contact phone number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    /// Default shipping address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// Access level.
    #[serde(default)]
    pub role: Role,
    /// Sign-in method.
    #[serde(default)]
    pub auth_provider: LoginProvider,
}

impl User {
    /// Whether the user holds `role`.
    #[must_use]
    pub fn has_role(&self, role: Role) -> bool {
        self.role == role
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_backend_user() {
        let user: User = serde_json::from_str(
            r#"{
                "id": "42",
                "username": "lan",
                "email": "lan@example.com",
                "phoneNumber": "0900000000",
                "role": "STAFF",
                "authProvider": "GOOGLE"
            }"#,
        )
        .unwrap();

        assert_eq!(user.role, Role::Staff);
        assert_eq!(user.auth_provider, LoginProvider::Google);
        assert_eq!(user.phone_number.as_deref(), Some("0900000000"));
        assert_eq!(user.address, None);
    }

    #[test]
    fn unknown_provider_is_tolerated() {
        let user: User = serde_json::from_str(
            r#"{"id":1,"username":"a","email":"a@b.c","role":"CUSTOMER","authProvider":"GITHUB"}"#,
        )
        .unwrap();

        assert_eq!(user.auth_provider, LoginProvider::Other);
        assert_eq!(user.id, "1");
    }
}
