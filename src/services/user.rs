//! Accounts: the signed-in user's profile and password, and admin user management.

use serde::Serialize;

use super::{failed, fetch_list, required, ListQuery, ServiceResult};
use crate::resource::{RecordList, Resource};
use crate::session::user::{Role, User};
use crate::{FanStore, ServiceError};

/// Shortest password the backend accepts.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Changes the signed-in user may make to their own profile.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    /// New display and login name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// New email address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// New contact phone number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    /// New default shipping address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

/// A password change request for the signed-in user.
#[derive(Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordChange {
    /// Password in use today.
    pub current_password: String,
    /// Replacement password.
    pub new_password: String,
    /// Replacement password, typed a second time.
    pub confirm_password: String,
}

impl std::fmt::Debug for PasswordChange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordChange").finish_non_exhaustive()
    }
}

#[derive(Serialize)]
struct RoleUpdate {
    role: Role,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusUpdate {
    is_active: bool,
}

/// Account management: the signed-in user's own profile and the admin user list.
pub struct Users<'a> {
    client: &'a FanStore,
}

impl FanStore {
    /// Account management.
    #[must_use]
    pub const fn users(&self) -> Users<'_> {
        Users { client: self }
    }
}

impl<'a> Users<'a> {
    fn resource(&self) -> Resource<'a, User> {
        self.client.resource("users")
    }

    /// A page of accounts, optionally restricted to one role.
    pub async fn list(&self, query: &ListQuery, role: Option<Role>) -> ServiceResult<RecordList<User>> {
        let mut builder = query.apply(self.resource().list());

        if let Some(role) = role {
            builder = builder.param("role", role);
        }

        fetch_list(builder, "Failed to load users.").await
    }

    /// A single account.
    pub async fn get(&self, id: &str) -> ServiceResult<User> {
        self.resource()
            .get_one(id)
            .call()
            .await
            .map_err(|error| failed(error, "Failed to load user."))
    }

    /// Updates the signed-in user's profile.
    ///
    /// The cached user and the auth store are refreshed with what the backend answers.
    pub async fn update_profile(&self, update: &ProfileUpdate) -> ServiceResult<User> {
        let update = trimmed_profile(update)?;

        let user: User = self
            .client
            .put_data(&self.client.endpoint("users/profile"), &update)
            .await
            .map_err(|error| failed(error, "Failed to update profile."))?;

        if let Err(error) = self.client.tokens.set_cached_user(&user) {
            tracing::warn!(%error, "could not cache the updated profile");
        }
        self.client.auth_store.update_user(user.clone());

        Ok(user)
    }

    /// Changes the signed-in user's password.
    pub async fn change_password(&self, change: &PasswordChange) -> ServiceResult<()> {
        check_password_change(change)?;

        self.client
            .put_empty(&self.client.endpoint("users/change-password"), change)
            .await
            .map_err(|error| failed(error, "Failed to change password."))
    }

    /// Gives an account another role. Admin only.
    pub async fn set_role(&self, id: &str, role: Role) -> ServiceResult<User> {
        let id = required(id, "User id")?;

        self.client
            .patch_data(&self.client.endpoint_with("users", &[id.as_str(), "role"]), &RoleUpdate { role })
            .await
            .map_err(|error| failed(error, "Failed to update user role."))
    }

    /// Enables or locks an account. Admin only.
    pub async fn set_active(&self, id: &str, is_active: bool) -> ServiceResult<User> {
        let id = required(id, "User id")?;

        self.client
            .patch_data(&self.client.endpoint_with("users", &[id.as_str(), "status"]), &StatusUpdate { is_active })
            .await
            .map_err(|error| failed(error, "Failed to update user status."))
    }

    /// Deletes an account. Admin only.
    pub async fn delete(&self, id: &str) -> ServiceResult<()> {
        self.resource()
            .delete(id)
            .await
            .map_err(|error| failed(error, "Failed to delete user."))
    }
}

fn trimmed_profile(update: &ProfileUpdate) -> ServiceResult<ProfileUpdate> {
    let trim = |value: &Option<String>| value.as_deref().map(str::trim).map(ToString::to_string);

    let update = ProfileUpdate {
        username: trim(&update.username),
        email: trim(&update.email),
        phone_number: trim(&update.phone_number),
        address: trim(&update.address),
    };

    if update.username.as_deref() == Some("") {
        return Err(ServiceError::invalid_input("Username cannot be empty."));
    }

    if update.email.as_deref().is_some_and(|email| !email.contains('@')) {
        return Err(ServiceError::invalid_input("Email address is not valid."));
    }

    Ok(update)
}

fn check_password_change(change: &PasswordChange) -> ServiceResult<()> {
    if change.current_password.is_empty() {
        return Err(ServiceError::invalid_input("Current password is required."));
    }

    if change.new_password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ServiceError::invalid_input(format!(
            "New password must be at least {MIN_PASSWORD_LENGTH} characters."
        )));
    }

    if change.new_password != change.confirm_password {
        return Err(ServiceError::invalid_input("Password confirmation does not match."));
    }

    if change.new_password == change.current_password {
        return Err(ServiceError::invalid_input(
            "New password must differ from the current one.",
        ));
    }

    Ok(())
}
