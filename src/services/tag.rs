//! Free-form product tags.

use serde::{Deserialize, Serialize};

use super::{failed, fetch_list, required, slugify, ListQuery, ServiceResult};
use crate::resource::{RecordList, Resource};
use crate::{FanStore, ServiceError};

/// Longest tag name accepted.
pub const MAX_TAG_LENGTH: usize = 50;

/// A free-form product label such as "inverter" or "remote".
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    /// Unique identifier.
    #[serde(deserialize_with = "crate::resource::deserialize_id")]
    pub id: String,
    /// Display name.
    pub name: String,
    /// URL slug.
    #[serde(default)]
    pub slug: String,
}

/// Fields sent when creating or renaming a tag.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct TagPayload {
    /// Display name.
    pub name: String,
    /// URL slug, always derived from the name.
    pub slug: String,
}

impl TagPayload {
    /// A payload for `name`.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            slug: String::new(),
        }
    }
}

/// Tag management.
pub struct Tags<'a> {
    client: &'a FanStore,
}

impl FanStore {
    /// Tag management.
    #[must_use]
    pub const fn tags(&self) -> Tags<'_> {
        Tags { client: self }
    }
}

impl<'a> Tags<'a> {
    fn resource(&self) -> Resource<'a, Tag> {
        self.client.resource("tags")
    }

    /// A page of tags.
    pub async fn list(&self, query: &ListQuery) -> ServiceResult<RecordList<Tag>> {
        fetch_list(query.apply(self.resource().list()), "Failed to load tags.").await
    }

    /// A single tag.
    pub async fn get(&self, id: &str) -> ServiceResult<Tag> {
        self.resource()
            .get_one(id)
            .call()
            .await
            .map_err(|error| failed(error, "Failed to load tag."))
    }

    /// Creates a tag.
    pub async fn create(&self, payload: &TagPayload) -> ServiceResult<Tag> {
        let payload = validated(payload)?;

        self.resource()
            .create(&payload)
            .await
            .map_err(|error| failed(error, "Failed to create tag."))
    }

    /// Renames a tag.
    pub async fn update(&self, id: &str, payload: &TagPayload) -> ServiceResult<Tag> {
        let payload = validated(payload)?;

        self.resource()
            .update(id, &payload)
            .await
            .map_err(|error| failed(error, "Failed to update tag."))
    }

    /// Deletes a tag.
    pub async fn delete(&self, id: &str) -> ServiceResult<()> {
        self.resource()
            .delete(id)
            .await
            .map_err(|error| failed(error, "Failed to delete tag."))
    }
}

fn validated(payload: &TagPayload) -> ServiceResult<TagPayload> {
    let name = required(&payload.name, "Tag name")?;

    if name.chars().count() > MAX_TAG_LENGTH {
        return Err(ServiceError::invalid_input(format!(
            "Tag name cannot be longer than {MAX_TAG_LENGTH} characters."
        )));
    }

    Ok(TagPayload {
        slug: slugify(&name),
        name,
    })
}
