//! Product categories, possibly nested one level under a parent.

use serde::{Deserialize, Serialize};

use super::{failed, fetch_list, required, slugify, ListQuery, ServiceResult};
use crate::resource::{RecordList, Resource};
use crate::{FanStore, ServiceError};

/// A product category, possibly nested under a parent.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    /// Unique identifier.
    #[serde(deserialize_with = "crate::resource::deserialize_id")]
    pub id: String,
    /// Display name.
    pub name: String,
    /// URL slug.
    #[serde(default)]
    pub slug: String,
    /// Free text description.
    #[serde(default)]
    pub description: Option<String>,
    /// Illustration location.
    #[serde(default, alias = "image")]
    pub image_url: Option<String>,
    /// Parent category, for sub-categories.
    #[serde(default, deserialize_with = "crate::resource::deserialize_optional_id")]
    pub parent_id: Option<String>,
}

/// Fields sent when creating or replacing a category.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryPayload {
    /// Display name.
    pub name: String,
    /// URL slug, derived from the name when empty.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub slug: String,
    /// Free text description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Illustration location.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Parent category.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
}

/// Category management.
pub struct Categories<'a> {
    client: &'a FanStore,
}

impl FanStore {
    /// Category management.
    #[must_use]
    pub const fn categories(&self) -> Categories<'_> {
        Categories { client: self }
    }
}

impl<'a> Categories<'a> {
    fn resource(&self) -> Resource<'a, Category> {
        self.client.resource("categories")
    }

    /// A page of categories.
    pub async fn list(&self, query: &ListQuery) -> ServiceResult<RecordList<Category>> {
        fetch_list(query.apply(self.resource().list()), "Failed to load categories.").await
    }

    /// Top-level categories only.
    pub async fn roots(&self) -> ServiceResult<Vec<Category>> {
        let categories = fetch_list(self.resource().list(), "Failed to load categories.").await?;

        Ok(categories
            .items
            .into_iter()
            .filter(|category| category.parent_id.is_none())
            .collect())
    }

    /// A single category.
    pub async fn get(&self, id: &str) -> ServiceResult<Category> {
        self.resource()
            .get_one(id)
            .call()
            .await
            .map_err(|error| failed(error, "Failed to load category."))
    }

    /// The category behind a storefront URL.
    pub async fn get_by_slug(&self, slug: &str) -> ServiceResult<Category> {
        let slug = required(slug, "Slug")?;

        self.client
            .get_data(&self.client.endpoint_with("categories/slug", &[slug.as_str()]), None)
            .await
            .map_err(|error| failed(error, "Failed to load category."))
    }

    /// Creates a category.
    pub async fn create(&self, payload: &CategoryPayload) -> ServiceResult<Category> {
        let payload = validated(None, payload)?;

        self.resource()
            .create(&payload)
            .await
            .map_err(|error| failed(error, "Failed to create category."))
    }

    /// Replaces a category.
    pub async fn update(&self, id: &str, payload: &CategoryPayload) -> ServiceResult<Category> {
        let payload = validated(Some(id), payload)?;

        self.resource()
            .update(id, &payload)
            .await
            .map_err(|error| failed(error, "Failed to update category."))
    }

    /// Deletes a category.
    pub async fn delete(&self, id: &str) -> ServiceResult<()> {
        self.resource()
            .delete(id)
            .await
            .map_err(|error| failed(error, "Failed to delete category."))
    }
}

fn validated(id: Option<&str>, payload: &CategoryPayload) -> ServiceResult<CategoryPayload> {
    let name = required(&payload.name, "Category name")?;
    let slug = match slugify(&payload.slug) {
        slug if slug.is_empty() => slugify(&name),
        slug => slug,
    };
    let parent_id = payload
        .parent_id
        .as_deref()
        .map(str::trim)
        .filter(|parent| !parent.is_empty())
        .map(ToString::to_string);

    if id.is_some() && parent_id.as_deref() == id {
        return Err(ServiceError::invalid_input("A category cannot be its own parent."));
    }

    Ok(CategoryPayload {
        name,
        slug,
        parent_id,
        ..payload.clone()
    })
}
