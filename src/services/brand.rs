//! Fan brands.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{failed, fetch_list, required, slugify, ListQuery, ServiceResult};
use crate::resource::{RecordList, Resource};
use crate::FanStore;

/// A fan manufacturer.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Brand {
    /// Unique identifier.
    #[serde(deserialize_with = "crate::resource::deserialize_id")]
    pub id: String,
    /// Brand name.
    pub name: String,
    /// URL slug.
    #[serde(default)]
    pub slug: String,
    /// Logo location.
    #[serde(default, alias = "logo")]
    pub logo_url: Option<String>,
    /// Free text description.
    #[serde(default)]
    pub description: Option<String>,
    /// Creation time.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Fields sent when creating or replacing a brand.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BrandPayload {
    /// Brand name.
    pub name: String,
    /// URL slug, derived from the name when empty.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub slug: String,
    /// Logo location.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    /// Free text description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Brand management.
pub struct Brands<'a> {
    client: &'a FanStore,
}

impl FanStore {
    /// Brand management.
    #[must_use]
    pub const fn brands(&self) -> Brands<'_> {
        Brands { client: self }
    }
}

impl<'a> Brands<'a> {
    fn resource(&self) -> Resource<'a, Brand> {
        self.client.resource("brands")
    }

    /// A page of brands.
    pub async fn list(&self, query: &ListQuery) -> ServiceResult<RecordList<Brand>> {
        fetch_list(query.apply(self.resource().list()), "Failed to load brands.").await
    }

    /// A single brand.
    pub async fn get(&self, id: &str) -> ServiceResult<Brand> {
        self.resource()
            .get_one(id)
            .call()
            .await
            .map_err(|error| failed(error, "Failed to load brand."))
    }

    /// The brand behind a storefront URL.
    pub async fn get_by_slug(&self, slug: &str) -> ServiceResult<Brand> {
        let slug = required(slug, "Slug")?;

        self.client
            .get_data(&self.client.endpoint_with("brands/slug", &[slug.as_str()]), None)
            .await
            .map_err(|error| failed(error, "Failed to load brand."))
    }

    /// Creates a brand.
    pub async fn create(&self, payload: &BrandPayload) -> ServiceResult<Brand> {
        let payload = validated(payload)?;

        self.resource()
            .create(&payload)
            .await
            .map_err(|error| failed(error, "Failed to create brand."))
    }

    /// Replaces a brand.
    pub async fn update(&self, id: &str, payload: &BrandPayload) -> ServiceResult<Brand> {
        let payload = validated(payload)?;

        self.resource()
            .update(id, &payload)
            .await
            .map_err(|error| failed(error, "Failed to update brand."))
    }

    /// Deletes a brand.
    pub async fn delete(&self, id: &str) -> ServiceResult<()> {
        self.resource()
            .delete(id)
            .await
            .map_err(|error| failed(error, "Failed to delete brand."))
    }
}

fn validated(payload: &BrandPayload) -> ServiceResult<BrandPayload> {
    let name = required(&payload.name, "Brand name")?;
    let slug = match slugify(&payload.slug) {
        slug if slug.is_empty() => slugify(&name),
        slug => slug,
    };

    Ok(BrandPayload {
        name,
        slug,
        ..payload.clone()
    })
}
