//! Storefront banners.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{failed, fetch_list, required, ListQuery, ServiceResult};
use crate::resource::{RecordList, Resource};
use crate::{FanStore, Form, Part};

/// A promotional banner shown on the storefront.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Banner {
    /// Unique identifier.
    #[serde(deserialize_with = "crate::resource::deserialize_id")]
    pub id: String,
    /// Headline.
    pub title: String,
    /// Secondary line.
    #[serde(default)]
    pub subtitle: Option<String>,
    /// Image shown.
    #[serde(default, alias = "image")]
    pub image_url: String,
    /// Where a click leads.
    #[serde(default, alias = "link")]
    pub link_url: Option<String>,
    /// Display order, lowest first.
    #[serde(default, alias = "order")]
    pub position: i32,
    /// Whether the banner is shown.
    #[serde(default)]
    pub is_active: bool,
    /// Creation time.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Fields sent when creating or replacing a banner.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BannerPayload {
    /// Headline.
    pub title: String,
    /// Secondary line.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    /// Image location. Leave empty when uploading the image itself.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub image_url: String,
    /// Where a click leads.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link_url: Option<String>,
    /// Display order.
    pub position: i32,
    /// Whether the banner is shown.
    pub is_active: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ActiveToggle {
    is_active: bool,
}

/// Banner management.
pub struct Banners<'a> {
    client: &'a FanStore,
}

impl FanStore {
    /// Banner management.
    #[must_use]
    pub const fn banners(&self) -> Banners<'_> {
        Banners { client: self }
    }
}

impl<'a> Banners<'a> {
    fn resource(&self) -> Resource<'a, Banner> {
        self.client.resource("banners")
    }

    /// A page of banners.
    pub async fn list(&self, query: &ListQuery) -> ServiceResult<RecordList<Banner>> {
        fetch_list(query.apply(self.resource().list()), "Failed to load banners.").await
    }

    /// The banners to show on the storefront, in display order.
    pub async fn active(&self) -> ServiceResult<Vec<Banner>> {
        let mut banners = fetch_list(
            self.resource().list().param("isActive", true),
            "Failed to load banners.",
        )
        .await?
        .items;

        banners.retain(|banner| banner.is_active);
        banners.sort_by_key(|banner| banner.position);

        Ok(banners)
    }

    /// A single banner.
    pub async fn get(&self, id: &str) -> ServiceResult<Banner> {
        self.resource()
            .get_one(id)
            .call()
            .await
            .map_err(|error| failed(error, "Failed to load banner."))
    }

    /// Creates a banner pointing at an already hosted image.
    pub async fn create(&self, payload: &BannerPayload) -> ServiceResult<Banner> {
        let payload = validated(payload)?;

        if payload.image_url.trim().is_empty() {
            return Err(crate::ServiceError::invalid_input("Image is required."));
        }

        self.resource()
            .create(&payload)
            .await
            .map_err(|error| failed(error, "Failed to create banner."))
    }

    /// Creates a banner and uploads its image in the same request.
    pub async fn create_with_image(
        &self,
        payload: &BannerPayload,
        image: Vec<u8>,
        file_name: &str,
    ) -> ServiceResult<Banner> {
        let payload = validated(payload)?;

        if image.is_empty() {
            return Err(crate::ServiceError::invalid_input("Image is required."));
        }

        let mut form = Form::new()
            .text("title", payload.title)
            .text("position", payload.position.to_string())
            .text("isActive", payload.is_active.to_string())
            .part("image", Part::bytes(image).file_name(file_name.to_string()));

        if let Some(subtitle) = payload.subtitle {
            form = form.text("subtitle", subtitle);
        }

        if let Some(link_url) = payload.link_url {
            form = form.text("linkUrl", link_url);
        }

        self.resource()
            .create_multipart(form)
            .await
            .map_err(|error| failed(error, "Failed to create banner."))
    }

    /// Replaces a banner.
    pub async fn update(&self, id: &str, payload: &BannerPayload) -> ServiceResult<Banner> {
        let payload = validated(payload)?;

        self.resource()
            .update(id, &payload)
            .await
            .map_err(|error| failed(error, "Failed to update banner."))
    }

    /// Shows or hides a banner.
    pub async fn set_active(&self, id: &str, is_active: bool) -> ServiceResult<Banner> {
        self.resource()
            .patch(id, &ActiveToggle { is_active })
            .await
            .map_err(|error| failed(error, "Failed to update banner."))
    }

    /// Deletes a banner.
    pub async fn delete(&self, id: &str) -> ServiceResult<()> {
        self.resource()
            .delete(id)
            .await
            .map_err(|error| failed(error, "Failed to delete banner."))
    }
}

fn validated(payload: &BannerPayload) -> ServiceResult<BannerPayload> {
    if payload.position < 0 {
        return Err(crate::ServiceError::invalid_input("Position cannot be negative."));
    }

    Ok(BannerPayload {
        title: required(&payload.title, "Title")?,
        subtitle: trimmed(payload.subtitle.as_deref()),
        image_url: payload.image_url.trim().to_string(),
        link_url: trimmed(payload.link_url.as_deref()),
        ..payload.clone()
    })
}

fn trimmed(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(ToString::to_string)
}
