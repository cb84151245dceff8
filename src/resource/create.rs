//! Record creation.

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::{read_data, Resource};
use crate::error::RequestError;

impl<T: DeserializeOwned> Resource<'_, T> {
    /// Create a new record and return it as stored by the backend.
    ///
    /// For file uploads, use [`Resource::create_multipart()`].
    ///
    /// # Example
    /// ```rust,ignore
    /// let brand = store
    ///     .resource::<Brand>("brands")
    ///     .create(&BrandPayload {
    ///         name: "Panasonic".to_string(),
    ///         ..BrandPayload::default()
    ///     })
    ///     .await?;
    /// ```
    pub async fn create<B: Serialize + ?Sized>(&self, body: &B) -> Result<T, RequestError> {
        let request = self.client.request_post_json(&self.collection_url(), body);

        let response = self.client.send(request).await?;

        read_data(response).await
    }

    /// Create a new record from multipart form data (e.g. with an image).
    ///
    /// For simple JSON records without files, use [`Resource::create()`].
    ///
    /// # Example
    /// ```rust,ignore
    /// use fanstore_rs::{Form, Part};
    ///
    /// let image = std::fs::read("./summer-sale.jpg")?;
    ///
    /// let form = Form::new()
    ///     .text("title", "Summer sale")
    ///     .part("image", Part::bytes(image).file_name("summer-sale.jpg"));
    ///
    /// let banner = store.resource::<Banner>("banners").create_multipart(form).await?;
    /// ```
    pub async fn create_multipart(&self, form: reqwest::multipart::Form) -> Result<T, RequestError> {
        let request = self.client.request_post_form(&self.collection_url(), form);

        let response = self.client.send(request).await?;

        read_data(response).await
    }
}
