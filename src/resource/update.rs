//! Record replacement and partial updates.

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::{read_data, Resource};
use crate::error::RequestError;

impl<T: DeserializeOwned> Resource<'_, T> {
    /// Replace a single record and return it as stored by the backend.
    ///
    /// # Example
    /// ```rust,ignore
    /// let color = store
    ///     .resource::<Color>("colors")
    ///     .update("record_id_123", &ColorPayload::new("Ivory", "#fffff0"))
    ///     .await?;
    /// ```
    pub async fn update<B: Serialize + ?Sized>(&self, record_id: &str, body: &B) -> Result<T, RequestError> {
        if record_id.trim().is_empty() {
            return Err(RequestError::InvalidInput("Record id cannot be empty".to_string()));
        }

        let request = self.client.request_put_json(&self.record_url(record_id), body);

        let response = self.client.send(request).await?;

        read_data(response).await
    }

    /// Change only the given fields of a single record.
    pub async fn patch<B: Serialize + ?Sized>(&self, record_id: &str, body: &B) -> Result<T, RequestError> {
        if record_id.trim().is_empty() {
            return Err(RequestError::InvalidInput("Record id cannot be empty".to_string()));
        }

        let request = self.client.request_patch_json(&self.record_url(record_id), body);

        let response = self.client.send(request).await?;

        read_data(response).await
    }
}
