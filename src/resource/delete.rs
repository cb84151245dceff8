//! Record deletion.

use super::{read_empty, Resource};
use crate::error::RequestError;

impl<T> Resource<'_, T> {
    /// Delete a single record.
    ///
    /// # Example
    /// ```rust,ignore
    /// store.resource::<Tag>("tags")
    ///     .delete("RECORD_ID")
    ///     .await?;
    /// ```
    pub async fn delete(&self, record_id: &str) -> Result<(), RequestError> {
        // Validate record_id
        if record_id.trim().is_empty() {
            return Err(RequestError::InvalidInput("Record id cannot be empty".to_string()));
        }

        let request = self.client.request_delete(&self.record_url(record_id));

        let response = self.client.send(request).await?;

        read_empty(response).await
    }
}
