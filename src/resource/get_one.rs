//! Single record lookup.

use serde::de::DeserializeOwned;

use super::{read_data, Resource};
use crate::error::RequestError;
use crate::FanStore;

/// Builds a request for a single record.
pub struct GetOneBuilder<'a, T> {
    client: &'a FanStore,
    url: String,
    record_id: String,
    params: Vec<(String, String)>,
    _marker: std::marker::PhantomData<T>,
}

impl<'a, T: DeserializeOwned> Resource<'a, T> {
    /// Fetch a single record.
    ///
    /// # Example
    /// ```rust,ignore
    /// let brand = store
    ///     .resource::<Brand>("brands")
    ///     .get_one("record_id_123")
    ///     .call()
    ///     .await?;
    /// ```
    #[must_use]
    pub fn get_one(&self, record_id: &str) -> GetOneBuilder<'a, T> {
        GetOneBuilder {
            client: self.client,
            url: self.record_url(record_id),
            record_id: record_id.to_string(),
            params: Vec::new(),
            _marker: std::marker::PhantomData,
        }
    }
}

impl<T: DeserializeOwned> GetOneBuilder<'_, T> {
    /// Adds a query parameter.
    #[must_use]
    pub fn param(mut self, key: &str, value: impl ToString) -> Self {
        self.params.push((key.to_string(), value.to_string()));
        self
    }

    /// Execute the request and return the record.
    pub async fn call(self) -> Result<T, RequestError> {
        if self.record_id.trim().is_empty() {
            return Err(RequestError::InvalidInput("Record id cannot be empty".to_string()));
        }

        let params = (!self.params.is_empty()).then(|| {
            self.params
                .iter()
                .map(|(key, value)| (key.as_str(), value.as_str()))
                .collect()
        });

        let request = self.client.request_get(&self.url, params);

        let response = self.client.send_query(request).await?;

        read_data(response).await
    }
}
