//! Paginated listing.

use serde::de::DeserializeOwned;

use super::{read_list, RecordList, Resource};
use crate::error::RequestError;
use crate::FanStore;

/// Builds a paginated list query against a resource.
pub struct ListBuilder<'a, T> {
    client: &'a FanStore,
    url: String,
    page: Option<String>,
    limit: Option<String>,
    sort: Option<String>,
    search: Option<String>,
    params: Vec<(String, String)>,
    _marker: std::marker::PhantomData<T>,
}

impl<'a, T: DeserializeOwned> Resource<'a, T> {
    /// Fetch a paginated list of records.
    ///
    /// # Example
    /// ```rust,ignore
    /// let colors = store
    ///     .resource::<Color>("colors")
    ///     .list()
    ///     .page(2)
    ///     .limit(20)
    ///     .sort("-createdAt")
    ///     .call()
    ///     .await?;
    ///
    /// for color in colors.items {
    ///     println!("{color:?}");
    /// }
    /// ```
    #[must_use]
    pub fn list(&self) -> ListBuilder<'a, T> {
        ListBuilder::at(self.client, self.collection_url())
    }
}

impl<'a, T: DeserializeOwned> ListBuilder<'a, T> {
    /// A list query against an arbitrary URL.
    pub(crate) fn at(client: &'a FanStore, url: String) -> Self {
        Self {
            client,
            url,
            page: None,
            limit: None,
            sort: None,
            search: None,
            params: Vec::new(),
            _marker: std::marker::PhantomData,
        }
    }

    /// The page of the paginated list (starting at 1).
    #[must_use]
    pub fn page(mut self, page: u32) -> Self {
        self.page = Some(page.max(1).to_string());
        self
    }

    /// The max returned records per page.
    #[must_use]
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit.to_string());
        self
    }

    /// Order of the records. Prefix an attribute with `-` for descending order.
    ///
    /// # Example
    /// ```rust,ignore
    /// .sort("-createdAt")
    /// ```
    #[must_use]
    pub fn sort(mut self, sort: &str) -> Self {
        self.sort = Some(sort.to_string());
        self
    }

    /// Free-text search. Blank text is ignored.
    #[must_use]
    pub fn search(mut self, search: &str) -> Self {
        let search = search.trim();
        self.search = (!search.is_empty()).then(|| search.to_string());
        self
    }

    /// Adds an arbitrary query parameter, e.g. `("isActive", "true")`.
    #[must_use]
    pub fn param(mut self, key: &str, value: impl ToString) -> Self {
        self.params.push((key.to_string(), value.to_string()));
        self
    }

    /// The query parameters this builder will send.
    fn query(&self) -> Vec<(&str, &str)> {
        let mut query_parameters: Vec<(&str, &str)> = vec![];

        if let Some(page) = self.page.as_deref() {
            query_parameters.push(("page", page));
        }

        if let Some(limit) = self.limit.as_deref() {
            query_parameters.push(("limit", limit));
        }

        if let Some(sort) = self.sort.as_deref() {
            query_parameters.push(("sort", sort));
        }

        if let Some(search) = self.search.as_deref() {
            query_parameters.push(("search", search));
        }

        for (key, value) in &self.params {
            query_parameters.push((key.as_str(), value.as_str()));
        }

        query_parameters
    }

    /// Execute the request and return the paginated results.
    pub async fn call(self) -> Result<RecordList<T>, RequestError> {
        let request = self.client.request_get(&self.url, Some(self.query()));

        let response = self.client.send_query(request).await?;

        read_list(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_holds_only_set_parameters() {
        let client = FanStore::new("http://localhost:8080/api");
        let builder = client
            .resource::<serde_json::Value>("brands")
            .list()
            .page(0)
            .search("   ")
            .param("isActive", true);

        assert_eq!(builder.query(), vec![("page", "1"), ("isActive", "true")]);
        assert_eq!(builder.url, "http://localhost:8080/api/brands");
    }
}
