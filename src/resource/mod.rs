//! Generic CRUD over one REST resource of the backend.

use reqwest::Response;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{ErrorResponse, RequestError};
use crate::FanStore;

pub mod create;
pub mod delete;
pub mod get_one;
pub mod list;
pub mod update;

pub use list::ListBuilder;

/// Represents a specific REST resource of the backend, such as `brands`.
///
/// Instances are created with [`FanStore::resource`]. All operations on the
/// resource (listing, fetching, creating, updating, deleting) are methods of
/// this struct; the typed services are thin layers over it.
pub struct Resource<'a, T> {
    pub(crate) client: &'a FanStore,
    pub(crate) path: &'a str,
    pub(crate) _marker: std::marker::PhantomData<T>,
}

impl FanStore {
    /// Creates a [`Resource`] for the given path, relative to the base URL.
    ///
    /// # Example
    /// ```rust,ignore
    /// let store = FanStore::new("http://localhost:8080/api");
    ///
    /// let fans = store
    ///     .resource::<Product>("products")
    ///     .list()
    ///     .search("ceiling")
    ///     .call()
    ///     .await?;
    /// ```
    ///
    /// # Panics
    ///
    /// This method will panic if the path is empty or contains invalid characters.
    #[must_use]
    pub fn resource<T>(&self, path: &'static str) -> Resource<'_, T> {
        assert!(!path.is_empty(), "Resource path cannot be empty");

        // Paths are made of alphanumeric segments, dashes and underscores
        assert!(
            path.chars()
                .all(|c| c.is_alphanumeric() || c == '_' || c == '-' || c == '/'),
            "Resource path contains invalid characters. Only alphanumeric characters, '_', '-' and '/' are allowed"
        );

        Resource {
            client: self,
            path,
            _marker: std::marker::PhantomData,
        }
    }
}

impl FanStore {
    /// GET `url` and read its single record.
    pub(crate) async fn get_data<T: DeserializeOwned>(
        &self,
        url: &str,
        params: Option<Vec<(&str, &str)>>,
    ) -> Result<T, RequestError> {
        let request = self.request_get(url, params);
        let response = self.send_query(request).await?;

        read_data(response).await
    }

    /// GET `url` and read its list.
    pub(crate) async fn get_list<T: DeserializeOwned>(
        &self,
        url: &str,
        params: Option<Vec<(&str, &str)>>,
    ) -> Result<RecordList<T>, RequestError> {
        let request = self.request_get(url, params);
        let response = self.send_query(request).await?;

        read_list(response).await
    }

    /// POST `body` to `url` and read the single record answered.
    pub(crate) async fn post_data<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<T, RequestError> {
        let request = self.request_post_json(url, body);
        let response = self.send(request).await?;

        read_data(response).await
    }

    /// PUT `body` to `url` and read the single record answered.
    pub(crate) async fn put_data<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<T, RequestError> {
        let request = self.request_put_json(url, body);
        let response = self.send(request).await?;

        read_data(response).await
    }

    /// PUT `body` to `url`, ignoring what is answered.
    pub(crate) async fn put_empty<B: Serialize + ?Sized>(&self, url: &str, body: &B) -> Result<(), RequestError> {
        let request = self.request_put_json(url, body);
        let response = self.send(request).await?;

        read_empty(response).await
    }

    /// PATCH `body` to `url` and read the single record answered.
    pub(crate) async fn patch_data<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<T, RequestError> {
        let request = self.request_patch_json(url, body);
        let response = self.send(request).await?;

        read_data(response).await
    }
}

impl<T> Resource<'_, T> {
    pub(crate) fn collection_url(&self) -> String {
        self.client.endpoint(self.path)
    }

    pub(crate) fn record_url(&self, id: &str) -> String {
        self.client.endpoint_with(self.path, &[id])
    }
}

/// A paginated list of records.
///
/// Every list endpoint is normalized into this shape, whether the backend
/// answered with `{ data, pagination }`, `{ items, total, ... }` or a bare array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordList<T> {
    /// The page of the paginated list *(starting at 1)*.
    pub page: u32,
    /// The max returned records per page.
    pub per_page: u32,
    /// The total amount of records matching the query.
    pub total_items: u64,
    /// The total amount of pages.
    pub total_pages: u32,
    /// Records of the current page.
    pub items: Vec<T>,
}

impl<T> Default for RecordList<T> {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 0,
            total_items: 0,
            total_pages: 0,
            items: Vec::new(),
        }
    }
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
struct Pagination {
    #[serde(default)]
    page: Option<u32>,
    #[serde(default, alias = "perPage", alias = "pageSize", alias = "size")]
    limit: Option<u32>,
    #[serde(default, alias = "totalItems", alias = "totalElements", alias = "count")]
    total: Option<u64>,
    #[serde(default)]
    total_pages: Option<u32>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ListResponse<T> {
    Wrapped {
        data: Vec<T>,
        #[serde(default)]
        pagination: Option<Pagination>,
    },
    Paged {
        items: Vec<T>,
        #[serde(flatten)]
        pagination: Pagination,
    },
    Bare(Vec<T>),
}

impl<T> From<ListResponse<T>> for RecordList<T> {
    fn from(response: ListResponse<T>) -> Self {
        let (items, pagination) = match response {
            ListResponse::Wrapped { data, pagination } => (data, pagination.unwrap_or_default()),
            ListResponse::Paged { items, pagination } => (items, pagination),
            ListResponse::Bare(items) => (items, Pagination::default()),
        };

        let count = u32::try_from(items.len()).unwrap_or(u32::MAX);
        let per_page = pagination.limit.unwrap_or(count);
        let total_items = pagination.total.unwrap_or_else(|| u64::from(count));
        let total_pages = pagination.total_pages.unwrap_or_else(|| {
            if per_page == 0 {
                u32::from(total_items > 0)
            } else {
                u32::try_from(total_items.div_ceil(u64::from(per_page))).unwrap_or(u32::MAX)
            }
        });

        Self {
            page: pagination.page.unwrap_or(1).max(1),
            per_page,
            total_items,
            total_pages,
            items,
        }
    }
}

/// A single record, either wrapped in the conventional `{ "data": ... }`
/// envelope or sent as is.
#[derive(Deserialize)]
#[serde(untagged)]
enum Payload<T> {
    Wrapped { data: T },
    Raw(T),
}

impl<T> Payload<T> {
    fn into_inner(self) -> T {
        match self {
            Self::Wrapped { data } | Self::Raw(data) => data,
        }
    }
}

/// Turns a non-success response into the matching [`RequestError`].
pub(crate) async fn ensure_success(response: Response) -> Result<Response, RequestError> {
    let status = response.status();

    if status.is_success() {
        return Ok(response);
    }

    let body = response.json::<ErrorResponse>().await.unwrap_or_default();
    Err(RequestError::from_status(status, &body))
}

/// Reads a single record out of a response, unwrapping the envelope.
pub(crate) async fn read_data<T: DeserializeOwned>(response: Response) -> Result<T, RequestError> {
    let response = ensure_success(response).await?;

    response
        .json::<Payload<T>>()
        .await
        .map(Payload::into_inner)
        .map_err(|error| RequestError::ParseError(error.to_string()))
}

/// Reads a list out of a response and normalizes its pagination.
pub(crate) async fn read_list<T: DeserializeOwned>(response: Response) -> Result<RecordList<T>, RequestError> {
    let response = ensure_success(response).await?;

    response
        .json::<ListResponse<T>>()
        .await
        .map(RecordList::from)
        .map_err(|error| RequestError::ParseError(error.to_string()))
}

/// Accepts any success response, ignoring its body.
pub(crate) async fn read_empty(response: Response) -> Result<(), RequestError> {
    ensure_success(response).await.map(|_| ())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Id {
    Text(String),
    Signed(i64),
    Unsigned(u64),
}

impl From<Id> for String {
    fn from(id: Id) -> Self {
        match id {
            Id::Text(text) => text,
            Id::Signed(number) => number.to_string(),
            Id::Unsigned(number) => number.to_string(),
        }
    }
}

/// Accepts identifiers sent either as strings or as numbers.
pub(crate) fn deserialize_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Id::deserialize(deserializer).map(String::from)
}

/// Same as [`deserialize_id`] for optional references.
pub(crate) fn deserialize_optional_id<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    Option::<Id>::deserialize(deserializer).map(|id| id.map(String::from))
}
