//! Typed services: one method per UI action, one HTTP call per method.
//!
//! Every service unwraps the `{ "data": ... }` envelope and turns failures
//! into a [`ServiceError`] whose message is the server's when it sent one, or
//! a generic per-operation text otherwise.

use serde::de::DeserializeOwned;

use crate::error::{RequestError, ServiceError};
use crate::resource::{ListBuilder, RecordList};

pub mod banner;
pub mod brand;
pub mod category;
pub mod chat;
pub mod color;
pub mod payment;
pub mod tag;
pub mod user;

pub use banner::{Banner, BannerPayload, Banners};
pub use brand::{Brand, BrandPayload, Brands};
pub use category::{Categories, Category, CategoryPayload};
pub use chat::{AssistantReply, Chat, ChatMessage, Conversation};
pub use color::{normalize_hex, Color, ColorPayload, Colors};
pub use payment::{
    format_amount, validate_amount, PaymentCheckout, PaymentRequest, PaymentResult, PaymentState, PaymentStatus,
    Payments, MAX_PAYMENT_AMOUNT,
};
pub use tag::{Tag, TagPayload, Tags};
pub use user::{PasswordChange, ProfileUpdate, Users};

/// Result of a service call.
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Paging, ordering and search options shared by list calls.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ListQuery {
    /// Page to fetch, starting at 1.
    pub page: Option<u32>,
    /// Records per page.
    pub limit: Option<u32>,
    /// Sort expression, e.g. `-createdAt`.
    pub sort: Option<String>,
    /// Free-text search.
    pub search: Option<String>,
}

impl ListQuery {
    /// No paging, no search: the backend defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the page.
    #[must_use]
    pub const fn page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    /// Sets the page size.
    #[must_use]
    pub const fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Sets the sort expression.
    #[must_use]
    pub fn sort(mut self, sort: &str) -> Self {
        self.sort = Some(sort.to_string());
        self
    }

    /// Sets the search text.
    #[must_use]
    pub fn search(mut self, search: &str) -> Self {
        self.search = Some(search.to_string());
        self
    }

    pub(crate) fn apply<'a, T: DeserializeOwned>(&self, mut builder: ListBuilder<'a, T>) -> ListBuilder<'a, T> {
        if let Some(page) = self.page {
            builder = builder.page(page);
        }

        if let Some(limit) = self.limit {
            builder = builder.limit(limit);
        }

        if let Some(sort) = self.sort.as_deref() {
            builder = builder.sort(sort);
        }

        if let Some(search) = self.search.as_deref() {
            builder = builder.search(search);
        }

        builder
    }
}

/// Runs a list builder and translates its failure.
pub(crate) async fn fetch_list<T: DeserializeOwned>(
    builder: ListBuilder<'_, T>,
    fallback: &str,
) -> ServiceResult<RecordList<T>> {
    builder.call().await.map_err(|error| failed(error, fallback))
}

/// Logs and translates a failed call.
pub(crate) fn failed(error: RequestError, fallback: &str) -> ServiceError {
    tracing::warn!(%error, "{fallback}");
    ServiceError::new(error, fallback)
}

/// Trims `value`, rejecting it when nothing is left.
pub(crate) fn required(value: &str, what: &str) -> ServiceResult<String> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ServiceError::invalid_input(format!("{what} is required.")));
    }

    Ok(value.to_string())
}

/// Turns a display name into a URL slug: lowercase ASCII words joined by `-`.
///
/// Vietnamese diacritics are folded to their base letters.
///
/// ```rust,ignore
/// assert_eq!(slugify("Quạt Đứng Điện Cơ"), "quat-dung-dien-co");
/// ```
#[must_use]
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;

    for c in name.chars().flat_map(char::to_lowercase).map(fold_vietnamese) {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            slug.push(c);
            pending_dash = false;
        } else {
            pending_dash = true;
        }
    }

    slug
}

fn fold_vietnamese(c: char) -> char {
    const GROUPS: [(&str, char); 7] = [
        ("àáạảãâầấậẩẫăằắặẳẵ", 'a'),
        ("èéẹẻẽêềếệểễ", 'e'),
        ("ìíịỉĩ", 'i'),
        ("òóọỏõôồốộổỗơờớợởỡ", 'o'),
        ("ùúụủũưừứựửữ", 'u'),
        ("ỳýỵỷỹ", 'y'),
        ("đ", 'd'),
    ];

    GROUPS
        .iter()
        .find(|(variants, _)| variants.contains(c))
        .map_or(c, |(_, base)| *base)
}
