//! Product snapshot carried by cart lines and filtered on the home page.

use serde::{Deserialize, Serialize};

use super::id::{CategoryId, ProductId};
use super::price::Price;

/// The slice of catalog data client state needs about a product.
///
/// A `ProductRef` is a point-in-time snapshot: once a product is added to a
/// cart its line keeps the title and price it was added with, regardless of
/// later catalog edits. The backend catalog record is the source of truth
/// and lives elsewhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRef {
    /// Catalog ID; unique key within a cart.
    pub id: ProductId,
    /// Display title.
    pub title: String,
    /// Unit price at snapshot time.
    pub price: Price,
    /// Owning category, if the product is categorized.
    pub category: Option<CategoryId>,
    /// Primary image URL, if any.
    pub image_url: Option<String>,
}

impl ProductRef {
    /// Create a snapshot with no category or image.
    #[must_use]
    pub const fn new(id: ProductId, title: String, price: Price) -> Self {
        Self {
            id,
            title,
            price,
            category: None,
            image_url: None,
        }
    }

    /// Attach a category.
    #[must_use]
    pub fn with_category(mut self, category: CategoryId) -> Self {
        self.category = Some(category);
        self
    }

    /// Attach a primary image URL.
    #[must_use]
    pub fn with_image_url(mut self, url: impl Into<String>) -> Self {
        self.image_url = Some(url.into());
        self
    }
}
