//! Editable product form state.
//!
//! A `ProductDraft` keeps every field as the user typed it; numbers are only
//! parsed when the draft is turned into a request payload.

use serde::Serialize;
use thiserror::Error;

use super::product::{format_price, Product};

#[derive(Error, Debug, PartialEq)]
pub enum DraftError {
    #[error("{0} is required")]
    Missing(&'static str),

    #[error("{field} must be a non-negative number, got {value:?}")]
    InvalidPrice { field: &'static str, value: String },
}

/// Fields of the product editor, in tab order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftField {
    ImageUrl,
    MoreImages,
    Title,
    Category,
    Unit,
    OriginPrice,
    Price,
    Description,
    Content,
    Enabled,
}

impl DraftField {
    pub const ALL: [DraftField; 10] = [
        DraftField::ImageUrl,
        DraftField::MoreImages,
        DraftField::Title,
        DraftField::Category,
        DraftField::Unit,
        DraftField::OriginPrice,
        DraftField::Price,
        DraftField::Description,
        DraftField::Content,
        DraftField::Enabled,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            DraftField::ImageUrl => "Image URL",
            DraftField::MoreImages => "More images",
            DraftField::Title => "Title",
            DraftField::Category => "Category",
            DraftField::Unit => "Unit",
            DraftField::OriginPrice => "Origin price",
            DraftField::Price => "Price",
            DraftField::Description => "Description",
            DraftField::Content => "Content",
            DraftField::Enabled => "Enabled",
        }
    }

    /// Get the next field (wrapping around)
    pub fn next(&self) -> Self {
        let idx = Self::ALL.iter().position(|f| f == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    /// Get the previous field (wrapping around)
    pub fn prev(&self) -> Self {
        let idx = Self::ALL.iter().position(|f| f == self).unwrap_or(0);
        Self::ALL[(idx + Self::ALL.len() - 1) % Self::ALL.len()]
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, DraftField::OriginPrice | DraftField::Price)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductDraft {
    pub image_url: String,
    /// Additional image URLs, comma separated.
    pub more_images: String,
    pub title: String,
    pub category: String,
    pub unit: String,
    pub origin_price: String,
    pub price: String,
    pub description: String,
    pub content: String,
    pub is_enabled: bool,
}

/// Request body for product create/update: `{"data": {...}}`.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ProductPayload {
    pub data: ProductData,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ProductData {
    pub title: String,
    pub category: String,
    pub unit: String,
    pub origin_price: f64,
    pub price: f64,
    pub description: String,
    pub content: String,
    pub is_enabled: u8,
    #[serde(rename = "imageUrl")]
    pub image_url: String,
    #[serde(rename = "imagesUrl")]
    pub images_url: Vec<String>,
}

impl ProductDraft {
    /// Pre-fill the form from an existing product for editing.
    pub fn from_product(product: &Product) -> Self {
        Self {
            image_url: product.image_url.clone(),
            more_images: product.images_url.join(", "),
            title: product.title.clone(),
            category: product.category.clone(),
            unit: product.unit.clone(),
            origin_price: format_price(product.origin_price),
            price: format_price(product.price),
            description: product.description.clone(),
            content: product.content.clone(),
            is_enabled: product.is_enabled,
        }
    }

    /// Text buffer behind a field; `None` for the enabled checkbox.
    pub fn text(&self, field: DraftField) -> Option<&str> {
        let value = match field {
            DraftField::ImageUrl => &self.image_url,
            DraftField::MoreImages => &self.more_images,
            DraftField::Title => &self.title,
            DraftField::Category => &self.category,
            DraftField::Unit => &self.unit,
            DraftField::OriginPrice => &self.origin_price,
            DraftField::Price => &self.price,
            DraftField::Description => &self.description,
            DraftField::Content => &self.content,
            DraftField::Enabled => return None,
        };
        Some(value.as_str())
    }

    pub fn text_mut(&mut self, field: DraftField) -> Option<&mut String> {
        let value = match field {
            DraftField::ImageUrl => &mut self.image_url,
            DraftField::MoreImages => &mut self.more_images,
            DraftField::Title => &mut self.title,
            DraftField::Category => &mut self.category,
            DraftField::Unit => &mut self.unit,
            DraftField::OriginPrice => &mut self.origin_price,
            DraftField::Price => &mut self.price,
            DraftField::Description => &mut self.description,
            DraftField::Content => &mut self.content,
            DraftField::Enabled => return None,
        };
        Some(value)
    }

    pub fn toggle_enabled(&mut self) {
        self.is_enabled = !self.is_enabled;
    }

    /// Extra image URLs split out of `more_images`.
    pub fn images(&self) -> Vec<String> {
        self.more_images
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Validate the form and build the API payload.
    pub fn to_payload(&self) -> Result<ProductPayload, DraftError> {
        let title = required("Title", &self.title)?;
        let category = required("Category", &self.category)?;
        let unit = required("Unit", &self.unit)?;
        let origin_price = parse_price("Origin price", &self.origin_price)?;
        let price = parse_price("Price", &self.price)?;

        Ok(ProductPayload {
            data: ProductData {
                title,
                category,
                unit,
                origin_price,
                price,
                description: self.description.trim().to_string(),
                content: self.content.trim().to_string(),
                is_enabled: u8::from(self.is_enabled),
                image_url: self.image_url.trim().to_string(),
                images_url: self.images(),
            },
        })
    }
}

fn required(field: &'static str, value: &str) -> Result<String, DraftError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DraftError::Missing(field));
    }
    Ok(trimmed.to_string())
}

fn parse_price(field: &'static str, value: &str) -> Result<f64, DraftError> {
    let invalid = || DraftError::InvalidPrice {
        field,
        value: value.to_string(),
    };
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DraftError::Missing(field));
    }
    let parsed: f64 = trimmed.parse().map_err(|_| invalid())?;
    if !parsed.is_finite() || parsed < 0.0 {
        return Err(invalid());
    }
    Ok(parsed)
}
