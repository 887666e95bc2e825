//! Data models for the product catalogue.
//!
//! - `Product`: a catalogue record as returned by the admin listing
//! - `PageDescriptor`, `ProductPage`: one page of the listing and its pagination info
//! - `ProductDraft`: editable form state for creating or updating a product

pub mod draft;
pub mod pagination;
pub mod product;

pub use draft::{DraftError, DraftField, ProductData, ProductDraft, ProductPayload};
pub use pagination::{PageDescriptor, PaginationInfo, ProductPage, ProductsResponse};
pub use product::{format_price, Product};
