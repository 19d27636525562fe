//! Heuristic extraction over unstructured deal text and markup.
//!
//! Feed entries and manually pasted deal text rarely carry structured price
//! or coupon fields, so everything in this crate is best-effort: each
//! function returns `None` (or an empty string for normalization helpers)
//! when nothing usable is found, and callers must treat every extracted
//! field as optional. No function here performs I/O or touches storage.

mod coupon;
mod html;
mod image;
mod price;
mod store;
mod title;

pub use coupon::extract_coupon;
pub use html::strip_html;
pub use image::extract_image;
pub use price::{extract_prices, PriceExtraction};
pub use store::extract_store;
pub use title::extract_title;
