pub mod category;
pub mod product;
pub mod row;

pub use category::{CategoryId, RemoteCategory};
pub use product::{CreatedProduct, NewProduct, ProductType};
pub use row::Row;

/// Trimmed value, or `None` when nothing but whitespace is left.
pub fn non_blank(s: &str) -> Option<&str> {
    let s = s.trim();
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}
