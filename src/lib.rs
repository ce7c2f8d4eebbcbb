#![deny(clippy::unwrap_used)]

pub mod category;
pub mod config;
pub mod ledger;
pub mod loader;
pub mod logging;
pub mod markup;
pub mod session;
pub mod uploader;
pub mod woocommerce;
