pub mod paths;

pub use paths::{locate_asset_entry, sanitize_asset_path};
