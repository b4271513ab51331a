//! Storage layer: DuckDB device catalogue, CSV import, shared handle for servers.

mod duck;
mod error;
pub mod import;
mod shared;

pub use duck::DuckStore;
pub use error::StoreError;
pub use import::{ImportReport, RowError, import_csv};
pub use shared::SharedStore;
