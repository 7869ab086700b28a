//! Tabular upload handling

pub mod csv_table;
pub mod upload_index;

pub use csv_table::{CsvTable, PREVIEW_ROWS};
pub use upload_index::{UploadIndex, UploadReceipt, UploadedFile};
