//! Uploaded file storage and the in-memory index of accepted files.
//!
//! The index lives only for the process lifetime; the files themselves stay
//! in the upload folder.

use chrono::Local;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};
use tracing::{info, warn};

use super::csv_table::CsvTable;
use crate::error::{AssistError, AssistResult};
use crate::utils::TextUtils;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadedFile {
    pub original_name: String,
    pub filepath: String,
    pub rows: usize,
    pub columns: Vec<String>,
    pub upload_time: String,
    pub preview: String,
}

/// What `/upload` reports back for an accepted file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadReceipt {
    pub filename: String,
    pub original_name: String,
    pub rows: usize,
    pub columns: Vec<String>,
}

pub struct UploadIndex {
    folder: PathBuf,
    allowed_extensions: Vec<String>,
    files: RwLock<BTreeMap<String, UploadedFile>>,
}

impl UploadIndex {
    pub fn new(folder: impl Into<PathBuf>, allowed_extensions: Vec<String>) -> Self {
        Self {
            folder: folder.into(),
            allowed_extensions,
            files: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn folder(&self) -> &Path {
        &self.folder
    }

    /// Validate the name, save the bytes, parse them, and index the result.
    /// A file that fails to parse is deleted again before the error is returned.
    pub fn store(&self, filename: &str, bytes: &[u8]) -> AssistResult<UploadReceipt> {
        if filename.is_empty() {
            return Err(AssistError::validation("No file selected"));
        }
        if !TextUtils::has_extension(filename, &self.allowed_extensions) {
            return Err(AssistError::validation("Please upload a CSV file"));
        }

        let safe_name = TextUtils::secure_filename(filename);
        if safe_name.is_empty() {
            return Err(AssistError::validation("Invalid file name"));
        }
        let unique_name = format!("{}_{}", Local::now().format("%Y%m%d_%H%M%S"), safe_name);
        let filepath = self.folder.join(&unique_name);

        std::fs::create_dir_all(&self.folder)
            .map_err(|e| AssistError::io("Upload error", e))?;
        std::fs::write(&filepath, bytes).map_err(|e| AssistError::io("Upload error", e))?;

        let table = match CsvTable::parse(bytes) {
            Ok(table) => table,
            Err(reason) => {
                if let Err(e) = std::fs::remove_file(&filepath) {
                    warn!("Could not remove rejected upload {}: {}", filepath.display(), e);
                }
                return Err(AssistError::validation(format!("Invalid CSV file: {}", reason)));
            }
        };

        let entry = UploadedFile {
            original_name: safe_name.clone(),
            filepath: filepath.to_string_lossy().into_owned(),
            rows: table.row_count(),
            columns: table.columns.clone(),
            upload_time: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            preview: table.preview_html(),
        };
        info!(
            "Stored upload {} ({} rows, {} columns)",
            unique_name,
            entry.rows,
            entry.columns.len()
        );
        self.files
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(unique_name.clone(), entry);

        Ok(UploadReceipt {
            filename: unique_name,
            original_name: safe_name,
            rows: table.row_count(),
            columns: table.columns,
        })
    }

    pub fn get(&self, name: &str) -> Option<UploadedFile> {
        self.files
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    pub fn list(&self) -> BTreeMap<String, UploadedFile> {
        self.files.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Re-read an indexed file from disk.
    pub fn read_table(&self, name: &str) -> AssistResult<CsvTable> {
        let entry = self
            .get(name)
            .ok_or_else(|| AssistError::not_found("File not found"))?;
        let bytes = std::fs::read(&entry.filepath)
            .map_err(|e| AssistError::io("Error reading file", e))?;
        CsvTable::parse(&bytes).map_err(|reason| {
            AssistError::io(
                "Error reading file",
                std::io::Error::new(std::io::ErrorKind::InvalidData, reason),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index(dir: &tempfile::TempDir) -> UploadIndex {
        UploadIndex::new(dir.path().join("uploads"), vec!["csv".to_string()])
    }

    fn ten_row_csv() -> Vec<u8> {
        let mut csv = String::from("a,b\n");
        for i in 0..10 {
            csv.push_str(&format!("{i},{}\n", i + 100));
        }
        csv.into_bytes()
    }

    #[test]
    fn well_formed_upload_is_indexed() {
        let dir = tempfile::tempdir().unwrap();
        let index = index(&dir);
        let receipt = index.store("sales data.csv", &ten_row_csv()).unwrap();

        assert!(receipt.filename.ends_with("_sales_data.csv"));
        assert_eq!(receipt.rows, 10);
        assert_eq!(receipt.columns, vec!["a", "b"]);

        let stored = index.get(&receipt.filename).unwrap();
        assert_eq!(stored.rows, 10);
        assert_eq!(stored.columns, vec!["a", "b"]);
        assert_eq!(stored.original_name, "sales_data.csv");
        assert_eq!(stored.preview.matches("<tr>").count(), 5);
        assert!(Path::new(&stored.filepath).exists());
    }

    #[test]
    fn malformed_upload_is_removed() {
        let dir = tempfile::tempdir().unwrap();
        let index = index(&dir);
        let err = index.store("broken.csv", b"a,b\n1,2,3\n").unwrap_err();

        assert!(matches!(err, AssistError::Validation(ref m) if m.starts_with("Invalid CSV file")));
        assert!(index.list().is_empty());
        let leftovers = std::fs::read_dir(index.folder()).unwrap().count();
        assert_eq!(leftovers, 0);
    }

    #[test]
    fn wrong_extension_is_rejected_before_saving() {
        let dir = tempfile::tempdir().unwrap();
        let index = index(&dir);
        let err = index.store("report.xlsx", b"whatever").unwrap_err();
        assert_eq!(err.to_string(), "Please upload a CSV file");
        assert!(!index.folder().exists());
    }

    #[test]
    fn empty_filename_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = index(&dir).store("", b"a\n1\n").unwrap_err();
        assert_eq!(err.to_string(), "No file selected");
    }

    #[test]
    fn read_table_round_trips_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let index = index(&dir);
        let receipt = index.store("t.csv", &ten_row_csv()).unwrap();
        let table = index.read_table(&receipt.filename).unwrap();
        assert_eq!(table.row_count(), 10);
        assert!(table.to_csv_string().unwrap().starts_with("a,b\n0,100\n"));
    }

    #[test]
    fn read_unknown_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(index(&dir).read_table("nope.csv"), Err(AssistError::NotFound(_))));
    }

    #[test]
    fn deleted_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let index = index(&dir);
        let receipt = index.store("gone.csv", &ten_row_csv()).unwrap();
        std::fs::remove_file(index.get(&receipt.filename).unwrap().filepath).unwrap();
        assert!(matches!(index.read_table(&receipt.filename), Err(AssistError::Io { .. })));
    }
}
