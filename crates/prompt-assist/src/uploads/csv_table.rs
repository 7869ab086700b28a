//! In-memory CSV table used for upload validation, previews and re-export.

use std::fmt::Write as _;

use crate::utils::TextUtils;

/// Number of rows kept in the stored HTML preview.
pub const PREVIEW_ROWS: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvTable {
    pub columns: Vec<String>,
    /// Data rows, each padded to `columns.len()`.
    pub rows: Vec<Vec<String>>,
}

impl CsvTable {
    /// Parse UTF-8 CSV with a header row. Short rows are padded with empty
    /// cells; rows wider than the header, a missing header, or invalid
    /// UTF-8 are rejected with a message naming the problem.
    pub fn parse(bytes: &[u8]) -> Result<Self, String> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(bytes);

        let header = reader.headers().map_err(|e| e.to_string())?.clone();
        let blank_single = header.len() == 1 && header[0].trim().is_empty();
        if header.is_empty() || blank_single {
            return Err("No columns to parse from file".to_string());
        }
        let columns = dedupe_columns(header.iter().map(str::to_string).collect());

        let mut rows = Vec::new();
        for (idx, record) in reader.records().enumerate() {
            let record = record.map_err(|e| e.to_string())?;
            if record.len() > columns.len() {
                // Line numbers are 1-based and include the header.
                return Err(format!(
                    "Error tokenizing data. Expected {} fields in line {}, saw {}",
                    columns.len(),
                    idx + 2,
                    record.len()
                ));
            }
            let mut row: Vec<String> = record.iter().map(str::to_string).collect();
            row.resize(columns.len(), String::new());
            rows.push(row);
        }

        Ok(Self { columns, rows })
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// HTML table of the first [`PREVIEW_ROWS`] rows with a leading index column.
    pub fn preview_html(&self) -> String {
        let mut html = String::from(
            "<table border=\"1\" class=\"dataframe table table-sm\" id=\"csv-preview\">\n  <thead>\n    <tr style=\"text-align: right;\">\n      <th></th>\n",
        );
        for column in &self.columns {
            let _ = writeln!(html, "      <th>{}</th>", TextUtils::escape_html(column));
        }
        html.push_str("    </tr>\n  </thead>\n  <tbody>\n");
        for (idx, row) in self.rows.iter().take(PREVIEW_ROWS).enumerate() {
            let _ = writeln!(html, "    <tr>\n      <th>{}</th>", idx);
            for cell in row {
                let _ = writeln!(html, "      <td>{}</td>", TextUtils::escape_html(cell));
            }
            html.push_str("    </tr>\n");
        }
        html.push_str("  </tbody>\n</table>");
        html
    }

    /// Serialize back to CSV: header line then every row, no index column.
    pub fn to_csv_string(&self) -> Result<String, String> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(&self.columns).map_err(|e| e.to_string())?;
        for row in &self.rows {
            writer.write_record(row).map_err(|e| e.to_string())?;
        }
        let bytes = writer.into_inner().map_err(|e| e.to_string())?;
        String::from_utf8(bytes).map_err(|e| e.to_string())
    }
}

/// Repeated header names get a `.1`, `.2`, ... suffix so every column is addressable.
fn dedupe_columns(columns: Vec<String>) -> Vec<String> {
    let mut seen: Vec<String> = Vec::with_capacity(columns.len());
    for column in columns {
        let mut candidate = column.clone();
        let mut n = 1;
        while seen.contains(&candidate) {
            candidate = format!("{}.{}", column, n);
            n += 1;
        }
        seen.push(candidate);
    }
    seen
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ten_rows() -> String {
        let mut csv = String::from("a,b\n");
        for i in 0..10 {
            csv.push_str(&format!("{},{}\n", i, i * 2));
        }
        csv
    }

    #[test]
    fn parses_header_and_rows() {
        let table = CsvTable::parse(ten_rows().as_bytes()).unwrap();
        assert_eq!(table.columns, vec!["a", "b"]);
        assert_eq!(table.row_count(), 10);
        assert_eq!(table.rows[3], vec!["3", "6"]);
    }

    #[test]
    fn preview_has_five_rows() {
        let table = CsvTable::parse(ten_rows().as_bytes()).unwrap();
        let html = table.preview_html();
        assert_eq!(html.matches("<tr>").count(), 5);
        assert!(html.contains("id=\"csv-preview\""));
        assert!(html.contains("class=\"dataframe table table-sm\""));
        assert!(html.contains("<td>4</td>"));
        assert!(!html.contains("<td>5</td>"));
    }

    #[test]
    fn short_rows_are_padded() {
        let table = CsvTable::parse(b"a,b,c\n1,2\n").unwrap();
        assert_eq!(table.rows[0], vec!["1", "2", ""]);
    }

    #[test]
    fn wide_rows_are_rejected() {
        let err = CsvTable::parse(b"a,b\n1,2\n1,2,3\n").unwrap_err();
        assert!(err.contains("Expected 2 fields in line 3, saw 3"), "{err}");
    }

    #[test]
    fn empty_input_is_rejected() {
        assert!(CsvTable::parse(b"").is_err());
    }

    #[test]
    fn invalid_utf8_is_rejected() {
        assert!(CsvTable::parse(b"a,b\n\xff\xfe,1\n").is_err());
    }

    #[test]
    fn header_only_file_has_zero_rows() {
        let table = CsvTable::parse(b"x,y\n").unwrap();
        assert_eq!(table.row_count(), 0);
        assert_eq!(table.columns, vec!["x", "y"]);
    }

    #[test]
    fn duplicate_columns_are_suffixed() {
        let table = CsvTable::parse(b"a,a,b,a\n1,2,3,4\n").unwrap();
        assert_eq!(table.columns, vec!["a", "a.1", "b", "a.2"]);
    }

    #[test]
    fn preview_escapes_markup() {
        let table = CsvTable::parse(b"name\n<script>\n").unwrap();
        assert!(table.preview_html().contains("<td>&lt;script&gt;</td>"));
    }

    #[test]
    fn csv_export_quotes_when_needed() {
        let table = CsvTable::parse(b"a,b\n\"x, y\",2\n").unwrap();
        assert_eq!(table.to_csv_string().unwrap(), "a,b\n\"x, y\",2\n");
    }
}
