//! Reads uploaded spreadsheets/CSV buffers and remote delimited-text
//! exports into a uniform sequence of raw header→value records.

use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Reader};
use tracing::debug;
use url::Url;

use crate::errors::ServiceError;

/// One data row, as ordered header→value cells. Values are trimmed at the
/// reader level; semantic normalization happens later.
#[derive(Debug, Clone)]
pub struct RawRecord {
    /// 1-based data row index (the header row is excluded).
    pub row_number: usize,
    cells: Vec<(String, String)>,
}

impl RawRecord {
    pub fn new(row_number: usize, cells: Vec<(String, String)>) -> Self {
        Self { row_number, cells }
    }

    /// Looks a cell up by its exact header text.
    pub fn get(&self, header: &str) -> Option<&str> {
        self.cells
            .iter()
            .find(|(h, _)| h == header)
            .map(|(_, v)| v.as_str())
    }

    pub fn headers(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(h, _)| h.as_str())
    }

    fn is_blank(&self) -> bool {
        self.cells.iter().all(|(_, v)| v.is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SourceFormat {
    /// Quote-aware delimited text (CSV).
    Delimited,
    /// Structured workbook (xlsx/xls).
    Spreadsheet,
}

/// An import source staged in memory: an uploaded byte buffer with a
/// declared media type, or the body of a remote delimited-text export.
#[derive(Debug, Clone)]
pub struct TabularSource {
    format: SourceFormat,
    bytes: Vec<u8>,
    sheet: Option<String>,
}

impl TabularSource {
    pub fn delimited(bytes: Vec<u8>) -> Self {
        Self {
            format: SourceFormat::Delimited,
            bytes,
            sheet: None,
        }
    }

    pub fn spreadsheet(bytes: Vec<u8>, sheet: Option<String>) -> Self {
        Self {
            format: SourceFormat::Spreadsheet,
            bytes,
            sheet,
        }
    }

    /// Selects a named sheet instead of the first one. Ignored for
    /// delimited sources.
    pub fn with_sheet(mut self, sheet: Option<String>) -> Self {
        self.sheet = sheet;
        self
    }

    /// Classifies an upload by declared media type, falling back to the
    /// filename extension when the type is absent or non-committal.
    pub fn from_upload(
        bytes: Vec<u8>,
        media_type: Option<&str>,
        filename: Option<&str>,
    ) -> Result<Self, ServiceError> {
        let declared = media_type
            .map(|m| m.split(';').next().unwrap_or(m).trim().to_lowercase())
            .filter(|m| !m.is_empty());

        match declared.as_deref() {
            Some("text/csv") | Some("application/csv") => Ok(Self::delimited(bytes)),
            Some("application/vnd.openxmlformats-officedocument.spreadsheetml.sheet")
            | Some("application/vnd.ms-excel") => Ok(Self::spreadsheet(bytes, None)),
            Some("application/octet-stream") | None => {
                Self::from_extension(bytes, filename, declared.as_deref())
            }
            Some(other) => Err(ServiceError::ValidationError(format!(
                "Unsupported media type '{}'",
                other
            ))),
        }
    }

    fn from_extension(
        bytes: Vec<u8>,
        filename: Option<&str>,
        declared: Option<&str>,
    ) -> Result<Self, ServiceError> {
        let extension = filename
            .and_then(|f| f.rsplit_once('.'))
            .map(|(_, ext)| ext.to_lowercase());

        match extension.as_deref() {
            Some("csv") => Ok(Self::delimited(bytes)),
            Some("xlsx") | Some("xls") => Ok(Self::spreadsheet(bytes, None)),
            _ => Err(ServiceError::ValidationError(format!(
                "Cannot determine spreadsheet format from media type {:?} and filename {:?}",
                declared, filename
            ))),
        }
    }

    /// Decodes the buffer and returns a lazy, finite, non-restartable
    /// record sequence. The first row is the header row.
    pub fn records(self) -> Result<RecordReader, ServiceError> {
        match self.format {
            SourceFormat::Delimited => {
                let mut reader = csv::ReaderBuilder::new()
                    .has_headers(true)
                    .flexible(true)
                    .from_reader(Cursor::new(self.bytes));

                let headers: Vec<String> = reader
                    .headers()
                    .map_err(|e| {
                        ServiceError::SourceUnreadable(format!("cannot parse CSV header: {}", e))
                    })?
                    .iter()
                    .map(|h| h.trim().to_string())
                    .collect();

                Ok(RecordReader {
                    headers,
                    inner: ReaderInner::Csv(reader.into_records()),
                    row_number: 0,
                })
            }
            SourceFormat::Spreadsheet => {
                let mut workbook = open_workbook_auto_from_rs(Cursor::new(self.bytes))
                    .map_err(|e| {
                        ServiceError::SourceUnreadable(format!("cannot open workbook: {}", e))
                    })?;

                let sheet_name = match self.sheet {
                    Some(name) => {
                        if !workbook.sheet_names().iter().any(|s| s == &name) {
                            return Err(ServiceError::SourceUnreadable(format!(
                                "sheet '{}' does not exist",
                                name
                            )));
                        }
                        name
                    }
                    None => workbook
                        .sheet_names()
                        .first()
                        .cloned()
                        .ok_or_else(|| {
                            ServiceError::SourceUnreadable("workbook has no sheets".to_string())
                        })?,
                };

                debug!(sheet = %sheet_name, "reading worksheet");

                let range = workbook.worksheet_range(&sheet_name).map_err(|e| {
                    ServiceError::SourceUnreadable(format!(
                        "cannot read sheet '{}': {}",
                        sheet_name, e
                    ))
                })?;

                let mut rows = range.rows();
                let headers: Vec<String> = rows
                    .next()
                    .ok_or_else(|| {
                        ServiceError::SourceUnreadable("sheet has no header row".to_string())
                    })?
                    .iter()
                    .map(|cell| cell.to_string().trim().to_string())
                    .collect();

                let data: Vec<Vec<String>> = rows
                    .map(|row| {
                        row.iter()
                            .map(|cell| cell.to_string().trim().to_string())
                            .collect()
                    })
                    .collect();

                Ok(RecordReader {
                    headers,
                    inner: ReaderInner::Rows(data.into_iter()),
                    row_number: 0,
                })
            }
        }
    }
}

/// Validates that a URL is recognizably a delimited-text export endpoint.
/// Shape validation only — nothing is fetched here.
pub fn validate_remote_export_url(raw: &str) -> Result<Url, ServiceError> {
    let url = Url::parse(raw)
        .map_err(|e| ServiceError::ValidationError(format!("Invalid URL: {}", e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ServiceError::ValidationError(format!(
            "Unsupported URL scheme '{}'",
            url.scheme()
        )));
    }

    let path = url.path().to_lowercase();
    let csv_query = url.query_pairs().any(|(key, value)| {
        matches!(key.as_ref(), "format" | "output" | "exportformat" | "exportFormat")
            && value.eq_ignore_ascii_case("csv")
    });
    let sheet_export = url
        .host_str()
        .map(|h| h.ends_with("docs.google.com"))
        .unwrap_or(false)
        && path.contains("/export");

    if path.ends_with(".csv") || csv_query || sheet_export {
        Ok(url)
    } else {
        Err(ServiceError::ValidationError(
            "URL is not a recognizable delimited-text export endpoint".to_string(),
        ))
    }
}

/// Fetches a validated remote export and stages it as a delimited source.
pub async fn fetch_remote(url: &Url) -> Result<TabularSource, ServiceError> {
    let response = reqwest::get(url.clone())
        .await
        .and_then(|r| r.error_for_status())
        .map_err(|e| ServiceError::ExternalServiceError(format!("remote export fetch failed: {}", e)))?;

    let body = response.bytes().await.map_err(|e| {
        ServiceError::ExternalServiceError(format!("remote export body read failed: {}", e))
    })?;

    Ok(TabularSource::delimited(body.to_vec()))
}

enum ReaderInner {
    Csv(csv::StringRecordsIntoIter<Cursor<Vec<u8>>>),
    Rows(std::vec::IntoIter<Vec<String>>),
}

/// Lazy record sequence over a decoded source. Blank rows are skipped but
/// still advance the row numbering.
pub struct RecordReader {
    headers: Vec<String>,
    inner: ReaderInner,
    row_number: usize,
}

impl Iterator for RecordReader {
    type Item = Result<RawRecord, ServiceError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let values: Vec<String> = match &mut self.inner {
                ReaderInner::Csv(records) => match records.next()? {
                    Ok(record) => record.iter().map(|v| v.trim().to_string()).collect(),
                    Err(e) => {
                        return Some(Err(ServiceError::SourceUnreadable(format!(
                            "malformed CSV row: {}",
                            e
                        ))))
                    }
                },
                ReaderInner::Rows(rows) => rows.next()?,
            };

            self.row_number += 1;

            let cells: Vec<(String, String)> = self
                .headers
                .iter()
                .enumerate()
                .map(|(i, header)| {
                    (
                        header.clone(),
                        values.get(i).cloned().unwrap_or_default(),
                    )
                })
                .collect();

            let record = RawRecord::new(self.row_number, cells);
            if record.is_blank() {
                continue;
            }
            return Some(Ok(record));
        }
    }
}
