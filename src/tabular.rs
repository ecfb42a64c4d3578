//! Single-pass CSV profiling and column extraction.
//!
//! Both operations stream the file exactly once and own an independent file
//! handle per call; concurrent calls on the same path never share a cursor.
//! The blocking pass runs under spawn_blocking with a read deadline so a
//! stalled read fails the request instead of hanging its task.
//!
//! Header parsing is deliberately naive: first line, split on comma, strip
//! one optional pair of surrounding double quotes per token. Embedded commas
//! or escaped quotes in headers are not handled; data rows go through the
//! csv tokenizer and do not share this limitation.

use std::collections::HashSet;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// Deadline for one full streaming pass. Expiry maps to an Io failure.
pub const READ_DEADLINE: Duration = Duration::from_secs(30);

/// A column is a category iff its distinct observed value count stays at or
/// below this threshold over the whole file. The boundary is exact; any
/// future approximate cardinality tracking must stay bit-exact up to here.
const CATEGORY_MAX_DISTINCT: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    Category,
    Numeric,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnProfile {
    pub header: String,
    #[serde(rename = "type")]
    pub kind: ColumnKind,
}

/// Profile of one CSV file: ordered columns plus the data row count
/// (header line excluded).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CsvProfile {
    pub columns: Vec<ColumnProfile>,
    pub rows: u64,
}

/// Profile a CSV file in a single streaming pass.
///
/// All-or-nothing: a parse or read failure discards the partial profile.
pub async fn profile(path: &Path) -> AppResult<CsvProfile> {
    let path = path.to_path_buf();
    run_pass(move || profile_sync(&path)).await
}

/// Extract the requested columns from every data row, in the order given,
/// rows preserved in source order. The full result is buffered before
/// returning. An out-of-range index yields an empty string at that position
/// rather than failing the extraction.
pub async fn extract(path: &Path, column_indices: Vec<usize>) -> AppResult<Vec<Vec<String>>> {
    let path = path.to_path_buf();
    run_pass(move || extract_sync(&path, &column_indices)).await
}

async fn run_pass<T, F>(pass: F) -> AppResult<T>
where
    T: Send + 'static,
    F: FnOnce() -> AppResult<T> + Send + 'static,
{
    let handle = tokio::task::spawn_blocking(pass);
    match tokio::time::timeout(READ_DEADLINE, handle).await {
        Ok(Ok(result)) => result,
        Ok(Err(join_err)) => Err(AppError::Internal {
            code: "pass_panicked".into(),
            message: join_err.to_string(),
        }),
        Err(_) => Err(AppError::io("read_timeout", "csv read exceeded deadline")),
    }
}

fn open(path: &Path) -> AppResult<BufReader<std::fs::File>> {
    let file = std::fs::File::open(path)
        .map_err(|e| AppError::from_fs(&e, &path.display().to_string()))?;
    Ok(BufReader::new(file))
}

/// Read and tokenize the header line: split on comma, strip one optional
/// surrounding quote pair, trim the line terminator.
fn read_headers<R: BufRead>(reader: &mut R) -> AppResult<Vec<String>> {
    let mut line = String::new();
    let n = reader.read_line(&mut line).map_err(|e| {
        if e.kind() == std::io::ErrorKind::InvalidData {
            AppError::parse("csv_parse_error", "header line is not valid UTF-8")
        } else {
            AppError::from_fs(&e, "csv header")
        }
    })?;
    if n == 0 {
        return Err(AppError::parse("empty_csv", "file has no header line"));
    }
    let line = line.trim_end_matches(['\r', '\n']);
    Ok(line.split(',').map(strip_quote_pair).collect())
}

fn strip_quote_pair(token: &str) -> String {
    if token.len() >= 2 && token.starts_with('"') && token.ends_with('"') {
        token[1..token.len() - 1].to_string()
    } else {
        token.to_string()
    }
}

fn data_reader<R: BufRead>(reader: R) -> csv::Reader<R> {
    // Ragged rows are tolerated (flexible); framing/encoding faults still
    // fail the whole pass.
    csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader)
}

fn profile_sync(path: &Path) -> AppResult<CsvProfile> {
    let mut reader = open(path)?;
    let headers = read_headers(&mut reader)?;
    let mut distinct: Vec<HashSet<String>> = headers.iter().map(|_| HashSet::new()).collect();
    let mut rows: u64 = 0;

    let mut data = data_reader(reader);
    let mut record = csv::StringRecord::new();
    loop {
        match data.read_record(&mut record) {
            Ok(false) => break,
            Ok(true) => {
                rows += 1;
                for (i, seen) in distinct.iter_mut().enumerate() {
                    let value = record.get(i).unwrap_or("");
                    if !seen.contains(value) {
                        seen.insert(value.to_string());
                    }
                }
            }
            Err(e) => {
                return Err(AppError::Parse {
                    code: "csv_parse_error".into(),
                    message: e.to_string(),
                })
            }
        }
    }

    // Classification is decided only after the full pass.
    let columns = headers
        .into_iter()
        .zip(distinct)
        .map(|(header, seen)| ColumnProfile {
            header,
            kind: if seen.len() <= CATEGORY_MAX_DISTINCT {
                ColumnKind::Category
            } else {
                ColumnKind::Numeric
            },
        })
        .collect();
    Ok(CsvProfile { columns, rows })
}

fn extract_sync(path: &Path, column_indices: &[usize]) -> AppResult<Vec<Vec<String>>> {
    let mut reader = open(path)?;
    // Header line is skipped; extraction covers data rows only.
    let _ = read_headers(&mut reader)?;

    let mut data = data_reader(reader);
    let mut out: Vec<Vec<String>> = Vec::new();
    let mut record = csv::StringRecord::new();
    loop {
        match data.read_record(&mut record) {
            Ok(false) => break,
            Ok(true) => {
                let row = column_indices
                    .iter()
                    .map(|&i| record.get(i).unwrap_or("").to_string())
                    .collect();
                out.push(row);
            }
            Err(e) => {
                return Err(AppError::Parse {
                    code: "csv_parse_error".into(),
                    message: e.to_string(),
                })
            }
        }
    }
    Ok(out)
}
