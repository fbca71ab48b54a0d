//! Delimited text (CSV/TSV/...) with delimiter detection.

use std::io::{BufRead, BufReader};

use crate::error::{DataproofError, Result};

/// Delimiters to try when auto-detecting.
const DELIMITERS: &[u8] = &[b'\t', b',', b';', b'|'];

/// Headers and string rows read from delimited text.
#[derive(Debug, Clone, PartialEq)]
pub struct DelimitedTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub delimiter: u8,
}

/// Short format name for a delimiter.
pub fn format_name(delimiter: u8) -> &'static str {
    match delimiter {
        b'\t' => "tsv",
        b',' => "csv",
        b';' => "csv-semicolon",
        b'|' => "psv",
        _ => "delimited",
    }
}

/// Parse delimited bytes. Rows are padded or truncated to the header count.
///
/// Without a header row, columns are named `column_1`, `column_2`, ...
pub fn parse_delimited(
    bytes: &[u8],
    delimiter: u8,
    has_header: bool,
    quote: u8,
    max_rows: Option<usize>,
) -> Result<DelimitedTable> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .quote(quote)
        .flexible(true)
        .from_reader(bytes);

    let mut records = reader.records();

    let first = match records.next() {
        Some(record) => record?,
        None => return Err(DataproofError::EmptyData("No lines found".to_string())),
    };

    let mut rows: Vec<Vec<String>> = Vec::new();
    let headers = if has_header {
        unique_headers(first.iter().map(|h| h.trim().to_string()).collect())
    } else {
        let headers = (0..first.len()).map(|i| format!("column_{}", i + 1)).collect();
        rows.push(first.iter().map(str::to_string).collect());
        headers
    };

    if headers.is_empty() {
        return Err(DataproofError::EmptyData("No columns found".to_string()));
    }

    for record in records {
        let record = record?;
        // A blank line parses as one empty field.
        if record.len() == 1 && record[0].trim().is_empty() {
            continue;
        }
        rows.push(record.iter().map(str::to_string).collect());
    }

    if let Some(max) = max_rows {
        rows.truncate(max);
    }
    for row in &mut rows {
        row.resize(headers.len(), String::new());
    }

    Ok(DelimitedTable { headers, rows, delimiter })
}

/// Make header names unique and non-empty: blanks become `column_<n>`,
/// repeats get a `_<k>` suffix.
pub(crate) fn unique_headers(raw: Vec<String>) -> Vec<String> {
    let mut headers: Vec<String> = Vec::with_capacity(raw.len());
    for (idx, name) in raw.into_iter().enumerate() {
        let base = if name.is_empty() { format!("column_{}", idx + 1) } else { name };
        let mut candidate = base.clone();
        let mut k = 2;
        while headers.contains(&candidate) {
            candidate = format!("{}_{}", base, k);
            k += 1;
        }
        headers.push(candidate);
    }
    headers
}

/// Detect the delimiter by analyzing the first few lines.
pub fn detect_delimiter(bytes: &[u8]) -> Result<u8> {
    let reader = BufReader::new(bytes);
    let lines: Vec<String> = reader
        .lines()
        .take(10)
        .filter_map(|l| l.ok())
        .filter(|l| !l.trim().is_empty())
        .collect();

    if lines.is_empty() {
        return Err(DataproofError::EmptyData("No lines to analyze".to_string()));
    }

    let mut best_delimiter = b',';
    let mut best_score = 0;

    for &delim in DELIMITERS {
        let counts: Vec<usize> = lines
            .iter()
            .map(|line| count_delimiter_in_line(line, delim))
            .collect();

        let first_count = counts[0];
        if first_count == 0 {
            continue;
        }

        let consistent = counts.iter().all(|&c| c == first_count);
        let mean = counts.iter().sum::<usize>() as f64 / counts.len() as f64;
        let variance =
            counts.iter().map(|&c| (c as f64 - mean).powi(2)).sum::<f64>() / counts.len() as f64;

        // Consistent counts win; tabs get a small bonus since they rarely
        // appear inside values.
        let score = if consistent {
            first_count * 1000 + if delim == b'\t' { 100 } else { 0 }
        } else if variance < 1.0 {
            first_count * 100
        } else {
            first_count
        };

        if score > best_score {
            best_score = score;
            best_delimiter = delim;
        }
    }

    Ok(best_delimiter)
}

/// Count delimiter occurrences in a line, ignoring quoted sections.
fn count_delimiter_in_line(line: &str, delimiter: u8) -> usize {
    let delim_char = delimiter as char;
    let mut count = 0;
    let mut in_quotes = false;

    for ch in line.chars() {
        match ch {
            '"' => in_quotes = !in_quotes,
            c if c == delim_char && !in_quotes => count += 1,
            _ => {}
        }
    }

    count
}
