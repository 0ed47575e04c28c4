//! CSV parser for uploaded activity sheets.

use anyhow::{Context, Result};
use csv::ReaderBuilder;

use crate::records::RawRow;

/// Decodes CSV bytes with a header row into [`RawRow`]s keyed by header text.
///
/// Records may be shorter than the header; missing trailing columns are
/// simply absent from the row. Blank lines are skipped.
///
/// # Errors
///
/// Returns an error if the header cannot be read or a record is not valid
/// CSV (for example invalid UTF-8).
pub fn parse_upload(bytes: &[u8]) -> Result<Vec<RawRow>> {
    let mut rdr = ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(bytes);

    let headers = rdr.headers().context("failed to read CSV header")?.clone();

    let mut rows = Vec::new();
    for (index, result) in rdr.records().enumerate() {
        let record = result.with_context(|| format!("invalid CSV record {}", index + 1))?;
        if record.iter().all(|field| field.trim().is_empty()) {
            continue;
        }
        rows.push(headers.iter().zip(record.iter()).collect());
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty_bytes_returns_no_rows() {
        let rows = parse_upload(&[]).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_parse_header_only() {
        let rows = parse_upload(b"Activity,Date,Number of people\n").unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_parse_rows_keyed_by_header() {
        let csv = "Activity,Date,Number of people,What approximate location does this relate to?\n\
                   Housing,01/01/2023,10,\"Leeds, West Yorkshire\"\n";
        let rows = parse_upload(csv.as_bytes()).unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("Activity"), Some("Housing"));
        assert_eq!(rows[0].get("Number of people"), Some("10"));
        assert_eq!(
            rows[0].get("What approximate location does this relate to?"),
            Some("Leeds, West Yorkshire")
        );
    }

    #[test]
    fn test_short_rows_and_blank_lines() {
        let csv = "Activity,Date,Number of people\nEnergy,01/02/2023\n,,\n\nFinance,03/03/2023,4\n";
        let rows = parse_upload(csv.as_bytes()).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("Number of people"), None);
        assert_eq!(rows[1].get("Activity"), Some("Finance"));
    }

    #[test]
    fn test_parse_invalid_utf8() {
        let bytes = b"Activity,Date\n\xFF\xFE,01/01/2023\n";
        assert!(parse_upload(bytes).is_err());
    }
}
