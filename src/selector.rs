//! Picks the most recent original filing of a form type from submissions metadata

use crate::types::{FilingRecord, SubmissionMetadata};
use chrono::NaiveDate;
use tracing::warn;

/// Form type selected when none is configured
pub const DEFAULT_FORM_TYPE: &str = "10-K";

/// Select the latest filing whose form equals `form_type` exactly
///
/// Amendments (e.g. `10-K/A`) never match. When several filings share the latest
/// date, the first one in metadata order wins. Entries with unparsable dates are
/// skipped.
///
/// Returns `None` if any of the four parallel arrays is empty, if their lengths
/// differ, or if no entry qualifies.
pub fn select_latest_original_filing(
    metadata: &SubmissionMetadata,
    form_type: &str,
) -> Option<FilingRecord> {
    let recent = &metadata.filings.recent;
    let len = recent.form.len();

    if len == 0
        || recent.accession_number.len() != len
        || recent.filing_date.len() != len
        || recent.primary_document.len() != len
    {
        return None;
    }

    let mut latest: Option<(usize, NaiveDate)> = None;

    for (i, form) in recent.form.iter().enumerate() {
        if form != form_type {
            continue;
        }

        let raw_date = &recent.filing_date[i];
        let date = match NaiveDate::parse_from_str(raw_date, "%Y-%m-%d") {
            Ok(date) => date,
            Err(e) => {
                warn!(index = i, date = %raw_date, error = %e, "skipping filing with unparsable date");
                continue;
            }
        };

        // strictly greater keeps the first of equal dates
        if latest.is_none_or(|(_, best)| date > best) {
            latest = Some((i, date));
        }
    }

    latest.map(|(i, filing_date)| FilingRecord {
        form_type: recent.form[i].clone(),
        accession_id: recent.accession_number[i].clone(),
        filing_date,
        primary_document: recent.primary_document[i].clone(),
    })
}
