// MEDLINE tagged-text parser.
//
// efetch with rettype=medline returns records separated by blank lines. Each
// field starts with a tag padded to four characters, then "- ", then the
// value:
//
//   PMID- 12345678
//   TI  - A title that is long enough
//         to wrap onto a continuation line.
//   AB  - The abstract...
//
// Continuation lines are indented by six spaces and belong to the most recent
// field. Repeatable tags (AU, MH, ...) keep one entry per occurrence.

use std::collections::BTreeMap;

use tracing::debug;

use crate::corpus::Pmid;

/// One MEDLINE record: tag → values in the order they appeared.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MedlineRecord {
    fields: BTreeMap<String, Vec<String>>,
}

impl MedlineRecord {
    /// All values recorded for a tag.
    pub fn get(&self, tag: &str) -> Option<&[String]> {
        self.fields.get(tag).map(Vec::as_slice)
    }

    /// First value recorded for a tag.
    pub fn first(&self, tag: &str) -> Option<&str> {
        self.fields
            .get(tag)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// The record's PMID, if present and numeric.
    pub fn pmid(&self) -> Option<Pmid> {
        self.first("PMID").and_then(|raw| raw.trim().parse().ok())
    }

    /// The abstract (AB field) with surrounding whitespace removed.
    /// Returns None when the field is missing or blank.
    pub fn abstract_text(&self) -> Option<&str> {
        self.first("AB").map(str::trim).filter(|text| !text.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    fn push_field(&mut self, tag: &str, value: &str) {
        self.fields
            .entry(tag.to_string())
            .or_default()
            .push(value.to_string());
    }

    fn extend_last(&mut self, tag: &str, continuation: &str) {
        if let Some(last) = self.fields.get_mut(tag).and_then(|v| v.last_mut()) {
            if !last.is_empty() {
                last.push(' ');
            }
            last.push_str(continuation);
        }
    }
}

/// Parse a MEDLINE text payload into records.
///
/// Lines that are neither a tagged field nor a continuation (e.g. stray
/// banners) are ignored.
pub fn parse(text: &str) -> Vec<MedlineRecord> {
    let mut records = Vec::new();
    let mut current = MedlineRecord::default();
    let mut last_tag: Option<String> = None;

    for raw_line in text.lines() {
        let line = raw_line.trim_end_matches('\r');

        if line.trim().is_empty() {
            if !current.is_empty() {
                records.push(std::mem::take(&mut current));
            }
            last_tag = None;
            continue;
        }

        if let Some(continuation) = line.strip_prefix("      ") {
            match last_tag.as_deref() {
                Some(tag) => current.extend_last(tag, continuation.trim()),
                None => debug!("Continuation line without a field, skipping"),
            }
            continue;
        }

        match split_field(line) {
            Some((tag, value)) => {
                current.push_field(tag, value);
                last_tag = Some(tag.to_string());
            }
            None => debug!(line = line, "Unrecognized MEDLINE line, skipping"),
        }
    }

    if !current.is_empty() {
        records.push(current);
    }

    records
}

/// Split "TAG - value" into its tag and value.
fn split_field(line: &str) -> Option<(&str, &str)> {
    let dash = line.find('-')?;
    // Tags are at most four characters, padded with spaces before the dash.
    if dash == 0 || dash > 4 {
        return None;
    }
    let tag = line[..dash].trim_end();
    if tag.is_empty() || !tag.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()) {
        return None;
    }
    let value = line[dash + 1..].strip_prefix(' ').unwrap_or(&line[dash + 1..]);
    Some((tag, value.trim_end()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "
PMID- 31452104
OWN - NLM
TI  - Effects of exercise on sleep quality in older adults: a
      randomized trial.
AB  - Sleep complaints are common in older adults. We randomized 120
      participants to exercise or control.
AU  - Smith J
AU  - Doe A

PMID- 20000001
TI  - A letter without an abstract.
AU  - Roe B
";

    #[test]
    fn test_parse_two_records() {
        let records = parse(SAMPLE);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].pmid(), Some(31452104));
        assert_eq!(records[1].pmid(), Some(20000001));
    }

    #[test]
    fn test_continuation_lines_join_with_space() {
        let records = parse(SAMPLE);
        assert_eq!(
            records[0].abstract_text(),
            Some(
                "Sleep complaints are common in older adults. We randomized 120 \
                 participants to exercise or control."
            )
        );
        assert_eq!(
            records[0].first("TI"),
            Some("Effects of exercise on sleep quality in older adults: a randomized trial.")
        );
    }

    #[test]
    fn test_repeated_tags_keep_every_value() {
        let records = parse(SAMPLE);
        let authors = records[0].get("AU").unwrap();
        assert_eq!(authors, &["Smith J".to_string(), "Doe A".to_string()]);
    }

    #[test]
    fn test_missing_abstract() {
        let records = parse(SAMPLE);
        assert!(records[1].abstract_text().is_none());
    }

    #[test]
    fn test_blank_abstract_is_none() {
        let records = parse("PMID- 1\nAB  -   \n");
        assert_eq!(records.len(), 1);
        assert!(records[0].abstract_text().is_none());
    }

    #[test]
    fn test_crlf_and_trailing_record_without_blank_line() {
        let records = parse("PMID- 7\r\nAB  - Text here.\r\n");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].pmid(), Some(7));
        assert_eq!(records[0].abstract_text(), Some("Text here."));
    }

    #[test]
    fn test_non_numeric_pmid() {
        let records = parse("PMID- abc\nAB  - Something.\n");
        assert!(records[0].pmid().is_none());
    }

    #[test]
    fn test_empty_payload() {
        assert!(parse("").is_empty());
        assert!(parse("\n\n\n").is_empty());
    }

    #[test]
    fn test_four_char_tags() {
        let records = parse("PMID- 5\nDCOM- 20190101\nLID - 10.1000/xyz [doi]\n");
        assert_eq!(records[0].first("DCOM"), Some("20190101"));
        assert_eq!(records[0].first("LID"), Some("10.1000/xyz [doi]"));
    }
}
