//! Metadata carried in parts-list file names.
//!
//! A typical name looks like `20240105_J0000000001_Purchased_2unit.xlsx`: the
//! revision date leads, the project id and a `_<category>_` marker follow, and
//! an optional `<n>unit` fragment names the sub-assembly.

use std::fmt;
use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

use crate::partslist::merge::model::{Category, NormalizedRow, layout};

static PROJECT_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"J[0-9]{10}").expect("project id pattern"));
static CATEGORY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"_(Purchased|Fabricated|Electrical)_").expect("category pattern")
});
static UNIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)([0-9]+)unit").expect("unit pattern"));

/// Revision date taken from the leading `YYYYMMDD` of a file name.
///
/// A name without a valid date prefix yields [`RevisionDate::Unparsed`], which
/// orders before every real date, so such a revision never displaces a dated one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RevisionDate {
    Unparsed,
    Dated(NaiveDate),
}

impl fmt::Display for RevisionDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RevisionDate::Unparsed => f.write_str("unparsed"),
            RevisionDate::Dated(date) => write!(f, "{}", date.format("%Y%m%d")),
        }
    }
}

/// Everything that identifies one revision of a logical parts list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevisionKey {
    pub project_id: String,
    pub revision_date: RevisionDate,
    pub category: Category,
    pub unit_digits: String,
}

impl RevisionKey {
    /// Builds the key for a document from its name and normalised data rows.
    pub fn derive(filename: &str, data_rows: &[NormalizedRow]) -> Self {
        Self {
            project_id: extract_project_id(filename),
            revision_date: extract_revision_date(filename),
            category: classify_category(filename),
            unit_digits: unit_digits(data_rows),
        }
    }

    /// Two documents with equal dedup keys are revisions of the same list.
    pub fn dedup_key(&self) -> String {
        format!(
            "{}_{}_{}",
            self.project_id,
            self.category.label(),
            self.unit_digits
        )
    }
}

/// First `J` + ten digit match, or an empty string.
pub fn extract_project_id(filename: &str) -> String {
    PROJECT_ID
        .find(filename)
        .map(|found| found.as_str().to_string())
        .unwrap_or_default()
}

pub fn extract_revision_date(filename: &str) -> RevisionDate {
    let Some(prefix) = filename.get(..8) else {
        return RevisionDate::Unparsed;
    };
    if !prefix.bytes().all(|byte| byte.is_ascii_digit()) {
        return RevisionDate::Unparsed;
    }
    NaiveDate::parse_from_str(prefix, "%Y%m%d")
        .map(RevisionDate::Dated)
        .unwrap_or(RevisionDate::Unparsed)
}

pub fn classify_category(filename: &str) -> Category {
    CATEGORY
        .captures(filename)
        .and_then(|captures| captures.get(1))
        .map(|found| Category::from_label(found.as_str()))
        .unwrap_or(Category::Unknown)
}

/// Category letter plus a two-digit unit number when the name carries
/// `<n>unit`. Electrical lists never carry a unit; unknown categories give "".
pub fn build_filename_token(filename: &str, category: Category) -> String {
    let Some(letter) = category.letter() else {
        return String::new();
    };
    if category == Category::Electrical {
        return letter.to_string();
    }

    let unit = UNIT
        .captures(filename)
        .and_then(|captures| captures.get(1))
        .and_then(|digits| digits.as_str().parse::<u32>().ok());

    match unit {
        Some(unit) => format!("{letter}{unit:02}"),
        None => letter.to_string(),
    }
}

/// Digits of the first non-blank unit cell among the data rows.
pub fn unit_digits(data_rows: &[NormalizedRow]) -> String {
    data_rows
        .iter()
        .map(|row| digits_only(&row.text(layout::UNIT)))
        .find(|digits| !digits.is_empty())
        .unwrap_or_default()
}

/// Numeric value of the digits in a token; tokens without digits count as 0.
pub fn token_number(token: &str) -> u64 {
    digits_only(token).parse().unwrap_or(0)
}

pub fn digits_only(value: &str) -> String {
    value.chars().filter(char::is_ascii_digit).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::partslist::merge::model::Cell;

    #[test]
    fn unit_token_is_zero_padded_and_case_insensitive() {
        assert_eq!(
            build_filename_token("20240105_J0000000001_Purchased_3UNIT.xlsx", Category::Purchased),
            "P03"
        );
        assert_eq!(
            build_filename_token("20240105_J0000000001_Fabricated_12unit.xlsx", Category::Fabricated),
            "F12"
        );
    }

    #[test]
    fn electrical_and_unknown_tokens() {
        assert_eq!(
            build_filename_token("20240105_J0000000001_Electrical_2unit.xlsx", Category::Electrical),
            "E"
        );
        assert_eq!(build_filename_token("20240105_misc.xlsx", Category::Unknown), "");
    }

    #[test]
    fn unit_digits_skip_blank_leading_rows() {
        let rows = vec![
            NormalizedRow::new(vec![Cell::text("Purchased"), Cell::Empty]),
            NormalizedRow::new(vec![Cell::text("Purchased"), Cell::text("Unit 2")]),
        ];
        assert_eq!(unit_digits(&rows), "2");
        assert_eq!(unit_digits(&[]), "");
    }

    #[test]
    fn token_number_defaults_to_zero() {
        assert_eq!(token_number("P10"), 10);
        assert_eq!(token_number("E"), 0);
    }
}
