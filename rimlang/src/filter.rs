//! Row filters for the text table

use crate::session::{RowStatus, TextRow};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    /// Rows without a translation, failed ones included
    Pending,
    /// Machine translated, from the provider or the cache
    Translated,
    /// Edited or pasted by hand
    Edited,
}

impl StatusFilter {
    pub fn matches(&self, status: RowStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Pending => matches!(status, RowStatus::Pending | RowStatus::Failed),
            StatusFilter::Translated => status.is_translated(),
            StatusFilter::Edited => status.is_manual(),
        }
    }
}

impl FromStr for StatusFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "all" => Ok(StatusFilter::All),
            "pending" => Ok(StatusFilter::Pending),
            "translated" => Ok(StatusFilter::Translated),
            "edited" => Ok(StatusFilter::Edited),
            other => Err(format!("unknown status filter '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TypeFilter {
    #[default]
    All,
    WithPlaceholders,
    WithoutPlaceholders,
}

impl TypeFilter {
    pub fn matches(&self, row: &TextRow) -> bool {
        match self {
            TypeFilter::All => true,
            TypeFilter::WithPlaceholders => row.has_placeholders(),
            TypeFilter::WithoutPlaceholders => !row.has_placeholders(),
        }
    }
}

impl FromStr for TypeFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "all" => Ok(TypeFilter::All),
            "with-placeholders" | "placeholders" => Ok(TypeFilter::WithPlaceholders),
            "without-placeholders" | "plain" => Ok(TypeFilter::WithoutPlaceholders),
            other => Err(format!("unknown type filter '{}'", other)),
        }
    }
}

/// Combined status, type and free-text filter
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowFilter {
    pub status: StatusFilter,
    pub kind: TypeFilter,
    /// Case-insensitive substring searched in every column
    pub search: String,
}

impl RowFilter {
    pub fn matches(&self, row: &TextRow) -> bool {
        self.status.matches(row.status) && self.kind.matches(row) && self.matches_search(row)
    }

    fn matches_search(&self, row: &TextRow) -> bool {
        let needle = self.search.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        [
            row.id(),
            row.source.text.as_str(),
            row.translation.as_str(),
            row.status.label(),
        ]
        .iter()
        .any(|column| column.to_lowercase().contains(&needle))
    }

    /// Indices of matching rows, in table order
    pub fn apply(&self, rows: &[TextRow]) -> Vec<usize> {
        rows.iter()
            .enumerate()
            .filter(|(_, row)| self.matches(row))
            .map(|(index, _)| index)
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.search.trim().is_empty()
            && self.status == StatusFilter::All
            && self.kind == TypeFilter::All
    }
}

/// Status line shown after filtering
pub fn filter_status(shown: usize) -> String {
    format!("Showing {} filtered texts", shown)
}
