use crate::model::QuestionRecord;
use crate::parser::{self, ParseReport};

/// Every question admitted from the bank, in file order.
///
/// Built once at startup and read-only afterwards; share it behind an `Arc`.
/// An empty catalog is valid but cannot start a session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    records: Vec<QuestionRecord>,
}

impl Catalog {
    #[must_use]
    pub fn new(records: Vec<QuestionRecord>) -> Self {
        Self { records }
    }

    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse bank text straight into a catalog.
    #[must_use]
    pub fn parse(raw_text: &str) -> Self {
        Self::new(parser::parse(raw_text))
    }

    /// Parse bank text, returning the catalog with the parse report's drop list.
    #[must_use]
    pub fn parse_with_report(raw_text: &str) -> (Self, ParseReport) {
        let mut report = parser::parse_with_report(raw_text);
        let records = std::mem::take(&mut report.records);
        (Self::new(records), report)
    }

    #[must_use]
    pub fn records(&self) -> &[QuestionRecord] {
        &self.records
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&QuestionRecord> {
        self.records.get(index)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_with_report_moves_records_into_catalog() {
        let text = "Level: A1\nType: TF\nQuestion: ?\nAnswer: Vrai\nLevel: A1\nType: TF\n";
        let (catalog, report) = Catalog::parse_with_report(text);
        assert_eq!(catalog.len(), 1);
        assert!(report.records.is_empty());
        assert_eq!(report.dropped_count(), 1);
        assert_eq!(catalog.get(0).map(QuestionRecord::level), Some("A1"));
    }

    #[test]
    fn empty_catalog_is_detectable() {
        assert!(Catalog::parse("").is_empty());
        assert!(Catalog::empty().is_empty());
    }
}
