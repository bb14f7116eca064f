//! Outcome of a CSV bulk import

use serde::Serialize;

/// Counters and per-row messages collected while importing
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub created: usize,
    pub skipped: usize,
    pub messages: Vec<String>,
}

impl ImportReport {
    pub fn created(&mut self, message: impl Into<String>) {
        self.created += 1;
        self.messages.push(message.into());
    }

    pub fn skipped(&mut self, message: impl Into<String>) {
        self.skipped += 1;
        self.messages.push(message.into());
    }

    /// Informational message that does not change the counters
    pub fn note(&mut self, message: impl Into<String>) {
        self.messages.push(message.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters() {
        let mut report = ImportReport::default();
        report.created("Created user alice");
        report.skipped("User bob already exists");
        report.note("Row 3: invalid purchase_date");
        assert_eq!(report.created, 1);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.messages.len(), 3);
    }
}
