// Status report over the stored documents

use crate::model::{CategoryMap, DiseaseStore};
use colored::Colorize;
use std::collections::BTreeMap;

/// Everything `icdwalk status` shows, computed from the two documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusSummary {
    pub total_categories: usize,
    pub total_records: usize,
    pub stored_count: usize,
    pub captured: Vec<String>,
    pub pending: Vec<String>,
    pub per_chapter: BTreeMap<Option<String>, usize>,
    pub duplicate_captured: usize,
    pub mismatched_keys: Vec<String>,
}

impl StatusSummary {
    /// `diseases` is taken as read from disk, before any normalization.
    pub fn from_documents(categories: &CategoryMap, diseases: &DiseaseStore) -> Self {
        let mut unique = diseases.clone();
        unique.dedup_captured();

        let pending = categories
            .keys()
            .filter(|code| !unique.is_captured(code))
            .cloned()
            .collect();

        Self {
            total_categories: categories.len(),
            total_records: diseases.data.len(),
            stored_count: diseases.count,
            duplicate_captured: diseases.captured.len() - unique.captured.len(),
            captured: unique.captured,
            pending,
            per_chapter: diseases.chapter_counts(),
            mismatched_keys: diseases
                .mismatched_keys()
                .into_iter()
                .map(str::to_string)
                .collect(),
        }
    }

    pub fn is_consistent(&self) -> bool {
        self.stored_count == self.total_records
            && self.duplicate_captured == 0
            && self.mismatched_keys.is_empty()
    }
}

/// Generate a human readable status report
pub fn generate_status_report(summary: &StatusSummary, categories: &CategoryMap) -> String {
    let mut report = String::new();
    report.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");
    report.push_str("# Summary:\n");
    report.push_str(&format!("  Categories known: {}\n", summary.total_categories));
    report.push_str(&format!("  Categories captured: {}\n", summary.captured.len()));
    report.push_str(&format!("  Categories pending: {}\n", summary.pending.len()));
    report.push_str(&format!("  Records: {}\n", summary.total_records));
    report.push_str("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");

    report.push_str("## Records per chapter\n");
    for (chapter, count) in &summary.per_chapter {
        let (code, title) = match chapter {
            Some(code) => (
                code.as_str(),
                categories.get(code).map(String::as_str).unwrap_or(""),
            ),
            None => ("-", "(no chapter)"),
        };
        let marker = if summary.captured.iter().any(|c| c == code) {
            "✓".green()
        } else {
            "…".yellow()
        };
        report.push_str(&format!(
            "  {} {:>4} {:>6}  {}\n",
            marker,
            code,
            count,
            title.bright_black()
        ));
    }

    if !summary.pending.is_empty() {
        report.push_str("\n## Pending categories\n");
        for code in &summary.pending {
            let title = categories.get(code).map(String::as_str).unwrap_or("");
            report.push_str(&format!("  {} {}\n", code, title.bright_black()));
        }
    }

    if !summary.is_consistent() {
        report.push_str(&format!("\n{}\n", "## Inconsistencies".red().bold()));
        if summary.stored_count != summary.total_records {
            report.push_str(&format!(
                "  count is {} but data holds {} records\n",
                summary.stored_count, summary.total_records
            ));
        }
        if summary.duplicate_captured > 0 {
            report.push_str(&format!(
                "  {} duplicate entries in captured\n",
                summary.duplicate_captured
            ));
        }
        for key in &summary.mismatched_keys {
            report.push_str(&format!("  record {} has a different theCode\n", key));
        }
    }

    report
}
