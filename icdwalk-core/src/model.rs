use crate::extract::strip_code;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Category code -> category title, as written to `categories.json`.
pub type CategoryMap = BTreeMap<String, String>;

/// A single classification entry as written under `data` in `icd11.json`.
///
/// `title` is the label text without the code the widget renders in front
/// of it (`Cholera`, not `1A00 Cholera`). Documents written with the code
/// still in the title are rewritten to this form by [`DiseaseStore::normalize`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiseaseRecord {
    pub title: String,
    #[serde(rename = "theCode")]
    pub the_code: String,
    pub chapter: Option<String>,
}

/// The `icd11.json` document: every record harvested so far plus the
/// categories whose subtree has been walked to completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiseaseStore {
    #[serde(default)]
    pub count: usize,
    #[serde(default)]
    pub captured: Vec<String>,
    #[serde(default)]
    pub data: BTreeMap<String, DiseaseRecord>,
}

/// What happened when a category code was appended to `captured`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureMark {
    Appended,
    /// The code was already present; the list was deduplicated instead.
    Conflict,
}

impl Default for DiseaseStore {
    fn default() -> Self {
        Self {
            count: 0,
            captured: Vec::new(),
            data: BTreeMap::new(),
        }
    }
}

impl DiseaseStore {
    /// Insert or replace the record keyed by `code`. Keeps `count` in step
    /// with `data`. Returns true if the code was not known before.
    pub fn upsert(&mut self, code: &str, title: &str, chapter: Option<&str>) -> bool {
        let record = DiseaseRecord {
            title: title.to_string(),
            the_code: code.to_string(),
            chapter: chapter.map(str::to_string),
        };
        let is_new = self.data.insert(code.to_string(), record).is_none();
        self.count = self.data.len();
        is_new
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn is_captured(&self, category: &str) -> bool {
        self.captured.iter().any(|c| c == category)
    }

    pub fn mark_captured(&mut self, category: &str) -> CaptureMark {
        if !self.is_captured(category) {
            self.captured.push(category.to_string());
            CaptureMark::Appended
        } else {
            self.dedup_captured();
            CaptureMark::Conflict
        }
    }

    /// Collapse duplicate captured codes, keeping first occurrences in order.
    pub fn dedup_captured(&mut self) {
        let mut seen = HashSet::new();
        self.captured.retain(|code| seen.insert(code.clone()));
    }

    /// Bring a store read from disk (or about to be written) back in line
    /// with its invariants.
    pub fn normalize(&mut self) {
        self.dedup_captured();
        for (code, record) in self.data.iter_mut() {
            record.title = strip_code(&record.title, code);
        }
        self.count = self.data.len();
    }

    /// Number of records per chapter, `None` grouping records without one.
    pub fn chapter_counts(&self) -> BTreeMap<Option<String>, usize> {
        let mut counts = BTreeMap::new();
        for record in self.data.values() {
            *counts.entry(record.chapter.clone()).or_insert(0) += 1;
        }
        counts
    }

    /// Keys whose record carries a different `theCode`.
    pub fn mismatched_keys(&self) -> Vec<&str> {
        self.data
            .iter()
            .filter(|(code, record)| *code != &record.the_code)
            .map(|(code, _)| code.as_str())
            .collect()
    }
}
