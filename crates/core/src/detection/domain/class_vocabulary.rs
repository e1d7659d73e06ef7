use std::fmt;

use thiserror::Error;

/// The labels a run asks the detector for.
///
/// Labels are trimmed and lowercased; duplicates collapse onto their first
/// occurrence, so the order the caller gave is kept. Never empty.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClassVocabulary {
    labels: Vec<String>,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("class vocabulary must contain at least one label")]
pub struct EmptyVocabulary;

impl ClassVocabulary {
    pub fn new<I, S>(labels: I) -> Result<Self, EmptyVocabulary>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut normalized: Vec<String> = Vec::new();
        for label in labels {
            let label = normalize(label.as_ref());
            if !label.is_empty() && !normalized.contains(&label) {
                normalized.push(label);
            }
        }
        if normalized.is_empty() {
            return Err(EmptyVocabulary);
        }
        Ok(Self { labels: normalized })
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn contains(&self, label: &str) -> bool {
        let label = normalize(label);
        self.labels.iter().any(|l| *l == label)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

fn normalize(label: &str) -> String {
    label.trim().to_lowercase()
}

impl fmt::Display for ClassVocabulary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.labels.join(", "))
    }
}
