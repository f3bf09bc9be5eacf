use serde::{Deserialize, Deserializer, Serialize};

/// Human-readable review diagnostics with set semantics.
///
/// Insertion order is preserved; inserting a note that is already present is
/// a no-op, so re-running aggregation never duplicates entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ReviewNotes(Vec<String>);

impl ReviewNotes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a note; returns `false` when it was already recorded.
    pub fn insert(&mut self, note: impl Into<String>) -> bool {
        let note = note.into();
        let note = note.trim();
        if note.is_empty() || self.contains(note) {
            return false;
        }
        self.0.push(note.to_string());
        true
    }

    pub fn contains(&self, note: &str) -> bool {
        self.0.iter().any(|n| n == note)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<'de> Deserialize<'de> for ReviewNotes {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Vec::<String>::deserialize(deserializer)?;
        Ok(raw.into_iter().collect())
    }
}

impl<S: Into<String>> FromIterator<S> for ReviewNotes {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut notes = ReviewNotes::new();
        for note in iter {
            notes.insert(note);
        }
        notes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicates_are_suppressed_in_order() {
        let mut notes = ReviewNotes::new();
        assert!(notes.insert("Could not parse date."));
        assert!(notes.insert("MICR line unparsable."));
        assert!(!notes.insert("Could not parse date."));
        assert_eq!(
            notes.iter().collect::<Vec<_>>(),
            vec!["Could not parse date.", "MICR line unparsable."]
        );
    }

    #[test]
    fn deserializing_dedupes() {
        let notes: ReviewNotes = serde_json::from_str(r#"["a", "b", "a"]"#).unwrap();
        assert_eq!(notes.len(), 2);
        assert_eq!(serde_json::to_string(&notes).unwrap(), r#"["a","b"]"#);
    }
}
