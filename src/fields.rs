//! Editable note sections
//!
//! The fixed set of note fields, the binding trait that reads and writes them,
//! and the in-memory field set the console edits.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Field content keyed by field identifier, as stored in a session record
pub(crate) type FieldSnapshot = BTreeMap<String, String>;

/// Identifier of an editable note section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) enum FieldId {
    Transcription,
    Complaints,
    LifeHistory,
    Allergies,
    Examination,
    Diagnosis,
    Prescriptions,
    Examinations,
    CurrentMeds,
}

impl FieldId {
    /// Every bound field, in display order
    pub(crate) const ALL: [FieldId; 9] = [
        FieldId::Transcription,
        FieldId::Complaints,
        FieldId::LifeHistory,
        FieldId::Allergies,
        FieldId::Examination,
        FieldId::Diagnosis,
        FieldId::Prescriptions,
        FieldId::Examinations,
        FieldId::CurrentMeds,
    ];

    /// Stable identifier used in stored sessions
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            FieldId::Transcription => "transcription",
            FieldId::Complaints => "complaints",
            FieldId::LifeHistory => "life-history",
            FieldId::Allergies => "allergies",
            FieldId::Examination => "examination",
            FieldId::Diagnosis => "diagnosis",
            FieldId::Prescriptions => "prescriptions",
            FieldId::Examinations => "examinations",
            FieldId::CurrentMeds => "current-meds",
        }
    }

    /// Human-readable section name
    pub(crate) fn display_name(self) -> &'static str {
        match self {
            FieldId::Transcription => "Transcription",
            FieldId::Complaints => "Complaints",
            FieldId::LifeHistory => "Life history",
            FieldId::Allergies => "Allergy history",
            FieldId::Examination => "Physical examination",
            FieldId::Diagnosis => "Diagnosis",
            FieldId::Prescriptions => "Prescriptions",
            FieldId::Examinations => "Ordered examinations",
            FieldId::CurrentMeds => "Current medications",
        }
    }

    /// Text shown in place of an empty section
    pub(crate) fn placeholder(self) -> &'static str {
        match self {
            FieldId::Transcription => "The conversation transcript will appear here...",
            FieldId::Complaints => "Patient complaints...",
            FieldId::LifeHistory => "Life history...",
            FieldId::Allergies => "Allergy history...",
            FieldId::Examination => "Physical examination findings...",
            FieldId::Diagnosis => "Diagnosis...",
            FieldId::Prescriptions => "Prescriptions...",
            FieldId::Examinations => "Ordered examinations...",
            FieldId::CurrentMeds => "Medications the patient is taking...",
        }
    }

    /// Starter text written by the template fill (the transcript has none)
    pub(crate) fn template(self) -> Option<&'static str> {
        match self {
            FieldId::Transcription => None,
            FieldId::Complaints => Some("Complaints at the time of examination: "),
            FieldId::LifeHistory => Some("Life history: "),
            FieldId::Allergies => Some("Allergy history: unremarkable."),
            FieldId::Examination => {
                Some("Physical examination: General condition satisfactory. ")
            }
            FieldId::Diagnosis => Some("Diagnosis: "),
            FieldId::Prescriptions => Some("Prescriptions: "),
            FieldId::Examinations => Some("Ordered examinations: "),
            FieldId::CurrentMeds => Some("Regular medications: "),
        }
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldId {
    type Err = UnknownField;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FieldId::ALL
            .into_iter()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| UnknownField(s.to_string()))
    }
}

/// A section identifier that is not part of the bound field set
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown section: {0}")]
pub(crate) struct UnknownField(pub String);

/// Whether a section counts as "not filled in"
///
/// Content that is blank after trimming, or that is just the section's
/// placeholder text, is treated as empty.
pub(crate) fn is_effectively_empty(id: FieldId, content: &str) -> bool {
    let trimmed = content.trim();
    trimmed.is_empty() || trimmed == id.placeholder()
}

/// Read/write access to the rendered note sections
///
/// Implementors only provide single-field access; snapshotting the whole
/// note goes through the provided methods so every caller sees the same
/// field set.
pub(crate) trait FieldBinding {
    /// Current content of one section
    fn read(&self, id: FieldId) -> String;

    /// Replace the content of one section
    fn write(&mut self, id: FieldId, content: String);

    /// Copy every bound section into a fresh snapshot
    fn capture_all(&self) -> FieldSnapshot {
        FieldId::ALL
            .into_iter()
            .map(|id| (id.as_str().to_string(), self.read(id)))
            .collect()
    }

    /// Write a snapshot back into the sections
    ///
    /// Sections missing from `fields` are emptied; entries that do not name a
    /// bound section are ignored.
    fn apply_all(&mut self, fields: &FieldSnapshot) {
        for id in FieldId::ALL {
            let content = fields.get(id.as_str()).cloned().unwrap_or_default();
            self.write(id, content);
        }
    }

    /// Empty every section
    fn clear_all(&mut self) {
        for id in FieldId::ALL {
            self.write(id, String::new());
        }
    }
}

/// In-memory note sections
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct NoteFields {
    contents: [String; FieldId::ALL.len()],
}

impl NoteFields {
    pub(crate) fn get(&self, id: FieldId) -> &str {
        &self.contents[id as usize]
    }

    /// Append text to the end of a section
    pub(crate) fn append(&mut self, id: FieldId, text: &str) {
        self.contents[id as usize].push_str(text);
    }

    /// Whether the given section counts as not filled in
    pub(crate) fn is_unfilled(&self, id: FieldId) -> bool {
        is_effectively_empty(id, self.get(id))
    }
}

impl FieldBinding for NoteFields {
    fn read(&self, id: FieldId) -> String {
        self.get(id).to_string()
    }

    fn write(&mut self, id: FieldId, content: String) {
        self.contents[id as usize] = content;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(pairs: &[(&str, &str)]) -> FieldSnapshot {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_field_ids_parse_back() {
        for id in FieldId::ALL {
            assert_eq!(id.as_str().parse::<FieldId>(), Ok(id));
        }
        assert_eq!(
            "history".parse::<FieldId>(),
            Err(UnknownField("history".to_string()))
        );
    }

    #[test]
    fn test_capture_covers_every_field() {
        let fields = NoteFields::default();
        let captured = fields.capture_all();
        assert_eq!(captured.len(), FieldId::ALL.len());
        assert!(captured.values().all(String::is_empty));
        assert!(captured.contains_key("life-history"));
        assert!(captured.contains_key("current-meds"));
    }

    #[test]
    fn test_apply_then_capture_keeps_known_fields() {
        let mut fields = NoteFields::default();
        let input = snapshot(&[
            ("complaints", "headache"),
            ("diagnosis", "migraine"),
            ("legacy-notes", "dropped"),
        ]);

        fields.apply_all(&input);
        let captured = fields.capture_all();

        assert_eq!(captured["complaints"], "headache");
        assert_eq!(captured["diagnosis"], "migraine");
        assert!(!captured.contains_key("legacy-notes"));
        assert_eq!(captured["allergies"], "");
    }

    #[test]
    fn test_apply_empties_missing_fields() {
        let mut fields = NoteFields::default();
        fields.write(FieldId::Allergies, "penicillin".to_string());

        fields.apply_all(&snapshot(&[("complaints", "cough")]));

        assert_eq!(fields.get(FieldId::Allergies), "");
        assert_eq!(fields.get(FieldId::Complaints), "cough");
    }

    #[test]
    fn test_clear_all() {
        let mut fields = NoteFields::default();
        fields.write(FieldId::Transcription, "Doctor: hello".to_string());
        fields.append(FieldId::Prescriptions, "rest");

        fields.clear_all();

        assert_eq!(fields, NoteFields::default());
    }

    #[test]
    fn test_effectively_empty_policy() {
        let id = FieldId::CurrentMeds;
        assert!(is_effectively_empty(id, ""));
        assert!(is_effectively_empty(id, "  \n\t"));
        assert!(is_effectively_empty(id, id.placeholder()));
        assert!(is_effectively_empty(id, &format!("  {}  ", id.placeholder())));
        assert!(!is_effectively_empty(id, "ibuprofen"));
        // Another section's placeholder is real content here
        assert!(!is_effectively_empty(id, FieldId::Diagnosis.placeholder()));
    }

    #[test]
    fn test_only_transcription_has_no_template() {
        for id in FieldId::ALL {
            assert_eq!(id.template().is_none(), id == FieldId::Transcription);
        }
    }
}
