//! Pre-visit patient record — the immutable input to prompt composition.
//!
//! All values are opaque display strings. No parsing or validation happens
//! here; the record is constructed once per scenario and read-only after.

/// Insertion-ordered `key → value` fields with unique keys.
///
/// Display order matters for prompt rendering, so this is backed by a `Vec`
/// rather than a hash map. Re-inserting a key overwrites the value in place
/// and keeps the original position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fields {
    entries: Vec<(String, String)>,
}

impl Fields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a field. Last write wins; insertion position is preserved.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, v)) => *v = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let mut fields = Self::new();
        for (k, v) in pairs {
            fields.insert(k, v);
        }
        fields
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Render as `key: value` lines, one per entry, in insertion order.
    pub fn render(&self) -> String {
        self.entries
            .iter()
            .map(|(k, v)| format!("{k}: {v}"))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Pre-visit information for one synthetic patient.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatientInput {
    /// Demographic facts (age, sex).
    pub metadata: Fields,
    /// Patient-reported complaints and history.
    pub subjective: Fields,
    /// Measured, device-derived data.
    pub objective: Fields,
}

impl PatientInput {
    pub fn new(metadata: Fields, subjective: Fields, objective: Fields) -> Self {
        Self {
            metadata,
            subjective,
            objective,
        }
    }
}
