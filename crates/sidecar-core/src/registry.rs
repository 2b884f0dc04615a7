use serde_json::{json, Value};
use std::collections::HashMap;
use thiserror::Error;

/// The refresh sentinel the relay expects in a `request` envelope.
pub const REQUEST_SENTINEL: &str = "PLEASE";

/// Closed set of payload shapes a category can carry. The rendering
/// collaborator resolves these; the core only stores and forwards the tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatterKind {
    /// id-keyed record lists (nodes, phones, pdus).
    RecordList,
    /// lease records with slicename/valid_from/valid_until.
    LeaseList,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryConfig {
    pub name: String,
    pub history_depth: usize,
    pub default_request_payload: Value,
    pub default_info_payload: Value,
    pub formatter: FormatterKind,
}

impl CategoryConfig {
    pub fn new(name: impl Into<String>, history_depth: usize, formatter: FormatterKind) -> Self {
        Self {
            name: name.into(),
            history_depth: history_depth.max(1),
            default_request_payload: json!(REQUEST_SENTINEL),
            default_info_payload: json!([]),
            formatter,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown category: {0}")]
pub struct UnknownCategory(pub String);

/// Static table of known categories, built once at startup and read-only
/// thereafter.
#[derive(Debug, Clone)]
pub struct CategoryRegistry {
    by_name: HashMap<String, CategoryConfig>,
}

impl CategoryRegistry {
    pub fn new(configs: impl IntoIterator<Item = CategoryConfig>) -> Self {
        let by_name = configs
            .into_iter()
            .map(|config| (config.name.clone(), config))
            .collect();
        Self { by_name }
    }

    /// The stock sidecar table: testbed nodes, phones, PDUs and the lease
    /// schedule.
    pub fn sidecar_default() -> Self {
        Self::new([
            CategoryConfig::new("nodes", 10, FormatterKind::RecordList),
            CategoryConfig::new("phones", 2, FormatterKind::RecordList),
            CategoryConfig::new("pdus", 5, FormatterKind::RecordList),
            CategoryConfig::new("leases", 2, FormatterKind::LeaseList),
        ])
    }

    pub fn get(&self, name: &str) -> Result<&CategoryConfig, UnknownCategory> {
        self.by_name
            .get(name)
            .ok_or_else(|| UnknownCategory(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Category names in stable alphabetical order, for display.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.by_name.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn configs(&self) -> impl Iterator<Item = &CategoryConfig> {
        self.by_name.values()
    }
}
