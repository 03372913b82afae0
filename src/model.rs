use std::collections::BTreeMap;

/// Resolved variables keyed by name. Ordered so output is deterministic.
pub type EnvMap = BTreeMap<String, String>;

/// Summary of the load operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoadReport {
    pub loaded: usize,
    pub skipped_existing: usize,
    pub files_read: usize,
}
