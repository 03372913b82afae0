use crate::model::EnvMap;

/// Destination for exported variables.
///
/// The scanner never touches process state; exporting goes through a target
/// the caller chooses and hands to the loader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetEnv {
    kind: TargetEnvKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum TargetEnvKind {
    /// Writes through [`std::env::set_var`], which mutates global process
    /// state and is not thread-safe for concurrent environment access.
    Process,
    Memory(EnvMap),
}

impl Default for TargetEnv {
    fn default() -> Self {
        Self::memory()
    }
}

impl TargetEnv {
    /// Create a process-environment target.
    ///
    /// # Safety
    ///
    /// The caller must ensure no other threads concurrently read or write the
    /// process environment for the duration of operations that may mutate this
    /// target.
    pub unsafe fn process() -> Self {
        Self {
            kind: TargetEnvKind::Process,
        }
    }

    /// Create an empty in-memory target.
    pub fn memory() -> Self {
        Self::from_memory(EnvMap::new())
    }

    /// Create an in-memory target seeded with existing variables.
    pub fn from_memory(map: EnvMap) -> Self {
        Self {
            kind: TargetEnvKind::Memory(map),
        }
    }

    /// Whether exports go to the process environment.
    pub fn is_process(&self) -> bool {
        matches!(self.kind, TargetEnvKind::Process)
    }

    pub fn as_memory(&self) -> Option<&EnvMap> {
        match &self.kind {
            TargetEnvKind::Memory(map) => Some(map),
            TargetEnvKind::Process => None,
        }
    }

    /// Consume the target, returning the in-memory map if there is one.
    pub fn into_memory(self) -> Option<EnvMap> {
        match self.kind {
            TargetEnvKind::Memory(map) => Some(map),
            TargetEnvKind::Process => None,
        }
    }

    /// Whether `key` already holds a non-empty value. Empty values may be replaced.
    pub(crate) fn is_set(&self, key: &str) -> bool {
        match &self.kind {
            TargetEnvKind::Process => {
                std::env::var_os(key).is_some_and(|value| !value.is_empty())
            }
            TargetEnvKind::Memory(map) => map.get(key).is_some_and(|value| !value.is_empty()),
        }
    }

    pub(crate) fn set_var(&mut self, key: &str, value: &str) {
        match &mut self.kind {
            // SAFETY: `Process` targets only come from `TargetEnv::process`,
            // whose caller guarantees exclusive access to the environment.
            TargetEnvKind::Process => unsafe { std::env::set_var(key, value) },
            TargetEnvKind::Memory(map) => {
                map.insert(key.to_owned(), value.to_owned());
            }
        }
    }
}
