//! Per-query executor options.
//!
//! Options are scoped to one query execution and mutated by the `OPT`
//! statement. They gate side computations rather than change statement
//! semantics.

use serde::{Deserialize, Serialize};

/// Per-query options, settable via `OPT <KEY> <BOOL>`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Options {
    /// Suppress live-query and event hooks during bulk load.
    pub import: bool,
    /// Bypass schema STRICT checks.
    pub force: bool,
    /// Enable field computations.
    pub fields: bool,
    /// Enable event computations.
    pub events: bool,
    /// Enable table computations.
    pub tables: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            import: false,
            force: false,
            fields: true,
            events: true,
            tables: true,
        }
    }
}

impl Options {
    /// Sets a recognized option by key. Returns `false` for unknown keys so
    /// the caller can reject them.
    pub fn set(&mut self, key: &str, value: bool) -> bool {
        match key.to_ascii_lowercase().as_str() {
            "import" => self.import = value,
            "force" => self.force = value,
            "fields" => self.fields = value,
            "events" => self.events = value,
            "tables" => self.tables = value,
            _ => return false,
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_enable_computations() {
        let opts = Options::default();
        assert!(!opts.import);
        assert!(!opts.force);
        assert!(opts.fields && opts.events && opts.tables);
    }

    #[test]
    fn set_is_case_insensitive() {
        let mut opts = Options::default();
        assert!(opts.set("IMPORT", true));
        assert!(opts.import);
    }

    #[test]
    fn unknown_key_is_rejected() {
        let mut opts = Options::default();
        assert!(!opts.set("turbo", true));
    }
}
