use std::num::NonZeroUsize;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use twinbuild_classfile::DisassemblyOptions;

/// Settings for one differencing run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffConfig {
    /// Byte-compare files that are not compiled units and report
    /// divergences. Such divergences never fail the run.
    pub compare_other_files: bool,
    /// Include method bodies in the disassembly, so instruction changes
    /// count as differences.
    pub compare_method_bodies: bool,
    /// Maximum number of comparisons in flight.
    pub workers: usize,
    /// Where to write artifacts for differing units. `None` disables
    /// recording.
    pub diagnostics_dir: Option<PathBuf>,
}

impl Default for DiffConfig {
    fn default() -> Self {
        Self {
            compare_other_files: false,
            compare_method_bodies: false,
            workers: default_workers(),
            diagnostics_dir: None,
        }
    }
}

impl DiffConfig {
    /// Disassembly settings derived from this config. Debug info is never
    /// included.
    pub fn disassembly_options(&self) -> DisassemblyOptions {
        DisassemblyOptions {
            include_debug_info: false,
            include_method_bodies: self.compare_method_bodies,
        }
    }
}

/// One worker per available core, or one when that cannot be determined.
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_conservative() {
        let config = DiffConfig::default();
        assert!(!config.compare_other_files);
        assert!(!config.compare_method_bodies);
        assert!(config.workers >= 1);
        assert!(config.diagnostics_dir.is_none());
    }

    #[test]
    fn debug_info_is_always_suppressed() {
        let config = DiffConfig {
            compare_method_bodies: true,
            ..Default::default()
        };
        let options = config.disassembly_options();
        assert!(!options.include_debug_info);
        assert!(options.include_method_bodies);
    }

    #[test]
    fn serde_roundtrip() {
        let config = DiffConfig {
            diagnostics_dir: Some(PathBuf::from("diff")),
            ..Default::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        let back: DiffConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
