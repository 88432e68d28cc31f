//! Pairwise comparison of an original entry with its incremental counterpart.

use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use twinbuild_classfile::DisassemblyOptions;

use crate::adapter::Disassembler;
use crate::classify::UnitKind;
use crate::error::DisassemblyFailure;
use crate::normalize::{normalize, NormalizedText};

/// Stand-in text for a side that could not be read or disassembled.
pub const FAILURE_SENTINEL: &str = "<null>";

/// Which build a value came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Original,
    Incremental,
}

/// How two sides of an entry diverged.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Divergence {
    /// Canonical texts of a compiled unit.
    Compiled {
        original: NormalizedText,
        incremental: NormalizedText,
    },
    /// Raw bytes of an opaque file differ.
    Opaque,
}

/// Result of comparing one entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ComparisonOutcome {
    Identical,
    /// No counterpart under the incremental root.
    Missing,
    Differing(Divergence),
}

impl ComparisonOutcome {
    pub fn is_identical(&self) -> bool {
        matches!(self, Self::Identical)
    }
}

/// A side that failed to produce comparable content.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SideFailure {
    pub side: Side,
    pub reason: String,
}

/// An outcome plus whatever went wrong on the way to it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Comparison {
    pub outcome: ComparisonOutcome,
    pub failures: Vec<SideFailure>,
}

impl Comparison {
    fn clean(outcome: ComparisonOutcome) -> Self {
        Self {
            outcome,
            failures: Vec::new(),
        }
    }
}

/// Decides equality of entry pairs. Shared by all workers of a run.
pub struct Comparator {
    disassembler: Arc<dyn Disassembler>,
    options: DisassemblyOptions,
}

impl std::fmt::Debug for Comparator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Comparator")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Comparator {
    pub fn new(disassembler: Arc<dyn Disassembler>, options: DisassemblyOptions) -> Self {
        Self {
            disassembler,
            options,
        }
    }

    pub fn options(&self) -> &DisassemblyOptions {
        &self.options
    }

    /// Disassemble and normalize one compiled unit.
    pub fn canonical_text(&self, bytes: &[u8]) -> Result<NormalizedText, DisassemblyFailure> {
        self.disassembler
            .disassemble(bytes, &self.options)
            .map(|raw| normalize(&raw))
    }

    /// Exact byte equality, no normalization.
    pub fn compare_opaque(original: &[u8], incremental: &[u8]) -> ComparisonOutcome {
        if original == incremental {
            ComparisonOutcome::Identical
        } else {
            ComparisonOutcome::Differing(Divergence::Opaque)
        }
    }

    /// Compare the canonical texts of two compiled units. A failure on
    /// either side makes the pair differ, even if both sides failed alike.
    pub fn compare_compiled(&self, original: &[u8], incremental: &[u8]) -> Comparison {
        let mut failures = Vec::new();
        let mut side_text = |side: Side, bytes: &[u8]| match self.canonical_text(bytes) {
            Ok(text) => text,
            Err(failure) => {
                let text = NormalizedText::from_failure(&failure.reason);
                failures.push(SideFailure {
                    side,
                    reason: failure.reason,
                });
                text
            }
        };
        let original = side_text(Side::Original, original);
        let incremental = side_text(Side::Incremental, incremental);

        let outcome = if failures.is_empty() && original == incremental {
            ComparisonOutcome::Identical
        } else {
            ComparisonOutcome::Differing(Divergence::Compiled {
                original,
                incremental,
            })
        };
        Comparison { outcome, failures }
    }

    /// Read both files and compare them according to `kind`. Unreadable
    /// files are treated like undecodable ones.
    pub fn compare_paths(&self, kind: UnitKind, original: &Path, incremental: &Path) -> Comparison {
        match (std::fs::read(original), std::fs::read(incremental)) {
            (Ok(o), Ok(i)) => match kind {
                UnitKind::Compiled => self.compare_compiled(&o, &i),
                UnitKind::Opaque => Comparison::clean(Self::compare_opaque(&o, &i)),
            },
            (o, i) => {
                let mut failures = Vec::new();
                let mut side_text = |side: Side, read: std::io::Result<Vec<u8>>| {
                    let reason = match read {
                        Ok(_) if kind == UnitKind::Opaque => return NormalizedText::default(),
                        Ok(bytes) => match self.canonical_text(&bytes) {
                            Ok(text) => return text,
                            Err(failure) => failure.reason,
                        },
                        Err(e) => e.to_string(),
                    };
                    let text = NormalizedText::from_failure(&reason);
                    failures.push(SideFailure { side, reason });
                    text
                };
                let original = side_text(Side::Original, o);
                let incremental = side_text(Side::Incremental, i);
                let divergence = match kind {
                    UnitKind::Compiled => Divergence::Compiled {
                        original,
                        incremental,
                    },
                    UnitKind::Opaque => Divergence::Opaque,
                };
                Comparison {
                    outcome: ComparisonOutcome::Differing(divergence),
                    failures,
                }
            }
        }
    }
}

impl NormalizedText {
    /// Sentinel text for a side that produced no disassembly.
    pub(crate) fn from_failure(reason: &str) -> Self {
        normalize(&format!("{FAILURE_SENTINEL} {reason}"))
    }
}
