//! Tree differencing engine for twinbuild.
//!
//! Compares an original build output tree with an incremental rebuild of
//! the same sources. Compiled units (`.class` files) are disassembled,
//! stripped of known compiler noise and compared as sorted text; every
//! other file is compared byte for byte.
//!
//! # Key Types
//!
//! - [`DiffEngine`] -- walks the original tree and dispatches comparisons to a worker pool
//! - [`DiffConfig`] -- method-body and other-file switches, worker count, diagnostics dir
//! - [`Comparator`] / [`ComparisonOutcome`] -- per-entry equality decision
//! - [`normalize`] / [`NormalizedText`] -- noise filtering and canonical ordering
//! - [`Disassembler`] -- seam to the class-file textifier
//! - [`DiffRecorder`] -- diagnostics for differing units
//! - [`DiffReport`] -- run statistics and findings

pub mod adapter;
pub mod classify;
pub mod compare;
pub mod config;
pub mod engine;
pub mod error;
pub mod normalize;
pub mod recorder;
pub mod report;

pub use adapter::{ClassFileDisassembler, Disassembler};
pub use classify::{classify, TreeEntry, UnitKind};
pub use compare::{Comparator, Comparison, ComparisonOutcome, Divergence, Side, FAILURE_SENTINEL};
pub use config::DiffConfig;
pub use engine::DiffEngine;
pub use error::{DiffError, DiffResult, DisassemblyFailure, RecordError, RecordResult};
pub use normalize::{normalize, NormalizedText};
pub use recorder::DiffRecorder;
pub use report::{DiffReport, Finding, FindingKind, ReportBuilder};
