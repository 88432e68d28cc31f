//! The aggregate result of a differencing run.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::classify::UnitKind;
use crate::compare::{ComparisonOutcome, Divergence};

/// What was found for one entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingKind {
    Missing,
    Differing,
}

/// A missing or differing entry, in walk order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Finding {
    /// Path relative to the roots.
    pub path: PathBuf,
    pub kind: FindingKind,
    pub unit: UnitKind,
    /// Failure reasons, when a side could not be read or disassembled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Statistics and findings of one run.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct DiffReport {
    /// Every file under the original root.
    pub files_visited: usize,
    /// Files under the original root classified as compiled units.
    pub compiled_units_visited: usize,
    /// File names of differing compiled units, in encounter order. These
    /// alone decide pass or fail.
    pub differing_units: Vec<String>,
    pub findings: Vec<Finding>,
    /// Opaque files whose bytes differ. Informational only.
    pub opaque_differences: usize,
    /// Sides that could not be read or disassembled.
    pub disassembly_failures: usize,
}

impl DiffReport {
    /// `true` iff at least one compiled unit differs.
    pub fn has_error(&self) -> bool {
        !self.differing_units.is_empty()
    }

    /// Differing unit names sorted, independent of traversal order.
    pub fn sorted_differing_units(&self) -> Vec<String> {
        let mut names = self.differing_units.clone();
        names.sort();
        names
    }

    /// The first `limit` sorted differing unit names.
    pub fn sample(&self, limit: usize) -> Vec<String> {
        let mut names = self.sorted_differing_units();
        names.truncate(limit);
        names
    }

    pub fn missing(&self) -> impl Iterator<Item = &Finding> {
        self.findings
            .iter()
            .filter(|f| f.kind == FindingKind::Missing)
    }
}

/// Folds per-entry results into a [`DiffReport`].
#[derive(Debug, Default)]
pub struct ReportBuilder {
    report: DiffReport,
}

impl ReportBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count an entry found by the walk.
    pub fn visit(&mut self, unit: UnitKind) {
        self.report.files_visited += 1;
        if unit == UnitKind::Compiled {
            self.report.compiled_units_visited += 1;
        }
    }

    /// Record the outcome of a dispatched entry.
    pub fn record(
        &mut self,
        path: &Path,
        unit: UnitKind,
        outcome: &ComparisonOutcome,
        detail: Option<String>,
    ) {
        let kind = match outcome {
            ComparisonOutcome::Identical => return,
            ComparisonOutcome::Missing => FindingKind::Missing,
            ComparisonOutcome::Differing(Divergence::Compiled { .. }) => {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                self.report.differing_units.push(name);
                FindingKind::Differing
            }
            ComparisonOutcome::Differing(Divergence::Opaque) => {
                self.report.opaque_differences += 1;
                FindingKind::Differing
            }
        };
        self.report.findings.push(Finding {
            path: path.to_path_buf(),
            kind,
            unit,
            detail,
        });
    }

    pub fn add_disassembly_failures(&mut self, count: usize) {
        self.report.disassembly_failures += count;
    }

    pub fn finish(self) -> DiffReport {
        self.report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize;

    fn compiled_divergence() -> ComparisonOutcome {
        ComparisonOutcome::Differing(Divergence::Compiled {
            original: normalize("a"),
            incremental: normalize("b"),
        })
    }

    #[test]
    fn only_compiled_divergence_is_an_error() {
        let mut b = ReportBuilder::new();
        b.record(Path::new("x/A.class"), UnitKind::Compiled, &ComparisonOutcome::Missing, None);
        b.record(
            Path::new("res.txt"),
            UnitKind::Opaque,
            &ComparisonOutcome::Differing(Divergence::Opaque),
            None,
        );
        let report = b.finish();
        assert!(!report.has_error());
        assert_eq!(report.findings.len(), 2);
        assert_eq!(report.opaque_differences, 1);
        assert_eq!(report.missing().count(), 1);
    }

    #[test]
    fn differing_units_keep_encounter_order() {
        let mut b = ReportBuilder::new();
        for path in ["z/Zeta.class", "a/Alpha.class", "m/Mid.class"] {
            b.visit(UnitKind::Compiled);
            b.record(Path::new(path), UnitKind::Compiled, &compiled_divergence(), None);
        }
        b.visit(UnitKind::Opaque);
        let report = b.finish();
        assert!(report.has_error());
        assert_eq!(report.files_visited, 4);
        assert_eq!(report.compiled_units_visited, 3);
        assert_eq!(report.differing_units, vec!["Zeta.class", "Alpha.class", "Mid.class"]);
        assert_eq!(
            report.sorted_differing_units(),
            vec!["Alpha.class", "Mid.class", "Zeta.class"]
        );
        assert_eq!(report.sample(2), vec!["Alpha.class", "Mid.class"]);
    }

    #[test]
    fn identical_entries_leave_no_finding() {
        let mut b = ReportBuilder::new();
        b.visit(UnitKind::Compiled);
        b.record(Path::new("A.class"), UnitKind::Compiled, &ComparisonOutcome::Identical, None);
        let report = b.finish();
        assert!(report.findings.is_empty());
        assert_eq!(report, DiffReport { files_visited: 1, compiled_units_visited: 1, ..Default::default() });
    }

    #[test]
    fn serializes_to_json() {
        let mut b = ReportBuilder::new();
        b.record(Path::new("A.class"), UnitKind::Compiled, &compiled_divergence(), Some("bad".into()));
        let json = serde_json::to_value(b.finish()).unwrap();
        assert_eq!(json["differing_units"][0], "A.class");
        assert_eq!(json["findings"][0]["kind"], "differing");
        assert_eq!(json["findings"][0]["unit"], "compiled");
        assert_eq!(json["findings"][0]["detail"], "bad");
    }
}
