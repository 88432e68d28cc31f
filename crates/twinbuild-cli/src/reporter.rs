use std::io::{self, Write};
use std::path::Path;

use colored::Colorize;
use twinbuild_diff::{DiffReport, FindingKind};

use crate::cli::OutputFormat;
use crate::teamcity;

/// Number of differing class names shown in the summary.
pub const SAMPLE_SIZE: usize = 10;

/// `<k> different classes: a, b, ...` over the first sorted names.
pub fn summary(report: &DiffReport) -> String {
    format!(
        "{} different classes: {}",
        report.differing_units.len(),
        report.sample(SAMPLE_SIZE).join(", ")
    )
}

/// Relative path with `/` separators on every platform.
pub fn path_label(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

pub fn render(format: OutputFormat, report: &DiffReport, out: &mut impl Write) -> io::Result<()> {
    match format {
        OutputFormat::Teamcity => teamcity::render(report, out),
        OutputFormat::Text => render_text(report, out),
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, report)?;
            writeln!(out)
        }
    }
}

fn render_text(report: &DiffReport, out: &mut impl Write) -> io::Result<()> {
    for finding in &report.findings {
        let label = path_label(&finding.path);
        match finding.kind {
            FindingKind::Missing => writeln!(out, "{} {}", "missing".yellow(), label)?,
            FindingKind::Differing => writeln!(out, "{} {}", "differs".red(), label)?,
        }
        if let Some(detail) = &finding.detail {
            writeln!(out, "  {}", detail.dimmed())?;
        }
    }
    writeln!(out, "{} files", report.files_visited)?;
    writeln!(out, "{} total class files", report.compiled_units_visited)?;
    if report.has_error() {
        writeln!(out, "{} {}", "✗".red().bold(), summary(report))?;
    } else {
        writeln!(out, "{} {}", "✓".green().bold(), summary(report))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use twinbuild_diff::{Finding, UnitKind};

    fn report(differing: usize) -> DiffReport {
        DiffReport {
            files_visited: differing + 1,
            compiled_units_visited: differing,
            differing_units: (0..differing).rev().map(|i| format!("C{i:02}.class")).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn summary_is_sorted_and_truncated() {
        let s = summary(&report(12));
        assert!(s.starts_with("12 different classes: C00.class, C01.class"));
        assert!(s.ends_with("C09.class"));
        assert!(!s.contains("C10.class"));
    }

    #[test]
    fn path_label_uses_forward_slashes() {
        assert_eq!(path_label(&Path::new("a").join("b").join("C.class")), "a/b/C.class");
    }

    #[test]
    fn json_is_the_serialized_report() {
        let mut out = Vec::new();
        render(OutputFormat::Json, &report(1), &mut out).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["files_visited"], 2);
        assert_eq!(value["differing_units"][0], "C00.class");
    }

    #[test]
    fn text_lists_findings() {
        colored::control::set_override(false);
        let mut r = report(1);
        r.findings.push(Finding {
            path: PathBuf::from("p/C00.class"),
            kind: FindingKind::Differing,
            unit: UnitKind::Compiled,
            detail: Some("<null> truncated".into()),
        });
        let mut out = Vec::new();
        render(OutputFormat::Text, &r, &mut out).unwrap();
        let out = String::from_utf8(out).unwrap();
        assert!(out.contains("differs p/C00.class\n  <null> truncated\n"));
        assert!(out.contains("1 different classes: C00.class"));
    }
}
