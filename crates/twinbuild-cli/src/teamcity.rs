//! TeamCity service messages.

use std::io::{self, Write};

use twinbuild_diff::{DiffReport, FindingKind};

use crate::reporter::{path_label, summary};

/// Escape a value for use inside a service message attribute.
pub fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '|' => out.push_str("||"),
            '\'' => out.push_str("|'"),
            '\n' => out.push_str("|n"),
            '\r' => out.push_str("|r"),
            '[' => out.push_str("|["),
            ']' => out.push_str("|]"),
            '\u{0085}' => out.push_str("|x"),
            '\u{2028}' => out.push_str("|l"),
            '\u{2029}' => out.push_str("|p"),
            _ => out.push(c),
        }
    }
    out
}

pub fn message(text: &str, status: &str) -> String {
    format!("##teamcity[message text='{}' status='{status}']", escape(text))
}

pub fn build_status(text: &str, status: &str) -> String {
    format!("##teamcity[buildStatus text='{}' status='{status}']", escape(text))
}

/// Findings, totals, the differing-class summary and the build status.
pub fn render(report: &DiffReport, out: &mut impl Write) -> io::Result<()> {
    for finding in &report.findings {
        let marker = match finding.kind {
            FindingKind::Missing => "M",
            FindingKind::Differing => "D",
        };
        let text = format!("{marker} {}", path_label(&finding.path));
        writeln!(out, "{}", message(&text, "WARNING"))?;
    }
    writeln!(out, "{}", message(&format!("{} files", report.files_visited), "WARNING"))?;
    let total = format!("{} total class files", report.compiled_units_visited);
    writeln!(out, "{}", message(&total, "WARNING"))?;

    let summary = summary(report);
    if report.has_error() {
        writeln!(out, "{}", message(&summary, "ERROR"))?;
        writeln!(out, "{}", build_status(&summary, "FAILURE"))?;
    } else {
        writeln!(out, "{}", message(&summary, "WARNING"))?;
        writeln!(out, "{}", build_status(&total, "SUCCESS"))?;
    }
    Ok(())
}
