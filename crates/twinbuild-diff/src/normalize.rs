//! Noise filtering and canonical ordering of disassembled text.
//!
//! Two builds of the same sources can disagree on member order, on
//! synthetic members injected by language runtimes, and on debug-only
//! tables. [`normalize`] removes exactly the enumerated noise below and
//! sorts what remains, so equal [`NormalizedText`] means equivalent units.

use std::fmt;

use serde::Serialize;

/// Lines containing any of these substrings are dropped.
pub const NOISE_LINE_PATTERNS: [&str; 5] = [
    // Groovy's injected metaclass field.
    "private transient synthetic Lgroovy/lang/MetaClass; metaClass",
    "// access flags",
    "synthetic ",
    "@Lkotlin/Metadata;",
    "    LOCALVARIABLE ",
];

/// Interface that Groovy adds to every class it compiles.
pub const INJECTED_INTERFACE: &str = "groovy/lang/GroovyObject";

const IMPLEMENTS: &str = " implements ";

/// Canonical text of one compiled unit.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct NormalizedText(String);

impl NormalizedText {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for NormalizedText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<NormalizedText> for String {
    fn from(text: NormalizedText) -> Self {
        text.0
    }
}

fn is_noise(line: &str) -> bool {
    NOISE_LINE_PATTERNS.iter().any(|p| line.contains(p))
}

/// Remove the injected interface from an `implements` clause.
fn strip_injected_interface(line: &str) -> String {
    let standalone = format!("{IMPLEMENTS}{INJECTED_INTERFACE} {{");
    let line = line.replace(&standalone, " {");
    match line.find(IMPLEMENTS) {
        Some(at) => {
            let (head, tail) = line.split_at(at + IMPLEMENTS.len());
            let tail: Vec<&str> = tail.split(' ').filter(|t| *t != INJECTED_INTERFACE).collect();
            format!("{head}{}", tail.join(" "))
        }
        None => line,
    }
}

/// Filter noise out of `raw` and sort the remaining lines.
pub fn normalize(raw: &str) -> NormalizedText {
    let mut lines: Vec<String> = raw
        .lines()
        .filter(|line| !is_noise(line))
        .map(strip_injected_interface)
        .filter(|line| !line.is_empty())
        .collect();
    lines.sort_unstable();
    NormalizedText(lines.join("\n"))
}
