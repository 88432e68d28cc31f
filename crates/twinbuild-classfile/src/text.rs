//! Small rendering helpers shared by the textifier and annotation printer.

/// Java-style quoted string: ASCII printables kept, everything else escaped
/// per UTF-16 unit.
pub fn quote(s: &str) -> String {
    quote_utf16(s.encode_utf16())
}

/// [`quote`] over raw UTF-16 code units, which may include unpaired
/// surrogates.
pub fn quote_utf16(units: impl IntoIterator<Item = u16>) -> String {
    let mut out = String::from('"');
    for unit in units {
        match unit {
            0x0A => out.push_str("\\n"),
            0x0D => out.push_str("\\r"),
            0x09 => out.push_str("\\t"),
            0x5C => out.push_str("\\\\"),
            0x22 => out.push_str("\\\""),
            0x20..=0x7E => out.push(char::from(unit as u8)),
            _ => out.push_str(&format!("\\u{unit:04x}")),
        }
    }
    out.push('"');
    out
}

pub fn render_float(v: f32) -> String {
    format!("{v:?}F")
}

pub fn render_double(v: f64) -> String {
    format!("{v:?}D")
}

pub type ModifierTable = &'static [(u16, &'static str)];

pub const CLASS_MODIFIERS: ModifierTable = &[
    (0x0001, "public"),
    (0x0002, "private"),
    (0x0004, "protected"),
    (0x0010, "final"),
    (0x0008, "static"),
    (0x0400, "abstract"),
    (0x1000, "synthetic"),
    (0x4000, "enum"),
];

pub const FIELD_MODIFIERS: ModifierTable = &[
    (0x0001, "public"),
    (0x0002, "private"),
    (0x0004, "protected"),
    (0x0010, "final"),
    (0x0008, "static"),
    (0x0040, "volatile"),
    (0x0080, "transient"),
    (0x1000, "synthetic"),
    (0x4000, "enum"),
];

pub const METHOD_MODIFIERS: ModifierTable = &[
    (0x0001, "public"),
    (0x0002, "private"),
    (0x0004, "protected"),
    (0x0010, "final"),
    (0x0008, "static"),
    (0x0020, "synchronized"),
    (0x0100, "native"),
    (0x0400, "abstract"),
    (0x0800, "strictfp"),
    (0x1000, "synthetic"),
    (0x0040, "bridge"),
    (0x0080, "varargs"),
];

pub const PARAMETER_MODIFIERS: ModifierTable = &[
    (0x0010, "final"),
    (0x1000, "synthetic"),
    (0x8000, "mandated"),
];

/// Modifier keywords for `flags`, each followed by a space.
pub fn modifiers(flags: u16, table: ModifierTable) -> String {
    table
        .iter()
        .filter(|(bit, _)| flags & bit != 0)
        .map(|(_, word)| format!("{word} "))
        .collect()
}
