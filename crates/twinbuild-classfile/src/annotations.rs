//! Runtime annotation attributes rendered in Textifier notation:
//! `@Ldesc;(name=value, ...)`.

use crate::constant_pool::{Constant, ConstantPool};
use crate::error::{ClassFileError, ClassFileResult};
use crate::reader::ByteReader;
use crate::text::{render_double, render_float};

fn malformed(attribute: &'static str, reason: impl Into<String>) -> ClassFileError {
    ClassFileError::MalformedAttribute {
        attribute,
        reason: reason.into(),
    }
}

/// Render every annotation of a `Runtime(In)VisibleAnnotations` payload.
pub fn render_annotations(
    r: &mut ByteReader<'_>,
    cp: &ConstantPool,
) -> ClassFileResult<Vec<String>> {
    let count = r.u16()?;
    (0..count).map(|_| render_annotation(r, cp)).collect()
}

/// Render a `Runtime(In)VisibleParameterAnnotations` payload as
/// `(parameter, annotation)` pairs.
pub fn render_parameter_annotations(
    r: &mut ByteReader<'_>,
    cp: &ConstantPool,
) -> ClassFileResult<Vec<(u8, String)>> {
    let parameters = r.u8()?;
    let mut out = Vec::new();
    for parameter in 0..parameters {
        for annotation in render_annotations(r, cp)? {
            out.push((parameter, annotation));
        }
    }
    Ok(out)
}

pub fn render_annotation(r: &mut ByteReader<'_>, cp: &ConstantPool) -> ClassFileResult<String> {
    let descriptor = cp.utf8(r.u16()?)?;
    let pairs = r.u16()?;
    let mut values = Vec::with_capacity(pairs as usize);
    for _ in 0..pairs {
        let name = cp.utf8(r.u16()?)?;
        values.push(format!("{name}={}", render_element_value(r, cp)?));
    }
    Ok(format!("@{descriptor}({})", values.join(", ")))
}

fn int_constant(cp: &ConstantPool, index: u16) -> ClassFileResult<i32> {
    match cp.get(index)? {
        Constant::Integer(v) => Ok(*v),
        _ => Err(ClassFileError::ConstantKind {
            index,
            expected: "Integer",
        }),
    }
}

/// Render one `element_value` (also used for `AnnotationDefault`).
pub fn render_element_value(r: &mut ByteReader<'_>, cp: &ConstantPool) -> ClassFileResult<String> {
    let tag = r.u8()?;
    let rendered = match tag {
        b'B' => format!("(byte){}", int_constant(cp, r.u16()?)?),
        b'S' => format!("(short){}", int_constant(cp, r.u16()?)?),
        b'I' => int_constant(cp, r.u16()?)?.to_string(),
        b'Z' => (int_constant(cp, r.u16()?)? != 0).to_string(),
        b'C' => {
            let v = int_constant(cp, r.u16()?)?;
            let c = char::from_u32(v as u32).unwrap_or(char::REPLACEMENT_CHARACTER);
            format!("'{}'", c.escape_default())
        }
        b'J' => {
            let index = r.u16()?;
            match cp.get(index)? {
                Constant::Long(v) => format!("{v}L"),
                _ => {
                    return Err(ClassFileError::ConstantKind {
                        index,
                        expected: "Long",
                    })
                }
            }
        }
        b'F' => {
            let index = r.u16()?;
            match cp.get(index)? {
                Constant::Float(v) => render_float(*v),
                _ => {
                    return Err(ClassFileError::ConstantKind {
                        index,
                        expected: "Float",
                    })
                }
            }
        }
        b'D' => {
            let index = r.u16()?;
            match cp.get(index)? {
                Constant::Double(v) => render_double(*v),
                _ => {
                    return Err(ClassFileError::ConstantKind {
                        index,
                        expected: "Double",
                    })
                }
            }
        }
        b's' => cp.quoted_utf8(r.u16()?)?,
        b'e' => {
            let type_name = cp.utf8(r.u16()?)?;
            let const_name = cp.utf8(r.u16()?)?;
            format!("{type_name}.{const_name}")
        }
        b'c' => format!("{}.class", cp.utf8(r.u16()?)?),
        b'@' => render_annotation(r, cp)?,
        b'[' => {
            let count = r.u16()?;
            let items = (0..count)
                .map(|_| render_element_value(r, cp))
                .collect::<ClassFileResult<Vec<_>>>()?;
            format!("{{{}}}", items.join(", "))
        }
        other => {
            return Err(malformed(
                "annotation",
                format!("unknown element tag {:?}", other as char),
            ))
        }
    };
    Ok(rendered)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// #1 "Lkotlin/Metadata;", #2 "mv", #3 Integer 1, #4 "d2", #5 "main"
    fn pool() -> ConstantPool {
        let mut b = vec![0, 6];
        b.extend([1, 0, 17]);
        b.extend(b"Lkotlin/Metadata;");
        b.extend([1, 0, 2]);
        b.extend(b"mv");
        b.extend([3, 0, 0, 0, 1]);
        b.extend([1, 0, 2]);
        b.extend(b"d2");
        b.extend([1, 0, 4]);
        b.extend(b"main");
        ConstantPool::parse(&mut ByteReader::new(&b)).unwrap()
    }

    #[test]
    fn renders_array_and_string_values() {
        let cp = pool();
        // one annotation, type #1, two pairs: mv=[I#3, I#3], d2=s#5
        let payload = [
            0, 1, 0, 1, 0, 2, 0, 2, b'[', 0, 2, b'I', 0, 3, b'I', 0, 3, 0, 4, b's', 0, 5,
        ];
        let rendered = render_annotations(&mut ByteReader::new(&payload), &cp).unwrap();
        assert_eq!(rendered, vec![r#"@Lkotlin/Metadata;(mv={1, 1}, d2="main")"#]);
    }

    #[test]
    fn renders_boolean_and_char() {
        let cp = pool();
        assert_eq!(
            render_element_value(&mut ByteReader::new(&[b'Z', 0, 3]), &cp).unwrap(),
            "true"
        );
        assert_eq!(
            render_element_value(&mut ByteReader::new(&[b'C', 0, 3]), &cp).unwrap(),
            "'\\u{1}'"
        );
    }

    #[test]
    fn rejects_unknown_tag() {
        let cp = pool();
        let err = render_element_value(&mut ByteReader::new(&[b'?', 0, 1]), &cp).unwrap_err();
        assert!(matches!(err, ClassFileError::MalformedAttribute { .. }));
    }

    #[test]
    fn parameter_annotations_are_indexed() {
        let cp = pool();
        // two parameters: first has none, second has @Lkotlin/Metadata;()
        let payload = [2, 0, 0, 0, 1, 0, 1, 0, 0];
        let rendered = render_parameter_annotations(&mut ByteReader::new(&payload), &cp).unwrap();
        assert_eq!(rendered, vec![(1, "@Lkotlin/Metadata;()".to_string())]);
    }
}
