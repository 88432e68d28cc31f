//! The class-file constant pool.
//!
//! Entries are stored at their 1-based class-file index; slot 0 and the
//! second slot of every `Long`/`Double` hold [`Constant::Unusable`].

use std::collections::BTreeMap;

use crate::error::{ClassFileError, ClassFileResult};
use crate::reader::{decode_modified_utf8_units, has_unpaired_surrogate, utf16_to_string, ByteReader};
use crate::text::{quote, quote_utf16};

/// A single constant pool entry, references left unresolved.
#[derive(Clone, Debug, PartialEq)]
pub enum Constant {
    Unusable,
    Utf8(String),
    Integer(i32),
    Float(f32),
    Long(i64),
    Double(f64),
    Class { name_index: u16 },
    String { string_index: u16 },
    FieldRef { class_index: u16, name_and_type_index: u16 },
    MethodRef { class_index: u16, name_and_type_index: u16 },
    InterfaceMethodRef { class_index: u16, name_and_type_index: u16 },
    NameAndType { name_index: u16, descriptor_index: u16 },
    MethodHandle { reference_kind: u8, reference_index: u16 },
    MethodType { descriptor_index: u16 },
    Dynamic { bootstrap_index: u16, name_and_type_index: u16 },
    InvokeDynamic { bootstrap_index: u16, name_and_type_index: u16 },
    Module { name_index: u16 },
    Package { name_index: u16 },
}

/// A field or method reference resolved to strings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MemberRef<'a> {
    pub owner: &'a str,
    pub name: &'a str,
    pub descriptor: &'a str,
    pub interface: bool,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ConstantPool {
    entries: Vec<Constant>,
    /// Exact code units of `Utf8` entries holding unpaired surrogates.
    unpaired: BTreeMap<u16, Vec<u16>>,
}

impl ConstantPool {
    /// Parse `count - 1` entries (the class-file `constant_pool_count`).
    pub fn parse(reader: &mut ByteReader<'_>) -> ClassFileResult<Self> {
        let count = reader.u16()?;
        let mut entries = Vec::with_capacity(count as usize);
        entries.push(Constant::Unusable);
        let mut unpaired = BTreeMap::new();

        let mut index: u16 = 1;
        while index < count {
            let tag = reader.u8()?;
            let constant = match tag {
                1 => {
                    let len = reader.u16()? as usize;
                    let raw = reader.bytes(len)?;
                    let units = decode_modified_utf8_units(raw)
                        .ok_or(ClassFileError::BadUtf8 { index })?;
                    let text = utf16_to_string(&units);
                    if has_unpaired_surrogate(&units) {
                        unpaired.insert(index, units);
                    }
                    Constant::Utf8(text)
                }
                3 => Constant::Integer(reader.i32()?),
                4 => Constant::Float(f32::from_bits(reader.u32()?)),
                5 => Constant::Long(reader.u64()? as i64),
                6 => Constant::Double(f64::from_bits(reader.u64()?)),
                7 => Constant::Class {
                    name_index: reader.u16()?,
                },
                8 => Constant::String {
                    string_index: reader.u16()?,
                },
                9 => Constant::FieldRef {
                    class_index: reader.u16()?,
                    name_and_type_index: reader.u16()?,
                },
                10 => Constant::MethodRef {
                    class_index: reader.u16()?,
                    name_and_type_index: reader.u16()?,
                },
                11 => Constant::InterfaceMethodRef {
                    class_index: reader.u16()?,
                    name_and_type_index: reader.u16()?,
                },
                12 => Constant::NameAndType {
                    name_index: reader.u16()?,
                    descriptor_index: reader.u16()?,
                },
                15 => Constant::MethodHandle {
                    reference_kind: reader.u8()?,
                    reference_index: reader.u16()?,
                },
                16 => Constant::MethodType {
                    descriptor_index: reader.u16()?,
                },
                17 => Constant::Dynamic {
                    bootstrap_index: reader.u16()?,
                    name_and_type_index: reader.u16()?,
                },
                18 => Constant::InvokeDynamic {
                    bootstrap_index: reader.u16()?,
                    name_and_type_index: reader.u16()?,
                },
                19 => Constant::Module {
                    name_index: reader.u16()?,
                },
                20 => Constant::Package {
                    name_index: reader.u16()?,
                },
                other => {
                    return Err(ClassFileError::UnknownConstantTag { index, tag: other })
                }
            };

            let wide = matches!(constant, Constant::Long(_) | Constant::Double(_));
            entries.push(constant);
            index += 1;
            if wide {
                entries.push(Constant::Unusable);
                index = index.saturating_add(1);
            }
        }

        Ok(Self { entries, unpaired })
    }

    /// Number of slots, including the unusable slot 0.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.len() <= 1
    }

    pub fn get(&self, index: u16) -> ClassFileResult<&Constant> {
        match self.entries.get(index as usize) {
            Some(Constant::Unusable) | None => Err(ClassFileError::BadConstantIndex { index }),
            Some(c) => Ok(c),
        }
    }

    pub fn utf8(&self, index: u16) -> ClassFileResult<&str> {
        match self.get(index)? {
            Constant::Utf8(s) => Ok(s),
            _ => Err(ClassFileError::ConstantKind {
                index,
                expected: "Utf8",
            }),
        }
    }

    /// A `Utf8` entry as a quoted Java string literal, exact to the code
    /// unit.
    pub fn quoted_utf8(&self, index: u16) -> ClassFileResult<String> {
        let text = self.utf8(index)?;
        Ok(match self.unpaired.get(&index) {
            Some(units) => quote_utf16(units.iter().copied()),
            None => quote(text),
        })
    }

    /// Internal name of a `Class` constant (e.g. `java/lang/String`).
    pub fn class_name(&self, index: u16) -> ClassFileResult<&str> {
        match self.get(index)? {
            Constant::Class { name_index } => self.utf8(*name_index),
            _ => Err(ClassFileError::ConstantKind {
                index,
                expected: "Class",
            }),
        }
    }

    pub fn name_and_type(&self, index: u16) -> ClassFileResult<(&str, &str)> {
        match self.get(index)? {
            Constant::NameAndType {
                name_index,
                descriptor_index,
            } => Ok((self.utf8(*name_index)?, self.utf8(*descriptor_index)?)),
            _ => Err(ClassFileError::ConstantKind {
                index,
                expected: "NameAndType",
            }),
        }
    }

    /// Resolve a `FieldRef`, `MethodRef` or `InterfaceMethodRef`.
    pub fn member_ref(&self, index: u16) -> ClassFileResult<MemberRef<'_>> {
        let (class_index, nat_index, interface) = match self.get(index)? {
            Constant::FieldRef {
                class_index,
                name_and_type_index,
            }
            | Constant::MethodRef {
                class_index,
                name_and_type_index,
            } => (*class_index, *name_and_type_index, false),
            Constant::InterfaceMethodRef {
                class_index,
                name_and_type_index,
            } => (*class_index, *name_and_type_index, true),
            _ => {
                return Err(ClassFileError::ConstantKind {
                    index,
                    expected: "member reference",
                })
            }
        };
        let (name, descriptor) = self.name_and_type(nat_index)?;
        Ok(MemberRef {
            owner: self.class_name(class_index)?,
            name,
            descriptor,
            interface,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool(bytes: &[u8]) -> ClassFileResult<ConstantPool> {
        ConstantPool::parse(&mut ByteReader::new(bytes))
    }

    #[test]
    fn parses_utf8_and_class() {
        // count = 3: #1 Utf8 "A", #2 Class #1
        let cp = pool(&[0, 3, 1, 0, 1, b'A', 7, 0, 1]).unwrap();
        assert_eq!(cp.len(), 3);
        assert_eq!(cp.utf8(1).unwrap(), "A");
        assert_eq!(cp.class_name(2).unwrap(), "A");
    }

    #[test]
    fn quotes_unpaired_surrogates_exactly() {
        // #1 Utf8 "\uD800", #2 Utf8 "\uD801", #3 Utf8 of the literal text `\ud800`
        let mut bytes = vec![0, 4];
        bytes.extend([1, 0, 3, 0xED, 0xA0, 0x80]);
        bytes.extend([1, 0, 3, 0xED, 0xA0, 0x81]);
        bytes.extend([1, 0, 6]);
        bytes.extend(b"\\ud800");
        let cp = pool(&bytes).unwrap();
        assert_eq!(cp.quoted_utf8(1).unwrap(), r#""\ud800""#);
        assert_eq!(cp.quoted_utf8(2).unwrap(), r#""\ud801""#);
        assert_eq!(cp.quoted_utf8(3).unwrap(), r#""\\ud800""#);
    }

    #[test]
    fn long_takes_two_slots() {
        // count = 4: #1 Long 7, #2 unusable, #3 Integer 9
        let cp = pool(&[0, 4, 5, 0, 0, 0, 0, 0, 0, 0, 7, 3, 0, 0, 0, 9]).unwrap();
        assert_eq!(cp.get(1).unwrap(), &Constant::Long(7));
        assert!(matches!(
            cp.get(2),
            Err(ClassFileError::BadConstantIndex { index: 2 })
        ));
        assert_eq!(cp.get(3).unwrap(), &Constant::Integer(9));
    }

    #[test]
    fn rejects_unknown_tag() {
        let err = pool(&[0, 2, 2, 0, 0]).unwrap_err();
        assert!(matches!(
            err,
            ClassFileError::UnknownConstantTag { index: 1, tag: 2 }
        ));
    }

    #[test]
    fn wrong_kind_is_an_error() {
        let cp = pool(&[0, 2, 3, 0, 0, 0, 1]).unwrap();
        assert!(matches!(
            cp.utf8(1),
            Err(ClassFileError::ConstantKind { index: 1, .. })
        ));
        assert!(matches!(
            cp.get(0),
            Err(ClassFileError::BadConstantIndex { index: 0 })
        ));
    }

    #[test]
    fn resolves_interface_method_ref() {
        // #1 Utf8 "java/util/List", #2 Class #1, #3 Utf8 "size", #4 Utf8 "()I",
        // #5 NameAndType #3 #4, #6 InterfaceMethodRef #2 #5
        let mut bytes = vec![0, 7];
        bytes.extend([1, 0, 14]);
        bytes.extend(b"java/util/List");
        bytes.extend([7, 0, 1]);
        bytes.extend([1, 0, 4]);
        bytes.extend(b"size");
        bytes.extend([1, 0, 3]);
        bytes.extend(b"()I");
        bytes.extend([12, 0, 3, 0, 4]);
        bytes.extend([11, 0, 2, 0, 5]);
        let cp = pool(&bytes).unwrap();
        let m = cp.member_ref(6).unwrap();
        assert_eq!(m.owner, "java/util/List");
        assert_eq!(m.name, "size");
        assert_eq!(m.descriptor, "()I");
        assert!(m.interface);
    }
}
