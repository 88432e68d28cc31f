//! `Code` attribute decoding: exception table, bytecode and the debug tables
//! nested inside it.

use crate::class::{find_attribute, parse_attributes, Attribute};
use crate::constant_pool::ConstantPool;
use crate::error::{ClassFileError, ClassFileResult};
use crate::opcodes::*;
use crate::reader::ByteReader;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExceptionHandler {
    pub start_pc: u16,
    pub end_pc: u16,
    pub handler_pc: u16,
    /// Constant pool index of the caught class; 0 for `finally`.
    pub catch_type: u16,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CodeAttribute {
    pub max_stack: u16,
    pub max_locals: u16,
    pub code: Vec<u8>,
    pub exception_table: Vec<ExceptionHandler>,
    pub attributes: Vec<Attribute>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LineNumber {
    pub start_pc: u16,
    pub line: u16,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LocalVariable {
    pub start_pc: u16,
    pub length: u16,
    pub name: String,
    pub descriptor: String,
    pub index: u16,
}

/// Decoded operand of a single instruction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Operand {
    None,
    /// `BIPUSH` / `SIPUSH` immediate.
    Int(i32),
    /// Local variable slot (`xLOAD`, `xSTORE`, `RET`).
    Local(u16),
    /// `LDC` family constant pool index.
    Constant(u16),
    /// Field or method reference (`GETFIELD`, `INVOKEVIRTUAL`, ...).
    Member(u16),
    /// `INVOKEDYNAMIC` call site.
    Dynamic(u16),
    /// Class constant (`NEW`, `CHECKCAST`, ...).
    Type(u16),
    /// Absolute branch target.
    Branch(u32),
    Iinc { index: u16, delta: i16 },
    NewArray(u8),
    MultiANewArray { index: u16, dimensions: u8 },
    TableSwitch { default: u32, low: i32, targets: Vec<u32> },
    LookupSwitch { default: u32, pairs: Vec<(i32, u32)> },
}

/// One decoded instruction. Short forms are folded into their general
/// opcode (`ALOAD_0` becomes `ALOAD` with `Local(0)`, `GOTO_W` becomes
/// `GOTO`, `LDC_W`/`LDC2_W` become `LDC`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Instruction {
    pub offset: u32,
    pub opcode: u8,
    pub operand: Operand,
}

impl Instruction {
    pub fn mnemonic(&self) -> &'static str {
        mnemonic(self.opcode).unwrap_or("???")
    }

    /// Every label this instruction can jump to.
    pub fn branch_targets(&self) -> Vec<u32> {
        match &self.operand {
            Operand::Branch(t) => vec![*t],
            Operand::TableSwitch {
                default, targets, ..
            } => std::iter::once(*default).chain(targets.iter().copied()).collect(),
            Operand::LookupSwitch { default, pairs } => std::iter::once(*default)
                .chain(pairs.iter().map(|(_, t)| *t))
                .collect(),
            _ => Vec::new(),
        }
    }
}

impl CodeAttribute {
    pub fn parse(attribute: &Attribute, cp: &ConstantPool) -> ClassFileResult<Self> {
        let mut r = ByteReader::with_base(&attribute.data, attribute.offset);
        let max_stack = r.u16()?;
        let max_locals = r.u16()?;
        let code_len = r.u32()? as usize;
        let code = r.bytes(code_len)?.to_vec();

        let handler_count = r.u16()?;
        let mut exception_table = Vec::with_capacity(handler_count as usize);
        for _ in 0..handler_count {
            exception_table.push(ExceptionHandler {
                start_pc: r.u16()?,
                end_pc: r.u16()?,
                handler_pc: r.u16()?,
                catch_type: r.u16()?,
            });
        }
        let attributes = parse_attributes(&mut r, cp)?;

        Ok(Self {
            max_stack,
            max_locals,
            code,
            exception_table,
            attributes,
        })
    }

    pub fn instructions(&self) -> ClassFileResult<Vec<Instruction>> {
        decode_instructions(&self.code)
    }

    /// Entries of every `LineNumberTable`, sorted by pc.
    pub fn line_numbers(&self) -> ClassFileResult<Vec<LineNumber>> {
        let mut lines = Vec::new();
        for attr in self.attributes.iter().filter(|a| a.name == "LineNumberTable") {
            let mut r = ByteReader::with_base(&attr.data, attr.offset);
            let count = r.u16()?;
            for _ in 0..count {
                lines.push(LineNumber {
                    start_pc: r.u16()?,
                    line: r.u16()?,
                });
            }
        }
        lines.sort_by_key(|l| l.start_pc);
        Ok(lines)
    }

    pub fn local_variables(&self, cp: &ConstantPool) -> ClassFileResult<Vec<LocalVariable>> {
        let mut vars = Vec::new();
        if let Some(attr) = find_attribute(&self.attributes, "LocalVariableTable") {
            let mut r = ByteReader::with_base(&attr.data, attr.offset);
            let count = r.u16()?;
            for _ in 0..count {
                let start_pc = r.u16()?;
                let length = r.u16()?;
                let name = cp.utf8(r.u16()?)?.to_string();
                let descriptor = cp.utf8(r.u16()?)?.to_string();
                let index = r.u16()?;
                vars.push(LocalVariable {
                    start_pc,
                    length,
                    name,
                    descriptor,
                    index,
                });
            }
        }
        Ok(vars)
    }
}

fn malformed(reason: impl Into<String>) -> ClassFileError {
    ClassFileError::MalformedAttribute {
        attribute: "Code",
        reason: reason.into(),
    }
}

fn target(code_len: usize, offset: u32, delta: i64) -> ClassFileResult<u32> {
    let t = offset as i64 + delta;
    if t < 0 || t > code_len as i64 {
        return Err(malformed(format!(
            "branch target {t} from offset {offset} outside code of length {code_len}"
        )));
    }
    Ok(t as u32)
}

/// Decode raw bytecode into instructions.
pub fn decode_instructions(code: &[u8]) -> ClassFileResult<Vec<Instruction>> {
    let mut r = ByteReader::new(code);
    let mut out = Vec::new();

    while !r.is_empty() {
        let offset = r.position() as u32;
        let raw = r.u8()?;
        let (opcode, operand) = match raw {
            BIPUSH => (raw, Operand::Int(r.i8()? as i32)),
            SIPUSH => (raw, Operand::Int(r.i16()? as i32)),
            LDC => (LDC, Operand::Constant(r.u8()? as u16)),
            LDC_W | LDC2_W => (LDC, Operand::Constant(r.u16()?)),
            ILOAD..=ALOAD | ISTORE..=ASTORE | RET => (raw, Operand::Local(r.u8()? as u16)),
            ILOAD_0..=ALOAD_3 => {
                let n = raw - ILOAD_0;
                (ILOAD + n / 4, Operand::Local((n % 4) as u16))
            }
            ISTORE_0..=ASTORE_3 => {
                let n = raw - ISTORE_0;
                (ISTORE + n / 4, Operand::Local((n % 4) as u16))
            }
            IINC => (
                raw,
                Operand::Iinc {
                    index: r.u8()? as u16,
                    delta: r.i8()? as i16,
                },
            ),
            IFEQ..=JSR | IFNULL | IFNONNULL => {
                let delta = r.i16()? as i64;
                (raw, Operand::Branch(target(code.len(), offset, delta)?))
            }
            GOTO_W | JSR_W => {
                let delta = r.i32()? as i64;
                let op = if raw == GOTO_W { GOTO } else { JSR };
                (op, Operand::Branch(target(code.len(), offset, delta)?))
            }
            TABLESWITCH | LOOKUPSWITCH => {
                let pad = (4 - (r.position() % 4)) % 4;
                r.skip(pad)?;
                let default = target(code.len(), offset, r.i32()? as i64)?;
                if raw == TABLESWITCH {
                    let low = r.i32()?;
                    let high = r.i32()?;
                    if high < low {
                        return Err(malformed(format!("tableswitch high {high} < low {low}")));
                    }
                    let count = (high as i64 - low as i64 + 1) as usize;
                    if count * 4 > r.remaining() {
                        return Err(malformed("tableswitch extends past end of code"));
                    }
                    let mut targets = Vec::with_capacity(count);
                    for _ in 0..count {
                        targets.push(target(code.len(), offset, r.i32()? as i64)?);
                    }
                    (
                        raw,
                        Operand::TableSwitch {
                            default,
                            low,
                            targets,
                        },
                    )
                } else {
                    let npairs = r.i32()?;
                    if npairs < 0 || npairs as usize * 8 > r.remaining() {
                        return Err(malformed(format!("lookupswitch with {npairs} pairs")));
                    }
                    let mut pairs = Vec::with_capacity(npairs as usize);
                    for _ in 0..npairs {
                        let key = r.i32()?;
                        pairs.push((key, target(code.len(), offset, r.i32()? as i64)?));
                    }
                    (raw, Operand::LookupSwitch { default, pairs })
                }
            }
            GETSTATIC..=PUTFIELD | INVOKEVIRTUAL..=INVOKESTATIC => (raw, Operand::Member(r.u16()?)),
            INVOKEINTERFACE => {
                let index = r.u16()?;
                r.skip(2)?;
                (raw, Operand::Member(index))
            }
            INVOKEDYNAMIC => {
                let index = r.u16()?;
                r.skip(2)?;
                (raw, Operand::Dynamic(index))
            }
            NEW | ANEWARRAY | CHECKCAST | INSTANCEOF => (raw, Operand::Type(r.u16()?)),
            NEWARRAY => (raw, Operand::NewArray(r.u8()?)),
            MULTIANEWARRAY => (
                raw,
                Operand::MultiANewArray {
                    index: r.u16()?,
                    dimensions: r.u8()?,
                },
            ),
            WIDE => {
                let inner = r.u8()?;
                match inner {
                    IINC => (
                        IINC,
                        Operand::Iinc {
                            index: r.u16()?,
                            delta: r.i16()?,
                        },
                    ),
                    ILOAD..=ALOAD | ISTORE..=ASTORE | RET => (inner, Operand::Local(r.u16()?)),
                    other => {
                        return Err(ClassFileError::UnknownOpcode {
                            offset: offset + 1,
                            opcode: other,
                        })
                    }
                }
            }
            other if mnemonic(other).is_some() => (other, Operand::None),
            other => {
                return Err(ClassFileError::UnknownOpcode {
                    offset,
                    opcode: other,
                })
            }
        };
        out.push(Instruction {
            offset,
            opcode,
            operand,
        });
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folds_short_forms() {
        // aload_0, istore_2, goto_w +0, return
        let code = [0x2A, 0x3D, 0xC8, 0, 0, 0, 0, 0xB1];
        let insns = decode_instructions(&code).unwrap();
        assert_eq!(insns.len(), 4);
        assert_eq!(insns[0].mnemonic(), "ALOAD");
        assert_eq!(insns[0].operand, Operand::Local(0));
        assert_eq!(insns[1].mnemonic(), "ISTORE");
        assert_eq!(insns[1].operand, Operand::Local(2));
        assert_eq!(insns[2].mnemonic(), "GOTO");
        assert_eq!(insns[2].operand, Operand::Branch(2));
        assert_eq!(insns[3].mnemonic(), "RETURN");
        assert_eq!(insns[3].offset, 7);
    }

    #[test]
    fn decodes_branch_and_iinc() {
        // 0: iload_1, 1: ifeq +6 -> 7, 4: iinc 1 -1, 7: return
        let code = [0x1B, 0x99, 0x00, 0x06, 0x84, 0x01, 0xFF, 0xB1];
        let insns = decode_instructions(&code).unwrap();
        assert_eq!(insns[1].operand, Operand::Branch(7));
        assert_eq!(insns[1].branch_targets(), vec![7]);
        assert_eq!(insns[2].operand, Operand::Iinc { index: 1, delta: -1 });
    }

    #[test]
    fn decodes_padded_tableswitch() {
        // 0: iload_0, 1: tableswitch (pad 2) default +23, low 0, high 1, +23, +24
        let mut code = vec![0x1A, 0xAA, 0, 0];
        for v in [23i32, 0, 1, 23, 24] {
            code.extend(v.to_be_bytes());
        }
        code.extend([0xB1, 0xB1]);
        let insns = decode_instructions(&code).unwrap();
        match &insns[1].operand {
            Operand::TableSwitch {
                default,
                low,
                targets,
            } => {
                assert_eq!(*default, 24);
                assert_eq!(*low, 0);
                assert_eq!(targets, &vec![24, 25]);
            }
            other => panic!("expected TableSwitch, got {other:?}"),
        }
        assert_eq!(insns[2].offset, 24);
    }

    #[test]
    fn decodes_wide_forms() {
        let code = [0xC4, 0x19, 0x01, 0x00, 0xC4, 0x84, 0x01, 0x00, 0x03, 0xE8];
        let insns = decode_instructions(&code).unwrap();
        assert_eq!(insns[0].mnemonic(), "ALOAD");
        assert_eq!(insns[0].operand, Operand::Local(256));
        assert_eq!(insns[1].operand, Operand::Iinc { index: 256, delta: 1000 });
    }

    #[test]
    fn rejects_unknown_opcode_and_bad_target() {
        assert!(matches!(
            decode_instructions(&[0x00, 0xFE]),
            Err(ClassFileError::UnknownOpcode { offset: 1, opcode: 0xFE })
        ));
        assert!(matches!(
            decode_instructions(&[0xA7, 0x7F, 0x00]),
            Err(ClassFileError::MalformedAttribute { .. })
        ));
    }

    #[test]
    fn truncated_operand_is_eof() {
        assert!(matches!(
            decode_instructions(&[0x11, 0x01]),
            Err(ClassFileError::UnexpectedEof { .. })
        ));
    }
}
