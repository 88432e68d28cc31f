//! Textual disassembly of a class file.
//!
//! The listing follows the layout of ASM's `Textifier`: header comments, a
//! declaration line, then one block per field and method. Output is fully
//! determined by the class bytes and the [`DisassemblyOptions`].

use std::collections::{BTreeMap, BTreeSet};

use crate::annotations::{render_annotations, render_element_value, render_parameter_annotations};
use crate::class::{Attribute, ClassFile, MemberInfo};
use crate::code::{CodeAttribute, Instruction, Operand};
use crate::constant_pool::{Constant, ConstantPool};
use crate::error::{ClassFileError, ClassFileResult};
use crate::opcodes::{array_type_name, handle_kind_name, GETSTATIC, PUTFIELD};
use crate::reader::ByteReader;
use crate::text::{
    modifiers, render_double, render_float, CLASS_MODIFIERS, FIELD_MODIFIERS,
    METHOD_MODIFIERS, PARAMETER_MODIFIERS,
};

const ACC_INTERFACE: u16 = 0x0200;
const ACC_SYNTHETIC: u16 = 0x1000;
const ACC_ANNOTATION: u16 = 0x2000;
const ACC_ENUM: u16 = 0x4000;
const ACC_MODULE: u16 = 0x8000;

/// Nesting limit for `Dynamic` constants whose bootstrap arguments are
/// themselves `Dynamic` constants.
const MAX_CONSTANT_DEPTH: usize = 8;

/// What to include in a disassembly.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DisassemblyOptions {
    /// Source file, line numbers and local variable tables.
    pub include_debug_info: bool,
    /// Everything below a member's declaration line: instructions and
    /// stack/locals sizes, plus member annotations, parameters, annotation
    /// defaults and other member attributes.
    pub include_method_bodies: bool,
}

/// Parse `bytes` as a class file and render it as text.
pub fn disassemble(bytes: &[u8], options: &DisassemblyOptions) -> ClassFileResult<String> {
    let class = ClassFile::parse(bytes)?;
    Textifier::new(&class, *options)?.render()
}

struct BootstrapMethod {
    handle_index: u16,
    arguments: Vec<u16>,
}

struct Textifier<'a> {
    class: &'a ClassFile,
    cp: &'a ConstantPool,
    options: DisassemblyOptions,
    bootstrap: Vec<BootstrapMethod>,
    lines: Vec<String>,
}

fn reader(attr: &Attribute) -> ByteReader<'_> {
    ByteReader::with_base(&attr.data, attr.offset)
}

fn has(attributes: &[Attribute], name: &str) -> bool {
    attributes.iter().any(|a| a.name == name)
}

fn unknown_attribute(indent: &str, attr: &Attribute) -> String {
    format!(
        "{indent}ATTRIBUTE {} : {} bytes {}",
        attr.name,
        attr.data.len(),
        hex::encode(&attr.data)
    )
}

impl<'a> Textifier<'a> {
    fn new(class: &'a ClassFile, options: DisassemblyOptions) -> ClassFileResult<Self> {
        let mut bootstrap = Vec::new();
        if let Some(attr) = class.attribute("BootstrapMethods") {
            let mut r = reader(attr);
            let count = r.u16()?;
            for _ in 0..count {
                let handle_index = r.u16()?;
                let argc = r.u16()?;
                let arguments = (0..argc).map(|_| r.u16()).collect::<ClassFileResult<_>>()?;
                bootstrap.push(BootstrapMethod {
                    handle_index,
                    arguments,
                });
            }
        }
        Ok(Self {
            class,
            cp: &class.constant_pool,
            options,
            bootstrap,
            lines: Vec::new(),
        })
    }

    fn line(&mut self, text: impl Into<String>) {
        self.lines.push(text.into());
    }

    fn render(mut self) -> ClassFileResult<String> {
        let class = self.class;
        self.header()?;
        self.class_attributes()?;
        for field in &class.fields {
            self.field(field)?;
        }
        for method in &class.methods {
            self.method(method)?;
        }
        self.line("}");

        let mut text = self.lines.join("\n");
        text.push('\n');
        Ok(text)
    }

    fn signature(&self, attributes: &[Attribute]) -> ClassFileResult<Option<&'a str>> {
        match attributes.iter().find(|a| a.name == "Signature") {
            Some(attr) => Ok(Some(self.cp.utf8(reader(attr).u16()?)?)),
            None => Ok(None),
        }
    }

    /// Access flags with the `Synthetic` attribute folded in.
    fn effective_flags(flags: u16, attributes: &[Attribute]) -> u16 {
        if has(attributes, "Synthetic") {
            flags | ACC_SYNTHETIC
        } else {
            flags
        }
    }

    fn header(&mut self) -> ClassFileResult<()> {
        let class = self.class;
        self.line(format!(
            "// class version {}.{} ({})",
            class.major_version, class.minor_version, class.major_version
        ));
        let flags = Self::effective_flags(class.access_flags, &class.attributes);
        self.line(format!("// access flags {flags:#x}"));
        if has(&class.attributes, "Deprecated") {
            self.line("// @deprecated");
        }
        if let Some(sig) = self.signature(&class.attributes)? {
            self.line(format!("// signature {sig}"));
        }

        let kind = if flags & ACC_ANNOTATION != 0 {
            "@interface "
        } else if flags & ACC_INTERFACE != 0 {
            "interface "
        } else if flags & ACC_MODULE != 0 {
            "module "
        } else if flags & ACC_ENUM != 0 {
            ""
        } else {
            "class "
        };
        let mut decl = format!(
            "{}{kind}{}",
            modifiers(flags, CLASS_MODIFIERS),
            class.this_class
        );
        if let Some(sup) = class.super_class.as_deref().filter(|s| *s != "java/lang/Object") {
            decl.push_str(&format!(" extends {sup}"));
        }
        if !class.interfaces.is_empty() {
            decl.push_str(&format!(" implements {}", class.interfaces.join(" ")));
        }
        decl.push_str(" {");
        self.line(decl);
        self.line("");
        Ok(())
    }

    fn class_attributes(&mut self) -> ClassFileResult<()> {
        let cp = self.cp;
        let class = self.class;
        for attr in &class.attributes {
            match attr.name.as_str() {
                "SourceFile" => {
                    if self.options.include_debug_info {
                        let file = cp.utf8(reader(attr).u16()?)?;
                        self.line(format!("  // compiled from: {file}"));
                    }
                }
                "SourceDebugExtension" => {
                    if self.options.include_debug_info {
                        let text = String::from_utf8_lossy(&attr.data);
                        self.line(format!("  // debug info: {}", text.replace('\n', " ")));
                    }
                }
                "Signature" | "Deprecated" | "Synthetic" | "BootstrapMethods" => {}
                "InnerClasses" => {
                    let mut r = reader(attr);
                    let count = r.u16()?;
                    for _ in 0..count {
                        let inner = cp.class_name(r.u16()?)?;
                        let outer = match r.u16()? {
                            0 => "null",
                            i => cp.class_name(i)?,
                        };
                        let name = match r.u16()? {
                            0 => "null",
                            i => cp.utf8(i)?,
                        };
                        let flags = r.u16()?;
                        self.line(format!("  // access flags {flags:#x}"));
                        self.line(format!(
                            "  {}INNERCLASS {inner} {outer} {name}",
                            modifiers(flags, CLASS_MODIFIERS)
                        ));
                    }
                }
                "EnclosingMethod" => {
                    let mut r = reader(attr);
                    let owner = cp.class_name(r.u16()?)?;
                    match r.u16()? {
                        0 => self.line(format!("  OUTERCLASS {owner}")),
                        i => {
                            let (name, desc) = cp.name_and_type(i)?;
                            self.line(format!("  OUTERCLASS {owner} {name}{desc}"));
                        }
                    }
                }
                "NestHost" => {
                    let host = cp.class_name(reader(attr).u16()?)?;
                    self.line(format!("  NESTHOST {host}"));
                }
                "NestMembers" | "PermittedSubclasses" => {
                    let keyword = if attr.name == "NestMembers" {
                        "NESTMEMBER"
                    } else {
                        "PERMITTEDSUBCLASS"
                    };
                    let mut r = reader(attr);
                    let count = r.u16()?;
                    for _ in 0..count {
                        let name = cp.class_name(r.u16()?)?;
                        self.line(format!("  {keyword} {name}"));
                    }
                }
                "Record" => {
                    let mut r = reader(attr);
                    let count = r.u16()?;
                    for _ in 0..count {
                        let name = cp.utf8(r.u16()?)?;
                        let desc = cp.utf8(r.u16()?)?;
                        crate::class::parse_attributes(&mut r, cp)?;
                        self.line(format!("  RECORDCOMPONENT {desc} {name}"));
                    }
                }
                "RuntimeVisibleAnnotations" | "RuntimeInvisibleAnnotations" => {
                    self.annotations("  ", attr)?;
                }
                _ => self.line(unknown_attribute("  ", attr)),
            }
        }
        Ok(())
    }

    fn annotations(&mut self, indent: &str, attr: &Attribute) -> ClassFileResult<()> {
        let suffix = if attr.name.starts_with("RuntimeInvisible") {
            " // invisible"
        } else {
            ""
        };
        for annotation in render_annotations(&mut reader(attr), self.cp)? {
            self.line(format!("{indent}{annotation}{suffix}"));
        }
        Ok(())
    }

    fn member_preamble(&mut self, member: &MemberInfo, flags: u16) -> ClassFileResult<()> {
        self.line("");
        if has(&member.attributes, "Deprecated") {
            self.line("  // @deprecated");
        }
        self.line(format!("  // access flags {flags:#x}"));
        if let Some(sig) = self.signature(&member.attributes)? {
            self.line(format!("  // signature {sig}"));
        }
        Ok(())
    }

    fn field(&mut self, field: &MemberInfo) -> ClassFileResult<()> {
        let flags = Self::effective_flags(field.access_flags, &field.attributes);
        self.member_preamble(field, flags)?;

        let mut decl = format!(
            "  {}{} {}",
            modifiers(flags, FIELD_MODIFIERS),
            field.descriptor,
            field.name
        );
        if let Some(attr) = field.attribute("ConstantValue") {
            let value = self.loadable(reader(attr).u16()?, 0)?;
            decl.push_str(&format!(" = {value}"));
        }
        self.line(decl);
        if !self.options.include_method_bodies {
            return Ok(());
        }

        for attr in &field.attributes {
            match attr.name.as_str() {
                "ConstantValue" | "Signature" | "Deprecated" | "Synthetic" => {}
                "RuntimeVisibleAnnotations" | "RuntimeInvisibleAnnotations" => {
                    self.annotations("  ", attr)?;
                }
                _ => self.line(unknown_attribute("  ", attr)),
            }
        }
        Ok(())
    }

    fn method(&mut self, method: &MemberInfo) -> ClassFileResult<()> {
        let cp = self.cp;
        let flags = Self::effective_flags(method.access_flags, &method.attributes);
        self.member_preamble(method, flags)?;

        let mut decl = format!(
            "  {}{}{}",
            modifiers(flags, METHOD_MODIFIERS),
            method.name,
            method.descriptor
        );
        if let Some(attr) = method.attribute("Exceptions") {
            let mut r = reader(attr);
            let count = r.u16()?;
            let names = (0..count)
                .map(|_| r.u16().and_then(|i| cp.class_name(i)))
                .collect::<ClassFileResult<Vec<_>>>()?;
            if !names.is_empty() {
                decl.push_str(&format!(" throws {}", names.join(" ")));
            }
        }
        self.line(decl);
        if !self.options.include_method_bodies {
            return Ok(());
        }

        for attr in &method.attributes {
            match attr.name.as_str() {
                "Exceptions" | "Signature" | "Deprecated" | "Synthetic" => {}
                "MethodParameters" => {
                    let mut r = reader(attr);
                    let count = r.u8()?;
                    for _ in 0..count {
                        let name = match r.u16()? {
                            0 => "<no name>",
                            i => cp.utf8(i)?,
                        };
                        let flags = r.u16()?;
                        self.line(format!(
                            "    // parameter {}{name}",
                            modifiers(flags, PARAMETER_MODIFIERS)
                        ));
                    }
                }
                "AnnotationDefault" => {
                    let value = render_element_value(&mut reader(attr), cp)?;
                    self.line(format!("    default={value}"));
                }
                "RuntimeVisibleAnnotations" | "RuntimeInvisibleAnnotations" => {
                    self.annotations("    ", attr)?;
                }
                "RuntimeVisibleParameterAnnotations" | "RuntimeInvisibleParameterAnnotations" => {
                    let invisible = attr.name.starts_with("RuntimeInvisible");
                    for (parameter, annotation) in
                        render_parameter_annotations(&mut reader(attr), cp)?
                    {
                        let note = if invisible {
                            format!("invisible, parameter {parameter}")
                        } else {
                            format!("parameter {parameter}")
                        };
                        self.line(format!("    {annotation} // {note}"));
                    }
                }
                "Code" => self.code(attr)?,
                _ => self.line(unknown_attribute("    ", attr)),
            }
        }
        Ok(())
    }

    fn code(&mut self, attr: &Attribute) -> ClassFileResult<()> {
        let cp = self.cp;
        let code = CodeAttribute::parse(attr, cp)?;
        let instructions = code.instructions()?;
        let debug = self.options.include_debug_info;
        let line_numbers = if debug { code.line_numbers()? } else { Vec::new() };
        let locals = if debug {
            code.local_variables(cp)?
        } else {
            Vec::new()
        };

        let mut offsets: BTreeSet<u32> = BTreeSet::new();
        for insn in &instructions {
            offsets.extend(insn.branch_targets());
        }
        for h in &code.exception_table {
            offsets.extend([h.start_pc as u32, h.end_pc as u32, h.handler_pc as u32]);
        }
        offsets.extend(line_numbers.iter().map(|l| l.start_pc as u32));
        for v in &locals {
            offsets.extend([v.start_pc as u32, v.start_pc as u32 + v.length as u32]);
        }
        let labels: BTreeMap<u32, usize> = offsets
            .into_iter()
            .enumerate()
            .map(|(i, off)| (off, i))
            .collect();
        let label = |off: u32| format!("L{}", labels[&off]);

        for h in &code.exception_table {
            let caught = match h.catch_type {
                0 => "null",
                i => cp.class_name(i)?,
            };
            self.line(format!(
                "    TRYCATCHBLOCK {} {} {} {caught}",
                label(h.start_pc as u32),
                label(h.end_pc as u32),
                label(h.handler_pc as u32)
            ));
        }

        let mut printed: BTreeSet<u32> = BTreeSet::new();
        for insn in &instructions {
            if labels.contains_key(&insn.offset) {
                printed.insert(insn.offset);
                self.line(format!("   {}", label(insn.offset)));
                for ln in line_numbers.iter().filter(|l| l.start_pc as u32 == insn.offset) {
                    self.line(format!("    LINENUMBER {} {}", ln.line, label(insn.offset)));
                }
            }
            let rendered = self.instruction(insn, &label)?;
            self.lines.extend(rendered);
        }
        // Labels that do not start an instruction, e.g. the end of the code.
        for off in labels.keys().filter(|off| !printed.contains(off)).copied().collect::<Vec<_>>() {
            self.line(format!("   {}", label(off)));
        }

        for v in &locals {
            self.line(format!(
                "    LOCALVARIABLE {} {} {} {} {}",
                v.name,
                v.descriptor,
                label(v.start_pc as u32),
                label(v.start_pc as u32 + v.length as u32),
                v.index
            ));
        }
        self.line(format!("    MAXSTACK = {}", code.max_stack));
        self.line(format!("    MAXLOCALS = {}", code.max_locals));
        Ok(())
    }

    fn instruction(
        &self,
        insn: &Instruction,
        label: &dyn Fn(u32) -> String,
    ) -> ClassFileResult<Vec<String>> {
        let cp = self.cp;
        let op = insn.mnemonic();
        let single =
            |text: String| -> ClassFileResult<Vec<String>> { Ok(vec![format!("    {text}")]) };
        match &insn.operand {
            Operand::None => single(op.to_string()),
            Operand::Int(v) => single(format!("{op} {v}")),
            Operand::Local(i) => single(format!("{op} {i}")),
            Operand::Constant(i) => single(format!("{op} {}", self.loadable(*i, 0)?)),
            Operand::Member(i) => {
                let m = cp.member_ref(*i)?;
                if (GETSTATIC..=PUTFIELD).contains(&insn.opcode) {
                    single(format!("{op} {}.{} : {}", m.owner, m.name, m.descriptor))
                } else {
                    let itf = if m.interface { " (itf)" } else { "" };
                    single(format!("{op} {}.{} {}{itf}", m.owner, m.name, m.descriptor))
                }
            }
            Operand::Dynamic(i) => match cp.get(*i)? {
                Constant::InvokeDynamic {
                    bootstrap_index,
                    name_and_type_index,
                } => {
                    let (name, desc) = cp.name_and_type(*name_and_type_index)?;
                    let bsm = self.bootstrap(*bootstrap_index, 0)?;
                    single(format!("{op} {name}{desc} [{bsm}]"))
                }
                _ => Err(ClassFileError::ConstantKind {
                    index: *i,
                    expected: "InvokeDynamic",
                }),
            },
            Operand::Type(i) => single(format!("{op} {}", cp.class_name(*i)?)),
            Operand::Branch(t) => single(format!("{op} {}", label(*t))),
            Operand::Iinc { index, delta } => single(format!("{op} {index} {delta}")),
            Operand::NewArray(code) => {
                let name = array_type_name(*code).ok_or_else(|| ClassFileError::MalformedAttribute {
                    attribute: "Code",
                    reason: format!("unknown newarray type {code}"),
                })?;
                single(format!("{op} {name}"))
            }
            Operand::MultiANewArray { index, dimensions } => {
                single(format!("{op} {} {dimensions}", cp.class_name(*index)?))
            }
            Operand::TableSwitch {
                default,
                low,
                targets,
            } => {
                let mut out = vec![format!("    {op}")];
                for (i, t) in targets.iter().enumerate() {
                    out.push(format!("      {}: {}", *low as i64 + i as i64, label(*t)));
                }
                out.push(format!("      default: {}", label(*default)));
                Ok(out)
            }
            Operand::LookupSwitch { default, pairs } => {
                let mut out = vec![format!("    {op}")];
                for (key, t) in pairs {
                    out.push(format!("      {key}: {}", label(*t)));
                }
                out.push(format!("      default: {}", label(*default)));
                Ok(out)
            }
        }
    }

    /// Render a loadable constant (`LDC` operand, `ConstantValue`,
    /// bootstrap argument).
    fn loadable(&self, index: u16, depth: usize) -> ClassFileResult<String> {
        if depth > MAX_CONSTANT_DEPTH {
            return Err(ClassFileError::ConstantTooDeep { index });
        }
        let cp = self.cp;
        Ok(match cp.get(index)? {
            Constant::Integer(v) => v.to_string(),
            Constant::Float(v) => render_float(*v),
            Constant::Long(v) => format!("{v}L"),
            Constant::Double(v) => render_double(*v),
            Constant::String { string_index } => cp.quoted_utf8(*string_index)?,
            Constant::Class { name_index } => {
                let name = cp.utf8(*name_index)?;
                if name.starts_with('[') {
                    format!("{name}.class")
                } else {
                    format!("L{name};.class")
                }
            }
            Constant::MethodType { descriptor_index } => cp.utf8(*descriptor_index)?.to_string(),
            Constant::MethodHandle {
                reference_kind,
                reference_index,
            } => self.handle(*reference_kind, *reference_index)?,
            Constant::Dynamic {
                bootstrap_index,
                name_and_type_index,
            } => {
                let (name, desc) = cp.name_and_type(*name_and_type_index)?;
                let bsm = self.bootstrap(*bootstrap_index, depth + 1)?;
                format!("{name} : {desc} [{bsm}]")
            }
            _ => {
                return Err(ClassFileError::ConstantKind {
                    index,
                    expected: "loadable constant",
                })
            }
        })
    }

    fn handle(&self, kind: u8, reference_index: u16) -> ClassFileResult<String> {
        let m = self.cp.member_ref(reference_index)?;
        let itf = if m.interface { " itf" } else { "" };
        Ok(format!(
            "{}.{}{} ({}{itf})",
            m.owner,
            m.name,
            m.descriptor,
            handle_kind_name(kind)
        ))
    }

    fn bootstrap(&self, index: u16, depth: usize) -> ClassFileResult<String> {
        let bsm = self
            .bootstrap
            .get(index as usize)
            .ok_or(ClassFileError::MissingBootstrapMethod { index })?;
        let handle = match self.cp.get(bsm.handle_index)? {
            Constant::MethodHandle {
                reference_kind,
                reference_index,
            } => self.handle(*reference_kind, *reference_index)?,
            _ => {
                return Err(ClassFileError::ConstantKind {
                    index: bsm.handle_index,
                    expected: "MethodHandle",
                })
            }
        };
        let mut parts = vec![handle];
        for arg in &bsm.arguments {
            parts.push(self.loadable(*arg, depth)?);
        }
        Ok(parts.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{ClassBuilder, Code};

    const BODIES: DisassemblyOptions = DisassemblyOptions {
        include_debug_info: false,
        include_method_bodies: true,
    };
    const EVERYTHING: DisassemblyOptions = DisassemblyOptions {
        include_debug_info: true,
        include_method_bodies: true,
    };

    fn lines(text: &str) -> Vec<&str> {
        text.lines().collect()
    }

    #[test]
    fn renders_empty_class() {
        let bytes = ClassBuilder::new("a/B").build();
        let text = disassemble(&bytes, &DisassemblyOptions::default()).unwrap();
        assert_eq!(
            text,
            "// class version 52.0 (52)\n// access flags 0x21\npublic class a/B {\n\n}\n"
        );
    }

    #[test]
    fn renders_interfaces_and_fields() {
        let mut b = ClassBuilder::new("a/B");
        b.super_class("a/Base")
            .interface("groovy/lang/GroovyObject")
            .field(0x1082, "metaClass", "Lgroovy/lang/MetaClass;");
        let text = disassemble(&b.build(), &DisassemblyOptions::default()).unwrap();
        let lines = lines(&text);
        assert!(lines.contains(&"public class a/B extends a/Base implements groovy/lang/GroovyObject {"));
        assert!(lines.contains(&"  // access flags 0x1082"));
        assert!(lines.contains(&"  private transient synthetic Lgroovy/lang/MetaClass; metaClass"));
    }

    #[test]
    fn method_bodies_are_optional() {
        let mut b = ClassBuilder::new("a/B");
        let [hi, lo] = b.method_ref("a/B", "foo", "()V").to_be_bytes();
        b.method(0x0001, "run", "()V", Some(Code::new(1, 1, [0x2A, 0xB6, hi, lo, 0xB1])));
        let bytes = b.build();

        let signature_only = disassemble(&bytes, &DisassemblyOptions::default()).unwrap();
        assert!(lines(&signature_only).contains(&"  public run()V"));
        assert!(!signature_only.contains("ALOAD"));

        let text = disassemble(&bytes, &BODIES).unwrap();
        let lines = lines(&text);
        let start = lines.iter().position(|l| *l == "  public run()V").unwrap();
        assert_eq!(
            &lines[start + 1..start + 6],
            &[
                "    ALOAD 0",
                "    INVOKEVIRTUAL a/B.foo ()V",
                "    RETURN",
                "    MAXSTACK = 1",
                "    MAXLOCALS = 1",
            ]
        );
    }

    #[test]
    fn member_attributes_follow_method_bodies() {
        let mut b = ClassBuilder::new("a/B");
        let [hi, lo] = b.utf8("La/Marker;").to_be_bytes();
        let marker = [0, 1, hi, lo, 0, 0];
        b.field_with(0x0002, "x", "I", &[("RuntimeInvisibleAnnotations", &marker[..])])
            .method_with(0x0001, "run", "()V", &[("RuntimeVisibleAnnotations", &marker[..])]);
        let bytes = b.build();

        let signature_only = disassemble(&bytes, &DisassemblyOptions::default()).unwrap();
        assert!(lines(&signature_only).contains(&"  private I x"));
        assert!(lines(&signature_only).contains(&"  public run()V"));
        assert!(!signature_only.contains("La/Marker;"));

        let text = disassemble(&bytes, &BODIES).unwrap();
        let lines = lines(&text);
        assert!(lines.contains(&"  @La/Marker;() // invisible"));
        assert!(lines.contains(&"    @La/Marker;()"));
    }

    #[test]
    fn debug_info_is_optional() {
        let mut b = ClassBuilder::new("a/B");
        b.source_file("B.java").method(
            0x0001,
            "run",
            "()V",
            Some(Code::new(0, 1, [0xB1]).line(0, 7).local(0, 1, "this", "La/B;", 0)),
        );
        let bytes = b.build();

        let bare = disassemble(&bytes, &BODIES).unwrap();
        assert!(!bare.contains("compiled from"));
        assert!(!bare.contains("LINENUMBER"));
        assert!(!bare.contains("LOCALVARIABLE"));
        assert!(!bare.contains("   L0"));

        let text = disassemble(&bytes, &EVERYTHING).unwrap();
        let lines = lines(&text);
        assert!(lines.contains(&"  // compiled from: B.java"));
        let start = lines.iter().position(|l| *l == "  public run()V").unwrap();
        assert_eq!(
            &lines[start + 1..start + 8],
            &[
                "   L0",
                "    LINENUMBER 7 L0",
                "    RETURN",
                "   L1",
                "    LOCALVARIABLE this La/B; L0 L1 0",
                "    MAXSTACK = 0",
                "    MAXLOCALS = 1",
            ]
        );
    }

    #[test]
    fn branches_get_labels() {
        let mut b = ClassBuilder::new("a/B");
        // 0: iload_1, 1: ifeq -> 5, 4: return, 5: return
        b.method(0x0009, "f", "(I)V", Some(Code::new(1, 2, [0x1B, 0x99, 0, 4, 0xB1, 0xB1])));
        let text = disassemble(&b.build(), &BODIES).unwrap();
        let lines = lines(&text);
        let start = lines.iter().position(|l| *l == "  public static f(I)V").unwrap();
        assert_eq!(
            &lines[start + 1..start + 6],
            &["    ILOAD 1", "    IFEQ L0", "    RETURN", "   L0", "    RETURN"]
        );
    }

    #[test]
    fn renders_string_constants_and_annotations() {
        let mut b = ClassBuilder::new("a/B");
        let s = b.string("hi");
        b.annotation("Lkotlin/Metadata;", true)
            .annotation("La/Internal;", false)
            .method(0x0001, "s", "()Ljava/lang/String;", Some(Code::new(1, 1, [0x12, s as u8, 0xB0])));
        let text = disassemble(&b.build(), &BODIES).unwrap();
        let lines = lines(&text);
        assert!(lines.contains(&"  @Lkotlin/Metadata;()"));
        assert!(lines.contains(&"  @La/Internal;() // invisible"));
        assert!(lines.contains(&"    LDC \"hi\""));
        assert!(lines.contains(&"    ARETURN"));
    }

    #[test]
    fn lone_surrogate_strings_render_exactly() {
        let render = |encoded: &[u8]| {
            let mut b = ClassBuilder::new("a/B");
            let s = b.raw_string(encoded);
            b.method(0x0001, "s", "()Ljava/lang/String;", Some(Code::new(1, 1, [0x12, s as u8, 0xB0])));
            disassemble(&b.build(), &BODIES).unwrap()
        };
        let high = render(&[0xED, 0xA0, 0x80]);
        let next = render(&[0xED, 0xA0, 0x81]);
        assert!(lines(&high).contains(&"    LDC \"\\ud800\""));
        assert!(lines(&next).contains(&"    LDC \"\\ud801\""));
        assert_ne!(high, next);
    }

    #[test]
    fn unknown_attributes_are_dumped_as_hex() {
        let mut b = ClassBuilder::new("a/B");
        b.attribute("Custom", &[0xCA, 0xFE]);
        let text = disassemble(&b.build(), &DisassemblyOptions::default()).unwrap();
        assert!(lines(&text).contains(&"  ATTRIBUTE Custom : 2 bytes cafe"));
    }

    #[test]
    fn output_is_deterministic() {
        let mut b = ClassBuilder::new("a/B");
        b.field(0x0001, "x", "I").method(0x0001, "run", "()V", Some(Code::new(0, 1, [0xB1])));
        let bytes = b.build();
        assert_eq!(
            disassemble(&bytes, &EVERYTHING).unwrap(),
            disassemble(&bytes, &EVERYTHING).unwrap()
        );
    }

    #[test]
    fn rejects_non_class_bytes() {
        assert!(matches!(
            disassemble(b"not a class", &DisassemblyOptions::default()),
            Err(ClassFileError::InvalidMagic { .. })
        ));
    }
}
