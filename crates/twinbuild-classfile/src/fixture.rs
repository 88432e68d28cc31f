//! Assembles small class files for tests.
//!
//! Only the structures the textifier reads are supported. Constant pool
//! entries are interned, so asking twice for the same constant yields the
//! same index.

use std::collections::HashMap;

use crate::class::CLASS_MAGIC;

/// A `Code` attribute to attach to a method.
#[derive(Clone, Debug, Default)]
pub struct Code {
    pub max_stack: u16,
    pub max_locals: u16,
    pub bytes: Vec<u8>,
    /// `(start_pc, line)` pairs.
    pub line_numbers: Vec<(u16, u16)>,
    pub local_variables: Vec<LocalVar>,
}

#[derive(Clone, Debug)]
pub struct LocalVar {
    pub start_pc: u16,
    pub length: u16,
    pub name: String,
    pub descriptor: String,
    pub slot: u16,
}

impl Code {
    pub fn new(max_stack: u16, max_locals: u16, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            max_stack,
            max_locals,
            bytes: bytes.into(),
            ..Self::default()
        }
    }

    pub fn line(mut self, start_pc: u16, line: u16) -> Self {
        self.line_numbers.push((start_pc, line));
        self
    }

    pub fn local(mut self, start_pc: u16, length: u16, name: &str, descriptor: &str, slot: u16) -> Self {
        self.local_variables.push(LocalVar {
            start_pc,
            length,
            name: name.to_string(),
            descriptor: descriptor.to_string(),
            slot,
        });
        self
    }
}

/// Builds a class file byte by byte.
#[derive(Clone, Debug)]
pub struct ClassBuilder {
    pool: Vec<u8>,
    interned: HashMap<Vec<u8>, u16>,
    next_index: u16,
    major_version: u16,
    access_flags: u16,
    this_class: u16,
    super_class: u16,
    interfaces: Vec<u16>,
    fields: Vec<Vec<u8>>,
    methods: Vec<Vec<u8>>,
    attributes: Vec<Vec<u8>>,
}

impl ClassBuilder {
    /// A public class `name` extending `java/lang/Object`, version 52.
    pub fn new(name: &str) -> Self {
        let mut builder = Self {
            pool: Vec::new(),
            interned: HashMap::new(),
            next_index: 1,
            major_version: 52,
            access_flags: 0x0021,
            this_class: 0,
            super_class: 0,
            interfaces: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            attributes: Vec::new(),
        };
        builder.this_class = builder.class(name);
        builder.super_class = builder.class("java/lang/Object");
        builder
    }

    fn intern(&mut self, entry: Vec<u8>) -> u16 {
        if let Some(index) = self.interned.get(&entry) {
            return *index;
        }
        let index = self.next_index;
        self.next_index += 1;
        self.pool.extend(&entry);
        self.interned.insert(entry, index);
        index
    }

    pub fn utf8(&mut self, value: &str) -> u16 {
        self.raw_utf8(value.as_bytes())
    }

    /// A `Utf8` entry from already encoded modified UTF-8, for strings a
    /// Rust `&str` cannot hold.
    pub fn raw_utf8(&mut self, encoded: &[u8]) -> u16 {
        let mut entry = vec![1];
        entry.extend((encoded.len() as u16).to_be_bytes());
        entry.extend(encoded);
        self.intern(entry)
    }

    pub fn class(&mut self, name: &str) -> u16 {
        let name_index = self.utf8(name);
        self.intern(tagged(7, &[name_index]))
    }

    pub fn string(&mut self, value: &str) -> u16 {
        self.raw_string(value.as_bytes())
    }

    pub fn raw_string(&mut self, encoded: &[u8]) -> u16 {
        let utf8 = self.raw_utf8(encoded);
        self.intern(tagged(8, &[utf8]))
    }

    pub fn integer(&mut self, value: i32) -> u16 {
        let mut entry = vec![3];
        entry.extend(value.to_be_bytes());
        self.intern(entry)
    }

    pub fn name_and_type(&mut self, name: &str, descriptor: &str) -> u16 {
        let name = self.utf8(name);
        let descriptor = self.utf8(descriptor);
        self.intern(tagged(12, &[name, descriptor]))
    }

    pub fn field_ref(&mut self, owner: &str, name: &str, descriptor: &str) -> u16 {
        let owner = self.class(owner);
        let nat = self.name_and_type(name, descriptor);
        self.intern(tagged(9, &[owner, nat]))
    }

    pub fn method_ref(&mut self, owner: &str, name: &str, descriptor: &str) -> u16 {
        let owner = self.class(owner);
        let nat = self.name_and_type(name, descriptor);
        self.intern(tagged(10, &[owner, nat]))
    }

    pub fn version(&mut self, major: u16) -> &mut Self {
        self.major_version = major;
        self
    }

    pub fn access(&mut self, flags: u16) -> &mut Self {
        self.access_flags = flags;
        self
    }

    pub fn super_class(&mut self, name: &str) -> &mut Self {
        self.super_class = self.class(name);
        self
    }

    pub fn interface(&mut self, name: &str) -> &mut Self {
        let index = self.class(name);
        self.interfaces.push(index);
        self
    }

    pub fn field(&mut self, access: u16, name: &str, descriptor: &str) -> &mut Self {
        let member = self.member(access, name, descriptor, Vec::new());
        self.fields.push(member);
        self
    }

    pub fn method(
        &mut self,
        access: u16,
        name: &str,
        descriptor: &str,
        code: Option<Code>,
    ) -> &mut Self {
        let attributes = match code {
            Some(code) => vec![self.code_attribute(code)],
            None => Vec::new(),
        };
        let member = self.member(access, name, descriptor, attributes);
        self.methods.push(member);
        self
    }

    /// A field carrying raw attributes.
    pub fn field_with(
        &mut self,
        access: u16,
        name: &str,
        descriptor: &str,
        attributes: &[(&str, &[u8])],
    ) -> &mut Self {
        let attributes = self.raw_attributes(attributes);
        let member = self.member(access, name, descriptor, attributes);
        self.fields.push(member);
        self
    }

    /// A method carrying raw attributes instead of a `Code` attribute.
    pub fn method_with(
        &mut self,
        access: u16,
        name: &str,
        descriptor: &str,
        attributes: &[(&str, &[u8])],
    ) -> &mut Self {
        let attributes = self.raw_attributes(attributes);
        let member = self.member(access, name, descriptor, attributes);
        self.methods.push(member);
        self
    }

    fn raw_attributes(&mut self, attributes: &[(&str, &[u8])]) -> Vec<Vec<u8>> {
        attributes
            .iter()
            .map(|(name, data)| self.attribute_bytes(name, data))
            .collect()
    }

    pub fn source_file(&mut self, file: &str) -> &mut Self {
        let index = self.utf8(file);
        let attr = self.attribute_bytes("SourceFile", &index.to_be_bytes());
        self.attributes.push(attr);
        self
    }

    /// Attach an annotation without elements, e.g. `Lkotlin/Metadata;`.
    pub fn annotation(&mut self, descriptor: &str, visible: bool) -> &mut Self {
        let type_index = self.utf8(descriptor);
        let mut data = vec![0, 1];
        data.extend(type_index.to_be_bytes());
        data.extend([0, 0]);
        let name = if visible {
            "RuntimeVisibleAnnotations"
        } else {
            "RuntimeInvisibleAnnotations"
        };
        let attr = self.attribute_bytes(name, &data);
        self.attributes.push(attr);
        self
    }

    /// Attach an arbitrary class attribute.
    pub fn attribute(&mut self, name: &str, data: &[u8]) -> &mut Self {
        let attr = self.attribute_bytes(name, data);
        self.attributes.push(attr);
        self
    }

    fn attribute_bytes(&mut self, name: &str, data: &[u8]) -> Vec<u8> {
        let name_index = self.utf8(name);
        let mut out = name_index.to_be_bytes().to_vec();
        out.extend((data.len() as u32).to_be_bytes());
        out.extend(data);
        out
    }

    fn member(&mut self, access: u16, name: &str, descriptor: &str, attributes: Vec<Vec<u8>>) -> Vec<u8> {
        let name = self.utf8(name);
        let descriptor = self.utf8(descriptor);
        let mut out = Vec::new();
        out.extend(access.to_be_bytes());
        out.extend(name.to_be_bytes());
        out.extend(descriptor.to_be_bytes());
        push_attributes(&mut out, &attributes);
        out
    }

    fn code_attribute(&mut self, code: Code) -> Vec<u8> {
        let mut nested = Vec::new();
        if !code.line_numbers.is_empty() {
            let mut data = (code.line_numbers.len() as u16).to_be_bytes().to_vec();
            for (pc, line) in &code.line_numbers {
                data.extend(pc.to_be_bytes());
                data.extend(line.to_be_bytes());
            }
            nested.push(self.attribute_bytes("LineNumberTable", &data));
        }
        if !code.local_variables.is_empty() {
            let mut data = (code.local_variables.len() as u16).to_be_bytes().to_vec();
            for var in &code.local_variables {
                let name = self.utf8(&var.name);
                let descriptor = self.utf8(&var.descriptor);
                for v in [var.start_pc, var.length, name, descriptor, var.slot] {
                    data.extend(v.to_be_bytes());
                }
            }
            nested.push(self.attribute_bytes("LocalVariableTable", &data));
        }

        let mut data = Vec::new();
        data.extend(code.max_stack.to_be_bytes());
        data.extend(code.max_locals.to_be_bytes());
        data.extend((code.bytes.len() as u32).to_be_bytes());
        data.extend(&code.bytes);
        data.extend([0, 0]);
        push_attributes(&mut data, &nested);
        self.attribute_bytes("Code", &data)
    }

    pub fn build(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend(CLASS_MAGIC.to_be_bytes());
        out.extend(0u16.to_be_bytes());
        out.extend(self.major_version.to_be_bytes());
        out.extend(self.next_index.to_be_bytes());
        out.extend(&self.pool);
        out.extend(self.access_flags.to_be_bytes());
        out.extend(self.this_class.to_be_bytes());
        out.extend(self.super_class.to_be_bytes());
        out.extend((self.interfaces.len() as u16).to_be_bytes());
        for index in &self.interfaces {
            out.extend(index.to_be_bytes());
        }
        push_attributes(&mut out, &self.fields);
        push_attributes(&mut out, &self.methods);
        push_attributes(&mut out, &self.attributes);
        out
    }
}

fn tagged(tag: u8, indices: &[u16]) -> Vec<u8> {
    let mut entry = vec![tag];
    for index in indices {
        entry.extend(index.to_be_bytes());
    }
    entry
}

/// Write a `u16` count followed by the pre-encoded items.
fn push_attributes(out: &mut Vec<u8>, items: &[Vec<u8>]) {
    out.extend((items.len() as u16).to_be_bytes());
    for item in items {
        out.extend(item);
    }
}
