use crate::constant_pool::ConstantPool;
use crate::error::{ClassFileError, ClassFileResult};
use crate::reader::ByteReader;

pub const CLASS_MAGIC: u32 = 0xCAFE_BABE;

/// A raw attribute: its resolved name plus the undecoded payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub data: Vec<u8>,
    /// Offset of `data` within the enclosing byte buffer.
    pub offset: usize,
}

/// A field or method declaration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MemberInfo {
    pub access_flags: u16,
    pub name: String,
    pub descriptor: String,
    pub attributes: Vec<Attribute>,
}

impl MemberInfo {
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        find_attribute(&self.attributes, name)
    }
}

/// A parsed class file. Attributes stay raw and are decoded on demand.
#[derive(Clone, Debug, PartialEq)]
pub struct ClassFile {
    pub minor_version: u16,
    pub major_version: u16,
    pub constant_pool: ConstantPool,
    pub access_flags: u16,
    pub this_class: String,
    pub super_class: Option<String>,
    pub interfaces: Vec<String>,
    pub fields: Vec<MemberInfo>,
    pub methods: Vec<MemberInfo>,
    pub attributes: Vec<Attribute>,
}

impl ClassFile {
    pub fn parse(bytes: &[u8]) -> ClassFileResult<Self> {
        let mut r = ByteReader::new(bytes);

        let magic = r.u32()?;
        if magic != CLASS_MAGIC {
            return Err(ClassFileError::InvalidMagic { actual: magic });
        }
        let minor_version = r.u16()?;
        let major_version = r.u16()?;
        let constant_pool = ConstantPool::parse(&mut r)?;

        let access_flags = r.u16()?;
        let this_class = constant_pool.class_name(r.u16()?)?.to_string();
        let super_index = r.u16()?;
        let super_class = if super_index == 0 {
            None
        } else {
            Some(constant_pool.class_name(super_index)?.to_string())
        };

        let interface_count = r.u16()?;
        let mut interfaces = Vec::with_capacity(interface_count as usize);
        for _ in 0..interface_count {
            interfaces.push(constant_pool.class_name(r.u16()?)?.to_string());
        }

        let fields = parse_members(&mut r, &constant_pool)?;
        let methods = parse_members(&mut r, &constant_pool)?;
        let attributes = parse_attributes(&mut r, &constant_pool)?;

        Ok(Self {
            minor_version,
            major_version,
            constant_pool,
            access_flags,
            this_class,
            super_class,
            interfaces,
            fields,
            methods,
            attributes,
        })
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        find_attribute(&self.attributes, name)
    }
}

pub(crate) fn find_attribute<'a>(attributes: &'a [Attribute], name: &str) -> Option<&'a Attribute> {
    attributes.iter().find(|a| a.name == name)
}

fn parse_members(r: &mut ByteReader<'_>, cp: &ConstantPool) -> ClassFileResult<Vec<MemberInfo>> {
    let count = r.u16()?;
    let mut members = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let access_flags = r.u16()?;
        let name = cp.utf8(r.u16()?)?.to_string();
        let descriptor = cp.utf8(r.u16()?)?.to_string();
        let attributes = parse_attributes(r, cp)?;
        members.push(MemberInfo {
            access_flags,
            name,
            descriptor,
            attributes,
        });
    }
    Ok(members)
}

/// Parse an `attributes_count` + attribute table.
pub fn parse_attributes(
    r: &mut ByteReader<'_>,
    cp: &ConstantPool,
) -> ClassFileResult<Vec<Attribute>> {
    let count = r.u16()?;
    let mut attributes = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let name = cp.utf8(r.u16()?)?.to_string();
        let len = r.u32()? as usize;
        let offset = r.offset();
        let data = r.bytes(len)?.to_vec();
        attributes.push(Attribute { name, data, offset });
    }
    Ok(attributes)
}
