use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClassFileError {
    #[error("invalid class magic: expected 0xCAFEBABE, got {actual:#010X}")]
    InvalidMagic { actual: u32 },

    #[error("unexpected end of data at offset {offset}: needed {needed} more bytes")]
    UnexpectedEof { offset: usize, needed: usize },

    #[error("unknown constant pool tag {tag} at index {index}")]
    UnknownConstantTag { index: u16, tag: u8 },

    #[error("constant pool index {index} out of range or unusable")]
    BadConstantIndex { index: u16 },

    #[error("constant pool entry {index} is not a {expected}")]
    ConstantKind { index: u16, expected: &'static str },

    #[error("malformed modified UTF-8 at constant pool index {index}")]
    BadUtf8 { index: u16 },

    #[error("unknown opcode {opcode:#04X} at bytecode offset {offset}")]
    UnknownOpcode { offset: u32, opcode: u8 },

    #[error("malformed {attribute} attribute: {reason}")]
    MalformedAttribute {
        attribute: &'static str,
        reason: String,
    },

    #[error("bootstrap method {index} not found")]
    MissingBootstrapMethod { index: u16 },

    #[error("constant nesting too deep at index {index}")]
    ConstantTooDeep { index: u16 },
}

pub type ClassFileResult<T> = Result<T, ClassFileError>;
