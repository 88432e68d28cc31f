//! JVM class-file reader and textual disassembler.
//!
//! Turns compiled `.class` bytes into a deterministic, line-oriented text
//! listing in the style of ASM's `Textifier`. Two builds of the same source
//! produce identical listings, which is what the differencing engine relies
//! on.
//!
//! # Key Types
//!
//! - [`ClassFile`]: parsed class structure with raw, lazily decoded attributes
//! - [`ConstantPool`]: the constant table, with typed accessors
//! - [`CodeAttribute`]: a method body, decoded into [`Instruction`]s on demand
//! - [`DisassemblyOptions`]: toggles for debug info and method bodies
//! - [`disassemble`]: bytes in, listing out

pub mod annotations;
pub mod class;
pub mod code;
pub mod constant_pool;
pub mod error;
#[cfg(any(test, feature = "fixture"))]
pub mod fixture;
pub mod opcodes;
pub mod reader;
pub mod text;
pub mod textifier;

pub use class::{Attribute, ClassFile, MemberInfo, CLASS_MAGIC};
pub use code::{CodeAttribute, Instruction, Operand};
pub use constant_pool::{Constant, ConstantPool, MemberRef};
pub use error::{ClassFileError, ClassFileResult};
pub use textifier::{disassemble, DisassemblyOptions};
