//! The seam between the engine and whatever turns class bytes into text.

use twinbuild_classfile::DisassemblyOptions;

use crate::error::DisassemblyFailure;

/// Produces a deterministic textual form of a compiled unit.
///
/// Implementations must be pure: the same bytes and options always yield
/// the same text. They are shared across worker threads.
pub trait Disassembler: Send + Sync {
    fn disassemble(
        &self,
        bytes: &[u8],
        options: &DisassemblyOptions,
    ) -> Result<String, DisassemblyFailure>;
}

/// [`Disassembler`] backed by the in-tree class-file textifier.
#[derive(Clone, Copy, Debug, Default)]
pub struct ClassFileDisassembler;

impl Disassembler for ClassFileDisassembler {
    fn disassemble(
        &self,
        bytes: &[u8],
        options: &DisassemblyOptions,
    ) -> Result<String, DisassemblyFailure> {
        twinbuild_classfile::disassemble(bytes, options)
            .map_err(|e| DisassemblyFailure::new(e.to_string()))
    }
}
