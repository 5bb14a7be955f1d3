//! The boundary between a bitcode/SPIR-V parser and the backend core.
//!
//! The core only ever depends on this trait; it never parses LLVM-IR or SPIR-V itself.
//! Tests build `Module` values directly through the IR builder API instead of routing
//! through a `Frontend`.

use vc4c_ir::Module;
use vc4c_lower::CompilationError;

pub trait Frontend {
    fn parse(&self, bitcode: &[u8]) -> Result<Module, CompilationError>;
}

/// The only `Frontend` shipped in this build: there is no bundled LLVM-IR or SPIR-V
/// parser, so every call fails with a precompilation error naming what's missing.
pub struct UnavailableFrontend;

impl Frontend for UnavailableFrontend {
    fn parse(&self, _bitcode: &[u8]) -> Result<Module, CompilationError> {
        Err(CompilationError::precompilation(
            "LLVM-IR/SPIR-V front-end not available in this build",
        ))
    }
}
