//! Binary, hex, and assembler emission for a compiled [`vc4c_ir::Module`].
//!
//! [`word`] packs one [`vc4c_ir::Instruction`] into its 64-bit hardware encoding, [`module`]
//! lays out the whole module (header, kernel metadata, global data, instruction stream) around
//! it, and [`text`] renders the same module as a human-readable listing.

mod module;
mod text;
mod word;

pub use module::{emit, OutputMode};
pub use word::encode as encode_instruction;

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use vc4c_ir::Module;

/// Emits `module` to `path`, truncating or creating it, using the given output mode.
pub fn write_file(path: impl AsRef<Path>, module: &Module, mode: OutputMode) -> io::Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    emit(&mut writer, module, mode)?;
    writer.flush()
}
