//! Human-readable assembler rendering, one kernel at a time.

use std::io::{self, Write};
use vc4c_ir::Module;

pub fn write_assembler<W: Write>(writer: &mut W, module: &Module) -> io::Result<()> {
    for kernel in module.kernels() {
        writeln!(writer, "// kernel {}", kernel.name)?;
        for param in &kernel.params {
            writeln!(writer, "//   param {}: {:?}", param.name, param.ty)?;
        }
        for block in kernel.blocks() {
            writeln!(writer, "{}:", block.label)?;
            for (_, instruction) in block.iter() {
                writeln!(writer, "    {}", instruction)?;
            }
        }
        writeln!(writer)?;
    }

    if !module.globals.is_empty() {
        writeln!(writer, "// globals")?;
        for global in &module.globals {
            writeln!(writer, "//   {}: {:?}", global.name, global.pointee_type)?;
        }
    }

    Ok(())
}
