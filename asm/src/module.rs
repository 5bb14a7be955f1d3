//! Serializes a [`Module`] to the fixed binary layout (magic header, module-info, one
//! kernel-info block per kernel, the global-data segment, the instruction stream), and
//! renders the same content as hex.

use crate::word;
use byteorder::WriteBytesExt;
use std::io::{self, Write};
use util::Endian;
use vc4c_ir::{AddressSpace, DataType, Literal, Method, Module, Parameter, ScalarType, Value};

/// Repeated twice at the start of the file: the front-end half and the back-end half.
pub const MAGIC: u64 = 0x5643_3443_2D42_4B44;

const ADDRESS_SPACE_PRIVATE: u8 = 0;
const ADDRESS_SPACE_LOCAL: u8 = 1;
const ADDRESS_SPACE_GLOBAL: u8 = 2;
const ADDRESS_SPACE_CONSTANT: u8 = 3;
const ADDRESS_SPACE_GENERIC: u8 = 4;

const FLAG_POINTER: u32 = 1 << 0;
const FLAG_READ_ONLY: u32 = 1 << 1;
const FLAG_WRITE_ONLY: u32 = 1 << 2;
const FLAG_RESTRICT: u32 = 1 << 3;
const FLAG_VOLATILE: u32 = 1 << 4;
const FLAG_SIGNED: u32 = 1 << 5;
const FLAG_UNSIGNED: u32 = 1 << 6;
const FLAG_FLOAT: u32 = 1 << 7;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum OutputMode {
    Binary,
    Hex,
    Assembler,
}

pub fn emit<W: Write>(writer: &mut W, module: &Module, mode: OutputMode) -> io::Result<()> {
    match mode {
        OutputMode::Binary => write_binary(writer, module),
        OutputMode::Hex => write_hex(writer, module),
        OutputMode::Assembler => crate::text::write_assembler(writer, module),
    }
}

fn address_space_code(space: AddressSpace) -> u8 {
    match space {
        AddressSpace::Private => ADDRESS_SPACE_PRIVATE,
        AddressSpace::Local => ADDRESS_SPACE_LOCAL,
        AddressSpace::Global => ADDRESS_SPACE_GLOBAL,
        AddressSpace::Constant => ADDRESS_SPACE_CONSTANT,
        AddressSpace::Generic => ADDRESS_SPACE_GENERIC,
    }
}

fn parameter_flags(param: &Parameter) -> u32 {
    let mut flags = 0u32;
    if param.ty.is_pointer() {
        flags |= FLAG_POINTER;
    }
    if param.decorations.contains(vc4c_ir::ParameterDecorations::READ_ONLY) {
        flags |= FLAG_READ_ONLY;
    }
    if param.decorations.contains(vc4c_ir::ParameterDecorations::WRITE_ONLY) {
        flags |= FLAG_WRITE_ONLY;
    }
    if param.decorations.contains(vc4c_ir::ParameterDecorations::RESTRICT) {
        flags |= FLAG_RESTRICT;
    }
    if param.decorations.contains(vc4c_ir::ParameterDecorations::VOLATILE) {
        flags |= FLAG_VOLATILE;
    }
    if let Some(scalar) = param.ty.element_scalar() {
        flags |= scalar_flag(&scalar);
    }
    flags
}

fn scalar_flag(scalar: &ScalarType) -> u32 {
    if scalar.is_float {
        FLAG_FLOAT
    } else if scalar.is_signed {
        FLAG_SIGNED
    } else {
        FLAG_UNSIGNED
    }
}

fn pad_to(buf: &mut Vec<u8>, multiple: usize) {
    let remainder = buf.len() % multiple;
    if remainder != 0 {
        buf.extend(std::iter::repeat(0u8).take(multiple - remainder));
    }
}

fn write_padded_name<W: Write>(writer: &mut W, name: &str) -> io::Result<()> {
    let mut bytes = name.as_bytes().to_vec();
    bytes.push(0);
    pad_to(&mut bytes, 8);
    writer.write_all(&bytes)
}

fn serialize_initializer(value: &Value, out: &mut Vec<u8>) {
    match value {
        Value::Literal(literal, ty) => serialize_literal(literal, ty, out),
        Value::Container(elements, _) => {
            for element in elements {
                serialize_initializer(element, out);
            }
        }
        other => out.extend(std::iter::repeat(0u8).take(other.get_type().physical_width() as usize)),
    }
}

fn serialize_literal(literal: &Literal, ty: &DataType, out: &mut Vec<u8>) {
    if ty.is_float() {
        if ty.scalar_bit_width() <= 32 {
            out.extend(&(literal.as_f64() as f32).to_le_bytes());
        } else {
            out.extend(&literal.as_f64().to_le_bytes());
        }
        return;
    }
    let raw = literal.as_u64();
    match ty.scalar_bit_width() {
        8 => out.push(raw as u8),
        16 => out.extend(&(raw as u16).to_le_bytes()),
        32 => out.extend(&(raw as u32).to_le_bytes()),
        _ => out.extend(&raw.to_le_bytes()),
    }
}

fn module_instructions(module: &Module) -> Vec<u64> {
    let mut words = Vec::new();
    for kernel in module.kernels() {
        for block in kernel.blocks() {
            for (_, instruction) in block.iter() {
                words.push(word::encode(instruction));
            }
        }
    }
    words
}

fn kernel_word_count(method: &Method) -> u32 {
    method.blocks().iter().map(|block| block.len() as u32).sum()
}

fn stack_frame_size(module: &Module) -> u32 {
    module
        .methods
        .iter()
        .flat_map(|m| m.stack_allocations.iter())
        .map(|a| a.offset + a.size)
        .max()
        .unwrap_or(0)
}

fn type_name(ty: &DataType) -> String {
    match ty {
        DataType::Scalar(s) => scalar_name(s),
        DataType::Vector { element, width } => format!("{}{}", scalar_name(element), width),
        DataType::Pointer { pointee, .. } => format!("{}*", type_name(pointee)),
        DataType::Array { element, length } => format!("{}[{}]", type_name(element), length),
        DataType::Struct { .. } => "struct".to_string(),
        DataType::Image => "image".to_string(),
    }
}

fn scalar_name(scalar: &ScalarType) -> String {
    match (scalar.is_float, scalar.is_signed) {
        (true, _) => format!("f{}", scalar.bit_width),
        (false, true) => format!("i{}", scalar.bit_width),
        (false, false) => format!("u{}", scalar.bit_width),
    }
}

/// Writes one kernel-info block: the `kernel_info`/work-group-size words, the padded kernel
/// name, and a record per parameter. Shared between the binary and hex emitters so the two
/// stay byte-for-byte identical.
fn write_kernel_block<W: Write>(writer: &mut W, kernel: &Method, instruction_offset: u32, length: u32) -> io::Result<()> {
    let kernel_info = u64::from(instruction_offset) | (u64::from(length) << 32);
    writer.write_u64::<Endian>(kernel_info)?;

    let (x, y, z) = kernel.required_work_group_size.unwrap_or((0, 0, 0));
    let wgs = (u64::from(x) << 32) | (u64::from(y) << 16) | u64::from(z);
    writer.write_u64::<Endian>(wgs)?;

    write_padded_name(writer, &kernel.name)?;

    for param in &kernel.params {
        let size = u64::from(param.ty.physical_width()) & 0xFFFFF;
        let count = u64::from(param.ty.vector_width()) & 0xFF;
        let address_space = match &param.ty {
            DataType::Pointer { address_space, .. } => u64::from(address_space_code(*address_space)),
            _ => 0,
        };
        let flags = u64::from(parameter_flags(param));
        let record = size | (count << 20) | (address_space << 28) | (flags << 32);
        writer.write_u64::<Endian>(record)?;
        write_padded_name(writer, &param.name)?;
        write_padded_name(writer, &type_name(&param.ty))?;
    }
    Ok(())
}

/// The global-data segment: every global's initializer, each padded to its own alignment,
/// with the whole blob padded to 8 bytes so the instruction stream that follows stays
/// word-aligned.
fn global_data_bytes(module: &Module) -> Vec<u8> {
    let mut global_data = Vec::new();
    for global in &module.globals {
        pad_to(&mut global_data, global.alignment.max(1) as usize);
        serialize_initializer(&global.initializer, &mut global_data);
    }
    pad_to(&mut global_data, 8);
    global_data
}

fn write_binary<W: Write>(writer: &mut W, module: &Module) -> io::Result<()> {
    writer.write_u64::<Endian>(MAGIC)?;
    writer.write_u64::<Endian>(MAGIC)?;

    let kernels: Vec<&Method> = module.kernels().collect();
    let module_info = (1u64 << 56)
        | ((kernels.len() as u64) << 40)
        | ((module.globals.len() as u64) << 24)
        | u64::from(stack_frame_size(module) & 0xFF_FFFF);
    writer.write_u64::<Endian>(module_info)?;

    let mut instruction_offset = 0u32;
    for kernel in &kernels {
        let length = kernel_word_count(kernel);
        write_kernel_block(writer, kernel, instruction_offset, length)?;
        instruction_offset += length;
    }

    writer.write_u64::<Endian>(0)?;
    writer.write_all(&global_data_bytes(module))?;
    writer.write_u64::<Endian>(0)?;

    for word in module_instructions(module) {
        writer.write_u64::<Endian>(word)?;
    }

    Ok(())
}

fn write_hex_words<W: Write>(writer: &mut W, bytes: &[u8]) -> io::Result<()> {
    for chunk in bytes.chunks(8) {
        let mut padded = [0u8; 8];
        padded[..chunk.len()].copy_from_slice(chunk);
        writeln!(writer, "0x{:016x},", u64::from_le_bytes(padded))?;
    }
    Ok(())
}

/// Same byte layout as [`write_binary`], but with a `// kernel {name}` comment line ahead of
/// each kernel's info block and instructions, and a `// globals` block ahead of the global-data
/// segment, mirroring the labels [`crate::text::write_assembler`] prints for the same sections.
fn write_hex<W: Write>(writer: &mut W, module: &Module) -> io::Result<()> {
    let mut header = Vec::new();
    header.write_u64::<Endian>(MAGIC)?;
    header.write_u64::<Endian>(MAGIC)?;

    let kernels: Vec<&Method> = module.kernels().collect();
    let module_info = (1u64 << 56)
        | ((kernels.len() as u64) << 40)
        | ((module.globals.len() as u64) << 24)
        | u64::from(stack_frame_size(module) & 0xFF_FFFF);
    header.write_u64::<Endian>(module_info)?;
    write_hex_words(writer, &header)?;

    let mut instruction_offset = 0u32;
    for kernel in &kernels {
        writeln!(writer, "// kernel {}", kernel.name)?;
        let length = kernel_word_count(kernel);
        let mut block = Vec::new();
        write_kernel_block(&mut block, kernel, instruction_offset, length)?;
        write_hex_words(writer, &block)?;
        instruction_offset += length;
    }

    write_hex_words(writer, &0u64.to_le_bytes())?;

    if !module.globals.is_empty() {
        writeln!(writer, "// globals")?;
        for global in &module.globals {
            writeln!(writer, "//   {}: {:?}", global.name, global.pointee_type)?;
        }
    }
    write_hex_words(writer, &global_data_bytes(module))?;

    write_hex_words(writer, &0u64.to_le_bytes())?;

    for kernel in &kernels {
        writeln!(writer, "// kernel {} instructions", kernel.name)?;
        let mut instructions = Vec::new();
        for block in kernel.blocks() {
            for (_, instruction) in block.iter() {
                instructions.write_u64::<Endian>(word::encode(instruction))?;
            }
        }
        write_hex_words(writer, &instructions)?;
    }

    Ok(())
}
