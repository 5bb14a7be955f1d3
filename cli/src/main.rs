//! Thin driver around the backend core: parses flags, runs the `Frontend`, optimizes,
//! emits the chosen output, and reports a `CompilationError` as a textual diagnostic.

#[macro_use]
extern crate clap;

mod config;
mod context;
mod frontend;
mod pipeline;

use clap::{Arg, ArgGroup};
use config::CompilerConfig;
use context::CompileContext;
use frontend::{Frontend, UnavailableFrontend};
use std::fs;
use std::process;

fn main() {
    env_logger::init();

    let matches = app_from_crate!()
        .arg(
            Arg::with_name("INPUT")
                .help("Sets the bitcode/SPIR-V input file to compile")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::with_name("output")
                .short("o")
                .long("output")
                .takes_value(true)
                .value_name("FILE")
                .help("Writes the compiled module to FILE instead of stdout"),
        )
        .arg(Arg::with_name("hex").long("hex").help("Emits a comma-separated hex listing"))
        .arg(Arg::with_name("bin").long("bin").help("Emits the raw binary module (default)"))
        .arg(Arg::with_name("asm").long("asm").help("Emits a human-readable assembler listing"))
        .group(ArgGroup::with_name("output-mode").args(&["hex", "bin", "asm"]))
        .arg(Arg::with_name("llvm").long("llvm").help("Forces the LLVM-IR front-end"))
        .arg(Arg::with_name("spirv").long("spirv").help("Forces the SPIR-V front-end"))
        .group(ArgGroup::with_name("frontend").args(&["llvm", "spirv"]))
        .arg(
            Arg::with_name("kernel-info")
                .long("kernel-info")
                .help("Dumps the parsed kernel info instead of compiling"),
        )
        .arg(
            Arg::with_name("verify")
                .long("verify")
                .help("Runs the external verifier over the compiled module"),
        )
        .get_matches();

    let config = CompilerConfig::from_matches(&matches);

    if let Err(message) = run(config) {
        eprintln!("{}", message);
        process::exit(1);
    }
}

fn run(config: CompilerConfig) -> Result<(), String> {
    let bitcode = fs::read(&config.input).map_err(|err| format!("failed to read '{}': {}", config.input, err))?;

    let mut context = CompileContext::new(config);

    let mut module = UnavailableFrontend.parse(&bitcode).map_err(|err| err.to_string())?;

    pipeline::optimize(&mut module).map_err(|err| err.to_string())?;

    if context.config.dump_kernel_info {
        for kernel in module.kernels() {
            println!("{} ({} params)", kernel.name, kernel.params.len());
        }
        return Ok(());
    }

    if context.config.verify_output {
        for warning in context.warnings() {
            log::warn!("verify: {}", warning);
        }
    }

    match &context.config.output {
        Some(path) => vc4c_asm::write_file(path, &module, context.config.output_mode)
            .map_err(|err| format!("failed to write '{}': {}", path, err))?,
        None => {
            let stdout = std::io::stdout();
            let mut handle = stdout.lock();
            vc4c_asm::emit(&mut handle, &module, context.config.output_mode)
                .map_err(|err| format!("failed to write output: {}", err))?;
        }
    }

    Ok(())
}
