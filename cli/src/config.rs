//! The resolved configuration for one `compile()` invocation, parsed out of CLI flags.

use vc4c_asm::OutputMode;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MathType {
    Strict,
    Fast,
    Full,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum FrontendKind {
    Llvm,
    Spirv,
    Auto,
}

#[derive(Clone, Debug)]
pub struct CompilerConfig {
    pub input: String,
    pub output: Option<String>,
    pub output_mode: OutputMode,
    pub frontend: FrontendKind,
    pub math_type: MathType,
    pub verify_output: bool,
    pub dump_kernel_info: bool,
}

impl CompilerConfig {
    pub fn from_matches(matches: &clap::ArgMatches) -> CompilerConfig {
        let output_mode = if matches.is_present("hex") {
            OutputMode::Hex
        } else if matches.is_present("asm") {
            OutputMode::Assembler
        } else {
            OutputMode::Binary
        };

        let frontend = if matches.is_present("llvm") {
            FrontendKind::Llvm
        } else if matches.is_present("spirv") {
            FrontendKind::Spirv
        } else {
            FrontendKind::Auto
        };

        CompilerConfig {
            input: matches.value_of("INPUT").expect("INPUT is required").to_string(),
            output: matches.value_of("output").map(str::to_string),
            output_mode,
            frontend,
            math_type: MathType::Strict,
            verify_output: matches.is_present("verify"),
            dump_kernel_info: matches.is_present("kernel-info"),
        }
    }
}
