//! The single coarse-grained failure type every lowering helper and pass returns.

use std::error::Error;
use std::fmt;

/// Which stage of compilation raised a [`CompilationError`]. Mirrors the original source's
/// step tagging; `Optimizer` covers everything this crate does.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum CompilationStep {
    General,
    Scanner,
    Parser,
    LlvmToIr,
    Optimizer,
    CodeGeneration,
    Linker,
    Verifier,
    Precompilation,
}

impl fmt::Display for CompilationStep {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            CompilationStep::General => "general",
            CompilationStep::Scanner => "scanner",
            CompilationStep::Parser => "parser",
            CompilationStep::LlvmToIr => "llvm_to_ir",
            CompilationStep::Optimizer => "optimizer",
            CompilationStep::CodeGeneration => "code_generation",
            CompilationStep::Linker => "linker",
            CompilationStep::Verifier => "verifier",
            CompilationStep::Precompilation => "precompilation",
        };
        write!(f, "{}", name)
    }
}

/// A compilation failure: the step it occurred in, a human-readable message, and
/// optionally the textual form of the instruction or value that triggered it.
#[derive(Clone, PartialEq, Debug)]
pub struct CompilationError {
    pub step: CompilationStep,
    pub message: String,
    pub offending_value: Option<String>,
}

impl CompilationError {
    pub fn new(step: CompilationStep, message: impl Into<String>) -> CompilationError {
        CompilationError {
            step,
            message: message.into(),
            offending_value: None,
        }
    }

    pub fn with_value(step: CompilationStep, message: impl Into<String>, value: impl fmt::Debug) -> CompilationError {
        CompilationError {
            step,
            message: message.into(),
            offending_value: Some(format!("{:?}", value)),
        }
    }

    pub fn precompilation(message: impl Into<String>) -> CompilationError {
        CompilationError::new(CompilationStep::Precompilation, message)
    }

    pub fn code_generation(message: impl Into<String>, value: impl fmt::Debug) -> CompilationError {
        CompilationError::with_value(CompilationStep::CodeGeneration, message, value)
    }

    pub fn optimizer(message: impl Into<String>) -> CompilationError {
        CompilationError::new(CompilationStep::Optimizer, message)
    }
}

impl fmt::Display for CompilationError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[{}] {}", self.step, self.message)?;
        if let Some(value) = &self.offending_value {
            write!(f, " (offending value: {})", value)?;
        }
        Ok(())
    }
}

impl Error for CompilationError {
    fn description(&self) -> &str {
        &self.message
    }
}
