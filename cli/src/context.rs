//! The top-level object owned by one `compile()` call.

use crate::config::CompilerConfig;
use vc4c_lower::CompilationError;

/// Owns the resolved configuration and the diagnostics accumulated across methods,
/// threaded through every pass instead of relying on process-global state.
pub struct CompileContext {
    pub config: CompilerConfig,
    warnings: Vec<String>,
}

impl CompileContext {
    pub fn new(config: CompilerConfig) -> CompileContext {
        CompileContext {
            config,
            warnings: Vec::new(),
        }
    }

    pub fn warn(&mut self, method_name: &str, message: impl Into<String>) {
        let message = message.into();
        log::warn!("{}: {}", method_name, message);
        self.warnings.push(format!("{}: {}", method_name, message));
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }
}

pub type CompileResult<T> = Result<T, CompilationError>;
