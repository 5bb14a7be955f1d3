//! Runs the legalization/builtin-lowering pass over every method in a module.
//!
//! Each method is optimized independently: the rewrite only ever touches its own blocks
//! and locals, so `rayon`'s parallel iterator can drive one worker per method without any
//! cross-method synchronization beyond the read-only globals and config the context hands
//! out.

use rayon::prelude::*;
use vc4c_ir::Module;
use vc4c_lower::CompilationError;

pub fn optimize(module: &mut Module) -> Result<(), CompilationError> {
    module
        .methods
        .par_iter_mut()
        .map(|method| {
            vc4c_lower::run_to_fixed_point(method).map_err(|err| {
                log::warn!("{}: {}", method.name, err);
                err
            })
        })
        .collect()
}
