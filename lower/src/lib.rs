//! Lowering helpers, work-item/named-builtin dispatch, and generic arithmetic
//! legalization for the VC4C QPU backend's intermediate representation.
//!
//! This crate contains components D-E of the backend: the vocabulary lowering helpers
//! (rotation, replication, extract/insert/shuffle, sign handling, extension/saturation,
//! index arithmetic) and the two passes built on top of them (intrinsics resolution,
//! generic arithmetic legalization). The IR model itself lives in `vc4c-ir`.

mod error;
mod extend;
mod gep;
mod legalize;
mod pass;
mod replicate;
mod rotate;
mod seq;
mod sign;
mod vector;

pub mod builtins;

pub use error::{CompilationError, CompilationStep};
pub use extend::{sign_extend, truncate as truncating_narrow, saturating_truncate, zero_extend};
pub use gep::{compute_index, GepIndex};
pub use legalize::legalize_operation;
pub use pass::run_to_fixed_point;
pub use replicate::replicate;
pub use rotate::{build_rotation, rotate, RotationAmount};
pub use sign::{build_invert, invert_sign, make_positive};
pub use vector::{extract_element, insert_element, shuffle, LaneIndex, MaskLane};
