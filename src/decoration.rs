//! Semantic properties attached to an instruction that later passes consult.

bitflags::bitflags! {
    /// A bitmask of semantic markers on an instruction. Most decorations are advisory:
    /// they let a later pass recognize a pattern it itself produced (`ELEMENT_INSERTION`)
    /// or recover a substitution opportunity (`BUILTIN_LOCAL_ID` plus a known required
    /// work-group size lets constant propagation replace the read outright).
    #[derive(Default)]
    pub struct Decorations: u32 {
        /// The instruction's result should be interpreted/printed as unsigned.
        const UNSIGNED_RESULT      = 1 << 0;
        /// The writer applies a saturating pack mode rather than a truncating one.
        const SATURATED_CONVERSION = 1 << 1;
        /// Marks the conditional move half of a vector-insert sequence.
        const ELEMENT_INSERTION    = 1 << 2;
        /// Result is `work_dim`.
        const BUILTIN_WORK_DIM     = 1 << 3;
        /// Result is `get_local_id(dim)`.
        const BUILTIN_LOCAL_ID     = 1 << 4;
        /// Result is `get_local_size(dim)`.
        const BUILTIN_LOCAL_SIZE   = 1 << 5;
        /// Result is `get_group_id(dim)`.
        const BUILTIN_GROUP_ID     = 1 << 6;
        /// Result is `get_num_groups(dim)`.
        const BUILTIN_NUM_GROUPS   = 1 << 7;
        /// Result is `get_global_offset(dim)`.
        const BUILTIN_GLOBAL_OFFSET = 1 << 8;
        /// Floating-point division may use the single-SFU-`recip` approximation instead
        /// of the five-iteration Newton-Raphson refinement.
        const ALLOW_RECIPROCAL     = 1 << 9;
        /// Fast-math is enabled for the method this instruction belongs to.
        const FAST_MATH            = 1 << 10;
        /// This move implements one incoming edge of a control-flow phi.
        const PHI_NODE             = 1 << 11;
        /// This `BranchLabel` is the target of at least one `Branch`.
        const BRANCH_TARGET        = 1 << 12;
    }
}
