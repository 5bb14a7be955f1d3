//! The fixed opcode table: one entry per operation an [`Instruction::Operation`]
//! (crate::instruction) can carry, with enough metadata to drive both the
//! pre-calculation pass and assembly packing.

use crate::literal::Literal;

/// Which of the two parallel ALU pipelines an opcode may be scheduled on.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum AluSide {
    Add,
    Mul,
    Either,
}

/// Static metadata describing one opcode: its printable name, operand arity, which ALU
/// pipeline(s) it can run on, and (for opcodes with a literal evaluation rule) the
/// constant-folding function consulted by the pre-calculation pass.
#[derive(Clone, Copy)]
pub struct OpInfo {
    pub name: &'static str,
    pub num_operands: u8,
    pub side: AluSide,
    /// `true` for opcodes that are not native hardware operations and must be rewritten
    /// by the arithmetic-legalization pass before emission can proceed.
    pub is_abstract: bool,
    precalc: Option<fn(&[Literal]) -> Option<Literal>>,
}

macro_rules! op_table {
    ($($variant:ident => $name:literal, $operands:expr, $side:expr, $abstract:expr, $precalc:expr;)*) => {
        /// A concrete or (pre-legalization) abstract arithmetic/logic operation.
        #[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
        pub enum OpCode {
            $($variant,)*
        }

        impl OpCode {
            pub fn info(&self) -> OpInfo {
                match self {
                    $(OpCode::$variant => OpInfo {
                        name: $name,
                        num_operands: $operands,
                        side: $side,
                        is_abstract: $abstract,
                        precalc: $precalc,
                    },)*
                }
            }
        }
    };
}

fn fold_add(args: &[Literal]) -> Option<Literal> {
    Some(Literal::Int(args[0].as_i64().wrapping_add(args[1].as_i64())))
}
fn fold_sub(args: &[Literal]) -> Option<Literal> {
    Some(Literal::Int(args[0].as_i64().wrapping_sub(args[1].as_i64())))
}
fn fold_mul(args: &[Literal]) -> Option<Literal> {
    Some(Literal::Int(args[0].as_i64().wrapping_mul(args[1].as_i64())))
}
fn fold_and(args: &[Literal]) -> Option<Literal> {
    Some(Literal::UInt(args[0].as_u64() & args[1].as_u64()))
}
fn fold_or(args: &[Literal]) -> Option<Literal> {
    Some(Literal::UInt(args[0].as_u64() | args[1].as_u64()))
}
fn fold_xor(args: &[Literal]) -> Option<Literal> {
    Some(Literal::UInt(args[0].as_u64() ^ args[1].as_u64()))
}
fn fold_not(args: &[Literal]) -> Option<Literal> {
    Some(Literal::UInt(!args[0].as_u64()))
}
fn fold_shl(args: &[Literal]) -> Option<Literal> {
    Some(Literal::UInt(args[0].as_u64().wrapping_shl(args[1].as_u64() as u32)))
}
fn fold_shr(args: &[Literal]) -> Option<Literal> {
    Some(Literal::UInt(
        (args[0].as_u64() as u32).wrapping_shr(args[1].as_u64() as u32) as u64,
    ))
}
fn fold_asr(args: &[Literal]) -> Option<Literal> {
    Some(Literal::Int(
        (args[0].as_i64() as i32).wrapping_shr(args[1].as_u64() as u32) as i64,
    ))
}
fn fold_min(args: &[Literal]) -> Option<Literal> {
    Some(Literal::Int(args[0].as_i64().min(args[1].as_i64())))
}
fn fold_max(args: &[Literal]) -> Option<Literal> {
    Some(Literal::Int(args[0].as_i64().max(args[1].as_i64())))
}
fn fold_fadd(args: &[Literal]) -> Option<Literal> {
    Some(Literal::Real(args[0].as_f64() + args[1].as_f64()))
}
fn fold_fsub(args: &[Literal]) -> Option<Literal> {
    Some(Literal::Real(args[0].as_f64() - args[1].as_f64()))
}
fn fold_fmul(args: &[Literal]) -> Option<Literal> {
    Some(Literal::Real(args[0].as_f64() * args[1].as_f64()))
}
fn fold_fmin(args: &[Literal]) -> Option<Literal> {
    Some(Literal::Real(args[0].as_f64().min(args[1].as_f64())))
}
fn fold_fmax(args: &[Literal]) -> Option<Literal> {
    Some(Literal::Real(args[0].as_f64().max(args[1].as_f64())))
}
fn fold_itof(args: &[Literal]) -> Option<Literal> {
    Some(Literal::Real(args[0].as_i64() as f64))
}
fn fold_ftoi(args: &[Literal]) -> Option<Literal> {
    Some(Literal::Int(args[0].as_f64() as i64))
}
fn fold_clz(args: &[Literal]) -> Option<Literal> {
    Some(Literal::UInt((args[0].as_u64() as u32).leading_zeros() as u64))
}

op_table! {
    // -- concrete hardware ALU operations --
    Add     => "add",     2, AluSide::Either, false, Some(fold_add);
    Sub     => "sub",     2, AluSide::Add,    false, Some(fold_sub);
    Mul24   => "mul24",   2, AluSide::Mul,    false, Some(fold_mul);
    And     => "and",     2, AluSide::Add,    false, Some(fold_and);
    Or      => "or",      2, AluSide::Add,    false, Some(fold_or);
    Xor     => "xor",     2, AluSide::Add,    false, Some(fold_xor);
    Not     => "not",     1, AluSide::Add,    false, Some(fold_not);
    Shl     => "shl",     2, AluSide::Add,    false, Some(fold_shl);
    Shr     => "shr",     2, AluSide::Add,    false, Some(fold_shr);
    Asr     => "asr",     2, AluSide::Add,    false, Some(fold_asr);
    Ror     => "ror",     2, AluSide::Add,    false, None;
    Min     => "min",     2, AluSide::Mul,    false, Some(fold_min);
    Max     => "max",     2, AluSide::Mul,    false, Some(fold_max);
    FAdd    => "fadd",    2, AluSide::Add,    false, Some(fold_fadd);
    FSub    => "fsub",    2, AluSide::Add,    false, Some(fold_fsub);
    FMul    => "fmul",    2, AluSide::Mul,    false, Some(fold_fmul);
    FMin    => "fmin",    2, AluSide::Add,    false, Some(fold_fmin);
    FMax    => "fmax",    2, AluSide::Add,    false, Some(fold_fmax);
    FMinAbs => "fminabs", 2, AluSide::Add,    false, None;
    FMaxAbs => "fmaxabs", 2, AluSide::Add,    false, None;
    Itof    => "itof",    1, AluSide::Add,    false, Some(fold_itof);
    Ftoi    => "ftoi",    1, AluSide::Add,    false, Some(fold_ftoi);
    Clz     => "clz",     1, AluSide::Add,    false, Some(fold_clz);
    V8Adds  => "v8adds",  2, AluSide::Either, false, None;
    V8Subs  => "v8subs",  2, AluSide::Add,    false, None;

    // -- abstract generic operations, rewritten by arithmetic legalization --
    Mul     => "mul",     2, AluSide::Either, true, Some(fold_mul);
    UDiv    => "udiv",    2, AluSide::Either, true, None;
    URem    => "urem",    2, AluSide::Either, true, None;
    SDiv    => "sdiv",    2, AluSide::Either, true, None;
    SRem    => "srem",    2, AluSide::Either, true, None;
    FDiv    => "fdiv",    2, AluSide::Either, true, None;
    Trunc   => "trunc",   1, AluSide::Either, true, None;
    FpTrunc => "fptrunc", 1, AluSide::Either, true, None;
    SiToFp  => "sitofp",  1, AluSide::Either, true, Some(fold_itof);
    UiToFp  => "uitofp",  1, AluSide::Either, true, None;
    FpToSi  => "fptosi",  1, AluSide::Either, true, Some(fold_ftoi);
    FpToUi  => "fptoui",  1, AluSide::Either, true, None;
    Sext    => "sext",    1, AluSide::Either, true, None;
    Zext    => "zext",    1, AluSide::Either, true, None;
    AShr    => "ashr",    2, AluSide::Either, true, Some(fold_asr);
    LShr    => "lshr",    2, AluSide::Either, true, Some(fold_shr);
}

impl OpCode {
    /// Attempts to constant-fold this opcode over fully-literal arguments; returns `None`
    /// if there is no folding rule or if the rule signals overflow by returning `None`
    /// itself (the caller then falls through to the non-folded lowering).
    pub fn precalculate(&self, args: &[Literal]) -> Option<Literal> {
        let info = self.info();
        if args.len() != info.num_operands as usize {
            return None;
        }
        let f = info.precalc?;
        f(args)
    }
}

impl std::fmt::Display for OpCode {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.info().name)
    }
}
