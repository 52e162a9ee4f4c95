//! AArch64 assembly instruction definitions
//!
//! This module defines the register model and the instruction subset the
//! code generator emits. Instructions are kept as an in-memory list so
//! tests can assert on structure (stack effects, label targets) before
//! the list is rendered to text by [`crate::emit`].
//!
//! The textual forms follow the Apple AArch64 conventions: `_`-prefixed
//! global symbols, `.p2align 2`, and `L`-prefixed local labels.

use std::fmt;

/// AArch64 registers used by the generator.
///
/// `X0`-`X5` carry integer arguments and `X0` the return value; `X6` is
/// a scratch register for parameter spilling; `Fp`/`Lr` are the frame
/// pointer (x29) and link register (x30).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reg {
    X0,
    X1,
    X2,
    X3,
    X4,
    X5,
    X6,
    Fp,
    Lr,
    Sp,
}

impl Reg {
    /// 64-bit register name
    pub fn name64(self) -> &'static str {
        match self {
            Reg::X0 => "x0",
            Reg::X1 => "x1",
            Reg::X2 => "x2",
            Reg::X3 => "x3",
            Reg::X4 => "x4",
            Reg::X5 => "x5",
            Reg::X6 => "x6",
            Reg::Fp => "x29",
            Reg::Lr => "x30",
            Reg::Sp => "sp",
        }
    }

    /// 32-bit register name
    pub fn name32(self) -> &'static str {
        match self {
            Reg::X0 => "w0",
            Reg::X1 => "w1",
            Reg::X2 => "w2",
            Reg::X3 => "w3",
            Reg::X4 => "w4",
            Reg::X5 => "w5",
            Reg::X6 => "w6",
            Reg::Fp => "w29",
            Reg::Lr => "w30",
            Reg::Sp => "wsp",
        }
    }
}

impl fmt::Display for Reg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name64())
    }
}

/// Condition codes produced by comparisons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cond {
    Eq,
    Ne,
    Lt,
    Le,
}

impl fmt::Display for Cond {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Cond::Eq => "eq",
            Cond::Ne => "ne",
            Cond::Lt => "lt",
            Cond::Le => "le",
        };
        write!(f, "{}", name)
    }
}

/// The emitted AArch64 instruction subset.
///
/// The evaluation stack uses 16-byte slots: `Push` is a pre-indexed
/// store, `Pop` a post-indexed load, and `Drop` releases one slot
/// without reading it.
#[derive(Debug, Clone, PartialEq)]
pub enum Instr {
    // Directives and labels
    Global(String), // .global _name
    P2Align(u32),   // .p2align n
    Label(String),  // name:

    // Moves and address arithmetic (64-bit)
    MovImm(Reg, i64),      // mov wd, #imm
    AddImm(Reg, Reg, i32), // add xd, xn, #imm
    SubImm(Reg, Reg, i32), // sub xd, xn, #imm

    // Evaluation stack (16-byte slots)
    Push(Reg), // str xt, [sp, #-16]!
    Pop(Reg),  // ldr xt, [sp], #16
    Drop,      // add sp, sp, #16

    // Memory
    Load(Reg, Reg),                // ldr xd, [xn]
    Store(Reg, Reg),               // str xt, [xn]
    StorePair(Reg, Reg, Reg, i32), // stp xt1, xt2, [xn, #imm]
    LoadPair(Reg, Reg, Reg, i32),  // ldp xt1, xt2, [xn, #imm]

    // Arithmetic (32-bit)
    Add(Reg, Reg, Reg),  // add wd, wn, wm
    Sub(Reg, Reg, Reg),  // sub wd, wn, wm
    Mul(Reg, Reg, Reg),  // mul wd, wn, wm
    Sdiv(Reg, Reg, Reg), // sdiv wd, wn, wm

    // Comparison
    Cmp(Reg, Reg),   // cmp wn, wm
    CSet(Reg, Cond), // cset wd, cond

    // Control flow
    Cbz(Reg, String), // cbz wt, label
    B(String),        // b label
    Bl(String),       // bl symbol
    Ret,              // ret
}

impl Instr {
    /// Net effect of this instruction on the evaluation stack, in
    /// slots. The stack-balance invariant is checked in tests by
    /// summing this over a function body.
    pub fn stack_effect(&self) -> i32 {
        match self {
            Instr::Push(_) => 1,
            Instr::Pop(_) | Instr::Drop => -1,
            _ => 0,
        }
    }
}

impl fmt::Display for Instr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instr::Global(symbol) => write!(f, ".global {}", symbol),
            Instr::P2Align(n) => write!(f, ".p2align {}", n),
            Instr::Label(name) => write!(f, "{}:", name),

            Instr::MovImm(rd, imm) => write!(f, "mov {}, #{}", rd.name32(), imm),
            Instr::AddImm(rd, rn, imm) => {
                write!(f, "add {}, {}, #{}", rd.name64(), rn.name64(), imm)
            }
            Instr::SubImm(rd, rn, imm) => {
                write!(f, "sub {}, {}, #{}", rd.name64(), rn.name64(), imm)
            }

            Instr::Push(rt) => write!(f, "str {}, [sp, #-16]!", rt.name64()),
            Instr::Pop(rt) => write!(f, "ldr {}, [sp], #16", rt.name64()),
            Instr::Drop => write!(f, "add sp, sp, #16"),

            Instr::Load(rd, rn) => write!(f, "ldr {}, [{}]", rd.name64(), rn.name64()),
            Instr::Store(rt, rn) => write!(f, "str {}, [{}]", rt.name64(), rn.name64()),
            Instr::StorePair(rt1, rt2, rn, imm) => write!(
                f,
                "stp {}, {}, [{}, #{}]",
                rt1.name64(),
                rt2.name64(),
                rn.name64(),
                imm
            ),
            Instr::LoadPair(rt1, rt2, rn, imm) => write!(
                f,
                "ldp {}, {}, [{}, #{}]",
                rt1.name64(),
                rt2.name64(),
                rn.name64(),
                imm
            ),

            Instr::Add(rd, rn, rm) => write!(
                f,
                "add {}, {}, {}",
                rd.name32(),
                rn.name32(),
                rm.name32()
            ),
            Instr::Sub(rd, rn, rm) => write!(
                f,
                "sub {}, {}, {}",
                rd.name32(),
                rn.name32(),
                rm.name32()
            ),
            Instr::Mul(rd, rn, rm) => write!(
                f,
                "mul {}, {}, {}",
                rd.name32(),
                rn.name32(),
                rm.name32()
            ),
            Instr::Sdiv(rd, rn, rm) => write!(
                f,
                "sdiv {}, {}, {}",
                rd.name32(),
                rn.name32(),
                rm.name32()
            ),

            Instr::Cmp(rn, rm) => write!(f, "cmp {}, {}", rn.name32(), rm.name32()),
            Instr::CSet(rd, cond) => write!(f, "cset {}, {}", rd.name32(), cond),

            Instr::Cbz(rt, label) => write!(f, "cbz {}, {}", rt.name32(), label),
            Instr::B(label) => write!(f, "b {}", label),
            Instr::Bl(symbol) => write!(f, "bl {}", symbol),
            Instr::Ret => write!(f, "ret"),
        }
    }
}
