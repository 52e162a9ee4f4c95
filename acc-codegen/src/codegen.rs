//! Stack-machine code generator
//!
//! Walks each function's AST and lowers it to AArch64 instructions using
//! an evaluation stack of 16-byte slots. Every expression leaves exactly
//! one value on top of that stack; every statement leaves the stack
//! balanced (expression statements and `for` clauses discard their
//! residual value), so no drift accumulates over loops and blocks.
//!
//! The label-sequence counter is owned by the generator, never global,
//! and each control construct captures its sequence number before
//! lowering children so nested constructs cannot clobber outer labels.

use crate::asm::{Cond, Instr, Reg};
use acc_common::CompilerError;
use acc_frontend::{BinaryOp, Expr, Function, Program, Stmt, MAX_CALL_ARGS};

/// Integer argument registers, in calling-convention order
pub const ARG_REGS: [Reg; MAX_CALL_ARGS] = [Reg::X0, Reg::X1, Reg::X2, Reg::X3, Reg::X4, Reg::X5];

/// AArch64 code generator
pub struct CodeGenerator {
    instrs: Vec<Instr>,
    label_seq: u32,
    /// Epilogue label of the function currently being lowered
    epilogue_label: String,
}

impl CodeGenerator {
    pub fn new() -> Self {
        Self {
            instrs: Vec::new(),
            label_seq: 0,
            epilogue_label: String::new(),
        }
    }

    /// Lower a whole program to an instruction list
    pub fn generate(mut self, program: &Program) -> Result<Vec<Instr>, CompilerError> {
        for function in &program.functions {
            self.gen_function(function)?;
        }
        log::debug!("generated {} instructions", self.instrs.len());
        Ok(self.instrs)
    }

    fn emit(&mut self, instr: Instr) {
        self.instrs.push(instr);
    }

    /// Allocate a fresh label-sequence number
    fn new_label_seq(&mut self) -> u32 {
        self.label_seq += 1;
        self.label_seq
    }

    fn gen_function(&mut self, function: &Function) -> Result<(), CompilerError> {
        let symbol = format!("_{}", function.name);
        self.epilogue_label = format!("Lreturn_{}", function.name);

        let frame_size = function.frame_size;
        // The saved fp/lr pair sits above the locals; reserving it
        // together with the frame keeps sp 16-byte aligned.
        let total_size = frame_size + 16;

        self.emit(Instr::Global(symbol.clone()));
        self.emit(Instr::P2Align(2));
        self.emit(Instr::Label(symbol));

        // Prologue
        self.emit(Instr::SubImm(Reg::Sp, Reg::Sp, total_size));
        self.emit(Instr::StorePair(Reg::Fp, Reg::Lr, Reg::Sp, frame_size));
        self.emit(Instr::AddImm(Reg::Fp, Reg::Sp, frame_size));

        // Spill incoming arguments into their local slots. X6 is the
        // address scratch so the not-yet-saved argument registers
        // stay intact.
        for (i, &param) in function.params.iter().enumerate() {
            let offset = function.local(param).offset;
            self.emit(Instr::SubImm(Reg::X6, Reg::Fp, offset));
            self.emit(Instr::Store(ARG_REGS[i], Reg::X6));
        }

        for stmt in &function.body {
            self.gen_stmt(stmt, function)?;
        }

        // Epilogue: every `return` branches here; the return value is
        // already in x0. Resetting sp from the frame pointer also
        // discards anything left on the evaluation stack.
        self.emit(Instr::Label(self.epilogue_label.clone()));
        self.emit(Instr::SubImm(Reg::Sp, Reg::Fp, frame_size));
        self.emit(Instr::LoadPair(Reg::Fp, Reg::Lr, Reg::Sp, frame_size));
        self.emit(Instr::AddImm(Reg::Sp, Reg::Sp, total_size));
        self.emit(Instr::Ret);

        Ok(())
    }

    fn gen_stmt(&mut self, stmt: &Stmt, function: &Function) -> Result<(), CompilerError> {
        match stmt {
            Stmt::Expr(expr) => {
                self.gen_expr(expr, function)?;
                self.emit(Instr::Drop);
            }

            Stmt::Return(expr) => {
                self.gen_expr(expr, function)?;
                self.emit(Instr::Pop(Reg::X0));
                self.emit(Instr::B(self.epilogue_label.clone()));
            }

            Stmt::If { cond, then, els } => {
                let seq = self.new_label_seq();
                let end_label = format!("Lend{}", seq);

                self.gen_expr(cond, function)?;
                self.emit(Instr::Pop(Reg::X0));

                if let Some(els) = els {
                    let else_label = format!("Lelse{}", seq);
                    self.emit(Instr::Cbz(Reg::X0, else_label.clone()));
                    self.gen_stmt(then, function)?;
                    self.emit(Instr::B(end_label.clone()));
                    self.emit(Instr::Label(else_label));
                    self.gen_stmt(els, function)?;
                } else {
                    self.emit(Instr::Cbz(Reg::X0, end_label.clone()));
                    self.gen_stmt(then, function)?;
                }
                self.emit(Instr::Label(end_label));
            }

            Stmt::While { cond, body } => {
                let seq = self.new_label_seq();
                let begin_label = format!("Lbegin{}", seq);
                let end_label = format!("Lend{}", seq);

                self.emit(Instr::Label(begin_label.clone()));
                self.gen_expr(cond, function)?;
                self.emit(Instr::Pop(Reg::X0));
                self.emit(Instr::Cbz(Reg::X0, end_label.clone()));
                self.gen_stmt(body, function)?;
                self.emit(Instr::B(begin_label));
                self.emit(Instr::Label(end_label));
            }

            Stmt::For {
                init,
                cond,
                step,
                body,
            } => {
                let seq = self.new_label_seq();
                let begin_label = format!("Lbegin{}", seq);
                let end_label = format!("Lend{}", seq);

                if let Some(init) = init {
                    self.gen_expr(init, function)?;
                    self.emit(Instr::Drop);
                }
                self.emit(Instr::Label(begin_label.clone()));
                // An absent condition means the loop always enters
                // its body.
                if let Some(cond) = cond {
                    self.gen_expr(cond, function)?;
                    self.emit(Instr::Pop(Reg::X0));
                    self.emit(Instr::Cbz(Reg::X0, end_label.clone()));
                }
                self.gen_stmt(body, function)?;
                if let Some(step) = step {
                    self.gen_expr(step, function)?;
                    self.emit(Instr::Drop);
                }
                self.emit(Instr::B(begin_label));
                self.emit(Instr::Label(end_label));
            }

            Stmt::Block(stmts) => {
                for stmt in stmts {
                    self.gen_stmt(stmt, function)?;
                }
            }
        }

        Ok(())
    }

    /// Lower one expression. Net stack effect: exactly one pushed value.
    fn gen_expr(&mut self, expr: &Expr, function: &Function) -> Result<(), CompilerError> {
        match expr {
            Expr::Num(value) => {
                self.emit(Instr::MovImm(Reg::X0, *value));
                self.emit(Instr::Push(Reg::X0));
            }

            Expr::Var(_) => {
                self.gen_addr(expr, function)?;
                self.emit(Instr::Pop(Reg::X0));
                self.emit(Instr::Load(Reg::X0, Reg::X0));
                self.emit(Instr::Push(Reg::X0));
            }

            Expr::Assign { target, value } => {
                self.gen_addr(target, function)?;
                self.gen_expr(value, function)?;
                self.emit(Instr::Pop(Reg::X1));
                self.emit(Instr::Pop(Reg::X0));
                self.emit(Instr::Store(Reg::X1, Reg::X0));
                // The stored value is the expression's result.
                self.emit(Instr::Push(Reg::X1));
            }

            Expr::Binary { op, lhs, rhs } => {
                self.gen_expr(lhs, function)?;
                self.gen_expr(rhs, function)?;
                self.emit(Instr::Pop(Reg::X1));
                self.emit(Instr::Pop(Reg::X0));

                match op {
                    BinaryOp::Add => self.emit(Instr::Add(Reg::X0, Reg::X0, Reg::X1)),
                    BinaryOp::Sub => self.emit(Instr::Sub(Reg::X0, Reg::X0, Reg::X1)),
                    BinaryOp::Mul => self.emit(Instr::Mul(Reg::X0, Reg::X0, Reg::X1)),
                    BinaryOp::Div => self.emit(Instr::Sdiv(Reg::X0, Reg::X0, Reg::X1)),
                    BinaryOp::Equal => {
                        self.emit(Instr::Cmp(Reg::X0, Reg::X1));
                        self.emit(Instr::CSet(Reg::X0, Cond::Eq));
                    }
                    BinaryOp::NotEqual => {
                        self.emit(Instr::Cmp(Reg::X0, Reg::X1));
                        self.emit(Instr::CSet(Reg::X0, Cond::Ne));
                    }
                    BinaryOp::Less => {
                        self.emit(Instr::Cmp(Reg::X0, Reg::X1));
                        self.emit(Instr::CSet(Reg::X0, Cond::Lt));
                    }
                    BinaryOp::LessEqual => {
                        self.emit(Instr::Cmp(Reg::X0, Reg::X1));
                        self.emit(Instr::CSet(Reg::X0, Cond::Le));
                    }
                }

                self.emit(Instr::Push(Reg::X0));
            }

            Expr::Call { name, args } => {
                if args.len() > ARG_REGS.len() {
                    return Err(CompilerError::internal_error(format!(
                        "call to `{}` with {} arguments reached the code generator",
                        name,
                        args.len()
                    )));
                }

                for arg in args {
                    self.gen_expr(arg, function)?;
                }
                // Arguments were pushed left to right, so the last one
                // is on top: pop into the highest register first.
                for i in (0..args.len()).rev() {
                    self.emit(Instr::Pop(ARG_REGS[i]));
                }
                self.emit(Instr::Bl(format!("_{}", name)));
                self.emit(Instr::Push(Reg::X0));
            }
        }

        Ok(())
    }

    /// Push the address of an lvalue onto the evaluation stack.
    ///
    /// The parser only accepts variables as assignment targets, so any
    /// other node here is a compiler defect.
    fn gen_addr(&mut self, expr: &Expr, function: &Function) -> Result<(), CompilerError> {
        match expr {
            Expr::Var(id) => {
                let offset = function.local(*id).offset;
                self.emit(Instr::SubImm(Reg::X0, Reg::Fp, offset));
                self.emit(Instr::Push(Reg::X0));
                Ok(())
            }
            other => Err(CompilerError::internal_error(format!(
                "not an lvalue: {:?}",
                other
            ))),
        }
    }
}

impl Default for CodeGenerator {
    fn default() -> Self {
        Self::new()
    }
}
