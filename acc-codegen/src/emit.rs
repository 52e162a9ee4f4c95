//! Assembly text emission
//!
//! Renders an instruction list to the line-oriented textual form a
//! native assembler consumes: instruction and directive lines are
//! tab-indented, label lines are flush left.

use crate::asm::Instr;

/// Render instructions to assembly text
pub fn emit(instrs: &[Instr]) -> String {
    let mut out = String::new();

    for instr in instrs {
        match instr {
            Instr::Label(_) => out.push_str(&instr.to_string()),
            _ => {
                out.push('\t');
                out.push_str(&instr.to_string());
            }
        }
        out.push('\n');
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asm::Reg;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_labels_are_flush_left() {
        let instrs = vec![
            Instr::Global("_main".to_string()),
            Instr::P2Align(2),
            Instr::Label("_main".to_string()),
            Instr::MovImm(Reg::X0, 42),
            Instr::Ret,
        ];

        let text = emit(&instrs);
        assert_eq!(
            text,
            "\t.global _main\n\t.p2align 2\n_main:\n\tmov w0, #42\n\tret\n"
        );
    }

    #[test]
    fn test_empty_input_emits_nothing() {
        assert_eq!(emit(&[]), "");
    }
}
