//! AArch64 Teaching C Compiler Driver
//!
//! Command-line entry point. Reads one source unit (a file or an inline
//! string), runs the sequential pipeline (lex, parse, frame layout,
//! code generation), and writes the assembly text to a file or stdout.
//!
//! All fatal errors go to stderr with a caret snippet where a source
//! position is available, and the process exits with a non-zero status
//! without emitting any assembly.

use acc_codegen::generate_assembly;
use acc_common::{render_snippet, CompilerError};
use acc_frontend::Frontend;
use clap::Parser;
use std::fs;
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(name = "acc")]
#[command(about = "AArch64 Teaching C Compiler")]
#[command(version = "0.1.0")]
struct Cli {
    /// Input source file
    input: Option<PathBuf>,

    /// Compile an inline source string instead of a file
    #[arg(short = 'e', long = "expr", conflicts_with = "input")]
    expr: Option<String>,

    /// Output assembly file (defaults to stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Dump the token stream as JSON to stderr
    #[arg(long)]
    emit_tokens: bool,

    /// Dump the parsed AST as JSON to stderr
    #[arg(long)]
    emit_ast: bool,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let source = match load_source(&cli) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("error: {}", e);
            process::exit(1);
        }
    };

    let asm = match compile(&source, &cli) {
        Ok(asm) => asm,
        Err(e) => {
            eprintln!("error: {}", e);
            if let Some(location) = e.location() {
                eprintln!("{}", render_snippet(&source, location));
            }
            process::exit(1);
        }
    };

    if let Err(e) = write_output(&cli, &asm) {
        eprintln!("error: {}", e);
        process::exit(1);
    }
}

fn load_source(cli: &Cli) -> Result<String, CompilerError> {
    if let Some(expr) = &cli.expr {
        return Ok(expr.clone());
    }
    if let Some(path) = &cli.input {
        return Ok(fs::read_to_string(path)?);
    }
    Err(CompilerError::IoError {
        message: "no input: pass a source file or use --expr".to_string(),
    })
}

/// Run the full pipeline on one source unit.
///
/// The debug dumps go to stderr so that stdout carries nothing but the
/// assembly text when no output file is given.
fn compile(source: &str, cli: &Cli) -> Result<String, CompilerError> {
    let tokens = Frontend::tokenize_source(source)?;
    if cli.emit_tokens {
        eprintln!("{}", to_json(&tokens)?);
    }

    let mut program = Frontend::parse_tokens(tokens)?;
    if cli.emit_ast {
        eprintln!("{}", to_json(&program)?);
    }

    log::info!(
        "compiling {} function(s) from {} byte(s) of source",
        program.functions.len(),
        source.len()
    );
    generate_assembly(&mut program)
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, CompilerError> {
    serde_json::to_string_pretty(value).map_err(|e| CompilerError::internal_error(e.to_string()))
}

fn write_output(cli: &Cli, asm: &str) -> Result<(), CompilerError> {
    match &cli.output {
        Some(path) => {
            fs::write(path, asm)?;
            log::info!("assembly written to {}", path.display());
        }
        None => print!("{}", asm),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli_for(expr: &str) -> Cli {
        Cli {
            input: None,
            expr: Some(expr.to_string()),
            output: None,
            emit_tokens: false,
            emit_ast: false,
        }
    }

    #[test]
    fn test_compile_end_to_end() {
        let cli = cli_for("main() { return 42; }");
        let asm = compile(cli.expr.as_deref().unwrap(), &cli).unwrap();

        assert!(asm.contains(".global _main"));
        assert!(asm.contains("mov w0, #42"));
        assert!(asm.contains("ret"));
    }

    #[test]
    fn test_debug_dumps_do_not_pollute_assembly() {
        let mut cli = cli_for("main() { return 7; }");
        cli.emit_tokens = true;
        cli.emit_ast = true;

        let asm = compile(cli.expr.as_deref().unwrap(), &cli).unwrap();
        // The returned text is what lands on stdout; the JSON dumps go
        // to stderr, so every line here is a label or an instruction.
        for line in asm.lines() {
            assert!(
                line.starts_with('\t') || line.ends_with(':'),
                "non-assembly line in output: {:?}",
                line
            );
        }
    }

    #[test]
    fn test_compile_reports_parse_error() {
        let cli = cli_for("main() { return 42 }");
        let err = compile(cli.expr.as_deref().unwrap(), &cli).unwrap_err();
        assert!(matches!(err, CompilerError::ParseError { .. }));
    }

    #[test]
    fn test_compile_reports_lex_error_with_location() {
        let cli = cli_for("main() { return #; }");
        let err = compile(cli.expr.as_deref().unwrap(), &cli).unwrap_err();
        assert!(err.location().is_some());
    }

    #[test]
    fn test_load_source_requires_input() {
        let cli = Cli {
            input: None,
            expr: None,
            output: None,
            emit_tokens: false,
            emit_ast: false,
        };
        assert!(load_source(&cli).is_err());
    }
}
