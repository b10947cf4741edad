mod builtins;
mod env;
mod error;
mod eval;
mod expand;
mod interp;
mod lazy;
mod package;
mod parser;
mod place;
mod value;

use clap::Parser;
use rustyline::error::ReadlineError;
use rustyline::{Config, Editor};
use std::path::PathBuf;

use error::LispError;
use interp::Interp;

/// Lisp-family interpreter core, embeddable as a library or driven from
/// this standalone REPL/script runner.
#[derive(Parser, Debug)]
#[command(name = "lispcore")]
#[command(version)]
#[command(about = "A Lisp-family interpreter core")]
struct CliArgs {
    /// Script file to execute (optional - if not provided, starts REPL)
    #[arg(value_name = "FILE")]
    script: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();
    let mut interp = Interp::new();

    if let Some(script_path) = args.script {
        run_script(&mut interp, &script_path)?;
        return Ok(());
    }

    run_repl(&mut interp)
}

fn run_script(interp: &mut Interp, path: &PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read script file {}: {e}", path.display()))?;
    let forms = parser::parse_all(&contents, &mut interp.packages).map_err(|e| format!("parse error: {e}"))?;
    for form in &forms {
        let expanded = interp.expand(form).map_err(LispError::from_unwind)?;
        interp.eval_top(&expanded).map_err(LispError::from_unwind)?;
    }
    Ok(())
}

fn run_repl(interp: &mut Interp) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::builder().auto_add_history(true).build();
    let mut rl: Editor<()> = Editor::with_config(config).map_err(|e| format!("failed to initialize REPL: {e}"))?;

    let history_file = ".lispcore_history";
    let _ = rl.load_history(history_file);

    println!("lispcore {}", env!("CARGO_PKG_VERSION"));
    println!("(quit) or (exit) to leave, (clear) to clear the screen");

    loop {
        let readline = rl.readline("lisp> ");
        match readline {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }
                match line.trim() {
                    "(quit)" | "(exit)" => {
                        println!("Goodbye!");
                        break;
                    }
                    "(clear)" => {
                        print!("\x1B[2J\x1B[H");
                        continue;
                    }
                    _ => {}
                }
                match interp.read_one(&line) {
                    Ok(form) => match interp.expand(&form).and_then(|expanded| interp.eval_top(&expanded)) {
                        Ok(result) => println!("=> {result}"),
                        Err(unwind) => eprintln!("Error: {}", LispError::from_unwind(unwind)),
                    },
                    Err(e) => eprintln!("Parse error: {e}"),
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("\nGoodbye!");
                break;
            }
            Err(err) => {
                eprintln!("Error: {err}");
                break;
            }
        }
    }

    let _ = rl.save_history(history_file);
    Ok(())
}
