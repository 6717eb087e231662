//! Interactive session against one worker, mirroring what a client
//! would see over the command channel: one dictionary, one gas budget
//! per line, residuals echoed back as text.

use catena::combinators::combinators;
use catena::wire::{Worker, is_quit};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::panic;
use std::process;

fn main() {
    let result = panic::catch_unwind(run_repl);

    if let Err(panic_info) = result {
        eprintln!("The session encountered an unexpected error and must exit.");

        if let Some(msg) = panic_info.downcast_ref::<&str>() {
            eprintln!("Error: {msg}");
        } else if let Some(msg) = panic_info.downcast_ref::<String>() {
            eprintln!("Error: {msg}");
        } else {
            eprintln!("Error: Unknown panic occurred");
        }

        process::exit(1);
    }
}

fn run_repl() {
    println!("Catena rewriting session");
    println!("Programs are reduced against this session's dictionary.");
    println!("Try: [\"Hello\"] \"greet\" Define   then: greet Copy");
    println!("Type :help for commands; {{Quit}} or Ctrl+C ends the session.");
    println!();

    let mut rl = DefaultEditor::new().expect("Could not initialize line editor");
    let mut worker = Worker::new();

    loop {
        match rl.readline("catena> ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                let _ = rl.add_history_entry(line);

                match line {
                    ":help" => {
                        print_help();
                        continue;
                    }
                    ":dict" => {
                        print_dictionary(&worker);
                        continue;
                    }
                    ":ops" => {
                        print_instruction_set();
                        continue;
                    }
                    _ => {}
                }

                if is_quit(line) {
                    println!("Session closed.");
                    break;
                }

                match worker.run(line) {
                    Ok(result) if result.is_empty() => {}
                    Ok(result) => println!("{result}"),
                    Err(err) => println!("{err}"),
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                println!("Session closed.");
                break;
            }
            Err(err) => {
                eprintln!("Input error: {err}");
                break;
            }
        }
    }
}

fn print_help() {
    println!("Commands:");
    println!("  :help    show this help");
    println!("  :dict    list this session's definitions");
    println!("  :ops     list the instruction set");
    println!("  {{Quit}}   end the session");
    println!();
    println!("Anything else is read as a program and reduced; the residual");
    println!("is printed back (nothing is printed for the empty residual).");
}

fn print_dictionary(worker: &Worker) {
    let bindings = worker.dictionary().bindings();
    if bindings.is_empty() {
        println!("No definitions yet.");
        return;
    }
    for (name, body) in bindings {
        println!("  {name} = [{body}]");
    }
}

fn print_instruction_set() {
    for op in combinators() {
        println!("  {:<8} arity {}", op.name, op.arity);
    }
}
