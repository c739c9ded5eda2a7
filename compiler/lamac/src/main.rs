//! Lama command-line driver.
//!
//! ```text
//! lama run <file.lama> [args..]
//! lama eval <expr> [name=value..]
//! ```
//!
//! Set `RUST_LOG=lama_eval=debug` (or `trace`) to see runtime events.

mod commands;
mod diagnostic;

use std::sync::Once;

use commands::{eval_expression, run_file, RunOptions};

static TRACING_INIT: Once = Once::new();

/// Install a subscriber, but only when `RUST_LOG` asks for one.
fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(filter)
                .init();
        }
    });
}

fn main() {
    init_tracing();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        print_usage();
        return;
    }

    let mut options = RunOptions::default();
    let rest: Vec<&str> = args[2..]
        .iter()
        .map(String::as_str)
        .filter(|arg| {
            if *arg == "--alloc-stats" {
                options.alloc_stats = true;
                false
            } else {
                true
            }
        })
        .collect();

    let code = match args[1].as_str() {
        "run" => {
            let Some((path, program_args)) = rest.split_first() else {
                eprintln!("Usage: lama run <file.lama> [args..]");
                std::process::exit(1);
            };
            run_file(path, program_args, &options)
        }
        "eval" => {
            let Some((expression, bindings)) = rest.split_first() else {
                eprintln!("Usage: lama eval <expr> [name=value..]");
                std::process::exit(1);
            };
            eval_expression(expression, bindings, &options)
        }
        "help" | "--help" | "-h" => {
            print_usage();
            0
        }
        "version" | "--version" | "-V" => {
            println!("lama {}", env!("CARGO_PKG_VERSION"));
            0
        }
        other => {
            eprintln!("error: unknown command `{other}`");
            print_usage();
            1
        }
    };
    std::process::exit(code);
}

fn print_usage() {
    println!("Lama runtime");
    println!();
    println!("Usage: lama <command> [options]");
    println!();
    println!("Commands:");
    println!("  run <file> [args..]        Run a program's main function");
    println!("  eval <expr> [name=value..] Evaluate an expression over named arguments");
    println!("  help                       Show this message");
    println!("  version                    Show version information");
    println!();
    println!("Options:");
    println!("  --alloc-stats              Report object allocations on exit");
}
