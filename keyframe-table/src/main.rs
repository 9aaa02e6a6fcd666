use std::env;
use std::io;
use std::path::Path;
use std::process;

use keyframe_table::{parse_rows, read_rows, TableOptions};

fn main() {
    if let Err(err) = run() {
        eprintln!("{}: {err}", env!("CARGO_PKG_NAME"));
        process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let mut args = env::args();
    let program = args
        .next()
        .unwrap_or_else(|| env!("CARGO_PKG_NAME").to_string());

    let mut force_tab = false;
    let mut input = None;
    for arg in args {
        match arg.as_str() {
            flag if is_help_flag(flag) => {
                print_help(&program);
                return Ok(());
            }
            flag if is_version_flag(flag) => {
                println!("{}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            "-t" | "--tab" => force_tab = true,
            "-" if input.is_none() => input = Some(Input::Stdin),
            path if input.is_none() => input = Some(Input::File(path.to_string())),
            extra => {
                return Err(format!("unexpected argument: {extra}\n{}", usage(&program)));
            }
        }
    }

    let rows = match input.unwrap_or(Input::Stdin) {
        Input::Stdin => {
            let options = if force_tab {
                TableOptions::tab()
            } else {
                TableOptions::comma()
            };
            parse_rows(io::stdin().lock(), options).map_err(|err| err.to_string())?
        }
        Input::File(path) => {
            let path = Path::new(&path);
            let options = if force_tab {
                TableOptions::tab()
            } else {
                TableOptions::for_path(path)
            };
            read_rows(path, options)
                .map_err(|err| err.to_string())?
                .ok_or_else(|| format!("no such file: '{}'", path.display()))?
        }
    };

    let json = serde_json::to_string_pretty(&rows)
        .map_err(|err| format!("failed to serialize JSON: {err}"))?;
    println!("{json}");
    Ok(())
}

enum Input {
    Stdin,
    File(String),
}

fn is_help_flag(arg: &str) -> bool {
    arg == "-h" || arg == "--help"
}

fn is_version_flag(arg: &str) -> bool {
    arg == "-V" || arg == "--version"
}

fn print_help(program: &str) {
    println!(
        "{}\n\nOptions:\n  -t, --tab       Treat input as tab-delimited\n  -h, --help      Show this message\n  -V, --version   Print package version",
        usage(program)
    );
}

fn usage(program: &str) -> String {
    format!(
        "Usage: {program} [-t] [TABLE_FILE|-]\n\n\
         Provide a path to a keyframe table or '-' to read from stdin. \
         When no path is passed, stdin is used. Files ending in .tsv are read as tab-delimited."
    )
}
