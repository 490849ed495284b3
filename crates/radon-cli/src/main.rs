use std::{env, fs, path::Path, process::ExitCode};

use radon::{Machine, SecurityGate, StdInput, StdPrint, run_with_context};

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();
    let mut hide_paths = false;
    let mut script: Option<&str> = None;
    for arg in &args[1..] {
        match arg.as_str() {
            "--hide-paths" => hide_paths = true,
            path if script.is_none() => script = Some(path),
            unexpected => {
                eprintln!("error: unexpected argument '{unexpected}'");
                return usage();
            }
        }
    }
    let Some(path) = script else {
        return usage();
    };

    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) => {
            eprintln!("error: could not read {path}: {err}");
            return ExitCode::FAILURE;
        }
    };

    // User modules resolve relative to the script's directory.
    let import_cwd = Path::new(path).parent().map(Path::to_path_buf);

    let mut stdout = StdPrint;
    let mut stdin = StdInput;
    let mut machine = Machine::new(&mut stdout, &mut stdin)
        .with_security(SecurityGate::interactive(vec![]))
        .with_hidden_paths(hide_paths);

    let output = run_with_context(path, &text, &mut machine, None, None, import_cwd);
    drop(machine);
    StdPrint::flush();

    match output.error {
        Some(error) => {
            eprintln!("{error}");
            ExitCode::FAILURE
        }
        None => ExitCode::SUCCESS,
    }
}

fn usage() -> ExitCode {
    eprintln!("usage: radon <script.rn> [--hide-paths]");
    ExitCode::FAILURE
}
