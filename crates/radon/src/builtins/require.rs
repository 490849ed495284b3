//! The `require` builtin: loads a module into the running program.

use std::{
    env,
    fs,
    path::{Path, PathBuf},
};

use super::CallEnv;
use crate::{
    error::ErrorKind,
    interpreter::Machine,
    run::{STDLIBS, base_dir, run_script},
    signal::{RunResult, Signal},
    value::Value,
};

/// Loads a Radon module.
///
/// Standard-library names resolve under `<BASE_DIR>/stdlib/<name>.rn`; any
/// other name must carry the `.rn` extension and resolves against the
/// importing context's working directory. The module runs in a fresh
/// program-level context sharing the global symbol table, so its top-level
/// definitions become visible to the caller. Returns null.
pub fn require(machine: &mut Machine, env: &CallEnv) -> RunResult<Value> {
    let Value::Str(module) = env.arg("module") else {
        return Err(env.rt("Second argument must be string"));
    };

    let path = if STDLIBS.contains(&module.as_ref()) {
        base_dir().join("stdlib").join(format!("{module}.rn"))
    } else {
        let file_name = module.rsplit('/').next().unwrap_or(&module);
        let extension = file_name.rsplit('.').next().unwrap_or("");
        if extension != "rn" {
            return Err(env.rt("A Radon script must have a .rn extension"));
        }
        resolve_user_module(&module, file_name, env)
    };

    let script = fs::read_to_string(&path).map_err(|e| {
        env.tagged(
            ErrorKind::RNModuleNotFoundError,
            format!("No module named '{module}'\n{e}"),
        )
    })?;

    let import_cwd = path.parent().map(Path::to_path_buf);
    let display_path = path.display().to_string();
    let output = run_script(
        &display_path,
        &script,
        machine,
        Some(env.span.start.clone()),
        import_cwd,
    );

    if let Some(error) = output.error {
        return Err(env.rt(format!(
            "Failed to finish executing script \"{display_path}\"\n{}",
            error.as_string()
        )));
    }
    if output.should_exit {
        return Err(Signal::Exit(Value::Null));
    }
    Ok(Value::Null)
}

/// Resolves a user module path: the directory of the (canonicalized) given
/// path, re-joined with the file name. The import cwd of the calling context
/// anchors relative paths; the process cwd is the fallback.
fn resolve_user_module(module: &str, file_name: &str, env: &CallEnv) -> PathBuf {
    let raw = PathBuf::from(module);
    let anchored = if raw.is_absolute() {
        raw
    } else {
        let base = env
            .ctx
            .import_cwd
            .clone()
            .or_else(|| env::current_dir().ok())
            .unwrap_or_default();
        base.join(raw)
    };
    let directory = anchored
        .canonicalize()
        .unwrap_or(anchored.clone())
        .parent()
        .map_or_else(|| anchored.clone(), Path::to_path_buf);
    directory.join(file_name)
}
