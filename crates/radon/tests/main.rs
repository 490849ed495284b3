use pretty_assertions::assert_eq;
use radon::{CollectStringPrint, Machine, QueuedInput, RunOutput, Value, run};

fn run_code(src: &str) -> (RunOutput, String) {
    let mut out = CollectStringPrint::new();
    let mut input = QueuedInput::new(Vec::<String>::new());
    let mut machine = Machine::new(&mut out, &mut input);
    let output = run("test.rn", src, &mut machine);
    drop(machine);
    (output, out.into_output())
}

fn eval_value(src: &str) -> Value {
    let (output, _) = run_code(src);
    assert!(output.error.is_none(), "unexpected error: {:?}", output.error);
    output.value.expect("run produced no value")
}

#[test]
fn arithmetic_result() {
    assert_eq!(eval_value("40 + 2"), Value::Int(42));
    assert_eq!(eval_value("7 / 2"), Value::Float(3.5));
    assert_eq!(eval_value("2 ^ 10"), Value::Int(1024));
    assert_eq!(eval_value("7 % 3"), Value::Int(1));
    assert_eq!(eval_value("0 - 7 % 3"), Value::Int(-1));
}

#[test]
fn print_writes_line_and_returns_null() {
    let (output, stdout) = run_code("print(\"hi\")");
    assert!(output.error.is_none());
    assert_eq!(stdout, "hi\n");
    assert_eq!(output.value, Some(Value::Null));
}

#[test]
fn print_of_cast_arithmetic() {
    let (_, stdout) = run_code("print(int(\"42\") + 1)");
    assert_eq!(stdout, "43\n");
}

#[test]
fn arr_chunk_splits_into_pairs() {
    let value = eval_value("let a = [1, 2, 3, 4, 5]\narr_chunk(a, 2)");
    assert_eq!(value.display_string(), "[[1, 2], [3, 4], [5]]");
}

#[test]
fn string_class_upper() {
    let value = eval_value("let s = String(\"Hello\")\ns.upper()");
    assert_eq!(value, Value::str("HELLO"));
}

#[test]
fn default_arguments() {
    assert_eq!(eval_value("fun f(x, y=2) -> x + y\nf(3)"), Value::Int(5));
    assert_eq!(eval_value("fun f(x, y=2) -> x + y\nf(3, 4)"), Value::Int(7));
}

#[test]
fn too_few_args_error() {
    let (output, _) = run_code("fun f(x, y=2) -> x + y\nf()");
    let error = output.error.expect("expected an error");
    assert_eq!(error.kind, radon::ErrorKind::RTError);
    assert_eq!(error.message, "too few args passed into 'f'");
}

#[test]
fn keyword_arguments_on_user_functions() {
    assert_eq!(eval_value("fun f(x, y=2) -> x + y\nf(3, y=10)"), Value::Int(13));
}

#[test]
fn keyword_arguments_rejected_for_builtins() {
    let (output, _) = run_code("print(value=1)");
    let error = output.error.expect("expected an error");
    assert_eq!(error.message, "Keyword arguments are not yet supported for built-in functions.");
}

#[test]
fn exit_propagates_through_frames() {
    let (output, stdout) = run_code("fun f() {\n    while true {\n        exit()\n    }\n}\nprint(\"before\")\nf()\nprint(\"after\")");
    assert!(output.should_exit);
    assert!(output.error.is_none());
    assert_eq!(stdout, "before\n");
}

#[test]
fn definitions_persist_across_runs_on_one_thread() {
    let mut out = CollectStringPrint::new();
    let mut input = QueuedInput::new(Vec::<String>::new());
    let mut machine = Machine::new(&mut out, &mut input);
    let first = run("a.rn", "fun double(x) -> x * 2", &mut machine);
    assert!(first.error.is_none());
    let second = run("b.rn", "double(21)", &mut machine);
    assert!(second.error.is_none());
    assert_eq!(second.value, Some(Value::Int(42)));
}
