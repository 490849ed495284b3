use pretty_assertions::assert_eq;
use radon::{CollectStringPrint, ErrorKind, Machine, NoPrint, QueuedInput, RunOutput, StdInput, run};

fn run_code(src: &str) -> (RunOutput, String) {
    let mut out = CollectStringPrint::new();
    let mut input = QueuedInput::new(Vec::<String>::new());
    let mut machine = Machine::new(&mut out, &mut input);
    let output = run("test.rn", src, &mut machine);
    drop(machine);
    (output, out.into_output())
}

#[test]
fn runtime_traceback_lists_frames_innermost_last() {
    let src = "fun boom() {\n    return 1 / 0\n}\nboom()";
    let (output, _) = run_code(src);
    let error = output.error.expect("expected an error");
    assert_eq!(
        error.to_string(),
        "Traceback (most recent call last):\n  \
         File \"test.rn\", line 4, in <program>\n  \
         File \"test.rn\", line 2, in boom\n\
         RTError: Division by zero"
    );
}

#[test]
fn nested_calls_stack_frames() {
    let src = "fun inner() {\n    return missing\n}\nfun outer() {\n    return inner()\n}\nouter()";
    let (output, _) = run_code(src);
    let error = output.error.expect("expected an error");
    let rendered = error.to_string();
    let program_at = rendered.find("<program>").unwrap();
    let outer_at = rendered.find("in outer").unwrap();
    let inner_at = rendered.find("in inner").unwrap();
    assert!(program_at < outer_at && outer_at < inner_at, "rendered: {rendered}");
    assert!(rendered.ends_with("NameError: 'missing' is not defined"));
}

#[test]
fn syntax_errors_carry_positions() {
    let (output, _) = run_code("let = 5");
    let error = output.error.expect("expected an error");
    assert_eq!(error.kind, ErrorKind::InvalidSyntaxError);
    assert_eq!(error.span.start.line, 1);
    assert_eq!(error.span.start.column, 5);
}

#[test]
fn lexer_errors_surface_through_run() {
    let (output, _) = run_code("let a = 1 $ 2");
    let error = output.error.expect("expected an error");
    assert_eq!(error.kind, ErrorKind::IllegalCharError);
    assert_eq!(error.message, "'$'");
}

#[test]
fn hide_paths_redacts_file_names() {
    let mut out = NoPrint;
    let mut input = StdInput;
    let mut machine = Machine::new(&mut out, &mut input).with_hidden_paths(true);
    let output = run("secret/location.rn", "oops(", &mut machine);
    let error = output.error.expect("expected an error");
    assert_eq!(error.span.start.file.as_ref(), "[REDACTED]");
}

#[test]
fn loop_signals_die_at_the_program_boundary() {
    for src in ["break", "continue", "continue_outer"] {
        let (output, _) = run_code(src);
        assert!(output.error.is_none(), "{src} must not error");
        assert!(output.value.is_none(), "{src} must not produce a value");
        assert!(!output.should_exit);
    }
}

#[test]
fn top_level_return_yields_its_value() {
    let (output, _) = run_code("return 5");
    assert!(output.error.is_none());
    assert_eq!(output.value.map(|v| v.display_string()), Some("5".to_owned()));
}

#[test]
fn error_wins_over_later_statements() {
    let (output, stdout) = run_code("print(\"a\")\nmissing\nprint(\"b\")");
    assert!(output.error.is_some());
    assert_eq!(stdout, "a\n");
}
