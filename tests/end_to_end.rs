use rusty_zarn::treewalk_interpreter::{Interpreter, InterpreterConfig, InterpreterError, Value};
use rusty_zarn::{
    check_source, parse_source, run_prompt, run_source, ZarnError, EX_DATAERR, EX_SOFTWARE,
};

use std::io::Cursor;

fn run_with_config(source: &str, config: InterpreterConfig) -> (String, Result<(), ZarnError>) {
    let mut output: Vec<u8> = vec![];
    let result = {
        let mut interpreter = Interpreter::with_io(&mut output, Cursor::new("")).with_config(config);
        run_source(&mut interpreter, source)
    };
    (String::from_utf8(output).unwrap(), result)
}

fn run(source: &str) -> (String, Result<(), ZarnError>) {
    run_with_config(source, InterpreterConfig::default())
}

fn output_of(source: &str) -> String {
    let (output, result) = run(source);
    if let Err(e) = result {
        panic!("{} failed: {}", source, e);
    }
    output
}

fn runtime_error_of(source: &str) -> InterpreterError {
    match run(source).1 {
        Err(ZarnError::Runtime(e)) => e.error,
        other => panic!("expected a runtime error, got {:?}", other),
    }
}

#[test]
fn test_scenario_sum() {
    assert_eq!(output_of("x = 10; y = 20; say(x + y);"), "30\n");
}

#[test]
fn test_scenario_function() {
    assert_eq!(
        output_of("fun add(a, b) { giveback a + b; } say(add(2, 3));"),
        "5\n"
    );
}

#[test]
fn test_scenario_list() {
    assert_eq!(
        output_of("numbers = [1, 2, 3]; append(numbers, 4); say(len(numbers));"),
        "4\n"
    );
}

#[test]
fn test_scenario_if_else() {
    assert_eq!(
        output_of("x = 1; if x > 0 { say(\"pos\"); } else { say(\"neg\"); }"),
        "pos\n"
    );
}

#[test]
fn test_integral_literals_print_without_fraction() {
    for literal in ["0", "5", "42", "1000000", "123456789"] {
        let source = format!("say({}.0)\nsay({})", literal, literal);
        assert_eq!(output_of(&source), format!("{}\n{}\n", literal, literal));
    }
}

#[test]
fn test_arithmetic_matches_ieee() {
    let numbers = [0.0, 1.0, 2.5, 0.1, 0.2, 7.0, 1e15, 123.456];

    for &a in numbers.iter() {
        for &b in numbers.iter() {
            let source = format!("say({} + {})\nsay({} - {})\nsay({} * {})", a, b, a, b, a, b);
            let expected = format!("{}\n{}\n{}\n", a + b, a - b, a * b);
            assert_eq!(output_of(&source), expected, "{} and {}", a, b);
        }
    }
}

#[test]
fn test_divide_by_zero_is_an_error() {
    for numerator in ["1", "0", "-3.5"] {
        let err = runtime_error_of(&format!("say({} / 0)", numerator));
        assert!(matches!(err, InterpreterError::DivideByZero));
    }
}

#[test]
fn test_string_concatenation() {
    assert_eq!(output_of("say(\"x\" + 1)\nsay(1 + \"x\")"), "x1\n1x\n");
}

#[test]
fn test_short_circuit_returns_deciding_operand() {
    let source = "
        calls = [];
        fun side_effect() { append(calls, 1); giveback \"called\"; }
        say((1 > 2) && side_effect())
        say(0 || side_effect())
        say(len(calls))
        say(nothing || side_effect())
        say(len(calls))
    ";
    assert_eq!(output_of(source), "false\n0\n0\ncalled\n1\n");
}

#[test]
fn test_assignment_creates_binding_in_innermost_scope() {
    let source = "
        fun f() {
            {
                fresh = 1
                {
                    say(fresh)
                }
            }
            say(fresh)
        }
        f()
    ";
    let (output, result) = run(source);
    assert_eq!(output, "1\n");
    match result {
        Err(ZarnError::Runtime(e)) => {
            assert!(matches!(e.error, InterpreterError::UndefinedVariable(ref name) if name == "fresh"));
            assert_eq!(e.span.line(), 9);
        }
        other => panic!("unexpected result {:?}", other),
    }

    // Nothing leaked into the globals either.
    assert!(matches!(
        runtime_error_of("fun g() { leaked = 1; }\ng()\nsay(leaked)"),
        InterpreterError::UndefinedVariable(_)
    ));
}

#[test]
fn test_strict_assignment_rejects_unbound_names() {
    let strict = InterpreterConfig {
        strict_assignment: true,
    };

    let (output, result) = run_with_config("say(1)\nfresh = 2\nsay(3)", strict);
    assert_eq!(output, "1\n");
    match result {
        Err(ZarnError::Runtime(e)) => {
            assert_eq!(
                e.to_string(),
                "Runtime error at line 2, column 1: Undefined variable 'fresh'."
            );
        }
        other => panic!("unexpected result {:?}", other),
    }

    // The same program auto-creates the binding by default.
    let (output, result) = run("say(1)\nfresh = 2\nsay(fresh)");
    assert!(result.is_ok());
    assert_eq!(output, "1\n2\n");
}

#[test]
fn test_closure_outlives_defining_call() {
    let source = "
        fun make_adder(n) {
            fun add(x) { giveback x + n; }
            giveback add
        }
        add_two = make_adder(2)
        add_ten = make_adder(10)
        say(add_two(1))
        say(add_ten(1))
        say(add_two(add_ten(0)))
    ";
    assert_eq!(output_of(source), "3\n11\n12\n");
}

#[test]
fn test_recursion() {
    let source = "
        fun fact(n) {
            if n <= 1 { giveback 1; }
            giveback n * fact(n - 1)
        }
        say(fact(10))
    ";
    assert_eq!(output_of(source), "3628800\n");
}

#[test]
fn test_list_mutation_is_shared() {
    let source = "
        a = [1, 2]
        b = a
        append(a, 3)
        set(b, 0, 10)
        say(a)
        say(get(b, 2))
    ";
    assert_eq!(output_of(source), "[10, 2, 3]\n3\n");

    for source in ["get([1, 2], 2)", "get([1, 2], -1)", "set([], 0, 1)"] {
        assert!(matches!(
            runtime_error_of(source),
            InterpreterError::IndexOutOfBounds { .. }
        ));
    }
}

#[test]
fn test_runtime_error_keeps_earlier_output() {
    let (output, result) = run("say(\"one\")\nsay(1 + [])\nsay(\"two\")");
    assert_eq!(output, "one\n");

    let err = result.unwrap_err();
    assert_eq!(err.exit_code(), EX_SOFTWARE);
    assert_eq!(
        err.to_string(),
        "Runtime error at line 2, column 7: Operands must be two numbers or at least one string."
    );
}

#[test]
fn test_globals_persist_between_runs() {
    let mut output: Vec<u8> = vec![];
    {
        let mut interpreter = Interpreter::with_io(&mut output, Cursor::new(""));
        run_source(&mut interpreter, "fun double(x) { giveback x * 2; }").unwrap();
        run_source(&mut interpreter, "n = double(21)").unwrap();
        assert!(run_source(&mut interpreter, "say(missing)").is_err());
        run_source(&mut interpreter, "say(n)").unwrap();

        assert_eq!(interpreter.global("n"), Some(Value::Number(42.0)));
    }
    assert_eq!(String::from_utf8(output).unwrap(), "42\n");
}

#[test]
fn test_input_reads_lines() {
    let mut output: Vec<u8> = vec![];
    {
        let mut interpreter = Interpreter::with_io(&mut output, Cursor::new("Grace\n"));
        run_source(
            &mut interpreter,
            "who = input(\"? \")\nsay(\"hi \" + who)\nsay(len(input(\"\")))",
        )
        .unwrap();
    }
    assert_eq!(String::from_utf8(output).unwrap(), "? hi Grace\n0\n");
}

#[test]
fn test_prompt_shares_input_with_programs() {
    let piped = "x = input(\"\")\nhello\nsay(\"got \" + x)\nsay(missing)\ny = (\nsay(\"after\")\n";

    let mut output: Vec<u8> = vec![];
    let mut errors = vec![];
    {
        let mut interpreter = Interpreter::with_io(&mut output, Cursor::new(piped));
        run_prompt(&mut interpreter, false, |e| errors.push(e.exit_code())).unwrap();

        assert_eq!(interpreter.global("x"), Some(Value::String("hello".to_owned())));
    }

    // The line read by input() is never run, and every later line still is.
    assert_eq!(
        String::from_utf8(output).unwrap(),
        "> > got hello\n> > > after\n> \n"
    );
    assert_eq!(errors, vec![EX_SOFTWARE, EX_DATAERR]);
}

#[test]
fn test_syntax_errors() {
    let err = parse_source("x = 1\ngiveback x").unwrap_err();
    assert_eq!(err.exit_code(), EX_DATAERR);
    assert_eq!(
        err.to_string(),
        "[line 2:1] Error at 'giveback': giveback outside function."
    );

    let err = parse_source("say(\"open").unwrap_err();
    assert!(matches!(err, ZarnError::Lexer(_)));
    assert_eq!(err.to_string(), "Unterminated string at line 1, column 5");

    match check_source("a = (1\nb = 2\nc = )\n1 = d") {
        Err(ZarnError::Syntax(errors)) => {
            let lines: Vec<_> = errors.iter().map(|e| e.span.line()).collect();
            assert_eq!(lines, vec![1, 3, 4]);
        }
        other => panic!("unexpected result {:?}", other),
    }
}

#[test]
fn test_print_ast() {
    let tree = parse_source("fun f(a) { giveback a[0] * -2; }\nsay(f([3]) || nothing)").unwrap();
    assert_eq!(
        tree.ast_string(),
        "(fun f (a) (giveback (* (index a 0) (- 2))))\n(call say (|| (call f (list 3)) nothing))"
    );
}
