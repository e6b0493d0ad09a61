use rusty_zarn::treewalk_interpreter::{Interpreter, InterpreterConfig};
use rusty_zarn::{check_source, parse_source, ZarnError, EX_IOERR, EX_USAGE};

use clap::Parser as _;
use std::io;
use std::path::{Path, PathBuf};
use std::{fs, process};
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Tree-walking interpreter for the Zarn scripting language.
#[derive(clap::Parser, Debug)]
#[clap(name = "zarn", version, args_conflicts_with_subcommands = true)]
struct Cli {
    #[clap(subcommand)]
    command: Option<Command>,

    /// Script to run. Starts the prompt when omitted.
    #[clap(parse(from_os_str))]
    script: Option<PathBuf>,

    /// Make assignment to an unbound name an error.
    #[clap(long, global = true)]
    strict_assignment: bool,

    /// Print the parsed program before running it.
    #[clap(long, global = true)]
    print_ast: bool,

    /// Log pipeline stages to stderr.
    #[clap(short, long, global = true)]
    verbose: bool,
}

#[derive(clap::Subcommand, Debug)]
enum Command {
    /// Run a script.
    Run {
        #[clap(parse(from_os_str))]
        script: PathBuf,
    },
    /// Report every syntax error in a script without running it.
    Check {
        #[clap(parse(from_os_str))]
        script: PathBuf,
    },
    /// Start the interactive prompt.
    Repl,
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // --help and --version also arrive here, on stdout.
            let _ = e.print();
            process::exit(if e.use_stderr() { EX_USAGE } else { 0 });
        }
    };
    init_tracing(cli.verbose);

    let config = InterpreterConfig {
        strict_assignment: cli.strict_assignment,
    };

    let code = match (&cli.command, &cli.script) {
        (Some(Command::Run { script }), _) | (None, Some(script)) => {
            run_file(script, config, cli.print_ast)
        }
        (Some(Command::Check { script }), _) => check_file(script),
        (Some(Command::Repl), _) | (None, None) => run_prompt(config, cli.print_ast),
    };

    process::exit(code);
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

fn read_script(path: &Path) -> Result<String, i32> {
    fs::read_to_string(path).map_err(|e| {
        eprintln!("Could not read {}: {}", path.display(), e);
        EX_IOERR
    })
}

fn run_file(path: &Path, config: InterpreterConfig, print_ast: bool) -> i32 {
    let source = match read_script(path) {
        Ok(source) => source,
        Err(code) => return code,
    };

    debug!(path = %path.display(), bytes = source.len(), "running script");
    let mut interpreter = Interpreter::new().with_config(config);
    match run(&mut interpreter, &source, print_ast) {
        Ok(()) => 0,
        Err(e) => report_error(&e),
    }
}

fn check_file(path: &Path) -> i32 {
    let source = match read_script(path) {
        Ok(source) => source,
        Err(code) => return code,
    };

    match check_source(&source) {
        Ok(tree) => {
            println!("{}: ok ({} statements)", path.display(), tree.stmts.len());
            0
        }
        Err(e) => report_error(&e),
    }
}

fn run_prompt(config: InterpreterConfig, print_ast: bool) -> i32 {
    let mut interpreter = Interpreter::new().with_config(config);

    match rusty_zarn::run_prompt(&mut interpreter, print_ast, |e| {
        report_error(e);
    }) {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("Failed to read line: {}", e);
            EX_IOERR
        }
    }
}

fn run(interpreter: &mut Interpreter<'_>, source: &str, print_ast: bool) -> Result<(), ZarnError> {
    let tree = parse_source(source)?;
    if print_ast {
        println!("{}", tree.ast_string());
    }
    interpreter.interpret(&tree)?;
    Ok(())
}

fn report_error(error: &ZarnError) -> i32 {
    eprintln!("{}", error);
    error.exit_code()
}
