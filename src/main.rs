#![allow(non_snake_case)]
use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;

use RustedMathSolver::Utils::history::History;
use RustedMathSolver::Utils::logger::init_logging;
use RustedMathSolver::Utils::substitutions::parse_substitutions;
use RustedMathSolver::config::SolverConfig;
use RustedMathSolver::dispatch::operation::{OperationOutput, OperationRequest, OperationTag};
use RustedMathSolver::error::MathError;
use RustedMathSolver::solver::MathSolver;
use clap::Parser;
use rustyline::{DefaultEditor, error::ReadlineError};
use tabled::{builder::Builder, settings::Style};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// expression, equation or directive, e.g. "2x + 3 = 7" or "d/dx sinx"
    input: Option<String>,
    /// simplify | factor | expand | differentiate | integrate | solve | evaluate
    #[arg(long)]
    op: Option<String>,
    /// variable to differentiate, integrate or solve for
    #[arg(long)]
    var: Option<String>,
    /// values for evaluate, e.g. "x = 2, y = pi/2"
    #[arg(long)]
    subs: Option<String>,
    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,
    /// off | error | warn | info | debug | trace
    #[arg(long)]
    loglevel: Option<String>,
    /// show how the input was corrected next to the result
    #[arg(long)]
    report: bool,
    /// interactive session
    #[arg(long)]
    repl: bool,
}

fn build_request(op: Option<&str>, var: Option<&str>, subs: Option<&str>) -> Result<OperationRequest, MathError> {
    let mut request = OperationRequest::new();
    if let Some(label) = op {
        let tag = OperationTag::from_str(label)
            .map_err(|_| MathError::malformed("unknown operation", label))?;
        request = request.operation(tag);
    }
    if let Some(name) = var {
        request = request.target(name);
    }
    if let Some(list) = subs {
        request = request.substitutions(parse_substitutions(list)?);
    }
    Ok(request)
}

fn render_output(output: &OperationOutput, precision: usize) -> String {
    let mut builder = Builder::default();
    builder.push_record(["operation".to_string(), output.operation.to_string()]);
    if let Some(var) = &output.target {
        builder.push_record(["variable".to_string(), var.clone()]);
    }
    builder.push_record(["result".to_string(), output.payload.render(precision)]);
    for warning in &output.warnings {
        builder.push_record(["warning".to_string(), warning.clone()]);
    }
    let mut table = builder.build();
    table.with(Style::modern_rounded());
    table.to_string()
}

fn render_rows(rows: Vec<(String, String)>) -> String {
    let mut builder = Builder::default();
    for (label, value) in rows {
        builder.push_record([label, value]);
    }
    let mut table = builder.build();
    table.with(Style::modern_rounded());
    table.to_string()
}

fn print_error(err: &MathError) {
    eprintln!("error: {}", err);
    eprintln!("hint: {}", err.guidance());
}

/// runs one input and returns the text to record in the history
fn run_once(solver: &MathSolver, input: &str, request: &OperationRequest, report: bool) -> Result<String, MathError> {
    let precision = solver.config().display_precision;
    if report && request.operation.is_none() && request.substitutions.is_empty() {
        let report = solver.report(input, request.target.as_deref())?;
        println!("{}", render_rows(report.rows(precision)));
        return Ok(report.output.payload.render(precision));
    }
    let output = solver.process(input, request)?;
    println!("{}", render_output(&output, precision));
    Ok(output.payload.render(precision))
}

fn repl(solver: &MathSolver, mut request: OperationRequest, report: bool) -> Result<(), ReadlineError> {
    let mut rl = DefaultEditor::new()?;
    let mut history = History::new();
    println!("commands: :op <operation|auto>, :var <name|auto>, :history, :quit");
    loop {
        let line = match rl.readline("> ") {
            Ok(line) => line,
            Err(ReadlineError::Eof) | Err(ReadlineError::Interrupted) => return Ok(()),
            Err(err) => return Err(err),
        };
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        rl.add_history_entry(input)?;
        match input.split_once(' ').unwrap_or((input, "")) {
            (":quit", _) | (":q", _) => return Ok(()),
            (":history", _) => {
                for entry in history.recent(20) {
                    println!(
                        "{}  {}  [{}]  {}",
                        entry.timestamp.format("%H:%M:%S"),
                        entry.input,
                        entry.operation.map(|t| t.to_string()).unwrap_or_else(|| "auto".to_string()),
                        entry.outcome
                    );
                }
            }
            (":op", "auto") => request.operation = None,
            (":op", label) => match OperationTag::from_str(label.trim()) {
                Ok(tag) => request.operation = Some(tag),
                Err(_) => eprintln!("unknown operation `{}`", label.trim()),
            },
            (":var", "auto") => request.target = None,
            (":var", name) => request.target = Some(name.trim().to_string()),
            _ => {
                let outcome = match run_once(solver, input, &request, report) {
                    Ok(text) => text,
                    Err(err) => {
                        print_error(&err);
                        err.to_string()
                    }
                };
                history.push(input, request.operation, outcome);
            }
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => match SolverConfig::from_file(path) {
            Ok(config) => config,
            Err(err) => {
                print_error(&err);
                return ExitCode::from(2);
            }
        },
        None => SolverConfig::default(),
    };
    if let Some(level) = &cli.loglevel {
        config.loglevel = Some(level.clone());
    }
    if let Err(err) = init_logging(config.loglevel.as_deref(), config.log_to_file) {
        print_error(&err);
        return ExitCode::from(2);
    }
    let request = match build_request(cli.op.as_deref(), cli.var.as_deref(), cli.subs.as_deref()) {
        Ok(request) => request,
        Err(err) => {
            print_error(&err);
            return ExitCode::from(2);
        }
    };
    let solver = MathSolver::new(config);
    if cli.repl {
        return match repl(&solver, request, cli.report) {
            Ok(()) => ExitCode::SUCCESS,
            Err(err) => {
                eprintln!("{}", err);
                ExitCode::FAILURE
            }
        };
    }
    let Some(input) = cli.input else {
        eprintln!("nothing to do: pass an INPUT or --repl");
        return ExitCode::from(2);
    };
    match run_once(&solver, &input, &request, cli.report) {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            print_error(&err);
            ExitCode::FAILURE
        }
    }
}
