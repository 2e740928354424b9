use anyhow::Context;
use regex::Regex;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::error::GrunError;
use crate::pkg::catalog::CatalogStore;
use crate::synth::scan::{next_is_punct, scan};
use crate::synth::{self, OutputMode};
use crate::toolchain::{RunOutput, Toolchain};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Options {
    pub expr: Option<String>,
    pub file: Option<PathBuf>,
    pub aux: Option<PathBuf>,
    pub output: OutputMode,
    pub verbose: bool,
    pub rebuild: bool,
    pub print_only: bool,
    pub passthrough: Vec<String>,
}

#[derive(Debug, PartialEq, Eq)]
pub enum Parsed {
    Run(Options),
    Help,
    Version,
}

pub fn run_cli<I>(args: I) -> i32
where
    I: IntoIterator<Item = String>,
{
    let opts = match parse_args(args) {
        Ok(Parsed::Run(opts)) => opts,
        Ok(Parsed::Help) => {
            print_usage();
            return 0;
        }
        Ok(Parsed::Version) => {
            println!("{}", version());
            return 0;
        }
        Err(err) => {
            eprintln!("error: {}", err);
            print_usage();
            return err.exit_code();
        }
    };
    init_logging(opts.verbose);
    match run(&opts) {
        Ok(()) => 0,
        Err(err) => {
            if err.is_reported_by_child() {
                debug!("{}", err);
            } else {
                eprintln!("error: {}", err);
            }
            err.exit_code()
        }
    }
}

pub fn parse_args<I>(args: I) -> Result<Parsed, GrunError>
where
    I: IntoIterator<Item = String>,
{
    let mut opts = Options::default();
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-e" => opts.expr = Some(flag_value(&mut args, "-e")?),
            "-f" => opts.file = Some(PathBuf::from(flag_value(&mut args, "-f")?)),
            "-i" => opts.aux = Some(PathBuf::from(flag_value(&mut args, "-i")?)),
            "-j" => {
                if opts.output == OutputMode::Plain {
                    opts.output = OutputMode::Pretty;
                }
            }
            "-J" => opts.output = OutputMode::Flat,
            "-v" => opts.verbose = true,
            "-r" => opts.rebuild = true,
            "-p" => opts.print_only = true,
            "-h" | "--help" => return Ok(Parsed::Help),
            "--version" => return Ok(Parsed::Version),
            "--" => {
                opts.passthrough.extend(args.by_ref());
            }
            flag if flag.starts_with('-') && flag.len() > 1 => {
                return Err(GrunError::Usage(format!("unknown argument: {}", flag)));
            }
            first => {
                opts.passthrough.push(first.to_string());
                opts.passthrough.extend(args.by_ref());
            }
        }
    }
    Ok(Parsed::Run(opts))
}

fn flag_value<I>(args: &mut I, flag: &str) -> Result<String, GrunError>
where
    I: Iterator<Item = String>,
{
    args.next()
        .ok_or_else(|| GrunError::Usage(format!("expected value after {}", flag)))
}

fn run(opts: &Options) -> Result<(), GrunError> {
    let config = Config::load().map_err(GrunError::Config)?;
    let toolchain = config.toolchain();
    let store = CatalogStore::default_location().map_err(GrunError::Catalog)?;

    if opts.rebuild {
        let catalog = store.rebuild(&toolchain).map_err(GrunError::Catalog)?;
        eprintln!("rebuilt package list {}", catalog.len());
        return Ok(());
    }

    let expr = expression(opts)?;
    let aliases = config.alias_table().map_err(GrunError::Config)?;
    debug!(aliases = ?aliases.iter().collect::<Vec<_>>(), "package aliases");
    let catalog = store
        .load_or_rebuild(&toolchain, false)
        .map_err(GrunError::Catalog)?;
    debug!(dir = %store.dir().display(), entries = catalog.len(), "package catalog ready");
    if catalog.is_empty() {
        warn!("package catalog is empty; imports use their short names (rebuild with -r)");
    }

    let plan = synth::synthesize(&expr, opts.output, &aliases, &catalog);
    debug!(imports = ?plan.imports, "render plan");
    let program = synth::render_program(&plan);
    if opts.print_only {
        let mut stdout = io::stdout().lock();
        let written = stdout
            .write_all(program.as_bytes())
            .and_then(|()| stdout.flush());
        return ignore_broken_pipe(written).map_err(GrunError::Output);
    }
    debug!("generated program:\n{}", program);

    execute_and_relay(
        &toolchain,
        &program,
        opts,
        &mut io::stdout().lock(),
        &mut io::stderr().lock(),
    )
}

/// Run the program and copy its output through; a failing child becomes
/// `Runtime` with the child's exit code.
fn execute_and_relay(
    toolchain: &Toolchain,
    program: &str,
    opts: &Options,
    stdout: &mut impl Write,
    stderr: &mut impl Write,
) -> Result<(), GrunError> {
    let out = toolchain.execute(program, opts.aux.as_deref(), &opts.passthrough)?;
    relay(&out, stdout, stderr).map_err(GrunError::Output)?;
    if !out.success() {
        return Err(GrunError::Runtime {
            code: out.exit_code(),
        });
    }
    Ok(())
}

/// Copy the child's streams byte for byte. A reader that went away early
/// (`grun ... | head`) is not an error.
pub fn relay(
    out: &RunOutput,
    stdout: &mut impl Write,
    stderr: &mut impl Write,
) -> io::Result<()> {
    let written = stdout.write_all(&out.stdout).and_then(|()| stdout.flush());
    ignore_broken_pipe(written)?;
    stderr.write_all(&out.stderr)?;
    stderr.flush()
}

fn ignore_broken_pipe(res: io::Result<()>) -> io::Result<()> {
    match res {
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => Ok(()),
        other => other,
    }
}

fn expression(opts: &Options) -> Result<String, GrunError> {
    if let Some(path) = &opts.file {
        return read_expression_file(path);
    }
    match &opts.expr {
        Some(expr) => Ok(expr.clone()),
        None => Err(GrunError::Usage(
            "provide expression with -e or file to run with -f".to_string(),
        )),
    }
}

/// Read a statement file: lines starting with `//` are dropped, trailing
/// comments are cut and the rest are joined with `;`. A trailing newline
/// leaves an empty final expression, so such a file runs as statements only.
pub fn read_expression_file(path: &Path) -> Result<String, GrunError> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read {}", path.display()))
        .map_err(GrunError::Input)?;
    Ok(join_statement_lines(&contents))
}

pub fn join_statement_lines(contents: &str) -> String {
    let line_comment = Regex::new(r"^\s*//").expect("valid comment regex");
    contents
        .split('\n')
        .map(|l| l.strip_suffix('\r').unwrap_or(l))
        .filter(|l| !line_comment.is_match(l))
        .map(strip_trailing_comment)
        .collect::<Vec<_>>()
        .join(";")
}

/// Cut a `//` comment that starts outside any literal.
fn strip_trailing_comment(line: &str) -> &str {
    let tokens = scan(line);
    let mut offset = 0;
    for (idx, tok) in tokens.iter().enumerate() {
        if tok.is_punct('/') && next_is_punct(&tokens, idx, '/') {
            return line[..offset].trim_end();
        }
        offset += tok.text.len();
    }
    line
}

fn init_logging(verbose: bool) {
    let default = if verbose { "grun=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .with_target(false)
        .try_init();
}

fn version() -> String {
    format!("grun {}", env!("CARGO_PKG_VERSION"))
}

fn print_usage() {
    eprintln!("usage: grun [-e EXPR | -f FILE] [-j | -J] [-v] [-p] [-i FILE.go] [--] [ARGS...]");
    eprintln!("   or: grun -r");
    eprintln!();
    eprintln!("  -e EXPR   expression to evaluate");
    eprintln!("  -f FILE   file of statements to run (// lines are skipped)");
    eprintln!("  -j        pretty JSON output");
    eprintln!("  -J        flat JSON output");
    eprintln!("  -i FILE   Go file to link in");
    eprintln!("  -p        print the generated program instead of running it");
    eprintln!("  -r        rebuild the package list");
    eprintln!("  -v        verbose mode");
}
