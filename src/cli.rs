// Command-line front end for hufflock.
//
// Subcommands map one-to-one onto the file-level operations in `io`. Paths
// and the password may be given as flags or positionals; anything missing is
// asked for on stdin.

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process;

use clap::{ArgAction, Args, Parser, Subcommand, ValueHint};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use zeroize::Zeroizing;

use crate::archive::{Phase, ProgressSink};
use crate::error::ArchiveError;
use crate::io as archive_io;

// ---------------------------------------------------------------------------
// Clap CLI definition
// ---------------------------------------------------------------------------

/// Password-protected, Huffman-compressed multi-file archiver.
#[derive(Parser, Debug)]
#[command(
    name = "hufflock",
    version,
    about = "Huffman-compressed, AES-256-GCM encrypted archives",
    arg_required_else_help = true
)]
struct Cli {
    #[command(subcommand)]
    command: Cmd,

    /// Overwrite an existing archive.
    #[arg(short = 'f', long, global = true)]
    force: bool,

    /// Quiet mode (suppress non-error output).
    #[arg(short = 'q', long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Verbose mode (use multiple times for more detail).
    #[arg(short = 'v', long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Output stats as JSON to stderr.
    #[arg(long = "json", global = true)]
    json_output: bool,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Archive a file or directory.
    Create(CreateArgs),
    /// List the files in an archive.
    List(ArchiveArgs),
    /// Extract an archive into a directory.
    Extract(ExtractArgs),
    /// Show header information (no password needed).
    Info(InfoArgs),
}

#[derive(Args, Debug)]
struct PasswordArg {
    /// Archive password (prompted for when omitted).
    #[arg(long, short = 'p')]
    password: Option<String>,
}

#[derive(Args, Debug)]
struct CreateArgs {
    /// File or directory to archive.
    #[arg(long, short = 'i', value_hint = ValueHint::AnyPath, conflicts_with = "input_pos")]
    input: Option<PathBuf>,

    /// Archive to write.
    #[arg(long, short = 'o', value_hint = ValueHint::FilePath, conflicts_with = "output_pos")]
    output: Option<PathBuf>,

    #[command(flatten)]
    password: PasswordArg,

    /// File or directory to archive (positional form).
    #[arg(value_hint = ValueHint::AnyPath)]
    input_pos: Option<PathBuf>,

    /// Archive to write (positional form).
    #[arg(value_hint = ValueHint::FilePath)]
    output_pos: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct ArchiveArgs {
    /// Archive to read.
    #[arg(long, short = 'i', value_hint = ValueHint::FilePath, conflicts_with = "input_pos")]
    input: Option<PathBuf>,

    #[command(flatten)]
    password: PasswordArg,

    /// Archive to read (positional form).
    #[arg(value_hint = ValueHint::FilePath)]
    input_pos: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct ExtractArgs {
    /// Archive to read.
    #[arg(long, short = 'i', value_hint = ValueHint::FilePath, conflicts_with = "input_pos")]
    input: Option<PathBuf>,

    /// Destination directory (prompted for, default ".").
    #[arg(long, short = 'o', value_hint = ValueHint::DirPath, conflicts_with = "output_pos")]
    output: Option<PathBuf>,

    #[command(flatten)]
    password: PasswordArg,

    /// Archive to read (positional form).
    #[arg(value_hint = ValueHint::FilePath)]
    input_pos: Option<PathBuf>,

    /// Destination directory (positional form).
    #[arg(value_hint = ValueHint::DirPath)]
    output_pos: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct InfoArgs {
    /// Archive to inspect.
    #[arg(value_hint = ValueHint::FilePath)]
    input: PathBuf,
}

// ---------------------------------------------------------------------------
// Resolved command + options (flattened from Cli)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Create,
    List,
    Extract,
    Info,
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Command::Create => "create",
            Command::List => "list",
            Command::Extract => "extract",
            Command::Info => "info",
        }
    }
}

#[derive(Debug)]
struct Options {
    command: Command,
    force: bool,
    quiet: bool,
    verbose: u8,
    json_output: bool,
    input: Option<PathBuf>,
    output: Option<PathBuf>,
    password: Option<Zeroizing<String>>,
}

fn resolve_options(cli: Cli) -> Options {
    let (command, input, output, password) = match cli.command {
        Cmd::Create(args) => (
            Command::Create,
            args.input.or(args.input_pos),
            args.output.or(args.output_pos),
            args.password.password,
        ),
        Cmd::List(args) => (
            Command::List,
            args.input.or(args.input_pos),
            None,
            args.password.password,
        ),
        Cmd::Extract(args) => (
            Command::Extract,
            args.input.or(args.input_pos),
            args.output.or(args.output_pos),
            args.password.password,
        ),
        Cmd::Info(args) => (Command::Info, Some(args.input), None, None),
    };

    Options {
        command,
        force: cli.force,
        quiet: cli.quiet,
        verbose: cli.verbose.min(2),
        json_output: cli.json_output,
        input,
        output,
        password: password.map(Zeroizing::new),
    }
}

#[cfg(any(test, feature = "fuzzing"))]
pub fn fuzz_try_parse_args(args: &[String]) {
    let argv: Vec<String> = std::iter::once("hufflock".to_string())
        .chain(args.iter().cloned())
        .collect();
    if let Ok(cli) = Cli::try_parse_from(argv) {
        let _ = resolve_options(cli);
    }
}

// ---------------------------------------------------------------------------
// Prompts
// ---------------------------------------------------------------------------

/// Print `prompt` on stderr and read one line from stdin, without the line
/// ending. `None` on end of input.
fn prompt_line(prompt: &str) -> io::Result<Option<String>> {
    let mut stderr = io::stderr().lock();
    stderr.write_all(prompt.as_bytes())?;
    stderr.flush()?;

    let mut line = String::new();
    if io::stdin().lock().read_line(&mut line)? == 0 {
        return Ok(None);
    }
    let end = line.trim_end_matches(['\r', '\n']).len();
    line.truncate(end);
    Ok(Some(line))
}

fn require_path(given: Option<&Path>, prompt: &str) -> io::Result<PathBuf> {
    if let Some(path) = given {
        return Ok(path.to_path_buf());
    }
    match prompt_line(prompt)? {
        Some(line) if !line.trim().is_empty() => Ok(PathBuf::from(line.trim())),
        _ => Err(io::Error::new(io::ErrorKind::InvalidInput, "no path given")),
    }
}

/// The prompt reads a plain line: input is echoed, so a typed password stays
/// in the terminal scrollback. Pass `-p` or pipe stdin to avoid that.
fn require_password(given: Option<&str>) -> io::Result<Zeroizing<String>> {
    if let Some(password) = given {
        return Ok(Zeroizing::new(password.to_string()));
    }
    prompt_line("Password: ")?
        .map(Zeroizing::new)
        .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "no password given"))
}

// ---------------------------------------------------------------------------
// Progress bar
// ---------------------------------------------------------------------------

const BAR_TEMPLATE: &str = "{prefix:13} [{bar:40}] {percent:>3}%  {bytes}/{total_bytes}";

/// One indicatif bar per phase on stderr; the previous bar is finished when
/// the phase changes.
struct BarProgress {
    target_hidden: bool,
    style: ProgressStyle,
    current: Option<(Phase, ProgressBar)>,
}

impl BarProgress {
    fn new(hidden: bool) -> Self {
        let style = ProgressStyle::with_template(BAR_TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> ");
        Self {
            target_hidden: hidden,
            style,
            current: None,
        }
    }

    fn start(&self, phase: Phase, total: u64) -> ProgressBar {
        let target = if self.target_hidden {
            ProgressDrawTarget::hidden()
        } else {
            ProgressDrawTarget::stderr()
        };
        let bar = ProgressBar::with_draw_target(Some(total), target);
        bar.set_style(self.style.clone());
        bar.set_prefix(phase.label());
        bar
    }

    fn finish(&mut self) {
        if let Some((_, bar)) = self.current.take() {
            bar.finish();
        }
    }
}

impl ProgressSink for BarProgress {
    fn report(&mut self, phase: Phase, done: u64, total: u64) {
        match &self.current {
            Some((p, bar)) if *p == phase => {
                bar.set_length(total);
                bar.set_position(done);
            }
            _ => {
                self.finish();
                let bar = self.start(phase, total);
                bar.set_position(done);
                self.current = Some((phase, bar));
            }
        }
    }
}

impl Drop for BarProgress {
    fn drop(&mut self) {
        self.finish();
    }
}

fn progress_sink(opts: &Options) -> BarProgress {
    BarProgress::new(opts.quiet || opts.json_output)
}

fn print_json(value: serde_json::Value) {
    match serde_json::to_string_pretty(&value) {
        Ok(s) => eprintln!("{s}"),
        Err(e) => log::error!("could not serialize stats: {e}"),
    }
}

fn fail(command: Command, err: impl std::fmt::Display) -> i32 {
    eprintln!("hufflock: {}: {err}", command.name());
    1
}

// ---------------------------------------------------------------------------
// Create command
// ---------------------------------------------------------------------------

fn cmd_create(opts: &Options) -> i32 {
    let input = match require_path(opts.input.as_deref(), "Path (file or directory) to archive: ") {
        Ok(p) => p,
        Err(e) => return fail(opts.command, e),
    };
    let output = match require_path(opts.output.as_deref(), "Output archive path (e.g. archive.gha): ") {
        Ok(p) => p,
        Err(e) => return fail(opts.command, e),
    };

    if output.exists() && !opts.force {
        eprintln!(
            "hufflock: output file exists, use -f to overwrite: {}",
            output.display()
        );
        return 1;
    }

    let password = match require_password(opts.password.as_deref().map(String::as_str)) {
        Ok(p) => p,
        Err(e) => return fail(opts.command, e),
    };

    let mut progress = progress_sink(opts);
    let result =
        archive_io::create_archive_with_progress(&input, &output, &password, &mut progress);
    drop(progress);

    let stats = match result {
        Ok(s) => s,
        Err(e) => return fail(opts.command, e),
    };

    if !opts.quiet && !opts.json_output {
        eprintln!(
            "hufflock: created {} ({} files, {} -> {} bytes)",
            output.display(),
            stats.entries,
            stats.input_size,
            stats.archive_size
        );
    }
    if opts.verbose > 0 && !opts.quiet && !opts.json_output {
        eprintln!(
            "hufflock: payload {} bytes, compressed {} bytes ({})",
            stats.payload_size,
            stats.compressed_size,
            ratio(stats.compressed_size, stats.payload_size)
        );
    }
    if opts.json_output {
        print_json(serde_json::json!({
            "command": "create",
            "entries": stats.entries,
            "input_size": stats.input_size,
            "payload_size": stats.payload_size,
            "compressed_size": stats.compressed_size,
            "archive_size": stats.archive_size,
        }));
    }

    0
}

fn ratio(part: u64, whole: u64) -> String {
    if whole == 0 {
        return "n/a".to_string();
    }
    format!("{:.2}%", 100.0 * part as f64 / whole as f64)
}

// ---------------------------------------------------------------------------
// List command
// ---------------------------------------------------------------------------

fn cmd_list(opts: &Options) -> i32 {
    let input = match require_path(opts.input.as_deref(), "Archive path: ") {
        Ok(p) => p,
        Err(e) => return fail(opts.command, e),
    };
    let password = match require_password(opts.password.as_deref().map(String::as_str)) {
        Ok(p) => p,
        Err(e) => return fail(opts.command, e),
    };

    let entries = match archive_io::list_archive(&input, &password) {
        Ok(e) => e,
        Err(e) => return fail(opts.command, e),
    };

    if opts.json_output {
        let files: Vec<serde_json::Value> = entries
            .iter()
            .map(|e| serde_json::json!({ "name": e.name, "size": e.size }))
            .collect();
        print_json(serde_json::json!({
            "command": "list",
            "entries": entries.len(),
            "files": files,
        }));
        return 0;
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    for entry in &entries {
        let line = if opts.verbose > 0 {
            writeln!(out, "{:>12}  {}", entry.size, entry.name)
        } else {
            writeln!(out, "{}", entry.name)
        };
        if let Err(e) = line {
            return fail(opts.command, e);
        }
    }
    0
}

// ---------------------------------------------------------------------------
// Extract command
// ---------------------------------------------------------------------------

fn cmd_extract(opts: &Options) -> i32 {
    let input = match require_path(opts.input.as_deref(), "Archive path: ") {
        Ok(p) => p,
        Err(e) => return fail(opts.command, e),
    };
    let dest = match &opts.output {
        Some(p) => p.clone(),
        None => match prompt_line("Destination directory (default .): ") {
            Ok(Some(line)) if !line.trim().is_empty() => PathBuf::from(line.trim()),
            Ok(_) => PathBuf::from("."),
            Err(e) => return fail(opts.command, e),
        },
    };
    let password = match require_password(opts.password.as_deref().map(String::as_str)) {
        Ok(p) => p,
        Err(e) => return fail(opts.command, e),
    };

    let mut progress = progress_sink(opts);
    let result =
        archive_io::extract_archive_with_progress(&input, &dest, &password, &mut progress);
    drop(progress);

    let stats = match result {
        Ok(s) => s,
        Err(e) => {
            if matches!(e, ArchiveError::AuthenticationFailure) {
                log::info!("nothing was written to {}", dest.display());
            }
            return fail(opts.command, e);
        }
    };

    if !opts.quiet && !opts.json_output {
        eprintln!(
            "hufflock: extracted {} files ({} bytes) into {}",
            stats.entries,
            stats.output_size,
            dest.display()
        );
    }
    if opts.json_output {
        print_json(serde_json::json!({
            "command": "extract",
            "entries": stats.entries,
            "output_size": stats.output_size,
            "archive_size": stats.archive_size,
        }));
    }
    0
}

// ---------------------------------------------------------------------------
// Info command
// ---------------------------------------------------------------------------

fn cmd_info(opts: &Options, input: &Path) -> i32 {
    let info = match archive_io::inspect_archive(input) {
        Ok(i) => i,
        Err(e) => return fail(opts.command, e),
    };
    let nonce: String = info.nonce.iter().map(|b| format!("{b:02x}")).collect();

    if opts.json_output {
        print_json(serde_json::json!({
            "command": "info",
            "version": info.version,
            "nonce": nonce,
            "payload_size": info.payload_size,
            "distinct_symbols": info.distinct_symbols,
            "compressed_size": info.compressed_size,
            "archive_size": info.archive_size,
        }));
        return 0;
    }

    println!("hufflock: archive:          {}", input.display());
    println!("hufflock: version:          {}", info.version);
    println!("hufflock: nonce:            {nonce}");
    println!("hufflock: payload size:     {}", info.payload_size);
    println!("hufflock: distinct symbols: {}", info.distinct_symbols);
    println!("hufflock: compressed size:  {}", info.compressed_size);
    println!("hufflock: archive size:     {}", info.archive_size);
    0
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn default_log_filter(opts: &Options) -> &'static str {
    match (opts.quiet, opts.verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, _) => "debug",
    }
}

/// Main CLI entry point. Parses arguments via clap, dispatches commands.
pub fn run() -> ! {
    let cli = Cli::parse();
    let opts = resolve_options(cli);

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(default_log_filter(&opts)),
    )
    .format_timestamp(None)
    .format_target(false)
    .init();

    let exit_code = match opts.command {
        Command::Create => cmd_create(&opts),
        Command::List => cmd_list(&opts),
        Command::Extract => cmd_extract(&opts),
        Command::Info => match &opts.input {
            Some(path) => cmd_info(&opts, path),
            None => fail(opts.command, "no archive given"),
        },
    };

    process::exit(exit_code);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
