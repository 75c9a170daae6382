// Command-line front end for the compression dispatcher.
//
// `compress` and `decompress` stream a file (or stdin) through the wrapper
// selected by `--algorithm`; `config` reports which codecs are compiled in.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::PathBuf;
use std::process;

use clap::{ArgAction, Args, Parser, Subcommand, ValueHint};

use crate::compress::algorithm::{Algorithm, available};
use crate::compress::dispatch::{DispatchOptions, Dispatcher, UnknownAlgorithm};

const BUF_SIZE: usize = 64 * 1024;

// ---------------------------------------------------------------------------
// Clap CLI definition
// ---------------------------------------------------------------------------

/// Compress and decompress document payloads.
#[derive(Parser, Debug)]
#[command(
    name = "doccodec",
    version,
    about = "lz4/bz2/lzma/zlib/gzip compression dispatcher",
    arg_required_else_help = true
)]
struct Cli {
    #[command(subcommand)]
    command: Cmd,

    /// Force overwrite existing output files.
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
    /// Compress an input stream.
    Compress(CodecArgs),
    /// Decompress an input stream.
    Decompress(CodecArgs),
    /// Print build/configuration details.
    Config,
}

#[derive(Args, Debug)]
struct CodecArgs {
    /// Algorithm identifier: lz4, bz2, lzma, zlib or gzip.
    ///
    /// Omitted or unrecognized identifiers copy data through unchanged.
    #[arg(long, short = 'a', value_name = "ALGORITHM")]
    algorithm: Option<String>,

    /// Reject unrecognized algorithm identifiers instead of copying through.
    #[arg(long)]
    strict: bool,

    /// Compression level (codecs without levels ignore it).
    #[arg(long, short = 'l', value_parser = clap::value_parser!(u32).range(0..=9))]
    level: Option<u32>,

    /// Input file (default: stdin).
    #[arg(long, value_hint = ValueHint::FilePath, conflicts_with = "input_pos")]
    input: Option<PathBuf>,

    /// Output file (default: stdout).
    #[arg(long, value_hint = ValueHint::FilePath, conflicts_with = "output_pos")]
    output: Option<PathBuf>,

    /// Write output to stdout.
    #[arg(short = 'c', long)]
    stdout: bool,

    /// Input file (positional form).
    #[arg(value_hint = ValueHint::FilePath)]
    input_pos: Option<PathBuf>,

    /// Output file (positional form).
    #[arg(value_hint = ValueHint::FilePath)]
    output_pos: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// Resolved command + options (flattened from Cli)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Compress,
    Decompress,
    Config,
}

struct Options {
    command: Command,
    use_stdout: bool,
    force: bool,
    quiet: bool,
    verbose: u8,
    algorithm: Option<String>,
    dispatch: DispatchOptions,
    input_file: Option<PathBuf>,
    output_file: Option<PathBuf>,
    json_output: bool,
}

fn resolve_options(cli: Cli) -> Options {
    let base = Options {
        command: Command::Config,
        use_stdout: false,
        force: cli.force,
        quiet: cli.quiet,
        verbose: cli.verbose.min(2),
        algorithm: None,
        dispatch: DispatchOptions::default(),
        input_file: None,
        output_file: None,
        json_output: cli.json_output,
    };

    let (command, args) = match cli.command {
        Cmd::Compress(args) => (Command::Compress, args),
        Cmd::Decompress(args) => (Command::Decompress, args),
        Cmd::Config => return base,
    };

    Options {
        command,
        use_stdout: args.stdout,
        algorithm: args.algorithm,
        dispatch: DispatchOptions {
            unknown: if args.strict {
                UnknownAlgorithm::Reject
            } else {
                UnknownAlgorithm::Passthrough
            },
            level: args.level,
        },
        input_file: args.input.or(args.input_pos),
        output_file: args.output.or(args.output_pos),
        ..base
    }
}

#[cfg(any(test, feature = "fuzzing"))]
pub fn fuzz_try_parse_args(args: &[String]) {
    let argv: Vec<String> = std::iter::once("doccodec".to_string())
        .chain(args.iter().cloned())
        .collect();
    if let Ok(cli) = Cli::try_parse_from(argv) {
        let _ = resolve_options(cli);
    }
}

// ---------------------------------------------------------------------------
// Config command
// ---------------------------------------------------------------------------

fn cmd_config(opts: &Options) -> i32 {
    let version = env!("CARGO_PKG_VERSION");
    let compiled = available();

    if opts.json_output {
        let codecs: Vec<&str> = compiled.algorithms().map(Algorithm::as_str).collect();
        let json = serde_json::json!({
            "version": version,
            "codecs": codecs,
            "file_io": cfg!(feature = "file-io"),
            "parallel": cfg!(feature = "parallel"),
        });
        eprintln!("{}", serde_json::to_string_pretty(&json).unwrap_or_default());
        return 0;
    }

    eprintln!("doccodec version {version}");
    for algorithm in Algorithm::ALL {
        let on = compiled.contains(algorithm.into()) as u8;
        eprintln!("CODEC_{}={on}", algorithm.as_str().to_ascii_uppercase());
    }
    eprintln!("FILE_IO={}", cfg!(feature = "file-io") as u8);
    eprintln!("PARALLEL={}", cfg!(feature = "parallel") as u8);

    0
}

// ---------------------------------------------------------------------------
// I/O setup
// ---------------------------------------------------------------------------

fn open_input(opts: &Options) -> Result<Box<dyn Read>, i32> {
    match &opts.input_file {
        Some(path) => match File::open(path) {
            Ok(f) => Ok(Box::new(BufReader::with_capacity(BUF_SIZE, f))),
            Err(e) => {
                eprintln!("doccodec: input file: {}: {e}", path.display());
                Err(1)
            }
        },
        None => Ok(Box::new(BufReader::new(io::stdin()))),
    }
}

fn open_output(opts: &Options) -> Result<Box<dyn Write>, i32> {
    let path = match &opts.output_file {
        Some(path) if !opts.use_stdout => path,
        _ => return Ok(Box::new(BufWriter::with_capacity(BUF_SIZE, io::stdout().lock()))),
    };
    if path.exists() && !opts.force {
        eprintln!(
            "doccodec: output file exists, use -f to overwrite: {}",
            path.display()
        );
        return Err(1);
    }
    match File::create(path) {
        Ok(f) => Ok(Box::new(BufWriter::with_capacity(BUF_SIZE, f))),
        Err(e) => {
            eprintln!("doccodec: output file: {}: {e}", path.display());
            Err(1)
        }
    }
}

/// Copy `reader` into `writer`; returns bytes moved or an error message.
fn copy_stream(reader: &mut dyn Read, writer: &mut dyn Write, what: &str) -> Result<u64, String> {
    let mut buf = vec![0u8; BUF_SIZE];
    let mut total = 0u64;
    loop {
        match reader.read(&mut buf) {
            Ok(0) => return Ok(total),
            Ok(n) => {
                writer
                    .write_all(&buf[..n])
                    .map_err(|e| format!("write error: {e}"))?;
                total += n as u64;
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(format!("{what} error: {e}")),
        }
    }
}

fn report(opts: &Options, algorithm: Option<Algorithm>, bytes_in: u64, bytes_out: u64) {
    let name = algorithm.map_or("none", Algorithm::as_str);
    let command = match opts.command {
        Command::Compress => "compress",
        Command::Decompress => "decompress",
        Command::Config => "config",
    };

    if opts.verbose > 0 && !opts.quiet {
        eprintln!("doccodec: {command}: algorithm: {name}, input size: {bytes_in}, output size: {bytes_out}");
    }

    if opts.json_output {
        let json = serde_json::json!({
            "command": command,
            "algorithm": name,
            "input_size": bytes_in,
            "output_size": bytes_out,
        });
        eprintln!("{}", serde_json::to_string_pretty(&json).unwrap_or_default());
    }
}

// ---------------------------------------------------------------------------
// Compress command
// ---------------------------------------------------------------------------

fn cmd_compress(opts: &Options) -> i32 {
    let dispatcher = Dispatcher::new(opts.dispatch);
    let factory = match dispatcher.compress_ctx(opts.algorithm.as_deref()) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("doccodec: {e}");
            return 1;
        }
    };

    let mut reader = match open_input(opts) {
        Ok(r) => r,
        Err(code) => return code,
    };
    let mut writer = match open_output(opts) {
        Ok(w) => w,
        Err(code) => return code,
    };

    let (bytes_in, bytes_out) = match factory {
        Some(factory) => {
            let mut counter = CountingWriter::new(&mut writer);
            let mut sink = factory.open(&mut counter);
            let n = match copy_stream(&mut reader, &mut sink, "read") {
                Ok(n) => n,
                Err(msg) => {
                    eprintln!("doccodec: {msg}");
                    return 1;
                }
            };
            if let Err(e) = sink.finish() {
                eprintln!("doccodec: compress finish error: {e}");
                return 1;
            }
            (n, counter.written)
        }
        None => match copy_stream(&mut reader, &mut writer, "read") {
            Ok(n) => (n, n),
            Err(msg) => {
                eprintln!("doccodec: {msg}");
                return 1;
            }
        },
    };

    if let Err(e) = writer.flush() {
        eprintln!("doccodec: write flush error: {e}");
        return 1;
    }

    report(opts, factory.map(|f| f.algorithm()), bytes_in, bytes_out);
    0
}

// ---------------------------------------------------------------------------
// Decompress command
// ---------------------------------------------------------------------------

fn cmd_decompress(opts: &Options) -> i32 {
    let dispatcher = Dispatcher::new(opts.dispatch);
    let factory = match dispatcher.decompress_ctx(opts.algorithm.as_deref()) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("doccodec: {e}");
            return 1;
        }
    };

    let reader = match open_input(opts) {
        Ok(r) => r,
        Err(code) => return code,
    };
    let mut writer = match open_output(opts) {
        Ok(w) => w,
        Err(code) => return code,
    };

    let mut counter = CountingReader::new(reader);
    let copied = match factory {
        Some(factory) => {
            let mut source = factory.open(&mut counter);
            copy_stream(&mut source, &mut writer, "decompress")
        }
        None => copy_stream(&mut counter, &mut writer, "read"),
    };
    let bytes_out = match copied {
        Ok(n) => n,
        Err(msg) => {
            eprintln!("doccodec: {msg}");
            return 1;
        }
    };

    if let Err(e) = writer.flush() {
        eprintln!("doccodec: write flush error: {e}");
        return 1;
    }

    report(opts, factory.map(|f| f.algorithm()), counter.read, bytes_out);
    0
}

// ---------------------------------------------------------------------------
// Byte counters
// ---------------------------------------------------------------------------

struct CountingWriter<W: Write> {
    inner: W,
    written: u64,
}

impl<W: Write> CountingWriter<W> {
    fn new(inner: W) -> Self {
        Self { inner, written: 0 }
    }
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

struct CountingReader<R: Read> {
    inner: R,
    read: u64,
}

impl<R: Read> CountingReader<R> {
    fn new(inner: R) -> Self {
        Self { inner, read: 0 }
    }
}

impl<R: Read> Read for CountingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.read += n as u64;
        Ok(n)
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Main CLI entry point. Parses arguments via clap, dispatches commands.
pub fn run() -> ! {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp(None)
        .format_target(false)
        .init();

    let cli = Cli::parse();
    let opts = resolve_options(cli);

    if opts.use_stdout && opts.output_file.is_some() && !opts.quiet {
        eprintln!("doccodec: warning: -c option overrides output filename");
    }

    let exit_code = match opts.command {
        Command::Compress => cmd_compress(&opts),
        Command::Decompress => cmd_decompress(&opts),
        Command::Config => cmd_config(&opts),
    };

    process::exit(exit_code);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
