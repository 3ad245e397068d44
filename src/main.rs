#![allow(clippy::struct_excessive_bools)]

use clap::{ArgAction, CommandFactory as _, Parser, ValueEnum, ValueHint, value_parser};
use clap_complete::aot::{Shell, generate};
use rfind::{FindError, Finder, MAX_LINK_DEPTH, Pattern, PrintOptions, Printer, Target, fs::OsFs};
use std::{
    io::{self, stdout},
    path::{Path, PathBuf},
};
use tracing_subscriber::EnvFilter;

#[cfg(all(
    feature = "mimalloc",
    any(target_os = "linux", target_os = "macos", target_os = "android")
))]
#[global_allocator]
static ALLOC: mimalloc::MiMalloc = mimalloc::MiMalloc;

const START_PREFIX: &str = ".";

#[derive(Clone, Copy, Debug, ValueEnum)]
enum TypeArg {
    /// Regular files (and anything that is not a directory)
    #[value(name = "f")]
    File,
    /// Directories
    #[value(name = "d")]
    Directory,
}

#[derive(Parser)]
#[command(version = env!("CARGO_PKG_VERSION"))]
///generate our arguments and parse them.
pub struct Args {
    #[arg(
        value_name = "PATTERN",
        help = "Exact file name to look for (all entries if omitted)",
        index = 1
    )]
    pattern: Option<String>,
    #[arg(
        value_name = "PATH",
        help = format!("Path to search (defaults to {START_PREFIX})"),
        value_hint = ValueHint::DirPath,
        required = false,
        index = 2
    )]
    directory: Option<PathBuf>,
    #[arg(
        short = 't',
        long = "type",
        value_enum,
        default_value = "f",
        help = "Collect files (f) or directories (d)"
    )]
    type_of: TypeArg,
    #[arg(
        short = 'r',
        long = "regex",
        default_value_t = false,
        help = "Treat PATTERN as a regex tested against the full path"
    )]
    regex: bool,
    #[arg(
        short = 'N',
        long = "name-regex",
        default_value_t = false,
        conflicts_with = "regex",
        help = "Treat PATTERN as a regex tested against the file name"
    )]
    name_regex: bool,
    #[arg(
        short = 'L',
        long = "follow",
        default_value_t = false,
        help = "Descend into symlinked directories"
    )]
    follow_symlinks: bool,
    #[arg(short = 'd', long = "depth", help = "Only traverse to x depth")]
    depth: Option<u32>,
    #[arg(
        long = "link-depth",
        default_value_t = MAX_LINK_DEPTH,
        help = "Symlink indirections followed before a link counts as unresolved"
    )]
    link_depth: u32,
    #[arg(
        long = "async",
        default_value_t = false,
        help = "Use the non-blocking walker, printing entries as they are found"
    )]
    use_async: bool,
    #[arg(
        long = "ignore-errors",
        default_value_t = false,
        help = "Log filesystem errors and carry on instead of stopping"
    )]
    ignore_errors: bool,
    #[arg(
        short = '0',
        long = "print0",
        default_value_t = false,
        help = "Terminate results with NUL (for xargs -0)"
    )]
    null_terminated: bool,
    #[arg(long = "sort", default_value_t = false, help = "Sort the results")]
    sort: bool,
    #[arg(
        short = 'n',
        long = "max-results",
        help = "Retrieves the first eg 10 results"
    )]
    top_n: Option<usize>,
    #[arg(long = "no-colour", alias = "no-color", default_value_t = false)]
    nocolour: bool,
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, help = "More logging (-vv for trace)")]
    verbose: u8,
    #[arg(
        long = "generate",
        action = ArgAction::Set,
        value_parser = value_parser!(Shell),
        help = "Generate shell completions"
    )]
    generate: Option<Shell>,
}

fn init_logging(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("rfind=warn")),
        1 => EnvFilter::new("rfind=debug,warn"),
        _ => EnvFilter::new("rfind=trace,warn"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn build_pattern(args: &Args) -> Result<Pattern, FindError> {
    match args.pattern.as_deref() {
        None => Ok(Pattern::Any),
        Some(pat) if args.regex => Pattern::regex(pat),
        Some(pat) if args.name_regex => Pattern::name_regex(pat),
        Some(pat) => Ok(Pattern::name(pat)),
    }
}

/// Broken pipes (`rfind | head`) are not worth reporting
fn write_result(result: io::Result<()>) -> Result<(), FindError> {
    match result {
        Err(e) if e.kind() != io::ErrorKind::BrokenPipe => Err(FindError::from_io("<stdout>", e)),
        _ => Ok(()),
    }
}

fn print_results(mut found: Vec<PathBuf>, args: &Args, options: PrintOptions) -> Result<(), FindError> {
    if args.sort {
        found.sort();
    }
    let mut printer = Printer::stdout(options);
    write_result(printer.write_all(found.iter().map(PathBuf::as_path)))?;
    write_result(printer.finish().map(drop))
}

fn run_async(
    finder: &Finder<OsFs>,
    target: Target,
    pattern: Pattern,
    root: &Path,
    args: &Args,
    options: PrintOptions,
) -> Result<(), FindError> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| FindError::from_io(root, e))?;

    runtime.block_on(async {
        if args.sort {
            let found = finder.collect(target, root).matching(pattern).await?;
            return print_results(found, args, options);
        }

        let mut printer = Printer::stdout(options);
        let mut write_error = None;
        finder
            .each(target, root, |path| {
                if write_error.is_none()
                    && let Err(e) = printer.write_path(&path)
                {
                    write_error = Some(e);
                }
            })
            .matching(pattern)
            .await?;
        if let Some(e) = write_error {
            write_result(Err(e))?;
        }
        write_result(printer.finish().map(drop))
    })
}

fn main() -> Result<(), FindError> {
    let args = Args::parse();

    if let Some(generator) = args.generate {
        let mut cmd = Args::command();
        let cmd_clone = cmd.clone();
        generate(
            generator,
            &mut cmd,
            cmd_clone.get_name().to_owned(),
            &mut stdout(),
        );
        return Ok(());
    }

    init_logging(args.verbose);

    let pattern = build_pattern(&args)?;
    let root = args
        .directory
        .clone()
        .unwrap_or_else(|| PathBuf::from(START_PREFIX));
    let target = match args.type_of {
        TypeArg::File => Target::File,
        TypeArg::Directory => Target::Directory,
    };

    let builder = Finder::init()
        .follow_symlinks(args.follow_symlinks)
        .max_depth(args.depth)
        .max_link_depth(args.link_depth);
    let finder = if args.ignore_errors {
        builder.error_handler(rfind::ignore).build()
    } else {
        builder.build()
    };

    let options = PrintOptions {
        limit: args.top_n,
        nocolour: args.nocolour,
        null_terminated: args.null_terminated,
        directories: target == Target::Directory,
    };

    if args.use_async {
        run_async(&finder, target, pattern, &root, &args, options)
    } else {
        let found = finder.collect_sync(target, &pattern, &root)?;
        print_results(found, &args, options)
    }
}
