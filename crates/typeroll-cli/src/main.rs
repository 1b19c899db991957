use std::fs;
use std::path::PathBuf;

use clap::Parser;
use typeroll::{generate_dts, GenerateOptions, ResolvePolicy};

mod config;
mod diagnostic;

use config::{ResolveSetting, TyperollConfig};

#[derive(Parser, Debug)]
#[command(name = "typeroll", version, about = "Bundled TypeScript declaration generator")]
struct Cli {
    /// Entry source files or glob patterns (default: from typeroll.toml)
    entrypoints: Vec<String>,

    /// Project root (default: current directory)
    #[arg(long)]
    cwd: Option<PathBuf>,

    /// Output directory for declaration files
    #[arg(short, long)]
    out_dir: Option<PathBuf>,

    /// Alternative tsconfig for the checker
    #[arg(long)]
    tsconfig: Option<PathBuf>,

    /// Inline declarations of external packages. With no value, inline
    /// everything; with values, only the listed packages.
    #[arg(long, value_name = "PKG", num_args = 0..)]
    resolve: Option<Vec<String>>,

    /// Produce declarations with the whole-program checker (supports
    /// cross-file type inference; requires a tsconfig)
    #[arg(long)]
    infer_types: bool,

    /// Use the native-preview checker binary
    #[arg(long)]
    tsgo: bool,

    /// Allow shared chunks between entries
    #[arg(long)]
    splitting: bool,

    /// Rename top-level identifiers to short names and strip whitespace
    #[arg(long)]
    minify: bool,

    /// Output naming pattern ([dir], [name], [ext])
    #[arg(long)]
    naming: Option<String>,

    /// Print declarations to stdout instead of writing files
    #[arg(long)]
    stdout: bool,

    /// Suppress non-error output
    #[arg(short, long)]
    quiet: bool,

    /// Enable verbose debug logging
    #[arg(short, long)]
    debug: bool,
}

fn main() {
    let cli = Cli::parse();

    if cli.debug {
        use tracing_subscriber::EnvFilter;
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| EnvFilter::new("typeroll=debug")),
            )
            .with_writer(std::io::stderr)
            .init();
    }

    let cwd = cli
        .cwd
        .clone()
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));
    let config = TyperollConfig::load_or_default(&cwd);

    // CLI flags override typeroll.toml.
    let entrypoints = if cli.entrypoints.is_empty() {
        config.entry.clone()
    } else {
        cli.entrypoints.clone()
    };
    if entrypoints.is_empty() {
        eprintln!("error: no entrypoints given");
        eprintln!("  pass entry files (typeroll src/index.ts) or set `entry` in typeroll.toml");
        std::process::exit(2);
    }

    let resolve = match (&cli.resolve, &config.bundle.resolve) {
        (Some(packages), _) if packages.is_empty() => ResolvePolicy::All,
        (Some(packages), _) => ResolvePolicy::Packages(packages.clone()),
        (None, Some(ResolveSetting::All(true))) => ResolvePolicy::All,
        (None, Some(ResolveSetting::All(false))) | (None, None) => ResolvePolicy::None,
        (None, Some(ResolveSetting::Packages(packages))) => {
            ResolvePolicy::Packages(packages.clone())
        }
    };

    let options = GenerateOptions {
        cwd: Some(cwd.clone()),
        preferred_tsconfig: cli
            .tsconfig
            .clone()
            .or_else(|| config.bundle.tsconfig.clone().map(PathBuf::from)),
        resolve,
        infer_types: cli.infer_types || config.bundle.infer_types(),
        tsgo: cli.tsgo || config.bundle.tsgo(),
        splitting: cli.splitting || config.bundle.splitting(),
        minify: cli.minify || config.bundle.minify(),
        naming: cli.naming.clone().or_else(|| config.bundle.naming.clone()),
    };

    let result = match generate_dts(&entrypoints, &options) {
        Ok(result) => result,
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(1);
        }
    };

    if !result.errors.is_empty() {
        diagnostic::report_emit_diagnostics(&result.errors);
    }

    if cli.stdout {
        for file in &result.files {
            println!("// {}", file.path.display());
            print!("{}", file.text);
        }
        return;
    }

    let out_dir = cli
        .out_dir
        .clone()
        .unwrap_or_else(|| cwd.join(config.bundle.out_dir()));
    for file in &result.files {
        let target = out_dir.join(&file.path);
        if let Some(parent) = target.parent() {
            if let Err(err) = fs::create_dir_all(parent) {
                eprintln!("Failed to create output directory: {err}");
                std::process::exit(1);
            }
        }
        if let Err(err) = fs::write(&target, &file.text) {
            eprintln!("Failed to write {}: {err}", target.display());
            std::process::exit(1);
        }
        if !cli.quiet {
            println!("Bundled {}", target.display());
        }
    }

    if result.files.is_empty() && !cli.quiet {
        println!("No declarations to emit (all outputs were empty)");
    }
}
