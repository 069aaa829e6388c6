use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Parser;

use git_autoversion::cli::{compute_version, parse_major_minor, AutoVersionArgs, Backend};
use git_autoversion::ui;

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
enum OutputFormat {
    /// The version string only
    Text,
    /// The full computed version as JSON
    Json,
    /// Human-readable summary of the version and its inputs
    Report,
}

#[derive(clap::Parser)]
#[command(
    name = "git-autoversion",
    version,
    about = "Compute a build version from git history and branch overrides"
)]
struct Args {
    #[arg(short, long, help = "Directory inside the repository", default_value = ".")]
    repo: PathBuf,

    #[arg(short, long, help = "Custom configuration file path")]
    config: Option<PathBuf>,

    #[arg(short = 'n', long, help = "CI build counter", default_value_t = 0)]
    build_counter: u64,

    #[arg(long, help = "Build timestamp (RFC 3339), defaults to now")]
    timestamp: Option<DateTime<Utc>>,

    #[arg(
        long,
        value_name = "MAJOR.MINOR",
        help = "Use fixed MAJOR.MINOR with the build counter as patch"
    )]
    legacy: Option<String>,

    #[arg(long, value_enum, default_value = "libgit2", help = "How git is read")]
    backend: Backend,

    #[arg(long, default_value = "git", help = "git executable for the cli backend")]
    git: PathBuf,

    #[arg(long, default_value_t = 60, help = "Seconds allowed per git invocation")]
    timeout: u64,

    #[arg(long, help = "Machine identifier recorded in the version")]
    machine_id: Option<String>,

    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,

    #[arg(short, long, help = "Verbose logging")]
    verbose: bool,

    #[arg(short, long, conflicts_with = "verbose", help = "Only log warnings and errors")]
    quiet: bool,
}

fn init_logging(args: &Args) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if args.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if args.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();
}

fn main() {
    let args = Args::parse();
    init_logging(&args);

    if let Err(e) = run(args) {
        ui::display_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let legacy = args
        .legacy
        .as_deref()
        .map(parse_major_minor)
        .transpose()?;

    let workflow = AutoVersionArgs {
        repo: args.repo.clone(),
        config_path: args.config.clone(),
        build_counter: args.build_counter,
        timestamp: args.timestamp,
        legacy,
        backend: args.backend,
        git_path: args.git.clone(),
        git_timeout: Duration::from_secs(args.timeout),
        machine_id: args.machine_id.clone(),
    };

    let report = matches!(args.format, OutputFormat::Report);
    if report {
        ui::display_status(&format!(
            "Reading {} with the {:?} backend",
            args.repo.display(),
            args.backend
        ));
    }

    let version = compute_version(&workflow)
        .with_context(|| format!("computing version for {}", args.repo.display()))?;

    match args.format {
        OutputFormat::Text => println!("{}", version),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&version)?),
        OutputFormat::Report => {
            ui::display_version_report(&version);
            ui::display_success(&format!("Version {} computed", version));
        }
    }

    Ok(())
}
