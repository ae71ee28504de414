mod commands;
mod core;
mod release;
mod ui;

use clap::{Args, Parser, Subcommand};
use core::context::ReleaseContext;
use core::error::{ReleaseError, print_error};
use release::Trigger;
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Bump, publish, verify and commit a package release
#[derive(Parser)]
#[command(name = "pkg-release")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
#[command(styles = get_styles())]
struct Cli {
  /// Show debug logs on stderr (overridden by RUST_LOG)
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Scaffold release.toml for a package
  Init {
    /// Package name (defaults to the directory name)
    #[arg(long)]
    package: Option<String>,
  },

  /// Show what a release would do without changing anything
  Plan {
    #[command(flatten)]
    trigger: TriggerArgs,
    /// Output the plan in JSON format
    #[arg(long)]
    json: bool,
  },

  /// Run a release: bump, publish, verify, commit and push
  Apply {
    #[command(flatten)]
    trigger: TriggerArgs,
    /// Output the release report in JSON format
    #[arg(long)]
    json: bool,
    /// Commit locally but do not push
    #[arg(long)]
    no_push: bool,
  },

  /// Fetch an artifact and print its SHA-256
  Digest {
    /// http(s):// or file:// locator
    locator: String,
    /// Output in JSON format
    #[arg(long)]
    json: bool,
  },
}

#[derive(Args)]
struct TriggerArgs {
  /// Version increment: MAJOR, MINOR, RELEASE or NONE
  #[arg(long, env = "RELEASE_TARGET")]
  target: Option<String>,
  /// Publish to the primary registry: YES or NO
  #[arg(long, env = "RELEASE_PRIMARY")]
  primary: Option<String>,
  /// Publish to the secondary registry: YES or NO
  #[arg(long, env = "RELEASE_SECONDARY")]
  secondary: Option<String>,
}

impl From<TriggerArgs> for Trigger {
  // Missing values fall through to validation, which rejects them with exit code 1
  fn from(args: TriggerArgs) -> Self {
    Trigger {
      target: args.target.unwrap_or_default(),
      primary: args.primary.unwrap_or_default(),
      secondary: args.secondary.unwrap_or_default(),
    }
  }
}

fn get_styles() -> clap::builder::Styles {
  clap::builder::Styles::styled()
    .usage(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .header(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .literal(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))))
    .invalid(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .error(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .valid(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))),
    )
    .placeholder(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::White))))
}

/// Diagnostic logs go to stderr so `--json` output stays parseable
fn init_tracing(verbose: bool) {
  let level = if verbose { Level::DEBUG } else { Level::WARN };
  let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));

  tracing_subscriber::registry()
    .with(env_filter)
    .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
    .try_init()
    .ok();
}

fn main() {
  let cli = Cli::parse();
  init_tracing(cli.verbose);

  let root = match std::env::current_dir() {
    Ok(dir) => dir,
    Err(e) => {
      eprintln!("Error: Failed to get current directory: {}", e);
      std::process::exit(1);
    }
  };

  let result = match cli.command {
    Commands::Init { package } => commands::run_init(&root, package),
    Commands::Digest { locator, json } => commands::run_digest(&locator, json),
    Commands::Plan { trigger, json } => {
      ReleaseContext::build(&root).and_then(|ctx| commands::run_release_plan(&ctx, trigger.into(), json))
    }
    Commands::Apply { trigger, json, no_push } => ReleaseContext::build(&root)
      .and_then(|ctx| commands::run_release_apply(&ctx, trigger.into(), json, no_push)),
  };

  if let Err(err) = result {
    handle_error(err);
  }
}

fn handle_error(err: ReleaseError) -> ! {
  print_error(&err);
  std::process::exit(err.exit_code().as_i32());
}
