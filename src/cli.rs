use std::path::{Path, PathBuf};

mod combinations;
mod courses;
mod implies;
mod leads_to;
mod prerequisites;
mod remaining;
mod simplify;
mod terminal;

use anyhow::Context as _;
use clap::ArgAction;
use combinations::Combinations;
use courses::Courses;
use implies::Implies;
use leads_to::LeadsTo;
use prereq::{Catalogue, Config, Expression, Requirement};
use prerequisites::Prerequisites;
use remaining::Remaining;
use serde::Serialize;
use serde_json::Value;
use simplify::Simplify;
use tracing::{debug, instrument, warn};

/// Parse a requirement from the command line.
///
/// Anything that parses as JSON is read as a JSON requirement; everything else
/// is read as requirement text.
fn parse_expression(s: &str) -> Result<Expression, String> {
    serde_json::from_str::<Value>(s)
        .map_or_else(|_| s.parse(), |value| Expression::from_value(&value))
        .map_err(|e| format!("{e}"))
}

#[derive(Debug, clap::Parser)]
#[command(version, about)]
pub struct Cli {
    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// The path to the configuration file
    #[arg(short, long, default_value = "prereq.toml", global = true)]
    config: PathBuf,

    /// The course catalogue to use, instead of the configured one
    #[arg(long, global = true)]
    catalogue: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        Self::setup_logging(self.verbose);

        let context = Context::load(&self.config, self.catalogue)?;
        self.command.run(&context)
    }

    fn setup_logging(verbosity: u8) {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let level = match verbosity {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        };

        let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_thread_names(false)
            .with_line_number(false)
            .with_writer(std::io::stderr);

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

#[derive(Debug, clap::Parser)]
pub enum Command {
    /// List the courses a requirement mentions
    Courses(Courses),

    /// Enumerate every way to fulfil a requirement
    Combinations(Combinations),

    /// Check whether fulfilling one requirement guarantees another
    Implies(Implies),

    /// Show what is still owed once some courses have been taken
    Remaining(Remaining),

    /// Rewrite a requirement into a smaller equivalent one
    Simplify(Simplify),

    /// Show the prerequisites of a course
    Prerequisites(Prerequisites),

    /// List the courses a course is a prerequisite of
    LeadsTo(LeadsTo),
}

impl Command {
    fn run(self, context: &Context) -> anyhow::Result<()> {
        match self {
            Self::Courses(command) => command.run(context)?,
            Self::Combinations(command) => command.run(context)?,
            Self::Implies(command) => command.run(context)?,
            Self::Remaining(command) => command.run(context)?,
            Self::Simplify(command) => command.run(context)?,
            Self::Prerequisites(command) => command.run(context)?,
            Self::LeadsTo(command) => command.run(context)?,
        }
        Ok(())
    }
}

/// Output format shared by the commands.
#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Pretty,
    Json,
}

/// Everything a command needs: the configuration and the loaded catalogue.
#[derive(Debug)]
pub struct Context {
    config: Config,
    catalogue: Catalogue,
}

impl Context {
    #[instrument(level = "debug")]
    fn load(config_path: &Path, catalogue: Option<PathBuf>) -> anyhow::Result<Self> {
        let mut config = if config_path.exists() {
            Config::load(config_path).map_err(anyhow::Error::msg)?
        } else {
            debug!(path = %config_path.display(), "no configuration file, using defaults");
            Config::default()
        };

        if let Some(catalogue) = catalogue {
            config.set_catalogue(catalogue);
        }

        let path = config.catalogue();
        let catalogue = if path.exists() {
            Catalogue::load(path)
                .with_context(|| format!("failed to load catalogue {}", path.display()))?
        } else {
            warn!(
                path = %path.display(),
                "catalogue not found, only literal course codes will resolve"
            );
            Catalogue::default()
        };

        Ok(Self { config, catalogue })
    }

    pub const fn config(&self) -> &Config {
        &self.config
    }

    pub const fn catalogue(&self) -> &Catalogue {
        &self.catalogue
    }

    /// The combination limit, unless overridden on the command line.
    pub fn limit(&self, limit: Option<usize>) -> usize {
        limit.unwrap_or(self.config.combination_limit)
    }
}

/// Refuses a requirement with more combinations than `limit`.
///
/// The count at the root bounds the count of every node below it, so this
/// bounds every enumeration done while evaluating the requirement.
fn ensure_within_limit(requirement: &Requirement, limit: usize) -> anyhow::Result<()> {
    let count = requirement.combination_count();
    if count > limit {
        anyhow::bail!(
            "requirement has {count} combinations, more than the limit of {limit} (see --limit)"
        );
    }
    Ok(())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(std::io::stdout(), value)
        .context("failed to render json output")?;
    println!();
    Ok(())
}
