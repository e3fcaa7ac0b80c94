use clap::Parser;
use prereq::Expression;
use serde_json::json;
use tracing::instrument;

use super::{Context, OutputFormat, ensure_within_limit, print_json, terminal::Colorize};

#[derive(Debug, Parser)]
#[command(about = "Rewrite a requirement into a smaller equivalent one")]
pub struct Simplify {
    /// The requirement, as text or JSON
    #[arg(value_parser = super::parse_expression)]
    requirement: Expression,

    /// Refuse requirements with more than this many combinations (defaults to
    /// the configured limit)
    #[arg(long)]
    limit: Option<usize>,

    /// Output format
    #[arg(long, value_enum, default_value_t)]
    output: OutputFormat,
}

impl Simplify {
    #[instrument(level = "debug", skip_all)]
    pub fn run(self, context: &Context) -> anyhow::Result<()> {
        let original = self.requirement.resolve(context.catalogue())?;
        ensure_within_limit(&original, context.limit(self.limit))?;
        let simplified = original.clone().simplified();

        match self.output {
            OutputFormat::Json => print_json(&json!({
                "requirement": simplified.to_string(),
                "courses": simplified.courses(),
                "fingerprint": simplified.fingerprint(),
            }))?,
            OutputFormat::Pretty => {
                println!("{simplified}");
                if simplified == original {
                    println!("{}", "already as simple as it gets".dim());
                }
            }
        }

        Ok(())
    }
}
