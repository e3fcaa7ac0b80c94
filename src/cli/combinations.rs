use clap::Parser;
use prereq::{Atom, Expression};
use tracing::instrument;

use super::{Context, OutputFormat, ensure_within_limit, print_json, terminal::Colorize};

#[derive(Debug, Parser)]
#[command(about = "Enumerate every way to fulfil a requirement")]
pub struct Combinations {
    /// The requirement, as text or JSON
    #[arg(value_parser = super::parse_expression)]
    requirement: Expression,

    /// Refuse to enumerate more than this many combinations (defaults to the
    /// configured limit)
    #[arg(long)]
    limit: Option<usize>,

    /// Only print how many combinations there are
    #[arg(long)]
    count: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t)]
    output: OutputFormat,
}

impl Combinations {
    #[instrument(level = "debug", skip_all)]
    pub fn run(self, context: &Context) -> anyhow::Result<()> {
        let requirement = self.requirement.resolve(context.catalogue())?;
        let count = requirement.combination_count();

        if self.count {
            println!("{count}");
            return Ok(());
        }

        ensure_within_limit(&requirement, context.limit(self.limit))?;

        let combinations = requirement.combinations();
        match self.output {
            OutputFormat::Json => print_json(&combinations)?,
            OutputFormat::Pretty => {
                for combination in &combinations {
                    if combination.is_empty() {
                        println!("{}", "nothing required".success());
                        continue;
                    }
                    let codes: Vec<&str> = combination.iter().map(Atom::as_str).collect();
                    println!("{}", codes.join(", "));
                }
                println!("{}", format!("{count} combination(s)").dim());
            }
        }

        Ok(())
    }
}
