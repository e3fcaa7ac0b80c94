use clap::Parser;
use prereq::{Atom, Expression, Requirement, RequirementSet};
use serde_json::json;
use tracing::instrument;

use super::{Context, OutputFormat, ensure_within_limit, print_json, terminal::Colorize};

#[derive(Debug, Parser)]
#[command(about = "Show what is still owed once some courses have been taken")]
pub struct Remaining {
    /// The requirement, as text or JSON
    #[arg(value_parser = super::parse_expression)]
    requirement: Expression,

    /// The courses already taken (comma-separated)
    #[arg(long, short, value_delimiter = ',', required = true)]
    taken: Vec<Atom>,

    /// Credit each taken course in place, one at a time, instead of matching
    /// the taken courses against every combination
    #[arg(long)]
    credit: bool,

    /// Refuse requirements with more than this many combinations (defaults to
    /// the configured limit)
    #[arg(long)]
    limit: Option<usize>,

    /// Output format
    #[arg(long, value_enum, default_value_t)]
    output: OutputFormat,
}

impl Remaining {
    #[instrument(level = "debug", skip_all)]
    pub fn run(self, context: &Context) -> anyhow::Result<()> {
        let requirement = self.requirement.resolve(context.catalogue())?;
        ensure_within_limit(&requirement, context.limit(self.limit))?;

        let remaining = if self.credit {
            let mut requirement = requirement;
            for course in &self.taken {
                requirement.assume_taken(course);
            }
            Some(requirement.simplified()).filter(|requirement| !requirement.is_empty())
        } else {
            let taken: Requirement = RequirementSet::from_atoms(self.taken).into();
            requirement.requirements_not_implied_by(&taken)
        };

        match self.output {
            OutputFormat::Json => print_json(&json!({
                "fulfilled": remaining.is_none(),
                "remaining": remaining.as_ref().map(ToString::to_string),
                "courses": remaining.as_ref().map(Requirement::courses).unwrap_or_default(),
            }))?,
            OutputFormat::Pretty => match remaining {
                None => println!("{}", "fulfilled".success()),
                Some(remaining) => {
                    println!("{}", "still required".warning());
                    println!("{remaining}");
                }
            },
        }

        Ok(())
    }
}
