use std::process;

use clap::Parser;
use prereq::{Atom, Expression};
use tracing::instrument;

use super::{Context, ensure_within_limit, terminal::Colorize};

#[derive(Debug, Parser)]
#[command(about = "Check whether fulfilling one requirement guarantees another")]
pub struct Implies {
    /// The requirement assumed to be fulfilled, as text or JSON
    #[arg(value_parser = super::parse_expression)]
    requirement: Expression,

    /// The requirement to check, as text or JSON
    #[arg(
        value_parser = super::parse_expression,
        required_unless_present = "course",
        conflicts_with = "course"
    )]
    other: Option<Expression>,

    /// Check a single catalogue course instead of a requirement
    #[arg(long)]
    course: Option<Atom>,

    /// Refuse requirements with more than this many combinations (defaults to
    /// the configured limit)
    #[arg(long)]
    limit: Option<usize>,
}

impl Implies {
    /// Prints the verdict, exiting with status 1 when the requirement is not
    /// implied.
    #[instrument(level = "debug", skip_all)]
    pub fn run(self, context: &Context) -> anyhow::Result<()> {
        let catalogue = context.catalogue();
        let limit = context.limit(self.limit);
        let requirement = self.requirement.resolve(catalogue)?;
        ensure_within_limit(&requirement, limit)?;

        let implied = match (self.course, self.other) {
            (Some(course), _) => requirement.implies_atom(&course, catalogue)?,
            (None, Some(other)) => {
                let other = other.resolve(catalogue)?;
                ensure_within_limit(&other, limit)?;
                requirement.implies(&other)
            }
            (None, None) => anyhow::bail!("nothing to check against"),
        };

        if implied {
            println!("{}", "implied".success());
        } else {
            println!("{}", "not implied".warning());
            process::exit(1);
        }

        Ok(())
    }
}
