use clap::Parser;
use prereq::{Atom, storage::PrerequisiteKind};
use serde_json::json;
use tracing::instrument;

use super::{Context, OutputFormat, print_json, terminal::Colorize};

#[derive(Debug, Parser)]
#[command(about = "Show the prerequisites of a course")]
pub struct Prerequisites {
    /// The course code
    course: Atom,

    /// Show the recommended rather than the obligatory prerequisites
    #[arg(long, conflicts_with = "closure")]
    recommended: bool,

    /// Follow obligatory prerequisites all the way down
    #[arg(long)]
    closure: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t)]
    output: OutputFormat,
}

impl Prerequisites {
    #[instrument(level = "debug", skip_all, fields(course = %self.course))]
    pub fn run(self, context: &Context) -> anyhow::Result<()> {
        let catalogue = context.catalogue();
        let kind = if self.recommended {
            PrerequisiteKind::Recommended
        } else {
            PrerequisiteKind::Obligatory
        };

        let requirement = if self.closure {
            catalogue.prerequisite_closure(&self.course)?
        } else {
            catalogue.prerequisites(&self.course, kind)?
        };

        match self.output {
            OutputFormat::Json => print_json(&json!({
                "course": self.course,
                "kind": kind,
                "closure": self.closure,
                "requirement": (!requirement.is_empty()).then(|| requirement.to_string()),
                "courses": requirement.courses(),
            }))?,
            OutputFormat::Pretty => {
                if let Some(entry) = catalogue.get(&self.course) {
                    println!("{} {}", entry.coursecode(), entry.name().dim());
                }
                if requirement.is_empty() {
                    println!("{}", format!("no {kind} prerequisites").success());
                } else {
                    println!("{requirement}");
                }
            }
        }

        Ok(())
    }
}
