use clap::Parser;
use prereq::{Atom, storage::PrerequisiteKind};
use tracing::instrument;

use super::{Context, OutputFormat, print_json, terminal::Colorize};

#[derive(Debug, Parser)]
#[command(about = "List the courses a course is a prerequisite of")]
pub struct LeadsTo {
    /// The course code
    course: Atom,

    /// Output format
    #[arg(long, value_enum, default_value_t)]
    output: OutputFormat,
}

impl LeadsTo {
    #[instrument(level = "debug", skip_all, fields(course = %self.course))]
    pub fn run(self, context: &Context) -> anyhow::Result<()> {
        let leads = context.catalogue().leads_to(&self.course)?;

        match self.output {
            OutputFormat::Json => print_json(&leads)?,
            OutputFormat::Pretty => {
                if leads.is_empty() {
                    println!("{} is not a prerequisite of any course", self.course);
                }
                for lead in &leads {
                    let kind = match lead.kind {
                        PrerequisiteKind::Obligatory => lead.kind.to_string().warning(),
                        PrerequisiteKind::Recommended => lead.kind.to_string().info(),
                    };
                    println!(
                        "{}  {}  {kind}",
                        lead.course.coursecode(),
                        lead.course.name().dim()
                    );
                }
            }
        }

        Ok(())
    }
}
