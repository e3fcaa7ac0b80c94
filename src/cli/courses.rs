use clap::Parser;
use prereq::{Expression, storage::CatalogueEntry};
use tracing::instrument;

use super::{Context, OutputFormat, print_json, terminal::Colorize};

#[derive(Debug, Parser)]
#[command(about = "List the courses a requirement mentions, in catalogue order")]
pub struct Courses {
    /// The requirement, as text or JSON
    #[arg(value_parser = super::parse_expression)]
    requirement: Expression,

    /// Output format
    #[arg(long, value_enum, default_value_t)]
    output: OutputFormat,
}

impl Courses {
    #[instrument(level = "debug", skip_all)]
    pub fn run(self, context: &Context) -> anyhow::Result<()> {
        let requirement = self.requirement.resolve(context.catalogue())?;
        let courses = requirement.courses();

        match self.output {
            OutputFormat::Json => print_json(&courses)?,
            OutputFormat::Pretty => {
                if courses.is_empty() {
                    println!("{}", "No courses match".dim());
                }
                for course in &courses {
                    let name = context
                        .catalogue()
                        .get(course)
                        .map(CatalogueEntry::name)
                        .unwrap_or_default();
                    println!("{course}  {}", name.dim());
                }
            }
        }

        Ok(())
    }
}
