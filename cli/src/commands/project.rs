use anyhow::{Context, Result, bail};
use clap::Subcommand;
use patch::Project;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Subcommand)]
pub enum ProjectCommands {
    /// Check a project file without writing anything
    Validate {
        /// Project .json file
        project: PathBuf,
    },
    /// Apply every action to every input
    Run {
        /// Project .json file
        project: PathBuf,
        /// Output directory for the patched inputs
        #[arg(short, long)]
        output: PathBuf,
    },
}

pub fn handle(cmd: ProjectCommands) -> Result<()> {
    match cmd {
        ProjectCommands::Validate { project } => project_validate(&project),
        ProjectCommands::Run { project, output } => project_run(&project, &output),
    }
}

fn load(path: &Path) -> Result<Project> {
    Project::load(path).with_context(|| format!("Failed to load project {}", path.display()))
}

fn project_validate(path: &Path) -> Result<()> {
    let project = load(path)?;
    project.validate()?;
    println!(
        "Project '{}' is valid: {} inputs, {} actions",
        project.name,
        project.inputs.len(),
        project.actions.len()
    );
    Ok(())
}

fn project_run(path: &Path, output: &Path) -> Result<()> {
    let project = load(path)?;
    info!("Running project '{}'", project.name);
    let report = project.run(output)?;

    for input in &report.inputs {
        println!("{} -> {}", input.input.display(), input.output.display());
        println!(
            "  WEM: streaming {}, {} banks, {} size fields patched",
            if input.wem.streaming_replaced { "replaced" } else { "untouched" },
            input.wem.banks_modified,
            input.wem.references_patched
        );
        println!("  Sound banks replaced: {}", input.banks_replaced);
    }

    if !report.unmatched.is_empty() {
        let missing: Vec<String> = report
            .unmatched
            .iter()
            .map(|(kind, id)| format!("{:?} {}", kind, id))
            .collect();
        bail!("Actions matched nothing: {}", missing.join(", "));
    }
    Ok(())
}
