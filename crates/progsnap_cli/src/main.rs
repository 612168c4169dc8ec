//! Progsnap CLI
//!
//! Replays and inspects progsnap datasets from the command line.

#![warn(missing_docs)]
#![warn(clippy::all)]

use clap::{Parser, Subcommand};
use color_eyre::Result;
use progsnap_core::ProgsnapError;
use progsnap_dataset::{Dataset, DatasetConfig};
use progsnap_replay::{ReplayConfig, ReplayEngine, ReplayStep};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

const RULE: &str = "-------------------------";

#[derive(Parser)]
#[command(name = "progsnap")]
#[command(about = "Replay and inspect progsnap programming-session datasets", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rebuild each work history's text edit by edit
    Replay {
        /// Dataset directory or zip archive
        dataset: PathBuf,
        /// Only replay this student
        student: Option<i64>,
        /// Print the full text after each edit
        #[arg(short, long)]
        verbose: bool,
        /// Save the text after each edit to <editid>.txt in this directory
        #[arg(short = 'f', long = "files")]
        outdir: Option<PathBuf>,
        /// Order events by editid and timestamp instead of file order
        #[arg(long)]
        sort: bool,
        /// Do not check deleted text against the document
        #[arg(long)]
        no_verify: bool,
    },
    /// Summarize a dataset
    Inspect {
        /// Dataset directory or zip archive
        dataset: PathBuf,
        /// Order events by editid and timestamp instead of file order
        #[arg(long)]
        sort: bool,
    },
}

fn main() -> Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut stdout = std::io::stdout().lock();
    match cli.command {
        Commands::Replay {
            dataset,
            student,
            verbose,
            outdir,
            sort,
            no_verify,
        } => {
            let options = ReplayOptions {
                student,
                verbose,
                outdir,
                config: ReplayConfig {
                    verify_deletes: !no_verify,
                    ..ReplayConfig::default()
                },
            };
            let dataset = Dataset::open(&dataset, DatasetConfig::default().with_sort_work_history(sort))?;
            replay(&dataset, &options, &mut stdout)
        }
        Commands::Inspect { dataset, sort } => {
            let dataset = Dataset::open(&dataset, DatasetConfig::default().with_sort_work_history(sort))?;
            inspect(&dataset, &mut stdout)
        }
    }
}

struct ReplayOptions {
    student: Option<i64>,
    verbose: bool,
    outdir: Option<PathBuf>,
    config: ReplayConfig,
}

fn replay(dataset: &Dataset, options: &ReplayOptions, out: &mut impl Write) -> Result<()> {
    let engine = ReplayEngine::new().with_config(options.config.clone());
    if let Some(dir) = &options.outdir {
        std::fs::create_dir_all(dir)?;
    }

    for student in dataset.students() {
        if options.student.is_some_and(|wanted| wanted != student.number()) {
            continue;
        }
        for history in dataset.work_histories_for_student(student.number()) {
            writeln!(
                out,
                "Student {}, problem {}",
                history.student_num(),
                history.assign_num()
            )?;
            engine.replay_with_callback(history, |step| {
                report_step(history.student_num(), step, options, &mut *out)
            })?;
        }
    }
    Ok(())
}

fn report_step(
    student: i64,
    step: &ReplayStep<'_>,
    options: &ReplayOptions,
    out: &mut impl Write,
) -> Result<(), ProgsnapError> {
    let editid = display_editid(step.edit.editid());
    let text = step.document.text();
    if options.verbose {
        writeln!(out, "{student} {editid} {} {RULE}", step.kind)
            .and_then(|()| writeln!(out, "{text}"))
            .and_then(|()| writeln!(out, "{RULE}"))
            .map_err(|e| ProgsnapError::storage("<stdout>", e))?;
    }
    if let Some(dir) = &options.outdir {
        save_text(dir, &editid, text)?;
    }
    Ok(())
}

fn save_text(dir: &Path, editid: &str, text: &str) -> Result<(), ProgsnapError> {
    let path = dir.join(format!("{editid}.txt"));
    std::fs::write(&path, text).map_err(|e| ProgsnapError::storage(path.display().to_string(), e))
}

fn display_editid(editid: Option<i64>) -> String {
    editid.map_or_else(|| "None".to_string(), |id| id.to_string())
}

fn inspect(dataset: &Dataset, out: &mut impl Write) -> Result<()> {
    let info = dataset.info();
    for (name, value) in info.props().as_map() {
        match value {
            serde_json::Value::String(s) => writeln!(out, "{name}: {s}")?,
            other => writeln!(out, "{name}: {other}")?,
        }
    }

    writeln!(out, "Assignments:")?;
    for assignment in dataset.assignments() {
        let name = assignment.name().unwrap_or("(unnamed)");
        writeln!(
            out,
            "  {} {} ({} tests, {} work histories)",
            assignment.number(),
            name,
            assignment.tests().len(),
            dataset.work_histories_for_assignment(assignment.number()).len()
        )?;
    }

    let instructors = dataset
        .students()
        .filter(|s| s.instructor().unwrap_or(false))
        .count();
    writeln!(
        out,
        "Students: {} ({} instructors)",
        dataset.students().count(),
        instructors
    )?;
    writeln!(out, "Work histories: {}", dataset.work_histories().len())?;
    Ok(())
}
