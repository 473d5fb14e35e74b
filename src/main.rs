use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use rerereric::config::RerereConfig;
use rerereric::engine::Rerereric;
use rerereric::repo::discover_git_dir;
use rerereric::telemetry;

/// Fuzzy reuse of recorded merge-conflict resolutions
///
/// Like `git rerere`, but tolerant: resolutions are matched by similarity
/// instead of exact content, so a conflict that drifted slightly (renamed
/// variable, moved lines, different file) can still be resolved from the
/// cache.
///
/// WORKFLOW:
///
///   # a merge/rebase left conflicts behind
///   rerereric mark-conflicts src/app.rs src/lib.rs
///
///   # resolve the conflicts by hand, then record what you did
///   rerereric save-resolutions
///
///   # next time the same (or a similar) conflict appears
///   rerereric reapply-resolutions src/app.rs
///
/// State lives under `<git-dir>/fuzzy-rerere/`. Defaults can be set in a
/// `.rerereric.toml` at the repository root.
#[derive(Parser)]
#[command(name = "rerereric")]
#[command(version, about)]
#[command(after_help = "See 'rerereric <command> --help' for more information on a specific command.")]
struct Cli {
    /// Git directory to store state under (discovered via `git rev-parse
    /// --git-dir` when omitted)
    #[arg(long, global = true, value_name = "PATH")]
    git_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Snapshot conflicted files before you resolve them
    #[command(alias = "mark_conflicts")]
    MarkConflicts {
        /// Files currently containing conflict markers
        #[arg(required = true, value_name = "FILE")]
        files: Vec<PathBuf>,

        /// Context lines captured around each conflict
        #[arg(long, value_name = "N")]
        context: Option<usize>,
    },

    /// Record the resolutions of previously marked conflicts
    #[command(alias = "save_resolutions")]
    SaveResolutions {
        /// Context lines captured around each conflict
        #[arg(long, value_name = "N")]
        context: Option<usize>,
    },

    /// Resolve conflicts from the cache where a recorded resolution matches
    #[command(alias = "reapply_resolutions")]
    ReapplyResolutions {
        /// Files to attempt to resolve
        #[arg(required = true, value_name = "FILE")]
        files: Vec<PathBuf>,

        /// Context lines captured around each conflict
        #[arg(long, value_name = "N")]
        context: Option<usize>,

        /// Similarity threshold in (0.0, 1.0]
        #[arg(long, value_name = "T")]
        similarity: Option<f64>,
    },
}

fn main() -> Result<()> {
    telemetry::init();
    let cli = Cli::parse();

    let git_dir = match cli.git_dir {
        Some(dir) => dir,
        None => discover_git_dir(&std::env::current_dir().context("cannot read current dir")?)?,
    };

    let cwd = std::env::current_dir().context("cannot read current dir")?;
    match cli.command {
        Commands::MarkConflicts { files, context } => {
            let config = RerereConfig::load(&cwd)?.with_overrides(context, None);
            config.validate()?;
            let report = Rerereric::new(config, git_dir).mark_conflicts(&files)?;
            for (file, conflicts) in &report.snapshotted {
                println!("marked {} ({conflicts} conflicts)", file.display());
            }
        }
        Commands::SaveResolutions { context } => {
            let config = RerereConfig::load(&cwd)?.with_overrides(context, None);
            config.validate()?;
            let report = Rerereric::new(config, git_dir).save_resolutions()?;
            println!(
                "saved {} resolutions ({} already recorded) from {} files",
                report.saved, report.duplicates, report.files_processed
            );
        }
        Commands::ReapplyResolutions {
            files,
            context,
            similarity,
        } => {
            let config = RerereConfig::load(&cwd)?.with_overrides(context, similarity);
            config.validate()?;
            let report = Rerereric::new(config, git_dir).reapply_resolutions(&files)?;
            for (file, outcomes) in &report.files {
                for outcome in outcomes {
                    match &outcome.applied {
                        Some((_, similarity)) => println!(
                            "{}:{}: applied ({:.0}% similar)",
                            file.display(),
                            outcome.line,
                            similarity * 100.0
                        ),
                        None => println!("{}:{}: unresolved", file.display(), outcome.line),
                    }
                }
            }
            println!(
                "{} applied, {} unresolved",
                report.applied(),
                report.unresolved()
            );
        }
    }

    Ok(())
}
