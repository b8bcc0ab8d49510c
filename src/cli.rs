//! CLI surface for recast.
//!
//! Thin driver over the engine: plan every file, show the full multi-file
//! plan, gate execution behind a confirmation prompt (or `--force`), then
//! apply file by file.

use std::ffi::OsString;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use clap::{ArgAction, Parser};

use crate::plan::MigrationPlan;
use crate::version::FormatVersion;
use crate::{Effect, Error, Result, upgrade};

// =============================================================================
// Entry + options
// =============================================================================

#[derive(Parser, Debug)]
#[command(
    name = "recast",
    version,
    about = "Upgrade container files to the newest format version",
    arg_required_else_help = true
)]
pub struct Cli {
    /// Apply the listed changes without prompting.
    #[arg(short, long)]
    pub force: bool,

    /// Debug output (repeat for more).
    #[arg(short = 'v', long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Path to file to upgrade (at least one).
    #[arg(required = true, value_name = "FILE")]
    pub files: Vec<PathBuf>,
}

/// Parse CLI from raw args (used by bin and tests).
pub fn parse_from<I, T>(args: I) -> Cli
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    Cli::parse_from(args)
}

// =============================================================================
// Run
// =============================================================================

const BACKUP_WARNING: &str = "
PLEASE READ CAREFULLY

If you choose to continue, the changes listed above will be applied to the
respective files. This will make the files unreadable by older library
versions. Although this procedure is generally fast and safe, interrupting it
may leave files in a corrupted state.

MAKE SURE YOUR FILES AND DATA ARE BACKED UP BEFORE CONTINUING.
";

/// Run the CLI (used by bin).
pub fn run(cli: Cli) -> Result<()> {
    let target = FormatVersion::current();
    let total = cli.files.len();
    let mut failed = 0usize;
    let mut pending: Vec<(PathBuf, MigrationPlan)> = Vec::new();

    // Planning is read-only: a failing file is reported and skipped, the
    // rest of the batch still runs.
    for file in &cli.files {
        match upgrade::plan_for(file, &target) {
            Ok(migration) if migration.is_empty() => {
                println!("{}: Up to date ({})", file.display(), migration.current);
            }
            Ok(migration) => {
                println!(
                    "{}: {} -> {}",
                    file.display(),
                    migration.current,
                    migration.target
                );
                for task in migration.tasks() {
                    println!("  - {}", task.description());
                }
                println!();
                pending.push((file.clone(), migration));
            }
            Err(e) => {
                eprintln!("{}: {e}", file.display());
                failed += 1;
            }
        }
    }

    if pending.is_empty() {
        return finish(failed, total);
    }

    if !cli.force && !confirm()? {
        return finish(failed, total);
    }

    for (file, migration) in &pending {
        print!("Processing {} ", file.display());
        io::stdout().flush()?;
        match upgrade::apply(file, migration) {
            Ok(()) => println!("done"),
            Err(e) => {
                println!("failed");
                eprintln!("{}: {e}", file.display());
                if e.effect() != Effect::None {
                    eprintln!(
                        "{}: the file may be partially migrated; inspect it before re-running",
                        file.display()
                    );
                }
                failed += 1;
            }
        }
    }

    finish(failed, total)
}

fn finish(failed: usize, total: usize) -> Result<()> {
    if failed == 0 {
        Ok(())
    } else {
        Err(Error::Partial { failed, total })
    }
}

/// Prompt until a recognized token is given. EOF counts as refusal.
fn confirm() -> Result<bool> {
    println!("{BACKUP_WARNING}");
    let stdin = io::stdin();
    loop {
        print!("Continue with changes? [yes/no] ");
        io::stdout().flush()?;
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            return Ok(false);
        }
        match line.trim().to_lowercase().as_str() {
            "y" | "yes" => return Ok(true),
            "n" | "no" => return Ok(false),
            _ => {}
        }
    }
}
