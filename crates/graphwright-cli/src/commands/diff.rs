use std::path::Path;

use anyhow::{Context, Result};
use graphwright_compare::Comparison;
use tracing::info;

use crate::cli::{DiffArgs, OutputFormat};
use crate::output::{print_change, print_summary};

/// Compares the two files and prints the changes. Returns whether the
/// comparison should fail the command.
pub fn diff(args: &DiffArgs) -> Result<bool> {
    let comparison = compare_files(&args.old, &args.new)?;
    info!(
        old = %args.old.display(),
        new = %args.new.display(),
        changes = comparison.len(),
        "Schemas compared"
    );

    match args.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(comparison.changes())?);
        }
        OutputFormat::Text => {
            for change in comparison.changes() {
                print_change(change);
            }
            print_summary(&comparison);
        }
    }

    Ok(fails(&comparison, args.fail_on_dangerous))
}

fn compare_files(old: &Path, new: &Path) -> Result<Comparison> {
    let old_sdl = std::fs::read_to_string(old)
        .with_context(|| format!("Failed to read {}", old.display()))?;
    let new_sdl = std::fs::read_to_string(new)
        .with_context(|| format!("Failed to read {}", new.display()))?;
    Ok(graphwright_compare::compare(&old_sdl, &new_sdl)?)
}

fn fails(comparison: &Comparison, fail_on_dangerous: bool) -> bool {
    comparison.is_breaking() || (fail_on_dangerous && comparison.dangerous().next().is_some())
}
