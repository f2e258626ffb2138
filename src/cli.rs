//! Command-line surface.

use std::path::PathBuf;

use clap::Parser;

use crate::config::Config;
use crate::discovery::{detect_file_kind, FileKind};
use crate::error::Result;
use crate::output::{display_path, Printer};
use crate::tools::{lazyripent, ripent};

/// ripkit - extract, edit, and re-import BSP entity data
#[derive(Parser, Debug)]
#[command(name = "ripkit")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Open the entity editor against a BSP file
    #[arg(long, value_name = "BSP")]
    pub edit: Option<PathBuf>,

    /// Force verbose output from the wrapped tools
    #[arg(short, long)]
    pub verbose: bool,

    /// Map (.bsp), entity (.ent), or rule (.rule) files to process
    pub files: Vec<PathBuf>,
}

/// Process files passed on the command line by suffix: maps get their
/// entities exported, entity lists get imported into the sibling map,
/// rules get applied to the sibling map. Anything else is skipped.
pub fn run_files(files: &[PathBuf], config: &Config, printer: &Printer) -> Result<()> {
    for file in files {
        match detect_file_kind(file) {
            Some(FileKind::Map) => {
                let input = file.to_string_lossy();
                ripent::run_batch(
                    config.ripent()?,
                    &input,
                    ripent::MapOp::Export,
                    config.verbose,
                    printer,
                )?;
            }
            Some(FileKind::EntityList) => {
                let map = file.with_extension("bsp");
                let input = map.to_string_lossy().into_owned();
                ripent::run_batch(
                    config.ripent()?,
                    &input,
                    ripent::MapOp::Import,
                    config.verbose,
                    printer,
                )?;
            }
            Some(FileKind::Rule) => {
                let target = file.with_extension("bsp");
                // Per-rule failures are already reported; keep going.
                let _ = lazyripent::apply_rule(config.lazyripent()?, file, &target, printer);
            }
            None => {
                printer.warning("Skipping", &display_path(file));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parses_edit_flag() {
        let cli = Cli::parse_from(["ripkit", "--edit", "de_dust.bsp"]);
        assert_eq!(cli.edit.unwrap(), PathBuf::from("de_dust.bsp"));
        assert!(cli.files.is_empty());
    }

    #[test]
    fn test_cli_parses_bare_files() {
        let cli = Cli::parse_from(["ripkit", "a.bsp", "b.ent", "c.rule"]);
        assert!(cli.edit.is_none());
        assert_eq!(cli.files.len(), 3);
    }

    #[test]
    fn test_cli_no_args_means_menu() {
        let cli = Cli::parse_from(["ripkit"]);
        assert!(cli.edit.is_none());
        assert!(cli.files.is_empty());
    }

    #[test]
    fn test_cli_verify() {
        Cli::command().debug_assert();
    }
}
