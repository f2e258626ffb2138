//! Batch operations through the entity-ripping tool.
//!
//! Ripent takes a mode flag and a map file; ripkit fans one invocation
//! out per collected map and tallies the results. The chart operation
//! captures the tool's stdout into a sibling `.log` file; a successful
//! import removes the imported `.ent`.

use std::fs::OpenOptions;
use std::path::Path;
use std::process::{Command, Stdio};

use crate::discovery;
use crate::error::{Result, RipkitError};
use crate::output::{display_path, Printer};

use super::BatchSummary;

/// Operations the entity-ripping tool performs on a map file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapOp {
    /// Extract an entity list (`.ent`) from a map.
    Export,
    /// Import an entity list back into a map.
    Import,
    /// Write a `.log` file with map statistics.
    Chart,
    /// Write a `.ext` file with the map extents.
    WriteExtents,
    /// Export texture data.
    TextureExport,
    /// Import texture data.
    TextureImport,
}

impl MapOp {
    /// The tool's command-line flag for this operation.
    pub fn flag(&self) -> &'static str {
        match self {
            MapOp::Export => "-export",
            MapOp::Import => "-import",
            MapOp::Chart => "-chart",
            MapOp::WriteExtents => "-writeextentfile",
            MapOp::TextureExport => "-textureexport",
            MapOp::TextureImport => "-textureimport",
        }
    }

    /// Status-line verb.
    pub fn verb(&self) -> &'static str {
        match self {
            MapOp::Export => "Extracting",
            MapOp::Import => "Importing",
            MapOp::Chart => "Charting",
            MapOp::WriteExtents => "Measuring",
            MapOp::TextureExport => "Extracting",
            MapOp::TextureImport => "Importing",
        }
    }
}

/// Run one operation across every map collected from `input`.
///
/// Failures are reported per map and do not abort the batch.
pub fn run_batch(
    ripent: &Path,
    input: &str,
    op: MapOp,
    verbose: bool,
    printer: &Printer,
) -> Result<BatchSummary> {
    let maps = discovery::collect_maps(input)?;
    let mut summary = BatchSummary::default();

    if maps.is_empty() {
        printer.warning("Skipping", "no map files were processed");
        return Ok(summary);
    }

    printer.info("Running", &display_path(ripent));
    for map in &maps {
        printer.status(op.verb(), &display_path(map));
        match run_one(ripent, map, op, verbose) {
            Ok(()) => {
                if op == MapOp::Import {
                    cleanup_imported(map, printer);
                }
                summary.record(true);
            }
            Err(e) => {
                printer.error("Error", &format!("{}: {}", display_path(map), e));
                summary.record(false);
            }
        }
    }

    summary.report(printer, "map", "maps");
    Ok(summary)
}

fn run_one(ripent: &Path, map: &Path, op: MapOp, verbose: bool) -> Result<()> {
    let mut command = Command::new(ripent);
    command.arg(op.flag()).arg(map);

    if op == MapOp::Chart {
        let log = chart_log_path(map);
        let file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&log)
            .map_err(|e| RipkitError::Io {
                path: log,
                message: e.to_string(),
            })?;
        command.stdout(Stdio::from(file));
    } else if verbose {
        command.stdout(Stdio::inherit());
    } else {
        command.stdout(Stdio::null());
    }
    if verbose {
        command.stderr(Stdio::inherit());
    } else {
        command.stderr(Stdio::null());
    }

    let status = command.status().map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => RipkitError::ToolNotFound {
            tool: "Ripent".to_string(),
            help: Some("Set the Ripent path in the configuration file".to_string()),
        },
        _ => RipkitError::IoError(e),
    })?;

    if status.success() {
        Ok(())
    } else {
        Err(RipkitError::Subprocess {
            tool: "Ripent".to_string(),
            message: format!("exited with {}", status),
        })
    }
}

/// Chart output accumulates in `<map>.bsp.log`.
pub fn chart_log_path(map: &Path) -> std::path::PathBuf {
    let mut name = map.as_os_str().to_os_string();
    name.push(".log");
    name.into()
}

/// Remove the `.ent` sibling after a successful import.
fn cleanup_imported(map: &Path, printer: &Printer) {
    let ent = map.with_extension("ent");
    if std::fs::remove_file(&ent).is_err() {
        printer.warning("Skipping", &format!("couldn't delete {}", display_path(&ent)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_op_flags() {
        assert_eq!(MapOp::Export.flag(), "-export");
        assert_eq!(MapOp::Import.flag(), "-import");
        assert_eq!(MapOp::Chart.flag(), "-chart");
        assert_eq!(MapOp::WriteExtents.flag(), "-writeextentfile");
        assert_eq!(MapOp::TextureExport.flag(), "-textureexport");
        assert_eq!(MapOp::TextureImport.flag(), "-textureimport");
    }

    #[test]
    fn test_chart_log_path_appends_suffix() {
        assert_eq!(
            chart_log_path(Path::new("maps/de_dust.bsp")),
            PathBuf::from("maps/de_dust.bsp.log")
        );
    }
}
