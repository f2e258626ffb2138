//! Entity transport and rule application through lazyripent.
//!
//! lazyripent moves entity data between maps and JSON `.ent` files and
//! applies `.rule` transformations. All invocations inherit the console
//! so the tool's own prompts reach the user; the unattended flag (`-u`)
//! suppresses them for scripted paths like the editor.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::discovery;
use crate::error::{Result, RipkitError};
use crate::output::{display_path, Printer};

use super::BatchSummary;

const TOOL: &str = "lazyripent";

/// Arguments for extracting entity JSON from a map, plus the scratch
/// path the tool will produce. A directory input extracts every map in
/// it, in place.
pub fn extract_args(input: &Path, unattended: bool) -> (PathBuf, Vec<OsString>) {
    let mut args: Vec<OsString>;
    let scratch;

    if is_map(input) {
        scratch = input.with_extension("ent");
        args = to_args(&["-i"]);
        args.push(input.into());
        args.push("-o".into());
        args.push(scratch.clone().into());
        args.push("-ee".into());
    } else {
        scratch = input.to_path_buf();
        args = to_args(&["-i"]);
        args.push(input.into());
        args.push("-o".into());
        args.push(input.into());
        args.push("-ee".into());
    }

    if unattended {
        args.push("-u".into());
    }
    (scratch, args)
}

/// Arguments for importing entity JSON back into a map (or every map in
/// a directory).
pub fn import_args(input: &Path, unattended: bool) -> Vec<OsString> {
    let mut args: Vec<OsString>;

    if is_map(input) {
        let scratch = input.with_extension("ent");
        args = to_args(&["-i"]);
        args.push(input.into());
        args.push("-i".into());
        args.push(scratch.into());
        args.push("-o".into());
        args.push(input.into());
        args.push("-ie".into());
    } else {
        args = to_args(&["-i"]);
        args.push(input.into());
        args.push("-o".into());
        args.push(input.into());
        args.push("-ie".into());
    }

    if unattended {
        args.push("-u".into());
    }
    args
}

/// Arguments for applying one rule file to a target map or directory.
/// Rule application is always unattended.
pub fn rule_args(rule: &Path, target: &Path) -> Vec<OsString> {
    let mut args = to_args(&["-i"]);
    args.push(rule.into());
    args.push("-i".into());
    args.push(target.into());
    args.push("-o".into());
    args.push(target.into());
    args.push("-u".into());
    args
}

/// Extract entity JSON next to the map; returns the scratch path.
pub fn extract_entities(
    exe: &Path,
    input: &Path,
    unattended: bool,
    printer: &Printer,
) -> Result<PathBuf> {
    let (scratch, args) = extract_args(input, unattended);
    printer.status("Extracting", &display_path(input));
    exec(exe, &args)?;
    Ok(scratch)
}

/// Import entity JSON back into the map it came from.
pub fn import_entities(exe: &Path, input: &Path, unattended: bool, printer: &Printer) -> Result<()> {
    let args = import_args(input, unattended);
    printer.status("Importing", &display_path(input));
    exec(exe, &args)
}

/// Apply a single rule file to a target map or directory.
pub fn apply_rule(exe: &Path, rule: &Path, target: &Path, printer: &Printer) -> Result<()> {
    printer.status("Applying", &display_path(rule));
    match exec(exe, &rule_args(rule, target)) {
        Ok(()) => {
            printer.success(
                "Applied",
                &format!("{} to {}", display_path(rule), display_path(target)),
            );
            Ok(())
        }
        Err(e) => {
            printer.warning(
                "Failed",
                &format!("{} did not apply to {}", display_path(rule), display_path(target)),
            );
            Err(e)
        }
    }
}

/// Apply every `.rule` file found under a directory to the target,
/// accumulating a batch summary. Failures do not abort the batch.
pub fn apply_rules_under(
    exe: &Path,
    dir: &Path,
    target: &Path,
    printer: &Printer,
) -> Result<BatchSummary> {
    let rules = discovery::collect_rules(dir);
    let mut summary = BatchSummary::default();

    if rules.is_empty() {
        printer.warning("Skipping", "no rule files were found");
        return Ok(summary);
    }

    for rule in &rules {
        summary.record(apply_rule(exe, rule, target, printer).is_ok());
    }

    summary.report(printer, "rule", "rules");
    Ok(summary)
}

fn exec(exe: &Path, args: &[OsString]) -> Result<()> {
    let status = Command::new(exe)
        .args(args)
        .status()
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => not_found(),
            _ => RipkitError::IoError(e),
        })?;

    if status.success() {
        Ok(())
    } else {
        Err(RipkitError::Subprocess {
            tool: TOOL.to_string(),
            message: format!("exited with {}", status),
        })
    }
}

/// The error reported when lazyripent is absent.
pub fn not_found() -> RipkitError {
    RipkitError::ToolNotFound {
        tool: TOOL.to_string(),
        help: Some(
            "Install lazyripent to apply rules or use the editor, then launch ripkit again"
                .to_string(),
        ),
    }
}

fn is_map(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("bsp"))
}

fn to_args(parts: &[&str]) -> Vec<OsString> {
    parts.iter().map(OsString::from).collect()
}
