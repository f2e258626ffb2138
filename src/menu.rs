//! Interactive keystroke-driven menu.
//!
//! Shown when ripkit starts without arguments. Option selection is a
//! single raw-mode keystroke with a held-key debounce; path prompts drop
//! back to cooked mode and read a whole line.

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crossterm::terminal;

use crate::config::Config;
use crate::editor;
use crate::error::Result;
use crate::output::Printer;
use crate::tools::{lazyripent, ripent};

/// Window inside which a repeated identical keystroke is treated as a
/// held key and ignored.
const REPEAT_WINDOW: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MenuAction {
    Map(ripent::MapOp),
    Rule,
    Edit,
    ToggleVerbose,
    Help,
    Quit,
}

struct MenuEntry {
    key: char,
    name: &'static str,
    description: &'static str,
    action: MenuAction,
}

const ENTRIES: &[MenuEntry] = &[
    MenuEntry {
        key: '1',
        name: "Extract",
        description: "Extract an entity list (.ent file) from a map",
        action: MenuAction::Map(ripent::MapOp::Export),
    },
    MenuEntry {
        key: '2',
        name: "Import",
        description: "Import an entity list (.ent file) into a map",
        action: MenuAction::Map(ripent::MapOp::Import),
    },
    MenuEntry {
        key: '3',
        name: "Apply Rule",
        description: "Apply a lazyripent rule file",
        action: MenuAction::Rule,
    },
    MenuEntry {
        key: '4',
        name: "Edit",
        description: "Open the entity editor",
        action: MenuAction::Edit,
    },
    MenuEntry {
        key: '5',
        name: "Texture Export",
        description: "Export texture data from a map",
        action: MenuAction::Map(ripent::MapOp::TextureExport),
    },
    MenuEntry {
        key: '6',
        name: "Texture Import",
        description: "Import texture data into a map",
        action: MenuAction::Map(ripent::MapOp::TextureImport),
    },
    MenuEntry {
        key: '7',
        name: "Write chart",
        description: "Write a .log file with map statistics",
        action: MenuAction::Map(ripent::MapOp::Chart),
    },
    MenuEntry {
        key: '8',
        name: "Write extents",
        description: "Write a .ext file with the map extents",
        action: MenuAction::Map(ripent::MapOp::WriteExtents),
    },
    MenuEntry {
        key: 'v',
        name: "Verbose output",
        description: "Toggle verbose output from the wrapped tools",
        action: MenuAction::ToggleVerbose,
    },
    MenuEntry {
        key: 'h',
        name: "Help",
        description: "Show this help message",
        action: MenuAction::Help,
    },
    MenuEntry {
        key: 'q',
        name: "Quit",
        description: "Leave ripkit",
        action: MenuAction::Quit,
    },
];

fn entry_for_key(key: char) -> Option<&'static MenuEntry> {
    let key = key.to_ascii_lowercase();
    ENTRIES.iter().find(|entry| entry.key == key)
}

/// Strip surrounding whitespace and one pair of surrounding quotes, the
/// shape dragged-in paths arrive in.
fn clean_input(line: &str) -> String {
    let line = line.trim();
    if line.len() >= 2 && line.starts_with('"') && line.ends_with('"') {
        line[1..line.len() - 1].to_string()
    } else {
        line.to_string()
    }
}

/// Run the menu loop until the user quits.
pub fn run(config: &mut Config, printer: &Printer) -> Result<()> {
    loop {
        print_menu(config.verbose);
        match read_choice()? {
            MenuAction::Quit => return Ok(()),
            MenuAction::Help => show_help(),
            MenuAction::ToggleVerbose => {
                config.verbose = !config.verbose;
                printer.info(
                    "Verbose",
                    if config.verbose { "on" } else { "off" },
                );
            }
            action => dispatch(action, config, printer),
        }
    }
}

fn dispatch(action: MenuAction, config: &Config, printer: &Printer) {
    let result = match action {
        MenuAction::Map(op) => run_map_op(op, config, printer),
        MenuAction::Rule => run_rules(config, printer),
        MenuAction::Edit => run_edit(config, printer),
        _ => Ok(()),
    };
    // Failures end the selected action, never the menu loop.
    if let Err(e) = result {
        printer.error("Error", &e.to_string());
    }
}

fn run_map_op(op: ripent::MapOp, config: &Config, printer: &Printer) -> Result<()> {
    let Some(input) = prompt(
        "Drag a map file or folder (leave blank for the current folder, 'x' to cancel):",
    )?
    else {
        return Ok(());
    };

    ripent::run_batch(config.ripent()?, &input, op, config.verbose, printer)?;
    Ok(())
}

fn run_rules(config: &Config, printer: &Printer) -> Result<()> {
    let exe = config.lazyripent()?;

    let Some(target) = prompt(
        "Drag the target map or folder (leave blank for the current folder, 'x' to cancel):",
    )?
    else {
        return Ok(());
    };
    let Some(rule) = prompt(
        "Drag a rule file or folder (leave blank for the current folder, 'x' to cancel):",
    )?
    else {
        return Ok(());
    };

    let target = if target.is_empty() {
        PathBuf::from(".")
    } else {
        PathBuf::from(target)
    };
    let rule = if rule.is_empty() {
        PathBuf::from(".")
    } else {
        PathBuf::from(rule)
    };

    if rule.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("rule")) {
        // Per-rule failure is already reported.
        let _ = lazyripent::apply_rule(exe, &rule, &target, printer);
    } else {
        lazyripent::apply_rules_under(exe, &rule, &target, printer)?;
    }
    Ok(())
}

fn run_edit(config: &Config, printer: &Printer) -> Result<()> {
    // Fail before prompting when the editor cannot run at all.
    config.lazyripent()?;

    let Some(map) = prompt("Drag a map file you want to edit ('x' to cancel):")? else {
        return Ok(());
    };

    editor::launch(config, Path::new(&map), printer)
}

fn print_menu(verbose: bool) {
    println!("\nSelect an option:");
    for entry in ENTRIES {
        if entry.action == MenuAction::ToggleVerbose {
            let state = if verbose { "ON" } else { "OFF" };
            println!("\t[{}] {} - {}", entry.key, entry.name, state);
        } else {
            println!("\t[{}] {}", entry.key, entry.name);
        }
    }
}

fn show_help() {
    println!("\nripkit extracts and imports map entity data.\nOptions:");
    for entry in ENTRIES {
        println!("\t{:<16} {}", entry.name, entry.description);
    }
}

/// Read one menu keystroke in raw mode.
fn read_choice() -> Result<MenuAction> {
    let _guard = RawMode::enable()?;
    let mut last: Option<(char, Instant)> = None;

    loop {
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        match key.code {
            KeyCode::Esc => return Ok(MenuAction::Quit),
            KeyCode::Char(c) => {
                // Ignore a key being held down; wait for a fresh stroke.
                let now = Instant::now();
                if let Some((prev, at)) = last {
                    if prev == c && now.duration_since(at) < REPEAT_WINDOW {
                        continue;
                    }
                }
                last = Some((c, now));

                if c == '0' {
                    return Ok(MenuAction::Quit);
                }
                if let Some(entry) = entry_for_key(c) {
                    return Ok(entry.action);
                }
            }
            _ => {}
        }
    }
}

/// Prompt for a line of input in cooked mode. Returns `None` when the
/// user cancels with `x`.
fn prompt(message: &str) -> Result<Option<String>> {
    println!("{}", message);
    print!("> ");
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    let line = clean_input(&line);

    if line == "x" {
        Ok(None)
    } else {
        Ok(Some(line))
    }
}

struct RawMode;

impl RawMode {
    fn enable() -> Result<Self> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawMode {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_lookup_is_case_insensitive() {
        assert_eq!(entry_for_key('h').unwrap().action, MenuAction::Help);
        assert_eq!(entry_for_key('H').unwrap().action, MenuAction::Help);
        assert!(entry_for_key('z').is_none());
    }

    #[test]
    fn test_entry_keys_are_unique() {
        for (i, a) in ENTRIES.iter().enumerate() {
            for b in &ENTRIES[i + 1..] {
                assert_ne!(a.key, b.key);
            }
        }
    }

    #[test]
    fn test_clean_input_strips_quotes_and_whitespace() {
        assert_eq!(clean_input("  \"C:\\maps\\de dust.bsp\"  \n"), "C:\\maps\\de dust.bsp");
        assert_eq!(clean_input("plain.bsp\n"), "plain.bsp");
        assert_eq!(clean_input("\"\""), "");
    }

    #[test]
    fn test_map_entries_cover_all_operations() {
        let ops: Vec<ripent::MapOp> = ENTRIES
            .iter()
            .filter_map(|e| match e.action {
                MenuAction::Map(op) => Some(op),
                _ => None,
            })
            .collect();
        assert_eq!(ops.len(), 6);
    }
}
