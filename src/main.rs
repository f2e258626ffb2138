use clap::Parser;
use miette::Result;
use ripkit::cli::{self, Cli};
use ripkit::config::Config;
use ripkit::output::Printer;
use ripkit::{editor, menu};

fn main() -> Result<()> {
    let args = Cli::parse();
    let printer = Printer::new();

    let mut config = Config::load_or_discover(&printer)?;
    if args.verbose {
        config.verbose = true;
    }

    if let Some(map) = &args.edit {
        editor::launch(&config, map, &printer)?;
    } else if !args.files.is_empty() {
        cli::run_files(&args.files, &config, &printer)?;
    } else {
        menu::run(&mut config, &printer)?;
    }

    config.ensure_template();
    if let Some(path) = Config::config_path() {
        config.save(&path)?;
    }

    Ok(())
}
