use std::{fs, sync::atomic::Ordering};

use clap::Parser;
use cli::{Args, Commands, ListTarget};
use import::import_file;
use list::{list_defaults, list_streams};
use logging::setup_logging;
use modsync_config::config::{self, config_path, generate_default_config, get_config, Config};
use modsync_core::{
    error::ModsyncError,
    ModsyncResult,
};
use parse::parse_index;
use show::show;
use tracing::{info, warn};
use utils::COLOR;

mod cli;
mod import;
mod list;
mod logging;
mod parse;
mod show;
mod utils;

fn print_config() -> ModsyncResult<()> {
    let path = config_path();
    let content = match fs::read_to_string(&path) {
        Ok(v) => v,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            warn!("Config file {} not found", path.display());
            Config::default_config()
                .to_annotated_document()?
                .to_string()
        }
        Err(err) => {
            return Err(ModsyncError::IoError {
                action: format!("reading config {}", path.display()),
                source: err,
            });
        }
    };
    info!("{}", content.trim_end());
    Ok(())
}

fn print_env() -> ModsyncResult<()> {
    let config = get_config();

    info!("MODSYNC_CONFIG={}", config_path().display());
    info!("MODSYNC_DB={}", config.get_db_path()?.display());
    info!("MODSYNC_STORAGE={}", config.get_storage_path()?.display());
    info!("MODSYNC_DIGEST={}", config.digest_algorithm());
    Ok(())
}

fn handle_cli() -> ModsyncResult<()> {
    let args = Args::parse();

    setup_logging(&args);

    if args.no_color {
        COLOR.store(false, Ordering::Relaxed);
    }

    if let Some(ref path) = args.config {
        config::set_config_path(path)?;
    }

    if !matches!(args.command, Commands::Config | Commands::DefConfig) {
        config::init()?;
    }

    match args.command {
        Commands::Parse {
            file,
            modules,
        } => parse_index(&file, &modules, args.json)?,
        Commands::Import {
            file,
            modules,
        } => import_file(&file, &modules, args.json)?,
        Commands::List {
            target,
        } => {
            match target {
                ListTarget::Streams {
                    name,
                    stream,
                } => list_streams(name.as_deref(), stream.as_deref(), args.json)?,
                ListTarget::Defaults {
                    module,
                } => list_defaults(module.as_deref(), args.json)?,
            }
        }
        Commands::Show {
            target,
        } => show(&target)?,
        Commands::Config => print_config()?,
        Commands::DefConfig => {
            generate_default_config()?;
        }
        Commands::Env => print_env()?,
    }

    Ok(())
}

fn main() {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .build(),
        )
    }))
    .ok();

    if let Err(err) = handle_cli() {
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(1);
    }
}
