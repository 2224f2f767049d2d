//! Marknote - A terminal markdown note editor with a live preview.
//!
//! # Usage
//!
//! ```bash
//! marknote
//! marknote --store notes.json --storage-key work
//! marknote render README.md
//! ```

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use marknote::app::App;
use marknote::config::{
    ConfigFlags, clear_config_flags, global_config_path, load_config_flags, local_override_path,
    save_config_flags,
};

/// A terminal markdown note editor with a live HTML preview
#[derive(Parser, Debug)]
#[command(name = "marknote", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Store file holding the saved note
    #[arg(long, value_name = "PATH")]
    store: Option<PathBuf>,

    /// Slot in the store the note is saved under
    #[arg(long, value_name = "KEY")]
    storage_key: Option<String>,

    /// Collection endpoint for remote save and load
    #[arg(long, value_name = "URL")]
    remote_url: Option<String>,

    /// Directory downloads are written to
    #[arg(long, value_name = "DIR")]
    export_dir: Option<PathBuf>,

    /// Language tag for new code blocks
    #[arg(long, value_name = "LANG")]
    code_lang: Option<String>,

    /// Write logs to a file instead of stderr
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Save current command-line flags as defaults in .marknoterc
    #[arg(long)]
    save: bool,

    /// Clear saved defaults in .marknoterc
    #[arg(long)]
    clear: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the sanitized HTML preview of a markdown file (`-` reads stdin)
    Render {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
}

impl Cli {
    /// The config layer given on the command line.
    fn flags(&self) -> ConfigFlags {
        ConfigFlags {
            store: self.store.clone(),
            storage_key: self.storage_key.clone(),
            remote_url: self.remote_url.clone(),
            export_dir: self.export_dir.clone(),
            code_lang: self.code_lang.clone(),
            log_file: self.log_file.clone(),
        }
    }
}

fn init_logging(log_file: Option<&Path>) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing::Level::WARN.into());
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).init();
        }
        None => builder.with_writer(std::io::stderr).init(),
    }
    Ok(())
}

fn render_file(file: &Path) -> Result<()> {
    let source = if file.as_os_str() == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read stdin")?;
        text
    } else {
        marknote::files::read_file_as_text(file)?
    };
    print!("{}", marknote::render::render(&source));
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let global_path = global_config_path();
    let local_path = local_override_path();
    let cli_flags = cli.flags();

    if cli.clear {
        clear_config_flags(&local_path)?;
    }
    if cli.save {
        save_config_flags(&local_path, &cli_flags)?;
    }

    let file_flags = if cli.clear {
        ConfigFlags::default()
    } else {
        let global_flags = load_config_flags(&global_path)?;
        let local_flags = load_config_flags(&local_path)?;
        global_flags.union(&local_flags)
    };
    let effective = file_flags.union(&cli_flags);

    init_logging(effective.log_file.as_deref())?;
    tracing::debug!(?effective, "configuration resolved");

    if let Some(Command::Render { file }) = &cli.command {
        return render_file(file);
    }

    // Run the application
    let app = App::new(effective.store_path())
        .with_storage_key(effective.storage_key())
        .with_remote_url(effective.remote_url())
        .with_export_dir(effective.export_dir())
        .with_code_lang(effective.code_lang())
        .with_config_paths(
            Some(global_path),
            local_path.exists().then_some(local_path),
        );

    app.run().context("Application error")
}
