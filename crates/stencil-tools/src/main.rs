//! stencil CLI - project scaffolding from templates

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use stencil_core::term::{input, KeySource};
use stencil_core::{CreateArgs, ProductConfig};

/// CLI version - checked against template compatibility requirements
pub const CLI_VERSION: &str = env!("CARGO_PKG_VERSION");

/// stencil product configuration
#[derive(Clone)]
pub struct StencilConfig;

impl ProductConfig for StencilConfig {
    fn name(&self) -> &'static str {
        "stencil"
    }

    fn display_name(&self) -> &'static str {
        "stencil"
    }

    fn default_template_url(&self) -> &'static str {
        "https://github.com/stencil-dev/templates/releases/latest/download"
    }

    fn template_url_env(&self) -> &'static str {
        "STENCIL_TEMPLATE_URL"
    }

    fn docs_url(&self) -> &'static str {
        "https://stencil.dev/docs"
    }

    fn upgrade_command(&self) -> &'static str {
        "cargo install stencil-tools --force"
    }

    fn next_steps(&self, dir: &Path) -> Vec<String> {
        let mut steps = Vec::new();
        let current = std::env::current_dir().ok();

        if current.as_deref() != Some(dir) {
            steps.push(format!("cd {}", dir.display()));
        }
        steps.push("Open README.md to get started".to_string());
        steps
    }
}

#[derive(Parser, Debug)]
#[command(name = "stencil")]
#[command(about = "CLI for scaffolding projects from templates")]
#[command(version)]
pub struct Args {
    /// Write diagnostic logs to this file
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a new project from a template
    Create(CliCreateArgs),
}

#[derive(Parser, Debug)]
pub struct CliCreateArgs {
    /// Local directory to use for templates instead of fetching from remote (for development use)
    #[arg(long = "template-dir")]
    pub template_dir: Option<PathBuf>,

    /// Template name to use
    #[arg(short, long)]
    pub template: Option<String>,

    /// Project directory to create
    #[arg(short, long)]
    pub directory: Option<PathBuf>,

    /// Skip the git installation check
    #[arg(long = "skip-git")]
    pub skip_git: bool,

    /// Auto-confirm all prompts (non-interactive mode)
    #[arg(short, long)]
    pub yes: bool,
}

impl From<CliCreateArgs> for CreateArgs {
    fn from(args: CliCreateArgs) -> Self {
        CreateArgs {
            template_dir: args.template_dir,
            template: args.template,
            directory: args.directory,
            skip_tool_check: args.skip_git,
            yes: args.yes,
        }
    }
}

fn init_logging(path: Option<&Path>) {
    let Some(path) = path else { return };
    match std::fs::File::create(path) {
        Ok(file) => {
            let _ = simplelog::WriteLogger::init(
                simplelog::LevelFilter::Debug,
                simplelog::Config::default(),
                file,
            );
            log::debug!("stencil {CLI_VERSION} starting");
        }
        Err(err) => eprintln!("Warning: could not open log file {}: {}", path.display(), err),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Restore the terminal if we panic while raw mode is active
    let default_panic = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        input::restore_terminal();
        default_panic(info);
    }));

    // Last-resort Ctrl+C handler: only fires outside raw mode, where the
    // key source handles Ctrl+C itself
    ctrlc::set_handler(|| {
        input::restore_terminal();
        std::process::exit(130);
    })
    .ok();

    let args = Args::parse();
    init_logging(args.log_file.as_deref());

    let config = StencilConfig;
    let keys = KeySource::new();

    let result = match args.command {
        Some(Command::Create(create_args)) => {
            stencil_core::run(&config, &keys, create_args.into(), CLI_VERSION).await
        }
        // No subcommand defaults to interactive create
        None => stencil_core::run(&config, &keys, CreateArgs::default(), CLI_VERSION).await,
    };

    // Ensure the cursor is visible on normal exit
    let _ = console::Term::stderr().show_cursor();

    result
}
