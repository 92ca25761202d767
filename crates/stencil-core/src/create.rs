//! Interactive `create` flow
//!
//! Wires the terminal engine to the template plumbing: selector prompts for
//! choices, a progress tracker with a live updater for the scaffold itself.

use crate::product::ProductConfig;
use crate::project::git;
use crate::runtime::tool;
use crate::templates::{copier, version, TemplateFetcher, TemplateManifest};
use crate::term::input::KeySource;
use crate::term::progress::{LiveUpdater, StepStatus, Tracker};
use crate::term::select::{SelectItem, Selector};
use crate::ui;
use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};

/// Arguments for the create command
#[derive(Debug, Clone, Default)]
pub struct CreateArgs {
    /// Local directory to use for templates instead of fetching from remote
    pub template_dir: Option<PathBuf>,

    /// Template name to use
    pub template: Option<String>,

    /// Project directory to create
    pub directory: Option<PathBuf>,

    /// Skip the git installation check
    pub skip_tool_check: bool,

    /// Auto-confirm all prompts (non-interactive mode)
    pub yes: bool,
}

/// Run the interactive create flow.
pub async fn run<C: ProductConfig>(
    config: &C,
    keys: &KeySource,
    args: CreateArgs,
    cli_version: &str,
) -> Result<()> {
    ui::intro(config.display_name());

    if args.skip_tool_check {
        ui::info("Skipping tool check");
    } else {
        check_git(keys, &args).await?;
    }

    let mut fetcher = setup_fetcher(config, &args.template_dir)?;

    let (template_name, manifest) =
        select_template(keys, &mut fetcher, args.template.as_deref(), args.yes).await?;

    if let Some(warning) =
        version::check_compatibility(cli_version, &manifest.version, config.upgrade_command())
    {
        ui::warning(&warning);
    }

    let project_dir = select_directory(keys, &args).await?;

    scaffold(&mut fetcher, &template_name, &project_dir).await?;

    print_next_steps(config, &project_dir);
    ui::outro("Happy building!");
    Ok(())
}

async fn check_git(keys: &KeySource, args: &CreateArgs) -> Result<()> {
    let git = tool::git_tool();

    if git.is_installed() {
        let version = git.version().unwrap_or_else(|| "unknown".to_string());
        ui::success(format!("{} installed ({})", git.config().display_name, version));
        return Ok(());
    }

    ui::warning(format!(
        "{} is not installed; the new project will not get an initial commit",
        git.config().display_name
    ));

    if args.yes {
        ui::info("Continuing without git (--yes mode)");
        return Ok(());
    }

    let items = vec![
        SelectItem::new("continue", "Continue without git"),
        SelectItem::new(
            "docs",
            format!("Open installation docs ({})", git.config().docs_url),
        ),
        SelectItem::new("abort", "Abort"),
    ];
    let choice = Selector::new(keys, "git is missing - what would you like to do?", items)
        .run()
        .await?;

    match choice.as_ref().map(|item| item.key.as_str()) {
        Some("continue") => Ok(()),
        Some("docs") => {
            git.open_docs()?;
            ui::press_any_key(keys, "Press any key to continue without git").await?;
            Ok(())
        }
        // "abort", or the prompt was cancelled
        _ => bail!("Setup cancelled."),
    }
}

fn setup_fetcher<C: ProductConfig>(
    config: &C,
    template_dir: &Option<PathBuf>,
) -> Result<TemplateFetcher> {
    let fetcher = match template_dir {
        Some(path) => {
            ui::info(format!("Using local templates from {}", path.display()));
            TemplateFetcher::from_local(path.clone(), config.user_agent())
        }
        None => {
            ui::info("Using remote templates");
            TemplateFetcher::from_config(config)?
        }
    };
    Ok(fetcher)
}

async fn select_template(
    keys: &KeySource,
    fetcher: &mut TemplateFetcher,
    specified_template: Option<&str>,
    yes: bool,
) -> Result<(String, TemplateManifest)> {
    ui::info("Loading templates...");
    let root_manifest = fetcher.fetch_root_manifest().await?;

    // A template named via --template skips the prompt entirely.
    if let Some(template_name) = specified_template {
        if !root_manifest.templates.contains(&template_name.to_string()) {
            bail!(
                "Template '{}' not found. Available templates: {}",
                template_name,
                root_manifest.templates.join(", ")
            );
        }
        let manifest = fetcher.fetch_template_manifest(template_name).await?;
        ui::success(format!("Template: {} - {}", manifest.name, manifest.description));
        return Ok((template_name.to_string(), manifest));
    }

    let mut templates: Vec<(String, TemplateManifest)> = Vec::new();
    for template_name in &root_manifest.templates {
        let manifest = fetcher.fetch_template_manifest(template_name).await?;
        templates.push((template_name.clone(), manifest));
    }

    if templates.is_empty() {
        bail!("No templates found.");
    }

    // A single template needs no prompt; --yes takes the first one.
    if templates.len() == 1 || yes {
        let (name, manifest) = templates.swap_remove(0);
        ui::info(format!(
            "Using template: {} - {}",
            manifest.name, manifest.description
        ));
        return Ok((name, manifest));
    }

    let items = templates
        .iter()
        .map(|(name, manifest)| {
            SelectItem::new(
                name.clone(),
                format!("{} - {}", manifest.name, manifest.description),
            )
        })
        .collect();

    let choice = Selector::new(keys, "Select a template", items).run().await?;
    let Some(choice) = choice else {
        bail!("Setup cancelled.");
    };

    templates
        .into_iter()
        .find(|(name, _)| *name == choice.key)
        .context("Selected template disappeared")
}

async fn select_directory(keys: &KeySource, args: &CreateArgs) -> Result<PathBuf> {
    let current_dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));

    let path = if let Some(dir) = &args.directory {
        let path = if dir.is_absolute() {
            dir.clone()
        } else {
            current_dir.join(dir)
        };
        ui::info(format!("Using directory: {}", path.display()));
        path
    } else if args.yes {
        current_dir.clone()
    } else {
        let input = ui::input_line("Project directory", ".")?;
        if input == "." {
            current_dir.clone()
        } else {
            let path = PathBuf::from(&input);
            if path.is_absolute() {
                path
            } else {
                current_dir.join(path)
            }
        }
    };

    if let Some(parent) = path.parent() {
        if !parent.exists() && parent != Path::new("") {
            bail!("Parent directory does not exist: {}", parent.display());
        }
    }

    // Warn before scaffolding into a directory that already has content.
    if path.is_dir() {
        if let Ok(entries) = std::fs::read_dir(&path) {
            let count = entries.count();
            if count > 0 {
                ui::warning(format!("Directory has {} existing items", count));
                let proceed = if args.yes {
                    true
                } else {
                    ui::confirm(keys, "Continue anyway?").await?
                };
                if !proceed {
                    bail!("Setup cancelled.");
                }
            }
        }
    }

    Ok(path)
}

async fn scaffold(
    fetcher: &mut TemplateFetcher,
    template_name: &str,
    project_dir: &Path,
) -> Result<()> {
    let mut tracker = Tracker::new(format!("Creating project in {}", project_dir.display()));
    tracker.add("fetch", "Fetch template");
    tracker.add("write", "Write project files");
    tracker.add("git", "Initialize git repository");

    let updater = LiveUpdater::stdout();
    tracker.set_refresh(updater.refresher());

    let outcome = run_steps(fetcher, template_name, project_dir, &mut tracker).await;

    let frame = tracker.render();
    updater.finish(&frame).await?;
    outcome
}

async fn run_steps(
    fetcher: &mut TemplateFetcher,
    template_name: &str,
    project_dir: &Path,
    tracker: &mut Tracker,
) -> Result<()> {
    tracker.start("fetch", "");
    if let Err(err) = fetcher.fetch_template_manifest(template_name).await {
        tracker.error("fetch", &err.to_string());
        return Err(err.into());
    }
    tracker.complete("fetch", "");

    tracker.start("write", "");
    let written = copier::copy_template(fetcher, template_name, project_dir, |done, total, file| {
        tracker.update(
            "write",
            StepStatus::Running,
            &format!("{done}/{total} {file}"),
        );
    })
    .await;
    let copied = match written {
        Ok(copied) => copied,
        Err(err) => {
            tracker.error("write", "failed");
            return Err(err);
        }
    };
    tracker.complete("write", &format!("{} files", copied.len()));

    if tool::git_tool().is_installed() {
        tracker.start("git", "");
        match git::init_repository(project_dir).await {
            Ok(()) => tracker.complete("git", ""),
            Err(err) => {
                log::debug!("git bootstrap failed: {err:#}");
                tracker.skip("git", "commit failed");
            }
        }
    } else {
        tracker.skip("git", "git not installed");
    }

    Ok(())
}

fn print_next_steps<C: ProductConfig>(config: &C, project_dir: &Path) {
    let steps = config.next_steps(project_dir);

    println!();
    println!("  Next steps");
    println!();
    for (index, step) in steps.iter().enumerate() {
        println!("  {}.  {}", index + 1, step);
    }
}
