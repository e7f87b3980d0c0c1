mod app;
mod backend;
mod config;
mod domain;
mod handlers;
mod infra;
mod logging;
mod preview;
mod terminal;
mod ui;

use crate::app::{App, BackendEvent, BackendTask};
use crate::backend::{send_task, worker_loop};
use crate::config::AppConfig;
use crate::handlers::{handle_backend_event, handle_key_event, handle_mouse_event};
use crate::infra::{GitClient, ShellGitClient};
use crate::terminal::{restore_terminal, setup_terminal};
use anyhow::{Context, Result, bail};
use crossterm::event::{self, Event, KeyEventKind};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

const USAGE: &str = "\
usage: lstree-tui [REPO_DIR] [REVISION]

Browse the tree of a git revision.

  REPO_DIR   repository to read (default: current directory)
  REVISION   commit-ish to list (default: default_revision from the config)
";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct CliArgs {
    repo_dir: Option<PathBuf>,
    revision: Option<String>,
    help: bool,
}

fn parse_args<I>(args: I) -> Result<CliArgs>
where
    I: IntoIterator<Item = String>,
{
    let mut parsed = CliArgs::default();
    let mut positional = Vec::new();
    for arg in args {
        match arg.as_str() {
            "-h" | "--help" => parsed.help = true,
            flag if flag.starts_with('-') && flag.len() > 1 => bail!("unknown option: {flag}"),
            _ => positional.push(arg),
        }
    }
    if positional.len() > 2 {
        bail!("too many arguments: {}", positional[2..].join(" "));
    }
    let mut positional = positional.into_iter();
    parsed.repo_dir = positional.next().map(PathBuf::from);
    parsed.revision = positional.next();
    Ok(parsed)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = match parse_args(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(err) => {
            eprintln!("{err:#}\n\n{USAGE}");
            std::process::exit(2);
        }
    };
    if args.help {
        print!("{USAGE}");
        return Ok(());
    }

    let (config, config_error) = match AppConfig::load_or_default() {
        Ok(cfg) => (cfg, None),
        Err(err) => (AppConfig::default(), Some(err)),
    };
    match logging::init(&config.log_level) {
        Ok(path) => log::info!("logging to {}", path.display()),
        Err(err) => eprintln!("logging disabled: {err:#}"),
    }
    if let Some(err) = &config_error {
        log::warn!("failed to load config, using defaults: {err:#}");
    }

    let repo_dir = match args.repo_dir {
        Some(dir) => dir,
        None => std::env::current_dir().context("failed to resolve current directory")?,
    };
    let revision = args
        .revision
        .unwrap_or_else(|| config.default_revision.clone());
    log::info!("browsing {} at {revision}", repo_dir.display());

    setup_terminal()?;
    let mut terminal =
        Terminal::new(CrosstermBackend::new(io::stdout())).context("failed to create terminal")?;

    let run_result = run_app(&mut terminal, config, repo_dir, revision).await;

    restore_terminal(&mut terminal)?;
    if let Err(err) = run_result {
        log::error!("{err:#}");
        eprintln!("{err:#}");
        std::process::exit(1);
    }

    Ok(())
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    config: AppConfig,
    repo_dir: PathBuf,
    revision: String,
) -> Result<()> {
    let repo_label = repo_dir
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| repo_dir.display().to_string());
    let mut app = App::new(config, revision.clone(), repo_label);
    let client: Arc<dyn GitClient> = Arc::new(ShellGitClient::new(repo_dir));

    let (task_tx, task_rx) = mpsc::unbounded_channel::<BackendTask>();
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<BackendEvent>();

    tokio::spawn(worker_loop(client, task_rx, event_tx));

    send_task(&mut app, &task_tx, BackendTask::LoadTree { revision })?;

    while !app.should_quit {
        while let Ok(event) = event_rx.try_recv() {
            handle_backend_event(&mut app, &task_tx, event)?;
        }

        terminal.draw(|frame| ui::draw(frame, &mut app))?;

        if event::poll(Duration::from_millis(100)).context("event poll failed")? {
            match event::read().context("event read failed")? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    handle_key_event(&mut app, key, &task_tx)?;
                }
                Event::Mouse(mouse) => handle_mouse_event(&mut app, mouse, &task_tx)?,
                _ => {}
            }
        }
    }

    match app.config.save() {
        Ok(path) => log::debug!("config saved to {}", path.display()),
        Err(err) => log::warn!("failed to save config: {err:#}"),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn args(values: &[&str]) -> Result<CliArgs> {
        parse_args(values.iter().map(|v| v.to_string()))
    }

    #[test]
    fn no_arguments_use_defaults() {
        assert_eq!(args(&[]).expect("parse"), CliArgs::default());
    }

    #[test]
    fn positional_arguments_fill_repo_then_revision() {
        let parsed = args(&["../repo", "v1.2.0"]).expect("parse");
        assert_eq!(parsed.repo_dir, Some(PathBuf::from("../repo")));
        assert_eq!(parsed.revision.as_deref(), Some("v1.2.0"));
        assert!(!parsed.help);
    }

    #[test]
    fn help_flag_is_recognized() {
        assert!(args(&["--help"]).expect("parse").help);
        assert!(args(&["repo", "-h"]).expect("parse").help);
    }

    #[test]
    fn unknown_flags_and_extra_arguments_are_rejected() {
        assert!(args(&["--verbose"]).is_err());
        assert!(args(&["a", "b", "c"]).is_err());
    }
}
