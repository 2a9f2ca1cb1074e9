mod cli;
mod config;

use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use serde_json::json;
use tracing::info;

use hgctl_core::{HgError, Mercurial, UpdateOptions};
use hgctl_exec::ExecError;
use hgctl_logging::{init_tracing, init_tracing_with_file, LogFormat};

use crate::cli::{Cli, Command};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_format: LogFormat = cli.log_format.into();
    let guard = match cli.log_file {
        Some(ref path) => match init_tracing_with_file(&cli.log_level, log_format, path) {
            Ok(guard) => Some(guard),
            Err(e) => {
                eprintln!("{} cannot open log file {}: {}", "error:".red().bold(), path.display(), e);
                std::process::exit(1);
            }
        },
        None => {
            init_tracing(&cli.log_level, log_format);
            None
        }
    };

    let code = match run(cli).await {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("{} {:#}", "error:".red().bold(), e);
            exit_code(&e)
        }
    };

    // Flush the log file before exiting
    drop(guard);
    std::process::exit(code);
}

/// Mirror the tool's exit code when it failed, 1 otherwise
fn exit_code(err: &anyhow::Error) -> i32 {
    let exec = match err.downcast_ref::<HgError>() {
        Some(HgError::Exec(e)) | Some(HgError::BranchNotCommitted { source: e, .. }) => Some(e),
        _ => err.downcast_ref::<ExecError>(),
    };
    match exec.and_then(ExecError::exit_code) {
        Some(code) if (1..=255).contains(&code) => code,
        _ => 1,
    }
}

async fn run(cli: Cli) -> Result<()> {
    let cwd = std::env::current_dir().context("Failed to get current directory")?;
    let global = config::global_config_path();
    let repo_config = config::resolve(
        cli.repo.settings(),
        cli.repo.config.as_deref(),
        global.as_deref(),
        &cwd,
    )?;

    let hg = Mercurial::new(repo_config);
    let dir = cli.working_dir.as_deref();
    let out = Output { json: cli.json };

    match cli.command {
        Command::Root => out.text("root", &hg.root().display().to_string()),
        Command::CurrentRevision { file } => {
            let rev = hg.current_revision(&file, dir).await?;
            out.text("revision", rev.as_str());
        }
        Command::PreviousRevision { file, revision } => {
            let previous = hg.previous_revision(&file, &revision, dir).await;
            if out.json {
                println!("{}", serde_json::to_string_pretty(&previous)?);
            } else {
                println!("{}", previous);
            }
        }
        Command::Diff { from, to, file } => {
            let diff = hg.diff(&from, &to, &file, dir).await?;
            out.raw("diff", &diff);
        }
        Command::LastDiff { file, base } => {
            let diff = hg.last_diff(&file, base.as_deref(), dir).await?;
            out.raw("diff", &diff);
        }
        Command::CurrentBranch => {
            let branch = hg.current_branch(dir).await?;
            out.text("branch", &branch);
        }
        Command::SwitchBranch { branch } => {
            hg.switch_branch(&branch, dir).await?;
            out.text("branch", &branch);
        }
        Command::CreateBranch {
            branch,
            author,
            message,
        } => {
            hg.create_branch(&branch, &author, &message, dir).await?;
            out.text("branch", &branch);
        }
        Command::Init => out.raw("output", &hg.init(dir).await?),
        Command::Clone { source } => out.raw("output", &hg.clone_repo(&source).await?),
        Command::Add { file } => out.raw("output", &hg.add(&file, dir).await?),
        Command::Remove { file } => out.raw("output", &hg.remove(&file, dir).await?),
        Command::Addremove => out.raw("output", &hg.add_remove(dir).await?),
        Command::Commit {
            author,
            message,
            date,
        } => {
            let output = hg.commit(&author, &message, date.as_deref(), dir).await?;
            out.raw("output", &output);
        }
        Command::Pull { branch } => out.raw("output", &hg.pull(branch.as_deref(), dir).await?),
        Command::Push { branch } => out.raw("output", &hg.push(branch.as_deref(), dir).await?),
        Command::Update { branch, check } => {
            let options = UpdateOptions { branch, check };
            out.raw("output", &hg.update_repo(&options, dir).await?);
        }
        Command::Status => out.raw("status", &hg.status(dir).await?),
        Command::Revert { file, rev } => {
            let rev: Vec<&str> = rev.iter().map(String::as_str).collect();
            out.raw("output", &hg.revert(&file, &rev, dir).await?);
        }
        Command::Cat { file, rev } => out.raw("content", &hg.file_content(&file, &rev, dir).await?),
        Command::ApplyPatch { file, patch } => {
            out.raw("output", &hg.apply_patch(&file, &patch, dir).await?)
        }
        Command::Serve => serve(&hg, dir).await?,
    }

    Ok(())
}

async fn serve(hg: &Mercurial, dir: Option<&Path>) -> Result<()> {
    let handle = hg.serve(dir)?;
    eprintln!(
        "  {} hg serve running (pid {}). Press {} to stop",
        "->".bright_green(),
        handle.id().map(|id| id.to_string()).unwrap_or_else(|| "?".to_string()),
        "Ctrl+C".bold()
    );

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl+C")?;

    let code = handle.shutdown().await?;
    info!(exit_code = code, "hg serve stopped");
    Ok(())
}

/// Prints results as plain text or as a one-key JSON object
struct Output {
    json: bool,
}

impl Output {
    /// A single value, printed on its own line
    fn text(&self, key: &str, value: &str) {
        if self.json {
            println!("{}", json!({ key: value }));
        } else {
            println!("{}", value);
        }
    }

    /// Tool output, printed verbatim
    fn raw(&self, key: &str, value: &str) {
        if self.json {
            println!("{}", json!({ key: value }));
        } else {
            print!("{}", value);
        }
    }
}
