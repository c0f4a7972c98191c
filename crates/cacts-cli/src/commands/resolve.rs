//! The `resolve` command.

use anyhow::{Context, Result};
use cacts_config::ResolvedConfig;
use cacts_executor::{current_git_branch, current_git_commit, is_git_repository};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub struct ResolveOptions {
    pub config: PathBuf,
    pub root_dir: PathBuf,
    pub machine: String,
    pub local_file: Option<PathBuf>,
    pub build_types: Option<Vec<String>>,
    pub generate: bool,
    pub output: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
pub struct GitInfo {
    pub branch: Option<String>,
    pub commit: String,
}

#[derive(Debug, Serialize)]
pub struct Snapshot {
    #[serde(flatten)]
    pub resolved: ResolvedConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub git: Option<GitInfo>,
}

pub fn run(options: &ResolveOptions) -> Result<()> {
    let snapshot = resolve(options)?;
    let json = serde_json::to_string_pretty(&snapshot)?;

    match &options.output {
        Some(path) => write_shared(path, &json)?,
        None => println!("{}", json),
    }
    Ok(())
}

pub fn resolve(options: &ResolveOptions) -> Result<Snapshot> {
    let file = super::load_config(&options.config)?;

    let project = file
        .parse_project(&options.root_dir)
        .context("Failed to resolve project")?;
    let machine = file
        .parse_machine_with_local(&project, &options.machine, options.local_file.as_deref())
        .with_context(|| format!("Failed to resolve machine '{}'", options.machine))?;
    let builds = file
        .parse_builds(
            &project,
            &machine,
            options.generate,
            options.build_types.as_deref(),
        )
        .context("Failed to resolve build types")?;

    info!(
        project = %project.name,
        machine = %machine.name,
        builds = builds.len(),
        "Configuration resolved"
    );

    let git = git_info(&project.root_dir)?;
    Ok(Snapshot {
        resolved: ResolvedConfig {
            project,
            machine,
            builds,
        },
        git,
    })
}

fn git_info(root_dir: &Path) -> Result<Option<GitInfo>> {
    if !is_git_repository(root_dir) {
        warn!(root_dir = %root_dir.display(), "Not a git repository, skipping git metadata");
        return Ok(None);
    }
    Ok(Some(GitInfo {
        branch: current_git_branch(root_dir)?,
        commit: current_git_commit(root_dir, false)?,
    }))
}

#[cfg(unix)]
fn write_shared(path: &Path, content: &str) -> Result<()> {
    let _guard = cacts_executor::SharedArea::new();
    std::fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))
}

#[cfg(not(unix))]
fn write_shared(path: &Path, content: &str) -> Result<()> {
    std::fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))
}
