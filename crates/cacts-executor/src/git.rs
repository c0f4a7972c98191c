//! Git repository queries.

use std::path::Path;

use crate::shell::ShellCommand;
use cacts_core::Result;

/// Check whether `repo` is inside a git work tree.
pub fn is_git_repository(repo: &Path) -> bool {
    ShellCommand::new("git rev-parse --is-inside-work-tree")
        .working_dir(repo)
        .run()
        .map(|o| o.success())
        .unwrap_or(false)
}

/// Name of the current branch, or `None` on a detached HEAD.
pub fn current_git_branch(repo: &Path) -> Result<Option<String>> {
    let branch = ShellCommand::new("git rev-parse --abbrev-ref HEAD")
        .working_dir(repo)
        .run_or_fail()?;

    if branch == "HEAD" {
        Ok(None)
    } else {
        Ok(Some(branch))
    }
}

/// SHA of the HEAD commit, abbreviated when `short` is set.
pub fn current_git_commit(repo: &Path, short: bool) -> Result<String> {
    let cmd = if short {
        "git rev-parse --short HEAD"
    } else {
        "git rev-parse HEAD"
    };
    ShellCommand::new(cmd).working_dir(repo).run_or_fail()
}
