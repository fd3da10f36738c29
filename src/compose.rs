use std::path::{Path, PathBuf};
use std::process::Stdio;

use log::{debug, info, warn};
use tokio::process::Command;

use crate::config::split_command;
use crate::error::{Error, Result};

const COMPOSE_FILES: [&str; 4] = [
    "docker-compose.yml",
    "docker-compose.yaml",
    "compose.yml",
    "compose.yaml",
];

/// A project directory that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposeProject {
    pub dir: PathBuf,
    pub file: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComposeCommand {
    Up,
    Down,
    Ps,
}

impl ComposeCommand {
    fn args(&self) -> &'static [&'static str] {
        match self {
            ComposeCommand::Up => &["up", "-d"],
            ComposeCommand::Down => &["down"],
            ComposeCommand::Ps => &["ps"],
        }
    }
}

/// Runs the compose CLI against allow-listed project directories.
#[derive(Debug, Clone)]
pub struct ComposeRunner {
    program: String,
    leading_args: Vec<String>,
    roots: Vec<PathBuf>,
}

impl ComposeRunner {
    /// `command` may carry leading arguments, e.g. `docker compose`. Roots that
    /// don't exist are dropped with a warning.
    pub fn new(command: &str, roots: &[PathBuf]) -> Self {
        let (program, leading_args) = split_command(command);
        let roots = roots
            .iter()
            .filter_map(|root| match root.canonicalize() {
                Ok(r) => Some(r),
                Err(e) => {
                    warn!("Ignoring compose root {}: {}", root.display(), e);
                    None
                }
            })
            .collect();
        Self {
            program,
            leading_args,
            roots,
        }
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Canonicalizes `dir` and accepts it only below one of the roots and only when it holds a compose file.
    pub fn resolve(&self, dir: &str) -> Result<ComposeProject> {
        let dir = dir.trim();
        if dir.is_empty() {
            return Err(Error::InvalidInput(
                "Project directory is required".to_string(),
            ));
        }
        let canonical = Path::new(dir).canonicalize().map_err(|e| {
            Error::InvalidInput(format!("Project directory {} is not accessible: {}", dir, e))
        })?;
        if !canonical.is_dir() {
            return Err(Error::InvalidInput(format!(
                "Project directory {} is not a directory",
                dir
            )));
        }
        if !self.roots.iter().any(|root| canonical.starts_with(root)) {
            return Err(Error::InvalidInput(format!(
                "Project directory {} is outside the allowed roots",
                dir
            )));
        }
        let file = COMPOSE_FILES
            .iter()
            .map(|name| canonical.join(name))
            .find(|path| path.is_file())
            .ok_or_else(|| {
                Error::InvalidInput(format!("No compose file found in {}", canonical.display()))
            })?;
        Ok(ComposeProject {
            dir: canonical,
            file,
        })
    }

    /// Runs one compose command to completion and returns its stdout.
    pub async fn run(&self, project: &ComposeProject, command: ComposeCommand) -> Result<String> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.leading_args)
            .arg("-f")
            .arg(&project.file)
            .args(command.args())
            .current_dir(&project.dir)
            .stdin(Stdio::null())
            .kill_on_drop(true);
        debug!("Running {:?}", cmd);

        let output = cmd.output().await.map_err(|e| {
            Error::UpstreamFailure(format!("Failed to run {}: {}", self.program, e))
        })?;
        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            warn!(
                "{:?} in {} failed with {}",
                command,
                project.dir.display(),
                output.status
            );
            return Err(Error::UpstreamFailure(if stderr.is_empty() {
                format!("{} exited with {}", self.program, output.status)
            } else {
                stderr
            }));
        }
        info!("{:?} in {} succeeded", command, project.dir.display());
        Ok(stdout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn project_root() -> (tempfile::TempDir, PathBuf) {
        let root = tempfile::tempdir().unwrap();
        let project = root.path().join("web");
        fs::create_dir(&project).unwrap();
        fs::write(project.join("docker-compose.yml"), "services: {}\n").unwrap();
        (root, project)
    }

    #[test]
    fn resolves_project_below_root() {
        let (root, project) = project_root();
        let runner = ComposeRunner::new("docker-compose", &[root.path().to_path_buf()]);
        let resolved = runner.resolve(project.to_str().unwrap()).unwrap();
        assert_eq!(resolved.dir, project.canonicalize().unwrap());
        assert!(resolved.file.ends_with("docker-compose.yml"));
    }

    #[test]
    fn rejects_empty_directory_argument() {
        let (root, _) = project_root();
        let runner = ComposeRunner::new("docker-compose", &[root.path().to_path_buf()]);
        match runner.resolve("  ") {
            Err(Error::InvalidInput(msg)) => assert_eq!(msg, "Project directory is required"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn rejects_directory_outside_roots() {
        let (_root, project) = project_root();
        let other = tempfile::tempdir().unwrap();
        let runner = ComposeRunner::new("docker-compose", &[other.path().to_path_buf()]);
        assert!(matches!(
            runner.resolve(project.to_str().unwrap()),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn rejects_parent_traversal() {
        let (_root, project) = project_root();
        let runner = ComposeRunner::new("docker-compose", &[project.clone()]);
        let escaped = project.join("..");
        assert!(runner.resolve(escaped.to_str().unwrap()).is_err());
    }

    #[test]
    fn rejects_directory_without_compose_file() {
        let root = tempfile::tempdir().unwrap();
        let runner = ComposeRunner::new("docker-compose", &[root.path().to_path_buf()]);
        assert!(matches!(
            runner.resolve(root.path().to_str().unwrap()),
            Err(Error::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn run_passes_an_argument_vector() {
        let (root, project) = project_root();
        let runner = ComposeRunner::new("echo", &[root.path().to_path_buf()]);
        let resolved = runner.resolve(project.to_str().unwrap()).unwrap();
        let out = runner.run(&resolved, ComposeCommand::Up).await.unwrap();
        assert!(out.starts_with("-f "));
        assert!(out.trim_end().ends_with("docker-compose.yml up -d"));
    }

    #[tokio::test]
    async fn non_zero_exit_is_an_upstream_failure() {
        let (root, project) = project_root();
        let runner = ComposeRunner::new("false", &[root.path().to_path_buf()]);
        let resolved = runner.resolve(project.to_str().unwrap()).unwrap();
        assert!(matches!(
            runner.run(&resolved, ComposeCommand::Down).await,
            Err(Error::UpstreamFailure(_))
        ));
    }
}
