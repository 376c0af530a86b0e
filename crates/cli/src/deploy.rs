//! # Deployment Driver
//!
//! Publishes rendered metadata by shelling out to the Salesforce CLI, in a
//! fixed order:
//!
//! ```text
//! Idle ──► DeployingObjects ──► DeployingProfiles ──► DeployingPermissionSets ──► Done
//!                │                      │                        │
//!                └──────────────────────┴────────────────────────┴──────────────► Failed
//! ```
//!
//! A step only runs when its artifact group was rendered. The first failing
//! step aborts the rest; nothing is retried.

use metaforge_codegen::{ArtifactKind, ArtifactSet, SOURCE_DIR};
use metaforge_core::{ForgeError, ForgeResult};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};

use crate::config::{ForgeConfig, PROJECT_MANIFEST};

/// Manifest path passed to the object step, relative to the project root
pub const MANIFEST_PATH: &str = "manifest/package.xml";

const TEST_LEVEL: &str = "NoTestRun";

// ============================================================================
// DeployStep
// ============================================================================

/// One invocation of the deployment CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployStep {
    Objects,
    Profiles,
    PermissionSets,
}

impl DeployStep {
    /// All steps, in deployment order
    pub const ALL: [DeployStep; 3] = [
        DeployStep::Objects,
        DeployStep::Profiles,
        DeployStep::PermissionSets,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            DeployStep::Objects => "Object",
            DeployStep::Profiles => "Profile",
            DeployStep::PermissionSets => "Permission set",
        }
    }

    /// Artifact kind whose presence triggers this step
    pub fn trigger(&self) -> ArtifactKind {
        match self {
            DeployStep::Objects => ArtifactKind::Object,
            DeployStep::Profiles => ArtifactKind::Profile,
            DeployStep::PermissionSets => ArtifactKind::PermissionSet,
        }
    }

    /// State entered while this step runs
    pub fn state(&self) -> DeployState {
        match self {
            DeployStep::Objects => DeployState::DeployingObjects,
            DeployStep::Profiles => DeployState::DeployingProfiles,
            DeployStep::PermissionSets => DeployState::DeployingPermissionSets,
        }
    }

    /// CLI arguments, without the executable
    pub fn args(&self, target_org: Option<&str>) -> Vec<String> {
        let mut args = vec!["deploy".to_string(), "metadata".to_string()];

        match self {
            DeployStep::Objects => {
                args.push("--manifest".into());
                args.push(MANIFEST_PATH.into());
            }
            DeployStep::Profiles => {
                args.push("--source-dir".into());
                args.push(format!("{}/profiles", SOURCE_DIR));
            }
            DeployStep::PermissionSets => {
                args.push("--source-dir".into());
                args.push(format!("{}/permissionsets", SOURCE_DIR));
            }
        }

        args.push("--test-level".into());
        args.push(TEST_LEVEL.into());

        if let Some(org) = target_org {
            args.push("--target-org".into());
            args.push(org.to_string());
        }

        args
    }
}

impl std::fmt::Display for DeployStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// ============================================================================
// DeployState
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployState {
    Idle,
    DeployingObjects,
    DeployingProfiles,
    DeployingPermissionSets,
    Done,
    Failed,
}

impl DeployState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, DeployState::Done | DeployState::Failed)
    }
}

// ============================================================================
// Command execution
// ============================================================================

/// Captured result of an external command
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    /// Exit code; `None` if the process was killed by a signal
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Best diagnostic text: stderr, falling back to stdout
    pub fn diagnostics(&self) -> &str {
        if self.stderr.trim().is_empty() {
            self.stdout.trim()
        } else {
            self.stderr.trim()
        }
    }
}

/// Runs external programs
pub trait CommandRunner: Send + Sync {
    fn run(
        &self,
        program: &str,
        args: &[String],
        cwd: &Path,
        timeout: Duration,
    ) -> impl Future<Output = ForgeResult<CommandOutput>> + Send;
}

/// Runs commands as child processes of this one
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    async fn run(
        &self,
        program: &str,
        args: &[String],
        cwd: &Path,
        timeout: Duration,
    ) -> ForgeResult<CommandOutput> {
        let child = tokio::process::Command::new(program)
            .args(args)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                ForgeError::with_context(format!("Failed to start '{}'", program), e.to_string())
            })?;

        // Dropping the future on timeout kills the child.
        let output = tokio::time::timeout(timeout, child.wait_with_output())
            .await
            .map_err(|_| ForgeError::timeout(format!("'{} {}'", program, args.join(" ")), timeout))?
            .map_err(ForgeError::Io)?;

        Ok(CommandOutput {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

// ============================================================================
// Project check
// ============================================================================

/// Fail unless `dir` holds an SFDX project manifest
pub fn check_project(dir: &Path) -> ForgeResult<()> {
    let manifest = dir.join(PROJECT_MANIFEST);
    if manifest.is_file() {
        Ok(())
    } else {
        Err(ForgeError::ProjectLayout(format!(
            "{} not found at: {}",
            PROJECT_MANIFEST,
            manifest.display()
        )))
    }
}

// ============================================================================
// DeployDriver
// ============================================================================

/// Steps to run for an artifact set
pub fn plan(artifacts: &ArtifactSet) -> Vec<DeployStep> {
    DeployStep::ALL
        .into_iter()
        .filter(|step| artifacts.has(step.trigger()))
        .collect()
}

/// Outcome of one executed step
#[derive(Debug, Clone)]
pub struct StepReport {
    pub step: DeployStep,
    pub output: CommandOutput,
    pub elapsed: Duration,
}

/// Outcome of a successful deployment
#[derive(Debug, Clone, Default)]
pub struct DeployReport {
    pub steps: Vec<StepReport>,
}

impl DeployReport {
    pub fn ran(&self, step: DeployStep) -> bool {
        self.steps.iter().any(|s| s.step == step)
    }
}

/// Drives the deployment state machine
pub struct DeployDriver<'a, R: CommandRunner> {
    runner: &'a R,
    program: String,
    project_dir: PathBuf,
    target_org: Option<String>,
    timeout: Duration,
    state: DeployState,
    history: Vec<DeployState>,
}

impl<'a, R: CommandRunner> DeployDriver<'a, R> {
    pub fn new(runner: &'a R, config: &ForgeConfig) -> Self {
        Self {
            runner,
            program: config.sf_bin.clone(),
            project_dir: config.project_dir.clone(),
            target_org: config.target_org.clone(),
            timeout: config.deploy_timeout(),
            state: DeployState::Idle,
            history: vec![DeployState::Idle],
        }
    }

    /// Deploy from a different directory than the configured project
    pub fn with_project_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.project_dir = dir.into();
        self
    }

    pub fn state(&self) -> DeployState {
        self.state
    }

    /// Every state entered so far, starting with `Idle`
    pub fn history(&self) -> &[DeployState] {
        &self.history
    }

    fn transition(&mut self, next: DeployState) {
        tracing::debug!(from = ?self.state, to = ?next, "deploy state");
        self.state = next;
        self.history.push(next);
    }

    /// Run the planned steps in order
    pub async fn run(&mut self, artifacts: &ArtifactSet) -> ForgeResult<DeployReport> {
        if self.state != DeployState::Idle {
            return Err(ForgeError::internal("deploy driver already used"));
        }

        if let Err(err) = check_project(&self.project_dir) {
            self.transition(DeployState::Failed);
            return Err(err);
        }

        let mut report = DeployReport::default();

        for step in plan(artifacts) {
            self.transition(step.state());
            let args = step.args(self.target_org.as_deref());
            tracing::info!(step = %step, command = %format!("{} {}", self.program, args.join(" ")), "deploying");

            let started = Instant::now();
            let output = match self
                .runner
                .run(&self.program, &args, &self.project_dir, self.timeout)
                .await
            {
                Ok(output) => output,
                Err(err) => {
                    self.transition(DeployState::Failed);
                    return Err(err);
                }
            };
            let elapsed = started.elapsed();

            if !output.success() {
                tracing::error!(step = %step, exit_code = ?output.exit_code, "deployment step failed");
                self.transition(DeployState::Failed);
                return Err(ForgeError::deploy(
                    step.label(),
                    output.exit_code,
                    output.diagnostics(),
                ));
            }

            tracing::info!(step = %step, elapsed_ms = elapsed.as_millis() as u64, "step deployed");
            report.steps.push(StepReport {
                step,
                output,
                elapsed,
            });
        }

        self.transition(DeployState::Done);
        Ok(report)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use metaforge_codegen::GeneratedFile;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Records calls and fails on the configured step
    #[derive(Default)]
    struct FakeRunner {
        calls: Mutex<Vec<Vec<String>>>,
        fail_on: Option<&'static str>,
    }

    impl CommandRunner for FakeRunner {
        async fn run(
            &self,
            _program: &str,
            args: &[String],
            _cwd: &Path,
            _timeout: Duration,
        ) -> ForgeResult<CommandOutput> {
            self.calls.lock().unwrap().push(args.to_vec());
            let failing = self
                .fail_on
                .is_some_and(|needle| args.iter().any(|a| a.contains(needle)));
            Ok(CommandOutput {
                exit_code: Some(if failing { 1 } else { 0 }),
                stdout: String::new(),
                stderr: if failing { "boom".into() } else { String::new() },
            })
        }
    }

    fn project() -> (TempDir, ForgeConfig) {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(PROJECT_MANIFEST), "{}").unwrap();
        let config = ForgeConfig {
            project_dir: dir.path().to_path_buf(),
            target_org: Some("dev".into()),
            ..Default::default()
        };
        (dir, config)
    }

    fn artifacts(kinds: &[ArtifactKind]) -> ArtifactSet {
        let mut set = ArtifactSet::new("Car__c");
        for kind in kinds {
            set.add_file(GeneratedFile::new("x", "", *kind));
        }
        set
    }

    #[test]
    fn test_step_args() {
        assert_eq!(
            DeployStep::Objects.args(Some("dev")),
            vec![
                "deploy", "metadata", "--manifest", "manifest/package.xml",
                "--test-level", "NoTestRun", "--target-org", "dev",
            ]
        );
        assert_eq!(
            DeployStep::Profiles.args(None),
            vec![
                "deploy", "metadata", "--source-dir", "force-app/main/default/profiles",
                "--test-level", "NoTestRun",
            ]
        );
    }

    #[test]
    fn test_plan_skips_empty_groups() {
        let set = artifacts(&[ArtifactKind::Object, ArtifactKind::Field, ArtifactKind::PermissionSet]);
        assert_eq!(
            plan(&set),
            vec![DeployStep::Objects, DeployStep::PermissionSets]
        );
    }

    #[test]
    fn test_check_project() {
        let dir = TempDir::new().unwrap();
        let err = check_project(dir.path()).unwrap_err();
        assert!(err.to_string().contains("sfdx-project.json not found at:"));
        assert!(err.is_deploy());
    }

    #[tokio::test]
    async fn test_deploys_in_order() {
        let (_dir, config) = project();
        let runner = FakeRunner::default();
        let set = artifacts(&[ArtifactKind::Object, ArtifactKind::Profile, ArtifactKind::PermissionSet]);

        let mut driver = DeployDriver::new(&runner, &config);
        let report = driver.run(&set).await.unwrap();

        assert_eq!(report.steps.len(), 3);
        assert_eq!(
            driver.history(),
            &[
                DeployState::Idle,
                DeployState::DeployingObjects,
                DeployState::DeployingProfiles,
                DeployState::DeployingPermissionSets,
                DeployState::Done,
            ]
        );
        let calls = runner.calls.lock().unwrap();
        assert_eq!(calls[0][2], "--manifest");
        assert!(calls[1][3].ends_with("profiles"));
        assert!(calls[2][3].ends_with("permissionsets"));
    }

    #[tokio::test]
    async fn test_failure_aborts_later_steps() {
        let (_dir, config) = project();
        let runner = FakeRunner {
            fail_on: Some("profiles"),
            ..Default::default()
        };
        let set = artifacts(&[ArtifactKind::Object, ArtifactKind::Profile, ArtifactKind::PermissionSet]);

        let mut driver = DeployDriver::new(&runner, &config);
        let err = driver.run(&set).await.unwrap_err();

        assert!(err.is_deploy());
        assert!(err.to_string().contains("Profile deployment failed (exit code 1): boom"));
        assert_eq!(driver.state(), DeployState::Failed);
        assert_eq!(runner.calls.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_missing_project_runs_nothing() {
        let dir = TempDir::new().unwrap();
        let config = ForgeConfig {
            project_dir: dir.path().to_path_buf(),
            ..Default::default()
        };
        let runner = FakeRunner::default();

        let mut driver = DeployDriver::new(&runner, &config);
        assert!(driver.run(&artifacts(&[ArtifactKind::Object])).await.is_err());
        assert!(runner.calls.lock().unwrap().is_empty());
        assert!(driver.state().is_terminal());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_system_runner_captures_output() {
        let dir = TempDir::new().unwrap();
        let output = SystemRunner
            .run(
                "sh",
                &["-c".to_string(), "echo out; echo err >&2; exit 3".to_string()],
                dir.path(),
                Duration::from_secs(10),
            )
            .await
            .unwrap();

        assert_eq!(output.exit_code, Some(3));
        assert_eq!(output.stdout.trim(), "out");
        assert_eq!(output.diagnostics(), "err");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_system_runner_timeout() {
        let dir = TempDir::new().unwrap();
        let err = SystemRunner
            .run(
                "sleep",
                &["5".to_string()],
                dir.path(),
                Duration::from_millis(100),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ForgeError::Timeout { .. }));
    }
}
