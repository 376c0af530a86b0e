//! # Request Pipeline
//!
//! One request runs as a linear sequence of stages:
//!
//! ```text
//! prompt ─► parse ─► normalize ─► render ─► stage ─► [lock] clean ─► promote ─► deploy [unlock]
//! ```
//!
//! Everything up to and including rendering happens in memory, so a bad
//! draft never touches the filesystem. Rendered files go to a private staging
//! directory first; only the clean/promote/deploy sequence touches the
//! shared source tree, and it does so under an exclusive file lock.

use chrono::Utc;
use fs2::FileExt;
use metaforge_codegen::{ArtifactSet, Generator, SOURCE_DIR};
use metaforge_core::{ForgeError, ForgeResult};
use metaforge_ir::{FinalSchema, SchemaDraft};
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::Instrument;
use uuid::Uuid;
use walkdir::WalkDir;

use crate::ai::PromptParser;
use crate::config::ForgeConfig;
use crate::deploy::{CommandRunner, DeployDriver, DeployReport, SystemRunner, check_project};

/// Working directory of the tool inside a project
pub const WORK_DIR: &str = ".metaforge";

/// Lock file serializing writes to the shared source tree
pub const LOCK_FILE: &str = "deploy.lock";

// ============================================================================
// Options and outcome
// ============================================================================

/// Per-request options
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Stop after promoting files into the project
    pub dry_run: bool,
}

impl RunOptions {
    pub fn dry_run() -> Self {
        Self { dry_run: true }
    }
}

/// Result of a successful request
#[derive(Debug)]
pub struct RequestOutcome {
    pub request_id: String,

    /// Summary line for the caller
    pub message: String,

    pub artifacts: ArtifactSet,

    /// Project-relative paths written into the source tree
    pub promoted: Vec<PathBuf>,

    /// `None` on a dry run
    pub deploy: Option<DeployReport>,
}

// ============================================================================
// Pipeline
// ============================================================================

/// Runs requests against one project
pub struct Pipeline<R: CommandRunner = SystemRunner> {
    config: ForgeConfig,
    runner: R,
}

impl Pipeline<SystemRunner> {
    pub fn new(config: ForgeConfig) -> Self {
        Self::with_runner(config, SystemRunner)
    }
}

impl<R: CommandRunner> Pipeline<R> {
    pub fn with_runner(config: ForgeConfig, runner: R) -> Self {
        Self { config, runner }
    }

    pub fn config(&self) -> &ForgeConfig {
        &self.config
    }

    /// Parse a prompt and deploy the result
    pub async fn generate<P: PromptParser>(
        &self,
        parser: &P,
        prompt: &str,
        options: RunOptions,
    ) -> ForgeResult<RequestOutcome> {
        tracing::info!(prompt_len = prompt.len(), "parsing prompt");
        let draft = parser.parse(prompt).await?;
        self.deploy_draft(&draft, options).await
    }

    /// Normalize, render, stage, promote and deploy a draft
    pub async fn deploy_draft(
        &self,
        draft: &SchemaDraft,
        options: RunOptions,
    ) -> ForgeResult<RequestOutcome> {
        let request_id = new_request_id();
        let span = tracing::info_span!("request", id = %request_id);
        self.run_request(draft, options, request_id)
            .instrument(span)
            .await
    }

    async fn run_request(
        &self,
        draft: &SchemaDraft,
        options: RunOptions,
        request_id: String,
    ) -> ForgeResult<RequestOutcome> {
        let schema = FinalSchema::from_draft(draft)?;
        let artifacts = Generator::new(self.config.generator_config()).render(&schema)?;

        let project = self.config.project_dir.as_path();
        check_project(project)?;

        let staging = StagingDir::create(project, &request_id, self.config.keep_staging)?;
        artifacts.write_to_disk(staging.path())?;
        tracing::info!(dir = %staging.path().display(), files = artifacts.file_count(), "staged artifacts");

        let lock = DeployLock::acquire(project).await?;

        clean_shared_metadata(project, &artifacts.object)?;
        let promoted = promote(staging.path(), project)?;
        tracing::info!(files = promoted.len(), "promoted artifacts");

        let deploy = if options.dry_run {
            tracing::info!("dry run; skipping deployment");
            None
        } else {
            let mut driver = DeployDriver::new(&self.runner, &self.config);
            Some(driver.run(&artifacts).await?)
        };

        drop(lock);

        Ok(RequestOutcome {
            request_id,
            message: schema.summary(),
            artifacts,
            promoted,
            deploy,
        })
    }
}

// ============================================================================
// Staging
// ============================================================================

/// Private output directory of one request
#[derive(Debug)]
pub struct StagingDir {
    path: PathBuf,
    keep: bool,
}

impl StagingDir {
    pub fn create(project: &Path, request_id: &str, keep: bool) -> ForgeResult<Self> {
        let path = project.join(WORK_DIR).join("runs").join(request_id);
        std::fs::create_dir_all(&path).map_err(|e| ForgeError::DirectoryCreate {
            path: path.clone(),
            message: e.to_string(),
        })?;
        Ok(Self { path, keep })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for StagingDir {
    fn drop(&mut self) {
        if self.keep {
            tracing::debug!(dir = %self.path.display(), "keeping staging directory");
            return;
        }
        if let Err(e) = std::fs::remove_dir_all(&self.path) {
            tracing::warn!(dir = %self.path.display(), error = %e, "failed to remove staging directory");
        }
    }
}

/// Timestamped unique request id, e.g. `20260101T120000-1a2b3c4d`
pub fn new_request_id() -> String {
    let uuid = Uuid::new_v4().simple().to_string();
    format!("{}-{}", Utc::now().format("%Y%m%dT%H%M%S"), &uuid[..8])
}

// ============================================================================
// Deploy lock
// ============================================================================

/// Exclusive advisory lock on `<project>/.metaforge/deploy.lock`.
///
/// Released on drop.
#[derive(Debug)]
pub struct DeployLock {
    file: File,
    path: PathBuf,
}

impl DeployLock {
    pub async fn acquire(project: &Path) -> ForgeResult<Self> {
        let dir = project.join(WORK_DIR);
        std::fs::create_dir_all(&dir).map_err(|e| ForgeError::DirectoryCreate {
            path: dir.clone(),
            message: e.to_string(),
        })?;

        let path = dir.join(LOCK_FILE);
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| ForgeError::Lock {
                path: path.clone(),
                message: e.to_string(),
            })?;

        tracing::debug!(path = %path.display(), "waiting for deploy lock");
        let file = tokio::task::spawn_blocking(move || file.lock_exclusive().map(|_| file))
            .await
            .map_err(|e| ForgeError::internal(format!("lock task failed: {}", e)))?
            .map_err(|e| ForgeError::Lock {
                path: path.clone(),
                message: e.to_string(),
            })?;

        tracing::debug!(path = %path.display(), "deploy lock acquired");
        Ok(Self { file, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for DeployLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            tracing::warn!(path = %self.path.display(), error = %e, "failed to release deploy lock");
        }
    }
}

// ============================================================================
// Clean and promote
// ============================================================================

/// Remove metadata a previous request left in the shared tree: this object's
/// directory plus every profile and permission set file.
pub fn clean_shared_metadata(project: &Path, object: &str) -> ForgeResult<()> {
    let source = project.join(SOURCE_DIR);

    let object_dir = source.join("objects").join(object);
    if object_dir.is_dir() {
        std::fs::remove_dir_all(&object_dir)?;
    }

    for (dir, suffix) in [
        ("profiles", ".profile-meta.xml"),
        ("permissionsets", ".permissionset-meta.xml"),
    ] {
        let dir = source.join(dir);
        if !dir.is_dir() {
            continue;
        }
        for entry in std::fs::read_dir(&dir)? {
            let path = entry?.path();
            let matches = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.ends_with(suffix));
            if matches && path.is_file() {
                std::fs::remove_file(&path)?;
            }
        }
    }

    tracing::debug!(object, "cleaned shared metadata");
    Ok(())
}

/// Copy every staged file into the project, keeping relative paths
pub fn promote(staging: &Path, project: &Path) -> ForgeResult<Vec<PathBuf>> {
    let mut promoted = Vec::new();

    for entry in WalkDir::new(staging).sort_by_file_name() {
        let entry = entry.map_err(|e| ForgeError::with_context("Failed to walk staging directory", e.to_string()))?;
        if !entry.file_type().is_file() {
            continue;
        }

        let relative = entry
            .path()
            .strip_prefix(staging)
            .map_err(|e| ForgeError::internal(e.to_string()))?;
        let target = project.join(relative);

        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ForgeError::DirectoryCreate {
                path: parent.to_path_buf(),
                message: e.to_string(),
            })?;
        }
        std::fs::copy(entry.path(), &target).map_err(|e| ForgeError::FileWrite {
            path: target.clone(),
            message: e.to_string(),
        })?;

        promoted.push(relative.to_path_buf());
    }

    Ok(promoted)
}

// ============================================================================
// Tests
// ============================================================================
