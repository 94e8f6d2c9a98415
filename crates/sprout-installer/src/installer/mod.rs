//! Package installation
//!
//! A requested reference and every dependency its manifest pulls in are
//! processed from one FIFO work queue. A reference is enqueued only if it is
//! neither installed nor already seen during the same request, so dependency
//! cycles end as soon as every member has been processed once. A later
//! request retries anything that is still not installed.

use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};

use sprout_archive::{ArchiveExtractor, ExtractSummary, PermissionModes};
use sprout_core::error::SproutError;
use sprout_core::types::{DependencyManifest, PackageReference, DEFAULT_MANIFEST_DIR};
use sprout_core::utils::verify_checksum;
use sprout_registry::api::action_url;
use sprout_registry::{Action, ProbeSummary, ServerRegistry, Transport};
use tracing::{debug, info, warn};

use crate::report::{ErrorLog, InstallOutcome, InstallReport, InstalledSet};
use crate::InstallerResult;

/// Where and how packages are installed
#[derive(Debug, Clone)]
pub struct InstallerOptions {
    /// Installation root every archive is unpacked into
    pub root: PathBuf,
    /// Manifest directory relative to `root`
    pub manifest_dir: PathBuf,
    /// Modes applied to extracted entries
    pub modes: PermissionModes,
}

impl InstallerOptions {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            manifest_dir: PathBuf::from(DEFAULT_MANIFEST_DIR),
            modes: PermissionModes::default(),
        }
    }
}

/// Installs packages from connected mirrors into one root
pub struct PackageInstaller<T: Transport> {
    transport: T,
    registry: ServerRegistry,
    extractor: ArchiveExtractor,
    manifest_dir: PathBuf,
    installed: InstalledSet,
    errors: ErrorLog,
    outcomes: Vec<(PackageReference, InstallOutcome)>,
}

impl<T: Transport> PackageInstaller<T> {
    /// Create an installer over a registry whose lists may or may not be probed yet
    pub fn new(transport: T, registry: ServerRegistry, options: InstallerOptions) -> Self {
        let manifest_dir = options.root.join(&options.manifest_dir);
        Self {
            transport,
            registry,
            extractor: ArchiveExtractor::new(options.root, options.modes),
            manifest_dir,
            installed: InstalledSet::new(),
            errors: ErrorLog::new(),
            outcomes: Vec::new(),
        }
    }

    /// Probe every registered server list through this installer's transport
    pub async fn probe(&mut self) -> ProbeSummary {
        self.registry.probe_all(&self.transport).await
    }

    pub fn registry(&self) -> &ServerRegistry {
        &self.registry
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn root(&self) -> &Path {
        self.extractor.root()
    }

    pub fn installed(&self) -> &InstalledSet {
        &self.installed
    }

    pub fn errors(&self) -> &ErrorLog {
        &self.errors
    }

    /// Snapshot of the run so far
    pub fn report(&self) -> InstallReport {
        InstallReport {
            outcomes: self.outcomes.clone(),
            installed: self.installed.clone(),
            errors: self.errors.clone(),
        }
    }

    /// Install one package and everything it requires
    pub async fn install_package(
        &mut self,
        package: &str,
        release: &str,
        serverlist: &str,
    ) -> InstallOutcome {
        self.install_reference(&PackageReference::new(package, release, serverlist))
            .await
    }

    /// Install a reference and its transitive dependencies
    ///
    /// The returned outcome is the requested package's own; failures of
    /// dependencies only show up in the error log and the report.
    pub async fn install_reference(&mut self, reference: &PackageReference) -> InstallOutcome {
        let key = reference.key();
        if self.installed.contains(&key) {
            debug!("{} already installed", key);
            self.outcomes
                .push((reference.clone(), InstallOutcome::AlreadyInstalled));
            return InstallOutcome::AlreadyInstalled;
        }

        let mut seen = HashSet::from([key]);
        let mut queue = VecDeque::from([reference.clone()]);
        let mut requested = None;

        while let Some(next) = queue.pop_front() {
            let outcome = self.process(&next, &mut queue, &mut seen).await;
            self.outcomes.push((next, outcome));
            requested.get_or_insert(outcome);
        }

        requested.unwrap_or(InstallOutcome::AlreadyInstalled)
    }

    /// Install every reference in order, continuing past failures
    pub async fn install_all(&mut self, references: &[PackageReference]) -> InstallReport {
        for reference in references {
            let outcome = self.install_reference(reference).await;
            info!("{}: {}", reference.label(), outcome);
        }
        self.report()
    }

    async fn process(
        &mut self,
        reference: &PackageReference,
        queue: &mut VecDeque<PackageReference>,
        seen: &mut HashSet<String>,
    ) -> InstallOutcome {
        let list = &reference.serverlist;
        let label = reference.label();

        let base_url = match self.registry.connected(list) {
            Some(server) => server.base_url().to_string(),
            None => {
                warn!("Cannot install {}: server list '{}' is not connected", label, list);
                self.errors.push(format!("{}: not connected", list));
                return InstallOutcome::NotConnected;
            },
        };

        let checksum = self
            .transport
            .fetch(&action_url(&base_url, Action::GetChecksum, reference))
            .await;
        let content = self
            .transport
            .fetch(&action_url(&base_url, Action::GetContent, reference))
            .await;

        if let Err(e) = verify_checksum(&label, &content, &checksum) {
            warn!("{}", e);
            self.errors
                .push(format!("{} {}: checksum mismatched", list, label));
            return InstallOutcome::ChecksumMismatch;
        }

        let outcome = match self.unpack(reference, content).await {
            Ok(summary) => {
                if summary.failed > 0 {
                    warn!("{}: {} entries could not be written", label, summary.failed);
                }
                info!(
                    "Installed {} ({} directories, {} files)",
                    label, summary.directories, summary.files
                );
                self.installed.insert(reference.key());
                InstallOutcome::Installed
            },
            Err(e) => {
                warn!("Failed to unpack {}: {}", label, e);
                self.errors.push(format!("{} {}: can not unpacked", list, label));
                InstallOutcome::ExtractionFailed
            },
        };

        // A manifest left by an earlier install may exist even if this one failed
        if let Some(manifest) = self.read_manifest(reference).await {
            for dependency in manifest.dependencies() {
                let key = dependency.key();
                if self.installed.contains(&key) || seen.contains(&key) {
                    debug!("{} requires {}, already handled", label, key);
                    continue;
                }
                debug!("{} requires {}", label, key);
                seen.insert(key);
                queue.push_back(dependency.clone());
            }
        }

        outcome
    }

    /// Write the archive under the root, extract it and remove it again
    async fn unpack(&self, reference: &PackageReference, content: Vec<u8>) -> InstallerResult<ExtractSummary> {
        let archive_path = self.extractor.root().join(reference.archive_file_name());

        tokio::fs::write(&archive_path, content)
            .await
            .map_err(|e| SproutError::io(format!("Failed to write {}", archive_path.display()), e))?;

        let extractor = self.extractor.clone();
        let path = archive_path.clone();
        let result = tokio::task::spawn_blocking(move || extractor.extract(&path))
            .await
            .map_err(|e| SproutError::Archive {
                path: archive_path.display().to_string(),
                reason: format!("extraction task failed: {}", e),
            })
            .and_then(|result| result);

        if let Err(e) = tokio::fs::remove_file(&archive_path).await {
            debug!("Failed to remove {}: {}", archive_path.display(), e);
        }

        result
    }

    /// Load a reference's manifest; absent or undecodable manifests yield None
    async fn read_manifest(&self, reference: &PackageReference) -> Option<DependencyManifest> {
        let path = self.manifest_dir.join(reference.manifest_file_name());

        let json = match tokio::fs::read_to_string(&path).await {
            Ok(json) => json,
            Err(e) => {
                debug!("No manifest at {}: {}", path.display(), e);
                return None;
            },
        };

        match DependencyManifest::from_json(&json) {
            Ok(manifest) => Some(manifest),
            Err(e) => {
                warn!("Ignoring manifest {}: {}", path.display(), e);
                None
            },
        }
    }
}
