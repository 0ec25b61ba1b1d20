#![forbid(unsafe_code)]

mod datasets;
mod stages;
mod workflows;

use crate::config::Config;
use crate::content::{ContentBackend, LocalContentBackend};
use crate::error::RegistryError;
use avc_core::identifier::VersionRef;
use avc_core::lineage::ArtifactRef;
use avc_storage::{SqliteStore, StoreError};

/// Orchestrates parse → fingerprint → resolve → store for the three
/// artifact kinds. One registry wraps one metadata store and one content
/// backend; independent callers open their own.
pub struct Registry {
    config: Config,
    store: SqliteStore,
    backend: Box<dyn ContentBackend>,
}

impl Registry {
    pub fn open(config: Config) -> Result<Self, RegistryError> {
        let backend = Box::new(LocalContentBackend::new(config.storage_dir.clone()));
        Self::with_backend(config, backend)
    }

    /// Open against a caller-supplied content backend (e.g. a remote
    /// cache); the metadata store stays local either way.
    pub fn with_backend(
        config: Config,
        backend: Box<dyn ContentBackend>,
    ) -> Result<Self, RegistryError> {
        let store = SqliteStore::open(config.storage_dir.join("metadata"))?;
        Ok(Self {
            config,
            store,
            backend,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub(in crate::registry) fn workspace_for(
        &self,
        parsed: Option<String>,
    ) -> Result<String, RegistryError> {
        parsed
            .or_else(|| self.config.default_workspace.clone())
            .ok_or(RegistryError::MissingWorkspace)
    }

    /// Ancestry of one exact artifact version, nearest first.
    pub fn ancestors(&mut self, artifact: &ArtifactRef) -> Result<Vec<ArtifactRef>, RegistryError> {
        Ok(self.store.ancestors(artifact)?)
    }

    pub fn is_ancestor(
        &mut self,
        candidate: &ArtifactRef,
        artifact: &ArtifactRef,
    ) -> Result<bool, RegistryError> {
        Ok(self.store.is_ancestor(candidate, artifact)?)
    }
}

/// Version filter for list queries, derived from the parsed identifier.
pub(in crate::registry) enum VersionFilter {
    /// No version constraint.
    Any,
    /// GLOB over the version column; an exact digest is its own pattern.
    Pattern(String),
    /// A symbolic reference resolved to nothing, so the listing is empty.
    NoMatch,
}

/// Map a parsed list-query version onto a GLOB filter. Hex prefixes
/// widen into `<prefix>*`; symbolic references (`latest`, `v<N>`) resolve
/// to the one exact version first.
pub(in crate::registry) fn version_filter(
    version: Option<VersionRef>,
    resolve: impl FnOnce(&VersionRef) -> Result<String, StoreError>,
) -> Result<VersionFilter, RegistryError> {
    match version {
        None => Ok(VersionFilter::Any),
        Some(VersionRef::Pattern(pattern)) => Ok(VersionFilter::Pattern(pattern)),
        Some(VersionRef::Hex(prefix)) => Ok(VersionFilter::Pattern(format!("{prefix}*"))),
        Some(symbolic) => match resolve(&symbolic) {
            Ok(version) => Ok(VersionFilter::Pattern(version)),
            Err(StoreError::NotFound { .. }) => Ok(VersionFilter::NoMatch),
            Err(err) => Err(err.into()),
        },
    }
}
