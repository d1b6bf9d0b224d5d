//! Name to artifact dispatch.

use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
    path::{Path, PathBuf},
};

use anyhow::Context;
use derive_more::Deref;

use super::ContractArtifact;

/// No artifact matches the requested contract name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactNotFound {
    pub name: String,
    pub root: PathBuf,
}

impl fmt::Display for ArtifactNotFound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "No artifact for contract {} under {}. Did you compile the contracts?",
            self.name,
            self.root.display()
        )
    }
}

impl std::error::Error for ArtifactNotFound {}

/// Index of the artifacts found under a build directory.
///
/// Every artifact is reachable by its bare contract name (`Publication`) and by its fully
/// qualified name (`contracts/Publication.sol:Publication`).
#[derive(Debug, Clone, Deref)]
pub struct ArtifactRegistry {
    #[deref]
    entries: BTreeMap<String, PathBuf>,
    /// Bare names declared in more than one source file.
    ambiguous: BTreeSet<String>,
    root: PathBuf,
}

impl ArtifactRegistry {
    /// Walk `root` and index every contract artifact.
    ///
    /// Hardhat debug files (`*.dbg.json`) and the `build-info` directory are skipped.
    pub fn scan(root: impl AsRef<Path>) -> anyhow::Result<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.is_dir() {
            anyhow::bail!(
                "Artifacts directory {} does not exist. Compile the contracts first.",
                root.display()
            );
        }

        let mut registry = Self {
            entries: BTreeMap::new(),
            ambiguous: BTreeSet::new(),
            root: root.clone(),
        };
        registry.walk(&root)?;

        tracing::debug!(
            root = %root.display(),
            artifacts = registry.entries.len(),
            "Artifacts indexed"
        );

        Ok(registry)
    }

    fn walk(&mut self, dir: &Path) -> anyhow::Result<()> {
        let entries = std::fs::read_dir(dir)
            .with_context(|| format!("Failed to read directory {}", dir.display()))?;

        for entry in entries {
            let path = entry
                .with_context(|| format!("Failed to read entry in {}", dir.display()))?
                .path();

            if path.is_dir() {
                if path.file_name().is_some_and(|name| name == "build-info") {
                    continue;
                }
                self.walk(&path)?;
                continue;
            }

            let Some(file_name) = path.file_name().and_then(|name| name.to_str()) else {
                continue;
            };
            if !file_name.ends_with(".json") || file_name.ends_with(".dbg.json") {
                continue;
            }

            self.insert(path.clone());
        }

        Ok(())
    }

    fn insert(&mut self, path: PathBuf) {
        let Some(name) = path.file_stem().and_then(|stem| stem.to_str()).map(str::to_string)
        else {
            return;
        };

        // `artifacts/contracts/Publication.sol/Publication.json` -> `contracts/Publication.sol`
        let source = path
            .parent()
            .and_then(|parent| parent.strip_prefix(&self.root).ok())
            .filter(|source| !source.as_os_str().is_empty())
            .map(|source| source.to_string_lossy().replace('\\', "/"));

        if let Some(source) = source {
            self.entries.insert(format!("{source}:{name}"), path.clone());
        }

        if self.entries.contains_key(&name) {
            self.ambiguous.insert(name.clone());
        }
        self.entries.insert(name, path);
    }

    /// Root directory the registry was built from.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Load the artifact registered under `name`.
    ///
    /// Fails with [`ArtifactNotFound`] when nothing matches.
    pub fn resolve(&self, name: &str) -> anyhow::Result<ContractArtifact> {
        if self.ambiguous.contains(name) {
            let candidates: Vec<&str> = self
                .entries
                .keys()
                .filter(|key| key.ends_with(&format!(":{name}")))
                .map(String::as_str)
                .collect();
            anyhow::bail!(
                "Contract name {name} is ambiguous, use one of: {}",
                candidates.join(", ")
            );
        }

        let path = self.entries.get(name).ok_or_else(|| ArtifactNotFound {
            name: name.to_string(),
            root: self.root.clone(),
        })?;

        ContractArtifact::load(path)
    }
}
