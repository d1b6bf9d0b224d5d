//! Hardhat build-info lookup, used for explorer verification.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;
use serde_json::Value;

use crate::fs::FsHandler;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DebugFile {
    build_info: PathBuf,
}

/// The compiler invocation an artifact was produced by.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildInfo {
    /// e.g. `0.8.4+commit.c7e474f2`.
    pub solc_long_version: String,
    /// The standard-JSON compiler input.
    pub input: Value,
}

impl BuildInfo {
    /// Locate and load the build info of a Hardhat artifact through its `.dbg.json` file.
    pub fn for_artifact(artifact_path: &Path) -> anyhow::Result<Self> {
        let stem = artifact_path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .with_context(|| format!("Invalid artifact path {}", artifact_path.display()))?;
        let dir = artifact_path.parent().unwrap_or(Path::new("."));
        let debug_path = dir.join(format!("{stem}.dbg.json"));

        let debug: DebugFile = FsHandler::read_json(&debug_path).with_context(|| {
            format!(
                "No build info reference for {}. Only Hardhat artifacts can be verified.",
                artifact_path.display()
            )
        })?;

        let path = dir.join(&debug.build_info);
        FsHandler::read_json(&path)
            .with_context(|| format!("Failed to load build info {}", path.display()))
    }

    /// Compiler version in the form explorers expect, e.g. `v0.8.4+commit.c7e474f2`.
    pub fn compiler_version(&self) -> String {
        format!("v{}", self.solc_long_version)
    }
}

#[cfg(test)]
mod tests {
    use tempdir::TempDir;

    use super::*;

    #[test]
    fn test_build_info_through_debug_file() {
        let dir = TempDir::new("build-info").unwrap();
        let root = dir.path();
        let artifact = root.join("contracts/Publication.sol/Publication.json");
        FsHandler::write_json(&artifact, &serde_json::json!({})).unwrap();
        FsHandler::write_json(
            &root.join("contracts/Publication.sol/Publication.dbg.json"),
            &serde_json::json!({
                "_format": "hh-sol-dbg-1",
                "buildInfo": "../../build-info/abc.json"
            }),
        )
        .unwrap();
        FsHandler::write_json(
            &root.join("build-info/abc.json"),
            &serde_json::json!({
                "_format": "hh-sol-build-info-1",
                "solcVersion": "0.8.4",
                "solcLongVersion": "0.8.4+commit.c7e474f2",
                "input": {"language": "Solidity", "sources": {}},
                "output": {}
            }),
        )
        .unwrap();

        let info = BuildInfo::for_artifact(&artifact).unwrap();
        assert_eq!(info.compiler_version(), "v0.8.4+commit.c7e474f2");
        assert_eq!(info.input["language"], "Solidity");
    }

    #[test]
    fn test_missing_debug_file() {
        let dir = TempDir::new("build-info").unwrap();
        let err = BuildInfo::for_artifact(&dir.path().join("Counter.json")).unwrap_err();
        assert!(err.to_string().contains("Only Hardhat artifacts"));
    }
}
