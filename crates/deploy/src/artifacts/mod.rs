//! Compiled contract artifacts.
//!
//! Both the Hardhat (`artifacts/`) and the Foundry (`out/`) layouts are understood. An artifact
//! carries the ABI and the creation bytecode, which may still contain library placeholders.

mod build_info;
mod registry;

pub use build_info::BuildInfo;
pub use registry::{ArtifactNotFound, ArtifactRegistry};

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use alloy_core::{
    dyn_abi::{DynSolType, DynSolValue, Specifier},
    json_abi::JsonAbi,
    primitives::{Address, Bytes},
};
use anyhow::{Context, Result};
use serde::Deserialize;

use crate::fs::FsHandler;

const ADDRESS_LEN: usize = 20;

/// Byte offsets of a library address inside the bytecode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct LinkOffset {
    pub start: usize,
    pub length: usize,
}

/// `source file -> library name -> offsets`, as emitted by solc.
pub type LinkReferences = BTreeMap<String, BTreeMap<String, Vec<LinkOffset>>>;

#[derive(Deserialize)]
#[serde(untagged)]
enum RawBytecode {
    /// Hardhat: a plain hex string.
    Hex(String),
    /// Foundry: an object with the hex string and its link references.
    Object {
        object: String,
        #[serde(default, rename = "linkReferences")]
        link_references: LinkReferences,
    },
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawArtifact {
    contract_name: Option<String>,
    source_name: Option<String>,
    abi: JsonAbi,
    bytecode: RawBytecode,
    #[serde(default)]
    link_references: LinkReferences,
}

/// A contract as produced by the compiler.
#[derive(Debug, Clone)]
pub struct ContractArtifact {
    pub contract_name: String,
    /// Source file the contract is declared in, e.g. `contracts/Publication.sol`.
    pub source_name: Option<String>,
    pub abi: JsonAbi,
    /// Creation bytecode as hex without the `0x` prefix. Unlinked libraries show up as
    /// `__$...$__` placeholders.
    pub bytecode: String,
    pub link_references: LinkReferences,
    /// File the artifact was loaded from.
    pub path: PathBuf,
}

impl ContractArtifact {
    /// Load an artifact from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw: RawArtifact = FsHandler::read_json(path)
            .with_context(|| format!("Failed to load contract artifact {}", path.display()))?;

        let (bytecode, link_references) = match raw.bytecode {
            RawBytecode::Hex(hex) => (hex, raw.link_references),
            RawBytecode::Object {
                object,
                link_references,
            } => (object, link_references),
        };

        let contract_name = match raw.contract_name {
            Some(name) => name,
            None => path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .map(str::to_string)
                .with_context(|| format!("Cannot infer contract name from {}", path.display()))?,
        };

        Ok(Self {
            contract_name,
            source_name: raw.source_name,
            abi: raw.abi,
            bytecode: bytecode.trim_start_matches("0x").to_string(),
            link_references,
            path: path.to_path_buf(),
        })
    }

    /// `source:Name` when the source file is known, the bare contract name otherwise.
    pub fn fully_qualified_name(&self) -> String {
        match &self.source_name {
            Some(source) => format!("{source}:{}", self.contract_name),
            None => self.contract_name.clone(),
        }
    }

    /// Whether the creation bytecode references libraries that must be linked.
    pub fn needs_linking(&self) -> bool {
        self.link_references.values().any(|libs| !libs.is_empty())
    }

    /// Produce the creation bytecode with every library address substituted.
    ///
    /// Libraries are looked up by `source:Library` first, then by bare `Library` name.
    pub fn link(&self, libraries: &BTreeMap<String, Address>) -> Result<Bytes> {
        if self.bytecode.is_empty() {
            anyhow::bail!(
                "Contract {} has no creation bytecode (abstract contract or interface?)",
                self.contract_name
            );
        }

        let mut code = self.bytecode.clone();
        for (source, libs) in &self.link_references {
            for (library, offsets) in libs {
                let address = libraries
                    .get(&format!("{source}:{library}"))
                    .or_else(|| libraries.get(library))
                    .with_context(|| {
                        format!(
                            "Missing address for library {library} ({source}) required by {}",
                            self.contract_name
                        )
                    })?;
                let address = hex::encode(address.as_slice());

                for offset in offsets {
                    let start = offset.start * 2;
                    let end = start + offset.length * 2;
                    if end > code.len() || offset.length != ADDRESS_LEN {
                        anyhow::bail!(
                            "Invalid link reference for {library} in {} at byte {}",
                            self.contract_name,
                            offset.start
                        );
                    }
                    code.replace_range(start..end, &address);
                }
            }
        }

        let code = hex::decode(&code).with_context(|| {
            format!(
                "Creation bytecode of {} is not valid hex (unlinked library placeholder?)",
                self.contract_name
            )
        })?;

        Ok(code.into())
    }

    /// Coerce the string arguments against the constructor inputs and ABI-encode them.
    pub fn encode_constructor_args(&self, args: &[String]) -> Result<Bytes> {
        let inputs = self
            .abi
            .constructor()
            .map(|constructor| constructor.inputs.as_slice())
            .unwrap_or_default();

        if inputs.len() != args.len() {
            anyhow::bail!(
                "Constructor of {} expects {} argument(s), got {}",
                self.contract_name,
                inputs.len(),
                args.len()
            );
        }

        let values = inputs
            .iter()
            .zip(args)
            .enumerate()
            .map(|(index, (param, arg))| {
                let ty: DynSolType = param.resolve().with_context(|| {
                    format!("Unsupported constructor parameter type {}", param.ty)
                })?;
                ty.coerce_str(arg).with_context(|| {
                    format!(
                        "Constructor argument #{index} ({}) of {}: cannot read {arg:?} as {}",
                        param.name, param.ty, self.contract_name
                    )
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(DynSolValue::Tuple(values).abi_encode_params().into())
    }
}
