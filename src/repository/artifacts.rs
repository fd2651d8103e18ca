//! Compiled contract artifacts, looked up by contract name.
//!
//! Both the Hardhat layout (`artifacts/contracts/Foo.sol/Foo.json` with a
//! `contractName` and a hex `bytecode` string) and the Foundry layout
//! (`out/Foo.sol/Foo.json` with `bytecode.object`) are understood.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use alloy::primitives::Bytes;
use serde::Deserialize;

use super::RepoResult;
use super::error::RepositoryError;

/// Directory names that never contain contract artifacts.
const SKIPPED_DIRS: [&str; 2] = ["build-info", "cache"];

#[derive(Debug, Deserialize)]
struct ArtifactFile {
    #[serde(rename = "contractName")]
    contract_name: Option<String>,
    bytecode: Option<BytecodeField>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum BytecodeField {
    Hex(String),
    Object { object: String },
}

impl BytecodeField {
    fn hex(&self) -> &str {
        match self {
            BytecodeField::Hex(hex) => hex,
            BytecodeField::Object { object } => object,
        }
    }
}

/// Creation bytecode of compiled contracts, keyed by contract name.
#[derive(Debug, Clone, Default)]
pub struct ArtifactStore {
    bytecode: HashMap<String, Bytes>,
}

impl ArtifactStore {
    /// Recursively loads every artifact under `dir`.
    ///
    /// Files that are not artifacts (debug files, build info, other JSON) are
    /// skipped. When two artifacts share a name the first one found wins.
    pub fn load(dir: impl AsRef<Path>) -> RepoResult<Self> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(RepositoryError::ArtifactNotFound(format!(
                "artifact directory {} does not exist",
                dir.display()
            )));
        }

        let mut store = Self::default();
        store.load_dir(dir)?;

        tracing::info!(
            "Loaded {} contract artifacts from {}",
            store.len(),
            dir.display()
        );
        Ok(store)
    }

    /// Builds a store from already known bytecode.
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, Bytes)>,
        S: Into<String>,
    {
        Self {
            bytecode: entries
                .into_iter()
                .map(|(name, code)| (name.into(), code))
                .collect(),
        }
    }

    /// Returns the creation bytecode of `name`.
    pub fn bytecode(&self, name: &str) -> RepoResult<Bytes> {
        let code = self.bytecode.get(name).ok_or_else(|| {
            RepositoryError::ArtifactNotFound(format!(
                "{name} (known contracts: {})",
                self.contract_names().join(", ")
            ))
        })?;

        if code.is_empty() {
            return Err(RepositoryError::ArtifactNotFound(format!(
                "{name} has no creation bytecode (abstract contract or interface?)"
            )));
        }

        Ok(code.clone())
    }

    /// Names of all loaded contracts, sorted alphabetically.
    pub fn contract_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.bytecode.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.bytecode.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytecode.is_empty()
    }

    fn load_dir(&mut self, dir: &Path) -> RepoResult<()> {
        let entries = fs::read_dir(dir).map_err(|e| {
            RepositoryError::Other(format!("Failed to read {}: {e}", dir.display()))
        })?;

        for entry in entries {
            let path = entry
                .map_err(|e| RepositoryError::Other(format!("Failed to read entry: {e}")))?
                .path();

            if path.is_dir() {
                let skipped = path
                    .file_name()
                    .and_then(|name| name.to_str())
                    .is_some_and(|name| SKIPPED_DIRS.contains(&name));
                if !skipped {
                    self.load_dir(&path)?;
                }
                continue;
            }

            let Some(file_name) = path.file_name().and_then(|name| name.to_str()) else {
                continue;
            };
            if !file_name.ends_with(".json") || file_name.ends_with(".dbg.json") {
                continue;
            }

            self.load_file(&path)?;
        }

        Ok(())
    }

    fn load_file(&mut self, path: &Path) -> RepoResult<()> {
        let content = fs::read_to_string(path).map_err(|e| {
            RepositoryError::Other(format!("Failed to read {}: {e}", path.display()))
        })?;

        let Ok(artifact) = serde_json::from_str::<ArtifactFile>(&content) else {
            tracing::debug!("Skipping non-artifact JSON file {}", path.display());
            return Ok(());
        };
        let Some(bytecode) = artifact.bytecode else {
            return Ok(());
        };

        let name = match artifact.contract_name {
            Some(name) => name,
            None => match path.file_stem().and_then(|stem| stem.to_str()) {
                Some(stem) => stem.to_string(),
                None => return Ok(()),
            },
        };

        let hex = bytecode.hex();
        let code = if hex.is_empty() || hex == "0x" {
            Bytes::new()
        } else {
            match Bytes::from_str(hex) {
                Ok(code) => code,
                Err(e) => {
                    // unlinked library placeholders are not valid hex
                    tracing::warn!("Skipping artifact {name} with unusable bytecode: {e}");
                    return Ok(());
                }
            }
        };

        if self.bytecode.contains_key(&name) {
            tracing::warn!(
                "Duplicate artifact for {name} at {}, keeping the first one",
                path.display()
            );
            return Ok(());
        }

        self.bytecode.insert(name, code);
        Ok(())
    }
}
