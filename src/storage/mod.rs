//! Local storage for commitment records
//!
//! One record per token, persisted as a JSON snapshot. Records are only
//! written through the provider, which enforces the write-once rules.

use crate::error::RevealError;
use crate::protocol::{CommitmentState, SeedCommitment};
use crate::seed::TokenId;
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitmentStore {
    records: BTreeMap<TokenId, SeedCommitment>,
    pub path: Option<PathBuf>,
    pub metadata: StoreMetadata,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreMetadata {
    pub owner: String,
    pub created_at: String,
}

impl Default for CommitmentStore {
    fn default() -> Self {
        Self::new("local")
    }
}

impl CommitmentStore {
    /// In-memory store
    pub fn new(owner: &str) -> Self {
        Self {
            records: BTreeMap::new(),
            path: None,
            metadata: StoreMetadata {
                owner: owner.to_string(),
                created_at: chrono::Utc::now().to_rfc3339(),
            },
        }
    }

    /// Load the snapshot at `path`, or start an empty store bound to it
    pub fn open(path: impl AsRef<Path>, owner: &str) -> Result<Self, RevealError> {
        let path = path.as_ref().to_path_buf();
        if path.exists() {
            let data = std::fs::read_to_string(&path)?;
            let mut store: CommitmentStore = serde_json::from_str(&data)?;
            store.path = Some(path);
            info!("Opened commitment store: {}", store.summary());
            return Ok(store);
        }
        Ok(Self {
            path: Some(path),
            ..Self::new(owner)
        })
    }

    pub fn save(&self) -> Result<(), RevealError> {
        let path = self
            .path
            .as_ref()
            .ok_or_else(|| RevealError::Storage("store has no path".to_string()))?;
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn get(&self, token_id: TokenId) -> Option<&SeedCommitment> {
        self.records.get(&token_id)
    }

    pub(crate) fn put(&mut self, record: SeedCommitment) {
        self.records.insert(record.token_id, record);
    }

    pub fn count(&self) -> usize {
        self.records.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SeedCommitment> {
        self.records.values()
    }

    pub fn list_by_state(&self, state: CommitmentState) -> Vec<&SeedCommitment> {
        self.records.values().filter(|r| r.state() == state).collect()
    }

    pub fn summary(&self) -> String {
        let finalized = self.records.values().filter(|r| r.is_finalized()).count();
        format!(
            "CommitmentStore '{}' | {} tokens | {} finalized | {} pending",
            self.metadata.owner,
            self.records.len(),
            finalized,
            self.records.len() - finalized
        )
    }
}
