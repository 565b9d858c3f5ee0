//! Known Markets Store
//!
//! Tracks which markets have been seen before so the scan loop can flag
//! newly listed ones: fresh markets are often mispriced before the crowd
//! finds them. State is an explicit store object loaded from and saved to a
//! JSON file, injected into the loop so tests can supply a fresh or
//! pre-seeded instance.

use crate::types::Market;
use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Entries older than this are pruned from the store.
const RETENTION_DAYS: i64 = 30;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct KnownEntry {
    question: String,
    first_seen: DateTime<Utc>,
}

/// A market observed for the first time in the most recent pass.
#[derive(Debug, Clone, Serialize)]
pub struct NewMarket {
    pub market_id: String,
    pub question: String,
    pub discovered_at: DateTime<Utc>,
}

/// Dedup store of every market ID ever observed.
pub struct KnownMarkets {
    path: PathBuf,
    entries: HashMap<String, KnownEntry>,
}

impl KnownMarkets {
    /// Load the store, starting fresh if the file is missing or unreadable.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let entries = match fs::read_to_string(&path) {
            Ok(data) => match serde_json::from_str::<HashMap<String, KnownEntry>>(&data) {
                Ok(entries) => {
                    info!(known = entries.len(), "Loaded known markets");
                    entries
                }
                Err(e) => {
                    warn!(error = %e, "Known-markets file unreadable, starting fresh");
                    HashMap::new()
                }
            },
            Err(_) => HashMap::new(),
        };
        Self { path, entries }
    }

    /// Record the current universe and return markets never seen before.
    ///
    /// Also prunes entries past retention so the file stays bounded.
    pub fn observe(&mut self, markets: &[Market]) -> Vec<NewMarket> {
        let now = Utc::now();
        let mut fresh = Vec::new();

        for market in markets {
            if self.entries.contains_key(&market.id) {
                continue;
            }
            self.entries.insert(
                market.id.clone(),
                KnownEntry {
                    question: market.question.clone(),
                    first_seen: now,
                },
            );
            fresh.push(NewMarket {
                market_id: market.id.clone(),
                question: market.question.clone(),
                discovered_at: now,
            });
        }

        let cutoff = now - Duration::days(RETENTION_DAYS);
        self.entries.retain(|_, entry| entry.first_seen >= cutoff);

        fresh
    }

    /// Persist the store to disk.
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let data = serde_json::to_string_pretty(&self.entries)?;
        fs::write(&self.path, data)
            .with_context(|| format!("Failed to write {}", self.path.display()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
