//! Volume History Store
//!
//! Rolling 24-hour volume samples per market, persisted as JSON like the
//! known-markets store. A volume spike (current 24h volume well above the
//! historical average) usually means new information entering the market
//! and often precedes price movement. The store is injected into the scan
//! loop; tests can supply a fresh or pre-seeded instance.

use crate::types::Market;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Rolling samples kept per market (~7 days at a 6-hour cadence).
const MAX_SAMPLES: usize = 30;
/// Markets below this 24h volume are never flagged.
const MIN_VOLUME_USD: f64 = 1000.0;
/// Samples needed before the stored history is a usable baseline.
const MIN_SAMPLES_FOR_BASELINE: usize = 2;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct VolumeSample {
    volume_24h: f64,
    recorded_at: DateTime<Utc>,
}

/// A market whose current 24h volume clears the spike threshold.
#[derive(Debug, Clone, Serialize)]
pub struct VolumeSpike {
    pub market_id: String,
    pub question: String,
    pub current_volume_24h: f64,
    pub average_volume: f64,
    pub spike_multiplier: f64,
    pub percent_increase: f64,
    pub detected_at: DateTime<Utc>,
}

/// File-backed per-market volume history.
pub struct VolumeHistory {
    path: PathBuf,
    entries: HashMap<String, Vec<VolumeSample>>,
}

impl VolumeHistory {
    /// Load the store, starting fresh if the file is missing or unreadable.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let entries = match fs::read_to_string(&path) {
            Ok(data) => match serde_json::from_str::<HashMap<String, Vec<VolumeSample>>>(&data) {
                Ok(entries) => {
                    info!(markets = entries.len(), "Loaded volume history");
                    entries
                }
                Err(e) => {
                    warn!(error = %e, "Volume history unreadable, starting fresh");
                    HashMap::new()
                }
            },
            Err(_) => HashMap::new(),
        };
        Self { path, entries }
    }

    /// Average of the stored samples for one market, once enough exist.
    fn baseline(&self, market_id: &str) -> Option<f64> {
        let samples = self.entries.get(market_id)?;
        if samples.len() < MIN_SAMPLES_FOR_BASELINE {
            return None;
        }
        let sum: f64 = samples.iter().map(|s| s.volume_24h).sum();
        Some(sum / samples.len() as f64)
    }

    fn record(&mut self, market_id: &str, volume_24h: f64, now: DateTime<Utc>) {
        let samples = self.entries.entry(market_id.to_string()).or_default();
        samples.push(VolumeSample {
            volume_24h,
            recorded_at: now,
        });
        if samples.len() > MAX_SAMPLES {
            let excess = samples.len() - MAX_SAMPLES;
            samples.drain(..excess);
        }
    }

    /// Record the current volumes and return spiking markets.
    ///
    /// The baseline is the stored-sample average; before enough samples
    /// accumulate, the weekly volume divided by seven stands in. The
    /// current reading is recorded after the baseline is taken so a spike
    /// does not dilute the average it is measured against. Markets with no
    /// volume data contribute nothing.
    pub fn observe(&mut self, markets: &[Market], min_spike_multiplier: f64) -> Vec<VolumeSpike> {
        let now = Utc::now();
        let mut spikes = Vec::new();

        for market in markets {
            let volume_24h = match market.volume_24h {
                Some(v) if v.is_finite() && v >= 0.0 => v,
                _ => continue,
            };

            let baseline = self
                .baseline(&market.id)
                .or_else(|| market.volume_1wk.filter(|w| w.is_finite()).map(|w| w / 7.0))
                .filter(|avg| *avg > 0.0);

            self.record(&market.id, volume_24h, now);

            let average_volume = match baseline {
                Some(avg) => avg,
                None => continue,
            };
            if volume_24h < MIN_VOLUME_USD {
                continue;
            }

            let spike_multiplier = volume_24h / average_volume;
            if spike_multiplier < min_spike_multiplier {
                continue;
            }

            spikes.push(VolumeSpike {
                market_id: market.id.clone(),
                question: market.question.clone(),
                current_volume_24h: volume_24h,
                average_volume,
                spike_multiplier,
                percent_increase: (volume_24h - average_volume) / average_volume * 100.0,
                detected_at: now,
            });
        }

        spikes.sort_by(|a, b| {
            b.spike_multiplier
                .partial_cmp(&a.spike_multiplier)
                .unwrap_or(Ordering::Equal)
        });
        spikes
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Token;

    fn market(id: &str, volume_24h: Option<f64>, volume_1wk: Option<f64>) -> Market {
        Market {
            id: id.to_string(),
            question: format!("Question {}?", id),
            active: true,
            closed: false,
            accepting_orders: true,
            tokens: vec![
                Token {
                    token_id: format!("{}-a", id),
                    outcome: "Yes".to_string(),
                    price: Some(0.5),
                },
                Token {
                    token_id: format!("{}-b", id),
                    outcome: "No".to_string(),
                    price: Some(0.5),
                },
            ],
            volume_24h,
            volume_1wk,
        }
    }

    #[test]
    fn test_weekly_volume_is_the_cold_start_baseline() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = VolumeHistory::load(dir.path().join("volume.json"));

        // 5000 against 7000/7 = 1000 average: 5x spike
        let spikes = store.observe(&[market("m1", Some(5000.0), Some(7000.0))], 2.0);
        assert_eq!(spikes.len(), 1);
        assert_eq!(spikes[0].market_id, "m1");
        assert!((spikes[0].average_volume - 1000.0).abs() < 1e-9);
        assert!((spikes[0].spike_multiplier - 5.0).abs() < 1e-9);
        assert!((spikes[0].percent_increase - 400.0).abs() < 1e-9);
    }

    #[test]
    fn test_stored_history_beats_weekly_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = VolumeHistory::load(dir.path().join("volume.json"));

        // Two quiet passes build a 1000 baseline
        store.observe(&[market("m1", Some(1000.0), None)], 2.0);
        store.observe(&[market("m1", Some(1000.0), None)], 2.0);

        // A misleadingly large weekly figure must not mask the spike
        let spikes = store.observe(&[market("m1", Some(3000.0), Some(70000.0))], 2.0);
        assert_eq!(spikes.len(), 1);
        assert!((spikes[0].average_volume - 1000.0).abs() < 1e-9);
        assert!((spikes[0].spike_multiplier - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_below_multiplier_or_minimum_volume_is_quiet() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = VolumeHistory::load(dir.path().join("volume.json"));

        // 1.5x is under the 2x threshold
        let spikes = store.observe(&[market("m1", Some(1500.0), Some(7000.0))], 2.0);
        assert!(spikes.is_empty());

        // 10x but only $500 of volume
        let spikes = store.observe(&[market("m2", Some(500.0), Some(350.0))], 2.0);
        assert!(spikes.is_empty());

        // No volume data at all
        let spikes = store.observe(&[market("m3", None, None)], 2.0);
        assert!(spikes.is_empty());
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_spikes_sorted_by_multiplier() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = VolumeHistory::load(dir.path().join("volume.json"));

        let spikes = store.observe(
            &[
                market("m1", Some(3000.0), Some(7000.0)),
                market("m2", Some(9000.0), Some(7000.0)),
            ],
            2.0,
        );
        assert_eq!(spikes.len(), 2);
        assert_eq!(spikes[0].market_id, "m2");
        assert!(spikes[0].spike_multiplier > spikes[1].spike_multiplier);
    }

    #[test]
    fn test_history_is_capped_per_market() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = VolumeHistory::load(dir.path().join("volume.json"));

        for _ in 0..40 {
            store.observe(&[market("m1", Some(1000.0), None)], 2.0);
        }
        assert_eq!(store.entries["m1"].len(), 30);
    }

    #[test]
    fn test_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("volume.json");
        {
            let mut store = VolumeHistory::load(&path);
            store.observe(&[market("m1", Some(1000.0), None)], 2.0);
            store.observe(&[market("m1", Some(1200.0), None)], 2.0);
            store.save().unwrap();
        }
        let store = VolumeHistory::load(&path);
        assert_eq!(store.len(), 1);
        // The reloaded baseline averages the two stored samples
        assert!((store.baseline("m1").unwrap() - 1100.0).abs() < 1e-9);
    }

    #[test]
    fn test_corrupt_file_starts_fresh() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("volume.json");
        fs::write(&path, "not json").unwrap();

        let store = VolumeHistory::load(&path);
        assert!(store.is_empty());
    }
}
