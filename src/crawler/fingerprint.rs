//! Near-duplicate detection.
//!
//! Pages are fingerprinted with a 64-bit SimHash over word 3-grams. Two pages
//! are near-duplicates when their fingerprints agree on enough bits.

use std::collections::HashMap;

use log2::debug;
use xxhash_rust::xxh3::xxh3_64;

const SHINGLE_SIZE: usize = 3;

/// SimHash fingerprint of page text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SimHash(pub u64);

impl SimHash {
    /// Fingerprint `text`, or `None` when it holds no words
    pub fn compute(text: &str) -> Option<Self> {
        let words: Vec<String> = text
            .split_whitespace()
            .map(|w| w.to_lowercase())
            .collect();
        if words.is_empty() {
            return None;
        }

        let features: Vec<String> = if words.len() < SHINGLE_SIZE {
            words
        } else {
            words.windows(SHINGLE_SIZE).map(|w| w.join(" ")).collect()
        };

        let mut weights = [0i64; 64];
        for feature in &features {
            let hash = feature_hash(feature);
            for (bit, weight) in weights.iter_mut().enumerate() {
                if hash & (1 << bit) != 0 {
                    *weight += 1;
                } else {
                    *weight -= 1;
                }
            }
        }

        let fingerprint = weights
            .iter()
            .enumerate()
            .filter(|(_, w)| **w > 0)
            .fold(0u64, |acc, (bit, _)| acc | (1 << bit));
        Some(SimHash(fingerprint))
    }

    pub fn hamming_distance(&self, other: &SimHash) -> u32 {
        (self.0 ^ other.0).count_ones()
    }

    /// Share of matching bits, 1.0 for identical fingerprints
    pub fn similarity(&self, other: &SimHash) -> f64 {
        1.0 - f64::from(self.hamming_distance(other)) / 64.0
    }
}

fn feature_hash(feature: &str) -> u64 {
    xxh3_64(feature.as_bytes())
}

/// Fingerprints of every accepted page, keyed by URL. Never pruned.
#[derive(Debug, Default)]
pub struct FingerprintRegistry {
    fingerprints: HashMap<String, SimHash>,
}

impl FingerprintRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, url: &str, fingerprint: SimHash) {
        self.fingerprints.insert(url.to_string(), fingerprint);
    }

    /// URL of the first registered page at least `threshold` similar
    pub fn find_similar(&self, fingerprint: &SimHash, threshold: f64) -> Option<&str> {
        self.fingerprints
            .iter()
            .find(|(_, seen)| fingerprint.similarity(seen) >= threshold)
            .map(|(url, _)| url.as_str())
    }

    /// Registers `text` under `url` unless it is empty or a near-duplicate
    pub fn check_and_register(&mut self, url: &str, text: &str, threshold: f64) -> bool {
        let Some(fingerprint) = SimHash::compute(text) else {
            debug!("No text to fingerprint on {}", url);
            return false;
        };
        if self.is_near_duplicate(url, &fingerprint, threshold) {
            return false;
        }
        self.register(url, fingerprint);
        true
    }

    fn is_near_duplicate(&self, url: &str, fingerprint: &SimHash, threshold: f64) -> bool {
        match self.find_similar(fingerprint, threshold) {
            Some(seen) => {
                debug!("{} is a near-duplicate of {}", url, seen);
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.fingerprints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fingerprints.is_empty()
    }
}

/// Returns `false` when `text` is empty or close to an already registered page.
/// On `true` the caller registers the page.
pub fn check_similarity(
    url: &str,
    text: &str,
    registry: &FingerprintRegistry,
    threshold: f64,
) -> bool {
    let Some(fingerprint) = SimHash::compute(text) else {
        debug!("No text to fingerprint on {}", url);
        return false;
    };
    !registry.is_near_duplicate(url, &fingerprint, threshold)
}
