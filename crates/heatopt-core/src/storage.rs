// Copyright (c) 2026 Heatopt Contributors
//
// This file is part of heatopt-core.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.

//! C13 — Bounded Storage.
//!
//! Every persisted blob lives under one of the reserved, non-colliding
//! keys below (spec §4.13). The host supplies the actual key-value
//! backend through [`KeyValueStore`]; this module only owns the key
//! catalogue, the size-check-before-write discipline, and the first-boot
//! migration away from the legacy shared key.

use async_trait::async_trait;
use heatopt_types::error::CoreError;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Entry cap for the optimization-history ring (spec §3).
pub const MAX_OPTIMIZATION_HISTORY_ENTRIES: usize = 500;
/// Serialized-size cap for the optimization-history ring (spec §3).
pub const MAX_OPTIMIZATION_HISTORY_BYTES: usize = 500 * 1024;

pub const KEY_THERMAL_SAMPLES: &str = "thermal_samples";
pub const KEY_THERMAL_AGGREGATED: &str = "thermal_aggregated";
pub const KEY_THERMAL_CHARACTERISTICS: &str = "thermal_characteristics";
pub const KEY_ADAPTIVE_PARAMETERS: &str = "adaptive_parameters";
pub const KEY_HOT_WATER_SAMPLES: &str = "hot_water_samples";
pub const KEY_HOT_WATER_AGGREGATED: &str = "hot_water_aggregated";
pub const KEY_HOT_WATER_PATTERN: &str = "hot_water_pattern";
pub const KEY_COP_DAILY: &str = "cop_daily";
pub const KEY_COP_WEEKLY: &str = "cop_weekly";
pub const KEY_COP_MONTHLY: &str = "cop_monthly";
pub const KEY_OPTIMIZATION_HISTORY: &str = "optimization_history";
pub const KEY_PRICE_CACHE: &str = "price_cache";
pub const KEY_FX_CACHE: &str = "fx_cache";

/// The legacy key the source system shared between optimizer history and
/// thermal samples (spec §4.13, §9). On first boot any blob still stored
/// under it is migrated to [`KEY_OPTIMIZATION_HISTORY`], which is the
/// shape that previously collided.
pub const LEGACY_SHARED_KEY: &str = "optimizer_state";

pub const RESERVED_KEYS: &[&str] = &[
    KEY_THERMAL_SAMPLES,
    KEY_THERMAL_AGGREGATED,
    KEY_THERMAL_CHARACTERISTICS,
    KEY_ADAPTIVE_PARAMETERS,
    KEY_HOT_WATER_SAMPLES,
    KEY_HOT_WATER_AGGREGATED,
    KEY_HOT_WATER_PATTERN,
    KEY_COP_DAILY,
    KEY_COP_WEEKLY,
    KEY_COP_MONTHLY,
    KEY_OPTIMIZATION_HISTORY,
    KEY_PRICE_CACHE,
    KEY_FX_CACHE,
];

pub fn reserved_keys_are_disjoint() -> bool {
    let mut seen = std::collections::HashSet::new();
    RESERVED_KEYS.iter().all(|k| seen.insert(*k))
}

/// Host-provided key-value persistence (spec §6): atomic get/set/delete,
/// size-bounded by the host to roughly 1 MB total.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CoreError>;
    async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), CoreError>;
    async fn delete(&self, key: &str) -> Result<(), CoreError>;
}

/// Migrates any blob found under [`LEGACY_SHARED_KEY`] to
/// [`KEY_OPTIMIZATION_HISTORY`], run once on first boot.
pub async fn migrate_legacy_key(store: &dyn KeyValueStore) -> Result<bool, CoreError> {
    let Some(legacy) = store.get(LEGACY_SHARED_KEY).await? else {
        return Ok(false);
    };
    if store.get(KEY_OPTIMIZATION_HISTORY).await?.is_none() {
        store.set(KEY_OPTIMIZATION_HISTORY, legacy).await?;
    }
    store.delete(LEGACY_SHARED_KEY).await?;
    Ok(true)
}

/// Appends `item` to the JSON-encoded list stored under `existing`,
/// shedding the oldest entries until both `max_entries` and `max_bytes`
/// are satisfied, and returns the re-serialized bytes ready to write back
/// (spec §3, §4.13 step 8). `existing` is the raw blob previously read
/// from the key, or `None` on first write.
pub fn append_capped<T>(
    existing: Option<&[u8]>,
    item: T,
    max_entries: usize,
    max_bytes: usize,
) -> Result<Vec<u8>, CoreError>
where
    T: Serialize + DeserializeOwned,
{
    let mut items: Vec<T> = match existing {
        Some(bytes) if !bytes.is_empty() => serde_json::from_slice(bytes).unwrap_or_default(),
        _ => Vec::new(),
    };
    items.push(item);
    while items.len() > max_entries {
        items.remove(0);
    }

    let mut serialized = serde_json::to_vec(&items)?;
    while serialized.len() > max_bytes && items.len() > 1 {
        items.remove(0);
        serialized = serde_json::to_vec(&items)?;
    }
    Ok(serialized)
}

/// A bounded, size-checked collection backing one reserved key's ring.
/// Oldest entries are shed first when a write would exceed `cap`.
pub struct BoundedRing<T> {
    cap: usize,
    items: std::collections::VecDeque<T>,
}

impl<T> BoundedRing<T> {
    pub fn new(cap: usize) -> Self {
        Self {
            cap,
            items: std::collections::VecDeque::new(),
        }
    }

    pub fn push(&mut self, item: T) {
        self.items.push_back(item);
        while self.items.len() > self.cap {
            self.items.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::HashMap;

    #[derive(Default)]
    struct InMemoryStore {
        data: Mutex<HashMap<String, Vec<u8>>>,
    }

    #[async_trait]
    impl KeyValueStore for InMemoryStore {
        async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CoreError> {
            Ok(self.data.lock().get(key).cloned())
        }

        async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), CoreError> {
            self.data.lock().insert(key.to_string(), value);
            Ok(())
        }

        async fn delete(&self, key: &str) -> Result<(), CoreError> {
            self.data.lock().remove(key);
            Ok(())
        }
    }

    #[test]
    fn no_key_collision_among_reserved_keys() {
        assert!(reserved_keys_are_disjoint());
    }

    #[tokio::test]
    async fn write_to_one_key_never_mutates_another() {
        let store = InMemoryStore::default();
        store
            .set(KEY_THERMAL_CHARACTERISTICS, b"thermal".to_vec())
            .await
            .unwrap();
        store
            .set(KEY_ADAPTIVE_PARAMETERS, b"adaptive".to_vec())
            .await
            .unwrap();
        assert_eq!(
            store.get(KEY_THERMAL_CHARACTERISTICS).await.unwrap(),
            Some(b"thermal".to_vec())
        );
        assert_eq!(
            store.get(KEY_ADAPTIVE_PARAMETERS).await.unwrap(),
            Some(b"adaptive".to_vec())
        );
    }

    #[tokio::test]
    async fn legacy_key_migrates_to_optimization_history_on_first_boot() {
        let store = InMemoryStore::default();
        store
            .set(LEGACY_SHARED_KEY, b"legacy-blob".to_vec())
            .await
            .unwrap();
        let migrated = migrate_legacy_key(&store).await.unwrap();
        assert!(migrated);
        assert_eq!(
            store.get(KEY_OPTIMIZATION_HISTORY).await.unwrap(),
            Some(b"legacy-blob".to_vec())
        );
        assert!(store.get(LEGACY_SHARED_KEY).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn migration_is_a_no_op_when_legacy_key_absent() {
        let store = InMemoryStore::default();
        let migrated = migrate_legacy_key(&store).await.unwrap();
        assert!(!migrated);
    }

    #[test]
    fn bounded_ring_sheds_oldest_past_capacity() {
        let mut ring: BoundedRing<i32> = BoundedRing::new(3);
        for i in 0..10 {
            ring.push(i);
        }
        assert_eq!(ring.len(), 3);
        assert_eq!(ring.iter().copied().collect::<Vec<_>>(), vec![7, 8, 9]);
    }

    #[test]
    fn append_capped_sheds_oldest_past_the_entry_cap() {
        let mut blob: Option<Vec<u8>> = None;
        for i in 0..5 {
            blob = Some(append_capped(blob.as_deref(), i, 3, usize::MAX).unwrap());
        }
        let items: Vec<i32> = serde_json::from_slice(&blob.unwrap()).unwrap();
        assert_eq!(items, vec![2, 3, 4]);
    }

    #[test]
    fn append_capped_sheds_oldest_past_the_byte_cap() {
        let mut blob: Option<Vec<u8>> = None;
        for i in 0..20 {
            blob = Some(append_capped(blob.as_deref(), format!("entry-{i}"), usize::MAX, 40).unwrap());
        }
        let bytes = blob.unwrap();
        assert!(bytes.len() <= 40, "serialized history should respect the byte cap, got {}", bytes.len());
        let items: Vec<String> = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(items.last().unwrap(), "entry-19");
    }

    #[test]
    fn append_capped_starts_fresh_on_corrupt_existing_blob() {
        let result = append_capped(Some(b"not json"), 1, 10, usize::MAX).unwrap();
        let items: Vec<i32> = serde_json::from_slice(&result).unwrap();
        assert_eq!(items, vec![1]);
    }
}
