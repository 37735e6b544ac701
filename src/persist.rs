//! Durable key/value mirror of the verification cache and move log. Exists
//! only so a full page reload can rebuild the same client state; the
//! in-memory store is always written first, the mirror second.

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::types::{Difficulty, MoveLogEntry};
use crate::verify::VerificationCache;

pub mod keys {
    pub const VERIFICATION_CACHE: &str = "verificationCache";
    pub const VERIFICATION_COMPLETED: &str = "verificationCompleted";
    pub const MOVE_LOG: &str = "moveLog";
    pub const DIFFICULTY: &str = "aiDifficulty";
    pub const HINT_HIDDEN: &str = "gameHintHidden";

    pub const ALL: [&str; 5] = [
        VERIFICATION_CACHE,
        VERIFICATION_COMPLETED,
        MOVE_LOG,
        DIFFICULTY,
        HINT_HIDDEN,
    ];
}

pub trait KvStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str);
    fn remove(&mut self, key: &str);
}

/// In-memory store, used in tests and as a fallback when the browser
/// refuses localStorage access.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: std::collections::BTreeMap<String, String>,
}

impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.entries.insert(key.to_string(), value.to_string());
    }

    fn remove(&mut self, key: &str) {
        self.entries.remove(key);
    }
}

/// Frames a JSON payload with a CRC32 of its bytes so a torn or corrupted
/// mirror entry is detected and ignored instead of deserialized.
pub fn encode_blob<T: Serialize>(value: &T) -> Result<String, String> {
    let json = serde_json::to_string(value).map_err(|e| format!("blob encode failed: {e}"))?;
    let crc = crc32fast::hash(json.as_bytes());
    Ok(format!("{crc:08x}:{json}"))
}

pub fn decode_blob<T: DeserializeOwned>(raw: &str) -> Result<T, String> {
    let (crc_hex, json) = raw
        .split_once(':')
        .ok_or_else(|| "blob missing checksum frame".to_string())?;
    let expected =
        u32::from_str_radix(crc_hex, 16).map_err(|_| "blob checksum is not hex".to_string())?;
    let actual = crc32fast::hash(json.as_bytes());
    if expected != actual {
        return Err(format!(
            "blob checksum mismatch: expected {expected:#010x}, got {actual:#010x}"
        ));
    }
    serde_json::from_str(json).map_err(|e| format!("blob decode failed: {e}"))
}

/// Typed facade over the durable keys.
#[derive(Debug, Default)]
pub struct Mirror<S: KvStore> {
    store: S,
}

impl<S: KvStore> Mirror<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn save_cache(&mut self, cache: &VerificationCache) {
        self.save_blob(keys::VERIFICATION_CACHE, cache);
    }

    pub fn load_cache(&self) -> Option<VerificationCache> {
        self.load_blob(keys::VERIFICATION_CACHE)
    }

    pub fn set_verification_completed(&mut self, completed: bool) {
        if completed {
            self.store.set(keys::VERIFICATION_COMPLETED, "true");
        } else {
            self.store.remove(keys::VERIFICATION_COMPLETED);
        }
    }

    pub fn verification_completed(&self) -> bool {
        self.store
            .get(keys::VERIFICATION_COMPLETED)
            .is_some_and(|v| v == "true")
    }

    pub fn save_move_log(&mut self, log: &[MoveLogEntry]) {
        self.save_blob(keys::MOVE_LOG, &log.to_vec());
    }

    pub fn load_move_log(&self) -> Vec<MoveLogEntry> {
        self.load_blob(keys::MOVE_LOG).unwrap_or_default()
    }

    pub fn save_difficulty(&mut self, difficulty: Difficulty) {
        self.store.set(keys::DIFFICULTY, difficulty.as_str());
    }

    pub fn load_difficulty(&self) -> Difficulty {
        self.store
            .get(keys::DIFFICULTY)
            .and_then(|v| Difficulty::from_name(&v))
            .unwrap_or_default()
    }

    pub fn set_hint_hidden(&mut self, hidden: bool) {
        self.store
            .set(keys::HINT_HIDDEN, if hidden { "true" } else { "false" });
    }

    pub fn hint_hidden(&self) -> bool {
        self.store
            .get(keys::HINT_HIDDEN)
            .is_some_and(|v| v == "true")
    }

    /// Restart or forced-restart difficulty change wipes the whole mirror.
    pub fn clear_all(&mut self) {
        for key in keys::ALL {
            self.store.remove(key);
        }
    }

    fn save_blob<T: Serialize>(&mut self, key: &str, value: &T) {
        match encode_blob(value) {
            Ok(blob) => self.store.set(key, &blob),
            Err(err) => log::error!("failed to mirror {key}: {err}"),
        }
    }

    fn load_blob<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.store.get(key)?;
        match decode_blob(&raw) {
            Ok(value) => Some(value),
            Err(err) => {
                log::warn!("ignoring mirrored {key}: {err}");
                None
            }
        }
    }
}

/// Browser-backed store. Failures degrade to no-ops with a logged warning;
/// persistence is best-effort by design.
#[cfg(target_arch = "wasm32")]
pub struct LocalStorage {
    storage: Option<web_sys::Storage>,
}

#[cfg(target_arch = "wasm32")]
impl LocalStorage {
    pub fn open() -> Self {
        let storage = web_sys::window().and_then(|w| w.local_storage().ok().flatten());
        if storage.is_none() {
            log::warn!("localStorage unavailable; state will not survive reloads");
        }
        Self { storage }
    }
}

#[cfg(target_arch = "wasm32")]
impl KvStore for LocalStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.storage.as_ref()?.get_item(key).ok().flatten()
    }

    fn set(&mut self, key: &str, value: &str) {
        if let Some(storage) = &self.storage {
            if storage.set_item(key, value).is_err() {
                log::warn!("failed to persist {key}");
            }
        }
    }

    fn remove(&mut self, key: &str) {
        if let Some(storage) = &self.storage {
            let _ = storage.remove_item(key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Position;
    use crate::verify::{PropertyKey, PropertyResult, PropertyStatus, VerificationReport};

    fn mirror() -> Mirror<MemoryStore> {
        Mirror::new(MemoryStore::default())
    }

    #[test]
    fn blob_round_trips() {
        let log = vec![
            MoveLogEntry {
                human: Some(Position::new(2, 3)),
                ai: Some(Position::new(2, 2)),
            },
            MoveLogEntry {
                human: Some(Position::new(4, 5)),
                ai: None,
            },
        ];
        let blob = encode_blob(&log).unwrap();
        let back: Vec<MoveLogEntry> = decode_blob(&blob).unwrap();
        assert_eq!(back, log);
    }

    #[test]
    fn corrupted_blob_is_rejected() {
        let blob = encode_blob(&vec![MoveLogEntry::default()]).unwrap();
        let tampered = blob.replace("null", "[9,");
        assert!(decode_blob::<Vec<MoveLogEntry>>(&tampered).is_err());
        assert!(decode_blob::<Vec<MoveLogEntry>>("not a blob at all").is_err());
    }

    #[test]
    fn move_log_reload_preserves_order() {
        let mut mirror = mirror();
        let log: Vec<MoveLogEntry> = (0..10)
            .map(|i| MoveLogEntry {
                human: Some(Position::new(i, 0)),
                ai: Some(Position::new(i, 1)),
            })
            .collect();
        mirror.save_move_log(&log);
        assert_eq!(mirror.load_move_log(), log);
    }

    #[test]
    fn verification_cache_survives_the_mirror() {
        let mut mirror = mirror();
        let mut cache = VerificationCache::default();
        let mut report = VerificationReport::default();
        report.insert(
            PropertyKey::Termination,
            PropertyResult {
                status: PropertyStatus::Pending,
                details: "game in progress".to_string(),
                flipped_discs: None,
            },
        );
        cache.merge(&report, None);

        mirror.save_cache(&cache);
        assert_eq!(mirror.load_cache(), Some(cache));
    }

    #[test]
    fn completed_flag_defaults_to_false() {
        let mut mirror = mirror();
        assert!(!mirror.verification_completed());

        mirror.set_verification_completed(true);
        assert!(mirror.verification_completed());

        mirror.set_verification_completed(false);
        assert!(!mirror.verification_completed());
    }

    #[test]
    fn clear_all_wipes_every_key() {
        let mut mirror = mirror();
        mirror.save_move_log(&[MoveLogEntry::default()]);
        mirror.set_verification_completed(true);
        mirror.save_difficulty(Difficulty::Hard);
        mirror.set_hint_hidden(true);

        mirror.clear_all();

        assert!(mirror.load_move_log().is_empty());
        assert!(!mirror.verification_completed());
        assert_eq!(mirror.load_difficulty(), Difficulty::Easy);
        assert!(!mirror.hint_hidden());
    }

    #[test]
    fn garbage_in_store_is_ignored() {
        let mut store = MemoryStore::default();
        store.set(keys::VERIFICATION_CACHE, "deadbeef:{not json}");
        let mirror = Mirror::new(store);
        assert_eq!(mirror.load_cache(), None);
    }
}
