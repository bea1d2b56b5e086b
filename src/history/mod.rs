// Generation history store
//
// Records live in a single JSON document keyed by user id. Writes go
// through the atomic file layer; retention keeps only the ten most
// recent records per user.

use log::{info, warn};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use crate::error::HistoryError;
use crate::file_manager::{initialize_json_file, read_json_file_or_default, update_json_file};
use crate::models::{AuthUser, GenerationPatch, GenerationRecord};
use crate::utils::get_history_json_path;

pub const HISTORY_LIMIT: usize = 10;

/// Supplies the currently signed-in user, if any. The embedding host
/// owns sign-in; the engine only asks who is there right now.
pub trait IdentityProvider: Send + Sync {
    fn current_user(&self) -> Option<AuthUser>;
}

/// Fixed identity handle for hosts that resolve sign-in up front.
pub struct StaticIdentity {
    user: Option<AuthUser>,
}

impl StaticIdentity {
    pub fn signed_in(user: AuthUser) -> Self {
        Self { user: Some(user) }
    }

    pub fn signed_out() -> Self {
        Self { user: None }
    }
}

impl IdentityProvider for StaticIdentity {
    fn current_user(&self) -> Option<AuthUser> {
        self.user.clone()
    }
}

pub trait HistoryStore: Send + Sync {
    /// Persists a new record and applies retention. Requires the current
    /// identity to match the record's owner.
    fn create(&self, record: GenerationRecord) -> Result<String, HistoryError>;

    /// Applies a partial update. Signed-out callers and unknown ids both
    /// come back as `false`, never as an error.
    fn update(&self, record_id: &str, patch: GenerationPatch) -> Result<bool, HistoryError>;

    /// The user's ten most recent records, newest first. Empty when
    /// signed out.
    fn list_recent(&self, user_id: &str) -> Result<Vec<GenerationRecord>, HistoryError>;
}

pub struct FileHistoryStore {
    path: PathBuf,
    identity: Arc<dyn IdentityProvider>,
}

impl FileHistoryStore {
    pub fn new(identity: Arc<dyn IdentityProvider>) -> Result<Self, HistoryError> {
        Self::at_path(get_history_json_path(), identity)
    }

    pub fn at_path(
        path: PathBuf,
        identity: Arc<dyn IdentityProvider>,
    ) -> Result<Self, HistoryError> {
        initialize_json_file(&path, &Vec::<GenerationRecord>::new())
            .map_err(HistoryError::Storage)?;
        Ok(Self { path, identity })
    }
}

impl HistoryStore for FileHistoryStore {
    fn create(&self, record: GenerationRecord) -> Result<String, HistoryError> {
        let user = self
            .identity
            .current_user()
            .ok_or(HistoryError::Unauthenticated)?;
        if user.uid != record.user_id {
            return Err(HistoryError::Unauthenticated);
        }

        let record_id = record.id.clone();
        update_json_file(&self.path, |records: &mut Vec<GenerationRecord>| {
            records.push(record);
            trim_user_records(records, &user.uid);
        })
        .map_err(HistoryError::Storage)?;

        info!("Saved generation {} for user {}", record_id, user.uid);
        Ok(record_id)
    }

    fn update(&self, record_id: &str, patch: GenerationPatch) -> Result<bool, HistoryError> {
        if self.identity.current_user().is_none() {
            warn!("Skipping history update for {}: not signed in", record_id);
            return Ok(false);
        }

        let mut found = false;
        update_json_file(&self.path, |records: &mut Vec<GenerationRecord>| {
            if let Some(record) = records.iter_mut().find(|r| r.id == record_id) {
                if let Some(result_image) = patch.result_image {
                    record.result_image = result_image;
                }
                if let Some(status) = patch.status {
                    record.status = status;
                }
                record.updated_at = Some(chrono::Utc::now().to_rfc3339());
                found = true;
            }
        })
        .map_err(HistoryError::Storage)?;

        if !found {
            warn!("History record {} not found for update", record_id);
        }
        Ok(found)
    }

    fn list_recent(&self, user_id: &str) -> Result<Vec<GenerationRecord>, HistoryError> {
        if self.identity.current_user().is_none() {
            return Ok(Vec::new());
        }

        let mut records: Vec<GenerationRecord> =
            read_json_file_or_default(&self.path).map_err(HistoryError::Storage)?;
        records.retain(|r| r.user_id == user_id);
        records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        records.truncate(HISTORY_LIMIT);
        Ok(records)
    }
}

/// Drops the user's records beyond the newest HISTORY_LIMIT. Other
/// users' records are untouched.
fn trim_user_records(records: &mut Vec<GenerationRecord>, user_id: &str) {
    let mut mine: Vec<&GenerationRecord> =
        records.iter().filter(|r| r.user_id == user_id).collect();
    if mine.len() <= HISTORY_LIMIT {
        return;
    }
    mine.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    let surplus: HashSet<String> = mine[HISTORY_LIMIT..].iter().map(|r| r.id.clone()).collect();
    records.retain(|r| !surplus.contains(&r.id));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::GenerationStatus;

    fn record_at(user_id: &str, minute: usize) -> GenerationRecord {
        let mut record = GenerationRecord::new(
            user_id.to_string(),
            Some(format!("{}@example.com", user_id)),
            "https://cdn.example.com/frame.jpg".to_string(),
            Some("face.jpg".to_string()),
            format!("task-{}", minute),
        );
        record.timestamp = format!("2026-08-29T10:{:02}:00Z", minute);
        record
    }

    fn store_for(dir: &tempfile::TempDir, identity: StaticIdentity) -> FileHistoryStore {
        FileHistoryStore::at_path(dir.path().join("history.json"), Arc::new(identity)).unwrap()
    }

    fn alice() -> AuthUser {
        AuthUser::new("alice").with_email("alice@example.com")
    }

    #[test]
    fn test_create_and_list_newest_first() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_for(&dir, StaticIdentity::signed_in(alice()));

        for minute in 0..3 {
            store.create(record_at("alice", minute)).unwrap();
        }

        let listed = store.list_recent("alice").unwrap();
        assert_eq!(listed.len(), 3);
        assert!(listed[0].timestamp > listed[1].timestamp);
        assert_eq!(listed[0].status, GenerationStatus::Processing);
    }

    #[test]
    fn test_retention_keeps_ten_most_recent() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_for(&dir, StaticIdentity::signed_in(alice()));

        for minute in 0..13 {
            store.create(record_at("alice", minute)).unwrap();
        }

        let listed = store.list_recent("alice").unwrap();
        assert_eq!(listed.len(), HISTORY_LIMIT);
        // oldest three evicted
        assert_eq!(listed.last().unwrap().timestamp, "2026-08-29T10:03:00Z");
    }

    #[test]
    fn test_retention_spares_other_users() {
        let dir = tempfile::tempdir().unwrap();

        let mut records: Vec<GenerationRecord> = (0..12).map(|m| record_at("alice", m)).collect();
        records.push(record_at("bob", 0));
        trim_user_records(&mut records, "alice");

        assert_eq!(records.iter().filter(|r| r.user_id == "alice").count(), 10);
        assert_eq!(records.iter().filter(|r| r.user_id == "bob").count(), 1);
    }

    #[test]
    fn test_create_requires_matching_identity() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_for(&dir, StaticIdentity::signed_in(alice()));

        let err = store.create(record_at("bob", 0)).unwrap_err();
        assert!(matches!(err, HistoryError::Unauthenticated));
    }

    #[test]
    fn test_create_signed_out_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_for(&dir, StaticIdentity::signed_out());

        let err = store.create(record_at("alice", 0)).unwrap_err();
        assert!(matches!(err, HistoryError::Unauthenticated));
    }

    #[test]
    fn test_update_patches_result_and_status() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_for(&dir, StaticIdentity::signed_in(alice()));

        let id = store.create(record_at("alice", 0)).unwrap();
        let patch = GenerationPatch {
            result_image: Some("https://cdn.example.com/out.jpg".to_string()),
            status: Some(GenerationStatus::Completed),
        };
        assert!(store.update(&id, patch).unwrap());

        let listed = store.list_recent("alice").unwrap();
        assert_eq!(listed[0].result_image, "https://cdn.example.com/out.jpg");
        assert_eq!(listed[0].status, GenerationStatus::Completed);
        assert!(listed[0].updated_at.is_some());
    }

    #[test]
    fn test_update_unknown_record_returns_false() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_for(&dir, StaticIdentity::signed_in(alice()));

        assert!(!store.update("missing", GenerationPatch::default()).unwrap());
    }

    #[test]
    fn test_update_signed_out_returns_false() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_for(&dir, StaticIdentity::signed_out());

        assert!(!store.update("anything", GenerationPatch::default()).unwrap());
    }

    #[test]
    fn test_list_signed_out_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_for(&dir, StaticIdentity::signed_out());

        assert!(store.list_recent("alice").unwrap().is_empty());
    }
}
