use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use crate::database::stores::{CraftsmanStore, StoreError};
use crate::identity::Principal;

/// Display name used when the principal carries neither a full-name claim
/// nor an email.
const DEFAULT_DISPLAY_NAME: &str = "Neuer Handwerker";

#[derive(Debug, Error)]
pub enum ResolutionError {
    #[error("craftsman lookup failed: {0}")]
    Lookup(#[source] StoreError),

    #[error("craftsman creation failed: {0}")]
    Create(#[source] StoreError),

    #[error("craftsman row vanished after creation conflict")]
    ConflictUnresolved,
}

/// Idempotently map a principal to its craftsman id, creating the row on
/// first use.
///
/// Ordering matters: lookup first (the common case after first use), then
/// insert, and on a uniqueness conflict exactly one re-lookup. The re-lookup
/// is what makes concurrent first-requests from the same principal converge
/// on a single persisted row. Nothing is cached across requests.
pub async fn resolve_or_create(
    store: &dyn CraftsmanStore,
    principal: &Principal,
) -> Result<Uuid, ResolutionError> {
    if let Some(id) = store
        .find_by_principal(&principal.id)
        .await
        .map_err(ResolutionError::Lookup)?
    {
        return Ok(id);
    }

    let name = display_name(principal);
    match store
        .insert(&principal.id, name, principal.email.as_deref())
        .await
    {
        Ok(id) => {
            info!("created craftsman {} for principal {}", id, principal.id);
            Ok(id)
        }
        Err(StoreError::Conflict(msg)) => {
            // A concurrent first-request won the insert. Re-read once.
            debug!(
                "craftsman creation conflict for principal {}: {}",
                principal.id, msg
            );
            store
                .find_by_principal(&principal.id)
                .await
                .map_err(ResolutionError::Lookup)?
                .ok_or(ResolutionError::ConflictUnresolved)
        }
        Err(other) => Err(ResolutionError::Create(other)),
    }
}

fn display_name(principal: &Principal) -> &str {
    principal
        .full_name
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .or(principal.email.as_deref())
        .unwrap_or(DEFAULT_DISPLAY_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};

    /// In-memory craftsman table with a unique constraint on the principal id.
    #[derive(Default)]
    struct MemoryStore {
        rows: Mutex<HashMap<String, Uuid>>,
        /// When set, the next lookup misses but a concurrent winner inserts
        /// the row before our own insert runs, forcing the conflict path.
        race_once: AtomicBool,
    }

    #[async_trait]
    impl CraftsmanStore for MemoryStore {
        async fn find_by_principal(&self, auth_user_id: &str) -> Result<Option<Uuid>, StoreError> {
            if self.race_once.swap(false, Ordering::SeqCst) {
                let mut rows = self.rows.lock().unwrap();
                rows.entry(auth_user_id.to_string())
                    .or_insert_with(Uuid::new_v4);
                return Ok(None);
            }
            Ok(self.rows.lock().unwrap().get(auth_user_id).copied())
        }

        async fn insert(
            &self,
            auth_user_id: &str,
            _name: &str,
            _email: Option<&str>,
        ) -> Result<Uuid, StoreError> {
            let mut rows = self.rows.lock().unwrap();
            if rows.contains_key(auth_user_id) {
                return Err(StoreError::Conflict("duplicate auth_user_id".into()));
            }
            let id = Uuid::new_v4();
            rows.insert(auth_user_id.to_string(), id);
            Ok(id)
        }
    }

    fn principal(id: &str) -> Principal {
        Principal {
            id: id.to_string(),
            email: Some(format!("{}@example.com", id)),
            full_name: None,
        }
    }

    #[tokio::test]
    async fn sequential_calls_are_idempotent() {
        let store = MemoryStore::default();
        let p = principal("user-1");

        let first = resolve_or_create(&store, &p).await.unwrap();
        let second = resolve_or_create(&store, &p).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(store.rows.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn creation_conflict_converges_on_winner() {
        let store = MemoryStore::default();
        store.race_once.store(true, Ordering::SeqCst);
        let p = principal("user-2");

        // Our lookup misses, a concurrent request wins the insert, ours
        // conflicts, and the single re-lookup returns the winner's id.
        let resolved = resolve_or_create(&store, &p).await.unwrap();

        let rows = store.rows.lock().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows.get("user-2"), Some(&resolved));
    }

    #[tokio::test]
    async fn concurrent_first_requests_converge() {
        let store = Arc::new(MemoryStore::default());
        let p = principal("user-3");

        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = Arc::clone(&store);
            let p = p.clone();
            handles.push(tokio::spawn(async move {
                resolve_or_create(store.as_ref(), &p).await.unwrap()
            }));
        }

        let mut ids = Vec::new();
        for handle in handles {
            ids.push(handle.await.unwrap());
        }

        assert!(ids.windows(2).all(|w| w[0] == w[1]));
        assert_eq!(store.rows.lock().unwrap().len(), 1);
    }

    #[test]
    fn display_name_falls_back_through_claims() {
        let mut p = principal("user-4");
        p.full_name = Some("Max Mustermann".to_string());
        assert_eq!(display_name(&p), "Max Mustermann");

        p.full_name = Some("   ".to_string());
        assert_eq!(display_name(&p), "user-4@example.com");

        p.full_name = None;
        p.email = None;
        assert_eq!(display_name(&p), DEFAULT_DISPLAY_NAME);
    }
}
