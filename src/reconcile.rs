//! Link reconciliation.
//!
//! Takes an anchor entity and the caller's desired set of related ids, and
//! moves the join table to exactly that set with a minimal diff: one batched
//! insert, one batched delete, empty batches skipped. Input ids are deduped
//! first, so repeats can never produce duplicate rows. Reconciling the
//! current state again is a true no-op.
//!
//! There is no transaction across the two batches. If one fails partway the
//! join table may hold an intermediate state; because the diff is computed
//! against storage on every call, retrying the same call converges.

use std::collections::HashSet;

use tracing::debug;

use crate::error::Error;
use crate::schema::LinkRow;
use crate::store::Store;

/// Which side of the join the desired ids hang off.
#[derive(Debug, Clone, Copy)]
pub enum LinkAnchor {
    Note(i64),
    Character(i64),
}

impl LinkAnchor {
    fn pair(self, other: i64) -> LinkRow {
        match self {
            LinkAnchor::Note(note_id) => LinkRow { note_id, character_id: other },
            LinkAnchor::Character(character_id) => LinkRow { note_id: other, character_id },
        }
    }
}

/// Applied changes, for logging and tests.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileOutcome {
    pub inserted: usize,
    pub removed: usize,
}

/// Minimal insert/remove sets taking storage from `current` to `desired`.
/// Dedupes `desired`; both outputs are sorted so batches are deterministic.
pub fn link_diff(current: &HashSet<i64>, desired: &[i64]) -> (Vec<i64>, Vec<i64>) {
    let desired: HashSet<i64> = desired.iter().copied().collect();
    let mut to_insert: Vec<i64> = desired.difference(current).copied().collect();
    let mut to_remove: Vec<i64> = current.difference(&desired).copied().collect();
    to_insert.sort_unstable();
    to_remove.sort_unstable();
    (to_insert, to_remove)
}

pub async fn reconcile(
    store: &dyn Store,
    anchor: LinkAnchor,
    desired: &[i64],
) -> Result<ReconcileOutcome, Error> {
    let current: HashSet<i64> = match anchor {
        LinkAnchor::Note(id) => store
            .links_for_note(id)
            .await?
            .iter()
            .map(|l| l.character_id)
            .collect(),
        LinkAnchor::Character(id) => store
            .links_for_character(id)
            .await?
            .iter()
            .map(|l| l.note_id)
            .collect(),
    };

    let (to_insert, to_remove) = link_diff(&current, desired);

    if !to_insert.is_empty() {
        let pairs: Vec<LinkRow> = to_insert.iter().map(|&other| anchor.pair(other)).collect();
        store.insert_links(&pairs).await?;
    }
    if !to_remove.is_empty() {
        match anchor {
            LinkAnchor::Note(id) => store.delete_links_for_note(id, &to_remove).await?,
            LinkAnchor::Character(id) => store.delete_links_for_character(id, &to_remove).await?,
        }
    }

    let outcome = ReconcileOutcome {
        inserted: to_insert.len(),
        removed: to_remove.len(),
    };
    if outcome != ReconcileOutcome::default() {
        debug!(?anchor, inserted = outcome.inserted, removed = outcome.removed, "links reconciled");
    }
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;

    fn pairs_of(store: &MemoryStore) -> HashSet<LinkRow> {
        store.link_pairs().into_iter().collect()
    }

    #[test]
    fn test_link_diff_is_minimal_and_deduped() {
        let current: HashSet<i64> = [1, 2, 3].into_iter().collect();
        let (to_insert, to_remove) = link_diff(&current, &[2, 4, 4, 2]);
        assert_eq!(to_insert, vec![4]);
        assert_eq!(to_remove, vec![1, 3]);
    }

    #[tokio::test]
    async fn test_converges_to_desired_set() {
        let store = MemoryStore::new();
        let anchor = LinkAnchor::Note(10);

        let outcome = reconcile(&store, anchor, &[1, 2, 3]).await.unwrap();
        assert_eq!(outcome, ReconcileOutcome { inserted: 3, removed: 0 });

        let outcome = reconcile(&store, anchor, &[3, 4]).await.unwrap();
        assert_eq!(outcome, ReconcileOutcome { inserted: 1, removed: 2 });
        let expected: HashSet<LinkRow> = [3, 4]
            .into_iter()
            .map(|c| LinkRow { note_id: 10, character_id: c })
            .collect();
        assert_eq!(pairs_of(&store), expected);

        let outcome = reconcile(&store, anchor, &[]).await.unwrap();
        assert_eq!(outcome, ReconcileOutcome { inserted: 0, removed: 2 });
        assert!(store.link_pairs().is_empty());
    }

    #[tokio::test]
    async fn test_reconcile_twice_is_idempotent() {
        let store = MemoryStore::new();
        let anchor = LinkAnchor::Note(10);

        reconcile(&store, anchor, &[1, 2]).await.unwrap();
        let before = store.link_write_calls();

        let outcome = reconcile(&store, anchor, &[2, 1]).await.unwrap();
        assert_eq!(outcome, ReconcileOutcome::default());
        // No storage writes at all on the second call.
        assert_eq!(store.link_write_calls(), before);
    }

    #[tokio::test]
    async fn test_duplicate_desired_ids_insert_once() {
        let store = MemoryStore::new();
        reconcile(&store, LinkAnchor::Note(10), &[5, 5, 5]).await.unwrap();
        assert_eq!(store.link_pairs(), vec![LinkRow { note_id: 10, character_id: 5 }]);
    }

    #[tokio::test]
    async fn test_character_anchor_builds_mirrored_pairs() {
        let store = MemoryStore::new();
        reconcile(&store, LinkAnchor::Character(3), &[10, 11]).await.unwrap();
        let expected: HashSet<LinkRow> = [10, 11]
            .into_iter()
            .map(|n| LinkRow { note_id: n, character_id: 3 })
            .collect();
        assert_eq!(pairs_of(&store), expected);
    }

    #[tokio::test]
    async fn test_untouched_anchors_keep_their_links() {
        let store = MemoryStore::new();
        reconcile(&store, LinkAnchor::Note(10), &[1]).await.unwrap();
        reconcile(&store, LinkAnchor::Note(11), &[1, 2]).await.unwrap();

        // Emptying note 11 must not disturb note 10.
        reconcile(&store, LinkAnchor::Note(11), &[]).await.unwrap();
        assert_eq!(store.link_pairs(), vec![LinkRow { note_id: 10, character_id: 1 }]);
    }
}
