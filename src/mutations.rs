//! Write paths.
//!
//! Every mutation runs the same sequence: sanitize and validate the input,
//! persist the entity row, then reconcile the join table when the caller
//! supplied a desired related-id set. Validation failures happen before any
//! write. Entity deletes cascade to their links inside the store.
//!
//! An absent id list leaves links untouched; a present one, even when empty,
//! is the caller's full desired state and is reconciled as such.

use crate::data;
use crate::error::Error;
use crate::reconcile::{reconcile, LinkAnchor};
use crate::sanitize;
use crate::schema::{Character, CharacterInput, LinkRow, Note, NoteInput};
use crate::store::Store;

pub async fn create_note(store: &dyn Store, input: NoteInput) -> Result<Note, Error> {
    let fields = sanitize::new_note(&input)?;
    let row = store.insert_note(&fields).await?;
    if let Some(ids) = &input.character_ids {
        if !ids.is_empty() {
            reconcile(store, LinkAnchor::Note(row.id), ids).await?;
        }
    }
    data::get_note(store, row.id).await
}

pub async fn update_note(store: &dyn Store, id: i64, input: NoteInput) -> Result<Note, Error> {
    let patch = sanitize::note_patch(&input)?;
    if patch.is_empty() {
        // Link-only update; still 404 on a note that does not exist.
        store.get_note(id).await?.ok_or(Error::NotFound("note"))?;
    } else {
        store.update_note(id, &patch).await?;
    }
    if let Some(ids) = &input.character_ids {
        reconcile(store, LinkAnchor::Note(id), ids).await?;
    }
    data::get_note(store, id).await
}

pub async fn delete_note(store: &dyn Store, id: i64) -> Result<(), Error> {
    store.delete_note(id).await
}

pub async fn create_character(
    store: &dyn Store,
    input: CharacterInput,
) -> Result<Character, Error> {
    let fields = sanitize::new_character(&input)?;
    let row = store.insert_character(&fields).await?;
    if let Some(ids) = &input.session_ids {
        if !ids.is_empty() {
            reconcile(store, LinkAnchor::Character(row.id), ids).await?;
        }
    }
    data::get_character(store, row.id).await
}

pub async fn update_character(
    store: &dyn Store,
    id: i64,
    input: CharacterInput,
) -> Result<Character, Error> {
    let patch = sanitize::character_patch(&input)?;
    if patch.is_empty() {
        store
            .get_character(id)
            .await?
            .ok_or(Error::NotFound("character"))?;
    } else {
        store.update_character(id, &patch).await?;
    }
    if let Some(ids) = &input.session_ids {
        reconcile(store, LinkAnchor::Character(id), ids).await?;
    }
    data::get_character(store, id).await
}

pub async fn delete_character(store: &dyn Store, id: i64) -> Result<(), Error> {
    store.delete_character(id).await
}

/// Add one link; a pair that already exists is success.
pub async fn link_character(
    store: &dyn Store,
    note_id: i64,
    character_id: i64,
) -> Result<(), Error> {
    store
        .insert_links(&[LinkRow { note_id, character_id }])
        .await
}

/// Remove one link; removing an absent pair is success.
pub async fn unlink_character(
    store: &dyn Store,
    note_id: i64,
    character_id: i64,
) -> Result<(), Error> {
    store.delete_links_for_note(note_id, &[character_id]).await
}
