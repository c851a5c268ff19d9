//! Storage query surface.
//!
//! The [`Store`] trait is the seam between the data core and whatever holds
//! the rows; [`crate::supabase::SupabaseStore`] is the production
//! implementation. Entity deletes cascade to their link rows, and inserting
//! a link pair that already exists succeeds without creating a duplicate,
//! since the pair is the link's identity. The link methods are the only write path
//! for the join table.

use async_trait::async_trait;

use crate::error::Error;
use crate::schema::{
    CharacterPatch, CharacterRow, LinkRow, NewCharacter, NewNote, NoteRow, NotePatch,
};

#[async_trait]
pub trait Store: Send + Sync {
    /// All notes, newest session date first.
    async fn list_notes(&self) -> Result<Vec<NoteRow>, Error>;
    async fn get_note(&self, id: i64) -> Result<Option<NoteRow>, Error>;
    async fn insert_note(&self, fields: &NewNote) -> Result<NoteRow, Error>;
    async fn update_note(&self, id: i64, patch: &NotePatch) -> Result<NoteRow, Error>;
    /// Deletes the note and every link row referencing it.
    async fn delete_note(&self, id: i64) -> Result<(), Error>;

    /// All characters, name ascending.
    async fn list_characters(&self) -> Result<Vec<CharacterRow>, Error>;
    async fn get_character(&self, id: i64) -> Result<Option<CharacterRow>, Error>;
    async fn insert_character(&self, fields: &NewCharacter) -> Result<CharacterRow, Error>;
    async fn update_character(&self, id: i64, patch: &CharacterPatch)
        -> Result<CharacterRow, Error>;
    /// Deletes the character and every link row referencing it.
    async fn delete_character(&self, id: i64) -> Result<(), Error>;

    async fn list_links(&self) -> Result<Vec<LinkRow>, Error>;
    async fn links_for_note(&self, note_id: i64) -> Result<Vec<LinkRow>, Error>;
    async fn links_for_character(&self, character_id: i64) -> Result<Vec<LinkRow>, Error>;
    /// Batched insert; pairs that already exist are skipped, not errors.
    async fn insert_links(&self, pairs: &[LinkRow]) -> Result<(), Error>;
    /// Batched removal of `(note_id, c)` for each `c` in `character_ids`.
    async fn delete_links_for_note(&self, note_id: i64, character_ids: &[i64])
        -> Result<(), Error>;
    /// Batched removal of `(n, character_id)` for each `n` in `note_ids`.
    async fn delete_links_for_character(
        &self,
        character_id: i64,
        note_ids: &[i64],
    ) -> Result<(), Error>;
}
