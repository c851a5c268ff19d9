//! Read paths.
//!
//! Every read re-fetches its source collections and joins them in memory.
//! No cache sits between storage and the DTOs, so link changes are visible
//! on the next request. Collection reads number the notes; a single-note
//! read does not carry an ordinal (it is a collection-level derivation).

use crate::error::Error;
use crate::merge;
use crate::numbering::assign_session_numbers;
use crate::schema::{Character, Note};
use crate::store::Store;

pub async fn list_notes(store: &dyn Store) -> Result<Vec<Note>, Error> {
    let (notes, characters, links) = tokio::try_join!(
        store.list_notes(),
        store.list_characters(),
        store.list_links()
    )?;
    Ok(assign_session_numbers(merge::merge_notes(
        &notes,
        &characters,
        &links,
    )))
}

pub async fn get_note(store: &dyn Store, id: i64) -> Result<Note, Error> {
    let row = store.get_note(id).await?.ok_or(Error::NotFound("note"))?;
    let (characters, links) = tokio::try_join!(store.list_characters(), store.links_for_note(id))?;
    Ok(merge::merge_note(&row, &characters, &links))
}

pub async fn list_characters(store: &dyn Store) -> Result<Vec<Character>, Error> {
    let (characters, notes, links) = tokio::try_join!(
        store.list_characters(),
        store.list_notes(),
        store.list_links()
    )?;
    Ok(merge::merge_characters(&characters, &notes, &links))
}

pub async fn get_character(store: &dyn Store, id: i64) -> Result<Character, Error> {
    let row = store
        .get_character(id)
        .await?
        .ok_or(Error::NotFound("character"))?;
    let (notes, links) = tokio::try_join!(store.list_notes(), store.links_for_character(id))?;
    Ok(merge::merge_character(&row, &notes, &links))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{NewNote, NoteInput};
    use crate::store::memory::MemoryStore;

    #[tokio::test]
    async fn test_missing_ids_surface_as_not_found() {
        let store = MemoryStore::new();
        assert!(matches!(get_note(&store, 42).await, Err(Error::NotFound(_))));
        assert!(matches!(
            get_character(&store, 42).await,
            Err(Error::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_list_notes_numbers_by_date_in_desc_list() {
        let store = MemoryStore::new();
        for (title, date) in [("first", "2024-01-10"), ("second", "2024-02-10")] {
            let input = NoteInput {
                title: Some(title.to_string()),
                date: date.parse().ok(),
                ..Default::default()
            };
            crate::mutations::create_note(&store, input).await.unwrap();
        }

        let notes = list_notes(&store).await.unwrap();
        // Newest first, but the oldest session is number 1.
        assert_eq!(notes[0].title, "second");
        assert_eq!(notes[0].session_number, Some(2));
        assert_eq!(notes[1].session_number, Some(1));
    }

    #[tokio::test]
    async fn test_single_note_read_has_no_ordinal() {
        let store = MemoryStore::new();
        let row = store
            .insert_note(&NewNote {
                title: "s".to_string(),
                date: "2024-01-10".parse().unwrap(),
                content: String::new(),
                image_url: None,
            })
            .await
            .unwrap();
        let note = get_note(&store, row.id).await.unwrap();
        assert_eq!(note.session_number, None);
    }
}
