//! Relational merge engine.
//!
//! Joins the three flat collections (notes, characters, link pairs) into
//! nested DTOs, in bulk and for a single entity. One id→summary lookup per
//! side, one pass over the links: O(notes + characters + links). A link whose
//! referenced entity is missing from the supplied collections contributes
//! nothing; it never errors. Zero links means an empty list, never a missing
//! field.
//!
//! A note's `characters` keep link order. A character's `sessions` are
//! sorted most-recent first.

use std::collections::HashMap;

use crate::mapper;
use crate::schema::{Character, CharacterRow, CharacterSummary, LinkRow, Note, NoteRow, SessionSummary};

/// Merge every note with the characters reachable through `links`.
pub fn merge_notes(notes: &[NoteRow], characters: &[CharacterRow], links: &[LinkRow]) -> Vec<Note> {
    let summaries: HashMap<i64, CharacterSummary> = characters
        .iter()
        .map(|row| (row.id, mapper::character_summary(row)))
        .collect();

    let mut by_note: HashMap<i64, Vec<CharacterSummary>> = HashMap::new();
    for link in links {
        if let Some(summary) = summaries.get(&link.character_id) {
            by_note.entry(link.note_id).or_default().push(summary.clone());
        }
    }

    notes
        .iter()
        .map(|row| {
            let mut note = mapper::note(row);
            note.characters = by_note.remove(&row.id).unwrap_or_default();
            note
        })
        .collect()
}

/// Merge every character with the sessions reachable through `links`.
pub fn merge_characters(
    characters: &[CharacterRow],
    notes: &[NoteRow],
    links: &[LinkRow],
) -> Vec<Character> {
    let summaries: HashMap<i64, SessionSummary> = notes
        .iter()
        .map(|row| (row.id, mapper::session_summary(row)))
        .collect();

    let mut by_character: HashMap<i64, Vec<SessionSummary>> = HashMap::new();
    for link in links {
        if let Some(summary) = summaries.get(&link.note_id) {
            by_character
                .entry(link.character_id)
                .or_default()
                .push(summary.clone());
        }
    }

    characters
        .iter()
        .map(|row| {
            let mut character = mapper::character(row);
            let mut sessions = by_character.remove(&row.id).unwrap_or_default();
            sessions.sort_by(|a, b| b.date.cmp(&a.date));
            character.sessions = sessions;
            character
        })
        .collect()
}

/// Merge one note. `links` may be pre-filtered or the full collection;
/// pairs anchored elsewhere are skipped.
pub fn merge_note(row: &NoteRow, characters: &[CharacterRow], links: &[LinkRow]) -> Note {
    let summaries: HashMap<i64, CharacterSummary> = characters
        .iter()
        .map(|row| (row.id, mapper::character_summary(row)))
        .collect();

    let mut note = mapper::note(row);
    note.characters = links
        .iter()
        .filter(|link| link.note_id == row.id)
        .filter_map(|link| summaries.get(&link.character_id).cloned())
        .collect();
    note
}

/// Merge one character; the mirror of [`merge_note`].
pub fn merge_character(row: &CharacterRow, notes: &[NoteRow], links: &[LinkRow]) -> Character {
    let summaries: HashMap<i64, SessionSummary> = notes
        .iter()
        .map(|row| (row.id, mapper::session_summary(row)))
        .collect();

    let mut character = mapper::character(row);
    let mut sessions: Vec<SessionSummary> = links
        .iter()
        .filter(|link| link.character_id == row.id)
        .filter_map(|link| summaries.get(&link.note_id).cloned())
        .collect();
    sessions.sort_by(|a, b| b.date.cmp(&a.date));
    character.sessions = sessions;
    character
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn note_row(id: i64, date: &str) -> NoteRow {
        NoteRow {
            id,
            title: format!("Session {id}"),
            date: date.parse::<NaiveDate>().unwrap(),
            content: Some("...".to_string()),
            image_url: None,
        }
    }

    fn character_row(id: i64, name: &str) -> CharacterRow {
        serde_json::from_value(serde_json::json!({ "id": id, "name": name })).unwrap()
    }

    fn link(note_id: i64, character_id: i64) -> LinkRow {
        LinkRow { note_id, character_id }
    }

    #[test]
    fn test_bulk_merge_distributes_links_both_ways() {
        let notes = vec![note_row(10, "2024-05-08"), note_row(11, "2024-05-22")];
        let characters = vec![character_row(3, "Aelar"), character_row(4, "Mira")];
        let links = vec![link(10, 3), link(10, 4), link(11, 3)];

        let merged_notes = merge_notes(&notes, &characters, &links);
        assert_eq!(
            merged_notes[0].characters.iter().map(|c| c.id).collect::<Vec<_>>(),
            vec![3, 4]
        );
        assert_eq!(
            merged_notes[1].characters.iter().map(|c| c.id).collect::<Vec<_>>(),
            vec![3]
        );

        let merged_characters = merge_characters(&characters, &notes, &links);
        assert_eq!(
            merged_characters[0].sessions.iter().map(|s| s.id).collect::<Vec<_>>(),
            vec![11, 10] // most recent first
        );
        assert_eq!(
            merged_characters[1].sessions.iter().map(|s| s.id).collect::<Vec<_>>(),
            vec![10]
        );
    }

    #[test]
    fn test_zero_links_yields_empty_lists() {
        let notes = vec![note_row(10, "2024-05-08")];
        let characters = vec![character_row(3, "Aelar")];

        let merged = merge_notes(&notes, &characters, &[]);
        assert_eq!(merged[0].characters, Vec::new());

        let merged = merge_characters(&characters, &notes, &[]);
        assert_eq!(merged[0].sessions, Vec::new());
    }

    #[test]
    fn test_dangling_links_are_silently_dropped() {
        let notes = vec![note_row(10, "2024-05-08")];
        let characters = vec![character_row(3, "Aelar")];
        // 99s reference entities that do not exist on either side.
        let links = vec![link(10, 99), link(99, 3), link(10, 3)];

        let merged = merge_notes(&notes, &characters, &links);
        assert_eq!(merged[0].characters.len(), 1);
        assert_eq!(merged[0].characters[0].id, 3);

        let merged = merge_characters(&characters, &notes, &links);
        assert_eq!(merged[0].sessions.len(), 1);
        assert_eq!(merged[0].sessions[0].id, 10);
    }

    #[test]
    fn test_single_merge_equals_bulk_merge_entry() {
        let notes = vec![note_row(10, "2024-05-08"), note_row(11, "2024-05-22")];
        let characters = vec![character_row(3, "Aelar"), character_row(4, "Mira")];
        let links = vec![link(10, 4), link(10, 3), link(11, 3), link(10, 99)];

        let bulk = merge_notes(&notes, &characters, &links);
        for row in &notes {
            let single = merge_note(row, &characters, &links);
            let from_bulk = bulk.iter().find(|n| n.id == row.id).unwrap();
            assert_eq!(&single, from_bulk);
        }

        let bulk = merge_characters(&characters, &notes, &links);
        for row in &characters {
            let single = merge_character(row, &notes, &links);
            let from_bulk = bulk.iter().find(|c| c.id == row.id).unwrap();
            assert_eq!(&single, from_bulk);
        }
    }

    #[test]
    fn test_note_characters_keep_link_order() {
        let notes = vec![note_row(10, "2024-05-08")];
        let characters = vec![character_row(3, "Aelar"), character_row(4, "Mira")];
        let links = vec![link(10, 4), link(10, 3)];

        let merged = merge_notes(&notes, &characters, &links);
        assert_eq!(
            merged[0].characters.iter().map(|c| c.id).collect::<Vec<_>>(),
            vec![4, 3]
        );
    }
}
