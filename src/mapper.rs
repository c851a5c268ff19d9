//! Row → DTO translation.
//!
//! Pure functions, one row in, one DTO out. Missing optional columns become
//! `None` (JSON `null`), missing `content` becomes `""`, missing
//! `player_type` becomes `"npc"`. Nested collections start empty; the merge
//! engine fills them in.

use crate::schema::{Character, CharacterRow, CharacterSummary, Note, NoteRow, SessionSummary};

/// Fallback when a character row carries no `player_type`.
pub const DEFAULT_PLAYER_TYPE: &str = "npc";

pub fn note(row: &NoteRow) -> Note {
    Note {
        id: row.id,
        title: row.title.clone(),
        date: row.date,
        content: row.content.clone().unwrap_or_default(),
        image_url: row.image_url.clone(),
        characters: Vec::new(),
        session_number: None,
    }
}

pub fn session_summary(row: &NoteRow) -> SessionSummary {
    SessionSummary {
        id: row.id,
        title: row.title.clone(),
        date: row.date,
    }
}

pub fn character(row: &CharacterRow) -> Character {
    Character {
        id: row.id,
        name: row.name.clone(),
        race: row.race.clone(),
        class: row.class.clone(),
        status: row.status.clone(),
        location: row.location.clone(),
        backstory: row.backstory.clone(),
        image_url: row.image_url.clone(),
        player_type: player_type(row),
        sessions: Vec::new(),
    }
}

pub fn character_summary(row: &CharacterRow) -> CharacterSummary {
    CharacterSummary {
        id: row.id,
        name: row.name.clone(),
        image_url: row.image_url.clone(),
        status: row.status.clone(),
        player_type: player_type(row),
    }
}

fn player_type(row: &CharacterRow) -> String {
    row.player_type
        .clone()
        .unwrap_or_else(|| DEFAULT_PLAYER_TYPE.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn bare_character() -> CharacterRow {
        serde_json::from_value(serde_json::json!({ "id": 3, "name": "Aelar" })).unwrap()
    }

    #[test]
    fn test_note_defaults() {
        let row = NoteRow {
            id: 10,
            title: "Goblin Ambush".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 5, 8).unwrap(),
            content: None,
            image_url: None,
        };
        let dto = note(&row);
        assert_eq!(dto.content, "");
        assert_eq!(dto.image_url, None);
        assert!(dto.characters.is_empty());
        assert_eq!(dto.session_number, None);
    }

    #[test]
    fn test_character_defaults() {
        let dto = character(&bare_character());
        assert_eq!(dto.player_type, "npc");
        assert_eq!(dto.race, None);
        assert!(dto.sessions.is_empty());
    }

    #[test]
    fn test_summary_keeps_explicit_player_type() {
        let mut row = bare_character();
        row.player_type = Some("pc".to_string());
        assert_eq!(character_summary(&row).player_type, "pc");
    }

    #[test]
    fn test_absent_row_maps_to_absent_dto() {
        let row: Option<NoteRow> = None;
        assert!(row.as_ref().map(note).is_none());
    }
}
