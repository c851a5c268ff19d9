//! Journal entity types: storage rows, API DTOs and mutation shapes.
//!
//! Rows mirror the storage tables (snake_case, nullable optionals). DTOs are
//! the denormalized camelCase shapes the client consumes; optional fields
//! serialize as `null`, never disappear. The `New*`/`*Patch` structs are the
//! exact bodies sent to storage on insert/update; a patch serializes only
//! the fields it carries, and a carried `Some(None)` clears a column.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ============================================================================
// Storage rows
// ============================================================================

/// Raw `notes` row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoteRow {
    pub id: i64,
    pub title: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// Raw `characters` row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CharacterRow {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub race: Option<String>,
    #[serde(default)]
    pub class: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub backstory: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub player_type: Option<String>,
}

/// `note_characters` join row. Identity is the pair itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LinkRow {
    pub note_id: i64,
    pub character_id: i64,
}

// ============================================================================
// DTOs
// ============================================================================

/// A session note with its linked characters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: i64,
    pub title: String,
    pub date: NaiveDate,
    pub content: String,
    pub image_url: Option<String>,
    pub characters: Vec<CharacterSummary>,
    /// Chronological 1-based ordinal; only present on collection reads.
    pub session_number: Option<u32>,
}

/// Reduced character shape nested under a note.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterSummary {
    pub id: i64,
    pub name: String,
    pub image_url: Option<String>,
    pub status: Option<String>,
    pub player_type: String,
}

/// A character with the sessions it appeared in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Character {
    pub id: i64,
    pub name: String,
    pub race: Option<String>,
    pub class: Option<String>,
    pub status: Option<String>,
    pub location: Option<String>,
    pub backstory: Option<String>,
    pub image_url: Option<String>,
    pub player_type: String,
    pub sessions: Vec<SessionSummary>,
}

/// Reduced note shape nested under a character.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub id: i64,
    pub title: String,
    pub date: NaiveDate,
}

// ============================================================================
// Mutation inputs (client-facing, camelCase)
// ============================================================================

/// Create/update body for a note. On update, absent fields stay unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteInput {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    /// Desired linked character ids; absent leaves links untouched.
    #[serde(default)]
    pub character_ids: Option<Vec<i64>>,
}

/// Create/update body for a character.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterInput {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub race: Option<String>,
    #[serde(default)]
    pub class: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub backstory: Option<String>,
    #[serde(default)]
    pub player_type: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    /// Desired linked session ids; absent leaves links untouched.
    #[serde(default)]
    pub session_ids: Option<Vec<i64>>,
}

// ============================================================================
// Storage write shapes (snake_case, produced by the sanitizer)
// ============================================================================

/// Complete column set for inserting a note.
#[derive(Debug, Clone, Serialize)]
pub struct NewNote {
    pub title: String,
    pub date: NaiveDate,
    pub content: String,
    pub image_url: Option<String>,
}

/// Partial column set for patching a note.
#[derive(Debug, Clone, Default, Serialize)]
pub struct NotePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<Option<String>>,
}

impl NotePatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.date.is_none()
            && self.content.is_none()
            && self.image_url.is_none()
    }
}

/// Complete column set for inserting a character.
#[derive(Debug, Clone, Serialize)]
pub struct NewCharacter {
    pub name: String,
    pub race: Option<String>,
    pub class: Option<String>,
    pub status: Option<String>,
    pub location: Option<String>,
    pub backstory: Option<String>,
    pub image_url: Option<String>,
    pub player_type: String,
}

/// Partial column set for patching a character.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CharacterPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub race: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backstory: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub player_type: Option<String>,
}

impl CharacterPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.race.is_none()
            && self.class.is_none()
            && self.status.is_none()
            && self.location.is_none()
            && self.backstory.is_none()
            && self.image_url.is_none()
            && self.player_type.is_none()
    }
}
