//! Field sanitization and validation.
//!
//! One uniform pass turns a client input into a storage write shape, applied
//! before anything touches storage. Plain fields lose all markup; the rich
//! `content` field keeps a fixed allowlist (the default safe set plus `img`,
//! `figure` and `figcaption`). Required fields that come out empty reject
//! the whole mutation with `Error::Validation` before any write happens.
//!
//! Optional text fields normalize to `null` when empty, so on a patch an
//! absent field means "unchanged" and an empty string means "cleared".

use crate::error::Error;
use crate::mapper::DEFAULT_PLAYER_TYPE;
use crate::schema::{
    CharacterInput, CharacterPatch, NewCharacter, NewNote, NoteInput, NotePatch,
};

/// Strip every tag, keep the text. Script and style bodies go with their tags.
pub fn clean_plain(input: &str) -> String {
    let mut builder = ammonia::Builder::new();
    builder.tags(std::collections::HashSet::new());
    builder.clean(input).to_string().trim().to_string()
}

/// Allowlist cleaning for session content.
pub fn clean_rich(input: &str) -> String {
    let mut builder = ammonia::Builder::new();
    builder.add_tags(["img", "figure", "figcaption"]);
    builder.add_tag_attributes("img", ["src", "alt", "title"]);
    builder.clean(input).to_string()
}

fn required(field: &'static str, value: Option<&str>) -> Result<String, Error> {
    let cleaned = clean_plain(value.unwrap_or(""));
    if cleaned.is_empty() {
        return Err(Error::Validation(format!("{field} is required")));
    }
    Ok(cleaned)
}

/// Optional plain field: absent or empty becomes `None`.
fn optional(value: Option<&str>) -> Option<String> {
    value.map(clean_plain).filter(|v| !v.is_empty())
}

/// Patch form of [`optional`]: absent means unchanged, empty clears.
fn patched(value: Option<&str>) -> Option<Option<String>> {
    value.map(|v| {
        let cleaned = clean_plain(v);
        (!cleaned.is_empty()).then_some(cleaned)
    })
}

/// URLs are trimmed, not entity-escaped.
fn optional_url(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn patched_url(value: Option<&str>) -> Option<Option<String>> {
    value.map(|v| {
        let trimmed = v.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

pub fn new_note(input: &NoteInput) -> Result<NewNote, Error> {
    Ok(NewNote {
        title: required("title", input.title.as_deref())?,
        date: input
            .date
            .ok_or_else(|| Error::Validation("date is required".to_string()))?,
        content: input.content.as_deref().map(clean_rich).unwrap_or_default(),
        image_url: optional_url(input.image_url.as_deref()),
    })
}

pub fn note_patch(input: &NoteInput) -> Result<NotePatch, Error> {
    let title = match input.title.as_deref() {
        Some(raw) => Some(required("title", Some(raw))?),
        None => None,
    };
    Ok(NotePatch {
        title,
        date: input.date,
        content: input.content.as_deref().map(clean_rich),
        image_url: patched_url(input.image_url.as_deref()),
    })
}

pub fn new_character(input: &CharacterInput) -> Result<NewCharacter, Error> {
    Ok(NewCharacter {
        name: required("name", input.name.as_deref())?,
        race: optional(input.race.as_deref()),
        class: optional(input.class.as_deref()),
        status: optional(input.status.as_deref()),
        location: optional(input.location.as_deref()),
        backstory: optional(input.backstory.as_deref()),
        image_url: optional_url(input.image_url.as_deref()),
        player_type: optional(input.player_type.as_deref())
            .unwrap_or_else(|| DEFAULT_PLAYER_TYPE.to_string()),
    })
}

pub fn character_patch(input: &CharacterInput) -> Result<CharacterPatch, Error> {
    let name = match input.name.as_deref() {
        Some(raw) => Some(required("name", Some(raw))?),
        None => None,
    };
    Ok(CharacterPatch {
        name,
        race: patched(input.race.as_deref()),
        class: patched(input.class.as_deref()),
        status: patched(input.status.as_deref()),
        location: patched(input.location.as_deref()),
        backstory: patched(input.backstory.as_deref()),
        image_url: patched_url(input.image_url.as_deref()),
        player_type: input
            .player_type
            .as_deref()
            .map(|v| optional(Some(v)).unwrap_or_else(|| DEFAULT_PLAYER_TYPE.to_string())),
    })
}
