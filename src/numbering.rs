//! Session numbering.
//!
//! A note's display ordinal is its 1-based rank by `date` ascending across
//! the whole collection, recomputed on every read and never persisted. The
//! input list is not reordered; only the derived field is attached. Equal
//! dates keep their original relative order (stable sort).

use std::collections::HashMap;

use crate::schema::Note;

pub fn assign_session_numbers(notes: Vec<Note>) -> Vec<Note> {
    let mut by_date: Vec<usize> = (0..notes.len()).collect();
    by_date.sort_by_key(|&i| notes[i].date);

    let ranks: HashMap<i64, u32> = by_date
        .iter()
        .enumerate()
        .map(|(rank, &i)| (notes[i].id, rank as u32 + 1))
        .collect();

    notes
        .into_iter()
        .map(|mut note| {
            note.session_number = ranks.get(&note.id).copied();
            note
        })
        .collect()
}
