//! Supabase (PostgREST) implementation of the storage surface.
//!
//! Rows live in three tables: `notes`, `characters` and the `note_characters`
//! join. Reads go through the REST filter syntax (`id=eq.N`, `in.(...)`),
//! writes use `Prefer: return=representation` so inserts and patches hand
//! back the persisted row. Link inserts declare the composite key via
//! `on_conflict` and ask for `resolution=ignore-duplicates`, so re-inserting
//! an existing pair is success, not a constraint error.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::error::Error;
use crate::schema::{
    CharacterPatch, CharacterRow, LinkRow, NewCharacter, NewNote, NoteRow, NotePatch,
};
use crate::store::Store;

/// PostgREST client configuration.
#[derive(Clone)]
pub struct SupabaseStore {
    client: Client,
    base_url: String,
    service_role_key: String,
}

impl SupabaseStore {
    /// Create a new store from environment variables.
    pub fn from_env() -> Result<Self> {
        let base_url =
            std::env::var("SUPABASE_URL").context("SUPABASE_URL not set")?;
        let service_role_key = std::env::var("SUPABASE_SERVICE_ROLE_KEY")
            .context("SUPABASE_SERVICE_ROLE_KEY not set")?;

        Ok(Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            service_role_key,
        })
    }

    fn request(&self, method: Method, path_and_query: &str) -> RequestBuilder {
        let url = format!("{}/rest/v1/{}", self.base_url, path_and_query);
        self.client
            .request(method, url)
            .header("apikey", &self.service_role_key)
            .header("Authorization", format!("Bearer {}", self.service_role_key))
    }

    /// Check status, surface the response body on failure.
    async fn check(resp: Response, what: &str) -> Result<Response, Error> {
        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(Error::Storage(format!("{what}: {status} - {text}")));
        }
        Ok(resp)
    }

    async fn select<T: DeserializeOwned>(&self, path_and_query: &str) -> Result<Vec<T>, Error> {
        let resp = self
            .request(Method::GET, path_and_query)
            .send()
            .await?;
        let resp = Self::check(resp, path_and_query).await?;
        Ok(resp.json().await?)
    }

    /// POST with `return=representation`, expecting exactly one row back.
    async fn insert_returning<T, B>(&self, table: &str, body: &B) -> Result<T, Error>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let resp = self
            .request(Method::POST, table)
            .header("Prefer", "return=representation")
            .json(body)
            .send()
            .await?;
        let resp = Self::check(resp, table).await?;
        let rows: Vec<T> = resp.json().await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| Error::Storage(format!("insert into {table} returned no row")))
    }

    /// PATCH with `return=representation`; zero matched rows means the
    /// entity does not exist.
    async fn update_returning<T, B>(
        &self,
        path_and_query: &str,
        entity: &'static str,
        body: &B,
    ) -> Result<T, Error>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let resp = self
            .request(Method::PATCH, path_and_query)
            .header("Prefer", "return=representation")
            .json(body)
            .send()
            .await?;
        let resp = Self::check(resp, path_and_query).await?;
        let rows: Vec<T> = resp.json().await?;
        rows.into_iter().next().ok_or(Error::NotFound(entity))
    }

    async fn delete_where(&self, path_and_query: &str) -> Result<(), Error> {
        let resp = self.request(Method::DELETE, path_and_query).send().await?;
        let _ = Self::check(resp, path_and_query).await?;
        Ok(())
    }
}

/// Comma-joined id list for an `in.(...)` filter.
fn in_filter(ids: &[i64]) -> String {
    ids.iter()
        .map(i64::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

#[async_trait]
impl Store for SupabaseStore {
    async fn list_notes(&self) -> Result<Vec<NoteRow>, Error> {
        self.select("notes?select=*&order=date.desc").await
    }

    async fn get_note(&self, id: i64) -> Result<Option<NoteRow>, Error> {
        let rows: Vec<NoteRow> = self.select(&format!("notes?select=*&id=eq.{id}")).await?;
        Ok(rows.into_iter().next())
    }

    async fn insert_note(&self, fields: &NewNote) -> Result<NoteRow, Error> {
        let row: NoteRow = self.insert_returning("notes", fields).await?;
        debug!(id = row.id, "inserted note");
        Ok(row)
    }

    async fn update_note(&self, id: i64, patch: &NotePatch) -> Result<NoteRow, Error> {
        self.update_returning(&format!("notes?id=eq.{id}"), "note", patch)
            .await
    }

    async fn delete_note(&self, id: i64) -> Result<(), Error> {
        self.delete_where(&format!("note_characters?note_id=eq.{id}"))
            .await?;
        self.delete_where(&format!("notes?id=eq.{id}")).await
    }

    async fn list_characters(&self) -> Result<Vec<CharacterRow>, Error> {
        self.select("characters?select=*&order=name.asc").await
    }

    async fn get_character(&self, id: i64) -> Result<Option<CharacterRow>, Error> {
        let rows: Vec<CharacterRow> = self
            .select(&format!("characters?select=*&id=eq.{id}"))
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn insert_character(&self, fields: &NewCharacter) -> Result<CharacterRow, Error> {
        let row: CharacterRow = self.insert_returning("characters", fields).await?;
        debug!(id = row.id, "inserted character");
        Ok(row)
    }

    async fn update_character(
        &self,
        id: i64,
        patch: &CharacterPatch,
    ) -> Result<CharacterRow, Error> {
        self.update_returning(&format!("characters?id=eq.{id}"), "character", patch)
            .await
    }

    async fn delete_character(&self, id: i64) -> Result<(), Error> {
        self.delete_where(&format!("note_characters?character_id=eq.{id}"))
            .await?;
        self.delete_where(&format!("characters?id=eq.{id}")).await
    }

    async fn list_links(&self) -> Result<Vec<LinkRow>, Error> {
        self.select("note_characters?select=note_id,character_id")
            .await
    }

    async fn links_for_note(&self, note_id: i64) -> Result<Vec<LinkRow>, Error> {
        self.select(&format!(
            "note_characters?select=note_id,character_id&note_id=eq.{note_id}"
        ))
        .await
    }

    async fn links_for_character(&self, character_id: i64) -> Result<Vec<LinkRow>, Error> {
        self.select(&format!(
            "note_characters?select=note_id,character_id&character_id=eq.{character_id}"
        ))
        .await
    }

    async fn insert_links(&self, pairs: &[LinkRow]) -> Result<(), Error> {
        if pairs.is_empty() {
            return Ok(());
        }
        let resp = self
            .request(
                Method::POST,
                "note_characters?on_conflict=note_id,character_id",
            )
            .header("Prefer", "return=minimal,resolution=ignore-duplicates")
            .json(pairs)
            .send()
            .await?;
        let _ = Self::check(resp, "note_characters").await?;
        debug!(count = pairs.len(), "inserted links");
        Ok(())
    }

    async fn delete_links_for_note(
        &self,
        note_id: i64,
        character_ids: &[i64],
    ) -> Result<(), Error> {
        if character_ids.is_empty() {
            return Ok(());
        }
        self.delete_where(&format!(
            "note_characters?note_id=eq.{note_id}&character_id=in.({})",
            in_filter(character_ids)
        ))
        .await
    }

    async fn delete_links_for_character(
        &self,
        character_id: i64,
        note_ids: &[i64],
    ) -> Result<(), Error> {
        if note_ids.is_empty() {
            return Ok(());
        }
        self.delete_where(&format!(
            "note_characters?character_id=eq.{character_id}&note_id=in.({})",
            in_filter(note_ids)
        ))
        .await
    }
}
