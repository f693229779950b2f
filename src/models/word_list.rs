// src/models/word_list.rs

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use sqlx::{prelude::FromRow, types::Json};
use validator::Validate;

use crate::utils::html::clean_html;

/// Represents the 'word_lists' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct WordList {
    pub id: i64,
    pub teacher_id: i64,
    pub title: String,

    /// Entries of the list.
    /// Stored as a JSON array in the database.
    pub entries: Json<Vec<ListEntry>>,

    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Kind of practice item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    /// Single term with a translation.
    #[default]
    Vocabulary,
    /// Subject-Predicate-Object sentence to unscramble.
    Sentence,
}

/// One word or sentence in a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct ListEntry {
    #[validate(length(min = 1, max = 200))]
    #[serde(alias = "bahasa")]
    pub word: String,

    /// Expected answer. For sentences this is the sentence itself.
    #[validate(length(min = 1, max = 500))]
    #[serde(alias = "english")]
    pub translation: String,

    #[serde(default)]
    pub kind: EntryKind,
}

impl ListEntry {
    /// Entries stay plain text: they are graded against student input, so
    /// only surrounding whitespace is dropped. Escaping happens at render time.
    fn trimmed(self) -> Self {
        Self {
            word: self.word.trim().to_string(),
            translation: self.translation.trim().to_string(),
            kind: self.kind,
        }
    }
}

/// Submissions look entries up by word, so a word may appear once per list.
fn validate_unique_words(entries: &[ListEntry]) -> Result<(), validator::ValidationError> {
    let mut seen = HashSet::new();
    for entry in entries {
        if !seen.insert(entry.word.trim()) {
            let mut err = validator::ValidationError::new("duplicate_word");
            err.message = Some(format!("'{}' appears more than once", entry.word.trim()).into());
            return Err(err);
        }
    }
    Ok(())
}

/// Title of a list as seen by the progress aggregator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub title: String,
}

/// Maps list identifiers to their human-readable titles.
pub type ListCatalog = HashMap<i64, CatalogEntry>;

/// Builds a catalog from stored lists.
pub fn catalog_from_lists(lists: &[WordList]) -> ListCatalog {
    lists
        .iter()
        .map(|l| {
            (
                l.id,
                CatalogEntry {
                    title: l.title.clone(),
                },
            )
        })
        .collect()
}

/// DTO for creating a list.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateListRequest {
    #[validate(length(min = 1, max = 100, message = "Title length must be between 1 and 100 chars"))]
    pub title: String,

    #[validate(
        length(min = 1, max = 500),
        nested,
        custom(function = validate_unique_words)
    )]
    pub entries: Vec<ListEntry>,
}

impl CreateListRequest {
    /// Strips markup from the title and trims every entry.
    pub fn sanitized(self) -> Self {
        Self {
            title: clean_html(self.title.trim()),
            entries: self.entries.into_iter().map(ListEntry::trimmed).collect(),
        }
    }
}

/// DTO for updating a list. Fields are optional.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateListRequest {
    #[validate(length(min = 1, max = 100))]
    pub title: Option<String>,

    #[validate(
        length(min = 1, max = 500),
        nested,
        custom(function = validate_unique_words)
    )]
    pub entries: Option<Vec<ListEntry>>,
}

impl UpdateListRequest {
    pub fn sanitized(self) -> Self {
        Self {
            title: self.title.map(|t| clean_html(t.trim())),
            entries: self
                .entries
                .map(|e| e.into_iter().map(ListEntry::trimmed).collect()),
        }
    }
}

/// Lightweight list row for index pages.
#[derive(Debug, Serialize, FromRow)]
pub struct ListSummaryRow {
    pub id: i64,
    pub title: String,
    pub entry_count: i64,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// An exercise item handed to a student. The expected answer is withheld.
#[derive(Debug, Serialize)]
pub struct ExerciseItem {
    pub word: String,
    pub kind: EntryKind,
    /// Shuffled tokens for sentence entries.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tokens: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
pub struct Exercise {
    pub list_id: i64,
    pub title: String,
    pub items: Vec<ExerciseItem>,
}
