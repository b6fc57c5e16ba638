//! Catalog domain models: titles, tracks and the library they live in
//!
//! The catalog is read-only reference data. It is deserialized once at
//! startup and never mutated; playlists are resolved from it on demand.

use crate::error::{AppError, Result};
use crate::types::Validator;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use unicode_normalization::UnicodeNormalization;

/// Stable identifier of a title in the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TitleId(u32);

impl TitleId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn value(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for TitleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A track as declared in the catalog, before its source URL is resolved
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackSpec {
    pub title: String,
    pub file_name: String,
}

impl TrackSpec {
    /// A track whose title and file name are given verbatim
    pub fn manual(title: impl Into<String>, file_name: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            file_name: file_name.into(),
        }
    }

    /// Consecutive chapter ranges of `step` chapters each.
    ///
    /// The last range is clipped to `end`, so `batch(1, 18, 5, "mp3")` yields
    /// 1-5, 6-10, 11-15 and 16-18.
    pub fn batch(start: u32, end: u32, step: u32, ext: &str) -> Vec<Self> {
        let step = step.max(1);
        let mut tracks = Vec::new();
        let mut first = start;

        while first <= end {
            let last = first.saturating_add(step - 1).min(end);
            tracks.push(ChapterRange::new(first, last).ext(ext).build());
            first = match last.checked_add(1) {
                Some(next) => next,
                None => break,
            };
        }

        tracks
    }
}

/// Range labels whose files carry the `nt` prefix instead of `c`
const SIDE_STORY_LABELS: [&str; 4] = ["Ngoại truyện", "Phiên ngoại", "Extra", "Side Story"];

fn range_file_prefix(label: &str) -> &'static str {
    let label = label.trim().to_lowercase();
    if SIDE_STORY_LABELS
        .iter()
        .any(|side| side.to_lowercase() == label)
    {
        "nt"
    } else {
        "c"
    }
}

/// Builder for a track covering a range of chapters, e.g. `c21-40 (2).mp3`
#[derive(Debug, Clone)]
pub struct ChapterRange {
    start: u32,
    end: u32,
    part: Option<u32>,
    suffix: Option<String>,
    ext: String,
    label: String,
}

impl ChapterRange {
    pub fn new(start: u32, end: u32) -> Self {
        Self {
            start,
            end,
            part: None,
            suffix: None,
            ext: "mp3".to_string(),
            label: "Chapter".to_string(),
        }
    }

    /// Marks the track as one part of a range split over several files
    pub fn part(mut self, part: u32) -> Self {
        self.part = Some(part);
        self
    }

    /// Appends a label such as "End" to the title only
    pub fn suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = Some(suffix.into());
        self
    }

    pub fn ext(mut self, ext: impl Into<String>) -> Self {
        self.ext = ext.into();
        self
    }

    /// Word that opens the title, "Chapter" unless set. Side-story labels
    /// such as "Ngoại truyện" also switch the file prefix to `nt`.
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn build(&self) -> TrackSpec {
        let part = self
            .part
            .map(|p| format!(" ({})", p))
            .unwrap_or_default();
        let suffix = self
            .suffix
            .as_ref()
            .map(|s| format!(" ({})", s))
            .unwrap_or_default();

        TrackSpec {
            title: format!(
                "{} {} - {}{}{}",
                self.label,
                self.start,
                self.end,
                part,
                suffix
            ),
            file_name: format!(
                "{}{}-{}{}.{}",
                range_file_prefix(&self.label),
                self.start,
                self.end,
                part,
                self.ext
            ),
        }
    }
}

/// A playable track with its resolved source URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub title: String,
    pub file_name: String,
    pub source: String,
}

impl Track {
    /// Resolves a catalog entry against the store root and the title's folder
    pub fn resolve(entry: &TrackSpec, root_url: &str, folder_name: &str) -> Self {
        Self {
            title: entry.title.clone(),
            file_name: entry.file_name.clone(),
            source: format!(
                "{}/{}/{}",
                root_url.trim_end_matches('/'),
                folder_name,
                entry.file_name
            ),
        }
    }
}

/// Last path segment of a source URL, used to detect renamed files
pub fn source_file_name(source: &str) -> &str {
    source.rsplit('/').next().unwrap_or(source)
}

/// One audiobook entry of the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Title {
    pub id: TitleId,
    pub folder_name: String,
    pub title: String,
    pub author: String,
    #[serde(rename = "cover", default)]
    pub cover_url: String,
    #[serde(rename = "desc", default)]
    pub description: String,
    #[serde(rename = "chapters", default)]
    pub declared_chapter_count: u32,
    pub tracks: Vec<TrackSpec>,
}

impl Title {
    /// Declared chapter count, or the number of tracks when none was declared
    pub fn chapter_count(&self) -> u32 {
        if self.declared_chapter_count > 0 {
            self.declared_chapter_count
        } else {
            self.tracks.len() as u32
        }
    }
}

impl Validator for Title {
    fn validate(&self) -> std::result::Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.title.trim().is_empty() {
            errors.push(format!("Title {} has an empty title", self.id));
        }

        if self.folder_name.trim().is_empty() {
            errors.push(format!("Title {} has an empty folder name", self.id));
        }

        for (index, track) in self.tracks.iter().enumerate() {
            if track.file_name.trim().is_empty() {
                errors.push(format!(
                    "Title {} track {} has an empty file name",
                    self.id, index
                ));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Library sort orders offered by the browsing grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    TitleAscending,
    TitleDescending,
    #[default]
    Newest,
    Oldest,
}

/// The whole read-only catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Catalog {
    #[serde(rename = "rootPath")]
    pub root_url: String,
    #[serde(rename = "library")]
    pub titles: Vec<Title>,
}

impl Catalog {
    pub fn new(root_url: impl Into<String>, titles: Vec<Title>) -> Self {
        Self {
            root_url: root_url.into(),
            titles,
        }
    }

    /// Parses and validates a catalog document
    pub fn from_json(json: &str) -> Result<Self> {
        let catalog: Catalog =
            serde_json::from_str(json).map_err(|e| AppError::InvalidInput {
                what: "catalog".to_string(),
                reason: e.to_string(),
            })?;

        if let Err(errors) = catalog.validate() {
            return Err(AppError::InvalidInput {
                what: "catalog".to_string(),
                reason: errors.join("; "),
            });
        }

        log::info!("Loaded catalog with {} titles", catalog.titles.len());
        Ok(catalog)
    }

    pub fn len(&self) -> usize {
        self.titles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.titles.is_empty()
    }

    pub fn find(&self, id: TitleId) -> Option<&Title> {
        self.titles.iter().find(|t| t.id == id)
    }

    /// Resolves every track of `title` against this catalog's root
    pub fn playlist(&self, title: &Title) -> Vec<Track> {
        title
            .tracks
            .iter()
            .map(|entry| Track::resolve(entry, &self.root_url, &title.folder_name))
            .collect()
    }

    pub fn sorted(&self, order: SortOrder) -> Vec<&Title> {
        let mut titles: Vec<&Title> = self.titles.iter().collect();
        match order {
            SortOrder::TitleAscending => {
                titles.sort_by_key(|t| t.title.to_lowercase());
            }
            SortOrder::TitleDescending => {
                titles.sort_by_key(|t| std::cmp::Reverse(t.title.to_lowercase()));
            }
            SortOrder::Newest => titles.sort_by_key(|t| std::cmp::Reverse(t.id)),
            SortOrder::Oldest => titles.sort_by_key(|t| t.id),
        }
        titles
    }

    /// Substring search over title and author, ignoring case and diacritics,
    /// so "chinh phuc" finds "Chinh Phục".
    ///
    /// An empty query returns every title in `order`.
    pub fn search(&self, query: &str, order: SortOrder) -> Vec<&Title> {
        let term = search_key(query.trim());
        self.sorted(order)
            .into_iter()
            .filter(|t| {
                term.is_empty()
                    || search_key(&t.title).contains(&term)
                    || search_key(&t.author).contains(&term)
            })
            .collect()
    }
}

/// Lowercased text with combining marks (U+0300..U+036F) removed after NFD
fn search_key(text: &str) -> String {
    text.nfd()
        .filter(|c| !('\u{0300}'..='\u{036f}').contains(c))
        .collect::<String>()
        .to_lowercase()
}

impl Validator for Catalog {
    fn validate(&self) -> std::result::Result<(), Vec<String>> {
        let mut errors = Vec::new();
        let mut seen = HashSet::new();

        if self.root_url.trim().is_empty() {
            errors.push("Catalog root path cannot be empty".to_string());
        }

        for title in &self.titles {
            if !seen.insert(title.id) {
                errors.push(format!("Duplicate title id {}", title.id));
            }
            if let Err(title_errors) = title.validate() {
                errors.extend(title_errors);
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
