//! Session cache of normalized sheets.
//!
//! A source (file path or upload id) is decoded and normalized once. Later
//! loads of the same key reuse the cached sheets unless the content
//! fingerprint changed.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

use crate::error::{DecodeError, DecodeResult};
use crate::models::{NormalizedSheet, SheetInfo};
use crate::parser::{decode_workbook, SourceKind};
use crate::transform::normalize::normalize_sheet;

/// Default number of workbooks kept in memory.
pub const DEFAULT_CAPACITY: usize = 16;

/// Which sheets of a workbook a conversion uses.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SheetSelection {
    /// The first sheet only.
    #[default]
    First,
    /// These sheets, in this order.
    Named(Vec<String>),
    /// Every sheet, in workbook order.
    All,
}

impl SheetSelection {
    /// `Named` when names were given, otherwise `First`/`All`.
    pub fn from_names(names: Vec<String>, all: bool) -> Self {
        if all {
            SheetSelection::All
        } else if names.is_empty() {
            SheetSelection::First
        } else {
            SheetSelection::Named(names)
        }
    }
}

/// A decoded and normalized source.
#[derive(Debug, Clone)]
pub struct CachedWorkbook {
    pub source: String,
    pub kind: SourceKind,
    pub fingerprint: String,
    pub sheets: Vec<NormalizedSheet>,
    pub infos: Vec<SheetInfo>,
    pub loaded_at: DateTime<Utc>,
}

impl CachedWorkbook {
    /// Decode and normalize every sheet of `bytes`, naming a CSV sheet
    /// after the stem of `source`.
    pub fn decode(source: &str, bytes: &[u8]) -> DecodeResult<Self> {
        let stem = std::path::Path::new(source)
            .file_stem()
            .and_then(|s| s.to_str());
        Self::decode_with_hint(source, bytes, stem)
    }

    /// Like [`CachedWorkbook::decode`] with an explicit CSV sheet name.
    pub fn decode_with_hint(
        source: &str,
        bytes: &[u8],
        name_hint: Option<&str>,
    ) -> DecodeResult<Self> {
        let decoded = decode_workbook(bytes, name_hint)?;

        let infos = decoded.sheet_infos();
        let sheets = decoded
            .sheets
            .iter()
            .map(|raw| normalize_sheet(&raw.grid, &raw.info.name))
            .collect();

        Ok(Self {
            source: source.to_string(),
            kind: decoded.kind,
            fingerprint: fingerprint(bytes),
            sheets,
            infos,
            loaded_at: Utc::now(),
        })
    }

    pub fn sheet(&self, name: &str) -> Option<&NormalizedSheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    /// Resolve a selection to sheets.
    pub fn select(&self, selection: &SheetSelection) -> DecodeResult<Vec<&NormalizedSheet>> {
        match selection {
            SheetSelection::First => self
                .sheets
                .first()
                .map(|s| vec![s])
                .ok_or(DecodeError::NoSheets),
            SheetSelection::All => Ok(self.sheets.iter().collect()),
            SheetSelection::Named(names) => names
                .iter()
                .map(|name| {
                    self.sheet(name)
                        .ok_or_else(|| DecodeError::SheetNotFound(name.clone()))
                })
                .collect(),
        }
    }
}

/// SHA-256 of the source bytes, hex encoded.
pub fn fingerprint(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Bounded map of source key -> cached workbook.
#[derive(Debug)]
pub struct SheetCache {
    entries: HashMap<String, CachedWorkbook>,
    capacity: usize,
}

impl SheetCache {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            capacity: capacity.max(1),
        }
    }

    /// Return the cached workbook for `key`, decoding `bytes` only if the
    /// key is new or its content changed.
    ///
    /// A failed decode leaves the cache untouched.
    pub fn load(&mut self, key: &str, bytes: &[u8]) -> DecodeResult<&CachedWorkbook> {
        if !self.entries.contains_key(key) {
            let workbook = CachedWorkbook::decode(key, bytes)?;
            self.evict_for_insert();
            return Ok(self.entries.entry(key.to_string()).or_insert(workbook));
        }

        match self.entries.entry(key.to_string()) {
            Entry::Occupied(mut slot) => {
                if slot.get().fingerprint != fingerprint(bytes) {
                    slot.insert(CachedWorkbook::decode(key, bytes)?);
                }
                Ok(slot.into_mut())
            }
            Entry::Vacant(slot) => Ok(slot.insert(CachedWorkbook::decode(key, bytes)?)),
        }
    }

    /// Insert an already decoded workbook under its source key.
    pub fn insert(&mut self, workbook: CachedWorkbook) {
        if !self.entries.contains_key(&workbook.source) {
            self.evict_for_insert();
        }
        self.entries.insert(workbook.source.clone(), workbook);
    }

    pub fn get(&self, key: &str) -> Option<&CachedWorkbook> {
        self.entries.get(key)
    }

    /// Drop a cached workbook. Returns whether it was present.
    pub fn invalidate(&mut self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Evict the least recently loaded entry when full.
    fn evict_for_insert(&mut self) {
        while self.entries.len() >= self.capacity {
            let oldest = self
                .entries
                .values()
                .min_by_key(|wb| wb.loaded_at)
                .map(|wb| wb.source.clone());
            match oldest {
                Some(key) => {
                    self.entries.remove(&key);
                }
                None => break,
            }
        }
    }
}

impl Default for SheetCache {
    fn default() -> Self {
        Self::new()
    }
}
