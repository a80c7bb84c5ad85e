//! Ayah counts per surah.

use super::{io_err, QuranError};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// Number of ayat in each of the 114 surahs, in mushaf order.
const AYAH_COUNTS: [u32; 114] = [
    7, 286, 200, 176, 120, 165, 206, 75, 129, 109, 123, 111, 43, 52, 99, 128, 111, 110, 98, 135,
    112, 78, 118, 64, 77, 227, 93, 88, 69, 60, 34, 30, 73, 54, 45, 83, 182, 88, 75, 85, 54, 53,
    89, 59, 37, 35, 38, 29, 18, 45, 60, 49, 62, 55, 78, 96, 29, 22, 24, 13, 14, 11, 11, 18, 12,
    12, 30, 52, 52, 44, 28, 28, 20, 56, 40, 31, 50, 40, 46, 42, 29, 19, 36, 25, 22, 17, 19, 26,
    30, 20, 15, 21, 11, 8, 8, 19, 5, 8, 8, 11, 11, 8, 3, 9, 5, 4, 7, 3, 6, 3, 5, 4, 5, 6,
];

/// A count in a metadata file may be written as a number or a string.
#[derive(Deserialize)]
#[serde(untagged)]
enum CountValue {
    Num(u32),
    Str(String),
}

/// Ayah-count lookup: the built-in table, optionally overridden by a
/// `{"002": 286, …}` JSON file.
#[derive(Debug, Clone, Default)]
pub struct Metadata {
    overrides: HashMap<String, u32>,
}

impl Metadata {
    /// Built-in counts only.
    pub fn builtin() -> Self {
        Self::default()
    }

    /// Built-in counts overridden by the entries in `path`.
    pub fn load(path: &Path) -> Result<Self, QuranError> {
        let contents = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
        let raw: HashMap<String, CountValue> =
            serde_json::from_str(&contents).map_err(|source| QuranError::Json {
                path: path.to_path_buf(),
                source,
            })?;
        let overrides = raw
            .into_iter()
            .filter_map(|(k, v)| {
                let n = match v {
                    CountValue::Num(n) => n,
                    CountValue::Str(s) => s.trim().parse().ok()?,
                };
                Some((k, n))
            })
            .collect();
        Ok(Self { overrides })
    }

    /// Whether `surah` (zero-padded) is one of the 114 surahs or is named
    /// by the override file.
    pub fn knows(&self, surah: &str) -> bool {
        self.overrides.contains_key(surah)
            || surah
                .parse::<usize>()
                .is_ok_and(|n| (1..=AYAH_COUNTS.len()).contains(&n))
    }

    /// Ayah count for a zero-padded surah key (`"002"`), or `0` when
    /// unknown.  Zero means "no upper bound".
    pub fn ayah_count(&self, surah: &str) -> u32 {
        if let Some(n) = self.overrides.get(surah) {
            return *n;
        }
        surah
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| AYAH_COUNTS.get(i))
            .copied()
            .unwrap_or(0)
    }
}
