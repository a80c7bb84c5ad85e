//! [`TextLocator`] backed by the tesseract CLI.
//!
//! `tesseract IMAGE stdout tsv` prints one row per detected element:
//!
//! ```text
//! level page_num block_num par_num line_num word_num left top width height conf text
//! 5     1        1         1       1        1        36   92  60    12     96   Submit
//! ```
//!
//! Only level-5 rows carry words.

use super::run_tool;
use crate::action::box_center;
use crate::traits::TextLocator;
use std::path::Path;

/// Runs tesseract on a screenshot and searches the recognised words.
pub struct Tesseract {
    program: String,
}

#[derive(Debug, thiserror::Error)]
#[error("ocr error: {0}")]
pub struct TesseractError(String);

impl Default for Tesseract {
    fn default() -> Self {
        Self {
            program: "tesseract".into(),
        }
    }
}

/// One recognised word and its bounding box.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OcrWord {
    pub text: String,
    pub left: i32,
    pub top: i32,
    pub width: i32,
    pub height: i32,
}

/// Parse tesseract's TSV output into words, skipping the header, non-word
/// rows and rows with empty text.
pub fn parse_tsv(tsv: &str) -> Vec<OcrWord> {
    tsv.lines()
        .filter_map(|line| {
            let cols: Vec<&str> = line.split('\t').collect();
            if cols.len() < 12 || cols[0] != "5" {
                return None;
            }
            let text = cols[11..].join("\t").trim().to_string();
            if text.is_empty() {
                return None;
            }
            Some(OcrWord {
                text,
                left: cols[6].parse().ok()?,
                top: cols[7].parse().ok()?,
                width: cols[8].parse().ok()?,
                height: cols[9].parse().ok()?,
            })
        })
        .collect()
}

/// Centre of the first word that contains `needle`, ignoring case.
pub fn find_word(words: &[OcrWord], needle: &str) -> Option<(i32, i32)> {
    let needle = needle.to_lowercase();
    words
        .iter()
        .find(|w| w.text.to_lowercase().contains(&needle))
        .map(|w| box_center(w.left, w.top, w.width, w.height))
}

impl TextLocator for Tesseract {
    type Error = TesseractError;

    fn locate(&self, image: &Path, needle: &str) -> Result<Option<(i32, i32)>, Self::Error> {
        let image = image.to_string_lossy();
        let out = run_tool(&self.program, &[&image, "stdout", "tsv"]).map_err(TesseractError)?;
        let words = parse_tsv(&String::from_utf8_lossy(&out.stdout));
        Ok(find_word(&words, needle))
    }
}
