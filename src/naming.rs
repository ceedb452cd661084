//! Filename helpers shared by albums and media.
//!
//! ## Extensions
//!
//! [`split_ext`] splits on the last dot, but never treats leading dots as an
//! extension separator: `.nomedia` has no extension, `archive.tar.gz` has
//! `.gz`.
//!
//! ## Natural ordering
//!
//! Listings are sorted the way people read them: digit runs compare by
//! numeric value and letters compare case-insensitively, so
//!
//! ```text
//! img2.jpg < img10.jpg < IMG11.jpg
//! ```
//!
//! [`natural_key`] turns a string into a key with that ordering.
//!
//! ## Album titles
//!
//! Directories without a Markdown title get one from their name:
//! `summer_trip-2019` → "Summer trip 2019".

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Split a filename into `(stem, extension)`, the extension keeping its dot.
///
/// - `"photo.JPG"` → `("photo", ".JPG")`
/// - `"archive.tar.gz"` → `("archive.tar", ".gz")`
/// - `".nomedia"` → `(".nomedia", "")`
/// - `"README"` → `("README", "")`
pub fn split_ext(name: &str) -> (&str, &str) {
    let leading = name.len() - name.trim_start_matches('.').len();
    match name[leading..].rfind('.') {
        Some(pos) => name.split_at(leading + pos),
        None => (name, ""),
    }
}

/// Display title derived from a directory name.
///
/// Underscores and dashes become spaces; the first letter is upper-cased and
/// the rest lower-cased.
pub fn title_from_dirname(name: &str) -> String {
    let spaced = name.replace(['_', '-'], " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

/// One run of a [`NaturalKey`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Chunk {
    /// A digit run, compared by value; leading zeros break ties.
    Number { value: u128, digits: usize },
    /// A non-digit run, lower-cased.
    Text(String),
}

impl Ord for Chunk {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (
                Chunk::Number { value: a, digits: da },
                Chunk::Number { value: b, digits: db },
            ) => a.cmp(b).then(da.cmp(db)),
            (Chunk::Number { .. }, Chunk::Text(_)) => Ordering::Less,
            (Chunk::Text(_), Chunk::Number { .. }) => Ordering::Greater,
            (Chunk::Text(a), Chunk::Text(b)) => a.cmp(b),
        }
    }
}

impl PartialOrd for Chunk {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Sort key giving human ("natural") order. Compares chunk by chunk.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NaturalKey(Vec<Chunk>);

/// Build the natural sort key of `s`.
pub fn natural_key(s: &str) -> NaturalKey {
    let mut chunks = Vec::new();
    let mut text = String::new();
    let mut digits = String::new();

    for c in s.chars() {
        if c.is_ascii_digit() {
            if !text.is_empty() {
                chunks.push(Chunk::Text(std::mem::take(&mut text)));
            }
            digits.push(c);
        } else {
            if !digits.is_empty() {
                chunks.push(number_chunk(&std::mem::take(&mut digits)));
            }
            text.extend(c.to_lowercase());
        }
    }
    if !digits.is_empty() {
        chunks.push(number_chunk(&digits));
    }
    if !text.is_empty() {
        chunks.push(Chunk::Text(text));
    }
    NaturalKey(chunks)
}

fn number_chunk(digits: &str) -> Chunk {
    // Runs too long for u128 saturate; they still order by digit count.
    let value = digits.parse::<u128>().unwrap_or(u128::MAX);
    Chunk::Number {
        value,
        digits: digits.len(),
    }
}

/// Case-insensitive comparison used for directory listings.
pub fn listing_order(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase()).then_with(|| a.cmp(b))
}
