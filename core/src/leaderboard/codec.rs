//! Text encoding of persisted leaderboards.
//!
//! Three layers, each base64 encoded on its own so that the `|` delimiter of an outer layer can never collide with
//! one inside a username:
//!
//! ```text
//! index  LEADERBOARD                    b64("9x9|10") | b64("16x16|40") | ...
//! table  LEADERBOARD_SIZE_9_9_10        b64( b64("ada|61234") | b64("bob|70001") | ... )
//! entry                                 <username>|<elapsed ms>
//! ```

use base64::prelude::*;
use thiserror::Error;

use super::*;

pub const DELIMITER: char = '|';

/// Storage key of the record listing every board key.
pub const INDEX_KEY: &str = "LEADERBOARD";

/// A single persisted record that could not be decoded.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CorruptEntry {
    #[error("invalid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("not valid UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),
    #[error("expected 2 fields separated by '|'")]
    FieldCount,
    #[error("invalid number {0:?}")]
    Number(String),
}

type DecodeResult<T> = core::result::Result<T, CorruptEntry>;

pub fn table_storage_key(key: BoardKey) -> String {
    format!(
        "LEADERBOARD_SIZE_{}_{}_{}",
        key.width, key.height, key.mines
    )
}

fn decode_text(encoded: &str) -> DecodeResult<String> {
    let bytes = BASE64_STANDARD.decode(encoded.trim())?;
    Ok(String::from_utf8(bytes)?)
}

/// Splits on the last delimiter, so the first field may itself contain delimiters.
fn split_fields(text: &str) -> DecodeResult<(&str, &str)> {
    text.rsplit_once(DELIMITER).ok_or(CorruptEntry::FieldCount)
}

fn parse_number<T: core::str::FromStr>(field: &str) -> DecodeResult<T> {
    field
        .parse()
        .map_err(|_| CorruptEntry::Number(field.to_owned()))
}

/// Splits a delimited layer, ignoring empty segments such as a trailing delimiter.
fn segments(layer: &str) -> impl Iterator<Item = &str> {
    layer.split(DELIMITER).filter(|segment| !segment.is_empty())
}

pub fn encode_entry(entry: &LeaderboardEntry) -> String {
    BASE64_STANDARD.encode(format!(
        "{}{}{}",
        entry.username, DELIMITER, entry.elapsed_ms
    ))
}

pub fn decode_entry(encoded: &str) -> DecodeResult<LeaderboardEntry> {
    let text = decode_text(encoded)?;
    let (username, elapsed_ms) = split_fields(&text)?;
    Ok(LeaderboardEntry::new(username, parse_number(elapsed_ms)?))
}

pub fn encode_table(entries: &[LeaderboardEntry]) -> String {
    let joined = entries
        .iter()
        .map(encode_entry)
        .collect::<Vec<_>>()
        .join(&DELIMITER.to_string());
    BASE64_STANDARD.encode(joined)
}

/// Decodes a table record, dropping (and logging) every entry that does not decode.
pub fn decode_table(encoded: &str) -> DecodeResult<Vec<LeaderboardEntry>> {
    let joined = decode_text(encoded)?;
    let entries = segments(&joined)
        .filter_map(|segment| match decode_entry(segment) {
            Ok(entry) => Some(entry),
            Err(err) => {
                log::warn!("Dropping corrupt leaderboard entry {:?}: {}", segment, err);
                None
            }
        })
        .collect();
    Ok(entries)
}

pub fn encode_key(key: BoardKey) -> String {
    BASE64_STANDARD.encode(format!(
        "{}x{}{}{}",
        key.width, key.height, DELIMITER, key.mines
    ))
}

pub fn decode_key(encoded: &str) -> DecodeResult<BoardKey> {
    let text = decode_text(encoded)?;
    let (size, mines) = split_fields(&text)?;
    let (width, height) = size.split_once('x').ok_or(CorruptEntry::FieldCount)?;
    Ok(BoardKey::new(
        parse_number(width)?,
        parse_number(height)?,
        parse_number(mines)?,
    ))
}

pub fn encode_index(keys: impl IntoIterator<Item = BoardKey>) -> String {
    keys.into_iter()
        .map(encode_key)
        .collect::<Vec<_>>()
        .join(&DELIMITER.to_string())
}

/// Decodes the index record, dropping (and logging) every key that does not decode.
pub fn decode_index(encoded: &str) -> Vec<BoardKey> {
    segments(encoded)
        .filter_map(|segment| match decode_key(segment) {
            Ok(key) => Some(key),
            Err(err) => {
                log::warn!("Dropping corrupt leaderboard key {:?}: {}", segment, err);
                None
            }
        })
        .collect()
}
