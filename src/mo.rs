//! Compiled gettext (`.mo`) catalog decoding
//!
//! File layout, all integers 32-bit in the byte order announced by the magic:
//!
//! ```text
//! offset  0: magic (0x950412de)
//! offset  4: revision
//! offset  8: number of strings (N)
//! offset 12: offset of original strings table (O)
//! offset 16: offset of translated strings table (T)
//! offset 20: hash table size (unused here)
//! offset 24: hash table offset (unused here)
//! O + 8*i:   (length, offset) of original string i
//! T + 8*i:   (length, offset) of translated string i
//! ```
//!
//! Plural entries store their variants separated by NUL bytes.
//!
//! Decoding writes into the caller's [`MessageTable`] entry by entry. When a
//! record turns out to be truncated halfway through the file, the entries
//! decoded before it stay in the table even though the parse reports
//! failure. Callers that need all-or-nothing loads must parse into a scratch
//! table first.

use std::fs;
use std::path::Path;

use tracing::{debug, warn};

use crate::error::{HummError, HummResult};
use crate::plural::PluralSelector;
use crate::{CatalogEntry, MessageTable, TextDomain};

/// Files must be strictly larger than this to be considered at all
pub const MIN_FILE_SIZE: u64 = 24;

/// Minimum number of bytes that must actually be read
const MIN_DATA_LEN: usize = 20;

/// Size of one (length, offset) record
const RECORD_SIZE: u64 = 8;

/// Key of the metadata record holding the catalog headers
pub const HEADER_KEY: &str = "";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    Little,
    Big,
}

impl ByteOrder {
    /// Detect the byte order from the first four bytes
    ///
    /// Returns `None` for anything but the two valid magic encodings.
    pub fn detect(data: &[u8]) -> Option<Self> {
        let magic: [u8; 4] = data.get(0..4)?.try_into().ok()?;
        match u32::from_le_bytes(magic) {
            0x950412de => Some(ByteOrder::Little),
            0xde120495 => Some(ByteOrder::Big),
            _ => None,
        }
    }

    fn read_u32(self, data: &[u8], offset: u64) -> Option<u32> {
        let start = usize::try_from(offset).ok()?;
        let bytes: [u8; 4] = data.get(start..start.checked_add(4)?)?.try_into().ok()?;
        Some(match self {
            ByteOrder::Little => u32::from_le_bytes(bytes),
            ByteOrder::Big => u32::from_be_bytes(bytes),
        })
    }
}

/// Decoded fixed header of a catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoHeader {
    pub byte_order: ByteOrder,
    pub message_count: u32,
    pub originals_offset: u32,
    pub translations_offset: u32,
}

impl MoHeader {
    /// Read and validate the header of `data`
    ///
    /// The last original-string record must start inside the file.
    pub fn read(data: &[u8]) -> Option<Self> {
        Self::parse(data).ok()
    }

    /// Like [`MoHeader::read`], reporting why the header was rejected
    pub fn parse(data: &[u8]) -> HummResult<Self> {
        let byte_order = ByteOrder::detect(data)
            .ok_or_else(|| HummError::InvalidCatalog("unknown magic number".to_string()))?;
        let field = |offset: u64| {
            byte_order.read_u32(data, offset).ok_or_else(|| {
                HummError::InvalidCatalog(format!("header truncated at offset {}", offset))
            })
        };
        let header = MoHeader {
            byte_order,
            message_count: field(8)?,
            originals_offset: field(12)?,
            translations_offset: field(16)?,
        };

        let last_record = u64::from(header.originals_offset)
            + u64::from(header.message_count.saturating_sub(1)) * RECORD_SIZE;
        if last_record < data.len() as u64 {
            Ok(header)
        } else {
            Err(HummError::InvalidCatalog(format!(
                "{} records at offset {} overrun a {} byte file",
                header.message_count,
                header.originals_offset,
                data.len()
            )))
        }
    }
}

/// Parse the catalog at `path` into `domain` of `messages`
///
/// On success `plural` receives the selector declared by the catalog
/// header (or the two-form default). Unreadable, too small or corrupt
/// files return `false`; see the module docs for the partial-table caveat.
///
/// # Arguments
/// * `path` - Path to the `.mo` file
/// * `domain` - Text domain receiving the messages
/// * `messages` - Shared message table
/// * `plural` - Slot for the plural selector
pub fn parse_file(
    path: &Path,
    domain: &str,
    messages: &mut MessageTable,
    plural: &mut Option<PluralSelector>,
) -> bool {
    match read_file_data(path) {
        Some(data) => parse_bytes(&data, domain, messages, plural),
        None => {
            debug!(path = %path.display(), "Catalog file missing, unreadable or too small");
            false
        }
    }
}

/// Parse an in-memory catalog; same contract as [`parse_file`]
pub fn parse_bytes(
    data: &[u8],
    domain: &str,
    messages: &mut MessageTable,
    plural: &mut Option<PluralSelector>,
) -> bool {
    if (data.len() as u64) <= MIN_FILE_SIZE || data.len() < MIN_DATA_LEN {
        return false;
    }

    let header = match MoHeader::parse(data) {
        Ok(header) => header,
        Err(e) => {
            warn!(domain = domain, error = %e, "Rejecting catalog");
            return false;
        }
    };

    let decoded = fill_messages(data, &header, domain, messages);

    let Some(text_domain) = messages.get(domain) else {
        return false;
    };
    if !decoded.complete || decoded.count == 0 {
        return false;
    }
    let Some(header_text) = text_domain.header() else {
        warn!(domain = domain, "Catalog has no metadata record");
        return false;
    };

    *plural = Some(PluralSelector::from_header(header_text));
    debug!(domain = domain, count = decoded.count, "Decoded catalog");
    true
}

fn read_file_data(path: &Path) -> Option<Vec<u8>> {
    let metadata = fs::metadata(path).ok()?;
    if !metadata.is_file() || metadata.len() <= MIN_FILE_SIZE {
        return None;
    }

    let data = fs::read(path).ok()?;
    if data.len() >= MIN_DATA_LEN {
        Some(data)
    } else {
        None
    }
}

struct Decoded {
    count: usize,
    complete: bool,
}

fn fill_messages(
    data: &[u8],
    header: &MoHeader,
    domain: &str,
    messages: &mut MessageTable,
) -> Decoded {
    let mut count = 0;

    for index in 0..u64::from(header.message_count) {
        let original = read_string(data, header, u64::from(header.originals_offset), index);
        let translation = read_string(data, header, u64::from(header.translations_offset), index);

        let (Some(original), Some(translation)) = (original, translation) else {
            warn!(domain = domain, index = index, "Truncated catalog record");
            return Decoded {
                count,
                complete: false,
            };
        };

        let ids = split_variants(original);
        let translations = split_variants(translation);
        let key = ids[0].clone();

        messages
            .entry(domain.to_string())
            .or_insert_with(TextDomain::new)
            .with_entry(key, CatalogEntry { ids, translations });
        count += 1;
    }

    Decoded {
        count,
        complete: true,
    }
}

fn read_string<'a>(data: &'a [u8], header: &MoHeader, table: u64, index: u64) -> Option<&'a [u8]> {
    let record = table + index * RECORD_SIZE;
    let length = header.byte_order.read_u32(data, record)?;
    let offset = header.byte_order.read_u32(data, record + 4)?;

    let start = usize::try_from(offset).ok()?;
    let end = start.checked_add(usize::try_from(length).ok()?)?;
    data.get(start..end)
}

fn split_variants(raw: &[u8]) -> Vec<String> {
    raw.split(|&b| b == 0)
        .map(|part| String::from_utf8_lossy(part).into_owned())
        .collect()
}
