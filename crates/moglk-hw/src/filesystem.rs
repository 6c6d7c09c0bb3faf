//! Onboard filesystem response decoding.
//!
//! The module carries 16 KB of storage addressed by file kind (font or
//! bitmap) and a 7-bit id. Directory listings and free-space counts come
//! back in the compact formats decoded here; file payloads are returned
//! with a 4-byte little-endian size prefix.

use crate::error::{Error, Result};

/// Onboard storage capacity. No file or filesystem dump can be larger.
pub const FS_CAPACITY: usize = 16 * 1024;

/// The two kinds of file the filesystem stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum FileKind {
    Font = 0,
    Bitmap = 1,
}

/// One used slot in a directory listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirEntry {
    pub kind: FileKind,
    pub id: u8,
    pub size: u16,
}

/// Decodes the 4-byte little-endian free space response (FE AF).
pub fn decode_free_space(raw: &[u8; 4]) -> u32 {
    u32::from_le_bytes(*raw)
}

/// Decodes directory entry records (FE B3). The leading count byte has
/// already been consumed; `raw` is count * 4 bytes. Unused slots (flag
/// byte 0x00) are skipped.
pub fn decode_directory(raw: &[u8]) -> Result<Vec<DirEntry>> {
    if raw.len() % 4 != 0 {
        return Err(Error::BadLength {
            what: "directory listing",
            expected: raw.len().next_multiple_of(4),
            actual: raw.len(),
        });
    }
    let mut entries = Vec::new();
    for record in raw.chunks_exact(4) {
        if record[0] == 0x00 {
            continue;
        }
        // Top bit of the id byte is the kind, low seven bits the id.
        let kind = if record[1] & 0x80 != 0 {
            FileKind::Bitmap
        } else {
            FileKind::Font
        };
        entries.push(DirEntry {
            kind,
            id: record[1] & 0x7F,
            size: u16::from_le_bytes([record[2], record[3]]),
        });
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_free_space() {
        assert_eq!(decode_free_space(&[0x00, 0x40, 0x00, 0x00]), 16_384);
        assert_eq!(decode_free_space(&[0x10, 0x27, 0x00, 0x00]), 10_000);
    }

    #[test]
    fn test_directory_skips_unused_slots() {
        let raw = [
            0x01, 0x02, 0x34, 0x12, // font id 2, 0x1234 bytes
            0x00, 0x00, 0x00, 0x00, // unused slot
            0x01, 0x85, 0x10, 0x00, // bitmap id 5, 16 bytes
        ];
        let entries = decode_directory(&raw).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(
            entries[0],
            DirEntry {
                kind: FileKind::Font,
                id: 2,
                size: 0x1234
            }
        );
        assert_eq!(
            entries[1],
            DirEntry {
                kind: FileKind::Bitmap,
                id: 5,
                size: 16
            }
        );
    }

    #[test]
    fn test_directory_truncated() {
        assert!(decode_directory(&[0x01, 0x02, 0x34]).is_err());
    }

    #[test]
    fn test_directory_empty() {
        assert!(decode_directory(&[]).unwrap().is_empty());
    }
}
