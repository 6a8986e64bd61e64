//! Fixed-size binary path records.
//!
//! Each indexed path serializes to exactly 525 bytes: a 512-byte zero-padded
//! UTF-8 path (the first zero byte terminates), an i64 Unix timestamp, an
//! i32 access count, and a one-byte flag field. The fixed layout keeps the
//! on-disk format seekable and the in-memory table compact.

use std::io::{self, Read, Write};
use std::path::Path;

use chrono::{DateTime, Utc};

/// Fixed path field width. Longer paths are truncated to 511 bytes so the
/// terminator always fits.
pub const MAX_PATH_LEN: usize = 512;

/// Total serialized size of one record: path + timestamp + count + flags.
pub const RECORD_SIZE: usize = MAX_PATH_LEN + 8 + 4 + 1;

pub const FLAG_DIRECTORY: u8 = 1 << 0;
pub const FLAG_HIDDEN: u8 = 1 << 1;
pub const FLAG_SYMLINK: u8 = 1 << 2;

/// One indexed filesystem path.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct PathRecord {
    path: [u8; MAX_PATH_LEN],
    pub timestamp: i64,
    pub access_count: i32,
    pub flags: u8,
}

impl PathRecord {
    pub fn new(path: &str, timestamp: i64, access_count: i32, flags: u8) -> Self {
        let mut buf = [0u8; MAX_PATH_LEN];
        let bytes = path.as_bytes();
        let len = bytes.len().min(MAX_PATH_LEN - 1);
        buf[..len].copy_from_slice(&bytes[..len]);
        Self {
            path: buf,
            timestamp,
            access_count,
            flags,
        }
    }

    /// Decode the path field up to its first zero byte.
    pub fn path(&self) -> String {
        let end = self
            .path
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(MAX_PATH_LEN);
        String::from_utf8_lossy(&self.path[..end]).into_owned()
    }

    /// The record timestamp as a wall-clock instant; zero means never set.
    pub fn last_access(&self) -> Option<DateTime<Utc>> {
        if self.timestamp > 0 {
            DateTime::<Utc>::from_timestamp(self.timestamp, 0)
        } else {
            None
        }
    }

    pub fn is_directory(&self) -> bool {
        self.flags & FLAG_DIRECTORY != 0
    }

    pub fn is_hidden(&self) -> bool {
        self.flags & FLAG_HIDDEN != 0
    }

    pub fn is_symlink(&self) -> bool {
        self.flags & FLAG_SYMLINK != 0
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(&self.path)?;
        writer.write_all(&self.timestamp.to_le_bytes())?;
        writer.write_all(&self.access_count.to_le_bytes())?;
        writer.write_all(&[self.flags])
    }

    pub fn read_from<R: Read>(reader: &mut R) -> io::Result<Self> {
        let mut path = [0u8; MAX_PATH_LEN];
        reader.read_exact(&mut path)?;

        let mut timestamp = [0u8; 8];
        reader.read_exact(&mut timestamp)?;

        let mut access_count = [0u8; 4];
        reader.read_exact(&mut access_count)?;

        let mut flags = [0u8; 1];
        reader.read_exact(&mut flags)?;

        Ok(Self {
            path,
            timestamp: i64::from_le_bytes(timestamp),
            access_count: i32::from_le_bytes(access_count),
            flags: flags[0],
        })
    }
}

impl std::fmt::Debug for PathRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PathRecord")
            .field("path", &self.path())
            .field("timestamp", &self.timestamp)
            .field("access_count", &self.access_count)
            .field("flags", &self.flags)
            .finish()
    }
}

/// Compute the flag byte for a path from its lstat metadata.
pub fn flags_for(metadata: &std::fs::Metadata, path: &Path) -> u8 {
    let mut flags = 0;
    if metadata.is_dir() {
        flags |= FLAG_DIRECTORY;
    }
    if path
        .file_name()
        .and_then(|name| name.to_str())
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
    {
        flags |= FLAG_HIDDEN;
    }
    if metadata.file_type().is_symlink() {
        flags |= FLAG_SYMLINK;
    }
    flags
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialized_size_is_exactly_525_bytes() {
        let record = PathRecord::new("/tmp/a.txt", 1_700_000_000, 3, FLAG_HIDDEN);
        let mut buf = Vec::new();
        record.write_to(&mut buf).unwrap();
        assert_eq!(buf.len(), RECORD_SIZE);
    }

    #[test]
    fn round_trip_preserves_fields() {
        let record = PathRecord::new("/home/user/notes.md", 1_700_000_000, 7, FLAG_DIRECTORY);
        let mut buf = Vec::new();
        record.write_to(&mut buf).unwrap();

        let decoded = PathRecord::read_from(&mut buf.as_slice()).unwrap();
        assert_eq!(decoded, record);
        assert_eq!(decoded.path(), "/home/user/notes.md");
        assert_eq!(decoded.timestamp, 1_700_000_000);
        assert_eq!(decoded.access_count, 7);
        assert!(decoded.is_directory());
        assert!(!decoded.is_hidden());
    }

    #[test]
    fn over_long_paths_truncate_with_room_for_terminator() {
        let long = "/".repeat(600);
        let record = PathRecord::new(&long, 0, 0, 0);
        assert_eq!(record.path().len(), MAX_PATH_LEN - 1);
    }

    #[test]
    fn zero_timestamp_has_no_last_access() {
        let record = PathRecord::new("/tmp/x", 0, 0, 0);
        assert!(record.last_access().is_none());

        let stamped = PathRecord::new("/tmp/x", 1_700_000_000, 0, 0);
        assert!(stamped.last_access().is_some());
    }
}
