//! Persistent filesystem path index.
//!
//! The index keeps one fixed-size [`record::PathRecord`] per known path in a
//! flat table, an auxiliary map from path string to table position, a bloom
//! filter answering "have we seen this path?" without touching the table,
//! and a count-min sketch estimating per-path access frequency. The filter
//! and sketch are regenerable: cleanup rebuilds both from the retained
//! records alone.
//!
//! # On-disk format
//!
//! The index persists to `~/.recaller_fs_index.bin`. All integers are
//! little-endian:
//!
//! ```text
//! offset size  field
//! 0      8     magic "RECALLER"
//! 8      4     version (1 legacy, 2 current)
//! 12     4     record count
//! 16     4     v2: tracked-root count   v1: bloom size (ignored)
//! 20     12    reserved
//! 32     …     v2 only: tracked roots, each u32 length + UTF-8 bytes
//! …            bloom filter (self-describing, own reader/writer)
//! …            count-min sketch (32 KiB counter dump)
//! …            records, 525 bytes each
//! ```
//!
//! Version-1 files load with an empty tracked-root list. Saving writes a
//! sibling temporary file and renames it over the target, so a crashed save
//! never corrupts the previous index.

pub mod bloom;
pub mod record;
pub mod sketch;

use std::collections::HashMap;
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use directories::BaseDirs;
use tracing::{debug, info, warn};

use crate::config::FilesystemConfig;
use crate::error::RecallerError;
use crate::progress::{IndexEvent, ProgressReporter};
use crate::score;
use crate::walker::{walk, IgnoreRules};

use bloom::BloomFilter;
use record::{PathRecord, RECORD_SIZE};
use sketch::CountMinSketch;

pub const INDEX_FILE_NAME: &str = ".recaller_fs_index.bin";

const MAGIC: &[u8; 8] = b"RECALLER";
const FORMAT_VERSION: u32 = 2;
const MAX_SEARCH_RESULTS: usize = 50;

/// Live metadata for a search hit: the indexed record fields plus a fresh
/// stat of the file on disk.
#[derive(Debug, Clone)]
pub struct FileMetadata {
    pub path: String,
    pub last_access: Option<DateTime<Utc>>,
    pub access_count: i32,
    pub is_directory: bool,
    pub is_hidden: bool,
    pub is_symlink: bool,
    pub size: u64,
    pub last_modified: Option<DateTime<Utc>>,
}

/// A scored file search hit. Transient: never persisted.
#[derive(Debug, Clone)]
pub struct RankedFile {
    pub path: String,
    pub score: f64,
    pub metadata: FileMetadata,
}

/// Which records a cleanup pass removes. Rules are evaluated per record in
/// field order; the first match removes it.
#[derive(Debug, Clone, Default)]
pub struct CleanupOptions {
    /// Remove every record whose path starts with this prefix.
    pub path_prefix: Option<String>,
    /// Remove records whose path no longer exists on disk.
    pub remove_stale: bool,
    /// Remove records last accessed more than this many days ago.
    pub older_than_days: i64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CleanupStats {
    pub total_entries: usize,
    pub removed_entries: usize,
    pub prefix_matches: usize,
    pub stale_files: usize,
    pub old_files: usize,
    pub freed_kb: f64,
}

/// Memory footprint summary shown by the CLI.
#[derive(Debug, Clone)]
pub struct IndexStats {
    pub entries: usize,
    pub records_kb: f64,
    pub sketch_kb: f64,
    pub bloom_kb: f64,
}

impl IndexStats {
    pub fn total_kb(&self) -> f64 {
        self.records_kb + self.sketch_kb + self.bloom_kb
    }
}

impl std::fmt::Display for IndexStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} files, memory {:.2} KB (records {:.2} KB, sketch {:.2} KB, bloom {:.2} KB)",
            self.entries,
            self.total_kb(),
            self.records_kb,
            self.sketch_kb,
            self.bloom_kb,
        )
    }
}

/// The path index. Writers must be serialized by the caller; any number of
/// readers may share a snapshot.
pub struct PathIndex {
    bloom: BloomFilter,
    sketch: CountMinSketch,
    records: Vec<PathRecord>,
    by_path: HashMap<String, usize>,
    roots: Vec<String>,
    config: FilesystemConfig,
    index_file: PathBuf,
    dirty: bool,
}

impl PathIndex {
    pub fn new(config: FilesystemConfig) -> Self {
        Self::with_index_file(config, default_index_path())
    }

    /// An index persisting somewhere other than the default home location.
    pub fn with_index_file(config: FilesystemConfig, index_file: PathBuf) -> Self {
        let bloom = BloomFilter::new(config.bloom_filter_size, config.bloom_filter_hashes);
        Self {
            bloom,
            sketch: CountMinSketch::new(),
            records: Vec::new(),
            by_path: HashMap::new(),
            roots: Vec::new(),
            config,
            index_file,
            dirty: false,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Tracked roots: every directory ever passed to an indexing call,
    /// absolutized and deduplicated.
    pub fn root_paths(&self) -> &[String] {
        &self.roots
    }

    /// Record a path access.
    ///
    /// Returns `(was_known, count_estimate)`: whether the bloom filter had
    /// seen the path before this call, and the access count after it. A new
    /// path beyond the configured cap is counted in the sketch but gets no
    /// record.
    pub fn add(&mut self, path: &str, timestamp: DateTime<Utc>) -> (bool, i32) {
        let was_known = self.bloom.contains(path);
        self.bloom.insert(path);
        self.sketch.add(path, 1);
        self.dirty = true;

        if let Some(&idx) = self.by_path.get(path) {
            let record = &mut self.records[idx];
            record.timestamp = timestamp.timestamp();
            record.access_count = record.access_count.saturating_add(1);
            return (true, record.access_count);
        }

        if self.records.len() >= self.config.max_indexed_files {
            warn!(
                "max indexed files limit reached ({}); not recording {}",
                self.config.max_indexed_files, path
            );
            return (was_known, self.sketch.estimate(path));
        }

        let flags = std::fs::symlink_metadata(path)
            .map(|meta| record::flags_for(&meta, Path::new(path)))
            .unwrap_or(0);

        let new_record = PathRecord::new(
            path,
            timestamp.timestamp(),
            self.sketch.estimate(path),
            flags,
        );
        let count = new_record.access_count;
        self.by_path.insert(path.to_string(), self.records.len());
        self.records.push(new_record);

        (was_known, count)
    }

    /// Bloom-filter membership: may be wrong positively, never negatively.
    pub fn test_membership(&self, path: &str) -> bool {
        self.bloom.contains(path)
    }

    /// Sketch frequency estimate (minimum across rows).
    pub fn estimate_frequency(&self, path: &str) -> i32 {
        self.sketch.estimate(path)
    }

    /// Last recorded access for a path, if it has a record.
    pub fn last_access(&self, path: &str) -> Option<DateTime<Utc>> {
        let idx = *self.by_path.get(path)?;
        self.records.get(idx)?.last_access()
    }

    /// Walk a single root and record every non-skipped entry.
    pub fn index_directory(
        &mut self,
        root: &Path,
        reporter: &dyn ProgressReporter,
    ) -> Result<()> {
        self.index_directories(&[root.to_path_buf()], reporter)
    }

    /// Walk several roots in order, sharing one entry budget. Registers
    /// each root as tracked before walking it. Crossing the cap stops with
    /// [`RecallerError::LimitReached`]; the partial index stays valid.
    pub fn index_directories(
        &mut self,
        roots: &[PathBuf],
        reporter: &dyn ProgressReporter,
    ) -> Result<()> {
        let rules = IgnoreRules::new(&self.config.ignore_patterns)?;
        let limit = self.config.max_indexed_files;
        let mut visited = 0usize;
        let mut processed = 0u64;

        for root in roots {
            self.track_root(root);
            reporter.report(IndexEvent::Walking {
                root: root.display().to_string(),
            });

            let outcome = walk(root, &rules, limit, &mut visited, |path| {
                self.add(&path.to_string_lossy(), Utc::now());
                processed += 1;
                reporter.report(IndexEvent::Visited { total: processed });
            });

            match outcome {
                Ok(()) => {}
                Err(err @ RecallerError::LimitReached(_)) => {
                    reporter.report(IndexEvent::LimitReached { cap: limit });
                    return Err(err.into());
                }
                Err(err) => return Err(err.into()),
            }
        }

        reporter.report(IndexEvent::Finished { total: processed });
        Ok(())
    }

    /// Re-walk every tracked root that still exists, dropping the ones that
    /// vanished, then persist. A cap-limited refresh still persists the
    /// partial index before surfacing the limit condition.
    pub fn refresh(&mut self, reporter: &dyn ProgressReporter) -> Result<()> {
        if self.roots.is_empty() {
            bail!("no tracked paths found in index");
        }

        let mut valid = Vec::with_capacity(self.roots.len());
        for root in &self.roots {
            if Path::new(root).is_dir() {
                valid.push(root.clone());
            } else {
                warn!("dropping vanished root path: {root}");
            }
        }

        if valid.len() != self.roots.len() {
            self.roots = valid.clone();
            self.dirty = true;
        }

        let paths: Vec<PathBuf> = valid.iter().map(PathBuf::from).collect();
        let outcome = self.index_directories(&paths, reporter);

        match outcome {
            Ok(()) => self.persist(reporter),
            Err(err) => {
                let limit_reached = err
                    .downcast_ref::<RecallerError>()
                    .map(RecallerError::is_limit_reached)
                    .unwrap_or(false);
                if limit_reached {
                    self.persist(reporter)?;
                }
                Err(err)
            }
        }
    }

    /// Ranked file search over the record table.
    ///
    /// Fuzzy queries match the lower-cased basename *or* full path; exact
    /// queries match the basename prefix only. Candidates whose live stat
    /// fails are skipped silently. At most 50 results.
    pub fn search(&self, query: &str, fuzzy: bool) -> Vec<RankedFile> {
        let needle = query.to_lowercase();
        let now = Utc::now();
        let mut ranked = Vec::new();

        for stored in &self.records {
            let path = stored.path();
            let base = Path::new(&path)
                .file_name()
                .and_then(|name| name.to_str())
                .unwrap_or("")
                .to_lowercase();

            let matched = if fuzzy {
                base.contains(&needle) || path.to_lowercase().contains(&needle)
            } else {
                base.starts_with(&needle)
            };
            if !matched {
                continue;
            }

            let Ok(live) = std::fs::metadata(&path) else {
                continue;
            };

            let score = score::file_score(
                stored.access_count,
                stored.last_access(),
                stored.is_directory(),
                now,
            );
            ranked.push(RankedFile {
                path: path.clone(),
                score,
                metadata: FileMetadata {
                    path,
                    last_access: stored.last_access(),
                    access_count: stored.access_count,
                    is_directory: stored.is_directory(),
                    is_hidden: stored.is_hidden(),
                    is_symlink: stored.is_symlink(),
                    size: live.len(),
                    last_modified: live.modified().ok().map(DateTime::<Utc>::from),
                },
            });
        }

        ranked.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        ranked.truncate(MAX_SEARCH_RESULTS);
        ranked
    }

    /// Remove records matching the cleanup rules, then rebuild the map,
    /// bloom filter, and sketch from the retained records.
    pub fn cleanup(&mut self, options: &CleanupOptions) -> CleanupStats {
        let mut stats = CleanupStats {
            total_entries: self.records.len(),
            ..CleanupStats::default()
        };

        let prefix = options
            .path_prefix
            .as_deref()
            .filter(|prefix| !prefix.is_empty());
        let age_cutoff = (options.older_than_days > 0)
            .then(|| (Utc::now() - chrono::Duration::days(options.older_than_days)).timestamp());

        let mut retained = Vec::with_capacity(self.records.len());
        let mut retained_paths = Vec::with_capacity(self.records.len());

        for stored in &self.records {
            let path = stored.path();
            let mut remove = false;

            if let Some(prefix) = prefix {
                if path.starts_with(prefix) {
                    remove = true;
                    stats.prefix_matches += 1;
                }
            }

            if !remove && options.remove_stale && !Path::new(&path).exists() {
                remove = true;
                stats.stale_files += 1;
            }

            if !remove {
                if let Some(cutoff) = age_cutoff {
                    if stored.timestamp < cutoff {
                        remove = true;
                        stats.old_files += 1;
                    }
                }
            }

            if remove {
                stats.removed_entries += 1;
            } else {
                retained.push(*stored);
                retained_paths.push(path);
            }
        }

        if stats.removed_entries > 0 {
            stats.freed_kb = (stats.removed_entries * RECORD_SIZE) as f64 / 1024.0;
            self.rebuild_from(retained, retained_paths);
        }

        stats
    }

    /// Drop every record, tracked root, and probabilistic structure.
    pub fn clear(&mut self) {
        self.records.clear();
        self.by_path.clear();
        self.roots.clear();
        self.bloom = BloomFilter::new(
            self.config.bloom_filter_size,
            self.config.bloom_filter_hashes,
        );
        self.sketch = CountMinSketch::new();
        self.dirty = true;
    }

    pub fn stats(&self) -> IndexStats {
        IndexStats {
            entries: self.records.len(),
            records_kb: (self.records.len() * RECORD_SIZE) as f64 / 1024.0,
            sketch_kb: sketch::SKETCH_BYTES as f64 / 1024.0,
            bloom_kb: self.bloom.size_bytes() as f64 / 1024.0,
        }
    }

    /// Size of the index file on disk; 0 when it does not exist.
    pub fn index_file_size(&self) -> u64 {
        std::fs::metadata(&self.index_file)
            .map(|meta| meta.len())
            .unwrap_or(0)
    }

    /// Load the index file if present; a missing file just means a fresh
    /// index.
    pub fn load_or_create(&mut self) -> Result<()> {
        let path = self.index_file.clone();
        if !path.exists() {
            debug!("no filesystem index at {}; starting empty", path.display());
            return Ok(());
        }
        info!("loading filesystem index from {}", path.display());
        self.load(&path)
    }

    /// Save to the configured location if anything changed since the last
    /// save.
    pub fn persist(&mut self, reporter: &dyn ProgressReporter) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }
        reporter.report(IndexEvent::Persisting);
        let path = self.index_file.clone();
        self.save(&path)
    }

    /// Write the index to `path` via a sibling temporary file and rename,
    /// so a failed save leaves the previous file intact. Clears the dirty
    /// flag on success.
    pub fn save(&mut self, path: &Path) -> Result<()> {
        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut staged = tempfile::NamedTempFile::new_in(parent)
            .with_context(|| format!("failed to stage index file near {}", path.display()))?;

        {
            let mut writer = BufWriter::new(staged.as_file_mut());

            writer.write_all(MAGIC)?;
            writer.write_all(&FORMAT_VERSION.to_le_bytes())?;
            writer.write_all(&(self.records.len() as u32).to_le_bytes())?;
            writer.write_all(&(self.roots.len() as u32).to_le_bytes())?;
            writer.write_all(&[0u8; 12])?;

            for root in &self.roots {
                let bytes = root.as_bytes();
                writer.write_all(&(bytes.len() as u32).to_le_bytes())?;
                writer.write_all(bytes)?;
            }

            self.bloom.write_to(&mut writer)?;
            self.sketch.write_to(&mut writer)?;

            for stored in &self.records {
                stored.write_to(&mut writer)?;
            }

            writer.flush()?;
        }

        staged
            .persist(path)
            .with_context(|| format!("failed to replace index file {}", path.display()))?;

        self.dirty = false;
        Ok(())
    }

    /// Load an index file, replacing this index's contents. Accepts both
    /// the current version-2 layout and legacy version-1 files (which carry
    /// no tracked roots).
    pub fn load(&mut self, path: &Path) -> Result<()> {
        let file = std::fs::File::open(path)
            .with_context(|| format!("failed to open index file {}", path.display()))?;
        let mut reader = std::io::BufReader::new(file);

        let mut magic = [0u8; 8];
        reader.read_exact(&mut magic)?;
        if &magic != MAGIC {
            bail!("invalid index file format: {}", path.display());
        }

        let version = read_u32(&mut reader)?;
        if version != 1 && version != FORMAT_VERSION {
            bail!("unsupported index file version: {version}");
        }

        let record_count = read_u32(&mut reader)?;

        let root_count = if version == FORMAT_VERSION {
            read_u32(&mut reader)?
        } else {
            // Version 1 stored the bloom size here; it is ignored.
            let _bloom_size = read_u32(&mut reader)?;
            0
        };

        let mut reserved = [0u8; 12];
        reader.read_exact(&mut reserved)?;

        let mut roots = Vec::with_capacity(root_count as usize);
        for _ in 0..root_count {
            let len = read_u32(&mut reader)? as usize;
            let mut buf = vec![0u8; len];
            reader.read_exact(&mut buf)?;
            let root = String::from_utf8(buf).context("tracked root path is not UTF-8")?;
            roots.push(root);
        }

        let bloom = BloomFilter::read_from(&mut reader)
            .context("failed to restore bloom filter from index file")?;
        let sketch = CountMinSketch::read_from(&mut reader)
            .context("failed to restore count-min sketch from index file")?;

        let mut records = Vec::with_capacity(record_count as usize);
        let mut by_path = HashMap::with_capacity(record_count as usize);
        for i in 0..record_count {
            let stored = PathRecord::read_from(&mut reader)?;
            by_path.insert(stored.path(), i as usize);
            records.push(stored);
        }

        self.bloom = bloom;
        self.sketch = sketch;
        self.records = records;
        self.by_path = by_path;
        self.roots = roots;
        self.dirty = false;
        Ok(())
    }

    fn track_root(&mut self, root: &Path) {
        let absolute = std::fs::canonicalize(root)
            .unwrap_or_else(|_| root.to_path_buf())
            .to_string_lossy()
            .into_owned();
        if !self.roots.iter().any(|existing| existing == &absolute) {
            self.roots.push(absolute);
            self.dirty = true;
        }
    }

    fn rebuild_from(&mut self, records: Vec<PathRecord>, paths: Vec<String>) {
        self.by_path = paths
            .iter()
            .enumerate()
            .map(|(idx, path)| (path.clone(), idx))
            .collect();

        self.bloom = BloomFilter::new(
            self.config.bloom_filter_size,
            self.config.bloom_filter_hashes,
        );
        self.sketch = CountMinSketch::new();
        for (stored, path) in records.iter().zip(&paths) {
            self.bloom.insert(path);
            self.sketch.add(path, stored.access_count);
        }

        self.records = records;
        self.dirty = true;
    }
}

/// `~/.recaller_fs_index.bin`, or a relative fallback when the home
/// directory cannot be determined.
pub fn default_index_path() -> PathBuf {
    match BaseDirs::new() {
        Some(base) => base.home_dir().join(INDEX_FILE_NAME),
        None => PathBuf::from(INDEX_FILE_NAME),
    }
}

fn read_u32<R: Read>(reader: &mut R) -> std::io::Result<u32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(max: usize) -> FilesystemConfig {
        FilesystemConfig {
            enabled: true,
            max_indexed_files: max,
            bloom_filter_size: 1024,
            bloom_filter_hashes: 5,
            ignore_patterns: Vec::new(),
        }
    }

    #[test]
    fn first_add_creates_a_record_with_count_one() {
        let mut index = PathIndex::new(test_config(10));
        let (known, count) = index.add("/a/b.txt", Utc::now());

        assert!(!known);
        assert_eq!(count, 1);
        assert_eq!(index.len(), 1);
        assert!(index.test_membership("/a/b.txt"));
        assert!(index.estimate_frequency("/a/b.txt") >= 1);
        assert!(index.is_dirty());
    }

    #[test]
    fn repeated_add_updates_in_place() {
        let mut index = PathIndex::new(test_config(10));
        let first = Utc::now() - chrono::Duration::hours(1);
        index.add("/a/b.txt", first);
        let (known, count) = index.add("/a/b.txt", Utc::now());

        assert!(known);
        assert_eq!(count, 2);
        assert_eq!(index.len(), 1);

        let seen = index.last_access("/a/b.txt").unwrap();
        assert!(Utc::now() - seen < chrono::Duration::minutes(1));
    }

    #[test]
    fn adds_beyond_the_cap_do_not_create_records() {
        let mut index = PathIndex::new(test_config(2));
        index.add("/one", Utc::now());
        index.add("/two", Utc::now());
        let (known, estimate) = index.add("/three", Utc::now());

        assert!(!known);
        assert!(estimate >= 1);
        assert_eq!(index.len(), 2);
        // Still visible to the membership oracle even without a record.
        assert!(index.test_membership("/three"));
    }

    #[test]
    fn membership_never_false_negative() {
        let mut index = PathIndex::new(test_config(1000));
        for i in 0..500 {
            index.add(&format!("/files/{i}"), Utc::now());
        }
        for i in 0..500 {
            assert!(index.test_membership(&format!("/files/{i}")));
        }
    }

    #[test]
    fn map_positions_agree_with_record_paths() {
        let mut index = PathIndex::new(test_config(100));
        for i in 0..50 {
            index.add(&format!("/files/{i}"), Utc::now());
        }
        for (path, &idx) in &index.by_path {
            assert_eq!(&index.records[idx].path(), path);
        }
    }

    #[test]
    fn cleanup_with_no_rules_is_a_noop() {
        let mut index = PathIndex::new(test_config(10));
        index.add("/keep/me", Utc::now());
        let dirty_before = index.is_dirty();

        let stats = index.cleanup(&CleanupOptions::default());

        assert_eq!(stats.total_entries, 1);
        assert_eq!(stats.removed_entries, 0);
        assert_eq!(stats.freed_kb, 0.0);
        assert_eq!(index.len(), 1);
        assert_eq!(index.is_dirty(), dirty_before);
    }

    #[test]
    fn cleanup_by_prefix_rebuilds_structures() {
        let mut index = PathIndex::new(test_config(10));
        index.add("/drop/a", Utc::now());
        index.add("/drop/b", Utc::now());
        index.add("/keep/c", Utc::now());

        let stats = index.cleanup(&CleanupOptions {
            path_prefix: Some("/drop".to_string()),
            ..CleanupOptions::default()
        });

        assert_eq!(stats.removed_entries, 2);
        assert_eq!(stats.prefix_matches, 2);
        assert_eq!(index.len(), 1);
        assert!(index.test_membership("/keep/c"));
        assert!(index.estimate_frequency("/keep/c") >= 1);
        assert_eq!(index.by_path.len(), 1);
        assert!(index.is_dirty());
    }

    #[test]
    fn cleanup_by_age_removes_old_records() {
        let mut index = PathIndex::new(test_config(10));
        index.add("/old", Utc::now() - chrono::Duration::days(30));
        index.add("/new", Utc::now());

        let stats = index.cleanup(&CleanupOptions {
            older_than_days: 7,
            ..CleanupOptions::default()
        });

        assert_eq!(stats.old_files, 1);
        assert_eq!(stats.removed_entries, 1);
        assert_eq!(index.len(), 1);
        assert_eq!(index.records[0].path(), "/new");
    }

    #[test]
    fn clear_is_idempotent() {
        let mut index = PathIndex::new(test_config(10));
        index.add("/something", Utc::now());

        index.clear();
        assert!(index.is_empty());
        assert!(index.root_paths().is_empty());
        assert!(!index.test_membership("/something"));
        assert!(index.is_dirty());

        index.clear();
        assert!(index.is_empty());
        assert!(index.is_dirty());
    }

    #[test]
    fn stats_report_record_memory() {
        let mut index = PathIndex::new(test_config(10));
        index.add("/a", Utc::now());
        index.add("/b", Utc::now());

        let stats = index.stats();
        assert_eq!(stats.entries, 2);
        let expected = (2 * RECORD_SIZE) as f64 / 1024.0;
        assert!((stats.records_kb - expected).abs() < 1e-9);
        assert!(stats.total_kb() > stats.records_kb);
    }
}
