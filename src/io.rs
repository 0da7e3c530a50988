// Filesystem side of the archiver.
//
// Provides the source walker, an `EntryWriter` that materializes entries under
// a directory, and the file-level `create_archive()` / `extract_archive()`
// wrappers used by the CLI. Containers and extracted files are written to a
// temp file next to their destination and renamed into place once complete.

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Component, Path, PathBuf};

use tempfile::NamedTempFile;
use walkdir::WalkDir;

use crate::archive::{self, EntryInfo, EntryWriter, NoProgress, ProgressSink};
use crate::container::envelope::{Envelope, NONCE_LEN, VERSION};
use crate::container::payload::{self, PayloadEntry};
use crate::error::Result;

const BUF_SIZE: usize = 64 * 1024; // 64 KiB

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

/// Statistics returned by `create_archive()`.
#[derive(Debug, Clone)]
pub struct CreateStats {
    /// Number of files packed.
    pub entries: usize,
    /// Sum of all file contents.
    pub input_size: u64,
    /// Framed plaintext payload size.
    pub payload_size: u64,
    /// Huffman-coded stream size (ciphertext minus tag).
    pub compressed_size: u64,
    /// Size of the written container.
    pub archive_size: u64,
}

/// Statistics returned by `extract_archive()`.
#[derive(Debug, Clone)]
pub struct ExtractStats {
    /// Number of files written.
    pub entries: usize,
    /// Sum of all written file sizes.
    pub output_size: u64,
    /// Size of the container that was read.
    pub archive_size: u64,
}

/// Header facts readable without the password.
#[derive(Debug, Clone)]
pub struct ArchiveInfo {
    pub version: u8,
    pub nonce: [u8; NONCE_LEN],
    /// Plaintext payload size (sum of the frequency table).
    pub payload_size: u64,
    pub distinct_symbols: usize,
    pub compressed_size: u64,
    pub archive_size: u64,
}

// ---------------------------------------------------------------------------
// Source walker
// ---------------------------------------------------------------------------

/// A file to be archived and the entry name it will carry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub name: String,
    pub path: PathBuf,
}

/// Enumerate the files under `input`.
///
/// A regular file yields one source named by its base name. A directory is
/// walked recursively; only regular files are collected, named relative to
/// `input` with `/` separators, and returned sorted by name.
pub fn collect_sources(input: &Path) -> Result<Vec<SourceFile>> {
    let meta = fs::metadata(input)?;
    if meta.is_file() {
        let name = input
            .file_name()
            .map(|n| lossy_name(Path::new(n)))
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("{} has no file name", input.display()),
                )
            })?;
        return Ok(vec![SourceFile {
            name,
            path: input.to_path_buf(),
        }]);
    }

    let mut sources = Vec::new();
    for entry in WalkDir::new(input)
        .follow_links(false)
        .min_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(io::Error::from)?;
        let file_type = entry.file_type();
        if file_type.is_dir() {
            continue;
        }

        let path = entry.into_path();
        // Symlinked files are archived by content; symlinked dirs are not entered.
        if file_type.is_file() || (file_type.is_symlink() && path.is_file()) {
            let relative = path.strip_prefix(input).map_err(io::Error::other)?;
            sources.push(SourceFile {
                name: lossy_name(relative),
                path,
            });
        } else {
            log::debug!("skipping {}", path.display());
        }
    }

    // Per-directory order is not name order once `/` joins the components.
    sources.sort_by(|a, b| a.name.cmp(&b.name));
    log::debug!("collected {} files under {}", sources.len(), input.display());
    Ok(sources)
}

/// Join path components with `/`, replacing non-UTF-8 bytes.
fn lossy_name(relative: &Path) -> String {
    let parts: Vec<String> = relative
        .components()
        .map(|c| {
            let raw = c.as_os_str();
            match raw.to_str() {
                Some(s) => s.to_string(),
                None => {
                    let lossy = raw.to_string_lossy().into_owned();
                    log::warn!("file name {lossy:?} is not valid UTF-8; storing it lossily");
                    lossy
                }
            }
        })
        .collect();
    parts.join("/")
}

/// Read every source into memory.
pub fn read_sources(sources: &[SourceFile]) -> Result<Vec<PayloadEntry>> {
    sources
        .iter()
        .map(|s| -> Result<PayloadEntry> {
            payload::validate_name(&s.name)?;
            let content = fs::read(&s.path)?;
            log::trace!("read {} ({} bytes)", s.path.display(), content.len());
            Ok(PayloadEntry::new(s.name.clone(), content))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Directory writer
// ---------------------------------------------------------------------------

/// Writes entries as files under a root directory.
///
/// Names must be relative and may not contain `..` or empty components;
/// anything else is refused with `InvalidData`.
#[derive(Debug, Clone)]
pub struct DirWriter {
    root: PathBuf,
    written: u64,
}

impl DirWriter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            written: 0,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Total content bytes written so far.
    pub fn bytes_written(&self) -> u64 {
        self.written
    }

    /// Resolve `name` under the root, refusing anything that would escape it.
    pub fn target_path(&self, name: &str) -> io::Result<PathBuf> {
        let refuse = |why: &str| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("refusing entry name {name:?}: {why}"),
            )
        };

        if name.is_empty() {
            return Err(refuse("empty"));
        }
        let mut path = self.root.clone();
        for part in name.split('/') {
            if part.is_empty() || part == "." || part == ".." {
                return Err(refuse("empty, '.' or '..' component"));
            }
            let mut components = Path::new(part).components();
            match (components.next(), components.next()) {
                (Some(Component::Normal(c)), None) => path.push(c),
                _ => return Err(refuse("not a plain relative path")),
            }
        }
        Ok(path)
    }
}

impl EntryWriter for DirWriter {
    fn check_name(&self, name: &str) -> io::Result<()> {
        self.target_path(name).map(drop)
    }

    fn write_entry(&mut self, name: &str, content: &[u8]) -> io::Result<()> {
        let target = self.target_path(name)?;
        let parent = target.parent().unwrap_or(&self.root);
        fs::create_dir_all(parent)?;

        let mut tmp = NamedTempFile::new_in(parent)?;
        tmp.write_all(content)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&target).map_err(|e| e.error)?;

        self.written += content.len() as u64;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// create_archive
// ---------------------------------------------------------------------------

/// Archive the file or directory at `input` into `output`.
pub fn create_archive(input: &Path, output: &Path, password: &str) -> Result<CreateStats> {
    create_archive_with_progress(input, output, password, &mut NoProgress)
}

/// [`create_archive`] with progress reporting.
///
/// `output` only appears once the whole container has been written; on any
/// error an existing file at `output` is left untouched.
pub fn create_archive_with_progress(
    input: &Path,
    output: &Path,
    password: &str,
    progress: &mut dyn ProgressSink,
) -> Result<CreateStats> {
    let sources = collect_sources(input)?;
    let entries = read_sources(&sources)?;
    let input_size = entries.iter().map(PayloadEntry::size).sum();
    let payload_size = payload::encoded_len(&entries) as u64;

    let envelope = archive::create_with_progress(&entries, password, progress)?;
    drop(entries);

    let archive_size = write_container(&envelope, output)?;
    log::debug!("wrote {} ({archive_size} bytes)", output.display());

    Ok(CreateStats {
        entries: sources.len(),
        input_size,
        payload_size,
        compressed_size: envelope.compressed_len() as u64,
        archive_size,
    })
}

fn write_container(envelope: &Envelope, output: &Path) -> Result<u64> {
    let dir = match output.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let tmp = NamedTempFile::new_in(dir)?;
    let mut writer = BufWriter::with_capacity(BUF_SIZE, tmp);
    envelope.write_to(&mut writer)?;
    let tmp = writer.into_inner().map_err(|e| e.into_error())?;
    tmp.as_file().sync_all()?;
    tmp.persist(output).map_err(|e| e.error)?;
    Ok(envelope.encoded_len() as u64)
}

// ---------------------------------------------------------------------------
// list / extract / inspect
// ---------------------------------------------------------------------------

/// Read and parse the container at `path`.
pub fn read_container(path: &Path) -> Result<Envelope> {
    let file = File::open(path)?;
    let mut reader = BufReader::with_capacity(BUF_SIZE, file);
    Envelope::read_from(&mut reader)
}

/// Names and sizes of the files in the archive at `path`.
pub fn list_archive(path: &Path, password: &str) -> Result<Vec<EntryInfo>> {
    let envelope = read_container(path)?;
    archive::list(&envelope, password)
}

/// Extract the archive at `path` into the directory `dest`.
pub fn extract_archive(path: &Path, dest: &Path, password: &str) -> Result<ExtractStats> {
    extract_archive_with_progress(path, dest, password, &mut NoProgress)
}

/// [`extract_archive`] with progress reporting.
///
/// Nothing is written unless the archive authenticates, its whole payload
/// parses and every entry name stays inside `dest`.
pub fn extract_archive_with_progress(
    path: &Path,
    dest: &Path,
    password: &str,
    progress: &mut dyn ProgressSink,
) -> Result<ExtractStats> {
    let envelope = read_container(path)?;
    let mut writer = DirWriter::new(dest);
    let entries = archive::extract_with_progress(&envelope, password, &mut writer, progress)?;

    Ok(ExtractStats {
        entries,
        output_size: writer.bytes_written(),
        archive_size: envelope.encoded_len() as u64,
    })
}

/// Describe the archive at `path` from its header alone.
pub fn inspect_archive(path: &Path) -> Result<ArchiveInfo> {
    let envelope = read_container(path)?;
    let payload_size = envelope.frequencies.total()?;
    Ok(ArchiveInfo {
        version: VERSION,
        nonce: envelope.nonce,
        payload_size,
        distinct_symbols: envelope.frequencies.distinct_symbols(),
        compressed_size: envelope.compressed_len() as u64,
        archive_size: envelope.encoded_len() as u64,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
