// Archive operations over in-memory entries and envelopes.
//
// create:  entries -> framed payload -> huffman -> AES-GCM -> Envelope
// list:    Envelope -> AES-GCM open -> huffman -> skip-mode parse -> names
// extract: Envelope -> AES-GCM open -> huffman -> full parse -> EntryWriter
//
// Each call is self-contained: the tree and code table are rebuilt from the
// frequency table every time and nothing is cached between archives.

use std::io;

use crate::container::envelope::Envelope;
use crate::container::key::ArchiveKey;
use crate::container::payload::{self, PayloadEntry};
use crate::error::Result;
use crate::huffman;

// ---------------------------------------------------------------------------
// Collaborators
// ---------------------------------------------------------------------------

/// Coarse stage of an operation, reported to a [`ProgressSink`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Pack,
    Compress,
    Encrypt,
    Decrypt,
    Decompress,
    Extract,
}

impl Phase {
    pub fn label(&self) -> &'static str {
        match self {
            Phase::Pack => "Packing",
            Phase::Compress => "Compressing",
            Phase::Encrypt => "Encrypting",
            Phase::Decrypt => "Decrypting",
            Phase::Decompress => "Decompressing",
            Phase::Extract => "Extracting",
        }
    }
}

/// Receives `(done, total)` byte counts at phase checkpoints.
///
/// Purely observational: nothing a sink does affects the operation.
pub trait ProgressSink {
    fn report(&mut self, phase: Phase, done: u64, total: u64);
}

/// Sink that ignores every report.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&mut self, _phase: Phase, _done: u64, _total: u64) {}
}

impl<F: FnMut(Phase, u64, u64)> ProgressSink for F {
    fn report(&mut self, phase: Phase, done: u64, total: u64) {
        self(phase, done, total)
    }
}

/// Destination for extracted entries.
pub trait EntryWriter {
    /// Refuse `name` without writing anything. Every entry is checked before
    /// the first [`write_entry`](Self::write_entry) call.
    fn check_name(&self, _name: &str) -> io::Result<()> {
        Ok(())
    }

    /// Store `content` under the relative `/`-separated `name`, replacing
    /// anything already there.
    fn write_entry(&mut self, name: &str, content: &[u8]) -> io::Result<()>;
}

/// Collects entries in memory.
impl EntryWriter for Vec<PayloadEntry> {
    fn write_entry(&mut self, name: &str, content: &[u8]) -> io::Result<()> {
        self.push(PayloadEntry::new(name, content));
        Ok(())
    }
}

/// Name and size of an archived file, as reported by [`list`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryInfo {
    pub name: String,
    pub size: u64,
}

// ---------------------------------------------------------------------------
// Create
// ---------------------------------------------------------------------------

/// Pack, compress and seal `entries` under `password`.
pub fn create(entries: &[PayloadEntry], password: &str) -> Result<Envelope> {
    create_with_progress(entries, password, &mut NoProgress)
}

/// [`create`] with progress reporting.
pub fn create_with_progress(
    entries: &[PayloadEntry],
    password: &str,
    progress: &mut dyn ProgressSink,
) -> Result<Envelope> {
    for entry in entries {
        payload::validate_name(&entry.name)?;
    }

    let total = payload::encoded_len(entries) as u64;
    let mut framed = Vec::with_capacity(total as usize);
    for entry in entries {
        payload::push_entry(&mut framed, entry)?;
        progress.report(Phase::Pack, framed.len() as u64, total);
    }
    log::debug!("packed {} entries into {} payload bytes", entries.len(), framed.len());

    let (frequencies, compressed) = huffman::compress(&framed)?;
    progress.report(Phase::Compress, total, total);
    log::debug!(
        "compressed {} -> {} bytes ({} distinct symbols)",
        framed.len(),
        compressed.len(),
        frequencies.distinct_symbols()
    );

    let key = ArchiveKey::from_password(password);
    let envelope = Envelope::seal(&key, frequencies, &compressed)?;
    progress.report(Phase::Encrypt, total, total);
    log::debug!("sealed {} ciphertext bytes", envelope.ciphertext.len());

    Ok(envelope)
}

// ---------------------------------------------------------------------------
// Open
// ---------------------------------------------------------------------------

/// Decrypt and decompress the framed payload of `envelope`.
///
/// Fails with `AuthenticationFailure` before any decompression if the
/// password is wrong or the archive was altered.
pub fn open_payload(envelope: &Envelope, password: &str) -> Result<Vec<u8>> {
    open_payload_with_progress(envelope, password, &mut NoProgress)
}

fn open_payload_with_progress(
    envelope: &Envelope,
    password: &str,
    progress: &mut dyn ProgressSink,
) -> Result<Vec<u8>> {
    let key = ArchiveKey::from_password(password);
    let compressed = envelope.open(&key)?;
    let ciphertext_len = envelope.ciphertext.len() as u64;
    progress.report(Phase::Decrypt, ciphertext_len, ciphertext_len);
    log::debug!("opened {} compressed bytes", compressed.len());

    let framed = huffman::decompress(&compressed, &envelope.frequencies)?;
    progress.report(Phase::Decompress, framed.len() as u64, framed.len() as u64);
    log::debug!("decompressed {} payload bytes", framed.len());

    Ok(framed)
}

/// Names and sizes of every entry, in archive order.
pub fn list(envelope: &Envelope, password: &str) -> Result<Vec<EntryInfo>> {
    let framed = open_payload(envelope, password)?;
    Ok(payload::list_entries(&framed)?
        .into_iter()
        .map(|(name, size)| EntryInfo { name, size })
        .collect())
}

// ---------------------------------------------------------------------------
// Extract
// ---------------------------------------------------------------------------

/// Hand every entry to `writer`; returns the number of entries written.
pub fn extract(envelope: &Envelope, password: &str, writer: &mut dyn EntryWriter) -> Result<usize> {
    extract_with_progress(envelope, password, writer, &mut NoProgress)
}

/// [`extract`] with progress reporting.
///
/// The whole payload is parsed and every name passes
/// [`EntryWriter::check_name`] before the first write, so a corrupt archive
/// or a refused name produces no output at all.
pub fn extract_with_progress(
    envelope: &Envelope,
    password: &str,
    writer: &mut dyn EntryWriter,
    progress: &mut dyn ProgressSink,
) -> Result<usize> {
    let framed = open_payload_with_progress(envelope, password, progress)?;
    let entries = payload::decode_entries(&framed)?;
    for entry in &entries {
        writer.check_name(entry.name)?;
    }

    let total: u64 = entries.iter().map(|e| e.size()).sum();
    log::debug!("payload valid, writing {} entries", entries.len());
    let mut done = 0u64;
    for entry in &entries {
        writer.write_entry(entry.name, entry.content)?;
        done += entry.size();
        progress.report(Phase::Extract, done, total);
        log::trace!("wrote {} ({} bytes)", entry.name, entry.size());
    }
    log::debug!("extracted {} entries, {total} bytes", entries.len());

    Ok(entries.len())
}
