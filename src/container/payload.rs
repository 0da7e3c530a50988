// Multi-file payload framing.
//
// The plaintext payload is a plain concatenation of records, no padding:
//
//   u16 LE  name length
//   [u8]    name (UTF-8, forward-slash separated, not NUL-terminated)
//   u64 LE  content size
//   [u8]    content
//
// Parsing hands out borrowed views into the payload buffer; listing only
// advances a cursor over the content bytes.

use crate::error::{ArchiveError, Result};

/// Longest name the 16-bit length field can describe.
pub const MAX_NAME_LEN: usize = u16::MAX as usize;

/// Fixed bytes per record besides name and content.
const RECORD_OVERHEAD: usize = 2 + 8;

/// One archived file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadEntry {
    /// Relative path with `/` separators.
    pub name: String,
    pub content: Vec<u8>,
}

impl PayloadEntry {
    pub fn new(name: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }

    pub fn size(&self) -> u64 {
        self.content.len() as u64
    }
}

/// Borrowed view of one record inside a payload buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryRef<'a> {
    pub name: &'a str,
    pub content: &'a [u8],
}

impl EntryRef<'_> {
    pub fn size(&self) -> u64 {
        self.content.len() as u64
    }

    pub fn to_entry(&self) -> PayloadEntry {
        PayloadEntry::new(self.name, self.content)
    }
}

/// Reject names the length field cannot hold.
pub fn validate_name(name: &str) -> Result<()> {
    if name.len() > MAX_NAME_LEN {
        return Err(ArchiveError::NameTooLong {
            name: name.chars().take(64).collect(),
            len: name.len(),
            max: MAX_NAME_LEN,
        });
    }
    Ok(())
}

/// Exact serialized size of `entries`.
pub fn encoded_len<'a, I>(entries: I) -> usize
where
    I: IntoIterator<Item = &'a PayloadEntry>,
{
    entries
        .into_iter()
        .map(|e| RECORD_OVERHEAD + e.name.len() + e.content.len())
        .sum()
}

/// Serialize `entries` in order.
///
/// Every name is validated before anything is written, so an oversized name
/// fails the whole call up front.
pub fn encode_entries(entries: &[PayloadEntry]) -> Result<Vec<u8>> {
    for entry in entries {
        validate_name(&entry.name)?;
    }

    let mut buf = Vec::with_capacity(encoded_len(entries));
    for entry in entries {
        push_entry(&mut buf, entry)?;
    }
    Ok(buf)
}

/// Append one record to `buf`.
pub fn push_entry(buf: &mut Vec<u8>, entry: &PayloadEntry) -> Result<()> {
    validate_name(&entry.name)?;
    buf.extend_from_slice(&(entry.name.len() as u16).to_le_bytes());
    buf.extend_from_slice(entry.name.as_bytes());
    buf.extend_from_slice(&entry.size().to_le_bytes());
    buf.extend_from_slice(&entry.content);
    Ok(())
}

/// Iterator over the records of a payload buffer.
///
/// Yields `Err` once (and then stops) if the buffer ends inside a record or
/// a name is not UTF-8.
#[derive(Debug, Clone)]
pub struct Entries<'a> {
    buf: &'a [u8],
    pos: usize,
    failed: bool,
}

impl<'a> Entries<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self {
            buf,
            pos: 0,
            failed: false,
        }
    }

    /// Byte offset of the next record.
    pub fn position(&self) -> usize {
        self.pos
    }

    fn take(&mut self, len: usize, what: &str) -> Result<&'a [u8]> {
        let buf = self.buf;
        let start = self.pos;
        let end = start
            .checked_add(len)
            .filter(|&end| end <= buf.len())
            .ok_or_else(|| {
                ArchiveError::CorruptPayload(format!(
                    "truncated {what} at offset {start}: need {len} bytes, {} left",
                    buf.len() - start
                ))
            })?;
        self.pos = end;
        Ok(&buf[start..end])
    }

    fn take_array<const N: usize>(&mut self, what: &str) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N, what)?);
        Ok(out)
    }

    fn read_record(&mut self) -> Result<EntryRef<'a>> {
        let record_start = self.pos;

        let name_len = u16::from_le_bytes(self.take_array("name length")?);
        let name_bytes = self.take(name_len as usize, "name")?;
        let name = std::str::from_utf8(name_bytes).map_err(|_| {
            ArchiveError::CorruptPayload(format!(
                "entry name at offset {record_start} is not valid UTF-8"
            ))
        })?;

        let size = u64::from_le_bytes(self.take_array("content size")?);
        let size = usize::try_from(size).map_err(|_| {
            ArchiveError::CorruptPayload(format!("entry {name:?} declares {size} bytes"))
        })?;
        let content = self.take(size, "content")?;

        Ok(EntryRef { name, content })
    }
}

impl<'a> Iterator for Entries<'a> {
    type Item = Result<EntryRef<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.pos == self.buf.len() {
            return None;
        }
        let record = self.read_record();
        self.failed = record.is_err();
        Some(record)
    }
}

/// Parse every record, failing on the first malformed one.
pub fn decode_entries(buf: &[u8]) -> Result<Vec<EntryRef<'_>>> {
    Entries::new(buf).collect()
}

/// Name and size of every record, without touching content bytes.
pub fn list_entries(buf: &[u8]) -> Result<Vec<(String, u64)>> {
    Entries::new(buf)
        .map(|r| r.map(|e| (e.name.to_string(), e.size())))
        .collect()
}
