use std::ffi::OsString;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Fixed-size reads off a response body.
pub(crate) struct Chunks<R> {
    reader: R,
    buf: Vec<u8>,
    done: bool,
}

impl<R: Read> Chunks<R> {
    pub(crate) fn new(reader: R, chunk_size: usize) -> Self {
        Self {
            reader,
            buf: vec![0u8; chunk_size.max(1)],
            done: false,
        }
    }
}

impl<R: Read> Iterator for Chunks<R> {
    type Item = io::Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            match self.reader.read(&mut self.buf) {
                Ok(0) => {
                    self.done = true;
                    return None;
                }
                Ok(n) => return Some(Ok(self.buf[..n].to_vec())),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }
    }
}

/// Copy body chunks into `out`, skipping empty keep-alive chunks.
///
/// Read failures become [`Error::TransferInterrupted`]; write failures stay
/// local [`Error::Io`].
pub(crate) fn write_chunks<I, B, W>(
    url: &str,
    chunks: I,
    out: &mut W,
    mut on_chunk: impl FnMut(u64),
) -> Result<u64>
where
    I: IntoIterator<Item = io::Result<B>>,
    B: AsRef<[u8]>,
    W: Write,
{
    let mut written: u64 = 0;
    for chunk in chunks {
        let chunk = chunk.map_err(|source| Error::TransferInterrupted {
            url: url.to_string(),
            bytes_written: written,
            source,
        })?;
        let bytes = chunk.as_ref();
        if bytes.is_empty() {
            continue;
        }
        out.write_all(bytes)?;
        written += bytes.len() as u64;
        on_chunk(bytes.len() as u64);
    }
    Ok(written)
}

/// Sibling path the body is streamed into before the final rename.
pub(crate) fn part_path(destination: &Path) -> PathBuf {
    let mut name: OsString = destination
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| OsString::from("download"));
    name.push(".part");
    destination.with_file_name(name)
}
