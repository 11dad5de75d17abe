//! Pseudo-file access
//!
//! Everything the engine does to the hardware goes through [`PseudoFs`]:
//! existence probes, short reads and short writes. [`SysFs`] is the real
//! implementation over `std::fs`; tests substitute temp directories or mocks.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::Path;

/// Minimal file interface exposed by kernel drivers under `/sys`
#[cfg_attr(test, mockall::automock)]
pub trait PseudoFs {
    /// Whether `path` exists
    fn exists(&self, path: &Path) -> bool;

    /// Read at most `max_len` bytes from `path` as (lossy) UTF-8
    fn read_prefix(&self, path: &Path, max_len: usize) -> io::Result<String>;

    /// Write `text` to an existing file at `path`
    fn write_text(&self, path: &Path, text: &str) -> io::Result<()>;
}

/// [`PseudoFs`] over the real filesystem
#[derive(Debug, Default, Clone, Copy)]
pub struct SysFs;

impl PseudoFs for SysFs {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn read_prefix(&self, path: &Path, max_len: usize) -> io::Result<String> {
        let mut buf = Vec::with_capacity(max_len);
        File::open(path)?
            .take(max_len as u64)
            .read_to_end(&mut buf)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    fn write_text(&self, path: &Path, text: &str) -> io::Result<()> {
        // sysfs attributes always exist; never create files
        let mut file = OpenOptions::new().write(true).truncate(true).open(path)?;
        file.write_all(text.as_bytes())
    }
}
