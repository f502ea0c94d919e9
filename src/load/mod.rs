//! Puzzle ingestion — binary container and plain-text dialect.
//!
//! [`Puzzle::load`] accepts a contiguous byte buffer and a [`FileKind`].
//! With [`FileKind::Unknown`] the format is sniffed: a buffer is binary
//! unless it opens with `<` and the byte at 0x0D (the final NUL of the
//! binary file magic) is non-zero.  An explicit kind that contradicts the
//! sniff is rejected rather than misparsed.
//!
//! Checksum verification is deliberately not part of loading: a file with
//! stale sums still parses, and the caller decides policy via
//! [`Puzzle::cksums_check`].

mod bin;
mod text;

use std::io;
use thiserror::Error;

use crate::puzzle::{Puzzle, PuzzleError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Binary,
    Text,
    Unknown,
}

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("buffer holds {0} bytes, smaller than the 0x34-byte header")]
    HeaderTooShort(usize),
    #[error("puzzle truncated while reading {0}")]
    Truncated(&'static str),
    #[error("no NUL terminator for {0}")]
    UnterminatedString(&'static str),
    #[error("ran out of clues: header promised {expected}, body held {found}")]
    ClueShortfall { expected: u16, found: u16 },
    #[error("rebus grid has entries but no rebus table follows")]
    MissingRebusTable,
    #[error("malformed <SIZE> body, expected WxH")]
    MalformedSize,
    #[error("<GRID> body is {got} cells, board needs {want}")]
    GridLength { got: usize, want: usize },
    #[error("unexpected delimiter line: {0}")]
    BadDelimiter(String),
    #[error("too many clue lines for a puzzle")]
    ClueOverflow,
    #[error("explicit file kind does not match the buffer contents")]
    KindMismatch,
    #[error(transparent)]
    Puzzle(#[from] PuzzleError),
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
}

fn guess_kind(buf: &[u8]) -> FileKind {
    // The binary magic "ACROSS&DOWN\0" ends at 0x0D; text files open with
    // a '<' delimiter and have printable bytes there.
    let text = buf.first() == Some(&b'<') && buf.get(0x0D).is_some_and(|&b| b != 0);
    if text {
        FileKind::Text
    } else {
        FileKind::Binary
    }
}

impl Puzzle {
    /// Parse a puzzle out of `buf`.  The buffer is not retained; it may be
    /// unmapped or dropped as soon as this returns.
    pub fn load(kind: FileKind, buf: &[u8]) -> Result<Puzzle, LoadError> {
        let guess = guess_kind(buf);
        if kind != FileKind::Unknown && kind != guess {
            return Err(LoadError::KindMismatch);
        }
        if guess == FileKind::Text {
            text::load_text(buf)
        } else {
            bin::load_bin(buf)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sniffs_binary_for_short_or_magic_buffers() {
        assert_eq!(guess_kind(b""), FileKind::Binary);
        assert_eq!(guess_kind(b"\x12\x34ACROSS&DOWN\0junk"), FileKind::Binary);
        assert_eq!(guess_kind(b"<ACROSS PUZZLE>\n<TITLE>\n"), FileKind::Text);
        // '<' but inside a binary magic region: byte 0x0D is NUL.
        assert_eq!(guess_kind(b"<\x00ACROSS&DOWN\0x"), FileKind::Binary);
    }

    #[test]
    fn explicit_kind_must_match() {
        let err = Puzzle::load(FileKind::Text, b"\x00\x00ACROSS&DOWN\0").unwrap_err();
        assert!(matches!(err, LoadError::KindMismatch));
    }
}
