//! Loader for the plain-text puzzle dialect.
//!
//! # The state machine
//!
//! The file is a sequence of `<DELIMITER>` lines, each opening the next
//! section in a fixed order:
//!
//! ```text
//! <ACROSS PUZZLE> <TITLE> <AUTHOR> <COPYRIGHT> <SIZE> <GRID> <ACROSS> <DOWN>
//! ```
//!
//! Lines are read one at a time.  A line starting with `<` must equal the
//! delimiter of the next state exactly; anything else accumulates in the
//! current state's bucket.  On transition the bucket is folded into the
//! puzzle according to the state being left — concatenated for the string
//! sections, parsed as `WxH` for `<SIZE>`, turned into the solution (and a
//! derived all-`-` grid) for `<GRID>`.  The `<ACROSS>` bucket is carried
//! into `<DOWN>` so the clue list ends up across-then-down in one order.
//! End of input drives the machine through its remaining states.
//!
//! # Line framing
//!
//! `\n`, `\r`, `\r\n`, and the historical `\n\r` all terminate a line.
//! Whitespace at either edge of a line is insignificant.
//!
//! Checksums are computed and committed after the final state, so a text
//! load verifies clean.

use crate::load::LoadError;
use crate::puzzle::Puzzle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Init,
    File,
    Title,
    Author,
    Copyright,
    Size,
    Grid,
    Clue0,
    Clue1,
    Final,
}

impl State {
    fn next(self) -> State {
        match self {
            State::Init => State::File,
            State::File => State::Title,
            State::Title => State::Author,
            State::Author => State::Copyright,
            State::Copyright => State::Size,
            State::Size => State::Grid,
            State::Grid => State::Clue0,
            State::Clue0 => State::Clue1,
            State::Clue1 => State::Final,
            State::Final => State::Final,
        }
    }

    /// The delimiter line that opens this state.
    fn magic(self) -> Option<&'static [u8]> {
        match self {
            State::File => Some(b"<ACROSS PUZZLE>"),
            State::Title => Some(b"<TITLE>"),
            State::Author => Some(b"<AUTHOR>"),
            State::Copyright => Some(b"<COPYRIGHT>"),
            State::Size => Some(b"<SIZE>"),
            State::Grid => Some(b"<GRID>"),
            State::Clue0 => Some(b"<ACROSS>"),
            State::Clue1 => Some(b"<DOWN>"),
            State::Init | State::Final => None,
        }
    }
}

struct Lines<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Lines<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn next_line(&mut self) -> Option<Vec<u8>> {
        if self.pos >= self.buf.len() {
            return None;
        }
        // Leading whitespace, but never a line terminator.
        while self
            .buf
            .get(self.pos)
            .is_some_and(|&b| matches!(b, b' ' | b'\t' | 0x0B | 0x0C))
        {
            self.pos += 1;
        }
        let start = self.pos;
        while self
            .buf
            .get(self.pos)
            .is_some_and(|&b| b != b'\r' && b != b'\n')
        {
            self.pos += 1;
        }
        let mut end = self.pos;

        // Swallow the terminator; \r\n and \n\r count as one.
        if let Some(&t) = self.buf.get(self.pos) {
            self.pos += 1;
            if let Some(&u) = self.buf.get(self.pos) {
                if (t == b'\r' && u == b'\n') || (t == b'\n' && u == b'\r') {
                    self.pos += 1;
                }
            }
        }

        while end > start && self.buf[end - 1].is_ascii_whitespace() {
            end -= 1;
        }
        Some(self.buf[start..end].to_vec())
    }
}

pub(crate) fn load_text(buf: &[u8]) -> Result<Puzzle, LoadError> {
    let mut puz = Puzzle::new();
    let mut lines = Lines::new(buf);
    let mut bucket: Vec<Vec<u8>> = Vec::new();
    let mut state = State::Init;

    while state != State::Final {
        match lines.next_line() {
            Some(line) => {
                if line.first() == Some(&b'<') {
                    let expected = state.next().magic();
                    if expected != Some(line.as_slice()) {
                        return Err(LoadError::BadDelimiter(
                            String::from_utf8_lossy(&line).into_owned(),
                        ));
                    }
                    exit_state(state, &mut bucket, &mut puz)?;
                    state = state.next();
                } else {
                    bucket.push(line);
                }
            }
            // Input exhausted: fall through the remaining states.
            None => {
                exit_state(state, &mut bucket, &mut puz)?;
                state = state.next();
            }
        }
    }

    puz.cksums_commit();
    Ok(puz)
}

fn exit_state(state: State, bucket: &mut Vec<Vec<u8>>, puz: &mut Puzzle) -> Result<(), LoadError> {
    match state {
        State::Init | State::File => bucket.clear(),
        State::Title => {
            puz.set_title(&bucket.concat());
            bucket.clear();
        }
        State::Author => {
            puz.set_author(&bucket.concat());
            bucket.clear();
        }
        State::Copyright => {
            puz.set_copyright(&bucket.concat());
            bucket.clear();
        }
        State::Size => {
            let joined = bucket.concat();
            let (w, h) = parse_size(&joined).ok_or(LoadError::MalformedSize)?;
            puz.set_width(w);
            puz.set_height(h);
            bucket.clear();
        }
        State::Grid => {
            let solution = bucket.concat();
            let want = puz.header.board_area();
            if solution.len() != want {
                return Err(LoadError::GridLength {
                    got: solution.len(),
                    want,
                });
            }
            let grid: Vec<u8> = solution
                .iter()
                .map(|&c| if c == b'.' { b'.' } else { b'-' })
                .collect();
            puz.set_solution(&solution);
            puz.set_grid(&grid);
            bucket.clear();
        }
        // Across clues stay in the bucket; the down clues append to them
        // and both are installed when <DOWN> closes.
        State::Clue0 => {}
        State::Clue1 => {
            let count = u16::try_from(bucket.len()).map_err(|_| LoadError::ClueOverflow)?;
            puz.clear_clues();
            puz.set_clue_count(count)?;
            for (n, line) in bucket.iter().enumerate() {
                puz.set_clue(n, line)?;
            }
            bucket.clear();
        }
        State::Final => {}
    }
    Ok(())
}

fn parse_size(s: &[u8]) -> Option<(u8, u8)> {
    let x = s.iter().position(|&b| b == b'x')?;
    let w = parse_dim(&s[..x])?;
    let h = parse_dim(&s[x + 1..])?;
    Some((w, h))
}

fn parse_dim(s: &[u8]) -> Option<u8> {
    if s.is_empty() || !s.iter().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let mut v: u32 = 0;
    for &b in s {
        v = v.checked_mul(10)?.checked_add(u32::from(b - b'0'))?;
    }
    u8::try_from(v).ok()
}
