//! The in-memory puzzle and its typed accessors.
//!
//! A [`Puzzle`] owns every heap-backed field; the loaders copy out of the
//! input buffer and never keep references into it.  Board-shaped fields
//! (solution, grid, rebus grid, extras, user rebus) are all `width × height`
//! bytes in row-major order.

use thiserror::Error;
use tracing::warn;

use crate::cksum::Cksums;
use crate::header::Header;

/// Longest accepted rebus string, in bytes.  Longer input is truncated.
pub const MAX_REBUS_SIZE: usize = 100;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum PuzzleError {
    #[error("clue index {0} out of range")]
    ClueIndex(usize),
    #[error("rebus table index {0} out of range")]
    RebusIndex(usize),
    #[error("clue count is already set; clear the clues first")]
    CluesAlreadySet,
    #[error("expected {want} bytes for a {width}x{height} board, got {got}")]
    BadBoardLength {
        width: u8,
        height: u8,
        want: usize,
        got: usize,
    },
}

#[derive(Debug, Clone, Default)]
pub struct Puzzle {
    pub header: Header,

    pub(crate) solution: Option<Vec<u8>>,
    pub(crate) grid: Option<Vec<u8>>,

    pub(crate) title: Vec<u8>,
    pub(crate) author: Vec<u8>,
    pub(crate) copyright: Vec<u8>,
    pub(crate) clues: Vec<Vec<u8>>,
    pub(crate) notes: Vec<u8>,

    // Optional trailing sections.
    pub(crate) grbs: Option<Vec<u8>>,
    pub(crate) rtbl: Vec<Vec<u8>>,
    pub(crate) ltim: Option<Vec<u8>>,
    pub(crate) gext: Option<Vec<u8>>,
    pub(crate) rusr: Option<Vec<Option<Vec<u8>>>>,
    /// Size of the RUSR payload in its binary form, excluding the section's
    /// final trailing NUL.  Cached because the sizer and the checksum both
    /// need it.
    pub(crate) rusr_sz: usize,

    // Section checksums as parsed from the file (or committed).
    pub(crate) grbs_cksum: u16,
    pub(crate) rtbl_cksum: u16,
    pub(crate) ltim_cksum: u16,
    pub(crate) gext_cksum: u16,
    pub(crate) rusr_cksum: u16,

    /// Shadow values filled in by `cksums_calc`.
    pub(crate) calc: Cksums,
}

impl Puzzle {
    /// An all-empty puzzle with the file magic, version `1.2`, and
    /// `x_unk_30 = 1` preset.
    pub fn new() -> Self {
        Self::default()
    }

    fn board_len_check(&self, got: usize) -> Result<(), PuzzleError> {
        let want = self.header.board_area();
        if got != want {
            return Err(PuzzleError::BadBoardLength {
                width: self.header.width,
                height: self.header.height,
                want,
                got,
            });
        }
        Ok(())
    }

    // ── Dimensions ───────────────────────────────────────────────────────────

    pub fn width(&self) -> u8 {
        self.header.width
    }

    pub fn set_width(&mut self, val: u8) {
        self.header.width = val;
    }

    pub fn height(&self) -> u8 {
        self.header.height
    }

    pub fn set_height(&mut self, val: u8) {
        self.header.height = val;
    }

    // ── Boards ───────────────────────────────────────────────────────────────

    pub fn solution(&self) -> Option<&[u8]> {
        self.solution.as_deref()
    }

    pub fn set_solution(&mut self, val: &[u8]) -> &[u8] {
        self.solution = Some(val.to_vec());
        self.solution.as_deref().unwrap_or(&[])
    }

    pub fn grid(&self) -> Option<&[u8]> {
        self.grid.as_deref()
    }

    pub fn set_grid(&mut self, val: &[u8]) -> &[u8] {
        self.grid = Some(val.to_vec());
        self.grid.as_deref().unwrap_or(&[])
    }

    // ── Metadata strings ─────────────────────────────────────────────────────

    pub fn title(&self) -> &[u8] {
        &self.title
    }

    pub fn set_title(&mut self, val: &[u8]) {
        self.title = val.to_vec();
    }

    pub fn author(&self) -> &[u8] {
        &self.author
    }

    pub fn set_author(&mut self, val: &[u8]) {
        self.author = val.to_vec();
    }

    pub fn copyright(&self) -> &[u8] {
        &self.copyright
    }

    pub fn set_copyright(&mut self, val: &[u8]) {
        self.copyright = val.to_vec();
    }

    pub fn notes(&self) -> &[u8] {
        &self.notes
    }

    pub fn set_notes(&mut self, val: &[u8]) {
        self.notes = val.to_vec();
    }

    // ── Clues ────────────────────────────────────────────────────────────────

    pub fn clue_count(&self) -> u16 {
        self.header.clue_count
    }

    /// Allocate the clue list.  One-shot: a puzzle that already has clues
    /// must be cleared with [`Puzzle::clear_clues`] before resizing.
    pub fn set_clue_count(&mut self, count: u16) -> Result<(), PuzzleError> {
        if self.header.clue_count != 0 {
            return Err(PuzzleError::CluesAlreadySet);
        }
        self.clues = vec![Vec::new(); count as usize];
        self.header.clue_count = count;
        Ok(())
    }

    pub fn clear_clues(&mut self) {
        self.clues.clear();
        self.header.clue_count = 0;
    }

    /// The nth clue in the canonical order defined by the grid.
    pub fn clue(&self, n: usize) -> Option<&[u8]> {
        self.clues.get(n).map(Vec::as_slice)
    }

    pub fn set_clue(&mut self, n: usize, val: &[u8]) -> Result<(), PuzzleError> {
        let slot = self.clues.get_mut(n).ok_or(PuzzleError::ClueIndex(n))?;
        *slot = val.to_vec();
        Ok(())
    }

    // ── Rebus grid and table ─────────────────────────────────────────────────

    pub fn has_rebus(&self) -> bool {
        self.grbs.is_some()
    }

    /// Per-square rebus keys: 0 for none, otherwise a 1-based index whose
    /// value minus one matches the decimal key of a rebus table entry.
    pub fn rebus_grid(&self) -> Option<&[u8]> {
        self.grbs.as_deref()
    }

    pub fn set_rebus_grid(&mut self, val: &[u8]) -> Result<(), PuzzleError> {
        self.board_len_check(val.len())?;
        self.grbs = Some(val.to_vec());
        Ok(())
    }

    pub fn rebus_count(&self) -> usize {
        if !self.has_rebus() {
            return 0;
        }
        self.rtbl.len()
    }

    /// Allocate the rebus table with `count` empty entries.
    pub fn set_rebus_count(&mut self, count: usize) {
        self.rtbl = vec![Vec::new(); count];
    }

    /// The nth table entry, in list order (unrelated to the numeric keys).
    pub fn rebus_entry(&self, n: usize) -> Option<&[u8]> {
        self.rtbl.get(n).map(Vec::as_slice)
    }

    pub fn set_rebus_entry(&mut self, n: usize, val: &[u8]) -> Result<(), PuzzleError> {
        let slot = self.rtbl.get_mut(n).ok_or(PuzzleError::RebusIndex(n))?;
        *slot = val.to_vec();
        Ok(())
    }

    /// The table in its binary serialization: every entry followed by a
    /// `;`, including the last one.  The trailing `;` is load-bearing —
    /// the parser counts separators, and the RTBL checksum covers it.
    pub fn rebus_table_str(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for entry in &self.rtbl {
            out.extend_from_slice(entry);
            out.push(b';');
        }
        out
    }

    /// Replace the table from its binary serialization.  Anything after
    /// the final `;` is ignored.
    pub fn set_rebus_table_str(&mut self, val: &[u8]) {
        self.rtbl.clear();
        let mut rest = val;
        while let Some(pos) = rest.iter().position(|&b| b == b';') {
            self.rtbl.push(rest[..pos].to_vec());
            rest = &rest[pos + 1..];
        }
    }

    pub fn clear_rebus_table(&mut self) {
        self.rtbl.clear();
        self.rtbl_cksum = 0;
        self.calc.rtbl = 0;
    }

    // ── Timer ────────────────────────────────────────────────────────────────

    pub fn has_timer(&self) -> bool {
        self.ltim.is_some()
    }

    /// Elapsed seconds.  `None` when the puzzle has no timer; an
    /// ill-formed timer string reads as zero.
    pub fn timer_elapsed(&self) -> Option<u32> {
        let ltim = self.ltim.as_deref()?;
        match parse_timer(ltim) {
            Some((elapsed, _)) => Some(elapsed),
            None => {
                warn!("ill-formed timer section, reading elapsed time as 0");
                Some(0)
            }
        }
    }

    /// Stopped flag: 1 when the timer is stopped, 0 when running.  `None`
    /// when the puzzle has no timer; an ill-formed string reads as stopped.
    pub fn timer_stopped(&self) -> Option<u32> {
        let ltim = self.ltim.as_deref()?;
        match parse_timer(ltim) {
            Some((_, Some(stopped))) => Some(stopped),
            _ => {
                warn!("ill-formed timer section, reading stopped flag as 1");
                Some(1)
            }
        }
    }

    pub fn set_timer(&mut self, elapsed: u32, stopped: u32) -> &[u8] {
        self.ltim = Some(format!("{elapsed},{stopped}").into_bytes());
        self.ltim.as_deref().unwrap_or(&[])
    }

    // ── Extras (GEXT) ────────────────────────────────────────────────────────

    pub fn has_extras(&self) -> bool {
        self.gext.is_some()
    }

    /// Per-square flag bytes; bit 128 marks a circled square.
    pub fn extras(&self) -> Option<&[u8]> {
        self.gext.as_deref()
    }

    pub fn set_extras(&mut self, val: &[u8]) -> Result<(), PuzzleError> {
        self.board_len_check(val.len())?;
        self.gext = Some(val.to_vec());
        Ok(())
    }

    // ── User rebus (RUSR) ────────────────────────────────────────────────────

    pub fn has_user_rebus(&self) -> bool {
        self.rusr.is_some()
    }

    pub fn user_rebus(&self) -> Option<&[Option<Vec<u8>>]> {
        self.rusr.as_deref()
    }

    /// Install the per-square user rebus strings.  `cells` must hold one
    /// entry per square; strings longer than [`MAX_REBUS_SIZE`] are
    /// truncated.
    pub fn set_user_rebus(&mut self, cells: Vec<Option<Vec<u8>>>) -> Result<(), PuzzleError> {
        self.board_len_check(cells.len())?;
        let mut total = cells.len();
        let cells: Vec<Option<Vec<u8>>> = cells
            .into_iter()
            .map(|cell| {
                cell.map(|mut s| {
                    s.truncate(MAX_REBUS_SIZE);
                    total += s.len();
                    s
                })
            })
            .collect();
        self.rusr = Some(cells);
        self.rusr_sz = total;
        Ok(())
    }

    /// The RUSR payload in its binary form: one NUL-terminated string per
    /// square, empty squares contributing a lone NUL.  Exactly
    /// `rusr_sz` bytes.
    pub fn user_rebus_str(&self) -> Option<Vec<u8>> {
        let cells = self.rusr.as_deref()?;
        let mut out = Vec::with_capacity(self.rusr_sz);
        for cell in cells {
            if let Some(s) = cell {
                out.extend_from_slice(s);
            }
            out.push(0);
        }
        Some(out)
    }

    pub fn clear_user_rebus(&mut self) {
        self.rusr = None;
        self.rusr_sz = 0;
        self.rusr_cksum = 0;
        self.calc.rusr = 0;
    }

    // ── Lock state ───────────────────────────────────────────────────────────

    pub fn is_locked(&self) -> bool {
        self.header.scrambled_tag != 0
    }

    /// Checksum of the canonical solution, for locked puzzles.
    pub fn locked_cksum(&self) -> u16 {
        self.header.scrambled_cksum
    }

    /// Flip the lock flags.  A nonzero `cksum` marks the puzzle locked;
    /// zero clears both the tag and the stored checksum.
    pub fn set_lock(&mut self, cksum: u16) {
        if cksum != 0 {
            self.header.scrambled_tag = crate::header::SCRAMBLED_TAG_LOCKED;
            self.header.scrambled_cksum = cksum;
        } else {
            self.header.scrambled_tag = 0;
            self.header.scrambled_cksum = 0;
        }
    }
}

fn parse_timer(s: &[u8]) -> Option<(u32, Option<u32>)> {
    let (elapsed, rest) = ascii_u32(s)?;
    let stopped = rest
        .strip_prefix(b",")
        .and_then(|r| ascii_u32(r).map(|(v, _)| v));
    Some((elapsed, stopped))
}

/// Bounded ASCII decimal parse: leading digits only, overflow rejected.
fn ascii_u32(s: &[u8]) -> Option<(u32, &[u8])> {
    let end = s
        .iter()
        .position(|b| !b.is_ascii_digit())
        .unwrap_or(s.len());
    if end == 0 {
        return None;
    }
    let mut v: u32 = 0;
    for &b in &s[..end] {
        v = v.checked_mul(10)?.checked_add(u32::from(b - b'0'))?;
    }
    Some((v, &s[end..]))
}
