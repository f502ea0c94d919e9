//! Solution locking: the transposition cipher behind "scrambled" puzzles.
//!
//! The cipher operates on the **canonical solution**: the solution walked
//! in column-major order (`sol[j*w + i]`, outer loop over columns) with
//! black squares dropped.  A 4-digit key, every digit in 1..=9, drives
//! four rounds; each round shifts characters by one digit, rotates the
//! string, and interleaves its halves.  Locking stores the rotate-and-sum
//! checksum of the clear canonical string in the header so an unlock
//! attempt can be verified without ever storing the clear text.
//!
//! The key space is small enough to search exhaustively:
//! [`Puzzle::brute_force_unlock`] tries every zero-free code in
//! 1111..=9999 and stops at the first checksum hit.

use thiserror::Error;

use crate::cksum::cksum_region;
use crate::puzzle::Puzzle;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum UnlockError {
    #[error("puzzle is not locked")]
    NotLocked,
    #[error("puzzle is already locked")]
    AlreadyLocked,
    #[error("key does not match the locked-solution checksum")]
    WrongKey,
    #[error("every key digit must be in 1..=9")]
    ZeroDigit,
    #[error("solution is too short to rotate by a key digit")]
    TooShort,
    #[error("puzzle has no solution")]
    NoSolution,
    #[error("no key in 1111..=9999 unlocks this puzzle")]
    KeyNotFound,
}

/// Split a key into its decimal digits, most significant first.
fn key_digits(code: u16) -> Result<[u8; 4], UnlockError> {
    let digits = [
        (code / 1000 % 10) as u8,
        (code / 100 % 10) as u8,
        (code / 10 % 10) as u8,
        (code % 10) as u8,
    ];
    if digits.contains(&0) {
        return Err(UnlockError::ZeroDigit);
    }
    Ok(digits)
}

/// The interleave applied during an unlock round: the first half of the
/// output receives the odd-indexed input characters, the second half the
/// even-indexed ones.
fn unscramble_step(input: &[u8]) -> Vec<u8> {
    let len = input.len();
    let half = len / 2;
    let mut out = vec![0u8; len];
    for (i, &c) in input.iter().enumerate() {
        let idx = if i % 2 == 0 { half + i / 2 } else { i / 2 };
        out[idx] = c;
    }
    out
}

/// Exact inverse of [`unscramble_step`]; used when locking.
fn scramble_step(input: &[u8]) -> Vec<u8> {
    let len = input.len();
    let half = len / 2;
    let mut out = Vec::with_capacity(len);
    for i in 0..len {
        let src = if i % 2 == 0 { half + i / 2 } else { i / 2 };
        out.push(input[src]);
    }
    out
}

/// Move the trailing `k` characters to the front, undoing [`shift`].
fn unshift(input: &[u8], k: usize) -> Option<Vec<u8>> {
    let len = input.len();
    if k > len {
        return None;
    }
    let mut out = Vec::with_capacity(len);
    out.extend_from_slice(&input[len - k..]);
    out.extend_from_slice(&input[..len - k]);
    Some(out)
}

/// Move the leading `k` characters to the end.
fn shift(input: &[u8], k: usize) -> Option<Vec<u8>> {
    let len = input.len();
    if k > len {
        return None;
    }
    let mut out = Vec::with_capacity(len);
    out.extend_from_slice(&input[k..]);
    out.extend_from_slice(&input[..k]);
    Some(out)
}

impl Puzzle {
    /// The solution in column-major order with black squares dropped.
    pub(crate) fn canonical_solution(&self) -> Option<Vec<u8>> {
        let sol = self.solution.as_deref()?;
        let w = self.header.width as usize;
        let h = self.header.height as usize;
        let mut out = Vec::with_capacity(sol.len());
        for i in 0..w {
            for j in 0..h {
                let c = *sol.get(j * w + i)?;
                if c != b'.' {
                    out.push(c);
                }
            }
        }
        Some(out)
    }

    /// Write `letters` back into the solution at the canonical positions.
    fn set_canonical_solution(&mut self, letters: &[u8]) {
        let w = self.header.width as usize;
        let h = self.header.height as usize;
        let Some(sol) = self.solution.as_mut() else {
            return;
        };
        let mut next = letters.iter();
        for i in 0..w {
            for j in 0..h {
                if let Some(cell) = sol.get_mut(j * w + i) {
                    if *cell != b'.' {
                        if let Some(&l) = next.next() {
                            *cell = l;
                        }
                    }
                }
            }
        }
    }

    /// Scramble the solution under `code` and mark the puzzle locked.
    /// The stored lock checksum is computed over the clear canonical
    /// string before any transformation.
    pub fn lock(&mut self, code: u16) -> Result<(), UnlockError> {
        if self.is_locked() {
            return Err(UnlockError::AlreadyLocked);
        }
        let digits = key_digits(code)?;
        let clear = self.canonical_solution().ok_or(UnlockError::NoSolution)?;
        let cksum = cksum_region(&clear, 0);

        let mut work = clear;
        for &d in &digits {
            for (j, c) in work.iter_mut().enumerate() {
                let mut v = c.wrapping_add(digits[j % 4]);
                if v > b'Z' {
                    v -= 26;
                }
                *c = v;
            }
            work = shift(&work, d as usize).ok_or(UnlockError::TooShort)?;
            work = scramble_step(&work);
        }

        self.set_canonical_solution(&work);
        self.set_lock(cksum);
        Ok(())
    }

    /// Attempt to unlock with `code`.  The decode runs in full before the
    /// candidate is checked against the stored checksum; on a mismatch the
    /// puzzle is left untouched and [`UnlockError::WrongKey`] is returned.
    pub fn unlock(&mut self, code: u16) -> Result<(), UnlockError> {
        if !self.is_locked() {
            return Err(UnlockError::NotLocked);
        }
        let digits = key_digits(code)?;
        let mut work = self.canonical_solution().ok_or(UnlockError::NoSolution)?;

        for &d in digits.iter().rev() {
            work = unscramble_step(&work);
            work = unshift(&work, d as usize).ok_or(UnlockError::TooShort)?;
            for (j, c) in work.iter_mut().enumerate() {
                let mut v = c.wrapping_sub(digits[j % 4]);
                if v < b'A' {
                    v = v.wrapping_add(26);
                }
                *c = v;
            }
        }

        let stripped: Vec<u8> = work.iter().copied().filter(|&c| c != b'.').collect();
        if cksum_region(&stripped, 0) != self.header.scrambled_cksum {
            return Err(UnlockError::WrongKey);
        }

        self.set_canonical_solution(&work);
        self.set_lock(0);
        Ok(())
    }

    /// Search the whole key space.  Codes containing a zero digit are
    /// skipped outright — the verifier would reject them anyway — and a
    /// digit too large to rotate a short solution only disqualifies that
    /// code.  Returns the first code that unlocks the puzzle.
    pub fn brute_force_unlock(&mut self) -> Result<u16, UnlockError> {
        if !self.is_locked() {
            return Err(UnlockError::NotLocked);
        }
        for code in 1111u16..=9999 {
            if key_digits(code).is_err() {
                continue;
            }
            match self.unlock(code) {
                Ok(()) => return Ok(code),
                Err(UnlockError::WrongKey | UnlockError::TooShort) => continue,
                Err(e) => return Err(e),
            }
        }
        Err(UnlockError::KeyNotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 5x5 board whose last column is black; the canonical string reads
    /// the first four columns top to bottom.
    fn five_by_five() -> Puzzle {
        let mut p = Puzzle::new();
        p.set_width(5);
        p.set_height(5);
        p.set_solution(b"PLTA.IOEB.ZVSC.ZETD.ARSE.");
        p.set_grid(b"----.----.----.----.----.");
        p
    }

    #[test]
    fn canonical_order_is_column_major_without_blacks() {
        let p = five_by_five();
        assert_eq!(p.canonical_solution().unwrap(), b"PIZZALOVERTESTSABCDE");
    }

    #[test]
    fn steps_invert_each_other() {
        for s in [&b"AB"[..], b"ABCDE", b"PIZZALOVERTESTSABCDE"] {
            assert_eq!(scramble_step(&unscramble_step(s)), s);
            assert_eq!(unscramble_step(&scramble_step(s)), s);
        }
    }

    #[test]
    fn unscramble_interleaves_halves() {
        // Even positions land in the second half, odd in the first.
        assert_eq!(unscramble_step(b"ABCD"), b"BDAC");
        assert_eq!(unscramble_step(b"ABCDE"), b"BDACE");
    }

    #[test]
    fn shift_roundtrips_for_every_offset() {
        let s = b"ABCDEFG";
        for k in 0..=s.len() {
            let shifted = shift(s, k).unwrap();
            assert_eq!(unshift(&shifted, k).unwrap(), s);
        }
        assert_eq!(shift(s, 8), None);
        assert_eq!(shift(b"ABC", 2).unwrap(), b"CAB");
    }

    #[test]
    fn key_digits_reject_zeroes() {
        assert_eq!(key_digits(2718), Ok([2, 7, 1, 8]));
        assert_eq!(key_digits(1011), Err(UnlockError::ZeroDigit));
        assert_eq!(key_digits(999), Err(UnlockError::ZeroDigit));
    }

    #[test]
    fn lock_then_unlock_restores_solution() {
        let mut p = five_by_five();
        let original = p.solution().unwrap().to_vec();

        p.lock(2718).unwrap();
        assert!(p.is_locked());
        assert_eq!(p.header.scrambled_tag, 4);
        assert_ne!(p.solution().unwrap(), &original[..]);
        // Black squares never move.
        for row in 0..5 {
            assert_eq!(p.solution().unwrap()[row * 5 + 4], b'.');
        }

        assert_eq!(p.unlock(1111), Err(UnlockError::WrongKey));
        assert!(p.is_locked());

        p.unlock(2718).unwrap();
        assert_eq!(p.solution().unwrap(), &original[..]);
        assert_eq!(p.header.scrambled_tag, 0);
        assert_eq!(p.locked_cksum(), 0);
    }

    #[test]
    fn unlock_demands_a_locked_puzzle() {
        let mut p = five_by_five();
        assert_eq!(p.unlock(2718), Err(UnlockError::NotLocked));
        p.lock(2718).unwrap();
        assert_eq!(p.lock(2718), Err(UnlockError::AlreadyLocked));
        assert_eq!(p.unlock(2708), Err(UnlockError::ZeroDigit));
    }

    #[test]
    fn brute_force_finds_the_key() {
        let mut p = five_by_five();
        let original = p.solution().unwrap().to_vec();
        p.lock(1212).unwrap();
        assert_eq!(p.brute_force_unlock().unwrap(), 1212);
        assert_eq!(p.solution().unwrap(), &original[..]);
        assert!(!p.is_locked());
    }
}
