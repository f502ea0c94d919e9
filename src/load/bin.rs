//! Binary `.PUZ` loader.
//!
//! Layout: 0x34-byte header, solution and grid boards, NUL-terminated
//! title/author/copyright, `clue_count` NUL-terminated clues, optional
//! NUL-terminated notes, then a loop of framed sections
//! (`TAG[4] | len[2 LE] | cksum[2 LE] | payload | NUL`).  Sections may
//! come in any order except that RTBL must immediately follow GRBS.
//! Unknown tags are skipped with a warning.

use tracing::warn;

use crate::bytes::Reader;
use crate::header::{Header, HEADER_SIZE};
use crate::load::LoadError;
use crate::puzzle::{Puzzle, MAX_REBUS_SIZE};

pub(crate) fn load_bin(buf: &[u8]) -> Result<Puzzle, LoadError> {
    if buf.len() < HEADER_SIZE {
        return Err(LoadError::HeaderTooShort(buf.len()));
    }

    let mut puz = Puzzle::new();
    puz.header = Header::read(&buf[..HEADER_SIZE])?;

    let area = puz.header.board_area();
    let mut r = Reader::new(&buf[HEADER_SIZE..]);

    let solution = r.take(area).ok_or(LoadError::Truncated("solution"))?;
    puz.solution = Some(solution.to_vec());
    let grid = r.take(area).ok_or(LoadError::Truncated("grid"))?;
    puz.grid = Some(grid.to_vec());

    puz.title = r
        .cstring()
        .ok_or(LoadError::UnterminatedString("title"))?
        .to_vec();
    puz.author = r
        .cstring()
        .ok_or(LoadError::UnterminatedString("author"))?
        .to_vec();
    puz.copyright = r
        .cstring()
        .ok_or(LoadError::UnterminatedString("copyright"))?
        .to_vec();

    let expected = puz.header.clue_count;
    for found in 0..expected {
        let clue = r.cstring().ok_or(LoadError::ClueShortfall {
            expected,
            found,
        })?;
        puz.clues.push(clue.to_vec());
    }

    if r.remaining() > 0 {
        puz.notes = r
            .cstring()
            .ok_or(LoadError::UnterminatedString("notes"))?
            .to_vec();
    }

    while r.remaining() >= 6 {
        let tag = r.tag().ok_or(LoadError::Truncated("section tag"))?;
        let len = r.read_u16().ok_or(LoadError::Truncated("section length"))? as usize;
        match &tag {
            b"GRBS" => load_grbs(&mut puz, &mut r)?,
            b"LTIM" => load_ltim(&mut puz, &mut r, len)?,
            b"GEXT" => load_gext(&mut puz, &mut r)?,
            b"RUSR" => load_rusr(&mut puz, &mut r)?,
            other => {
                warn!(
                    "skipping unknown board section {} ({len} bytes)",
                    String::from_utf8_lossy(other)
                );
                // A truncated trailer here is tolerated; the loop ends.
                if r.skip(len + 1).is_none() {
                    break;
                }
            }
        }
    }

    Ok(puz)
}

/// GRBS, and the RTBL that must follow it when any square carries a
/// rebus key.  An all-zero rebus grid is noise left by some writers and
/// is dropped; a trailing RTBL is then consumed but ignored.
fn load_grbs(puz: &mut Puzzle, r: &mut Reader<'_>) -> Result<(), LoadError> {
    let area = puz.header.board_area();

    puz.grbs_cksum = r.read_u16().ok_or(LoadError::Truncated("GRBS checksum"))?;
    let cells = r.take(area).ok_or(LoadError::Truncated("GRBS grid"))?;
    r.skip(1).ok_or(LoadError::Truncated("GRBS terminator"))?;

    let any_rebus = cells.iter().any(|&b| b != 0);
    if any_rebus {
        puz.grbs = Some(cells.to_vec());
    }

    if r.peek(4).is_some_and(|t| t == b"RTBL") {
        r.skip(4).ok_or(LoadError::Truncated("RTBL tag"))?;
        let strsz = r.read_u16().ok_or(LoadError::Truncated("RTBL length"))? as usize;
        let cksum = r.read_u16().ok_or(LoadError::Truncated("RTBL checksum"))?;
        let payload = r.take(strsz).ok_or(LoadError::Truncated("RTBL payload"))?;
        r.skip(1).ok_or(LoadError::Truncated("RTBL terminator"))?;
        if any_rebus {
            puz.rtbl_cksum = cksum;
            puz.set_rebus_table_str(payload);
        }
    } else if any_rebus {
        return Err(LoadError::MissingRebusTable);
    }

    Ok(())
}

fn load_ltim(puz: &mut Puzzle, r: &mut Reader<'_>, len: usize) -> Result<(), LoadError> {
    puz.ltim_cksum = r.read_u16().ok_or(LoadError::Truncated("LTIM checksum"))?;
    let payload = r.take(len).ok_or(LoadError::Truncated("LTIM payload"))?;
    r.skip(1).ok_or(LoadError::Truncated("LTIM terminator"))?;
    // Stop at an embedded NUL; the declared length is not trusted further.
    let end = payload.iter().position(|&b| b == 0).unwrap_or(len);
    puz.ltim = Some(payload[..end].to_vec());
    Ok(())
}

fn load_gext(puz: &mut Puzzle, r: &mut Reader<'_>) -> Result<(), LoadError> {
    let area = puz.header.board_area();
    puz.gext_cksum = r.read_u16().ok_or(LoadError::Truncated("GEXT checksum"))?;
    let cells = r.take(area).ok_or(LoadError::Truncated("GEXT grid"))?;
    r.skip(1).ok_or(LoadError::Truncated("GEXT terminator"))?;
    puz.gext = Some(cells.to_vec());
    Ok(())
}

fn load_rusr(puz: &mut Puzzle, r: &mut Reader<'_>) -> Result<(), LoadError> {
    let area = puz.header.board_area();
    puz.rusr_cksum = r.read_u16().ok_or(LoadError::Truncated("RUSR checksum"))?;

    let mut cells = Vec::with_capacity(area);
    let mut payload_sz = 0usize;
    for _ in 0..area {
        let s = r
            .cstring()
            .ok_or(LoadError::UnterminatedString("RUSR cell"))?;
        if s.is_empty() {
            cells.push(None);
            payload_sz += 1;
        } else {
            let mut owned = s.to_vec();
            owned.truncate(MAX_REBUS_SIZE);
            payload_sz += owned.len() + 1;
            cells.push(Some(owned));
        }
    }
    r.skip(1).ok_or(LoadError::Truncated("RUSR terminator"))?;

    puz.rusr = Some(cells);
    puz.rusr_sz = payload_sz;
    Ok(())
}
