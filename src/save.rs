//! Canonical binary serialization.
//!
//! The writer emits exactly the layout the binary loader consumes, using
//! whatever checksums are currently in the header and section fields —
//! call [`Puzzle::cksums_commit`] first when the puzzle has been built or
//! mutated in memory.  [`Puzzle::size`] predicts the emitted length
//! byte-for-byte, which keeps single-allocation saves honest.

use byteorder::{LittleEndian, WriteBytesExt};
use std::io::{self, Write};

use crate::header::HEADER_SIZE;
use crate::puzzle::Puzzle;

/// `TAG | len | cksum` framing plus the payload's trailing NUL.
const SECTION_OVERHEAD: usize = 4 + 2 + 2 + 1;

impl Puzzle {
    /// The exact length of this puzzle's binary serialization.
    pub fn size(&self) -> usize {
        let area = self.header.board_area();

        let mut sz = HEADER_SIZE;
        sz += area; // solution
        sz += area; // grid
        sz += self.title.len() + 1;
        sz += self.author.len() + 1;
        sz += self.copyright.len() + 1;
        for clue in &self.clues {
            sz += clue.len() + 1;
        }
        sz += self.notes.len() + 1;

        if self.has_rebus() {
            sz += SECTION_OVERHEAD + area;
            sz += SECTION_OVERHEAD + self.rebus_table_str().len();
        }
        if let Some(ltim) = &self.ltim {
            sz += SECTION_OVERHEAD + ltim.len();
        }
        if self.has_extras() {
            sz += SECTION_OVERHEAD + area;
        }
        if self.has_user_rebus() {
            sz += SECTION_OVERHEAD + self.rusr_sz;
        }
        sz
    }

    /// Serialize into `writer` in loader order: header, boards, metadata
    /// strings, clues, notes, then any present sections (RTBL glued to
    /// GRBS).
    pub fn write_to<W: Write>(&self, mut writer: W) -> io::Result<()> {
        self.header.write(&mut writer)?;

        writer.write_all(self.solution.as_deref().unwrap_or(&[]))?;
        writer.write_all(self.grid.as_deref().unwrap_or(&[]))?;

        for field in [&self.title, &self.author, &self.copyright] {
            writer.write_all(field)?;
            writer.write_u8(0)?;
        }
        for clue in &self.clues {
            writer.write_all(clue)?;
            writer.write_u8(0)?;
        }
        writer.write_all(&self.notes)?;
        writer.write_u8(0)?;

        if let Some(grbs) = &self.grbs {
            write_section(&mut writer, b"GRBS", self.grbs_cksum, grbs)?;
            let table = self.rebus_table_str();
            write_section(&mut writer, b"RTBL", self.rtbl_cksum, &table)?;
        }
        if let Some(ltim) = &self.ltim {
            write_section(&mut writer, b"LTIM", self.ltim_cksum, ltim)?;
        }
        if let Some(gext) = &self.gext {
            write_section(&mut writer, b"GEXT", self.gext_cksum, gext)?;
        }
        if self.has_user_rebus() {
            let payload = self.user_rebus_str().unwrap_or_default();
            write_section(&mut writer, b"RUSR", self.rusr_cksum, &payload)?;
        }

        Ok(())
    }

    /// Serialize into a fresh buffer of exactly [`Puzzle::size`] bytes.
    pub fn save(&self) -> io::Result<Vec<u8>> {
        let mut out = Vec::with_capacity(self.size());
        self.write_to(&mut out)?;
        Ok(out)
    }
}

fn write_section<W: Write>(
    writer: &mut W,
    tag: &[u8; 4],
    cksum: u16,
    payload: &[u8],
) -> io::Result<()> {
    writer.write_all(tag)?;
    writer.write_u16::<LittleEndian>(payload.len() as u16)?;
    writer.write_u16::<LittleEndian>(cksum)?;
    writer.write_all(payload)?;
    writer.write_u8(0)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::load::FileKind;

    fn full_puzzle() -> Puzzle {
        let mut p = Puzzle::new();
        p.set_width(3);
        p.set_height(3);
        p.set_solution(b"ABC...DEF");
        p.set_grid(b"---...---");
        p.set_title(b"Sections");
        p.set_author(b"Someone");
        p.set_copyright(b"(c)");
        p.set_clue_count(3).unwrap();
        p.set_clue(0, b"a1").unwrap();
        p.set_clue(1, b"a2").unwrap();
        p.set_clue(2, b"d1").unwrap();
        p.set_notes(b"a note");

        p.set_rebus_grid(&[1, 0, 0, 0, 0, 0, 0, 0, 2]).unwrap();
        p.set_rebus_count(2);
        p.set_rebus_entry(0, b" 0:ONE").unwrap();
        p.set_rebus_entry(1, b" 1:TWO").unwrap();
        p.set_timer(300, 0);
        let mut flags = [0u8; 9];
        flags[4] = 128;
        p.set_extras(&flags).unwrap();
        let mut cells = vec![None; 9];
        cells[0] = Some(b"ONE".to_vec());
        p.set_user_rebus(cells).unwrap();

        p.cksums_commit();
        p
    }

    #[test]
    fn size_matches_emitted_length() {
        let p = full_puzzle();
        let bytes = p.save().unwrap();
        assert_eq!(bytes.len(), p.size());

        let mut bare = Puzzle::new();
        bare.set_width(3);
        bare.set_height(3);
        bare.set_solution(b"ABC...DEF");
        bare.set_grid(b"---...---");
        bare.cksums_commit();
        assert_eq!(bare.save().unwrap().len(), bare.size());
    }

    #[test]
    fn save_load_save_is_byte_identical() {
        let p = full_puzzle();
        let first = p.save().unwrap();

        let mut back = Puzzle::load(FileKind::Binary, &first).unwrap();
        assert_eq!(back.cksums_check(), 0);
        back.cksums_commit();
        let second = back.save().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn loaded_fields_survive_the_trip() {
        let p = full_puzzle();
        let bytes = p.save().unwrap();
        let q = Puzzle::load(FileKind::Binary, &bytes).unwrap();

        assert_eq!(q.title(), b"Sections");
        assert_eq!(q.notes(), b"a note");
        assert_eq!(q.rebus_grid(), p.rebus_grid());
        assert_eq!(q.rebus_entry(1), Some(&b" 1:TWO"[..]));
        assert_eq!(q.timer_elapsed(), Some(300));
        assert_eq!(q.extras().unwrap()[4], 128);
        assert_eq!(q.user_rebus().unwrap()[0], Some(b"ONE".to_vec()));
        assert_eq!(q.rusr_sz, p.rusr_sz);
    }

    #[test]
    fn empty_notes_still_terminate() {
        let mut p = Puzzle::new();
        p.set_width(1);
        p.set_height(1);
        p.set_solution(b"A");
        p.set_grid(b"-");
        p.cksums_commit();
        let bytes = p.save().unwrap();
        // header + two 1-byte boards + three empty strings + notes NUL
        assert_eq!(bytes.len(), HEADER_SIZE + 2 + 3 + 1);
        assert_eq!(&bytes[bytes.len() - 4..], b"\0\0\0\0");
    }
}
