//! The fixed 0x34-byte `.PUZ` file header.
//!
//! All multi-byte integers are little-endian.  The words at 0x1C and
//! 0x20..0x2C are unwritten-memory noise in files produced by the
//! original application; they are captured on load and re-emitted on
//! save so a valid file round-trips byte for byte.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{self, Read, Write};

pub const HEADER_SIZE: usize = 0x34;

pub const FILE_MAGIC: &[u8; 12] = b"ACROSS&DOWN\0";
pub const VER_MAGIC: &[u8; 4] = b"1.2\0";

/// XOR masks applied to the checksum bytes at 0x10 and 0x14.
pub const MAGIC_10_MASK: [u8; 4] = *b"ICHE";
pub const MAGIC_14_MASK: [u8; 4] = *b"ATED";

/// `scrambled_tag` value for a locked puzzle.
pub const SCRAMBLED_TAG_LOCKED: u16 = 4;

#[derive(Debug, Clone)]
pub struct Header {
    pub cksum_puz: u16,
    pub magic: [u8; 12],
    pub cksum_cib: u16,
    pub magic_10: [u8; 4],
    pub magic_14: [u8; 4],
    pub version: [u8; 4],
    pub noise_1c: u16,
    pub scrambled_cksum: u16,
    pub noise_20: [u16; 6],
    pub width: u8,
    pub height: u8,
    pub clue_count: u16,
    pub x_unk_30: u16,
    pub scrambled_tag: u16,
}

impl Header {
    pub fn new() -> Self {
        Self {
            cksum_puz: 0,
            magic: *FILE_MAGIC,
            cksum_cib: 0,
            magic_10: [0; 4],
            magic_14: [0; 4],
            version: *VER_MAGIC,
            noise_1c: 0,
            scrambled_cksum: 0,
            noise_20: [0; 6],
            width: 0,
            height: 0,
            clue_count: 0,
            x_unk_30: 0x0001,
            scrambled_tag: 0,
        }
    }

    pub fn read<R: Read>(mut reader: R) -> io::Result<Self> {
        let cksum_puz = reader.read_u16::<LittleEndian>()?;
        let mut magic = [0u8; 12];
        reader.read_exact(&mut magic)?;
        let cksum_cib = reader.read_u16::<LittleEndian>()?;
        let mut magic_10 = [0u8; 4];
        reader.read_exact(&mut magic_10)?;
        let mut magic_14 = [0u8; 4];
        reader.read_exact(&mut magic_14)?;
        let mut version = [0u8; 4];
        reader.read_exact(&mut version)?;
        let noise_1c = reader.read_u16::<LittleEndian>()?;
        let scrambled_cksum = reader.read_u16::<LittleEndian>()?;
        let mut noise_20 = [0u16; 6];
        for word in noise_20.iter_mut() {
            *word = reader.read_u16::<LittleEndian>()?;
        }
        let width = reader.read_u8()?;
        let height = reader.read_u8()?;
        let clue_count = reader.read_u16::<LittleEndian>()?;
        let x_unk_30 = reader.read_u16::<LittleEndian>()?;
        let scrambled_tag = reader.read_u16::<LittleEndian>()?;

        Ok(Self {
            cksum_puz,
            magic,
            cksum_cib,
            magic_10,
            magic_14,
            version,
            noise_1c,
            scrambled_cksum,
            noise_20,
            width,
            height,
            clue_count,
            x_unk_30,
            scrambled_tag,
        })
    }

    pub fn write<W: Write>(&self, mut writer: W) -> io::Result<()> {
        writer.write_u16::<LittleEndian>(self.cksum_puz)?;
        writer.write_all(&self.magic)?;
        writer.write_u16::<LittleEndian>(self.cksum_cib)?;
        writer.write_all(&self.magic_10)?;
        writer.write_all(&self.magic_14)?;
        writer.write_all(&self.version)?;
        writer.write_u16::<LittleEndian>(self.noise_1c)?;
        writer.write_u16::<LittleEndian>(self.scrambled_cksum)?;
        for word in self.noise_20 {
            writer.write_u16::<LittleEndian>(word)?;
        }
        writer.write_u8(self.width)?;
        writer.write_u8(self.height)?;
        writer.write_u16::<LittleEndian>(self.clue_count)?;
        writer.write_u16::<LittleEndian>(self.x_unk_30)?;
        writer.write_u16::<LittleEndian>(self.scrambled_tag)?;
        Ok(())
    }

    pub fn board_area(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// The 8-byte checksummed info block at offset 0x2C, rebuilt from the
    /// current field values.
    pub fn cib(&self) -> [u8; 8] {
        let cc = self.clue_count.to_le_bytes();
        let unk = self.x_unk_30.to_le_bytes();
        let tag = self.scrambled_tag.to_le_bytes();
        [
            self.width, self.height, cc[0], cc[1], unk[0], unk[1], tag[0], tag[1],
        ]
    }
}

impl Default for Header {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_is_byte_exact() {
        let mut h = Header::new();
        h.cksum_puz = 0xBEEF;
        h.cksum_cib = 0x1234;
        h.magic_10 = [1, 2, 3, 4];
        h.magic_14 = [5, 6, 7, 8];
        h.noise_1c = 0xAAAA;
        h.scrambled_cksum = 0x4242;
        h.noise_20 = [1, 2, 3, 4, 5, 6];
        h.width = 15;
        h.height = 15;
        h.clue_count = 76;
        h.scrambled_tag = SCRAMBLED_TAG_LOCKED;

        let mut buf = Vec::new();
        h.write(&mut buf).unwrap();
        assert_eq!(buf.len(), HEADER_SIZE);

        let back = Header::read(&buf[..]).unwrap();
        let mut buf2 = Vec::new();
        back.write(&mut buf2).unwrap();
        assert_eq!(buf, buf2);
    }

    #[test]
    fn cib_layout() {
        let mut h = Header::new();
        h.width = 3;
        h.height = 3;
        h.clue_count = 3;
        assert_eq!(h.cib(), [3, 3, 3, 0, 1, 0, 0, 0]);
    }

    #[test]
    fn defaults_carry_magic_and_version() {
        let h = Header::new();
        assert_eq!(&h.magic, FILE_MAGIC);
        assert_eq!(&h.version, VER_MAGIC);
        assert_eq!(h.x_unk_30, 0x0001);
    }
}
