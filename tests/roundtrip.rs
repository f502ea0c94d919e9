use std::fs::File;
use std::io::Write;
use tempfile::NamedTempFile;

use acrosslite::{cksum_region, FileKind, Puzzle};

fn sample_text() -> &'static [u8] {
    b"<ACROSS PUZZLE>\n\
<TITLE>\nEquivalence\n\
<AUTHOR>\nIntegration Test\n\
<COPYRIGHT>\n(c) nobody\n\
<SIZE>\n3x3\n\
<GRID>\nABC\n...\nDEF\n\
<ACROSS>\nfirst across\nsecond across\n\
<DOWN>\nonly down\n"
}

fn build_equivalent_binary() -> Puzzle {
    let mut p = Puzzle::new();
    p.set_width(3);
    p.set_height(3);
    p.set_solution(b"ABC...DEF");
    p.set_grid(b"---...---");
    p.set_title(b"Equivalence");
    p.set_author(b"Integration Test");
    p.set_copyright(b"(c) nobody");
    p.set_clue_count(3).unwrap();
    p.set_clue(0, b"first across").unwrap();
    p.set_clue(1, b"second across").unwrap();
    p.set_clue(2, b"only down").unwrap();
    p.cksums_commit();
    p
}

#[test]
fn text_and_binary_models_agree() {
    let from_text = Puzzle::load(FileKind::Text, sample_text()).unwrap();
    let built = build_equivalent_binary();

    assert_eq!(from_text.title(), built.title());
    assert_eq!(from_text.author(), built.author());
    assert_eq!(from_text.copyright(), built.copyright());
    assert_eq!(from_text.width(), built.width());
    assert_eq!(from_text.height(), built.height());
    assert_eq!(from_text.solution(), built.solution());
    assert_eq!(from_text.grid(), built.grid());
    assert_eq!(from_text.clue_count(), built.clue_count());
    for n in 0..3 {
        assert_eq!(from_text.clue(n), built.clue(n));
    }
}

#[test]
fn text_load_then_save_loads_back_verified() {
    let from_text = Puzzle::load(FileKind::Text, sample_text()).unwrap();
    let bytes = from_text.save().unwrap();
    assert_eq!(bytes.len(), from_text.size());

    let mut back = Puzzle::load(FileKind::Unknown, &bytes).unwrap();
    assert_eq!(back.cksums_check(), 0);
    assert_eq!(back.title(), b"Equivalence");
    assert_eq!(back.header.cksum_cib, from_text.header.cksum_cib);
}

#[test]
fn valid_binary_file_roundtrips_byte_exact() {
    let original = build_equivalent_binary().save().unwrap();

    let mut loaded = Puzzle::load(FileKind::Unknown, &original).unwrap();
    assert_eq!(loaded.cksums_check(), 0);
    loaded.cksums_commit();
    let rewritten = loaded.save().unwrap();

    assert_eq!(original, rewritten);
}

#[test]
fn committed_cib_matches_the_raw_block() {
    let built = build_equivalent_binary();
    assert_eq!(
        built.header.cksum_cib,
        cksum_region(b"\x03\x03\x03\x00\x01\x00\x00\x00", 0)
    );
}

#[test]
fn locked_puzzle_survives_save_and_brute_force() {
    let mut p = build_equivalent_binary();
    let clear = p.solution().unwrap().to_vec();

    // The canonical solution is six letters, so every key digit must fit
    // within a six-character rotation.
    p.lock(1234).unwrap();
    p.cksums_commit();
    let bytes = p.save().unwrap();

    let mut back = Puzzle::load(FileKind::Binary, &bytes).unwrap();
    assert_eq!(back.cksums_check(), 0);
    assert!(back.is_locked());
    assert_ne!(back.solution().unwrap(), &clear[..]);

    assert_eq!(back.brute_force_unlock().unwrap(), 1234);
    assert_eq!(back.solution().unwrap(), &clear[..]);

    // The unlocked board now disagrees with the checksums committed for
    // the scrambled one, so a fresh commit is needed before resaving.
    back.cksums_commit();
    assert_eq!(back.cksums_check(), 0);
}

#[test]
fn save_to_disk_and_reopen() {
    let temp_file = NamedTempFile::new().unwrap();
    let puz_path = temp_file.path().to_path_buf();

    let original = build_equivalent_binary();
    {
        let mut file = File::create(&puz_path).unwrap();
        file.write_all(&original.save().unwrap()).unwrap();
    }

    let bytes = std::fs::read(&puz_path).unwrap();
    assert_eq!(bytes.len(), original.size());

    let mut back = Puzzle::load(FileKind::Unknown, &bytes).unwrap();
    assert_eq!(back.cksums_check(), 0);
    assert_eq!(back.title(), original.title());
    assert_eq!(back.solution(), original.solution());
    assert_eq!(back.clue_count(), original.clue_count());
}

#[test]
fn tampered_solution_fails_verification() {
    let mut bytes = build_equivalent_binary().save().unwrap();
    // Flip one solution letter in place.
    bytes[0x34] ^= 1;
    let mut loaded = Puzzle::load(FileKind::Binary, &bytes).unwrap();
    assert_ne!(loaded.cksums_check(), 0);
}
