use clap::Parser;
use memmap2::Mmap;
use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;

use acrosslite::{FileKind, Puzzle};

/// Field delimiter for the dump output; downstream consumers split on it.
const SEPARATOR: &str = "myuniquelibpuzseparator";

#[derive(Parser)]
#[command(name = "puzread")]
#[command(about = "Load a .PUZ crossword file, verify it, and dump its fields", long_about = None)]
#[command(version)]
struct Cli {
    /// Puzzle file, binary or text format
    file: PathBuf,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().with_writer(io::stderr).init();

    let cli = Cli::parse();

    let file = File::open(&cli.file)?;
    let map = unsafe { Mmap::map(&file)? };

    let mut puz = Puzzle::load(FileKind::Unknown, &map)?;
    drop(map);

    let errors = puz.cksums_check();
    if errors != 0 {
        return Err(format!("{errors} checksum error(s) in {}", cli.file.display()).into());
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();

    dump(&mut out, puz.title())?;
    dump(&mut out, puz.author())?;
    dump(&mut out, puz.notes())?;
    dump(&mut out, format!("{}", puz.width()).as_bytes())?;
    dump(&mut out, format!("{}", puz.height()).as_bytes())?;
    dump(&mut out, puz.grid().unwrap_or(&[]))?;
    dump(&mut out, puz.solution().unwrap_or(&[]))?;
    for n in 0..puz.clue_count() as usize {
        dump(&mut out, puz.clue(n).unwrap_or(&[]))?;
    }

    Ok(())
}

fn dump<W: Write>(out: &mut W, field: &[u8]) -> io::Result<()> {
    out.write_all(SEPARATOR.as_bytes())?;
    out.write_all(field)
}
