pub mod cksum;
pub mod header;
pub mod load;
pub mod puzzle;
pub mod save;
pub mod scramble;

mod bytes;

pub use cksum::{cksum_region, Cksums};
pub use header::{Header, FILE_MAGIC, HEADER_SIZE, VER_MAGIC};
pub use load::{FileKind, LoadError};
pub use puzzle::{Puzzle, PuzzleError, MAX_REBUS_SIZE};
pub use scramble::UnlockError;
