//! Genome — the fixed-length byte record produced from a token seed
//!
//! Layout: byte 0 holds the format version, trait slots follow as configured
//! in the registry, and every byte after the highest trait slot is filler
//! taken from the entropy left over after the last draw.

mod record;
mod encoder;

pub use record::Genome;
pub use encoder::{compute_genome, GenomeEncoder};

/// Length of a genome record in bytes
pub const GENOME_LEN: usize = 32;

/// Value of byte 0 for the current record format
pub const GENOME_VERSION: u8 = 0;
