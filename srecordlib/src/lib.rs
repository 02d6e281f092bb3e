//! # `srecordlib`
//!
//! `srecordlib` is a Rust library for parsing, validating, composing and editing
//! Motorola S-record files (S19/S28/S37).
//!
//! The library provides:
//! - Parser and composer for S-records (via [`SRecord`] struct), with strict and lenient modes.
//! - Sparse memory model of address-tagged byte blocks ([`BlockSet`], [`Block`]).
//! - Error handling with [`SRecordError`].
//! - Reading several records from one concatenated stream ([`LineReader`]).
//!
//! ## Example
//!
//! ```
//! use srecordlib::{Block, SRecord};
//!
//! let mut srec = SRecord::from_file("tests/fixtures/example.s19").unwrap();
//! srec.set_range(Block::from_bytes(0x100, vec![0xFF; 8]));
//! srec.write_srec("build/ex1/example.s19", 0).unwrap();
//! ```

mod assembler;
mod block;
mod blockset;
mod compose;
mod error;
mod hex;
mod line;
mod reader;
mod search;
mod srecord;
mod validate;

/// Memory address. 64 bits wide, so the exclusive end of a 32-bit range fits.
pub type Address = u64;

// Public APIs
pub use block::Block;
pub use blockset::BlockSet;
pub use error::{SRecordError, SRecordErrorKind};
pub use line::{AddressWidth, LineType};
pub use reader::LineReader;
pub use search::SearchType;
pub use srecord::{Endianness, SRecord};
