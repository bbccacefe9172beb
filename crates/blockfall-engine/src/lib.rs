//! Simulation core of the blockfall falling-block game.
//!
//! The crate is split the same way the game is layered:
//!
//! - [`core`] - static piece catalog and the board grid
//! - [`engine`] - game session, cycle clock, piece generation and save records
//!
//! Rendering, audio, input and file I/O live in the host; the engine only
//! exposes read-only accessors and discrete intents for them.

use std::io;

pub use self::{core::*, engine::*};

pub mod core;
pub mod engine;

/// Malformed piece catalog data, detected by [`validate_catalog`].
#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum CatalogError {
    #[display("{kind:?} rotation {} has no occupied cells", rotation.value())]
    EmptyRotation {
        kind: PieceKind,
        rotation: PieceRotation,
    },
    #[display(
        "{kind:?} rotation {} has {actual} cells, expected {expected}",
        rotation.value()
    )]
    CellCountMismatch {
        kind: PieceKind,
        rotation: PieceRotation,
        expected: usize,
        actual: usize,
    },
}

/// Session configuration value that cannot drive the game.
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("invalid {name}: {value}")]
pub struct ConfigError {
    pub name: &'static str,
    pub value: f32,
}

/// Failure to encode or decode a saved session.
///
/// Decoding validates the whole record before any session state is touched, so
/// a `SaveError` always leaves the session as it was.
#[derive(Debug, derive_more::Display, derive_more::Error, derive_more::From)]
pub enum SaveError {
    #[display("save record I/O failed: {_0}")]
    #[from]
    Io(io::Error),
    #[display("invalid piece kind index {index}")]
    InvalidPieceKind { index: i32 },
    #[display("invalid rotation {value}")]
    InvalidRotation { value: i32 },
    #[display("invalid boolean byte {value}")]
    InvalidBool { value: u8 },
    #[display("board size {rows}x{columns} does not match the playfield")]
    BoardSizeMismatch { rows: usize, columns: usize },
    #[display("invalid cell marker {value} at index {index}")]
    InvalidCell { index: usize, value: i32 },
    #[display("invalid speed {speed}")]
    InvalidSpeed { speed: f32 },
    #[display("active piece position ({column}, {row}) is outside the board")]
    PositionOutOfRange { column: i32, row: i32 },
    #[display("{name} must not be negative, got {value}")]
    NegativeCounter { name: &'static str, value: i32 },
}
