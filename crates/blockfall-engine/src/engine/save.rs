//! Fixed-layout binary save record.
//!
//! The record is a flat sequence of native-endian fields:
//!
//! | field              | type                  |
//! |--------------------|-----------------------|
//! | level              | `i32`                 |
//! | score              | `i32`                 |
//! | active column      | `i32`                 |
//! | active row         | `i32`                 |
//! | active rotation    | `i32`                 |
//! | active kind index  | `i32`                 |
//! | next kind index    | `i32`                 |
//! | speed              | `f32`                 |
//! | game over          | `u8` (0 or 1)         |
//! | new game           | `u8` (0 or 1)         |
//! | board row count    | `i32`                 |
//! | board column count | `i32`                 |
//! | cells, row-major   | `i32` × rows × columns, `-1` for empty |

use std::io::{Read, Write};

use serde::{Deserialize, Serialize};

use crate::{Board, BoardSnapshot, PieceKind, PieceRotation, SaveError};

use super::session::ActivePiece;

/// Size in bytes of a record holding a full playfield.
pub const RECORD_LEN: usize = 7 * 4 + 4 + 2 + 2 * 4 + Board::TOTAL_ROWS * Board::COLUMNS * 4;

/// Everything needed to resume a game, as exported by
/// [`GameSession::export_state`](crate::GameSession::export_state).
///
/// Decoding checks the field types (kind indices, rotation, boolean bytes and board
/// size). Whether the values form a playable game is checked by
/// [`GameSession::import_state`](crate::GameSession::import_state).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub level: i32,
    pub score: i32,
    pub active: ActivePiece,
    pub next_kind: PieceKind,
    pub speed: f32,
    pub game_over: bool,
    pub is_new_game: bool,
    pub board: BoardSnapshot,
}

impl SessionSnapshot {
    /// Encodes the record in native byte order.
    pub fn write_to<W>(&self, writer: &mut W) -> Result<(), SaveError>
    where
        W: Write + ?Sized,
    {
        let size_mismatch = || SaveError::BoardSizeMismatch {
            rows: self.board.rows,
            columns: self.board.columns,
        };
        if self.board.cells.len() != self.board.rows * self.board.columns {
            return Err(size_mismatch());
        }
        let rows = i32::try_from(self.board.rows).map_err(|_| size_mismatch())?;
        let columns = i32::try_from(self.board.columns).map_err(|_| size_mismatch())?;

        let mut buf = Vec::with_capacity(RECORD_LEN);
        buf.extend_from_slice(&self.level.to_ne_bytes());
        buf.extend_from_slice(&self.score.to_ne_bytes());
        buf.extend_from_slice(&self.active.column.to_ne_bytes());
        buf.extend_from_slice(&self.active.row.to_ne_bytes());
        buf.extend_from_slice(&i32::from(self.active.rotation.value()).to_ne_bytes());
        buf.extend_from_slice(&kind_to_index(self.active.kind).to_ne_bytes());
        buf.extend_from_slice(&kind_to_index(self.next_kind).to_ne_bytes());
        buf.extend_from_slice(&self.speed.to_ne_bytes());
        buf.push(u8::from(self.game_over));
        buf.push(u8::from(self.is_new_game));
        buf.extend_from_slice(&rows.to_ne_bytes());
        buf.extend_from_slice(&columns.to_ne_bytes());
        for cell in &self.board.cells {
            buf.extend_from_slice(&cell.to_ne_bytes());
        }

        writer.write_all(&buf)?;
        Ok(())
    }

    /// Decodes a record written by [`Self::write_to`].
    ///
    /// A truncated record fails with [`SaveError::Io`]. The board size must match
    /// the playfield, so a corrupt size never causes a large allocation.
    pub fn read_from<R>(reader: &mut R) -> Result<Self, SaveError>
    where
        R: Read + ?Sized,
    {
        let level = read_i32(reader)?;
        let score = read_i32(reader)?;
        let column = read_i32(reader)?;
        let row = read_i32(reader)?;
        let rotation = read_i32(reader)?;
        let kind = read_kind(reader)?;
        let next_kind = read_kind(reader)?;
        let speed = f32::from_ne_bytes(read_array(reader)?);
        let game_over = read_bool(reader)?;
        let is_new_game = read_bool(reader)?;

        let rotation = u8::try_from(rotation)
            .ok()
            .and_then(PieceRotation::new)
            .ok_or(SaveError::InvalidRotation { value: rotation })?;

        let rows = read_count(reader, "board row count")?;
        let columns = read_count(reader, "board column count")?;
        if rows != Board::TOTAL_ROWS || columns != Board::COLUMNS {
            return Err(SaveError::BoardSizeMismatch { rows, columns });
        }
        let cells = (0..rows * columns)
            .map(|_| read_i32(reader))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            level,
            score,
            active: ActivePiece {
                kind,
                column,
                row,
                rotation,
            },
            next_kind,
            speed,
            game_over,
            is_new_game,
            board: BoardSnapshot {
                rows,
                columns,
                cells,
            },
        })
    }
}

fn kind_to_index(kind: PieceKind) -> i32 {
    i32::from(kind as u8)
}

fn read_array<R, const N: usize>(reader: &mut R) -> Result<[u8; N], SaveError>
where
    R: Read + ?Sized,
{
    let mut buf = [0; N];
    reader.read_exact(&mut buf)?;
    Ok(buf)
}

fn read_i32<R>(reader: &mut R) -> Result<i32, SaveError>
where
    R: Read + ?Sized,
{
    Ok(i32::from_ne_bytes(read_array(reader)?))
}

fn read_kind<R>(reader: &mut R) -> Result<PieceKind, SaveError>
where
    R: Read + ?Sized,
{
    let index = read_i32(reader)?;
    PieceKind::from_index(index).ok_or(SaveError::InvalidPieceKind { index })
}

fn read_bool<R>(reader: &mut R) -> Result<bool, SaveError>
where
    R: Read + ?Sized,
{
    let [value] = read_array(reader)?;
    match value {
        0 => Ok(false),
        1 => Ok(true),
        _ => Err(SaveError::InvalidBool { value }),
    }
}

fn read_count<R>(reader: &mut R, name: &'static str) -> Result<usize, SaveError>
where
    R: Read + ?Sized,
{
    let value = read_i32(reader)?;
    usize::try_from(value).map_err(|_| SaveError::NegativeCounter { name, value })
}
