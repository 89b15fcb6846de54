//! Wire format for moves exchanged between peers.
//!
//! Each message is one line holding `<row>,<col>` in decimal, both in
//! `0..3`. The line terminator is added and stripped by the transport.

use misere_tictactoe::Position;
use tracing::instrument;

/// Why an incoming line is not a move.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum ProtocolError {
    /// The line did not split into exactly two fields on `,`.
    #[display("Expected 2 comma-separated fields, found {}", _0)]
    WrongTokenCount(usize),
    /// A field is not a decimal integer.
    #[display("Not an integer: {:?}", _0)]
    NotAnInteger(String),
    /// Coordinates are outside the board.
    #[display("Cell ({}, {}) is off the board", _0, _1)]
    OutOfRange(i64, i64),
}

impl std::error::Error for ProtocolError {}

/// Encodes a move as `<row>,<col>`.
pub fn encode_move(position: Position) -> String {
    format!("{},{}", position.row(), position.col())
}

/// Decodes a `<row>,<col>` line, tolerating whitespace around each field.
#[instrument]
pub fn decode_move(line: &str) -> Result<Position, ProtocolError> {
    let fields: Vec<&str> = line.trim().split(',').collect();
    let [row, col] = fields.as_slice() else {
        return Err(ProtocolError::WrongTokenCount(fields.len()));
    };
    let row = parse_field(row)?;
    let col = parse_field(col)?;

    usize::try_from(row)
        .ok()
        .zip(usize::try_from(col).ok())
        .and_then(|(r, c)| Position::new(r, c))
        .ok_or(ProtocolError::OutOfRange(row, col))
}

fn parse_field(field: &str) -> Result<i64, ProtocolError> {
    let field = field.trim();
    field
        .parse::<i64>()
        .map_err(|_| ProtocolError::NotAnInteger(field.to_string()))
}
