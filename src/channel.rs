// Wire codecs for the two command links.
//
// Text-pair (wired serial): one ASCII line, "<left> <right>", both
// numbers already clamped and rounded to two fractional digits.
//
// Discrete (wireless broadcast): either a bare decimal integer (the
// launch column) or the reserved token "w" (the sender lost). The peer
// dispatches on payload shape alone, so the shape rule is load-bearing
// for interoperability; it is kept behind `decode_event` and downstream
// code only ever sees the tagged `DuelEvent`.

use thiserror::Error;

use crate::duel::DuelEvent;
use crate::messages::DriveCommand;

/// Reserved single-character token for the loss notification.
pub const DEFEAT_TOKEN: &str = "w";

/// A malformed inbound payload. Callers log it and drop the tick's
/// command; it never terminates a control loop.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("empty payload")]
    Empty,
    #[error("expected 2 fields, got {0}")]
    FieldCount(usize),
    #[error("invalid number {0:?}")]
    BadNumber(String),
    #[error("unknown event token {0:?}")]
    UnknownToken(String),
}

/// Encodes a drive command as `"<left> <right>"`, at most two fractional
/// digits per number. The trailing newline is the link's concern.
pub fn encode_drive(cmd: &DriveCommand) -> String {
    let rounded = cmd.rounded();
    format!("{} {}", rounded.left, rounded.right)
}

/// Decodes a text-pair line into a drive command.
pub fn decode_drive(line: &str) -> Result<DriveCommand, DecodeError> {
    let line = line.trim();
    if line.is_empty() {
        return Err(DecodeError::Empty);
    }
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() != 2 {
        return Err(DecodeError::FieldCount(fields.len()));
    }
    let left = parse_number(fields[0])?;
    let right = parse_number(fields[1])?;
    Ok(DriveCommand::new(left, right))
}

fn parse_number(field: &str) -> Result<f64, DecodeError> {
    field
        .parse::<f64>()
        .map_err(|_| DecodeError::BadNumber(field.to_string()))
}

/// Encodes a duel event for the broadcast link.
pub fn encode_event(event: DuelEvent) -> String {
    match event {
        DuelEvent::Launch { column } => column.to_string(),
        DuelEvent::Defeat => DEFEAT_TOKEN.to_string(),
    }
}

/// Decodes a broadcast payload by shape: numeric means a launch column,
/// the reserved token means the peer lost.
pub fn decode_event(payload: &str) -> Result<DuelEvent, DecodeError> {
    let payload = payload.trim();
    if payload.is_empty() {
        return Err(DecodeError::Empty);
    }
    if let Ok(column) = payload.parse::<i32>() {
        return Ok(DuelEvent::Launch { column });
    }
    if payload == DEFEAT_TOKEN {
        return Ok(DuelEvent::Defeat);
    }
    Err(DecodeError::UnknownToken(payload.to_string()))
}
