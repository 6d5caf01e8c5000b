//! Wire framing for protocol lines.
//!
//! `[":" prefix " "] command (" " arg)* [" :" suffix] CRLF`

use thiserror::Error;

use crate::domain::Line;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("line is empty")]
    EmptyLine,

    #[error("line has no command")]
    MissingCommand,
}

/// Parse one raw line as read off the socket.
pub fn parse(raw: &str) -> Result<Line, ParseError> {
    let line = raw.trim_end_matches(['\r', '\n']);
    if line.is_empty() {
        return Err(ParseError::EmptyLine);
    }

    let (prefix, rest) = match line.strip_prefix(':') {
        Some(tagged) => tagged.split_once(' ').ok_or(ParseError::MissingCommand)?,
        None => ("", line),
    };
    if rest.starts_with(':') {
        return Err(ParseError::MissingCommand);
    }

    let (region, suffix) = match rest.find(" :") {
        Some(i) => (&rest[..i], &rest[i + 2..]),
        None => (rest, ""),
    };

    let mut tokens = region.split(' ');
    let command = tokens.next().unwrap_or_default();
    if command.is_empty() {
        return Err(ParseError::MissingCommand);
    }
    let arguments = tokens.map(String::from).collect();

    Ok(Line::from_parts(
        prefix.to_string(),
        command.to_string(),
        arguments,
        suffix.to_string(),
    ))
}

/// Serialize a line for the wire, CRLF included.
pub fn build(line: &Line) -> String {
    format!("{line}\r\n")
}
