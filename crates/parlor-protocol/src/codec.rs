//! The line codec: [`Frame`] and the [`Wire`] trait.
//!
//! A frame is one wire line split into a command and its fields. Typed
//! message enums convert to and from frames through [`Wire`]; the
//! transport layer only ever sees the rendered line.

use std::fmt;
use std::str::FromStr;

use crate::ProtocolError;

/// One parsed wire line: a command name plus zero or more fields.
///
/// `MOVE:1:2:X` parses to command `MOVE` with fields `["1", "2", "X"]`.
/// Splitting keeps empty fields, so `CHAT:` yields one empty field rather
/// than none — decoders that require a field use [`Frame::field`] and get
/// a uniform error when it is absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    command: String,
    fields: Vec<String>,
}

impl Frame {
    /// Starts a frame with the given command and no fields.
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            fields: Vec::new(),
        }
    }

    /// Appends one rendered field. Chainable, for encoders.
    pub fn field(mut self, value: impl fmt::Display) -> Self {
        self.fields.push(value.to_string());
        self
    }

    /// Parses one line (without its trailing newline).
    ///
    /// # Errors
    /// Returns [`ProtocolError::Empty`] for a blank line. Any non-blank
    /// line parses — command validity is the decoder's concern.
    pub fn parse(line: &str) -> Result<Self, ProtocolError> {
        if line.is_empty() {
            return Err(ProtocolError::Empty);
        }
        let mut parts = line.split(':');
        let command = parts.next().unwrap_or_default().to_string();
        if command.is_empty() {
            return Err(ProtocolError::Empty);
        }
        Ok(Self {
            command,
            fields: parts.map(str::to_string).collect(),
        })
    }

    /// The command name (first field of the line).
    pub fn command(&self) -> &str {
        &self.command
    }

    /// All fields after the command, in wire order.
    ///
    /// For commands whose final field is free text (chat), rejoining
    /// these with `:` recovers the text even when it contained colons.
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Returns field `index` (0-based, not counting the command).
    ///
    /// # Errors
    /// [`ProtocolError::MissingField`] when the line has too few fields.
    pub fn field_at(&self, index: usize) -> Result<&str, ProtocolError> {
        self.fields
            .get(index)
            .map(String::as_str)
            .ok_or_else(|| ProtocolError::MissingField {
                command: self.command.clone(),
                index,
            })
    }

    /// Parses field `index` into `T`.
    ///
    /// # Errors
    /// [`ProtocolError::MissingField`] or [`ProtocolError::InvalidField`].
    pub fn parse_field<T: FromStr>(
        &self,
        index: usize,
    ) -> Result<T, ProtocolError> {
        let raw = self.field_at(index)?;
        raw.parse().map_err(|_| ProtocolError::InvalidField {
            command: self.command.clone(),
            index,
            value: raw.to_string(),
        })
    }

    /// Shorthand for the "unknown command" decode failure.
    pub fn unknown(&self) -> ProtocolError {
        ProtocolError::UnknownCommand(self.command.clone())
    }
}

/// Renders the frame as its wire line (no trailing newline).
impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.command)?;
        for field in &self.fields {
            write!(f, ":{field}")?;
        }
        Ok(())
    }
}

/// Conversion between a typed message and its wire frame.
///
/// Every game defines one client-message enum and one server-message enum
/// and implements `Wire` for both. Both directions are total: the server
/// decodes client frames in its read loop, and integration tests decode
/// server frames coming back the other way.
pub trait Wire: Sized {
    /// Decodes a parsed frame into a typed message.
    ///
    /// # Errors
    /// Returns a [`ProtocolError`] for unknown commands and missing or
    /// malformed fields. Callers drop such frames; they are never fatal.
    fn decode(frame: &Frame) -> Result<Self, ProtocolError>;

    /// Encodes this message as a frame.
    fn encode(&self) -> Frame;
}
