//! Error types for the protocol layer.

/// Errors that can occur while parsing or decoding wire lines.
///
/// None of these are fatal: a frame that fails to decode is logged and
/// dropped by the connection handler, per the server's
/// ignore-malformed-input policy.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// The line was blank, or had an empty command field.
    #[error("empty line")]
    Empty,

    /// The command name is not part of this game's vocabulary.
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    /// The line has fewer fields than the command requires.
    #[error("{command}: missing field {index}")]
    MissingField { command: String, index: usize },

    /// A field was present but could not be parsed into its typed form.
    #[error("{command}: invalid field {index}: {value:?}")]
    InvalidField {
        command: String,
        index: usize,
        value: String,
    },
}
