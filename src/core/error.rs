// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Core error types for nrbfcodec.
//!
//! Every error is fatal for the pass that produced it: the reader discards
//! all partially constructed objects and the writer stops emitting records.
//! Variants fall into a few groups:
//! - Stream structure (truncation, unknown or misplaced records)
//! - Type metadata (unknown or conflicting type descriptions)
//! - Object references (dangling or duplicated ids)
//! - Leaf data (primitive kinds, strings, decimals, array headers)
//! - Caller input (values the writer cannot represent, configuration)

use std::fmt;

/// Errors that can occur while writing or reading a record stream.
#[derive(Debug, Clone, PartialEq)]
pub enum CodecError {
    /// A class record referenced a metadata id that was never described
    UnknownTypeReference {
        /// Metadata (type) id found in the stream
        type_id: i32,
    },

    /// An object id was referenced but never defined in the stream
    DanglingReference {
        /// The unresolved object id
        object_id: i32,
    },

    /// A primitive type code that does not map to any known kind
    UnknownPrimitiveKind {
        /// Raw type code
        code: u8,
    },

    /// Array rank, length or lower bound is invalid
    MalformedArrayHeader {
        /// What is wrong with the header
        reason: String,
    },

    /// The source ended in the middle of a record
    UnexpectedEndOfStream {
        /// Byte offset where more data was expected
        position: u64,
    },

    /// The same type was described twice with differing shapes
    DuplicateTypeIdConflict {
        /// Type id (or first id) claimed by the type
        type_id: i32,
        /// Class name of the conflicting type
        type_name: String,
    },

    /// A length-prefixed string carried an invalid length
    InvalidStringLength {
        /// Byte offset of the length prefix
        position: u64,
        /// What is wrong with the length
        reason: String,
    },

    /// The writer was handed a value it cannot represent in the given slot
    UnsupportedValueKind {
        /// Kind of value that was found
        kind: String,
        /// Where it was found
        context: String,
    },

    /// An object id was defined more than once
    DuplicateObjectId {
        /// The repeated id
        object_id: i32,
    },

    /// A record type byte that is not part of the format
    UnknownRecordType {
        /// Raw record type byte
        code: u8,
        /// Byte offset of the record
        position: u64,
    },

    /// A known record appeared where it is not allowed
    UnexpectedRecord {
        /// Record name
        record: String,
        /// Where it appeared
        context: String,
    },

    /// A class record referenced a library id that was never declared
    UnknownLibraryReference {
        /// The unknown library id
        library_id: i32,
    },

    /// Text payload was not valid UTF-8
    InvalidUtf8 {
        /// Byte offset of the payload
        position: u64,
    },

    /// Decimal text could not be parsed or does not fit 96 bits
    InvalidDecimal {
        /// The offending text
        text: String,
    },

    /// Stream header carries an unsupported format version
    UnsupportedVersion {
        /// Major version
        major: i32,
        /// Minor version
        minor: i32,
    },

    /// Inline record nesting exceeded the configured limit
    NestingTooDeep {
        /// Configured maximum depth
        limit: usize,
    },

    /// A member-names-only class record named a type nobody described
    TypeNotFound {
        /// Type name that was not found
        type_name: String,
    },

    /// Unsupported format feature
    Unsupported {
        /// What is not supported
        feature: String,
    },

    /// Formatter configuration could not be loaded
    InvalidConfig {
        /// Error message
        message: String,
    },

    /// I/O failure in the byte sink or source
    Io {
        /// Error message
        message: String,
    },

    /// Other error
    Other(String),
}

impl CodecError {
    /// Create a malformed array header error.
    pub fn malformed_array(reason: impl Into<String>) -> Self {
        CodecError::MalformedArrayHeader {
            reason: reason.into(),
        }
    }

    /// Create an invalid string length error.
    pub fn invalid_string_length(position: u64, reason: impl Into<String>) -> Self {
        CodecError::InvalidStringLength {
            position,
            reason: reason.into(),
        }
    }

    /// Create an unsupported value kind error.
    pub fn unsupported_value(kind: impl Into<String>, context: impl Into<String>) -> Self {
        CodecError::UnsupportedValueKind {
            kind: kind.into(),
            context: context.into(),
        }
    }

    /// Create an unexpected record error.
    pub fn unexpected_record(record: impl Into<String>, context: impl Into<String>) -> Self {
        CodecError::UnexpectedRecord {
            record: record.into(),
            context: context.into(),
        }
    }

    /// Create a "type not found" error.
    pub fn type_not_found(type_name: impl Into<String>) -> Self {
        CodecError::TypeNotFound {
            type_name: type_name.into(),
        }
    }

    /// Create a duplicate type conflict error.
    pub fn type_conflict(type_id: i32, type_name: impl Into<String>) -> Self {
        CodecError::DuplicateTypeIdConflict {
            type_id,
            type_name: type_name.into(),
        }
    }

    /// Create an unsupported feature error.
    pub fn unsupported(feature: impl Into<String>) -> Self {
        CodecError::Unsupported {
            feature: feature.into(),
        }
    }

    /// Create an invalid decimal error.
    pub fn invalid_decimal(text: impl Into<String>) -> Self {
        CodecError::InvalidDecimal { text: text.into() }
    }

    /// Create an invalid configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        CodecError::InvalidConfig {
            message: message.into(),
        }
    }

    /// Whether the error was caused by the source running out of bytes.
    pub fn is_truncation(&self) -> bool {
        matches!(self, CodecError::UnexpectedEndOfStream { .. })
    }

    /// Get structured fields for logging.
    pub fn log_fields(&self) -> Vec<(&'static str, String)> {
        match self {
            CodecError::UnknownTypeReference { type_id } => {
                vec![("type_id", type_id.to_string())]
            }
            CodecError::DanglingReference { object_id } => {
                vec![("object_id", object_id.to_string())]
            }
            CodecError::UnknownPrimitiveKind { code } => vec![("code", code.to_string())],
            CodecError::MalformedArrayHeader { reason } => vec![("reason", reason.clone())],
            CodecError::UnexpectedEndOfStream { position } => {
                vec![("position", position.to_string())]
            }
            CodecError::DuplicateTypeIdConflict { type_id, type_name } => vec![
                ("type_id", type_id.to_string()),
                ("type", type_name.clone()),
            ],
            CodecError::InvalidStringLength { position, reason } => vec![
                ("position", position.to_string()),
                ("reason", reason.clone()),
            ],
            CodecError::UnsupportedValueKind { kind, context } => {
                vec![("kind", kind.clone()), ("context", context.clone())]
            }
            CodecError::DuplicateObjectId { object_id } => {
                vec![("object_id", object_id.to_string())]
            }
            CodecError::UnknownRecordType { code, position } => vec![
                ("code", code.to_string()),
                ("position", position.to_string()),
            ],
            CodecError::UnexpectedRecord { record, context } => {
                vec![("record", record.clone()), ("context", context.clone())]
            }
            CodecError::UnknownLibraryReference { library_id } => {
                vec![("library_id", library_id.to_string())]
            }
            CodecError::InvalidUtf8 { position } => vec![("position", position.to_string())],
            CodecError::InvalidDecimal { text } => vec![("text", text.clone())],
            CodecError::UnsupportedVersion { major, minor } => vec![
                ("major", major.to_string()),
                ("minor", minor.to_string()),
            ],
            CodecError::NestingTooDeep { limit } => vec![("limit", limit.to_string())],
            CodecError::TypeNotFound { type_name } => vec![("type", type_name.clone())],
            CodecError::Unsupported { feature } => vec![("feature", feature.clone())],
            CodecError::InvalidConfig { message } | CodecError::Io { message } => {
                vec![("message", message.clone())]
            }
            CodecError::Other(msg) => vec![("message", msg.clone())],
        }
    }
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodecError::UnknownTypeReference { type_id } => {
                write!(f, "Unknown type reference: metadata id {type_id}")
            }
            CodecError::DanglingReference { object_id } => {
                write!(f, "Dangling reference to object id {object_id}")
            }
            CodecError::UnknownPrimitiveKind { code } => {
                write!(f, "Unknown primitive kind: {code}")
            }
            CodecError::MalformedArrayHeader { reason } => {
                write!(f, "Malformed array header: {reason}")
            }
            CodecError::UnexpectedEndOfStream { position } => {
                write!(f, "Unexpected end of stream at position {position}")
            }
            CodecError::DuplicateTypeIdConflict { type_id, type_name } => write!(
                f,
                "Type '{type_name}' (id {type_id}) was described with conflicting shapes"
            ),
            CodecError::InvalidStringLength { position, reason } => {
                write!(f, "Invalid string length at position {position}: {reason}")
            }
            CodecError::UnsupportedValueKind { kind, context } => {
                write!(f, "Unsupported value kind '{kind}' in {context}")
            }
            CodecError::DuplicateObjectId { object_id } => {
                write!(f, "Object id {object_id} defined more than once")
            }
            CodecError::UnknownRecordType { code, position } => {
                write!(f, "Unknown record type {code} at position {position}")
            }
            CodecError::UnexpectedRecord { record, context } => {
                write!(f, "Unexpected {record} record in {context}")
            }
            CodecError::UnknownLibraryReference { library_id } => {
                write!(f, "Unknown library id {library_id}")
            }
            CodecError::InvalidUtf8 { position } => {
                write!(f, "Invalid UTF-8 text at position {position}")
            }
            CodecError::InvalidDecimal { text } => write!(f, "Invalid decimal '{text}'"),
            CodecError::UnsupportedVersion { major, minor } => {
                write!(f, "Unsupported stream version {major}.{minor}; must be 1.0")
            }
            CodecError::NestingTooDeep { limit } => {
                write!(f, "Record nesting exceeds the limit of {limit}")
            }
            CodecError::TypeNotFound { type_name } => {
                write!(f, "Type not found: '{type_name}'")
            }
            CodecError::Unsupported { feature } => {
                write!(f, "Unsupported feature: '{feature}'")
            }
            CodecError::InvalidConfig { message } => {
                write!(f, "Invalid formatter configuration: {message}")
            }
            CodecError::Io { message } => write!(f, "I/O error: {message}"),
            CodecError::Other(msg) => write!(f, "Other error: {msg}"),
        }
    }
}

impl std::error::Error for CodecError {}

impl From<std::io::Error> for CodecError {
    fn from(err: std::io::Error) -> Self {
        // Callers that track a byte offset map truncation themselves; this
        // fallback is used where no position is known.
        if err.kind() == std::io::ErrorKind::UnexpectedEof {
            return CodecError::UnexpectedEndOfStream { position: 0 };
        }
        CodecError::Io {
            message: err.to_string(),
        }
    }
}

/// Result type for nrbfcodec operations.
pub type Result<T> = std::result::Result<T, CodecError>;
