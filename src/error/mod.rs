// Copyright 2015-2023 Swim Inc.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::fmt::{Display, Formatter};
use std::str::Utf8Error;

/// Decoding MessagePack data can fail if the bytes do not constitute valid
/// MessagePack for the requested format, if the structure disagrees with the
/// target type, or if a policy rejects the reconstruction.
#[derive(Debug, PartialEq)]
pub enum UnpackError {
    /// The lead byte of a value is outside the accepted set for the format.
    InvalidMarker {
        /// The name of the format that was attempted.
        format: &'static str,
        /// The offending byte.
        byte: u8,
    },
    /// The input terminated mid-way through a value.
    Incomplete,
    /// Decoding completed but input bytes remain.
    UnconsumedData,
    /// A string value contained invalid UTF-8.
    StringDecode(Utf8Error),
    /// A decoded number does not fit the target representation.
    NumberOutOfRange {
        /// The name of the format that was attempted.
        format: &'static str,
    },
    /// A declared length disagrees with the schema for the target type.
    LengthMismatch {
        /// The number of entries the target type requires.
        expected: u64,
        /// The number of entries declared in the stream.
        actual: u64,
    },
    /// A key in the stream was not the key required at its position.
    KeyMismatch {
        /// The key that was required.
        expected: String,
        /// The key that was read.
        actual: String,
    },
    /// The same key occurred twice in one record.
    DuplicateKey(String),
    /// One or more declared fields were absent from the stream.
    MissingFields(Vec<&'static str>),
    /// A key occurred that the target type does not declare.
    UnexpectedField(String),
    /// An extension value carried a different type code than expected.
    ExtensionMismatch {
        /// The code the format was parameterized with.
        expected: i8,
        /// The code read from the stream.
        actual: i8,
    },
    /// A self-describing value named a type other than the requested one.
    TypeMismatch {
        /// The canonical name of the requested type.
        expected: String,
        /// The canonical name found in the stream.
        actual: String,
    },
    /// A self-describing value named a type this process cannot resolve.
    UnknownType(String),
    /// Type parameter types were not specified for a parameterized type.
    TypeParameters(String),
    /// A typed format would re-enter itself through the default format.
    RecursiveTyped(&'static str),
    /// The active whitelist refused to construct the named type.
    Rejected(String),
    /// An internal inconsistency was detected.
    Invariant(InvariantError),
    /// A custom error message.
    Message(String),
}

/// Encoding a value can fail because of an IO error or because the value
/// exceeds the limitations of the MessagePack format.
#[derive(Debug)]
pub enum PackError {
    /// An error occurred in the underlying writer.
    Io(std::io::Error),
    /// A length exceeds what the format can represent.
    TooLong {
        /// The name of the format that was attempted.
        format: &'static str,
        /// The offending length.
        len: usize,
    },
    /// The number of elements written did not match the number reported.
    WrongNumberOfElements,
    /// Type parameter metadata was not specified for a parameterized type.
    TypeParameters(String),
    /// A typed format would re-enter itself through the default format.
    RecursiveTyped(&'static str),
    /// An extension payload could not be produced from the value.
    MalformedExtension(String),
    /// An internal inconsistency was detected.
    Invariant(InvariantError),
    /// A custom error message.
    Message(String),
}

/// An internal inconsistency that a conformant configuration never produces,
/// such as a type whose resolved format is the lazy `Default` indirection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantError(String);

impl InvariantError {
    pub fn new<S: Into<String>>(message: S) -> Self {
        InvariantError(message.into())
    }

    pub fn message(&self) -> &str {
        &self.0
    }
}

impl PartialEq for PackError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (
                PackError::TooLong { format, len },
                PackError::TooLong {
                    format: other_format,
                    len: other_len,
                },
            ) => format == other_format && len == other_len,
            (PackError::WrongNumberOfElements, PackError::WrongNumberOfElements) => true,
            (PackError::TypeParameters(left), PackError::TypeParameters(right)) => left == right,
            (PackError::RecursiveTyped(left), PackError::RecursiveTyped(right)) => left == right,
            (PackError::MalformedExtension(left), PackError::MalformedExtension(right)) => {
                left == right
            }
            (PackError::Invariant(left), PackError::Invariant(right)) => left == right,
            (PackError::Message(left), PackError::Message(right)) => left == right,
            _ => false,
        }
    }
}

impl Display for UnpackError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            UnpackError::InvalidMarker { format, byte } => {
                write!(
                    f,
                    "Byte 0x{:02x} cannot begin a value in the {} format.",
                    byte, format
                )
            }
            UnpackError::Incomplete => write!(f, "The input ended part way through a value."),
            UnpackError::UnconsumedData => write!(f, "Not all of the input was consumed."),
            UnpackError::StringDecode(_) => {
                write!(f, "A string value contained invalid UTF-8.")
            }
            UnpackError::NumberOutOfRange { format } => {
                write!(
                    f,
                    "Number out of range for the target of the {} format.",
                    format
                )
            }
            UnpackError::LengthMismatch { expected, actual } => {
                write!(
                    f,
                    "Declared length {} does not match the expected length {}.",
                    actual, expected
                )
            }
            UnpackError::KeyMismatch { expected, actual } => {
                write!(f, "Expected key '{}' but read '{}'.", expected, actual)
            }
            UnpackError::DuplicateKey(key) => {
                write!(f, "Key '{}' occurred more than once.", key)
            }
            UnpackError::MissingFields(names) => {
                write!(f, "Fields [")?;
                let mut it = names.iter();
                if let Some(first) = it.next() {
                    write!(f, "{}", first)?;
                }
                for name in it {
                    write!(f, ", {}", name)?;
                }
                write!(f, "] are required.")
            }
            UnpackError::UnexpectedField(key) => write!(f, "Unexpected field: '{}'.", key),
            UnpackError::ExtensionMismatch { expected, actual } => {
                write!(
                    f,
                    "Extension type code {} does not match the expected code {}.",
                    actual, expected
                )
            }
            UnpackError::TypeMismatch { expected, actual } => {
                write!(
                    f,
                    "The stream describes type '{}' which cannot satisfy '{}'.",
                    actual, expected
                )
            }
            UnpackError::UnknownType(name) => {
                write!(f, "'{}' does not name a resolvable type.", name)
            }
            UnpackError::TypeParameters(name) => {
                write!(f, "Type parameter types not specified for '{}'.", name)
            }
            UnpackError::RecursiveTyped(name) => {
                write!(
                    f,
                    "Unpacking '{}' in the Typed format would recurse: its default \
                     format is itself Typed. Bind a concrete value format instead.",
                    name
                )
            }
            UnpackError::Rejected(name) => {
                write!(f, "The active whitelist refuses to construct '{}'.", name)
            }
            UnpackError::Invariant(err) => Display::fmt(err, f),
            UnpackError::Message(text) => f.write_str(text),
        }
    }
}

impl Display for PackError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            PackError::Io(err) => write!(f, "An error occurred writing the content: {}", err),
            PackError::TooLong { format, len } => {
                write!(
                    f,
                    "Length {} is too long to encode in the {} format.",
                    len, format
                )
            }
            PackError::WrongNumberOfElements => {
                write!(
                    f,
                    "The number of elements written did not match the number reported."
                )
            }
            PackError::TypeParameters(name) => {
                write!(f, "Type parameter types not specified for '{}'.", name)
            }
            PackError::RecursiveTyped(name) => {
                write!(
                    f,
                    "Packing '{}' in the Typed format would recurse: its default \
                     format is itself Typed. Bind a concrete value format instead.",
                    name
                )
            }
            PackError::MalformedExtension(message) => {
                write!(f, "Extension payload malformed: {}", message)
            }
            PackError::Invariant(err) => Display::fmt(err, f),
            PackError::Message(text) => f.write_str(text),
        }
    }
}

impl Display for InvariantError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Internal invariant violated: {}", self.0)
    }
}

impl std::error::Error for UnpackError {}
impl std::error::Error for PackError {}
impl std::error::Error for InvariantError {}

impl From<Utf8Error> for UnpackError {
    fn from(err: Utf8Error) -> Self {
        UnpackError::StringDecode(err)
    }
}

impl From<InvariantError> for UnpackError {
    fn from(err: InvariantError) -> Self {
        UnpackError::Invariant(err)
    }
}

impl From<std::io::Error> for PackError {
    fn from(err: std::io::Error) -> Self {
        PackError::Io(err)
    }
}

impl From<InvariantError> for PackError {
    fn from(err: InvariantError) -> Self {
        PackError::Invariant(err)
    }
}
