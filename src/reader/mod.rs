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

//! Cursor-style traversal of MessagePack streams without materializing
//! values. [`skip`] advances past one complete value, [`step`] enters
//! containers, and [`peek_format`] classifies without consuming.

use bytes::Buf;
use rmp::Marker;

use crate::error::UnpackError;
use crate::wire::{self, CoreFormat};

#[cfg(test)]
mod tests;

/// The outcome of a [`step`]: either a scalar value was skipped in its
/// entirety, or a container header was consumed, leaving the cursor
/// positioned at its first entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// A non-container value was skipped. Carries its classification.
    Value(CoreFormat),
    /// An array header was consumed; the array holds this many values.
    Array(u32),
    /// A map header was consumed; the map holds this many key-value pairs.
    Map(u32),
}

/// Classify the next value in the stream without consuming anything.
pub fn peek_format<R: Buf>(reader: &R) -> Result<CoreFormat, UnpackError> {
    let byte = wire::peek_byte(reader)?;
    wire::classify(byte).ok_or(UnpackError::InvalidMarker {
        format: "Any",
        byte,
    })
}

/// Advance the reader past exactly one value. Scalars consume their fixed
/// width, strings, binaries and extensions consume their declared length in
/// one bulk advance, and containers recurse.
pub fn skip<R: Buf>(reader: &mut R) -> Result<(), UnpackError> {
    match wire::read_marker(reader)? {
        Marker::Null | Marker::True | Marker::False | Marker::FixPos(_) | Marker::FixNeg(_) => {
            Ok(())
        }
        Marker::I8 | Marker::U8 => wire::discard_bytes(reader, 1),
        Marker::I16 | Marker::U16 => wire::discard_bytes(reader, 2),
        Marker::I32 | Marker::U32 | Marker::F32 => wire::discard_bytes(reader, 4),
        Marker::I64 | Marker::U64 | Marker::F64 => wire::discard_bytes(reader, 8),
        Marker::FixStr(len) => wire::discard_bytes(reader, len as u32),
        Marker::Str8 | Marker::Bin8 => {
            let len = wire::read_u8(reader)? as u32;
            wire::discard_bytes(reader, len)
        }
        Marker::Str16 | Marker::Bin16 => {
            let len = wire::read_u16(reader)? as u32;
            wire::discard_bytes(reader, len)
        }
        Marker::Str32 | Marker::Bin32 => {
            let len = wire::read_u32(reader)?;
            wire::discard_bytes(reader, len)
        }
        Marker::FixArray(len) => skip_n(reader, len as u64),
        Marker::Array16 => {
            let len = wire::read_u16(reader)?;
            skip_n(reader, len as u64)
        }
        Marker::Array32 => {
            let len = wire::read_u32(reader)?;
            skip_n(reader, len as u64)
        }
        Marker::FixMap(len) => skip_n(reader, 2 * len as u64),
        Marker::Map16 => {
            let len = wire::read_u16(reader)?;
            skip_n(reader, 2 * len as u64)
        }
        Marker::Map32 => {
            let len = wire::read_u32(reader)?;
            skip_n(reader, 2 * len as u64)
        }
        Marker::FixExt1 => wire::discard_bytes(reader, 2),
        Marker::FixExt2 => wire::discard_bytes(reader, 3),
        Marker::FixExt4 => wire::discard_bytes(reader, 5),
        Marker::FixExt8 => wire::discard_bytes(reader, 9),
        Marker::FixExt16 => wire::discard_bytes(reader, 17),
        Marker::Ext8 => {
            let len = wire::read_u8(reader)? as u32;
            wire::discard_bytes(reader, len + 1)
        }
        Marker::Ext16 => {
            let len = wire::read_u16(reader)? as u32;
            wire::discard_bytes(reader, len + 1)
        }
        Marker::Ext32 => {
            let len = wire::read_u32(reader)?;
            wire::discard_bytes(reader, 1)?;
            wire::discard_bytes(reader, len)
        }
        Marker::Reserved => Err(UnpackError::InvalidMarker {
            format: "Any",
            byte: Marker::Reserved.to_u8(),
        }),
    }
}

fn skip_n<R: Buf>(reader: &mut R, count: u64) -> Result<(), UnpackError> {
    for _ in 0..count {
        skip(reader)?;
    }
    Ok(())
}

/// Classify the next value, entering it if it is a container. For arrays and
/// maps only the header is consumed; for anything else the whole value is
/// skipped.
pub fn step<R: Buf>(reader: &mut R) -> Result<Step, UnpackError> {
    match peek_format(reader)? {
        CoreFormat::Vector => {
            let len = wire::read_array_header(reader)?;
            Ok(Step::Array(len))
        }
        CoreFormat::Map => {
            let len = wire::read_map_header(reader)?;
            Ok(Step::Map(len))
        }
        format => {
            skip(reader)?;
            Ok(Step::Value(format))
        }
    }
}
