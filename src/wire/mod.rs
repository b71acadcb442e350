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

//! The MessagePack atom layer. Everything above the marker byte (length class
//! selection, big-endian payloads, underflow detection) is implemented here;
//! the formats in [`crate::format`] are compositions of these atoms.
//!
//! Writers operate on [`std::io::Write`], readers on [`bytes::Buf`]. All
//! write functions select the shortest legal encoding for their argument.

use std::fmt::{Display, Formatter};

use byteorder::{BigEndian, WriteBytesExt};
use bytes::Buf;
use rmp::Marker;

use crate::error::{PackError, UnpackError};


/// The wire-level classification of a MessagePack value, as determined by its
/// lead byte. This is what a peek at the stream can tell without decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CoreFormat {
    Nil,
    Boolean,
    Signed,
    Unsigned,
    Float,
    Utf8,
    Binary,
    Vector,
    Map,
    Extension,
}

impl Display for CoreFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            CoreFormat::Nil => "Nil",
            CoreFormat::Boolean => "Boolean",
            CoreFormat::Signed => "Signed",
            CoreFormat::Unsigned => "Unsigned",
            CoreFormat::Float => "Float",
            CoreFormat::Utf8 => "Utf8",
            CoreFormat::Binary => "Binary",
            CoreFormat::Vector => "Vector",
            CoreFormat::Map => "Map",
            CoreFormat::Extension => "Extension",
        };
        f.write_str(name)
    }
}

/// Classify a lead byte. Returns [`None`] only for the reserved byte `0xc1`.
pub fn classify(byte: u8) -> Option<CoreFormat> {
    let format = match Marker::from_u8(byte) {
        Marker::Null => CoreFormat::Nil,
        Marker::True | Marker::False => CoreFormat::Boolean,
        Marker::FixPos(_) | Marker::FixNeg(_) => CoreFormat::Signed,
        Marker::I8 | Marker::I16 | Marker::I32 | Marker::I64 => CoreFormat::Signed,
        Marker::U8 | Marker::U16 | Marker::U32 | Marker::U64 => CoreFormat::Unsigned,
        Marker::F32 | Marker::F64 => CoreFormat::Float,
        Marker::FixStr(_) | Marker::Str8 | Marker::Str16 | Marker::Str32 => CoreFormat::Utf8,
        Marker::Bin8 | Marker::Bin16 | Marker::Bin32 => CoreFormat::Binary,
        Marker::FixArray(_) | Marker::Array16 | Marker::Array32 => CoreFormat::Vector,
        Marker::FixMap(_) | Marker::Map16 | Marker::Map32 => CoreFormat::Map,
        Marker::FixExt1
        | Marker::FixExt2
        | Marker::FixExt4
        | Marker::FixExt8
        | Marker::FixExt16
        | Marker::Ext8
        | Marker::Ext16
        | Marker::Ext32 => CoreFormat::Extension,
        Marker::Reserved => return None,
    };
    Some(format)
}

/// Whether `byte` can begin a value readable in the class `format`. The
/// `Signed` class also admits the unsigned encodings (tolerant decoding);
/// the converse does not hold.
pub fn admits(format: CoreFormat, byte: u8) -> bool {
    match (classify(byte), format) {
        (Some(CoreFormat::Signed), CoreFormat::Signed) => true,
        (Some(CoreFormat::Unsigned), CoreFormat::Signed) => true,
        (Some(actual), expected) => actual == expected,
        (None, _) => false,
    }
}

/// Look at the next byte without consuming it.
pub fn peek_byte<R: Buf>(reader: &R) -> Result<u8, UnpackError> {
    if reader.has_remaining() {
        Ok(reader.chunk()[0])
    } else {
        Err(UnpackError::Incomplete)
    }
}

pub fn read_marker<R: Buf>(reader: &mut R) -> Result<Marker, UnpackError> {
    if reader.has_remaining() {
        Ok(Marker::from_u8(reader.get_u8()))
    } else {
        Err(UnpackError::Incomplete)
    }
}

macro_rules! checked_read {
    ($name:ident, $get:ident, $ty:ty) => {
        pub fn $name<R: Buf>(reader: &mut R) -> Result<$ty, UnpackError> {
            if reader.remaining() < std::mem::size_of::<$ty>() {
                Err(UnpackError::Incomplete)
            } else {
                Ok(reader.$get())
            }
        }
    };
}

checked_read!(read_u8, get_u8, u8);
checked_read!(read_u16, get_u16, u16);
checked_read!(read_u32, get_u32, u32);
checked_read!(read_u64, get_u64, u64);
checked_read!(read_i8, get_i8, i8);
checked_read!(read_i16, get_i16, i16);
checked_read!(read_i32, get_i32, i32);
checked_read!(read_i64, get_i64, i64);
checked_read!(read_f32, get_f32, f32);
checked_read!(read_f64, get_f64, f64);

/// Copy `len` bytes out of the reader.
pub fn take_bytes<R: Buf>(reader: &mut R, len: u32) -> Result<Vec<u8>, UnpackError> {
    let len = len as usize;
    if reader.remaining() < len {
        Err(UnpackError::Incomplete)
    } else {
        let bytes = reader.copy_to_bytes(len);
        Ok(Vec::from(bytes.as_ref()))
    }
}

/// Advance the reader past `len` payload bytes.
pub fn discard_bytes<R: Buf>(reader: &mut R, len: u32) -> Result<(), UnpackError> {
    let len = len as usize;
    if reader.remaining() < len {
        Err(UnpackError::Incomplete)
    } else {
        reader.advance(len);
        Ok(())
    }
}

pub fn write_nil<W: std::io::Write>(writer: &mut W) -> Result<(), PackError> {
    writer.write_u8(Marker::Null.to_u8())?;
    Ok(())
}

pub fn read_nil<R: Buf>(reader: &mut R) -> Result<(), UnpackError> {
    match read_marker(reader)? {
        Marker::Null => Ok(()),
        marker => Err(UnpackError::InvalidMarker {
            format: "Nil",
            byte: marker.to_u8(),
        }),
    }
}

pub fn write_bool<W: std::io::Write>(writer: &mut W, value: bool) -> Result<(), PackError> {
    let marker = if value { Marker::True } else { Marker::False };
    writer.write_u8(marker.to_u8())?;
    Ok(())
}

pub fn read_bool<R: Buf>(reader: &mut R) -> Result<bool, UnpackError> {
    match read_marker(reader)? {
        Marker::True => Ok(true),
        Marker::False => Ok(false),
        marker => Err(UnpackError::InvalidMarker {
            format: "Boolean",
            byte: marker.to_u8(),
        }),
    }
}

/// Write an integer in the signed family: fixint where it fits, then the
/// smallest of `int8/16/32/64`.
pub fn write_signed<W: std::io::Write>(writer: &mut W, value: i64) -> Result<(), PackError> {
    if (-32..=127).contains(&value) {
        writer.write_i8(value as i8)?;
    } else if let Ok(n) = i8::try_from(value) {
        writer.write_u8(Marker::I8.to_u8())?;
        writer.write_i8(n)?;
    } else if let Ok(n) = i16::try_from(value) {
        writer.write_u8(Marker::I16.to_u8())?;
        writer.write_i16::<BigEndian>(n)?;
    } else if let Ok(n) = i32::try_from(value) {
        writer.write_u8(Marker::I32.to_u8())?;
        writer.write_i32::<BigEndian>(n)?;
    } else {
        writer.write_u8(Marker::I64.to_u8())?;
        writer.write_i64::<BigEndian>(value)?;
    }
    Ok(())
}

/// Read an integer for the `Signed` class. The unsigned encodings are
/// accepted as well, provided the value fits in an `i64`.
pub fn read_signed<R: Buf>(reader: &mut R) -> Result<i64, UnpackError> {
    match read_marker(reader)? {
        Marker::FixPos(n) => Ok(n as i64),
        Marker::FixNeg(n) => Ok(n as i64),
        Marker::I8 => Ok(read_i8(reader)? as i64),
        Marker::I16 => Ok(read_i16(reader)? as i64),
        Marker::I32 => Ok(read_i32(reader)? as i64),
        Marker::I64 => read_i64(reader),
        Marker::U8 => Ok(read_u8(reader)? as i64),
        Marker::U16 => Ok(read_u16(reader)? as i64),
        Marker::U32 => Ok(read_u32(reader)? as i64),
        Marker::U64 => {
            let n = read_u64(reader)?;
            i64::try_from(n).map_err(|_| UnpackError::NumberOutOfRange { format: "Signed" })
        }
        marker => Err(UnpackError::InvalidMarker {
            format: "Signed",
            byte: marker.to_u8(),
        }),
    }
}

/// Write an integer in the unsigned family: positive fixint where it fits,
/// then the smallest of `uint8/16/32/64`.
pub fn write_unsigned<W: std::io::Write>(writer: &mut W, value: u64) -> Result<(), PackError> {
    if value <= 127 {
        writer.write_u8(value as u8)?;
    } else if let Ok(n) = u8::try_from(value) {
        writer.write_u8(Marker::U8.to_u8())?;
        writer.write_u8(n)?;
    } else if let Ok(n) = u16::try_from(value) {
        writer.write_u8(Marker::U16.to_u8())?;
        writer.write_u16::<BigEndian>(n)?;
    } else if let Ok(n) = u32::try_from(value) {
        writer.write_u8(Marker::U32.to_u8())?;
        writer.write_u32::<BigEndian>(n)?;
    } else {
        writer.write_u8(Marker::U64.to_u8())?;
        writer.write_u64::<BigEndian>(value)?;
    }
    Ok(())
}

/// Read an integer for the `Unsigned` class. Signed encodings are rejected,
/// even for non-negative values.
pub fn read_unsigned<R: Buf>(reader: &mut R) -> Result<u64, UnpackError> {
    match read_marker(reader)? {
        Marker::FixPos(n) => Ok(n as u64),
        Marker::U8 => Ok(read_u8(reader)? as u64),
        Marker::U16 => Ok(read_u16(reader)? as u64),
        Marker::U32 => Ok(read_u32(reader)? as u64),
        Marker::U64 => read_u64(reader),
        marker => Err(UnpackError::InvalidMarker {
            format: "Unsigned",
            byte: marker.to_u8(),
        }),
    }
}

pub fn write_f32<W: std::io::Write>(writer: &mut W, value: f32) -> Result<(), PackError> {
    writer.write_u8(Marker::F32.to_u8())?;
    writer.write_f32::<BigEndian>(value)?;
    Ok(())
}

pub fn write_f64<W: std::io::Write>(writer: &mut W, value: f64) -> Result<(), PackError> {
    writer.write_u8(Marker::F64.to_u8())?;
    writer.write_f64::<BigEndian>(value)?;
    Ok(())
}

/// Read a float of either width, widened to `f64`.
pub fn read_float<R: Buf>(reader: &mut R) -> Result<f64, UnpackError> {
    match read_marker(reader)? {
        Marker::F32 => Ok(read_f32(reader)? as f64),
        Marker::F64 => read_f64(reader),
        marker => Err(UnpackError::InvalidMarker {
            format: "Float",
            byte: marker.to_u8(),
        }),
    }
}

pub fn write_str<W: std::io::Write>(writer: &mut W, value: &str) -> Result<(), PackError> {
    let bytes = value.as_bytes();
    if bytes.len() <= 31 {
        writer.write_u8(Marker::FixStr(bytes.len() as u8).to_u8())?;
    } else if let Ok(n) = u8::try_from(bytes.len()) {
        writer.write_u8(Marker::Str8.to_u8())?;
        writer.write_u8(n)?;
    } else if let Ok(n) = u16::try_from(bytes.len()) {
        writer.write_u8(Marker::Str16.to_u8())?;
        writer.write_u16::<BigEndian>(n)?;
    } else if let Ok(n) = u32::try_from(bytes.len()) {
        writer.write_u8(Marker::Str32.to_u8())?;
        writer.write_u32::<BigEndian>(n)?;
    } else {
        return Err(PackError::TooLong {
            format: "Utf8",
            len: bytes.len(),
        });
    }
    writer.write_all(bytes)?;
    Ok(())
}

pub fn read_str_len<R: Buf>(reader: &mut R) -> Result<u32, UnpackError> {
    match read_marker(reader)? {
        Marker::FixStr(len) => Ok(len as u32),
        Marker::Str8 => Ok(read_u8(reader)? as u32),
        Marker::Str16 => Ok(read_u16(reader)? as u32),
        Marker::Str32 => read_u32(reader),
        marker => Err(UnpackError::InvalidMarker {
            format: "Utf8",
            byte: marker.to_u8(),
        }),
    }
}

pub fn read_string<R: Buf>(reader: &mut R) -> Result<String, UnpackError> {
    let len = read_str_len(reader)?;
    let bytes = take_bytes(reader, len)?;
    String::from_utf8(bytes).map_err(|err| UnpackError::StringDecode(err.utf8_error()))
}

pub fn write_bin<W: std::io::Write>(writer: &mut W, value: &[u8]) -> Result<(), PackError> {
    if let Ok(n) = u8::try_from(value.len()) {
        writer.write_u8(Marker::Bin8.to_u8())?;
        writer.write_u8(n)?;
    } else if let Ok(n) = u16::try_from(value.len()) {
        writer.write_u8(Marker::Bin16.to_u8())?;
        writer.write_u16::<BigEndian>(n)?;
    } else if let Ok(n) = u32::try_from(value.len()) {
        writer.write_u8(Marker::Bin32.to_u8())?;
        writer.write_u32::<BigEndian>(n)?;
    } else {
        return Err(PackError::TooLong {
            format: "Binary",
            len: value.len(),
        });
    }
    writer.write_all(value)?;
    Ok(())
}

pub fn read_bin_len<R: Buf>(reader: &mut R) -> Result<u32, UnpackError> {
    match read_marker(reader)? {
        Marker::Bin8 => Ok(read_u8(reader)? as u32),
        Marker::Bin16 => Ok(read_u16(reader)? as u32),
        Marker::Bin32 => read_u32(reader),
        marker => Err(UnpackError::InvalidMarker {
            format: "Binary",
            byte: marker.to_u8(),
        }),
    }
}

pub fn read_bin<R: Buf>(reader: &mut R) -> Result<Vec<u8>, UnpackError> {
    let len = read_bin_len(reader)?;
    take_bytes(reader, len)
}

pub fn write_array_header<W: std::io::Write>(writer: &mut W, len: u32) -> Result<(), PackError> {
    if len <= 15 {
        writer.write_u8(Marker::FixArray(len as u8).to_u8())?;
    } else if let Ok(n) = u16::try_from(len) {
        writer.write_u8(Marker::Array16.to_u8())?;
        writer.write_u16::<BigEndian>(n)?;
    } else {
        writer.write_u8(Marker::Array32.to_u8())?;
        writer.write_u32::<BigEndian>(len)?;
    }
    Ok(())
}

pub fn read_array_header<R: Buf>(reader: &mut R) -> Result<u32, UnpackError> {
    match read_marker(reader)? {
        Marker::FixArray(len) => Ok(len as u32),
        Marker::Array16 => Ok(read_u16(reader)? as u32),
        Marker::Array32 => read_u32(reader),
        marker => Err(UnpackError::InvalidMarker {
            format: "Vector",
            byte: marker.to_u8(),
        }),
    }
}

pub fn write_map_header<W: std::io::Write>(writer: &mut W, len: u32) -> Result<(), PackError> {
    if len <= 15 {
        writer.write_u8(Marker::FixMap(len as u8).to_u8())?;
    } else if let Ok(n) = u16::try_from(len) {
        writer.write_u8(Marker::Map16.to_u8())?;
        writer.write_u16::<BigEndian>(n)?;
    } else {
        writer.write_u8(Marker::Map32.to_u8())?;
        writer.write_u32::<BigEndian>(len)?;
    }
    Ok(())
}

pub fn read_map_header<R: Buf>(reader: &mut R) -> Result<u32, UnpackError> {
    match read_marker(reader)? {
        Marker::FixMap(len) => Ok(len as u32),
        Marker::Map16 => Ok(read_u16(reader)? as u32),
        Marker::Map32 => read_u32(reader),
        marker => Err(UnpackError::InvalidMarker {
            format: "Map",
            byte: marker.to_u8(),
        }),
    }
}

/// Write an extension header (marker, length where needed, then the type
/// code). The payload follows separately.
pub fn write_ext_header<W: std::io::Write>(
    writer: &mut W,
    code: i8,
    len: usize,
) -> Result<(), PackError> {
    match len {
        1 => writer.write_u8(Marker::FixExt1.to_u8())?,
        2 => writer.write_u8(Marker::FixExt2.to_u8())?,
        4 => writer.write_u8(Marker::FixExt4.to_u8())?,
        8 => writer.write_u8(Marker::FixExt8.to_u8())?,
        16 => writer.write_u8(Marker::FixExt16.to_u8())?,
        _ => {
            if let Ok(n) = u8::try_from(len) {
                writer.write_u8(Marker::Ext8.to_u8())?;
                writer.write_u8(n)?;
            } else if let Ok(n) = u16::try_from(len) {
                writer.write_u8(Marker::Ext16.to_u8())?;
                writer.write_u16::<BigEndian>(n)?;
            } else if let Ok(n) = u32::try_from(len) {
                writer.write_u8(Marker::Ext32.to_u8())?;
                writer.write_u32::<BigEndian>(n)?;
            } else {
                return Err(PackError::TooLong {
                    format: "Extension",
                    len,
                });
            }
        }
    }
    writer.write_i8(code)?;
    Ok(())
}

/// Read an extension header, returning the type code and payload length.
pub fn read_ext_header<R: Buf>(reader: &mut R) -> Result<(i8, u32), UnpackError> {
    let len = match read_marker(reader)? {
        Marker::FixExt1 => 1,
        Marker::FixExt2 => 2,
        Marker::FixExt4 => 4,
        Marker::FixExt8 => 8,
        Marker::FixExt16 => 16,
        Marker::Ext8 => read_u8(reader)? as u32,
        Marker::Ext16 => read_u16(reader)? as u32,
        Marker::Ext32 => read_u32(reader)?,
        marker => {
            return Err(UnpackError::InvalidMarker {
                format: "Extension",
                byte: marker.to_u8(),
            })
        }
    };
    let code = read_i8(reader)?;
    Ok((code, len))
}
