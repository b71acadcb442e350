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

//! The shape-preserving array formats. Both write a two-entry map with the
//! keys `"size"` (the extent of each dimension) and `"data"` (the elements
//! flattened in row-major order). `ArrayFormat` writes the data as an array
//! of formatted values; `BinArray` writes it as one binary atom of
//! little-endian fixed-width elements.

use bytes::Buf;

use crate::context::{Context, DefaultContext};
use crate::dispatch::{DefaultPackable, Format, Formatted, Packable};
use crate::error::{PackError, UnpackError};
use crate::format::sequence::decode_scalars;
use crate::format::Scalar;
use crate::generator::ElementWriter;
use crate::wire::{self, CoreFormat};


const SIZE_KEY: &str = "size";
const DATA_KEY: &str = "data";

/// Shape-preserving array with formatted elements.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArrayFormat;

/// Shape-preserving array with a binary element payload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BinArray;

impl Format for ArrayFormat {
    const NAME: &'static str = "Array";

    fn is_format_byte(byte: u8) -> bool {
        wire::admits(CoreFormat::Map, byte)
    }
}

impl Format for BinArray {
    const NAME: &'static str = "BinArray";

    fn is_format_byte(byte: u8) -> bool {
        wire::admits(CoreFormat::Map, byte)
    }
}

/// Multi-dimensional values with a flat row-major element store.
pub trait ArrayValue<C: Context = DefaultContext>: Sized {
    type Elem;

    /// The extent of each dimension. The product must equal the number of
    /// elements.
    fn size(&self, ctx: &C) -> Vec<u32>;

    /// The elements flattened in row-major order.
    fn elements(&self) -> &[Self::Elem];

    /// Rebuild the value from a decoded shape and flat data. The engine has
    /// already checked that the data length matches the shape.
    fn construct(size: Vec<u32>, data: Vec<Self::Elem>, ctx: &C) -> Result<Self, UnpackError>;
}

fn checked_volume(size: &[u32]) -> Result<u64, UnpackError> {
    size.iter().try_fold(1u64, |volume, extent| {
        volume
            .checked_mul(*extent as u64)
            .ok_or(UnpackError::NumberOutOfRange { format: "Array" })
    })
}

fn expect_key<R: Buf>(reader: &mut R, expected: &'static str) -> Result<(), UnpackError> {
    let key = wire::read_string(reader)?;
    if key == expected {
        Ok(())
    } else {
        Err(UnpackError::KeyMismatch {
            expected: expected.to_string(),
            actual: key,
        })
    }
}

fn read_array_prelude<R: Buf, C: Context>(
    reader: &mut R,
    ctx: &C,
) -> Result<Vec<u32>, UnpackError> {
    let entries = wire::read_map_header(reader)?;
    if entries != 2 {
        return Err(UnpackError::LengthMismatch {
            expected: 2,
            actual: entries as u64,
        });
    }
    expect_key(reader, SIZE_KEY)?;
    let size: Vec<u32> = crate::dispatch::unpack_from_with(reader, ctx)?;
    expect_key(reader, DATA_KEY)?;
    Ok(size)
}

fn write_array_prelude<W: std::io::Write, C: Context>(
    writer: &mut W,
    size: &Vec<u32>,
    ctx: &C,
) -> Result<(), PackError> {
    wire::write_map_header(writer, 2)?;
    wire::write_str(writer, SIZE_KEY)?;
    crate::dispatch::pack_to_with(writer, size, ctx)?;
    wire::write_str(writer, DATA_KEY)?;
    Ok(())
}

impl<T, C> Packable<ArrayFormat, C> for T
where
    T: ArrayValue<C>,
    T::Elem: DefaultPackable<C>,
    C: Context,
{
    fn pack<W: std::io::Write>(&self, writer: &mut W, ctx: &C) -> Result<(), PackError> {
        let size = self.size(ctx);
        write_array_prelude(writer, &size, ctx)?;
        let elements = self.elements();
        let len = u32::try_from(elements.len()).map_err(|_| PackError::TooLong {
            format: "Array",
            len: elements.len(),
        })?;
        wire::write_array_header(writer, len)?;
        let mut out = ElementWriter::new(writer, len, ctx);
        for element in elements {
            out.element_default(element)?;
        }
        out.finish()
    }

    fn unpack<R: Buf>(reader: &mut R, ctx: &C) -> Result<Self, UnpackError> {
        let size = read_array_prelude(reader, ctx)?;
        let volume = checked_volume(&size)?;
        let len = wire::read_array_header(reader)?;
        if len as u64 != volume {
            return Err(UnpackError::LengthMismatch {
                expected: volume,
                actual: len as u64,
            });
        }
        let mut data = Vec::with_capacity(len as usize);
        for _ in 0..len {
            data.push(crate::dispatch::unpack_from_with(reader, ctx)?);
        }
        T::construct(size, data, ctx)
    }
}

impl<T, C> Packable<BinArray, C> for T
where
    T: ArrayValue<C>,
    T::Elem: Scalar,
    C: Context,
{
    fn pack<W: std::io::Write>(&self, writer: &mut W, ctx: &C) -> Result<(), PackError> {
        let size = self.size(ctx);
        write_array_prelude(writer, &size, ctx)?;
        let elements = self.elements();
        let mut payload = Vec::with_capacity(elements.len() * T::Elem::WIDTH);
        for element in elements {
            element.write_bytes(&mut payload);
        }
        wire::write_bin(writer, &payload)
    }

    fn unpack<R: Buf>(reader: &mut R, ctx: &C) -> Result<Self, UnpackError> {
        let size = read_array_prelude(reader, ctx)?;
        let volume = checked_volume(&size)?;
        let payload = wire::read_bin(reader)?;
        let data = decode_scalars::<T::Elem>(&payload)?;
        if data.len() as u64 != volume {
            return Err(UnpackError::LengthMismatch {
                expected: volume,
                actual: data.len() as u64,
            });
        }
        T::construct(size, data, ctx)
    }
}

/// The canonical shape-preserving carrier: a shape and flat row-major data.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayRepr<T> {
    pub size: Vec<u32>,
    pub data: Vec<T>,
}

impl<T> ArrayRepr<T> {
    pub fn new(size: Vec<u32>, data: Vec<T>) -> Self {
        ArrayRepr { size, data }
    }
}

impl<T, C: Context> ArrayValue<C> for ArrayRepr<T> {
    type Elem = T;

    fn size(&self, _ctx: &C) -> Vec<u32> {
        self.size.clone()
    }

    fn elements(&self) -> &[T] {
        &self.data
    }

    fn construct(size: Vec<u32>, data: Vec<T>, _ctx: &C) -> Result<Self, UnpackError> {
        Ok(ArrayRepr { size, data })
    }
}

impl<T, C> Formatted<C> for ArrayRepr<T>
where
    T: DefaultPackable<C>,
    C: Context,
{
    type Fmt = ArrayFormat;
}

/// The binary-payload counterpart of [`ArrayRepr`]: the same shape and flat
/// row-major data, bound to `BinArray` by default so the elements travel as
/// one binary atom.
#[derive(Debug, Clone, PartialEq)]
pub struct BinArrayRepr<T> {
    pub size: Vec<u32>,
    pub data: Vec<T>,
}

impl<T> BinArrayRepr<T> {
    pub fn new(size: Vec<u32>, data: Vec<T>) -> Self {
        BinArrayRepr { size, data }
    }
}

impl<T, C: Context> ArrayValue<C> for BinArrayRepr<T> {
    type Elem = T;

    fn size(&self, _ctx: &C) -> Vec<u32> {
        self.size.clone()
    }

    fn elements(&self) -> &[T] {
        &self.data
    }

    fn construct(size: Vec<u32>, data: Vec<T>, _ctx: &C) -> Result<Self, UnpackError> {
        Ok(BinArrayRepr { size, data })
    }
}

impl<T, C> Formatted<C> for BinArrayRepr<T>
where
    T: Scalar,
    C: Context,
{
    type Fmt = BinArray;
}
