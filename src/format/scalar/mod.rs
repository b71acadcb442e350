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

//! The core scalar formats: one format tag per MessagePack atom class, one
//! destruct/construct trait per tag.

use std::borrow::Cow;

use bytes::Buf;

use crate::context::{Context, DefaultContext};
use crate::dispatch::{Format, Formatted, Packable};
use crate::error::{PackError, UnpackError};
use crate::wire::{self, CoreFormat};

#[cfg(test)]
mod tests;

/// The `nil` atom.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Nil;

/// The two boolean atoms.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Boolean;

/// The signed integer family. Reading tolerates unsigned encodings when the
/// value fits; writing always emits the signed family.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Signed;

/// The unsigned integer family. Signed encodings are rejected on read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Unsigned;

/// The two IEEE-754 float atoms.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Float;

/// The UTF-8 string atoms.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Utf8;

/// The raw binary atoms.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Binary;

impl Format for Nil {
    const NAME: &'static str = "Nil";

    fn is_format_byte(byte: u8) -> bool {
        wire::admits(CoreFormat::Nil, byte)
    }
}

impl Format for Boolean {
    const NAME: &'static str = "Boolean";

    fn is_format_byte(byte: u8) -> bool {
        wire::admits(CoreFormat::Boolean, byte)
    }
}

impl Format for Signed {
    const NAME: &'static str = "Signed";

    fn is_format_byte(byte: u8) -> bool {
        wire::admits(CoreFormat::Signed, byte)
    }
}

impl Format for Unsigned {
    const NAME: &'static str = "Unsigned";

    fn is_format_byte(byte: u8) -> bool {
        wire::admits(CoreFormat::Unsigned, byte)
    }
}

impl Format for Float {
    const NAME: &'static str = "Float";

    fn is_format_byte(byte: u8) -> bool {
        wire::admits(CoreFormat::Float, byte)
    }
}

impl Format for Utf8 {
    const NAME: &'static str = "Utf8";

    fn is_format_byte(byte: u8) -> bool {
        wire::admits(CoreFormat::Utf8, byte)
    }
}

impl Format for Binary {
    const NAME: &'static str = "Binary";

    fn is_format_byte(byte: u8) -> bool {
        wire::admits(CoreFormat::Binary, byte)
    }
}

/// Values representable as the `nil` atom.
pub trait NilValue<C: Context = DefaultContext>: Sized {
    fn construct(ctx: &C) -> Result<Self, UnpackError>;
}

/// Values representable as a boolean atom.
pub trait BooleanValue<C: Context = DefaultContext>: Sized {
    fn destruct(&self, ctx: &C) -> bool;

    fn construct(value: bool, ctx: &C) -> Result<Self, UnpackError>;
}

/// Values representable as a signed integer atom.
pub trait SignedValue<C: Context = DefaultContext>: Sized {
    fn destruct(&self, ctx: &C) -> i64;

    fn construct(value: i64, ctx: &C) -> Result<Self, UnpackError>;
}

/// Values representable as an unsigned integer atom.
pub trait UnsignedValue<C: Context = DefaultContext>: Sized {
    fn destruct(&self, ctx: &C) -> u64;

    fn construct(value: u64, ctx: &C) -> Result<Self, UnpackError>;
}

/// The float widths a value can destruct to. A 32-bit destruct emits the
/// four-byte atom.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FloatAtom {
    F32(f32),
    F64(f64),
}

/// Values representable as a float atom. Reads are widened to `f64` before
/// construction.
pub trait FloatValue<C: Context = DefaultContext>: Sized {
    fn destruct(&self, ctx: &C) -> FloatAtom;

    fn construct(value: f64, ctx: &C) -> Result<Self, UnpackError>;
}

/// The pack half of the UTF-8 family. Borrowed text such as `&str`
/// implements only this half; types that can also be rebuilt from an owned
/// string implement [`Utf8Value`] as well.
pub trait Utf8Destruct<C: Context = DefaultContext> {
    fn destruct(&self, ctx: &C) -> Cow<'_, str>;
}

/// Values representable as a UTF-8 string atom in both directions.
pub trait Utf8Value<C: Context = DefaultContext>: Utf8Destruct<C> + Sized {
    fn construct(text: String, ctx: &C) -> Result<Self, UnpackError>;
}

/// Write one text value as a UTF-8 atom. This is the pack half of the
/// `Utf8` format on its own, usable with text that has no construct half.
pub fn pack_text<W, T, C>(writer: &mut W, value: &T, ctx: &C) -> Result<(), PackError>
where
    W: std::io::Write,
    T: Utf8Destruct<C> + ?Sized,
    C: Context,
{
    wire::write_str(writer, value.destruct(ctx).as_ref())
}

/// Values representable as a raw binary atom.
pub trait BinaryValue<C: Context = DefaultContext>: Sized {
    fn destruct(&self, ctx: &C) -> Cow<'_, [u8]>;

    fn construct(bytes: Vec<u8>, ctx: &C) -> Result<Self, UnpackError>;
}

impl<T, C> Packable<Nil, C> for T
where
    T: NilValue<C>,
    C: Context,
{
    fn pack<W: std::io::Write>(&self, writer: &mut W, _ctx: &C) -> Result<(), PackError> {
        wire::write_nil(writer)
    }

    fn unpack<R: Buf>(reader: &mut R, ctx: &C) -> Result<Self, UnpackError> {
        wire::read_nil(reader)?;
        T::construct(ctx)
    }
}

impl<T, C> Packable<Boolean, C> for T
where
    T: BooleanValue<C>,
    C: Context,
{
    fn pack<W: std::io::Write>(&self, writer: &mut W, ctx: &C) -> Result<(), PackError> {
        wire::write_bool(writer, self.destruct(ctx))
    }

    fn unpack<R: Buf>(reader: &mut R, ctx: &C) -> Result<Self, UnpackError> {
        T::construct(wire::read_bool(reader)?, ctx)
    }
}

impl<T, C> Packable<Signed, C> for T
where
    T: SignedValue<C>,
    C: Context,
{
    fn pack<W: std::io::Write>(&self, writer: &mut W, ctx: &C) -> Result<(), PackError> {
        wire::write_signed(writer, self.destruct(ctx))
    }

    fn unpack<R: Buf>(reader: &mut R, ctx: &C) -> Result<Self, UnpackError> {
        T::construct(wire::read_signed(reader)?, ctx)
    }
}

impl<T, C> Packable<Unsigned, C> for T
where
    T: UnsignedValue<C>,
    C: Context,
{
    fn pack<W: std::io::Write>(&self, writer: &mut W, ctx: &C) -> Result<(), PackError> {
        wire::write_unsigned(writer, self.destruct(ctx))
    }

    fn unpack<R: Buf>(reader: &mut R, ctx: &C) -> Result<Self, UnpackError> {
        T::construct(wire::read_unsigned(reader)?, ctx)
    }
}

impl<T, C> Packable<Float, C> for T
where
    T: FloatValue<C>,
    C: Context,
{
    fn pack<W: std::io::Write>(&self, writer: &mut W, ctx: &C) -> Result<(), PackError> {
        match self.destruct(ctx) {
            FloatAtom::F32(x) => wire::write_f32(writer, x),
            FloatAtom::F64(x) => wire::write_f64(writer, x),
        }
    }

    fn unpack<R: Buf>(reader: &mut R, ctx: &C) -> Result<Self, UnpackError> {
        T::construct(wire::read_float(reader)?, ctx)
    }
}

impl<T, C> Packable<Utf8, C> for T
where
    T: Utf8Value<C>,
    C: Context,
{
    fn pack<W: std::io::Write>(&self, writer: &mut W, ctx: &C) -> Result<(), PackError> {
        wire::write_str(writer, self.destruct(ctx).as_ref())
    }

    fn unpack<R: Buf>(reader: &mut R, ctx: &C) -> Result<Self, UnpackError> {
        T::construct(wire::read_string(reader)?, ctx)
    }
}

impl<T, C> Packable<Binary, C> for T
where
    T: BinaryValue<C>,
    C: Context,
{
    fn pack<W: std::io::Write>(&self, writer: &mut W, ctx: &C) -> Result<(), PackError> {
        wire::write_bin(writer, self.destruct(ctx).as_ref())
    }

    fn unpack<R: Buf>(reader: &mut R, ctx: &C) -> Result<Self, UnpackError> {
        T::construct(wire::read_bin(reader)?, ctx)
    }
}

impl<C: Context> NilValue<C> for () {
    fn construct(_ctx: &C) -> Result<Self, UnpackError> {
        Ok(())
    }
}

impl<C: Context> Formatted<C> for () {
    type Fmt = Nil;
}

impl<C: Context> BooleanValue<C> for bool {
    fn destruct(&self, _ctx: &C) -> bool {
        *self
    }

    fn construct(value: bool, _ctx: &C) -> Result<Self, UnpackError> {
        Ok(value)
    }
}

impl<C: Context> Formatted<C> for bool {
    type Fmt = Boolean;
}

macro_rules! signed_value_impl {
    ($($ty:ty),* $(,)?) => {
        $(
            impl<C: Context> SignedValue<C> for $ty {
                fn destruct(&self, _ctx: &C) -> i64 {
                    *self as i64
                }

                fn construct(value: i64, _ctx: &C) -> Result<Self, UnpackError> {
                    <$ty>::try_from(value)
                        .map_err(|_| UnpackError::NumberOutOfRange { format: "Signed" })
                }
            }

            impl<C: Context> Formatted<C> for $ty {
                type Fmt = Signed;
            }
        )*
    };
}

signed_value_impl!(i8, i16, i32, i64, isize);

macro_rules! unsigned_value_impl {
    ($($ty:ty),* $(,)?) => {
        $(
            impl<C: Context> UnsignedValue<C> for $ty {
                fn destruct(&self, _ctx: &C) -> u64 {
                    *self as u64
                }

                fn construct(value: u64, _ctx: &C) -> Result<Self, UnpackError> {
                    <$ty>::try_from(value)
                        .map_err(|_| UnpackError::NumberOutOfRange { format: "Unsigned" })
                }
            }

            impl<C: Context> Formatted<C> for $ty {
                type Fmt = Unsigned;
            }
        )*
    };
}

unsigned_value_impl!(u8, u16, u32, u64, usize);

impl<C: Context> FloatValue<C> for f32 {
    fn destruct(&self, _ctx: &C) -> FloatAtom {
        FloatAtom::F32(*self)
    }

    fn construct(value: f64, _ctx: &C) -> Result<Self, UnpackError> {
        Ok(value as f32)
    }
}

impl<C: Context> FloatValue<C> for f64 {
    fn destruct(&self, _ctx: &C) -> FloatAtom {
        FloatAtom::F64(*self)
    }

    fn construct(value: f64, _ctx: &C) -> Result<Self, UnpackError> {
        Ok(value)
    }
}

impl<C: Context> Formatted<C> for f32 {
    type Fmt = Float;
}

impl<C: Context> Formatted<C> for f64 {
    type Fmt = Float;
}

impl<C: Context> Utf8Destruct<C> for String {
    fn destruct(&self, _ctx: &C) -> Cow<'_, str> {
        Cow::Borrowed(self.as_str())
    }
}

impl<C: Context> Utf8Value<C> for String {
    fn construct(text: String, _ctx: &C) -> Result<Self, UnpackError> {
        Ok(text)
    }
}

impl<C: Context> Utf8Destruct<C> for str {
    fn destruct(&self, _ctx: &C) -> Cow<'_, str> {
        Cow::Borrowed(self)
    }
}

impl<T, C> Utf8Destruct<C> for &T
where
    C: Context,
    T: Utf8Destruct<C> + ?Sized,
{
    fn destruct(&self, ctx: &C) -> Cow<'_, str> {
        T::destruct(*self, ctx)
    }
}

impl<C: Context> Formatted<C> for String {
    type Fmt = Utf8;
}

impl<C: Context> BinaryValue<C> for bytes::Bytes {
    fn destruct(&self, _ctx: &C) -> Cow<'_, [u8]> {
        Cow::Borrowed(self.as_ref())
    }

    fn construct(bytes: Vec<u8>, _ctx: &C) -> Result<Self, UnpackError> {
        Ok(bytes::Bytes::from(bytes))
    }
}

impl<C: Context> Formatted<C> for bytes::Bytes {
    type Fmt = Binary;
}
