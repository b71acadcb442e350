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

//! The dispatch core: the [`Format`] tag trait, the type-to-format binding
//! [`Formatted`], the packing relation [`Packable`] and the top-level entry
//! points.
//!
//! A call site picks a value, optionally a format and optionally a context.
//! When the format is omitted it is resolved through [`Formatted`]; when the
//! context is omitted the call runs under
//! [`DefaultContext`](crate::context::DefaultContext).

use bytes::Buf;

use crate::context::{Context, DefaultContext};
use crate::error::{InvariantError, PackError, UnpackError};
use crate::format::wrapper::AnyFormat;
use crate::value::AnyValue;

/// A wire encoding strategy. Formats are stateless zero-sized tags; a format
/// that is parameterized (by another format, a context or an extension code)
/// is still a zero-sized type.
pub trait Format: Copy + Default + 'static {
    /// The name used in diagnostics.
    const NAME: &'static str;

    /// True for the `Typed` family. Consulted by the recursion guard.
    const IS_TYPED: bool = false;

    /// True only for the lazy `Default` indirection, which must never be the
    /// resolved format of any type.
    const IS_DEFAULT: bool = false;

    /// Whether `byte` can plausibly begin a value encoded in this format.
    fn is_format_byte(byte: u8) -> bool;
}

/// Binds a type to its default wire format under the context `C`.
///
/// The impl with the default parameter (`Formatted<DefaultContext>`) is the
/// context-free binding; an additional impl for a user context overrides the
/// format only under that context. The two byte streams need not agree; each
/// decodes under its own context.
pub trait Formatted<C: Context = DefaultContext> {
    /// The format values of this type are encoded in by default.
    type Fmt: Format;
}

/// The packing relation: values of `Self` can be written and read in the
/// format `F` under the context `C`. Implementations are supplied once per
/// format as blanket impls over that format's destruct/construct trait; user
/// types participate by implementing the destruct/construct trait, never
/// `Packable` itself.
pub trait Packable<F: Format, C: Context = DefaultContext>: Sized {
    fn pack<W: std::io::Write>(&self, writer: &mut W, ctx: &C) -> Result<(), PackError>;

    fn unpack<R: Buf>(reader: &mut R, ctx: &C) -> Result<Self, UnpackError>;
}

/// Shorthand for types that can be packed in their own default format.
pub trait DefaultPackable<C: Context = DefaultContext>:
    Formatted<C> + Packable<<Self as Formatted<C>>::Fmt, C>
{
}

impl<T, C: Context> DefaultPackable<C> for T where
    T: Formatted<C> + Packable<<T as Formatted<C>>::Fmt, C>
{
}

fn guard_resolved<T, C>() -> Result<(), InvariantError>
where
    T: Formatted<C>,
    C: Context,
{
    if <T::Fmt as Format>::IS_DEFAULT {
        Err(InvariantError::new(
            "a type resolved its format to the lazy Default indirection",
        ))
    } else {
        Ok(())
    }
}

/// Pack `value` in its default format under [`DefaultContext`].
pub fn pack<T>(value: &T) -> Result<Vec<u8>, PackError>
where
    T: DefaultPackable,
{
    pack_with(value, &DefaultContext)
}

/// Pack `value` in its default format under `ctx`.
pub fn pack_with<T, C>(value: &T, ctx: &C) -> Result<Vec<u8>, PackError>
where
    C: Context,
    T: DefaultPackable<C>,
{
    let mut out = Vec::new();
    pack_to_with(&mut out, value, ctx)?;
    Ok(out)
}

/// Pack `value` in the explicit format `F` under `ctx`.
pub fn pack_in<F, T, C>(value: &T, ctx: &C) -> Result<Vec<u8>, PackError>
where
    F: Format,
    C: Context,
    T: Packable<F, C>,
{
    let mut out = Vec::new();
    <T as Packable<F, C>>::pack(value, &mut out, ctx)?;
    Ok(out)
}

/// Pack `value` to a caller-owned writer in its default format.
pub fn pack_to<W, T>(writer: &mut W, value: &T) -> Result<(), PackError>
where
    W: std::io::Write,
    T: DefaultPackable,
{
    pack_to_with(writer, value, &DefaultContext)
}

/// Pack `value` to a caller-owned writer in its default format under `ctx`.
pub fn pack_to_with<W, T, C>(writer: &mut W, value: &T, ctx: &C) -> Result<(), PackError>
where
    W: std::io::Write,
    C: Context,
    T: DefaultPackable<C>,
{
    guard_resolved::<T, C>()?;
    <T as Packable<<T as Formatted<C>>::Fmt, C>>::pack(value, writer, ctx)
}

/// Pack `value` to a caller-owned writer in the explicit format `F`.
pub fn pack_to_in<F, W, T, C>(writer: &mut W, value: &T, ctx: &C) -> Result<(), PackError>
where
    F: Format,
    W: std::io::Write,
    C: Context,
    T: Packable<F, C>,
{
    <T as Packable<F, C>>::pack(value, writer, ctx)
}

/// Unpack a `T` from a byte slice in its default format under
/// [`DefaultContext`]. The whole slice must be consumed.
pub fn unpack<T>(bytes: &[u8]) -> Result<T, UnpackError>
where
    T: DefaultPackable,
{
    unpack_with(bytes, &DefaultContext)
}

/// Unpack a `T` from a byte slice in its default format under `ctx`. The
/// whole slice must be consumed.
pub fn unpack_with<T, C>(bytes: &[u8], ctx: &C) -> Result<T, UnpackError>
where
    C: Context,
    T: DefaultPackable<C>,
{
    let mut reader = bytes;
    let value = unpack_from_with(&mut reader, ctx)?;
    if reader.has_remaining() {
        Err(UnpackError::UnconsumedData)
    } else {
        Ok(value)
    }
}

/// Unpack a `T` from a byte slice in the explicit format `F` under `ctx`.
/// The whole slice must be consumed.
pub fn unpack_in<F, T, C>(bytes: &[u8], ctx: &C) -> Result<T, UnpackError>
where
    F: Format,
    C: Context,
    T: Packable<F, C>,
{
    let mut reader = bytes;
    let value = <T as Packable<F, C>>::unpack(&mut reader, ctx)?;
    if reader.has_remaining() {
        Err(UnpackError::UnconsumedData)
    } else {
        Ok(value)
    }
}

/// Unpack a `T` from a caller-owned reader in its default format. The cursor
/// is left positioned after the value.
pub fn unpack_from<R, T>(reader: &mut R) -> Result<T, UnpackError>
where
    R: Buf,
    T: DefaultPackable,
{
    unpack_from_with(reader, &DefaultContext)
}

/// Unpack a `T` from a caller-owned reader in its default format under `ctx`.
pub fn unpack_from_with<R, T, C>(reader: &mut R, ctx: &C) -> Result<T, UnpackError>
where
    R: Buf,
    C: Context,
    T: DefaultPackable<C>,
{
    guard_resolved::<T, C>()?;
    <T as Packable<<T as Formatted<C>>::Fmt, C>>::unpack(reader, ctx)
}

/// Unpack a `T` from a caller-owned reader in the explicit format `F`.
pub fn unpack_from_in<F, R, T, C>(reader: &mut R, ctx: &C) -> Result<T, UnpackError>
where
    F: Format,
    R: Buf,
    C: Context,
    T: Packable<F, C>,
{
    <T as Packable<F, C>>::unpack(reader, ctx)
}

/// Decode the next value generically, with no target type. Arrays become
/// sequences of [`AnyValue`], maps become keyed pairs and extensions become
/// [`ExtensionData`](crate::value::ExtensionData). The active context is
/// ignored entirely.
pub fn unpack_any<R: Buf>(reader: &mut R) -> Result<AnyValue, UnpackError> {
    <AnyValue as Packable<AnyFormat, DefaultContext>>::unpack(reader, &DefaultContext)
}
