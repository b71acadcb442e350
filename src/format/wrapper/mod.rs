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

//! The wrapper formats: the lazy `DefaultFormat` indirection, the generic
//! `AnyFormat`, the context-switching `SetContext` and the nil-tolerant
//! `Nullable`.

use std::marker::PhantomData;

use bytes::Buf;

use crate::context::{self, Context};
use crate::dispatch::{Format, Formatted, Packable};
use crate::error::{InvariantError, PackError, UnpackError};
use crate::value::{AnyValue, ExtensionData};
use crate::wire::{self, CoreFormat};


/// The lazy indirection: packing re-resolves the value's default format for
/// the active context. It must never itself be the resolved format of a
/// type; that configuration is reported as an invariant violation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DefaultFormat;

/// Generic decoding with no target type. The active context is ignored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnyFormat;

/// Delegates to `F` under the context `C2`, regardless of the context at the
/// call site. The ambient context is switched for the duration of the
/// delegated call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SetContext<C2, F>(PhantomData<(C2, F)>);

/// Accepts `nil` for a missing value and otherwise delegates to `F`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Nullable<F>(PhantomData<F>);

impl Format for DefaultFormat {
    const NAME: &'static str = "Default";

    const IS_DEFAULT: bool = true;

    fn is_format_byte(byte: u8) -> bool {
        wire::classify(byte).is_some()
    }
}

impl Format for AnyFormat {
    const NAME: &'static str = "Any";

    fn is_format_byte(byte: u8) -> bool {
        wire::classify(byte).is_some()
    }
}

impl<C2: Context, F: Format> Format for SetContext<C2, F> {
    const NAME: &'static str = "SetContext";

    const IS_TYPED: bool = F::IS_TYPED;

    fn is_format_byte(byte: u8) -> bool {
        F::is_format_byte(byte)
    }
}

impl<F: Format> Format for Nullable<F> {
    const NAME: &'static str = "Nullable";

    fn is_format_byte(byte: u8) -> bool {
        wire::admits(CoreFormat::Nil, byte) || F::is_format_byte(byte)
    }
}

impl<T, C> Packable<DefaultFormat, C> for T
where
    C: Context,
    T: Formatted<C> + Packable<<T as Formatted<C>>::Fmt, C>,
{
    fn pack<W: std::io::Write>(&self, writer: &mut W, ctx: &C) -> Result<(), PackError> {
        if <<T as Formatted<C>>::Fmt as Format>::IS_DEFAULT {
            return Err(InvariantError::new(
                "a type resolved its format to the lazy Default indirection",
            )
            .into());
        }
        <T as Packable<<T as Formatted<C>>::Fmt, C>>::pack(self, writer, ctx)
    }

    fn unpack<R: Buf>(reader: &mut R, ctx: &C) -> Result<Self, UnpackError> {
        if <<T as Formatted<C>>::Fmt as Format>::IS_DEFAULT {
            return Err(InvariantError::new(
                "a type resolved its format to the lazy Default indirection",
            )
            .into());
        }
        <T as Packable<<T as Formatted<C>>::Fmt, C>>::unpack(reader, ctx)
    }
}

impl<T, C, C2, F> Packable<SetContext<C2, F>, C> for T
where
    C: Context,
    C2: Context,
    F: Format,
    T: Packable<F, C2>,
{
    fn pack<W: std::io::Write>(&self, writer: &mut W, _ctx: &C) -> Result<(), PackError> {
        let _guard = context::set_ambient::<C2>();
        <T as Packable<F, C2>>::pack(self, writer, &C2::default())
    }

    fn unpack<R: Buf>(reader: &mut R, _ctx: &C) -> Result<Self, UnpackError> {
        let _guard = context::set_ambient::<C2>();
        <T as Packable<F, C2>>::unpack(reader, &C2::default())
    }
}

impl<T, F, C> Packable<Nullable<F>, C> for Option<T>
where
    C: Context,
    F: Format,
    T: Packable<F, C>,
{
    fn pack<W: std::io::Write>(&self, writer: &mut W, ctx: &C) -> Result<(), PackError> {
        match self {
            None => wire::write_nil(writer),
            Some(value) => <T as Packable<F, C>>::pack(value, writer, ctx),
        }
    }

    fn unpack<R: Buf>(reader: &mut R, ctx: &C) -> Result<Self, UnpackError> {
        if wire::peek_byte(reader)? == 0xc0 {
            wire::read_nil(reader)?;
            Ok(None)
        } else {
            Ok(Some(<T as Packable<F, C>>::unpack(reader, ctx)?))
        }
    }
}

impl<T, C> Formatted<C> for Option<T>
where
    C: Context,
    T: Formatted<C>,
{
    type Fmt = Nullable<<T as Formatted<C>>::Fmt>;
}

impl<C: Context> Packable<AnyFormat, C> for AnyValue {
    fn pack<W: std::io::Write>(&self, writer: &mut W, ctx: &C) -> Result<(), PackError> {
        match self {
            AnyValue::Nil => wire::write_nil(writer),
            AnyValue::Bool(p) => wire::write_bool(writer, *p),
            AnyValue::Int(n) => wire::write_signed(writer, *n),
            AnyValue::UInt(n) => wire::write_unsigned(writer, *n),
            AnyValue::Float(x) => wire::write_f64(writer, *x),
            AnyValue::Str(text) => wire::write_str(writer, text),
            AnyValue::Bin(blob) => wire::write_bin(writer, blob),
            AnyValue::Seq(items) => {
                let len = u32::try_from(items.len()).map_err(|_| PackError::TooLong {
                    format: "Any",
                    len: items.len(),
                })?;
                wire::write_array_header(writer, len)?;
                for item in items {
                    <AnyValue as Packable<AnyFormat, C>>::pack(item, writer, ctx)?;
                }
                Ok(())
            }
            AnyValue::Map(entries) => {
                let len = u32::try_from(entries.len()).map_err(|_| PackError::TooLong {
                    format: "Any",
                    len: entries.len(),
                })?;
                wire::write_map_header(writer, len)?;
                for (key, value) in entries {
                    <AnyValue as Packable<AnyFormat, C>>::pack(key, writer, ctx)?;
                    <AnyValue as Packable<AnyFormat, C>>::pack(value, writer, ctx)?;
                }
                Ok(())
            }
            AnyValue::Ext(data) => {
                wire::write_ext_header(writer, data.code, data.data.len())?;
                writer.write_all(&data.data)?;
                Ok(())
            }
        }
    }

    fn unpack<R: Buf>(reader: &mut R, ctx: &C) -> Result<Self, UnpackError> {
        let byte = wire::peek_byte(reader)?;
        let format = wire::classify(byte).ok_or(UnpackError::InvalidMarker {
            format: "Any",
            byte,
        })?;
        let value = match format {
            CoreFormat::Nil => {
                wire::read_nil(reader)?;
                AnyValue::Nil
            }
            CoreFormat::Boolean => AnyValue::Bool(wire::read_bool(reader)?),
            CoreFormat::Signed => AnyValue::Int(wire::read_signed(reader)?),
            CoreFormat::Unsigned => {
                let n = wire::read_unsigned(reader)?;
                match i64::try_from(n) {
                    Ok(n) => AnyValue::Int(n),
                    Err(_) => AnyValue::UInt(n),
                }
            }
            CoreFormat::Float => AnyValue::Float(wire::read_float(reader)?),
            CoreFormat::Utf8 => AnyValue::Str(wire::read_string(reader)?),
            CoreFormat::Binary => AnyValue::Bin(wire::read_bin(reader)?),
            CoreFormat::Vector => {
                let len = wire::read_array_header(reader)?;
                let mut items = Vec::with_capacity(len as usize);
                for _ in 0..len {
                    items.push(<AnyValue as Packable<AnyFormat, C>>::unpack(reader, ctx)?);
                }
                AnyValue::Seq(items)
            }
            CoreFormat::Map => {
                let len = wire::read_map_header(reader)?;
                let mut entries = Vec::with_capacity(len as usize);
                for _ in 0..len {
                    let key = <AnyValue as Packable<AnyFormat, C>>::unpack(reader, ctx)?;
                    let value = <AnyValue as Packable<AnyFormat, C>>::unpack(reader, ctx)?;
                    entries.push((key, value));
                }
                AnyValue::Map(entries)
            }
            CoreFormat::Extension => {
                let (code, len) = wire::read_ext_header(reader)?;
                AnyValue::Ext(ExtensionData::new(code, wire::take_bytes(reader, len)?))
            }
        };
        Ok(value)
    }
}

impl<C: Context> Formatted<C> for AnyValue {
    type Fmt = AnyFormat;
}
