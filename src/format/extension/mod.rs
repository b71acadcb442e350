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

//! The MessagePack extension formats. `Extension<CODE>` binds a value to one
//! application-reserved type code; `AnyExtension` carries the code alongside
//! the payload for streams whose codes are not known statically.

use std::borrow::Cow;

use bytes::Buf;

use crate::context::{Context, DefaultContext};
use crate::dispatch::{Format, Formatted, Packable};
use crate::error::{PackError, UnpackError};
use crate::value::ExtensionData;
use crate::wire::{self, CoreFormat};


/// An extension value with a fixed type code.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Extension<const CODE: i8>;

/// An extension value of any type code, surfaced as
/// [`ExtensionData`](crate::value::ExtensionData).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnyExtension;

impl<const CODE: i8> Format for Extension<CODE> {
    const NAME: &'static str = "Extension";

    fn is_format_byte(byte: u8) -> bool {
        wire::admits(CoreFormat::Extension, byte)
    }
}

impl Format for AnyExtension {
    const NAME: &'static str = "AnyExtension";

    fn is_format_byte(byte: u8) -> bool {
        wire::admits(CoreFormat::Extension, byte)
    }
}

/// Values that destruct to an extension payload.
pub trait ExtensionValue<C: Context = DefaultContext>: Sized {
    /// The payload bytes. Producing them may fail for values with no legal
    /// extension form.
    fn destruct(&self, ctx: &C) -> Result<Cow<'_, [u8]>, PackError>;

    fn construct(data: Vec<u8>, ctx: &C) -> Result<Self, UnpackError>;
}

impl<T, C, const CODE: i8> Packable<Extension<CODE>, C> for T
where
    T: ExtensionValue<C>,
    C: Context,
{
    fn pack<W: std::io::Write>(&self, writer: &mut W, ctx: &C) -> Result<(), PackError> {
        let payload = self.destruct(ctx)?;
        wire::write_ext_header(writer, CODE, payload.len())?;
        writer.write_all(payload.as_ref())?;
        Ok(())
    }

    fn unpack<R: Buf>(reader: &mut R, ctx: &C) -> Result<Self, UnpackError> {
        let (code, len) = wire::read_ext_header(reader)?;
        if code != CODE {
            return Err(UnpackError::ExtensionMismatch {
                expected: CODE,
                actual: code,
            });
        }
        T::construct(wire::take_bytes(reader, len)?, ctx)
    }
}

impl<C: Context> Packable<AnyExtension, C> for ExtensionData {
    fn pack<W: std::io::Write>(&self, writer: &mut W, _ctx: &C) -> Result<(), PackError> {
        wire::write_ext_header(writer, self.code, self.data.len())?;
        writer.write_all(&self.data)?;
        Ok(())
    }

    fn unpack<R: Buf>(reader: &mut R, _ctx: &C) -> Result<Self, UnpackError> {
        let (code, len) = wire::read_ext_header(reader)?;
        Ok(ExtensionData::new(code, wire::take_bytes(reader, len)?))
    }
}

impl<C: Context> Formatted<C> for ExtensionData {
    type Fmt = AnyExtension;
}
