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

//! The record formats: string-keyed maps with a fixed field schema. All
//! three variants write identical bytes; they differ in how strictly they
//! read. `Struct` demands the declared field order, `UnorderedStruct`
//! accepts any permutation, and `FlexibleStruct` additionally skips unknown
//! keys.

use bytes::Buf;

use crate::context::{Context, DefaultContext};
use crate::dispatch::{Format, Packable};
use crate::error::{PackError, UnpackError};
use crate::reader;
use crate::wire::{self, CoreFormat};

#[cfg(test)]
mod tests;

/// Record format requiring fields in declared order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Struct;

/// Record format accepting any permutation of the declared fields.
/// Duplicate and undeclared keys are errors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UnorderedStruct;

/// Record format accepting any permutation and silently skipping undeclared
/// keys. Duplicates of declared fields remain errors, as do absent declared
/// fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlexibleStruct;

impl Format for Struct {
    const NAME: &'static str = "Struct";

    fn is_format_byte(byte: u8) -> bool {
        wire::admits(CoreFormat::Map, byte)
    }
}

impl Format for UnorderedStruct {
    const NAME: &'static str = "UnorderedStruct";

    fn is_format_byte(byte: u8) -> bool {
        wire::admits(CoreFormat::Map, byte)
    }
}

impl Format for FlexibleStruct {
    const NAME: &'static str = "FlexibleStruct";

    fn is_format_byte(byte: u8) -> bool {
        wire::admits(CoreFormat::Map, byte)
    }
}

/// Values with a fixed, string-keyed field schema.
///
/// `FIELDS` lists the field names in declared order; `pack_field` and
/// `unpack_field` are indexed by position in that list, which is where
/// per-field format choices live. The builder accumulates decoded fields in
/// whatever order the wire provides them; the engine guarantees every
/// declared field is decoded exactly once before `construct` runs.
pub trait RecordValue<C: Context = DefaultContext>: Sized {
    const FIELDS: &'static [&'static str];

    type Builder: Default;

    /// Write the value of the field at `index`. The key has already been
    /// written.
    fn pack_field<W: std::io::Write>(
        &self,
        index: usize,
        writer: &mut W,
        ctx: &C,
    ) -> Result<(), PackError>;

    /// Decode the value of the field at `index` into the builder.
    fn unpack_field<R: Buf>(
        builder: &mut Self::Builder,
        index: usize,
        reader: &mut R,
        ctx: &C,
    ) -> Result<(), UnpackError>;

    /// Assemble the value once every declared field has been decoded.
    fn construct(builder: Self::Builder, ctx: &C) -> Result<Self, UnpackError>;
}

fn pack_record<T, W, C>(value: &T, writer: &mut W, ctx: &C) -> Result<(), PackError>
where
    T: RecordValue<C>,
    W: std::io::Write,
    C: Context,
{
    let len = u32::try_from(T::FIELDS.len()).map_err(|_| PackError::TooLong {
        format: "Struct",
        len: T::FIELDS.len(),
    })?;
    wire::write_map_header(writer, len)?;
    for (index, name) in T::FIELDS.iter().enumerate() {
        wire::write_str(writer, name)?;
        value.pack_field(index, writer, ctx)?;
    }
    Ok(())
}

fn unpack_ordered<T, R, C>(reader: &mut R, ctx: &C) -> Result<T, UnpackError>
where
    T: RecordValue<C>,
    R: Buf,
    C: Context,
{
    let len = wire::read_map_header(reader)? as usize;
    let mut builder = T::Builder::default();
    for index in 0..len {
        let key = wire::read_string(reader)?;
        match T::FIELDS.get(index) {
            None => return Err(UnpackError::UnexpectedField(key)),
            Some(name) if key != *name => {
                return Err(UnpackError::KeyMismatch {
                    expected: (*name).to_string(),
                    actual: key,
                })
            }
            Some(_) => T::unpack_field(&mut builder, index, reader, ctx)?,
        }
    }
    if len < T::FIELDS.len() {
        return Err(UnpackError::MissingFields(T::FIELDS[len..].to_vec()));
    }
    T::construct(builder, ctx)
}

fn unpack_unordered<T, R, C>(
    reader: &mut R,
    ctx: &C,
    skip_unknown: bool,
) -> Result<T, UnpackError>
where
    T: RecordValue<C>,
    R: Buf,
    C: Context,
{
    let len = wire::read_map_header(reader)?;
    let mut builder = T::Builder::default();
    let mut seen = vec![false; T::FIELDS.len()];
    for _ in 0..len {
        let key = wire::read_string(reader)?;
        match T::FIELDS.iter().position(|name| *name == key) {
            Some(index) => {
                if seen[index] {
                    return Err(UnpackError::DuplicateKey(key));
                }
                seen[index] = true;
                T::unpack_field(&mut builder, index, reader, ctx)?;
            }
            None if skip_unknown => reader::skip(reader)?,
            None => return Err(UnpackError::UnexpectedField(key)),
        }
    }
    let missing: Vec<&'static str> = T::FIELDS
        .iter()
        .zip(&seen)
        .filter_map(|(name, seen)| if *seen { None } else { Some(*name) })
        .collect();
    if !missing.is_empty() {
        return Err(UnpackError::MissingFields(missing));
    }
    T::construct(builder, ctx)
}

impl<T, C> Packable<Struct, C> for T
where
    T: RecordValue<C>,
    C: Context,
{
    fn pack<W: std::io::Write>(&self, writer: &mut W, ctx: &C) -> Result<(), PackError> {
        pack_record(self, writer, ctx)
    }

    fn unpack<R: Buf>(reader: &mut R, ctx: &C) -> Result<Self, UnpackError> {
        unpack_ordered(reader, ctx)
    }
}

impl<T, C> Packable<UnorderedStruct, C> for T
where
    T: RecordValue<C>,
    C: Context,
{
    fn pack<W: std::io::Write>(&self, writer: &mut W, ctx: &C) -> Result<(), PackError> {
        pack_record(self, writer, ctx)
    }

    fn unpack<R: Buf>(reader: &mut R, ctx: &C) -> Result<Self, UnpackError> {
        unpack_unordered(reader, ctx, false)
    }
}

impl<T, C> Packable<FlexibleStruct, C> for T
where
    T: RecordValue<C>,
    C: Context,
{
    fn pack<W: std::io::Write>(&self, writer: &mut W, ctx: &C) -> Result<(), PackError> {
        pack_record(self, writer, ctx)
    }

    fn unpack<R: Buf>(reader: &mut R, ctx: &C) -> Result<Self, UnpackError> {
        unpack_unordered(reader, ctx, true)
    }
}
