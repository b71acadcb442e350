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

//! Self-describing values. `TypeFormat` serializes a [`TypeDescriptor`]
//! (name, namespace path and type parameters); `Typed<F>` serializes a value
//! together with its descriptor as the two-entry map
//! `{"type": …, "value": …}`, so a stream can be decoded without prior
//! knowledge of the concrete type.
//!
//! Reconstruction never runs a constructor the active context has not
//! permitted: [`Context::permits`] is consulted as soon as the descriptor is
//! decoded, before the `"value"` entry is touched.

use std::marker::PhantomData;

use bytes::Buf;

use crate::context::{Context, DefaultContext};
use crate::dispatch::{Format, Formatted, Packable};
use crate::error::{PackError, UnpackError};
use crate::wire::{self, CoreFormat};

#[cfg(test)]
mod tests;

const TYPE_KEY: &str = "type";
const VALUE_KEY: &str = "value";

/// The wire representation of a type: its final identifier, the namespace
/// chain leading to it, and its type parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDescriptor {
    pub name: String,
    pub path: Vec<String>,
    pub params: Vec<TypeParam>,
}

/// A type parameter value: either a nested type or a primitive constant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeParam {
    Type(TypeDescriptor),
    Str(String),
    Int(i64),
    Bool(bool),
}

impl TypeDescriptor {
    pub fn new(name: impl Into<String>, path: Vec<String>, params: Vec<TypeParam>) -> Self {
        TypeDescriptor {
            name: name.into(),
            path,
            params,
        }
    }

    /// The canonical `path::to::Name` form used for resolution and
    /// whitelisting.
    pub fn canonical(&self) -> String {
        let mut out = String::new();
        for segment in &self.path {
            out.push_str(segment);
            out.push_str("::");
        }
        out.push_str(&self.name);
        out
    }

    /// Whether the canonical name is one of `allowed`. A convenience for
    /// list-shaped [`Context::permits`] implementations.
    pub fn matches_any(&self, allowed: &[&str]) -> bool {
        let canonical = self.canonical();
        allowed.iter().any(|name| *name == canonical)
    }
}

/// Build a descriptor from the compiler's name for a type. Parameterized
/// types are rejected; they must describe themselves explicitly, listing
/// their parameters.
pub fn parse_type_name(raw: &str) -> Result<TypeDescriptor, PackError> {
    if raw.contains('<') {
        return Err(PackError::TypeParameters(raw.to_string()));
    }
    let mut segments: Vec<&str> = raw.split("::").collect();
    let name = segments.pop().unwrap_or(raw);
    Ok(TypeDescriptor {
        name: name.to_string(),
        path: segments.into_iter().map(str::to_string).collect(),
        params: Vec::new(),
    })
}

/// Types with a statically known descriptor.
pub trait Describable {
    /// The descriptor for this type. The default derives the name and path
    /// from the compiler's type name and fails for parameterized types,
    /// which must provide their parameters themselves.
    fn descriptor() -> Result<TypeDescriptor, PackError> {
        parse_type_name(std::any::type_name::<Self>())
    }
}

/// Check that a decoded descriptor names exactly the type `T`.
pub fn expect_concrete<T: Describable>(descriptor: &TypeDescriptor) -> Result<(), UnpackError> {
    let own = <T as Describable>::descriptor()
        .map_err(|_| UnpackError::TypeParameters(std::any::type_name::<T>().to_string()))?;
    if own.canonical() == descriptor.canonical() {
        Ok(())
    } else {
        Err(UnpackError::TypeMismatch {
            expected: own.canonical(),
            actual: descriptor.canonical(),
        })
    }
}

/// The format of a type descriptor itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TypeFormat;

impl Format for TypeFormat {
    const NAME: &'static str = "Type";

    fn is_format_byte(byte: u8) -> bool {
        wire::admits(CoreFormat::Vector, byte)
    }
}

/// The self-describing wrapper: the value is written in `F`, preceded by its
/// descriptor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Typed<F>(PhantomData<F>);

impl<F: Format> Format for Typed<F> {
    const NAME: &'static str = "Typed";

    const IS_TYPED: bool = true;

    fn is_format_byte(byte: u8) -> bool {
        wire::admits(CoreFormat::Map, byte)
    }
}

/// The destruct/construct surface of the `Typed` format.
///
/// The pack side reports the descriptor of the value's *concrete* type and
/// writes the `"value"` entry in `F`; the unpack side receives the decoded
/// descriptor and dispatches to the named type's decoder. For a concrete
/// target this is a [`expect_concrete`] check followed by an ordinary
/// unpack; for an open target (such as a boxed trait object) the
/// implementation matches on the descriptor, which makes it the resolution
/// table for that family of types.
pub trait TypedTarget<F: Format, C: Context = DefaultContext>: Sized {
    /// The descriptor of this value's concrete type.
    fn descriptor(&self) -> Result<TypeDescriptor, PackError>;

    /// Write the `"value"` entry in `F`.
    fn pack_value<W: std::io::Write>(&self, writer: &mut W, ctx: &C) -> Result<(), PackError>;

    /// Decode the `"value"` entry for the concrete type named by
    /// `descriptor`. The whitelist has already been consulted.
    fn construct_from<R: Buf>(
        descriptor: &TypeDescriptor,
        reader: &mut R,
        ctx: &C,
    ) -> Result<Self, UnpackError>;
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

impl<T, F, C> Packable<Typed<F>, C> for T
where
    T: TypedTarget<F, C> + Formatted<C>,
    F: Format,
    C: Context,
{
    fn pack<W: std::io::Write>(&self, writer: &mut W, ctx: &C) -> Result<(), PackError> {
        if F::IS_DEFAULT && <<T as Formatted<C>>::Fmt as Format>::IS_TYPED {
            return Err(PackError::RecursiveTyped(std::any::type_name::<T>()));
        }
        let descriptor = self.descriptor()?;
        wire::write_map_header(writer, 2)?;
        wire::write_str(writer, TYPE_KEY)?;
        <TypeDescriptor as Packable<TypeFormat, C>>::pack(&descriptor, writer, ctx)?;
        wire::write_str(writer, VALUE_KEY)?;
        self.pack_value(writer, ctx)
    }

    fn unpack<R: Buf>(reader: &mut R, ctx: &C) -> Result<Self, UnpackError> {
        if F::IS_DEFAULT && <<T as Formatted<C>>::Fmt as Format>::IS_TYPED {
            return Err(UnpackError::RecursiveTyped(std::any::type_name::<T>()));
        }
        let entries = wire::read_map_header(reader)?;
        if entries != 2 {
            return Err(UnpackError::LengthMismatch {
                expected: 2,
                actual: entries as u64,
            });
        }
        expect_key(reader, TYPE_KEY)?;
        let descriptor = <TypeDescriptor as Packable<TypeFormat, C>>::unpack(reader, ctx)?;
        if !C::permits(&descriptor) {
            return Err(UnpackError::Rejected(descriptor.canonical()));
        }
        expect_key(reader, VALUE_KEY)?;
        T::construct_from(&descriptor, reader, ctx)
    }
}

impl<C: Context> Packable<TypeFormat, C> for TypeDescriptor {
    fn pack<W: std::io::Write>(&self, writer: &mut W, ctx: &C) -> Result<(), PackError> {
        wire::write_array_header(writer, 3)?;
        wire::write_str(writer, &self.name)?;
        let path_len = u32::try_from(self.path.len()).map_err(|_| PackError::TooLong {
            format: "Type",
            len: self.path.len(),
        })?;
        wire::write_array_header(writer, path_len)?;
        for segment in &self.path {
            wire::write_str(writer, segment)?;
        }
        let param_len = u32::try_from(self.params.len()).map_err(|_| PackError::TooLong {
            format: "Type",
            len: self.params.len(),
        })?;
        wire::write_array_header(writer, param_len)?;
        for param in &self.params {
            match param {
                TypeParam::Type(descriptor) => {
                    <TypeDescriptor as Packable<TypeFormat, C>>::pack(descriptor, writer, ctx)?
                }
                TypeParam::Str(text) => wire::write_str(writer, text)?,
                TypeParam::Int(n) => wire::write_signed(writer, *n)?,
                TypeParam::Bool(p) => wire::write_bool(writer, *p)?,
            }
        }
        Ok(())
    }

    fn unpack<R: Buf>(reader: &mut R, ctx: &C) -> Result<Self, UnpackError> {
        let entries = wire::read_array_header(reader)?;
        if entries != 3 {
            return Err(UnpackError::LengthMismatch {
                expected: 3,
                actual: entries as u64,
            });
        }
        let name = wire::read_string(reader)?;
        let path_len = wire::read_array_header(reader)?;
        let mut path = Vec::with_capacity(path_len as usize);
        for _ in 0..path_len {
            path.push(wire::read_string(reader)?);
        }
        let param_len = wire::read_array_header(reader)?;
        let mut params = Vec::with_capacity(param_len as usize);
        for _ in 0..param_len {
            let byte = wire::peek_byte(reader)?;
            let param = match wire::classify(byte) {
                Some(CoreFormat::Vector) => TypeParam::Type(
                    <TypeDescriptor as Packable<TypeFormat, C>>::unpack(reader, ctx)?,
                ),
                Some(CoreFormat::Utf8) => TypeParam::Str(wire::read_string(reader)?),
                Some(CoreFormat::Signed) | Some(CoreFormat::Unsigned) => {
                    TypeParam::Int(wire::read_signed(reader)?)
                }
                Some(CoreFormat::Boolean) => TypeParam::Bool(wire::read_bool(reader)?),
                _ => {
                    return Err(UnpackError::InvalidMarker {
                        format: "Type",
                        byte,
                    })
                }
            };
            params.push(param);
        }
        Ok(TypeDescriptor { name, path, params })
    }
}

impl<C: Context> Formatted<C> for TypeDescriptor {
    type Fmt = TypeFormat;
}
