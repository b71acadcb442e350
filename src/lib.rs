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

//! Type-driven, context-aware MessagePack serialization.
//!
//! `formpack` converts values of statically known types to and from the
//! MessagePack wire format. What sets it apart from a conventional codec is
//! its composable format algebra: the same value can be written under
//! different [formats](dispatch::Format) chosen at the call site, overridden
//! per field, parameterized by [contexts](context::Context) and switched
//! mid-stream by wrapper formats.
//!
//! # Formats
//!
//! A format is a zero-sized tag naming a wire strategy. The catalog covers
//! the MessagePack atoms ([`Nil`], [`Boolean`], [`Signed`], [`Unsigned`],
//! [`Float`], [`Utf8`], [`Binary`]), sequences ([`Vector`],
//! [`DynamicVector`], [`BinVector`]), keyed maps ([`MapFormat`],
//! [`DynamicMap`]), fixed-schema records ([`Struct`], [`UnorderedStruct`],
//! [`FlexibleStruct`]), shape-preserving arrays ([`ArrayFormat`],
//! [`BinArray`]), self-describing values ([`TypeFormat`], [`Typed`]),
//! extensions ([`Extension`], [`AnyExtension`]) and the wrappers
//! ([`DefaultFormat`], [`AnyFormat`], [`SetContext`], [`Nullable`]).
//!
//! A type elects its default format by implementing [`Formatted`] and joins
//! a format family by implementing that family's destruct/construct trait
//! (for example [`SignedValue`](format::scalar::SignedValue) or
//! [`RecordValue`](format::record::RecordValue)). The engine supplies the
//! [`Packable`] relation for every family; user code never implements it
//! directly.
//!
//! # Contexts
//!
//! A context is a zero-sized policy tag threaded through every call. Format
//! bindings, per-field choices and the reconstruction whitelist of the
//! `Typed` format can all differ by context. An ambient, thread-scoped
//! context token is maintained for runtime consumers and restored on scope
//! exit.
//!
//! # Entry points
//!
//! [`pack`]/[`unpack`] use the default format and context;
//! `pack_with`/`unpack_with` take a context; `pack_in`/`unpack_in` take an
//! explicit format; the `_to`/`_from` variants work against caller-owned IO.
//! [`unpack_any`] decodes without a target type, and [`skip`], [`step`] and
//! [`peek_format`] traverse streams without materializing values.

pub mod context;
pub mod dispatch;
pub mod error;
pub mod format;
pub mod generator;
pub mod reader;
pub mod value;
pub mod wire;


pub use context::{ambient_is, ambient_name, set_ambient, Context, ContextGuard, DefaultContext};
pub use dispatch::{
    pack, pack_in, pack_to, pack_to_in, pack_to_with, pack_with, unpack, unpack_any, unpack_from,
    unpack_from_in, unpack_from_with, unpack_in, unpack_with, DefaultPackable, Format, Formatted,
    Packable,
};
pub use error::{InvariantError, PackError, UnpackError};
pub use generator::{ElementWriter, EntryWriter, Generator, PairGenerator, Stateful};
pub use reader::{peek_format, skip, step, Step};
pub use value::{AnyValue, ExtensionData};
pub use wire::CoreFormat;

pub use format::array::{ArrayFormat, ArrayRepr, ArrayValue, BinArray, BinArrayRepr};
pub use format::extension::{AnyExtension, Extension, ExtensionValue};
pub use format::map::{DynamicMap, DynamicMapValue, MapFormat, MapValue};
pub use format::record::{FlexibleStruct, RecordValue, Struct, UnorderedStruct};
pub use format::scalar::{
    pack_text, Binary, BinaryValue, Boolean, BooleanValue, Float, FloatAtom, FloatValue, Nil,
    NilValue, Signed, SignedValue, Unsigned, UnsignedValue, Utf8, Utf8Destruct, Utf8Value,
};
pub use format::sequence::{
    BinVector, BinVectorValue, DynamicVector, DynamicVectorValue, Vector, VectorValue,
};
pub use format::typed::{
    expect_concrete, Describable, TypeDescriptor, TypeFormat, TypeParam, Typed, TypedTarget,
};
pub use format::wrapper::{AnyFormat, DefaultFormat, Nullable, SetContext};
pub use format::Scalar;
