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

//! The sequence formats. `Vector` writes an array of per-position formatted
//! values, `DynamicVector` additionally threads iteration state so an
//! element's type and format can depend on its predecessors, and `BinVector`
//! flattens sequences of fixed-width primitives into a single binary atom.

use bytes::Buf;

use crate::context::{Context, DefaultContext};
use crate::dispatch::{DefaultPackable, Format, Packable};
use crate::error::{PackError, UnpackError};
use crate::format::Scalar;
use crate::generator::{ElementWriter, Generator, Stateful};
use crate::wire::{self, CoreFormat};


/// The array format. Each element is written in the format chosen at its
/// position by the value's `pack_elements`/`construct` implementation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Vector;

/// The array format with iteration state. The state is initialized per
/// value and threaded through packing and construction, so that later
/// elements can be interpreted in the light of earlier ones.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DynamicVector;

/// Flat sequences of fixed-width primitives as one binary atom.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BinVector;

impl Format for Vector {
    const NAME: &'static str = "Vector";

    fn is_format_byte(byte: u8) -> bool {
        wire::admits(CoreFormat::Vector, byte)
    }
}

impl Format for DynamicVector {
    const NAME: &'static str = "DynamicVector";

    fn is_format_byte(byte: u8) -> bool {
        wire::admits(CoreFormat::Vector, byte)
    }
}

impl Format for BinVector {
    const NAME: &'static str = "BinVector";

    fn is_format_byte(byte: u8) -> bool {
        wire::admits(CoreFormat::Binary, byte)
    }
}

/// Values that destruct to a sequence of elements for the `Vector` format.
pub trait VectorValue<C: Context = DefaultContext>: Sized {
    /// The number of elements that `pack_elements` will write.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Write every element, each in the format of its position.
    fn pack_elements<W: std::io::Write>(
        &self,
        out: &mut ElementWriter<'_, W, C>,
    ) -> Result<(), PackError>;

    /// Rebuild the value by draining the generator. The implementation must
    /// consume every element, in order, before returning.
    fn construct<R: Buf>(
        entries: &mut Generator<'_, R, C>,
        ctx: &C,
    ) -> Result<Self, UnpackError>;
}

/// Values that destruct to a sequence with iteration state for the
/// `DynamicVector` format. `initial_state` seeds the state on both the pack
/// and unpack sides; the implementation advances it as it goes.
pub trait DynamicVectorValue<C: Context = DefaultContext>: Sized {
    type State;

    fn initial_state(ctx: &C) -> Self::State;

    fn len(&self) -> usize;

    fn pack_elements<W: std::io::Write>(
        &self,
        out: &mut Stateful<ElementWriter<'_, W, C>, Self::State>,
    ) -> Result<(), PackError>;

    fn construct<R: Buf>(
        entries: &mut Stateful<Generator<'_, R, C>, Self::State>,
        ctx: &C,
    ) -> Result<Self, UnpackError>;
}

/// Values that destruct to a flat slice of fixed-width primitives for the
/// `BinVector` format.
pub trait BinVectorValue<C: Context = DefaultContext>: Sized {
    type Elem: Scalar;

    fn elements(&self) -> &[Self::Elem];

    fn construct(elements: Vec<Self::Elem>, ctx: &C) -> Result<Self, UnpackError>;
}

fn element_count(len: usize, format: &'static str) -> Result<u32, PackError> {
    u32::try_from(len).map_err(|_| PackError::TooLong { format, len })
}

impl<T, C> Packable<Vector, C> for T
where
    T: VectorValue<C>,
    C: Context,
{
    fn pack<W: std::io::Write>(&self, writer: &mut W, ctx: &C) -> Result<(), PackError> {
        let len = element_count(VectorValue::len(self), "Vector")?;
        wire::write_array_header(writer, len)?;
        let mut out = ElementWriter::new(writer, len, ctx);
        self.pack_elements(&mut out)?;
        out.finish()
    }

    fn unpack<R: Buf>(reader: &mut R, ctx: &C) -> Result<Self, UnpackError> {
        let len = wire::read_array_header(reader)?;
        let mut entries = Generator::new(reader, len, ctx);
        match T::construct(&mut entries, ctx) {
            Ok(value) => Ok(value),
            Err(err) => {
                entries.defuse();
                Err(err)
            }
        }
    }
}

impl<T, C> Packable<DynamicVector, C> for T
where
    T: DynamicVectorValue<C>,
    C: Context,
{
    fn pack<W: std::io::Write>(&self, writer: &mut W, ctx: &C) -> Result<(), PackError> {
        let len = element_count(DynamicVectorValue::len(self), "DynamicVector")?;
        wire::write_array_header(writer, len)?;
        let mut out = Stateful::new(ElementWriter::new(writer, len, ctx), T::initial_state(ctx));
        self.pack_elements(&mut out)?;
        out.inner.finish()
    }

    fn unpack<R: Buf>(reader: &mut R, ctx: &C) -> Result<Self, UnpackError> {
        let len = wire::read_array_header(reader)?;
        let mut entries = Stateful::new(Generator::new(reader, len, ctx), T::initial_state(ctx));
        match T::construct(&mut entries, ctx) {
            Ok(value) => Ok(value),
            Err(err) => {
                entries.inner.defuse();
                Err(err)
            }
        }
    }
}

impl<T, C> Packable<BinVector, C> for T
where
    T: BinVectorValue<C>,
    C: Context,
{
    fn pack<W: std::io::Write>(&self, writer: &mut W, _ctx: &C) -> Result<(), PackError> {
        let elements = self.elements();
        let mut payload = Vec::with_capacity(elements.len() * T::Elem::WIDTH);
        for element in elements {
            element.write_bytes(&mut payload);
        }
        wire::write_bin(writer, &payload)
    }

    fn unpack<R: Buf>(reader: &mut R, ctx: &C) -> Result<Self, UnpackError> {
        let payload = wire::read_bin(reader)?;
        let elements = decode_scalars::<T::Elem>(&payload)?;
        T::construct(elements, ctx)
    }
}

pub(crate) fn decode_scalars<E: Scalar>(payload: &[u8]) -> Result<Vec<E>, UnpackError> {
    if payload.len() % E::WIDTH != 0 {
        return Err(UnpackError::LengthMismatch {
            expected: (payload.len() / E::WIDTH * E::WIDTH) as u64,
            actual: payload.len() as u64,
        });
    }
    Ok(payload.chunks_exact(E::WIDTH).map(E::read_bytes).collect())
}

impl<T, C> VectorValue<C> for Vec<T>
where
    T: DefaultPackable<C>,
    C: Context,
{
    fn len(&self) -> usize {
        self.as_slice().len()
    }

    fn pack_elements<W: std::io::Write>(
        &self,
        out: &mut ElementWriter<'_, W, C>,
    ) -> Result<(), PackError> {
        for element in self {
            out.element_default(element)?;
        }
        Ok(())
    }

    fn construct<R: Buf>(
        entries: &mut Generator<'_, R, C>,
        _ctx: &C,
    ) -> Result<Self, UnpackError> {
        let mut elements = Vec::with_capacity(entries.len() as usize);
        for _ in 0..entries.len() {
            elements.push(entries.next_default::<T>()?);
        }
        Ok(elements)
    }
}

impl<T, C> crate::dispatch::Formatted<C> for Vec<T>
where
    T: DefaultPackable<C>,
    C: Context,
{
    type Fmt = Vector;
}

impl<T, C> BinVectorValue<C> for Vec<T>
where
    T: Scalar,
    C: Context,
{
    type Elem = T;

    fn elements(&self) -> &[T] {
        self.as_slice()
    }

    fn construct(elements: Vec<T>, _ctx: &C) -> Result<Self, UnpackError> {
        Ok(elements)
    }
}

macro_rules! tuple_vector_impl {
    ($len:expr; $( $name:ident : $idx:tt ),+) => {
        impl<C, $($name),+> VectorValue<C> for ($($name,)+)
        where
            C: Context,
            $($name: DefaultPackable<C>),+
        {
            fn len(&self) -> usize {
                $len
            }

            fn pack_elements<W: std::io::Write>(
                &self,
                out: &mut ElementWriter<'_, W, C>,
            ) -> Result<(), PackError> {
                $( out.element_default(&self.$idx)?; )+
                Ok(())
            }

            fn construct<R: Buf>(
                entries: &mut Generator<'_, R, C>,
                _ctx: &C,
            ) -> Result<Self, UnpackError> {
                if entries.len() != $len {
                    return Err(UnpackError::LengthMismatch {
                        expected: $len,
                        actual: entries.len() as u64,
                    });
                }
                Ok(( $( entries.next_default::<$name>()?, )+ ))
            }
        }

        impl<C, $($name),+> crate::dispatch::Formatted<C> for ($($name,)+)
        where
            C: Context,
            $($name: DefaultPackable<C>),+
        {
            type Fmt = Vector;
        }
    };
}

tuple_vector_impl!(1; A: 0);
tuple_vector_impl!(2; A: 0, B: 1);
tuple_vector_impl!(3; A: 0, B: 1, C2: 2);
tuple_vector_impl!(4; A: 0, B: 1, C2: 2, D: 3);
tuple_vector_impl!(5; A: 0, B: 1, C2: 2, D: 3, E: 4);
tuple_vector_impl!(6; A: 0, B: 1, C2: 2, D: 3, E: 4, F: 5);
tuple_vector_impl!(7; A: 0, B: 1, C2: 2, D: 3, E: 4, F: 5, G: 6);
tuple_vector_impl!(8; A: 0, B: 1, C2: 2, D: 3, E: 4, F: 5, G: 6, H: 7);
tuple_vector_impl!(9; A: 0, B: 1, C2: 2, D: 3, E: 4, F: 5, G: 6, H: 7, I: 8);
tuple_vector_impl!(10; A: 0, B: 1, C2: 2, D: 3, E: 4, F: 5, G: 6, H: 7, I: 8, J: 9);
tuple_vector_impl!(11; A: 0, B: 1, C2: 2, D: 3, E: 4, F: 5, G: 6, H: 7, I: 8, J: 9, K: 10);
tuple_vector_impl!(12; A: 0, B: 1, C2: 2, D: 3, E: 4, F: 5, G: 6, H: 7, I: 8, J: 9, K: 10, L: 11);
