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

//! Lazy cursors over the entries of a decoded container, and their pack-side
//! duals.
//!
//! A [`Generator`] is handed to a `construct` implementation while the outer
//! decode is in flight: every `next` call reads one more element directly
//! from the caller's reader. Entries must be consumed in order and the
//! cursor must be fully drained before `construct` returns; the per-element
//! type and format chosen at each `next` call site are what the engine's
//! dispatch tables call the element's value type and value format.

use bytes::Buf;

use crate::context::Context;
use crate::dispatch::{DefaultPackable, Format, Formatted, Packable};
use crate::error::{InvariantError, PackError, UnpackError};

/// A single-pass typed cursor over the elements of an array value.
///
/// Dropping an undrained cursor panics in debug builds: the elements it
/// still owed would otherwise be misread as whatever follows them. The
/// engine defuses the cursor when it abandons the stream to propagate a
/// decode error.
pub struct Generator<'a, R, C> {
    reader: &'a mut R,
    remaining: u32,
    defused: bool,
    ctx: &'a C,
}

impl<'a, R, C> Generator<'a, R, C>
where
    R: Buf,
    C: Context,
{
    pub(crate) fn new(reader: &'a mut R, len: u32, ctx: &'a C) -> Self {
        Generator {
            reader,
            remaining: len,
            defused: false,
            ctx,
        }
    }

    /// The number of elements not yet consumed.
    pub fn len(&self) -> u32 {
        self.remaining
    }

    pub fn is_empty(&self) -> bool {
        self.remaining == 0
    }

    pub(crate) fn defuse(&mut self) {
        self.defused = true;
    }

    /// Decode the next element as a `T` in the format `F`.
    pub fn next<T, F>(&mut self) -> Result<T, UnpackError>
    where
        F: Format,
        T: Packable<F, C>,
    {
        if self.remaining == 0 {
            return Err(InvariantError::new(
                "a construct implementation read past the end of its generator",
            )
            .into());
        }
        self.remaining -= 1;
        <T as Packable<F, C>>::unpack(self.reader, self.ctx)
    }

    /// Decode the next element as a `T` in `T`'s default format.
    pub fn next_default<T>(&mut self) -> Result<T, UnpackError>
    where
        T: DefaultPackable<C>,
    {
        self.next::<T, <T as Formatted<C>>::Fmt>()
    }
}

impl<'a, R, C> Drop for Generator<'a, R, C> {
    fn drop(&mut self) {
        if cfg!(debug_assertions)
            && !self.defused
            && self.remaining != 0
            && !std::thread::panicking()
        {
            panic!(
                "a construct implementation returned without draining its generator \
                 ({} entries left)",
                self.remaining
            );
        }
    }
}

/// A single-pass typed cursor over the entries of a map value. Keys and
/// values must be read strictly alternately, key first. The drop contract is
/// the same as [`Generator`]'s.
pub struct PairGenerator<'a, R, C> {
    reader: &'a mut R,
    remaining: u32,
    mid_entry: bool,
    defused: bool,
    ctx: &'a C,
}

impl<'a, R, C> PairGenerator<'a, R, C>
where
    R: Buf,
    C: Context,
{
    pub(crate) fn new(reader: &'a mut R, len: u32, ctx: &'a C) -> Self {
        PairGenerator {
            reader,
            remaining: len,
            mid_entry: false,
            defused: false,
            ctx,
        }
    }

    /// The number of entries whose keys have not yet been consumed.
    pub fn len(&self) -> u32 {
        self.remaining
    }

    pub fn is_empty(&self) -> bool {
        self.remaining == 0
    }

    pub(crate) fn defuse(&mut self) {
        self.defused = true;
    }

    /// Decode the next key as a `K` in the format `F`.
    pub fn next_key<K, F>(&mut self) -> Result<K, UnpackError>
    where
        F: Format,
        K: Packable<F, C>,
    {
        if self.mid_entry {
            return Err(
                InvariantError::new("a map key was requested where a value was due").into(),
            );
        }
        if self.remaining == 0 {
            return Err(InvariantError::new(
                "a construct implementation read past the end of its generator",
            )
            .into());
        }
        self.mid_entry = true;
        <K as Packable<F, C>>::unpack(self.reader, self.ctx)
    }

    /// Decode the next value as a `V` in the format `F`.
    pub fn next_value<V, F>(&mut self) -> Result<V, UnpackError>
    where
        F: Format,
        V: Packable<F, C>,
    {
        if !self.mid_entry {
            return Err(
                InvariantError::new("a map value was requested where a key was due").into(),
            );
        }
        self.mid_entry = false;
        self.remaining -= 1;
        <V as Packable<F, C>>::unpack(self.reader, self.ctx)
    }

    pub fn next_key_default<K>(&mut self) -> Result<K, UnpackError>
    where
        K: DefaultPackable<C>,
    {
        self.next_key::<K, <K as Formatted<C>>::Fmt>()
    }

    pub fn next_value_default<V>(&mut self) -> Result<V, UnpackError>
    where
        V: DefaultPackable<C>,
    {
        self.next_value::<V, <V as Formatted<C>>::Fmt>()
    }
}

impl<'a, R, C> Drop for PairGenerator<'a, R, C> {
    fn drop(&mut self) {
        if cfg!(debug_assertions)
            && !self.defused
            && (self.remaining != 0 || self.mid_entry)
            && !std::thread::panicking()
        {
            panic!(
                "a construct implementation returned without draining its generator \
                 ({} entries left)",
                self.remaining
            );
        }
    }
}

/// A cursor or writer paired with user iteration state. The dynamic formats
/// thread one of these through `pack_elements`/`construct` so that the type
/// and format of an entry can depend on what came before it.
pub struct Stateful<G, S> {
    pub inner: G,
    pub state: S,
}

impl<G, S> Stateful<G, S> {
    pub(crate) fn new(inner: G, state: S) -> Self {
        Stateful { inner, state }
    }
}

/// Counted writer for the elements of an array value. The element count was
/// already committed in the container header, so writing a different number
/// of elements than reported is an error.
pub struct ElementWriter<'a, W, C> {
    writer: &'a mut W,
    expecting: u32,
    ctx: &'a C,
}

impl<'a, W, C> ElementWriter<'a, W, C>
where
    W: std::io::Write,
    C: Context,
{
    pub(crate) fn new(writer: &'a mut W, expecting: u32, ctx: &'a C) -> Self {
        ElementWriter {
            writer,
            expecting,
            ctx,
        }
    }

    /// Write one element in the format `F`.
    pub fn element<T, F>(&mut self, value: &T) -> Result<(), PackError>
    where
        F: Format,
        T: Packable<F, C>,
    {
        if self.expecting == 0 {
            return Err(PackError::WrongNumberOfElements);
        }
        self.expecting -= 1;
        <T as Packable<F, C>>::pack(value, self.writer, self.ctx)
    }

    /// Write one element in its default format.
    pub fn element_default<T>(&mut self, value: &T) -> Result<(), PackError>
    where
        T: DefaultPackable<C>,
    {
        self.element::<T, <T as Formatted<C>>::Fmt>(value)
    }

    pub(crate) fn finish(self) -> Result<(), PackError> {
        if self.expecting == 0 {
            Ok(())
        } else {
            Err(PackError::WrongNumberOfElements)
        }
    }
}

/// Counted writer for the entries of a map value.
pub struct EntryWriter<'a, W, C> {
    writer: &'a mut W,
    expecting: u32,
    ctx: &'a C,
}

impl<'a, W, C> EntryWriter<'a, W, C>
where
    W: std::io::Write,
    C: Context,
{
    pub(crate) fn new(writer: &'a mut W, expecting: u32, ctx: &'a C) -> Self {
        EntryWriter {
            writer,
            expecting,
            ctx,
        }
    }

    /// Write one entry, the key in format `KF` and the value in format `VF`.
    pub fn entry<K, V, KF, VF>(&mut self, key: &K, value: &V) -> Result<(), PackError>
    where
        KF: Format,
        VF: Format,
        K: Packable<KF, C>,
        V: Packable<VF, C>,
    {
        if self.expecting == 0 {
            return Err(PackError::WrongNumberOfElements);
        }
        self.expecting -= 1;
        <K as Packable<KF, C>>::pack(key, self.writer, self.ctx)?;
        <V as Packable<VF, C>>::pack(value, self.writer, self.ctx)
    }

    /// Write one entry with both sides in their default formats.
    pub fn entry_default<K, V>(&mut self, key: &K, value: &V) -> Result<(), PackError>
    where
        K: DefaultPackable<C>,
        V: DefaultPackable<C>,
    {
        self.entry::<K, V, <K as Formatted<C>>::Fmt, <V as Formatted<C>>::Fmt>(key, value)
    }

    pub(crate) fn finish(self) -> Result<(), PackError> {
        if self.expecting == 0 {
            Ok(())
        } else {
            Err(PackError::WrongNumberOfElements)
        }
    }
}
