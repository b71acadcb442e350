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

//! The keyed formats. `MapFormat` writes a map of per-position formatted
//! keys and values; `DynamicMap` threads iteration state the same way
//! `DynamicVector` does for arrays.

use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

use bytes::Buf;

use crate::context::{Context, DefaultContext};
use crate::dispatch::{DefaultPackable, Format, Formatted, Packable};
use crate::error::{PackError, UnpackError};
use crate::generator::{EntryWriter, PairGenerator, Stateful};
use crate::wire::{self, CoreFormat};

#[cfg(test)]
mod tests;

/// The map format. Each entry's key and value are written in the formats
/// chosen at that position by the value's implementation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MapFormat;

/// The map format with iteration state, for maps whose entry types depend on
/// what has already been decoded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DynamicMap;

impl Format for MapFormat {
    const NAME: &'static str = "Map";

    fn is_format_byte(byte: u8) -> bool {
        wire::admits(CoreFormat::Map, byte)
    }
}

impl Format for DynamicMap {
    const NAME: &'static str = "DynamicMap";

    fn is_format_byte(byte: u8) -> bool {
        wire::admits(CoreFormat::Map, byte)
    }
}

/// Values that destruct to a sequence of key-value entries.
pub trait MapValue<C: Context = DefaultContext>: Sized {
    /// The number of entries that `pack_entries` will write.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Write every entry, key first.
    fn pack_entries<W: std::io::Write>(
        &self,
        out: &mut EntryWriter<'_, W, C>,
    ) -> Result<(), PackError>;

    /// Rebuild the value by draining the generator, alternating key and
    /// value reads.
    fn construct<R: Buf>(
        entries: &mut PairGenerator<'_, R, C>,
        ctx: &C,
    ) -> Result<Self, UnpackError>;
}

/// Values that destruct to keyed entries with iteration state.
pub trait DynamicMapValue<C: Context = DefaultContext>: Sized {
    type State;

    fn initial_state(ctx: &C) -> Self::State;

    fn len(&self) -> usize;

    fn pack_entries<W: std::io::Write>(
        &self,
        out: &mut Stateful<EntryWriter<'_, W, C>, Self::State>,
    ) -> Result<(), PackError>;

    fn construct<R: Buf>(
        entries: &mut Stateful<PairGenerator<'_, R, C>, Self::State>,
        ctx: &C,
    ) -> Result<Self, UnpackError>;
}

fn entry_count(len: usize, format: &'static str) -> Result<u32, PackError> {
    u32::try_from(len).map_err(|_| PackError::TooLong { format, len })
}

impl<T, C> Packable<MapFormat, C> for T
where
    T: MapValue<C>,
    C: Context,
{
    fn pack<W: std::io::Write>(&self, writer: &mut W, ctx: &C) -> Result<(), PackError> {
        let len = entry_count(MapValue::len(self), "Map")?;
        wire::write_map_header(writer, len)?;
        let mut out = EntryWriter::new(writer, len, ctx);
        self.pack_entries(&mut out)?;
        out.finish()
    }

    fn unpack<R: Buf>(reader: &mut R, ctx: &C) -> Result<Self, UnpackError> {
        let len = wire::read_map_header(reader)?;
        let mut entries = PairGenerator::new(reader, len, ctx);
        match T::construct(&mut entries, ctx) {
            Ok(value) => Ok(value),
            Err(err) => {
                entries.defuse();
                Err(err)
            }
        }
    }
}

impl<T, C> Packable<DynamicMap, C> for T
where
    T: DynamicMapValue<C>,
    C: Context,
{
    fn pack<W: std::io::Write>(&self, writer: &mut W, ctx: &C) -> Result<(), PackError> {
        let len = entry_count(DynamicMapValue::len(self), "DynamicMap")?;
        wire::write_map_header(writer, len)?;
        let mut out = Stateful::new(EntryWriter::new(writer, len, ctx), T::initial_state(ctx));
        self.pack_entries(&mut out)?;
        out.inner.finish()
    }

    fn unpack<R: Buf>(reader: &mut R, ctx: &C) -> Result<Self, UnpackError> {
        let len = wire::read_map_header(reader)?;
        let mut entries = Stateful::new(PairGenerator::new(reader, len, ctx), T::initial_state(ctx));
        match T::construct(&mut entries, ctx) {
            Ok(value) => Ok(value),
            Err(err) => {
                entries.inner.defuse();
                Err(err)
            }
        }
    }
}

impl<K, V, C> MapValue<C> for BTreeMap<K, V>
where
    K: DefaultPackable<C> + Ord,
    V: DefaultPackable<C>,
    C: Context,
{
    fn len(&self) -> usize {
        BTreeMap::len(self)
    }

    fn pack_entries<W: std::io::Write>(
        &self,
        out: &mut EntryWriter<'_, W, C>,
    ) -> Result<(), PackError> {
        for (key, value) in self {
            out.entry_default(key, value)?;
        }
        Ok(())
    }

    fn construct<R: Buf>(
        entries: &mut PairGenerator<'_, R, C>,
        _ctx: &C,
    ) -> Result<Self, UnpackError> {
        let mut map = BTreeMap::new();
        for _ in 0..entries.len() {
            let key = entries.next_key_default::<K>()?;
            let value = entries.next_value_default::<V>()?;
            map.insert(key, value);
        }
        Ok(map)
    }
}

impl<K, V, C> Formatted<C> for BTreeMap<K, V>
where
    K: DefaultPackable<C> + Ord,
    V: DefaultPackable<C>,
    C: Context,
{
    type Fmt = MapFormat;
}

impl<K, V, C> MapValue<C> for HashMap<K, V>
where
    K: DefaultPackable<C> + Eq + Hash,
    V: DefaultPackable<C>,
    C: Context,
{
    fn len(&self) -> usize {
        HashMap::len(self)
    }

    fn pack_entries<W: std::io::Write>(
        &self,
        out: &mut EntryWriter<'_, W, C>,
    ) -> Result<(), PackError> {
        for (key, value) in self {
            out.entry_default(key, value)?;
        }
        Ok(())
    }

    fn construct<R: Buf>(
        entries: &mut PairGenerator<'_, R, C>,
        _ctx: &C,
    ) -> Result<Self, UnpackError> {
        let mut map = HashMap::with_capacity(entries.len() as usize);
        for _ in 0..entries.len() {
            let key = entries.next_key_default::<K>()?;
            let value = entries.next_value_default::<V>()?;
            map.insert(key, value);
        }
        Ok(map)
    }
}

impl<K, V, C> Formatted<C> for HashMap<K, V>
where
    K: DefaultPackable<C> + Eq + Hash,
    V: DefaultPackable<C>,
    C: Context,
{
    type Fmt = MapFormat;
}
