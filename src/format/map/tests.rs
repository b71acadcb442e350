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

use super::*;
use crate::context::DefaultContext;
use crate::dispatch::{pack, pack_in, unpack, unpack_in};

#[test]
fn btree_map_bytes_are_ordered() {
    let mut map = BTreeMap::new();
    map.insert("a".to_string(), 1i64);
    map.insert("b".to_string(), 2i64);
    let bytes = pack(&map).unwrap();
    assert_eq!(bytes, vec![0x82, 0xa1, b'a', 0x01, 0xa1, b'b', 0x02]);
    assert_eq!(unpack::<BTreeMap<String, i64>>(&bytes), Ok(map));
}

#[test]
fn hash_map_round_trips() {
    let mut map = HashMap::new();
    for n in 0..100i64 {
        map.insert(format!("key-{}", n), n);
    }
    let bytes = pack(&map).unwrap();
    assert_eq!(unpack::<HashMap<String, i64>>(&bytes), Ok(map));
}

#[test]
fn empty_map() {
    let map: BTreeMap<String, i64> = BTreeMap::new();
    let bytes = pack(&map).unwrap();
    assert_eq!(bytes, vec![0x80]);
    assert_eq!(unpack::<BTreeMap<String, i64>>(&bytes), Ok(map));
}

#[test]
fn non_string_keys() {
    let mut map = BTreeMap::new();
    map.insert(10i64, vec![1i64]);
    map.insert(-3i64, vec![]);
    let bytes = pack(&map).unwrap();
    assert_eq!(unpack::<BTreeMap<i64, Vec<i64>>>(&bytes), Ok(map));
}

#[test]
fn wide_map_header() {
    let mut map = BTreeMap::new();
    for n in 0..70000i64 {
        map.insert(n, n);
    }
    let bytes = pack(&map).unwrap();
    assert_eq!(bytes[0], 0xdf);
    assert_eq!(unpack::<BTreeMap<i64, i64>>(&bytes), Ok(map));
}

#[derive(Debug, PartialEq)]
enum Annotated {
    V1(BTreeMap<String, i64>),
    V2(BTreeMap<String, String>),
}

impl<C: Context> DynamicMapValue<C> for Annotated {
    type State = Option<i64>;

    fn initial_state(_ctx: &C) -> Self::State {
        None
    }

    fn len(&self) -> usize {
        1 + match self {
            Annotated::V1(entries) => entries.len(),
            Annotated::V2(entries) => entries.len(),
        }
    }

    fn pack_entries<W: std::io::Write>(
        &self,
        out: &mut Stateful<EntryWriter<'_, W, C>, Self::State>,
    ) -> Result<(), PackError> {
        match self {
            Annotated::V1(entries) => {
                out.inner.entry_default(&"version".to_string(), &1i64)?;
                out.state = Some(1);
                for (key, value) in entries {
                    out.inner.entry_default(key, value)?;
                }
            }
            Annotated::V2(entries) => {
                out.inner.entry_default(&"version".to_string(), &2i64)?;
                out.state = Some(2);
                for (key, value) in entries {
                    out.inner.entry_default(key, value)?;
                }
            }
        }
        Ok(())
    }

    fn construct<R: Buf>(
        entries: &mut Stateful<PairGenerator<'_, R, C>, Self::State>,
        _ctx: &C,
    ) -> Result<Self, UnpackError> {
        let header = entries.inner.next_key_default::<String>()?;
        if header != "version" {
            return Err(UnpackError::KeyMismatch {
                expected: "version".to_string(),
                actual: header,
            });
        }
        let version: i64 = entries.inner.next_value_default()?;
        entries.state = Some(version);
        let remaining = entries.inner.len();
        match version {
            1 => {
                let mut map = BTreeMap::new();
                for _ in 0..remaining {
                    let key = entries.inner.next_key_default::<String>()?;
                    let value = entries.inner.next_value_default::<i64>()?;
                    map.insert(key, value);
                }
                Ok(Annotated::V1(map))
            }
            2 => {
                let mut map = BTreeMap::new();
                for _ in 0..remaining {
                    let key = entries.inner.next_key_default::<String>()?;
                    let value = entries.inner.next_value_default::<String>()?;
                    map.insert(key, value);
                }
                Ok(Annotated::V2(map))
            }
            other => Err(UnpackError::Message(format!(
                "unknown annotation version: {}",
                other
            ))),
        }
    }
}

#[test]
fn dynamic_map_decodes_by_version_entry() {
    let mut v1 = BTreeMap::new();
    v1.insert("hits".to_string(), 12i64);
    let value = Annotated::V1(v1);
    let bytes = pack_in::<DynamicMap, _, _>(&value, &DefaultContext).unwrap();
    assert_eq!(
        unpack_in::<DynamicMap, Annotated, _>(&bytes, &DefaultContext),
        Ok(value)
    );

    let mut v2 = BTreeMap::new();
    v2.insert("hits".to_string(), "twelve".to_string());
    let value = Annotated::V2(v2);
    let bytes = pack_in::<DynamicMap, _, _>(&value, &DefaultContext).unwrap();
    assert_eq!(
        unpack_in::<DynamicMap, Annotated, _>(&bytes, &DefaultContext),
        Ok(value)
    );
}
