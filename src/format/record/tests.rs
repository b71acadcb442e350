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
use crate::dispatch::{
    pack_in, pack_to_with, unpack_from_with, unpack_in, Formatted, Packable,
};
use crate::error::InvariantError;
use crate::format::scalar::Nil;

#[derive(Debug, PartialEq)]
struct Sample {
    a: (),
    b: String,
    c: (i64, f64),
    d: bool,
}

#[derive(Default)]
struct SampleBuilder {
    a: Option<()>,
    b: Option<String>,
    c: Option<(i64, f64)>,
    d: Option<bool>,
}

impl<C: Context> RecordValue<C> for Sample {
    const FIELDS: &'static [&'static str] = &["a", "b", "c", "d"];

    type Builder = SampleBuilder;

    fn pack_field<W: std::io::Write>(
        &self,
        index: usize,
        writer: &mut W,
        ctx: &C,
    ) -> Result<(), PackError> {
        match index {
            0 => <() as Packable<Nil, C>>::pack(&self.a, writer, ctx),
            1 => pack_to_with(writer, &self.b, ctx),
            2 => pack_to_with(writer, &self.c, ctx),
            3 => pack_to_with(writer, &self.d, ctx),
            _ => Err(InvariantError::new("field index out of range").into()),
        }
    }

    fn unpack_field<R: Buf>(
        builder: &mut Self::Builder,
        index: usize,
        reader: &mut R,
        ctx: &C,
    ) -> Result<(), UnpackError> {
        match index {
            0 => builder.a = Some(<() as Packable<Nil, C>>::unpack(reader, ctx)?),
            1 => builder.b = Some(unpack_from_with(reader, ctx)?),
            2 => builder.c = Some(unpack_from_with(reader, ctx)?),
            3 => builder.d = Some(unpack_from_with(reader, ctx)?),
            _ => return Err(InvariantError::new("field index out of range").into()),
        }
        Ok(())
    }

    fn construct(builder: Self::Builder, _ctx: &C) -> Result<Self, UnpackError> {
        match builder {
            SampleBuilder {
                a: Some(a),
                b: Some(b),
                c: Some(c),
                d: Some(d),
            } => Ok(Sample { a, b, c, d }),
            _ => Err(InvariantError::new("record builder is missing fields").into()),
        }
    }
}

impl<C: Context> Formatted<C> for Sample {
    type Fmt = Struct;
}

fn sample() -> Sample {
    Sample {
        a: (),
        b: "test".to_string(),
        c: (10, 10.0),
        d: false,
    }
}

fn sample_bytes() -> Vec<u8> {
    vec![
        0x84, // fixmap 4
        0xa1, b'a', 0xc0, // a: nil
        0xa1, b'b', 0xa4, b't', b'e', b's', b't', // b: "test"
        0xa1, b'c', 0x92, 0x0a, 0xcb, 0x40, 0x24, 0x00, 0x00, 0x00, 0x00, 0x00,
        0x00, // c: [10, 10.0]
        0xa1, b'd', 0xc2, // d: false
    ]
}

/// The same fields written in the order [c, a, b, d].
fn reordered_bytes() -> Vec<u8> {
    let mut bytes = Vec::new();
    wire::write_map_header(&mut bytes, 4).unwrap();
    wire::write_str(&mut bytes, "c").unwrap();
    bytes.extend_from_slice(&[0x92, 0x0a, 0xcb, 0x40, 0x24, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00]);
    wire::write_str(&mut bytes, "a").unwrap();
    wire::write_nil(&mut bytes).unwrap();
    wire::write_str(&mut bytes, "b").unwrap();
    wire::write_str(&mut bytes, "test").unwrap();
    wire::write_str(&mut bytes, "d").unwrap();
    wire::write_bool(&mut bytes, false).unwrap();
    bytes
}

#[test]
fn struct_bytes_are_exact() {
    let bytes = crate::dispatch::pack(&sample()).unwrap();
    assert_eq!(bytes, sample_bytes());
}

#[test]
fn struct_round_trips() {
    let bytes = sample_bytes();
    assert_eq!(unpack_in::<Struct, Sample, _>(&bytes, &DefaultContext), Ok(sample()));
}

#[test]
fn unordered_accepts_declared_order() {
    let bytes = sample_bytes();
    assert_eq!(
        unpack_in::<UnorderedStruct, Sample, _>(&bytes, &DefaultContext),
        Ok(sample())
    );
}

#[test]
fn struct_rejects_reordered_fields() {
    let bytes = reordered_bytes();
    assert_eq!(
        unpack_in::<Struct, Sample, _>(&bytes, &DefaultContext),
        Err(UnpackError::KeyMismatch {
            expected: "a".to_string(),
            actual: "c".to_string()
        })
    );
}

#[test]
fn unordered_accepts_reordered_fields() {
    let bytes = reordered_bytes();
    assert_eq!(
        unpack_in::<UnorderedStruct, Sample, _>(&bytes, &DefaultContext),
        Ok(sample())
    );
}

fn bytes_with_extra_key() -> Vec<u8> {
    let mut bytes = Vec::new();
    wire::write_map_header(&mut bytes, 5).unwrap();
    wire::write_str(&mut bytes, "a").unwrap();
    wire::write_nil(&mut bytes).unwrap();
    wire::write_str(&mut bytes, "b").unwrap();
    wire::write_str(&mut bytes, "test").unwrap();
    wire::write_str(&mut bytes, "extra").unwrap();
    wire::write_array_header(&mut bytes, 2).unwrap();
    wire::write_signed(&mut bytes, 1).unwrap();
    wire::write_signed(&mut bytes, 2).unwrap();
    wire::write_str(&mut bytes, "c").unwrap();
    bytes.extend_from_slice(&[0x92, 0x0a, 0xcb, 0x40, 0x24, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00]);
    wire::write_str(&mut bytes, "d").unwrap();
    wire::write_bool(&mut bytes, false).unwrap();
    bytes
}

#[test]
fn unordered_rejects_unknown_keys() {
    let bytes = bytes_with_extra_key();
    assert_eq!(
        unpack_in::<UnorderedStruct, Sample, _>(&bytes, &DefaultContext),
        Err(UnpackError::UnexpectedField("extra".to_string()))
    );
}

#[test]
fn flexible_skips_unknown_keys() {
    let bytes = bytes_with_extra_key();
    assert_eq!(
        unpack_in::<FlexibleStruct, Sample, _>(&bytes, &DefaultContext),
        Ok(sample())
    );
}

fn bytes_with_duplicate_key() -> Vec<u8> {
    let mut bytes = Vec::new();
    wire::write_map_header(&mut bytes, 5).unwrap();
    wire::write_str(&mut bytes, "a").unwrap();
    wire::write_nil(&mut bytes).unwrap();
    wire::write_str(&mut bytes, "b").unwrap();
    wire::write_str(&mut bytes, "test").unwrap();
    wire::write_str(&mut bytes, "b").unwrap();
    wire::write_str(&mut bytes, "again").unwrap();
    wire::write_str(&mut bytes, "c").unwrap();
    bytes.extend_from_slice(&[0x92, 0x0a, 0xcb, 0x40, 0x24, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00]);
    wire::write_str(&mut bytes, "d").unwrap();
    wire::write_bool(&mut bytes, false).unwrap();
    bytes
}

#[test]
fn duplicates_are_rejected() {
    let bytes = bytes_with_duplicate_key();
    assert_eq!(
        unpack_in::<UnorderedStruct, Sample, _>(&bytes, &DefaultContext),
        Err(UnpackError::DuplicateKey("b".to_string()))
    );
    assert_eq!(
        unpack_in::<FlexibleStruct, Sample, _>(&bytes, &DefaultContext),
        Err(UnpackError::DuplicateKey("b".to_string()))
    );
}

#[test]
fn missing_fields_are_reported() {
    let mut bytes = Vec::new();
    wire::write_map_header(&mut bytes, 2).unwrap();
    wire::write_str(&mut bytes, "a").unwrap();
    wire::write_nil(&mut bytes).unwrap();
    wire::write_str(&mut bytes, "b").unwrap();
    wire::write_str(&mut bytes, "test").unwrap();

    assert_eq!(
        unpack_in::<Struct, Sample, _>(&bytes, &DefaultContext),
        Err(UnpackError::MissingFields(vec!["c", "d"]))
    );
    assert_eq!(
        unpack_in::<FlexibleStruct, Sample, _>(&bytes, &DefaultContext),
        Err(UnpackError::MissingFields(vec!["c", "d"]))
    );
}

#[test]
fn struct_rejects_extra_entries() {
    let bytes = bytes_with_extra_key();
    assert!(matches!(
        unpack_in::<Struct, Sample, _>(&bytes, &DefaultContext),
        Err(UnpackError::KeyMismatch { .. })
    ));
}

#[test]
fn explicit_struct_pack_matches_default() {
    let bytes = pack_in::<UnorderedStruct, _, _>(&sample(), &DefaultContext).unwrap();
    assert_eq!(bytes, sample_bytes());
}
