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
fn unit_is_nil() {
    assert_eq!(pack(&()), Ok(vec![0xc0]));
    assert_eq!(unpack::<()>(&[0xc0]), Ok(()));
}

#[test]
fn bool_atoms() {
    assert_eq!(pack(&true), Ok(vec![0xc3]));
    assert_eq!(pack(&false), Ok(vec![0xc2]));
    assert_eq!(unpack::<bool>(&[0xc3]), Ok(true));
}

#[test]
fn signed_round_trips() {
    for n in [0i64, -1, 100, 200, -33, 70000, -70000, i64::MAX, i64::MIN] {
        let bytes = pack(&n).unwrap();
        assert_eq!(unpack::<i64>(&bytes), Ok(n));
    }
}

#[test]
fn narrow_signed_targets_check_range() {
    let bytes = pack(&70000i64).unwrap();
    assert_eq!(
        unpack::<i16>(&bytes),
        Err(UnpackError::NumberOutOfRange { format: "Signed" })
    );
    let bytes = pack(&100i64).unwrap();
    assert_eq!(unpack::<i16>(&bytes), Ok(100));
}

#[test]
fn signed_target_accepts_unsigned_wire() {
    let bytes = pack(&200u64).unwrap();
    assert_eq!(bytes, vec![0xcc, 0xc8]);
    assert_eq!(unpack_in::<Signed, i64, _>(&bytes, &DefaultContext), Ok(200));
}

#[test]
fn unsigned_target_rejects_signed_wire() {
    let bytes = pack(&200i64).unwrap();
    assert_eq!(bytes, vec![0xd1, 0x00, 0xc8]);
    assert!(matches!(
        unpack::<u64>(&bytes),
        Err(UnpackError::InvalidMarker {
            format: "Unsigned",
            ..
        })
    ));
}

#[test]
fn float_widths() {
    let bytes = pack(&1.5f32).unwrap();
    assert_eq!(bytes.len(), 5);
    assert_eq!(unpack::<f32>(&bytes), Ok(1.5));
    assert_eq!(unpack::<f64>(&bytes), Ok(1.5));

    let bytes = pack(&2.5f64).unwrap();
    assert_eq!(bytes.len(), 9);
    assert_eq!(unpack::<f64>(&bytes), Ok(2.5));
}

#[test]
fn strings_round_trip() {
    for text in ["", "a", "some text", "\u{00e9}\u{00e8}\u{30c4}"] {
        let owned = text.to_string();
        let bytes = pack(&owned).unwrap();
        assert_eq!(unpack::<String>(&bytes), Ok(owned));
    }
}

#[test]
fn borrowed_text_packs_without_a_construct_half() {
    let mut out = Vec::new();
    pack_text(&mut out, "some text", &DefaultContext).unwrap();
    assert_eq!(out, pack(&"some text".to_string()).unwrap());
}

#[test]
fn invalid_utf8_is_reported() {
    let bytes = vec![0xa2, 0xff, 0xfe];
    assert!(matches!(
        unpack::<String>(&bytes),
        Err(UnpackError::StringDecode(_))
    ));
}

#[test]
fn bytes_round_trip_as_binary() {
    let blob = bytes::Bytes::from(vec![0u8, 1, 2, 250]);
    let packed = pack(&blob).unwrap();
    assert_eq!(packed[0], 0xc4);
    assert_eq!(unpack::<bytes::Bytes>(&packed), Ok(blob));
}

#[test]
fn explicit_format_overrides_binding() {
    let value: u32 = 42;
    let packed = pack_in::<Unsigned, _, _>(&value, &DefaultContext);
    assert_eq!(packed, Ok(vec![0x2a]));
}

#[test]
fn trailing_bytes_are_rejected() {
    let mut bytes = pack(&5i64).unwrap();
    bytes.push(0xc0);
    assert_eq!(unpack::<i64>(&bytes), Err(UnpackError::UnconsumedData));
}
