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
use crate::wire;

fn sample_stream() -> Vec<u8> {
    let mut buffer = Vec::new();
    wire::write_signed(&mut buffer, 5).unwrap();
    wire::write_str(&mut buffer, "hello").unwrap();
    wire::write_array_header(&mut buffer, 2).unwrap();
    wire::write_bool(&mut buffer, true).unwrap();
    wire::write_f64(&mut buffer, 2.5).unwrap();
    wire::write_map_header(&mut buffer, 1).unwrap();
    wire::write_str(&mut buffer, "key").unwrap();
    wire::write_bin(&mut buffer, &[1, 2, 3]).unwrap();
    wire::write_nil(&mut buffer).unwrap();
    buffer
}

#[test]
fn skip_traverses_each_value() {
    let bytes = sample_stream();
    let mut reader: &[u8] = &bytes;
    for _ in 0..4 {
        skip(&mut reader).unwrap();
    }
    assert!(wire::read_nil(&mut reader).is_ok());
    assert!(!reader.has_remaining());
}

#[test]
fn skip_handles_nested_containers() {
    let mut buffer = Vec::new();
    wire::write_array_header(&mut buffer, 2).unwrap();
    wire::write_map_header(&mut buffer, 1).unwrap();
    wire::write_str(&mut buffer, "inner").unwrap();
    wire::write_array_header(&mut buffer, 3).unwrap();
    for n in 0..3 {
        wire::write_signed(&mut buffer, n).unwrap();
    }
    wire::write_str(&mut buffer, "tail").unwrap();
    wire::write_bool(&mut buffer, false).unwrap();

    let mut reader: &[u8] = &buffer;
    skip(&mut reader).unwrap();
    assert_eq!(wire::read_bool(&mut reader), Ok(false));
}

#[test]
fn skip_extension_values() {
    let mut buffer = Vec::new();
    wire::write_ext_header(&mut buffer, 7, 4).unwrap();
    buffer.extend_from_slice(&[0xde, 0xad, 0xbe, 0xef]);
    wire::write_signed(&mut buffer, 1).unwrap();

    let mut reader: &[u8] = &buffer;
    skip(&mut reader).unwrap();
    assert_eq!(wire::read_signed(&mut reader), Ok(1));
}

#[test]
fn step_enters_containers_and_skips_scalars() {
    let bytes = sample_stream();
    let mut reader: &[u8] = &bytes;
    assert_eq!(step(&mut reader), Ok(Step::Value(CoreFormat::Signed)));
    assert_eq!(step(&mut reader), Ok(Step::Value(CoreFormat::Utf8)));
    assert_eq!(step(&mut reader), Ok(Step::Array(2)));
    assert_eq!(step(&mut reader), Ok(Step::Value(CoreFormat::Boolean)));
    assert_eq!(step(&mut reader), Ok(Step::Value(CoreFormat::Float)));
    assert_eq!(step(&mut reader), Ok(Step::Map(1)));
    assert_eq!(step(&mut reader), Ok(Step::Value(CoreFormat::Utf8)));
    assert_eq!(step(&mut reader), Ok(Step::Value(CoreFormat::Binary)));
    assert_eq!(step(&mut reader), Ok(Step::Value(CoreFormat::Nil)));
    assert!(!reader.has_remaining());
}

#[test]
fn peek_does_not_consume() {
    let bytes = sample_stream();
    let mut reader: &[u8] = &bytes;
    assert_eq!(peek_format(&reader), Ok(CoreFormat::Signed));
    assert_eq!(peek_format(&reader), Ok(CoreFormat::Signed));
    assert_eq!(wire::read_signed(&mut reader), Ok(5));
}

#[test]
fn skip_reports_truncation() {
    let mut buffer = Vec::new();
    wire::write_str(&mut buffer, "truncated").unwrap();
    buffer.truncate(buffer.len() - 2);
    let mut reader: &[u8] = &buffer;
    assert_eq!(skip(&mut reader), Err(UnpackError::Incomplete));
}
