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

//! The dynamically typed value model, used when no target type is known.

/// A MessagePack value decoded without a target type. Integers that fit an
/// `i64` decode as [`AnyValue::Int`] regardless of their wire family; only
/// values beyond `i64::MAX` decode as [`AnyValue::UInt`].
#[derive(Debug, Clone, PartialEq)]
pub enum AnyValue {
    Nil,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Str(String),
    Bin(Vec<u8>),
    Seq(Vec<AnyValue>),
    Map(Vec<(AnyValue, AnyValue)>),
    Ext(ExtensionData),
}

impl AnyValue {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            AnyValue::Int(n) => Some(*n),
            AnyValue::UInt(n) => i64::try_from(*n).ok(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AnyValue::Str(text) => Some(text.as_str()),
            _ => None,
        }
    }

    pub fn as_seq(&self) -> Option<&[AnyValue]> {
        match self {
            AnyValue::Seq(items) => Some(items.as_slice()),
            _ => None,
        }
    }

    /// Look up the value for a string key in a map value.
    pub fn get(&self, key: &str) -> Option<&AnyValue> {
        match self {
            AnyValue::Map(entries) => entries.iter().find_map(|(k, v)| match k {
                AnyValue::Str(text) if text == key => Some(v),
                _ => None,
            }),
            _ => None,
        }
    }
}

impl From<i64> for AnyValue {
    fn from(n: i64) -> Self {
        AnyValue::Int(n)
    }
}

impl From<u64> for AnyValue {
    fn from(n: u64) -> Self {
        if let Ok(n) = i64::try_from(n) {
            AnyValue::Int(n)
        } else {
            AnyValue::UInt(n)
        }
    }
}

impl From<bool> for AnyValue {
    fn from(p: bool) -> Self {
        AnyValue::Bool(p)
    }
}

impl From<f64> for AnyValue {
    fn from(x: f64) -> Self {
        AnyValue::Float(x)
    }
}

impl From<&str> for AnyValue {
    fn from(text: &str) -> Self {
        AnyValue::Str(text.to_string())
    }
}

impl From<String> for AnyValue {
    fn from(text: String) -> Self {
        AnyValue::Str(text)
    }
}

/// An extension value of arbitrary type code, produced by the `AnyExtension`
/// format and by generic decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionData {
    pub code: i8,
    pub data: Vec<u8>,
}

impl ExtensionData {
    pub fn new(code: i8, data: Vec<u8>) -> Self {
        ExtensionData { code, data }
    }
}
