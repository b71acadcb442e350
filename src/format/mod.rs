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

//! The format catalog. Each submodule defines a family of format tags, the
//! destruct/construct trait that admits values to the family and the blanket
//! [`Packable`](crate::dispatch::Packable) impl that ties them together.

pub mod array;
pub mod extension;
pub mod map;
pub mod record;
pub mod scalar;
pub mod sequence;
pub mod typed;
pub mod wrapper;

/// A fixed-width primitive that can be stored in a binary payload. The byte
/// order of these payloads is little-endian, independent of the big-endian
/// MessagePack atoms around them; the choice is fixed so that binary columns
/// are portable between hosts.
pub trait Scalar: Copy {
    /// The storage width in bytes.
    const WIDTH: usize;

    fn write_bytes(&self, out: &mut Vec<u8>);

    /// Read one value from `bytes`, which holds at least `WIDTH` bytes.
    fn read_bytes(bytes: &[u8]) -> Self;
}

macro_rules! scalar_impl {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Scalar for $ty {
                const WIDTH: usize = std::mem::size_of::<$ty>();

                fn write_bytes(&self, out: &mut Vec<u8>) {
                    out.extend_from_slice(&self.to_le_bytes());
                }

                fn read_bytes(bytes: &[u8]) -> Self {
                    let mut raw = [0u8; std::mem::size_of::<$ty>()];
                    raw.copy_from_slice(&bytes[..std::mem::size_of::<$ty>()]);
                    <$ty>::from_le_bytes(raw)
                }
            }
        )*
    };
}

scalar_impl!(u8, u16, u32, u64, i8, i16, i32, i64, f32, f64);
