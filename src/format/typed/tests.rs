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
    pack, pack_in, pack_to_with, pack_with, unpack, unpack_from_with, unpack_in, unpack_with,
};
use crate::error::InvariantError;
use crate::format::record::{RecordValue, Struct};
use crate::format::wrapper::DefaultFormat;

#[derive(Debug, PartialEq)]
struct Boat {
    a: i64,
}

#[derive(Debug, PartialEq)]
struct Train {
    cars: i64,
}

macro_rules! record_impl {
    ($ty:ident, $field:ident) => {
        impl<C: Context> RecordValue<C> for $ty {
            const FIELDS: &'static [&'static str] = &[stringify!($field)];

            type Builder = Option<i64>;

            fn pack_field<W: std::io::Write>(
                &self,
                index: usize,
                writer: &mut W,
                ctx: &C,
            ) -> Result<(), PackError> {
                match index {
                    0 => pack_to_with(writer, &self.$field, ctx),
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
                    0 => {
                        *builder = Some(unpack_from_with(reader, ctx)?);
                        Ok(())
                    }
                    _ => Err(InvariantError::new("field index out of range").into()),
                }
            }

            fn construct(builder: Self::Builder, _ctx: &C) -> Result<Self, UnpackError> {
                match builder {
                    Some($field) => Ok($ty { $field }),
                    None => Err(InvariantError::new("record builder is missing fields").into()),
                }
            }
        }

        impl Describable for $ty {}

        impl<C: Context> TypedTarget<Struct, C> for $ty {
            fn descriptor(&self) -> Result<TypeDescriptor, PackError> {
                <$ty as Describable>::descriptor()
            }

            fn pack_value<W: std::io::Write>(
                &self,
                writer: &mut W,
                ctx: &C,
            ) -> Result<(), PackError> {
                <$ty as Packable<Struct, C>>::pack(self, writer, ctx)
            }

            fn construct_from<R: Buf>(
                descriptor: &TypeDescriptor,
                reader: &mut R,
                ctx: &C,
            ) -> Result<Self, UnpackError> {
                expect_concrete::<$ty>(descriptor)?;
                <$ty as Packable<Struct, C>>::unpack(reader, ctx)
            }
        }

        impl<C: Context> Formatted<C> for $ty {
            type Fmt = Struct;
        }
    };
}

record_impl!(Boat, a);
record_impl!(Train, cars);

trait Vehicle: std::fmt::Debug {
    fn seats(&self) -> i64;

    fn type_descriptor(&self) -> Result<TypeDescriptor, PackError>;

    fn pack_record(&self, writer: &mut dyn std::io::Write) -> Result<(), PackError>;
}

impl Vehicle for Boat {
    fn seats(&self) -> i64 {
        self.a
    }

    fn type_descriptor(&self) -> Result<TypeDescriptor, PackError> {
        <Boat as Describable>::descriptor()
    }

    fn pack_record(&self, mut writer: &mut dyn std::io::Write) -> Result<(), PackError> {
        <Boat as Packable<Struct, DefaultContext>>::pack(self, &mut writer, &DefaultContext)
    }
}

impl Vehicle for Train {
    fn seats(&self) -> i64 {
        self.cars * 80
    }

    fn type_descriptor(&self) -> Result<TypeDescriptor, PackError> {
        <Train as Describable>::descriptor()
    }

    fn pack_record(&self, mut writer: &mut dyn std::io::Write) -> Result<(), PackError> {
        <Train as Packable<Struct, DefaultContext>>::pack(self, &mut writer, &DefaultContext)
    }
}

impl<C: Context> TypedTarget<Struct, C> for Box<dyn Vehicle> {
    fn descriptor(&self) -> Result<TypeDescriptor, PackError> {
        self.as_ref().type_descriptor()
    }

    fn pack_value<W: std::io::Write>(&self, writer: &mut W, _ctx: &C) -> Result<(), PackError> {
        self.as_ref().pack_record(writer)
    }

    fn construct_from<R: Buf>(
        descriptor: &TypeDescriptor,
        reader: &mut R,
        ctx: &C,
    ) -> Result<Self, UnpackError> {
        let canonical = descriptor.canonical();
        if canonical == boat_name() {
            let boat = <Boat as Packable<Struct, C>>::unpack(reader, ctx)?;
            Ok(Box::new(boat))
        } else if canonical == train_name() {
            let train = <Train as Packable<Struct, C>>::unpack(reader, ctx)?;
            Ok(Box::new(train))
        } else {
            Err(UnpackError::UnknownType(canonical))
        }
    }
}

impl<C: Context> Formatted<C> for Box<dyn Vehicle> {
    type Fmt = Typed<Struct>;
}

fn boat_name() -> String {
    <Boat as Describable>::descriptor().unwrap().canonical()
}

fn train_name() -> String {
    <Train as Describable>::descriptor().unwrap().canonical()
}

#[test]
fn descriptor_round_trips() {
    let descriptor = TypeDescriptor::new(
        "Reading",
        vec!["telemetry".to_string(), "model".to_string()],
        vec![
            TypeParam::Type(TypeDescriptor::new("Float64", vec![], vec![])),
            TypeParam::Int(3),
            TypeParam::Bool(true),
            TypeParam::Str("unit".to_string()),
        ],
    );
    let bytes = pack(&descriptor).unwrap();
    assert_eq!(unpack::<TypeDescriptor>(&bytes), Ok(descriptor));
}

#[test]
fn descriptor_from_type_name() {
    let descriptor = <Boat as Describable>::descriptor().unwrap();
    assert_eq!(descriptor.name, "Boat");
    assert!(descriptor.path.first().map(String::as_str) == Some("formpack"));
    assert!(descriptor.params.is_empty());
}

#[test]
fn parameterized_types_must_describe_themselves() {
    struct Holder<T>(T);
    impl<T> Describable for Holder<T> {}
    assert!(matches!(
        <Holder<i64> as Describable>::descriptor(),
        Err(PackError::TypeParameters(_))
    ));
}

#[test]
fn typed_concrete_round_trip() {
    let boat = Boat { a: 42 };
    let bytes = pack_in::<Typed<Struct>, _, _>(&boat, &DefaultContext).unwrap();
    assert_eq!(
        unpack_in::<Typed<Struct>, Boat, _>(&bytes, &DefaultContext),
        Ok(boat)
    );
}

#[test]
fn typed_wire_shape() {
    let boat = Boat { a: 42 };
    let bytes = pack_in::<Typed<Struct>, _, _>(&boat, &DefaultContext).unwrap();
    let value = crate::dispatch::unpack_any(&mut bytes.as_slice()).unwrap();
    let descriptor = value.get("type").expect("missing type entry");
    assert_eq!(
        descriptor.as_seq().map(|params| params.len()),
        Some(3)
    );
    let record = value.get("value").expect("missing value entry");
    assert_eq!(record.get("a").and_then(|v| v.as_int()), Some(42));
}

#[test]
fn typed_decodes_through_supertype() {
    let vehicle: Box<dyn Vehicle> = Box::new(Boat { a: 42 });
    let bytes = pack(&vehicle).unwrap();
    let restored: Box<dyn Vehicle> = unpack(&bytes).unwrap();
    assert_eq!(restored.seats(), 42);
    assert_eq!(restored.type_descriptor().unwrap().name, "Boat");
}

#[test]
fn typed_rejects_unrelated_target() {
    let boat = Boat { a: 42 };
    let bytes = pack_in::<Typed<Struct>, _, _>(&boat, &DefaultContext).unwrap();
    let result = unpack_in::<Typed<Struct>, Train, _>(&bytes, &DefaultContext);
    assert!(matches!(result, Err(UnpackError::TypeMismatch { .. })));
}

#[test]
fn typed_reports_unknown_names() {
    let descriptor = TypeDescriptor::new("Dirigible", vec![], vec![]);
    let mut bytes = Vec::new();
    wire::write_map_header(&mut bytes, 2).unwrap();
    wire::write_str(&mut bytes, "type").unwrap();
    pack_to_with(&mut bytes, &descriptor, &DefaultContext).unwrap();
    wire::write_str(&mut bytes, "value").unwrap();
    wire::write_map_header(&mut bytes, 0).unwrap();

    let result = unpack_in::<Typed<Struct>, Box<dyn Vehicle>, _>(&bytes, &DefaultContext);
    match result {
        Err(UnpackError::UnknownType(name)) => assert_eq!(name, "Dirigible"),
        other => panic!("expected an unknown type error, got {:?}", other.err()),
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct TrainsOnly;

impl Context for TrainsOnly {
    const NAME: &'static str = "trains-only";

    fn permits(descriptor: &TypeDescriptor) -> bool {
        descriptor.canonical() == train_name()
    }
}

#[test]
fn whitelist_rejects_before_construction() {
    let vehicle: Box<dyn Vehicle> = Box::new(Boat { a: 42 });
    let bytes = pack(&vehicle).unwrap();
    let result: Result<Box<dyn Vehicle>, _> = unpack_with(&bytes, &TrainsOnly);
    match result {
        Err(UnpackError::Rejected(name)) => assert_eq!(name, boat_name()),
        other => panic!("expected a whitelist rejection, got {:?}", other.err()),
    }

    let vehicle: Box<dyn Vehicle> = Box::new(Train { cars: 3 });
    let bytes = pack_with(&vehicle, &TrainsOnly).unwrap();
    let restored: Box<dyn Vehicle> = unpack_with(&bytes, &TrainsOnly).unwrap();
    assert_eq!(restored.seats(), 240);
}

#[derive(Debug, PartialEq)]
struct Looping {
    a: i64,
}

impl Describable for Looping {}

impl<C: Context> TypedTarget<DefaultFormat, C> for Looping {
    fn descriptor(&self) -> Result<TypeDescriptor, PackError> {
        <Looping as Describable>::descriptor()
    }

    fn pack_value<W: std::io::Write>(&self, writer: &mut W, ctx: &C) -> Result<(), PackError> {
        pack_to_with(writer, &self.a, ctx)
    }

    fn construct_from<R: Buf>(
        descriptor: &TypeDescriptor,
        reader: &mut R,
        ctx: &C,
    ) -> Result<Self, UnpackError> {
        expect_concrete::<Looping>(descriptor)?;
        Ok(Looping {
            a: unpack_from_with(reader, ctx)?,
        })
    }
}

impl<C: Context> Formatted<C> for Looping {
    type Fmt = Typed<DefaultFormat>;
}

#[test]
fn recursive_typed_packing_is_refused() {
    let value = Looping { a: 1 };
    assert!(matches!(pack(&value), Err(PackError::RecursiveTyped(_))));

    let result = unpack_in::<Typed<DefaultFormat>, Looping, _>(&[0x80], &DefaultContext);
    assert!(matches!(result, Err(UnpackError::RecursiveTyped(_))));
}
