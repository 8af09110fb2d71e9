//! # Fixture Messages
//!
//! **INTERNAL USE ONLY**: This crate exists solely to provide protobuf descriptors for
//! testing the `reasonjson` codec. The descriptors are assembled from `prost-types`
//! descriptor protos, so no `protoc` is needed at build time.
//!
//! The schema is equivalent to:
//!
//! ```proto
//! // fixtures.proto
//! syntax = "proto3";
//! package fixtures;
//!
//! enum Status { STATUS_UNSPECIFIED = 0; STATUS_SUCCESS = 1; STATUS_FAILURE = 2; }
//!
//! message Inner {
//!   string inner_string = 1;
//!   int32 inner_int = 2;
//!   bool inner_bool = 3;
//!   repeated float inner_repeated_float = 4;
//! }
//!
//! message Outer { string outer_string = 1; Inner inner = 2; Status status = 3; }
//!
//! message BigInt {
//!   int64 bigint_int64 = 1;
//!   fixed64 bigint_fixed64 = 2;
//!   sfixed64 bigint_sfixed64 = 3;
//!   sint64 bigint_sint64 = 4;
//!   uint64 bigint_uint64 = 5;
//! }
//!
//! message Catalog {
//!   map<string, int32> counts = 1;
//!   map<int32, string> labels = 2;
//!   oneof choice { string text = 3; Inner detail = 4; }
//!   bytes payload = 5;
//!   repeated Inner items = 6;
//!   optional string note = 7;
//!   int32 http_status = 8;
//! }
//!
//! message Profile { string user_id = 1; int64 account_id = 2; double score = 3; Status status = 4; }
//!
//! // legacy.proto
//! syntax = "proto2";
//! package fixtures.legacy;
//!
//! message Legacy {
//!   optional int32 retries = 1 [default = 3];
//!   optional string name = 2;
//!   repeated string tags = 3;
//! }
//! ```
use prost::Message;
use prost_reflect::{DescriptorPool, MessageDescriptor, ReflectMessage};
use prost_types::{
    DescriptorProto, EnumDescriptorProto, EnumValueDescriptorProto, FieldDescriptorProto,
    FileDescriptorProto, FileDescriptorSet, MessageOptions, OneofDescriptorProto,
    field_descriptor_proto::{Label, Type},
};
use std::sync::LazyLock;

pub const OUTER: &str = "fixtures.Outer";
pub const INNER: &str = "fixtures.Inner";
pub const BIG_INT: &str = "fixtures.BigInt";
pub const CATALOG: &str = "fixtures.Catalog";
pub const PROFILE: &str = "fixtures.Profile";
pub const LEGACY: &str = "fixtures.legacy.Legacy";

static POOL: LazyLock<DescriptorPool> = LazyLock::new(|| {
    DescriptorPool::from_file_descriptor_set(file_descriptor_set())
        .expect("fixture descriptors must be valid")
});

/// The pool holding every fixture message.
pub fn pool() -> &'static DescriptorPool {
    &POOL
}

/// Looks up a fixture message by its fully qualified name.
pub fn message(full_name: &str) -> MessageDescriptor {
    POOL.get_message_by_name(full_name)
        .unwrap_or_else(|| panic!("unknown fixture message '{full_name}'"))
}

/// The fixture schema as an encoded `FileDescriptorSet`, as read from a `.bin` file.
pub fn encoded_file_descriptor_set() -> Vec<u8> {
    file_descriptor_set().encode_to_vec()
}

pub fn file_descriptor_set() -> FileDescriptorSet {
    FileDescriptorSet {
        file: vec![fixtures_file(), legacy_file()],
    }
}

/// A generated-style binding of `fixtures.Outer`.
#[derive(Clone, PartialEq, Message)]
pub struct Outer {
    #[prost(string, tag = "1")]
    pub outer_string: String,
    #[prost(message, optional, tag = "2")]
    pub inner: Option<Inner>,
    #[prost(int32, tag = "3")]
    pub status: i32,
}

/// A generated-style binding of `fixtures.Inner`.
#[derive(Clone, PartialEq, Message)]
pub struct Inner {
    #[prost(string, tag = "1")]
    pub inner_string: String,
    #[prost(int32, tag = "2")]
    pub inner_int: i32,
    #[prost(bool, tag = "3")]
    pub inner_bool: bool,
    #[prost(float, repeated, tag = "4")]
    pub inner_repeated_float: Vec<f32>,
}

impl ReflectMessage for Outer {
    fn descriptor(&self) -> MessageDescriptor {
        message(OUTER)
    }
}

impl ReflectMessage for Inner {
    fn descriptor(&self) -> MessageDescriptor {
        message(INNER)
    }
}

fn fixtures_file() -> FileDescriptorProto {
    let status = EnumDescriptorProto {
        name: Some("Status".to_string()),
        value: ["STATUS_UNSPECIFIED", "STATUS_SUCCESS", "STATUS_FAILURE"]
            .into_iter()
            .enumerate()
            .map(|(number, name)| EnumValueDescriptorProto {
                name: Some(name.to_string()),
                number: Some(number as i32),
                ..Default::default()
            })
            .collect(),
        ..Default::default()
    };

    let inner = message_proto(
        "Inner",
        vec![
            field("inner_string", 1, Type::String),
            field("inner_int", 2, Type::Int32),
            field("inner_bool", 3, Type::Bool),
            repeated(field("inner_repeated_float", 4, Type::Float)),
        ],
    );

    let outer = message_proto(
        "Outer",
        vec![
            field("outer_string", 1, Type::String),
            typed(field("inner", 2, Type::Message), ".fixtures.Inner"),
            typed(field("status", 3, Type::Enum), ".fixtures.Status"),
        ],
    );

    let big_int = message_proto(
        "BigInt",
        vec![
            field("bigint_int64", 1, Type::Int64),
            field("bigint_fixed64", 2, Type::Fixed64),
            field("bigint_sfixed64", 3, Type::Sfixed64),
            field("bigint_sint64", 4, Type::Sint64),
            field("bigint_uint64", 5, Type::Uint64),
        ],
    );

    let mut catalog = message_proto(
        "Catalog",
        vec![
            repeated(typed(
                field("counts", 1, Type::Message),
                ".fixtures.Catalog.CountsEntry",
            )),
            repeated(typed(
                field("labels", 2, Type::Message),
                ".fixtures.Catalog.LabelsEntry",
            )),
            in_oneof(field("text", 3, Type::String), 0),
            in_oneof(typed(field("detail", 4, Type::Message), ".fixtures.Inner"), 0),
            field("payload", 5, Type::Bytes),
            repeated(typed(field("items", 6, Type::Message), ".fixtures.Inner")),
            FieldDescriptorProto {
                proto3_optional: Some(true),
                ..in_oneof(field("note", 7, Type::String), 1)
            },
            field("http_status", 8, Type::Int32),
        ],
    );
    catalog.nested_type = vec![
        map_entry("CountsEntry", Type::String, Type::Int32),
        map_entry("LabelsEntry", Type::Int32, Type::String),
    ];
    catalog.oneof_decl = vec![oneof("choice"), oneof("_note")];

    let profile = message_proto(
        "Profile",
        vec![
            field("user_id", 1, Type::String),
            field("account_id", 2, Type::Int64),
            field("score", 3, Type::Double),
            typed(field("status", 4, Type::Enum), ".fixtures.Status"),
        ],
    );

    FileDescriptorProto {
        name: Some("fixtures.proto".to_string()),
        package: Some("fixtures".to_string()),
        syntax: Some("proto3".to_string()),
        message_type: vec![inner, outer, big_int, catalog, profile],
        enum_type: vec![status],
        ..Default::default()
    }
}

fn legacy_file() -> FileDescriptorProto {
    let legacy = message_proto(
        "Legacy",
        vec![
            FieldDescriptorProto {
                default_value: Some("3".to_string()),
                ..field("retries", 1, Type::Int32)
            },
            field("name", 2, Type::String),
            repeated(field("tags", 3, Type::String)),
        ],
    );

    FileDescriptorProto {
        name: Some("legacy.proto".to_string()),
        package: Some("fixtures.legacy".to_string()),
        syntax: Some("proto2".to_string()),
        message_type: vec![legacy],
        ..Default::default()
    }
}

fn message_proto(name: &str, field: Vec<FieldDescriptorProto>) -> DescriptorProto {
    DescriptorProto {
        name: Some(name.to_string()),
        field,
        ..Default::default()
    }
}

fn map_entry(name: &str, key: Type, value: Type) -> DescriptorProto {
    DescriptorProto {
        options: Some(MessageOptions {
            map_entry: Some(true),
            ..Default::default()
        }),
        ..message_proto(name, vec![field("key", 1, key), field("value", 2, value)])
    }
}

fn oneof(name: &str) -> OneofDescriptorProto {
    OneofDescriptorProto {
        name: Some(name.to_string()),
        ..Default::default()
    }
}

fn field(name: &str, number: i32, ty: Type) -> FieldDescriptorProto {
    FieldDescriptorProto {
        name: Some(name.to_string()),
        json_name: Some(json_name(name)),
        number: Some(number),
        label: Some(Label::Optional as i32),
        r#type: Some(ty as i32),
        ..Default::default()
    }
}

fn typed(field: FieldDescriptorProto, type_name: &str) -> FieldDescriptorProto {
    FieldDescriptorProto {
        type_name: Some(type_name.to_string()),
        ..field
    }
}

fn repeated(field: FieldDescriptorProto) -> FieldDescriptorProto {
    FieldDescriptorProto {
        label: Some(Label::Repeated as i32),
        ..field
    }
}

fn in_oneof(field: FieldDescriptorProto, index: i32) -> FieldDescriptorProto {
    FieldDescriptorProto {
        oneof_index: Some(index),
        ..field
    }
}

// lowerCamelCase, the way protoc fills `json_name`.
fn json_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper_next = false;
    for c in name.chars() {
        if c == '_' {
            upper_next = true;
        } else if upper_next {
            out.push(c.to_ascii_uppercase());
            upper_next = false;
        } else {
            out.push(c);
        }
    }
    out
}
