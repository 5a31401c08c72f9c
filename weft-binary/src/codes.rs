//! One-byte type codes of the wire format.

/// Closes a struct, symbol map or list
pub const END: u8 = 0x00;
/// 1 byte, zero is false
pub const BOOLEAN: u8 = 0x01;
/// 8 bytes
pub const FLOAT64: u8 = 0x03;
/// Type name then member identifier, both as [`UTF8_STRING`]
pub const ENUM: u8 = 0x04;
/// 4 bytes
pub const FLOAT32: u8 = 0x05;
/// 4 bytes
pub const INT32: u8 = 0x06;
/// 4 bytes
pub const UINT32: u8 = 0x07;
/// 8 bytes
pub const INT64: u8 = 0x08;
/// 8 bytes
pub const UINT64: u8 = 0x09;
/// A nested [`UTF8_STRING`]
pub const STRING: u8 = 0x0a;
/// i64 seconds since the Unix epoch, then u32 nanoseconds
pub const TIMESTAMP: u8 = 0x0b;
/// i32 length, then raw bytes
pub const BUFFER: u8 = 0x0d;
/// i32 byte length, then UTF-8 bytes
pub const UTF8_STRING: u8 = 0x0e;
/// Size placeholder, elements, [`END`]
pub const LIST: u8 = 0x0f;
/// Size placeholder, type name, fields, [`END`]
pub const STRUCT: u8 = 0x10;
/// Fields, [`END`]
pub const SYMBOL_MAP: u8 = 0x11;
/// No payload
pub const NULL: u8 = 0x12;
/// Field name, then one complete value
pub const FIELD: u8 = 0x13;

/// Written in place of struct and list sizes. Ignored when decoding.
pub const UNKNOWN_SIZE: i32 = -1;

/// Human-readable name of a type code, for logs and errors.
pub const fn name(code: u8) -> &'static str {
    match code {
        END => "end",
        BOOLEAN => "boolean",
        FLOAT64 => "float64",
        ENUM => "enum",
        FLOAT32 => "float32",
        INT32 => "int32",
        UINT32 => "uint32",
        INT64 => "int64",
        UINT64 => "uint64",
        STRING => "string",
        TIMESTAMP => "timestamp",
        BUFFER => "buffer",
        UTF8_STRING => "utf8 string",
        LIST => "list",
        STRUCT => "struct",
        SYMBOL_MAP => "symbol map",
        NULL => "null",
        FIELD => "field",
        _ => "unknown",
    }
}
