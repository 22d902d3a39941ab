//! Object stream protocol constants.

/// First two bytes of every stream.
pub const STREAM_MAGIC: [u8; 2] = [0xac, 0xed];
/// Protocol version written by current JDKs.
pub const STREAM_VERSION: [u8; 2] = [0x00, 0x05];
/// First handle assigned in a stream (and after every reset).
pub const BASE_WIRE_HANDLE: u32 = 0x7e_0000;

pub const TC_NULL: u8 = 0x70;
pub const TC_REFERENCE: u8 = 0x71;
pub const TC_CLASSDESC: u8 = 0x72;
pub const TC_OBJECT: u8 = 0x73;
pub const TC_STRING: u8 = 0x74;
pub const TC_ARRAY: u8 = 0x75;
pub const TC_CLASS: u8 = 0x76;
pub const TC_BLOCKDATA: u8 = 0x77;
pub const TC_ENDBLOCKDATA: u8 = 0x78;
pub const TC_RESET: u8 = 0x79;
pub const TC_BLOCKDATALONG: u8 = 0x7a;
pub const TC_EXCEPTION: u8 = 0x7b;
pub const TC_LONGSTRING: u8 = 0x7c;
pub const TC_PROXYCLASSDESC: u8 = 0x7d;
pub const TC_ENUM: u8 = 0x7e;

/// Class defines a custom `writeObject`; its data carries an annotation.
pub const SC_WRITE_METHOD: u8 = 0x01;
pub const SC_SERIALIZABLE: u8 = 0x02;
pub const SC_EXTERNALIZABLE: u8 = 0x04;
/// Externalizable data was written in block-data mode (protocol version 2).
pub const SC_BLOCK_DATA: u8 = 0x08;
pub const SC_ENUM: u8 = 0x10;

/// Bytes after which some generators drop a mandatory `TC_ENDBLOCKDATA`.
///
/// They are the tail of a `TC_REFERENCE` to handle `0x7e0009`, which is how
/// the affected gadget payloads close an object annotation.
pub const DEFECT_MARKER: [u8; 4] = [0x00, 0x7e, 0x00, 0x09];

/// Protocol name of a tag byte, for diagnostics.
pub fn tag_name(tag: u8) -> &'static str {
    match tag {
        TC_NULL => "TC_NULL",
        TC_REFERENCE => "TC_REFERENCE",
        TC_CLASSDESC => "TC_CLASSDESC",
        TC_OBJECT => "TC_OBJECT",
        TC_STRING => "TC_STRING",
        TC_ARRAY => "TC_ARRAY",
        TC_CLASS => "TC_CLASS",
        TC_BLOCKDATA => "TC_BLOCKDATA",
        TC_ENDBLOCKDATA => "TC_ENDBLOCKDATA",
        TC_RESET => "TC_RESET",
        TC_BLOCKDATALONG => "TC_BLOCKDATALONG",
        TC_EXCEPTION => "TC_EXCEPTION",
        TC_LONGSTRING => "TC_LONGSTRING",
        TC_PROXYCLASSDESC => "TC_PROXYCLASSDESC",
        TC_ENUM => "TC_ENUM",
        _ => "unknown",
    }
}

/// Renders class descriptor flags as `SC_SERIALIZABLE|SC_WRITE_METHOD`.
pub fn flags_name(flags: u8) -> String {
    let names = [
        (SC_SERIALIZABLE, "SC_SERIALIZABLE"),
        (SC_EXTERNALIZABLE, "SC_EXTERNALIZABLE"),
        (SC_WRITE_METHOD, "SC_WRITE_METHOD"),
        (SC_BLOCK_DATA, "SC_BLOCK_DATA"),
        (SC_ENUM, "SC_ENUM"),
    ];
    let parts: Vec<&str> = names
        .iter()
        .filter(|(bit, _)| flags & bit != 0)
        .map(|(_, name)| *name)
        .collect();
    if parts.is_empty() {
        "0".to_owned()
    } else {
        parts.join("|")
    }
}
