//! Object stream encoder.
//!
//! The encoder is the exact inverse of [`Decoder`](crate::Decoder): each node
//! re-emits the tag and payload it was decoded from, and references emit only
//! their handle.

use serz_buffers::Writer;
use tracing::{debug, warn};

use crate::constants::*;
use crate::content::*;
use crate::serialization::Serialization;
use crate::utf::JavaUtf;

/// Object stream encoder.
pub struct Encoder {
    pub writer: Writer,
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Encoder {
    pub fn new() -> Self {
        Self {
            writer: Writer::with_alloc_size(1024),
        }
    }

    /// Encodes a whole stream and returns the bytes.
    pub fn encode(&mut self, serialization: &Serialization) -> Vec<u8> {
        self.writer.reset();
        self.writer.buf(&serialization.magic);
        self.writer.buf(&serialization.version);
        for content in &serialization.contents {
            self.write_content(content);
        }
        debug!(
            records = serialization.contents.len(),
            bytes = self.writer.len(),
            "encoded object stream"
        );
        self.writer.flush()
    }

    pub fn write_content(&mut self, content: &Content) {
        self.writer.u8(content.tag());
        match content {
            Content::Null
            | Content::EndBlockData
            | Content::Exception
            | Content::Reset => {}
            Content::Reference(r) => self.writer.u32(r.handle),
            Content::ClassDesc(desc) => self.write_class_desc(desc),
            Content::ProxyClassDesc(proxy) => self.write_proxy_class_desc(proxy),
            Content::Object(object) => self.write_object(object),
            Content::String(s) => self.write_string(s),
            Content::Array(array) => {
                self.write_content(&array.class_desc);
                self.writer.i32(array.values.len() as i32);
                for value in &array.values {
                    self.write_value(value);
                }
            }
            Content::Class(class) => self.write_content(&class.class_desc),
            Content::Enum(e) => {
                self.write_content(&e.class_desc);
                self.write_content(&e.constant_name);
            }
            Content::BlockData(block) => self.write_block_data(block),
        }
    }

    fn write_class_desc(&mut self, desc: &ClassDesc) {
        self.write_utf(&desc.class_name);
        self.writer.i64(desc.serial_version_uid);
        self.writer.u8(desc.flags);
        self.writer.i16(desc.fields.len() as i16);
        for field in &desc.fields {
            self.writer.u8(field.field_type.code());
            self.write_utf(&field.name);
            if let Some(class_name) = &field.class_name {
                self.write_content(class_name);
            }
        }
        self.write_annotations(&desc.annotations);
        self.write_content(&desc.super_class);
    }

    fn write_proxy_class_desc(&mut self, proxy: &ProxyClassDesc) {
        self.writer.i32(proxy.interfaces.len() as i32);
        for name in &proxy.interfaces {
            self.write_utf(name);
        }
        self.write_annotations(&proxy.annotations);
        self.write_content(&proxy.super_class);
    }

    fn write_object(&mut self, object: &Object) {
        self.write_content(&object.class_desc);
        for data in &object.class_data {
            for field in &data.fields {
                self.write_value(&field.value);
            }
            if let Some(annotations) = &data.annotations {
                self.write_annotations(annotations);
            }
        }
    }

    fn write_annotations(&mut self, annotations: &[Content]) {
        for content in annotations {
            self.write_content(content);
        }
        self.writer.u8(TC_ENDBLOCKDATA);
    }

    fn write_value(&mut self, value: &FieldValue) {
        match value {
            FieldValue::Byte(v) => self.writer.i8(*v),
            FieldValue::Char(v) => self.writer.u16(*v),
            FieldValue::Double(v) => self.writer.f64(*v),
            FieldValue::Float(v) => self.writer.f32(*v),
            FieldValue::Int(v) => self.writer.i32(*v),
            FieldValue::Long(v) => self.writer.i64(*v),
            FieldValue::Short(v) => self.writer.i16(*v),
            FieldValue::Boolean(v) => self.writer.u8(*v),
            FieldValue::Object(content) => self.write_content(content),
        }
    }

    fn write_string(&mut self, s: &JavaString) {
        match s.wire_kind() {
            StringKind::Short => self.write_utf(&s.value),
            StringKind::Long => {
                self.writer.i64(s.value.len() as i64);
                self.writer.buf(&s.value.data);
            }
        }
    }

    fn write_block_data(&mut self, block: &BlockData) {
        match block.wire_kind() {
            BlockKind::Short => {
                self.writer.u8(block.data.len() as u8);
                self.writer.buf(&block.data);
            }
            BlockKind::Long => {
                self.writer.i32(block.data.len() as i32);
                self.writer.buf(&block.data);
            }
        }
    }

    /// Writes a 2-byte length-prefixed name. Names have no long form, so one
    /// longer than the prefix can express is cut at 65535 bytes and logged.
    fn write_utf(&mut self, utf: &JavaUtf) {
        if utf.len() > u16::MAX as usize {
            warn!(length = utf.len(), "name exceeds 65535 bytes, truncating");
        }
        let data = &utf.data[..utf.data.len().min(u16::MAX as usize)];
        self.writer.u16(data.len() as u16);
        self.writer.buf(data);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_header_only_stream() {
        let ser = Serialization::new();
        assert_eq!(Encoder::new().encode(&ser), vec![0xac, 0xed, 0x00, 0x05]);
    }

    #[test]
    fn references_emit_only_the_handle() {
        let mut encoder = Encoder::new();
        encoder.write_content(&Content::Reference(Reference {
            handle: BASE_WIRE_HANDLE + 2,
        }));
        assert_eq!(encoder.writer.flush(), vec![TC_REFERENCE, 0x00, 0x7e, 0x00, 0x02]);
    }

    #[test]
    fn long_string_uses_eight_byte_length() {
        let mut encoder = Encoder::new();
        encoder.write_content(&Content::String(JavaString {
            handle: BASE_WIRE_HANDLE,
            kind: StringKind::Long,
            value: JavaUtf::from("ab"),
        }));
        assert_eq!(
            encoder.writer.flush(),
            vec![TC_LONGSTRING, 0, 0, 0, 0, 0, 0, 0, 2, b'a', b'b']
        );
    }

    #[test]
    fn oversized_short_records_switch_to_long_form() {
        let mut encoder = Encoder::new();
        encoder.write_content(&Content::BlockData(BlockData {
            kind: BlockKind::Short,
            data: vec![0xab; 300],
        }));
        let out = encoder.writer.flush();
        assert_eq!(&out[..5], &[TC_BLOCKDATALONG, 0x00, 0x00, 0x01, 0x2c]);
        assert_eq!(out.len(), 5 + 300);

        encoder.write_content(&Content::String(JavaString {
            handle: BASE_WIRE_HANDLE,
            kind: StringKind::Short,
            value: JavaUtf::new(vec![b'a'; 70_000]),
        }));
        let out = encoder.writer.flush();
        assert_eq!(out[0], TC_LONGSTRING);
        assert_eq!(&out[1..9], &70_000i64.to_be_bytes());
        assert_eq!(out.len(), 9 + 70_000);
    }

    #[test]
    fn annotations_end_with_terminator() {
        let mut encoder = Encoder::new();
        encoder.write_annotations(&[Content::BlockData(BlockData {
            kind: BlockKind::Short,
            data: vec![0xca, 0xfe],
        })]);
        assert_eq!(
            encoder.writer.flush(),
            vec![TC_BLOCKDATA, 2, 0xca, 0xfe, TC_ENDBLOCKDATA]
        );
    }
}
