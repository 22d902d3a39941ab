//! The decoded content tree.
//!
//! Every record that appears in a stream is one [`Content`] variant. Each
//! variant keeps exactly what its wire form carries (the tag is implied by the
//! variant, or by an explicit kind where two tags share a shape), so the
//! encoder can re-emit the input byte for byte.
//!
//! A node is owned by the tree position where it was first materialized. Every
//! later appearance is a [`Reference`] holding the handle, never a copy.

use serde::Serialize;

use crate::constants::*;
use crate::utf::JavaUtf;

/// One record of an object stream.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Content {
    Null,
    Reference(Reference),
    ClassDesc(ClassDesc),
    ProxyClassDesc(ProxyClassDesc),
    Object(Object),
    String(JavaString),
    Array(Array),
    Class(Class),
    Enum(Enum),
    BlockData(BlockData),
    EndBlockData,
    Exception,
    Reset,
}

impl Content {
    /// The tag byte this record is written with.
    pub fn tag(&self) -> u8 {
        match self {
            Content::Null => TC_NULL,
            Content::Reference(_) => TC_REFERENCE,
            Content::ClassDesc(_) => TC_CLASSDESC,
            Content::ProxyClassDesc(_) => TC_PROXYCLASSDESC,
            Content::Object(_) => TC_OBJECT,
            Content::String(s) => match s.wire_kind() {
                StringKind::Short => TC_STRING,
                StringKind::Long => TC_LONGSTRING,
            },
            Content::Array(_) => TC_ARRAY,
            Content::Class(_) => TC_CLASS,
            Content::Enum(_) => TC_ENUM,
            Content::BlockData(b) => match b.wire_kind() {
                BlockKind::Short => TC_BLOCKDATA,
                BlockKind::Long => TC_BLOCKDATALONG,
            },
            Content::EndBlockData => TC_ENDBLOCKDATA,
            Content::Exception => TC_EXCEPTION,
            Content::Reset => TC_RESET,
        }
    }

    /// Protocol name of this record's tag.
    pub fn tag_name(&self) -> &'static str {
        tag_name(self.tag())
    }

    /// Handle assigned to this node, for referenceable variants.
    ///
    /// A [`Reference`] returns `None`: it points at a handle but owns none.
    pub fn handle(&self) -> Option<u32> {
        match self {
            Content::ClassDesc(c) => Some(c.handle),
            Content::ProxyClassDesc(c) => Some(c.handle),
            Content::Object(o) => Some(o.handle),
            Content::String(s) => Some(s.handle),
            Content::Array(a) => Some(a.handle),
            Content::Class(c) => Some(c.handle),
            Content::Enum(e) => Some(e.handle),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Content::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_object_mut(&mut self) -> Option<&mut Object> {
        match self {
            Content::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_class_desc(&self) -> Option<&ClassDesc> {
        match self {
            Content::ClassDesc(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<&JavaString> {
        match self {
            Content::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_string_mut(&mut self) -> Option<&mut JavaString> {
        match self {
            Content::String(s) => Some(s),
            _ => None,
        }
    }

    /// Direct structural children in record order.
    ///
    /// References are leaves; their targets are not reached through them.
    pub fn children(&self) -> Vec<&Content> {
        let mut out: Vec<&Content> = Vec::new();
        match self {
            Content::ClassDesc(c) => {
                out.extend(c.fields.iter().filter_map(|f| f.class_name.as_ref()));
                out.extend(c.annotations.iter());
                out.push(&c.super_class);
            }
            Content::ProxyClassDesc(p) => {
                out.extend(p.annotations.iter());
                out.push(&p.super_class);
            }
            Content::Object(o) => {
                out.push(&o.class_desc);
                for data in &o.class_data {
                    out.extend(data.fields.iter().filter_map(|f| f.value.as_content()));
                    if let Some(annotations) = &data.annotations {
                        out.extend(annotations.iter());
                    }
                }
            }
            Content::Array(a) => {
                out.push(&a.class_desc);
                out.extend(a.values.iter().filter_map(FieldValue::as_content));
            }
            Content::Class(c) => out.push(&c.class_desc),
            Content::Enum(e) => {
                out.push(&e.class_desc);
                out.push(&e.constant_name);
            }
            Content::Null
            | Content::Reference(_)
            | Content::String(_)
            | Content::BlockData(_)
            | Content::EndBlockData
            | Content::Exception
            | Content::Reset => {}
        }
        out
    }

    /// Mutable counterpart of [`children`](Content::children), same order.
    pub fn children_mut(&mut self) -> Vec<&mut Content> {
        let mut out: Vec<&mut Content> = Vec::new();
        match self {
            Content::ClassDesc(c) => {
                out.extend(c.fields.iter_mut().filter_map(|f| f.class_name.as_mut()));
                out.extend(c.annotations.iter_mut());
                out.push(&mut *c.super_class);
            }
            Content::ProxyClassDesc(p) => {
                out.extend(p.annotations.iter_mut());
                out.push(&mut *p.super_class);
            }
            Content::Object(o) => {
                out.push(&mut *o.class_desc);
                for data in &mut o.class_data {
                    out.extend(
                        data.fields
                            .iter_mut()
                            .filter_map(|f| f.value.as_content_mut()),
                    );
                    if let Some(annotations) = &mut data.annotations {
                        out.extend(annotations.iter_mut());
                    }
                }
            }
            Content::Array(a) => {
                out.push(&mut *a.class_desc);
                out.extend(a.values.iter_mut().filter_map(FieldValue::as_content_mut));
            }
            Content::Class(c) => out.push(&mut *c.class_desc),
            Content::Enum(e) => {
                out.push(&mut *e.class_desc);
                out.push(&mut *e.constant_name);
            }
            Content::Null
            | Content::Reference(_)
            | Content::String(_)
            | Content::BlockData(_)
            | Content::EndBlockData
            | Content::Exception
            | Content::Reset => {}
        }
        out
    }
}

/// `TC_REFERENCE`: a back-reference to an already assigned handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Reference {
    pub handle: u32,
}

/// `TC_CLASSDESC`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassDesc {
    pub handle: u32,
    pub class_name: JavaUtf,
    pub serial_version_uid: i64,
    pub flags: u8,
    pub fields: Vec<FieldDesc>,
    /// Class annotation, without the closing `TC_ENDBLOCKDATA`.
    pub annotations: Vec<Content>,
    /// `Null`, a `Reference`, or a nested descriptor.
    pub super_class: Box<Content>,
}

impl ClassDesc {
    pub fn has_write_method(&self) -> bool {
        self.flags & SC_WRITE_METHOD != 0
    }

    pub fn is_serializable(&self) -> bool {
        self.flags & SC_SERIALIZABLE != 0
    }

    pub fn is_externalizable(&self) -> bool {
        self.flags & SC_EXTERNALIZABLE != 0
    }

    pub fn has_block_data(&self) -> bool {
        self.flags & SC_BLOCK_DATA != 0
    }

    pub fn is_enum(&self) -> bool {
        self.flags & SC_ENUM != 0
    }
}

/// One serializable field of a class descriptor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldDesc {
    pub field_type: FieldType,
    pub name: JavaUtf,
    /// JVM type signature for object and array fields: a string or a
    /// reference to one.
    pub class_name: Option<Content>,
}

/// Field type codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum FieldType {
    Byte,
    Char,
    Double,
    Float,
    Int,
    Long,
    Short,
    Boolean,
    Object,
    Array,
}

impl FieldType {
    pub fn from_code(code: u8) -> Option<Self> {
        Some(match code {
            b'B' => FieldType::Byte,
            b'C' => FieldType::Char,
            b'D' => FieldType::Double,
            b'F' => FieldType::Float,
            b'I' => FieldType::Int,
            b'J' => FieldType::Long,
            b'S' => FieldType::Short,
            b'Z' => FieldType::Boolean,
            b'L' => FieldType::Object,
            b'[' => FieldType::Array,
            _ => return None,
        })
    }

    pub fn code(self) -> u8 {
        match self {
            FieldType::Byte => b'B',
            FieldType::Char => b'C',
            FieldType::Double => b'D',
            FieldType::Float => b'F',
            FieldType::Int => b'I',
            FieldType::Long => b'J',
            FieldType::Short => b'S',
            FieldType::Boolean => b'Z',
            FieldType::Object => b'L',
            FieldType::Array => b'[',
        }
    }

    /// Object and array fields carry a class name and a content value.
    pub fn is_reference(self) -> bool {
        matches!(self, FieldType::Object | FieldType::Array)
    }

    pub fn java_name(self) -> &'static str {
        match self {
            FieldType::Byte => "byte",
            FieldType::Char => "char",
            FieldType::Double => "double",
            FieldType::Float => "float",
            FieldType::Int => "int",
            FieldType::Long => "long",
            FieldType::Short => "short",
            FieldType::Boolean => "boolean",
            FieldType::Object => "object",
            FieldType::Array => "array",
        }
    }
}

/// `TC_PROXYCLASSDESC`: descriptor of a dynamic proxy class.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProxyClassDesc {
    pub handle: u32,
    pub interfaces: Vec<JavaUtf>,
    pub annotations: Vec<Content>,
    pub super_class: Box<Content>,
}

/// `TC_OBJECT`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Object {
    pub handle: u32,
    pub class_desc: Box<Content>,
    /// One entry per class in the hierarchy, super class first.
    pub class_data: Vec<ClassData>,
}

impl Object {
    /// Value of the field `name`, looking from the most derived class up.
    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.class_data
            .iter()
            .rev()
            .flat_map(|data| data.fields.iter())
            .find(|f| f.name == name)
            .map(|f| &f.value)
    }

    /// Mutable access for in-place rewrites. The value's variant must keep
    /// matching the field's declared type for the stream to stay decodable.
    pub fn field_mut(&mut self, name: &str) -> Option<&mut FieldValue> {
        self.class_data
            .iter_mut()
            .rev()
            .flat_map(|data| data.fields.iter_mut())
            .find(|f| f.name == name)
            .map(|f| &mut f.value)
    }
}

/// Serialized data contributed by one class of an object's hierarchy.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassData {
    /// Name of the contributing class; informational, not written.
    pub class_name: String,
    pub fields: Vec<Field>,
    /// Object annotation written by a custom `writeObject`/`writeExternal`,
    /// without the closing `TC_ENDBLOCKDATA`. Present iff the descriptor has
    /// `SC_WRITE_METHOD`, or `SC_EXTERNALIZABLE | SC_BLOCK_DATA`.
    pub annotations: Option<Vec<Content>>,
}

/// A field value paired with its declared name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Field {
    pub name: String,
    pub value: FieldValue,
}

/// A typed field or array element value.
///
/// Floating point values keep their exact bit pattern and booleans keep the
/// raw byte, so that unusual encodings survive a round trip.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum FieldValue {
    Byte(i8),
    Char(u16),
    Double(f64),
    Float(f32),
    Int(i32),
    Long(i64),
    Short(i16),
    /// Raw byte; non-zero means `true`.
    Boolean(u8),
    Object(Content),
}

impl FieldValue {
    pub fn as_content(&self) -> Option<&Content> {
        match self {
            FieldValue::Object(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_content_mut(&mut self) -> Option<&mut Content> {
        match self {
            FieldValue::Object(c) => Some(c),
            _ => None,
        }
    }
}

/// `TC_STRING` or `TC_LONGSTRING`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JavaString {
    pub handle: u32,
    pub kind: StringKind,
    pub value: JavaUtf,
}

impl JavaString {
    pub fn to_string_lossy(&self) -> String {
        self.value.to_string_lossy()
    }

    /// Rewrites the text. Values too long for a 2-byte length switch the
    /// record to `TC_LONGSTRING`.
    pub fn set_value(&mut self, value: &str) {
        self.value.set_value(value);
        if self.value.len() > u16::MAX as usize {
            self.kind = StringKind::Long;
        }
    }

    /// Form the record is written in: the declared kind, or the long form
    /// when the payload no longer fits a 2-byte length.
    pub fn wire_kind(&self) -> StringKind {
        if self.value.len() > u16::MAX as usize {
            StringKind::Long
        } else {
            self.kind
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StringKind {
    /// 2-byte length prefix.
    Short,
    /// 8-byte length prefix.
    Long,
}

/// `TC_ARRAY`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Array {
    pub handle: u32,
    pub class_desc: Box<Content>,
    pub values: Vec<FieldValue>,
}

/// `TC_CLASS`: a `java.lang.Class` instance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Class {
    pub handle: u32,
    pub class_desc: Box<Content>,
}

/// `TC_ENUM`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Enum {
    pub handle: u32,
    pub class_desc: Box<Content>,
    /// A string or a reference to one.
    pub constant_name: Box<Content>,
}

/// `TC_BLOCKDATA` or `TC_BLOCKDATALONG`: opaque bytes written by custom
/// serialization code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockData {
    pub kind: BlockKind,
    pub data: Vec<u8>,
}

impl BlockData {
    /// Replaces the payload, switching to `TC_BLOCKDATALONG` when it no
    /// longer fits a 1-byte length.
    pub fn set_data(&mut self, data: Vec<u8>) {
        if data.len() > u8::MAX as usize {
            self.kind = BlockKind::Long;
        }
        self.data = data;
    }

    /// Form the record is written in: the declared kind, or the long form
    /// when the payload no longer fits a 1-byte length.
    pub fn wire_kind(&self) -> BlockKind {
        if self.data.len() > u8::MAX as usize {
            BlockKind::Long
        } else {
            self.kind
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BlockKind {
    /// 1-byte length prefix.
    Short,
    /// 4-byte length prefix.
    Long,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn string(handle: u32, text: &str) -> Content {
        Content::String(JavaString {
            handle,
            kind: StringKind::Short,
            value: JavaUtf::from(text),
        })
    }

    #[test]
    fn tags_follow_kind() {
        let mut s = string(BASE_WIRE_HANDLE, "x");
        assert_eq!(s.tag(), TC_STRING);
        if let Content::String(js) = &mut s {
            js.kind = StringKind::Long;
        }
        assert_eq!(s.tag(), TC_LONGSTRING);
        assert_eq!(Content::Reset.tag_name(), "TC_RESET");
    }

    #[test]
    fn references_have_no_handle_or_children() {
        let r = Content::Reference(Reference {
            handle: BASE_WIRE_HANDLE,
        });
        assert_eq!(r.handle(), None);
        assert!(r.children().is_empty());
    }

    #[test]
    fn object_children_follow_record_order() {
        let object = Content::Object(Object {
            handle: BASE_WIRE_HANDLE + 1,
            class_desc: Box::new(Content::Reference(Reference {
                handle: BASE_WIRE_HANDLE,
            })),
            class_data: vec![ClassData {
                class_name: "Pair".into(),
                fields: vec![
                    Field {
                        name: "n".into(),
                        value: FieldValue::Int(1),
                    },
                    Field {
                        name: "s".into(),
                        value: FieldValue::Object(string(BASE_WIRE_HANDLE + 2, "a")),
                    },
                ],
                annotations: Some(vec![Content::Null]),
            }],
        });
        let tags: Vec<u8> = object.children().iter().map(|c| c.tag()).collect();
        assert_eq!(tags, vec![TC_REFERENCE, TC_STRING, TC_NULL]);
    }

    #[test]
    fn field_lookup_prefers_most_derived_class() {
        let data = |class: &str, v: i32| ClassData {
            class_name: class.into(),
            fields: vec![Field {
                name: "x".into(),
                value: FieldValue::Int(v),
            }],
            annotations: None,
        };
        let mut object = Object {
            handle: BASE_WIRE_HANDLE,
            class_desc: Box::new(Content::Null),
            class_data: vec![data("Base", 1), data("Derived", 2)],
        };
        assert_eq!(object.field("x"), Some(&FieldValue::Int(2)));
        *object.field_mut("x").unwrap() = FieldValue::Int(7);
        assert_eq!(object.class_data[1].fields[0].value, FieldValue::Int(7));
        assert_eq!(object.field("missing"), None);
    }

    #[test]
    fn long_payloads_switch_kind() {
        let mut block = BlockData {
            kind: BlockKind::Short,
            data: vec![],
        };
        block.set_data(vec![0; 300]);
        assert_eq!(block.kind, BlockKind::Long);

        let mut s = JavaString {
            handle: BASE_WIRE_HANDLE,
            kind: StringKind::Short,
            value: JavaUtf::default(),
        };
        s.set_value(&"a".repeat(70_000));
        assert_eq!(s.kind, StringKind::Long);
    }

    #[test]
    fn field_type_codes() {
        for code in b"BCDFIJSZL[" {
            let ty = FieldType::from_code(*code).unwrap();
            assert_eq!(ty.code(), *code);
        }
        assert!(FieldType::from_code(b'X').is_none());
        assert!(FieldType::Array.is_reference());
        assert!(!FieldType::Long.is_reference());
    }
}
