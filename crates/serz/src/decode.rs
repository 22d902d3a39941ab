//! Recursive-descent object stream decoder.

use serz_buffers::ByteCursor;
use tracing::{debug, trace, warn};

use crate::config::DecoderConfig;
use crate::constants::*;
use crate::content::*;
use crate::error::{ReadContext, SerzError};
use crate::handles::{ClassLayout, HandleKind, HandleTable};
use crate::serialization::Serialization;
use crate::utf::JavaUtf;

/// Decodes content records from a [`ByteCursor`].
///
/// A decoder owns the handle table of one stream; create a new one per
/// stream. Per-record logic is shared by both top-level drivers
/// ([`decode_all`](Decoder::decode_all) and
/// [`decode_count`](Decoder::decode_count)).
///
/// ```
/// use serz::{Content, Decoder};
/// use serz_buffers::Reader;
///
/// let data = [0xac, 0xed, 0x00, 0x05, 0x74, 0x00, 0x02, b'h', b'i'];
/// let ser = Decoder::new(Reader::new(&data)).decode_all().unwrap();
/// let Content::String(s) = &ser.contents[0] else { panic!() };
/// assert_eq!(s.to_string_lossy(), "hi");
/// ```
pub struct Decoder<C> {
    cursor: C,
    handles: HandleTable,
    config: DecoderConfig,
    depth: usize,
    /// Set by `TC_EXCEPTION`: the table is cleared again once the exception
    /// object that follows it has been read.
    reset_after_next: bool,
}

impl<C: ByteCursor> Decoder<C> {
    pub fn new(cursor: C) -> Self {
        Self::with_config(cursor, DecoderConfig::default())
    }

    pub fn with_config(cursor: C, config: DecoderConfig) -> Self {
        Self {
            cursor,
            handles: HandleTable::new(),
            config,
            depth: 0,
            reset_after_next: false,
        }
    }

    pub fn handles(&self) -> &HandleTable {
        &self.handles
    }

    pub fn is_eof(&self) -> bool {
        self.cursor.is_eof()
    }

    /// Decodes the header and every record up to the end of data.
    pub fn decode_all(self) -> Result<Serialization, SerzError> {
        self.decode_stream(None)
    }

    /// Decodes the header and exactly `count` top-level records.
    pub fn decode_count(self, count: usize) -> Result<Serialization, SerzError> {
        self.decode_stream(Some(count))
    }

    fn decode_stream(mut self, count: Option<usize>) -> Result<Serialization, SerzError> {
        let (magic, version) = self.read_header()?;
        let mut contents = Vec::new();
        match count {
            Some(count) => {
                for _ in 0..count {
                    contents.push(self.decode_content()?);
                }
            }
            None => {
                while !self.cursor.is_eof() {
                    contents.push(self.decode_content()?);
                }
            }
        }
        debug!(
            records = contents.len(),
            handles = self.handles.len(),
            resets = self.handles.resets(),
            "decoded object stream"
        );
        Ok(Serialization {
            magic,
            version,
            contents,
        })
    }

    /// Reads and checks the stream magic and version.
    ///
    /// A wrong magic is fatal. A non-standard version is logged and kept,
    /// unless [`DecoderConfig::strict_version`] is set.
    pub fn read_header(&mut self) -> Result<([u8; 2], [u8; 2]), SerzError> {
        if self.cursor.remaining() < 2 {
            let found = self
                .cursor
                .read_vec(self.cursor.remaining())
                .unwrap_or_default();
            return Err(SerzError::MagicMismatch { found });
        }
        let offset = self.cursor.position();
        let magic: [u8; 2] = self
            .cursor
            .read_array()
            .role(offset, || "reading stream magic".to_owned())?;
        if magic != STREAM_MAGIC {
            return Err(SerzError::MagicMismatch {
                found: magic.to_vec(),
            });
        }
        let offset = self.cursor.position();
        let version: [u8; 2] = self
            .cursor
            .read_array()
            .role(offset, || "reading stream version".to_owned())?;
        if version != STREAM_VERSION {
            if self.config.strict_version {
                return Err(SerzError::VersionMismatch { found: version });
            }
            warn!(
                version = %serz_buffers::print_octets_default(&version),
                "unexpected stream version, continuing"
            );
        }
        Ok((magic, version))
    }

    /// Reads one content record.
    pub fn decode_content(&mut self) -> Result<Content, SerzError> {
        self.read_content(|| "reading content".to_owned())
    }

    fn read_content<F>(&mut self, context: F) -> Result<Content, SerzError>
    where
        F: Fn() -> String,
    {
        let offset = self.cursor.position();
        let tag = self.cursor.u8().role(offset, &context)?;
        self.decode_tagged(tag, offset, &context)
    }

    fn decode_tagged<F>(&mut self, tag: u8, offset: usize, context: F) -> Result<Content, SerzError>
    where
        F: Fn() -> String,
    {
        let reset_after = std::mem::take(&mut self.reset_after_next);
        trace!(offset, tag = tag_name(tag), "content");
        let content = self.nested(|this| this.dispatch(tag, offset, context))?;
        if reset_after {
            self.handles.reset();
        }
        Ok(content)
    }

    fn dispatch<F>(&mut self, tag: u8, offset: usize, context: F) -> Result<Content, SerzError>
    where
        F: Fn() -> String,
    {
        Ok(match tag {
            TC_NULL => Content::Null,
            TC_REFERENCE => Content::Reference(self.read_reference()?),
            TC_CLASSDESC => Content::ClassDesc(self.read_class_desc()?.0),
            TC_PROXYCLASSDESC => Content::ProxyClassDesc(self.read_proxy_class_desc()?.0),
            TC_OBJECT => Content::Object(self.read_object()?),
            TC_STRING => Content::String(self.read_string(StringKind::Short)?),
            TC_LONGSTRING => Content::String(self.read_string(StringKind::Long)?),
            TC_ARRAY => Content::Array(self.read_array()?),
            TC_CLASS => Content::Class(self.read_class()?),
            TC_ENUM => Content::Enum(self.read_enum()?),
            TC_BLOCKDATA => Content::BlockData(self.read_block_data(BlockKind::Short)?),
            TC_BLOCKDATALONG => Content::BlockData(self.read_block_data(BlockKind::Long)?),
            TC_ENDBLOCKDATA => Content::EndBlockData,
            TC_EXCEPTION => {
                self.handles.reset();
                self.reset_after_next = true;
                Content::Exception
            }
            TC_RESET => {
                self.handles.reset();
                Content::Reset
            }
            _ => {
                return Err(SerzError::UnsupportedTag {
                    tag,
                    offset,
                    context: context(),
                })
            }
        })
    }

    /// Runs `read` one nesting level deeper, enforcing the depth limit.
    fn nested<T, R>(&mut self, read: R) -> Result<T, SerzError>
    where
        R: FnOnce(&mut Self) -> Result<T, SerzError>,
    {
        if self.depth >= self.config.max_depth {
            return Err(SerzError::DepthLimitExceeded {
                limit: self.config.max_depth,
            });
        }
        self.depth += 1;
        let result = read(self);
        self.depth -= 1;
        result
    }

    fn unexpected<F>(&self, expected: &'static str, tag: u8, offset: usize, context: F) -> SerzError
    where
        F: Fn() -> String,
    {
        match tag_name(tag) {
            "unknown" => SerzError::UnsupportedTag {
                tag,
                offset,
                context: context(),
            },
            found => SerzError::UnexpectedContent {
                expected,
                found,
                context: context(),
            },
        }
    }

    /// Reads a slot that must hold a class descriptor (new, referenced, or
    /// null) and returns it with its layout index.
    fn read_class_desc_slot<F>(&mut self, context: F) -> Result<(Content, Option<usize>), SerzError>
    where
        F: Fn() -> String,
    {
        let offset = self.cursor.position();
        let tag = self.cursor.u8().role(offset, &context)?;
        match tag {
            TC_NULL => Ok((Content::Null, None)),
            TC_REFERENCE => {
                let reference = self.read_reference()?;
                let entry = self.handles.resolve(reference.handle)?;
                match entry.layout {
                    Some(layout) => Ok((Content::Reference(reference), Some(layout))),
                    None => Err(SerzError::UnexpectedContent {
                        expected: "class descriptor",
                        found: entry.kind.name(),
                        context: context(),
                    }),
                }
            }
            TC_CLASSDESC => {
                let (desc, layout) = self.nested(|this| this.read_class_desc())?;
                Ok((Content::ClassDesc(desc), Some(layout)))
            }
            TC_PROXYCLASSDESC => {
                let (desc, layout) = self.nested(|this| this.read_proxy_class_desc())?;
                Ok((Content::ProxyClassDesc(desc), Some(layout)))
            }
            _ => Err(self.unexpected("class descriptor", tag, offset, context)),
        }
    }

    /// Reads a slot that must hold a string (new, referenced, or null).
    fn read_string_slot<F>(&mut self, context: F) -> Result<Content, SerzError>
    where
        F: Fn() -> String,
    {
        let offset = self.cursor.position();
        let tag = self.cursor.u8().role(offset, &context)?;
        match tag {
            TC_NULL => Ok(Content::Null),
            TC_STRING => Ok(Content::String(self.read_string(StringKind::Short)?)),
            TC_LONGSTRING => Ok(Content::String(self.read_string(StringKind::Long)?)),
            TC_REFERENCE => {
                let reference = self.read_reference()?;
                let entry = self.handles.resolve(reference.handle)?;
                if entry.kind != HandleKind::String {
                    return Err(SerzError::UnexpectedContent {
                        expected: "string",
                        found: entry.kind.name(),
                        context: context(),
                    });
                }
                Ok(Content::Reference(reference))
            }
            _ => Err(self.unexpected("string", tag, offset, context)),
        }
    }

    /// Reads contents up to and including `TC_ENDBLOCKDATA`.
    fn read_annotations<F>(&mut self, what: F) -> Result<Vec<Content>, SerzError>
    where
        F: Fn() -> String,
    {
        let context = || format!("reading {}", what());
        let mut contents = Vec::new();
        loop {
            if self.cursor.is_eof() {
                return Err(SerzError::MissingTerminator { context: what() });
            }
            let offset = self.cursor.position();
            let tag = self.cursor.u8().role(offset, context)?;
            if tag == TC_ENDBLOCKDATA {
                // An exception marker closing the list has no throwable.
                self.reset_after_next = false;
                return Ok(contents);
            }
            contents.push(self.decode_tagged(tag, offset, context)?);
        }
    }

    fn read_reference(&mut self) -> Result<Reference, SerzError> {
        let offset = self.cursor.position();
        let handle = self
            .cursor
            .u32()
            .role(offset, || "reading reference handle".to_owned())?;
        self.handles.resolve(handle)?;
        Ok(Reference { handle })
    }

    fn read_utf<F>(&mut self, context: F) -> Result<JavaUtf, SerzError>
    where
        F: Fn() -> String,
    {
        let offset = self.cursor.position();
        let len = self.cursor.u16().role(offset, &context)? as usize;
        let data = self.cursor.read_vec(len).role(offset, &context)?;
        Ok(JavaUtf::new(data))
    }

    fn read_class_desc(&mut self) -> Result<(ClassDesc, usize), SerzError> {
        let class_name = self.read_utf(|| "reading class name".to_owned())?;
        let name = class_name.to_string_lossy();
        let offset = self.cursor.position();
        let serial_version_uid = self
            .cursor
            .i64()
            .role(offset, || format!("reading serialVersionUID of class {name}"))?;
        let (handle, layout) = self
            .handles
            .assign_class_desc(HandleKind::ClassDesc, ClassLayout::new(name.clone()));
        trace!(handle, class = %name, "class descriptor");

        let offset = self.cursor.position();
        let flags = self
            .cursor
            .u8()
            .role(offset, || format!("reading flags of class {name}"))?;
        let offset = self.cursor.position();
        let count = self
            .cursor
            .i16()
            .role(offset, || format!("reading field count of class {name}"))?;
        let count = to_length(count as i64, || format!("reading field count of class {name}"))?;

        let mut fields = Vec::with_capacity(count.min(self.cursor.remaining()));
        for i in 0..count {
            let offset = self.cursor.position();
            let code = self
                .cursor
                .u8()
                .role(offset, || format!("reading type of field {i} of class {name}"))?;
            let field_type =
                FieldType::from_code(code).ok_or_else(|| SerzError::UnsupportedFieldType {
                    code,
                    context: format!("reading field {i} of class {name}"),
                })?;
            let field_name = self.read_utf(|| format!("reading name of field {i} of class {name}"))?;
            let class_name = if field_type.is_reference() {
                Some(self.read_string_slot(|| {
                    format!("reading type signature of field `{field_name}` of class {name}")
                })?)
            } else {
                None
            };
            fields.push(FieldDesc {
                field_type,
                name: field_name,
                class_name,
            });
        }

        let entry = self.handles.layout_mut(layout);
        entry.flags = flags;
        entry.fields = fields
            .iter()
            .map(|f| (f.field_type, f.name.to_string_lossy()))
            .collect();

        let annotations = self.read_annotations(|| format!("class annotations of {name}"))?;
        let (super_class, super_layout) =
            self.read_class_desc_slot(|| format!("reading super class of {name}"))?;
        self.handles.layout_mut(layout).super_layout = super_layout;

        Ok((
            ClassDesc {
                handle,
                class_name,
                serial_version_uid,
                flags,
                fields,
                annotations,
                super_class: Box::new(super_class),
            },
            layout,
        ))
    }

    fn read_proxy_class_desc(&mut self) -> Result<(ProxyClassDesc, usize), SerzError> {
        let mut layout = ClassLayout::new("<proxy>".to_owned());
        layout.flags = SC_SERIALIZABLE;
        let (handle, layout) = self
            .handles
            .assign_class_desc(HandleKind::ProxyClassDesc, layout);

        let offset = self.cursor.position();
        let count = self
            .cursor
            .i32()
            .role(offset, || "reading proxy interface count".to_owned())?;
        let count = to_length(count as i64, || "reading proxy interface count".to_owned())?;
        let mut interfaces = Vec::with_capacity(count.min(self.cursor.remaining()));
        for i in 0..count {
            interfaces.push(self.read_utf(|| format!("reading proxy interface name {i}"))?);
        }
        let names: Vec<String> = interfaces.iter().map(JavaUtf::to_string_lossy).collect();
        let name = format!("<proxy implementing {}>", names.join(", "));
        self.handles.layout_mut(layout).name = name.clone();
        trace!(handle, class = %name, "proxy class descriptor");

        let annotations = self.read_annotations(|| format!("class annotations of {name}"))?;
        let (super_class, super_layout) =
            self.read_class_desc_slot(|| format!("reading super class of {name}"))?;
        self.handles.layout_mut(layout).super_layout = super_layout;

        Ok((
            ProxyClassDesc {
                handle,
                interfaces,
                annotations,
                super_class: Box::new(super_class),
            },
            layout,
        ))
    }

    fn read_object(&mut self) -> Result<Object, SerzError> {
        let (class_desc, layout) =
            self.read_class_desc_slot(|| "reading object class descriptor".to_owned())?;
        let handle = self.handles.assign(HandleKind::Object);
        let hierarchy = match layout {
            Some(index) => self.handles.hierarchy(index)?,
            None => Vec::new(),
        };
        let mut class_data = Vec::with_capacity(hierarchy.len());
        for index in hierarchy {
            class_data.push(self.read_class_data(index)?);
        }
        Ok(Object {
            handle,
            class_desc: Box::new(class_desc),
            class_data,
        })
    }

    fn read_class_data(&mut self, index: usize) -> Result<ClassData, SerzError> {
        let layout = self.handles.layout(index).clone();
        if layout.is_externalizable() {
            if !layout.has_block_data() {
                return Err(SerzError::UnsupportedExternalContents {
                    class_name: layout.name,
                });
            }
            let annotations =
                self.read_annotations(|| format!("external contents of {}", layout.name))?;
            return Ok(ClassData {
                class_name: layout.name,
                fields: Vec::new(),
                annotations: Some(annotations),
            });
        }

        let mut fields = Vec::with_capacity(layout.fields.len());
        for (i, (field_type, name)) in layout.fields.iter().enumerate() {
            let value = self.read_value(*field_type, || {
                format!("reading field value {i} (`{name}`) of class {}", layout.name)
            })?;
            fields.push(Field {
                name: name.clone(),
                value,
            });
        }
        let annotations = if layout.has_write_method() {
            Some(self.read_annotations(|| format!("object annotation of {}", layout.name))?)
        } else {
            None
        };
        Ok(ClassData {
            class_name: layout.name,
            fields,
            annotations,
        })
    }

    fn read_value<F>(&mut self, field_type: FieldType, context: F) -> Result<FieldValue, SerzError>
    where
        F: Fn() -> String,
    {
        let offset = self.cursor.position();
        Ok(match field_type {
            FieldType::Byte => FieldValue::Byte(self.cursor.i8().role(offset, &context)?),
            FieldType::Char => FieldValue::Char(self.cursor.u16().role(offset, &context)?),
            FieldType::Double => FieldValue::Double(self.cursor.f64().role(offset, &context)?),
            FieldType::Float => FieldValue::Float(self.cursor.f32().role(offset, &context)?),
            FieldType::Int => FieldValue::Int(self.cursor.i32().role(offset, &context)?),
            FieldType::Long => FieldValue::Long(self.cursor.i64().role(offset, &context)?),
            FieldType::Short => FieldValue::Short(self.cursor.i16().role(offset, &context)?),
            FieldType::Boolean => FieldValue::Boolean(self.cursor.u8().role(offset, &context)?),
            FieldType::Object | FieldType::Array => FieldValue::Object(self.read_content(context)?),
        })
    }

    fn read_array(&mut self) -> Result<Array, SerzError> {
        let context = || "reading array class descriptor".to_owned();
        let (class_desc, layout) = self.read_class_desc_slot(context)?;
        let layout = layout.ok_or_else(|| SerzError::UnexpectedContent {
            expected: "class descriptor",
            found: "TC_NULL",
            context: context(),
        })?;
        let handle = self.handles.assign(HandleKind::Array);
        let name = self.handles.layout(layout).name.clone();
        let element_type = name
            .strip_prefix('[')
            .and_then(|rest| rest.bytes().next())
            .and_then(FieldType::from_code)
            .ok_or_else(|| SerzError::InvalidArrayClass {
                class_name: name.clone(),
            })?;

        let offset = self.cursor.position();
        let size = self
            .cursor
            .i32()
            .role(offset, || format!("reading array size of {name}"))?;
        let size = to_length(size as i64, || format!("reading array size of {name}"))?;
        let mut values = Vec::with_capacity(size.min(self.cursor.remaining()));
        for i in 0..size {
            values.push(self.read_value(element_type, || format!("reading array element {i} of {name}"))?);
        }
        Ok(Array {
            handle,
            class_desc: Box::new(class_desc),
            values,
        })
    }

    fn read_class(&mut self) -> Result<Class, SerzError> {
        let (class_desc, _) = self.read_class_desc_slot(|| "reading class descriptor of TC_CLASS".to_owned())?;
        let handle = self.handles.assign(HandleKind::Class);
        Ok(Class {
            handle,
            class_desc: Box::new(class_desc),
        })
    }

    fn read_enum(&mut self) -> Result<Enum, SerzError> {
        let (class_desc, layout) =
            self.read_class_desc_slot(|| "reading enum class descriptor".to_owned())?;
        let handle = self.handles.assign(HandleKind::Enum);
        let name = layout
            .map(|index| self.handles.layout(index).name.clone())
            .unwrap_or_default();
        let constant_name =
            self.read_string_slot(|| format!("reading enum constant name of {name}"))?;
        Ok(Enum {
            handle,
            class_desc: Box::new(class_desc),
            constant_name: Box::new(constant_name),
        })
    }

    fn read_string(&mut self, kind: StringKind) -> Result<JavaString, SerzError> {
        let context = || "reading string".to_owned();
        let offset = self.cursor.position();
        let len = match kind {
            StringKind::Short => self.cursor.u16().role(offset, context)? as usize,
            StringKind::Long => {
                let len = self.cursor.i64().role(offset, context)?;
                to_length(len, context)?
            }
        };
        let data = self.cursor.read_vec(len).role(offset, context)?;
        let handle = self.handles.assign(HandleKind::String);
        Ok(JavaString {
            handle,
            kind,
            value: JavaUtf::new(data),
        })
    }

    fn read_block_data(&mut self, kind: BlockKind) -> Result<BlockData, SerzError> {
        let context = || "reading block data".to_owned();
        let offset = self.cursor.position();
        let len = match kind {
            BlockKind::Short => self.cursor.u8().role(offset, context)? as usize,
            BlockKind::Long => {
                let len = self.cursor.i32().role(offset, context)?;
                to_length(len as i64, context)?
            }
        };
        let data = self.cursor.read_vec(len).role(offset, context)?;
        Ok(BlockData { kind, data })
    }
}

/// Converts a signed wire length, rejecting negative values.
fn to_length<F>(length: i64, context: F) -> Result<usize, SerzError>
where
    F: Fn() -> String,
{
    usize::try_from(length).map_err(|_| SerzError::InvalidLength {
        length,
        context: context(),
    })
}
