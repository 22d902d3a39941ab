//! Indented text dump of a decoded stream, for debugging.
//!
//! Not part of the round-trip contract. Each nesting level adds one
//! indentation step.

use serz_buffers::{print_octets, print_octets_default};

use crate::constants::flags_name;
use crate::content::*;
use crate::serialization::Serialization;

const INDENT: &str = "  ";

/// Line-oriented writer with an indentation level.
#[derive(Debug, Default)]
pub struct Printer {
    out: String,
    indent: usize,
}

impl Printer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn line(&mut self, text: &str) {
        if !self.out.is_empty() {
            self.out.push('\n');
        }
        for _ in 0..self.indent {
            self.out.push_str(INDENT);
        }
        self.out.push_str(text);
    }

    pub fn increase_indent(&mut self) {
        self.indent += 1;
    }

    pub fn decrease_indent(&mut self) {
        self.indent = self.indent.saturating_sub(1);
    }

    /// Prints `text`, then the output of `body` one level deeper.
    pub fn section<F>(&mut self, text: &str, body: F)
    where
        F: FnOnce(&mut Self),
    {
        self.line(text);
        self.increase_indent();
        body(self);
        self.decrease_indent();
    }

    pub fn finish(self) -> String {
        self.out
    }
}

fn hex_u32(v: u32) -> String {
    print_octets(&v.to_be_bytes(), 4)
}

/// Renders a whole stream.
pub fn print_serialization(ser: &Serialization) -> String {
    let mut p = Printer::new();
    p.line(&format!("@Magic - 0x{}", print_octets(&ser.magic, 2)));
    p.line(&format!("@Version - 0x{}", print_octets(&ser.version, 2)));
    p.section("@Contents", |p| {
        for content in &ser.contents {
            print_content(p, content);
        }
    });
    p.finish()
}

/// Renders one content node and everything below it.
pub fn print_content(p: &mut Printer, content: &Content) {
    let title = format!("{} - 0x{:02x}", content.tag_name(), content.tag());
    match content {
        Content::Null | Content::EndBlockData | Content::Exception | Content::Reset => {
            p.line(&title)
        }
        Content::Reference(r) => p.section(&title, |p| {
            p.line(&format!("@Handler - {} - 0x{}", r.handle, hex_u32(r.handle)));
        }),
        Content::ClassDesc(desc) => p.section(&title, |p| print_class_desc(p, desc)),
        Content::ProxyClassDesc(proxy) => p.section(&title, |p| {
            p.line(&format!("@Handler - {}", proxy.handle));
            p.section(&format!("@InterfaceCount - {}", proxy.interfaces.len()), |p| {
                for (i, name) in proxy.interfaces.iter().enumerate() {
                    p.line(&format!("Index {i} - {name}"));
                }
            });
            print_annotations(p, "[]ClassAnnotations", &proxy.annotations);
            p.section("@SuperClassDesc", |p| print_content(p, &proxy.super_class));
        }),
        Content::Object(object) => p.section(&title, |p| {
            print_content(p, &object.class_desc);
            p.line(&format!("@Handler - {}", object.handle));
            p.section("[]ClassData", |p| {
                for data in &object.class_data {
                    p.section(&format!("@ClassName - {}", data.class_name), |p| {
                        p.section("{}Attributes", |p| {
                            for field in &data.fields {
                                print_named_value(p, &field.name, &field.value);
                            }
                        });
                        if let Some(annotations) = &data.annotations {
                            print_annotations(p, "@ObjectAnnotation", annotations);
                        }
                    });
                }
            });
        }),
        Content::String(s) => p.section(&title, |p| {
            p.line(&format!("@Handler - {}", s.handle));
            p.line(&format!("@Length - {}", s.value.len()));
            p.line(&format!("@Value - {}", s.value));
        }),
        Content::Array(array) => p.section(&title, |p| {
            print_content(p, &array.class_desc);
            p.line(&format!("@Handler - {}", array.handle));
            p.section(&format!("[]Values - {}", array.values.len()), |p| {
                for (i, value) in array.values.iter().enumerate() {
                    print_named_value(p, &format!("Index {i}"), value);
                }
            });
        }),
        Content::Class(class) => p.section(&title, |p| {
            print_content(p, &class.class_desc);
            p.line(&format!("@Handler - {}", class.handle));
        }),
        Content::Enum(e) => p.section(&title, |p| {
            print_content(p, &e.class_desc);
            p.line(&format!("@Handler - {}", e.handle));
            p.section("@EnumConstantName", |p| print_content(p, &e.constant_name));
        }),
        Content::BlockData(block) => p.section(&title, |p| {
            p.line(&format!("@Blockdata - 0x{}", print_octets_default(&block.data)));
        }),
    }
}

fn print_class_desc(p: &mut Printer, desc: &ClassDesc) {
    p.line(&format!("@ClassName - {}", desc.class_name));
    p.line(&format!(
        "@SerialVersionUID - {} - 0x{}",
        desc.serial_version_uid,
        print_octets(&desc.serial_version_uid.to_be_bytes(), 8)
    ));
    p.line(&format!("@Handler - {}", desc.handle));
    p.line(&format!(
        "@ClassDescFlags - {} - 0x{:02x}",
        flags_name(desc.flags),
        desc.flags
    ));
    p.section(&format!("[]Fields - {}", desc.fields.len()), |p| {
        for (i, field) in desc.fields.iter().enumerate() {
            p.section(&format!("Index {i}"), |p| {
                p.line(&format!(
                    "{} - {} - 0x{:02x}",
                    field.field_type.java_name(),
                    field.field_type.code() as char,
                    field.field_type.code()
                ));
                p.line(&format!("@FieldName - {}", field.name));
                if let Some(class_name) = &field.class_name {
                    p.section("@ClassName", |p| print_content(p, class_name));
                }
            });
        }
    });
    print_annotations(p, "[]ClassAnnotations", &desc.annotations);
    p.section("@SuperClassDesc", |p| print_content(p, &desc.super_class));
}

fn print_annotations(p: &mut Printer, title: &str, annotations: &[Content]) {
    p.section(title, |p| {
        for content in annotations {
            print_content(p, content);
        }
        p.line("TC_ENDBLOCKDATA - 0x78");
    });
}

fn print_named_value(p: &mut Printer, name: &str, value: &FieldValue) {
    let scalar = match value {
        FieldValue::Byte(v) => format!("(byte){v}"),
        FieldValue::Char(v) => match char::from_u32(*v as u32) {
            Some(ch) if !ch.is_control() => format!("(char){ch:?}"),
            _ => format!("(char)0x{v:04x}"),
        },
        FieldValue::Double(v) => format!("(double){v}"),
        FieldValue::Float(v) => format!("(float){v}"),
        FieldValue::Int(v) => format!("(integer){v}"),
        FieldValue::Long(v) => format!("(long){v}"),
        FieldValue::Short(v) => format!("(short){v}"),
        FieldValue::Boolean(v) => format!("(boolean){}", *v != 0),
        FieldValue::Object(content) => {
            p.section(name, |p| print_content(p, content));
            return;
        }
    };
    p.line(&format!("{name} - {scalar}"));
}
