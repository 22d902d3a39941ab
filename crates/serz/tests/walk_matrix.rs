//! Tree walker order, coverage and rewrites, plus handle numbering as seen
//! through the walker.

mod common;

use common::{handle, StreamBuilder};
use serz::constants::*;
use serz::{Content, FieldValue, Serialization};

fn nested_stream() -> Vec<u8> {
    // Holder { String name; Object[] items } with items = [name, null].
    StreamBuilder::new()
        .u8(TC_OBJECT)
        .class_desc("Holder", 1, SC_SERIALIZABLE, 2)
        .object_field("items", "[Ljava/lang/Object;")
        .object_field("name", "Ljava/lang/String;")
        .end()
        .null()
        // items
        .u8(TC_ARRAY)
        .class_desc("[Ljava.lang.Object;", 2, SC_SERIALIZABLE, 0)
        .end()
        .null()
        .i32(2)
        .string("n")
        .null()
        // name
        .reference(handle(6))
        .build()
}

#[test]
fn pre_order_in_record_order() {
    let ser = Serialization::from_bytes(&nested_stream()).unwrap();
    let mut seen = Vec::new();
    ser.walk(|c| -> Result<(), ()> {
        seen.push((c.tag(), c.handle()));
        Ok(())
    })
    .unwrap();
    assert_eq!(
        seen,
        vec![
            (TC_OBJECT, Some(handle(3))),
            (TC_CLASSDESC, Some(handle(0))),
            (TC_STRING, Some(handle(1))),
            (TC_STRING, Some(handle(2))),
            (TC_NULL, None),
            (TC_ARRAY, Some(handle(5))),
            (TC_CLASSDESC, Some(handle(4))),
            (TC_NULL, None),
            (TC_STRING, Some(handle(6))),
            (TC_NULL, None),
            (TC_REFERENCE, None),
        ]
    );
}

#[test]
fn every_handle_is_visited_once() {
    let ser = Serialization::from_bytes(&nested_stream()).unwrap();
    let mut handles = Vec::new();
    ser.walk(|c| -> Result<(), ()> {
        handles.extend(c.handle());
        Ok(())
    })
    .unwrap();
    handles.sort_unstable();
    let expected: Vec<u32> = (0..7).map(handle).collect();
    assert_eq!(handles, expected);
}

#[test]
fn find_by_handle_skips_references() {
    let ser = Serialization::from_bytes(&nested_stream()).unwrap();
    assert_eq!(ser.find_by_handle(handle(5)).map(Content::tag), Some(TC_ARRAY));
    assert_eq!(
        ser.find_by_handle(handle(6))
            .and_then(Content::as_string)
            .map(|s| s.to_string_lossy()),
        Some("n".to_owned())
    );
    assert!(ser.find_by_handle(handle(7)).is_none());
}

#[test]
fn walk_error_is_returned() {
    let ser = Serialization::from_bytes(&nested_stream()).unwrap();
    let mut visited = 0;
    let result = ser.walk(|c| {
        visited += 1;
        match c.tag() {
            TC_ARRAY => Err(c.handle()),
            _ => Ok(()),
        }
    });
    assert_eq!(result, Err(Some(handle(5))));
    assert_eq!(visited, 6);
}

#[test]
fn rewrites_re_encode() {
    let mut ser = Serialization::from_bytes(&nested_stream()).unwrap();
    ser.walk_mut(|c| -> Result<(), ()> {
        if let Some(s) = c.as_string_mut() {
            if s.to_string_lossy() == "n" {
                s.set_value("renamed");
            }
        }
        Ok(())
    })
    .unwrap();

    let again = Serialization::from_bytes(&ser.to_bytes()).unwrap();
    assert_eq!(again, ser);
    let name = again
        .find_by_handle(handle(6))
        .and_then(Content::as_string)
        .unwrap();
    assert_eq!(name.to_string_lossy(), "renamed");
}

#[test]
fn field_rewrite_through_object() {
    let data = StreamBuilder::new()
        .u8(TC_OBJECT)
        .class_desc("Counter", 1, SC_SERIALIZABLE, 1)
        .prim_field(b'I', "count")
        .end()
        .null()
        .i32(1)
        .build();
    let mut ser = Serialization::from_bytes(&data).unwrap();
    ser.walk_mut(|c| -> Result<(), ()> {
        if let Some(FieldValue::Int(v)) = c.as_object_mut().and_then(|o| o.field_mut("count")) {
            *v = 0x0102_0304;
        }
        Ok(())
    })
    .unwrap();
    let out = ser.to_bytes();
    assert_eq!(&out[out.len() - 4..], &[1, 2, 3, 4]);
}
