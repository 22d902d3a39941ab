//! Parse-scoped handle table.
//!
//! Handles are assigned sequentially from [`BASE_WIRE_HANDLE`] in the order
//! nodes are first materialized. The table does not own nodes; it records what
//! kind of node each handle names, and for class descriptors an index into a
//! layout arena so that later objects and arrays can find their field layout
//! through a back-reference.

use serde::Serialize;

use crate::constants::{BASE_WIRE_HANDLE, SC_BLOCK_DATA, SC_EXTERNALIZABLE, SC_WRITE_METHOD};
use crate::content::FieldType;
use crate::error::SerzError;

/// What a handle was assigned to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HandleKind {
    ClassDesc,
    ProxyClassDesc,
    Object,
    String,
    Array,
    Class,
    Enum,
}

impl HandleKind {
    pub fn name(self) -> &'static str {
        match self {
            HandleKind::ClassDesc => "TC_CLASSDESC",
            HandleKind::ProxyClassDesc => "TC_PROXYCLASSDESC",
            HandleKind::Object => "TC_OBJECT",
            HandleKind::String => "TC_STRING",
            HandleKind::Array => "TC_ARRAY",
            HandleKind::Class => "TC_CLASS",
            HandleKind::Enum => "TC_ENUM",
        }
    }
}

/// A handle table slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandleEntry {
    pub kind: HandleKind,
    /// Layout arena index; set for class and proxy class descriptors.
    pub layout: Option<usize>,
}

/// Field layout of one class descriptor, as needed to read class data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassLayout {
    pub name: String,
    pub flags: u8,
    pub fields: Vec<(FieldType, String)>,
    /// Layout of the super class descriptor, if any.
    pub super_layout: Option<usize>,
}

impl ClassLayout {
    pub fn new(name: String) -> Self {
        Self {
            name,
            flags: 0,
            fields: Vec::new(),
            super_layout: None,
        }
    }

    pub fn has_write_method(&self) -> bool {
        self.flags & SC_WRITE_METHOD != 0
    }

    pub fn is_externalizable(&self) -> bool {
        self.flags & SC_EXTERNALIZABLE != 0
    }

    pub fn has_block_data(&self) -> bool {
        self.flags & SC_BLOCK_DATA != 0
    }
}

/// Handle table for a single decode call.
#[derive(Debug, Default)]
pub struct HandleTable {
    entries: Vec<HandleEntry>,
    layouts: Vec<ClassLayout>,
    resets: usize,
}

impl HandleTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle the next assignment will receive.
    pub fn next_handle(&self) -> u32 {
        BASE_WIRE_HANDLE + self.entries.len() as u32
    }

    /// Number of handles assigned since the last reset.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of `TC_RESET`/`TC_EXCEPTION` resets seen so far.
    pub fn resets(&self) -> usize {
        self.resets
    }

    /// Assigns the next handle to a node without a layout.
    pub fn assign(&mut self, kind: HandleKind) -> u32 {
        let handle = self.next_handle();
        self.entries.push(HandleEntry { kind, layout: None });
        handle
    }

    /// Assigns the next handle to a class descriptor and stores its layout.
    ///
    /// The layout can be completed later through [`layout_mut`](Self::layout_mut),
    /// so a descriptor can be referenced from inside its own definition.
    pub fn assign_class_desc(&mut self, kind: HandleKind, layout: ClassLayout) -> (u32, usize) {
        let handle = self.next_handle();
        let index = self.layouts.len();
        self.layouts.push(layout);
        self.entries.push(HandleEntry {
            kind,
            layout: Some(index),
        });
        (handle, index)
    }

    /// Looks up an already assigned handle.
    pub fn resolve(&self, handle: u32) -> Result<HandleEntry, SerzError> {
        handle
            .checked_sub(BASE_WIRE_HANDLE)
            .and_then(|offset| self.entries.get(offset as usize))
            .copied()
            .ok_or(SerzError::UnresolvedHandle { handle })
    }

    pub fn layout(&self, index: usize) -> &ClassLayout {
        &self.layouts[index]
    }

    pub fn layout_mut(&mut self, index: usize) -> &mut ClassLayout {
        &mut self.layouts[index]
    }

    /// Layout indices of a class and its supers, super class first.
    pub fn hierarchy(&self, index: usize) -> Result<Vec<usize>, SerzError> {
        let mut chain = vec![index];
        let mut current = self.layouts[index].super_layout;
        while let Some(next) = current {
            if chain.contains(&next) {
                return Err(SerzError::CyclicHierarchy {
                    class_name: self.layouts[index].name.clone(),
                });
            }
            chain.push(next);
            current = self.layouts[next].super_layout;
        }
        chain.reverse();
        Ok(chain)
    }

    /// Starts a new handle epoch; the next handle is the base again.
    ///
    /// Layouts are kept since nodes decoded before the reset still own them.
    pub fn reset(&mut self) {
        self.entries.clear();
        self.resets += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assigns_sequentially_from_base() {
        let mut table = HandleTable::new();
        assert_eq!(table.assign(HandleKind::String), BASE_WIRE_HANDLE);
        let (handle, layout) =
            table.assign_class_desc(HandleKind::ClassDesc, ClassLayout::new("A".into()));
        assert_eq!(handle, BASE_WIRE_HANDLE + 1);
        assert_eq!(layout, 0);
        assert_eq!(table.next_handle(), BASE_WIRE_HANDLE + 2);
        assert_eq!(
            table.resolve(BASE_WIRE_HANDLE + 1).unwrap(),
            HandleEntry {
                kind: HandleKind::ClassDesc,
                layout: Some(0)
            }
        );
    }

    #[test]
    fn unassigned_handles_do_not_resolve() {
        let mut table = HandleTable::new();
        table.assign(HandleKind::Object);
        assert!(matches!(
            table.resolve(BASE_WIRE_HANDLE + 1),
            Err(SerzError::UnresolvedHandle { handle }) if handle == BASE_WIRE_HANDLE + 1
        ));
        assert!(table.resolve(3).is_err());
    }

    #[test]
    fn reset_restarts_numbering_and_keeps_layouts() {
        let mut table = HandleTable::new();
        let (_, layout) = table.assign_class_desc(HandleKind::ClassDesc, ClassLayout::new("A".into()));
        table.reset();
        assert!(table.is_empty());
        assert_eq!(table.resets(), 1);
        assert_eq!(table.next_handle(), BASE_WIRE_HANDLE);
        assert_eq!(table.layout(layout).name, "A");
    }

    #[test]
    fn hierarchy_is_super_first_and_rejects_cycles() {
        let mut table = HandleTable::new();
        let (_, base) = table.assign_class_desc(HandleKind::ClassDesc, ClassLayout::new("Base".into()));
        let (_, derived) =
            table.assign_class_desc(HandleKind::ClassDesc, ClassLayout::new("Derived".into()));
        table.layout_mut(derived).super_layout = Some(base);
        assert_eq!(table.hierarchy(derived).unwrap(), vec![base, derived]);

        table.layout_mut(base).super_layout = Some(derived);
        assert!(matches!(
            table.hierarchy(derived),
            Err(SerzError::CyclicHierarchy { .. })
        ));
    }
}
