use crate::document::{Document, ListType, NodeKey, StructureError};
use crate::selection::Selection;

mod inspect;
mod structure;

pub use structure::{
    auto_merge_sibling_lists,
    change_item_type,
    create_list_item_with_paragraph,
    merge_lists,
    refresh_item_values,
    split_list,
};

/// The list-editing engine: owns a document and an optional selection and
/// exposes the structural commands a dispatcher binds user gestures to.
///
/// Every command runs as one atomic update. After the update the dirty
/// list set is drained: ordinals are refreshed, and — once the normalizer
/// is registered — adjacent same-type sibling lists are merged, repeating
/// until the document reaches a fixpoint. From a caller's perspective the
/// normalizer is a synchronous post-condition of the command.
pub struct ListEditor {
    document: Document,
    selection: Option<Selection>,
    normalizer_registered: bool,
}

impl ListEditor {
    pub fn new() -> Self {
        Self::with_document(Document::new())
    }

    pub fn with_document(document: Document) -> Self {
        Self {
            document,
            selection: None,
            normalizer_registered: false,
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    pub fn set_selection(&mut self, selection: Option<Selection>) {
        self.selection = selection;
    }

    /// Installs the auto-merge pass as a standing structural transform.
    pub fn register_list_normalizer(&mut self) {
        self.normalizer_registered = true;
    }

    /// The transaction boundary: runs `f` over the document and selection,
    /// then runs the structural transforms over everything the update
    /// left dirty.
    pub fn update<T>(
        &mut self,
        f: impl FnOnce(&mut Document, &mut Option<Selection>) -> Result<T, StructureError>,
    ) -> Result<T, StructureError> {
        let result = f(&mut self.document, &mut self.selection)?;
        self.run_structural_transforms()?;
        Ok(result)
    }

    fn run_structural_transforms(&mut self) -> Result<(), StructureError> {
        loop {
            let dirty = self.document.take_dirty_lists();
            if dirty.is_empty() {
                return Ok(());
            }
            for list in dirty {
                if !self.document.is_attached(list) || !self.document.is_list(list) {
                    continue;
                }
                if self.normalizer_registered {
                    structure::auto_merge_sibling_lists(&mut self.document, list)?;
                }
                // the merge may have folded this list into its neighbour
                if self.document.is_attached(list) {
                    structure::refresh_item_values(&mut self.document, list, None)?;
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------

    /// Converts the selected content into a list of `list_type`, or
    /// changes the type of the list items already under the selection.
    pub fn insert_list(&mut self, list_type: ListType) -> Result<(), StructureError> {
        self.update(|doc, selection| {
            let Some(selection) = selection.as_mut() else {
                return Ok(());
            };
            structure::insert_list(doc, selection, list_type)
        })
    }

    /// Converts the items of every list touched by the selection back
    /// into paragraphs, keeping the selection valid throughout.
    pub fn remove_list(&mut self) -> Result<(), StructureError> {
        self.update(|doc, selection| {
            let Some(selection) = selection.as_mut() else {
                return Ok(());
            };
            structure::remove_list(doc, selection)
        })
    }

    /// Wraps `item` one indentation level deeper. Not handled for the
    /// first item of a list or for items that only hold a nested list.
    pub fn handle_indent(&mut self, item: NodeKey) -> Result<bool, StructureError> {
        self.update(|doc, _| structure::handle_indent(doc, item))
    }

    /// Lifts `item` one indentation level up. Not handled when the item
    /// is not nested.
    pub fn handle_outdent(&mut self, item: NodeKey) -> Result<bool, StructureError> {
        self.update(|doc, _| structure::handle_outdent(doc, item))
    }

    /// Intercepts "insert paragraph" inside the first block of a list
    /// item; falls through (`false`) anywhere else.
    pub fn handle_list_insert_paragraph(&mut self) -> Result<bool, StructureError> {
        self.update(|doc, selection| {
            let Some(selection) = selection.as_mut() else {
                return Ok(false);
            };
            structure::handle_list_insert_paragraph(doc, selection)
        })
    }

    /// Intercepts "delete backward" at the very start of a list item;
    /// falls through (`false`) anywhere else, including the middle items
    /// of a list.
    pub fn handle_delete(&mut self) -> Result<bool, StructureError> {
        self.update(|doc, selection| {
            let Some(selection) = selection.as_mut() else {
                return Ok(false);
            };
            structure::handle_delete(doc, selection)
        })
    }

    /// The distinct list items touched by the current selection, in
    /// document order.
    pub fn nearest_list_items_from_selection(&self) -> Vec<NodeKey> {
        let Some(selection) = self.selection else {
            return Vec::new();
        };
        let mut items = Vec::new();
        for node in selection.nodes(&self.document) {
            if let Some(item) = inspect::nearest_list_item(&self.document, node) {
                if !items.contains(&item) {
                    items.push(item);
                }
            }
        }
        items
    }

    /// Flips the checked state of a checklist item. Returns whether the
    /// state actually changed.
    pub fn set_checked(&mut self, item: NodeKey, checked: bool) -> Result<bool, StructureError> {
        let previous = self
            .document
            .item_checked(item)
            .ok_or(StructureError::NotAListItem(item))?;
        self.document.set_item_checked(item, checked)?;
        Ok(previous != checked)
    }
}

impl Default for ListEditor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "editor_tests.rs"]
mod editor_tests;
