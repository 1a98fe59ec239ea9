//! A list-structure editing engine for tree-shaped rich text documents.
//!
//! The engine keeps ordered, unordered and checklist structures embedded
//! in a document tree consistent while user-level commands restructure
//! them: creating and removing lists, indenting and outdenting items,
//! splitting items on paragraph insertion and merging adjacent compatible
//! lists. The document tree itself is an arena of nodes addressed by key;
//! the selection tracks two points into that arena and is repaired
//! whenever a structural edit deletes a node it references.

pub mod document;
pub mod editor;
pub mod selection;

pub use document::{
    Alignment, BlockFormat, Document, ListNode, ListItemNode, ListType, Node, NodeKey,
    ParagraphNode, StructureError, TextNode,
};
pub use editor::ListEditor;
pub use selection::{Point, PointKind, Selection};
