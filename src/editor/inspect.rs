use crate::document::{Document, NodeKey, StructureError};
use crate::selection::Selection;

/// The nearest list item at or above `key`.
pub(crate) fn nearest_list_item(doc: &Document, key: NodeKey) -> Option<NodeKey> {
    let mut current = Some(key);
    while let Some(node) = current {
        if doc.is_list_item(node) {
            return Some(node);
        }
        current = doc.parent(node);
    }
    None
}

/// A list item whose first child is a list encodes one level of
/// indentation and carries no content of its own.
pub(crate) fn is_nested_list_item(doc: &Document, key: NodeKey) -> bool {
    if !doc.is_list_item(key) {
        return false;
    }
    match doc.first_child(key) {
        Some(first) => doc.is_list(first),
        None => false,
    }
}

/// The outermost list enclosing `key`. Fails when `key` is not inside a
/// list at all, or when an item's parent is not a list (a corrupted tree).
pub(crate) fn top_list(doc: &Document, key: NodeKey) -> Result<NodeKey, StructureError> {
    let Some(item) = nearest_list_item(doc, key) else {
        return Err(StructureError::NotAListItem(key));
    };
    let Some(first) = doc.parent(item) else {
        return Err(StructureError::NoParent(item));
    };
    doc.expect_list(first)?;
    let mut list = first;
    loop {
        let Some(parent) = doc.parent(list) else {
            break;
        };
        if !doc.is_list_item(parent) {
            break;
        }
        let Some(outer) = doc.parent(parent) else {
            break;
        };
        if !doc.is_list(outer) {
            break;
        }
        list = outer;
    }
    Ok(list)
}

/// Content items of `list` in document order, flattened through nested
/// lists. Items that only hold a nested list are traversed, not reported.
pub(crate) fn all_list_items(doc: &Document, list: NodeKey) -> Vec<NodeKey> {
    let mut items = Vec::new();
    collect_list_items(doc, list, &mut items);
    items
}

fn collect_list_items(doc: &Document, list: NodeKey, items: &mut Vec<NodeKey>) {
    for child in doc.children(list) {
        if !doc.is_list_item(*child) {
            continue;
        }
        if is_nested_list_item(doc, *child) {
            if let Some(nested) = doc.first_child(*child) {
                collect_list_items(doc, nested, items);
            }
        } else {
            items.push(*child);
        }
    }
}

/// An element block counts as empty when it has no children, or only
/// empty text children.
pub(crate) fn block_is_empty(doc: &Document, key: NodeKey) -> bool {
    if !doc.contains(key) || doc.is_text(key) {
        return false;
    }
    doc.children(key)
        .iter()
        .all(|child| doc.text(*child).map(str::is_empty).unwrap_or(false))
}

/// The "single collapsed cursor in an otherwise-empty block" selection
/// shape that insert/remove treat specially.
pub(crate) fn selecting_empty_block(doc: &Document, anchor: NodeKey, nodes: &[NodeKey]) -> bool {
    if !doc.is_paragraph(anchor) {
        return false;
    }
    nodes.is_empty() || (nodes.len() == 1 && nodes[0] == anchor && block_is_empty(doc, anchor))
}

/// The block the cursor sits in, provided that block lives directly
/// inside a list item. `None` when the selection is outside any list.
pub(crate) fn block_inside_list(doc: &Document, selection: &Selection) -> Option<NodeKey> {
    let anchor = selection.anchor.key;
    if !doc.contains(anchor) {
        return None;
    }
    if doc.is_list_item(anchor) {
        return doc.first_child(anchor);
    }
    let mut node = anchor;
    loop {
        let parent = doc.parent(node)?;
        if doc.is_list_item(parent) {
            return Some(node);
        }
        node = parent;
    }
}

/// Nesting depth of a list item: 0 for an item of a top-level list.
pub(crate) fn item_indent(doc: &Document, item: NodeKey) -> usize {
    let mut list = match doc.parent(item) {
        Some(parent) if doc.is_list(parent) => parent,
        _ => return 0,
    };
    let mut depth = 0;
    loop {
        let Some(parent_item) = doc.parent(list) else {
            break;
        };
        if !doc.is_list_item(parent_item) {
            break;
        }
        let Some(outer) = doc.parent(parent_item) else {
            break;
        };
        if !doc.is_list(outer) {
            break;
        }
        depth += 1;
        list = outer;
    }
    depth
}

/// The ordinal an item should display: the parent list's start plus one
/// for every preceding sibling that holds content. Nested-list-only
/// items consume no ordinal.
pub(crate) fn compute_value(doc: &Document, item: NodeKey) -> Result<usize, StructureError> {
    doc.expect_list_item(item)?;
    let Some(parent) = doc.parent(item) else {
        return Err(StructureError::NoParent(item));
    };
    let list = doc.expect_list(parent)?;
    let mut value = list.start;
    for sibling in doc.children(parent) {
        if *sibling == item {
            break;
        }
        if doc.is_list_item(*sibling) && !is_nested_list_item(doc, *sibling) {
            value += 1;
        }
    }
    Ok(value)
}
