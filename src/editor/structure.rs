use std::collections::HashSet;

use tracing::{debug, trace};

use crate::document::{Document, ListType, NodeKey, StructureError};
use crate::selection::{PointKind, Selection};

use super::inspect::{
    all_list_items,
    block_inside_list,
    block_is_empty,
    compute_value,
    is_nested_list_item,
    item_indent,
    nearest_list_item,
    selecting_empty_block,
    top_list,
};

// ============================================================================
// Ordinal maintenance
// ============================================================================

/// Recomputes the displayed ordinal of the given items (all children of
/// `list` by default) and writes it back only where it changed.
pub fn refresh_item_values(
    doc: &mut Document,
    list: NodeKey,
    items: Option<&[NodeKey]>,
) -> Result<(), StructureError> {
    let children: Vec<NodeKey> = match items {
        Some(items) => items.to_vec(),
        None => doc.children(list).to_vec(),
    };
    for child in children {
        if !doc.is_list_item(child) {
            continue;
        }
        let next = compute_value(doc, child)?;
        if doc.item_value(child) != Some(next) {
            doc.set_item_value(child, next)?;
        }
    }
    Ok(())
}

// ============================================================================
// Split and type conversion primitives
// ============================================================================

/// Moves every sibling after `item` into a fresh list of the same type,
/// inserted right after `list`. Returns the new list, or `None` when the
/// item has no trailing siblings and nothing changed.
pub fn split_list(
    doc: &mut Document,
    list: NodeKey,
    item: NodeKey,
) -> Result<Option<NodeKey>, StructureError> {
    if doc.parent(item) != Some(list) {
        return Err(StructureError::DetachedItem { list, item });
    }
    let trailing = doc.next_siblings(item);
    if trailing.is_empty() {
        return Ok(None);
    }
    let list_type = doc.expect_list(list)?.list_type;
    let new_list = doc.create_list(list_type);
    doc.insert_after(list, new_list)?;
    for sibling in trailing {
        doc.append(new_list, sibling)?;
    }
    Ok(Some(new_list))
}

/// Extracts `item` into a fresh list of `list_type` next to its current
/// list, splitting the list first when the item sits in the middle. The
/// old list is dropped once it runs out of items.
pub fn change_item_type(
    doc: &mut Document,
    item: NodeKey,
    list_type: ListType,
) -> Result<(), StructureError> {
    let Some(list) = doc.parent(item) else {
        return Err(StructureError::NoParent(item));
    };
    doc.expect_list(list)?;

    let new_list = doc.create_list(list_type);
    if doc.first_child(list) == Some(item) {
        doc.insert_before(list, new_list)?;
    } else {
        if doc.last_child(list) != Some(item) {
            split_list(doc, list, item)?;
        }
        doc.insert_after(list, new_list)?;
    }
    doc.append(new_list, item)?;

    if doc.children(list).is_empty() {
        doc.remove(list)?;
    }
    Ok(())
}

// ============================================================================
// Normalization (auto-merge)
// ============================================================================

/// Appends `right`'s children onto `left` and drops `right`. When both
/// boundary items only hold nested lists, those lists are merged first so
/// a shared indent level does not end up duplicated.
pub fn merge_lists(doc: &mut Document, left: NodeKey, right: NodeKey) -> Result<(), StructureError> {
    let left_tail = doc.last_child(left);
    let right_head = doc.first_child(right);

    if let (Some(tail), Some(head)) = (left_tail, right_head) {
        if is_nested_list_item(doc, tail) && is_nested_list_item(doc, head) {
            if let (Some(tail_list), Some(head_list)) = (doc.first_child(tail), doc.first_child(head)) {
                merge_lists(doc, tail_list, head_list)?;
                doc.remove(head)?;
            }
        }
    }

    let to_merge = doc.children(right).to_vec();
    if !to_merge.is_empty() {
        for child in to_merge {
            doc.append(left, child)?;
        }
        refresh_item_values(doc, left, None)?;
    }

    doc.remove(right)?;
    Ok(())
}

/// The standing list transform: absorbs same-type sibling lists into this
/// one, left absorbing right. Idempotent, so re-running after a merge is
/// a no-op.
pub fn auto_merge_sibling_lists(doc: &mut Document, list: NodeKey) -> Result<(), StructureError> {
    let mut list = list;
    let Some(list_type) = doc.list(list).map(|l| l.list_type) else {
        return Ok(());
    };

    if let Some(prev) = doc.prev_sibling(list) {
        if doc.list(prev).map(|l| l.list_type) == Some(list_type) {
            trace!(?prev, ?list, "merging list into previous sibling");
            merge_lists(doc, prev, list)?;
            list = prev;
        }
    }
    // re-derive the neighbour; the merge above may have changed it
    if let Some(next) = doc.next_sibling(list) {
        if doc.list(next).map(|l| l.list_type) == Some(list_type) {
            trace!(?list, ?next, "merging next sibling into list");
            merge_lists(doc, list, next)?;
        }
    }
    Ok(())
}

// ============================================================================
// Insert / remove list orchestrators
// ============================================================================

/// A fresh item with an empty paragraph, the default content shape of a
/// newly created list entry.
pub fn create_list_item_with_paragraph(
    doc: &mut Document,
) -> Result<(NodeKey, NodeKey), StructureError> {
    let item = doc.create_list_item();
    let block = doc.create_paragraph();
    doc.append(item, block)?;
    Ok((item, block))
}

pub(crate) fn insert_list(
    doc: &mut Document,
    selection: &mut Selection,
    list_type: ListType,
) -> Result<(), StructureError> {
    let anchor_node = selection.anchor.key;
    if !doc.contains(anchor_node) {
        return Ok(());
    }
    let nodes = selection.nodes(doc);
    debug!(?list_type, nodes = nodes.len(), "insert list");

    if selecting_empty_block(doc, anchor_node, &nodes) {
        let Some(anchor_parent) = doc.parent(anchor_node) else {
            return Ok(());
        };
        if doc.is_root_or_shadow_root(anchor_parent) {
            // replace the empty block with a single-item list, keeping
            // the block's display attributes on the new item
            let format = doc.block_format(anchor_node).unwrap_or_default();
            let list = doc.create_list(list_type);
            let (item, block) = create_list_item_with_paragraph(doc)?;
            doc.set_block_format(item, format)?;
            doc.replace(anchor_node, list)?;
            doc.append(list, item)?;
            selection.anchor.set(block, 0, PointKind::Element);
            selection.focus.set(block, 0, PointKind::Element);
        } else if doc.is_list_item(anchor_parent) {
            change_item_type(doc, anchor_parent, list_type)?;
        }
        return Ok(());
    }

    let mut handled: HashSet<NodeKey> = HashSet::new();
    for node in nodes {
        if !doc.contains(node) {
            // an earlier conversion restructured this part of the tree
            continue;
        }

        if !doc.is_text(node) && block_is_empty(doc, node) && !handled.contains(&node) {
            if let Some(item) = nearest_list_item(doc, node) {
                change_item_type(doc, item, list_type)?;
            }
            continue;
        }

        if doc.is_text(node) {
            let mut parent = doc.parent(node);
            while let Some(current) = parent {
                if doc.is_list_item(current) {
                    if handled.insert(current) {
                        change_item_type(doc, current, list_type)?;
                    }
                    break;
                }
                let next = doc.parent(current);
                let at_boundary = next
                    .map(|key| doc.is_root_or_shadow_root(key))
                    .unwrap_or(false);
                if at_boundary && handled.insert(current) {
                    // wrap the topmost block in a fresh list + item pair
                    let list = doc.create_list(list_type);
                    let item = doc.create_list_item();
                    doc.insert_before(current, list)?;
                    doc.append(item, current)?;
                    doc.append(list, item)?;
                    break;
                }
                parent = next;
            }
        }
    }
    Ok(())
}

pub(crate) fn remove_list(doc: &mut Document, selection: &mut Selection) -> Result<(), StructureError> {
    let anchor_node = selection.anchor.key;
    if !doc.contains(anchor_node) {
        return Ok(());
    }
    let nodes = selection.nodes(doc);

    let mut lists: Vec<NodeKey> = Vec::new();
    if selecting_empty_block(doc, anchor_node, &nodes) {
        if nearest_list_item(doc, anchor_node).is_some() {
            let top = top_list(doc, anchor_node)?;
            if !lists.contains(&top) {
                lists.push(top);
            }
        }
    } else {
        for node in nodes {
            if !doc.is_text(node) {
                continue;
            }
            if nearest_list_item(doc, node).is_some() {
                let top = top_list(doc, node)?;
                if !lists.contains(&top) {
                    lists.push(top);
                }
            }
        }
    }
    debug!(lists = lists.len(), "remove list");

    for list in lists {
        let mut insertion_point = list;
        for item in all_list_items(doc, list) {
            let paragraph = doc.create_paragraph();
            if let Some(format) = doc.block_format(item) {
                doc.set_block_format(paragraph, format)?;
            }
            move_item_content(doc, item, paragraph)?;
            doc.insert_after(insertion_point, paragraph)?;
            insertion_point = paragraph;

            // an endpoint on the item (or on an emptied block still inside
            // it) would dangle once the item goes away; re-home it onto
            // the replacement paragraph
            if selection.anchor.key == item || doc.is_ancestor(item, selection.anchor.key) {
                selection.anchor.set(paragraph, 0, PointKind::Element);
            }
            if selection.focus.key == item || doc.is_ancestor(item, selection.focus.key) {
                selection.focus.set(paragraph, 0, PointKind::Element);
            }

            doc.remove(item)?;
        }
        doc.remove(list)?;
    }
    Ok(())
}

/// Moves an item's inline content into `target`, flattening the item's
/// block children so each removed item yields exactly one paragraph.
fn move_item_content(doc: &mut Document, item: NodeKey, target: NodeKey) -> Result<(), StructureError> {
    for child in doc.children(item).to_vec() {
        if doc.is_text(child) {
            doc.append(target, child)?;
            continue;
        }
        for inline in doc.children(child).to_vec() {
            doc.append(target, inline)?;
        }
    }
    Ok(())
}

// ============================================================================
// Indent / outdent
// ============================================================================

pub(crate) fn handle_indent(doc: &mut Document, item: NodeKey) -> Result<bool, StructureError> {
    doc.expect_list_item(item)?;
    if is_nested_list_item(doc, item) {
        return Ok(false);
    }
    let Some(parent) = doc.parent(item) else {
        return Ok(false);
    };
    if !doc.is_list(parent) {
        return Ok(false);
    }
    // the first item has no preceding sibling to attach under
    if doc.first_child(parent) == Some(item) {
        return Ok(false);
    }
    let Some(prev) = doc.prev_sibling(item) else {
        return Ok(false);
    };
    doc.expect_list_item(prev)?;

    if is_nested_list_item(doc, prev) {
        let Some(nested) = doc.first_child(prev) else {
            return Ok(false);
        };
        doc.append(nested, item)?;
        refresh_item_values(doc, nested, None)?;
        return Ok(true);
    }

    let list_type = doc.expect_list(parent)?.list_type;
    let wrapper = doc.create_list_item();
    let new_list = doc.create_list(list_type);
    doc.insert_after(prev, wrapper)?;
    doc.append(wrapper, new_list)?;
    doc.append(new_list, item)?;
    refresh_item_values(doc, new_list, None)?;
    Ok(true)
}

pub(crate) fn handle_outdent(doc: &mut Document, item: NodeKey) -> Result<bool, StructureError> {
    doc.expect_list_item(item)?;
    // the item is nested when a list-item -> list chain sits above it
    let Some(parent_list) = doc.parent(item) else {
        return Ok(false);
    };
    if !doc.is_list(parent_list) {
        return Ok(false);
    }
    let Some(grand_item) = doc.parent(parent_list) else {
        return Ok(false);
    };
    if !doc.is_list_item(grand_item) {
        return Ok(false);
    }
    let Some(great_list) = doc.parent(grand_item) else {
        return Ok(false);
    };
    if !doc.is_list(great_list) {
        return Ok(false);
    }

    if doc.first_child(parent_list) == Some(item) {
        doc.insert_after(grand_item, item)?;
        if doc.children(parent_list).is_empty() {
            doc.remove(parent_list)?;
        } else {
            // the remaining deeper nesting moves along under the item
            doc.append(item, parent_list)?;
        }
    } else if doc.last_child(parent_list) == Some(item) {
        doc.insert_after(grand_item, item)?;
        if doc.children(parent_list).is_empty() {
            doc.remove(parent_list)?;
        }
    } else {
        if let Some(trailing) = split_list(doc, parent_list, item)? {
            doc.append(item, trailing)?;
        }
        doc.insert_after(grand_item, item)?;
    }

    // an emptied wrapper item would linger as an orphaned container
    if doc.children(grand_item).is_empty() {
        doc.remove(grand_item)?;
    }
    if doc.contains(parent_list) {
        refresh_item_values(doc, parent_list, None)?;
    }
    refresh_item_values(doc, great_list, None)?;
    Ok(true)
}

// ============================================================================
// Boundary handlers
// ============================================================================

/// Maps "insert paragraph" inside the first block of a list item onto a
/// structural edit: drop out of the list when the block is empty, split
/// into a new sibling item otherwise.
pub(crate) fn handle_list_insert_paragraph(
    doc: &mut Document,
    selection: &mut Selection,
) -> Result<bool, StructureError> {
    let Some(block) = block_inside_list(doc, selection) else {
        return Ok(false);
    };
    let Some(item) = nearest_list_item(doc, block) else {
        return Ok(false);
    };
    if doc.first_child(item) != Some(block) {
        return Ok(false);
    }

    if block_is_empty(doc, block) {
        if item_indent(doc, item) == 0 {
            handle_delete(doc, selection)?;
        } else {
            handle_outdent(doc, item)?;
        }
        return Ok(true);
    }

    let Some(new_block) = selection.insert_paragraph(doc)? else {
        return Err(StructureError::MissingSplitBlock);
    };
    let new_item = doc.create_list_item();
    if let Some(format) = doc.block_format(item) {
        doc.set_block_format(new_item, format)?;
    }
    doc.insert_after(item, new_item)?;
    doc.append(new_item, new_block)?;
    Ok(true)
}

/// Maps "delete backward at the start of a list item" onto a structural
/// edit. Only the first and last items of a list can be deleted out of it
/// this way; the middle case is left to default editing on purpose.
pub(crate) fn handle_delete(doc: &mut Document, selection: &mut Selection) -> Result<bool, StructureError> {
    if !selection.is_collapsed() {
        return Ok(false);
    }
    let Some(block) = block_inside_list(doc, selection) else {
        return Ok(false);
    };
    if selection.anchor.offset != 0 {
        return Ok(false);
    }
    let Some(item) = nearest_list_item(doc, block) else {
        return Ok(false);
    };
    if doc.first_child(item) != Some(block) {
        return Ok(false);
    }
    let Some(list) = doc.parent(item) else {
        return Ok(false);
    };
    if !doc.is_list(list) {
        return Ok(false);
    }

    if doc.first_child(list) == Some(item) {
        doc.insert_before(list, block)?;
        doc.remove(item)?;
        if doc.children(list).is_empty() {
            doc.remove(list)?;
        }
    } else if doc.last_child(list) == Some(item) {
        split_list(doc, list, item)?;
        doc.insert_after(list, block)?;
        doc.remove(item)?;
    } else {
        return Ok(false);
    }
    Ok(true)
}
