use crate::document::{Document, NodeKey, StructureError};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointKind {
    Element,
    Text,
}

/// One endpoint of a selection: a node key, a character offset (text
/// points) or child index (element points), and the kind telling the two
/// apart. Structural operations that delete the referenced node must
/// rewrite the endpoint through [`Point::set`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Point {
    pub key: NodeKey,
    pub offset: usize,
    pub kind: PointKind,
}

impl Point {
    pub fn new(key: NodeKey, offset: usize, kind: PointKind) -> Self {
        Self { key, offset, kind }
    }

    pub fn set(&mut self, key: NodeKey, offset: usize, kind: PointKind) {
        self.key = key;
        self.offset = offset;
        self.kind = kind;
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Selection {
    pub anchor: Point,
    pub focus: Point,
}

impl Selection {
    pub fn new(anchor: Point, focus: Point) -> Self {
        Self { anchor, focus }
    }

    pub fn collapsed(point: Point) -> Self {
        Self {
            anchor: point,
            focus: point,
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }

    /// The nodes covered by this selection, in document order: the single
    /// target node when collapsed, otherwise the leaves between the two
    /// endpoints, inclusive.
    pub fn nodes(&self, doc: &Document) -> Vec<NodeKey> {
        if !doc.contains(self.anchor.key) || !doc.contains(self.focus.key) {
            return Vec::new();
        }
        if self.is_collapsed() {
            return vec![self.anchor.key];
        }

        let leaves = collect_leaves(doc);
        let Some(start) = leaf_position(doc, &leaves, &self.anchor, true) else {
            return vec![self.anchor.key];
        };
        let Some(end) = leaf_position(doc, &leaves, &self.focus, false) else {
            return vec![self.anchor.key];
        };
        let (start, end) = if start <= end { (start, end) } else { (end, start) };
        leaves[start..=end].to_vec()
    }

    /// Splits the anchor block at a collapsed cursor: content after the
    /// cursor moves into a fresh paragraph inserted after the block, and
    /// the selection moves to the start of that paragraph. This is the
    /// generic "insert paragraph at cursor" primitive; list-aware callers
    /// re-home the new block afterwards.
    pub fn insert_paragraph(&mut self, doc: &mut Document) -> Result<Option<NodeKey>, StructureError> {
        if !self.is_collapsed() {
            return Ok(None);
        }

        match self.anchor.kind {
            PointKind::Text => {
                let text_key = self.anchor.key;
                let Some(block) = doc.parent(text_key) else {
                    return Ok(None);
                };
                if !doc.is_paragraph(block) {
                    return Ok(None);
                }
                let Some(content) = doc.text(text_key) else {
                    return Ok(None);
                };

                let char_count = content.chars().count();
                let offset = self.anchor.offset.min(char_count);
                let byte = content
                    .char_indices()
                    .nth(offset)
                    .map(|(index, _)| index)
                    .unwrap_or(content.len());
                let head = content[..byte].to_string();
                let tail = content[byte..].to_string();

                let trailing = doc.next_siblings(text_key);
                let new_block = doc.create_paragraph();
                if let Some(format) = doc.block_format(block) {
                    doc.set_block_format(new_block, format)?;
                }
                if !tail.is_empty() {
                    doc.set_text(text_key, &head)?;
                    let tail_text = doc.create_text(&tail);
                    doc.append(new_block, tail_text)?;
                }
                for sibling in trailing {
                    doc.append(new_block, sibling)?;
                }
                doc.insert_after(block, new_block)?;

                self.move_to_block_start(doc, new_block);
                Ok(Some(new_block))
            }
            PointKind::Element => {
                let block = self.anchor.key;
                if !doc.is_paragraph(block) {
                    return Ok(None);
                }
                let trailing: Vec<NodeKey> = doc.children(block)[self.anchor.offset.min(doc.children(block).len())..].to_vec();
                let new_block = doc.create_paragraph();
                if let Some(format) = doc.block_format(block) {
                    doc.set_block_format(new_block, format)?;
                }
                for child in trailing {
                    doc.append(new_block, child)?;
                }
                doc.insert_after(block, new_block)?;

                self.move_to_block_start(doc, new_block);
                Ok(Some(new_block))
            }
        }
    }

    fn move_to_block_start(&mut self, doc: &Document, block: NodeKey) {
        let point = match doc.first_child(block) {
            Some(first) if doc.is_text(first) => Point::new(first, 0, PointKind::Text),
            _ => Point::new(block, 0, PointKind::Element),
        };
        self.anchor = point;
        self.focus = point;
    }
}

fn collect_leaves(doc: &Document) -> Vec<NodeKey> {
    let mut leaves = Vec::new();
    collect_leaves_below(doc, doc.root(), &mut leaves);
    leaves
}

fn collect_leaves_below(doc: &Document, key: NodeKey, leaves: &mut Vec<NodeKey>) {
    let children = doc.children(key);
    if children.is_empty() {
        if !doc.is_root_or_shadow_root(key) {
            leaves.push(key);
        }
        return;
    }
    for child in children {
        collect_leaves_below(doc, *child, leaves);
    }
}

fn leaf_position(doc: &Document, leaves: &[NodeKey], point: &Point, first: bool) -> Option<usize> {
    let target = match point.kind {
        PointKind::Text => point.key,
        PointKind::Element => doc
            .children(point.key)
            .get(point.offset)
            .copied()
            .unwrap_or(point.key),
    };
    let leaf = edge_leaf(doc, target, first);
    leaves.iter().position(|k| *k == leaf)
}

fn edge_leaf(doc: &Document, key: NodeKey, first: bool) -> NodeKey {
    let mut current = key;
    loop {
        let children = doc.children(current);
        let next = if first {
            children.first().copied()
        } else {
            children.last().copied()
        };
        match next {
            Some(child) => current = child,
            None => return current,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;

    fn paragraph_with_text(doc: &mut Document, text: &str) -> (NodeKey, NodeKey) {
        let block = doc.create_paragraph();
        let text_node = doc.create_text(text);
        doc.append(doc.root(), block).unwrap();
        doc.append(block, text_node).unwrap();
        (block, text_node)
    }

    #[test]
    fn collapsed_selection_covers_its_target_only() {
        let mut doc = Document::new();
        let (_, text) = paragraph_with_text(&mut doc, "one");
        paragraph_with_text(&mut doc, "two");

        let selection = Selection::collapsed(Point::new(text, 1, PointKind::Text));
        assert_eq!(selection.nodes(&doc), vec![text]);
    }

    #[test]
    fn range_selection_covers_leaves_between_endpoints() {
        let mut doc = Document::new();
        let (_, first) = paragraph_with_text(&mut doc, "one");
        let (_, second) = paragraph_with_text(&mut doc, "two");
        let (_, third) = paragraph_with_text(&mut doc, "three");

        let selection = Selection::new(
            Point::new(first, 0, PointKind::Text),
            Point::new(third, 2, PointKind::Text),
        );
        assert_eq!(selection.nodes(&doc), vec![first, second, third]);

        let backwards = Selection::new(
            Point::new(third, 2, PointKind::Text),
            Point::new(first, 0, PointKind::Text),
        );
        assert_eq!(backwards.nodes(&doc), vec![first, second, third]);
    }

    #[test]
    fn insert_paragraph_splits_the_text_at_the_cursor() {
        let mut doc = Document::new();
        let (block, text) = paragraph_with_text(&mut doc, "hello world");

        let mut selection = Selection::collapsed(Point::new(text, 5, PointKind::Text));
        let new_block = selection.insert_paragraph(&mut doc).unwrap().unwrap();

        assert_eq!(doc.text(text), Some("hello"));
        assert_eq!(doc.next_sibling(block), Some(new_block));
        let tail = doc.first_child(new_block).unwrap();
        assert_eq!(doc.text(tail), Some(" world"));
        assert_eq!(selection.anchor, Point::new(tail, 0, PointKind::Text));
        assert!(selection.is_collapsed());
    }

    #[test]
    fn insert_paragraph_at_end_creates_an_empty_block() {
        let mut doc = Document::new();
        let (block, text) = paragraph_with_text(&mut doc, "done");

        let mut selection = Selection::collapsed(Point::new(text, 4, PointKind::Text));
        let new_block = selection.insert_paragraph(&mut doc).unwrap().unwrap();

        assert_eq!(doc.text(text), Some("done"));
        assert!(doc.children(new_block).is_empty());
        assert_eq!(doc.next_sibling(block), Some(new_block));
        assert_eq!(selection.anchor, Point::new(new_block, 0, PointKind::Element));
    }
}
