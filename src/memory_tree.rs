use egui::{Rect, Vec2};

use crate::arena::Arena;
use crate::node::{Bitmap, DragNodeAttrs, NodeId, NodeKind, NodeTree, RenderProps};

#[derive(Debug)]
struct Entry {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    frame: Rect,
    render: RenderProps,
    attrs: DragNodeAttrs,
    inspector_id: Option<String>,
    dirty: bool,
    snapshot_disabled: bool,
}

impl Entry {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            parent: None,
            children: Vec::new(),
            frame: Rect::NOTHING,
            render: RenderProps::default(),
            attrs: DragNodeAttrs::default(),
            inspector_id: None,
            dirty: true,
            snapshot_disabled: false,
        }
    }
}

/// An in-memory [`NodeTree`]: a host without a real retained tree can drive the drag pipeline
/// with it, and it is the fake the test-suite runs against.
#[derive(Debug)]
pub struct MemoryTree {
    nodes: Arena<Entry>,
    root: NodeId,
    inspector_ids: ahash::HashMap<String, NodeId>,
    window_offset: Vec2,
    next_snapshot_id: u64,
}

impl MemoryTree {
    /// A tree with a single root covering `root_rect`.
    pub fn new(root_rect: Rect) -> Self {
        let mut nodes = Arena::default();
        let mut root_entry = Entry::new(NodeKind::Root);
        root_entry.frame = root_rect;
        root_entry.render.size = root_rect.size();
        let root = NodeId(nodes.insert(root_entry));
        Self {
            nodes,
            root,
            inspector_ids: ahash::HashMap::default(),
            window_offset: Vec2::ZERO,
            next_snapshot_id: 1,
        }
    }

    /// Creates a node of `kind` laid out at `frame` and mounts it under `parent`.
    pub fn add_child(&mut self, parent: NodeId, kind: NodeKind, frame: Rect) -> NodeId {
        let node = self.create_node(kind);
        self.set_frame_rect(node, frame);
        self.mount(parent, node);
        node
    }

    pub fn set_frame_rect(&mut self, node: NodeId, frame: Rect) {
        if let Some(entry) = self.nodes.get_mut(node.0) {
            entry.frame = frame;
            entry.render.size = frame.size();
        }
    }

    pub fn set_inspector_id(&mut self, node: NodeId, inspector_id: impl Into<String>) {
        let inspector_id = inspector_id.into();
        let Some(entry) = self.nodes.get_mut(node.0) else {
            return;
        };
        if let Some(old) = entry.inspector_id.replace(inspector_id.clone()) {
            self.inspector_ids.remove(&old);
        }
        self.inspector_ids.insert(inspector_id, node);
    }

    /// Makes [`NodeTree::snapshot`] fail for `node`, like an unrendered or offscreen node.
    pub fn disable_snapshot(&mut self, node: NodeId) {
        if let Some(entry) = self.nodes.get_mut(node.0) {
            entry.snapshot_disabled = true;
        }
    }

    pub fn set_window_offset(&mut self, offset: Vec2) {
        self.window_offset = offset;
    }

    pub fn is_dirty(&self, node: NodeId) -> bool {
        self.nodes.get(node.0).is_some_and(|entry| entry.dirty)
    }

    pub fn clear_dirty(&mut self) {
        let root = self.root;
        let mut stack = vec![root];
        while let Some(node) = stack.pop() {
            if let Some(entry) = self.nodes.get_mut(node.0) {
                entry.dirty = false;
                stack.extend(entry.children.iter().copied());
            }
        }
    }

    /// Number of live nodes, attached or not.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 0
    }

    fn detach(&mut self, node: NodeId) {
        let Some(parent) = self.nodes.get_mut(node.0).and_then(|entry| entry.parent.take()) else {
            return;
        };
        if let Some(parent_entry) = self.nodes.get_mut(parent.0) {
            parent_entry.children.retain(|child| *child != node);
            parent_entry.dirty = true;
        }
    }
}

impl NodeTree for MemoryTree {
    fn root(&self) -> NodeId {
        self.root
    }

    fn create_node(&mut self, kind: NodeKind) -> NodeId {
        NodeId(self.nodes.insert(Entry::new(kind)))
    }

    fn remove_node(&mut self, node: NodeId) -> bool {
        if node == self.root || !self.nodes.contains(node.0) {
            return false;
        }
        self.detach(node);

        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            if let Some(entry) = self.nodes.remove(current.0) {
                if let Some(inspector_id) = entry.inspector_id {
                    self.inspector_ids.remove(&inspector_id);
                }
                stack.extend(entry.children);
            }
        }
        true
    }

    fn contains(&self, node: NodeId) -> bool {
        self.nodes.contains(node.0)
    }

    fn kind(&self, node: NodeId) -> Option<NodeKind> {
        self.nodes.get(node.0).map(|entry| entry.kind)
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(node.0)?.parent
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.nodes
            .get(node.0)
            .map(|entry| entry.children.clone())
            .unwrap_or_default()
    }

    fn mount(&mut self, parent: NodeId, child: NodeId) -> bool {
        if parent == child || !self.nodes.contains(parent.0) {
            return false;
        }
        match self.nodes.get(child.0) {
            Some(entry) if entry.parent.is_none() && child != self.root => {}
            _ => return false,
        }
        if let Some(parent_entry) = self.nodes.get_mut(parent.0) {
            parent_entry.children.push(child);
            parent_entry.dirty = true;
        }
        if let Some(entry) = self.nodes.get_mut(child.0) {
            entry.parent = Some(parent);
            entry.dirty = true;
        }
        true
    }

    fn unmount(&mut self, node: NodeId) -> bool {
        if self.parent(node).is_none() {
            return false;
        }
        self.detach(node);
        true
    }

    fn mark_dirty(&mut self, node: NodeId) {
        if let Some(entry) = self.nodes.get_mut(node.0) {
            entry.dirty = true;
        }
    }

    fn frame_rect(&self, node: NodeId) -> Option<Rect> {
        let entry = self.nodes.get(node.0)?;
        entry.render.placed_rect().or(Some(entry.frame))
    }

    fn render(&self, node: NodeId) -> Option<&RenderProps> {
        self.nodes.get(node.0).map(|entry| &entry.render)
    }

    fn render_mut(&mut self, node: NodeId) -> Option<&mut RenderProps> {
        self.nodes.get_mut(node.0).map(|entry| &mut entry.render)
    }

    fn drag_attrs(&self, node: NodeId) -> Option<&DragNodeAttrs> {
        self.nodes.get(node.0).map(|entry| &entry.attrs)
    }

    fn drag_attrs_mut(&mut self, node: NodeId) -> Option<&mut DragNodeAttrs> {
        self.nodes.get_mut(node.0).map(|entry| &mut entry.attrs)
    }

    fn find_by_inspector_id(&self, inspector_id: &str) -> Option<NodeId> {
        self.inspector_ids
            .get(inspector_id)
            .copied()
            .filter(|node| self.nodes.contains(node.0))
    }

    fn visible_selected_items(&self, container: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(container).into_iter().rev().collect();
        while let Some(node) = stack.pop() {
            let Some(entry) = self.nodes.get(node.0) else {
                continue;
            };
            if !entry.render.visible {
                continue;
            }
            if entry.kind.is_selectable_item() {
                if entry.attrs.selected {
                    out.push(node);
                }
                continue;
            }
            stack.extend(entry.children.iter().rev().copied());
        }
        out
    }

    fn snapshot(&mut self, node: NodeId) -> Option<Bitmap> {
        let entry = self.nodes.get(node.0)?;
        if entry.snapshot_disabled || !entry.render.visible {
            return None;
        }
        let size = entry.frame.size();
        if !(size.x > 0.0 && size.y > 0.0) {
            return None;
        }
        let id = self.next_snapshot_id;
        self.next_snapshot_id += 1;
        Some(Bitmap::new(id, size))
    }

    fn window_offset(&self) -> Vec2 {
        self.window_offset
    }
}
