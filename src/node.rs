use egui::{Color32, CornerRadius, Pos2, Rect, Shadow, Vec2};

use crate::arena::Key;
use crate::preview_option::DragPreviewOption;

/// Generational handle to a node of a [`NodeTree`].
///
/// Handles are never dereferenced directly: every use goes through a fallible tree lookup, so a
/// node that was destroyed between a gesture callback and a posted task simply stops resolving.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) Key);

impl NodeId {
    pub const fn from_parts(index: u32, generation: u32) -> Self {
        Self(Key { index, generation })
    }

    pub fn index(self) -> u32 {
        self.0.index
    }

    pub fn generation(self) -> u32 {
        self.0.generation
    }
}

/// What a node is, as far as drag staging cares.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Root,
    Generic,
    Column,
    Stack,
    Image,
    Text,
    Grid,
    GridItem,
    List,
    ListItem,

    /// Embedded web content. Only the backdrop policy looks at this.
    Web,
}

impl NodeKind {
    /// The container kind an item kind lives in.
    pub fn item_container(self) -> Option<Self> {
        match self {
            Self::GridItem => Some(Self::Grid),
            Self::ListItem => Some(Self::List),
            _ => None,
        }
    }

    pub fn is_selectable_item(self) -> bool {
        self.item_container().is_some()
    }
}

/// A captured raster image of a node (or a scaled copy of one).
#[derive(Clone, Debug, PartialEq)]
pub struct Bitmap {
    /// Opaque identity of the capture, so tests and hosts can tell snapshots apart.
    pub id: u64,
    pub width: f32,
    pub height: f32,
    pub scale: f32,
}

impl Bitmap {
    pub fn new(id: u64, size: Vec2) -> Self {
        Self {
            id,
            width: size.x,
            height: size.y,
            scale: 1.0,
        }
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }

    /// A copy with both dimensions multiplied by `factor`.
    pub fn scaled(&self, factor: f32) -> Self {
        Self {
            id: self.id,
            width: self.width * factor,
            height: self.height * factor,
            scale: self.scale * factor,
        }
    }
}

/// Material-style backdrop blur presets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum BlurStyle {
    NoMaterial,
    BackgroundThin,
    BackgroundRegular,
    BackgroundThick,
}

/// A background blur effect applied behind a floating preview.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct BackgroundEffect {
    /// Blur radius in pixels. Zero or negative means "no effect".
    pub radius: f32,
    pub saturation: f32,
    pub brightness: f32,
    pub color: Color32,
}

impl Default for BackgroundEffect {
    fn default() -> Self {
        Self {
            radius: 0.0,
            saturation: 1.0,
            brightness: 1.0,
            color: Color32::TRANSPARENT,
        }
    }
}

impl BackgroundEffect {
    pub fn is_valid(&self) -> bool {
        self.radius > 0.0
    }

    /// Converts a blur-style preset into an explicit effect.
    pub fn from_blur_style(style: BlurStyle) -> Option<Self> {
        let radius = match style {
            BlurStyle::NoMaterial => return None,
            BlurStyle::BackgroundThin => 20.0,
            BlurStyle::BackgroundRegular => 40.0,
            BlurStyle::BackgroundThick => 60.0,
        };
        Some(Self {
            radius,
            ..Self::default()
        })
    }
}

/// Render-side properties of a node that drag staging reads or animates.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderProps {
    /// Absolute position (window space) for overlay nodes. `None` means "laid out by the host".
    pub position: Option<Pos2>,
    pub size: Vec2,
    pub scale: Vec2,

    /// Extra offset on top of `position`, used to move a whole bundle at once.
    pub translate: Vec2,
    pub rotation_deg: f32,
    pub opacity: Option<f32>,
    pub shadow: Option<Shadow>,
    pub border_radius: Option<CornerRadius>,
    pub clip_edge: bool,
    pub back_blur_style: Option<BlurStyle>,
    pub background_effect: Option<BackgroundEffect>,

    /// Gaussian sigma derived from the background effect radius.
    pub blur_sigma: f32,
    pub visible: bool,

    /// Press-feedback scale, if a click effect is installed.
    pub click_effect_scale: Option<f32>,
    pub bitmap: Option<Bitmap>,
    pub text: Option<String>,

    /// Blocks hit-testing of everything underneath.
    pub hit_test_block: bool,

    /// Size follows the parent (used for full-window overlay columns).
    pub match_parent: bool,
}

impl Default for RenderProps {
    fn default() -> Self {
        Self {
            position: None,
            size: Vec2::ZERO,
            scale: Vec2::splat(1.0),
            translate: Vec2::ZERO,
            rotation_deg: 0.0,
            opacity: None,
            shadow: None,
            border_radius: None,
            clip_edge: false,
            back_blur_style: None,
            background_effect: None,
            blur_sigma: 0.0,
            visible: true,
            click_effect_scale: None,
            bitmap: None,
            text: None,
            hit_test_block: false,
            match_parent: false,
        }
    }
}

impl RenderProps {
    /// The painted rectangle of an absolutely positioned node, ignoring scale.
    pub fn placed_rect(&self) -> Option<Rect> {
        self.position.map(|pos| Rect::from_min_size(pos, self.size))
    }
}

/// Per-node drag configuration, written by the host and read by the drag pipeline.
#[derive(Clone, Debug)]
pub struct DragNodeAttrs {
    /// Whether the node may start a drag right now.
    pub draggable: bool,

    /// `draggable` was set explicitly by the application (as opposed to a kind default).
    pub customer_set_draggable: bool,

    /// Vetoes drag collection for this node and its whole subtree.
    pub drag_forbidden: bool,

    /// Selection state for grid/list items.
    pub selected: bool,

    /// Text content that drags as text (selection-based) rather than as a node snapshot.
    pub text_draggable: bool,
    pub text_selected: bool,

    /// A bound context menu that replaces the lift preview.
    pub bind_menu_hides_preview: bool,
    pub has_context_menu: bool,

    /// The node lives inside a bound overlay (sheet/popup); the event column stays click-through.
    pub bind_overlay: bool,

    /// Web content: an image is under the pointer.
    pub web_image_drag: bool,

    /// Looks up a live node by inspector id to use as preview.
    pub preview_inspector_id: Option<String>,

    /// Application-supplied preview bitmap.
    pub preview_bitmap: Option<Bitmap>,
    pub preview_option: DragPreviewOption,

    /// Hit-test rectangles relative to the node. Empty means "own frame".
    pub response_region: Vec<Rect>,
}

impl Default for DragNodeAttrs {
    fn default() -> Self {
        Self {
            draggable: true,
            customer_set_draggable: false,
            drag_forbidden: false,
            selected: false,
            text_draggable: false,
            text_selected: false,
            bind_menu_hides_preview: false,
            has_context_menu: false,
            bind_overlay: false,
            web_image_drag: false,
            preview_inspector_id: None,
            preview_bitmap: None,
            preview_option: DragPreviewOption::default(),
            response_region: Vec::new(),
        }
    }
}

impl DragNodeAttrs {
    pub fn is_allowed_drag(&self) -> bool {
        self.draggable && !self.drag_forbidden
    }

    /// The application turned dragging off explicitly.
    pub fn is_customer_non_draggable(&self) -> bool {
        self.customer_set_draggable && !self.draggable
    }
}

/// The retained UI tree the drag pipeline stages overlays into.
///
/// Every accessor is fallible: a stale [`NodeId`] resolves to `None`/`false` and the caller
/// backs off silently.
pub trait NodeTree {
    fn root(&self) -> NodeId;

    fn create_node(&mut self, kind: NodeKind) -> NodeId;

    /// Detaches and destroys `node` together with its subtree.
    fn remove_node(&mut self, node: NodeId) -> bool;

    fn contains(&self, node: NodeId) -> bool;

    fn kind(&self, node: NodeId) -> Option<NodeKind>;

    fn parent(&self, node: NodeId) -> Option<NodeId>;

    fn children(&self, node: NodeId) -> Vec<NodeId>;

    /// Appends `child` (which must be detached) to `parent`.
    fn mount(&mut self, parent: NodeId, child: NodeId) -> bool;

    /// Detaches `node` from its parent but keeps it alive.
    fn unmount(&mut self, node: NodeId) -> bool;

    fn mark_dirty(&mut self, node: NodeId);

    /// Laid-out rectangle in window space.
    fn frame_rect(&self, node: NodeId) -> Option<Rect>;

    fn render(&self, node: NodeId) -> Option<&RenderProps>;

    fn render_mut(&mut self, node: NodeId) -> Option<&mut RenderProps>;

    fn drag_attrs(&self, node: NodeId) -> Option<&DragNodeAttrs>;

    fn drag_attrs_mut(&mut self, node: NodeId) -> Option<&mut DragNodeAttrs>;

    fn find_by_inspector_id(&self, inspector_id: &str) -> Option<NodeId>;

    /// Selected, visible items of a grid/list container, in tree order.
    fn visible_selected_items(&self, container: NodeId) -> Vec<NodeId>;

    /// Captures a bitmap of the node as currently rendered.
    fn snapshot(&mut self, node: NodeId) -> Option<Bitmap>;

    /// Offset of this window inside the screen.
    fn window_offset(&self) -> Vec2 {
        Vec2::ZERO
    }

    fn depth(&self, node: NodeId) -> Option<usize> {
        if !self.contains(node) {
            return None;
        }
        let mut depth = 0;
        let mut current = node;
        while let Some(parent) = self.parent(current) {
            depth += 1;
            current = parent;
        }
        Some(depth)
    }

    /// Parent chain of `node`, nearest first.
    fn ancestors(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut current = node;
        while let Some(parent) = self.parent(current) {
            out.push(parent);
            current = parent;
        }
        out
    }

    /// Whether `node` is currently attached under the root.
    fn is_attached(&self, node: NodeId) -> bool {
        let root = self.root();
        node == root || self.ancestors(node).last() == Some(&root)
    }
}
