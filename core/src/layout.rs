//! Panel Resize Tracking
//!
//! Pointer-driven resize state for the two-pane layout (session list on the
//! left, conversation on the right). Pure interaction arithmetic: no I/O,
//! no failure modes. Out-of-range pointer positions are clamped, never
//! rejected, so the panel width is always within bounds by construction.
//!
//! Surfaces own the global drag affordances (pointer capture, divider
//! highlight) and must clear them unconditionally on drag end or teardown.

/// Minimum panel width (layout units)
pub const MIN_PANEL_WIDTH: u16 = 200;

/// Maximum panel width (layout units)
pub const MAX_PANEL_WIDTH: u16 = 500;

/// Initial panel width (layout units)
pub const DEFAULT_PANEL_WIDTH: u16 = 260;

/// Tracks a pointer drag resizing the left panel
///
/// Lifecycle: [`begin_drag`](Self::begin_drag) arms tracking on pointer-down
/// over the divider, [`pointer_move`](Self::pointer_move) updates the width
/// while armed, [`end_drag`](Self::end_drag) disarms on pointer-up or
/// teardown. `end_drag` is idempotent.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LayoutResizer {
    width: u16,
    min: u16,
    max: u16,
    dragging: bool,
}

impl LayoutResizer {
    /// Create a resizer with explicit bounds
    ///
    /// The initial width is clamped into `[min, max]`.
    pub fn new(initial: u16, min: u16, max: u16) -> Self {
        let max = max.max(min);
        Self {
            width: initial.clamp(min, max),
            min,
            max,
            dragging: false,
        }
    }

    /// Arm drag tracking
    pub fn begin_drag(&mut self) {
        self.dragging = true;
    }

    /// Update the panel width from a pointer x position
    ///
    /// Only has effect while a drag is armed. Returns `true` if the width
    /// changed. Cheap enough to call on every pointer-move event.
    pub fn pointer_move(&mut self, x: u16) -> bool {
        if !self.dragging {
            return false;
        }
        let clamped = x.clamp(self.min, self.max);
        if clamped == self.width {
            return false;
        }
        self.width = clamped;
        true
    }

    /// Disarm drag tracking (safe to call when not armed)
    pub fn end_drag(&mut self) {
        self.dragging = false;
    }

    /// Whether a drag is currently armed
    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    /// Current panel width, always within bounds
    pub fn width(&self) -> u16 {
        self.width
    }

    /// Configured bounds as `(min, max)`
    pub fn bounds(&self) -> (u16, u16) {
        (self.min, self.max)
    }
}

impl Default for LayoutResizer {
    fn default() -> Self {
        Self::new(DEFAULT_PANEL_WIDTH, MIN_PANEL_WIDTH, MAX_PANEL_WIDTH)
    }
}
