//! Viewport math for the workflow canvas.

use entity::workflow::Node;

pub const MIN_ZOOM: f64 = 0.5;
pub const MAX_ZOOM: f64 = 2.0;
pub const ZOOM_STEP: f64 = 0.1;
pub const FIT_PADDING: f64 = 50.0;
pub const NODE_WIDTH: f64 = 240.0;
pub const NODE_HEIGHT: f64 = 80.0;

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Bounds {
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn center(&self) -> (f64, f64) {
        (
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }
}

/// Bounding box of the node rectangles, `None` for an empty canvas.
pub fn bounds(nodes: &[Node]) -> Option<Bounds> {
    let first = nodes.first()?;
    let seed = Bounds {
        min_x: first.position.x,
        min_y: first.position.y,
        max_x: first.position.x + NODE_WIDTH,
        max_y: first.position.y + NODE_HEIGHT,
    };
    Some(nodes.iter().skip(1).fold(seed, |acc, node| Bounds {
        min_x: acc.min_x.min(node.position.x),
        min_y: acc.min_y.min(node.position.y),
        max_x: acc.max_x.max(node.position.x + NODE_WIDTH),
        max_y: acc.max_y.max(node.position.y + NODE_HEIGHT),
    }))
}

/// Screen transform: `screen = world * zoom + pan`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Viewport {
    pub zoom: f64,
    pub pan_x: f64,
    pub pan_y: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            pan_x: 0.0,
            pan_y: 0.0,
        }
    }
}

impl Viewport {
    pub fn set_zoom(&mut self, zoom: f64) {
        self.zoom = clamp_zoom(zoom);
    }

    pub fn zoom_in(&mut self) {
        self.set_zoom(self.zoom + ZOOM_STEP);
    }

    pub fn zoom_out(&mut self) {
        self.set_zoom(self.zoom - ZOOM_STEP);
    }

    /// Zooms while keeping the world point under `anchor` fixed on screen.
    pub fn zoom_around(&mut self, zoom: f64, anchor: (f64, f64)) {
        let world = self.to_world(anchor);
        self.set_zoom(zoom);
        self.pan_x = anchor.0 - world.0 * self.zoom;
        self.pan_y = anchor.1 - world.1 * self.zoom;
    }

    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        self.pan_x += dx;
        self.pan_y += dy;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn to_world(&self, screen: (f64, f64)) -> (f64, f64) {
        (
            (screen.0 - self.pan_x) / self.zoom,
            (screen.1 - self.pan_y) / self.zoom,
        )
    }

    pub fn to_screen(&self, world: (f64, f64)) -> (f64, f64) {
        (
            world.0 * self.zoom + self.pan_x,
            world.1 * self.zoom + self.pan_y,
        )
    }

    /// Scales and centers the viewport on all nodes. An empty canvas resets.
    pub fn fit_to_screen(&mut self, nodes: &[Node], screen: Size) {
        let Some(bounds) = bounds(nodes) else {
            self.reset();
            return;
        };
        let available_w = (screen.width - 2.0 * FIT_PADDING).max(1.0);
        let available_h = (screen.height - 2.0 * FIT_PADDING).max(1.0);
        let zoom = (available_w / bounds.width()).min(available_h / bounds.height());
        self.set_zoom(zoom);
        let (cx, cy) = bounds.center();
        self.pan_x = screen.width / 2.0 - cx * self.zoom;
        self.pan_y = screen.height / 2.0 - cy * self.zoom;
    }
}

fn clamp_zoom(zoom: f64) -> f64 {
    if zoom.is_nan() {
        return 1.0;
    }
    zoom.clamp(MIN_ZOOM, MAX_ZOOM)
}
