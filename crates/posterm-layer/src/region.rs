//! Screen rectangles

/// Axis-aligned rectangle in pixels.
///
/// Width and height never go negative: every constructor and mutator clamps
/// them at zero. A region with zero width or height is empty; it contains no
/// points and intersects nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Region {
    x: i32,
    y: i32,
    w: i32,
    h: i32,
}

impl Region {
    pub fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self {
            x,
            y,
            w: w.max(0),
            h: h.max(0),
        }
    }

    /// Region spanning two corners, the second exclusive
    pub fn from_corners(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self::new(x1, y1, x2 - x1, y2 - y1)
    }

    pub fn x(&self) -> i32 {
        self.x
    }

    pub fn y(&self) -> i32 {
        self.y
    }

    pub fn w(&self) -> i32 {
        self.w
    }

    pub fn h(&self) -> i32 {
        self.h
    }

    /// One past the rightmost column
    pub fn right(&self) -> i32 {
        self.x + self.w
    }

    /// One past the bottom row
    pub fn bottom(&self) -> i32 {
        self.y + self.h
    }

    pub fn is_empty(&self) -> bool {
        self.w == 0 || self.h == 0
    }

    pub fn set_size(&mut self, w: i32, h: i32) {
        self.w = w.max(0);
        self.h = h.max(0);
    }

    pub fn move_to(&mut self, x: i32, y: i32) {
        self.x = x;
        self.y = y;
    }

    /// Copy shifted by `(dx, dy)`
    pub fn translate(&self, dx: i32, dy: i32) -> Region {
        Region::new(self.x + dx, self.y + dy, self.w, self.h)
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        !self.is_empty() && x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    /// Whether `other` lies entirely inside this region
    pub fn contains_region(&self, other: &Region) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    pub fn intersects(&self, other: &Region) -> bool {
        !self.intersect(other).is_empty()
    }

    /// Overlap of the two regions; empty when they do not overlap
    pub fn intersect(&self, other: &Region) -> Region {
        if self.is_empty() || other.is_empty() {
            return Region::new(self.x, self.y, 0, 0);
        }
        Region::from_corners(
            self.x.max(other.x),
            self.y.max(other.y),
            self.right().min(other.right()),
            self.bottom().min(other.bottom()),
        )
    }

    /// Bounding box of both regions. An empty side contributes nothing.
    pub fn union(&self, other: &Region) -> Region {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        Region::from_corners(
            self.x.min(other.x),
            self.y.min(other.y),
            self.right().max(other.right()),
            self.bottom().max(other.bottom()),
        )
    }

    /// Copy shrunk by `n` on every side
    pub fn inset(&self, n: i32) -> Region {
        Region::new(self.x + n, self.y + n, self.w - 2 * n, self.h - 2 * n)
    }
}
