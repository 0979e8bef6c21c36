//! Rectangle/point/size primitives in canvas coordinates (spec.md §3.1).
//!
//! All rectangles are produced by ceiling-division and intersection and are
//! guaranteed non-negative and well-ordered (spec.md §3.4).

/// A 2D point in unsigned canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Point {
    pub x: u32,
    pub y: u32,
}

impl Point {
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

/// A 2D extent in unsigned canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Size {
    pub w: u32,
    pub h: u32,
}

impl Size {
    pub const fn new(w: u32, h: u32) -> Self {
        Self { w, h }
    }

    pub fn area(self) -> u64 {
        self.w as u64 * self.h as u64
    }
}

/// An axis-aligned rectangle given by origin and size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub origin: Point,
    pub size: Size,
}

impl Rect {
    pub const fn new(origin: Point, size: Size) -> Self {
        Self { origin, size }
    }

    /// Rectangle from (x0,y0)-(x1,y1), well-ordered (x1>=x0, y1>=y0).
    pub fn from_corners(x0: u32, y0: u32, x1: u32, y1: u32) -> Self {
        debug_assert!(x1 >= x0 && y1 >= y0);
        Rect {
            origin: Point::new(x0, y0),
            size: Size::new(x1 - x0, y1 - y0),
        }
    }

    pub fn x0(&self) -> u32 {
        self.origin.x
    }
    pub fn y0(&self) -> u32 {
        self.origin.y
    }
    pub fn x1(&self) -> u32 {
        self.origin.x + self.size.w
    }
    pub fn y1(&self) -> u32 {
        self.origin.y + self.size.h
    }
    pub fn w(&self) -> u32 {
        self.size.w
    }
    pub fn h(&self) -> u32 {
        self.size.h
    }
    pub fn is_empty(&self) -> bool {
        self.size.w == 0 || self.size.h == 0
    }

    /// Intersection of two rectangles; empty if they do not overlap.
    pub fn intersect(&self, other: &Rect) -> Rect {
        let x0 = self.x0().max(other.x0());
        let y0 = self.y0().max(other.y0());
        let x1 = self.x1().min(other.x1()).max(x0);
        let y1 = self.y1().min(other.y1()).max(y0);
        Rect::from_corners(x0, y0, x1, y1)
    }

    /// Projects this rectangle onto a subsampled component grid by
    /// ceiling-dividing each corner by (xr, yr) (spec.md §3.1).
    pub fn project_to_component(&self, xr: u32, yr: u32) -> Rect {
        Rect::from_corners(
            ceil_div(self.x0(), xr),
            ceil_div(self.y0(), yr),
            ceil_div(self.x1(), xr),
            ceil_div(self.y1(), yr),
        )
    }
}

/// Ceiling division for unsigned 32-bit operands, widened to avoid overflow.
pub fn ceil_div(a: u32, b: u32) -> u32 {
    debug_assert!(b > 0);
    (((a as u64) + (b as u64) - 1) / (b as u64)) as u32
}

/// Number of tiles along one axis, per spec.md §3.1:
/// ceil((Xsiz - XTOsiz) / XTsiz).
pub fn tile_count_1d(extent: u32, tile_offset: u32, tile_size: u32) -> u32 {
    debug_assert!(tile_size > 0);
    debug_assert!(extent >= tile_offset);
    ceil_div(extent - tile_offset, tile_size)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ceil_div_basic() {
        assert_eq!(ceil_div(7, 2), 4);
        assert_eq!(ceil_div(8, 2), 4);
        assert_eq!(ceil_div(0, 5), 0);
    }

    #[test]
    fn project_to_component_matches_chroma_subsampling() {
        let image = Rect::from_corners(0, 0, 512, 512);
        let chroma = image.project_to_component(2, 2);
        assert_eq!(chroma.w(), 256);
        assert_eq!(chroma.h(), 256);
    }

    #[test]
    fn project_awkward_size() {
        // 7x5 image, no subsampling: component rect equals image rect.
        let image = Rect::from_corners(0, 0, 7, 5);
        let comp = image.project_to_component(1, 1);
        assert_eq!(comp.w(), 7);
        assert_eq!(comp.h(), 5);
    }

    #[test]
    fn tile_grid_honors_offsets() {
        // image offset (3,5), tile size 64x64 => first tile rect (3,5)-(64,64)
        let n = tile_count_1d(256, 1, 64);
        assert_eq!(n, 4);
    }
}
