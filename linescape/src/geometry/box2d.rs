//! Axis-aligned rectangle in world or screen space.
//!
//! A `Box2D` is four plain numbers and is passed around by value. Inverted or
//! degenerate boxes are ordinary values: `is_empty()` reports them, nothing
//! here returns an error.

use std::fmt;

/// Absolute per-component tolerance used by [`Box2D::equals`].
pub const EQUALS_EPSILON: f64 = 1e-6;

/// Axis-aligned rectangle `(min_x, min_y)-(max_x, max_y)`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Box2D {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Box2D {
    /// Creates the zero box `(0,0)-(0,0)`.
    pub const fn new() -> Self {
        Self::from_values(0.0, 0.0, 0.0, 0.0)
    }

    /// Creates a box from its four bounds.
    pub const fn from_values(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Creates a box of the given size centered on `(cx, cy)`.
    pub fn from_center_size(cx: f64, cy: f64, width: f64, height: f64) -> Self {
        let hw = width * 0.5;
        let hh = height * 0.5;
        Self::from_values(cx - hw, cy - hh, cx + hw, cy + hh)
    }

    /// Creates a zero-area box at a point.
    pub fn from_point(x: f64, y: f64) -> Self {
        Self::from_values(x, y, x, y)
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Signed area; negative for boxes inverted on exactly one axis.
    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    pub fn perimeter(&self) -> f64 {
        2.0 * (self.width() + self.height())
    }

    pub fn center(&self) -> (f64, f64) {
        (
            (self.min_x + self.max_x) * 0.5,
            (self.min_y + self.max_y) * 0.5,
        )
    }

    pub fn size(&self) -> (f64, f64) {
        (self.width(), self.height())
    }

    /// True when the box encloses no interior.
    pub fn is_empty(&self) -> bool {
        self.min_x >= self.max_x || self.min_y >= self.max_y
    }

    /// True when the box is not inverted (zero-area boxes are valid).
    pub fn is_valid(&self) -> bool {
        self.min_x <= self.max_x && self.min_y <= self.max_y
    }

    /// Boundary-inclusive point containment.
    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }

    /// True when `other` lies entirely inside `self` (boundaries may touch).
    pub fn contains_box(&self, other: &Box2D) -> bool {
        other.min_x >= self.min_x
            && other.min_y >= self.min_y
            && other.max_x <= self.max_x
            && other.max_y <= self.max_y
    }

    /// Strict interior intersection. Boxes sharing only an edge or a corner do
    /// not overlap.
    pub fn overlaps(&self, other: &Box2D) -> bool {
        self.min_x < other.max_x
            && self.max_x > other.min_x
            && self.min_y < other.max_y
            && self.max_y > other.min_y
    }

    pub fn union(&self, other: &Box2D) -> Box2D {
        Box2D::from_values(
            self.min_x.min(other.min_x),
            self.min_y.min(other.min_y),
            self.max_x.max(other.max_x),
            self.max_y.max(other.max_y),
        )
    }

    /// Component-wise intersection. Disjoint inputs give an empty box.
    pub fn intersection(&self, other: &Box2D) -> Box2D {
        Box2D::from_values(
            self.min_x.max(other.min_x),
            self.min_y.max(other.min_y),
            self.max_x.min(other.max_x),
            self.max_y.min(other.max_y),
        )
    }

    /// Grows every side outward by `amount`.
    pub fn expand(&self, amount: f64) -> Box2D {
        Box2D::from_values(
            self.min_x - amount,
            self.min_y - amount,
            self.max_x + amount,
            self.max_y + amount,
        )
    }

    pub fn translate(&self, dx: f64, dy: f64) -> Box2D {
        Box2D::from_values(
            self.min_x + dx,
            self.min_y + dy,
            self.max_x + dx,
            self.max_y + dy,
        )
    }

    /// Scales the box about its own center.
    pub fn scale(&self, factor: f64) -> Box2D {
        let (cx, cy) = self.center();
        let hw = self.width() * 0.5 * factor;
        let hh = self.height() * 0.5 * factor;
        Box2D::from_values(cx - hw, cy - hh, cx + hw, cy + hh)
    }

    /// Smallest box containing both `self` and the point.
    pub fn add_point(&self, x: f64, y: f64) -> Box2D {
        Box2D::from_values(
            self.min_x.min(x),
            self.min_y.min(y),
            self.max_x.max(x),
            self.max_y.max(y),
        )
    }

    /// Point of the box closest to `(x, y)`.
    pub fn closest_point(&self, x: f64, y: f64) -> (f64, f64) {
        (
            x.min(self.max_x).max(self.min_x),
            y.min(self.max_y).max(self.min_y),
        )
    }

    /// Euclidean distance from the box to a point; zero inside.
    pub fn distance_to_point(&self, x: f64, y: f64) -> f64 {
        let dx = (self.min_x - x).max(x - self.max_x).max(0.0);
        let dy = (self.min_y - y).max(y - self.max_y).max(0.0);
        (dx * dx + dy * dy).sqrt()
    }

    /// Approximate equality with an absolute tolerance of [`EQUALS_EPSILON`].
    pub fn equals(&self, other: &Box2D) -> bool {
        (self.min_x - other.min_x).abs() <= EQUALS_EPSILON
            && (self.min_y - other.min_y).abs() <= EQUALS_EPSILON
            && (self.max_x - other.max_x).abs() <= EQUALS_EPSILON
            && (self.max_y - other.max_y).abs() <= EQUALS_EPSILON
    }

    /// Bitwise equality of all four components.
    pub fn exact_equals(&self, other: &Box2D) -> bool {
        self.min_x.to_bits() == other.min_x.to_bits()
            && self.min_y.to_bits() == other.min_y.to_bits()
            && self.max_x.to_bits() == other.max_x.to_bits()
            && self.max_y.to_bits() == other.max_y.to_bits()
    }
}

impl fmt::Display for Box2D {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "box({}, {}, {}, {})",
            self.min_x, self.min_y, self.max_x, self.max_y
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_dimensions() {
        let b = Box2D::from_values(1.0, 2.0, 4.0, 8.0);
        assert_eq!(b.width(), 3.0);
        assert_eq!(b.height(), 6.0);
        assert_eq!(b.area(), 18.0);
        assert_eq!(b.perimeter(), 18.0);
        assert_eq!(b.center(), (2.5, 5.0));
    }

    #[test]
    fn test_inverted_box_has_negative_width() {
        let b = Box2D::from_values(4.0, 0.0, 1.0, 2.0);
        assert_eq!(b.width(), -3.0);
        assert!(b.is_empty());
        assert!(!b.is_valid());
    }

    #[test]
    fn test_zero_area_box_is_empty_but_valid() {
        let b = Box2D::from_point(3.0, 3.0);
        assert!(b.is_empty());
        assert!(b.is_valid());
    }

    #[test]
    fn test_contains_point_is_boundary_inclusive() {
        let b = Box2D::from_values(0.0, 0.0, 10.0, 10.0);
        assert!(b.contains_point(0.0, 0.0));
        assert!(b.contains_point(10.0, 10.0));
        assert!(b.contains_point(5.0, 10.0));
        assert!(!b.contains_point(10.0001, 5.0));
    }

    #[test]
    fn test_touching_boxes_do_not_overlap() {
        let a = Box2D::from_values(0.0, 0.0, 1.0, 1.0);
        let right = Box2D::from_values(1.0, 0.0, 2.0, 1.0);
        let corner = Box2D::from_values(1.0, 1.0, 2.0, 2.0);
        assert!(!a.overlaps(&right));
        assert!(!a.overlaps(&corner));
        assert!(a.overlaps(&Box2D::from_values(0.5, 0.5, 2.0, 2.0)));
    }

    #[test]
    fn test_intersection_of_disjoint_boxes_is_empty() {
        let a = Box2D::from_values(0.0, 0.0, 1.0, 1.0);
        let b = Box2D::from_values(5.0, 5.0, 6.0, 6.0);
        let i = a.intersection(&b);
        assert!(i.is_empty());
        assert_eq!(i, Box2D::from_values(5.0, 5.0, 1.0, 1.0));
    }

    #[test]
    fn test_scale_is_about_center() {
        let b = Box2D::from_values(10.0, 10.0, 20.0, 20.0);
        let s = b.scale(2.0);
        assert_eq!(s, Box2D::from_values(5.0, 5.0, 25.0, 25.0));
        assert_eq!(s.center(), b.center());
    }

    #[test]
    fn test_translate_and_expand() {
        let b = Box2D::from_values(0.0, 0.0, 2.0, 2.0);
        assert_eq!(b.translate(1.0, -1.0), Box2D::from_values(1.0, -1.0, 3.0, 1.0));
        assert_eq!(b.expand(1.0), Box2D::from_values(-1.0, -1.0, 3.0, 3.0));
    }

    #[test]
    fn test_distance_and_closest_point() {
        let b = Box2D::from_values(0.0, 0.0, 2.0, 2.0);
        assert_eq!(b.distance_to_point(1.0, 1.0), 0.0);
        assert_eq!(b.distance_to_point(5.0, 6.0), 5.0);
        assert_eq!(b.closest_point(5.0, -3.0), (2.0, 0.0));
    }

    #[test]
    fn test_equals_uses_absolute_tolerance() {
        let a = Box2D::from_values(0.0, 0.0, 1.0, 1.0);
        let b = Box2D::from_values(0.0, 5e-7, 1.0, 1.0);
        let c = Box2D::from_values(0.0, 2e-6, 1.0, 1.0);
        assert!(a.equals(&b));
        assert!(!a.equals(&c));
        assert!(!a.exact_equals(&b));
        assert!(a.exact_equals(&a));
    }

    #[test]
    fn test_exact_equals_distinguishes_signed_zero() {
        let a = Box2D::from_values(0.0, 0.0, 1.0, 1.0);
        let b = Box2D::from_values(-0.0, 0.0, 1.0, 1.0);
        assert!(a.equals(&b));
        assert!(!a.exact_equals(&b));
    }

    #[test]
    fn test_display() {
        let b = Box2D::from_values(0.0, 1.0, 2.0, 3.0);
        assert_eq!(b.to_string(), "box(0, 1, 2, 3)");
    }

    fn arb_box() -> impl Strategy<Value = Box2D> {
        (-1000i32..1000, -1000i32..1000, 1i32..500, 1i32..500).prop_map(|(x, y, w, h)| {
            Box2D::from_values(x as f64, y as f64, (x + w) as f64, (y + h) as f64)
        })
    }

    proptest! {
        #[test]
        fn prop_union_with_self_is_identity(a in arb_box()) {
            prop_assert_eq!(a.union(&a), a);
        }

        #[test]
        fn prop_overlaps_is_symmetric(a in arb_box(), b in arb_box()) {
            prop_assert_eq!(a.overlaps(&b), b.overlaps(&a));
        }

        #[test]
        fn prop_overlap_matches_non_empty_intersection(a in arb_box(), b in arb_box()) {
            prop_assert_eq!(a.overlaps(&b), !a.intersection(&b).is_empty());
        }

        #[test]
        fn prop_union_contains_both(a in arb_box(), b in arb_box()) {
            let u = a.union(&b);
            prop_assert!(u.contains_box(&a));
            prop_assert!(u.contains_box(&b));
        }
    }
}
