//! Plain geometry shared by the monitor, the click-through controller and the
//! overlay manager.
//!
//! All values are logical (device-independent) pixels. Converting from the
//! platform's physical pixels happens at the window backend boundary so that
//! cursor positions and window bounds are always compared in the same space.

use serde::{Deserialize, Serialize};

/// Tolerance used when comparing sizes that went through rounding.
pub const SIZE_EPSILON: f64 = 1.0;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn is_positive(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }

    /// Whole-pixel version of this size, as committed to the registry.
    pub fn rounded(&self) -> Self {
        Self::new(self.width.round(), self.height.round())
    }

    pub fn approx_eq(&self, other: &Size) -> bool {
        (self.width - other.width).abs() < SIZE_EPSILON
            && (self.height - other.height).abs() < SIZE_EPSILON
    }
}

/// On-screen rectangle of a window.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
pub struct Bounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn from_origin_size(origin: Point, size: Size) -> Self {
        Self::new(origin.x, origin.y, size.width, size.height)
    }

    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Half-open containment: `[x, x + width) × [y, y + height)`.
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x
            && point.x < self.x + self.width
            && point.y >= self.y
            && point.y < self.y + self.height
    }

    /// Translate a screen point into this rectangle's local coordinates.
    pub fn to_local(&self, point: Point) -> Point {
        Point::new(point.x - self.x, point.y - self.y)
    }
}

/// Which dimension the user is dragging during a resize.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Width,
    Height,
}

impl Axis {
    /// Picks the dimension that moved the most, relative to its previous
    /// value. Ties go to the width.
    pub fn dominant(previous: Size, proposed: Size) -> Self {
        let relative = |old: f64, new: f64| {
            if old > 0.0 {
                ((new - old) / old).abs()
            } else {
                (new - old).abs()
            }
        };

        let dw = relative(previous.width, proposed.width);
        let dh = relative(previous.height, proposed.height);
        if dh > dw { Axis::Height } else { Axis::Width }
    }
}

/// Locked `width / height` ratio of an overlay window.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct AspectRatio(f64);

impl AspectRatio {
    /// Returns `None` unless both dimensions are positive.
    pub fn from_dimensions(width: f64, height: f64) -> Option<Self> {
        if width > 0.0 && height > 0.0 && width.is_finite() && height.is_finite() {
            Some(Self(width / height))
        } else {
            None
        }
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    pub fn height_for(&self, width: f64) -> f64 {
        width / self.0
    }

    pub fn width_for(&self, height: f64) -> f64 {
        height * self.0
    }

    /// Project `proposed` onto this ratio. The axis that changed the most
    /// since `previous` is kept and the other one is recomputed. The result
    /// is rounded to whole pixels and never collapses below one pixel.
    pub fn project(&self, previous: Size, proposed: Size) -> Size {
        let projected = match Axis::dominant(previous, proposed) {
            Axis::Width => {
                let width = proposed.width.round().max(1.0);
                Size::new(width, self.height_for(width).round())
            }
            Axis::Height => {
                let height = proposed.height.round().max(1.0);
                Size::new(self.width_for(height).round(), height)
            }
        };

        Size::new(projected.width.max(1.0), projected.height.max(1.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_containment_is_half_open() {
        let bounds = Bounds::new(100.0, 50.0, 200.0, 100.0);
        assert!(bounds.contains(Point::new(100.0, 50.0)));
        assert!(bounds.contains(Point::new(299.9, 149.9)));
        assert!(!bounds.contains(Point::new(300.0, 60.0)));
        assert!(!bounds.contains(Point::new(150.0, 150.0)));
        assert!(!bounds.contains(Point::new(99.0, 60.0)));
    }

    #[test]
    fn to_local_subtracts_origin() {
        let bounds = Bounds::new(10.0, 20.0, 100.0, 100.0);
        assert_eq!(bounds.to_local(Point::new(15.0, 45.0)), Point::new(5.0, 25.0));
    }

    #[test]
    fn aspect_ratio_requires_positive_dimensions() {
        assert!(AspectRatio::from_dimensions(0.0, 720.0).is_none());
        assert!(AspectRatio::from_dimensions(480.0, -1.0).is_none());
        assert!(AspectRatio::from_dimensions(480.0, 720.0).is_some());
    }

    #[test]
    fn width_drag_recomputes_height() {
        let ratio = AspectRatio::from_dimensions(1920.0, 1080.0).unwrap();
        let projected = ratio.project(Size::new(1920.0, 1080.0), Size::new(960.0, 1080.0));
        assert_eq!(projected, Size::new(960.0, 540.0));
    }

    #[test]
    fn height_drag_recomputes_width() {
        let ratio = AspectRatio::from_dimensions(480.0, 720.0).unwrap();
        let projected = ratio.project(Size::new(480.0, 720.0), Size::new(470.0, 360.0));
        assert_eq!(projected, Size::new(240.0, 360.0));
    }

    #[test]
    fn diagonal_drag_keeps_ratio() {
        let ratio = AspectRatio::from_dimensions(16.0, 9.0).unwrap();
        let projected = ratio.project(Size::new(1600.0, 900.0), Size::new(1253.0, 811.0));
        assert!((ratio.height_for(projected.width) - projected.height).abs() <= 1.0);
    }

    #[test]
    fn projection_never_collapses() {
        let ratio = AspectRatio::from_dimensions(1920.0, 1080.0).unwrap();
        let projected = ratio.project(Size::new(1920.0, 1080.0), Size::new(0.0, 1080.0));
        assert!(projected.width >= 1.0 && projected.height >= 1.0);
    }

    #[test]
    fn dominant_axis_prefers_width_on_tie() {
        assert_eq!(
            Axis::dominant(Size::new(100.0, 100.0), Size::new(110.0, 110.0)),
            Axis::Width
        );
        assert_eq!(
            Axis::dominant(Size::new(100.0, 100.0), Size::new(101.0, 150.0)),
            Axis::Height
        );
    }
}
