//! Axis-aligned bounding boxes

use serde::{Deserialize, Serialize};

/// An axis-aligned bounding box `(min_x, min_y, max_x, max_y)` in some CRS.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extent {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Extent {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self { min_x, min_y, max_x, max_y }
    }

    /// Smallest extent containing every point, or `None` for an empty iterator.
    pub fn envelope<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = (f64, f64)>,
    {
        let mut iter = points.into_iter();
        let (x0, y0) = iter.next()?;
        let mut ext = Self::new(x0, y0, x0, y0);
        for (x, y) in iter {
            ext.min_x = ext.min_x.min(x);
            ext.min_y = ext.min_y.min(y);
            ext.max_x = ext.max_x.max(x);
            ext.max_y = ext.max_y.max(y);
        }
        Some(ext)
    }

    /// Corners in the order lower-left, upper-left, upper-right, lower-right.
    pub fn corners(&self) -> [(f64, f64); 4] {
        [
            (self.min_x, self.min_y),
            (self.min_x, self.max_y),
            (self.max_x, self.max_y),
            (self.max_x, self.min_y),
        ]
    }

    /// Points along the boundary: the four corners plus `stops` evenly spaced
    /// interior points on every edge.
    pub fn boundary_points(&self, stops: usize) -> Vec<(f64, f64)> {
        let corners = self.corners();
        let mut points = Vec::with_capacity(4 * (stops + 1));
        for i in 0..4 {
            let (x0, y0) = corners[i];
            let (x1, y1) = corners[(i + 1) % 4];
            points.push((x0, y0));
            for s in 1..=stops {
                let t = s as f64 / (stops + 1) as f64;
                points.push((x0 + (x1 - x0) * t, y0 + (y1 - y0) * t));
            }
        }
        points
    }

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

    /// All four coordinates are finite numbers
    pub fn is_finite(&self) -> bool {
        self.min_x.is_finite()
            && self.min_y.is_finite()
            && self.max_x.is_finite()
            && self.max_y.is_finite()
    }

    /// Flat `[min_x, min_y, max_x, max_y]`, the layout map widgets expect.
    pub fn to_array(&self) -> [f64; 4] {
        [self.min_x, self.min_y, self.max_x, self.max_y]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_of_points() {
        let ext = Extent::envelope([(3.0, -1.0), (-2.0, 4.0), (0.5, 0.5)]).unwrap();
        assert_eq!(ext, Extent::new(-2.0, -1.0, 3.0, 4.0));
        assert!(Extent::envelope(std::iter::empty()).is_none());
    }

    #[test]
    fn boundary_points_densify_edges() {
        let ext = Extent::new(0.0, 0.0, 4.0, 2.0);
        assert_eq!(ext.boundary_points(0).len(), 4);

        let pts = ext.boundary_points(1);
        assert_eq!(pts.len(), 8);
        // Midpoint of the left edge follows the first corner.
        assert_eq!(pts[1], (0.0, 1.0));
        assert_eq!(Extent::envelope(pts).unwrap(), ext);
    }

    #[test]
    fn dimensions() {
        let a = Extent::new(0.0, 0.0, 10.0, 4.0);
        let b = Extent::new(5.0, 5.0, 15.0, 15.0);
        assert_eq!((a.width(), a.height()), (10.0, 4.0));
        assert_eq!(a.to_array(), [0.0, 0.0, 10.0, 4.0]);
        assert_eq!(b.center(), (10.0, 10.0));
        assert!(!Extent::new(f64::NAN, 0.0, 1.0, 1.0).is_finite());
    }
}
