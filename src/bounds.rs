//! Provides axis-aligned bounding boxes and the [`Bounded`] capability.
//!
//! Any scene object that can report a world-space [`BoundingBox`] implements
//! [`Bounded`]; collision and distance helpers only ever see that trait.
//!
//! # Examples
//! ```
//! use glam::Vec3;
//! use scenery::bounds::BoundingBox;
//!
//! let a = BoundingBox::new(Vec3::ZERO, Vec3::ONE);
//! let b = BoundingBox::new(Vec3::ONE, Vec3::splat(2.0));
//! assert!(a.intersects(&b));
//! ```

use glam::{Mat4, Vec3};
use serde::Serialize;

use crate::formats::{Model, Triangle};

/// An axis-aligned bounding box in world space.
///
/// The empty box has `min = +inf` and `max = -inf` on every axis, so that
/// expanding it by a single point yields exactly that point.
#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct BoundingBox {
    /// Minimum corner.
    pub min: Vec3,
    /// Maximum corner.
    pub max: Vec3,
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::empty()
    }
}

impl BoundingBox {
    /// Constructs a box from its corners. No ordering check is performed.
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Returns the empty box.
    ///
    /// # Examples
    /// ```
    /// use scenery::bounds::BoundingBox;
    ///
    /// assert!(BoundingBox::empty().is_empty());
    /// ```
    pub fn empty() -> Self {
        Self {
            min: Vec3::splat(f32::INFINITY),
            max: Vec3::splat(f32::NEG_INFINITY),
        }
    }

    /// Builds the smallest box containing every point. No points gives the empty box.
    ///
    /// # Examples
    /// ```
    /// use glam::Vec3;
    /// use scenery::bounds::BoundingBox;
    ///
    /// let bb = BoundingBox::from_points([Vec3::new(1.0, -2.0, 0.0), Vec3::new(-1.0, 2.0, 3.0)]);
    /// assert_eq!(bb.min, Vec3::new(-1.0, -2.0, 0.0));
    /// assert_eq!(bb.max, Vec3::new(1.0, 2.0, 3.0));
    /// ```
    pub fn from_points<I: IntoIterator<Item = Vec3>>(points: I) -> Self {
        points
            .into_iter()
            .fold(Self::empty(), |bb, p| bb.expand_by_point(p))
    }

    /// Grows the box to include `point`.
    #[must_use]
    pub fn expand_by_point(self, point: Vec3) -> Self {
        Self {
            min: self.min.min(point),
            max: self.max.max(point),
        }
    }

    /// Returns the smallest box containing both boxes.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// True when `max < min` on any axis.
    pub fn is_empty(&self) -> bool {
        self.max.cmplt(self.min).any()
    }

    /// Returns `true` if the boxes overlap, inclusive on faces.
    ///
    /// Boxes that only touch along a boundary plane intersect. An empty box,
    /// or one with a NaN corner, never intersects anything.
    ///
    /// # Examples
    /// ```
    /// use glam::Vec3;
    /// use scenery::bounds::BoundingBox;
    ///
    /// let a = BoundingBox::new(Vec3::ZERO, Vec3::ONE);
    /// let far = BoundingBox::new(Vec3::splat(5.0), Vec3::splat(6.0));
    /// assert!(!a.intersects(&far));
    /// ```
    pub fn intersects(&self, other: &Self) -> bool {
        other.max.cmpge(self.min).all() && other.min.cmple(self.max).all()
    }

    /// Returns `true` if `point` lies inside or on the box.
    pub fn contains_point(&self, point: Vec3) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }

    /// Center of the box. The empty box has no meaningful center (NaN).
    pub fn center(&self) -> Vec3 {
        if self.is_empty() {
            return Vec3::NAN;
        }
        (self.min + self.max) * 0.5
    }

    /// Extent along each axis; zero for the empty box.
    pub fn size(&self) -> Vec3 {
        if self.is_empty() {
            return Vec3::ZERO;
        }
        self.max - self.min
    }

    /// Computes the box bounding this box's eight corners after `mat`.
    #[must_use]
    pub fn transformed(&self, mat: &Mat4) -> Self {
        if self.is_empty() {
            return *self;
        }
        let (lo, hi) = (self.min, self.max);
        Self::from_points((0..8).map(|i| {
            let corner = Vec3::new(
                if i & 1 == 0 { lo.x } else { hi.x },
                if i & 2 == 0 { lo.y } else { hi.y },
                if i & 4 == 0 { lo.z } else { hi.z },
            );
            mat.transform_point3(corner)
        }))
    }
}

/// A renderable that can report its world-space bounding box.
///
/// Implementations recompute the box on every call.
pub trait Bounded {
    /// Computes the minimal axis-aligned box containing the object in world space.
    fn compute_bounding_box(&self) -> BoundingBox;
}

impl Bounded for BoundingBox {
    fn compute_bounding_box(&self) -> BoundingBox {
        *self
    }
}

impl Bounded for Triangle {
    fn compute_bounding_box(&self) -> BoundingBox {
        BoundingBox::from_points(self.verts)
    }
}

impl Bounded for Model {
    /// Transforms every vertex, so rotated models get a tight box.
    fn compute_bounding_box(&self) -> BoundingBox {
        BoundingBox::from_points(self.world_vertices())
    }
}

impl<T: Bounded> Bounded for [T] {
    fn compute_bounding_box(&self) -> BoundingBox {
        self.iter()
            .map(Bounded::compute_bounding_box)
            .fold(BoundingBox::empty(), |acc, bb| acc.union(&bb))
    }
}

impl<T: Bounded + ?Sized> Bounded for &T {
    fn compute_bounding_box(&self) -> BoundingBox {
        (**self).compute_bounding_box()
    }
}
