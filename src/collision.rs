//! Provides the bounding-box collision test.
//!
//! # Examples
//! ```
//! use glam::Vec3;
//! use scenery::bounds::BoundingBox;
//! use scenery::collision::check_collision;
//!
//! let a = BoundingBox::new(Vec3::ZERO, Vec3::ONE);
//! assert!(check_collision(&a, &a));
//! ```

use crate::bounds::Bounded;

/// Returns `true` if the world-space bounding boxes of two objects overlap.
///
/// Both boxes are recomputed on every call. Touching faces count as a
/// collision; an object with no geometry never collides.
pub fn check_collision<A, B>(object1: &A, object2: &B) -> bool
where
    A: Bounded + ?Sized,
    B: Bounded + ?Sized,
{
    let box1 = object1.compute_bounding_box();
    let box2 = object2.compute_bounding_box();
    box1.intersects(&box2)
}
