//! Provides point-to-point distance helpers.
//!
//! # Examples
//! ```
//! use scenery::spatial::{calculate_distance, Point3};
//!
//! let d = calculate_distance(Point3::ZERO, Point3::new(3.0, 4.0, 0.0));
//! assert_eq!(d, 5.0);
//! ```

use crate::bounds::Bounded;

/// A point in world space.
pub type Point3 = glam::Vec3;

/// Returns the Euclidean distance between two points.
///
/// No validation is done: a NaN coordinate in either point makes the result
/// NaN.
///
/// # Examples
/// ```
/// use scenery::spatial::{calculate_distance, Point3};
///
/// let p = Point3::new(1.0, 2.0, 3.0);
/// assert_eq!(calculate_distance(p, p), 0.0);
/// assert!(calculate_distance(p, Point3::new(f32::NAN, 0.0, 0.0)).is_nan());
/// ```
pub fn calculate_distance(point1: Point3, point2: Point3) -> f32 {
    let d = point2 - point1;
    (d.x * d.x + d.y * d.y + d.z * d.z).sqrt()
}

/// Distance between the bounding-box centers of two objects.
///
/// NaN if either object has no geometry.
pub fn distance_between<A, B>(object1: &A, object2: &B) -> f32
where
    A: Bounded + ?Sized,
    B: Bounded + ?Sized,
{
    calculate_distance(
        object1.compute_bounding_box().center(),
        object2.compute_bounding_box().center(),
    )
}
