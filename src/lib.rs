//! Provides small helpers for working with 3D scene objects.
//!
//! - [`loader`]: asynchronous glTF/GLB and OBJ model loading from paths,
//!   `data:` URIs and HTTP URLs.
//! - [`spatial`]: Euclidean distance between points.
//! - [`collision`]: axis-aligned bounding-box collision between any two
//!   [`bounds::Bounded`] objects.
//!
//! The library only emits `tracing` events; installing a subscriber is left
//! to the application.
//!
//! # Examples
//! ```
//! use glam::Vec3;
//! use scenery::bounds::BoundingBox;
//! use scenery::collision::check_collision;
//! use scenery::spatial::calculate_distance;
//!
//! assert_eq!(calculate_distance(Vec3::ZERO, Vec3::new(3.0, 4.0, 0.0)), 5.0);
//!
//! let a = BoundingBox::new(Vec3::ZERO, Vec3::ONE);
//! let b = BoundingBox::new(Vec3::new(1.0, 0.0, 0.0), Vec3::new(2.0, 1.0, 1.0));
//! assert!(check_collision(&a, &b));
//! ```

pub mod bounds;
pub mod collision;
pub mod config;
pub mod error;
pub mod formats;
pub mod loader;
pub mod spatial;

pub use bounds::{Bounded, BoundingBox};
pub use collision::check_collision;
pub use error::LoadError;
pub use formats::Model;
pub use loader::ModelLoader;
pub use spatial::{calculate_distance, Point3};
