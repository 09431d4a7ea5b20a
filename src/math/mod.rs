pub mod combinations;
pub mod polygon_3d;

/// 2D point type (pixel space on a section).
pub type Point2 = nalgebra::Point2<f64>;

/// 3D point type (model space).
pub type Point3 = nalgebra::Point3<f64>;

/// 3D vector type.
pub type Vector3 = nalgebra::Vector3<f64>;

/// Global geometric tolerance for floating-point comparisons.
pub const TOLERANCE: f64 = 1e-10;
