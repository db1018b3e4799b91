/// 2D point type, used for texture coordinates.
pub type Point2 = nalgebra::Point2<f64>;

/// 3D point type.
pub type Point3 = nalgebra::Point3<f64>;

/// 2x2 matrix, used for georeferenced texture orientation.
pub type Matrix2 = nalgebra::Matrix2<f64>;

/// 3x4 world-to-texture transformation matrix.
pub type Matrix3x4 = nalgebra::Matrix3x4<f64>;

/// 4x4 transformation matrix.
pub type Matrix4 = nalgebra::Matrix4<f64>;
