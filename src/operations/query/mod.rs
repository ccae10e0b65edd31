mod bounding_box;
mod classify;
mod convex_hull;
mod distance;
mod enclosing_ball;
mod oriented_box;

pub use bounding_box::Aabb;
pub use classify::{classify_point, PointClassification, PointClassifier};
pub use convex_hull::ConvexHull;
pub use distance::{distance_to_mesh, point_triangle_distance};
pub use enclosing_ball::EnclosingBall;
pub use oriented_box::OrientedBox;
