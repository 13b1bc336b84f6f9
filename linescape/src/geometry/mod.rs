//! Planar geometry primitives shared by the tiling, camera and render layers.

mod box2d;

pub use box2d::{Box2D, EQUALS_EPSILON};
