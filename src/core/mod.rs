//! Core-Domänentypen: Kurve, Begrenzungsrahmen, Transformationen.

pub mod bbox;
pub mod curve;
pub mod transform;

pub use bbox::{clip, BoundingBox};
pub use curve::Curve;
pub use transform::{scale, shift, stretch};
