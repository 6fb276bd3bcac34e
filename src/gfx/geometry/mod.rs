//! # Procedural Geometry
//!
//! Generators for simple shapes, all producing interleaved `{3, 3, 2}`
//! position/normal/texcoord float arrays ready for a
//! [`GpuBuffer`](crate::gfx::buffer::GpuBuffer) and drawn as unindexed
//! triangle lists.
//!
//! The workhorse is [`revolve`], which sweeps a 2D outline around an axis;
//! [`sphere_vertices`] and [`cone_vertices`] are outlines fed through it.

pub mod primitives;

pub use primitives::*;
