//! tilecast: tile/segment collision and ray casting for 2D platformers (detection only, no resolution)

pub mod types;
pub mod api;
pub mod error;
pub mod narrowphase;
pub mod registry;
pub mod grid;
pub mod surfaces;
pub mod raycast;
pub mod query;
pub mod slope;
pub mod colliders;
pub mod world;

pub use crate::types::*;
pub use crate::api::*;
pub use crate::error::CollisionError;
pub use crate::colliders::{ColKey, ColliderDesc, ColliderId};
pub use crate::registry::TileCollisionRegistry;
pub use crate::grid::WorldGrid;
pub use crate::world::CollisionWorld;
