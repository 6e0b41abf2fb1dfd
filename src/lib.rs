pub mod camera;
pub mod config;
pub mod dump;
pub mod error;
pub mod events;
pub mod io;
pub mod quadtree;

pub use crate::error::Error;
pub use crate::quadtree::NodeId;
pub use crate::quadtree::NodeRef;
pub use crate::quadtree::Point;
pub use crate::quadtree::SkipQuadTree;
pub use crate::quadtree::Square;
