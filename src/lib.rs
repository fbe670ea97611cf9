//! Similarity-graph depixelization of pixel art into a simplified cell mesh.
//!
//! The pipeline runs strictly in order:
//!
//! 1. [`AdjacencyGraph::build`] links color-similar 8-neighbors.
//! 2. [`remove_trivial_edges`] drops diagonals inside flat-shaded 2x2 blocks.
//! 3. [`resolve_diagonals`] settles the remaining diagonal crossings with the curve,
//!    sparse-pixel and island heuristics.
//! 4. [`CellGraph::build`] reshapes every pixel into a polygon on a 4x refined grid.
//! 5. [`CellGraph::collapse_valency2`] removes interior degree-2 nodes.
//!
//! [`Depixelizer`] drives the stages and rejects out-of-order calls. The [`render`] module
//! draws the intermediate structures for inspection.

mod colors;
mod config;
mod direction;
mod error;
mod pipeline;
mod resolve;
mod similarity;
mod source;

pub mod cells;
pub mod render;

pub use cells::{Cell, CellGraph, NodeAdjacency, NodeId};
pub use colors::{Yuv, rgb_to_yuv, yuv_to_rgb};
pub use config::{DepixelConfig, HeuristicWeights, SimilarityThresholds};
pub use direction::Direction;
pub use error::{DepixelError, Result};
pub use pipeline::{DepixelOutput, Depixelizer, Stage};
pub use resolve::{ResolveSummary, Verdict, Votes, remove_trivial_edges, resolve_diagonals};
pub use similarity::AdjacencyGraph;
pub use source::ColorGrid;
