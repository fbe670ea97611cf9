//! Similarity graph: which 8-neighbors of every pixel share its color.

use std::collections::VecDeque;

use log::debug;
use serde::Serialize;

use crate::config::SimilarityThresholds;
use crate::direction::Direction;
use crate::pipeline::Stage;
use crate::source::ColorGrid;

/// Dense `height x width x 8` boolean adjacency, one slot per [`Direction`].
///
/// All mutations go through [`AdjacencyGraph::set_edge`], which writes both
/// endpoints, so flag `(p, d)` always equals flag `(p + d, d.opposite())`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdjacencyGraph {
    height: usize,
    width: usize,
    edges: Vec<bool>,
    #[serde(skip)]
    stage: Stage,
}

impl AdjacencyGraph {
    /// A graph without any edge.
    pub fn empty(height: usize, width: usize) -> Self {
        Self {
            height,
            width,
            edges: vec![false; height * width * 8],
            stage: Stage::SimilarityBuilt,
        }
    }

    /// Connects every pair of in-bounds neighbors whose colors are close under `thresholds`.
    pub fn build(colors: &ColorGrid, thresholds: &SimilarityThresholds) -> Self {
        let (height, width) = (colors.height(), colors.width());
        let mut graph = Self::empty(height, width);

        for row in 0..height {
            for col in 0..width {
                let here = colors.get(row, col);
                for dir in Direction::ALL {
                    let Some((nr, nc)) = dir.step(row, col, height, width) else {
                        continue;
                    };
                    if thresholds.is_close(here, colors.get(nr, nc)) {
                        graph.edges[Self::slot(width, row, col, dir)] = true;
                    }
                }
            }
        }

        debug!(
            "similarity graph {}x{}: {} edges",
            height,
            width,
            graph.edge_count()
        );
        graph
    }

    #[inline]
    fn slot(width: usize, row: usize, col: usize, dir: Direction) -> usize {
        (row * width + col) * 8 + dir.index()
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// The last pipeline stage applied to this graph.
    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub(crate) fn set_stage(&mut self, stage: Stage) {
        self.stage = stage;
    }

    #[inline]
    pub fn has_edge(&self, row: usize, col: usize, dir: Direction) -> bool {
        self.edges[Self::slot(self.width, row, col, dir)]
    }

    /// Sets or clears the edge between `(row, col)` and its neighbor in `dir` on both sides.
    ///
    /// Returns `false`, leaving the graph untouched, when the neighbor is out of bounds.
    pub fn set_edge(&mut self, row: usize, col: usize, dir: Direction, on: bool) -> bool {
        let Some((nr, nc)) = dir.step(row, col, self.height, self.width) else {
            return false;
        };
        let w = self.width;
        self.edges[Self::slot(w, row, col, dir)] = on;
        self.edges[Self::slot(w, nr, nc, dir.opposite())] = on;
        true
    }

    /// Number of edges incident to `(row, col)`.
    pub fn valency(&self, row: usize, col: usize) -> usize {
        Direction::ALL
            .iter()
            .filter(|&&d| self.has_edge(row, col, d))
            .count()
    }

    /// Connected neighbors of `(row, col)` in direction-table order.
    pub fn neighbors(&self, row: usize, col: usize) -> impl Iterator<Item = (usize, usize)> + '_ {
        Direction::ALL.into_iter().filter_map(move |d| {
            if self.has_edge(row, col, d) {
                d.step(row, col, self.height, self.width)
            } else {
                None
            }
        })
    }

    /// Number of undirected edges.
    pub fn edge_count(&self) -> usize {
        self.edges.iter().filter(|&&e| e).count() / 2
    }

    /// Whether the 2x2 block with top-left pixel `(row, col)` has both diagonals.
    pub fn is_crossing(&self, row: usize, col: usize) -> bool {
        row + 1 < self.height
            && col + 1 < self.width
            && self.has_edge(row, col, Direction::SouthEast)
            && self.has_edge(row, col + 1, Direction::SouthWest)
    }

    /// Top-left pixels of every crossing block, row-major.
    pub fn crossings(&self) -> Vec<(usize, usize)> {
        let mut out = Vec::new();
        for row in 0..self.height.saturating_sub(1) {
            for col in 0..self.width.saturating_sub(1) {
                if self.is_crossing(row, col) {
                    out.push((row, col));
                }
            }
        }
        out
    }

    /// Labels the connected components of the graph.
    ///
    /// Returns one label per pixel (row-major) and the number of components. Labels are
    /// assigned in order of each component's first pixel.
    pub fn label_components(&self) -> (Vec<usize>, usize) {
        let mut labels = vec![usize::MAX; self.height * self.width];
        let mut count = 0;
        let mut queue = VecDeque::new();

        for start in 0..labels.len() {
            if labels[start] != usize::MAX {
                continue;
            }
            labels[start] = count;
            queue.push_back((start / self.width, start % self.width));

            while let Some((r, c)) = queue.pop_front() {
                for (nr, nc) in self.neighbors(r, c) {
                    let idx = nr * self.width + nc;
                    if labels[idx] == usize::MAX {
                        labels[idx] = count;
                        queue.push_back((nr, nc));
                    }
                }
            }
            count += 1;
        }

        (labels, count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(height: usize, width: usize, f: impl Fn(usize, usize) -> [f32; 3]) -> ColorGrid {
        let pixels = (0..height * width)
            .map(|i| f(i / width, i % width))
            .collect();
        ColorGrid::from_pixels(height, width, pixels).unwrap()
    }

    #[test]
    fn uniform_image_connects_every_in_bounds_neighbor() {
        let colors = grid(3, 4, |_, _| [0.2, 0.5, 0.5]);
        let g = AdjacencyGraph::build(&colors, &SimilarityThresholds::default());

        for row in 0..3 {
            for col in 0..4 {
                for d in Direction::ALL {
                    let in_bounds = d.step(row, col, 3, 4).is_some();
                    assert_eq!(g.has_edge(row, col, d), in_bounds, "({row},{col}) {d:?}");
                }
            }
        }
        assert_eq!(g.valency(1, 1), 8);
        assert_eq!(g.valency(0, 0), 3);
        assert_eq!(g.crossings().len(), 6);
    }

    #[test]
    fn built_graph_is_symmetric() {
        let colors = grid(4, 4, |r, c| {
            let v = ((r * 7 + c * 3) % 5) as f32 * 0.1;
            [v, 0.5, 0.5]
        });
        let g = AdjacencyGraph::build(&colors, &SimilarityThresholds::default());
        for row in 0..4 {
            for col in 0..4 {
                for d in Direction::ALL {
                    if let Some((nr, nc)) = d.step(row, col, 4, 4) {
                        assert_eq!(g.has_edge(row, col, d), g.has_edge(nr, nc, d.opposite()));
                    }
                }
            }
        }
    }

    #[test]
    fn set_edge_writes_both_ends() {
        let mut g = AdjacencyGraph::empty(2, 2);
        assert!(g.set_edge(0, 1, Direction::SouthWest, true));
        assert!(g.has_edge(1, 0, Direction::NorthEast));
        assert!(!g.set_edge(0, 0, Direction::North, true));
        assert_eq!(g.edge_count(), 1);

        g.set_edge(1, 0, Direction::NorthEast, false);
        assert_eq!(g.edge_count(), 0);
    }

    #[test]
    fn components_follow_edges() {
        let mut g = AdjacencyGraph::empty(2, 3);
        g.set_edge(0, 0, Direction::East, true);
        g.set_edge(0, 1, Direction::SouthEast, true);
        let (labels, count) = g.label_components();
        assert_eq!(count, 4);
        assert_eq!(labels, vec![0, 0, 1, 2, 3, 0]);
    }
}
