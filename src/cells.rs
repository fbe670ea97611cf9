//! Reshaped pixel cells on a 4x refined grid and their shared node graph.
//!
//! Pixel `(r, c)` covers refined rows `4r..=4r + 4` and cols `4c..=4c + 4`. Its cell walks
//! clockwise (rows grow downward) from the top-left corner: every side contributes its
//! midpoint, every corner contributes either the plain corner node, a single node pulled
//! inward when the neighbors around that corner are linked diagonally past it, or a split
//! pair when the pixel itself is linked diagonally through it.

use std::collections::BTreeSet;

use imageproc::point::Point;
use log::debug;
use num_traits::{NumCast, Zero};
use serde::Serialize;

use crate::direction::Direction;
use crate::error::{DepixelError, Result};
use crate::pipeline::Stage;
use crate::similarity::AdjacencyGraph;

/// Refined-grid subdivisions per pixel side.
pub const REFINE: usize = 4;

pub type NodeId = usize;

/// Node ids of one pixel's boundary in clockwise order. The last node links back to the first.
pub type Cell = Vec<NodeId>;

/// Undirected graph over every node of the `(4H + 1) x (4W + 1)` refined grid.
///
/// Slots are indexed by node id `row * cols + col`; unused nodes simply have no neighbors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeAdjacency {
    rows: usize,
    cols: usize,
    links: Vec<BTreeSet<NodeId>>,
}

impl NodeAdjacency {
    fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            links: vec![BTreeSet::new(); rows * cols],
        }
    }

    #[inline]
    pub fn id(&self, row: usize, col: usize) -> NodeId {
        row * self.cols + col
    }

    /// `(row, col)` of a node on the refined grid.
    #[inline]
    pub fn position(&self, id: NodeId) -> (usize, usize) {
        (id / self.cols, id % self.cols)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Whether the node lies on the outer border of the refined grid.
    pub fn is_border(&self, id: NodeId) -> bool {
        let (row, col) = self.position(id);
        row == 0 || col == 0 || row + 1 == self.rows || col + 1 == self.cols
    }

    pub fn degree(&self, id: NodeId) -> usize {
        self.links[id].len()
    }

    pub fn neighbors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.links[id].iter().copied()
    }

    pub fn are_adjacent(&self, a: NodeId, b: NodeId) -> bool {
        self.links[a].contains(&b)
    }

    /// Ids of every node with at least one neighbor.
    pub fn live_nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.links.len()).filter(|&id| !self.links[id].is_empty())
    }

    pub fn edge_count(&self) -> usize {
        self.links.iter().map(BTreeSet::len).sum::<usize>() / 2
    }

    fn link(&mut self, a: NodeId, b: NodeId) {
        if a != b {
            self.links[a].insert(b);
            self.links[b].insert(a);
        }
    }

    fn unlink(&mut self, a: NodeId, b: NodeId) {
        self.links[a].remove(&b);
        self.links[b].remove(&a);
    }
}

/// Per-pixel cells plus the node graph linking them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CellGraph {
    height: usize,
    width: usize,
    cells: Vec<Cell>,
    nodes: NodeAdjacency,
    #[serde(skip)]
    stage: Stage,
}

/// The four pixel corners in clockwise walk order, as `(Δrow, Δcol)` signs.
const CORNERS: [(isize, isize); 4] = [(-1, -1), (-1, 1), (1, 1), (1, -1)];

/// Side midpoints following each corner of [`CORNERS`], relative to the pixel origin.
const MIDPOINTS: [(usize, usize); 4] = [(0, 2), (2, 4), (4, 2), (2, 0)];

impl CellGraph {
    /// Builds one cell per pixel from a resolved similarity graph.
    ///
    /// Cells are stored row-major by pixel. Every consecutive node pair of every cell,
    /// including last-to-first, becomes an edge of [`CellGraph::nodes`], so neighboring
    /// cells share exactly the nodes of their common boundary.
    ///
    /// # Errors
    ///
    /// [`DepixelError::Consistency`] if the graph has not been resolved yet, or was edited
    /// afterwards and contains a diagonal crossing again.
    ///
    /// # Examples
    ///
    /// ```
    /// use depixel_cells::{AdjacencyGraph, CellGraph, Stage};
    ///
    /// let graph = AdjacencyGraph::empty(1, 1);
    /// assert!(CellGraph::build(&graph).is_err());
    ///
    /// let cells = depixel_cells::Depixelizer::new(
    ///     depixel_cells::ColorGrid::from_pixels(1, 2, vec![[0.5; 3]; 2]).unwrap(),
    ///     Default::default(),
    /// )
    /// .unwrap()
    /// .run()
    /// .unwrap()
    /// .cells;
    /// assert_eq!(cells.stage(), Stage::Collapsed);
    /// assert_eq!(cells.cells().len(), 2);
    /// ```
    pub fn build(graph: &AdjacencyGraph) -> Result<Self> {
        let stale = graph.stage() != Stage::DiagonalsResolved || !graph.crossings().is_empty();
        if stale {
            return Err(DepixelError::Consistency {
                requested: Stage::CellsBuilt,
                current: graph.stage(),
            });
        }

        let (height, width) = (graph.height(), graph.width());
        let mut nodes = NodeAdjacency::new(REFINE * height + 1, REFINE * width + 1);
        let mut cells = Vec::with_capacity(height * width);

        for row in 0..height {
            for col in 0..width {
                let cell = Self::pixel_cell(graph, &nodes, row, col);
                for (k, &a) in cell.iter().enumerate() {
                    nodes.link(a, cell[(k + 1) % cell.len()]);
                }
                cells.push(cell);
            }
        }

        debug!(
            "built {} cells over {} nodes and {} edges",
            cells.len(),
            nodes.live_nodes().count(),
            nodes.edge_count()
        );
        Ok(Self {
            height,
            width,
            cells,
            nodes,
            stage: Stage::CellsBuilt,
        })
    }

    fn pixel_cell(graph: &AdjacencyGraph, nodes: &NodeAdjacency, row: usize, col: usize) -> Cell {
        let (top, left) = (REFINE * row, REFINE * col);
        // corner offsets reach one step outside the pixel, which never leaves the grid
        // because border corners cannot carry diagonals
        let at = |r: isize, c: isize| -> NodeId {
            nodes.id((top as isize + r) as usize, (left as isize + c) as usize)
        };

        let mut cell = Vec::with_capacity(12);
        for (&(dr, dc), &(mr, mc)) in CORNERS.iter().zip(&MIDPOINTS) {
            // the corner point, relative to the pixel origin
            let (cr, cc) = (2 + 2 * dr, 2 + 2 * dc);

            if graph.has_edge(row, col, Direction::diagonal(dr, dc)) {
                // one node inside the pixel across the top/bottom side, one inside the
                // pixel across the left/right side, in walk order
                let beyond_row = at(cr + dr, cc - dc);
                let beyond_col = at(cr - dr, cc + dc);
                if dr * dc < 0 {
                    cell.extend([beyond_row, beyond_col]);
                } else {
                    cell.extend([beyond_col, beyond_row]);
                }
            } else if Self::is_cut(graph, row, col, dr, dc) {
                cell.push(at(cr - dr, cc - dc));
            } else {
                cell.push(at(cr, cc));
            }
            cell.push(nodes.id(top + mr, left + mc));
        }
        cell
    }

    /// Whether the two pixels flanking corner `(dr, dc)` of `(row, col)` are linked past it.
    fn is_cut(graph: &AdjacencyGraph, row: usize, col: usize, dr: isize, dc: isize) -> bool {
        match row.checked_add_signed(dr) {
            Some(across) if across < graph.height() => {
                graph.has_edge(across, col, Direction::diagonal(-dr, dc))
            }
            _ => false,
        }
    }

    /// Removes every non-border node of degree 2, joining its two neighbors directly.
    ///
    /// Candidates are picked from the degrees measured before any removal; each is then
    /// collapsed against its current neighbors, so runs of degree-2 nodes fold into a
    /// single edge regardless of visiting order. A node whose neighbors are already
    /// adjacent is kept to avoid doubling an edge. Cells are rewritten to skip removed
    /// nodes, keeping their cyclic order.
    ///
    /// Returns the number of removed nodes.
    ///
    /// # Errors
    ///
    /// [`DepixelError::Consistency`] if the cells were already collapsed.
    pub fn collapse_valency2(&mut self) -> Result<usize> {
        if self.stage != Stage::CellsBuilt {
            return Err(DepixelError::Consistency {
                requested: Stage::Collapsed,
                current: self.stage,
            });
        }

        let nodes = &self.nodes;
        let candidates: Vec<NodeId> = nodes
            .live_nodes()
            .filter(|&id| nodes.degree(id) == 2 && !nodes.is_border(id))
            .collect();

        let mut removed = vec![false; self.nodes.links.len()];
        let mut count = 0;
        for id in candidates {
            if self.nodes.degree(id) != 2 {
                continue;
            }
            let pair = {
                let mut it = self.nodes.neighbors(id);
                (it.next(), it.next())
            };
            let (Some(a), Some(b)) = pair else {
                continue;
            };
            if self.nodes.are_adjacent(a, b) {
                continue;
            }
            self.nodes.unlink(id, a);
            self.nodes.unlink(id, b);
            self.nodes.link(a, b);
            removed[id] = true;
            count += 1;
        }

        for cell in &mut self.cells {
            cell.retain(|&id| !removed[id]);
        }
        self.stage = Stage::Collapsed;
        debug!("collapsed {count} degree-2 nodes");
        Ok(count)
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// All cells, row-major by pixel.
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn cell(&self, row: usize, col: usize) -> &Cell {
        &self.cells[row * self.width + col]
    }

    pub fn nodes(&self) -> &NodeAdjacency {
        &self.nodes
    }

    /// Returns the boundary of pixel `(row, col)` as image-space points.
    ///
    /// One pixel spans `scale` units, so a refined-grid node at `(r, c)` maps to
    /// `x = c * scale / 4`, `y = r * scale / 4`.
    ///
    /// # Type Parameters
    ///
    /// * `T`: coordinate type of the returned points. Values that cannot be represented in
    ///   `T` fall back to zero.
    pub fn cell_points<T>(&self, row: usize, col: usize, scale: f64) -> Vec<Point<T>>
    where
        T: NumCast + Zero + Copy,
    {
        let unit = scale / REFINE as f64;
        self.cell(row, col)
            .iter()
            .map(|&id| {
                let (r, c) = self.nodes.position(id);
                let x = T::from(c as f64 * unit).unwrap_or_else(T::zero);
                let y = T::from(r as f64 * unit).unwrap_or_else(T::zero);
                Point::new(x, y)
            })
            .collect()
    }
}
