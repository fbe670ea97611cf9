//! Removal of diagonal crossings from the similarity graph.
//!
//! Two passes run over every 2x2 block, both in row-major order of the block's top-left
//! pixel `(i, j)`:
//!
//! 1. [`remove_trivial_edges`] drops both diagonals of fully connected blocks, which
//!    belong to flat-shaded regions and need no disambiguation.
//! 2. [`resolve_diagonals`] settles the remaining crossings by voting. The *main*
//!    diagonal joins `(i, j)` and `(i + 1, j + 1)`, the *anti* diagonal joins
//!    `(i, j + 1)` and `(i + 1, j)`. A positive score keeps the main diagonal, a negative
//!    score keeps the anti diagonal and a tie cuts both.

use std::collections::VecDeque;

use log::{debug, trace};

use crate::config::DepixelConfig;
use crate::direction::Direction;
use crate::error::{DepixelError, Result};
use crate::pipeline::Stage;
use crate::similarity::AdjacencyGraph;
use crate::source::ColorGrid;

/// Which diagonal of a crossing block survived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    KeepMain,
    KeepAnti,
    CutBoth,
}

/// Per-decision counts of a [`resolve_diagonals`] pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolveSummary {
    pub kept_main: usize,
    pub kept_anti: usize,
    pub cut_both: usize,
}

impl ResolveSummary {
    pub fn total(&self) -> usize {
        self.kept_main + self.kept_anti + self.cut_both
    }
}

/// The three heuristic votes for one crossing block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Votes {
    pub curve: i64,
    pub sparse: i64,
    pub island: i64,
}

impl Votes {
    pub fn score(&self) -> i64 {
        self.curve + self.sparse + self.island
    }

    pub fn verdict(&self) -> Verdict {
        match self.score() {
            s if s > 0 => Verdict::KeepMain,
            s if s < 0 => Verdict::KeepAnti,
            _ => Verdict::CutBoth,
        }
    }
}

fn set_main(graph: &mut AdjacencyGraph, i: usize, j: usize, on: bool) {
    graph.set_edge(i, j, Direction::SouthEast, on);
}

fn set_anti(graph: &mut AdjacencyGraph, i: usize, j: usize, on: bool) {
    graph.set_edge(i, j + 1, Direction::SouthWest, on);
}

fn is_fully_connected(graph: &AdjacencyGraph, i: usize, j: usize) -> bool {
    graph.is_crossing(i, j)
        && graph.has_edge(i, j, Direction::East)
        && graph.has_edge(i, j, Direction::South)
        && graph.has_edge(i, j + 1, Direction::South)
        && graph.has_edge(i + 1, j, Direction::East)
}

fn check_stage(graph: &AdjacencyGraph, requested: Stage, allowed: &[Stage]) -> Result<()> {
    if allowed.contains(&graph.stage()) {
        Ok(())
    } else {
        Err(DepixelError::Consistency {
            requested,
            current: graph.stage(),
        })
    }
}

/// Clears both diagonals of every fully connected 2x2 block.
///
/// Returns the number of blocks cleared. Running it again is a no-op.
///
/// # Errors
///
/// [`DepixelError::Consistency`] if the graph has already been resolved.
pub fn remove_trivial_edges(graph: &mut AdjacencyGraph) -> Result<usize> {
    check_stage(
        graph,
        Stage::TrivialEdgesRemoved,
        &[Stage::SimilarityBuilt, Stage::TrivialEdgesRemoved],
    )?;

    let mut cleared = 0;
    for i in 0..graph.height().saturating_sub(1) {
        for j in 0..graph.width().saturating_sub(1) {
            if is_fully_connected(graph, i, j) {
                set_main(graph, i, j, false);
                set_anti(graph, i, j, false);
                cleared += 1;
            }
        }
    }

    graph.set_stage(Stage::TrivialEdgesRemoved);
    debug!("removed diagonals from {cleared} flat blocks");
    Ok(cleared)
}

/// Resolves every remaining crossing with the curve, sparse-pixel and island heuristics.
///
/// The graph is updated in place while scanning, so later blocks see earlier decisions.
/// Running it on an already resolved graph changes nothing.
///
/// # Errors
///
/// - [`DepixelError::Consistency`] if trivial edges have not been removed yet.
/// - [`DepixelError::InvalidInput`] if `colors` does not match the graph dimensions.
pub fn resolve_diagonals(
    graph: &mut AdjacencyGraph,
    colors: &ColorGrid,
    config: &DepixelConfig,
) -> Result<ResolveSummary> {
    check_stage(
        graph,
        Stage::DiagonalsResolved,
        &[Stage::TrivialEdgesRemoved, Stage::DiagonalsResolved],
    )?;
    if (colors.height(), colors.width()) != (graph.height(), graph.width()) {
        return Err(DepixelError::invalid(format!(
            "colors are {}x{} but the graph is {}x{}",
            colors.height(),
            colors.width(),
            graph.height(),
            graph.width()
        )));
    }

    let mut resolver = Resolver::new(graph.height(), graph.width());
    let mut summary = ResolveSummary::default();

    for i in 0..graph.height().saturating_sub(1) {
        for j in 0..graph.width().saturating_sub(1) {
            if !graph.is_crossing(i, j) {
                continue;
            }
            let votes = resolver.vote(graph, colors, config, i, j);
            let verdict = votes.verdict();
            trace!(
                "crossing at ({i},{j}): curve {} sparse {} island {} -> {verdict:?}",
                votes.curve, votes.sparse, votes.island
            );
            match verdict {
                Verdict::KeepMain => {
                    set_anti(graph, i, j, false);
                    summary.kept_main += 1;
                }
                Verdict::KeepAnti => {
                    set_main(graph, i, j, false);
                    summary.kept_anti += 1;
                }
                Verdict::CutBoth => {
                    set_main(graph, i, j, false);
                    set_anti(graph, i, j, false);
                    summary.cut_both += 1;
                }
            }
        }
    }

    graph.set_stage(Stage::DiagonalsResolved);
    debug!(
        "resolved {} crossings: {} main, {} anti, {} cut",
        summary.total(),
        summary.kept_main,
        summary.kept_anti,
        summary.cut_both
    );
    Ok(summary)
}

/// Scratch state reused across blocks.
struct Resolver {
    width: usize,
    // visit stamps for the curve traversal; a pixel is visited when its stamp equals `epoch`
    stamps: Vec<u32>,
    epoch: u32,
    queue: VecDeque<(usize, usize, usize)>,
}

impl Resolver {
    fn new(height: usize, width: usize) -> Self {
        Self {
            width,
            stamps: vec![0; height * width],
            epoch: 0,
            queue: VecDeque::new(),
        }
    }

    fn vote(
        &mut self,
        graph: &AdjacencyGraph,
        colors: &ColorGrid,
        config: &DepixelConfig,
        i: usize,
        j: usize,
    ) -> Votes {
        let main = self
            .curve_length(graph, i, j)
            .max(self.curve_length(graph, i + 1, j + 1));
        let anti = self
            .curve_length(graph, i, j + 1)
            .max(self.curve_length(graph, i + 1, j));

        Votes {
            curve: main as i64 - anti as i64,
            sparse: sparse_vote(colors, config, i, j),
            island: island_vote(graph, config.heuristics.island, i, j),
        }
    }

    fn next_epoch(&mut self) -> u32 {
        self.epoch = self.epoch.wrapping_add(1);
        if self.epoch == 0 {
            self.stamps.fill(0);
            self.epoch = 1;
        }
        self.epoch
    }

    /// Length of the longest valency-2 chain reached breadth-first from `(row, col)`.
    ///
    /// A start pixel of valency other than 2 has length 0. Pixels of valency other
    /// than 2 end a branch but still count toward its length.
    fn curve_length(&mut self, graph: &AdjacencyGraph, row: usize, col: usize) -> usize {
        if graph.valency(row, col) != 2 {
            return 0;
        }
        let epoch = self.next_epoch();
        let w = self.width;
        self.stamps[row * w + col] = epoch;
        self.queue.clear();
        self.queue.push_back((row, col, 0));

        let mut longest = 0;
        while let Some((r, c, len)) = self.queue.pop_front() {
            longest = longest.max(len);
            if len > 0 && graph.valency(r, c) != 2 {
                continue;
            }
            for (nr, nc) in graph.neighbors(r, c) {
                let stamp = &mut self.stamps[nr * w + nc];
                if *stamp != epoch {
                    *stamp = epoch;
                    self.queue.push_back((nr, nc, len + 1));
                }
            }
        }
        longest
    }
}

/// Votes for the sparser of the two colors in a window around the block.
///
/// Pixels close to the main diagonal's color vote -1, otherwise pixels close to the anti
/// diagonal's color vote +1.
fn sparse_vote(colors: &ColorGrid, config: &DepixelConfig, i: usize, j: usize) -> i64 {
    let t = &config.thresholds;
    let r = config.heuristics.sparse_radius;
    let main_color = colors.get(i, j);
    let anti_color = colors.get(i + 1, j);

    let rows = i.saturating_sub(r)..(i + r + 1).min(colors.height());
    let cols = j.saturating_sub(r)..(j + r + 1).min(colors.width());

    let mut sum = 0;
    for k in rows {
        for l in cols.clone() {
            let here = colors.get(k, l);
            if t.is_close(here, main_color) {
                sum -= 1;
            } else if t.is_close(here, anti_color) {
                sum += 1;
            }
        }
    }
    sum
}

/// Votes to keep a diagonal whose endpoint would otherwise be left without neighbors.
fn island_vote(graph: &AdjacencyGraph, weight: i32, i: usize, j: usize) -> i64 {
    let weight = i64::from(weight);
    let mut vote = 0;
    if graph.valency(i, j) == 1 || graph.valency(i + 1, j + 1) == 1 {
        vote += weight;
    }
    if graph.valency(i, j + 1) == 1 || graph.valency(i + 1, j) == 1 {
        vote -= weight;
    }
    vote
}

#[cfg(test)]
mod tests {
    use super::*;

    const BLACK: [f32; 3] = [0.0, 0.5, 0.5];
    const WHITE: [f32; 3] = [1.0, 0.5, 0.5];

    fn colors(rows: &[&str]) -> ColorGrid {
        let height = rows.len();
        let width = rows[0].len();
        let pixels = rows
            .iter()
            .flat_map(|r| r.chars())
            .map(|ch| if ch == '#' { BLACK } else { WHITE })
            .collect();
        ColorGrid::from_pixels(height, width, pixels).unwrap()
    }

    fn prepared(rows: &[&str]) -> (ColorGrid, AdjacencyGraph) {
        let c = colors(rows);
        let mut g = AdjacencyGraph::build(&c, &DepixelConfig::default().thresholds);
        remove_trivial_edges(&mut g).unwrap();
        (c, g)
    }

    #[test]
    fn flat_blocks_lose_their_diagonals() {
        let (_, g) = prepared(&["...", "...", "..."]);
        assert!(g.crossings().is_empty());
        assert_eq!(g.valency(1, 1), 4);
        assert_eq!(g.edge_count(), 12);
    }

    #[test]
    fn trivial_removal_keeps_partial_blocks() {
        // the anti diagonal of the top-left block is not part of a flat block
        let (_, g) = prepared(&["#.", ".#"]);
        assert!(g.has_edge(0, 0, Direction::SouthEast));
        assert!(g.has_edge(0, 1, Direction::SouthWest));
        assert_eq!(g.crossings(), vec![(0, 0)]);
    }

    #[test]
    fn checkerboard_crossing_is_cut_on_tie() {
        let (c, mut g) = prepared(&["#.", ".#"]);
        let summary = resolve_diagonals(&mut g, &c, &DepixelConfig::default()).unwrap();
        // both diagonals are valency-1 islands and the colors are balanced
        assert_eq!(summary.cut_both, 1);
        assert_eq!(g.edge_count(), 0);
    }

    #[test]
    fn island_vote_keeps_the_stranded_diagonal() {
        // a lone dark line segment crossing a light diagonal pair inside a larger light region
        let (c, mut g) = prepared(&["#....", ".#...", "....."]);
        assert!(g.is_crossing(0, 0));
        let votes = Resolver::new(3, 5).vote(&g, &c, &DepixelConfig::default(), 0, 0);
        assert_eq!(votes.island, 5);
        resolve_diagonals(&mut g, &c, &DepixelConfig::default()).unwrap();
        assert!(g.has_edge(0, 0, Direction::SouthEast));
        assert!(!g.has_edge(0, 1, Direction::SouthWest));
    }

    #[test]
    fn sparse_vote_favors_minority_color() {
        // light main diagonal in a dark field: keep it
        let c = colors(&["####", "#.##", "##.#", "####"]);
        assert!(sparse_vote(&c, &DepixelConfig::default(), 1, 1) > 0);
        // dark main diagonal in a dark field: keep the light anti diagonal
        let c = colors(&["####", "##.#", "#.##", "####"]);
        assert!(sparse_vote(&c, &DepixelConfig::default(), 1, 1) < 0);
    }

    #[test]
    fn curve_length_follows_valency_two_chain() {
        let mut g = AdjacencyGraph::empty(1, 6);
        for col in 0..5 {
            g.set_edge(0, col, Direction::East, true);
        }
        let mut r = Resolver::new(1, 6);
        assert_eq!(r.curve_length(&g, 0, 0), 0);
        assert_eq!(r.curve_length(&g, 0, 2), 3);
        assert_eq!(r.curve_length(&g, 0, 1), 4);
    }

    #[test]
    fn resolution_is_idempotent() {
        let (c, mut g) = prepared(&["#.#.#", ".#.#.", "#.#.#", ".#.#."]);
        resolve_diagonals(&mut g, &c, &DepixelConfig::default()).unwrap();
        assert!(g.crossings().is_empty());

        let before = g.clone();
        let again = resolve_diagonals(&mut g, &c, &DepixelConfig::default()).unwrap();
        assert_eq!(again.total(), 0);
        assert_eq!(g, before);
    }

    #[test]
    fn resolving_before_trivial_removal_is_rejected() {
        let c = colors(&["..", ".."]);
        let mut g = AdjacencyGraph::build(&c, &DepixelConfig::default().thresholds);
        assert_eq!(
            resolve_diagonals(&mut g, &c, &DepixelConfig::default()),
            Err(DepixelError::Consistency {
                requested: Stage::DiagonalsResolved,
                current: Stage::SimilarityBuilt,
            })
        );
    }

    #[test]
    fn mismatched_colors_are_rejected() {
        let (_, mut g) = prepared(&["..", ".."]);
        let other = colors(&["...", "..."]);
        assert!(matches!(
            resolve_diagonals(&mut g, &other, &DepixelConfig::default()),
            Err(DepixelError::InvalidInput(_))
        ));
    }
}
