//! Stage-ordered driver over the whole depixelization pipeline.

use std::fmt;

use log::{debug, info};
use serde::Serialize;

use crate::cells::CellGraph;
use crate::config::DepixelConfig;
use crate::error::{DepixelError, Result};
use crate::resolve::{ResolveSummary, remove_trivial_edges, resolve_diagonals};
use crate::similarity::AdjacencyGraph;
use crate::source::ColorGrid;

/// Pipeline stages, in the only order they may run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
pub enum Stage {
    /// Input accepted, nothing computed yet.
    #[default]
    Ready,
    SimilarityBuilt,
    TrivialEdgesRemoved,
    DiagonalsResolved,
    CellsBuilt,
    Collapsed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Ready => "ready",
            Stage::SimilarityBuilt => "build-similarity",
            Stage::TrivialEdgesRemoved => "remove-trivial",
            Stage::DiagonalsResolved => "resolve-diagonals",
            Stage::CellsBuilt => "build-cells",
            Stage::Collapsed => "collapse",
        };
        f.write_str(name)
    }
}

/// Terminal, consumer-facing result of a full run.
#[derive(Debug, Clone, Serialize)]
pub struct DepixelOutput {
    /// The resolved similarity graph, kept for diagnostics.
    pub graph: AdjacencyGraph,
    /// Collapsed cells and node adjacency.
    pub cells: CellGraph,
}

/// Runs the pipeline stages on one image, refusing any out-of-order call.
///
/// ```
/// use depixel_cells::{ColorGrid, DepixelConfig, Depixelizer, Stage};
///
/// let colors = ColorGrid::from_pixels(2, 2, vec![[0.5, 0.5, 0.5]; 4]).unwrap();
/// let mut run = Depixelizer::new(colors, DepixelConfig::default()).unwrap();
/// assert!(run.resolve_diagonals().is_err());
///
/// run.build_similarity_graph().unwrap();
/// run.remove_trivial_edges().unwrap();
/// run.resolve_diagonals().unwrap();
/// run.build_cells().unwrap();
/// run.collapse().unwrap();
/// assert_eq!(run.stage(), Stage::Collapsed);
/// ```
#[derive(Debug, Clone)]
pub struct Depixelizer {
    colors: ColorGrid,
    config: DepixelConfig,
    graph: Option<AdjacencyGraph>,
    cells: Option<CellGraph>,
    stage: Stage,
}

impl Depixelizer {
    /// # Errors
    ///
    /// [`DepixelError::InvalidInput`] if `config` fails validation.
    pub fn new(colors: ColorGrid, config: DepixelConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            colors,
            config,
            graph: None,
            cells: None,
            stage: Stage::Ready,
        })
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn colors(&self) -> &ColorGrid {
        &self.colors
    }

    pub fn config(&self) -> &DepixelConfig {
        &self.config
    }

    pub fn graph(&self) -> Option<&AdjacencyGraph> {
        self.graph.as_ref()
    }

    pub fn cells(&self) -> Option<&CellGraph> {
        self.cells.as_ref()
    }

    fn advance(&mut self, requested: Stage) -> Result<()> {
        let expected = match requested {
            Stage::Ready => None,
            Stage::SimilarityBuilt => Some(Stage::Ready),
            Stage::TrivialEdgesRemoved => Some(Stage::SimilarityBuilt),
            Stage::DiagonalsResolved => Some(Stage::TrivialEdgesRemoved),
            Stage::CellsBuilt => Some(Stage::DiagonalsResolved),
            Stage::Collapsed => Some(Stage::CellsBuilt),
        };
        if expected != Some(self.stage) {
            return Err(DepixelError::Consistency {
                requested,
                current: self.stage,
            });
        }
        debug!("running stage {requested}");
        Ok(())
    }

    fn graph_mut(&mut self, requested: Stage) -> Result<&mut AdjacencyGraph> {
        let current = self.stage;
        self.graph
            .as_mut()
            .ok_or(DepixelError::Consistency { requested, current })
    }

    pub fn build_similarity_graph(&mut self) -> Result<&AdjacencyGraph> {
        self.advance(Stage::SimilarityBuilt)?;
        let graph = AdjacencyGraph::build(&self.colors, &self.config.thresholds);
        self.stage = Stage::SimilarityBuilt;
        Ok(&*self.graph.insert(graph))
    }

    /// Returns the number of flat blocks whose diagonals were cleared.
    pub fn remove_trivial_edges(&mut self) -> Result<usize> {
        self.advance(Stage::TrivialEdgesRemoved)?;
        let cleared = remove_trivial_edges(self.graph_mut(Stage::TrivialEdgesRemoved)?)?;
        self.stage = Stage::TrivialEdgesRemoved;
        Ok(cleared)
    }

    pub fn resolve_diagonals(&mut self) -> Result<ResolveSummary> {
        self.advance(Stage::DiagonalsResolved)?;
        let current = self.stage;
        let graph = self.graph.as_mut().ok_or(DepixelError::Consistency {
            requested: Stage::DiagonalsResolved,
            current,
        })?;
        let summary = resolve_diagonals(graph, &self.colors, &self.config)?;
        self.stage = Stage::DiagonalsResolved;
        Ok(summary)
    }

    pub fn build_cells(&mut self) -> Result<&CellGraph> {
        self.advance(Stage::CellsBuilt)?;
        let cells = CellGraph::build(self.graph_mut(Stage::CellsBuilt)?)?;
        self.stage = Stage::CellsBuilt;
        Ok(&*self.cells.insert(cells))
    }

    /// Returns the number of collapsed nodes.
    pub fn collapse(&mut self) -> Result<usize> {
        self.advance(Stage::Collapsed)?;
        let current = self.stage;
        let cells = self.cells.as_mut().ok_or(DepixelError::Consistency {
            requested: Stage::Collapsed,
            current,
        })?;
        let removed = cells.collapse_valency2()?;
        self.stage = Stage::Collapsed;
        Ok(removed)
    }

    /// Runs every stage that has not run yet and hands back the final structures.
    ///
    /// # Errors
    ///
    /// Any error from the remaining stages.
    pub fn run(mut self) -> Result<DepixelOutput> {
        while self.stage < Stage::Collapsed {
            match self.stage {
                Stage::Ready => {
                    self.build_similarity_graph()?;
                }
                Stage::SimilarityBuilt => {
                    self.remove_trivial_edges()?;
                }
                Stage::TrivialEdgesRemoved => {
                    self.resolve_diagonals()?;
                }
                Stage::DiagonalsResolved => {
                    self.build_cells()?;
                }
                Stage::CellsBuilt | Stage::Collapsed => {
                    self.collapse()?;
                }
            }
        }

        let (Some(graph), Some(cells)) = (self.graph, self.cells) else {
            return Err(DepixelError::Consistency {
                requested: Stage::Collapsed,
                current: self.stage,
            });
        };
        info!(
            "depixelized {}x{}: {} similarity edges, {} cells over {} nodes",
            graph.height(),
            graph.width(),
            graph.edge_count(),
            cells.cells().len(),
            cells.nodes().live_nodes().count()
        );
        Ok(DepixelOutput { graph, cells })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uniform(height: usize, width: usize) -> Depixelizer {
        let colors =
            ColorGrid::from_pixels(height, width, vec![[0.3, 0.5, 0.5]; height * width]).unwrap();
        Depixelizer::new(colors, DepixelConfig::default()).unwrap()
    }

    #[test]
    fn stages_must_run_in_order() {
        let mut run = uniform(2, 2);
        assert_eq!(
            run.build_cells().err(),
            Some(DepixelError::Consistency {
                requested: Stage::CellsBuilt,
                current: Stage::Ready,
            })
        );

        run.build_similarity_graph().unwrap();
        assert!(matches!(
            run.build_similarity_graph(),
            Err(DepixelError::Consistency { .. })
        ));
        assert!(run.collapse().is_err());
        assert_eq!(run.stage(), Stage::SimilarityBuilt);

        run.remove_trivial_edges().unwrap();
        run.resolve_diagonals().unwrap();
        assert!(run.remove_trivial_edges().is_err());
        run.build_cells().unwrap();
        run.collapse().unwrap();
        assert!(run.collapse().is_err());
    }

    #[test]
    fn invalid_config_is_rejected_up_front() {
        let colors = ColorGrid::from_pixels(1, 1, vec![[0.0; 3]]).unwrap();
        let mut config = DepixelConfig::default();
        config.thresholds.y = f32::INFINITY;
        assert!(matches!(
            Depixelizer::new(colors, config),
            Err(DepixelError::InvalidInput(_))
        ));
    }

    #[test]
    fn run_returns_collapsed_cells() {
        let out = uniform(3, 2).run().unwrap();
        assert_eq!(out.graph.stage(), Stage::DiagonalsResolved);
        assert_eq!(out.cells.stage(), Stage::Collapsed);
        assert_eq!(out.cells.cells().len(), 6);
    }

    #[test]
    fn run_resumes_after_manual_stages() {
        let mut run = uniform(2, 3);
        run.build_similarity_graph().unwrap();
        run.remove_trivial_edges().unwrap();
        let out = run.run().unwrap();
        assert_eq!(out.cells.stage(), Stage::Collapsed);
        assert_eq!(out.cells.cells().len(), 6);
    }

    #[test]
    fn stage_names_read_like_commands() {
        assert_eq!(Stage::DiagonalsResolved.to_string(), "resolve-diagonals");
        assert!(Stage::Ready < Stage::Collapsed);
    }
}
