//! Camera-centred chunk window
//!
//! Keeps one chunk per leaf cell of a quadtree. Moving the window shifts the
//! tree by one cell; chunks that fall out are unloaded and the newly exposed
//! row or column is loaded.

use bounded_tree::config::{Config, ConfigError};
use bounded_tree::foundation::math::{Vec3, AABB};
use bounded_tree::spatial::{ContainedQuadTree, Direction, Materialization, SpatialError, TreeConfig};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Demo settings, loadable from `.toml` or `.ron`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamerConfig {
    /// Width and depth of one chunk in world units
    pub chunk_side: f32,
    /// Vertical span of every chunk
    pub height: f32,
    /// Tree settings; the window is `2^max_depth` chunks wide
    pub tree: TreeConfig,
    /// Number of random one-chunk moves
    pub steps: usize,
    /// Seed for the random walk
    pub seed: u64,
}

impl Default for StreamerConfig {
    fn default() -> Self {
        Self {
            chunk_side: 16.0,
            height: 256.0,
            tree: TreeConfig {
                max_depth: 3,
                min_extent: 16.0,
                materialization: Materialization::Eager,
            },
            steps: 32,
            seed: 7,
        }
    }
}

impl Config for StreamerConfig {}

/// Errors the demo can stop on
#[derive(Error, Debug)]
pub enum StreamerError {
    /// Configuration could not be loaded
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Configuration values do not describe a usable window
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Column coordinates of a chunk, in chunk units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkId {
    /// Position along x
    pub x: i32,
    /// Position along z
    pub z: i32,
}

/// What one move of the window did
#[derive(Debug, Default)]
pub struct StepReport {
    /// Chunks that left the window
    pub unloaded: Vec<ChunkId>,
    /// Number of chunks loaded into the exposed cells
    pub loaded: usize,
}

/// Window of loaded chunks that can be walked one chunk at a time
pub struct ChunkStreamer {
    chunks: ContainedQuadTree<ChunkId>,
    chunk_side: f32,
    height: f32,
    /// Chunk coordinates of the window's minimum corner
    origin: ChunkId,
    /// Window width in chunks
    span: i32,
}

impl ChunkStreamer {
    /// Create an empty window centred on the world origin
    pub fn new(config: &StreamerConfig) -> Result<Self, StreamerError> {
        if config.chunk_side <= 0.0 || config.height <= 0.0 {
            return Err(StreamerError::Invalid(
                "chunk side and height must be positive".to_string(),
            ));
        }
        if config.tree.min_extent > config.chunk_side || config.tree.min_extent > config.height {
            return Err(StreamerError::Invalid(format!(
                "min_extent {} would stop subdivision above chunk size {}",
                config.tree.min_extent, config.chunk_side
            )));
        }
        let span = u32::try_from(config.tree.max_depth)
            .ok()
            .and_then(|depth| 1_i32.checked_shl(depth))
            .filter(|span| *span <= 1 << 12)
            .ok_or_else(|| StreamerError::Invalid(format!("max_depth {} is too deep", config.tree.max_depth)))?;

        let origin = ChunkId { x: -span / 2, z: -span / 2 };
        #[allow(clippy::cast_precision_loss)]
        let min = Vec3::new(origin.x as f32 * config.chunk_side, 0.0, origin.z as f32 * config.chunk_side);
        #[allow(clippy::cast_precision_loss)]
        let side = span as f32 * config.chunk_side;
        let bounds = AABB::new(min, min + Vec3::new(side, config.height, side));

        log::info!("Chunk window: {0}x{0} chunks of side {1}", span, config.chunk_side);
        Ok(Self {
            chunks: ContainedQuadTree::new(bounds, &config.tree),
            chunk_side: config.chunk_side,
            height: config.height,
            origin,
            span,
        })
    }

    /// Number of loaded chunks
    pub fn loaded(&self) -> usize {
        self.chunks.len()
    }

    /// Loaded chunk ids, in load order
    pub fn chunk_ids(&self) -> Vec<ChunkId> {
        self.chunks.items()
    }

    /// Region of the window in world units
    pub fn bounds(&self) -> &AABB {
        self.chunks.bounds()
    }

    /// Load a chunk into every cell of the window that has none
    ///
    /// Cells that already hold a chunk reject the insert as occupied, which
    /// is how loaded chunks are skipped.
    pub fn load_missing(&mut self) -> usize {
        let mut loaded = 0;
        for x in self.origin.x..self.origin.x + self.span {
            for z in self.origin.z..self.origin.z + self.span {
                let id = ChunkId { x, z };
                let region = self.chunk_region(id);
                match self.chunks.insert(id, region) {
                    Ok(_) => loaded += 1,
                    Err(rejected) if rejected.reason == SpatialError::Occupied => {}
                    Err(rejected) => log::warn!("Could not load {:?}: {}", id, rejected),
                }
            }
        }
        log::debug!("Loaded {} chunks", loaded);
        loaded
    }

    /// Move the window one chunk, unloading what falls out and loading what comes in
    pub fn step(&mut self, direction: Direction) -> StepReport {
        let unloaded: Vec<ChunkId> = self
            .chunks
            .shift(1, direction)
            .into_iter()
            .map(|(id, _)| id)
            .collect();
        match direction {
            Direction::North => self.origin.z -= 1,
            Direction::South => self.origin.z += 1,
            Direction::East => self.origin.x += 1,
            Direction::West => self.origin.x -= 1,
        }
        let loaded = self.load_missing();
        StepReport { unloaded, loaded }
    }

    fn chunk_region(&self, id: ChunkId) -> AABB {
        #[allow(clippy::cast_precision_loss)]
        let min = Vec3::new(id.x as f32 * self.chunk_side, 0.0, id.z as f32 * self.chunk_side);
        AABB::new(min, min + Vec3::new(self.chunk_side, self.height, self.chunk_side))
    }
}
