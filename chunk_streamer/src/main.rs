//! Chunk streaming demo
//!
//! Walks a window of terrain chunks around a bounded quadtree, unloading the
//! chunks that slide out and loading the ones that slide in.
//!
//! Usage: `chunk_streamer [config.toml|config.ron]`

mod streamer;

use bounded_tree::config::Config;
use bounded_tree::foundation::logging;
use bounded_tree::spatial::Direction;
use rand::prelude::*;

use streamer::{ChunkStreamer, StreamerConfig, StreamerError};

fn main() -> Result<(), StreamerError> {
    logging::init();

    let config = match std::env::args().nth(1) {
        Some(path) => StreamerConfig::load_from_file(path)?,
        None => StreamerConfig::default(),
    };

    let mut streamer = ChunkStreamer::new(&config)?;
    let initial = streamer.load_missing();
    log::info!("Initial load: {} chunks", initial);

    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut unloaded_total = 0;
    for step in 0..config.steps {
        let direction = Direction::ALL[rng.gen_range(0..Direction::ALL.len())];
        let report = streamer.step(direction);
        for id in &report.unloaded {
            log::debug!("Unloaded chunk ({}, {})", id.x, id.z);
        }
        log::info!(
            "Step {:>3} {:?}: unloaded {}, loaded {}, window min ({}, {})",
            step + 1,
            direction,
            report.unloaded.len(),
            report.loaded,
            streamer.bounds().min.x,
            streamer.bounds().min.z
        );
        unloaded_total += report.unloaded.len();
    }

    log::info!(
        "Done: {} chunks resident, {} unloaded over {} steps",
        streamer.loaded(),
        unloaded_total,
        config.steps
    );
    Ok(())
}
