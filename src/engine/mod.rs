// Engine - compression pipeline, session registry, archive packaging and statistics.

pub mod archive;
pub mod compressor;
pub mod registry;
pub mod stats;
