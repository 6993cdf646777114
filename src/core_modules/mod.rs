// The engine components, leaves first. Each stage only depends on the ones
// listed above it.

pub mod geometry;
pub mod pixel_buffer;
pub mod color_space;
pub mod color_threshold;
pub mod classifier;
pub mod region;
pub mod blob;
pub mod scratch;
pub mod size_filter;
pub mod extractor;
pub mod merger;
pub mod assembler;
