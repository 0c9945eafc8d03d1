pub mod backdrop_compositor;
pub mod source_mapping;
