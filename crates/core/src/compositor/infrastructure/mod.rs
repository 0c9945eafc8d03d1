pub mod cpu_backdrop_compositor;
pub mod gaussian;
