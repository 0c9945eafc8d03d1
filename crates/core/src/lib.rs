pub mod capture;
pub mod compositor;
pub mod governor;
pub mod sampler;
pub mod shared;
