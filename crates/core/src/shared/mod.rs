pub mod clock;
pub mod constants;
pub mod content_size;
pub mod pixels;
