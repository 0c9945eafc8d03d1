pub mod capture_error;
pub mod capture_source;
pub mod content_surface;
pub mod white_frame;
