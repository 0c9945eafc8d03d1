pub mod gpu_copy_capture_source;
pub mod live_view_capture_source;
pub mod shared_surface;
pub mod static_image_capture_source;
