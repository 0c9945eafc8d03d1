pub mod capture_worker;
pub mod captured_frame;
pub mod double_buffer;
pub mod frame_cell;
pub mod frame_sampler;
pub mod sampler_config;
pub mod sampler_stats;
