/// Name of the capture worker thread.
pub const CAPTURE_THREAD_NAME: &str = "backdrop-capture";

/// Name of the thread servicing asynchronous surface copies.
pub const COPY_THREAD_NAME: &str = "backdrop-copy";

/// Copies allowed to wait behind the one being serviced.
pub const COPY_QUEUE_DEPTH: usize = 1;

/// Bounded wait for an asynchronous surface copy to complete.
pub const GPU_COPY_TIMEOUT_MS: u64 = 45;

/// Directory under the platform config dir holding tuning overrides.
pub const CONFIG_DIR_NAME: &str = "backdrop-sampler";
pub const GOVERNOR_CONFIG_FILE: &str = "governor.json";

/// White-frame heuristic: samples per axis, channel floor and rejection percentage.
pub const WHITE_FRAME_GRID: u32 = 8;
pub const WHITE_CHANNEL_MIN: u8 = 245;
pub const WHITE_FRAME_REJECT_PERCENT: u32 = 92;
