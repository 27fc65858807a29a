/// Upper bound on concurrently open monitor sockets.
pub const DEFAULT_MAX_MONITOR_CONNECTIONS: usize = 64;

/// Largest inbound frame message in bytes (base64 image included).
pub const DEFAULT_MAX_FRAME_BYTES: usize = 4 * 1024 * 1024;

/// Margin added around the face box before gaze inference, as a fraction of its size.
pub const GAZE_CROP_MARGIN: f64 = 0.2;

/// Interval at which the blink-count socket pings idle clients.
pub const BLINK_COUNT_KEEPALIVE_SECS: u64 = 15;
