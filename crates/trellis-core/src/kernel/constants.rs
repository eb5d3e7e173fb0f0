/// Application name
pub const APP_NAME: &str = "Trellis";

/// Application version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Render ticks per second when none is configured
pub const DEFAULT_FPS: u32 = 30;

/// Highest usable tick rate; one render tick per millisecond
pub const MAX_FPS: u32 = 1000;

/// Terminal width used when the size query fails
pub const DEFAULT_WIDTH: u16 = 80;

/// Terminal height used when the size query fails
pub const DEFAULT_HEIGHT: u16 = 24;

/// Name reported in captured errors raised by the mounted root node
pub const ROOT_NODE_NAME: &str = "root";
