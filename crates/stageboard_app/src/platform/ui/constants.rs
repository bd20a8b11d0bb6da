use std::time::Duration;

/// Snapshot re-read cadence while the board is polling.
pub const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Delay between the completion notice and teardown, so the final status
/// gets one more render.
pub const AUTO_CLOSE_DELAY: Duration = Duration::from_millis(750);

/// Keyboard poll timeout; also bounds redraw latency.
pub const INPUT_POLL_INTERVAL: Duration = Duration::from_millis(50);

pub const WINDOW_TITLE: &str = "Progress Board";
pub const DETAIL_TITLE: &str = "Repository progress";
pub const DETAIL_HEADERS: [&str; 4] = ["Repository", "Status", "Updated", "Messages"];
pub const KEY_HINTS: &str = "Up/Down: select stage   q/Esc: close";
