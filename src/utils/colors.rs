/// ANSI color helper utilities for terminal output.
pub const RESET: &str = "\x1b[0m";

pub const GREY: &str = "\x1b[90m";

pub const RED: &str = "\x1b[31m";
pub const GREEN: &str = "\x1b[32m";

pub const YELLOW: &str = "\x1b[33m";
pub const CYAN: &str = "\x1b[36m";
pub const MAGENTA: &str = "\x1b[35m";

/// Color used for an event code in listings:
/// movement → green, degraded environment → yellow,
/// device lifecycle → magenta, stationary → reset
pub fn color_for_code(code: i64) -> &'static str {
    match code {
        2 => GREEN,
        5 | 6 => YELLOW,
        3 | 4 => MAGENTA,
        _ => RESET,
    }
}
