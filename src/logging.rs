//! `log` setup. In the browser records go to the devtools console through
//! `console_log`; host builds (native tests) only get the level filter.

use log::{Level, LevelFilter};

#[cfg(target_arch = "wasm32")]
fn install(level: Level) {
    // Err only means a logger is already installed; the level is still updated below.
    console_log::init_with_level(level).ok();
}

#[cfg(not(target_arch = "wasm32"))]
fn install(_level: Level) {}

/// Installs the console logger once; later calls only adjust the level.
pub fn init(level: LevelFilter) {
    if let Some(level) = level.to_level() {
        install(level);
    }
    log::set_max_level(level);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_sets_level_and_can_be_repeated() {
        init(LevelFilter::Debug);
        assert_eq!(log::max_level(), LevelFilter::Debug);
        init(LevelFilter::Warn);
        assert_eq!(log::max_level(), LevelFilter::Warn);
    }
}
