use std::sync::atomic::{AtomicBool, Ordering};

static ENABLED: AtomicBool = AtomicBool::new(true);

#[inline(always)]
pub fn is_enabled() -> bool {
    ENABLED.load(Ordering::SeqCst)
}

/// Mute launcher logging. Called once the target owns the standard streams.
pub fn disable() {
    ENABLED.store(false, Ordering::SeqCst)
}

#[macro_export]
macro_rules! cd_info {
    ($($arg:tt)+) => {
        if $crate::log::is_enabled() {
            ::log::info!(target: "charmd", $($arg)+)
        }
    };
}

#[macro_export]
macro_rules! cd_warn {
    ($($arg:tt)+) => {
        if $crate::log::is_enabled() {
            ::log::warn!(target: "charmd", $($arg)+)
        }
    };
}

#[macro_export]
macro_rules! cd_debug {
    ($($arg:tt)+) => {
        if $crate::log::is_enabled() {
            ::log::debug!(target: "charmd", $($arg)+)
        }
    };
}
