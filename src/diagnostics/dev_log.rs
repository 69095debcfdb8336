//! Feature-gated development logging, grounded in the teacher's
//! `compiler_frontend/compiler_messages/compiler_dev_logging.rs`: one
//! `saying::say!`-backed macro per pipeline stage, compiled away entirely
//! when its feature is off.

#[macro_export]
#[cfg(feature = "show_tokens")]
macro_rules! token_log {
    ($($arg:tt)*) => {
        saying::say!($($arg)*);
    };
}

#[macro_export]
#[cfg(not(feature = "show_tokens"))]
macro_rules! token_log {
    ($($arg:tt)*) => {};
}

#[macro_export]
#[cfg(feature = "show_preparsed")]
macro_rules! preparser_log {
    ($($arg:tt)*) => {
        saying::say!($($arg)*);
    };
}

#[macro_export]
#[cfg(not(feature = "show_preparsed"))]
macro_rules! preparser_log {
    ($($arg:tt)*) => {};
}

#[macro_export]
#[cfg(feature = "show_ast")]
macro_rules! ast_log {
    ($($arg:tt)*) => {
        saying::say!($($arg)*);
    };
}

#[macro_export]
#[cfg(not(feature = "show_ast"))]
macro_rules! ast_log {
    ($($arg:tt)*) => {};
}

#[macro_export]
#[cfg(feature = "show_analysis")]
macro_rules! analysis_log {
    ($($arg:tt)*) => {
        saying::say!($($arg)*);
    };
}

#[macro_export]
#[cfg(not(feature = "show_analysis"))]
macro_rules! analysis_log {
    ($($arg:tt)*) => {};
}

#[macro_export]
#[cfg(feature = "show_mir")]
macro_rules! mir_log {
    ($($arg:tt)*) => {
        saying::say!($($arg)*);
    };
}

#[macro_export]
#[cfg(not(feature = "show_mir"))]
macro_rules! mir_log {
    ($($arg:tt)*) => {};
}

#[macro_export]
#[cfg(feature = "detailed_timers")]
macro_rules! timer_log {
    ($time:expr, $msg:expr) => {
        saying::say!($msg, Green #$time.elapsed());
    };
}

#[macro_export]
#[cfg(not(feature = "detailed_timers"))]
macro_rules! timer_log {
    ($time:expr, $msg:expr) => {};
}
