// Crate-internal log macros. Each level is compiled in only when its
// feature is enabled; disabled levels still type-check their arguments.
// Every message carries the crate prefix.

#[cfg(feature = "log-info")]
macro_rules! info {
    ($fmt:literal $(, $arg:expr)* $(,)?) => (
        log::info!(concat!("cl-workflow: ", $fmt) $(, $arg)*)
    )
}

#[cfg(not(feature = "log-info"))]
macro_rules! info {
    ($fmt:literal $(, $arg:expr)* $(,)?) => {{
        if false {
            let _ = format_args!($fmt $(, $arg)*);
        }
    }};
}

#[cfg(feature = "log-warn")]
macro_rules! warn {
    ($fmt:literal $(, $arg:expr)* $(,)?) => (
        log::warn!(concat!("cl-workflow: ", $fmt) $(, $arg)*)
    )
}

#[cfg(not(feature = "log-warn"))]
macro_rules! warn {
    ($fmt:literal $(, $arg:expr)* $(,)?) => {{
        if false {
            let _ = format_args!($fmt $(, $arg)*);
        }
    }};
}

#[cfg(feature = "log-error")]
macro_rules! error {
    ($fmt:literal $(, $arg:expr)* $(,)?) => (
        log::error!(concat!("cl-workflow: ", $fmt) $(, $arg)*)
    )
}

#[cfg(not(feature = "log-error"))]
macro_rules! error {
    ($fmt:literal $(, $arg:expr)* $(,)?) => {{
        if false {
            let _ = format_args!($fmt $(, $arg)*);
        }
    }};
}
