//! Logging shims. Each macro forwards to `log` or `defmt` depending on the
//! enabled feature and evaluates to nothing otherwise.

#![macro_use]
#![allow(unused_macros)]

macro_rules! __vl53_log {
    ($level:ident, $s:literal $(, $x:expr)* $(,)?) => {
        {
            cfg_if::cfg_if! {
                if #[cfg(feature = "log")] {
                    ::log::$level!($s $(, $x)*);
                } else if #[cfg(feature = "defmt")] {
                    ::defmt::$level!($s $(, $x)*);
                } else {
                    let _ = ($( & $x ),*);
                }
            }
        }
    };
}

macro_rules! trace {
    ($($t:tt)*) => { __vl53_log!(trace, $($t)*) };
}

macro_rules! debug {
    ($($t:tt)*) => { __vl53_log!(debug, $($t)*) };
}

macro_rules! info {
    ($($t:tt)*) => { __vl53_log!(info, $($t)*) };
}

macro_rules! warn {
    ($($t:tt)*) => { __vl53_log!(warn, $($t)*) };
}

macro_rules! error {
    ($($t:tt)*) => { __vl53_log!(error, $($t)*) };
}
