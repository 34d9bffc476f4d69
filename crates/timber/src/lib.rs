#![deny(missing_docs)]

//! Log output for the oap-query binary.
//!
//! Library code only emits `tracing` events; nothing is printed until a binary calls [`init`].

use std::io;

use tracing_subscriber::fmt;

pub use tracing_core::Level;

/// possible log levels
pub const LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

/// Initializes a global tracing subscriber writing to stderr.
///
/// `None` keeps the process silent. `error` through `info` use a compact, untimed format;
/// `debug` adds timestamps and targets so outgoing queries can be correlated with backend
/// logs; `trace` also tags every line with its thread, which helps when many queries run
/// side by side.
pub fn init(level: Option<Level>) {
    let Some(level) = level else {
        return;
    };
    if level <= Level::INFO {
        let format = fmt::format().without_time().with_target(false).compact();
        fmt()
            .with_max_level(level)
            .event_format(format)
            .with_writer(io::stderr)
            .init();
    } else if level == Level::DEBUG {
        fmt().with_max_level(level).with_writer(io::stderr).init();
    } else {
        fmt()
            .with_max_level(level)
            .with_writer(io::stderr)
            .with_thread_ids(true)
            .init();
    }
}

#[cfg(test)]
mod tests {
    use tracing_core::metadata::ParseLevelError;

    use super::{Level, LEVELS};
    use std::str::FromStr;

    #[test]
    fn it_parses_all_possible_levels() -> Result<(), ParseLevelError> {
        for level in &LEVELS {
            Level::from_str(level)?;
        }
        Ok(())
    }

    #[test]
    fn levels_are_ordered_from_quietest() {
        let parsed: Vec<Level> = LEVELS
            .iter()
            .map(|level| Level::from_str(level).unwrap())
            .collect();
        assert!(parsed.windows(2).all(|pair| pair[0] < pair[1]));
    }
}
