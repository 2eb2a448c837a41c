//! Tracing subscriber setup.
//!
//! Logs always go to stderr; stdout is reserved for command output.

use std::io::IsTerminal;

use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, Layer};

const DEFAULT_DIRECTIVES: &str =
    "datagovhk=info,datagovhk_mcp=info,datagovhk_server=info,datagovhk_tools=info,warn";

const VERBOSE_DIRECTIVES: &str = "datagovhk=debug,datagovhk_mcp=debug,datagovhk_server=debug,datagovhk_tools=debug,datagovhk_config=debug,tower_http=debug,info";

/// Logging options taken from the command line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LogConfig {
    /// Raise crate filters to `debug`.
    pub verbose: bool,
    /// Use the JSON formatter.
    pub json: bool,
}

impl LogConfig {
    /// Filter directives used when `RUST_LOG` is not set.
    pub fn directives(&self) -> &'static str {
        if self.verbose {
            VERBOSE_DIRECTIVES
        } else {
            DEFAULT_DIRECTIVES
        }
    }

    /// `RUST_LOG` when set and valid, otherwise [`Self::directives`].
    pub fn filter(&self) -> EnvFilter {
        match std::env::var(EnvFilter::DEFAULT_ENV) {
            Ok(raw) if !raw.trim().is_empty() => EnvFilter::try_new(&raw).unwrap_or_else(|e| {
                eprintln!("warning: ignoring invalid RUST_LOG '{}': {}", raw, e);
                EnvFilter::new(self.directives())
            }),
            _ => EnvFilter::new(self.directives()),
        }
    }
}

/// Install the global subscriber.
pub fn init_logging(config: &LogConfig) -> anyhow::Result<()> {
    let layer = if config.json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(std::io::stderr().is_terminal())
            .with_target(true)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(layer.with_filter(config.filter()))
        .try_init()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbose_raises_crate_filters() {
        let quiet = LogConfig::default();
        let verbose = LogConfig {
            verbose: true,
            ..Default::default()
        };

        assert!(quiet.directives().contains("datagovhk_mcp=info"));
        assert!(verbose.directives().contains("datagovhk_mcp=debug"));
        assert!(verbose.directives().contains("tower_http=debug"));
    }

    #[test]
    fn test_directives_parse() {
        for config in [
            LogConfig::default(),
            LogConfig {
                verbose: true,
                json: true,
            },
        ] {
            assert!(EnvFilter::try_new(config.directives()).is_ok());
        }
    }
}
