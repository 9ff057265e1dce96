//! Startup configuration: exactly two positional arguments.
//!
//! ```text
//! mock-upstream <PORT> <SERVER_NAME>
//! ```
//!
//! A missing, extra, or non-numeric argument makes [`Config::parse`] print the
//! usage text and exit with a non-zero status.

use clap::Parser;

/// Mock HTTP backend for exercising a reverse proxy.
#[derive(Debug, Clone, PartialEq, Eq, Parser)]
#[command(
    name = "mock-upstream",
    version,
    about,
    after_help = "Example: mock-upstream 9090 server1"
)]
pub struct Config {
    /// TCP port to listen on, bound on all interfaces
    pub port: u16,

    /// Name echoed into response bodies and log lines
    pub server_name: String,
}

impl Config {
    /// Address handed to [`Server::bind`](crate::server::Server::bind).
    pub fn bind_addr(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }
}

#[cfg(test)]
mod tests {
    use clap::error::ErrorKind;

    use super::*;

    #[test]
    fn parses_port_and_name() {
        let cfg = Config::try_parse_from(["mock-upstream", "9090", "server1"]).unwrap();
        assert_eq!(
            cfg,
            Config {
                port: 9090,
                server_name: "server1".into()
            }
        );
        assert_eq!(cfg.bind_addr(), "0.0.0.0:9090");
    }

    #[test]
    fn missing_name_is_rejected() {
        let err = Config::try_parse_from(["mock-upstream", "9090"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn extra_argument_is_rejected() {
        let err = Config::try_parse_from(["mock-upstream", "9090", "a", "b"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownArgument);
    }

    #[test]
    fn non_numeric_port_is_rejected() {
        let err = Config::try_parse_from(["mock-upstream", "http", "a"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValueValidation);
    }

    #[test]
    fn out_of_range_port_is_rejected() {
        assert!(Config::try_parse_from(["mock-upstream", "70000", "a"]).is_err());
    }

    #[test]
    fn usage_errors_exit_non_zero() {
        let err = Config::try_parse_from(["mock-upstream"]).unwrap_err();
        assert_ne!(err.exit_code(), 0);
    }
}
