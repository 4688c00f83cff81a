//! Command-line and environment configuration for the server binary.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use clap::Parser;

/// Log filter used when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "todo_server=info,tower_http=info";

#[derive(Debug, Clone, Parser)]
#[command(name = "todo-server", version, about = "REST API for a single-user todo list")]
pub struct Config {
    /// Address to bind the HTTP listener to.
    #[arg(long, env = "TODO_HOST", default_value_t = IpAddr::V4(Ipv4Addr::LOCALHOST))]
    pub host: IpAddr,

    #[arg(long, env = "PORT", default_value_t = 5000)]
    pub port: u16,

    /// SQLite connection URL; `sqlite::memory:` keeps everything in memory.
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite://todos.db")]
    pub database_url: String,
}

impl Config {
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use std::ffi::OsStr;

    use clap::CommandFactory;
    use rstest::rstest;

    use super::*;

    // Read from the command definition so values set in the environment
    // cannot mask the defaults.
    #[rstest]
    #[case("host", "TODO_HOST", "127.0.0.1")]
    #[case("port", "PORT", "5000")]
    #[case("database_url", "DATABASE_URL", "sqlite://todos.db")]
    fn defaults_and_env_bindings(#[case] id: &str, #[case] env: &str, #[case] default: &str) {
        let command = Config::command();
        let arg = command
            .get_arguments()
            .find(|arg| arg.get_id() == id)
            .unwrap();
        assert_eq!(arg.get_env(), Some(OsStr::new(env)));
        let defaults: Vec<&OsStr> = arg.get_default_values().iter().map(AsRef::as_ref).collect();
        assert_eq!(defaults, vec![OsStr::new(default)]);
    }

    #[test]
    fn command_definition_is_consistent() {
        Config::command().debug_assert();
    }

    #[test]
    fn flags_override_defaults() {
        let config = Config::try_parse_from([
            "todo-server",
            "--host",
            "0.0.0.0",
            "--port",
            "8080",
            "--database-url",
            "sqlite::memory:",
        ])
        .unwrap();
        assert_eq!(config.socket_addr(), "0.0.0.0:8080".parse().unwrap());
        assert_eq!(config.database_url, "sqlite::memory:");
    }

    #[test]
    fn rejects_invalid_port() {
        assert!(Config::try_parse_from(["todo-server", "--port", "99999"]).is_err());
    }
}
