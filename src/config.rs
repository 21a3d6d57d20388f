pub use self::parser::{Config, DatabaseConfig, DbType, LogFormat, LoggingConfig};
pub use self::validator::ConfigError;

mod parser;
mod validator;
