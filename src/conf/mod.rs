mod bench;
mod config;
mod query;
mod server;
mod store;

pub use bench::{BenchConfig, ExecutionOrder};
pub use config::Config;
pub use query::QueryConfig;
pub use server::ServerConfig;
pub use store::{MongoConfig, PostgresConfig};
