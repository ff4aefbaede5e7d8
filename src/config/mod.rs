pub mod cli;
pub mod service_config;

pub use cli::CliConfig;
pub use service_config::{
    ApiProfile, BoundProfile, CredentialsConfig, DomainConfig, ServiceConfig, CREDENTIALS_ENV,
};
