pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use config::{CliConfig, ServiceConfig};
pub use core::adaptor::GroupsAdaptor;
pub use core::auth::ServiceAccountAuth;
pub use domain::model::{MemberRole, NewGroup, NewMember, ServiceKind};
pub use domain::ports::TokenProvider;
pub use utils::error::{BrokerError, Result};
