pub mod adaptor;
pub mod auth;

pub use crate::domain::model::{AuthorizedHandle, MemberRole, NewGroup, NewMember, ServiceKind};
pub use crate::domain::ports::TokenProvider;
pub use crate::utils::error::Result;
