// Domain layer: request/resource models and ports (interfaces).

pub mod model;
pub mod ports;
