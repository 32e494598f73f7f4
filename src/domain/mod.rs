// Domain layer: models, policies and ports. No I/O here.

pub mod model;
pub mod policy;
pub mod ports;
