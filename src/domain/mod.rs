// Domain layer: card and registration models plus the ports the core talks through.

pub mod model;
pub mod ports;
