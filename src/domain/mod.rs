// Domain layer: remote entity types and the capability traits the core drives.

pub mod model;
pub mod ports;
