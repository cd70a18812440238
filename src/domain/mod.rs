// Domain layer: wire models and the ports the control loop depends on.

pub mod model;
pub mod ports;
