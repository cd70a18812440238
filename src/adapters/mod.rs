// Adapters layer: concrete implementations of the collaborator ports (actuators, clock).

pub mod actuator;
pub mod clock;

pub use actuator::SimulatedActuator;
pub use clock::SystemClock;
