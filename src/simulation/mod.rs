//! Tag value simulation: clock, noise, runtime state and the generator
//! Location: src/simulation/mod.rs

pub mod clock;
pub mod noise;
pub mod perturbation;
pub mod signal_generator;
pub mod state;

pub use clock::{Clock, CyclePacing};
pub use noise::{MidpointSource, RandomSource, RngSource, ScriptedSource};
pub use perturbation::PerturbationScheduler;
pub use signal_generator::{GeneratorSettings, SignalGenerator};
pub use state::{RuntimeState, TagCell, TagReading, TagState, TickSnapshot};
