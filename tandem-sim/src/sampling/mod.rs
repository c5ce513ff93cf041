pub mod reservoir;

pub use reservoir::ReservoirSampler;
