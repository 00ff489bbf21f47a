pub mod decorator;
pub mod sandbox;
pub mod simulator;
