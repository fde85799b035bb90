pub mod actions;
pub mod calculators;
pub mod decision;
pub mod engine;
pub mod event_queue;
pub mod listeners;
pub mod observer;
pub mod priority;
pub mod rng;
pub mod state;

#[cfg(test)]
mod tests;
