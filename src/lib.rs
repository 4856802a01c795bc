pub mod app;
pub mod config;
pub mod logger;
pub mod pipeline;
pub mod platform;
pub mod renderer;
pub mod runloop;
pub mod scene;

#[cfg(test)]
mod mockgl;
