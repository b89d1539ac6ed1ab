pub mod config;
pub mod controller;
pub mod error;
pub mod events;
pub mod host;
pub mod timer;
pub mod tasks {
    pub mod input;
    pub mod slideshow;
    pub mod viewer;
}
