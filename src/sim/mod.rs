pub mod controller;
pub mod curse;
pub mod event;
pub mod generate;
pub mod session;
pub mod world;
