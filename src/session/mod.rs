pub mod controller;

pub use controller::{Barycenter, SessionController};
