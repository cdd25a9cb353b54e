pub mod color;
pub mod save;
pub mod trail;
