pub mod frame;
pub mod store;
