pub mod fallback;
pub mod health;
pub mod projection;
pub mod session;
