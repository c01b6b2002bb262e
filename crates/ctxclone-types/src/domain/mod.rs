pub mod clone;
pub mod compression;
pub mod project;
pub mod session;
pub mod turn;
