pub mod aggregate;
pub mod columns;
pub mod error;
pub mod normalize;
pub mod segments;
pub mod service;
