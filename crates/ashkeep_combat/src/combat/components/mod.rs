//! Combat components

pub mod area;
pub mod hit_source;
pub mod impact;
pub mod mitigation;

// Re-export all components
pub use area::*;
pub use hit_source::*;
pub use impact::*;
pub use mitigation::*;
