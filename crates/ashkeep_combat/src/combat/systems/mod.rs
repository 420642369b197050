//! Combat systems (FixedUpdate pipeline, порядок — в CombatPlugin)

pub mod area;
pub mod damage;
pub mod hit_source;
pub mod impact;
pub mod mitigation;


// Re-export all systems
pub use area::*;
pub use damage::*;
pub use hit_source::*;
pub use impact::*;
pub use mitigation::*;
