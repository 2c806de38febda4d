pub mod board;
pub mod coords;
pub mod schema;
pub mod units;

// Re-export for convenience
pub use board::BoardParser;
pub use coords::{parse_point, parse_points, CoordinateError, CoordinateField};
pub use schema::*;
pub use units::{normalize_units, DesignUnits, NormalizedTree};
