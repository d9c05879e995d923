//! Handoff Core -- scrape target labels and reflective field paths.

pub mod fieldwalk;
pub mod target;

pub use fieldwalk::{field_walk, Field, FieldShape, Kind, Shape, Value, WalkError, Walked};
pub use target::{
    is_valid_label_name, join_path, scrape_target, Exports, Target, TargetError, ADDRESS_LABEL,
    METRICS_PATH_LABEL, NAME_LABEL, SCHEME_LABEL,
};

#[cfg(test)]
mod tests {
    #[test]
    fn crate_loads() {
        // Empty body: if this test runs, the crate compiles and loads.
    }
}
