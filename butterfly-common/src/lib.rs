//! Common utilities for the butterfly-osm toolkit

pub mod error;

pub use error::{suggest_correction, Error, Result};

#[cfg(test)]
mod tests {
    use crate::error::suggest_correction;

    #[test]
    fn suggest_correction_returns_expected_role() {
        assert_eq!(
            suggest_correction("lfet", &["left", "right"]),
            Some("left".to_string())
        );
    }
}
