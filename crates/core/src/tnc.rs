//! Terms-and-conditions acceptance rules.

use crate::error::CoreError;
use crate::validation::validate_bounded_text;

/// Maximum length of a configuration id.
pub const CONFIG_ID_MAX_LEN: usize = 255;

/// Validate the configuration id a user accepted terms for.
pub fn validate_config_id(config_id: &str) -> Result<(), CoreError> {
    validate_bounded_text(config_id, "config_id", CONFIG_ID_MAX_LEN)
}
