//! Configuration access port trait.
//!
//! Typed getters return `Ok(None)` for a missing key and an error for a
//! value that is present but cannot be parsed.

use crate::domain::error::SamsignalError;

pub trait ConfigPort {
    /// Section names present in the source, lowercased.
    fn sections(&self) -> Vec<String>;

    /// Key names present in `section`, lowercased and sorted.
    fn keys(&self, section: &str) -> Vec<String>;

    fn get_string(&self, section: &str, key: &str) -> Option<String>;
    fn get_int(&self, section: &str, key: &str) -> Result<Option<i64>, SamsignalError>;
    fn get_double(&self, section: &str, key: &str) -> Result<Option<f64>, SamsignalError>;
    fn get_bool(&self, section: &str, key: &str) -> Result<Option<bool>, SamsignalError>;
}
