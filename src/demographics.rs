// Module containing response data structures for ZIP demographics lookups
mod response;

pub use response::{
    ApiResponse, Education, Employment, Housing, Income, Population, Race, RaceGroup,
    ZipDemographics,
};
pub(crate) use response::deserialize_object;

use std::collections::BTreeMap;

use crate::error::DemographicsError;
use tracing::debug;

// Length of a US ZIP code
const ZIP_LENGTH: usize = 5;

/// Query parameters for the ZIP Demographics API.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ZipDemographicsRequest {
    /// 5-digit US ZIP code (required)
    pub zip: String,
}

impl ZipDemographicsRequest {
    pub fn new(zip: impl Into<String>) -> Self {
        Self { zip: zip.into() }
    }

    /// Checks the parameters before they are sent upstream.
    ///
    /// # Returns
    /// * `Ok(())` if every rule holds
    /// * `DemographicsError::Validation` listing each broken rule otherwise
    pub fn validate(&self) -> Result<(), DemographicsError> {
        let mut errors = Vec::new();
        // Byte length, so a non-ASCII character can never pass as a digit
        let length = self.zip.len();

        if self.zip.is_empty() {
            errors.push("Required parameter [zip] is missing".to_string());
        } else if length < ZIP_LENGTH {
            errors.push(format!(
                "Parameter [zip] must be at least {ZIP_LENGTH} characters"
            ));
        } else if length > ZIP_LENGTH {
            errors.push(format!(
                "Parameter [zip] must be at most {ZIP_LENGTH} characters"
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            debug!("Request validation failed: {:?}", errors);
            Err(DemographicsError::Validation(errors))
        }
    }

    /// Query parameters keyed by wire name. Empty values are left out.
    pub fn to_query_params(&self) -> BTreeMap<String, String> {
        let mut params = BTreeMap::new();
        if !self.zip.is_empty() {
            params.insert("zip".to_string(), self.zip.clone());
        }
        params
    }
}
