use std::sync::OnceLock;

use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use tracing::{debug, error};

use crate::demographics::{ApiResponse, ZipDemographics, deserialize_object};
use crate::error::DemographicsError;

/// JSON reader/writer for ZIP demographics payloads.
///
/// Decoding ignores unknown keys and leaves missing ones at their defaults;
/// any type mismatch aborts the whole decode. Records must be JSON objects,
/// and a repeated key keeps its last value. Encoding omits absent nested
/// records instead of writing `null` and refuses non-finite numbers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Codec {
    pretty: bool,
}

impl Codec {
    /// Compact codec, the same configuration as [`Codec::global`].
    pub const fn new() -> Self {
        Self { pretty: false }
    }

    /// Indents encoded output.
    pub const fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    /// Process-wide codec, built on first use and shared read-only afterwards.
    pub fn global() -> &'static Codec {
        static GLOBAL: OnceLock<Codec> = OnceLock::new();
        GLOBAL.get_or_init(|| {
            debug!("Initialising shared demographics codec");
            Codec::new()
        })
    }

    /// Decodes a bare `data` object.
    pub fn decode(&self, json: &str) -> Result<ZipDemographics, DemographicsError> {
        let data: ZipDemographics = self.read(json)?;
        debug!("Decoded demographics for ZIP {:?}", data.zip);
        Ok(data)
    }

    /// Decodes the full API envelope without unwrapping it.
    pub fn decode_response(&self, json: &str) -> Result<ApiResponse, DemographicsError> {
        let response: ApiResponse = self.read(json)?;
        debug!(
            "Decoded API response with status {:?}, data present: {}",
            response.status,
            response.data.is_some()
        );
        Ok(response)
    }

    pub fn encode(&self, data: &ZipDemographics) -> Result<String, DemographicsError> {
        let json = self.write(data)?;
        debug!("Encoded demographics for ZIP {:?}", data.zip);
        Ok(json)
    }

    fn read<T: DeserializeOwned>(&self, json: &str) -> Result<T, DemographicsError> {
        // Going through `Value` collapses repeated keys, last one wins
        serde_json::from_str::<Value>(json)
            .and_then(|value| deserialize_object(value))
            .map_err(|e| {
                error!("Failed to decode demographics JSON: {}", e);
                DemographicsError::from_decode(e)
            })
    }

    fn write<T: Serialize>(&self, value: &T) -> Result<String, DemographicsError> {
        let encoded = if self.pretty {
            serde_json::to_string_pretty(value)
        } else {
            serde_json::to_string(value)
        };

        encoded.map_err(|e| {
            error!("Failed to encode demographics JSON: {}", e);
            DemographicsError::Encode(e)
        })
    }
}

/// Decodes a ZIP demographics `data` object with the shared codec.
///
/// # Arguments
/// * `json` - JSON text of the object, keys in any order, unknown keys allowed
///
/// # Returns
/// * `ZipDemographics` with missing fields at their defaults
/// * `DemographicsError::Syntax` for malformed JSON
/// * `DemographicsError::TypeCoercion` if a present value has the wrong type
pub fn parse(json: &str) -> Result<ZipDemographics, DemographicsError> {
    Codec::global().decode(json)
}

/// Decodes the API envelope and unwraps its payload.
pub fn parse_response(json: &str) -> Result<ZipDemographics, DemographicsError> {
    Codec::global().decode_response(json)?.into_result()
}

/// Encodes a ZIP demographics record as compact JSON with the shared codec.
pub fn serialize(data: &ZipDemographics) -> Result<String, DemographicsError> {
    Codec::global().encode(data)
}
