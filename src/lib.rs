//! Data model and JSON codec for ZIP-code demographics lookups.
//!
//! The API returns American Community Survey figures for a US ZIP code:
//! population, income, housing, education, employment and a race breakdown.
//! [`parse`] and [`serialize`] convert between JSON text and
//! [`ZipDemographics`]; [`parse_response`] also unwraps the API envelope.
//! Timestamp helpers for tolerant date/time decoding live in [`datetime`].

pub mod codec;
pub mod datetime;
pub mod demographics;
pub mod error;

pub use codec::{Codec, parse, parse_response, serialize};
pub use datetime::{OffsetTime, parse_date_time, parse_time};
pub use demographics::{
    ApiResponse, Education, Employment, Housing, Income, Population, Race, RaceGroup,
    ZipDemographics, ZipDemographicsRequest,
};
pub use error::DemographicsError;
