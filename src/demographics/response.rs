use std::fmt;
use std::marker::PhantomData;

use serde::de::value::MapAccessDeserializer;
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::DemographicsError;

/// Treats an explicit JSON `null` the same as a missing key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Refuses NaN and infinities, which JSON cannot carry.
fn finite<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if value.is_finite() {
        serializer.serialize_f64(*value)
    } else {
        Err(serde::ser::Error::custom(format!(
            "non-finite number {value} cannot be encoded as JSON"
        )))
    }
}

/// Accepts only a JSON object; derived struct visitors would also take arrays.
struct ObjectVisitor<T>(PhantomData<T>);

impl<'de, T: Deserialize<'de>> Visitor<'de> for ObjectVisitor<T> {
    type Value = T;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a JSON object")
    }

    fn visit_map<A: MapAccess<'de>>(self, map: A) -> Result<T, A::Error> {
        T::deserialize(MapAccessDeserializer::new(map))
    }
}

/// Decodes a record from a JSON object, rejecting any other shape.
pub(crate) fn deserialize_object<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    deserializer.deserialize_map(ObjectVisitor(PhantomData))
}

struct OptionalObjectVisitor<T>(PhantomData<T>);

impl<'de, T: Deserialize<'de>> Visitor<'de> for OptionalObjectVisitor<T> {
    type Value = Option<T>;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a JSON object or null")
    }

    fn visit_none<E: serde::de::Error>(self) -> Result<Option<T>, E> {
        Ok(None)
    }

    fn visit_unit<E: serde::de::Error>(self) -> Result<Option<T>, E> {
        Ok(None)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Option<T>, D::Error> {
        deserialize_object(deserializer).map(Some)
    }
}

/// Nested record: object decodes, `null` means no value.
fn optional_object<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    deserializer.deserialize_option(OptionalObjectVisitor(PhantomData))
}

/// Response structure for the ZIP Demographics API
/// Represents the `data` object of a successful lookup, built from ACS estimates
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct ZipDemographics {
    /// 5-digit ZIP code (e.g., "94103")
    #[serde(deserialize_with = "null_as_default")]
    pub zip: String,
    /// Display name of the area, usually the city
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    /// American Community Survey year the figures come from
    #[serde(deserialize_with = "null_as_default")]
    pub acs_year: i64,
    #[serde(
        deserialize_with = "optional_object",
        skip_serializing_if = "Option::is_none"
    )]
    pub population: Option<Population>,
    #[serde(
        deserialize_with = "optional_object",
        skip_serializing_if = "Option::is_none"
    )]
    pub income: Option<Income>,
    #[serde(
        deserialize_with = "optional_object",
        skip_serializing_if = "Option::is_none"
    )]
    pub housing: Option<Housing>,
    #[serde(
        deserialize_with = "optional_object",
        skip_serializing_if = "Option::is_none"
    )]
    pub education: Option<Education>,
    #[serde(
        deserialize_with = "optional_object",
        skip_serializing_if = "Option::is_none"
    )]
    pub employment: Option<Employment>,
    #[serde(
        deserialize_with = "optional_object",
        skip_serializing_if = "Option::is_none"
    )]
    pub race: Option<Race>,
}

/// Population counts and median age
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct Population {
    #[serde(deserialize_with = "null_as_default")]
    pub total: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub male: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub female: i64,
    /// Median age in years
    #[serde(deserialize_with = "null_as_default", serialize_with = "finite")]
    pub median_age: f64,
}

/// Income figures in US dollars
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct Income {
    #[serde(deserialize_with = "null_as_default")]
    pub median_household: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub per_capita: i64,
}

/// Housing stock, occupancy and cost
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct Housing {
    /// Median value of owner-occupied homes in US dollars
    #[serde(deserialize_with = "null_as_default")]
    pub median_home_value: i64,
    /// Median gross monthly rent in US dollars
    #[serde(deserialize_with = "null_as_default")]
    pub median_rent: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub total_units: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub occupied_units: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub vacant_units: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub owner_occupied: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub renter_occupied: i64,
    /// Share of occupied units that are owner-occupied, as a percentage
    #[serde(deserialize_with = "null_as_default", serialize_with = "finite")]
    pub home_ownership_rate: f64,
}

/// Educational attainment of the adult population
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct Education {
    /// Percentage holding a bachelor's degree or higher
    #[serde(deserialize_with = "null_as_default", serialize_with = "finite")]
    pub college_educated_pct: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub bachelors: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub masters: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub professional: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub doctorate: i64,
}

/// Labor force participation
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct Employment {
    #[serde(deserialize_with = "null_as_default")]
    pub labor_force: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub unemployed: i64,
    /// Unemployed share of the labor force, as a percentage
    #[serde(deserialize_with = "null_as_default", serialize_with = "finite")]
    pub unemployment_rate: f64,
}

/// Race and ethnicity breakdown
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct Race {
    #[serde(
        deserialize_with = "optional_object",
        skip_serializing_if = "Option::is_none"
    )]
    pub white: Option<RaceGroup>,
    #[serde(
        deserialize_with = "optional_object",
        skip_serializing_if = "Option::is_none"
    )]
    pub black: Option<RaceGroup>,
    #[serde(
        deserialize_with = "optional_object",
        skip_serializing_if = "Option::is_none"
    )]
    pub asian: Option<RaceGroup>,
    #[serde(
        deserialize_with = "optional_object",
        skip_serializing_if = "Option::is_none"
    )]
    pub hispanic: Option<RaceGroup>,
}

/// Head count and percentage for a single race category
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct RaceGroup {
    #[serde(deserialize_with = "null_as_default")]
    pub count: i64,
    #[serde(deserialize_with = "null_as_default", serialize_with = "finite")]
    pub percent: f64,
}

/// Envelope the API wraps every payload in
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct ApiResponse {
    /// "ok" on success, "error" otherwise
    #[serde(deserialize_with = "null_as_default")]
    pub status: String,
    /// Error description when the lookup failed
    pub error: Option<String>,
    #[serde(
        deserialize_with = "optional_object",
        skip_serializing_if = "Option::is_none"
    )]
    pub data: Option<ZipDemographics>,
    /// HTTP-like status code, only sent by some endpoints
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<i64>,
}

impl ApiResponse {
    pub fn is_ok(&self) -> bool {
        self.status.eq_ignore_ascii_case("ok")
            && self.error.as_deref().is_none_or(str::is_empty)
    }

    /// Unwraps the payload, turning a failed or empty envelope into an error.
    pub fn into_result(self) -> Result<ZipDemographics, DemographicsError> {
        if !self.is_ok() {
            return Err(DemographicsError::Api {
                message: self
                    .error
                    .filter(|e| !e.is_empty())
                    .unwrap_or_else(|| "no error message".to_string()),
                status: self.status,
                code: self.code,
            });
        }

        self.data.ok_or_else(|| DemographicsError::Api {
            status: self.status,
            message: "response carried no data".to_string(),
            code: self.code,
        })
    }
}
