//! Data models for survey inputs, emission factors and reports

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::activity::{Diet, Profile, TravelMode, Unit, VehicleType};

/// Raw survey input for one request.
///
/// Every field is optional and loosely typed: numbers may arrive as JSON
/// numbers or numeric strings, and anything unparseable is treated as absent.
/// Selector fields only count when they are strings. `type` is kept as raw
/// JSON so the report can echo it back unchanged.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputRecord {
    #[serde(rename = "type", default)]
    pub profile: Option<Value>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub travel_mode: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub travel_km: Option<f64>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub vehicle_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub family_travel_km: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub vehicles: Option<f64>,
    #[serde(rename = "kWh", default, deserialize_with = "lenient_number")]
    pub kwh: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub family_kwh: Option<f64>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub diet: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub family_diet: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub members: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub waste: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub family_waste: Option<f64>,
}

impl InputRecord {
    pub fn profile(&self) -> Option<Profile> {
        self.profile.as_ref().and_then(Value::as_str).and_then(Profile::parse)
    }

    pub fn travel_mode(&self) -> Option<TravelMode> {
        self.travel_mode.as_deref().and_then(TravelMode::parse)
    }

    pub fn vehicle_type(&self) -> Option<VehicleType> {
        self.vehicle_type.as_deref().and_then(VehicleType::parse)
    }

    /// Individual travel distance in km, 0 when absent.
    pub fn travel_km(&self) -> f64 {
        first_nonzero(&[self.travel_km])
    }

    /// Total fleet distance in km: per-vehicle distance times whole vehicles.
    pub fn fleet_km(&self) -> f64 {
        let per_vehicle = first_nonzero(&[self.family_travel_km]);
        let vehicles = first_nonzero(&[self.vehicles]).trunc();
        per_vehicle * vehicles
    }

    pub fn family_travel_km(&self) -> f64 {
        first_nonzero(&[self.family_travel_km])
    }

    /// Electricity use in kWh: `kWh`, then `familyKwh`, then 0.
    pub fn electricity_kwh(&self) -> f64 {
        first_nonzero(&[self.kwh, self.family_kwh])
    }

    /// Waste mass in kg: `waste`, then `familyWaste`, then 0.
    pub fn waste_kg(&self) -> f64 {
        first_nonzero(&[self.waste, self.family_waste])
    }

    /// Diet selection: `diet`, then `familyDiet`.
    pub fn diet(&self) -> Option<Diet> {
        first_nonempty(&[self.diet.as_deref(), self.family_diet.as_deref()]).and_then(Diet::parse)
    }

    /// Household size, 1 when absent or zero.
    pub fn member_count(&self) -> f64 {
        let members = first_nonzero(&[self.members]);
        if members == 0.0 { 1.0 } else { members }
    }
}

/// First candidate that is present and non-zero, or 0.
pub fn first_nonzero(candidates: &[Option<f64>]) -> f64 {
    candidates
        .iter()
        .flatten()
        .copied()
        .find(|v| *v != 0.0 && v.is_finite())
        .unwrap_or(0.0)
}

fn first_nonempty<'a>(candidates: &[Option<&'a str>]) -> Option<&'a str> {
    candidates.iter().flatten().copied().find(|s| !s.is_empty())
}

fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    Ok(value.filter(|v| v.is_finite()))
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        _ => None,
    })
}

/// One stored emission factor for the local provider
#[derive(Debug, Clone, PartialEq)]
pub struct EmissionFactor {
    pub activity_id: String,
    pub unit: Unit,
    pub kg_co2e_per_unit: f64,
    pub source: Option<String>,
}

/// Emissions for a single category, in kg per month
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CategoryEmission {
    pub co2e: f64,
    pub co2: f64,
    pub ch4: f64,
    pub n2o: f64,
}

/// The four category results for one request
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CategoryEmissions {
    pub travel: CategoryEmission,
    pub electricity: CategoryEmission,
    pub diet: CategoryEmission,
    pub waste: CategoryEmission,
}

impl CategoryEmissions {
    pub fn iter(&self) -> impl Iterator<Item = &CategoryEmission> {
        [&self.travel, &self.electricity, &self.diet, &self.waste].into_iter()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct GasBreakdown {
    pub co2: f64,
    pub ch4: f64,
    pub n2o: f64,
    pub co2e: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CategoryBreakdown {
    pub travel: f64,
    pub electricity: f64,
    pub diet: f64,
    pub waste: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Comparison {
    pub your_emissions: f64,
    pub global_average: f64,
    pub difference: f64,
    pub percent_diff: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReductionSummary {
    pub current: f64,
    pub potential: f64,
    pub after_reduction: f64,
    pub percent_reduction: f64,
}

/// A single reduction rule that fired, with its unrounded amount
#[derive(Debug, Clone, PartialEq)]
pub struct ReductionMeasure {
    pub label: &'static str,
    pub kg_co2e: f64,
}

/// Final report for one request
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub total_emissions: f64,
    pub unit: &'static str,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub profile: Option<Value>,
    pub gas_breakdown: GasBreakdown,
    pub category_breakdown: CategoryBreakdown,
    pub comparison: Comparison,
    pub reduction: ReductionSummary,
    #[serde(skip)]
    pub measures: Vec<ReductionMeasure>,
}

/// Envelope handed to whatever transport serves the report
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse {
    pub success: bool,
    pub message: String,
    pub data: Report,
}

impl ApiResponse {
    pub fn ok(data: Report) -> Self {
        Self {
            success: true,
            message: "Carbon emissions calculated successfully".to_string(),
            data,
        }
    }
}
