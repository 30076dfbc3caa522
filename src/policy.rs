//! Fixed policy constants: gas splits, the global baseline and reduction rules

use crate::activity::{Category, Diet, TravelMode};
use crate::models::{CategoryEmission, CategoryEmissions, InputRecord, ReductionMeasure};

/// Global average footprint, kg CO2e per person per month
pub const GLOBAL_AVERAGE_KG: f64 = 833.0;

pub const REPORT_UNIT: &str = "kg CO2e/month";

const ELECTRICITY_SAVING_THRESHOLD_KWH: f64 = 200.0;
const WASTE_RECYCLING_THRESHOLD_KG: f64 = 20.0;

/// Per-gas ratios applied independently to a category's CO2e.
///
/// These are not a partition; the three components need not sum to 1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GasSplit {
    pub co2: f64,
    pub ch4: f64,
    pub n2o: f64,
}

pub fn gas_split(category: Category) -> GasSplit {
    match category {
        Category::Travel => GasSplit { co2: 0.95, ch4: 0.03, n2o: 0.02 },
        Category::Electricity => GasSplit { co2: 0.92, ch4: 0.05, n2o: 0.03 },
        Category::Diet => GasSplit { co2: 0.70, ch4: 0.25, n2o: 0.05 },
        Category::Waste => GasSplit { co2: 0.50, ch4: 0.45, n2o: 0.05 },
    }
}

impl CategoryEmission {
    /// Split `co2e` into its gas components using the category's ratios
    pub fn split(category: Category, co2e: f64) -> Self {
        let ratios = gas_split(category);
        Self {
            co2e,
            co2: co2e * ratios.co2,
            ch4: co2e * ratios.ch4,
            n2o: co2e * ratios.n2o,
        }
    }
}

/// Collect every reduction rule that applies to this request.
///
/// Rules are independent and additive. The travel-mode and vehicle-type rules
/// may both fire against the same travel figure, and nothing is capped.
pub fn reduction_measures(input: &InputRecord, emissions: &CategoryEmissions) -> Vec<ReductionMeasure> {
    let mut measures = Vec::new();
    let travel = emissions.travel.co2e;

    match input.travel_mode() {
        Some(TravelMode::Car) => measures.push(ReductionMeasure {
            label: "Switch car trips to public transport",
            kg_co2e: travel * 0.5,
        }),
        Some(TravelMode::Scooter) => measures.push(ReductionMeasure {
            label: "Replace scooter trips with shared or public transport",
            kg_co2e: travel * 0.3,
        }),
        _ => {}
    }

    if input.vehicle_type().is_some_and(|v| v.is_combustion()) {
        measures.push(ReductionMeasure {
            label: "Move the household fleet to electric vehicles",
            kg_co2e: travel * 0.4,
        });
    }

    if input.electricity_kwh() > ELECTRICITY_SAVING_THRESHOLD_KWH {
        measures.push(ReductionMeasure {
            label: "Cut electricity use with energy-saving measures",
            kg_co2e: emissions.electricity.co2e * 0.25,
        });
    }

    match input.diet() {
        Some(Diet::Meat) => measures.push(ReductionMeasure {
            label: "Reduce meat consumption",
            kg_co2e: emissions.diet.co2e * 0.33,
        }),
        Some(Diet::Mixed) => measures.push(ReductionMeasure {
            label: "Shift more meals to plant-based",
            kg_co2e: emissions.diet.co2e * 0.20,
        }),
        _ => {}
    }

    if input.waste_kg() > WASTE_RECYCLING_THRESHOLD_KG {
        measures.push(ReductionMeasure {
            label: "Recycle and compost household waste",
            kg_co2e: emissions.waste.co2e * 0.30,
        });
    }

    measures
}

/// Total reduction potential, kg CO2e per month
pub fn reduction_potential(input: &InputRecord, emissions: &CategoryEmissions) -> f64 {
    reduction_measures(input, emissions).iter().map(|m| m.kg_co2e).sum()
}

/// Round half up to `places` decimals, matching `Math.round` semantics
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor + 0.5).floor() / factor
}
