//! Sample factors and provider probes for working without a live API

use anyhow::Result;
use rusqlite::Connection;

use crate::activity::{self, ActivityQuery, Category, TravelMode, Unit};
use crate::db;
use crate::models::EmissionFactor;

const SAMPLE_SOURCE: &str = "sample";

/// Approximate kg CO2e per unit for every known activity
fn sample_factor(activity_id: &str) -> f64 {
    match activity_id {
        id if id.contains("vehicle_type_bus") => 0.105,
        id if id.contains("passenger_train") => 0.035,
        id if id.contains("vehicle_type_motorbike") => 0.114,
        id if id.contains("fuel_source_bev") => 0.047,
        id if id.contains("fuel_source_petrol") => 0.170,
        id if id.contains("fuel_source_diesel") => 0.171,
        id if id.contains("vehicle_type_car") => 0.171,
        activity::ELECTRICITY_ACTIVITY => 0.233,
        activity::WASTE_ACTIVITY => 0.587,
        _ => 0.0,
    }
}

/// Replace the store contents with sample factors for every known activity
pub fn load_sample_data(conn: &Connection) -> Result<usize> {
    db::clear_factors(conn)?;

    for (activity_id, unit) in activity::KNOWN_ACTIVITIES {
        db::upsert_factor(
            conn,
            &EmissionFactor {
                activity_id: activity_id.to_string(),
                unit,
                kg_co2e_per_unit: sample_factor(activity_id),
                source: Some(SAMPLE_SOURCE.to_string()),
            },
        )?;
    }

    Ok(activity::KNOWN_ACTIVITIES.len())
}

/// Connectivity probes: a 100 km car trip, 250 kWh of grid power, 30 kg of landfill waste
pub fn provider_probes() -> [(&'static str, ActivityQuery); 3] {
    [
        (
            "car travel (100 km)",
            ActivityQuery {
                category: Category::Travel,
                activity_id: TravelMode::Car.activity_id(),
                quantity: 100.0,
                unit: Unit::Km,
            },
        ),
        (
            "electricity (250 kWh)",
            ActivityQuery {
                category: Category::Electricity,
                activity_id: activity::ELECTRICITY_ACTIVITY,
                quantity: 250.0,
                unit: Unit::KWh,
            },
        ),
        (
            "waste (30 kg)",
            ActivityQuery {
                category: Category::Waste,
                activity_id: activity::WASTE_ACTIVITY,
                quantity: 30.0,
                unit: Unit::Kg,
            },
        ),
    ]
}
