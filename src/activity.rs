//! Activity classification tables and category resolution
//!
//! Maps survey selections onto the fixed activity ids understood by emission
//! factor providers, and decides which categories need a provider lookup.

use std::fmt;

use crate::models::InputRecord;

pub const ELECTRICITY_ACTIVITY: &str = "electricity-supply_grid-source_supplier_mix-consumer_type_na";
pub const WASTE_ACTIVITY: &str = "waste_type_mixed_general_waste-disposal_method_landfill";

const CAR_ACTIVITY: &str =
    "passenger_vehicle-vehicle_type_car-fuel_source_na-engine_size_na-vehicle_age_na-vehicle_weight_na";
const BUS_ACTIVITY: &str =
    "passenger_vehicle-vehicle_type_bus-fuel_source_na-engine_size_na-vehicle_age_na-vehicle_weight_na";
const TRAIN_ACTIVITY: &str = "passenger_train-route_type_national_rail-fuel_source_na";
const MOTORBIKE_ACTIVITY: &str =
    "passenger_vehicle-vehicle_type_motorbike-fuel_source_na-engine_size_na-vehicle_age_na-vehicle_weight_na";
const BEV_CAR_ACTIVITY: &str =
    "passenger_vehicle-vehicle_type_car-fuel_source_bev-engine_size_na-vehicle_age_na-vehicle_weight_na";
const PETROL_CAR_ACTIVITY: &str =
    "passenger_vehicle-vehicle_type_car-fuel_source_petrol-engine_size_na-vehicle_age_na-vehicle_weight_na";
const DIESEL_CAR_ACTIVITY: &str =
    "passenger_vehicle-vehicle_type_car-fuel_source_diesel-engine_size_na-vehicle_age_na-vehicle_weight_na";

/// Every activity id a resolver can produce, with its unit.
pub const KNOWN_ACTIVITIES: [(&str, Unit); 9] = [
    (CAR_ACTIVITY, Unit::Km),
    (BUS_ACTIVITY, Unit::Km),
    (TRAIN_ACTIVITY, Unit::Km),
    (MOTORBIKE_ACTIVITY, Unit::Km),
    (BEV_CAR_ACTIVITY, Unit::Km),
    (PETROL_CAR_ACTIVITY, Unit::Km),
    (DIESEL_CAR_ACTIVITY, Unit::Km),
    (ELECTRICITY_ACTIVITY, Unit::KWh),
    (WASTE_ACTIVITY, Unit::Kg),
];

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Profile {
    Individual,
    Family,
}

impl Profile {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "individual" => Some(Self::Individual),
            "family" => Some(Self::Family),
            _ => None,
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum TravelMode {
    Car,
    Bus,
    Train,
    Scooter,
    Ev,
}

impl TravelMode {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "car" => Some(Self::Car),
            "bus" => Some(Self::Bus),
            "train" => Some(Self::Train),
            "scooter" => Some(Self::Scooter),
            "ev" => Some(Self::Ev),
            _ => None,
        }
    }

    pub fn activity_id(self) -> &'static str {
        match self {
            Self::Car => CAR_ACTIVITY,
            Self::Bus => BUS_ACTIVITY,
            Self::Train => TRAIN_ACTIVITY,
            Self::Scooter => MOTORBIKE_ACTIVITY,
            Self::Ev => BEV_CAR_ACTIVITY,
        }
    }
}

/// Fuel type of a family's vehicles
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum VehicleType {
    Petrol,
    Diesel,
    Ev,
}

impl VehicleType {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "petrol" => Some(Self::Petrol),
            "diesel" => Some(Self::Diesel),
            "ev" => Some(Self::Ev),
            _ => None,
        }
    }

    pub fn activity_id(self) -> &'static str {
        match self {
            Self::Petrol => PETROL_CAR_ACTIVITY,
            Self::Diesel => DIESEL_CAR_ACTIVITY,
            Self::Ev => BEV_CAR_ACTIVITY,
        }
    }

    pub fn is_combustion(self) -> bool {
        matches!(self, Self::Petrol | Self::Diesel)
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Diet {
    Meat,
    Mixed,
    Veg,
}

impl Diet {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "meat" => Some(Self::Meat),
            "mixed" => Some(Self::Mixed),
            "veg" => Some(Self::Veg),
            _ => None,
        }
    }

    /// kg CO2e per person per month
    pub fn monthly_kg_per_person(self) -> f64 {
        match self {
            Self::Meat => 150.0,
            Self::Mixed => 100.0,
            Self::Veg => 50.0,
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Category {
    Travel,
    Electricity,
    Diet,
    Waste,
}

impl Category {
    pub const ALL: [Category; 4] = [Self::Travel, Self::Electricity, Self::Diet, Self::Waste];

    pub fn name(self) -> &'static str {
        match self {
            Self::Travel => "travel",
            Self::Electricity => "electricity",
            Self::Diet => "diet",
            Self::Waste => "waste",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Physical unit of a provider quantity
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Unit {
    Km,
    KWh,
    Kg,
}

impl Unit {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Km => "km",
            Self::KWh => "kWh",
            Self::Kg => "kg",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "km" => Some(Self::Km),
            "kWh" | "kwh" => Some(Self::KWh),
            "kg" => Some(Self::Kg),
            _ => None,
        }
    }

    /// Name of the physical dimension, as used in provider request parameters
    pub fn dimension(self) -> &'static str {
        match self {
            Self::Km => "distance",
            Self::KWh => "energy",
            Self::Kg => "weight",
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single lookup to send to an emission factor provider
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityQuery {
    pub category: Category,
    pub activity_id: &'static str,
    pub quantity: f64,
    pub unit: Unit,
}

/// Resolve the provider lookups warranted by `input`.
///
/// Diet is never provider-backed, so at most three queries come back: one
/// each for travel, electricity and waste.
pub fn resolve_queries(input: &InputRecord) -> Vec<ActivityQuery> {
    [resolve_travel(input), resolve_electricity(input), resolve_waste(input)]
        .into_iter()
        .flatten()
        .collect()
}

pub fn resolve_travel(input: &InputRecord) -> Option<ActivityQuery> {
    let (activity_id, quantity) = match input.profile()? {
        Profile::Individual => {
            if input.travel_km() <= 0.0 {
                return None;
            }
            (input.travel_mode()?.activity_id(), input.travel_km())
        }
        Profile::Family => {
            if input.family_travel_km() <= 0.0 {
                return None;
            }
            (input.vehicle_type()?.activity_id(), input.fleet_km())
        }
    };

    // A missing fleet size leaves nothing to look up
    if quantity <= 0.0 {
        return None;
    }

    Some(ActivityQuery {
        category: Category::Travel,
        activity_id,
        quantity,
        unit: Unit::Km,
    })
}

pub fn resolve_electricity(input: &InputRecord) -> Option<ActivityQuery> {
    let kwh = input.electricity_kwh();
    (kwh > 0.0).then_some(ActivityQuery {
        category: Category::Electricity,
        activity_id: ELECTRICITY_ACTIVITY,
        quantity: kwh,
        unit: Unit::KWh,
    })
}

pub fn resolve_waste(input: &InputRecord) -> Option<ActivityQuery> {
    let kg = input.waste_kg();
    (kg > 0.0).then_some(ActivityQuery {
        category: Category::Waste,
        activity_id: WASTE_ACTIVITY,
        quantity: kg,
        unit: Unit::Kg,
    })
}

/// Diet emissions in kg CO2e per month; no provider involved.
pub fn diet_co2e(input: &InputRecord) -> f64 {
    input
        .diet()
        .map_or(0.0, |diet| diet.monthly_kg_per_person() * input.member_count())
}
