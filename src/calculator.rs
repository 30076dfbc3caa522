//! Emissions aggregation and report shaping

use std::thread;

use tracing::{debug, error, warn};

use crate::activity::{self, ActivityQuery, Category};
use crate::models::{
    CategoryBreakdown, CategoryEmission, CategoryEmissions, Comparison, GasBreakdown, InputRecord,
    ReductionSummary, Report,
};
use crate::policy::{self, GLOBAL_AVERAGE_KG, REPORT_UNIT, round_to};
use crate::provider::EmissionFactorProvider;

/// Compute the four category results for `input`.
///
/// Provider lookups run concurrently, one scoped thread per active category.
/// A lookup that fails, returns no figure or panics leaves its category at
/// zero; it never fails the request.
pub fn calculate_emissions(provider: &dyn EmissionFactorProvider, input: &InputRecord) -> CategoryEmissions {
    let queries = activity::resolve_queries(input);

    let estimates: Vec<(Category, f64)> = thread::scope(|s| {
        let handles: Vec<_> = queries
            .iter()
            .map(|query| (query.category, s.spawn(move || estimate_category(provider, query))))
            .collect();

        handles
            .into_iter()
            .map(|(category, handle)| match handle.join() {
                Ok(co2e) => (category, co2e),
                Err(_) => {
                    error!(%category, provider = provider.name(), "Emission lookup panicked");
                    (category, 0.0)
                }
            })
            .collect()
    });

    let mut emissions = CategoryEmissions::default();
    for (category, co2e) in estimates {
        let result = CategoryEmission::split(category, co2e);
        match category {
            Category::Travel => emissions.travel = result,
            Category::Electricity => emissions.electricity = result,
            Category::Waste => emissions.waste = result,
            Category::Diet => {}
        }
    }
    emissions.diet = CategoryEmission::split(Category::Diet, activity::diet_co2e(input));

    debug!(
        travel = emissions.travel.co2e,
        electricity = emissions.electricity.co2e,
        diet = emissions.diet.co2e,
        waste = emissions.waste.co2e,
        "Resolved category emissions"
    );

    emissions
}

fn estimate_category(provider: &dyn EmissionFactorProvider, query: &ActivityQuery) -> f64 {
    match provider.estimate(query) {
        Ok(Some(co2e)) if co2e.is_finite() && co2e != 0.0 => co2e,
        Ok(_) => {
            warn!(
                category = %query.category,
                activity_id = query.activity_id,
                provider = provider.name(),
                "Provider returned no usable figure"
            );
            0.0
        }
        Err(e) => {
            warn!(
                category = %query.category,
                activity_id = query.activity_id,
                provider = provider.name(),
                error = %e,
                "Emission lookup failed"
            );
            0.0
        }
    }
}

/// Shape the final report from computed category results
pub fn build_report(input: &InputRecord, emissions: &CategoryEmissions) -> Report {
    let total = emissions.iter().fold(GasBreakdown::default(), |acc, e| GasBreakdown {
        co2: acc.co2 + e.co2,
        ch4: acc.ch4 + e.ch4,
        n2o: acc.n2o + e.n2o,
        co2e: acc.co2e + e.co2e,
    });

    let measures = policy::reduction_measures(input, emissions);
    let reduction: f64 = measures.iter().map(|m| m.kg_co2e).sum();

    let difference = total.co2e - GLOBAL_AVERAGE_KG;
    let percent_reduction = if total.co2e == 0.0 {
        0.0
    } else {
        round_to(reduction / total.co2e * 100.0, 1)
    };

    Report {
        total_emissions: round_to(total.co2e, 2),
        unit: REPORT_UNIT,
        profile: input.profile.clone(),
        gas_breakdown: GasBreakdown {
            co2: round_to(total.co2, 2),
            ch4: round_to(total.ch4, 2),
            n2o: round_to(total.n2o, 2),
            co2e: round_to(total.co2e, 2),
        },
        category_breakdown: CategoryBreakdown {
            travel: round_to(emissions.travel.co2e, 2),
            electricity: round_to(emissions.electricity.co2e, 2),
            diet: round_to(emissions.diet.co2e, 2),
            waste: round_to(emissions.waste.co2e, 2),
        },
        comparison: Comparison {
            your_emissions: round_to(total.co2e, 2),
            global_average: GLOBAL_AVERAGE_KG,
            difference: round_to(difference, 2),
            percent_diff: round_to(difference / GLOBAL_AVERAGE_KG * 100.0, 1),
        },
        reduction: ReductionSummary {
            current: round_to(total.co2e, 2),
            potential: round_to(reduction, 2),
            after_reduction: round_to(total.co2e - reduction, 2),
            percent_reduction,
        },
        measures,
    }
}

/// Full pass: resolve, look up, split, aggregate and shape
pub fn calculate_report(provider: &dyn EmissionFactorProvider, input: &InputRecord) -> Report {
    let emissions = calculate_emissions(provider, input);
    build_report(input, &emissions)
}

impl std::fmt::Display for Report {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Carbon Footprint ===")?;
        if let Some(profile) = &self.profile {
            match profile.as_str() {
                Some(name) => writeln!(f, "Profile: {}", name)?,
                None => writeln!(f, "Profile: {}", profile)?,
            }
        }
        writeln!(f, "Total: {:.2} {}", self.total_emissions, self.unit)?;
        writeln!(f)?;

        writeln!(f, "By category:")?;
        let c = &self.category_breakdown;
        for (name, value) in [
            ("Travel", c.travel),
            ("Electricity", c.electricity),
            ("Diet", c.diet),
            ("Waste", c.waste),
        ] {
            writeln!(f, "  {:<12} {:>10.2} kg", name, value)?;
        }
        writeln!(f)?;

        writeln!(f, "By gas:")?;
        writeln!(f, "  CO2  {:>10.2} kg", self.gas_breakdown.co2)?;
        writeln!(f, "  CH4  {:>10.2} kg", self.gas_breakdown.ch4)?;
        writeln!(f, "  N2O  {:>10.2} kg", self.gas_breakdown.n2o)?;
        writeln!(f)?;

        let cmp = &self.comparison;
        let direction = if cmp.difference > 0.0 { "above" } else { "below" };
        writeln!(
            f,
            "Global average: {:.0} kg ({:.2} kg, {:.1}% {})",
            cmp.global_average,
            cmp.difference.abs(),
            cmp.percent_diff.abs(),
            direction
        )?;
        writeln!(f)?;

        writeln!(f, "Reduction potential:")?;
        for measure in &self.measures {
            writeln!(f, "  {:<55} {:>8.2} kg", measure.label, measure.kg_co2e)?;
        }
        writeln!(
            f,
            "  Total: {:.2} kg ({:.1}%), leaving {:.2} kg",
            self.reduction.potential, self.reduction.percent_reduction, self.reduction.after_reduction
        )?;

        Ok(())
    }
}
