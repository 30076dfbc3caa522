//! Emission factor store schema and operations

use anyhow::{Result, anyhow};
use rusqlite::{Connection, OptionalExtension, Row};

use crate::activity::Unit;
use crate::models::EmissionFactor;

/// Initialize the database schema
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- One factor per activity, expressed per unit of its physical quantity
        CREATE TABLE IF NOT EXISTS emission_factors (
            activity_id TEXT PRIMARY KEY,
            unit TEXT NOT NULL,
            kg_co2e_per_unit REAL NOT NULL,
            source TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_emission_factors_unit ON emission_factors(unit);
        "#,
    )?;
    Ok(())
}

/// Insert or replace an emission factor
pub fn upsert_factor(conn: &Connection, factor: &EmissionFactor) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO emission_factors (activity_id, unit, kg_co2e_per_unit, source)
         VALUES (?1, ?2, ?3, ?4)",
        (
            &factor.activity_id,
            factor.unit.as_str(),
            factor.kg_co2e_per_unit,
            &factor.source,
        ),
    )?;
    Ok(())
}

/// Clear all stored factors (for re-import)
pub fn clear_factors(conn: &Connection) -> Result<()> {
    conn.execute_batch("DELETE FROM emission_factors;")?;
    Ok(())
}

fn factor_from_row(row: &Row<'_>) -> rusqlite::Result<(String, String, f64, Option<String>)> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
}

fn into_factor(
    (activity_id, unit, kg_co2e_per_unit, source): (String, String, f64, Option<String>),
) -> Result<EmissionFactor> {
    let unit = Unit::parse(&unit).ok_or_else(|| anyhow!("unknown unit '{}' for {}", unit, activity_id))?;
    Ok(EmissionFactor {
        activity_id,
        unit,
        kg_co2e_per_unit,
        source,
    })
}

/// Look up the factor for an activity
pub fn get_factor(conn: &Connection, activity_id: &str) -> Result<Option<EmissionFactor>> {
    let row = conn
        .query_row(
            "SELECT activity_id, unit, kg_co2e_per_unit, source
             FROM emission_factors
             WHERE activity_id = ?1",
            [activity_id],
            factor_from_row,
        )
        .optional()?;

    row.map(into_factor).transpose()
}

/// List all stored factors
pub fn list_factors(conn: &Connection) -> Result<Vec<EmissionFactor>> {
    let mut stmt = conn.prepare(
        "SELECT activity_id, unit, kg_co2e_per_unit, source FROM emission_factors ORDER BY activity_id",
    )?;

    let rows = stmt.query_map([], factor_from_row)?;

    let mut results = Vec::new();
    for row in rows {
        results.push(into_factor(row?)?);
    }
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        conn
    }

    fn factor(id: &str, value: f64) -> EmissionFactor {
        EmissionFactor {
            activity_id: id.to_string(),
            unit: Unit::Km,
            kg_co2e_per_unit: value,
            source: Some("test".to_string()),
        }
    }

    #[test]
    fn upsert_replaces_existing_factor() {
        let conn = store();
        upsert_factor(&conn, &factor("bike", 0.01)).unwrap();
        upsert_factor(&conn, &factor("bike", 0.02)).unwrap();

        let stored = get_factor(&conn, "bike").unwrap().unwrap();
        assert_eq!(stored.kg_co2e_per_unit, 0.02);
        assert_eq!(list_factors(&conn).unwrap().len(), 1);
    }

    #[test]
    fn list_is_sorted_and_clear_empties() {
        let conn = store();
        upsert_factor(&conn, &factor("zeta", 1.0)).unwrap();
        upsert_factor(&conn, &factor("alpha", 2.0)).unwrap();

        let ids: Vec<_> = list_factors(&conn).unwrap().into_iter().map(|f| f.activity_id).collect();
        assert_eq!(ids, ["alpha", "zeta"]);

        clear_factors(&conn).unwrap();
        assert!(list_factors(&conn).unwrap().is_empty());
        assert!(get_factor(&conn, "alpha").unwrap().is_none());
    }

    #[test]
    fn schema_init_is_idempotent() {
        let conn = store();
        init_schema(&conn).unwrap();
    }
}
