//! Fuel fill operations for the repository.

use crate::domain::{Decimal, FillId, FillRecord, UserId, VehicleId};
use chrono::NaiveDate;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use std::str::FromStr;
use tracing::warn;

use super::{from_millis, parse_uuid, Repository};

impl Repository {
    /// Insert a fill and return the sequence number SQLite assigned to it.
    ///
    /// Decimals are written with their full scale so `2800.00` reads back as
    /// `2800.00`.
    ///
    /// # Errors
    /// Returns an error if the insert fails.
    pub async fn insert_fill(&self, fill: &FillRecord) -> Result<i64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO fuel_fills (
                id, vehicle_id, user_id, fill_date, odometer_reading, fuel_volume,
                price_per_liter, total_amount, mileage, estimated, notes, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(fill.id.to_string())
        .bind(fill.vehicle_id.to_string())
        .bind(fill.user_id.to_string())
        .bind(fill.fill_date.format("%Y-%m-%d").to_string())
        .bind(fill.odometer_reading)
        .bind(fill.fuel_volume.map(|d| d.to_scaled_string()))
        .bind(fill.price_per_liter.map(|d| d.to_scaled_string()))
        .bind(fill.total_amount.to_scaled_string())
        .bind(fill.mileage.map(|d| d.to_scaled_string()))
        .bind(fill.estimated)
        .bind(fill.notes.as_deref())
        .bind(fill.created_at.timestamp_millis())
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Query a vehicle's fills ordered by `(fill_date, seq)`, optionally
    /// restricted to an inclusive date range.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn query_history(
        &self,
        vehicle: &VehicleId,
        range: Option<(NaiveDate, NaiveDate)>,
    ) -> Result<Vec<FillRecord>, sqlx::Error> {
        let mut sql = String::from(
            r#"
            SELECT seq, id, vehicle_id, user_id, fill_date, odometer_reading, fuel_volume,
                   price_per_liter, total_amount, mileage, estimated, notes, created_at
            FROM fuel_fills
            WHERE vehicle_id = ?"#,
        );
        // Range bounds compare ISO date text, so they are only added when asked for.
        if range.is_some() {
            sql.push_str(" AND fill_date >= ? AND fill_date <= ?");
        }
        sql.push_str(" ORDER BY fill_date ASC, seq ASC");

        let mut query = sqlx::query(&sql).bind(vehicle.to_string());
        if let Some((from, to)) = range {
            query = query
                .bind(from.format("%Y-%m-%d").to_string())
                .bind(to.format("%Y-%m-%d").to_string());
        }
        let rows = query.fetch_all(&self.pool).await?;

        Ok(rows.iter().map(fill_from_row).collect())
    }

    /// Delete one fill of a vehicle. Returns false if no such fill exists for
    /// that vehicle.
    ///
    /// # Errors
    /// Returns an error if the delete fails.
    pub async fn remove_fill(&self, vehicle: &VehicleId, fill: &FillId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM fuel_fills WHERE id = ? AND vehicle_id = ?")
            .bind(fill.to_string())
            .bind(vehicle.to_string())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

fn fill_from_row(row: &SqliteRow) -> FillRecord {
    let seq: i64 = row.get("seq");
    let id_str: String = row.get("id");
    let vehicle_str: String = row.get("vehicle_id");
    let user_str: String = row.get("user_id");
    let date_str: String = row.get("fill_date");
    let total_str: String = row.get("total_amount");
    let created_at_ms: i64 = row.get("created_at");

    let fill_date = NaiveDate::parse_from_str(&date_str, "%Y-%m-%d").unwrap_or_else(|e| {
        warn!(seq, fill_date = %date_str, error = %e, "Failed to parse fill_date, using default");
        NaiveDate::default()
    });
    let total_amount = Decimal::from_str(&total_str).unwrap_or_else(|e| {
        warn!(seq, total_amount = %total_str, error = %e, "Failed to parse total_amount decimal, using default");
        Decimal::default()
    });

    FillRecord {
        id: FillId::new(parse_uuid("fuel_fills.id", &id_str)),
        vehicle_id: VehicleId::new(parse_uuid("fuel_fills.vehicle_id", &vehicle_str)),
        user_id: UserId::new(parse_uuid("fuel_fills.user_id", &user_str)),
        seq,
        fill_date,
        odometer_reading: row.get("odometer_reading"),
        fuel_volume: optional_decimal(seq, "fuel_volume", row.get("fuel_volume")),
        price_per_liter: optional_decimal(seq, "price_per_liter", row.get("price_per_liter")),
        total_amount,
        mileage: optional_decimal(seq, "mileage", row.get("mileage")),
        estimated: row.get("estimated"),
        notes: row.get("notes"),
        created_at: from_millis(created_at_ms),
    }
}

fn optional_decimal(seq: i64, column: &str, raw: Option<String>) -> Option<Decimal> {
    raw.and_then(|s| {
        Decimal::from_str(&s)
            .map_err(|e| {
                warn!(seq, column, value = %s, error = %e, "Failed to parse decimal, ignoring");
                e
            })
            .ok()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::init_db;
    use crate::domain::{Vehicle, VehicleDetails};
    use chrono::Utc;
    use tempfile::TempDir;

    async fn setup_test_db() -> (Repository, Vehicle, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir
            .path()
            .join("test.db")
            .to_string_lossy()
            .to_string();
        let pool = init_db(&db_path).await.expect("init_db failed");
        let repo = Repository::new(pool);
        let vehicle =
            Vehicle::register(UserId::random(), VehicleDetails::default(), None, Utc::now());
        repo.insert_vehicle(&vehicle).await.expect("insert vehicle failed");
        (repo, vehicle, temp_dir)
    }

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn fill(vehicle: &Vehicle, date: &str, odometer: i64) -> FillRecord {
        FillRecord {
            id: FillId::random(),
            vehicle_id: vehicle.id,
            user_id: vehicle.owner_id,
            seq: 0,
            fill_date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            odometer_reading: odometer,
            fuel_volume: Some(d("28.000")),
            price_per_liter: Some(d("100.00")),
            total_amount: d("2800.00"),
            mileage: Some(d("14.286")),
            estimated: false,
            notes: Some("highway".to_string()),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_insert_and_query_fill_keeps_scale() {
        let (repo, vehicle, _temp) = setup_test_db().await;
        let record = fill(&vehicle, "2024-01-15", 1400);

        let seq = repo.insert_fill(&record).await.expect("insert failed");
        assert!(seq > 0);

        let history = repo.query_history(&vehicle.id, None).await.expect("query failed");
        assert_eq!(history.len(), 1);
        let loaded = &history[0];
        assert_eq!(loaded.seq, seq);
        assert_eq!(loaded.id, record.id);
        assert_eq!(loaded.total_amount.to_scaled_string(), "2800.00");
        assert_eq!(loaded.fuel_volume.unwrap().to_scaled_string(), "28.000");
        assert_eq!(loaded.mileage.unwrap().to_scaled_string(), "14.286");
        assert_eq!(loaded.notes.as_deref(), Some("highway"));
        assert!(!loaded.estimated);
    }

    #[tokio::test]
    async fn test_null_volume_and_mileage() {
        let (repo, vehicle, _temp) = setup_test_db().await;
        let record = FillRecord {
            fuel_volume: None,
            mileage: None,
            notes: None,
            ..fill(&vehicle, "2024-01-01", 1000)
        };
        repo.insert_fill(&record).await.unwrap();

        let history = repo.query_history(&vehicle.id, None).await.unwrap();
        assert_eq!(history[0].fuel_volume, None);
        assert_eq!(history[0].mileage, None);
        assert_eq!(history[0].notes, None);
    }

    #[tokio::test]
    async fn test_history_ordered_by_date_then_seq() {
        let (repo, vehicle, _temp) = setup_test_db().await;
        repo.insert_fill(&fill(&vehicle, "2024-03-01", 1800)).await.unwrap();
        let first_same_day = repo.insert_fill(&fill(&vehicle, "2024-02-01", 1400)).await.unwrap();
        let second_same_day = repo.insert_fill(&fill(&vehicle, "2024-02-01", 1500)).await.unwrap();
        repo.insert_fill(&fill(&vehicle, "2024-01-01", 1000)).await.unwrap();

        let history = repo.query_history(&vehicle.id, None).await.unwrap();
        let odometers: Vec<i64> = history.iter().map(|f| f.odometer_reading).collect();
        assert_eq!(odometers, vec![1000, 1400, 1500, 1800]);
        assert!(first_same_day < second_same_day);
        assert_eq!(history[1].seq, first_same_day);
    }

    #[tokio::test]
    async fn test_history_range_is_inclusive() {
        let (repo, vehicle, _temp) = setup_test_db().await;
        repo.insert_fill(&fill(&vehicle, "2023-12-31", 900)).await.unwrap();
        repo.insert_fill(&fill(&vehicle, "2024-01-01", 1000)).await.unwrap();
        repo.insert_fill(&fill(&vehicle, "2024-12-31", 2000)).await.unwrap();
        repo.insert_fill(&fill(&vehicle, "2025-01-01", 2100)).await.unwrap();

        let range = (
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
        );
        let history = repo.query_history(&vehicle.id, Some(range)).await.unwrap();
        let odometers: Vec<i64> = history.iter().map(|f| f.odometer_reading).collect();
        assert_eq!(odometers, vec![1000, 2000]);
    }

    #[tokio::test]
    async fn test_unbounded_history_keeps_every_stored_date() {
        let (repo, vehicle, _temp) = setup_test_db().await;
        repo.insert_fill(&fill(&vehicle, "2024-05-01", 1000)).await.unwrap();
        let far_future = FillRecord {
            fill_date: NaiveDate::from_ymd_opt(10000, 5, 1).unwrap(),
            ..fill(&vehicle, "2024-05-01", 1100)
        };
        repo.insert_fill(&far_future).await.unwrap();

        let history = repo.query_history(&vehicle.id, None).await.unwrap();
        assert_eq!(history.len(), 2);
        assert!(history.iter().any(|f| f.odometer_reading == 1100));
    }

    #[tokio::test]
    async fn test_fill_requires_existing_vehicle() {
        let (repo, _vehicle, _temp) = setup_test_db().await;
        let orphan = Vehicle::register(UserId::random(), VehicleDetails::default(), None, Utc::now());
        let result = repo.insert_fill(&fill(&orphan, "2024-01-01", 10)).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_remove_fill_matches_vehicle() {
        let (repo, vehicle, _temp) = setup_test_db().await;
        let record = fill(&vehicle, "2024-01-01", 1000);
        repo.insert_fill(&record).await.unwrap();
        repo.insert_fill(&fill(&vehicle, "2024-02-01", 1400)).await.unwrap();

        assert!(!repo.remove_fill(&VehicleId::random(), &record.id).await.unwrap());
        assert!(repo.remove_fill(&vehicle.id, &record.id).await.unwrap());
        assert!(!repo.remove_fill(&vehicle.id, &record.id).await.unwrap());

        let history = repo.query_history(&vehicle.id, None).await.unwrap();
        let odometers: Vec<i64> = history.iter().map(|f| f.odometer_reading).collect();
        assert_eq!(odometers, vec![1400]);
    }
}
