//! Repository layer for database operations.
//!
//! `Repository` is the SQLite-backed [`FuelLedger`]. Methods are organized
//! across submodules by table:
//! - `mod.rs` - Vehicle operations and the ledger trait impl
//! - `fills.rs` - Fuel fill operations

mod fills;

use crate::domain::{FillId, FillRecord, UserId, Vehicle, VehicleDetails, VehicleId};
use crate::ledger::{ensure_owner, year_bounds, FuelLedger, LedgerError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::Row;
use std::str::FromStr;
use tracing::warn;
use uuid::Uuid;

/// Repository for database operations.
#[derive(Debug, Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Repository { pool }
    }

    // =========================================================================
    // Vehicle operations
    // =========================================================================

    /// Insert a vehicle.
    ///
    /// # Errors
    /// Returns an error if the insert fails.
    pub async fn insert_vehicle(&self, vehicle: &Vehicle) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO vehicles (
                id, owner_id, nickname, registration_number, make, model,
                initial_odometer, current_odometer, created_at, updated_at, deleted
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(vehicle.id.to_string())
        .bind(vehicle.owner_id.to_string())
        .bind(vehicle.details.nickname.as_deref())
        .bind(vehicle.details.registration_number.as_deref())
        .bind(vehicle.details.make.as_deref())
        .bind(vehicle.details.model.as_deref())
        .bind(vehicle.initial_odometer)
        .bind(vehicle.current_odometer)
        .bind(vehicle.created_at.timestamp_millis())
        .bind(vehicle.updated_at.map(|t| t.timestamp_millis()))
        .bind(vehicle.deleted)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Get a vehicle by id.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn get_vehicle(&self, id: &VehicleId) -> Result<Option<Vehicle>, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT id, owner_id, nickname, registration_number, make, model,
                   initial_odometer, current_odometer, created_at, updated_at, deleted
            FROM vehicles
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(vehicle_from_row))
    }

    /// Query the live vehicles of one owner, oldest first.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn query_vehicles_for_owner(
        &self,
        owner: &UserId,
    ) -> Result<Vec<Vehicle>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT id, owner_id, nickname, registration_number, make, model,
                   initial_odometer, current_odometer, created_at, updated_at, deleted
            FROM vehicles
            WHERE owner_id = ? AND deleted = 0
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(owner.to_string())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(vehicle_from_row).collect())
    }

    /// Advance a vehicle's odometer if `reading` is strictly greater than the
    /// stored value, or the stored value is unset.
    ///
    /// The comparison happens inside the UPDATE so concurrent writers cannot
    /// move the odometer backwards. Returns whether a row changed.
    ///
    /// # Errors
    /// Returns an error if the update fails.
    pub async fn advance_odometer(
        &self,
        id: &VehicleId,
        reading: i64,
        at: DateTime<Utc>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE vehicles
            SET current_odometer = ?, updated_at = ?
            WHERE id = ? AND deleted = 0
              AND (current_odometer IS NULL OR current_odometer < ?)
            "#,
        )
        .bind(reading)
        .bind(at.timestamp_millis())
        .bind(id.to_string())
        .bind(reading)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Overwrite the descriptive fields of a live vehicle.
    ///
    /// Returns whether a row changed.
    ///
    /// # Errors
    /// Returns an error if the update fails.
    pub async fn update_vehicle_details(
        &self,
        id: &VehicleId,
        details: &VehicleDetails,
        at: DateTime<Utc>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE vehicles
            SET nickname = ?, registration_number = ?, make = ?, model = ?, updated_at = ?
            WHERE id = ? AND deleted = 0
            "#,
        )
        .bind(details.nickname.as_deref())
        .bind(details.registration_number.as_deref())
        .bind(details.make.as_deref())
        .bind(details.model.as_deref())
        .bind(at.timestamp_millis())
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Flag a vehicle as deleted. Its fills stay in place.
    ///
    /// Returns false if the vehicle is missing or already deleted.
    ///
    /// # Errors
    /// Returns an error if the update fails.
    pub async fn mark_vehicle_deleted(
        &self,
        id: &VehicleId,
        at: DateTime<Utc>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE vehicles SET deleted = 1, updated_at = ? WHERE id = ? AND deleted = 0",
        )
        .bind(at.timestamp_millis())
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

fn vehicle_not_found(id: &VehicleId) -> LedgerError {
    LedgerError::NotFound(format!("Vehicle {} not found", id))
}

#[async_trait]
impl FuelLedger for Repository {
    async fn create_vehicle(&self, vehicle: &Vehicle) -> Result<(), LedgerError> {
        Ok(self.insert_vehicle(vehicle).await?)
    }

    async fn list_vehicles(&self, owner: &UserId) -> Result<Vec<Vehicle>, LedgerError> {
        Ok(self.query_vehicles_for_owner(owner).await?)
    }

    async fn validate_ownership(
        &self,
        user: &UserId,
        vehicle: &VehicleId,
    ) -> Result<Vehicle, LedgerError> {
        let found = self.get_vehicle(vehicle).await?;
        ensure_owner(found, user, vehicle)
    }

    async fn list_history_ascending(
        &self,
        vehicle: &VehicleId,
    ) -> Result<Vec<FillRecord>, LedgerError> {
        Ok(self.query_history(vehicle, None).await?)
    }

    async fn list_history_ascending_for_year(
        &self,
        vehicle: &VehicleId,
        year: i32,
    ) -> Result<Vec<FillRecord>, LedgerError> {
        match year_bounds(year) {
            Some(bounds) => Ok(self.query_history(vehicle, Some(bounds)).await?),
            None => Ok(Vec::new()),
        }
    }

    async fn save_fill_record(&self, record: &FillRecord) -> Result<FillRecord, LedgerError> {
        let seq = self.insert_fill(record).await?;
        Ok(FillRecord {
            seq,
            created_at: truncate_to_millis(record.created_at),
            ..record.clone()
        })
    }

    async fn save_vehicle_odometer(
        &self,
        vehicle: &VehicleId,
        reading: i64,
        at: DateTime<Utc>,
    ) -> Result<bool, LedgerError> {
        Ok(self.advance_odometer(vehicle, reading, at).await?)
    }

    async fn save_vehicle_details(
        &self,
        vehicle: &VehicleId,
        details: &VehicleDetails,
        at: DateTime<Utc>,
    ) -> Result<(), LedgerError> {
        if self.update_vehicle_details(vehicle, details, at).await? {
            Ok(())
        } else {
            Err(vehicle_not_found(vehicle))
        }
    }

    async fn soft_delete_vehicle(
        &self,
        vehicle: &VehicleId,
        at: DateTime<Utc>,
    ) -> Result<(), LedgerError> {
        if self.mark_vehicle_deleted(vehicle, at).await? {
            Ok(())
        } else {
            Err(vehicle_not_found(vehicle))
        }
    }

    async fn delete_fill(&self, vehicle: &VehicleId, fill: &FillId) -> Result<bool, LedgerError> {
        Ok(self.remove_fill(vehicle, fill).await?)
    }
}

fn vehicle_from_row(row: &SqliteRow) -> Vehicle {
    let id_str: String = row.get("id");
    let owner_str: String = row.get("owner_id");
    let created_at_ms: i64 = row.get("created_at");
    let updated_at_ms: Option<i64> = row.get("updated_at");

    Vehicle {
        id: VehicleId::new(parse_uuid("vehicles.id", &id_str)),
        owner_id: UserId::new(parse_uuid("vehicles.owner_id", &owner_str)),
        details: VehicleDetails {
            nickname: row.get("nickname"),
            registration_number: row.get("registration_number"),
            make: row.get("make"),
            model: row.get("model"),
        },
        initial_odometer: row.get("initial_odometer"),
        current_odometer: row.get("current_odometer"),
        created_at: from_millis(created_at_ms),
        updated_at: updated_at_ms.map(from_millis),
        deleted: row.get("deleted"),
    }
}

pub(crate) fn parse_uuid(column: &str, raw: &str) -> Uuid {
    Uuid::from_str(raw).unwrap_or_else(|e| {
        warn!(column, value = %raw, error = %e, "Failed to parse uuid, using nil");
        Uuid::nil()
    })
}

pub(crate) fn from_millis(ms: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(ms).unwrap_or_else(|| {
        warn!(ms, "Timestamp out of range, using epoch");
        DateTime::<Utc>::default()
    })
}

pub(crate) fn truncate_to_millis(at: DateTime<Utc>) -> DateTime<Utc> {
    from_millis(at.timestamp_millis())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::init_db;
    use tempfile::TempDir;

    async fn setup_test_db() -> (Repository, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir
            .path()
            .join("test.db")
            .to_string_lossy()
            .to_string();
        let pool = init_db(&db_path).await.expect("init_db failed");
        (Repository::new(pool), temp_dir)
    }

    fn sample_vehicle(owner: UserId, initial: Option<i64>) -> Vehicle {
        Vehicle::register(
            owner,
            VehicleDetails {
                nickname: Some("Daily".to_string()),
                registration_number: Some("KA-01-1234".to_string()),
                make: Some("Honda".to_string()),
                model: None,
            },
            initial,
            truncate_to_millis(Utc::now()),
        )
    }

    #[tokio::test]
    async fn test_insert_and_get_vehicle() {
        let (repo, _temp) = setup_test_db().await;
        let vehicle = sample_vehicle(UserId::random(), Some(1000));

        repo.insert_vehicle(&vehicle).await.expect("insert failed");
        let loaded = repo
            .get_vehicle(&vehicle.id)
            .await
            .expect("query failed")
            .expect("vehicle missing");

        assert_eq!(loaded, vehicle);
        assert!(repo.get_vehicle(&VehicleId::random()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_query_vehicles_for_owner() {
        let (repo, _temp) = setup_test_db().await;
        let owner = UserId::random();
        repo.insert_vehicle(&sample_vehicle(owner, None)).await.unwrap();
        repo.insert_vehicle(&sample_vehicle(owner, Some(5))).await.unwrap();
        repo.insert_vehicle(&sample_vehicle(UserId::random(), None))
            .await
            .unwrap();

        let vehicles = repo.query_vehicles_for_owner(&owner).await.unwrap();
        assert_eq!(vehicles.len(), 2);
        assert!(vehicles.iter().all(|v| v.owner_id == owner));
    }

    #[tokio::test]
    async fn test_advance_odometer_only_moves_forward() {
        let (repo, _temp) = setup_test_db().await;
        let vehicle = sample_vehicle(UserId::random(), None);
        repo.insert_vehicle(&vehicle).await.unwrap();

        assert!(repo.advance_odometer(&vehicle.id, 1000, Utc::now()).await.unwrap());
        assert!(!repo.advance_odometer(&vehicle.id, 1000, Utc::now()).await.unwrap());
        assert!(!repo.advance_odometer(&vehicle.id, 900, Utc::now()).await.unwrap());
        assert!(repo.advance_odometer(&vehicle.id, 1400, Utc::now()).await.unwrap());

        let loaded = repo.get_vehicle(&vehicle.id).await.unwrap().unwrap();
        assert_eq!(loaded.current_odometer, Some(1400));
        assert!(loaded.updated_at.is_some());
    }

    #[tokio::test]
    async fn test_validate_ownership() {
        let (repo, _temp) = setup_test_db().await;
        let owner = UserId::random();
        let vehicle = sample_vehicle(owner, None);
        repo.create_vehicle(&vehicle).await.unwrap();

        assert!(repo.validate_ownership(&owner, &vehicle.id).await.is_ok());
        assert!(matches!(
            repo.validate_ownership(&UserId::random(), &vehicle.id).await,
            Err(LedgerError::Forbidden(_))
        ));
        assert!(matches!(
            repo.validate_ownership(&owner, &VehicleId::random()).await,
            Err(LedgerError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_update_vehicle_details() {
        let (repo, _temp) = setup_test_db().await;
        let vehicle = sample_vehicle(UserId::random(), None);
        repo.insert_vehicle(&vehicle).await.unwrap();
        let details = VehicleDetails {
            model: Some("City".to_string()),
            ..vehicle.details.clone()
        };

        assert!(repo
            .update_vehicle_details(&vehicle.id, &details, Utc::now())
            .await
            .unwrap());
        assert!(!repo
            .update_vehicle_details(&VehicleId::random(), &details, Utc::now())
            .await
            .unwrap());

        let loaded = repo.get_vehicle(&vehicle.id).await.unwrap().unwrap();
        assert_eq!(loaded.details, details);
        assert!(loaded.updated_at.is_some());
    }

    #[tokio::test]
    async fn test_soft_deleted_vehicle_is_hidden() {
        let (repo, _temp) = setup_test_db().await;
        let owner = UserId::random();
        let vehicle = sample_vehicle(owner, Some(100));
        repo.create_vehicle(&vehicle).await.unwrap();

        repo.soft_delete_vehicle(&vehicle.id, Utc::now()).await.unwrap();

        let loaded = repo.get_vehicle(&vehicle.id).await.unwrap().unwrap();
        assert!(loaded.deleted);
        assert!(repo.query_vehicles_for_owner(&owner).await.unwrap().is_empty());
        assert!(matches!(
            repo.validate_ownership(&owner, &vehicle.id).await,
            Err(LedgerError::NotFound(_))
        ));
        assert!(matches!(
            repo.soft_delete_vehicle(&vehicle.id, Utc::now()).await,
            Err(LedgerError::NotFound(_))
        ));
        assert!(!repo.advance_odometer(&vehicle.id, 500, Utc::now()).await.unwrap());
    }
}
