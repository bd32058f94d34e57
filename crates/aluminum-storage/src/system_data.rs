//! Persisted system data reports

use serde::Serialize;

use crate::database::Database;
use crate::Result;

#[derive(Debug, Clone, Serialize)]
pub struct SystemDataRecord {
    pub id: i64,
    pub report_id: String,
    pub timestamp: String,
    pub data: serde_json::Value,
}

pub struct SystemDataStore {
    db: Database,
}

impl SystemDataStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Store a report document. Returns the row id.
    pub fn insert(&self, report_id: &str, timestamp: &str, data: &serde_json::Value) -> Result<i64> {
        let json = serde_json::to_string(data)?;
        let id = self.db.with_connection(|conn| {
            conn.execute(
                "INSERT INTO system_data (report_id, timestamp, data) VALUES (?1, ?2, ?3)",
                rusqlite::params![report_id, timestamp, json],
            )?;
            Ok(conn.last_insert_rowid())
        })?;

        tracing::debug!(id, report_id = %report_id, "System data saved");
        Ok(id)
    }

    /// Newest reports first
    pub fn list(&self, limit: usize) -> Result<Vec<SystemDataRecord>> {
        let rows = self.db.with_connection(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, report_id, timestamp, data FROM system_data
                 ORDER BY timestamp DESC, id DESC
                 LIMIT ?1",
            )?;
            let rows = stmt
                .query_map([limit as i64], |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                    ))
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rows)
        })?;

        rows.into_iter()
            .map(|(id, report_id, timestamp, data)| {
                Ok(SystemDataRecord {
                    id,
                    report_id,
                    timestamp,
                    data: serde_json::from_str(&data)?,
                })
            })
            .collect()
    }
}

impl Clone for SystemDataStore {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_insert_and_list() {
        let store = SystemDataStore::new(Database::open_in_memory().unwrap());
        store
            .insert("r1", "2024-01-01T00:00:00.000000Z", &json!({"os": {"name": "Linux"}}))
            .unwrap();
        let id = store
            .insert("r2", "2024-01-02T00:00:00.000000Z", &json!({"os": {"name": "Linux"}}))
            .unwrap();

        let records = store.list(10).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, id);
        assert_eq!(records[0].report_id, "r2");
        assert_eq!(records[1].data["os"]["name"], "Linux");
    }
}
