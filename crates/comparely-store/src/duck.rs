//! DuckDB storage for the device catalogue.

use std::path::Path;

use arrow::record_batch::RecordBatch;
use comparely_core::query::DEFAULT_AUTOCOMPLETE_LIMIT;
use comparely_core::{
    Category, CategoryId, Device, DeviceFilter, DeviceId, DeviceRepository, DeviceSuggestion,
    NewDevice, RecommendationCriteria,
};
use duckdb::{Connection, ToSql, params};
use tracing::{debug, info};

use crate::StoreError;

const SCHEMA: &str = "
    CREATE SEQUENCE IF NOT EXISTS category_id_seq START 1;
    CREATE SEQUENCE IF NOT EXISTS device_id_seq START 1;

    CREATE TABLE IF NOT EXISTS categories (
        id           BIGINT PRIMARY KEY,
        name         VARCHAR NOT NULL UNIQUE,
        description  VARCHAR
    );

    CREATE TABLE IF NOT EXISTS devices (
        id           BIGINT PRIMARY KEY,
        name         VARCHAR NOT NULL,
        brand        VARCHAR NOT NULL,
        category_id  BIGINT,
        cpu          VARCHAR,
        gpu          VARCHAR,
        ram          VARCHAR,
        storage      VARCHAR,
        camera       VARCHAR,
        battery      VARCHAR,
        screen       VARCHAR,
        release_year INTEGER,
        price        DOUBLE,
        image_url    VARCHAR,
        description  VARCHAR,
        source_url   VARCHAR,
        created_at   TIMESTAMP DEFAULT current_timestamp
    );
";

/// Column list matching [`device_from_row`].
const DEVICE_COLUMNS: &str = "id, name, brand, category_id, cpu, gpu, ram, storage, camera, \
     battery, screen, release_year, price, image_url, description, source_url";

/// Columns shown in tabular listings.
const TABLE_COLUMNS: &str = "id, name, brand, ram, storage, camera, battery, screen, \
     release_year, price";

/// DuckDB store for devices and categories.
///
/// Supports both in-memory (ephemeral) and persistent (file-backed) modes.
/// Use [`open`](Self::open) for in-memory and [`open_persistent`](Self::open_persistent)
/// for a database that survives process restarts. Both create the schema if
/// it is missing.
pub struct DuckStore {
    conn: Connection,
}

impl DuckStore {
    /// Open an in-memory DuckDB database with the catalogue schema.
    pub fn open() -> Result<Self, StoreError> {
        let store = Self {
            conn: Connection::open_in_memory()?,
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Open or create a persistent DuckDB database at the given path.
    pub fn open_persistent(path: &Path) -> Result<Self, StoreError> {
        let store = Self {
            conn: Connection::open(path)?,
        };
        store.init_schema()?;
        info!(path = %path.display(), "opened device store");
        Ok(store)
    }

    /// Create tables and id sequences. Idempotent.
    pub fn init_schema(&self) -> Result<(), StoreError> {
        self.conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    /// Check whether both catalogue tables exist.
    pub fn has_tables(&self) -> bool {
        self.conn
            .query_row(
                "SELECT count(*)::BIGINT FROM information_schema.tables
                 WHERE table_name IN ('devices', 'categories')",
                [],
                |row| row.get::<_, i64>(0),
            )
            .is_ok_and(|n| n == 2)
    }

    // ── Categories ──

    /// Insert a category. Names are unique (case-insensitive).
    pub fn create_category(
        &self,
        name: &str,
        description: Option<&str>,
    ) -> Result<Category, StoreError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(StoreError::Invalid(
                comparely_core::ValidationError::Empty("name"),
            ));
        }
        let existing: i64 = self.conn.query_row(
            "SELECT count(*)::BIGINT FROM categories WHERE lower(name) = lower(?)",
            [name],
            |row| row.get(0),
        )?;
        if existing > 0 {
            return Err(StoreError::Conflict(format!("category '{name}' already exists")));
        }

        let id: CategoryId =
            self.conn
                .query_row("SELECT nextval('category_id_seq')", [], |row| row.get(0))?;
        self.conn.execute(
            "INSERT INTO categories (id, name, description) VALUES (?, ?, ?)",
            params![id, name, description],
        )?;
        info!(id, name, "created category");
        Ok(Category {
            id,
            name: name.to_string(),
            description: description.map(str::to_string),
        })
    }

    pub fn get_category(&self, id: CategoryId) -> Result<Option<Category>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, description FROM categories WHERE id = ?")?;
        let mut rows = stmt.query_map([id], category_from_row)?;
        Ok(rows.next().transpose()?)
    }

    pub fn list_categories(&self) -> Result<Vec<Category>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, description FROM categories ORDER BY name")?;
        let rows = stmt.query_map([], category_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    // ── Devices: writes ──

    /// Validate and insert a device, returning its new id.
    pub fn insert_device(&self, device: &NewDevice) -> Result<DeviceId, StoreError> {
        device.validate()?;
        let id: DeviceId = self
            .conn
            .query_row("SELECT nextval('device_id_seq')", [], |row| row.get(0))?;
        self.conn.execute(
            &format!(
                "INSERT INTO devices ({DEVICE_COLUMNS})
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
            ),
            params![
                id,
                device.name.trim(),
                device.brand.trim(),
                device.category_id,
                device.cpu,
                device.gpu,
                device.ram,
                device.storage,
                device.camera,
                device.battery,
                device.screen,
                device.release_year,
                device.price,
                device.image_url,
                device.description,
                device.source_url,
            ],
        )?;
        debug!(id, name = %device.name, "inserted device");
        Ok(id)
    }

    /// Replace every field of an existing device. Returns `false` if the id
    /// does not exist.
    pub fn update_device(&self, id: DeviceId, device: &NewDevice) -> Result<bool, StoreError> {
        device.validate()?;
        let changed = self.conn.execute(
            "UPDATE devices SET
                name = ?, brand = ?, category_id = ?, cpu = ?, gpu = ?, ram = ?,
                storage = ?, camera = ?, battery = ?, screen = ?, release_year = ?,
                price = ?, image_url = ?, description = ?, source_url = ?
             WHERE id = ?",
            params![
                device.name.trim(),
                device.brand.trim(),
                device.category_id,
                device.cpu,
                device.gpu,
                device.ram,
                device.storage,
                device.camera,
                device.battery,
                device.screen,
                device.release_year,
                device.price,
                device.image_url,
                device.description,
                device.source_url,
                id,
            ],
        )?;
        Ok(changed > 0)
    }

    /// Delete a device. Returns `false` if the id does not exist.
    pub fn delete_device(&self, id: DeviceId) -> Result<bool, StoreError> {
        let changed = self.conn.execute("DELETE FROM devices WHERE id = ?", [id])?;
        Ok(changed > 0)
    }

    // ── Devices: reads ──

    /// Fetch a single device by id.
    pub fn get_device(&self, id: DeviceId) -> Result<Option<Device>, StoreError> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {DEVICE_COLUMNS} FROM devices WHERE id = ?"))?;
        let mut rows = stmt.query_map([id], device_from_row)?;
        Ok(rows.next().transpose()?)
    }

    pub fn device_count(&self) -> Result<usize, StoreError> {
        let n: i64 = self
            .conn
            .query_row("SELECT count(*)::BIGINT FROM devices", [], |row| row.get(0))?;
        Ok(n as usize)
    }

    /// Devices matching `filter`, ordered by id.
    pub fn list_devices(&self, filter: &DeviceFilter) -> Result<Vec<Device>, StoreError> {
        let (where_sql, values) = filter_clause(filter);
        let sql = format!(
            "SELECT {DEVICE_COLUMNS} FROM devices {where_sql} ORDER BY id LIMIT {} OFFSET {}",
            filter.limit(),
            filter.offset()
        );
        let params = as_params(&values);
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params.as_slice(), device_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Same selection as [`list_devices`](Self::list_devices), as Arrow
    /// batches with the columns used for terminal tables.
    pub fn devices_arrow(&self, filter: &DeviceFilter) -> Result<Vec<RecordBatch>, StoreError> {
        let (where_sql, values) = filter_clause(filter);
        let sql = format!(
            "SELECT {TABLE_COLUMNS} FROM devices {where_sql} ORDER BY id LIMIT {} OFFSET {}",
            filter.limit(),
            filter.offset()
        );
        let params = as_params(&values);
        let mut stmt = self.conn.prepare(&sql)?;
        let batches: Vec<RecordBatch> = stmt.query_arrow(params.as_slice())?.collect();
        Ok(batches)
    }

    /// Devices whose name contains `query`, for search-as-you-type.
    pub fn autocomplete(
        &self,
        query: &str,
        limit: Option<usize>,
    ) -> Result<Vec<DeviceSuggestion>, StoreError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT id, name, brand FROM devices
             WHERE lower(name) LIKE ? ESCAPE '\\'
             ORDER BY name LIMIT {}",
            limit.unwrap_or(DEFAULT_AUTOCOMPLETE_LIMIT)
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([like_pattern(query)], |row| {
            Ok(DeviceSuggestion {
                id: row.get(0)?,
                name: row.get(1)?,
                brand: row.get(2)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Distinct non-empty brands, sorted.
    pub fn unique_brands(&self) -> Result<Vec<String>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT brand FROM devices WHERE trim(brand) <> '' ORDER BY brand",
        )?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Newest-first, then cheapest-first devices matching `criteria`.
    pub fn recommend(&self, criteria: &RecommendationCriteria) -> Result<Vec<Device>, StoreError> {
        let mut clauses: Vec<&str> = Vec::new();
        let mut values: Vec<Box<dyn ToSql>> = Vec::new();
        if let Some(max_price) = criteria.max_price {
            clauses.push("price <= ?");
            values.push(Box::new(max_price));
        }
        if let Some(category_id) = criteria.category_id {
            clauses.push("category_id = ?");
            values.push(Box::new(category_id));
        }
        if let Some(year) = criteria.min_release_year {
            clauses.push("release_year >= ?");
            values.push(Box::new(year));
        }

        let sql = format!(
            "SELECT {DEVICE_COLUMNS} FROM devices {}
             ORDER BY release_year DESC NULLS LAST, price ASC NULLS LAST, id
             LIMIT {}",
            where_sql(&clauses),
            criteria.limit()
        );
        let params = as_params(&values);
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params.as_slice(), device_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    // ── Escape hatch ──

    /// Execute arbitrary SQL and return Arrow RecordBatches.
    pub fn query_arrow(&self, sql: &str) -> Result<Vec<RecordBatch>, StoreError> {
        let mut stmt = self.conn.prepare(sql)?;
        let batches: Vec<RecordBatch> = stmt.query_arrow([])?.collect();
        Ok(batches)
    }
}

impl DeviceRepository for DuckStore {
    type Error = StoreError;

    fn get_device(&self, id: DeviceId) -> Result<Option<Device>, StoreError> {
        DuckStore::get_device(self, id)
    }
}

fn device_from_row(row: &duckdb::Row<'_>) -> duckdb::Result<Device> {
    Ok(Device {
        id: row.get(0)?,
        name: row.get(1)?,
        brand: row.get(2)?,
        category_id: row.get(3)?,
        cpu: row.get(4)?,
        gpu: row.get(5)?,
        ram: row.get(6)?,
        storage: row.get(7)?,
        camera: row.get(8)?,
        battery: row.get(9)?,
        screen: row.get(10)?,
        release_year: row.get(11)?,
        price: row.get(12)?,
        image_url: row.get(13)?,
        description: row.get(14)?,
        source_url: row.get(15)?,
    })
}

fn category_from_row(row: &duckdb::Row<'_>) -> duckdb::Result<Category> {
    Ok(Category {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
    })
}

/// WHERE clause and bound values for a [`DeviceFilter`].
fn filter_clause(filter: &DeviceFilter) -> (String, Vec<Box<dyn ToSql>>) {
    let mut clauses: Vec<&str> = Vec::new();
    let mut values: Vec<Box<dyn ToSql>> = Vec::new();

    if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        clauses.push("(lower(name) LIKE ? ESCAPE '\\' OR lower(brand) LIKE ? ESCAPE '\\')");
        let pattern = like_pattern(search);
        values.push(Box::new(pattern.clone()));
        values.push(Box::new(pattern));
    }
    if let Some(brand) = filter.brand.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        clauses.push("lower(brand) = lower(?)");
        values.push(Box::new(brand.to_string()));
    }
    if let Some(category_id) = filter.category_id {
        clauses.push("category_id = ?");
        values.push(Box::new(category_id));
    }
    if let Some(min_price) = filter.min_price {
        clauses.push("price >= ?");
        values.push(Box::new(min_price));
    }
    if let Some(max_price) = filter.max_price {
        clauses.push("price <= ?");
        values.push(Box::new(max_price));
    }
    if let Some(year) = filter.min_year {
        clauses.push("release_year >= ?");
        values.push(Box::new(year));
    }

    (where_sql(&clauses), values)
}

fn where_sql(clauses: &[&str]) -> String {
    if clauses.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", clauses.join(" AND "))
    }
}

fn as_params(values: &[Box<dyn ToSql>]) -> Vec<&dyn ToSql> {
    values.iter().map(|v| v.as_ref()).collect()
}

/// Lowercased `%substring%` pattern with LIKE metacharacters escaped.
fn like_pattern(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('%');
    for ch in s.to_lowercase().chars() {
        if matches!(ch, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    out.push('%');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn phone(name: &str, brand: &str, year: i32, price: f64) -> NewDevice {
        NewDevice {
            name: name.into(),
            brand: brand.into(),
            category_id: Some(1),
            ram: Some("8GB".into()),
            storage: Some("256GB".into()),
            camera: Some("50MP + 12MP".into()),
            battery: Some("5000 mAh".into()),
            screen: Some("6.2 inch AMOLED".into()),
            release_year: Some(year),
            price: Some(price),
            ..Default::default()
        }
    }

    fn seeded() -> DuckStore {
        let store = DuckStore::open().unwrap();
        store.create_category("Smartphone", None).unwrap();
        store
            .insert_device(&phone("Galaxy S24", "Samsung", 2024, 13_999_000.0))
            .unwrap();
        store
            .insert_device(&phone("Galaxy A55", "Samsung", 2024, 5_999_000.0))
            .unwrap();
        store
            .insert_device(&phone("iPhone 15", "Apple", 2023, 15_499_000.0))
            .unwrap();
        store
            .insert_device(&phone("Redmi Note 13", "Xiaomi", 2023, 2_899_000.0))
            .unwrap();
        store
    }

    #[test]
    fn open_in_memory_has_tables() {
        let store = DuckStore::open().unwrap();
        assert!(store.has_tables());
        assert_eq!(store.device_count().unwrap(), 0);
    }

    #[test]
    fn init_schema_is_idempotent() {
        let store = DuckStore::open().unwrap();
        store.init_schema().unwrap();
        store.init_schema().unwrap();
        assert!(store.has_tables());
    }

    #[test]
    fn insert_and_get_roundtrip() {
        let store = DuckStore::open().unwrap();
        let new = phone("Pixel 8", "Google", 2023, 10_999_000.0);
        let id = store.insert_device(&new).unwrap();

        let got = store.get_device(id).unwrap().expect("device exists");
        assert_eq!(got, new.with_id(id));
    }

    #[test]
    fn ids_are_sequential() {
        let store = DuckStore::open().unwrap();
        let a = store.insert_device(&phone("A", "X", 2020, 1.0)).unwrap();
        let b = store.insert_device(&phone("B", "X", 2020, 1.0)).unwrap();
        assert!(b > a);
    }

    #[test]
    fn get_missing_device_is_none() {
        let store = seeded();
        assert!(store.get_device(9_999).unwrap().is_none());
    }

    #[test]
    fn insert_rejects_invalid_device() {
        let store = DuckStore::open().unwrap();
        let bad = NewDevice {
            name: String::new(),
            ..phone("x", "y", 2024, 1.0)
        };
        assert!(matches!(
            store.insert_device(&bad),
            Err(StoreError::Invalid(_))
        ));
        assert_eq!(store.device_count().unwrap(), 0);
    }

    #[test]
    fn update_and_delete() {
        let store = seeded();
        let id = store.list_devices(&DeviceFilter::default()).unwrap()[0].id;

        let updated = NewDevice {
            price: Some(11_999_000.0),
            ..phone("Galaxy S24", "Samsung", 2024, 0.0)
        };
        assert!(store.update_device(id, &updated).unwrap());
        assert_eq!(
            store.get_device(id).unwrap().unwrap().price,
            Some(11_999_000.0)
        );
        assert!(!store.update_device(9_999, &updated).unwrap());

        assert!(store.delete_device(id).unwrap());
        assert!(store.get_device(id).unwrap().is_none());
        assert!(!store.delete_device(id).unwrap());
    }

    #[test]
    fn list_all_ordered_by_id() {
        let store = seeded();
        let devices = store.list_devices(&DeviceFilter::default()).unwrap();
        assert_eq!(devices.len(), 4);
        assert!(devices.windows(2).all(|w| w[0].id < w[1].id));
    }

    #[test]
    fn list_search_matches_name_or_brand() {
        let store = seeded();
        let by_name = store
            .list_devices(&DeviceFilter {
                search: Some("galaxy".into()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(by_name.len(), 2);

        let by_brand = store
            .list_devices(&DeviceFilter {
                search: Some("XIAOMI".into()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(by_brand.len(), 1);
        assert_eq!(by_brand[0].name, "Redmi Note 13");
    }

    #[test]
    fn list_search_escapes_wildcards() {
        let store = seeded();
        let none = store
            .list_devices(&DeviceFilter {
                search: Some("%".into()),
                ..Default::default()
            })
            .unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn list_price_and_year_filters() {
        let store = seeded();
        let devices = store
            .list_devices(&DeviceFilter {
                min_price: Some(5_000_000.0),
                max_price: Some(14_000_000.0),
                min_year: Some(2024),
                ..Default::default()
            })
            .unwrap();
        let names: Vec<&str> = devices.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["Galaxy S24", "Galaxy A55"]);
    }

    #[test]
    fn list_brand_filter_and_paging() {
        let store = seeded();
        let filter = DeviceFilter {
            brand: Some("samsung".into()),
            limit: Some(1),
            offset: Some(1),
            ..Default::default()
        };
        let devices = store.list_devices(&filter).unwrap();
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].name, "Galaxy A55");
    }

    #[test]
    fn devices_arrow_table() {
        let store = seeded();
        let batches = store.devices_arrow(&DeviceFilter::default()).unwrap();
        let rows: usize = batches.iter().map(|b| b.num_rows()).sum();
        assert_eq!(rows, 4);
        assert_eq!(batches[0].num_columns(), 10);
        assert_eq!(batches[0].schema().field(0).name(), "id");
    }

    #[test]
    fn autocomplete_limits_and_matches() {
        let store = seeded();
        let hits = store.autocomplete("gal", Some(1)).unwrap();
        assert_eq!(hits.len(), 1);
        assert!(hits[0].name.starts_with("Galaxy"));
        assert!(store.autocomplete("  ", None).unwrap().is_empty());
    }

    #[test]
    fn unique_brands_sorted() {
        let store = seeded();
        assert_eq!(
            store.unique_brands().unwrap(),
            vec!["Apple", "Samsung", "Xiaomi"]
        );
    }

    #[test]
    fn recommend_orders_newest_then_cheapest() {
        let store = seeded();
        let devices = store.recommend(&RecommendationCriteria::default()).unwrap();
        let names: Vec<&str> = devices.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["Galaxy A55", "Galaxy S24", "Redmi Note 13", "iPhone 15"]
        );
    }

    #[test]
    fn recommend_applies_criteria() {
        let store = seeded();
        let devices = store
            .recommend(&RecommendationCriteria {
                max_price: Some(10_000_000.0),
                min_release_year: Some(2023),
                limit: Some(1),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].name, "Galaxy A55");
    }

    #[test]
    fn categories_unique_by_name() {
        let store = DuckStore::open().unwrap();
        let cat = store
            .create_category("Smartphone", Some("Phones"))
            .unwrap();
        assert_eq!(store.get_category(cat.id).unwrap(), Some(cat.clone()));
        assert!(matches!(
            store.create_category("smartphone", None),
            Err(StoreError::Conflict(_))
        ));
        store.create_category("Laptop", None).unwrap();
        let names: Vec<String> = store
            .list_categories()
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["Laptop", "Smartphone"]);
    }

    #[test]
    fn query_arrow_escape_hatch() {
        let store = DuckStore::open().unwrap();
        let batches = store.query_arrow("SELECT 1 AS x").unwrap();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].num_rows(), 1);
    }

    // ── Persistent storage tests ──

    #[test]
    fn open_persistent_creates_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let db_path = tmp.path().join("test.duckdb");
        assert!(!db_path.exists());

        let store = DuckStore::open_persistent(&db_path).unwrap();
        assert!(db_path.exists());
        assert!(store.has_tables());
    }

    #[test]
    fn persistent_reopen_keeps_devices() {
        let tmp = tempfile::TempDir::new().unwrap();
        let db_path = tmp.path().join("test.duckdb");

        let store = DuckStore::open_persistent(&db_path).unwrap();
        let id = store
            .insert_device(&phone("Pixel 8", "Google", 2023, 10_999_000.0))
            .unwrap();
        drop(store);

        let store = DuckStore::open_persistent(&db_path).unwrap();
        assert_eq!(store.device_count().unwrap(), 1);
        assert_eq!(store.get_device(id).unwrap().unwrap().name, "Pixel 8");
        let next = store
            .insert_device(&phone("Pixel 9", "Google", 2024, 12_999_000.0))
            .unwrap();
        assert!(next > id);
    }
}
