//! Device catalogue records shared by the store, the comparison pipeline and the API.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type DeviceId = i64;
pub type CategoryId = i64;

/// Plausible release-year range for catalogue entries.
pub const MIN_RELEASE_YEAR: i32 = 1990;
pub const MAX_RELEASE_YEAR: i32 = 2100;

/// Upper bound on a catalogue price (Rupiah).
pub const MAX_PRICE: f64 = 1_000_000_000_000.0;

/// A device as stored in the catalogue.
///
/// Specification fields (`cpu` .. `screen`) are free-form text exactly as
/// entered or imported, e.g. `"8GB"`, `"5000 mAh"`, `"48MP + 12MP"`. They may
/// be `None` or `"N/A"`; consumers go through [`crate::extract`] to get numbers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub id: DeviceId,
    pub name: String,
    pub brand: String,
    pub category_id: Option<CategoryId>,
    pub cpu: Option<String>,
    pub gpu: Option<String>,
    pub ram: Option<String>,
    pub storage: Option<String>,
    pub camera: Option<String>,
    pub battery: Option<String>,
    pub screen: Option<String>,
    pub release_year: Option<i32>,
    /// Price in Rupiah.
    pub price: Option<f64>,
    pub image_url: Option<String>,
    pub description: Option<String>,
    pub source_url: Option<String>,
}

/// A device that has not been assigned an id yet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewDevice {
    pub name: String,
    pub brand: String,
    pub category_id: Option<CategoryId>,
    pub cpu: Option<String>,
    pub gpu: Option<String>,
    pub ram: Option<String>,
    pub storage: Option<String>,
    pub camera: Option<String>,
    pub battery: Option<String>,
    pub screen: Option<String>,
    pub release_year: Option<i32>,
    pub price: Option<f64>,
    pub image_url: Option<String>,
    pub description: Option<String>,
    pub source_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("field '{0}' must not be empty")]
    Empty(&'static str),
    #[error("release year {0} outside {MIN_RELEASE_YEAR}..={MAX_RELEASE_YEAR}")]
    ReleaseYear(i32),
    #[error("price {0} outside 0..={MAX_PRICE}")]
    Price(f64),
}

impl NewDevice {
    /// Check the invariants every stored device must satisfy.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::Empty("name"));
        }
        if self.brand.trim().is_empty() {
            return Err(ValidationError::Empty("brand"));
        }
        if let Some(year) = self.release_year
            && !(MIN_RELEASE_YEAR..=MAX_RELEASE_YEAR).contains(&year)
        {
            return Err(ValidationError::ReleaseYear(year));
        }
        if let Some(price) = self.price
            && !(price.is_finite() && (0.0..=MAX_PRICE).contains(&price))
        {
            return Err(ValidationError::Price(price));
        }
        Ok(())
    }

    /// Attach a store-assigned id.
    pub fn with_id(self, id: DeviceId) -> Device {
        Device {
            id,
            name: self.name,
            brand: self.brand,
            category_id: self.category_id,
            cpu: self.cpu,
            gpu: self.gpu,
            ram: self.ram,
            storage: self.storage,
            camera: self.camera,
            battery: self.battery,
            screen: self.screen,
            release_year: self.release_year,
            price: self.price,
            image_url: self.image_url,
            description: self.description,
            source_url: self.source_url,
        }
    }
}

/// A device category such as "Smartphone".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub description: Option<String>,
}

/// Lookup of a single device by id.
///
/// The comparison pipeline needs nothing else from storage. `Ok(None)` means
/// the id does not resolve; `Err` is an I/O failure of the backing store.
pub trait DeviceRepository {
    type Error: std::error::Error + Send + Sync + 'static;

    fn get_device(&self, id: DeviceId) -> Result<Option<Device>, Self::Error>;
}
