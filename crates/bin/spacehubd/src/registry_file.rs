//! Registry description file: TOML import into a [`SensorRegistry`].
//!
//! ```toml
//! [[people]]
//! id = "person.alice"
//! display_name = "Alice"
//!
//! [[spaces]]
//! id = "space.kitchen"
//! display_name = "Kitchen"
//!
//! [[sensors]]
//! id = "sensor.ble.kitchen"
//! display_name = "Kitchen BLE scanner"
//!
//! [[markers]]
//! id = "marker.alice"
//! display_name = "Alice's key fob"
//! marker_id = "ble:c4:7c:8d:6a:12:34"
//!
//! [[sensor_associations]]
//! sensor = "sensor.ble.kitchen"
//! sensed = "space.kitchen"
//!
//! [[marker_associations]]
//! marker = "marker.alice"
//! marked = "person.alice"
//! ```

use std::path::Path;

use serde::Deserialize;
use spacehub_app::registry::SensorRegistry;
use spacehub_domain::description::{EntityDescription, EntityKind};
use spacehub_domain::error::{SpaceHubError, ValidationError};
use spacehub_domain::sensor::{MarkerDescription, SensorDescription};

/// The file as written on disk. Every table is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RegistryFile {
    pub people: Vec<EntityEntry>,
    pub spaces: Vec<EntityEntry>,
    pub objects: Vec<EntityEntry>,
    pub sensors: Vec<SensorEntry>,
    pub markers: Vec<MarkerEntry>,
    pub sensor_associations: Vec<SensorAssociationEntry>,
    pub marker_associations: Vec<MarkerAssociationEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EntityEntry {
    pub id: String,
    pub display_name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SensorEntry {
    pub id: String,
    pub display_name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MarkerEntry {
    pub id: String,
    pub display_name: String,
    #[serde(default)]
    pub description: String,
    pub marker_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SensorAssociationEntry {
    pub sensor: String,
    pub sensed: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MarkerAssociationEntry {
    pub marker: String,
    pub marked: String,
}

impl RegistryFile {
    /// Read and parse the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ImportError::Io`] when the file cannot be read and
    /// [`ImportError::Parse`] when it is not a valid registry document.
    pub fn read(path: impl AsRef<Path>) -> Result<Self, ImportError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// # Errors
    ///
    /// Returns [`ImportError::Parse`] when `content` is not a valid registry
    /// document.
    pub fn parse(content: &str) -> Result<Self, ImportError> {
        Ok(toml::from_str(content)?)
    }

    /// Register everything the file describes, associations last.
    ///
    /// # Errors
    ///
    /// Returns [`ImportError::Registry`] on the first entry the registry
    /// refuses (empty id, duplicate, dangling association, ...).
    pub fn into_registry(self) -> Result<SensorRegistry, ImportError> {
        let mut registry = SensorRegistry::new();
        let entities = self
            .people
            .into_iter()
            .map(|entry| (EntityKind::Person, entry))
            .chain(
                self.spaces
                    .into_iter()
                    .map(|entry| (EntityKind::PhysicalSpace, entry)),
            )
            .chain(self.objects.into_iter().map(|entry| (EntityKind::Object, entry)));
        for (kind, entry) in entities {
            let description = EntityDescription::builder(kind)
                .id(entry.id)
                .display_name(entry.display_name)
                .description(entry.description)
                .build()?;
            registry.register_sensed_entity(description)?;
        }
        for entry in self.sensors {
            registry.register_sensor(SensorDescription::new(
                entry.id,
                entry.display_name,
                entry.description,
            )?)?;
        }
        for entry in self.markers {
            registry.register_marker(MarkerDescription::new(
                entry.id,
                entry.display_name,
                entry.description,
                entry.marker_id,
            )?)?;
        }
        for entry in self.sensor_associations {
            registry.associate_sensor(&entry.sensor.parse()?, &entry.sensed.parse()?)?;
        }
        for entry in self.marker_associations {
            registry.associate_marker(&entry.marker.parse()?, &entry.marked.parse()?)?;
        }
        tracing::info!(
            sensed = registry.sensed_entities().count(),
            sensors = registry.sensors().count(),
            markers = registry.markers().count(),
            "sensor registry imported"
        );
        Ok(registry)
    }
}

/// Read, parse and register the file at `path`.
///
/// # Errors
///
/// See [`RegistryFile::read`] and [`RegistryFile::into_registry`].
pub fn import(path: impl AsRef<Path>) -> Result<SensorRegistry, ImportError> {
    let path = path.as_ref();
    tracing::debug!(path = %path.display(), "importing sensor registry");
    RegistryFile::read(path)?.into_registry()
}

/// Registry import errors.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("failed to read registry file")]
    Io(#[from] std::io::Error),
    #[error("failed to parse registry file")]
    Parse(#[from] toml::de::Error),
    #[error("registry file rejected: {0}")]
    Registry(#[from] SpaceHubError),
}

impl From<ValidationError> for ImportError {
    fn from(error: ValidationError) -> Self {
        Self::Registry(error.into())
    }
}
