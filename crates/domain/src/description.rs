//! Entity description: the immutable identity and display metadata of a
//! sensed entity (a person, a physical space, or any other tracked object).

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{SpaceHubError, ValidationError};
use crate::id::EntityId;

/// What kind of real-world thing a sensed entity stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Person,
    PhysicalSpace,
    Object,
}

impl EntityKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Person => "person",
            Self::PhysicalSpace => "physical_space",
            Self::Object => "object",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity and display metadata of a sensed entity. Never mutated once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityDescription {
    id: EntityId,
    display_name: String,
    description: String,
    kind: EntityKind,
}

impl EntityDescription {
    /// Create a builder for an entity of the given kind.
    #[must_use]
    pub fn builder(kind: EntityKind) -> EntityDescriptionBuilder {
        EntityDescriptionBuilder {
            kind,
            id: None,
            display_name: None,
            description: None,
        }
    }

    /// Shorthand for [`EntityDescription::builder`] with [`EntityKind::Person`].
    #[must_use]
    pub fn person() -> EntityDescriptionBuilder {
        Self::builder(EntityKind::Person)
    }

    /// Shorthand for [`EntityDescription::builder`] with [`EntityKind::PhysicalSpace`].
    #[must_use]
    pub fn physical_space() -> EntityDescriptionBuilder {
        Self::builder(EntityKind::PhysicalSpace)
    }

    #[must_use]
    pub fn id(&self) -> &EntityId {
        &self.id
    }

    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub fn kind(&self) -> EntityKind {
        self.kind
    }
}

/// Step-by-step builder for [`EntityDescription`].
#[derive(Debug)]
pub struct EntityDescriptionBuilder {
    kind: EntityKind,
    id: Option<String>,
    display_name: Option<String>,
    description: Option<String>,
}

impl EntityDescriptionBuilder {
    #[must_use]
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    #[must_use]
    pub fn display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Consume the builder, validate, and return an [`EntityDescription`].
    ///
    /// # Errors
    ///
    /// Returns [`SpaceHubError::Validation`] if the id or the display name
    /// is missing or empty.
    pub fn build(self) -> Result<EntityDescription, SpaceHubError> {
        let id = EntityId::new(self.id.unwrap_or_default())?;
        let display_name = self.display_name.unwrap_or_default();
        if display_name.trim().is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        Ok(EntityDescription {
            id,
            display_name,
            description: self.description.unwrap_or_default(),
            kind: self.kind,
        })
    }
}
