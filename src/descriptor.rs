//! Relation Descriptors - declarative configuration binding a relation name to its row shape

use serde::{Deserialize, Serialize};

use crate::error::{KinshipError, KinshipResult};
use crate::item::ItemKey;

/// Configuration for a single named relation.
///
/// Binds the relation name to the table that stores its membership rows, the
/// subject/object column pair, an optional type-tag column for polymorphic
/// relations, and the self-referential flag that enables the incoming
/// projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationDescriptor {
    /// Name of the relation (e.g. "likes", "follows")
    pub name: String,

    /// Table holding the membership rows
    pub table: String,

    /// The owner model's type name
    pub owner_model: String,

    /// Column referencing the row's subject (the writing owner)
    pub subject_column: String,

    /// Column referencing the row's object (the item)
    pub object_column: String,

    /// Type-tag column; present only for polymorphic relations
    pub type_column: Option<String>,

    /// Item kinds accepted by a polymorphic relation (empty = unrestricted)
    pub allowed_kinds: Vec<String>,

    /// Whether owner and item types coincide, yielding two projections
    pub self_referential: bool,
}

impl RelationDescriptor {
    /// Create a descriptor with conventional column names
    pub fn new(name: impl Into<String>, table: impl Into<String>, owner_model: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table: table.into(),
            owner_model: owner_model.into(),
            subject_column: "owner_id".to_string(),
            object_column: "item_id".to_string(),
            type_column: None,
            allowed_kinds: Vec::new(),
            self_referential: false,
        }
    }

    /// Override the subject/object column pair
    pub fn with_columns(mut self, subject: impl Into<String>, object: impl Into<String>) -> Self {
        self.subject_column = subject.into();
        self.object_column = object.into();
        self
    }

    /// Mark the relation polymorphic, storing item kinds in the given column
    pub fn with_type_column(mut self, column: impl Into<String>) -> Self {
        self.type_column = Some(column.into());
        self
    }

    /// Restrict the item kinds a polymorphic relation accepts
    pub fn with_allowed_kinds(mut self, kinds: Vec<String>) -> Self {
        self.allowed_kinds = kinds;
        self
    }

    /// Mark the relation self-referential (owner type == item type)
    pub fn self_referential(mut self) -> Self {
        self.self_referential = true;
        self
    }

    /// Returns true if items carry a type tag
    pub fn is_polymorphic(&self) -> bool {
        self.type_column.is_some()
    }

    /// Validate the descriptor for consistency
    pub fn validate(&self) -> KinshipResult<()> {
        if self.name.is_empty() {
            return Err(KinshipError::Configuration(
                "relation name cannot be empty".to_string(),
            ));
        }

        if self.table.is_empty() {
            return Err(KinshipError::Configuration(format!(
                "relation '{}' must specify a table",
                self.name
            )));
        }

        if self.owner_model.is_empty() {
            return Err(KinshipError::Configuration(format!(
                "relation '{}' must specify an owner model",
                self.name
            )));
        }

        if self.subject_column.is_empty() || self.object_column.is_empty() {
            return Err(KinshipError::Configuration(format!(
                "relation '{}' must specify subject and object columns",
                self.name
            )));
        }

        if self.subject_column == self.object_column {
            return Err(KinshipError::Configuration(format!(
                "relation '{}' subject and object columns must be different",
                self.name
            )));
        }

        if let Some(ref type_column) = self.type_column {
            if type_column.is_empty() {
                return Err(KinshipError::Configuration(format!(
                    "relation '{}' type column cannot be empty",
                    self.name
                )));
            }
            if type_column == &self.subject_column || type_column == &self.object_column {
                return Err(KinshipError::Configuration(format!(
                    "relation '{}' type column collides with a key column",
                    self.name
                )));
            }
            if self.self_referential {
                return Err(KinshipError::Configuration(format!(
                    "relation '{}' cannot be both polymorphic and self-referential",
                    self.name
                )));
            }
        } else if !self.allowed_kinds.is_empty() {
            return Err(KinshipError::Configuration(format!(
                "relation '{}' restricts item kinds but has no type column",
                self.name
            )));
        }

        Ok(())
    }

    /// Check an item identity against the relation's item type set
    pub fn validate_item(&self, item: &ItemKey) -> KinshipResult<()> {
        match (&self.type_column, &item.kind) {
            (Some(_), Some(kind)) => {
                if !self.allowed_kinds.is_empty() && !self.allowed_kinds.iter().any(|k| k == kind) {
                    return Err(KinshipError::InvalidItem(format!(
                        "kind '{}' is not accepted by relation '{}'",
                        kind, self.name
                    )));
                }
                Ok(())
            }
            (Some(_), None) => Err(KinshipError::InvalidItem(format!(
                "relation '{}' is polymorphic and requires a tagged item",
                self.name
            ))),
            (None, Some(kind)) => Err(KinshipError::InvalidItem(format!(
                "relation '{}' is single-type but item carries kind '{}'",
                self.name, kind
            ))),
            (None, None) => Ok(()),
        }
    }
}
