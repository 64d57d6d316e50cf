//! Entity Key Registry
//!
//! Declarative description of every synchronized table: its natural key,
//! its scoping rule, and its data columns. The store, the remote client,
//! and the reconciliation engine consult this table instead of branching
//! on table names, so registering a new entity is a data change.
//!
//! The order of [`ENTITY_REGISTRY`] is the order in which a sync pass
//! visits tables. Entities referenced by others come first (accounts and
//! classes before students, students before grades).

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::errors::DomainError;

/// Column holding the local surrogate key in every data table
pub const SURROGATE_KEY_COLUMN: &str = "id";

/// Local bookkeeping column that is never sent to the remote service
pub const LOCAL_SYNC_COLUMN: &str = "last_sync";

/// Column scoping institution-bound entities
pub const INSTITUTION_COLUMN: &str = "etablissement";

/// The synchronized entities
///
/// Variant order must match [`ENTITY_REGISTRY`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Account,
    Class,
    Subject,
    Teacher,
    Student,
    Grade,
}

/// How an entity's natural key is scoped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyScope {
    /// The key is unique across all institutions; sync ignores the scope
    Global,
    /// Rows belong to an institution named by this column; sync filters on it
    Institution(&'static str),
}

/// Registry entry for one entity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntitySpec {
    pub kind: EntityKind,
    /// Table name, identical locally and remotely
    pub table: &'static str,
    /// Ordered natural-key columns
    pub natural_key: &'static [&'static str],
    pub scope: KeyScope,
    /// Data columns (natural key included), excluding `id` and `last_sync`
    pub columns: &'static [&'static str],
}

/// All synchronized entities, in sync order
pub static ENTITY_REGISTRY: [EntitySpec; 6] = [
    EntitySpec {
        kind: EntityKind::Account,
        table: "User",
        natural_key: &["identifiant"],
        scope: KeyScope::Global,
        columns: &[
            "identifiant",
            "passwords",
            "nom",
            "prenom",
            "email",
            "telephone",
            "etablissement",
            "titre",
            "theme",
            "language",
        ],
    },
    EntitySpec {
        kind: EntityKind::Class,
        table: "Class",
        natural_key: &["nom", "etablissement"],
        scope: KeyScope::Institution(INSTITUTION_COLUMN),
        columns: &["nom", "etablissement"],
    },
    EntitySpec {
        kind: EntityKind::Subject,
        table: "Matieres",
        natural_key: &["nom", "etablissement"],
        scope: KeyScope::Institution(INSTITUTION_COLUMN),
        columns: &["nom", "genre", "etablissement"],
    },
    EntitySpec {
        kind: EntityKind::Teacher,
        table: "Teacher",
        natural_key: &["ident"],
        scope: KeyScope::Global,
        columns: &["ident", "pass", "matiere"],
    },
    EntitySpec {
        kind: EntityKind::Student,
        table: "Students",
        natural_key: &["matricule", "etablissement"],
        scope: KeyScope::Institution(INSTITUTION_COLUMN),
        columns: &[
            "nom",
            "prenom",
            "matricule",
            "date_naissance",
            "sexe",
            "classe",
            "etablissement",
        ],
    },
    EntitySpec {
        kind: EntityKind::Grade,
        table: "Notes",
        natural_key: &["matricule", "matiere", "classe", "etablissement"],
        scope: KeyScope::Institution(INSTITUTION_COLUMN),
        columns: &[
            "classe",
            "matricule",
            "matiere",
            "coefficient",
            "note_interrogation",
            "note_devoir",
            "note_composition",
            "moyenne",
            "date_saisie",
            "etablissement",
        ],
    },
];

impl EntityKind {
    /// Every entity in sync order
    pub fn all() -> impl Iterator<Item = EntityKind> {
        ENTITY_REGISTRY.iter().map(|spec| spec.kind)
    }

    /// Registry entry for this entity
    pub fn spec(self) -> &'static EntitySpec {
        // Variants are declared in registry order.
        &ENTITY_REGISTRY[self as usize]
    }

    pub fn table(self) -> &'static str {
        self.spec().table
    }

    /// Entity name, as opposed to the table name
    pub fn name(self) -> &'static str {
        match self {
            EntityKind::Account => "Account",
            EntityKind::Class => "Class",
            EntityKind::Subject => "Subject",
            EntityKind::Teacher => "Teacher",
            EntityKind::Student => "Student",
            EntityKind::Grade => "Grade",
        }
    }
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.table())
    }
}

impl FromStr for EntityKind {
    type Err = DomainError;

    /// Accepts either the table name (`Students`, `Notes`) or the entity
    /// name (`Student`, `Grade`), case-insensitively
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        EntityKind::all()
            .find(|kind| {
                kind.table().eq_ignore_ascii_case(needle) || kind.name().eq_ignore_ascii_case(needle)
            })
            .ok_or_else(|| DomainError::UnknownEntity(needle.to_string()))
    }
}

impl EntitySpec {
    /// Scope column when the entity is institution-bound
    pub fn scope_column(&self) -> Option<&'static str> {
        match self.scope {
            KeyScope::Global => None,
            KeyScope::Institution(column) => Some(column),
        }
    }

    pub fn is_key_column(&self, column: &str) -> bool {
        self.natural_key.contains(&column)
    }

    /// Whether the column may appear in SQL for this table
    pub fn has_column(&self, column: &str) -> bool {
        column == SURROGATE_KEY_COLUMN || column == LOCAL_SYNC_COLUMN || self.columns.contains(&column)
    }

    /// Data columns that are not part of the natural key
    pub fn non_key_columns(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.columns
            .iter()
            .copied()
            .filter(move |column| !self.is_key_column(column))
    }
}
