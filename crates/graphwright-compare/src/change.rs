//! Change records and their criticality.

use std::fmt;

use serde::Serialize;

/// How a change affects existing clients.
///
/// Ordered from most to least severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Criticality {
    /// Existing queries may stop validating or start failing.
    Breaking,
    /// Existing queries keep working but may observe different results.
    Dangerous,
    NonBreaking,
}

impl fmt::Display for Criticality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Breaking => "breaking",
            Self::Dangerous => "dangerous",
            Self::NonBreaking => "non-breaking",
        })
    }
}

/// What changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    SchemaRootChanged,
    TypeAdded,
    TypeRemoved,
    TypeKindChanged,
    TypeDescriptionChanged,
    FieldAdded,
    FieldRemoved,
    FieldTypeChanged,
    FieldDescriptionChanged,
    FieldDeprecationAdded,
    FieldDeprecationRemoved,
    ArgumentAdded,
    ArgumentRemoved,
    ArgumentTypeChanged,
    ArgumentDefaultChanged,
    ArgumentDescriptionChanged,
    InterfaceAdded,
    InterfaceRemoved,
    UnionMemberAdded,
    UnionMemberRemoved,
    EnumValueAdded,
    EnumValueRemoved,
    EnumValueDescriptionChanged,
    EnumValueDeprecationAdded,
    EnumValueDeprecationRemoved,
    InputFieldAdded,
    InputFieldRemoved,
    InputFieldTypeChanged,
    InputFieldDefaultChanged,
    InputFieldDescriptionChanged,
    DirectiveAdded,
    DirectiveRemoved,
    DirectiveDescriptionChanged,
    DirectiveLocationAdded,
    DirectiveLocationRemoved,
    DirectiveRepeatableChanged,
    DirectiveArgumentAdded,
    DirectiveArgumentRemoved,
    DirectiveArgumentTypeChanged,
    DirectiveArgumentDefaultChanged,
}

/// One structural difference between two schemas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Change {
    pub kind: ChangeKind,
    pub criticality: Criticality,
    /// Dotted path of the changed element, e.g. `Team.players` or `@tag.name`.
    pub path: String,
    pub message: String,
    /// Why a breaking or dangerous change matters to clients.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<&'static str>,
}

impl Change {
    pub(crate) fn new(
        kind: ChangeKind,
        criticality: Criticality,
        path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        let reason = match criticality {
            Criticality::NonBreaking => None,
            _ => reason(kind),
        };
        Self {
            kind,
            criticality,
            path: path.into(),
            message: message.into(),
            reason,
        }
    }

    pub fn is_breaking(&self) -> bool {
        self.criticality == Criticality::Breaking
    }

    pub fn is_dangerous(&self) -> bool {
        self.criticality == Criticality::Dangerous
    }
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.criticality, self.message)
    }
}

fn reason(kind: ChangeKind) -> Option<&'static str> {
    Some(match kind {
        ChangeKind::SchemaRootChanged => {
            "Operations are validated against the root type; changing it invalidates existing operations."
        }
        ChangeKind::TypeRemoved => {
            "Queries referencing a removed type fail validation. Deprecate and remove its references first."
        }
        ChangeKind::TypeKindChanged => {
            "Selections and fragments written for the old kind no longer apply."
        }
        ChangeKind::FieldRemoved => {
            "Queries selecting a removed field fail validation."
        }
        ChangeKind::FieldTypeChanged => {
            "Clients may receive values or nulls they do not expect."
        }
        ChangeKind::ArgumentAdded | ChangeKind::DirectiveArgumentAdded => {
            "Existing queries do not provide the new required argument."
        }
        ChangeKind::ArgumentRemoved | ChangeKind::DirectiveArgumentRemoved => {
            "Queries passing a removed argument fail validation."
        }
        ChangeKind::ArgumentTypeChanged
        | ChangeKind::DirectiveArgumentTypeChanged
        | ChangeKind::InputFieldTypeChanged => {
            "Values valid for the old type may be rejected by the new one."
        }
        ChangeKind::ArgumentDefaultChanged
        | ChangeKind::DirectiveArgumentDefaultChanged
        | ChangeKind::InputFieldDefaultChanged => {
            "Clients that omit the value observe different behaviour."
        }
        ChangeKind::InterfaceAdded | ChangeKind::UnionMemberAdded => {
            "Clients may not handle the new possible type."
        }
        ChangeKind::InterfaceRemoved => {
            "Fragments spread on the interface no longer match this type."
        }
        ChangeKind::UnionMemberRemoved => {
            "Fragments on the removed member no longer apply within the union."
        }
        ChangeKind::EnumValueAdded => {
            "Clients may not handle the new enum value in results."
        }
        ChangeKind::EnumValueRemoved => {
            "Queries using the removed value fail validation."
        }
        ChangeKind::InputFieldAdded => {
            "Existing queries do not provide the new required input field."
        }
        ChangeKind::InputFieldRemoved => {
            "Queries passing the removed input field fail validation."
        }
        ChangeKind::DirectiveRemoved | ChangeKind::DirectiveLocationRemoved => {
            "Documents using the directive there fail validation."
        }
        ChangeKind::DirectiveRepeatableChanged => {
            "Documents repeating the directive fail validation."
        }
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_criticality_orders_by_severity() {
        let mut levels = vec![
            Criticality::NonBreaking,
            Criticality::Breaking,
            Criticality::Dangerous,
        ];
        levels.sort();
        assert_eq!(
            levels,
            vec![
                Criticality::Breaking,
                Criticality::Dangerous,
                Criticality::NonBreaking
            ]
        );
    }

    #[test]
    fn test_reason_only_for_risky_changes() {
        let removed = Change::new(
            ChangeKind::FieldRemoved,
            Criticality::Breaking,
            "Team.name",
            "Field `name` was removed from object type `Team`",
        );
        assert!(removed.reason.is_some());
        assert_eq!(
            removed.to_string(),
            "[breaking] Field `name` was removed from object type `Team`"
        );

        let added = Change::new(
            ChangeKind::ArgumentAdded,
            Criticality::NonBreaking,
            "Team.players.first",
            "Argument `first` was added to field `Team.players`",
        );
        assert!(added.reason.is_none());
    }
}
