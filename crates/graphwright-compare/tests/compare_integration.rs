//! Integration tests for SDL comparison.

use graphwright_compare::{ChangeKind, CompareError, Comparison, Criticality, Side, compare};

fn kinds(comparison: &Comparison) -> Vec<(ChangeKind, Criticality)> {
    comparison
        .changes()
        .iter()
        .map(|c| (c.kind, c.criticality))
        .collect()
}

const LEAGUE: &str = r#"
type Query {
  teams: [Team!]!
  search(term: String!): [SearchResult!]!
}

interface Named {
  name: String!
}

type Team implements Named {
  name: String!
  players: [Player!]!
}

type Player implements Named {
  name: String!
  currentTeam: Team
}

union SearchResult = Team | Player

enum Position {
  GOALKEEPER
  DEFENDER
  FORWARD
}

directive @tag(name: String!) repeatable on FIELD_DEFINITION | OBJECT
"#;

// ============================================================================
// Identity
// ============================================================================

#[test]
fn test_identical_documents_have_no_changes() {
    let comparison = compare(LEAGUE, LEAGUE).unwrap();
    assert!(comparison.is_empty());
    assert!(!comparison.is_breaking());
    assert_eq!(comparison.len(), 0);
}

#[test]
fn test_extensions_compare_like_inline_fields() {
    let old = "type Query {\n  a: Int\n  b: Int\n}";
    let new = "type Query {\n  a: Int\n}\nextend type Query {\n  b: Int\n}";
    assert!(compare(old, new).unwrap().is_empty());
}

// ============================================================================
// Types and fields
// ============================================================================

#[test]
fn test_removals_are_breaking() {
    let old = r#"
        type Query { teams: [Team!]! }
        type Team { name: String! founded: Int }
        type Coach { name: String }
    "#;
    let new = r#"
        type Query { teams: [Team!]! }
        type Team { name: String! }
    "#;

    let comparison = compare(old, new).unwrap();
    assert!(comparison.is_breaking());
    assert_eq!(
        kinds(&comparison),
        vec![
            (ChangeKind::FieldRemoved, Criticality::Breaking),
            (ChangeKind::TypeRemoved, Criticality::Breaking),
        ]
    );

    let field = &comparison.changes()[0];
    assert_eq!(field.path, "Team.founded");
    assert_eq!(
        field.message,
        "Field `founded` was removed from object type `Team`"
    );
    assert!(field.reason.is_some());
    assert_eq!(comparison.changes()[1].message, "Type `Coach` was removed");
}

#[test]
fn test_additions_are_safe() {
    let old = "type Query { teams: [String] }";
    let new = "type Query { teams: [String] coach: Coach }\ntype Coach { name: String }";

    let comparison = compare(old, new).unwrap();
    assert!(!comparison.is_breaking());
    assert_eq!(comparison.non_breaking().count(), 2);
    assert!(comparison.changes().iter().all(|c| c.reason.is_none()));
}

#[test]
fn test_field_type_changes() {
    let old = "type Query { a: String b: Int! c: [Int] d: [Int] }";
    let new = "type Query { a: String! b: Int c: Int d: [Int!]! }";

    let comparison = compare(old, new).unwrap();
    let paths: Vec<(&str, Criticality)> = comparison
        .changes()
        .iter()
        .map(|c| (c.path.as_str(), c.criticality))
        .collect();
    assert_eq!(
        paths,
        vec![
            ("Query.b", Criticality::Breaking),
            ("Query.c", Criticality::Breaking),
            ("Query.a", Criticality::NonBreaking),
            ("Query.d", Criticality::NonBreaking),
        ]
    );
    assert_eq!(
        comparison.changes()[0].message,
        "Field `Query.b` changed type from `Int!` to `Int`"
    );
}

#[test]
fn test_kind_change_is_breaking() {
    let old = "type Query { today: Date }\nscalar Date";
    let new = "type Query { today: Date }\ntype Date { iso: String }";

    let comparison = compare(old, new).unwrap();
    assert_eq!(
        kinds(&comparison),
        vec![(ChangeKind::TypeKindChanged, Criticality::Breaking)]
    );
    assert_eq!(
        comparison.changes()[0].message,
        "`Date` changed from scalar to object"
    );
}

#[test]
fn test_descriptions_and_deprecations_are_safe() {
    let old = r#"
        type Query { team: Team }
        "The team"
        type Team { name: String }
    "#;
    let new = r#"
        type Query { team: Team }
        "A team"
        type Team { name: String @deprecated(reason: "Use title") }
    "#;

    let comparison = compare(old, new).unwrap();
    assert_eq!(
        kinds(&comparison),
        vec![
            (ChangeKind::TypeDescriptionChanged, Criticality::NonBreaking),
            (ChangeKind::FieldDeprecationAdded, Criticality::NonBreaking),
        ]
    );
    assert_eq!(
        comparison.changes()[0].message,
        "Description of type `Team` changed from `The team` to `A team`"
    );
    assert_eq!(
        comparison.changes()[1].message,
        "Field `Team.name` was deprecated: Use title"
    );

    let back = compare(new, old).unwrap();
    assert!(
        back.changes()
            .iter()
            .any(|c| c.kind == ChangeKind::FieldDeprecationRemoved)
    );
}

// ============================================================================
// Arguments and input objects
// ============================================================================

#[test]
fn test_argument_changes() {
    let old = "type Query { players(first: Int, team: String!): [String] }";
    let new = "type Query { players(first: Int = 10, team: String, after: String!, league: String): [String] }";

    let comparison = compare(old, new).unwrap();
    assert_eq!(
        kinds(&comparison),
        vec![
            (ChangeKind::ArgumentAdded, Criticality::Breaking),
            (ChangeKind::ArgumentDefaultChanged, Criticality::Dangerous),
            (ChangeKind::ArgumentTypeChanged, Criticality::NonBreaking),
            (ChangeKind::ArgumentAdded, Criticality::NonBreaking),
        ]
    );

    let required = &comparison.changes()[0];
    assert_eq!(required.path, "Query.players.after");
    assert_eq!(
        required.message,
        "Argument `after` was added to field `Query.players`"
    );
    assert_eq!(
        comparison.changes()[1].message,
        "Default value `10` was added to argument `first` on field `Query.players`"
    );
}

#[test]
fn test_removed_argument_is_breaking() {
    let old = "type Query { teams(league: String): [String] }";
    let new = "type Query { teams: [String] }";

    let comparison = compare(old, new).unwrap();
    assert_eq!(
        kinds(&comparison),
        vec![(ChangeKind::ArgumentRemoved, Criticality::Breaking)]
    );
}

#[test]
fn test_input_object_changes() {
    let old = r#"
        type Query { teams(filter: Filter): [String] }
        input Filter { name: String limit: Int = 10 }
    "#;
    let new = r#"
        type Query { teams(filter: Filter): [String] }
        input Filter { name: String! limit: Int = 20 tag: String }
    "#;

    let comparison = compare(old, new).unwrap();
    assert_eq!(
        kinds(&comparison),
        vec![
            (ChangeKind::InputFieldTypeChanged, Criticality::Breaking),
            (ChangeKind::InputFieldDefaultChanged, Criticality::Dangerous),
            (ChangeKind::InputFieldAdded, Criticality::NonBreaking),
        ]
    );
    assert_eq!(
        comparison.changes()[1].message,
        "Default value of input field `limit` on input object type `Filter` changed from `10` to `20`"
    );
}

// ============================================================================
// Abstract types and enums
// ============================================================================

#[test]
fn test_possible_type_changes() {
    let new = LEAGUE
        .replace("type Team implements Named {", "type Team {")
        .replace(
            "union SearchResult = Team | Player",
            "union SearchResult = Team | Player | Coach\ntype Coach { name: String }",
        );

    let comparison = compare(LEAGUE, &new).unwrap();
    assert_eq!(
        kinds(&comparison),
        vec![
            (ChangeKind::InterfaceRemoved, Criticality::Breaking),
            (ChangeKind::UnionMemberAdded, Criticality::Dangerous),
            (ChangeKind::TypeAdded, Criticality::NonBreaking),
        ]
    );
    assert_eq!(
        comparison.changes()[0].message,
        "`Team` no longer implements interface `Named`"
    );
}

#[test]
fn test_enum_value_changes() {
    let new = LEAGUE.replace("  DEFENDER\n", "  MIDFIELDER\n");

    let comparison = compare(LEAGUE, &new).unwrap();
    assert_eq!(
        kinds(&comparison),
        vec![
            (ChangeKind::EnumValueRemoved, Criticality::Breaking),
            (ChangeKind::EnumValueAdded, Criticality::Dangerous),
        ]
    );
    assert_eq!(comparison.changes()[0].path, "Position.DEFENDER");
    assert_eq!(comparison.dangerous().count(), 1);
}

#[test]
fn test_enum_value_deprecation_changes() {
    let deprecated = LEAGUE.replace(
        "  DEFENDER\n",
        "  DEFENDER @deprecated(reason: \"Use BACK\")\n",
    );

    let added = compare(LEAGUE, &deprecated).unwrap();
    assert_eq!(
        kinds(&added),
        vec![(ChangeKind::EnumValueDeprecationAdded, Criticality::NonBreaking)]
    );
    assert_eq!(
        added.changes()[0].message,
        "Enum value `Position.DEFENDER` was deprecated: Use BACK"
    );

    let removed = compare(&deprecated, LEAGUE).unwrap();
    assert_eq!(
        kinds(&removed),
        vec![(ChangeKind::EnumValueDeprecationRemoved, Criticality::NonBreaking)]
    );
    assert_eq!(removed.changes()[0].path, "Position.DEFENDER");
    assert_eq!(
        removed.changes()[0].message,
        "Enum value `Position.DEFENDER` is no longer deprecated"
    );
}

// ============================================================================
// Directives and roots
// ============================================================================

#[test]
fn test_directive_changes() {
    let new = LEAGUE.replace(
        "directive @tag(name: String!) repeatable on FIELD_DEFINITION | OBJECT",
        "directive @tag(name: String!, weight: Int) on FIELD_DEFINITION\ndirective @internal on FIELD_DEFINITION",
    );

    let comparison = compare(LEAGUE, &new).unwrap();
    assert_eq!(
        kinds(&comparison),
        vec![
            (ChangeKind::DirectiveLocationRemoved, Criticality::Breaking),
            (ChangeKind::DirectiveRepeatableChanged, Criticality::Breaking),
            (ChangeKind::DirectiveArgumentAdded, Criticality::NonBreaking),
            (ChangeKind::DirectiveAdded, Criticality::NonBreaking),
        ]
    );
    assert_eq!(
        comparison.changes()[0].message,
        "Location `OBJECT` was removed from directive `@tag`"
    );
    assert_eq!(comparison.changes()[2].path, "@tag.weight");
}

#[test]
fn test_root_change_is_breaking() {
    let old = "schema { query: Root }\ntype Root { a: Int }";
    let new = "type Query { a: Int }";

    let comparison = compare(old, new).unwrap();
    assert_eq!(
        kinds(&comparison),
        vec![
            (ChangeKind::SchemaRootChanged, Criticality::Breaking),
            (ChangeKind::TypeRemoved, Criticality::Breaking),
            (ChangeKind::TypeAdded, Criticality::NonBreaking),
        ]
    );
    assert_eq!(
        comparison.changes()[0].message,
        "Schema query root changed from `Root` to `Query`"
    );
}

// ============================================================================
// Errors and output
// ============================================================================

#[test]
fn test_parse_errors_name_the_side() {
    let err = compare("type Query { a: Int }", "type {").unwrap_err();
    assert!(matches!(err, CompareError::Parse { side: Side::New, .. }));
    assert!(err.to_string().starts_with("Failed to parse new schema:"));
}

#[test]
fn test_duplicate_definitions_are_rejected() {
    let err = compare("type Query { a: Int }\ntype Query { b: Int }", LEAGUE).unwrap_err();
    assert_eq!(
        err.to_string(),
        "The old schema defines `Query` more than once"
    );
}

#[test]
fn test_changes_serialize_to_json() {
    let comparison = compare("type Query { a: Int b: Int }", "type Query { a: Int }").unwrap();
    let json = serde_json::to_value(comparison.changes()).unwrap();
    assert_eq!(json[0]["kind"], "field_removed");
    assert_eq!(json[0]["criticality"], "breaking");
    assert_eq!(json[0]["path"], "Query.b");
    assert!(json[0]["reason"].is_string());
}
