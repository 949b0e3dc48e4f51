//! Integration tests for query execution.
//!
//! Covers argument and variable coercion, directives, abstract type
//! resolution, null propagation, introspection and per-request visibility.

use std::sync::Arc;
use std::sync::atomic::{AtomicI32, Ordering};

use async_graphql_value::ConstValue;
use graphwright_schema::{
    BoxError, BuiltinScalar, CoercedValue, CustomScalarType, FieldDefinition, FnVisibility,
    InputObjectType, InputValueDefinition, ObjectType, PathSegment, Request, RequestContext,
    Resolved, ResolverObject, RootValue, Schema, SchemaConfig, SchemaDeclaration, TypeRef,
    TypeRegistry, UnionType,
};
use serde_json::json;
use time::Date;
use time::macros::format_description;

struct Role(&'static str);

// ============================================================================
// Fixtures
// ============================================================================

fn hello_schema() -> Schema {
    let mut registry = TypeRegistry::new();
    let person_name = registry.declare(
        "PersonName",
        InputObjectType::new("PersonName").with_fields(|| {
            Ok(vec![
                InputValueDefinition::new("first", TypeRef::required(BuiltinScalar::String)),
                InputValueDefinition::new("last", TypeRef::optional(BuiltinScalar::String)),
            ])
        }),
    );
    let query = registry.declare(
        "Query",
        ObjectType::new("Query").with_fields(move || {
            Ok(vec![
                FieldDefinition::new("hello", TypeRef::required(BuiltinScalar::String))
                    .with_argument(InputValueDefinition::new(
                        "name",
                        TypeRef::required(person_name),
                    )),
            ])
        }),
    );
    Schema::new(registry, SchemaDeclaration::new(query))
}

fn hello_root() -> RootValue {
    RootValue::new(
        ResolverObject::new().with_method("resolve_hello", |args, _ctx| {
            let name = args.object("name").ok_or("name is required")?;
            let first = name
                .get("first")
                .and_then(CoercedValue::as_str)
                .unwrap_or_default();
            let greeting = match name.get("last").and_then(CoercedValue::as_str) {
                Some(last) => format!("Hello, {first} {last}!"),
                None => format!("Hello, {first}!"),
            };
            Ok(greeting.into())
        }),
    )
}

fn echo(value: &CoercedValue) -> Resolved {
    match value.as_list() {
        Some(items) => Resolved::list(items.iter().map(echo)),
        None => value.as_i32().map_or(Resolved::Null, Resolved::from),
    }
}

fn lists_schema() -> Schema {
    let mut registry = TypeRegistry::new();
    let int_list = || TypeRef::list_of(TypeRef::required(BuiltinScalar::Int), true);
    let query = registry.declare(
        "Query",
        ObjectType::new("Query").with_fields(move || {
            Ok(vec![
                FieldDefinition::new("intList", TypeRef::list_of(TypeRef::optional(BuiltinScalar::Int), false))
                    .with_argument(InputValueDefinition::new("intList", int_list())),
                FieldDefinition::new(
                    "intListList",
                    TypeRef::list_of(TypeRef::list_of(TypeRef::optional(BuiltinScalar::Int), false), false),
                )
                .with_argument(InputValueDefinition::new(
                    "intListList",
                    TypeRef::list_of(int_list(), true),
                )),
            ])
        }),
    );
    Schema::new(registry, SchemaDeclaration::new(query))
}

fn lists_root() -> RootValue {
    RootValue::new(
        ResolverObject::new()
            .with_method("resolve_int_list", |args, _ctx| {
                Ok(args.get("int_list").map_or(Resolved::Null, echo))
            })
            .with_method("resolve_int_list_list", |args, _ctx| {
                Ok(args.get("int_list_list").map_or(Resolved::Null, echo))
            }),
    )
}

fn league_registry() -> (TypeRegistry, graphwright_schema::TypeHandle) {
    let mut registry = TypeRegistry::new();
    let team = registry.reserve("Team");
    let player = registry.reserve("Player");
    let search_result = registry.reserve("SearchResult");
    let date = registry.reserve("Date");
    let query = registry.reserve("Query");

    let format = format_description!("[year]-[month]-[day]");
    registry
        .define(
            date,
            CustomScalarType::new(
                "Date",
                move |value: &ConstValue| match value {
                    ConstValue::String(text) => Date::parse(text, format).map_err(|e| e.to_string()),
                    _ => Err("Date must be given as a string".to_string()),
                },
                move |date: &Date| {
                    date.format(format)
                        .map(ConstValue::String)
                        .map_err(|e| e.to_string())
                },
            ),
        )
        .unwrap();
    registry
        .define(
            team,
            ObjectType::new("Team").with_fields(move || {
                Ok(vec![
                    FieldDefinition::new("name", TypeRef::required(BuiltinScalar::String)),
                    FieldDefinition::new(
                        "players",
                        TypeRef::list_of(TypeRef::required(player), true),
                    ),
                ])
            }),
        )
        .unwrap();
    registry
        .define(
            player,
            ObjectType::new("Player").with_fields(move || {
                Ok(vec![
                    FieldDefinition::new("name", TypeRef::required(BuiltinScalar::String)),
                    FieldDefinition::new("currentTeam", TypeRef::optional(team)),
                ])
            }),
        )
        .unwrap();
    registry
        .define(
            search_result,
            UnionType::new("SearchResult").with_members(move || Ok(vec![team, player])),
        )
        .unwrap();
    registry
        .define(
            query,
            ObjectType::new("Query").with_fields(move || {
                Ok(vec![
                    FieldDefinition::new("teams", TypeRef::list_of(TypeRef::required(team), true)),
                    FieldDefinition::new("team", TypeRef::optional(team)).with_argument(
                        InputValueDefinition::new("name", TypeRef::required(BuiltinScalar::String)),
                    ),
                    FieldDefinition::new("brokenTeam", TypeRef::optional(team)),
                    FieldDefinition::new(
                        "search",
                        TypeRef::list_of(TypeRef::required(search_result), true),
                    ),
                    FieldDefinition::new("nextDay", TypeRef::required(date))
                        .with_argument(InputValueDefinition::new("date", TypeRef::required(date))),
                    FieldDefinition::new("viewer", TypeRef::optional(BuiltinScalar::String)),
                    FieldDefinition::new("payroll", TypeRef::optional(BuiltinScalar::Int))
                        .with_visibility(FnVisibility::new(
                            "admin",
                            |context: &RequestContext| -> Result<bool, BoxError> {
                                Ok(context.data::<Role>().is_some_and(|role| role.0 == "admin"))
                            },
                        )),
                ])
            }),
        )
        .unwrap();

    (registry, query)
}

fn league_schema() -> Schema {
    let (registry, query) = league_registry();
    Schema::new(registry, SchemaDeclaration::new(query))
}

fn player(name: &str) -> ResolverObject {
    ResolverObject::new()
        .with_typename("Player")
        .with_value("resolve_name", name)
}

fn team(name: &str, players: &[&str]) -> ResolverObject {
    ResolverObject::new()
        .with_typename("Team")
        .with_value("resolve_name", name)
        .with_value(
            "resolve_players",
            Resolved::list(players.iter().map(|p| Resolved::object(player(p)))),
        )
}

fn league_root() -> RootValue {
    RootValue::new(
        ResolverObject::new()
            .with_value(
                "resolve_teams",
                Resolved::list(vec![Resolved::object(team("Rovers", &["Ada", "Grace"]))]),
            )
            .with_method("resolve_team", |args, _ctx| {
                let name = args.str("name").unwrap_or_default();
                if name == "Rovers" {
                    Ok(Resolved::object(team("Rovers", &["Ada"])))
                } else {
                    Err(format!("No team named {name}").into())
                }
            })
            .with_value(
                "resolve_broken_team",
                Resolved::object(
                    ResolverObject::new()
                        .with_typename("Team")
                        .with_value("resolve_name", Resolved::Null),
                ),
            )
            .with_value(
                "resolve_search",
                Resolved::list(vec![
                    Resolved::object(team("Rovers", &[])),
                    Resolved::object(player("Ada")),
                ]),
            )
            .with_method("resolve_next_day", |args, _ctx| {
                let date = args
                    .get("date")
                    .and_then(|value| value.as_custom::<Date>())
                    .ok_or("date is required")?;
                let next = date.next_day().ok_or("date is out of range")?;
                Ok(Resolved::scalar(next))
            })
            .with_method("resolve_viewer", |_args, ctx| {
                Ok(ctx.data::<Role>().map(|role| role.0).into())
            })
            .with_value("resolve_payroll", 1000),
    )
}

// ============================================================================
// Arguments and variables
// ============================================================================

#[tokio::test]
async fn test_input_object_literal_argument() {
    let schema = hello_schema();
    let result = schema
        .execute(
            r#"{ hello(name: {first: "Adam", last: "Petro"}) }"#,
            &hello_root(),
        )
        .await
        .unwrap();

    assert!(result.is_ok(), "{:?}", result.messages());
    assert_eq!(result.data, json!({"hello": "Hello, Adam Petro!"}));
}

#[tokio::test]
async fn test_input_object_variable() {
    let schema = hello_schema();
    let request = Request::new("query Greet($name: PersonName!) { hello(name: $name) }")
        .with_operation_name("Greet")
        .with_variables(json!({"name": {"first": "Adam"}}));

    let result = schema.execute(request, &hello_root()).await.unwrap();
    assert!(result.is_ok(), "{:?}", result.messages());
    assert_eq!(result.data, json!({"hello": "Hello, Adam!"}));
}

#[tokio::test]
async fn test_missing_required_variable() {
    let schema = hello_schema();
    let result = schema
        .execute(
            "query Greet($name: PersonName!) { hello(name: $name) }",
            &hello_root(),
        )
        .await
        .unwrap();

    assert_eq!(result.data, serde_json::Value::Null);
    assert_eq!(
        result.messages(),
        vec!["Received `null` for $name, which is invalid for PersonName!"]
    );
}

#[tokio::test]
async fn test_invalid_variable_value() {
    let schema = hello_schema();
    let request = Request::new("query Greet($name: PersonName!) { hello(name: $name) }")
        .with_variables(json!({"name": {"last": "Petro"}}));

    let result = schema.execute(request, &hello_root()).await.unwrap();
    assert_eq!(result.data, serde_json::Value::Null);
    assert_eq!(result.messages(), vec!["No value for required field first"]);
    assert_eq!(result.errors[0].path[0], PathSegment::Field("name".into()));
}

#[tokio::test]
async fn test_omitted_variable_uses_its_default() {
    let schema = hello_schema();
    let query = r#"query Greet($name: PersonName! = {first: "Ada"}) { hello(name: $name) }"#;

    let result = schema.execute(query, &hello_root()).await.unwrap();
    assert!(result.is_ok(), "{:?}", result.messages());
    assert_eq!(result.data, json!({"hello": "Hello, Ada!"}));

    let explicit_null = Request::new(query).with_variables(json!({"name": null}));
    let result = schema.execute(explicit_null, &hello_root()).await.unwrap();
    assert_eq!(result.data, serde_json::Value::Null);
    assert_eq!(
        result.messages(),
        vec!["Received `null` for $name, which is invalid for PersonName!"]
    );
}

#[tokio::test]
async fn test_invalid_literal_argument_fails_validation() {
    let schema = hello_schema();
    let result = schema
        .execute(r#"{ hello(name: {first: 1}) }"#, &hello_root())
        .await
        .unwrap();

    assert_eq!(result.data, serde_json::Value::Null);
    assert_eq!(
        result.messages(),
        vec!["No implicit conversion of integer to String"]
    );
    assert_eq!(result.errors[0].locations.len(), 1);
}

#[tokio::test]
async fn test_custom_scalar_round_trip() {
    let schema = league_schema();
    let result = schema
        .execute(r#"{ nextDay(date: "2024-02-28") }"#, &league_root())
        .await
        .unwrap();

    assert!(result.is_ok(), "{:?}", result.messages());
    assert_eq!(result.data, json!({"nextDay": "2024-02-29"}));
}

#[tokio::test]
async fn test_custom_scalar_variable() {
    let schema = league_schema();
    let request = Request::new("query($d: Date!) { nextDay(date: $d) }")
        .with_variables(json!({"d": "2023-12-31"}));

    let result = schema.execute(request, &league_root()).await.unwrap();
    assert!(result.is_ok(), "{:?}", result.messages());
    assert_eq!(result.data, json!({"nextDay": "2024-01-01"}));
}

// ============================================================================
// List coercion
// ============================================================================

#[tokio::test]
async fn test_list_variable_wraps_single_value() {
    let schema = lists_schema();
    let request = Request::new("query Q($l: [[Int!]!]!) { intListList(intListList: $l) }")
        .with_variables(json!({"l": 1}));

    let result = schema.execute(request, &lists_root()).await.unwrap();
    assert!(result.is_ok(), "{:?}", result.messages());
    assert_eq!(result.data, json!({"intListList": [[1]]}));
}

#[tokio::test]
async fn test_nested_list_variable_reports_each_item() {
    let schema = lists_schema();
    let request = Request::new("query Q($l: [[Int!]!]!) { intListList(intListList: $l) }")
        .with_variables(json!({"l": [1, 2, 3]}));

    let result = schema.execute(request, &lists_root()).await.unwrap();
    assert_eq!(result.data, serde_json::Value::Null);
    assert_eq!(
        result.messages(),
        vec!["No implicit conversion of integer to [Int!]!"; 3]
    );
    let paths: Vec<_> = result.errors.iter().map(|e| e.path.clone()).collect();
    assert_eq!(
        paths[2],
        vec![PathSegment::Field("l".into()), PathSegment::Index(2)]
    );
}

#[tokio::test]
async fn test_nested_list_literal_reports_each_item() {
    let schema = lists_schema();
    let result = schema
        .execute("{ intListList(intListList: [1, 2, 3]) }", &lists_root())
        .await
        .unwrap();

    assert_eq!(
        result.messages(),
        vec!["No implicit conversion of integer to [Int!]!"; 3]
    );
}

#[tokio::test]
async fn test_list_item_scalar_mismatch() {
    let schema = lists_schema();

    let literal = schema
        .execute(r#"{ intList(intList: ["not an int"]) }"#, &lists_root())
        .await
        .unwrap();
    assert_eq!(
        literal.messages(),
        vec!["No implicit conversion of string to Int"]
    );

    let request = Request::new("query Q($l: [Int!]!) { intList(intList: $l) }")
        .with_variables(json!({"l": ["not an int"]}));
    let variable = schema.execute(request, &lists_root()).await.unwrap();
    assert_eq!(
        variable.messages(),
        vec!["No implicit conversion of string to integer"]
    );
}

#[tokio::test]
async fn test_list_literal_coerces() {
    let schema = lists_schema();
    let result = schema
        .execute("{ intListList(intListList: [[1], [2, 3]]) intList(intList: 4) }", &lists_root())
        .await
        .unwrap();

    assert!(result.is_ok(), "{:?}", result.messages());
    assert_eq!(
        result.data,
        json!({"intListList": [[1], [2, 3]], "intList": [4]})
    );
}

// ============================================================================
// Directives
// ============================================================================

#[tokio::test]
async fn test_skip_and_include() {
    let schema = league_schema();
    let request = Request::new(
        "query($withPlayers: Boolean!) { teams { name @skip(if: false) players @include(if: $withPlayers) { name } } }",
    )
    .with_variables(json!({"withPlayers": false}));

    let result = schema.execute(request, &league_root()).await.unwrap();
    assert!(result.is_ok(), "{:?}", result.messages());
    assert_eq!(result.data, json!({"teams": [{"name": "Rovers"}]}));

    let request = Request::new(
        "query($withPlayers: Boolean!) { teams { name @skip(if: true) players @include(if: $withPlayers) { name } } }",
    )
    .with_variables(json!({"withPlayers": true}));

    let result = schema.execute(request, &league_root()).await.unwrap();
    assert_eq!(
        result.data,
        json!({"teams": [{"players": [{"name": "Ada"}, {"name": "Grace"}]}]})
    );
}

// ============================================================================
// Abstract types and null propagation
// ============================================================================

#[tokio::test]
async fn test_union_members_resolve_by_typename() {
    let schema = league_schema();
    let result = schema
        .execute(
            "{ search { __typename ... on Team { name } ... on Player { name } } }",
            &league_root(),
        )
        .await
        .unwrap();

    assert!(result.is_ok(), "{:?}", result.messages());
    assert_eq!(
        result.data,
        json!({"search": [
            {"__typename": "Team", "name": "Rovers"},
            {"__typename": "Player", "name": "Ada"}
        ]})
    );
}

#[tokio::test]
async fn test_impossible_runtime_type_nulls_the_root() {
    let schema = league_schema();
    let root = RootValue::new(ResolverObject::new().with_value(
        "resolve_search",
        Resolved::list(vec![Resolved::object(
            ResolverObject::new().with_typename("Coach"),
        )]),
    ));

    let result = schema
        .execute("{ search { __typename } }", &root)
        .await
        .unwrap();
    assert_eq!(result.data, serde_json::Value::Null);
    assert_eq!(
        result.messages(),
        vec!["Runtime Object type \"Coach\" is not a possible type for \"SearchResult\"."]
    );
    assert_eq!(
        result.errors[0].path,
        vec![PathSegment::Field("search".into()), PathSegment::Index(0)]
    );
}

#[tokio::test]
async fn test_null_in_non_null_field_bubbles_to_nullable_parent() {
    let schema = league_schema();
    let result = schema
        .execute("{ brokenTeam { name } teams { name } }", &league_root())
        .await
        .unwrap();

    assert_eq!(
        result.data,
        json!({"brokenTeam": null, "teams": [{"name": "Rovers"}]})
    );
    assert_eq!(
        result.messages(),
        vec!["Cannot return null for non-nullable field Team.name."]
    );
    assert_eq!(
        result.errors[0].path,
        vec![PathSegment::Field("brokenTeam".into()), PathSegment::Field("name".into())]
    );
}

#[tokio::test]
async fn test_resolver_errors_are_reported_with_path() {
    let schema = league_schema();
    let result = schema
        .execute(r#"{ team(name: "Wanderers") { name } }"#, &league_root())
        .await
        .unwrap();

    assert_eq!(result.data, json!({"team": null}));
    assert_eq!(result.messages(), vec!["No team named Wanderers"]);
    assert_eq!(result.errors[0].path, vec![PathSegment::Field("team".into())]);
}

#[tokio::test]
async fn test_missing_resolver_method() {
    let schema = league_schema();
    let result = schema
        .execute(
            r#"{ team(name: "Rovers") { players { name currentTeam { name } } } }"#,
            &league_root(),
        )
        .await
        .unwrap();

    assert_eq!(
        result.data,
        json!({"team": {"players": [{"name": "Ada", "currentTeam": null}]}})
    );
    assert_eq!(
        result.messages(),
        vec!["`Player` resolver does not implement `resolve_current_team`"]
    );
}

// ============================================================================
// Validation
// ============================================================================

#[tokio::test]
async fn test_unknown_field_fails_validation() {
    let schema = league_schema();
    let result = schema.execute("{ nope }", &league_root()).await.unwrap();

    assert_eq!(result.data, serde_json::Value::Null);
    assert_eq!(
        result.messages(),
        vec!["Cannot query field \"nope\" on type \"Query\"."]
    );
    assert_eq!(result.errors[0].locations[0].line, 1);
    assert_eq!(result.errors[0].locations[0].column, 3);
}

#[tokio::test]
async fn test_parse_errors_are_reported() {
    let schema = league_schema();
    let result = schema.execute("{ teams { ", &league_root()).await.unwrap();

    assert_eq!(result.data, serde_json::Value::Null);
    assert_eq!(result.errors.len(), 1);
    assert!(!result.errors[0].locations.is_empty());
}

#[tokio::test]
async fn test_depth_limit() {
    let (registry, query) = league_registry();
    let config = SchemaConfig {
        max_depth: 2,
        ..SchemaConfig::default()
    };
    let schema = Schema::with_config(registry, SchemaDeclaration::new(query), config);

    let result = schema
        .execute("{ teams { players { name } } }", &league_root())
        .await
        .unwrap();
    assert_eq!(
        result.messages(),
        vec!["Query has depth of 3, which exceeds max depth of 2"]
    );

    let result = schema
        .execute("{ teams { name } }", &league_root())
        .await
        .unwrap();
    assert!(result.is_ok(), "{:?}", result.messages());
}

#[tokio::test]
async fn test_operation_selection() {
    let schema = league_schema();
    let document = "query A { viewer } query B { teams { name } }";

    let result = schema.execute(document, &league_root()).await.unwrap();
    assert_eq!(
        result.messages(),
        vec!["Must provide operation name if query contains multiple operations."]
    );

    let request = Request::new(document).with_operation_name("B");
    let result = schema.execute(request, &league_root()).await.unwrap();
    assert_eq!(result.data, json!({"teams": [{"name": "Rovers"}]}));

    let request = Request::new(document).with_operation_name("C");
    let result = schema.execute(request, &league_root()).await.unwrap();
    assert_eq!(result.messages(), vec!["Unknown operation named \"C\"."]);
}

#[tokio::test]
async fn test_unsupported_operation_types() {
    let schema = league_schema();

    let result = schema
        .execute("mutation { teams { name } }", &league_root())
        .await
        .unwrap();
    assert_eq!(
        result.messages(),
        vec!["Schema is not configured for mutations."]
    );

    let result = schema
        .execute("subscription { teams { name } }", &league_root())
        .await
        .unwrap();
    assert_eq!(result.messages(), vec!["Subscriptions are not supported."]);
}

#[test]
fn test_validate_without_executing() {
    let schema = league_schema();
    let errors = schema
        .validate("query($unused: Int) { teams { name } }", None)
        .unwrap();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].message, "Variable \"$unused\" is never used.");

    assert!(schema.validate("{ teams { name } }", None).unwrap().is_empty());
}

// ============================================================================
// Mutations
// ============================================================================

fn counter_schema() -> Schema {
    let mut registry = TypeRegistry::new();
    let query = registry.declare(
        "Query",
        ObjectType::new("Query").with_fields(|| {
            Ok(vec![FieldDefinition::new(
                "count",
                TypeRef::required(BuiltinScalar::Int),
            )])
        }),
    );
    let mutation = registry.declare(
        "Mutation",
        ObjectType::new("Mutation").with_fields(|| {
            Ok(vec![
                FieldDefinition::new("increment", TypeRef::required(BuiltinScalar::Int))
                    .with_argument(
                        InputValueDefinition::new("by", TypeRef::optional(BuiltinScalar::Int))
                            .with_default(ConstValue::Number(1.into())),
                    ),
            ])
        }),
    );
    Schema::new(
        registry,
        SchemaDeclaration::new(query).with_mutation(mutation),
    )
}

#[tokio::test]
async fn test_mutation_with_default_argument() {
    let schema = counter_schema();
    let counter = Arc::new(AtomicI32::new(0));

    let query_counter = Arc::clone(&counter);
    let mutation_counter = Arc::clone(&counter);
    let root = RootValue::new(ResolverObject::new().with_method("resolve_count", move |_, _| {
        Ok(query_counter.load(Ordering::SeqCst).into())
    }))
    .with_mutation(ResolverObject::new().with_method("resolve_increment", move |args, _| {
        let by = args.get("by").and_then(CoercedValue::as_i32).unwrap_or(1);
        Ok((mutation_counter.fetch_add(by, Ordering::SeqCst) + by).into())
    }));

    let result = schema.execute("mutation { increment }", &root).await.unwrap();
    assert_eq!(result.data, json!({"increment": 1}));

    let result = schema
        .execute("mutation { increment(by: 5) }", &root)
        .await
        .unwrap();
    assert_eq!(result.data, json!({"increment": 6}));

    let result = schema.execute("{ count }", &root).await.unwrap();
    assert_eq!(result.data, json!({"count": 6}));
}

#[tokio::test]
async fn test_mutation_without_root_value() {
    let schema = counter_schema();
    let root = RootValue::new(ResolverObject::new().with_value("resolve_count", 0));

    let result = schema.execute("mutation { increment }", &root).await.unwrap();
    assert_eq!(result.data, serde_json::Value::Null);
    assert_eq!(result.messages(), vec!["No mutation root value was provided"]);
}

// ============================================================================
// Introspection
// ============================================================================

#[tokio::test]
async fn test_type_introspection() {
    let schema = league_schema();
    let result = schema
        .execute(
            r#"{ __type(name: "Team") { name kind fields { name type { name kind ofType { name kind } } } } }"#,
            &league_root(),
        )
        .await
        .unwrap();

    assert!(result.is_ok(), "{:?}", result.messages());
    assert_eq!(
        result.data,
        json!({"__type": {
            "name": "Team",
            "kind": "OBJECT",
            "fields": [
                {"name": "name", "type": {"name": null, "kind": "NON_NULL", "ofType": {"name": "String", "kind": "SCALAR"}}},
                {"name": "players", "type": {"name": null, "kind": "NON_NULL", "ofType": {"name": null, "kind": "LIST"}}}
            ]
        }})
    );
}

#[tokio::test]
async fn test_schema_introspection() {
    let schema = league_schema();
    let result = schema
        .execute(
            r#"{ __schema { queryType { name } mutationType { name } } result: __type(name: "SearchResult") { possibleTypes { name } } }"#,
            &league_root(),
        )
        .await
        .unwrap();

    assert!(result.is_ok(), "{:?}", result.messages());
    assert_eq!(
        result.data,
        json!({
            "__schema": {"queryType": {"name": "Query"}, "mutationType": null},
            "result": {"possibleTypes": [{"name": "Team"}, {"name": "Player"}]}
        })
    );
}

#[tokio::test]
async fn test_introspection_can_be_disabled() {
    let (registry, query) = league_registry();
    let config = SchemaConfig {
        introspection: false,
        ..SchemaConfig::default()
    };
    let schema = Schema::with_config(registry, SchemaDeclaration::new(query), config);

    let result = schema
        .execute("{ __schema { queryType { name } } }", &league_root())
        .await
        .unwrap();
    assert_eq!(
        result.messages(),
        vec!["Cannot query field \"__schema\" on type \"Query\"."]
    );
}

// ============================================================================
// Request context and visibility
// ============================================================================

#[tokio::test]
async fn test_resolvers_read_request_context() {
    let schema = league_schema();
    let request =
        Request::new("{ viewer }").with_context(RequestContext::new().with_data(Role("coach")));

    let result = schema.execute(request, &league_root()).await.unwrap();
    assert_eq!(result.data, json!({"viewer": "coach"}));
}

#[tokio::test]
async fn test_hidden_fields_cannot_be_queried() {
    let schema = league_schema();

    let result = schema.execute("{ payroll }", &league_root()).await.unwrap();
    assert_eq!(
        result.messages(),
        vec!["Cannot query field \"payroll\" on type \"Query\"."]
    );

    let request =
        Request::new("{ payroll }").with_context(RequestContext::new().with_data(Role("admin")));
    let result = schema.execute(request, &league_root()).await.unwrap();
    assert_eq!(result.data, json!({"payroll": 1000}));
}
