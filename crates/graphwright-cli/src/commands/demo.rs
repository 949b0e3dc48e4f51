use std::path::Path;

use anyhow::{Context, Result, anyhow};
use graphwright_schema::{
    BuiltinScalar, ExecutionResult, FieldDefinition, InputValueDefinition, ObjectType, Request,
    Resolved, ResolverObject, RootValue, Schema, SchemaConfig, SchemaDeclaration, TypeRef,
    TypeRegistry,
};
use tracing::info;

use crate::cli::DemoArgs;

const ROSTER: &[(&str, &[&str])] = &[
    ("Rovers", &["Ada", "Grace"]),
    ("United", &["Linus"]),
];

/// Prints the demo SDL, then the result of `--query` when given. Returns
/// whether the query produced errors.
pub async fn demo(args: &DemoArgs) -> Result<bool> {
    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => SchemaConfig::default(),
    };
    let schema = demo_schema(config)?;

    let Some(query) = &args.query else {
        print!("{}", schema.to_sdl(None)?);
        return Ok(false);
    };

    let mut request = Request::new(query.as_str());
    if let Some(variables) = &args.variables {
        let variables: serde_json::Value =
            serde_json::from_str(variables).context("Variables must be a JSON object")?;
        request = request.with_variables(variables);
    }

    let result = run(&schema, request).await?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(!result.is_ok())
}

fn load_config(path: &Path) -> Result<SchemaConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    SchemaConfig::from_toml(&text).map_err(|e| anyhow!("Invalid config {}: {e}", path.display()))
}

async fn run(schema: &Schema, request: Request) -> Result<ExecutionResult> {
    let result = schema.execute(request, &demo_root()).await?;
    info!(errors = result.errors.len(), "Demo query executed");
    Ok(result)
}

/// `Team` and `Player` refer to each other; `Query` lists teams and looks
/// one up by name.
pub fn demo_schema(config: SchemaConfig) -> Result<Schema> {
    let mut registry = TypeRegistry::new();
    let team = registry.reserve("Team");
    let player = registry.reserve("Player");
    let query = registry.reserve("Query");

    registry.define(
        team,
        ObjectType::new("Team").with_fields(move || {
            Ok(vec![
                FieldDefinition::new("name", TypeRef::required(BuiltinScalar::String)),
                FieldDefinition::new("players", TypeRef::list_of(TypeRef::required(player), true)),
            ])
        }),
    )?;
    registry.define(
        player,
        ObjectType::new("Player").with_fields(move || {
            Ok(vec![
                FieldDefinition::new("name", TypeRef::required(BuiltinScalar::String)),
                FieldDefinition::new("currentTeam", TypeRef::optional(team)),
            ])
        }),
    )?;
    registry.define(
        query,
        ObjectType::new("Query").with_fields(move || {
            Ok(vec![
                FieldDefinition::new("teams", TypeRef::list_of(TypeRef::required(team), true)),
                FieldDefinition::new("team", TypeRef::optional(team)).with_argument(
                    InputValueDefinition::new("name", TypeRef::required(BuiltinScalar::String)),
                ),
            ])
        }),
    )?;

    Ok(Schema::with_config(registry, SchemaDeclaration::new(query), config))
}

fn team_resolver(name: &str) -> Option<ResolverObject> {
    let &(name, players) = ROSTER.iter().find(|(team, _)| *team == name)?;
    Some(
        ResolverObject::new()
            .with_typename("Team")
            .with_value("resolve_name", name)
            .with_value(
                "resolve_players",
                Resolved::list(players.iter().map(|p| Resolved::object(player_resolver(p, name)))),
            ),
    )
}

fn player_resolver(name: &str, team: &'static str) -> ResolverObject {
    ResolverObject::new()
        .with_typename("Player")
        .with_value("resolve_name", name)
        .with_method("resolve_current_team", move |_, _| {
            Ok(team_resolver(team).map(Resolved::object).into())
        })
}

fn demo_root() -> RootValue {
    RootValue::new(
        ResolverObject::new()
            .with_value(
                "resolve_teams",
                Resolved::list(
                    ROSTER
                        .iter()
                        .filter_map(|(name, _)| team_resolver(name))
                        .map(Resolved::object),
                ),
            )
            .with_method("resolve_team", |args, _ctx| {
                let name = args.str("name").unwrap_or_default();
                Ok(team_resolver(name).map(Resolved::object).into())
            }),
    )
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_demo_sdl() {
        let sdl = demo_schema(SchemaConfig::default()).unwrap().to_sdl(None).unwrap();
        assert!(sdl.contains("type Player {\n  name: String!\n  currentTeam: Team\n}\n"));
        assert!(sdl.contains("  team(name: String!): Team\n"));
        assert!(graphwright_compare::compare(&sdl, &sdl).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_demo_query_follows_cycles() {
        let schema = demo_schema(SchemaConfig::default()).unwrap();
        let request = Request::new(
            "query Roster($name: String!) { team(name: $name) { players { name currentTeam { name } } } }",
        )
        .with_variables(json!({"name": "United"}));

        let result = run(&schema, request).await.unwrap();
        assert!(result.is_ok(), "{:?}", result.messages());
        assert_eq!(
            result.data,
            json!({"team": {"players": [{"name": "Linus", "currentTeam": {"name": "United"}}]}})
        );
    }

    #[tokio::test]
    async fn test_unknown_team_is_null() {
        let schema = demo_schema(SchemaConfig::default()).unwrap();
        let result = run(&schema, Request::new(r#"{ team(name: "Nobody") { name } }"#))
            .await
            .unwrap();
        assert!(result.is_ok());
        assert_eq!(result.data, json!({"team": null}));
    }

    #[test]
    fn test_load_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schema.toml");
        std::fs::write(&path, "introspection = false\nmax_depth = 4\n").unwrap();

        let config = load_config(&path).unwrap();
        assert!(!config.introspection);
        assert_eq!(config.max_depth, 4);

        std::fs::write(&path, "max_depth = 0\n").unwrap();
        let err = load_config(&path).unwrap_err();
        assert!(err.to_string().ends_with("schema.max_depth must be > 0"));
    }
}
