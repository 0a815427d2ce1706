//! Schema command: list registered kinds or print one kind's fields

use std::collections::BTreeSet;
use std::fmt::Write as _;

use clap::{Args, ValueEnum};
use kiln_manifest::schema::{DefaultValue, FieldSource, ParamRef};
use kiln_manifest::{lookup, Schema, SchemaRegistry};

use crate::Result;

#[derive(Args, Debug)]
pub struct SchemaArgs {
    /// Kind to describe; lists every registered kind when omitted
    pub kind: Option<String>,

    /// Output format for a single kind
    #[arg(short = 'o', long, value_enum, default_value_t = SchemaFormat::Table)]
    pub output: SchemaFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum SchemaFormat {
    Table,
    Yaml,
    Json,
}

pub async fn run(args: SchemaArgs) -> Result<()> {
    let text = match &args.kind {
        None => describe_kinds(),
        Some(kind) => describe_schema(lookup(kind)?, args.output)?,
    };
    print!("{}", text);
    Ok(())
}

/// One line per registered kind
pub fn describe_kinds() -> String {
    let mut out = String::new();
    for schema in SchemaRegistry::global().schemas() {
        let _ = writeln!(
            out,
            "{:<24} {:<38} {}",
            schema.kind.kind_str(),
            schema.api_version,
            schema.kind.file_name()
        );
    }
    out
}

/// Render a schema in the requested format
pub fn describe_schema(schema: &Schema, format: SchemaFormat) -> Result<String> {
    match format {
        SchemaFormat::Yaml => Ok(serde_yaml::to_string(schema)?),
        SchemaFormat::Json => Ok(serde_json::to_string_pretty(schema)? + "\n"),
        SchemaFormat::Table => {
            let mut out = format!("{} ({})\n", schema.kind, schema.api_version);
            let required = required_parameters(schema);
            if !required.is_empty() {
                let _ = writeln!(out, "  required parameters: {}", required.join(", "));
            }
            for field in schema.fields {
                let _ = writeln!(
                    out,
                    "  {:<60} {:<28} {}",
                    field.path,
                    field.ty.describe(),
                    describe_source(&field.source)
                );
            }
            Ok(out)
        }
    }
}

/// Parameter keys the caller must supply, deduplicated and sorted
fn required_parameters(schema: &Schema) -> Vec<&'static str> {
    schema
        .required_fields()
        .filter_map(|field| match field.source {
            FieldSource::Param(param) => Some(param.key),
            _ => None,
        })
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

fn describe_source(source: &FieldSource) -> String {
    match source {
        FieldSource::Param(param) => describe_param(param),
        FieldSource::Optional(key) => format!("{} (optional)", key),
        FieldSource::Fixed(value) => format!("fixed {}", describe_default(value)),
        FieldSource::WhenPresent { trigger, param } => {
            format!("{} when {} is set", describe_param(param), trigger)
        }
        FieldSource::Family(prefix) => format!("{}*", prefix),
        FieldSource::RenderedFiles => "rendered file names".to_string(),
    }
}

fn describe_param(param: &ParamRef) -> String {
    match &param.default {
        None => format!("{} (required)", param.key),
        Some(default) => format!("{} (default {})", param.key, describe_default(default)),
    }
}

fn describe_default(value: &DefaultValue) -> String {
    match value {
        DefaultValue::Str(s) | DefaultValue::Derived(s) => s.to_string(),
        DefaultValue::Int(i) => i.to_string(),
        DefaultValue::Bool(b) => b.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiln_manifest::ResourceKind;

    #[test]
    fn test_kind_list_has_every_kind() {
        let text = describe_kinds();
        assert_eq!(text.lines().count(), 7);
        assert!(text.lines().next().unwrap().starts_with("Namespace"));
        assert!(text.contains("apps/v1"));
        assert!(text.contains("kustomization.yaml"));
    }

    #[test]
    fn test_table_marks_required_parameters() {
        let schema = SchemaRegistry::global().get(ResourceKind::Deployment);
        let table = describe_schema(schema, SchemaFormat::Table).unwrap();
        assert!(table.starts_with("Deployment (apps/v1)\n"));
        assert!(table.contains("image (required)"));
        assert!(table.contains("  required parameters: app-name, image, port\n"));
        assert!(table.contains("spec.template.spec.containers[0].image"));
    }

    #[test]
    fn test_structured_formats() {
        let schema = SchemaRegistry::global().get(ResourceKind::Service);
        let table = describe_schema(schema, SchemaFormat::Table).unwrap();
        assert!(table.contains("  required parameters: app-name, port\n"));

        let yaml = describe_schema(schema, SchemaFormat::Yaml).unwrap();
        assert!(yaml.starts_with("kind: Service\napiVersion: v1\n"));

        let json = describe_schema(schema, SchemaFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["kind"], "Service");
        assert_eq!(value["fields"][0]["path"], "metadata.name");
    }

    #[tokio::test]
    async fn test_unknown_kind_is_an_error() {
        let err = run(SchemaArgs {
            kind: Some("CronJob".to_string()),
            output: SchemaFormat::Table,
        })
        .await
        .unwrap_err();
        assert!(matches!(
            err,
            crate::Error::Render(kiln_manifest::Error::UnknownKind { .. })
        ));
    }
}
