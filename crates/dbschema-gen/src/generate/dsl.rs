//! Programmatic builder document renderer.
//!
//! Entries are keyed by table and fields by column, so the document names
//! what exists in the database. Models whose generated name differs from
//! their table are mapped with a trailing `renameModels` call.

use std::fmt::Write as _;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::core::identifier::is_valid_name;
use crate::core::schema::{Engine, Field, Model, Schema};
use crate::dialect::canonical::{EnumType, FieldType, ScalarType};
use crate::error::{GenError, Result};

use super::{filtered, quote, quote_list, TableFilter};

const HEADER: &str = "\
/* eslint-disable */
/**
 * This file was generated from the database catalog by dbschema-gen.
 * Edits are overwritten on the next run.
 */
";

/// Database connection block wrapped around the schema.
///
/// Secrets are referenced by name, never by value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Stable identifier of the data source.
    pub identifier: String,
    /// Name of the secret holding the connection URI.
    pub connection_uri_secret: String,
    /// Name of the secret holding the TLS certificate.
    #[serde(default)]
    pub ssl_cert_secret: Option<String>,
    #[serde(default)]
    pub vpc: Option<VpcConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VpcConfig {
    pub vpc_id: String,
    #[serde(default)]
    pub security_group_ids: Vec<String>,
    #[serde(default)]
    pub subnets: Vec<SubnetConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubnetConfig {
    pub subnet_id: String,
    pub availability_zone: String,
}

/// Builder method for a scalar.
fn scalar_method(scalar: ScalarType) -> &'static str {
    match scalar {
        ScalarType::String => "string",
        ScalarType::Int => "integer",
        ScalarType::Float => "float",
        ScalarType::Boolean => "boolean",
        ScalarType::Id => "id",
        ScalarType::AwsDate => "date",
        ScalarType::AwsTime => "time",
        ScalarType::AwsDateTime => "datetime",
        ScalarType::AwsTimestamp => "timestamp",
        ScalarType::AwsJson => "json",
        ScalarType::AwsIpAddress => "ipAddress",
        ScalarType::AwsEmail => "email",
        ScalarType::AwsUrl => "url",
        ScalarType::AwsPhone => "phone",
    }
}

/// Builder chain for a type. Wrappers unwind innermost first, so
/// `[Int!]!` becomes `a.integer().required().array().required()`.
fn builder(field_type: &FieldType) -> Result<String> {
    Ok(match field_type {
        FieldType::Scalar(s) => format!("a.{}()", scalar_method(*s)),
        FieldType::Enum(e) => format!("a.ref({})", quote(&e.name)?),
        FieldType::Custom(name) => format!("a.ref({})", quote(name)?),
        FieldType::List(inner) => format!("{}.array()", builder(inner)?),
        FieldType::NonNull(inner) => format!("{}.required()", builder(inner)?),
    })
}

fn field_builder(field: &Field) -> Result<String> {
    let mut chain = builder(&field.field_type)?;
    // References carry no default
    if let (Some(value), FieldType::Scalar(_)) = (field.literal_default(), field.field_type.base()) {
        let _ = write!(chain, ".default({})", quote(value)?);
    }
    Ok(chain)
}

/// Renders the builder document.
#[derive(Debug, Clone, Default)]
pub struct DslGenerator {
    filter: Option<TableFilter>,
}

impl DslGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_filter(mut self, filter: Option<TableFilter>) -> Self {
        self.filter = filter;
        self
    }

    /// Render `schema`, optionally wrapped in a connection block.
    ///
    /// Models without a primary key can't be identified and are skipped;
    /// if none has one, nothing is rendered.
    pub fn render(&self, schema: &Schema, connection: Option<&ConnectionConfig>) -> Result<String> {
        let mut candidates: Vec<&Model> = filtered(schema.models(), self.filter.as_ref()).collect();
        candidates.sort_by(|a, b| a.name.cmp(&b.name));

        let models: Vec<&Model> = candidates
            .iter()
            .copied()
            .filter(|m| {
                if !m.has_primary_key() {
                    warn!("Skipping model {}: table {} has no primary key", m.name, m.table);
                }
                m.has_primary_key()
            })
            .collect();
        if models.is_empty() {
            return Err(GenError::NoPrimaryKey(candidates.len()));
        }

        for model in &models {
            for (_, e) in model.enums() {
                e.validate()?;
            }
        }

        let mut entries = Vec::new();
        let mut shared: IndexMap<&str, &EnumType> = IndexMap::new();
        for model in &models {
            entries.push(render_model(model)?);
            for (_, e) in model.enums() {
                match schema.engine() {
                    // MySQL enums belong to one column; each gets its own entry
                    Engine::MySql => entries.push(render_enum(e)?),
                    Engine::Postgres => {
                        shared.entry(e.name.as_str()).or_insert(e);
                    }
                }
            }
        }
        for e in shared.values() {
            entries.push(render_enum(e)?);
        }

        let mut out = String::from(HEADER);
        out.push_str("import { a } from \"@aws-amplify/data-schema\";\n");
        match connection {
            Some(conn) => {
                out.push_str("import { configure } from \"@aws-amplify/data-schema/internals\";\n");
                out.push_str("import { secret } from \"@aws-amplify/backend\";\n\n");
                out.push_str("export const schema = configure({\n");
                out.push_str(&render_database(schema.engine(), conn)?);
                out.push_str("}).schema({\n");
            }
            None => out.push_str("\nexport const schema = a.schema({\n"),
        }
        out.push_str(&entries.join(",\n"));
        out.push_str("\n})");

        // Entries are keyed by table; models whose name differs are renamed
        let renames = models
            .iter()
            .filter(|m| m.is_renamed())
            .map(|m| Ok(format!("  [{}, {}]", quote(&m.table)?, quote(&m.name)?)))
            .collect::<Result<Vec<_>>>()?;
        if !renames.is_empty() {
            out.push_str(".renameModels(() => [\n");
            out.push_str(&renames.join(",\n"));
            out.push_str("\n])");
        }
        out.push_str(";\n");

        info!(
            "Rendered builder document: {} models, {} skipped",
            models.len(),
            candidates.len() - models.len()
        );
        Ok(out)
    }
}

/// Object key for a column: bare when it is a legal identifier.
fn column_key(column: &str) -> Result<String> {
    if is_valid_name(column) {
        Ok(column.to_string())
    } else {
        quote(column)
    }
}

/// One model entry, keyed by its table with fields keyed by column.
fn render_model(model: &Model) -> Result<String> {
    let mut out = format!("  {}: a.model({{\n", quote(&model.table)?);
    let fields = model
        .fields()
        .iter()
        .map(|f| Ok(format!("    {}: {}", column_key(&f.column)?, field_builder(f)?)))
        .collect::<Result<Vec<_>>>()?;
    out.push_str(&fields.join(",\n"));
    out.push_str("\n  })");
    if let Some(pk) = model.primary_key() {
        let columns: Vec<String> = pk
            .fields
            .iter()
            .map(|name| model.field(name).map_or_else(|| name.clone(), |f| f.column.clone()))
            .collect();
        let _ = write!(out, ".identifier([{}])", quote_list(&columns)?);
    }
    Ok(out)
}

fn render_enum(e: &EnumType) -> Result<String> {
    Ok(format!(
        "  {}: a.enum([{}])",
        quote(&e.name)?,
        quote_list(&e.values)?
    ))
}

fn render_database(engine: Engine, conn: &ConnectionConfig) -> Result<String> {
    let mut out = String::from("  database: {\n");
    let _ = writeln!(out, "    identifier: {},", quote(&conn.identifier)?);
    let _ = writeln!(out, "    engine: {},", quote(engine.as_str())?);
    let _ = write!(
        out,
        "    connectionUri: secret({})",
        quote(&conn.connection_uri_secret)?
    );
    if let Some(cert) = &conn.ssl_cert_secret {
        let _ = write!(out, ",\n    sslCert: secret({})", quote(cert)?);
    }
    if let Some(vpc) = &conn.vpc {
        out.push_str(",\n    vpcConfig: {\n");
        let _ = writeln!(out, "      vpcId: {},", quote(&vpc.vpc_id)?);
        let _ = writeln!(
            out,
            "      securityGroupIds: [{}],",
            quote_list(&vpc.security_group_ids)?
        );
        out.push_str("      subnetAvailabilityZoneConfig: [");
        let subnets = vpc
            .subnets
            .iter()
            .map(|s| {
                Ok(format!(
                    "\n        {{ subnetId: {}, availabilityZone: {} }}",
                    quote(&s.subnet_id)?,
                    quote(&s.availability_zone)?
                ))
            })
            .collect::<Result<Vec<_>>>()?;
        out.push_str(&subnets.join(","));
        if !subnets.is_empty() {
            out.push_str("\n      ");
        }
        out.push_str("]\n    }");
    }
    out.push_str("\n  }\n");
    Ok(out)
}
