//! IDL document renderer with non-destructive regeneration.

use std::collections::HashSet;
use std::fmt::Write as _;

use indexmap::IndexMap;
use tracing::{debug, info};

use crate::core::schema::{Field, Model, Schema};
use crate::dialect::canonical::EnumType;
use crate::error::{GenError, Result};

use super::document::{Definition, Document, FieldDef};
use super::{filtered, quote, quote_list, TableFilter};

/// Name of the reserved configuration input.
const CONFIG_TYPE: &str = "AMPLIFY";

const DEFAULT_AUTH_RULE: &str = "{ allow: public }";

/// Type directives the generator owns; everything else is the user's.
const GENERATED_TYPE_DIRECTIVES: &[&str] = &["model", "refersTo"];

/// Field directives the generator owns.
const GENERATED_FIELD_DIRECTIVES: &[&str] = &["primaryKey", "index", "default", "refersTo"];

/// Settings read back from an existing config block.
#[derive(Debug, Default)]
struct CarriedConfig {
    auth_rule: Option<String>,
    filter: Option<TableFilter>,
}

impl CarriedConfig {
    fn read(doc: &Document) -> Result<Self> {
        let Some(config) = doc.find("input", CONFIG_TYPE) else {
            return Ok(Self::default());
        };

        let auth_rule = config
            .field("globalAuthRule")
            .and_then(|f| f.default_text.clone());
        let include = filter_list(config, "include")?;
        let exclude = filter_list(config, "exclude")?;

        Ok(Self {
            auth_rule,
            filter: TableFilter::from_lists(include, exclude)?,
        })
    }
}

/// Table filter stored in the config block of a previously generated
/// document, if any.
pub fn carried_filter(doc: &Document) -> Result<Option<TableFilter>> {
    Ok(CarriedConfig::read(doc)?.filter)
}

fn filter_list(config: &Definition, key: &str) -> Result<Option<Vec<String>>> {
    let Some(field) = config.field(key) else {
        return Ok(None);
    };
    let value = field.default.as_ref().ok_or_else(|| GenError::InvalidFilter {
        key: key.to_string(),
        message: "no value given".to_string(),
    })?;
    value
        .as_string_list()
        .map(Some)
        .ok_or_else(|| GenError::InvalidFilter {
            key: key.to_string(),
            message: "expected a list of strings".to_string(),
        })
}

/// Renders the annotated IDL document.
#[derive(Debug, Clone, Default)]
pub struct IdlGenerator {
    filter: Option<TableFilter>,
}

impl IdlGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter tables explicitly. Takes precedence over a filter carried in
    /// an existing document.
    pub fn with_filter(mut self, filter: Option<TableFilter>) -> Self {
        self.filter = filter;
        self
    }

    /// Render `schema`, reconciling against a previously generated document.
    pub fn render(&self, schema: &Schema, existing: Option<&str>) -> Result<String> {
        let doc = match existing {
            Some(text) => Document::parse(text)?,
            None => Document::default(),
        };
        let carried = CarriedConfig::read(&doc)?;
        let filter = self.filter.clone().or(carried.filter);

        let models: Vec<&Model> = filtered(schema.models(), filter.as_ref()).collect();

        // Enums are checked before anything is written
        let mut enums: IndexMap<&str, &EnumType> = IndexMap::new();
        for model in &models {
            for (_, e) in model.enums() {
                if !enums.contains_key(e.name.as_str()) {
                    e.validate()?;
                    enums.insert(e.name.as_str(), e);
                }
            }
        }

        let mut claimed = HashSet::new();
        let mut types: Vec<(String, String)> = Vec::with_capacity(models.len());
        for model in &models {
            let matched = match_type(&doc, model, &mut claimed).and_then(|i| doc.definitions.get(i));
            types.push(render_model(model, matched)?);
        }
        types.sort_by(|a, b| a.0.cmp(&b.0));

        let mut enum_blocks: Vec<&EnumType> = enums.values().copied().collect();
        enum_blocks.sort_by(|a, b| a.name.cmp(&b.name));

        let type_names: HashSet<&str> = types.iter().map(|(name, _)| name.as_str()).collect();
        let carried_forward: Vec<&Definition> = doc
            .definitions
            .iter()
            .enumerate()
            .filter(|(i, d)| {
                if d.keyword == "input" && d.name == CONFIG_TYPE {
                    return false;
                }
                if d.is_model() {
                    if !claimed.contains(i) {
                        debug!("Dropping model type {}: no backing table", d.name);
                    }
                    return false;
                }
                if d.keyword == "enum" && enums.contains_key(d.name.as_str()) {
                    return false;
                }
                if d.keyword == "type" && type_names.contains(d.name.as_str()) {
                    debug!("Dropping type {}: replaced by a generated model", d.name);
                    return false;
                }
                true
            })
            .map(|(_, d)| d)
            .collect();

        let mut blocks = Vec::with_capacity(1 + types.len() + enum_blocks.len() + carried_forward.len());
        blocks.push(render_config(
            schema,
            carried.auth_rule.as_deref(),
            filter.as_ref(),
        )?);
        blocks.extend(types.into_iter().map(|(_, text)| text));
        blocks.extend(enum_blocks.iter().map(|e| render_enum(e)));
        blocks.extend(carried_forward.iter().map(|d| d.text.clone()));

        info!(
            "Rendered IDL document: {} models, {} enums, {} carried definitions",
            models.len(),
            enum_blocks.len(),
            carried_forward.len()
        );

        let mut out = blocks.join("\n\n");
        out.push('\n');
        Ok(out)
    }
}

fn render_config(schema: &Schema, auth_rule: Option<&str>, filter: Option<&TableFilter>) -> Result<String> {
    let mut out = String::new();
    let _ = writeln!(out, "input {} {{", CONFIG_TYPE);
    let _ = writeln!(out, "  engine: String = {}", quote(schema.engine().as_str())?);
    let _ = writeln!(
        out,
        "  globalAuthRule: AuthRule = {}",
        auth_rule.unwrap_or(DEFAULT_AUTH_RULE)
    );
    if let Some(filter) = filter {
        let _ = writeln!(
            out,
            "  {}: [String] = [{}]",
            filter.key(),
            quote_list(filter.tables())?
        );
    }
    out.push('}');
    Ok(out)
}

/// Find the existing `@model` type regenerated from `model`, by position.
///
/// Table-based matches win over a match on the generated type name.
fn match_type(doc: &Document, model: &Model, claimed: &mut HashSet<usize>) -> Option<usize> {
    let taken: &HashSet<usize> = claimed;
    let free = move || {
        doc.definitions
            .iter()
            .enumerate()
            .filter(move |(i, d)| d.is_model() && !taken.contains(i))
    };
    let position = free()
        .find(|(_, d)| d.refers_to().unwrap_or(&d.name) == model.table)
        .or_else(|| free().find(|(_, d)| d.name == model.name))
        .map(|(i, _)| i)?;
    claimed.insert(position);
    Some(position)
}

/// Find the existing field regenerated from `field`.
fn match_field<'d>(
    def: &'d Definition,
    field: &Field,
    claimed: &mut HashSet<usize>,
) -> Option<&'d FieldDef> {
    let position = def
        .fields
        .iter()
        .enumerate()
        .filter(|(i, _)| !claimed.contains(i))
        .find(|(_, f)| f.refers_to().unwrap_or(&f.name) == field.column)
        .or_else(|| {
            def.fields
                .iter()
                .enumerate()
                .filter(|(i, _)| !claimed.contains(i))
                .find(|(_, f)| f.name == field.name)
        })
        .map(|(i, _)| i)?;
    claimed.insert(position);
    def.fields.get(position)
}

/// Render one model, returning its emitted type name and text.
fn render_model(model: &Model, existing: Option<&Definition>) -> Result<(String, String)> {
    let type_name = existing.map_or(model.name.as_str(), |d| d.name.as_str());

    let mut claimed = HashSet::new();
    let matched: Vec<Option<&FieldDef>> = model
        .fields()
        .iter()
        .map(|f| existing.and_then(|d| match_field(d, f, &mut claimed)))
        .collect();

    // Generated field name -> emitted field name
    let names: IndexMap<&str, &str> = model
        .fields()
        .iter()
        .zip(&matched)
        .map(|(f, m)| (f.name.as_str(), m.map_or(f.name.as_str(), |m| m.name.as_str())))
        .collect();
    let emitted = |name: &String| names.get(name.as_str()).copied().unwrap_or(name).to_string();

    let mut out = String::new();
    let _ = write!(out, "type {} @model", type_name);
    if type_name != model.table {
        let _ = write!(out, " @refersTo(name: {})", quote(&model.table)?);
    }
    for directive in existing.iter().flat_map(|d| &d.directives) {
        if !GENERATED_TYPE_DIRECTIVES.contains(&directive.name.as_str()) {
            let _ = write!(out, " {}", directive.text);
        }
    }
    out.push_str(" {\n");

    for (field, existing_field) in model.fields().iter().zip(&matched) {
        let field_name = names.get(field.name.as_str()).copied().unwrap_or(&field.name);
        let _ = write!(out, "  {}: {}", field_name, field.field_type);

        if let Some(pk) = model.primary_key().filter(|pk| pk.lead() == Some(field.name.as_str())) {
            if pk.sort_keys().is_empty() {
                out.push_str(" @primaryKey");
            } else {
                let keys: Vec<String> = pk.sort_keys().iter().map(&emitted).collect();
                let _ = write!(out, " @primaryKey(sortKeyFields: [{}])", quote_list(&keys)?);
            }
        }
        for index in model.indexes().iter().filter(|i| i.lead() == Some(field.name.as_str())) {
            let _ = write!(out, " @index(name: {}", quote(&index.name)?);
            if !index.sort_keys().is_empty() {
                let keys: Vec<String> = index.sort_keys().iter().map(&emitted).collect();
                let _ = write!(out, ", sortKeyFields: [{}]", quote_list(&keys)?);
            }
            out.push(')');
        }
        if let Some(value) = field.literal_default() {
            let _ = write!(out, " @default(value: {})", quote(value)?);
        }
        if field_name != field.column {
            let _ = write!(out, " @refersTo(name: {})", quote(&field.column)?);
        }
        for directive in existing_field.iter().flat_map(|f| &f.directives) {
            if !GENERATED_FIELD_DIRECTIVES.contains(&directive.name.as_str()) {
                let _ = write!(out, " {}", directive.text);
            }
        }
        out.push('\n');
    }

    if let Some(def) = existing {
        for (i, field) in def.fields.iter().enumerate() {
            if claimed.contains(&i) {
                continue;
            }
            if field.is_relationship() {
                let _ = writeln!(out, "  {}", field.text);
            } else {
                debug!("Dropping field {}.{}: no backing column", def.name, field.name);
            }
        }
    }

    out.push('}');
    Ok((type_name.to_string(), out))
}

fn render_enum(e: &EnumType) -> String {
    let mut out = format!("enum {} {{\n", e.name);
    for value in &e.values {
        let _ = writeln!(out, "  {}", value);
    }
    out.push('}');
    out
}
