//! Record and enum declarations loaded from a JSON schema file.
//!
//! ```json
//! {
//!   "root": "Album",
//!   "enums": { "ReleaseType": ["lp", "cd", {"name": "single", "value": 7}] },
//!   "records": {
//!     "Album": [
//!       {"name": "artist", "type": "string"},
//!       {"name": "release_type", "type": "ReleaseType"},
//!       {"name": "release_date", "type": "date?"},
//!       {"name": "label", "type": "Label | null"}
//!     ],
//!     "Label": [{"name": "name", "type": "string"}]
//!   }
//! }
//! ```
//!
//! Type expressions: `string`, `int`, `bool`, `null`, `date`, an enum or
//! record name, `A | B`, and a trailing `?` for optional. Descriptors are
//! leaked: they live for the rest of the process, like declared ones.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::Deserialize;
use thiserror::Error;

use crate::ir::{EnumType, Field, Member, RecordType, Ty, Wire};

// ————————————————————————————————————————————————————————————————————————————
// FILE FORMAT
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaFile {
    #[serde(default)]
    pub root: Option<String>,
    #[serde(default)]
    pub enums: IndexMap<String, Vec<MemberSpec>>,
    #[serde(default)]
    pub records: IndexMap<String, Vec<FieldSpec>>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum MemberSpec {
    /// name and wire value are the same string
    Bare(String),
    Full { name: String, value: WireSpec },
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum WireSpec {
    Str(String),
    Int(i64),
}

#[derive(Debug, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
}

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("failed to read schema {}: {source}", .path.display())]
    Read { path: PathBuf, source: std::io::Error },
    #[error("invalid schema at {path}: {source}")]
    Parse { path: String, source: serde_json::Error },
    #[error("unknown type `{name}` in {context}")]
    UnknownType { name: String, context: String },
    #[error("malformed type expression `{expr}` in {context}")]
    BadTypeExpr { expr: String, context: String },
    #[error("record `{0}` refers back to itself")]
    Cycle(String),
    #[error("no record named `{0}`")]
    UnknownRoot(String),
    #[error("enum `{name}` declares member `{member}` twice")]
    DuplicateMember { name: String, member: String },
    #[error("record `{record}` declares field `{field}` twice")]
    DuplicateField { record: String, field: String },
}

impl From<serde_path_to_error::Error<serde_json::Error>> for SchemaError {
    fn from(err: serde_path_to_error::Error<serde_json::Error>) -> Self {
        let path = err.path().to_string();
        SchemaError::Parse { path, source: err.into_inner() }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// RESOLVED SCHEMA
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug)]
pub struct Schema {
    root: Option<String>,
    enums: IndexMap<String, &'static EnumType>,
    records: IndexMap<String, &'static RecordType>,
}

impl Schema {
    pub fn load(path: &Path) -> Result<Self, SchemaError> {
        let source = std::fs::read_to_string(path).map_err(|source| SchemaError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&source)
    }

    pub fn parse(source: &str) -> Result<Self, SchemaError> {
        let de = &mut serde_json::Deserializer::from_str(source);
        let file: SchemaFile = serde_path_to_error::deserialize(de)?;
        Self::build(file)
    }

    pub fn build(file: SchemaFile) -> Result<Self, SchemaError> {
        let mut builder = Builder {
            file: &file,
            enums: IndexMap::new(),
            records: IndexMap::new(),
            in_progress: HashSet::new(),
        };
        for (name, members) in &file.enums {
            builder.add_enum(name, members)?;
        }
        for name in file.records.keys() {
            builder.resolve_record(name)?;
        }
        let Builder { enums, records, .. } = builder;
        tracing::debug!(enums = enums.len(), records = records.len(), "loaded schema");
        Ok(Self { root: file.root, enums, records })
    }

    pub fn record(&self, name: &str) -> Option<&'static RecordType> {
        self.records.get(name).copied()
    }

    pub fn enumeration(&self, name: &str) -> Option<&'static EnumType> {
        self.enums.get(name).copied()
    }

    /// The record named by `name`, else the file's `root`, else the only record.
    pub fn root(&self, name: Option<&str>) -> Result<&'static RecordType, SchemaError> {
        let name = match (name, self.root.as_deref()) {
            (Some(n), _) | (None, Some(n)) => n,
            (None, None) if self.records.len() == 1 => {
                return Ok(self.records[0]);
            }
            (None, None) => return Err(SchemaError::UnknownRoot("<unspecified>".to_string())),
        };
        self.record(name).ok_or_else(|| SchemaError::UnknownRoot(name.to_string()))
    }
}

struct Builder<'a> {
    file: &'a SchemaFile,
    enums: IndexMap<String, &'static EnumType>,
    records: IndexMap<String, &'static RecordType>,
    in_progress: HashSet<String>,
}

impl Builder<'_> {
    fn add_enum(&mut self, name: &str, specs: &[MemberSpec]) -> Result<(), SchemaError> {
        let mut members: Vec<Member> = Vec::with_capacity(specs.len());
        for spec in specs {
            let member = match spec {
                MemberSpec::Bare(s) => Member::new(s.as_str(), s.as_str()),
                MemberSpec::Full { name, value } => Member::new(name.as_str(), Wire::from(value)),
            };
            let duplicate = members
                .iter()
                .any(|m| m.name == member.name || m.value == member.value);
            if duplicate {
                return Err(SchemaError::DuplicateMember {
                    name: name.to_string(),
                    member: member.name,
                });
            }
            members.push(member);
        }
        let leaked: &'static EnumType = Box::leak(Box::new(EnumType::new(name, members)));
        self.enums.insert(name.to_string(), leaked);
        Ok(())
    }

    fn resolve_record(&mut self, name: &str) -> Result<&'static RecordType, SchemaError> {
        if let Some(rt) = self.records.get(name).copied() {
            return Ok(rt);
        }
        if !self.in_progress.insert(name.to_string()) {
            return Err(SchemaError::Cycle(name.to_string()));
        }
        let file = self.file;
        let specs = &file.records[name];
        let mut fields: Vec<Field> = Vec::with_capacity(specs.len());
        for spec in specs {
            if fields.iter().any(|f| f.name == spec.name) {
                return Err(SchemaError::DuplicateField {
                    record: name.to_string(),
                    field: spec.name.clone(),
                });
            }
            let context = format!("{name}.{}", spec.name);
            fields.push(Field::new(spec.name.as_str(), self.parse_ty(&spec.ty, &context)?));
        }
        self.in_progress.remove(name);
        let leaked: &'static RecordType = Box::leak(Box::new(RecordType::new(name, fields)));
        self.records.insert(name.to_string(), leaked);
        Ok(leaked)
    }

    fn parse_ty(&mut self, expr: &str, context: &str) -> Result<Ty, SchemaError> {
        let arms: Vec<&str> = expr.split('|').map(str::trim).collect();
        if arms.len() == 1 {
            return self.parse_atom(arms[0], context);
        }
        let arms = arms
            .into_iter()
            .map(|arm| self.parse_atom(arm, context))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Ty::OneOf(arms))
    }

    fn parse_atom(&mut self, atom: &str, context: &str) -> Result<Ty, SchemaError> {
        if let Some(inner) = atom.strip_suffix('?') {
            return Ok(Ty::optional(self.parse_atom(inner.trim_end(), context)?));
        }
        let ty = match atom {
            "" => {
                return Err(SchemaError::BadTypeExpr {
                    expr: atom.to_string(),
                    context: context.to_string(),
                });
            }
            "string" => Ty::Str,
            "int" => Ty::Int,
            "bool" => Ty::Bool,
            "null" => Ty::Null,
            "date" => Ty::Date,
            name => {
                if let Some(e) = self.enums.get(name).copied() {
                    Ty::Enum(e)
                } else if self.file.records.contains_key(name) {
                    Ty::Record(self.resolve_record(name)?)
                } else {
                    return Err(SchemaError::UnknownType {
                        name: name.to_string(),
                        context: context.to_string(),
                    });
                }
            }
        };
        Ok(ty)
    }
}

impl From<&WireSpec> for Wire {
    fn from(spec: &WireSpec) -> Self {
        match spec {
            WireSpec::Str(s) => Wire::Str(s.clone()),
            WireSpec::Int(n) => Wire::Int(*n),
        }
    }
}
