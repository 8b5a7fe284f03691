//! Conversion of Anchor IDL JSON (legacy and 0.30+ layouts) into a
//! [`ProgramSchema`].
//!
//! Legacy IDLs name the program at the top level, spell pubkeys `publicKey`
//! and reference types as `{"defined": "Name"}`. Newer IDLs keep the name
//! under `metadata`, carry explicit discriminators, spell pubkeys `pubkey`
//! and reference types as `{"defined": {"name": "Name"}}`. Both shapes nest
//! account groups under an `accounts` key.

use std::collections::HashSet;

use serde::Deserialize;
use serde_json::Value;

use super::{
    anchor_discriminator, AccountSlotSpec, ArgType, EnumVariant, FieldDef, InstructionSchema,
    ProgramSchema, TypeDef, TypeDefKind,
};
use crate::error::SchemaError;

#[derive(Deserialize)]
struct RawIdl {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    metadata: Option<RawMetadata>,
    instructions: Vec<RawInstruction>,
    #[serde(default)]
    types: Vec<RawTypeDef>,
}

#[derive(Deserialize)]
struct RawMetadata {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Deserialize)]
struct RawInstruction {
    name: String,
    #[serde(default)]
    discriminator: Option<Vec<u8>>,
    #[serde(default)]
    accounts: Vec<RawAccountItem>,
    #[serde(default)]
    args: Vec<RawField>,
}

#[derive(Deserialize)]
struct RawAccountItem {
    name: String,
    #[serde(default)]
    accounts: Option<Vec<RawAccountItem>>,
}

#[derive(Deserialize)]
struct RawField {
    name: String,
    #[serde(rename = "type")]
    ty: RawType,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawType {
    Primitive(String),
    Vec { vec: Box<RawType> },
    Option { option: Box<RawType> },
    Array { array: (Box<RawType>, usize) },
    Defined { defined: RawDefined },
    Other(Value),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawDefined {
    Name(String),
    Named { name: String },
}

#[derive(Deserialize)]
struct RawTypeDef {
    name: String,
    #[serde(rename = "type")]
    ty: RawTypeDefBody,
}

#[derive(Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
enum RawTypeDefBody {
    Struct {
        #[serde(default)]
        fields: Option<RawFields>,
    },
    Enum {
        variants: Vec<RawVariant>,
    },
    #[serde(other)]
    Unsupported,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawFields {
    Named(Vec<RawField>),
    Tuple(Vec<RawType>),
}

#[derive(Deserialize)]
struct RawVariant {
    name: String,
    #[serde(default)]
    fields: Option<RawFields>,
}

/// Normalize a raw IDL document into a [`ProgramSchema`].
///
/// Fails when the document is not an IDL, when an argument uses a type shape
/// the codec cannot express, or when an argument references an undefined type.
pub fn normalize_idl(raw: &Value) -> Result<ProgramSchema, SchemaError> {
    let idl = RawIdl::deserialize(raw)?;

    let name = idl
        .metadata
        .and_then(|m| m.name)
        .or(idl.name)
        .unwrap_or_default();

    let mut types = Vec::with_capacity(idl.types.len());
    for def in idl.types {
        let kind = match def.ty {
            RawTypeDefBody::Struct { fields } => TypeDefKind::Struct(convert_fields(fields)?),
            RawTypeDefBody::Enum { variants } => TypeDefKind::Enum(
                variants
                    .into_iter()
                    .map(|v| {
                        Ok(EnumVariant {
                            name: v.name,
                            fields: convert_fields(v.fields)?,
                        })
                    })
                    .collect::<Result<_, SchemaError>>()?,
            ),
            RawTypeDefBody::Unsupported => continue,
        };
        types.push(TypeDef {
            name: def.name,
            kind,
        });
    }

    let instructions = idl
        .instructions
        .into_iter()
        .map(|ix| {
            let discriminator = ix
                .discriminator
                .unwrap_or_else(|| anchor_discriminator(&ix.name).to_vec());
            Ok(InstructionSchema {
                name: ix.name,
                discriminator,
                accounts: ix.accounts.into_iter().map(convert_account).collect(),
                args: ix
                    .args
                    .into_iter()
                    .map(convert_field)
                    .collect::<Result<_, SchemaError>>()?,
            })
        })
        .collect::<Result<Vec<_>, SchemaError>>()?;

    let schema = ProgramSchema {
        name,
        instructions,
        types,
    };
    check_defined_types(&schema)?;
    Ok(schema)
}

fn convert_account(item: RawAccountItem) -> AccountSlotSpec {
    match item.accounts {
        Some(children) => AccountSlotSpec::Group {
            name: item.name,
            children: children.into_iter().map(convert_account).collect(),
        },
        None => AccountSlotSpec::Leaf { name: item.name },
    }
}

fn convert_fields(fields: Option<RawFields>) -> Result<Vec<FieldDef>, SchemaError> {
    match fields {
        None => Ok(Vec::new()),
        Some(RawFields::Named(fields)) => fields.into_iter().map(convert_field).collect(),
        Some(RawFields::Tuple(types)) => types
            .into_iter()
            .enumerate()
            .map(|(i, ty)| Ok(FieldDef::new(i.to_string(), convert_type(ty)?)))
            .collect(),
    }
}

fn convert_field(field: RawField) -> Result<FieldDef, SchemaError> {
    Ok(FieldDef {
        name: field.name,
        ty: convert_type(field.ty)?,
    })
}

fn convert_type(ty: RawType) -> Result<ArgType, SchemaError> {
    Ok(match ty {
        RawType::Primitive(name) => match name.as_str() {
            "bool" => ArgType::Bool,
            "u8" => ArgType::U8,
            "u16" => ArgType::U16,
            "u32" => ArgType::U32,
            "u64" => ArgType::U64,
            "u128" => ArgType::U128,
            "i8" => ArgType::I8,
            "i16" => ArgType::I16,
            "i32" => ArgType::I32,
            "i64" => ArgType::I64,
            "i128" => ArgType::I128,
            "f32" => ArgType::F32,
            "f64" => ArgType::F64,
            "string" => ArgType::String,
            "bytes" => ArgType::Bytes,
            "publicKey" | "pubkey" => ArgType::Pubkey,
            _ => return Err(SchemaError::UnsupportedType(name)),
        },
        RawType::Vec { vec } => ArgType::Vec(Box::new(convert_type(*vec)?)),
        RawType::Option { option } => ArgType::Option(Box::new(convert_type(*option)?)),
        RawType::Array { array: (inner, len) } => ArgType::Array(Box::new(convert_type(*inner)?), len),
        RawType::Defined { defined } => ArgType::Defined(match defined {
            RawDefined::Name(name) | RawDefined::Named { name } => name,
        }),
        RawType::Other(value) => return Err(SchemaError::UnsupportedType(value.to_string())),
    })
}

fn check_defined_types(schema: &ProgramSchema) -> Result<(), SchemaError> {
    let known: HashSet<&str> = schema.types.iter().map(|t| t.name.as_str()).collect();

    let mut pending: Vec<&ArgType> = schema
        .instructions
        .iter()
        .flat_map(|ix| ix.args.iter().map(|f| &f.ty))
        .collect();
    for def in &schema.types {
        match &def.kind {
            TypeDefKind::Struct(fields) => pending.extend(fields.iter().map(|f| &f.ty)),
            TypeDefKind::Enum(variants) => pending.extend(
                variants
                    .iter()
                    .flat_map(|v| v.fields.iter().map(|f| &f.ty)),
            ),
        }
    }

    while let Some(ty) = pending.pop() {
        match ty {
            ArgType::Option(inner) | ArgType::Vec(inner) | ArgType::Array(inner, _) => {
                pending.push(inner)
            }
            ArgType::Defined(name) if !known.contains(name.as_str()) => {
                return Err(SchemaError::UndefinedType(name.clone()))
            }
            _ => {}
        }
    }
    Ok(())
}
