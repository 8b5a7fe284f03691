//! Program schemas: instruction names, discriminators, argument layouts and
//! account roles.

pub mod idl;

use heck::ToSnakeCase;
use sha2::{Digest, Sha256};

/// A compiled decode schema for one program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramSchema {
    pub name: String,
    pub instructions: Vec<InstructionSchema>,
    pub types: Vec<TypeDef>,
}

impl ProgramSchema {
    pub fn instruction(&self, name: &str) -> Option<&InstructionSchema> {
        self.instructions.iter().find(|ix| ix.name == name)
    }

    pub fn type_def(&self, name: &str) -> Option<&TypeDef> {
        self.types.iter().find(|ty| ty.name == name)
    }
}

/// One instruction declared by a schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstructionSchema {
    pub name: String,
    pub discriminator: Vec<u8>,
    pub accounts: Vec<AccountSlotSpec>,
    pub args: Vec<FieldDef>,
}

impl InstructionSchema {
    /// Create an instruction with the Anchor discriminator derived from `name`.
    pub fn new(name: impl Into<String>, accounts: Vec<AccountSlotSpec>, args: Vec<FieldDef>) -> Self {
        let name = name.into();
        Self {
            discriminator: anchor_discriminator(&name).to_vec(),
            name,
            accounts,
            args,
        }
    }

    /// Depth-first account role names, groups joined with `.`.
    pub fn flattened_account_names(&self) -> Vec<String> {
        flatten_account_slots(&self.accounts)
    }
}

/// A declared account role: a single account or a named group of roles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountSlotSpec {
    Leaf { name: String },
    Group { name: String, children: Vec<AccountSlotSpec> },
}

impl AccountSlotSpec {
    pub fn leaf(name: impl Into<String>) -> Self {
        AccountSlotSpec::Leaf { name: name.into() }
    }

    pub fn group(name: impl Into<String>, children: Vec<AccountSlotSpec>) -> Self {
        AccountSlotSpec::Group {
            name: name.into(),
            children,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            AccountSlotSpec::Leaf { name } | AccountSlotSpec::Group { name, .. } => name,
        }
    }
}

/// A named, typed argument or struct field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDef {
    pub name: String,
    pub ty: ArgType,
}

impl FieldDef {
    pub fn new(name: impl Into<String>, ty: ArgType) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// Argument types understood by the schema codec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgType {
    Bool,
    U8,
    U16,
    U32,
    U64,
    U128,
    I8,
    I16,
    I32,
    I64,
    I128,
    F32,
    F64,
    String,
    Bytes,
    Pubkey,
    Option(Box<ArgType>),
    Vec(Box<ArgType>),
    Array(Box<ArgType>, usize),
    /// A struct or enum declared in [`ProgramSchema::types`].
    Defined(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDef {
    pub name: String,
    pub kind: TypeDefKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeDefKind {
    Struct(Vec<FieldDef>),
    Enum(Vec<EnumVariant>),
}

/// Enum variant; tuple variants name their fields `"0"`, `"1"`, ...
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumVariant {
    pub name: String,
    pub fields: Vec<FieldDef>,
}

/// Anchor instruction discriminator: `sha256("global:<snake_case name>")[..8]`.
pub fn anchor_discriminator(name: &str) -> [u8; 8] {
    let mut hasher = Sha256::new();
    hasher.update(format!("global:{}", name.to_snake_case()).as_bytes());
    let hash = hasher.finalize();
    let mut disc = [0u8; 8];
    disc.copy_from_slice(&hash[..8]);
    disc
}

/// Flatten nested account groups depth-first into dotted role names.
///
/// Uses an explicit stack of sibling iterators, so stack usage does not grow
/// with the nesting depth of the schema.
pub fn flatten_account_slots(slots: &[AccountSlotSpec]) -> Vec<String> {
    let mut names = Vec::with_capacity(slots.len());
    let mut stack: Vec<(Option<String>, std::slice::Iter<'_, AccountSlotSpec>)> =
        vec![(None, slots.iter())];

    loop {
        let Some((prefix, siblings)) = stack.last_mut() else {
            break;
        };
        let Some(slot) = siblings.next() else {
            stack.pop();
            continue;
        };
        let qualified = match prefix {
            Some(prefix) => format!("{prefix}.{}", slot.name()),
            None => slot.name().to_string(),
        };
        match slot {
            AccountSlotSpec::Leaf { .. } => names.push(qualified),
            AccountSlotSpec::Group { children, .. } => {
                stack.push((Some(qualified), children.iter()))
            }
        }
    }

    names
}
