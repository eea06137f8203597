//! Vocabulary elements and their formal arguments.
//!
//! # Responsibility
//! - Describe the allowed shape of a column's or a predicate's value.
//! - Check a single `DataValue` against one formal argument slot.
//!
//! # Invariants
//! - Names use the name alphabet (see `is_valid_name`).
//! - Formal argument names are unique within their element.
//! - Single-argument columns (every `ColumnType` except `Matrix`) keep exactly
//!   one formal argument whose type matches the column type.
//! - A constraint always fits its declared type.

use super::error::ValidationError;
use super::id::{Id, INVALID_ID};
use super::time::TimeStamp;
use super::value::{is_valid_nominal, is_valid_text, DataValue, ValueKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};

/// Name of the seeded argument of single-argument columns.
pub const DEFAULT_ARG_NAME: &str = "val";

/// Declared type of a formal argument slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArgType {
    Text,
    Integer,
    Float,
    Nominal,
    TimeStamp,
    Predicate,
    /// Accepts any scalar value, plus predicates when nesting is allowed.
    Untyped,
}

impl Display for ArgType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Text => "text",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Nominal => "nominal",
            Self::TimeStamp => "time stamp",
            Self::Predicate => "predicate",
            Self::Untyped => "untyped",
        };
        f.write_str(label)
    }
}

/// Optional restriction on the values a slot accepts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ArgConstraint {
    #[default]
    None,
    IntRange { min: i64, max: i64 },
    FloatRange { min: f64, max: f64 },
    /// Approved nominal values.
    NominalSet { values: BTreeSet<String> },
    /// Approved predicate vocabulary element ids.
    PredicateSet { ids: BTreeSet<Id> },
}

impl ArgConstraint {
    fn check_fits(&self, arg_type: ArgType) -> Result<(), ValidationError> {
        let fits = match self {
            Self::None => true,
            Self::IntRange { min, max } => {
                if min > max {
                    return Err(ValidationError::InvalidConstraint(format!(
                        "integer range min {min} exceeds max {max}"
                    )));
                }
                arg_type == ArgType::Integer
            }
            Self::FloatRange { min, max } => {
                if min.is_nan() || max.is_nan() || min > max {
                    return Err(ValidationError::InvalidConstraint(format!(
                        "float range [{min}, {max}] is empty"
                    )));
                }
                arg_type == ArgType::Float
            }
            Self::NominalSet { values } => {
                if let Some(bad) = values.iter().find(|value| !is_valid_nominal(value)) {
                    return Err(ValidationError::InvalidConstraint(format!(
                        "`{bad}` is not a valid nominal"
                    )));
                }
                arg_type == ArgType::Nominal
            }
            Self::PredicateSet { .. } => arg_type == ArgType::Predicate,
        };
        if !fits {
            return Err(ValidationError::InvalidConstraint(format!(
                "constraint does not apply to {arg_type} arguments"
            )));
        }
        Ok(())
    }
}

/// One typed slot of a vocabulary element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormalArgument {
    id: Id,
    name: String,
    arg_type: ArgType,
    #[serde(default)]
    constraint: ArgConstraint,
    #[serde(default)]
    allows_nested_predicate: bool,
}

impl FormalArgument {
    /// Creates an unconstrained argument. Its id is assigned by the database
    /// once the argument is committed to an element.
    pub fn new(name: impl Into<String>, arg_type: ArgType) -> Result<Self, ValidationError> {
        let name = normalize_name(name.into())?;
        Ok(Self {
            id: INVALID_ID,
            name,
            arg_type,
            constraint: ArgConstraint::None,
            allows_nested_predicate: false,
        })
    }

    pub fn with_constraint(mut self, constraint: ArgConstraint) -> Result<Self, ValidationError> {
        constraint.check_fits(self.arg_type)?;
        self.constraint = constraint;
        Ok(self)
    }

    pub fn with_nested_predicates(mut self, allowed: bool) -> Self {
        self.allows_nested_predicate = allowed;
        self
    }

    pub fn id(&self) -> Id {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn arg_type(&self) -> ArgType {
        self.arg_type
    }

    pub fn constraint(&self) -> &ArgConstraint {
        &self.constraint
    }

    pub fn allows_nested_predicate(&self) -> bool {
        self.allows_nested_predicate
    }

    /// Display form used for empty slots, e.g. `<val>`.
    pub fn placeholder(&self) -> String {
        format!("<{}>", self.name)
    }

    pub fn set_name(&mut self, name: impl Into<String>) -> Result<(), ValidationError> {
        self.name = normalize_name(name.into())?;
        Ok(())
    }

    /// Retypes the slot. The constraint is replaced as a whole.
    pub fn set_type(
        &mut self,
        arg_type: ArgType,
        constraint: ArgConstraint,
    ) -> Result<(), ValidationError> {
        constraint.check_fits(arg_type)?;
        self.arg_type = arg_type;
        self.constraint = constraint;
        Ok(())
    }

    pub(crate) fn assign_id(&mut self, id: Id) {
        self.id = id;
    }

    pub(crate) fn forget_predicate(&mut self, pve_id: Id) {
        if let ArgConstraint::PredicateSet { ids } = &mut self.constraint {
            ids.remove(&pve_id);
        }
    }

    /// Returns whether a value of `kind` may occupy this slot at all.
    pub fn admits(&self, kind: ValueKind) -> bool {
        match (self.arg_type, kind) {
            (_, ValueKind::Undefined) => true,
            (ArgType::Untyped, ValueKind::Predicate) => self.allows_nested_predicate,
            (ArgType::Untyped, _) => true,
            (ArgType::Text, ValueKind::Text)
            | (ArgType::Integer, ValueKind::Integer)
            | (ArgType::Float, ValueKind::Float)
            | (ArgType::Nominal, ValueKind::Nominal)
            | (ArgType::TimeStamp, ValueKind::TimeStamp)
            | (ArgType::Predicate, ValueKind::Predicate) => true,
            _ => false,
        }
    }

    /// Checks tag, alphabet and constraint of one value.
    ///
    /// Nested predicate contents are not inspected here; the database
    /// resolves them against the vocabulary.
    pub fn check_value(&self, value: &DataValue) -> Result<(), ValidationError> {
        if !self.admits(value.kind()) {
            return Err(ValidationError::TypeMismatch {
                arg: self.name.clone(),
                expected: self.arg_type,
                found: value.kind(),
            });
        }

        let in_range = match (value, &self.constraint) {
            (DataValue::Text(text), _) if !is_valid_text(text) => {
                return Err(ValidationError::InvalidValue(format!(
                    "text for <{}> contains control characters",
                    self.name
                )));
            }
            (DataValue::Nominal(nominal), _) if !is_valid_nominal(nominal) => {
                return Err(ValidationError::InvalidValue(format!(
                    "`{nominal}` is not a valid nominal"
                )));
            }
            (DataValue::Float(value), _) if !value.is_finite() => {
                return Err(ValidationError::InvalidValue(format!(
                    "float for <{}> must be finite",
                    self.name
                )));
            }
            (DataValue::Integer(value), ArgConstraint::IntRange { min, max }) => {
                (*min..=*max).contains(value)
            }
            (DataValue::Float(value), ArgConstraint::FloatRange { min, max }) => {
                (*min..=*max).contains(value)
            }
            (DataValue::Nominal(nominal), ArgConstraint::NominalSet { values }) => {
                values.contains(nominal)
            }
            (DataValue::Predicate(predicate), ArgConstraint::PredicateSet { ids }) => {
                !predicate.is_set() || ids.contains(&predicate.pve_id())
            }
            _ => true,
        };

        if !in_range {
            return Err(ValidationError::ValueOutOfRange {
                arg: self.name.clone(),
                value: value.label(),
            });
        }
        Ok(())
    }

    /// Builds a value for this slot from editor text.
    ///
    /// Blank text and the slot placeholder both mean Undefined. Predicate
    /// slots cannot be filled from text; predicates are bound by id.
    pub fn parse_value(&self, text: &str) -> Result<DataValue, ValidationError> {
        let trimmed = text.trim();
        if trimmed.is_empty() || trimmed == self.placeholder() {
            return Ok(DataValue::Undefined);
        }

        let invalid = |what: &str| {
            ValidationError::InvalidValue(format!("`{trimmed}` is not a valid {what}"))
        };
        let value = match self.arg_type {
            ArgType::Text => DataValue::Text(text.to_string()),
            ArgType::Nominal => DataValue::Nominal(trimmed.to_string()),
            ArgType::Integer => {
                DataValue::Integer(trimmed.parse::<i64>().map_err(|_| invalid("integer"))?)
            }
            ArgType::Float => {
                DataValue::Float(trimmed.parse::<f64>().map_err(|_| invalid("float"))?)
            }
            ArgType::TimeStamp => DataValue::TimeStamp(trimmed.parse::<TimeStamp>()?),
            ArgType::Predicate => return Err(invalid("predicate literal")),
            ArgType::Untyped => parse_untyped(text, trimmed),
        };
        self.check_value(&value)?;
        Ok(value)
    }
}

fn parse_untyped(raw: &str, trimmed: &str) -> DataValue {
    if let Ok(value) = trimmed.parse::<i64>() {
        return DataValue::Integer(value);
    }
    if let Ok(value) = trimmed.parse::<f64>() {
        if value.is_finite() {
            return DataValue::Float(value);
        }
    }
    if trimmed.contains(':') {
        if let Ok(ts) = trimmed.parse::<TimeStamp>() {
            return DataValue::TimeStamp(ts);
        }
    }
    if is_valid_nominal(trimmed) {
        return DataValue::Nominal(trimmed.to_string());
    }
    DataValue::Text(raw.to_string())
}

/// Which namespace a vocabulary element lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VocabKind {
    /// Backs exactly one column.
    Matrix,
    Predicate,
}

impl Display for VocabKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Matrix => f.write_str("matrix"),
            Self::Predicate => f.write_str("predicate"),
        }
    }
}

/// Shape of a column's backing element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    Text,
    Nominal,
    Integer,
    Float,
    Predicate,
    /// Free arity, any argument types.
    Matrix,
}

impl ColumnType {
    /// Argument type of the single slot, `None` for free-arity columns.
    pub fn single_arg_type(self) -> Option<ArgType> {
        match self {
            Self::Text => Some(ArgType::Text),
            Self::Nominal => Some(ArgType::Nominal),
            Self::Integer => Some(ArgType::Integer),
            Self::Float => Some(ArgType::Float),
            Self::Predicate => Some(ArgType::Predicate),
            Self::Matrix => None,
        }
    }
}

/// Schema of a column (matrix kind) or of a predicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VocabElement {
    id: Id,
    kind: VocabKind,
    name: String,
    /// Present for matrix elements only.
    column_type: Option<ColumnType>,
    #[serde(default)]
    variable_length: bool,
    formal_args: Vec<FormalArgument>,
}

impl VocabElement {
    /// Creates a column schema. Single-argument column types are seeded with
    /// one `val` argument.
    pub fn new_matrix(
        name: impl Into<String>,
        column_type: ColumnType,
    ) -> Result<Self, ValidationError> {
        let formal_args = match column_type.single_arg_type() {
            Some(arg_type) => vec![FormalArgument::new(DEFAULT_ARG_NAME, arg_type)?],
            None => Vec::new(),
        };
        Ok(Self {
            id: INVALID_ID,
            kind: VocabKind::Matrix,
            name: normalize_name(name.into())?,
            column_type: Some(column_type),
            variable_length: false,
            formal_args,
        })
    }

    pub fn new_predicate(name: impl Into<String>) -> Result<Self, ValidationError> {
        Ok(Self {
            id: INVALID_ID,
            kind: VocabKind::Predicate,
            name: normalize_name(name.into())?,
            column_type: None,
            variable_length: false,
            formal_args: Vec::new(),
        })
    }

    pub fn id(&self) -> Id {
        self.id
    }

    pub fn kind(&self) -> VocabKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn column_type(&self) -> Option<ColumnType> {
        self.column_type
    }

    pub fn variable_length(&self) -> bool {
        self.variable_length
    }

    pub fn set_variable_length(&mut self, variable_length: bool) {
        self.variable_length = variable_length;
    }

    pub fn is_fixed_arity(&self) -> bool {
        matches!(self.column_type, Some(column_type) if column_type != ColumnType::Matrix)
    }

    pub fn arity(&self) -> usize {
        self.formal_args.len()
    }

    pub fn formal_args(&self) -> &[FormalArgument] {
        &self.formal_args
    }

    pub fn formal_arg(&self, index: usize) -> Result<&FormalArgument, ValidationError> {
        self.formal_args
            .get(index)
            .ok_or(ValidationError::IndexOutOfRange {
                index,
                len: self.formal_args.len(),
            })
    }

    pub fn position_of_arg(&self, arg_id: Id) -> Option<usize> {
        self.formal_args.iter().position(|arg| arg.id == arg_id)
    }

    pub fn set_name(&mut self, name: impl Into<String>) -> Result<(), ValidationError> {
        self.name = normalize_name(name.into())?;
        Ok(())
    }

    /// Inserts a formal argument at `position` (`position == arity` appends).
    pub fn insert_formal_arg(
        &mut self,
        position: usize,
        arg: FormalArgument,
    ) -> Result<(), ValidationError> {
        if self.is_fixed_arity() {
            return Err(ValidationError::FixedArity(self.id));
        }
        if position > self.formal_args.len() {
            return Err(ValidationError::IndexOutOfRange {
                index: position,
                len: self.formal_args.len(),
            });
        }
        self.ensure_unique_arg_name(arg.name(), None)?;
        self.formal_args.insert(position, arg);
        Ok(())
    }

    pub fn remove_formal_arg(&mut self, position: usize) -> Result<FormalArgument, ValidationError> {
        if self.is_fixed_arity() {
            return Err(ValidationError::FixedArity(self.id));
        }
        if position >= self.formal_args.len() {
            return Err(ValidationError::IndexOutOfRange {
                index: position,
                len: self.formal_args.len(),
            });
        }
        Ok(self.formal_args.remove(position))
    }

    pub fn rename_formal_arg(
        &mut self,
        position: usize,
        name: impl Into<String>,
    ) -> Result<(), ValidationError> {
        let name = normalize_name(name.into())?;
        self.formal_arg(position)?;
        self.ensure_unique_arg_name(&name, Some(position))?;
        self.formal_args[position].name = name;
        Ok(())
    }

    pub fn retype_formal_arg(
        &mut self,
        position: usize,
        arg_type: ArgType,
        constraint: ArgConstraint,
    ) -> Result<(), ValidationError> {
        let current = self.formal_arg(position)?.arg_type;
        if self.is_fixed_arity() && current != arg_type {
            return Err(ValidationError::FixedArity(self.id));
        }
        self.formal_args[position].set_type(arg_type, constraint)
    }

    /// Re-checks the local invariants of an element that was edited or
    /// deserialized outside the database.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !is_valid_name(&self.name) {
            return Err(ValidationError::InvalidName(self.name.clone()));
        }
        match (self.kind, self.column_type) {
            (VocabKind::Matrix, None) | (VocabKind::Predicate, Some(_)) => {
                return Err(ValidationError::KindMismatch {
                    id: self.id,
                    expected: self.kind,
                });
            }
            _ => {}
        }
        if let Some(arg_type) = self.column_type.and_then(ColumnType::single_arg_type) {
            if self.formal_args.len() != 1 || self.formal_args[0].arg_type != arg_type {
                return Err(ValidationError::FixedArity(self.id));
            }
        }
        for (position, arg) in self.formal_args.iter().enumerate() {
            if !is_valid_name(&arg.name) {
                return Err(ValidationError::InvalidName(arg.name.clone()));
            }
            arg.constraint.check_fits(arg.arg_type)?;
            self.ensure_unique_arg_name(&arg.name, Some(position))?;
        }
        Ok(())
    }

    pub(crate) fn assign_id(&mut self, id: Id) {
        self.id = id;
    }

    pub(crate) fn formal_args_mut(&mut self) -> &mut [FormalArgument] {
        &mut self.formal_args
    }

    fn ensure_unique_arg_name(
        &self,
        name: &str,
        skip: Option<usize>,
    ) -> Result<(), ValidationError> {
        let collides = self
            .formal_args
            .iter()
            .enumerate()
            .any(|(position, arg)| Some(position) != skip && arg.name == name);
        if collides {
            return Err(ValidationError::NameCollision(name.to_string()));
        }
        Ok(())
    }
}

/// Column, predicate and argument names share the nominal alphabet.
pub fn is_valid_name(name: &str) -> bool {
    is_valid_nominal(name)
}

fn normalize_name(name: String) -> Result<String, ValidationError> {
    let trimmed = name.trim();
    if !is_valid_name(trimmed) {
        return Err(ValidationError::InvalidName(name));
    }
    Ok(trimmed.to_string())
}
