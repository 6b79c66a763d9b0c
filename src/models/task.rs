//! Task identity: the stable key a pipeline step is tracked under.

use std::collections::BTreeMap;
use std::fmt;

use crate::errors::TrackerError;
use crate::validation::{validate_name, validate_param_value};

/// Identity of one pipeline step: a step name plus the parameters that
/// affect its output.
///
/// The identity fully determines where the step's output lives. Two
/// invocations with the same name and parameters share an output location;
/// changing any parameter value moves the output somewhere else. Parameters
/// are kept sorted by key so the derived location does not depend on
/// insertion order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct TaskIdentity {
    name: String,
    params: BTreeMap<String, String>,
}

impl TaskIdentity {
    /// Creates an identity for a parameterless step.
    pub fn new(name: &str) -> Result<Self, TrackerError> {
        validate_name(name)?;
        Ok(Self {
            name: name.to_string(),
            params: BTreeMap::new(),
        })
    }

    /// Adds an output-affecting parameter.
    ///
    /// Both key and value become part of the derived output directory, so
    /// both are validated as path segments.
    pub fn with_param(mut self, key: &str, value: &str) -> Result<Self, TrackerError> {
        validate_name(key)?;
        validate_param_value(value)?;
        self.params.insert(key.to_string(), value.to_string());
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &BTreeMap<String, String> {
        &self.params
    }

    /// Directory name this identity owns: `name` alone, or
    /// `name.key=value.key=value` with parameters in sorted key order.
    pub fn dir_name(&self) -> String {
        if self.params.is_empty() {
            return self.name.clone();
        }
        let mut dir = self.name.clone();
        for (key, value) in &self.params {
            dir.push('.');
            dir.push_str(key);
            dir.push('=');
            dir.push_str(value);
        }
        dir
    }
}

impl fmt::Display for TaskIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.dir_name())
    }
}
