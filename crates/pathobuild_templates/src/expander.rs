//! Combinatorial expansion of build templates into concrete builds.
//!
//! For each template the expander:
//! - parses the variables referenced by the identifier field
//! - turns every variable value into a list of candidates
//! - walks the Cartesian product of those lists
//! - formats the identifier and all string fields once per combination

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{TemplateError, TemplateResult};
use crate::format::TemplateString;
use crate::template::{BuildConfig, BuildTemplate, FieldValue};

/// Identifier field used when none is configured.
pub const DEFAULT_IDENTIFIER_FIELD: &str = "stem";

/// How variable values that are not lists are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariablePolicy {
    /// Variables must already be lists.
    RequireList,
    /// A single value is wrapped into a one-element list.
    #[default]
    CoerceToList,
}

/// How non-variable fields that are not strings are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NonStringPolicy {
    /// Copied into every build unchanged.
    #[default]
    PassThrough,
    /// Rejected with [`TemplateError::NonStringField`].
    Reject,
}

/// Options for expanding build templates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpandOptions {
    /// Field holding the identifier template (e.g. "stem" or "name").
    pub identifier_field: String,
    pub variable_policy: VariablePolicy,
    pub non_string_fields: NonStringPolicy,
    /// Record failing templates and keep going instead of aborting.
    pub isolate_failures: bool,
    /// Upper bound on combinations per template.
    pub max_combinations: Option<usize>,
}

impl Default for ExpandOptions {
    fn default() -> Self {
        Self {
            identifier_field: DEFAULT_IDENTIFIER_FIELD.to_string(),
            variable_policy: VariablePolicy::default(),
            non_string_fields: NonStringPolicy::default(),
            isolate_failures: false,
            max_combinations: None,
        }
    }
}

impl ExpandOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn identifier_field(mut self, field: impl Into<String>) -> Self {
        self.identifier_field = field.into();
        self
    }

    pub fn variable_policy(mut self, policy: VariablePolicy) -> Self {
        self.variable_policy = policy;
        self
    }

    /// Shorthand for [`VariablePolicy::RequireList`].
    pub fn strict(self) -> Self {
        self.variable_policy(VariablePolicy::RequireList)
    }

    pub fn non_string_fields(mut self, policy: NonStringPolicy) -> Self {
        self.non_string_fields = policy;
        self
    }

    pub fn isolate_failures(mut self, enabled: bool) -> Self {
        self.isolate_failures = enabled;
        self
    }

    pub fn max_combinations(mut self, limit: usize) -> Self {
        self.max_combinations = Some(limit);
        self
    }
}

/// Two combinations that formatted to the same identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collision {
    pub identifier: String,
    /// Index of the template whose build was replaced.
    pub replaced_template: usize,
    /// Index of the template whose build was kept.
    pub kept_template: usize,
}

/// A template skipped because of `isolate_failures`.
#[derive(Debug)]
pub struct TemplateFailure {
    pub template_index: usize,
    pub error: TemplateError,
}

/// Result of one expansion call.
#[derive(Debug, Default)]
pub struct Expansion {
    /// Builds keyed by their formatted identifier.
    pub builds: BTreeMap<String, BuildConfig>,
    pub collisions: Vec<Collision>,
    pub failures: Vec<TemplateFailure>,
}

impl Expansion {
    pub fn len(&self) -> usize {
        self.builds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.builds.is_empty()
    }

    pub fn get(&self, identifier: &str) -> Option<&BuildConfig> {
        self.builds.get(identifier)
    }

    pub fn identifiers(&self) -> impl Iterator<Item = &str> {
        self.builds.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &BuildConfig)> {
        self.builds.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn into_builds(self) -> BTreeMap<String, BuildConfig> {
        self.builds
    }
}

/// Expands build templates with a fixed set of options.
#[derive(Debug, Clone, Default)]
pub struct BuildExpander {
    options: ExpandOptions,
}

impl BuildExpander {
    pub fn new(options: ExpandOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ExpandOptions {
        &self.options
    }

    /// Expand every template and merge the results in input order.
    pub fn expand(&self, templates: &[BuildTemplate]) -> TemplateResult<Expansion> {
        let mut expansion = Expansion::default();
        let mut origin: BTreeMap<String, usize> = BTreeMap::new();

        for (index, template) in templates.iter().enumerate() {
            let builds = match self.expand_template(template) {
                Ok(builds) => builds,
                Err(error) if self.options.isolate_failures => {
                    warn!("Skipping build template #{}: {}", index, error);
                    expansion.failures.push(TemplateFailure {
                        template_index: index,
                        error,
                    });
                    continue;
                }
                Err(error) => return Err(error),
            };

            for build in builds {
                let identifier = build.identifier().to_string();
                if let Some(previous) = origin.insert(identifier.clone(), index) {
                    warn!(
                        "Build '{}' from template #{} replaces the one from template #{}",
                        identifier, index, previous
                    );
                    expansion.collisions.push(Collision {
                        identifier: identifier.clone(),
                        replaced_template: previous,
                        kept_template: index,
                    });
                }
                expansion.builds.insert(identifier, build);
            }
        }

        info!(
            "Expanded {} template(s) into {} build(s)",
            templates.len(),
            expansion.builds.len()
        );
        Ok(expansion)
    }

    /// Expand a single template. Either every combination is produced or an
    /// error is returned.
    pub fn expand_template(&self, template: &BuildTemplate) -> TemplateResult<Vec<BuildConfig>> {
        let id_field = self.options.identifier_field.as_str();
        let identifier = match template.get(id_field) {
            Some(FieldValue::String(s)) => TemplateString::parse(s)?,
            Some(other) => {
                return Err(TemplateError::InvalidIdentifier {
                    field: id_field.to_string(),
                    found: other.kind().to_string(),
                });
            }
            None => return Err(TemplateError::MissingIdentifier(id_field.to_string())),
        };

        // A name repeated in the identifier is a single axis.
        let mut variables: Vec<&str> = Vec::new();
        for name in identifier.variables() {
            if !variables.contains(&name) {
                variables.push(name);
            }
        }

        let axes = variables
            .iter()
            .map(|name| self.variable_values(template, identifier.as_str(), name))
            .collect::<TemplateResult<Vec<_>>>()?;

        let skip: BTreeSet<&str> = variables.iter().copied().chain([id_field]).collect();
        let non_variables = template
            .fields()
            .iter()
            .filter(|(name, _)| !skip.contains(name.as_str()))
            .map(|(name, value)| self.non_variable(identifier.as_str(), name, value))
            .collect::<TemplateResult<Vec<_>>>()?;

        let count = axes
            .iter()
            .try_fold(1usize, |acc, values| acc.checked_mul(values.len()))
            .ok_or_else(|| TemplateError::TooManyCombinations {
                identifier: identifier.as_str().to_string(),
                count: usize::MAX,
                limit: self.options.max_combinations.unwrap_or(usize::MAX),
            })?;
        if let Some(limit) = self.options.max_combinations {
            if count > limit {
                return Err(TemplateError::TooManyCombinations {
                    identifier: identifier.as_str().to_string(),
                    count,
                    limit,
                });
            }
        }
        if count == 0 {
            warn!(
                "Build template {:?} has an empty variable list and produces no builds",
                identifier.as_str()
            );
        }
        debug!(
            "Template {:?}: {} variable(s), {} combination(s)",
            identifier.as_str(),
            variables.len(),
            count
        );

        let mut builds = Vec::with_capacity(count);
        for combination in product(&variables, &axes) {
            let mut fields = combination.clone();
            fields.insert(
                id_field.to_string(),
                FieldValue::String(identifier.format(&combination)?),
            );
            for (name, value) in &non_variables {
                let resolved = match value {
                    NonVariable::Template(t) => FieldValue::String(t.format(&combination)?),
                    NonVariable::Verbatim(v) => (*v).clone(),
                };
                fields.insert((*name).to_string(), resolved);
            }
            builds.push(BuildConfig::new(id_field, fields));
        }

        Ok(builds)
    }

    fn variable_values<'a>(
        &self,
        template: &'a BuildTemplate,
        identifier: &str,
        name: &str,
    ) -> TemplateResult<Vec<&'a FieldValue>> {
        let value = template
            .get(name)
            .ok_or_else(|| TemplateError::MissingVariable {
                variable: name.to_string(),
                identifier: identifier.to_string(),
            })?;

        match (value, self.options.variable_policy) {
            (FieldValue::List(items), _) => Ok(items.iter().collect()),
            (other, VariablePolicy::CoerceToList) => Ok(vec![other]),
            (other, VariablePolicy::RequireList) => Err(TemplateError::NotAList {
                variable: name.to_string(),
                identifier: identifier.to_string(),
                found: other.kind().to_string(),
            }),
        }
    }

    fn non_variable<'a>(
        &self,
        identifier: &str,
        name: &'a str,
        value: &'a FieldValue,
    ) -> TemplateResult<(&'a str, NonVariable<'a>)> {
        match (value, self.options.non_string_fields) {
            (FieldValue::String(s), _) => Ok((name, NonVariable::Template(TemplateString::parse(s)?))),
            (other, NonStringPolicy::PassThrough) => Ok((name, NonVariable::Verbatim(other))),
            (other, NonStringPolicy::Reject) => Err(TemplateError::NonStringField {
                field: name.to_string(),
                identifier: identifier.to_string(),
                found: other.kind().to_string(),
            }),
        }
    }
}

enum NonVariable<'a> {
    Template(TemplateString),
    Verbatim(&'a FieldValue),
}

/// Cartesian product of `axes`, zipped with `names`. The last axis varies
/// fastest. No axes yields a single empty combination.
fn product(names: &[&str], axes: &[Vec<&FieldValue>]) -> Vec<BTreeMap<String, FieldValue>> {
    let mut combinations = vec![BTreeMap::new()];

    for (name, values) in names.iter().zip(axes) {
        let mut next = Vec::with_capacity(combinations.len() * values.len());
        for combination in &combinations {
            for value in values {
                let mut extended = combination.clone();
                extended.insert((*name).to_string(), (*value).clone());
                next.push(extended);
            }
        }
        combinations = next;
    }

    combinations
}

/// Expand `templates` with the default options.
pub fn prepare_builds(templates: &[BuildTemplate]) -> TemplateResult<Expansion> {
    BuildExpander::default().expand(templates)
}
