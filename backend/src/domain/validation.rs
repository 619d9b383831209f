//! Field validation and the human-readable violation formatter.
//!
//! Request bodies and configuration sections implement [`Validate`] by
//! feeding their fields through a [`Violations`] collector. The resulting
//! [`ValidationErrors`] renders one sentence per violated field, joined with
//! `, `, with field identifiers converted to `snake_case`.

use std::fmt;

use heck::ToSnakeCase;

/// Constraint a field can violate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rule {
    /// Value must be present and non-empty.
    Required,
    /// Value must equal its lowercase form.
    Lowercase,
    /// Value must equal its uppercase form.
    Uppercase,
    /// Every word must start with an uppercase letter.
    Capitalized,
    /// Value must not contain spaces.
    NoWhitespace,
    /// Length must be at least the parameter.
    Min,
    /// Length must be at most the parameter.
    Max,
    /// Value must end with the parameter.
    Suffix,
    /// Value must be one of the space separated options in the parameter.
    OneOf,
    /// Each comma separated item must be one of the space separated options.
    CommaItemIn,
    /// Any rule without a dedicated phrasing.
    Other(String),
}

impl Rule {
    /// Short identifier for the rule, as used in logs.
    pub fn tag(&self) -> &str {
        match self {
            Self::Required => "required",
            Self::Lowercase => "lowercase",
            Self::Uppercase => "uppercase",
            Self::Capitalized => "capitalized",
            Self::NoWhitespace => "whitespace",
            Self::Min => "min",
            Self::Max => "max",
            Self::Suffix => "endswith",
            Self::OneOf => "oneof",
            Self::CommaItemIn => "commaItemIn",
            Self::Other(tag) => tag,
        }
    }

    /// Whether `value` satisfies the rule with the given parameter.
    ///
    /// Length rules count characters; a parameter that does not parse as a
    /// number never matches. `Other` rules cannot be checked here and always
    /// fail.
    pub fn check(&self, value: &str, param: &str) -> bool {
        match self {
            Self::Required => !value.is_empty(),
            Self::Lowercase => value == value.to_lowercase(),
            Self::Uppercase => value == value.to_uppercase(),
            Self::Capitalized => value.split_whitespace().all(|word| {
                word.chars()
                    .next()
                    .is_none_or(|first| !first.is_lowercase())
            }),
            Self::NoWhitespace => !value.contains(' '),
            Self::Min => param
                .parse::<usize>()
                .is_ok_and(|min| value.chars().count() >= min),
            Self::Max => param
                .parse::<usize>()
                .is_ok_and(|max| value.chars().count() <= max),
            Self::Suffix => value.ends_with(param),
            Self::OneOf => param.split_whitespace().any(|option| option == value),
            Self::CommaItemIn => {
                value.is_empty()
                    || value
                        .split(',')
                        .all(|item| param.split_whitespace().any(|option| option == item))
            }
            Self::Other(_) => false,
        }
    }
}

/// One violated rule on one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    field: String,
    rule: Rule,
    param: String,
}

impl FieldViolation {
    /// Record that `field` violates `rule` with `param`.
    pub fn new(field: impl Into<String>, rule: Rule, param: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            rule,
            param: param.into(),
        }
    }

    /// Field identifier as declared by the validated type.
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Violated rule.
    pub fn rule(&self) -> &Rule {
        &self.rule
    }

    /// Rule parameter, empty for rules without one.
    pub fn param(&self) -> &str {
        &self.param
    }

    /// Render the sentence for this violation.
    pub fn message(&self) -> String {
        let field = self.field.to_snake_case();
        let param = &self.param;
        match &self.rule {
            Rule::Required => format!("'{field}' is required"),
            Rule::Lowercase => format!("'{field}' must be lowercase"),
            Rule::Uppercase => format!("'{field}' must be uppercase"),
            Rule::Capitalized => format!("'{field}' must be capitalized"),
            Rule::NoWhitespace => format!("'{field}' cannot have whitespace"),
            Rule::Min => format!("'{field}' must be greater than or equal to {param}"),
            Rule::Max => format!("'{field}' must be less than or equal to {param}"),
            Rule::Suffix => format!("'{field}' must end with {param}"),
            Rule::OneOf => {
                let options: Vec<&str> = param.split_whitespace().collect();
                format!("'{field}' must be one of {}", options.join(" / "))
            }
            Rule::CommaItemIn => format!("'{field}' csv format item must be one of {param}"),
            Rule::Other(tag) => format!("'{field}' does not satisfy {tag}"),
        }
    }
}

/// Non-empty list of field violations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrors {
    violations: Vec<FieldViolation>,
}

impl ValidationErrors {
    /// Wrap `violations`, returning `None` when the list is empty.
    pub fn from_violations(violations: Vec<FieldViolation>) -> Option<Self> {
        if violations.is_empty() {
            None
        } else {
            Some(Self { violations })
        }
    }

    /// Violations in the order they were found.
    pub fn violations(&self) -> &[FieldViolation] {
        &self.violations
    }

    /// Human-readable message: one sentence per violation joined with `, `.
    ///
    /// # Examples
    /// ```
    /// use account_service::domain::validation::{FieldViolation, Rule, ValidationErrors};
    ///
    /// let errors = ValidationErrors::from_violations(vec![
    ///     FieldViolation::new("AppID", Rule::Required, ""),
    ///     FieldViolation::new("env", Rule::OneOf, "dev prod"),
    /// ])
    /// .expect("non-empty");
    /// assert_eq!(
    ///     errors.message(),
    ///     "'app_id' is required, 'env' must be one of dev / prod"
    /// );
    /// ```
    pub fn message(&self) -> String {
        self.violations
            .iter()
            .map(FieldViolation::message)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

impl std::error::Error for ValidationErrors {}

/// Types that can check their own field constraints.
pub trait Validate {
    /// Check every field, reporting all violations at once.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationErrors`] when at least one field is invalid.
    fn validate(&self) -> Result<(), ValidationErrors>;
}

/// Collector used by [`Validate`] implementations.
#[derive(Debug, Default)]
pub struct Violations {
    found: Vec<FieldViolation>,
}

impl Violations {
    /// Start an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check `value` against `rule`, recording a violation when it fails.
    pub fn check(&mut self, field: &str, value: &str, rule: Rule, param: &str) -> &mut Self {
        if !rule.check(value, param) {
            self.found.push(FieldViolation::new(field, rule, param));
        }
        self
    }

    /// Record a violation of `rule` unless `satisfied`.
    ///
    /// For constraints checked outside [`Rule::check`], such as
    /// [`Rule::Other`] rules.
    pub fn ensure(&mut self, field: &str, satisfied: bool, rule: Rule, param: &str) -> &mut Self {
        if !satisfied {
            self.found.push(FieldViolation::new(field, rule, param));
        }
        self
    }

    /// Shorthand for a [`Rule::Required`] check.
    pub fn require(&mut self, field: &str, value: &str) -> &mut Self {
        self.check(field, value, Rule::Required, "")
    }

    /// Finish, yielding an error when anything was recorded.
    ///
    /// # Errors
    ///
    /// Returns the collected [`ValidationErrors`].
    pub fn finish(&mut self) -> Result<(), ValidationErrors> {
        match ValidationErrors::from_violations(std::mem::take(&mut self.found)) {
            Some(errors) => Err(errors),
            None => Ok(()),
        }
    }
}
