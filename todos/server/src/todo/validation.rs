use std::collections::BTreeMap;

use crate::todo::{TodoPayload, TodoStoreError};

/// Field name to the ordered messages describing what is wrong with it.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Answers whether a title is already used by any todo of any owner.
#[async_trait::async_trait]
pub trait TitleLookup: Send + Sync {
    async fn title_exists(&self, title: &str) -> Result<bool, TodoStoreError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Title,
    Description,
}

impl Field {
    pub fn name(self) -> &'static str {
        match self {
            Field::Title => "title",
            Field::Description => "description",
        }
    }

    fn value(self, payload: &TodoPayload) -> Option<&str> {
        match self {
            Field::Title => payload.title(),
            Field::Description => payload.description(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// Present and not blank. When it fails, the field's other rules are skipped.
    Required,
    /// At least this many characters.
    MinLength(usize),
    /// Not used as the title of any existing todo.
    UniqueTitle,
}

pub type RuleSet = &'static [(Field, &'static [Rule])];

pub const CREATE_RULES: RuleSet = &[
    (
        Field::Title,
        &[Rule::Required, Rule::MinLength(3), Rule::UniqueTitle],
    ),
    (Field::Description, &[Rule::Required]),
];

/// Update does not re-check title uniqueness.
pub const UPDATE_RULES: RuleSet = &[
    (Field::Title, &[Rule::Required]),
    (Field::Description, &[Rule::Required]),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationResult {
    Valid,
    Invalid(FieldErrors),
}

/// Checks `payload` against every rule in `rules`.
///
/// Only `Rule::UniqueTitle` touches `lookup`, and only to read.
pub async fn validate<L>(
    payload: &TodoPayload,
    rules: RuleSet,
    lookup: &L,
) -> Result<ValidationResult, TodoStoreError>
where
    L: TitleLookup + ?Sized,
{
    let mut errors = FieldErrors::new();
    for &(field, field_rules) in rules {
        let messages = check_field(field, field.value(payload), field_rules, lookup).await?;
        if !messages.is_empty() {
            errors.insert(field.name().to_string(), messages);
        }
    }

    if errors.is_empty() {
        Ok(ValidationResult::Valid)
    } else {
        Ok(ValidationResult::Invalid(errors))
    }
}

async fn check_field<L>(
    field: Field,
    value: Option<&str>,
    rules: &[Rule],
    lookup: &L,
) -> Result<Vec<String>, TodoStoreError>
where
    L: TitleLookup + ?Sized,
{
    let name = field.name();
    let Some(value) = value else {
        if rules.contains(&Rule::Required) {
            return Ok(vec![format!("The {name} field is required.")]);
        }
        return Ok(Vec::new());
    };

    let mut messages = Vec::new();
    for rule in rules {
        match *rule {
            Rule::Required => {}
            Rule::MinLength(min) => {
                if value.chars().count() < min {
                    messages.push(format!("The {name} must be at least {min} characters."));
                }
            }
            Rule::UniqueTitle => {
                if lookup.title_exists(value).await? {
                    messages.push(format!("The {name} has already been taken."));
                }
            }
        }
    }
    Ok(messages)
}
