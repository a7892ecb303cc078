//! Variable context for template interpolation.

use std::collections::BTreeMap;
use std::fmt;

/// A template variable recognized by the renderer.
///
/// Tokens in template text that name none of these are left untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Variable {
    /// `$personName`: the sender's display name.
    PersonName,
    /// `$br`: a line break.
    Br,
    /// `$location`: the default fishing area.
    Location,
    /// `$fishName`
    FishName,
    /// `$fishWeight`, in kilograms.
    FishWeight,
    /// `$fishLength`, in meters.
    FishLength,
    /// `$locationName`: the reverse-geocoded place of the last shared location.
    LocationName,
}

impl Variable {
    /// Every variable, in declaration order.
    pub const ALL: [Variable; 7] = [
        Variable::PersonName,
        Variable::Br,
        Variable::Location,
        Variable::FishName,
        Variable::FishWeight,
        Variable::FishLength,
        Variable::LocationName,
    ];

    /// The token as written in templates, including the `$` sigil.
    #[must_use]
    pub const fn token(self) -> &'static str {
        match self {
            Self::PersonName => "$personName",
            Self::Br => "$br",
            Self::Location => "$location",
            Self::FishName => "$fishName",
            Self::FishWeight => "$fishWeight",
            Self::FishLength => "$fishLength",
            Self::LocationName => "$locationName",
        }
    }

    /// Looks up a variable by its exact token.
    #[must_use]
    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|v| v.token() == token)
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// Values available for interpolation while rendering one message.
///
/// A variable that was never set is distinct from one set to the empty
/// string: the former leaves its token in the output, the latter removes it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariableContext {
    values: BTreeMap<Variable, String>,
}

impl VariableContext {
    /// Creates an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a variable, returning the context.
    #[must_use]
    pub fn with(mut self, variable: Variable, value: impl Into<String>) -> Self {
        self.set(variable, value);
        self
    }

    /// Sets a variable.
    pub fn set(&mut self, variable: Variable, value: impl Into<String>) {
        self.values.insert(variable, value.into());
    }

    /// Sets a variable when a value is present; `None` leaves it as it was.
    pub fn set_opt(&mut self, variable: Variable, value: Option<impl Into<String>>) {
        if let Some(value) = value {
            self.set(variable, value);
        }
    }

    /// Clears a variable back to unset.
    pub fn unset(&mut self, variable: Variable) {
        self.values.remove(&variable);
    }

    #[must_use]
    pub fn get(&self, variable: Variable) -> Option<&str> {
        self.values.get(&variable).map(String::as_str)
    }

    #[must_use]
    pub fn is_set(&self, variable: Variable) -> bool {
        self.values.contains_key(&variable)
    }

    /// Resolves a raw `$token` to its value, if the token names a set variable.
    #[must_use]
    pub fn resolve_token(&self, token: &str) -> Option<&str> {
        Variable::from_token(token).and_then(|v| self.get(v))
    }
}
