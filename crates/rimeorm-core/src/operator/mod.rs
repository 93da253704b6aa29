use std::{
    borrow::Borrow,
    collections::HashSet,
    fmt,
    sync::{LazyLock, PoisonError, RwLock},
};
use thiserror::Error as ThisError;

///
/// Operator registry
///
/// Operators are interned `$`-prefixed tokens with value equality, grouped
/// into arithmetic, comparison, and logic registries. Groups are append-only:
/// dialects may register extension operators (e.g. `$like`) but nothing is
/// ever removed, so compiled queries stay stable for the process lifetime.
///

/// Every operator token starts with this sigil.
pub const OPERATOR_PREFIX: char = '$';


///
/// OperatorError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum OperatorError {
    #[error("operator token must start with '{OPERATOR_PREFIX}': '{token}'")]
    InvalidToken { token: String },

    #[error("operator '{token}' is already registered in the {group} group")]
    AlreadyRegistered { token: String, group: &'static str },

    #[error("operator '{token}' has no negation")]
    NoNegation { token: String },
}

///
/// Operator
///
/// A token wrapper, not an enum: dialects can mint new operators at runtime,
/// so the set is open. Tokens are interned, which keeps the type `Copy` and
/// comparison a pointer-width equality check.
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Operator(&'static str);

// arithmetic
pub const ADD: Operator = Operator("$add");
pub const SUB: Operator = Operator("$sub");
pub const MUL: Operator = Operator("$mul");
pub const TRUEDIV: Operator = Operator("$truediv");
pub const FLOORDIV: Operator = Operator("$floordiv");
pub const MOD: Operator = Operator("$mod");

// comparison
pub const GT: Operator = Operator("$gt");
pub const GTE: Operator = Operator("$gte");
pub const LT: Operator = Operator("$lt");
pub const LTE: Operator = Operator("$lte");
pub const EQ: Operator = Operator("$eq");
pub const NE: Operator = Operator("$ne");
pub const IN: Operator = Operator("$in");
pub const NIN: Operator = Operator("$nin");
pub const REGEX: Operator = Operator("$regex");

// logic
pub const AND: Operator = Operator("$and");
pub const OR: Operator = Operator("$or");

const BUILTINS: [Operator; 17] = [
    ADD, SUB, MUL, TRUEDIV, FLOORDIV, MOD, GT, GTE, LT, LTE, EQ, NE, IN, NIN, REGEX, AND, OR,
];

static INTERNED: LazyLock<RwLock<HashSet<&'static str>>> = LazyLock::new(|| {
    RwLock::new(BUILTINS.iter().map(|op| op.0).collect())
});

impl Operator {
    // equality is by token value, so a non-interned constant is safe
    pub(crate) const fn from_static(token: &'static str) -> Self {
        Self(token)
    }

    /// Parse a token into an interned operator.
    ///
    /// Parsing alone does not register the operator with any group; an
    /// unregistered operator fails at compile time, not here.
    pub fn parse(token: &str) -> Result<Self, OperatorError> {
        if !token.starts_with(OPERATOR_PREFIX) {
            return Err(OperatorError::InvalidToken {
                token: token.to_string(),
            });
        }
        Ok(Self(intern(token)))
    }

    #[must_use]
    pub const fn token(self) -> &'static str {
        self.0
    }

    /// The operator with inverted meaning, where one exists.
    pub fn negated(self) -> Result<Self, OperatorError> {
        let negated = match self {
            GT => LTE,
            GTE => LT,
            LT => GTE,
            LTE => GT,
            EQ => NE,
            NE => EQ,
            IN => NIN,
            NIN => IN,
            AND => OR,
            OR => AND,
            _ => {
                return Err(OperatorError::NoNegation {
                    token: self.0.to_string(),
                });
            }
        };

        Ok(negated)
    }
}

impl Borrow<str> for Operator {
    fn borrow(&self) -> &str {
        self.0
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

fn intern(token: &str) -> &'static str {
    {
        let interned = INTERNED.read().unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = interned.get(token) {
            return existing;
        }
    }

    let mut interned = INTERNED.write().unwrap_or_else(PoisonError::into_inner);
    if let Some(existing) = interned.get(token) {
        return existing;
    }
    let leaked: &'static str = Box::leak(token.to_string().into_boxed_str());
    interned.insert(leaked);

    leaked
}

///
/// OperatorGroup
///
/// An append-only named set of operators. Membership checks are O(1); the
/// token-keyed lookup serves document parsing, where only the `$token`
/// spelling is known.
///

#[derive(Debug)]
pub struct OperatorGroup {
    name: &'static str,
    members: RwLock<HashSet<Operator>>,
}

impl OperatorGroup {
    fn new(name: &'static str, builtins: &[Operator]) -> Self {
        Self {
            name,
            members: RwLock::new(builtins.iter().copied().collect()),
        }
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    #[must_use]
    pub fn contains(&self, op: Operator) -> bool {
        self.members
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&op)
    }

    /// Look up a member by token. A missing `$` prefix is supplied.
    #[must_use]
    pub fn get(&self, token: &str) -> Option<Operator> {
        let members = self.members.read().unwrap_or_else(PoisonError::into_inner);
        if token.starts_with(OPERATOR_PREFIX) {
            members.get(token).copied()
        } else {
            members.get(format!("{OPERATOR_PREFIX}{token}").as_str()).copied()
        }
    }

    /// Add operators to the group. Registering a member twice is an error:
    /// group contents decide compilation, so a collision is a program bug.
    pub fn registers(&self, ops: &[Operator]) -> Result<(), OperatorError> {
        let mut members = self.members.write().unwrap_or_else(PoisonError::into_inner);
        for op in ops {
            if !members.insert(*op) {
                return Err(OperatorError::AlreadyRegistered {
                    token: op.0.to_string(),
                    group: self.name,
                });
            }
        }

        Ok(())
    }

    /// Like [`registers`](Self::registers), but tolerant of members that are
    /// already present. Used for idempotent setup paths.
    pub fn extend(&self, ops: &[Operator]) {
        let mut members = self.members.write().unwrap_or_else(PoisonError::into_inner);
        for op in ops {
            members.insert(*op);
        }
    }

    #[must_use]
    pub fn members(&self) -> Vec<Operator> {
        self.members
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .copied()
            .collect()
    }
}

pub static ARITHMETIC: LazyLock<OperatorGroup> = LazyLock::new(|| {
    OperatorGroup::new("arithmetic", &[ADD, SUB, MUL, TRUEDIV, FLOORDIV, MOD])
});

pub static COMPARE: LazyLock<OperatorGroup> = LazyLock::new(|| {
    OperatorGroup::new("compare", &[GT, GTE, LT, LTE, EQ, NE, IN, NIN, REGEX])
});

pub static LOGIC: LazyLock<OperatorGroup> =
    LazyLock::new(|| OperatorGroup::new("logic", &[AND, OR]));

/// Resolve a token against all three groups.
///
/// Document parsing uses this to tell operator keys from field keys; an
/// operator that was parsed but never grouped is invisible here.
#[must_use]
pub fn registered(token: &str) -> Option<Operator> {
    if !token.starts_with(OPERATOR_PREFIX) {
        return None;
    }
    COMPARE
        .get(token)
        .or_else(|| LOGIC.get(token))
        .or_else(|| ARITHMETIC.get(token))
}
