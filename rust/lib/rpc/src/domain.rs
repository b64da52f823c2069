//! Search filters ("domains").
//!
//! A domain is a list of terms in prefix (Polish) notation. Consecutive
//! conditions are implicitly ANDed by the server; `|` and `!` combine the
//! terms that follow them.
//!
//! ```
//! use openerp_rpc::{Domain, Operator};
//!
//! let males = Domain::new().filter("gender", Operator::Eq, "male");
//! assert_eq!(
//!     serde_json::to_string(&males).unwrap(),
//!     r#"[["gender","=","male"]]"#
//! );
//! ```

use std::fmt;

use serde::ser::SerializeSeq;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// Comparison operator of a domain condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
    Like,
    ILike,
    NotLike,
    NotILike,
    EqLike,
    EqILike,
    In,
    NotIn,
    ChildOf,
    ParentOf,
    /// `=?`: true when the value is unset, else `=`.
    EqOrUnset,
    /// `any`: the relational field has a record matching a sub-domain.
    Any,
    NotAny,
}

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Ne => "!=",
            Operator::Gt => ">",
            Operator::Ge => ">=",
            Operator::Lt => "<",
            Operator::Le => "<=",
            Operator::Like => "like",
            Operator::ILike => "ilike",
            Operator::NotLike => "not like",
            Operator::NotILike => "not ilike",
            Operator::EqLike => "=like",
            Operator::EqILike => "=ilike",
            Operator::In => "in",
            Operator::NotIn => "not in",
            Operator::ChildOf => "child_of",
            Operator::ParentOf => "parent_of",
            Operator::EqOrUnset => "=?",
            Operator::Any => "any",
            Operator::NotAny => "not any",
        }
    }
}

impl std::str::FromStr for Operator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let op = match s.to_lowercase().as_str() {
            "=" | "==" => Operator::Eq,
            "!=" | "<>" => Operator::Ne,
            ">" => Operator::Gt,
            ">=" => Operator::Ge,
            "<" => Operator::Lt,
            "<=" => Operator::Le,
            "like" => Operator::Like,
            "ilike" => Operator::ILike,
            "not like" => Operator::NotLike,
            "not ilike" => Operator::NotILike,
            "=like" => Operator::EqLike,
            "=ilike" => Operator::EqILike,
            "in" => Operator::In,
            "not in" => Operator::NotIn,
            "child_of" => Operator::ChildOf,
            "parent_of" => Operator::ParentOf,
            "=?" => Operator::EqOrUnset,
            "any" => Operator::Any,
            "not any" => Operator::NotAny,
            _ => return Err(format!("unknown domain operator: {}", s)),
        };
        Ok(op)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One element of a domain.
#[derive(Debug, Clone, PartialEq)]
pub enum Term {
    Condition {
        field: String,
        op: Operator,
        value: Value,
    },
    And,
    Or,
    Not,
    /// Constant leaves, `[1, "=", 1]` and `[0, "=", 1]` on the wire.
    True,
    False,
}

impl Serialize for Term {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Term::Condition { field, op, value } => {
                let mut seq = serializer.serialize_seq(Some(3))?;
                seq.serialize_element(field)?;
                seq.serialize_element(op.as_str())?;
                seq.serialize_element(value)?;
                seq.end()
            }
            Term::And => serializer.serialize_str("&"),
            Term::Or => serializer.serialize_str("|"),
            Term::Not => serializer.serialize_str("!"),
            Term::True => (1, "=", 1).serialize(serializer),
            Term::False => (0, "=", 1).serialize(serializer),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTerm {
    Logical(String),
    Condition(Value, String, Value),
}

impl<'de> Deserialize<'de> for Term {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        use serde::de::Error;

        match RawTerm::deserialize(deserializer)? {
            RawTerm::Logical(s) => match s.as_str() {
                "&" => Ok(Term::And),
                "|" => Ok(Term::Or),
                "!" => Ok(Term::Not),
                other => Err(D::Error::custom(format!("unknown logical operator: {}", other))),
            },
            RawTerm::Condition(Value::String(field), op, value) => Ok(Term::Condition {
                field,
                op: op.parse().map_err(D::Error::custom)?,
                value,
            }),
            RawTerm::Condition(left, op, right) if op == "=" && right == 1 => match left.as_i64() {
                Some(1) => Ok(Term::True),
                Some(0) => Ok(Term::False),
                _ => Err(D::Error::custom(format!("invalid domain leaf: [{}, \"=\", 1]", left))),
            },
            RawTerm::Condition(left, op, right) => Err(D::Error::custom(format!(
                "invalid domain leaf: [{}, {:?}, {}]",
                left, op, right
            ))),
        }
    }
}

/// A search filter. The empty domain matches every record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Domain(Vec<Term>);

impl Domain {
    /// Empty domain: matches all records.
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Append a condition.
    pub fn filter(mut self, field: impl Into<String>, op: Operator, value: impl Into<Value>) -> Self {
        self.0.push(Term::Condition {
            field: field.into(),
            op,
            value: value.into(),
        });
        self
    }

    /// Prefix `|`: the next two terms are ORed.
    pub fn or(mut self) -> Self {
        self.0.push(Term::Or);
        self
    }

    /// Prefix `&`. Only needed inside an `or`/`negate`; top-level terms are ANDed.
    pub fn and(mut self) -> Self {
        self.0.push(Term::And);
        self
    }

    /// Prefix `!`: negates the next term.
    pub fn negate(mut self) -> Self {
        self.0.push(Term::Not);
        self
    }

    pub fn push(&mut self, term: Term) {
        self.0.push(term);
    }

    /// Append all terms of `other` (implicit AND).
    pub fn extend(&mut self, other: Domain) {
        self.0.extend(other.0);
    }

    pub fn terms(&self) -> &[Term] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<Term>> for Domain {
    fn from(terms: Vec<Term>) -> Self {
        Self(terms)
    }
}
