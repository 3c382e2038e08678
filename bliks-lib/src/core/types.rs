//! Deals with the value-type hierarchy and parameter specs

use derive_more::Constructor;
use serde::{Deserialize, Serialize};
use strum_macros::IntoStaticStr;

use crate::core::*;

/// the closed type hierarchy. Pointer ⊂ Number ⊂ String form a chain,
/// Name stands apart
#[derive(IntoStaticStr, Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[strum(serialize_all = "lowercase")]
pub enum ValueType {
    Pointer,
    Number,
    String,
    Name,
}

impl ValueType {
    /// static lowercase name, for diagnostics
    pub fn name(self) -> &'static str {
        self.into()
    }
}

/// true iff `sup` lies on the chain from `sub` upward
pub fn is(sub: ValueType, sup: ValueType) -> bool {
    use ValueType::*;
    match (sub, sup) {
        (Name, Name) => true,
        (Name, _) | (_, Name) => false,
        (Pointer, _) => true,
        (Number, Number) | (Number, String) => true,
        (String, String) => true,
        _ => false,
    }
}

/// most specific type of a runtime value: any integer > 0 is a pointer,
/// any other numeric reading a number, everything else a string
pub fn type_of(v: &Value) -> ValueType {
    match v.as_num() {
        Some(n) if n > 0.0 && n.fract() == 0.0 => ValueType::Pointer,
        Some(_) => ValueType::Number,
        None => ValueType::String,
    }
}

/// most specific type of a parsed token. Only Name and Literal tokens have
/// one; calling this with anything else is a bug in the resolver
pub fn type_of_token(token: &Token) -> ValueType {
    match token {
        Token::Name { .. } => ValueType::Name,
        Token::Literal { value, .. } => type_of(value),
        other => panic!("type_of_token called on a {}", other.kind_name()),
    }
}

#[derive(Constructor, Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Parameter {
    pub vtype: ValueType,
    /// fixed parameters must be supplied as literals, never as retrievals
    pub fixed: bool,
}

/// an ordered parameter sequence with its argument-count bounds
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterList {
    pub params: Vec<Parameter>,
    pub min: usize,
    /// None means a trailing variadic parameter accepts any surplus
    pub max: Option<usize>,
}

impl ParameterList {
    /// effective parameter for the i-th argument (0-based); the last
    /// parameter repeats for the variadic tail
    pub fn at(&self, i: usize) -> &Parameter {
        self.params
            .get(i)
            .or_else(|| self.params.last())
            .expect("an empty parameter list accepts no arguments")
    }
}

/// parses a whitespace-separated parameter spec. Atoms follow
/// `!? letter [?|*]` with letters p/n/s/N; `!` marks the parameter fixed,
/// `?` optional (trailing only) and `*` variadic (one, last)
pub fn parse_params(spec: &str) -> Result<ParameterList, String> {
    let mut params = vec![];
    let mut optionals = 0;
    let mut variadic = false;
    for atom in spec.split_whitespace() {
        if variadic {
            return Err(format!("parameter '{atom}' follows a variadic parameter"));
        }
        let mut rest = atom;
        let fixed = match rest.strip_prefix('!') {
            Some(r) => {
                rest = r;
                true
            }
            None => false,
        };
        let mut chars = rest.chars();
        let letter = chars
            .next()
            .ok_or_else(|| format!("malformed parameter '{atom}'"))?;
        let vtype = match letter {
            'p' => ValueType::Pointer,
            'n' => ValueType::Number,
            's' => ValueType::String,
            'N' => ValueType::Name,
            other => return Err(format!("unknown parameter type '{other}' in '{atom}'")),
        };
        match chars.as_str() {
            "" => {
                if optionals > 0 {
                    return Err(format!("required parameter '{atom}' follows an optional one"));
                }
            }
            "?" => optionals += 1,
            "*" => variadic = true,
            other => return Err(format!("malformed parameter suffix '{other}' in '{atom}'")),
        }
        params.push(Parameter::new(vtype, fixed));
    }
    let total = params.len();
    let min = total - optionals - usize::from(variadic);
    let max = if variadic { None } else { Some(total) };
    Ok(ParameterList { params, min, max })
}
