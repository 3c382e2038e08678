//! parsed source tokens. All positions are 1-based byte offsets into the
//! original source

use serde::{Deserialize, Serialize};

use crate::core::*;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum Token {
    Name {
        text: String,
        pos: usize,
    },
    Literal {
        value: Value,
        pos: usize,
    },
    /// `@@x`: depth counts the `@` signs, the inner token is a Name or a
    /// Literal. The position is that of the leading `@`; the inner token
    /// keeps its own
    Retrieval {
        depth: u32,
        inner: Box<Token>,
        pos: usize,
    },
    /// a lone `<`
    BackRetrieval { pos: usize },
}

impl Token {
    pub fn pos(&self) -> usize {
        match self {
            Token::Name { pos, .. }
            | Token::Literal { pos, .. }
            | Token::Retrieval { pos, .. }
            | Token::BackRetrieval { pos } => *pos,
        }
    }

    /// human name of the token kind, for diagnostics
    pub fn kind_name(&self) -> &'static str {
        match self {
            Token::Name { .. } => "name",
            Token::Literal { .. } => "literal",
            Token::Retrieval { .. } => "retrieval",
            Token::BackRetrieval { .. } => "back retrieval",
        }
    }
}
