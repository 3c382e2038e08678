//! resolves parsed instruction lines into a [`CompiledProgram`]
//!
//! Resolution is a single forward pass. Each line is checked against its
//! function's parameter list, back retrievals are lowered into ordinary
//! retrievals, macros are substituted, and compile-time behaviors run with
//! the in-progress program so they can place labels and jump destinations.
//! The first error aborts the pass.

use std::result::Result as StdResult;
use thiserror::Error;

use crate::core::*;
use crate::expand;
use crate::stdlib::Library;

pub type Result<T> = StdResult<T, Error>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("expected function name, got a {kind}")]
    ExpectedFunctionName { kind: &'static str, pos: usize },

    #[error("no such function '{name}'")]
    NoSuchFunction { name: String, pos: usize },

    #[error("function '{name}' takes at least {min} arguments, but got {got}")]
    TooFewArguments {
        name: String,
        min: usize,
        got: usize,
        pos: usize,
    },

    #[error("function '{name}' takes at most {max} arguments, but got {got}")]
    TooManyArguments {
        name: String,
        max: usize,
        got: usize,
        pos: usize,
    },

    #[error("the first argument cannot be a back retrieval")]
    BackRetrievalFirst { pos: usize },

    #[error("a back retrieval cannot sit inside a retrieval")]
    NestedBackRetrieval { pos: usize },

    #[error("macro '{name}' is not defined")]
    UndefinedMacro { name: String, pos: usize },

    #[error("cannot retrieve from '{value}' (a {vtype}), expected a pointer")]
    RetrievalTarget {
        value: String,
        vtype: &'static str,
        pos: usize,
    },

    #[error("function expects a {expected} for argument {index}, but got '{value}' (a {vtype})")]
    TypeMismatch {
        expected: &'static str,
        index: usize,
        value: String,
        vtype: &'static str,
        pos: usize,
    },

    #[error("argument {index} cannot be a retrieval")]
    FixedRetrieval { index: usize, pos: usize },

    #[error("{msg}")]
    Behavior { msg: String, pos: usize },
}

impl Error {
    /// 1-based byte offset into the source
    pub fn position(&self) -> usize {
        match self {
            Error::ExpectedFunctionName { pos, .. }
            | Error::NoSuchFunction { pos, .. }
            | Error::TooFewArguments { pos, .. }
            | Error::TooManyArguments { pos, .. }
            | Error::BackRetrievalFirst { pos }
            | Error::NestedBackRetrieval { pos }
            | Error::UndefinedMacro { pos, .. }
            | Error::RetrievalTarget { pos, .. }
            | Error::TypeMismatch { pos, .. }
            | Error::FixedRetrieval { pos, .. }
            | Error::Behavior { pos, .. } => *pos,
        }
    }
}

/// resolves parsed lines against a library
pub fn resolve(lines: Vec<Vec<Token>>, library: &Library) -> Result<CompiledProgram> {
    let mut program = CompiledProgram::default();
    seed_macros(&mut program);
    for line in lines {
        resolve_line(&mut program, line, library)?;
    }
    if program.begin == 0 {
        program.begin = 1;
    }
    program.strip_temp_keys();
    Ok(program)
}

fn seed_macros(program: &mut CompiledProgram) {
    use std::f64::consts;
    program.set_macro("pi", &Value::Num(consts::PI));
    program.set_macro("e", &Value::Num(consts::E));
    program.set_macro("inf", &Value::Num(f64::INFINITY));
    program.set_macro("ninf", &Value::Num(f64::NEG_INFINITY));
    program.set_macro("true", &Value::from("true"));
    program.set_macro("false", &Value::from(""));
    for i in 1..=4i64 {
        program.set_macro(&format!("_{i}"), &Value::Num(i as f64));
    }
}

fn resolve_line(program: &mut CompiledProgram, line: Vec<Token>, library: &Library) -> Result<()> {
    let mut tokens = line.into_iter();
    let head = tokens.next().expect("the parser drops empty lines");
    let head_kind = head.kind_name();
    let fallback_pos = head.pos();
    let Token::Name {
        text: func_name,
        pos: head_pos,
    } = head
    else {
        return Err(Error::ExpectedFunctionName {
            kind: head_kind,
            pos: fallback_pos,
        });
    };
    let desc = library.get(&func_name).ok_or_else(|| Error::NoSuchFunction {
        name: func_name.clone(),
        pos: head_pos,
    })?;
    let mut args: Vec<Token> = tokens.collect();

    let params = &desc.params;
    if args.len() < params.min {
        return Err(Error::TooFewArguments {
            name: func_name,
            min: params.min,
            got: args.len(),
            pos: head_pos,
        });
    }
    if let Some(max) = params.max {
        if args.len() > max {
            return Err(Error::TooManyArguments {
                name: func_name,
                max,
                got: args.len(),
                pos: head_pos,
            });
        }
    }

    lower_back_retrievals(&mut args)?;
    expand_macros(program, &mut args, params)?;
    check_retrievals(&args)?;
    check_literals(&args, params)?;
    check_fixed(&args, params)?;
    let args = build_arguments(args, params);

    if let Some(compile) = desc.compile {
        program.set_cur_instruction(program.instructions.len() as i64 + 1);
        let values = expand::expand_for_compile(&args).map_err(|msg| Error::Behavior {
            msg,
            pos: head_pos,
        })?;
        compile(program, &values).map_err(|msg| Error::Behavior {
            msg,
            pos: head_pos,
        })?;
    }
    if desc.run.is_some() {
        let num = program.instructions.len() as i64 + 1;
        program.instructions.push(Instruction {
            func: func_name,
            args,
            num,
            pos: head_pos,
        });
    }
    Ok(())
}

/// replaces every `<` after the first argument with a retrieval of the
/// first argument, one level deeper
fn lower_back_retrievals(args: &mut [Token]) -> Result<()> {
    let Some(first) = args.first() else {
        return Ok(());
    };
    if let Token::BackRetrieval { pos } = *first {
        return Err(Error::BackRetrievalFirst { pos });
    }
    let (payload, depth) = match first {
        Token::Retrieval { inner, depth, .. } => {
            if let Token::BackRetrieval { pos } = **inner {
                return Err(Error::NestedBackRetrieval { pos });
            }
            ((**inner).clone(), *depth)
        }
        other => (other.clone(), 0),
    };
    for arg in args.iter_mut().skip(1) {
        if let Token::BackRetrieval { pos } = *arg {
            *arg = Token::Retrieval {
                depth: depth + 1,
                inner: Box::new(payload.clone()),
                pos,
            };
        }
    }
    Ok(())
}

/// substitutes macros for names sitting at positions that do not expect a
/// name; names nested in retrievals always expand
fn expand_macros(
    program: &CompiledProgram,
    args: &mut [Token],
    params: &ParameterList,
) -> Result<()> {
    for (i, arg) in args.iter_mut().enumerate() {
        match arg {
            Token::Name { text, pos } if params.at(i).vtype != ValueType::Name => {
                let pos = *pos;
                let value = lookup_macro(program, text, pos)?;
                *arg = Token::Literal { value, pos };
            }
            Token::Retrieval { inner, .. } => {
                if let Token::Name { text, pos } = &**inner {
                    let pos = *pos;
                    let value = lookup_macro(program, text, pos)?;
                    **inner = Token::Literal { value, pos };
                }
            }
            _ => {}
        }
    }
    Ok(())
}

fn lookup_macro(program: &CompiledProgram, name: &str, pos: usize) -> Result<Value> {
    program
        .macro_value(name)
        .ok_or_else(|| Error::UndefinedMacro {
            name: name.to_owned(),
            pos,
        })
}

/// every retrieval must start from a pointer
fn check_retrievals(args: &[Token]) -> Result<()> {
    for arg in args {
        if let Token::Retrieval { inner, .. } = arg {
            let t = type_of_token(inner);
            if !is(t, ValueType::Pointer) {
                let value = match &**inner {
                    Token::Literal { value, .. } => value.to_string(),
                    Token::Name { text, .. } => text.clone(),
                    other => other.kind_name().to_owned(),
                };
                return Err(Error::RetrievalTarget {
                    value,
                    vtype: t.name(),
                    pos: inner.pos(),
                });
            }
        }
    }
    Ok(())
}

fn check_literals(args: &[Token], params: &ParameterList) -> Result<()> {
    for (i, arg) in args.iter().enumerate() {
        if let Token::Literal { value, pos } = arg {
            let expected = params.at(i).vtype;
            let t = type_of(value);
            if !is(t, expected) {
                return Err(Error::TypeMismatch {
                    expected: expected.name(),
                    index: i + 1,
                    value: value.to_string(),
                    vtype: t.name(),
                    pos: *pos,
                });
            }
        }
    }
    Ok(())
}

fn check_fixed(args: &[Token], params: &ParameterList) -> Result<()> {
    for (i, arg) in args.iter().enumerate() {
        if params.at(i).fixed && matches!(arg, Token::Retrieval { .. }) {
            return Err(Error::FixedRetrieval {
                index: i + 1,
                pos: arg.pos(),
            });
        }
    }
    Ok(())
}

fn build_arguments(args: Vec<Token>, params: &ParameterList) -> Vec<Argument> {
    args.into_iter()
        .enumerate()
        .map(|(i, token)| {
            let expected = params.at(i).vtype;
            match token {
                Token::Name { text, pos } => Argument {
                    kind: ArgKind::Value,
                    expected,
                    value: Value::Str(text),
                    depth: 0,
                    pos,
                },
                Token::Literal { value, pos } => Argument {
                    kind: ArgKind::Value,
                    expected,
                    value,
                    depth: 0,
                    pos,
                },
                Token::Retrieval { depth, inner, pos } => {
                    let value = match *inner {
                        Token::Literal { value, .. } => value,
                        _ => unreachable!("retrieval payloads are literals after macro expansion"),
                    };
                    Argument {
                        kind: ArgKind::Retrieval,
                        expected,
                        value,
                        depth,
                        pos,
                    }
                }
                Token::BackRetrieval { .. } => {
                    unreachable!("back retrievals are lowered before argument construction")
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser;
    use crate::standard_library;

    fn compile(src: &str) -> Result<CompiledProgram> {
        resolve(parser::parse(src).unwrap(), &standard_library())
    }

    #[test]
    fn an_empty_source_compiles_to_an_empty_program() {
        let p = compile("").unwrap();
        assert!(p.instructions.is_empty());
        assert_eq!(p.begin, 1);
    }

    #[test]
    fn macros_labels_and_begin_cooperate() {
        let p = compile("let a 3; > nice; set a 5; begin; max a a @a < @@@6 2").unwrap();
        assert_eq!(p.begin, 2);
        assert_eq!(p.instructions.len(), 2);
        assert_eq!(p.instructions[0].func, "set");
        assert_eq!(p.instructions[1].func, "max");
        // "set a 5" became "set 3 5" through the macro
        assert_eq!(p.instructions[0].args[0].value, Value::Num(3.0));
        assert_eq!(p.label_indices("nice"), Some(vec![1]));
    }

    #[test]
    fn back_retrievals_lower_to_deeper_retrievals_of_the_first_argument() {
        let p = compile("add @@1 < <").unwrap();
        let args = &p.instructions[0].args;
        assert_eq!(args.len(), 3);
        let depths: Vec<u32> = args.iter().map(|a| a.depth).collect();
        assert_eq!(depths, vec![2, 3, 3]);
        for arg in args {
            assert_eq!(arg.kind, ArgKind::Retrieval);
            assert_eq!(arg.value, Value::Num(1.0));
        }
    }

    #[test]
    fn a_literal_first_argument_backs_up_at_depth_one() {
        let p = compile("max 3 3 <").unwrap();
        let args = &p.instructions[0].args;
        assert_eq!(args[2].kind, ArgKind::Retrieval);
        assert_eq!(args[2].depth, 1);
        assert_eq!(args[2].value, Value::Num(3.0));
    }

    #[test]
    fn undefined_macros_are_reported_at_their_position() {
        let err = compile("> hi; tonum 1 hi").unwrap_err();
        assert_eq!(
            err,
            Error::UndefinedMacro {
                name: "hi".into(),
                pos: 15
            }
        );
    }

    #[test]
    fn literal_types_must_satisfy_the_parameter() {
        let err = compile("add 3.2 3 3").unwrap_err();
        assert_eq!(
            err.to_string(),
            "function expects a pointer for argument 1, but got '3.2' (a number)"
        );
        assert_eq!(err.position(), 5);
    }

    #[test]
    fn the_first_argument_cannot_be_a_back_retrieval() {
        let err = compile("add < 2 3").unwrap_err();
        assert_eq!(
            err.to_string(),
            "the first argument cannot be a back retrieval"
        );
    }

    #[test]
    fn retrievals_must_start_from_a_pointer() {
        let err = compile("write @\"x\"").unwrap_err();
        assert!(matches!(err, Error::RetrievalTarget { .. }), "{err:?}");
        let err = compile("let a 3.5; write @a").unwrap_err();
        assert!(matches!(err, Error::RetrievalTarget { .. }), "{err:?}");
    }

    #[test]
    fn fixed_parameters_reject_retrievals() {
        let err = compile("let a @1").unwrap_err();
        assert_eq!(err.to_string(), "argument 2 cannot be a retrieval");
    }

    #[test]
    fn heads_must_be_known_function_names() {
        assert_eq!(
            compile("3 4").unwrap_err().to_string(),
            "expected function name, got a literal"
        );
        assert_eq!(
            compile("@1 4").unwrap_err().to_string(),
            "expected function name, got a retrieval"
        );
        assert_eq!(
            compile("frobnicate 4").unwrap_err().to_string(),
            "no such function 'frobnicate'"
        );
    }

    #[test]
    fn arity_is_checked_against_the_parameter_bounds() {
        assert_eq!(
            compile("add 1").unwrap_err().to_string(),
            "function 'add' takes at least 3 arguments, but got 1"
        );
        assert_eq!(
            compile("sub 1 2 3 4").unwrap_err().to_string(),
            "function 'sub' takes at most 3 arguments, but got 4"
        );
    }

    #[test]
    fn begin_can_only_be_defined_once() {
        let err = compile("begin; write \"x\"; begin").unwrap_err();
        assert_eq!(err.to_string(), "beginning has already been defined");
    }

    #[test]
    fn else_needs_a_matching_if() {
        let err = compile("else").unwrap_err();
        assert_eq!(err.to_string(), "'else' without a matching 'if'");
    }

    #[test]
    fn end_needs_a_matching_loop() {
        let err = compile("end").unwrap_err();
        assert_eq!(err.to_string(), "'end' without a matching loop");
        let err = compile("break").unwrap_err();
        assert_eq!(err.to_string(), "'break' outside of a loop");
    }

    #[test]
    fn functions_must_not_collide_with_existing_labels() {
        let err = compile("> f; func f").unwrap_err();
        assert_eq!(
            err.to_string(),
            "cannot define function because this label already exists"
        );
    }

    #[test]
    fn loops_scaffold_their_labels_and_jump_destinations() {
        // 1: while, 2: write, 3: end
        let p = compile("set 1 \"x\"; while @1; write \"y\"; end").unwrap();
        assert_eq!(p.label_indices("_LOOP1"), Some(vec![2]));
        // the end label points one past `end`, at the loop's exit
        assert_eq!(p.label_indices("_END1"), Some(vec![5]));
        assert_eq!(p.jump_dest(2), Some("_END1"));
        assert_eq!(p.jump_dest(4), Some("_LOOP1"));
        // the resolver's own bookkeeping is gone
        assert_eq!(p.cur_instruction(), 0);
        assert_eq!(p.macro_value("pi"), None);
    }

    #[test]
    fn nested_ifs_pair_by_level() {
        let p = compile("if \"a\"; if \"b\"; else; else").unwrap();
        // instructions: if(1) if(2); the elses emit nothing
        assert_eq!(p.jump_dest(1), Some("_ELSE1"));
        assert_eq!(p.jump_dest(2), Some("_ELSE2"));
        assert_eq!(p.label_indices("_ELSE2"), Some(vec![3]));
        assert_eq!(p.label_indices("_ELSE1"), Some(vec![3]));
    }

    #[test]
    fn seeded_macros_expand_to_their_values() {
        let p = compile("set _2 true; set _3 false; set _4 pi").unwrap();
        assert_eq!(p.instructions[0].args[0].value, Value::Num(2.0));
        assert_eq!(p.instructions[0].args[1].value, Value::from("true"));
        assert_eq!(p.instructions[1].args[1].value, Value::from(""));
        assert_eq!(
            p.instructions[2].args[1].value,
            Value::Num(std::f64::consts::PI)
        );
    }
}
