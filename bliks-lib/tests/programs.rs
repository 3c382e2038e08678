//! end-to-end runs of whole programs through the public surface

use std::sync::Arc;

use bliks_lib::vm::{Machine, Step};
use bliks_lib::{compile, report::format_error, Error};

/// runs a source to completion with preloaded inputs, collecting outputs
fn run(src: &str, inputs: &[&str]) -> Result<Vec<String>, Error> {
    let mut machine = Machine::from_source(src)?;
    for input in inputs {
        machine.push(*input);
    }
    let mut outputs = vec![];
    loop {
        match machine.step_until_output().map_err(Error::from)? {
            Step::Finished => return Ok(outputs),
            Step::Output(v) => outputs.push(v.to_string()),
            Step::AwaitingInput => panic!("program wanted more input than the test provided"),
            Step::Ran => unreachable!(),
        }
    }
}

#[test]
fn hello_world() {
    assert_eq!(run("write \"hello world\"", &[]).unwrap(), ["hello world"]);
}

#[test]
fn write_joins_with_spaces_and_writef_formats() {
    assert_eq!(run("write \"a\" 1 \"b\"", &[]).unwrap(), ["a 1 b"]);
    assert_eq!(
        run("writef \"{} plus {} is {}\" 1 2 3", &[]).unwrap(),
        ["1 plus 2 is 3"]
    );
    let err = run("writef \"{} and {}\" 1", &[]).unwrap_err();
    assert_eq!(err.to_string(), "writef: missing argument for placeholder");
}

#[test]
fn arithmetic_flows_through_registers() {
    let src = "add 1 20 21 1\n\
               sub 2 @1 2\n\
               div 3 @2 4\n\
               write @1 @2 @3";
    assert_eq!(run(src, &[]).unwrap(), ["42 40 10"]);
}

#[test]
fn seeded_macros_are_usable_values() {
    assert_eq!(run("write true", &[]).unwrap(), ["true"]);
    // pi survives the register round trip with full precision
    let out = run("set 1 pi; mul 2 @1 2; write @2", &[]).unwrap();
    assert_eq!(out, [(std::f64::consts::PI * 2.0).to_string()]);
}

#[test]
fn nested_loops_pair_their_ends() {
    let src = "set 1 0\n\
               for 1 @1 2\n\
               set 2 0\n\
               for 2 @2 2\n\
               writef \"{}.{}\" @1 @2\n\
               end\n\
               end";
    assert_eq!(
        run(src, &[]).unwrap(),
        ["1.1", "1.2", "2.1", "2.2"]
    );
}

#[test]
fn if_else_selects_a_branch() {
    let src = "pollnum 1\n\
               greater 2 @1 10\n\
               if @2\n\
               write \"big\"\n\
               stop\n\
               else\n\
               write \"small\"";
    assert_eq!(run(src, &["25"]).unwrap(), ["big"]);
    assert_eq!(run(src, &["5"]).unwrap(), ["small"]);
}

#[test]
fn string_helpers_compose() {
    let src = "set 1 \"Mixed Case\"\n\
               upper 2 @1\n\
               lower 3 @1\n\
               len 4 @1\n\
               write @2\n\
               write @3\n\
               write @4";
    assert_eq!(
        run(src, &[]).unwrap(),
        ["MIXED CASE", "mixed case", "10"]
    );
}

#[test]
fn predicates_render_true_and_empty() {
    let src = "equal 1 5 \"5\"\n\
               not 2 @1\n\
               and 3 @1 \"x\"\n\
               or 4 @2 \"\"\n\
               writef \"[{}][{}][{}][{}]\" @1 @2 @3 @4";
    assert_eq!(run(src, &[]).unwrap(), ["[true][][true][]"]);
}

#[test]
fn input_suspension_resumes_where_it_left_off() {
    let src = "poll 1; poll 2; writef \"{}+{}\" @1 @2";
    let mut machine = Machine::from_source(src).unwrap();
    assert_eq!(machine.step_until_output().unwrap(), Step::AwaitingInput);
    machine.push("a");
    assert_eq!(machine.step_until_output().unwrap(), Step::AwaitingInput);
    machine.push("b");
    match machine.step_until_output().unwrap() {
        Step::Output(v) => assert_eq!(v.to_string(), "a+b"),
        other => panic!("expected output, got {other:?}"),
    }
    assert_eq!(machine.step_until_output().unwrap(), Step::Finished);
}

#[test]
fn deep_retrievals_follow_the_chain() {
    let src = "set 3 \"payload\"\n\
               set 2 3\n\
               set 1 2\n\
               write @@@1";
    assert_eq!(run(src, &[]).unwrap(), ["payload"]);
}

#[test]
fn back_retrievals_read_through_the_first_argument() {
    // concat 2 <  is  concat 2 @2: the destination read back
    let src = "set 2 \"ab\"\n\
               concat 2 < \"c\"\n\
               write @2";
    assert_eq!(run(src, &[]).unwrap(), ["abc"]);
}

#[test]
fn runtime_type_errors_carry_the_instruction_position() {
    let src = "set 1 \"abc\"\nadd 2 @1 1";
    let err = run(src, &[]).unwrap_err();
    assert_eq!(
        err.to_string(),
        "function expects a number for argument 2, but retrieval expanded to '1' -> 'abc' (a string)"
    );
    // the position is the head of the failing line
    assert_eq!(err.position(), 13);
    let rendered = format_error(&err, src, "prog.bks");
    assert!(rendered.contains("prog.bks:2:"));
    assert!(rendered.contains("add 2 @1 1"));
}

#[test]
fn one_program_backs_many_machines_even_across_threads() {
    let program = Arc::new(compile("pollnum 1; mul 2 @1 @1; write @2").unwrap());
    let mut handles = vec![];
    for i in 1..=4i64 {
        let program = program.clone();
        handles.push(std::thread::spawn(move || {
            let mut machine = Machine::from_compiled(program);
            machine.push(i.to_string());
            let mut outputs = vec![];
            loop {
                match machine.step_until_output().unwrap() {
                    Step::Finished => return outputs,
                    Step::Output(v) => outputs.push(v.to_string()),
                    other => panic!("unexpected {other:?}"),
                }
            }
        }));
    }
    let results: Vec<Vec<String>> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(results, [["1"], ["4"], ["9"], ["16"]]);
}

#[test]
fn compile_errors_and_runtime_errors_share_one_shape() {
    let parse_err = Machine::from_source("write \"oops").unwrap_err();
    assert!(matches!(parse_err, Error::Parse(_)));
    assert_eq!(parse_err.position(), 12);

    let compile_err = Machine::from_source("nope").unwrap_err();
    assert!(matches!(compile_err, Error::Compile(_)));

    let mut machine = Machine::from_source("throw \"x\"").unwrap();
    let runtime_err = Error::from(machine.step().unwrap_err());
    assert!(matches!(runtime_err, Error::Runtime(_)));
}
