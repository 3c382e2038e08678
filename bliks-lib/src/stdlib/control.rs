//! control flow scaffolding: labels, branches, loops and calls
//!
//! The compile-time halves maintain two side tables on the program. Every
//! `if`/`while`/`repeat` opens a level on its counter and records where a
//! failed test should land; `else`/`end` close the level again and place
//! the matching label. The run-time halves only ever look labels up: a
//! forward jump takes the first occurrence after the current instruction,
//! a backward jump the last one before it, which is what lets sequential
//! scopes reuse the same level names.

use crate::core::*;
use crate::stdlib::{num, rt_assert, rt_err, Library};
use crate::vm::Interface;

pub fn register(lib: &mut Library) {
    lib.compile_time("begin", "", begin_compile);
    lib.compile_time(">", "!N", label_compile);
    lib.compile_time("func", "!N", func_compile);
    lib.compile_time("let", "!N !s", let_compile);
    lib.compile_time("else", "", else_compile);
    lib.compile_time("repeat", "", repeat_compile);
    lib.two_phase("if", "s", branch_compile, skip_on_false);
    lib.two_phase("ifnot", "s", branch_compile, skip_on_true);
    lib.two_phase("while", "s", loop_head_compile, skip_on_false);
    lib.two_phase("for", "p n n n?", loop_head_compile, for_run);
    lib.two_phase("endif", "s", endif_compile, skip_on_false);
    lib.two_phase("end", "", end_compile, end_run);
    lib.two_phase("break", "", break_compile, break_run);
    lib.two_phase("continue", "", continue_compile, continue_run);
    lib.run_time("call", "!N", call_run);
    lib.run_time("return", "", return_run);
    lib.run_time("goto", "!N", goto_run);
    lib.run_time("jump", "!N", jump_run);
    lib.run_time("stop", "", stop_run);
    lib.run_time("throw", "s", throw_run);
    lib.run_time("assert", "s s?", assert_run);
    lib.run_time("===", "", boundary_run);
}

fn begin_compile(p: &mut CompiledProgram, _: &[Value]) -> Result<(), String> {
    rt_assert!(p.begin == 0, "beginning has already been defined");
    p.begin = p.cur_instruction();
    Ok(())
}

fn label_compile(p: &mut CompiledProgram, args: &[Value]) -> Result<(), String> {
    p.push_label(&args[0].to_string(), p.cur_instruction());
    Ok(())
}

fn func_compile(p: &mut CompiledProgram, args: &[Value]) -> Result<(), String> {
    let name = args[0].to_string();
    rt_assert!(
        !p.label_exists(&name),
        "cannot define function because this label already exists"
    );
    p.push_label(&name, p.cur_instruction());
    Ok(())
}

fn let_compile(p: &mut CompiledProgram, args: &[Value]) -> Result<(), String> {
    p.set_macro(&args[0].to_string(), &args[1]);
    Ok(())
}

fn branch_compile(p: &mut CompiledProgram, _: &[Value]) -> Result<(), String> {
    let level = p.if_level() + 1;
    p.set_if_level(level);
    p.set_jump_dest(p.cur_instruction(), &format!("_ELSE{level}"));
    Ok(())
}

fn else_compile(p: &mut CompiledProgram, _: &[Value]) -> Result<(), String> {
    let level = p.if_level();
    rt_assert!(level > 0, "'else' without a matching 'if'");
    p.push_label(&format!("_ELSE{level}"), p.cur_instruction());
    p.set_if_level(level - 1);
    Ok(())
}

fn repeat_compile(p: &mut CompiledProgram, _: &[Value]) -> Result<(), String> {
    let level = p.loop_level() + 1;
    p.set_loop_level(level);
    p.push_label(&format!("_LOOP{level}"), p.cur_instruction());
    Ok(())
}

/// `while` and `for`: a loop head that can also leave the loop
fn loop_head_compile(p: &mut CompiledProgram, args: &[Value]) -> Result<(), String> {
    repeat_compile(p, args)?;
    let level = p.loop_level();
    p.set_jump_dest(p.cur_instruction(), &format!("_END{level}"));
    Ok(())
}

fn endif_compile(p: &mut CompiledProgram, _: &[Value]) -> Result<(), String> {
    let level = p.loop_level();
    rt_assert!(level > 0, "'endif' outside of a loop");
    p.set_jump_dest(p.cur_instruction(), &format!("_END{level}"));
    Ok(())
}

fn end_compile(p: &mut CompiledProgram, _: &[Value]) -> Result<(), String> {
    let level = p.loop_level();
    rt_assert!(level > 0, "'end' without a matching loop");
    p.set_jump_dest(p.cur_instruction(), &format!("_LOOP{level}"));
    p.push_label(&format!("_END{level}"), p.cur_instruction() + 1);
    p.set_loop_level(level - 1);
    Ok(())
}

fn break_compile(p: &mut CompiledProgram, _: &[Value]) -> Result<(), String> {
    let level = p.loop_level();
    rt_assert!(level > 0, "'break' outside of a loop");
    p.set_jump_dest(p.cur_instruction(), &format!("_END{level}"));
    Ok(())
}

fn continue_compile(p: &mut CompiledProgram, _: &[Value]) -> Result<(), String> {
    let level = p.loop_level();
    rt_assert!(level > 0, "'continue' outside of a loop");
    p.set_jump_dest(p.cur_instruction(), &format!("_LOOP{level}"));
    Ok(())
}

/// the label this instruction was wired to at compile time
fn own_dest(itf: &Interface) -> Result<String, String> {
    itf.program
        .jump_dest(itf.cur_instruction)
        .map(str::to_owned)
        .ok_or_else(|| "a vm bug was detected: no jump destination for this instruction".to_owned())
}

/// first occurrence of the label strictly after the current instruction
fn jump_forward(itf: &mut Interface, label: &str) -> Result<(), String> {
    let indices = itf
        .program
        .label_indices(label)
        .ok_or_else(|| format!("no label named '{label}'"))?;
    let cur = itf.cur_instruction;
    let target = indices
        .into_iter()
        .find(|i| *i > cur)
        .ok_or_else(|| format!("no label named '{label}' after this instruction"))?;
    itf.next_instruction = target;
    Ok(())
}

/// greatest occurrence of the label strictly before the current instruction
fn jump_backward(itf: &mut Interface, label: &str) -> Result<(), String> {
    let indices = itf
        .program
        .label_indices(label)
        .ok_or_else(|| format!("no label named '{label}'"))?;
    let cur = itf.cur_instruction;
    let target = indices
        .into_iter()
        .filter(|i| *i < cur)
        .max()
        .ok_or_else(|| format!("no label named '{label}' before this instruction"))?;
    itf.next_instruction = target;
    Ok(())
}

fn skip_on_false(itf: &mut Interface, args: &[Value]) -> Result<(), String> {
    if !args[0].is_truthy() {
        let dest = own_dest(itf)?;
        jump_forward(itf, &dest)?;
    }
    Ok(())
}

fn skip_on_true(itf: &mut Interface, args: &[Value]) -> Result<(), String> {
    if args[0].is_truthy() {
        let dest = own_dest(itf)?;
        jump_forward(itf, &dest)?;
    }
    Ok(())
}

fn for_run(itf: &mut Interface, args: &[Value]) -> Result<(), String> {
    let i = num(&args[1])?;
    let stop = num(&args[2])?;
    let step = match args.get(3) {
        Some(v) => num(v)?,
        None => 1.0,
    };
    rt_assert!(step != 0.0, "'for' step cannot be zero");
    let next = i + step;
    itf.set_register(&args[0], Value::Num(next))?;
    if (step > 0.0 && next > stop) || (step < 0.0 && next < stop) {
        let dest = own_dest(itf)?;
        jump_forward(itf, &dest)?;
    }
    Ok(())
}

fn end_run(itf: &mut Interface, _: &[Value]) -> Result<(), String> {
    let dest = own_dest(itf)?;
    jump_backward(itf, &dest)
}

fn break_run(itf: &mut Interface, _: &[Value]) -> Result<(), String> {
    let dest = own_dest(itf)?;
    jump_forward(itf, &dest)
}

fn continue_run(itf: &mut Interface, _: &[Value]) -> Result<(), String> {
    let dest = own_dest(itf)?;
    jump_backward(itf, &dest)
}

/// jumps to a label that must occur exactly once
fn goto(itf: &mut Interface, label: &str) -> Result<(), String> {
    let indices = itf
        .program
        .label_indices(label)
        .ok_or_else(|| format!("no label named '{label}'"))?;
    rt_assert!(indices.len() == 1, "label '{label}' is ambiguous");
    itf.next_instruction = indices[0];
    Ok(())
}

fn goto_run(itf: &mut Interface, args: &[Value]) -> Result<(), String> {
    goto(itf, &args[0].to_string())
}

fn jump_run(itf: &mut Interface, args: &[Value]) -> Result<(), String> {
    jump_forward(itf, &args[0].to_string())
}

fn call_run(itf: &mut Interface, args: &[Value]) -> Result<(), String> {
    rt_assert!(itf.return_target.is_none(), "already inside a function call");
    *itf.return_target = Some(itf.cur_instruction);
    goto(itf, &args[0].to_string())
}

fn return_run(itf: &mut Interface, _: &[Value]) -> Result<(), String> {
    let target = itf
        .return_target
        .take()
        .ok_or_else(|| "'return' without a call".to_owned())?;
    itf.next_instruction = target + 1;
    Ok(())
}

fn stop_run(itf: &mut Interface, _: &[Value]) -> Result<(), String> {
    itf.next_instruction = -1;
    Ok(())
}

fn throw_run(_: &mut Interface, args: &[Value]) -> Result<(), String> {
    Err(args[0].to_string())
}

fn assert_run(_: &mut Interface, args: &[Value]) -> Result<(), String> {
    if args[0].is_truthy() {
        return Ok(());
    }
    Err(match args.get(1) {
        Some(msg) => msg.to_string(),
        None => "value was false".to_owned(),
    })
}

fn boundary_run(_: &mut Interface, _: &[Value]) -> Result<(), String> {
    rt_err!("reached a '===' boundary")
}
