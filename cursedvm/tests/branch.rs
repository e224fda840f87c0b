//! `branch`/`call` (class 6): relative/absolute jumps, conditional branching,
//! the call stack, and external calls through an `Ext` handle.
//!
//! `$0`-`$2` are `ZERO`/`COMP`/`PC`; every scratch register below starts at
//! `$3` to avoid stomping on them.

mod common;

use common::{loaded, run};
use cursedvm::{Binding, HostArg, Value};

#[test]
fn relative_immediate_branch_skips_the_next_instruction() {
    let v = run(
        "
        b.i #2
        exit.i #111
        exit.i #222
        ",
    )
    .unwrap();
    assert_eq!(v, Value::Int(222));
}

#[test]
fn conditional_branch_taken_when_comp_is_nonzero() {
    let v = run(
        "
        cvt.int.i $3 #5
        c.eq.i $3 #5
        bc.i #2
        exit.i #1
        exit.i #2
        ",
    )
    .unwrap();
    assert_eq!(v, Value::Int(2));
}

#[test]
fn conditional_branch_not_taken_when_comp_is_zero() {
    let v = run(
        "
        cvt.int.i $3 #5
        c.eq.i $3 #9
        bc.i #2
        exit.i #1
        exit.i #2
        ",
    )
    .unwrap();
    assert_eq!(v, Value::Int(1));
}

#[test]
fn absolute_call_returns_to_the_instruction_after_it() {
    let v = run(
        "
        call.i &sub
        exit.r $3
        sub:
        cvt.int.i $3 #42
        ret
        ",
    )
    .unwrap();
    assert_eq!(v, Value::Int(42));
}

#[test]
fn external_call_through_an_ext_handle_invokes_the_declared_host_function() {
    let mut vm = loaded(
        "
        cvt.ptr.i $3 &name
        env.load $4 $3
        cvt.int.i $5 #21
        push.r $5
        call.r $4
        pop.d $6
        exit.r $6
        name: .utf8 \"double\"
        ",
    );
    vm.environment_mut().declare_host_function("double", 1, |args| match args.first() {
        Some(HostArg::Value(Value::Int(n))) => Some(Binding::Scalar((*n * 2) as f32)),
        _ => None,
    });
    let result = vm.run().unwrap();
    match result {
        Value::Ext(handle) => {
            let binding = vm.environment().ext(handle).unwrap().binding.as_ref().unwrap();
            assert_eq!(binding.coerce_f32(), Some(42.0));
        }
        other => panic!("expected an Ext-wrapped call result, got {other:?}"),
    }
}
