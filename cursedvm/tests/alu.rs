//! Arithmetic, bitwise and shift semantics for the `num` class.
//!
//! `$0`-`$2` are `ZERO`/`COMP`/`PC`; every scratch register below starts at
//! `$3` to avoid stomping on them.

mod common;

use common::run;
use cursedvm::{Fault, Value};

#[test]
fn add_sub_mult_on_ints() {
    let v = run(
        "
        cvt.int.i $3 #5
        cvt.int.i $4 #3
        add $5 $3 $4
        sub $6 $5 $4
        mult $7 $6 $4
        exit.r $7
        ",
    )
    .unwrap();
    assert_eq!(v, Value::Int((5 + 3 - 3) * 3));
}

#[test]
fn div_and_mod_truncate_toward_zero() {
    let v = run(
        "
        cvt.int.i $3 #7
        cvt.int.i $4 #2
        div $5 $3 $4
        mod $6 $3 $4
        add $7 $5 $6
        exit.r $7
        ",
    )
    .unwrap();
    assert_eq!(v, Value::Int(3 + 1));
}

#[test]
fn integer_division_by_zero_is_a_domain_fault() {
    let err = run(
        "
        cvt.int.i $3 #1
        cvt.int.i $4 #0
        div $5 $3 $4
        exit.r $5
        ",
    )
    .unwrap_err();
    assert!(matches!(err, Fault::DomainError { .. }));
}

#[test]
fn type_toggle_forces_a_float_result() {
    let v = run(
        "
        cvt.int.i $3 #4
        cvt.int.i $4 #2
        add.f $5 $3 $4
        exit.r $5
        ",
    )
    .unwrap();
    assert_eq!(v, Value::Float(6.0));
}

#[test]
fn type_toggle_on_a_ptr_x_operand_is_fatal() {
    let err = run(
        "
        cvt.ptr.i $3 #0
        cvt.int.i $4 #1
        add.f $5 $3 $4
        exit.r $5
        ",
    )
    .unwrap_err();
    assert!(matches!(err, Fault::TypeError { .. }));
}

#[test]
fn bitwise_and_or_xor_xnor() {
    let v = run(
        "
        cvt.int.i $3 #12
        cvt.int.i $4 #10
        and $5 $3 $4
        or $6 $3 $4
        xor $7 $3 $4
        add $8 $5 $6
        add $9 $8 $7
        exit.r $9
        ",
    )
    .unwrap();
    assert_eq!(v, Value::Int((12 & 10) + (12 | 10) + (12 ^ 10)));
}

#[test]
fn shift_left_and_right() {
    let v = run(
        "
        cvt.int.i $3 #1
        cvt.int.i $4 #4
        shl $5 $3 $4
        shr $6 $5 $4
        exit.r $6
        ",
    )
    .unwrap();
    assert_eq!(v, Value::Int(1));
}

#[test]
fn pointer_plus_int_offsets_within_its_region() {
    let v = run(
        "
        cvt.ptr.i $3 #0
        cvt.int.i $4 #3
        add $5 $3 $4
        cvt.int.repr $6 $4 $5
        exit.r $6
        ",
    )
    .unwrap();
    assert_eq!(v, Value::Int(3));
}
