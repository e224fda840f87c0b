//! Region-dispatched load/store through a `Ptr`, for the `mem` class.
//!
//! `$0`-`$2` are `ZERO`/`COMP`/`PC`; every scratch register below starts at
//! `$3` to avoid stomping on them.

mod common;

use common::run;
use cursedvm::{Fault, Value};

#[test]
fn write_then_read_int_round_trips_through_word_memory() {
    let v = run(
        "
        cvt.ptr.i $3 #100
        cvt.int.i $4 #0
        cvt.int.i $5 #777
        write $5 $3 $4
        read.int $6 $3 $4
        exit.r $6
        ",
    )
    .unwrap();
    assert_eq!(v, Value::Int(777));
}

#[test]
fn write_then_read_float_round_trips_through_word_memory() {
    let v = run(
        "
        cvt.ptr.i $3 #200
        cvt.int.i $4 #0
        cvt.float.i $5 #9
        write $5 $3 $4
        read.float $6 $3 $4
        exit.r $6
        ",
    )
    .unwrap();
    assert_eq!(v, Value::Float(9.0));
}

#[test]
fn offset_register_advances_the_address() {
    let v = run(
        "
        cvt.ptr.i $3 #300
        cvt.int.i $4 #0
        cvt.int.i $5 #5
        cvt.int.i $6 #4
        write $5 $3 $4
        read.int $7 $3 $6
        exit.r $7
        ",
    );
    // reading four cells past an empty cell should come back zeroed, not
    // the value written at the base offset
    assert_eq!(v.unwrap(), Value::Int(0));
}

#[test]
fn object_memory_round_trips_a_ptr_value_by_tag() {
    // Build the raw bit pattern for a region-tag-1 (ObjectMemory) pointer
    // at offset 5 at runtime: 16-bit immediates can't hold it directly.
    let v = run(
        "
        cvt.int.i $3 #1
        cvt.int.i $4 #24
        shl $5 $3 $4
        cvt.int.i $6 #5
        add $7 $5 $6
        cvt.ptr.i $8 #0
        cvt.ptr.repr $9 $8 $7
        cvt.int.i $10 #0
        cvt.float.i $11 #3
        write $11 $9 $10
        read.float $12 $9 $10
        exit.r $12
        ",
    )
    .unwrap();
    assert_eq!(v, Value::Float(3.0));
}

#[test]
fn out_of_bounds_word_memory_access_is_a_bounds_fault() {
    // Word memory is 2^24 cells; build that offset at runtime since a
    // 16-bit immediate can't name it directly.
    let err = run(
        "
        cvt.ptr.i $3 #0
        cvt.int.i $4 #1
        cvt.int.i $5 #24
        shl $6 $4 $5
        cvt.int.i $7 #1
        write $7 $3 $6
        exit.r $7
        ",
    )
    .unwrap_err();
    assert!(matches!(err, Fault::BoundsError { .. }));
}

#[test]
fn mem_address_operand_must_be_a_ptr() {
    let err = run(
        "
        cvt.int.i $3 #1
        cvt.int.i $4 #0
        cvt.int.i $5 #1
        write $5 $3 $4
        exit.r $5
        ",
    )
    .unwrap_err();
    assert!(matches!(err, Fault::TypeError { .. }));
}
