//! `num` (class 9): arithmetic, bitwise and shift operations. The S bit is
//! repurposed here as `T`, a per-instruction type-toggle rather than the
//! IRS-push flag (spec §4.1's "S means something else for this class").

use cursedvm_asm::Instruction;

use crate::error::{decode_error, domain_error, type_error, Fault};
use crate::value::{Region, Value};

use super::{Control, Interpreter};

enum ArithOp {
    Add,
    Sub,
    Mult,
    Div,
    Mod,
}

enum BitOp {
    And,
    Or,
    Xor,
    Xnor,
}

enum ShiftOp {
    Shl,
    Shr,
}

pub(crate) fn num(vm: &mut Interpreter, pc: u32, instr: Instruction) -> Result<Control, Fault> {
    let t = instr.s();
    let x = vm.read_register(pc, instr.r1())?;
    let y = vm.read_register(pc, instr.r2())?;
    let result = match instr.c0() {
        0 => arith(pc, x, y, t, ArithOp::Add)?,
        1 => arith(pc, x, y, t, ArithOp::Sub)?,
        2 => arith(pc, x, y, t, ArithOp::Mult)?,
        3 => arith(pc, x, y, t, ArithOp::Div)?,
        4 => arith(pc, x, y, t, ArithOp::Mod)?,
        5 => Value::Int(bitwise(pc, x, y, if t { BitOp::Or } else { BitOp::And })?),
        6 => Value::Int(bitwise(pc, x, y, if t { BitOp::Xnor } else { BitOp::Xor })?),
        7 => Value::Int(shift(pc, x, y, if t { ShiftOp::Shr } else { ShiftOp::Shl })?),
        other => return Err(decode_error(pc, instr, format!("reserved num subfunction {other:03b}"))),
    };
    vm.write_register(pc, instr.r0(), result)?;
    Ok(Control::Advance)
}

fn ptr_offset(region: Region, offset: u32, delta: i32) -> Value {
    Value::Ptr { region, offset: offset.wrapping_add(delta as u32) }
}

fn arith(pc: u32, x: Value, y: Value, t: bool, op: ArithOp) -> Result<Value, Fault> {
    if t {
        if matches!(x, Value::Ptr { .. }) {
            return Err(type_error(pc, "type-toggle T forces a Float result but X is a Ptr"));
        }
        let xf = as_f32(pc, x)?;
        let yf = as_f32(pc, y)?;
        return Ok(Value::Float(apply_float(pc, &op, xf, yf)?));
    }

    match x {
        Value::Ptr { region, offset } => {
            if !matches!(op, ArithOp::Add | ArithOp::Sub) {
                return Err(type_error(pc, "mult/div/mod do not accept a Ptr operand"));
            }
            let delta = match y {
                Value::Int(n) => n,
                Value::Ptr { region: yr, offset: yo } if yr == region => yo as i32,
                Value::Ptr { .. } => return Err(type_error(pc, "pointer arithmetic requires pointers into the same region")),
                other => return Err(type_error(pc, format!("pointer arithmetic Y operand must be Int or a same-region Ptr, found {other:?}"))),
            };
            let signed = if matches!(op, ArithOp::Sub) { -delta } else { delta };
            Ok(ptr_offset(region, offset, signed))
        }
        Value::Int(a) => match y {
            Value::Int(b) => Ok(Value::Int(apply_int(pc, &op, a, b)?)),
            other => Err(type_error(pc, format!("arithmetic operands must both be Int or both Float, found Int and {other:?}"))),
        },
        Value::Float(a) => match y {
            Value::Float(b) => Ok(Value::Float(apply_float(pc, &op, a, b)?)),
            other => Err(type_error(pc, format!("arithmetic operands must both be Int or both Float, found Float and {other:?}"))),
        },
        other => Err(type_error(pc, format!("arithmetic X operand must be Int, Float or Ptr, found {other:?}"))),
    }
}

fn as_f32(pc: u32, v: Value) -> Result<f32, Fault> {
    match v {
        Value::Int(i) => Ok(i as f32),
        Value::Float(f) => Ok(f),
        other => Err(type_error(pc, format!("operand must be Int or Float, found {other:?}"))),
    }
}

fn apply_int(pc: u32, op: &ArithOp, a: i32, b: i32) -> Result<i32, Fault> {
    match op {
        ArithOp::Add => Ok(a.wrapping_add(b)),
        ArithOp::Sub => Ok(a.wrapping_sub(b)),
        ArithOp::Mult => Ok(a.wrapping_mul(b)),
        ArithOp::Div if b == 0 => Err(domain_error(pc, "integer division by zero")),
        ArithOp::Div => Ok(a.wrapping_div(b)),
        ArithOp::Mod if b == 0 => Err(domain_error(pc, "integer modulo by zero")),
        ArithOp::Mod => Ok(a.wrapping_rem(b)),
    }
}

fn apply_float(pc: u32, op: &ArithOp, a: f32, b: f32) -> Result<f32, Fault> {
    match op {
        ArithOp::Add => Ok(a + b),
        ArithOp::Sub => Ok(a - b),
        ArithOp::Mult => Ok(a * b),
        ArithOp::Div if b == 0.0 => Err(domain_error(pc, "float division by zero")),
        ArithOp::Div => Ok(a / b),
        ArithOp::Mod if b == 0.0 => Err(domain_error(pc, "float modulo by zero")),
        ArithOp::Mod => Ok(a % b),
    }
}

fn expect_int(pc: u32, v: Value) -> Result<i32, Fault> {
    match v {
        Value::Int(i) => Ok(i),
        other => Err(type_error(pc, format!("bitwise/shift operands must be Int, found {other:?}"))),
    }
}

fn bitwise(pc: u32, x: Value, y: Value, op: BitOp) -> Result<i32, Fault> {
    let a = expect_int(pc, x)?;
    let b = expect_int(pc, y)?;
    Ok(match op {
        BitOp::And => a & b,
        BitOp::Or => a | b,
        BitOp::Xor => a ^ b,
        BitOp::Xnor => !(a ^ b),
    })
}

fn shift(pc: u32, x: Value, y: Value, op: ShiftOp) -> Result<i32, Fault> {
    let a = expect_int(pc, x)?;
    let b = expect_int(pc, y)?;
    let amount = (b as u32) & 31;
    Ok(match op {
        ShiftOp::Shl => ((a as u32) << amount) as i32,
        ShiftOp::Shr => ((a as u32) >> amount) as i32,
    })
}
