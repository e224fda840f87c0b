//! Registers a host function the guest program reaches through an `Ext`
//! handle, and prints the `Ext`-wrapped result of calling it.

use cursedvm::{Binding, HostArg, Interpreter, Value};
use cursedvm_asm::{assemble, link};

fn main() {
    let source = "
        cvt.ptr.i $3 &name
        env.load $4 $3
        cvt.int.i $5 #19
        push.r $5
        call.r $4
        pop.d $6
        exit.r $6
        name: .utf8 \"double\"
    ";
    let (text, rodata) = assemble(source).expect("assembly failed");
    let image: Vec<i32> =
        link(&[text, rodata]).expect("link failed").into_iter().map(|w| w as i32).collect();

    let mut vm = Interpreter::new();
    vm.load_program(&image).expect("program too large for word memory");
    vm.environment_mut().declare_host_function("double", 1, |args| match args.first() {
        Some(HostArg::Value(Value::Int(n))) => Some(Binding::Scalar((*n * 2) as f32)),
        _ => None,
    });

    match vm.run().expect("run faulted") {
        Value::Ext(handle) => {
            let binding = vm.environment().ext(handle).unwrap().binding.as_ref().unwrap();
            println!("host function returned {:?}", binding.coerce_f32());
        }
        other => println!("unexpected result: {other:?}"),
    }
}
