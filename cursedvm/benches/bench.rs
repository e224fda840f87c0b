use criterion::{
    black_box,
    criterion_group,
    criterion_main,
    Criterion,
};
use cursedvm::Interpreter;
use cursedvm_asm::{assemble, link};

fn bench_assemble_and_link(c: &mut Criterion) {
    let source = "
        loop:
        cvt.int.i $3, #1
        cvt.int.i $4, #1
        add $5, $3, $4
        c.lt.i $5, #1000
        bc.i ^loop
        exit.r $5
    ";
    c.bench_function("assemble_and_link_small_loop", |b| {
        b.iter(|| {
            let (text, rodata) = assemble(black_box(source)).unwrap();
            black_box(link(&[text, rodata]).unwrap())
        })
    });
}

fn bench_tight_loop_dispatch(c: &mut Criterion) {
    let source = "
        loop:
        add $3, $3, $ZERO
        c.lt.i $3, #10000
        bc.i ^loop
        exit.r $3
    ";
    let (text, rodata) = assemble(source).unwrap();
    let image: Vec<i32> = link(&[text, rodata]).unwrap().into_iter().map(|w| w as i32).collect();

    c.bench_function("dispatch_ten_thousand_iteration_loop", |b| {
        b.iter(|| {
            let mut vm = Interpreter::new();
            vm.load_program(&image).unwrap();
            black_box(vm.run().unwrap())
        })
    });
}

fn bench_single_step(c: &mut Criterion) {
    let (text, rodata) = assemble("add $3, $ZERO, $ZERO\n").unwrap();
    let image: Vec<i32> = link(&[text, rodata]).unwrap().into_iter().map(|w| w as i32).collect();
    let mut vm = Interpreter::new();
    vm.load_program(&image).unwrap();

    c.bench_function("single_instruction_step", |b| {
        b.iter(|| black_box(vm.step().unwrap()))
    });
}

criterion_group!(benches, bench_assemble_and_link, bench_tight_loop_dispatch, bench_single_step);
criterion_main!(benches);
