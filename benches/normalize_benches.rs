use RustedMathSolver::dispatch::operation::{OperationRequest, OperationTag};
use RustedMathSolver::input::normalizer::normalize;
use RustedMathSolver::input::registry::FunctionSet;
use RustedMathSolver::solver::MathSolver;
use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

const INPUTS: [&str; 6] = [
    "3x^2 + sinx",
    "asinx + arccos x·2",
    "1,000 + 2,500x",
    "2(x+1)(x-1)y",
    "log(x, 2) + sinxcosx",
    "d/dx x^3 e^x",
];

fn bench_normalize(c: &mut Criterion) {
    let functions = FunctionSet::builtin();
    c.bench_function("normalize textbook inputs", |b| {
        b.iter(|| {
            for raw in INPUTS {
                let _ = normalize(black_box(raw), &functions);
            }
        })
    });
}

fn bench_route(c: &mut Criterion) {
    let solver = MathSolver::default();
    c.bench_function("route textbook inputs", |b| {
        b.iter(|| {
            for raw in INPUTS {
                let _ = solver.route(black_box(raw), None);
            }
        })
    });
}

fn bench_solve(c: &mut Criterion) {
    let solver = MathSolver::default();
    let request = OperationRequest::new().operation(OperationTag::Solve);
    c.bench_function("solve quadratic", |b| {
        b.iter(|| solver.process(black_box("x^2 - 5x + 6 = 0"), &request))
    });
}

criterion_group!(benches, bench_normalize, bench_route, bench_solve);
criterion_main!(benches);
