use cfbasic::mach::{format_number, Heap, Program};
use quickcheck::TestResult;
use quickcheck_macros::quickcheck;

#[quickcheck]
fn prop_program_lines_always_ascend(numbers: Vec<u16>) -> bool {
    let heap = Heap::new(1 << 20);
    let mut program = Program::new();
    for n in &numbers {
        program.store(&heap, *n, "PRINT 1").unwrap();
    }
    let mut expected: Vec<u16> = numbers.clone();
    expected.sort_unstable();
    expected.dedup();
    let listed: Vec<u16> = program.iter().map(|(n, _)| n).collect();
    listed == expected
}

#[quickcheck]
fn prop_deleting_every_line_empties_the_program(numbers: Vec<u16>) -> bool {
    let heap = Heap::new(1 << 20);
    let mut program = Program::new();
    for n in &numbers {
        program.store(&heap, *n, "PRINT 1").unwrap();
    }
    for n in &numbers {
        program.store(&heap, *n, "").unwrap();
    }
    program.is_empty()
}

#[quickcheck]
fn prop_ledger_balances_after_release(sizes: Vec<u8>) -> bool {
    let heap = Heap::new(1 << 20);
    let before = heap.used();
    let charges: Vec<_> = sizes
        .iter()
        .map(|size| heap.reserve(usize::from(*size)).unwrap())
        .collect();
    let held = heap.used();
    drop(charges);
    held <= heap.limit() && heap.used() == before
}

#[quickcheck]
fn prop_ledger_never_exceeds_limit(sizes: Vec<u16>) -> bool {
    let heap = Heap::new(4096);
    let mut charges = vec![];
    for size in sizes {
        if let Ok(charge) = heap.reserve(usize::from(size)) {
            charges.push(charge);
        }
        if heap.used() > heap.limit() {
            return false;
        }
    }
    true
}

#[quickcheck]
fn prop_format_number_round_trips(n: f64) -> TestResult {
    if !n.is_finite() {
        return TestResult::discard();
    }
    match format_number(n).parse::<f64>() {
        Ok(parsed) => TestResult::from_bool(parsed == n),
        Err(_) => TestResult::failed(),
    }
}
