mod common;
use common::*;

#[test]
fn test_precedence() {
    let mut f = fixture();
    assert_eq!(f.enter("PRINT 2 + 3 * 4"), "14\n");
    assert_eq!(f.enter("PRINT (2 + 3) * 4"), "20\n");
    assert_eq!(f.enter("PRINT 10 - 2 - 3"), "5\n");
    assert_eq!(f.enter("PRINT 7 / 2 + 1"), "4.5\n");
}

#[test]
fn test_exponentiation_is_right_associative() {
    let mut f = fixture();
    assert_eq!(f.enter("PRINT 2 ^ 3 ^ 2"), "512\n");
    assert_eq!(f.enter("PRINT -2 ^ 2"), "-4\n");
    assert_eq!(f.enter("PRINT 2 ^ -1"), "0.5\n");
}

#[test]
fn test_division_by_zero() {
    let mut f = fixture();
    assert_eq!(f.enter("PRINT 5 / 0"), "?DIVISION BY ZERO ERROR\n");
}

#[test]
fn test_string_concatenation() {
    let mut f = fixture();
    f.enter("A$ = \"FOO\" + \"BAR\"");
    assert_eq!(f.enter("PRINT A$"), "FOOBAR\n");
}

#[test]
fn test_comparisons_yield_one_or_zero() {
    let mut f = fixture();
    assert_eq!(f.enter("PRINT 1 < 2"), "1\n");
    assert_eq!(f.enter("PRINT 1 = 2"), "0\n");
    assert_eq!(f.enter("PRINT 2 >= 2"), "1\n");
    assert_eq!(f.enter("PRINT 1 <> 2"), "1\n");
    assert_eq!(f.enter("PRINT \"A\" < \"B\""), "1\n");
    assert_eq!(f.enter("PRINT \"A\" = \"A\""), "1\n");
}

#[test]
fn test_mixed_kind_comparison_is_an_error() {
    let mut f = fixture();
    assert_eq!(f.enter("PRINT 1 = \"A\""), "?TYPE MISMATCH ERROR\n");
    assert_eq!(f.enter("PRINT \"A\" - \"B\""), "?TYPE MISMATCH ERROR\n");
    assert_eq!(f.enter("PRINT 1 + \"A\""), "?TYPE MISMATCH ERROR\n");
}

#[test]
fn test_logical_operators() {
    let mut f = fixture();
    assert_eq!(f.enter("PRINT NOT 0"), "1\n");
    assert_eq!(f.enter("PRINT NOT 5"), "0\n");
    assert_eq!(f.enter("PRINT 1 AND 0"), "0\n");
    assert_eq!(f.enter("PRINT 1 AND 2"), "1\n");
    assert_eq!(f.enter("PRINT 1 OR 0"), "1\n");
    assert_eq!(f.enter("PRINT 0 OR 0"), "0\n");
    assert_eq!(f.enter("PRINT NOT 1 = 2"), "1\n");
}

#[test]
fn test_undefined_variables_have_default_values() {
    let mut f = fixture();
    assert_eq!(f.enter("PRINT Z"), "0\n");
    assert_eq!(f.enter("PRINT Z$"), "\n");
    assert_eq!(f.enter("PRINT Z + 1"), "1\n");
}

#[test]
fn test_question_mark_shorthand() {
    let mut f = fixture();
    assert_eq!(f.enter("? 6 * 7"), "42\n");
}
