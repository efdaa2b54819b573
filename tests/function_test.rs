mod common;
use common::*;

#[test]
fn test_fn_abs_int() {
    let mut f = fixture();
    assert_eq!(f.enter("PRINT ABS(-9)"), "9\n");
    assert_eq!(f.enter("PRINT ABS(9)"), "9\n");
    assert_eq!(f.enter("PRINT INT(2.7)"), "2\n");
    assert_eq!(f.enter("PRINT INT(-2.5)"), "-3\n");
}

#[test]
fn test_fn_sqr() {
    let mut f = fixture();
    assert_eq!(f.enter("PRINT SQR(9)"), "3\n");
    assert_eq!(f.enter("PRINT SQR(-1)"), "?ILLEGAL QUANTITY IN SQR ERROR\n");
}

#[test]
fn test_fn_trig() {
    let mut f = fixture();
    assert_eq!(f.enter("PRINT SIN(0)"), "0\n");
    assert_eq!(f.enter("PRINT COS(0)"), "1\n");
    assert_eq!(f.enter("PRINT TAN(0)"), "0\n");
}

#[test]
fn test_fn_rnd_range() {
    let mut f = fixture();
    f.enter("X = RND");
    assert_eq!(f.enter("PRINT X >= 0 AND X < 1"), "1\n");
    f.enter("Y = RND(1)");
    assert_eq!(f.enter("PRINT Y >= 0 AND Y < 1"), "1\n");
}

#[test]
fn test_fn_len() {
    let mut f = fixture();
    assert_eq!(f.enter("PRINT LEN(\"HELLO\")"), "5\n");
    assert_eq!(f.enter("PRINT LEN(\"\")"), "0\n");
    assert_eq!(f.enter("PRINT LEN(5)"), "?BAD ARGUMENT TO LEN ERROR\n");
}

#[test]
fn test_fn_string_slices() {
    let mut f = fixture();
    assert_eq!(f.enter("PRINT LEFT$(\"HELLO\", 2)"), "HE\n");
    assert_eq!(f.enter("PRINT RIGHT$(\"HELLO\", 3)"), "LLO\n");
    assert_eq!(f.enter("PRINT MID$(\"HELLO\", 2, 3)"), "ELL\n");
    assert_eq!(f.enter("PRINT MID$(\"HELLO\", 2)"), "ELLO\n");
}

#[test]
fn test_fn_string_slices_clamp() {
    let mut f = fixture();
    assert_eq!(f.enter("PRINT LEFT$(\"HI\", 9)"), "HI\n");
    assert_eq!(f.enter("PRINT RIGHT$(\"HI\", 9)"), "HI\n");
    assert_eq!(f.enter("PRINT MID$(\"HI\", 9, 3)"), "\n");
}

#[test]
fn test_fn_string_slices_negative_count() {
    let mut f = fixture();
    assert_eq!(
        f.enter("PRINT LEFT$(\"HI\", -1)"),
        "?ILLEGAL QUANTITY IN LEFT$ ERROR\n"
    );
    assert_eq!(
        f.enter("PRINT RIGHT$(\"HI\", -1)"),
        "?ILLEGAL QUANTITY IN RIGHT$ ERROR\n"
    );
    assert_eq!(
        f.enter("PRINT MID$(\"HI\", 0)"),
        "?ILLEGAL QUANTITY IN MID$ ERROR\n"
    );
}

#[test]
fn test_fn_chr_asc() {
    let mut f = fixture();
    assert_eq!(f.enter("PRINT CHR$(65)"), "A\n");
    assert_eq!(f.enter("PRINT ASC(\"A\")"), "65\n");
    assert_eq!(f.enter("PRINT ASC(\"ABC\")"), "65\n");
    assert_eq!(f.enter("PRINT ASC(\"\")"), "?ILLEGAL QUANTITY IN ASC ERROR\n");
    assert_eq!(f.enter("PRINT CHR$(300)"), "?ILLEGAL QUANTITY IN CHR$ ERROR\n");
}

#[test]
fn test_fn_str_val() {
    let mut f = fixture();
    assert_eq!(f.enter("PRINT STR$(3.5)"), "3.5\n");
    assert_eq!(f.enter("PRINT STR$(42)"), "42\n");
    assert_eq!(f.enter("PRINT VAL(\"12AB\")"), "12\n");
    assert_eq!(f.enter("PRINT VAL(\"-2.5\")"), "-2.5\n");
    assert_eq!(f.enter("PRINT VAL(\"X\")"), "0\n");
    assert_eq!(f.enter("PRINT VAL(STR$(7)) + 1"), "8\n");
}

#[test]
fn test_fn_peek_reads_poked_memory() {
    let mut f = fixture();
    f.enter("POKE 2000, 42");
    assert_eq!(f.enter("PRINT PEEK(2000)"), "42\n");
    assert_eq!(f.enter("PRINT PEEK(9999)"), "0\n");
}

#[test]
fn test_fn_wrong_argument_kind() {
    let mut f = fixture();
    assert_eq!(f.enter("PRINT ABS(\"X\")"), "?BAD ARGUMENT TO ABS ERROR\n");
    assert_eq!(f.enter("PRINT CHR$(\"X\")"), "?BAD ARGUMENT TO CHR$ ERROR\n");
    assert_eq!(f.enter("PRINT MID$(\"X\")"), "?BAD ARGUMENT TO MID$ ERROR\n");
}
