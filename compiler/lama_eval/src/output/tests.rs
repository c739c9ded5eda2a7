use super::*;
use pretty_assertions::assert_eq;

#[test]
fn buffer_captures_print_and_println() {
    let out = buffer_output();
    out.print("a");
    out.println("b");
    out.println("");
    assert_eq!(out.get_output(), "ab\n\n");
    out.clear();
    assert_eq!(out.get_output(), "");
}

#[test]
fn silent_discards() {
    let out = silent_output();
    out.println("ignored");
    assert_eq!(out.get_output(), "");
}
