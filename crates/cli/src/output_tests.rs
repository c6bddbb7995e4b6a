use super::*;

#[test]
fn read_message_passes_literal_through() {
    assert_eq!(read_message(Some("hello".into())).unwrap(), "hello");
}
