//! Codec Tests
//!
//! Tests for request line reading and reply encoding.

use std::io::{BufReader, Cursor, Read};

use cinderkv::protocol::{
    encode_response, parse_request, read_request, tokenize, write_response, Command, Response,
    MAX_LINE_LEN,
};
use cinderkv::CinderError;

// =============================================================================
// Tokenizer Tests
// =============================================================================

#[test]
fn test_tokenize() {
    assert_eq!(tokenize("SET a 1"), vec!["SET", "a", "1"]);
    assert_eq!(tokenize("\t LPUSH  q   job \r\n"), vec!["LPUSH", "q", "job"]);
    assert!(tokenize("").is_empty());
}

#[test]
fn test_parse_request() {
    assert_eq!(
        parse_request("lrange q -3 -1\r\n").unwrap(),
        Command::LRange { key: "q".into(), start: -3, stop: -1 }
    );
    assert!(matches!(parse_request("  "), Err(CinderError::EmptyCommand)));
    assert!(matches!(
        parse_request("NOPE a"),
        Err(CinderError::UnknownCommand(ref verb)) if verb == "NOPE"
    ));
}

// =============================================================================
// Request Reading Tests
// =============================================================================

#[test]
fn test_read_request_lines() {
    let mut reader = Cursor::new(b"PING\r\nGET a\nSET b 2".to_vec());
    let mut buf = Vec::new();

    assert_eq!(read_request(&mut reader, &mut buf).unwrap(), Some("PING\r\n".to_string()));
    assert_eq!(read_request(&mut reader, &mut buf).unwrap(), Some("GET a\n".to_string()));
    // Final line without terminator is still delivered
    assert_eq!(read_request(&mut reader, &mut buf).unwrap(), Some("SET b 2".to_string()));
    assert_eq!(read_request(&mut reader, &mut buf).unwrap(), None);
}

#[test]
fn test_read_request_empty_stream() {
    let mut reader = Cursor::new(Vec::new());
    let mut buf = Vec::new();

    assert_eq!(read_request(&mut reader, &mut buf).unwrap(), None);
}

#[test]
fn test_read_request_too_long() {
    let mut data = vec![b'a'; MAX_LINE_LEN + 10];
    data.push(b'\n');
    let mut reader = Cursor::new(data);
    let mut buf = Vec::new();

    let err = read_request(&mut reader, &mut buf).unwrap_err();

    assert!(matches!(err, CinderError::RequestTooLong { limit } if limit == MAX_LINE_LEN));
    assert!(buf.is_empty());
}

#[test]
fn test_read_request_at_limit() {
    let mut data = vec![b'a'; MAX_LINE_LEN];
    data.push(b'\n');
    let mut reader = Cursor::new(data);
    let mut buf = Vec::new();

    let line = read_request(&mut reader, &mut buf).unwrap().unwrap();

    assert_eq!(line.len(), MAX_LINE_LEN + 1);
}

#[test]
fn test_read_request_at_limit_with_crlf() {
    let mut data = vec![b'a'; MAX_LINE_LEN];
    data.extend_from_slice(b"\r\nPING\r\n");
    let mut reader = Cursor::new(data);
    let mut buf = Vec::new();

    let line = read_request(&mut reader, &mut buf).unwrap().unwrap();

    assert_eq!(line.len(), MAX_LINE_LEN + 2);
    assert_eq!(read_request(&mut reader, &mut buf).unwrap(), Some("PING\r\n".to_string()));
}

#[test]
fn test_read_request_one_over_limit() {
    for terminator in [&b"\n"[..], &b"\r\n"[..], &b""[..]] {
        let mut data = vec![b'a'; MAX_LINE_LEN + 1];
        data.extend_from_slice(terminator);
        let mut reader = Cursor::new(data);
        let mut buf = Vec::new();

        assert!(
            matches!(
                read_request(&mut reader, &mut buf),
                Err(CinderError::RequestTooLong { .. })
            ),
            "terminator {:?}",
            terminator
        );
    }
}

#[test]
fn test_read_request_invalid_utf8() {
    let mut reader = Cursor::new(b"SET k \xff\nPING\n".to_vec());
    let mut buf = Vec::new();

    assert!(matches!(
        read_request(&mut reader, &mut buf),
        Err(CinderError::Protocol(_))
    ));
    // The bad line is consumed; the next one reads normally
    assert_eq!(read_request(&mut reader, &mut buf).unwrap(), Some("PING\n".to_string()));
}

#[test]
fn test_read_request_resumes_partial_line() {
    // A tiny buffer over a split input models a line arriving in pieces.
    let input = Cursor::new(b"GET ".to_vec()).chain(Cursor::new(b"key\n".to_vec()));
    let mut reader = BufReader::with_capacity(2, input);
    let mut buf = Vec::new();

    assert_eq!(read_request(&mut reader, &mut buf).unwrap(), Some("GET key\n".to_string()));
}

// =============================================================================
// Reply Encoding Tests
// =============================================================================

#[test]
fn test_encode_single_line_replies() {
    assert_eq!(&encode_response(&Response::ok())[..], b"OK\r\n");
    assert_eq!(&encode_response(&Response::nil())[..], b"(nil)\r\n");
    assert_eq!(&encode_response(&Response::Integer(-2))[..], b"-2\r\n");
    assert_eq!(&encode_response(&Response::boolean(true))[..], b"1\r\n");
    assert_eq!(&encode_response(&Response::Bye)[..], b"BYE\r\n");
    assert_eq!(
        &encode_response(&Response::Value(Some("hello".into())))[..],
        b"hello\r\n"
    );
}

#[test]
fn test_encode_multi_line_replies() {
    let reply = Response::Lines(vec![Some("a".into()), None, Some("c".into())]);

    assert_eq!(&encode_response(&reply)[..], b"a\r\n(nil)\r\nc\r\n");
}

#[test]
fn test_encode_error() {
    let reply = Response::error(&CinderError::WrongArity { command: "GET".into() });

    assert_eq!(
        &encode_response(&reply)[..],
        b"ERR wrong number of arguments for 'GET'\r\n"
    );
}

#[test]
fn test_write_response() {
    let mut out = Vec::new();

    write_response(&mut out, &Response::Status("PONG")).unwrap();

    assert_eq!(out, b"PONG\r\n");
}
