#[cfg(test)]
mod test {
  use mica::{Error, MessageType, Parser, State};

  fn parse_and_fail(message: &[u8]) -> Parser {
    let mut parser = Parser::new();
    parser.parse(message);

    assert_eq!(
      parser.state,
      State::Error,
      "{:?} did not fail",
      String::from_utf8_lossy(message)
    );
    parser
  }

  fn assert_fails(message: &[u8], code: Error) {
    let parser = parse_and_fail(message);

    assert_eq!(
      parser.error_code,
      code,
      "{:?} failed with \"{}\"",
      String::from_utf8_lossy(message),
      parser.error_description_str()
    );
  }

  #[test]
  fn invalid_versions() {
    assert_fails(b"GET / HTTP/2.0\r\n\r\n", Error::UnsupportedHttpVersion);
    assert_fails(b"GET / HTTP/1.2\r\n\r\n", Error::InvalidVersion);
    assert_fails(b"GET / HTTP/0.9\r\n\r\n", Error::InvalidVersion);
    assert_fails(b"HTTP/2.0 200 OK\r\n\r\n", Error::UnsupportedHttpVersion);
    assert_fails(b"HTTP/3.0 200 OK\r\n\r\n", Error::InvalidVersion);
    assert_fails(b"GET / HTTQ/1.1\r\n\r\n", Error::UnexpectedCharacter);
  }

  #[test]
  fn garbage_fails_without_waiting_for_more_data() {
    for garbage in [&b"XYZ\r\n\r\n"[..], b"X", b"GETX", b"HTTP-", b"\rX", b"\r\nPUTS"] {
      let mut parser = Parser::new();

      let error = parser.try_parse(garbage).unwrap_err();
      assert_eq!(error.code, Error::UnexpectedCharacter, "{:?}", String::from_utf8_lossy(garbage));
    }

    // Prefixes of a valid start are still waited for
    for prefix in [&b"G"[..], b"GE", b"HTTP", b"M-SEA", b"\r"] {
      let mut parser = Parser::new();

      assert_eq!(parser.try_parse(prefix), Ok(0));
      assert_eq!(parser.state, State::Autodetect);
    }
  }

  #[test]
  fn invalid_request_line() {
    assert_fails(b"FOO / HTTP/1.1\r\n\r\n", Error::UnexpectedCharacter);
    assert_fails(b"GET  / HTTP/1.1\r\n\r\n", Error::UnexpectedCharacter);
    assert_fails(b"GET /\x01 HTTP/1.1\r\n\r\n", Error::UnexpectedCharacter);

    let mut parser = Parser::with_mode(MessageType::Request);
    parser.parse(b"HTTP/1.1 200 OK\r\n\r\n");
    assert_eq!(parser.error_code, Error::UnexpectedCharacter);
  }

  #[test]
  fn invalid_status() {
    assert_fails(b"HTTP/1.1 2x0 OK\r\n\r\n", Error::InvalidStatus);
    assert_fails(b"HTTP/1.1 20 OK\r\n\r\n", Error::InvalidStatus);
  }

  #[test]
  fn invalid_headers() {
    assert_fails(b"GET / HTTP/1.1\r\nBad Header: x\r\n\r\n", Error::UnexpectedCharacter);
    assert_fails(b"GET / HTTP/1.1\r\n: x\r\n\r\n", Error::UnexpectedCharacter);
    assert_fails(b"GET / HTTP/1.1\r\nHost: a\x01b\r\n\r\n", Error::UnexpectedCharacter);
  }

  #[test]
  fn invalid_content_length() {
    assert_fails(
      b"POST / HTTP/1.1\r\nContent-Length: abc\r\n\r\n",
      Error::InvalidContentLength,
    );
    assert_fails(
      b"POST / HTTP/1.1\r\nContent-Length: 12a\r\n\r\n",
      Error::InvalidContentLength,
    );
    assert_fails(
      b"POST / HTTP/1.1\r\nContent-Length: 1 2\r\n\r\n",
      Error::InvalidContentLength,
    );
    assert_fails(
      b"POST / HTTP/1.1\r\nContent-Length: 99999999999999999999999\r\n\r\n",
      Error::InvalidContentLength,
    );
    assert_fails(
      b"POST / HTTP/1.1\r\nContent-Length: 1\r\nContent-Length: 1\r\n\r\n",
      Error::InvalidContentLength,
    );
  }

  #[test]
  fn conflicting_framing_headers() {
    assert_fails(
      b"POST / HTTP/1.1\r\nTransfer-Encoding: chunked\r\nContent-Length: 3\r\n\r\n",
      Error::UnexpectedContentLength,
    );
    assert_fails(
      b"POST / HTTP/1.1\r\nContent-Length: 3\r\nTransfer-Encoding: chunked\r\n\r\n",
      Error::UnexpectedTransferEncoding,
    );
    assert_fails(
      b"HTTP/1.1 204 No Content\r\nContent-Length: 3\r\n\r\n",
      Error::UnexpectedContentLength,
    );
    assert_fails(
      b"HTTP/1.1 100 Continue\r\nContent-Length: 3\r\n\r\n",
      Error::UnexpectedContentLength,
    );
  }

  #[test]
  fn invalid_transfer_encoding() {
    assert_fails(
      b"POST / HTTP/1.1\r\nTransfer-Encoding: chunked, gzip\r\n\r\n",
      Error::InvalidTransferEncoding,
    );
    assert_fails(
      b"POST / HTTP/1.1\r\nTransfer-Encoding: chunked\r\nTransfer-Encoding: chunked\r\n\r\n",
      Error::InvalidTransferEncoding,
    );
    assert_fails(
      b"POST / HTTP/1.1\r\nTransfer-Encoding: \r\n\r\n",
      Error::InvalidTransferEncoding,
    );

    // Other codings are fine as long as chunked comes last
    let mut parser = Parser::new();
    parser.parse(b"POST / HTTP/1.1\r\nTransfer-Encoding: gzip, chunked\r\n\r\n0\r\n\r\n");
    assert_eq!(parser.state, State::Start);
  }

  #[test]
  fn unexpected_trailers() {
    assert_fails(
      b"POST / HTTP/1.1\r\nTrailer: x\r\nContent-Length: 3\r\n\r\nabc",
      Error::UnexpectedTrailers,
    );
  }

  #[test]
  fn invalid_chunks() {
    assert_fails(
      b"POST / HTTP/1.1\r\nTransfer-Encoding: chunked\r\n\r\nzz\r\n",
      Error::InvalidChunkSize,
    );
    assert_fails(
      b"POST / HTTP/1.1\r\nTransfer-Encoding: chunked\r\n\r\n11111111111111111\r\n",
      Error::InvalidChunkSize,
    );
    assert_fails(
      b"POST / HTTP/1.1\r\nTransfer-Encoding: chunked\r\n\r\n3\r\nabcXY",
      Error::UnexpectedCharacter,
    );
    assert_fails(
      b"POST / HTTP/1.1\r\nTransfer-Encoding: chunked\r\n\r\n3;=x\r\nabc\r\n",
      Error::UnexpectedCharacter,
    );
  }

  #[test]
  fn error_is_sticky() {
    let mut parser = parse_and_fail(b"GET / HTTP/1.2\r\n\r\n");
    let description = parser.error_description_str().to_string();

    assert_eq!(parser.parse(b"GET / HTTP/1.1\r\n\r\n"), 0);
    assert_eq!(parser.error_code, Error::InvalidVersion);
    assert_eq!(parser.error_description_str(), description);
  }
}
