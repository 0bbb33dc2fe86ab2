use mica_macros::{
  advance, callback, case_insensitive_string, char, consume, crlf, digit, double_crlf, fail, generate_states,
  hex_digit, method, move_to, otherwise, state, string, string_length, suspend, token, token_value,
  token_value_quoted, url, ws,
};

use crate::*;

// #region helpers
/// Parses a number in the given radix. Overflows are reported as `None`.
fn parse_number(data: &[u8], radix: u32) -> Option<u64> {
  let digits = std::str::from_utf8(data).ok()?;
  u64::from_str_radix(digits, radix).ok()
}

/// Strips the optional whitespace surrounding a value.
fn trim_ows(mut value: &[u8]) -> &[u8] {
  while let [ws!(), rest @ ..] = value {
    value = rest;
  }

  while let [rest @ .., ws!()] = value {
    value = rest;
  }

  value
}

/// Returns true if the data can still grow into a status line or a request
/// line of a known method.
fn starts_message(data: &[u8]) -> bool {
  let prefix_of = |expected: &[u8]| data.len() <= expected.len() && expected.starts_with(data);

  prefix_of(b"HTTP/") || METHODS.iter().any(|method| prefix_of(method.as_bytes()))
}

/// Splits a comma separated header value in its trimmed items.
fn list_items(value: &[u8]) -> impl Iterator<Item = &[u8]> { value.split(|b| *b == b',').map(trim_ows) }
// #endregion helpers

// #region general
// Depending on the mode, choose the initial state
state!(start, {
  match parser.mode {
    MessageType::Autodetect => move_to!(autodetect, 0),
    MessageType::Request => {
      parser.message_type = MessageType::Request;
      move_to!(request, 0);
    }
    MessageType::Response => {
      parser.message_type = MessageType::Response;
      move_to!(response, 0);
    }
  }
});

// If the parser has finished and it receives more data, error
state!(finish, {
  fail!(UNEXPECTED_DATA, "Unexpected data after the connection was closed");
});

// The error state is a no-op
state!(error, {
  suspend!();
});

// Autodetect if there is a HTTP method or a response
state!(autodetect, {
  match data {
    // RFC 9112 section 2.2
    crlf!() => advance!(2),
    string!("HTTP/") => {
      parser.message_type = MessageType::Response;
      move_to!(response, 0);
    }
    method!() => {
      parser.message_type = MessageType::Request;
      move_to!(request, 0);
    }
    [] | [char!('\r')] => suspend!(),
    _ if starts_message(data) => suspend!(),
    _ => fail!(UNEXPECTED_CHARACTER, "Unexpected data"),
  }
});
// #endregion general

// #region request - Request line
// RFC 9112 section 3
state!(request, {
  match data {
    // RFC 9112 section 2.2 - Repeated
    crlf!() => advance!(2),
    [token!(), ..] => {
      parser.clear();
      callback!(on_message_begin);
      move_to!(request_method, 0);
    }
    [] | [char!('\r')] => suspend!(),
    _ => fail!(UNEXPECTED_CHARACTER, "Expected method"),
  }
});

// RFC 9112 section 3.1
state!(request_method, {
  consume!(token);

  match data[consumed] {
    char!(' ') if consumed > 0 => {
      let Some(method) = find_method(&data[..consumed]) else {
        fail!(UNEXPECTED_CHARACTER, "Unknown method");
      };

      parser.method = method;
      callback!(on_method, consumed);
      move_to!(request_url, consumed + 1);
    }
    _ => fail!(UNEXPECTED_CHARACTER, "Expected token character"),
  }
});

// RFC 9112 section 3.2
state!(request_url, {
  consume!(url);

  match data[consumed] {
    char!(' ') if consumed > 0 => {
      callback!(on_url, consumed);
      move_to!(request_protocol, consumed + 1);
    }
    _ => fail!(UNEXPECTED_CHARACTER, "Expected URL character"),
  }
});

// RFC 9112 section 2.3
state!(request_protocol, {
  match data {
    string!("HTTP/") => move_to!(request_version, 5),
    otherwise!(5) => fail!(UNEXPECTED_CHARACTER, "Expected protocol"),
    _ => suspend!(),
  }
});

state!(request_version, {
  match data {
    [digit!(), char!('.'), digit!(), char!('\r'), char!('\n'), ..] => {
      match (data[0], data[2]) {
        (char!('1'), char!('0')) | (char!('1'), char!('1')) => {}
        (char!('2'), char!('0')) => fail!(UNSUPPORTED_HTTP_VERSION, "HTTP/2.0 is not supported"),
        _ => fail!(INVALID_VERSION, "Invalid HTTP version"),
      }

      parser.version_major = data[0] - b'0';
      parser.version_minor = data[2] - b'0';

      // RFC 9112 section 9.3
      if parser.version_minor == 0 {
        parser.connection = Connection::Close;
      }

      callback!(on_version, 3);
      move_to!(header_name, 5);
    }
    otherwise!(5) => fail!(UNEXPECTED_CHARACTER, "Expected HTTP version"),
    _ => suspend!(),
  }
});
// #endregion request

// #region response - Status line
// RFC 9112 section 4
state!(response, {
  match data {
    // RFC 9112 section 2.2 - Repeated
    crlf!() => advance!(2),
    string!("HTTP/") => {
      parser.clear();
      callback!(on_message_begin);
      move_to!(response_version, 5);
    }
    otherwise!(5) => fail!(UNEXPECTED_CHARACTER, "Expected protocol"),
    _ => suspend!(),
  }
});

state!(response_version, {
  match data {
    [digit!(), char!('.'), digit!(), char!(' '), ..] => {
      match (data[0], data[2]) {
        (char!('1'), char!('0')) | (char!('1'), char!('1')) => {}
        (char!('2'), char!('0')) => fail!(UNSUPPORTED_HTTP_VERSION, "HTTP/2.0 is not supported"),
        _ => fail!(INVALID_VERSION, "Invalid HTTP version"),
      }

      parser.version_major = data[0] - b'0';
      parser.version_minor = data[2] - b'0';

      if parser.version_minor == 0 {
        parser.connection = Connection::Close;
      }

      callback!(on_version, 3);
      move_to!(response_status, 4);
    }
    otherwise!(4) => fail!(UNEXPECTED_CHARACTER, "Expected HTTP version"),
    _ => suspend!(),
  }
});

state!(response_status, {
  match data {
    [digit!(), digit!(), digit!(), char!(' '), ..] => {
      parser.status = (data[0] - b'0') as u16 * 100 + (data[1] - b'0') as u16 * 10 + (data[2] - b'0') as u16;
      callback!(on_status, 3);
      move_to!(response_reason, 4);
    }
    // The reason phrase can be omitted altogether
    [digit!(), digit!(), digit!(), char!('\r'), char!('\n'), ..] => {
      parser.status = (data[0] - b'0') as u16 * 100 + (data[1] - b'0') as u16 * 10 + (data[2] - b'0') as u16;
      callback!(on_status, 3);
      move_to!(header_name, 5);
    }
    otherwise!(5) => fail!(INVALID_STATUS, "Expected HTTP response status"),
    _ => suspend!(),
  }
});

state!(response_reason, {
  consume!(token_value);

  match data[consumed..] {
    crlf!() => {
      if consumed > 0 {
        callback!(on_reason, consumed);
      }

      move_to!(header_name, consumed + 2);
    }
    otherwise!(2) => fail!(UNEXPECTED_CHARACTER, "Expected status reason"),
    _ => suspend!(),
  }
});
// #endregion response

// #region headers - Headers
// RFC 9112 section 5
state!(header_name, {
  // Special headers treating
  match data {
    case_insensitive_string!("content-length:") => {
      let status = parser.status;

      if parser.has_chunked_transfer_encoding {
        fail!(
          UNEXPECTED_CONTENT_LENGTH,
          "Unexpected Content-Length header when Transfer-Encoding header is present"
        );
      } else if status == 204 || status / 100 == 1 {
        fail!(
          UNEXPECTED_CONTENT_LENGTH,
          "Unexpected Content-Length header for a response with status 204 or 1xx"
        );
      } else if parser.has_content_length {
        fail!(INVALID_CONTENT_LENGTH, "Invalid duplicate Content-Length header");
      }

      parser.has_content_length = true;
      callback!(on_header_field, string_length!("content-length"));
      move_to!(header_content_length, string_length!("content-length", 1));
    }
    case_insensitive_string!("transfer-encoding:") => {
      if parser.has_content_length {
        fail!(
          UNEXPECTED_TRANSFER_ENCODING,
          "Unexpected Transfer-Encoding header when Content-Length header is present"
        );
      }

      callback!(on_header_field, string_length!("transfer-encoding"));
      move_to!(header_transfer_encoding, string_length!("transfer-encoding", 1));
    }
    case_insensitive_string!("connection:") => {
      callback!(on_header_field, string_length!("connection"));
      move_to!(header_connection, string_length!("connection", 1));
    }
    // RFC 9110 section 6.6.2
    case_insensitive_string!("trailer:") => {
      parser.has_trailers = true;
      callback!(on_header_field, string_length!("trailer"));
      move_to!(header_value, string_length!("trailer", 1));
    }
    // RFC 9110 section 7.8
    case_insensitive_string!("upgrade:") => {
      parser.has_upgrade = true;
      callback!(on_header_field, string_length!("upgrade"));
      move_to!(header_value, string_length!("upgrade", 1));
    }
    _ => {}
  }

  consume!(token);

  match data[consumed..] {
    [char!(':'), ..] if consumed > 0 => {
      callback!(on_header_field, consumed);
      move_to!(header_value, consumed + 1);
    }
    crlf!() if consumed == 0 => {
      parser.continue_without_data = true;
      move_to!(headers, 2);
    }
    otherwise!(2) => fail!(UNEXPECTED_CHARACTER, "Invalid header field name character"),
    _ => suspend!(),
  }
});

// RFC 9110 section 5.5 and 5.6
state!(header_value, {
  // Ignore leading OWS
  consume!(ws);

  if consumed > 0 {
    advance!(consumed);
  }

  consume!(token_value);

  // Strip trailing OWS
  let trimmed = trim_ows(&data[..consumed]).len();

  match data[consumed..] {
    double_crlf!() => {
      callback!(on_header_value, trimmed);
      parser.continue_without_data = true;
      move_to!(headers, consumed + 4);
    }
    crlf!() => {
      callback!(on_header_value, trimmed);
      move_to!(header_name, consumed + 2);
    }
    otherwise!(2) => fail!(UNEXPECTED_CHARACTER, "Invalid header field value character"),
    _ => suspend!(),
  }
});

// RFC 9112 section 6.2
state!(header_content_length, {
  consume!(ws);

  if consumed > 0 {
    advance!(consumed);
  }

  consume!(digit);

  if consumed == 0 {
    fail!(INVALID_CONTENT_LENGTH, "Invalid Content-Length header");
  }

  // Trailing OWS
  let mut end = consumed;

  while end < max && matches!(data[end], ws!()) {
    end += 1;
  }

  match data[end..] {
    crlf!() => {
      let Some(length) = parse_number(&data[..consumed], 10) else {
        fail!(INVALID_CONTENT_LENGTH, "Content-Length header is too large");
      };

      parser.content_length = length;
      parser.remaining_content_length = length;
      callback!(on_header_value, consumed);
      move_to!(header_name, end + 2);
    }
    otherwise!(2) => fail!(INVALID_CONTENT_LENGTH, "Invalid Content-Length header"),
    _ => suspend!(),
  }
});

// RFC 9112 section 6.1
state!(header_transfer_encoding, {
  consume!(ws);

  if consumed > 0 {
    advance!(consumed);
  }

  consume!(token_value);

  if consumed == 0 {
    fail!(INVALID_TRANSFER_ENCODING, "Invalid Transfer-Encoding header");
  }

  match data[consumed..] {
    crlf!() => {
      let value = trim_ows(&data[..consumed]);

      // A previous header specified chunked, which is no longer the last coding
      if parser.has_chunked_transfer_encoding {
        fail!(
          INVALID_TRANSFER_ENCODING,
          "The value \"chunked\" in the Transfer-Encoding header must be the last provided and can be provided only once"
        );
      }

      let mut codings = list_items(value).peekable();

      while let Some(coding) = codings.next() {
        if !coding.eq_ignore_ascii_case(b"chunked") {
          continue;
        }

        if codings.peek().is_some() {
          fail!(
            INVALID_TRANSFER_ENCODING,
            "The value \"chunked\" in the Transfer-Encoding header must be the last provided"
          );
        }

        parser.has_chunked_transfer_encoding = true;
      }

      callback!(on_header_value, value.len());
      move_to!(header_name, consumed + 2);
    }
    otherwise!(2) => fail!(INVALID_TRANSFER_ENCODING, "Invalid Transfer-Encoding header"),
    _ => suspend!(),
  }
});

// RFC 9110 section 7.6.1
state!(header_connection, {
  consume!(ws);

  if consumed > 0 {
    advance!(consumed);
  }

  consume!(token_value);

  match data[consumed..] {
    crlf!() => {
      let value = trim_ows(&data[..consumed]);

      for option in list_items(value) {
        if option.eq_ignore_ascii_case(b"close") {
          parser.connection = Connection::Close;
        } else if option.eq_ignore_ascii_case(b"keep-alive") {
          parser.connection = Connection::KeepAlive;
        } else if option.eq_ignore_ascii_case(b"upgrade") {
          parser.connection = Connection::Upgrade;
          parser.has_connection_upgrade = true;
        }
      }

      callback!(on_header_value, value.len());
      move_to!(header_name, consumed + 2);
    }
    otherwise!(2) => fail!(UNEXPECTED_CHARACTER, "Invalid header field value character"),
    _ => suspend!(),
  }
});

// RFC 9110 section 6.3, 7.8 and 9.3.6 - Headers have finished, check if the
// connection must be upgraded or a body is expected
state!(headers, {
  if parser.has_upgrade && !parser.has_connection_upgrade {
    fail!(
      MISSING_CONNECTION_UPGRADE,
      "Missing Connection header set to \"upgrade\" when using the Upgrade header"
    );
  }

  callback!(on_headers_complete);

  let is_request = parser.message_type == MessageType::Request;
  let method = parser.method;
  let status = parser.status;

  let switch_protocol = if is_request {
    parser.has_upgrade || method == METHOD_CONNECT
  } else {
    (parser.has_upgrade && status == 101) || (parser.is_connect && status / 100 == 2)
  };

  if switch_protocol {
    callback!(on_message_complete);
    move_to!(tunnel, 0);
  }

  if parser.has_trailers && !parser.has_chunked_transfer_encoding {
    fail!(
      UNEXPECTED_TRAILERS,
      "Trailers are not allowed when not using chunked transfer encoding"
    );
  }

  if is_request {
    if parser.has_chunked_transfer_encoding {
      move_to!(chunk_length, 0);
    } else if parser.content_length > 0 {
      move_to!(body_via_content_length, 0);
    }
  } else if !(parser.skip_body || status / 100 == 1 || status == 204 || status == 304) {
    if parser.has_chunked_transfer_encoding {
      move_to!(chunk_length, 0);
    } else if parser.content_length > 0 {
      move_to!(body_via_content_length, 0);
    } else if !parser.has_content_length {
      move_to!(body_with_no_length, 0);
    }
  }

  parser.continue_without_data = true;
  move_to!(complete, 0);
});
// #endregion headers

// RFC 9112 section 9.3 - Message completed
state!(complete, {
  callback!(on_message_complete);
  callback!(on_reset);

  if parser.connection == Connection::Close {
    callback!(on_finish);
    move_to!(finish, 0);
  }

  move_to!(start, 0);
});

// The connection is not in HTTP anymore, all data is left unconsumed
state!(tunnel, {
  suspend!();
});

// #region body - Body via Content-Length or connection end
// RFC 9112 section 6.2
state!(body_via_content_length, {
  if data.is_empty() {
    suspend!();
  }

  let available = data.len();
  let expected = parser.remaining_content_length;

  // Less data than what it is expected
  if (available as u64) < expected {
    parser.remaining_content_length -= available as u64;
    callback!(on_body, available);
    advance!(available);
  }

  let expected = expected as usize;
  parser.remaining_content_length = 0;
  callback!(on_body, expected);
  parser.continue_without_data = true;
  move_to!(complete, expected);
});

// RFC 9112 section 6.3 - Body with no length nor chunked encoding, only allowed
// in responses. It is completed by `finish`.
state!(body_with_no_length, {
  if data.is_empty() {
    suspend!();
  }

  callback!(on_body, data.len());
  advance!(data.len());
});
// #endregion body

// #region chunked - Body via chunked Transfer-Encoding
// RFC 9112 section 7.1
state!(chunk_length, {
  consume!(hex_digit);

  match data[consumed..] {
    [char!(';'), ..] if consumed > 0 => {
      let Some(length) = parse_number(&data[..consumed], 16) else {
        fail!(INVALID_CHUNK_SIZE, "Chunk length is too large");
      };

      parser.chunk_size = length;
      parser.remaining_chunk_size = length;
      callback!(on_chunk_header, consumed);
      move_to!(chunk_extension_name, consumed + 1);
    }
    crlf!() if consumed > 0 => {
      let Some(length) = parse_number(&data[..consumed], 16) else {
        fail!(INVALID_CHUNK_SIZE, "Chunk length is too large");
      };

      parser.chunk_size = length;
      parser.remaining_chunk_size = length;
      callback!(on_chunk_header, consumed);
      parser.continue_without_data = true;
      move_to!(chunk_data, consumed + 2);
    }
    otherwise!(2) => fail!(INVALID_CHUNK_SIZE, "Invalid chunk length character"),
    _ => suspend!(),
  }
});

state!(chunk_extension_name, {
  consume!(token);

  if consumed == 0 {
    fail!(UNEXPECTED_CHARACTER, "Invalid chunk extension name character");
  }

  match data[consumed..] {
    [char!('='), ..] => {
      callback!(on_chunk_extension_name, consumed);
      move_to!(chunk_extension_value, consumed + 1);
    }
    [char!(';'), ..] => {
      callback!(on_chunk_extension_name, consumed);
      move_to!(chunk_extension_name, consumed + 1);
    }
    crlf!() => {
      callback!(on_chunk_extension_name, consumed);
      parser.continue_without_data = true;
      move_to!(chunk_data, consumed + 2);
    }
    otherwise!(2) => fail!(UNEXPECTED_CHARACTER, "Invalid chunk extension name character"),
    _ => suspend!(),
  }
});

state!(chunk_extension_value, {
  if let [char!('"'), ..] = data {
    move_to!(chunk_extension_quoted_value, 1);
  }

  consume!(token);

  if consumed == 0 {
    fail!(UNEXPECTED_CHARACTER, "Invalid chunk extension value character");
  }

  match data[consumed..] {
    [char!(';'), ..] => {
      callback!(on_chunk_extension_value, consumed);
      move_to!(chunk_extension_name, consumed + 1);
    }
    crlf!() => {
      callback!(on_chunk_extension_value, consumed);
      parser.continue_without_data = true;
      move_to!(chunk_data, consumed + 2);
    }
    otherwise!(2) => fail!(UNEXPECTED_CHARACTER, "Invalid chunk extension value character"),
    _ => suspend!(),
  }
});

// RFC 9110 section 5.6.4
state!(chunk_extension_quoted_value, {
  let mut closing = None;
  let mut i = 0;

  while i < data.len() {
    match data[i] {
      char!('"') => {
        closing = Some(i);
        break;
      }
      // A quoted pair, the escaped character is validated like any other
      char!('\\') => {
        match data.get(i + 1).copied() {
          Some(token_value_quoted!()) => i += 2,
          Some(_) => fail!(UNEXPECTED_CHARACTER, "Invalid chunk extension quoted value character"),
          None => suspend!(),
        }
      }
      token_value_quoted!() => i += 1,
      _ => fail!(UNEXPECTED_CHARACTER, "Invalid chunk extension quoted value character"),
    }
  }

  let Some(closing) = closing else {
    suspend!();
  };

  match data[closing + 1..] {
    [char!(';'), ..] => {
      callback!(on_chunk_extension_value, closing);
      move_to!(chunk_extension_name, closing + 2);
    }
    crlf!() => {
      callback!(on_chunk_extension_value, closing);
      parser.continue_without_data = true;
      move_to!(chunk_data, closing + 3);
    }
    otherwise!(2) => fail!(UNEXPECTED_CHARACTER, "Invalid chunk extension quoted value"),
    _ => suspend!(),
  }
});

state!(chunk_data, {
  // The last chunk is followed by the trailers, if any
  if parser.chunk_size == 0 {
    move_to!(trailer_name, 0);
  }

  if data.is_empty() {
    suspend!();
  }

  let available = data.len();
  let expected = parser.remaining_chunk_size;

  // Less data than what it is expected for this chunk
  if (available as u64) < expected {
    parser.remaining_chunk_size -= available as u64;
    callback!(on_body, available);
    advance!(available);
  }

  let expected = expected as usize;
  parser.remaining_chunk_size = 0;
  callback!(on_body, expected);
  move_to!(chunk_end, expected);
});

state!(chunk_end, {
  match data {
    crlf!() => {
      callback!(on_chunk_complete);
      parser.chunk_size = 0;
      parser.remaining_chunk_size = 0;
      move_to!(chunk_length, 2);
    }
    otherwise!(2) => fail!(UNEXPECTED_CHARACTER, "Unexpected character after chunk data"),
    _ => suspend!(),
  }
});
// #endregion chunked

// #region trailers - Trailers
// RFC 9112 section 7.1.2
state!(trailer_name, {
  consume!(token);

  match data[consumed..] {
    [char!(':'), ..] if consumed > 0 => {
      callback!(on_header_field, consumed);
      move_to!(trailer_value, consumed + 1);
    }
    crlf!() if consumed == 0 => {
      callback!(on_chunk_complete);
      parser.continue_without_data = true;
      move_to!(complete, 2);
    }
    otherwise!(2) => fail!(UNEXPECTED_CHARACTER, "Invalid trailer field name character"),
    _ => suspend!(),
  }
});

state!(trailer_value, {
  consume!(ws);

  if consumed > 0 {
    advance!(consumed);
  }

  consume!(token_value);

  let trimmed = trim_ows(&data[..consumed]).len();

  match data[consumed..] {
    crlf!() => {
      callback!(on_header_value, trimmed);
      move_to!(trailer_name, consumed + 2);
    }
    otherwise!(2) => fail!(UNEXPECTED_CHARACTER, "Invalid trailer field value character"),
    _ => suspend!(),
  }
});
// #endregion trailers

generate_states!(
  start,
  finish,
  error,
  autodetect,
  request,
  request_method,
  request_url,
  request_protocol,
  request_version,
  response,
  response_version,
  response_status,
  response_reason,
  header_name,
  header_value,
  header_content_length,
  header_transfer_encoding,
  header_connection,
  headers,
  body_via_content_length,
  body_with_no_length,
  chunk_length,
  chunk_extension_name,
  chunk_extension_value,
  chunk_extension_quoted_value,
  chunk_data,
  chunk_end,
  trailer_name,
  trailer_value,
  complete,
  tunnel
);
