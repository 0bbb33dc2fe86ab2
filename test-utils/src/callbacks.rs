use mica::{MessageType, Parser};

use crate::context::Context;

pub fn context_mut(parser: &mut Parser) -> &mut Context {
  parser
    .context
    .as_mut()
    .and_then(|context| context.downcast_mut::<Context>())
    .expect("the parser was not created by create_parser")
}

fn append_output(parser: &mut Parser, message: String, data: &[u8]) -> isize {
  let formatted = format!(
    "{{ {}, \"data\": {} }}\n",
    message,
    if data.is_empty() {
      "null".into()
    } else {
      format!("\"{}\"", String::from_utf8_lossy(data))
    }
  );

  let context = context_mut(parser);

  if context.verbose {
    print!("{}", formatted);
  }

  context.output.push_str(&formatted);
  0
}

fn event(parser: &mut Parser, name: &str, data: &[u8]) -> isize {
  append_output(parser, format!("\"event\": \"{}\"", name), data)
}

pub fn on_message_begin(parser: &mut Parser, data: &[u8]) -> isize { event(parser, "begin", data) }

pub fn on_method(parser: &mut Parser, data: &[u8]) -> isize { event(parser, "method", data) }

pub fn on_url(parser: &mut Parser, data: &[u8]) -> isize {
  context_mut(parser).url = String::from_utf8_lossy(data).into_owned();
  event(parser, "url", data)
}

pub fn on_version(parser: &mut Parser, data: &[u8]) -> isize { event(parser, "version", data) }

pub fn on_status(parser: &mut Parser, data: &[u8]) -> isize { event(parser, "status", data) }

pub fn on_reason(parser: &mut Parser, data: &[u8]) -> isize { event(parser, "reason", data) }

pub fn on_header_field(parser: &mut Parser, data: &[u8]) -> isize { event(parser, "header_field", data) }

pub fn on_header_value(parser: &mut Parser, data: &[u8]) -> isize { event(parser, "header_value", data) }

pub fn on_headers_complete(parser: &mut Parser, data: &[u8]) -> isize {
  let version = format!("{}.{}", parser.version_major, parser.version_minor);

  let body = if parser.has_chunked_transfer_encoding {
    String::from("chunked")
  } else if parser.has_content_length {
    format!("length={}", parser.content_length)
  } else {
    String::from("none")
  };

  let message = if parser.message_type == MessageType::Response {
    format!(
      "\"event\": \"headers\", \"type\": \"response\", \"version\": \"{}\", \"status\": {}, \"body\": \"{}\"",
      version, parser.status, body
    )
  } else {
    let url = context_mut(parser).url.clone();

    format!(
      "\"event\": \"headers\", \"type\": \"request\", \"method\": \"{}\", \"url\": \"{}\", \"version\": \"{}\", \
       \"body\": \"{}\"",
      parser.method_str().unwrap_or("UNKNOWN"),
      url,
      version,
      body
    )
  };

  append_output(parser, message, data)
}

pub fn on_chunk_header(parser: &mut Parser, data: &[u8]) -> isize { event(parser, "chunk_header", data) }

pub fn on_chunk_extension_name(parser: &mut Parser, data: &[u8]) -> isize {
  event(parser, "chunk_extension_name", data)
}

pub fn on_chunk_extension_value(parser: &mut Parser, data: &[u8]) -> isize {
  event(parser, "chunk_extension_value", data)
}

pub fn on_chunk_complete(parser: &mut Parser, data: &[u8]) -> isize { event(parser, "chunk_complete", data) }

pub fn on_body(parser: &mut Parser, data: &[u8]) -> isize {
  context_mut(parser).body.extend_from_slice(data);
  event(parser, "body", data)
}

pub fn on_message_complete(parser: &mut Parser, data: &[u8]) -> isize { event(parser, "complete", data) }

pub fn on_reset(parser: &mut Parser, data: &[u8]) -> isize { event(parser, "reset", data) }

pub fn on_error(parser: &mut Parser, data: &[u8]) -> isize {
  let message = format!(
    "\"event\": \"error\", \"error_code\": \"{}\", \"reason\": \"{}\"",
    parser.error_code_str(),
    parser.error_description_str()
  );

  append_output(parser, message, data)
}

pub fn on_finish(parser: &mut Parser, data: &[u8]) -> isize { event(parser, "finish", data) }
