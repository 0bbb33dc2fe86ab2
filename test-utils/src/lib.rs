use std::env;

use mica::{Callbacks, Parser};
use regex::Regex;

pub mod callbacks;
pub mod context;

pub use context::Context;

/// Creates a parser recording all the events in its context.
///
/// Set `DEBUG_TESTS=true` to also print the events while they happen.
pub fn create_parser() -> Parser {
  let mut parser = Parser::new();
  let verbose = env::var_os("DEBUG_TESTS").unwrap_or("false".into()) == "true";

  parser.context = Some(Box::new(Context::new(verbose)));
  parser.callbacks = Callbacks {
    on_message_begin: Some(callbacks::on_message_begin),
    on_method: Some(callbacks::on_method),
    on_url: Some(callbacks::on_url),
    on_version: Some(callbacks::on_version),
    on_status: Some(callbacks::on_status),
    on_reason: Some(callbacks::on_reason),
    on_header_field: Some(callbacks::on_header_field),
    on_header_value: Some(callbacks::on_header_value),
    on_headers_complete: Some(callbacks::on_headers_complete),
    on_chunk_header: Some(callbacks::on_chunk_header),
    on_chunk_extension_name: Some(callbacks::on_chunk_extension_name),
    on_chunk_extension_value: Some(callbacks::on_chunk_extension_value),
    on_chunk_complete: Some(callbacks::on_chunk_complete),
    on_body: Some(callbacks::on_body),
    on_message_complete: Some(callbacks::on_message_complete),
    on_reset: Some(callbacks::on_reset),
    on_error: Some(callbacks::on_error),
    on_finish: Some(callbacks::on_finish),
  };

  parser
}

/// Returns the context of a parser created by `create_parser`.
pub fn context(parser: &Parser) -> &Context {
  parser
    .context
    .as_ref()
    .and_then(|context| context.downcast_ref::<Context>())
    .expect("the parser was not created by create_parser")
}

/// Turns an indented literal into a HTTP message.
///
/// Leading whitespace and newlines are removed, then the `\r`, `\n` and `\s`
/// escapes are replaced by CR, LF and space.
pub fn http(input: &str) -> String {
  let leading_ws = Regex::new(r"(?m)^\s+").unwrap();

  leading_ws
    .replace_all(input.trim(), "")
    .replace('\n', "")
    .replace("\\r", "\r")
    .replace("\\n", "\n")
    .replace("\\s", " ")
}

/// Normalizes an expected event log.
pub fn output(input: &str) -> String {
  let leading_ws = Regex::new(r"(?m)^\s+").unwrap();

  leading_ws.replace_all(input.trim(), "").into_owned() + "\n"
}

pub fn parse(parser: &mut Parser, content: &str) -> usize { parser.parse(content.as_bytes()) }
