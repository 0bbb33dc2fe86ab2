//! The WebAssembly surface of the parser.
//!
//! The host allocates a buffer in the linear memory via `malloc`, copies a
//! payload into it and calls `execute`. Events are delivered to the functions
//! the host provides in the `env` import module.

use core::ffi::c_void;
use std::slice;

use wasm_bindgen::prelude::wasm_bindgen;

use crate::{buffer, Callbacks, Error, MessageType, Parser};

#[link(wasm_import_module = "env")]
extern "C" {
  fn wasm_on_message_begin(parser: *mut c_void, at: *const u8, len: usize) -> i32;
  fn wasm_on_url(parser: *mut c_void, at: *const u8, len: usize) -> i32;
  fn wasm_on_status(parser: *mut c_void, at: *const u8, len: usize) -> i32;
  fn wasm_on_header_field(parser: *mut c_void, at: *const u8, len: usize) -> i32;
  fn wasm_on_header_value(parser: *mut c_void, at: *const u8, len: usize) -> i32;
  fn wasm_on_headers_complete(parser: *mut c_void, at: *const u8, len: usize) -> i32;
  fn wasm_on_body(parser: *mut c_void, at: *const u8, len: usize) -> i32;
  fn wasm_on_message_complete(parser: *mut c_void, at: *const u8, len: usize) -> i32;
}

macro_rules! forward {
  ($name:ident, $import:ident) => {
    fn $name(parser: &mut Parser, data: &[u8]) -> isize {
      let parser = parser as *mut Parser as *mut c_void;
      unsafe { $import(parser, data.as_ptr(), data.len()) as isize }
    }
  };
}

forward!(on_message_begin, wasm_on_message_begin);
forward!(on_url, wasm_on_url);
forward!(on_status, wasm_on_status);
forward!(on_header_field, wasm_on_header_field);
forward!(on_header_value, wasm_on_header_value);
forward!(on_headers_complete, wasm_on_headers_complete);
forward!(on_body, wasm_on_body);
forward!(on_message_complete, wasm_on_message_complete);

#[cfg(debug_assertions)]
#[wasm_bindgen(start)]
fn init_error_handler() { std::panic::set_hook(Box::new(console_error_panic_hook::hook)); }

/// Allocates a zeroed buffer of `len` bytes in the linear memory.
#[wasm_bindgen(js_name = malloc)]
pub fn allocate_buffer(len: usize) -> *mut u8 { buffer::allocate(len) }

/// Releases a buffer allocated via `malloc`.
#[wasm_bindgen(js_name = free)]
pub fn free_buffer(ptr: *mut u8) { unsafe { buffer::release(ptr) } }

/// Creates a new parser wired to the hooks of the `env` module.
#[wasm_bindgen]
pub fn alloc(message_type: u8) -> *mut c_void {
  let mut parser = Parser::with_mode(MessageType::try_from(message_type).unwrap_or_default());

  // As in llhttp, the status hook receives the reason phrase
  parser.callbacks = Callbacks {
    on_message_begin: Some(on_message_begin),
    on_url: Some(on_url),
    on_reason: Some(on_status),
    on_header_field: Some(on_header_field),
    on_header_value: Some(on_header_value),
    on_headers_complete: Some(on_headers_complete),
    on_body: Some(on_body),
    on_message_complete: Some(on_message_complete),
    ..Callbacks::default()
  };

  Box::into_raw(Box::new(parser)) as *mut c_void
}

/// Parses `len` bytes starting at `data` and returns the parser error code.
#[wasm_bindgen]
pub fn execute(raw: *mut c_void, data: *const u8, len: usize) -> u8 {
  let Some(parser) = (unsafe { (raw as *mut Parser).as_mut() }) else {
    return Error::UnexpectedData as u8;
  };

  let data: &[u8] = if data.is_null() || len == 0 {
    &[]
  } else {
    unsafe { slice::from_raw_parts(data, len) }
  };

  parser.execute(data) as u8
}

/// Destroys a parser.
#[wasm_bindgen]
pub fn destroy(raw: *mut c_void) {
  if raw.is_null() {
    return;
  }

  unsafe { drop(Box::from_raw(raw as *mut Parser)) }
}
