//! The C calling convention of the parser.
//!
//! A buffer is allocated via `mica_malloc`, filled by the caller and handed to
//! `mica_execute` together with a parser created by `mica_alloc`. The parser
//! reports events through the hooks of a [`Settings`] structure.

use std::ffi::{c_char, c_int, c_void, CString};
use std::ptr;
use std::slice;

use crate::{buffer, Callbacks, Error, MessageType, Parser};

/// A hook invoked by the parser. Returning any value other than `0` fails the
/// parser.
pub type Hook = extern "C" fn(parser: *mut Parser, data: *const u8, len: usize) -> c_int;

/// The hooks of a parser. Missing hooks are skipped.
#[repr(C)]
#[derive(Clone, Copy, Default)]
pub struct Settings {
  pub on_message_begin: Option<Hook>,
  pub on_url: Option<Hook>,
  pub on_status: Option<Hook>,
  pub on_header_field: Option<Hook>,
  pub on_header_value: Option<Hook>,
  pub on_headers_complete: Option<Hook>,
  pub on_body: Option<Hook>,
  pub on_message_complete: Option<Hook>,
}

/// What a parser allocated via `mica_alloc` carries in its context.
struct Binding {
  settings: Settings,
  user_data: *mut c_void,
}

fn binding(parser: &Parser) -> Option<&Binding> { parser.context.as_ref()?.downcast_ref::<Binding>() }

fn forward(parser: &mut Parser, data: &[u8], select: fn(&Settings) -> Option<Hook>) -> isize {
  let Some(hook) = binding(parser).and_then(|binding| select(&binding.settings)) else {
    return 0;
  };

  hook(parser, data.as_ptr(), data.len()) as isize
}

fn on_message_begin(parser: &mut Parser, data: &[u8]) -> isize { forward(parser, data, |s| s.on_message_begin) }

fn on_url(parser: &mut Parser, data: &[u8]) -> isize { forward(parser, data, |s| s.on_url) }

fn on_status(parser: &mut Parser, data: &[u8]) -> isize { forward(parser, data, |s| s.on_status) }

fn on_header_field(parser: &mut Parser, data: &[u8]) -> isize { forward(parser, data, |s| s.on_header_field) }

fn on_header_value(parser: &mut Parser, data: &[u8]) -> isize { forward(parser, data, |s| s.on_header_value) }

fn on_headers_complete(parser: &mut Parser, data: &[u8]) -> isize { forward(parser, data, |s| s.on_headers_complete) }

fn on_body(parser: &mut Parser, data: &[u8]) -> isize { forward(parser, data, |s| s.on_body) }

fn on_message_complete(parser: &mut Parser, data: &[u8]) -> isize { forward(parser, data, |s| s.on_message_complete) }

/// Installs the parser callbacks forwarding to the hooks which are set.
///
/// As in llhttp, the status hook receives the reason phrase. The numeric
/// status is available via `mica_get_status_code`.
pub(crate) fn bind(settings: &Settings) -> Callbacks {
  Callbacks {
    on_message_begin: settings.on_message_begin.map(|_| on_message_begin as _),
    on_url: settings.on_url.map(|_| on_url as _),
    on_reason: settings.on_status.map(|_| on_status as _),
    on_header_field: settings.on_header_field.map(|_| on_header_field as _),
    on_header_value: settings.on_header_value.map(|_| on_header_value as _),
    on_headers_complete: settings.on_headers_complete.map(|_| on_headers_complete as _),
    on_body: settings.on_body.map(|_| on_body as _),
    on_message_complete: settings.on_message_complete.map(|_| on_message_complete as _),
    ..Callbacks::default()
  }
}

/// # Safety
///
/// Returns a mutable reference to a parser created by `mica_alloc`.
unsafe fn parser_mut<'a>(parser: *mut Parser) -> Option<&'a mut Parser> { parser.as_mut() }

/// Allocates a zeroed buffer of `len` bytes, or returns null on failure.
///
/// The buffer must be released via `mica_free_buffer`.
#[no_mangle]
pub extern "C" fn mica_malloc(len: usize) -> *mut u8 { buffer::allocate(len) }

/// # Safety
///
/// Releases a buffer allocated via `mica_malloc`. Its length is recorded by
/// the allocation.
#[no_mangle]
pub unsafe extern "C" fn mica_free_buffer(ptr: *mut u8) { buffer::release(ptr) }

/// # Safety
///
/// Clears all the hooks of a settings structure.
#[no_mangle]
pub unsafe extern "C" fn mica_settings_init(settings: *mut Settings) {
  if let Some(settings) = settings.as_mut() {
    *settings = Settings::default();
  }
}

/// # Safety
///
/// Creates a new parser for the given message type (`0` to autodetect, `1` for
/// requests, `2` for responses). The hooks are copied, so the settings can be
/// released afterwards.
#[no_mangle]
pub unsafe extern "C" fn mica_alloc(message_type: u8, settings: *const Settings) -> *mut Parser {
  let mode = MessageType::try_from(message_type).unwrap_or_default();
  let settings = settings.as_ref().copied().unwrap_or_default();

  let mut parser = Parser::with_mode(mode);
  parser.callbacks = bind(&settings);
  parser.context = Some(Box::new(Binding {
    settings,
    user_data: ptr::null_mut(),
  }));

  Box::into_raw(Box::new(parser))
}

/// # Safety
///
/// Destroys a parser.
#[no_mangle]
pub unsafe extern "C" fn mica_free(parser: *mut Parser) {
  if parser.is_null() {
    return;
  }

  drop(Box::from_raw(parser));
}

/// # Safety
///
/// Parses `len` bytes starting at `data` and returns the parser error code.
/// `0` means that all data was consumed or retained for the next call.
#[no_mangle]
pub unsafe extern "C" fn mica_execute(parser: *mut Parser, data: *const u8, len: usize) -> c_int {
  let Some(parser) = parser_mut(parser) else {
    return Error::UnexpectedData as c_int;
  };

  let data: &[u8] = if data.is_null() || len == 0 {
    &[]
  } else {
    slice::from_raw_parts(data, len)
  };

  parser.execute(data) as c_int
}

/// # Safety
///
/// Pauses the parser. It will have to be resumed via `mica_resume`.
#[no_mangle]
pub unsafe extern "C" fn mica_pause(parser: *mut Parser) {
  if let Some(parser) = parser_mut(parser) {
    parser.pause();
  }
}

/// # Safety
///
/// Resumes the parser.
#[no_mangle]
pub unsafe extern "C" fn mica_resume(parser: *mut Parser) {
  if let Some(parser) = parser_mut(parser) {
    parser.resume();
  }
}

/// # Safety
///
/// Signals the end of the input and returns the parser error code.
#[no_mangle]
pub unsafe extern "C" fn mica_finish(parser: *mut Parser) -> c_int {
  let Some(parser) = parser_mut(parser) else {
    return Error::UnexpectedData as c_int;
  };

  parser.finish();
  parser.status_code() as c_int
}

/// # Safety
///
/// Resets the parser to its initial state. Hooks and user data are kept.
#[no_mangle]
pub unsafe extern "C" fn mica_reset(parser: *mut Parser) {
  if let Some(parser) = parser_mut(parser) {
    parser.reset(false);
  }
}

/// # Safety
///
/// Returns the parser error code.
#[no_mangle]
pub unsafe extern "C" fn mica_get_error_code(parser: *const Parser) -> c_int { (*parser).error_code as c_int }

/// # Safety
///
/// Returns the method of the current request.
#[no_mangle]
pub unsafe extern "C" fn mica_get_method(parser: *const Parser) -> u8 { (*parser).method }

/// # Safety
///
/// Returns the status of the current response.
#[no_mangle]
pub unsafe extern "C" fn mica_get_status_code(parser: *const Parser) -> u16 { (*parser).status }

/// # Safety
///
/// Returns the major HTTP version of the current message.
#[no_mangle]
pub unsafe extern "C" fn mica_get_http_major(parser: *const Parser) -> u8 { (*parser).version_major }

/// # Safety
///
/// Returns the minor HTTP version of the current message.
#[no_mangle]
pub unsafe extern "C" fn mica_get_http_minor(parser: *const Parser) -> u8 { (*parser).version_minor }

/// # Safety
///
/// Returns `1` if the connection can be reused after the current message.
#[no_mangle]
pub unsafe extern "C" fn mica_should_keep_alive(parser: *const Parser) -> c_int {
  c_int::from((*parser).should_keep_alive())
}

/// # Safety
///
/// Returns the user data attached to the parser.
#[no_mangle]
pub unsafe extern "C" fn mica_get_user_data(parser: *const Parser) -> *mut c_void {
  parser
    .as_ref()
    .and_then(binding)
    .map_or(ptr::null_mut(), |binding| binding.user_data)
}

/// # Safety
///
/// Attaches user data to the parser.
#[no_mangle]
pub unsafe extern "C" fn mica_set_user_data(parser: *mut Parser, data: *mut c_void) {
  let binding = parser_mut(parser)
    .and_then(|parser| parser.context.as_mut())
    .and_then(|context| context.downcast_mut::<Binding>());

  if let Some(binding) = binding {
    binding.user_data = data;
  }
}

/// # Safety
///
/// Returns the description of the parser error as a NUL terminated string.
///
/// The returned value must be freed using `mica_free_string`.
#[no_mangle]
pub unsafe extern "C" fn mica_error_description(parser: *const Parser) -> *mut c_char {
  let description = (*parser).error_description.replace('\0', "");

  match CString::new(description) {
    Ok(value) => value.into_raw(),
    Err(_) => ptr::null_mut(),
  }
}

/// # Safety
///
/// Cleans up memory used by a string previously returned by
/// `mica_error_description`.
#[no_mangle]
pub unsafe extern "C" fn mica_free_string(value: *mut c_char) {
  if !value.is_null() {
    drop(CString::from_raw(value));
  }
}
