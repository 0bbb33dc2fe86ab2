#[cfg(test)]
mod test {
  use std::ffi::{c_int, c_void, CStr};
  use std::ptr;
  use std::slice;

  use mica::native::*;
  use mica::{Error, Parser, METHOD_POST};

  #[derive(Default)]
  struct Recorder {
    events: Vec<String>,
  }

  fn record(parser: *mut Parser, name: &str, data: *const u8, len: usize) {
    let recorder = unsafe { &mut *(mica_get_user_data(parser) as *mut Recorder) };
    let payload = if len > 0 {
      String::from_utf8_lossy(unsafe { slice::from_raw_parts(data, len) }).into_owned()
    } else {
      String::new()
    };

    recorder.events.push(format!("{}:{}", name, payload));
  }

  extern "C" fn on_message_begin(parser: *mut Parser, data: *const u8, len: usize) -> c_int {
    record(parser, "begin", data, len);
    0
  }

  extern "C" fn on_url(parser: *mut Parser, data: *const u8, len: usize) -> c_int {
    record(parser, "url", data, len);
    0
  }

  extern "C" fn on_status(parser: *mut Parser, data: *const u8, len: usize) -> c_int {
    record(parser, "status", data, len);
    0
  }

  extern "C" fn on_header_field(parser: *mut Parser, data: *const u8, len: usize) -> c_int {
    record(parser, "field", data, len);
    0
  }

  extern "C" fn on_header_value(parser: *mut Parser, data: *const u8, len: usize) -> c_int {
    record(parser, "value", data, len);
    0
  }

  extern "C" fn on_body(parser: *mut Parser, data: *const u8, len: usize) -> c_int {
    record(parser, "body", data, len);
    0
  }

  extern "C" fn on_message_complete(parser: *mut Parser, data: *const u8, len: usize) -> c_int {
    record(parser, "complete", data, len);
    0
  }

  extern "C" fn reject(_parser: *mut Parser, _data: *const u8, _len: usize) -> c_int { 1 }

  fn settings() -> Settings {
    let mut settings = Settings::default();
    unsafe { mica_settings_init(&mut settings) };

    settings.on_message_begin = Some(on_message_begin);
    settings.on_url = Some(on_url);
    settings.on_status = Some(on_status);
    settings.on_header_field = Some(on_header_field);
    settings.on_header_value = Some(on_header_value);
    settings.on_body = Some(on_body);
    settings.on_message_complete = Some(on_message_complete);
    settings
  }

  /// Copies a payload in a buffer owned by the library, as a foreign caller does.
  fn execute(parser: *mut Parser, payload: &[u8]) -> c_int {
    let buffer = mica_malloc(payload.len());

    unsafe {
      ptr::copy_nonoverlapping(payload.as_ptr(), buffer, payload.len());
      let result = mica_execute(parser, buffer, payload.len());
      mica_free_buffer(buffer);
      result
    }
  }

  #[test]
  fn request_through_hooks() {
    let settings = settings();
    let mut recorder = Recorder::default();

    unsafe {
      let parser = mica_alloc(1, &settings);
      mica_set_user_data(parser, &mut recorder as *mut Recorder as *mut c_void);

      let payload = b"POST /abc HTTP/1.1\r\nContent-Length: 3\r\n\r\nabc";

      for _ in 0..3 {
        assert_eq!(execute(parser, payload), Error::None as c_int);
      }

      assert_eq!(mica_get_method(parser), METHOD_POST);
      assert_eq!(mica_get_http_major(parser), 1);
      assert_eq!(mica_get_http_minor(parser), 1);
      assert_eq!(mica_should_keep_alive(parser), 1);
      assert_eq!(mica_get_error_code(parser), 0);

      mica_free(parser);
    }

    assert_eq!(recorder.events.len(), 18);
    assert_eq!(
      &recorder.events[..7],
      [
        "begin:",
        "url:/abc",
        "field:Content-Length",
        "value:3",
        "body:abc",
        "complete:",
        "begin:"
      ]
    );
  }

  #[test]
  fn status_hook_receives_the_reason() {
    let settings = settings();
    let mut recorder = Recorder::default();

    unsafe {
      let parser = mica_alloc(2, &settings);
      mica_set_user_data(parser, &mut recorder as *mut Recorder as *mut c_void);

      assert_eq!(
        execute(parser, b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\n\r\n"),
        0
      );
      assert_eq!(mica_get_status_code(parser), 404);

      mica_free(parser);
    }

    assert!(recorder.events.contains(&String::from("status:Not Found")));
  }

  #[test]
  fn failing_hook() {
    let mut settings = Settings::default();
    settings.on_headers_complete = Some(reject);

    unsafe {
      let parser = mica_alloc(0, &settings);

      let result = execute(parser, b"GET / HTTP/1.1\r\n\r\n");
      assert_eq!(result, Error::CallbackError as c_int);
      assert_eq!(mica_get_error_code(parser), Error::CallbackError as c_int);

      let description = mica_error_description(parser);
      assert_eq!(
        CStr::from_ptr(description).to_str(),
        Ok("Callback on_headers_complete failed with non zero return value.")
      );
      mica_free_string(description);

      // Reset makes the parser usable again
      mica_reset(parser);
      assert_eq!(mica_get_error_code(parser), 0);

      mica_free(parser);
    }
  }

  #[test]
  fn finish_and_pause() {
    unsafe {
      let parser = mica_alloc(2, ptr::null());

      assert_eq!(execute(parser, b"HTTP/1.1 200 OK\r\n\r\nbody"), 0);
      assert_eq!(mica_finish(parser), 0);

      mica_reset(parser);
      mica_pause(parser);
      assert_eq!(execute(parser, b"HTTP/1.1 200 OK\r\n"), Error::Paused as c_int);

      mica_resume(parser);
      assert_eq!(execute(parser, b"HTTP/1.1 200 OK\r\nContent-Length: 0\r\n\r\n"), 0);

      mica_free(parser);
    }
  }

  #[test]
  fn buffers_are_released_by_address() {
    for len in [0, 1, 7, 65535] {
      let buffer = mica_malloc(len);
      assert!(!buffer.is_null());

      unsafe {
        let contents = slice::from_raw_parts_mut(buffer, len);
        assert!(contents.iter().all(|b| *b == 0));
        contents.fill(b'-');

        mica_free_buffer(buffer);
      }
    }

    assert!(mica_malloc(usize::MAX).is_null());
  }

  #[test]
  fn null_parser() {
    unsafe {
      assert_eq!(
        mica_execute(ptr::null_mut(), ptr::null(), 0),
        Error::UnexpectedData as c_int
      );
      assert!(mica_get_user_data(ptr::null()).is_null());

      // These are no-ops
      mica_free(ptr::null_mut());
      mica_free_buffer(ptr::null_mut());
      mica_free_string(ptr::null_mut());
    }
  }
}
