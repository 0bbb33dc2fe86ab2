use std::ffi::c_int;
use std::fmt;
use std::fs::read_to_string;
use std::path::Path;
use std::ptr;
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use anyhow::{bail, ensure, Context, Result};
use clap::ValueEnum;
use mica::native::{mica_alloc, mica_execute, mica_free, mica_free_buffer, mica_malloc, Settings};
use mica::{Callbacks, Parser};
use regex::Regex;
use tracing::{debug, info};

pub use mica_test_utils::http;

/// How many bytes each sample parses, unless configured otherwise.
pub const DEFAULT_BUDGET: usize = 1 << 33;

/// The samples, in the order they are run.
pub const FIXTURE_NAMES: [&str; 3] = ["seanmonstar_httparse", "nodejs_http_parser", "undici"];

/// Log directives used when `RUST_LOG` is not set: the binary and this library.
pub const DEFAULT_LOG_FILTER: &str = "mica_bench=info,mica_benchmarks=info";

const MEGABYTE: f64 = (1024 * 1024) as f64;

static THOUSANDS: OnceLock<Option<Regex>> = OnceLock::new();

/// A named payload parsed over and over.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Fixture {
  pub name: String,
  pub payload: Vec<u8>,
}

impl Fixture {
  pub fn new(name: &str, payload: impl Into<Vec<u8>>) -> Fixture {
    Fixture {
      name: name.to_string(),
      payload: payload.into(),
    }
  }
}

// #region fixtures
/// Returns the built-in samples.
pub fn fixtures() -> Vec<Fixture> {
  let seanmonstar_httparse = http(
    r#"
      GET /wp-content/uploads/2010/03/hello-kitty-darth-vader-pink.jpg HTTP/1.1\r\n
      Host: www.kittyhell.com\r\n
      User-Agent: Mozilla/5.0 (Macintosh; U; Intel Mac OS X 10.6; ja-JP-mac; rv:1.9.2.3) Gecko/20100401 Firefox/3.6.3 Pathtraq/0.9\r\n
      Accept: text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8\r\n
      Accept-Language: ja,en-us;q=0.7,en;q=0.3\r\n
      Accept-Encoding: gzip,deflate\r\n
      Accept-Charset: Shift_JIS,utf-8;q=0.7,*;q=0.7\r\n
      Keep-Alive: 115\r\n
      Connection: keep-alive\r\n
      Cookie: wp_ozh_wsa_visits=2; wp_ozh_wsa_visit_lasttime=xxxxxxxxxx; __utma=xxxxxxxxx.xxxxxxxxxx.xxxxxxxxxx.xxxxxxxxxx.xxxxxxxxxx.x; __utmz=xxxxxxxxx.xxxxxxxxxx.x.x.utmccn=(referral)|utmcsr=reader.livedoor.com|utmcct=/reader/|utmcmd=referral\r\n\r\n
    "#,
  );

  let nodejs_http_parser = http(
    r#"
      POST /joyent/http-parser HTTP/1.1\r\n
      Host: github.com\r\n
      DNT: 1\r\n
      Accept-Encoding: gzip, deflate, sdch\r\n
      Accept-Language: ru-RU,ru;q=0.8,en-US;q=0.6,en;q=0.4\r\n
      User-Agent: Mozilla/5.0 (Macintosh; Intel Mac OS X 10_10_1)
      AppleWebKit/537.36 (KHTML, like Gecko)
      Chrome/39.0.2171.65 Safari/537.36\r\n
      Accept: text/html,application/xhtml+xml,application/xml;q=0.9,
      image/webp,*/*;q=0.8\r\n
      Referer: https://github.com/joyent/http-parser\r\n
      Connection: keep-alive\r\n
      Transfer-Encoding: chunked\r\n
      Cache-Control: max-age=0\r\n\r\nb\r\nhello world\r\n0\r\n\r\n
    "#,
  );

  let undici = http(&format!(
    r#"
      HTTP/1.1 200 OK\r\n
      Connection: keep-alive\r\n
      Content-Length: 65535\r\n
      Date: Sun, 05 Nov 2023 14:26:18 GMT\r\n
      Keep-Alive: timeout=600\r\n\r\n
      {}
    "#,
    "-".repeat(65535)
  ));

  vec![
    Fixture::new(FIXTURE_NAMES[0], seanmonstar_httparse),
    Fixture::new(FIXTURE_NAMES[1], nodejs_http_parser),
    Fixture::new(FIXTURE_NAMES[2], undici),
  ]
}

/// Loads the samples from `<dir>/<name>.txt`, written in the same escaped
/// format of the built-in ones.
pub fn load_fixtures(dir: &Path) -> Result<Vec<Fixture>> {
  FIXTURE_NAMES
    .iter()
    .map(|name| {
      let path = dir.join(format!("{}.txt", name));
      let content = read_to_string(&path).with_context(|| format!("cannot read fixture {}", path.display()))?;

      Ok(Fixture::new(name, http(&content)))
    })
    .collect()
}

/// Keeps only the samples with the given names, in the order they were
/// requested. An empty list keeps all of them.
pub fn select_fixtures(fixtures: Vec<Fixture>, names: &[String]) -> Result<Vec<Fixture>> {
  if names.is_empty() {
    return Ok(fixtures);
  }

  names
    .iter()
    .map(|name| match fixtures.iter().find(|fixture| &fixture.name == name) {
      Some(fixture) => Ok(fixture.clone()),
      None => bail!("unknown sample {} (available: {})", name, FIXTURE_NAMES.join(", ")),
    })
    .collect()
}
// #endregion fixtures

// #region drivers
/// How the parser is invoked.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Driver {
  /// Calls `Parser::parse` directly.
  Native,
  /// Goes through the C calling convention, copying the payload in a buffer
  /// owned by the library.
  Abi,
}

fn noop(_parser: &mut Parser, _data: &[u8]) -> isize { 0 }

extern "C" fn noop_hook(_parser: *mut Parser, _data: *const u8, _len: usize) -> c_int { 0 }

fn native_parser() -> Parser {
  let mut parser = Parser::new();

  parser.callbacks = Callbacks {
    on_message_begin: Some(noop),
    on_url: Some(noop),
    on_reason: Some(noop),
    on_header_field: Some(noop),
    on_header_value: Some(noop),
    on_headers_complete: Some(noop),
    on_body: Some(noop),
    on_message_complete: Some(noop),
    ..Callbacks::default()
  };

  parser
}

fn abi_settings() -> Settings {
  Settings {
    on_message_begin: Some(noop_hook),
    on_url: Some(noop_hook),
    on_status: Some(noop_hook),
    on_header_field: Some(noop_hook),
    on_header_value: Some(noop_hook),
    on_headers_complete: Some(noop_hook),
    on_body: Some(noop_hook),
    on_message_complete: Some(noop_hook),
  }
}

/// A parser created through `mica_alloc` and a library owned copy of the
/// payload. Both are released on drop.
struct AbiSession {
  parser: *mut Parser,
  buffer: *mut u8,
  len: usize,
}

impl AbiSession {
  fn new(payload: &[u8]) -> AbiSession {
    let settings = abi_settings();
    let len = payload.len();

    // SAFETY: the buffer was just allocated with room for the whole payload
    unsafe {
      let parser = mica_alloc(0, &settings);
      let buffer = mica_malloc(len);
      ptr::copy_nonoverlapping(payload.as_ptr(), buffer, len);

      AbiSession { parser, buffer, len }
    }
  }

  fn execute(&self) -> c_int {
    // SAFETY: both pointers are owned by the session
    unsafe { mica_execute(self.parser, self.buffer, self.len) }
  }

  fn parser(&self) -> &Parser {
    // SAFETY: mica_alloc never returns null
    unsafe { &*self.parser }
  }
}

impl Drop for AbiSession {
  fn drop(&mut self) {
    // SAFETY: each pointer is released exactly once
    unsafe {
      mica_free_buffer(self.buffer);
      mica_free(self.parser);
    }
  }
}

/// Parses a sample once and fails unless it is consumed entirely without
/// errors.
pub fn verify(fixture: &Fixture, driver: Driver) -> Result<()> {
  let len = fixture.payload.len();

  match driver {
    Driver::Native => {
      let mut parser = native_parser();
      let consumed = parser
        .try_parse(&fixture.payload)
        .with_context(|| format!("sample {} cannot be parsed", fixture.name))?;

      ensure!(
        consumed == len,
        "sample {} was only partially consumed ({} of {} bytes)",
        fixture.name,
        consumed,
        len
      );
    }
    Driver::Abi => {
      let session = AbiSession::new(&fixture.payload);
      let result = session.execute();
      let parser = session.parser();

      ensure!(
        result == 0,
        "sample {} cannot be parsed: {}: {}",
        fixture.name,
        parser.error_code_str(),
        parser.error_description_str()
      );

      ensure!(
        parser.unconsumed().is_empty(),
        "sample {} was only partially consumed ({} bytes left)",
        fixture.name,
        parser.unconsumed().len()
      );
    }
  }

  debug!(sample = %fixture.name, ?driver, bytes = len, "sample verified");
  Ok(())
}
// #endregion drivers

// #region measurement
/// How many times a payload of `len` bytes is parsed to process `budget`
/// bytes.
pub fn iterations(len: usize, budget: usize) -> usize {
  if len == 0 {
    return 0;
  }

  budget / len
}

/// The outcome of running a sample.
#[derive(Clone, Debug, PartialEq)]
pub struct Measurement {
  pub name: String,
  pub iterations: usize,
  pub payload_len: usize,
  pub elapsed: Duration,
}

impl Measurement {
  pub fn total_bytes(&self) -> usize { self.iterations * self.payload_len }

  pub fn seconds(&self) -> f64 { self.elapsed.as_secs_f64() }

  /// Bytes per second.
  pub fn bandwidth(&self) -> f64 { self.total_bytes() as f64 / self.seconds() }

  pub fn ops_per_sec(&self) -> f64 { self.iterations as f64 / self.seconds() }
}

impl fmt::Display for Measurement {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "{:>21} | {:>12} samples | {:>8} MB | {:>10} MB/s | {:>10} ops/sec | {:>6} s",
      self.name,
      format_number(self.iterations as f64, 0),
      format_number(self.total_bytes() as f64 / MEGABYTE, 2),
      format_number(self.bandwidth() / MEGABYTE, 2),
      format_number(self.ops_per_sec(), 2),
      format_number(self.seconds(), 2)
    )
  }
}

/// Formats a number with a fixed amount of decimals, grouping thousands with
/// underscores.
pub fn format_number(num: f64, precision: usize) -> String {
  let formatted = format!("{:.*}", precision, num);

  let (sign, unsigned) = match formatted.strip_prefix('-') {
    Some(rest) => ("-", rest),
    None => ("", formatted.as_str()),
  };

  let (integer, decimals) = match unsigned.split_once('.') {
    Some((integer, decimals)) => (integer, Some(decimals)),
    None => (unsigned, None),
  };

  let grouped = match THOUSANDS.get_or_init(|| Regex::new("([0-9]{3})").ok()) {
    Some(thousands) => {
      let reversed = integer.chars().rev().collect::<String>();
      let grouped = thousands.replace_all(&reversed, "${1}_");
      grouped.trim_end_matches('_').chars().rev().collect::<String>()
    }
    None => integer.to_string(),
  };

  match decimals {
    Some(decimals) => format!("{}{}.{}", sign, grouped, decimals),
    None => format!("{}{}", sign, grouped),
  }
}

/// Parses a sample repeatedly until the budget is exhausted. The result of
/// each iteration is discarded.
pub fn run(fixture: &Fixture, driver: Driver, budget: usize) -> Measurement {
  let len = fixture.payload.len();
  let iterations = iterations(len, budget);

  info!(sample = %fixture.name, ?driver, iterations, bytes = len, "running sample");

  let elapsed = match driver {
    Driver::Native => {
      let mut parser = native_parser();
      let payload = fixture.payload.as_slice();
      let start = Instant::now();

      for _ in 0..iterations {
        parser.parse(payload);
      }

      start.elapsed()
    }
    Driver::Abi => {
      let session = AbiSession::new(&fixture.payload);
      let start = Instant::now();

      for _ in 0..iterations {
        session.execute();
      }

      start.elapsed()
    }
  };

  Measurement {
    name: fixture.name.clone(),
    iterations,
    payload_len: len,
    elapsed,
  }
}
// #endregion measurement
