//! An incremental HTTP/1.x parser.
//!
//! Data is fed via [`Parser::parse`] (or the llhttp shaped [`Parser::execute`])
//! in slices of any size. The parser reports the message components through
//! the [`Callbacks`], each receiving a view of the input.

use std::any::Any;
use std::mem;

use mica_macros::{generate_errors, generate_methods};
#[cfg(feature = "debug")]
use tracing::trace;
use tracing::debug;

mod buffer;
#[cfg(not(target_family = "wasm"))]
pub mod native;
mod states;
#[cfg(target_family = "wasm")]
pub mod wasm;

pub use states::State;
use states::apply_state;

/// Returned by a state which needs more data to proceed.
pub const SUSPEND: isize = -1;

generate_errors!(
  NONE,
  UNEXPECTED_DATA,
  UNEXPECTED_EOF,
  CALLBACK_ERROR,
  UNEXPECTED_CHARACTER,
  UNEXPECTED_CONTENT_LENGTH,
  UNEXPECTED_TRANSFER_ENCODING,
  UNEXPECTED_CONTENT,
  UNEXPECTED_TRAILERS,
  INVALID_VERSION,
  INVALID_STATUS,
  INVALID_CONTENT_LENGTH,
  INVALID_TRANSFER_ENCODING,
  INVALID_CHUNK_SIZE,
  MISSING_CONNECTION_UPGRADE,
  UNSUPPORTED_HTTP_VERSION,
  PAUSED,
  PAUSED_UPGRADE
);

generate_methods!();

/// The kind of messages the parser accepts.
#[repr(u8)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MessageType {
  /// Detect from the first bytes of every message.
  #[default]
  Autodetect = 0,
  Request    = 1,
  Response   = 2,
}

impl TryFrom<u8> for MessageType {
  type Error = u8;

  fn try_from(value: u8) -> Result<Self, u8> {
    match value {
      0 => Ok(MessageType::Autodetect),
      1 => Ok(MessageType::Request),
      2 => Ok(MessageType::Response),
      _ => Err(value),
    }
  }
}

/// What happens to the connection once the current message completes.
#[repr(u8)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Connection {
  #[default]
  KeepAlive = 0,
  Close     = 1,
  Upgrade   = 2,
}

/// A callback invoked by the parser.
///
/// The slice is a view of the input related to the event, empty for events
/// carrying no data. Returning any value other than `0` fails the parser with
/// [`Error::CallbackError`].
pub type Callback = fn(&mut Parser, &[u8]) -> isize;

/// The callbacks of a parser. Missing callbacks are simply skipped.
#[derive(Clone, Copy, Default)]
pub struct Callbacks {
  pub on_message_begin: Option<Callback>,
  pub on_method: Option<Callback>,
  pub on_url: Option<Callback>,
  pub on_version: Option<Callback>,
  pub on_status: Option<Callback>,
  pub on_reason: Option<Callback>,
  pub on_header_field: Option<Callback>,
  pub on_header_value: Option<Callback>,
  pub on_headers_complete: Option<Callback>,
  pub on_chunk_header: Option<Callback>,
  pub on_chunk_extension_name: Option<Callback>,
  pub on_chunk_extension_value: Option<Callback>,
  pub on_chunk_complete: Option<Callback>,
  pub on_body: Option<Callback>,
  pub on_message_complete: Option<Callback>,
  pub on_reset: Option<Callback>,
  pub on_error: Option<Callback>,
  pub on_finish: Option<Callback>,
}

/// A parser failure, as returned by [`Parser::try_parse`].
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{code}: {description}")]
pub struct ParseError {
  pub code: Error,
  pub description: String,
}

pub struct Parser {
  // User writable configuration
  pub mode: MessageType,
  pub manage_unconsumed: bool,
  pub skip_body: bool,
  pub is_connect: bool,
  pub context: Option<Box<dyn Any>>,
  pub callbacks: Callbacks,

  // Progress
  pub state: State,
  pub position: usize,
  pub parsed: u64,
  pub paused: bool,
  pub error_code: Error,
  pub error_description: String,

  // Current message
  pub message_type: MessageType,
  pub method: u8,
  pub status: u16,
  pub version_major: u8,
  pub version_minor: u8,
  pub connection: Connection,
  pub content_length: u64,
  pub remaining_content_length: u64,
  pub chunk_size: u64,
  pub remaining_chunk_size: u64,
  pub has_content_length: bool,
  pub has_chunked_transfer_encoding: bool,
  pub has_upgrade: bool,
  pub has_connection_upgrade: bool,
  pub has_trailers: bool,

  pub(crate) continue_without_data: bool,
  unconsumed: Vec<u8>,
}

impl Default for Parser {
  fn default() -> Self { Parser::new() }
}

impl Parser {
  /// Creates a new parser autodetecting the message type.
  pub fn new() -> Parser { Parser::with_mode(MessageType::Autodetect) }

  /// Creates a new parser which only accepts the given message type.
  pub fn with_mode(mode: MessageType) -> Parser {
    Parser {
      mode,
      manage_unconsumed: false,
      skip_body: false,
      is_connect: false,
      context: None,
      callbacks: Callbacks::default(),
      state: State::Start,
      position: 0,
      parsed: 0,
      paused: false,
      error_code: Error::None,
      error_description: String::new(),
      message_type: MessageType::Autodetect,
      method: 0,
      status: 0,
      version_major: 0,
      version_minor: 0,
      connection: Connection::KeepAlive,
      content_length: 0,
      remaining_content_length: 0,
      chunk_size: 0,
      remaining_chunk_size: 0,
      has_content_length: false,
      has_chunked_transfer_encoding: false,
      has_upgrade: false,
      has_connection_upgrade: false,
      has_trailers: false,
      continue_without_data: false,
      unconsumed: Vec::new(),
    }
  }

  /// Resets the parser to its initial state. Configuration, callbacks and
  /// context are preserved. The parsed counter is only cleared when
  /// `keep_parsed` is false.
  pub fn reset(&mut self, keep_parsed: bool) {
    self.state = State::Start;
    self.position = 0;
    self.paused = false;
    self.error_code = Error::None;
    self.error_description.clear();
    self.continue_without_data = false;
    self.unconsumed.clear();
    self.message_type = MessageType::Autodetect;
    self.clear();

    if !keep_parsed {
      self.parsed = 0;
    }

    if let Some(cb) = self.callbacks.on_reset {
      let _ = cb(self, &[]);
    }
  }

  /// Clears the values of the current message.
  pub fn clear(&mut self) {
    self.method = 0;
    self.status = 0;
    self.version_major = 0;
    self.version_minor = 0;
    self.connection = Connection::KeepAlive;
    self.content_length = 0;
    self.remaining_content_length = 0;
    self.chunk_size = 0;
    self.remaining_chunk_size = 0;
    self.has_content_length = false;
    self.has_chunked_transfer_encoding = false;
    self.has_upgrade = false;
    self.has_connection_upgrade = false;
    self.has_trailers = false;
  }

  /// Parses a slice of bytes and returns the number of consumed bytes.
  ///
  /// When `manage_unconsumed` is set, the bytes which could not be consumed
  /// yet are retained and prepended to the data of the next call. In that
  /// case the returned value also counts the retained bytes once they are
  /// consumed.
  pub fn parse(&mut self, data: &[u8]) -> usize { self.parse_input(data, self.manage_unconsumed) }

  /// Parses a slice of bytes, consuming all of it, and returns the parser
  /// status.
  ///
  /// Unconsumed bytes are always retained for the next call. Once the
  /// connection switched protocol, only the bytes following the upgrade are
  /// kept and later data is ignored.
  ///
  /// The returned value is [`Error::None`] on success, [`Error::Paused`] if a
  /// callback paused the parser, [`Error::PausedUpgrade`] if the connection
  /// switched to another protocol, the error code otherwise.
  pub fn execute(&mut self, data: &[u8]) -> Error {
    if self.state == State::Error {
      return self.error_code;
    }

    self.parse_input(data, true);
    self.status_code()
  }

  /// Parses a slice of bytes and returns the number of consumed bytes or the
  /// parser failure.
  pub fn try_parse(&mut self, data: &[u8]) -> Result<usize, ParseError> {
    let consumed = self.parse(data);

    if self.state == State::Error {
      return Err(ParseError {
        code: self.error_code,
        description: self.error_description.clone(),
      });
    }

    Ok(consumed)
  }

  fn parse_input(&mut self, data: &[u8], retain: bool) -> usize {
    // If the parser is paused, failed or tunneling, this is a no-op. A tunnel
    // only retains the data following the upgrade in the call which entered it
    if self.paused || self.state == State::Error || self.state == State::Tunnel {
      return 0;
    }

    // Prepend unconsumed data from previous iteration if needed
    let unconsumed = mem::take(&mut self.unconsumed);
    let aggregate: Vec<u8>;

    let input = if unconsumed.is_empty() {
      data
    } else {
      aggregate = [unconsumed.as_slice(), data].concat();
      aggregate.as_slice()
    };

    let limit = input.len();
    let mut current = input;
    let mut consumed = 0;
    self.position = 0;

    // Until there is data or there is a request to continue
    while !current.is_empty() || self.continue_without_data {
      self.continue_without_data = false;

      #[cfg(feature = "debug")]
      let previous = self.state;

      let result = apply_state(self, current);

      #[cfg(feature = "debug")]
      trace!(from = %previous, to = %self.state, result, position = self.position, "state applied");

      if self.state == State::Error {
        self.notify_error();
        break;
      } else if result == SUSPEND {
        break;
      }

      // States only return non negative values besides SUSPEND
      let advance = result as usize;
      consumed += advance;
      self.position += advance;
      current = &current[advance..];

      // If a callback paused the parser, break now
      if self.paused {
        break;
      }
    }

    self.parsed += consumed as u64;

    if retain && consumed < limit && self.state != State::Error {
      self.unconsumed = current.to_vec();
    }

    consumed
  }

  /// Returns the status of the parser as reported by `execute`.
  pub fn status_code(&self) -> Error {
    match self.state {
      State::Error => self.error_code,
      State::Tunnel => Error::PausedUpgrade,
      _ if self.paused => Error::Paused,
      _ => Error::None,
    }
  }

  /// Pauses the parser. It will have to be resumed via `resume`.
  pub fn pause(&mut self) { self.paused = true; }

  /// Resumes the parser.
  pub fn resume(&mut self) { self.paused = false; }

  /// Marks the parser as finished. Any new data received via `parse` will
  /// put the parser in the error state.
  ///
  /// If a message is in progress, the parser fails with
  /// [`Error::UnexpectedEof`], unless the message body is delimited by the
  /// end of the connection.
  pub fn finish(&mut self) {
    match self.state {
      State::Error | State::Finish => (),
      State::BodyWithNoLength | State::Tunnel => {
        if self.state == State::BodyWithNoLength {
          if let Some(cb) = self.callbacks.on_message_complete {
            if cb(self, &[]) != 0 {
              self.fail(
                Error::CallbackError,
                "Callback on_message_complete failed with non zero return value.",
              );
              self.notify_error();
              return;
            }
          }
        }

        self.complete_finish();
      }
      State::Start | State::Autodetect | State::Request | State::Response if self.unconsumed.is_empty() => {
        self.complete_finish();
      }
      _ => {
        self.fail(Error::UnexpectedEof, "Unexpected end of data");
        self.notify_error();
      }
    }
  }

  fn complete_finish(&mut self) {
    self.state = State::Finish;

    if let Some(cb) = self.callbacks.on_finish {
      let _ = cb(self, &[]);
    }
  }

  /// Marks the parser as failed, setting an error code and an error message.
  ///
  /// It always returns `SUSPEND` so that states can return it directly.
  pub fn fail(&mut self, code: Error, reason: impl Into<String>) -> isize {
    self.error_code = code;
    self.error_description = reason.into();
    self.state = State::Error;

    debug!(
      code = code.as_str(),
      position = self.position,
      "parser failed: {}",
      self.error_description
    );

    SUSPEND
  }

  fn notify_error(&mut self) {
    if let Some(cb) = self.callbacks.on_error {
      let _ = cb(self, &[]);
    }
  }

  /// Moves the parser to a new state, returning the number of consumed bytes.
  #[inline(always)]
  pub(crate) fn move_to(&mut self, state: State, advance: isize) -> isize {
    self.state = state;
    advance
  }

  /// Returns true if the connection can be reused once the current message
  /// completes.
  pub fn should_keep_alive(&self) -> bool { self.connection == Connection::KeepAlive }

  /// Returns true if the connection switched to another protocol and the
  /// parser stopped consuming data.
  pub fn is_upgraded(&self) -> bool { self.state == State::Tunnel }

  /// Returns the bytes retained from previous calls and not consumed yet.
  pub fn unconsumed(&self) -> &[u8] { &self.unconsumed }

  /// Returns the current method name, if the message is a request.
  pub fn method_str(&self) -> Option<&'static str> {
    if self.message_type == MessageType::Request {
      METHODS.get(self.method as usize).copied()
    } else {
      None
    }
  }

  /// Returns the current parser's state as string.
  pub fn state_str(&self) -> &'static str { self.state.as_str() }

  /// Returns the current parser's error code as string.
  pub fn error_code_str(&self) -> &'static str { self.error_code.as_str() }

  /// Returns the current parser's error description.
  pub fn error_description_str(&self) -> &str { &self.error_description }
}
