/// What the recording callbacks collect while a parser runs.
#[derive(Default)]
pub struct Context {
  /// One line per event, in the order they were emitted.
  pub output: String,
  /// The body of all messages, concatenated.
  pub body: Vec<u8>,
  pub url: String,
  pub verbose: bool,
}

impl Context {
  pub fn new(verbose: bool) -> Context {
    Context {
      verbose,
      ..Context::default()
    }
  }

  /// Returns the recorded events, skipping the body ones.
  ///
  /// Bodies are split in as many events as the input is, so this is what
  /// should be compared across different splits of the same input.
  pub fn output_without_body(&self) -> String {
    self
      .output
      .lines()
      .filter(|line| !line.contains("\"event\": \"body\""))
      .fold(String::new(), |acc, line| acc + line + "\n")
  }
}
