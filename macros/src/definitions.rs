use std::sync::OnceLock;

use proc_macro2::Ident;
use quote::format_ident;
use regex::{Captures, Regex};

static METHODS: OnceLock<Vec<String>> = OnceLock::new();
static WORD_START: OnceLock<Regex> = OnceLock::new();

/// Returns the list of known methods, in their numeric order.
///
/// The list is embedded at compile time so that the expansion does not depend
/// on the working directory of the compiler.
pub fn methods() -> &'static [String] {
  METHODS.get_or_init(|| {
    serde_yaml::from_str::<Vec<String>>(include_str!("methods.yml")).expect("methods.yml must be a list of strings")
  })
}

/// Returns the name of the constant holding the value of a method.
pub fn method_constant(method: &str) -> Ident { format_ident!("METHOD_{}", method.replace('-', "_")) }

/// Converts a snake case or screaming snake case name (`request_url`,
/// `UNEXPECTED_DATA`) to the camel case name of the enum variant
/// (`RequestUrl`, `UnexpectedData`).
pub fn variant(name: &Ident) -> Ident {
  let matcher = WORD_START.get_or_init(|| Regex::new(r"(?:^|_)([a-z0-9])").unwrap());
  let lowercase = name.to_string().to_lowercase();

  format_ident!(
    "{}",
    matcher.replace_all(&lowercase, |captures: &Captures| captures[1].to_uppercase())
  )
}
