//! Procedural macros used to write the mica parser states in a declarative
//! way.
//!
//! Matchers expand to patterns and can be used in `match` arms. Actions expand
//! to statements and are meant to be used inside `state!` bodies, where the
//! `parser` and `data` variables are always available. Generators expand to
//! whole items.

mod actions;
mod definitions;
mod generators;
mod matchers;
mod parsing;

use proc_macro::TokenStream;

// #region matchers
/// Matches a character.
#[proc_macro]
pub fn char(input: TokenStream) -> TokenStream { matchers::char(input) }

/// Matches a digit in base 10.
#[proc_macro]
pub fn digit(_input: TokenStream) -> TokenStream { matchers::digit() }

/// Matches a digit in base 16.
#[proc_macro]
pub fn hex_digit(_input: TokenStream) -> TokenStream { matchers::hex_digit() }

/// Matches a string in case sensitive way.
#[proc_macro]
pub fn string(input: TokenStream) -> TokenStream { matchers::string(input) }

/// Matches a string in case insensitive way.
#[proc_macro]
pub fn case_insensitive_string(input: TokenStream) -> TokenStream { matchers::case_insensitive_string(input) }

/// Matches a "CR LF" sequence.
#[proc_macro]
pub fn crlf(_input: TokenStream) -> TokenStream { matchers::crlf() }

/// Matches a "CR LF CR LF" sequence.
#[proc_macro]
pub fn double_crlf(_input: TokenStream) -> TokenStream { matchers::double_crlf() }

/// Matches a token character.
#[proc_macro]
pub fn token(_input: TokenStream) -> TokenStream { matchers::token() }

/// Matches a field value character.
#[proc_macro]
pub fn token_value(_input: TokenStream) -> TokenStream { matchers::token_value() }

/// Matches a quoted string character.
#[proc_macro]
pub fn token_value_quoted(_input: TokenStream) -> TokenStream { matchers::token_value_quoted() }

/// Matches a whitespace.
#[proc_macro]
pub fn ws(_input: TokenStream) -> TokenStream { matchers::ws() }

/// Matches a URL character.
#[proc_macro]
pub fn url(_input: TokenStream) -> TokenStream { matchers::url() }

/// Matches a known method followed by a space.
#[proc_macro]
pub fn method(_input: TokenStream) -> TokenStream { matchers::method() }

/// Matches any sequence of N characters.
#[proc_macro]
pub fn otherwise(input: TokenStream) -> TokenStream { matchers::otherwise(input) }
// #endregion matchers

// #region actions
/// Defines a new state.
#[proc_macro]
pub fn state(input: TokenStream) -> TokenStream { actions::state(input) }

/// Returns the length of an input string.
#[proc_macro]
pub fn string_length(input: TokenStream) -> TokenStream { actions::string_length(input) }

/// Marks a certain number of characters as used.
#[proc_macro]
pub fn advance(input: TokenStream) -> TokenStream { actions::advance(input) }

/// Moves the parser to a new state.
#[proc_macro]
pub fn move_to(input: TokenStream) -> TokenStream { actions::move_to(input) }

/// Suspends the parser until more data is available.
#[proc_macro]
pub fn suspend(_input: TokenStream) -> TokenStream { actions::suspend() }

/// Marks the parser as failed.
#[proc_macro]
pub fn fail(input: TokenStream) -> TokenStream { actions::fail(input) }

/// Computes the longest prefix of the data matching a selector.
#[proc_macro]
pub fn consume(input: TokenStream) -> TokenStream { actions::consume(input) }

/// Invokes a user callback.
#[proc_macro]
pub fn callback(input: TokenStream) -> TokenStream { actions::callback(input) }
// #endregion actions

// #region generators
/// Generates the parser states.
#[proc_macro]
pub fn generate_states(input: TokenStream) -> TokenStream { generators::generate_states(input) }

/// Generates the parser error codes.
#[proc_macro]
pub fn generate_errors(input: TokenStream) -> TokenStream { generators::generate_errors(input) }

/// Generates the method constants.
#[proc_macro]
pub fn generate_methods(_input: TokenStream) -> TokenStream { generators::generate_methods() }
// #endregion generators
