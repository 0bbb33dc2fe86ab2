use proc_macro::TokenStream;
use proc_macro2::Span;
use quote::{format_ident, quote};
use syn::{parse_macro_input, LitByteStr, LitStr};

use crate::definitions::{method_constant, methods, variant};
use crate::parsing::NameList;

/// Generates the `State` enum, its string representation and the function
/// dispatching the data to the handler of the current state.
///
/// Every listed state must have been defined via `state!`.
pub fn generate_states(input: TokenStream) -> TokenStream {
  let definition = parse_macro_input!(input as NameList);
  let states = definition.names;

  let variants: Vec<_> = states.iter().map(variant).collect();
  let names: Vec<_> = states
    .iter()
    .map(|x| LitStr::new(&x.to_string().to_uppercase(), x.span()))
    .collect();
  let handlers: Vec<_> = states.iter().map(|x| format_ident!("state_{}", x)).collect();
  let values: Vec<_> = (0..states.len()).map(|x| x as u8).collect();

  TokenStream::from(quote! {
    /// The states of the parser.
    #[repr(u8)]
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub enum State {
      #(#variants = #values),*
    }

    impl State {
      /// Returns the state name.
      pub fn as_str(&self) -> &'static str {
        match self {
          #(State::#variants => #names),*
        }
      }
    }

    impl TryFrom<u8> for State {
      type Error = u8;

      fn try_from(value: u8) -> Result<Self, u8> {
        match value {
          #(#values => Ok(State::#variants),)*
          _ => Err(value),
        }
      }
    }

    impl core::fmt::Display for State {
      fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result { f.write_str(self.as_str()) }
    }

    /// Applies the handler of the current state to the data.
    #[inline(always)]
    pub(crate) fn apply_state(parser: &mut Parser, data: &[u8]) -> isize {
      match parser.state {
        #(State::#variants => #handlers(parser, data)),*
      }
    }
  })
}

/// Generates the `Error` enum and its string representation.
///
/// The first listed code is the one representing the absence of errors.
pub fn generate_errors(input: TokenStream) -> TokenStream {
  let definition = parse_macro_input!(input as NameList);
  let errors = definition.names;

  let variants: Vec<_> = errors.iter().map(variant).collect();
  let names: Vec<_> = errors
    .iter()
    .map(|x| LitStr::new(&x.to_string().to_uppercase(), x.span()))
    .collect();
  let values: Vec<_> = (0..errors.len()).map(|x| x as u8).collect();
  let first = &variants[0];

  TokenStream::from(quote! {
    /// The error codes of the parser.
    #[repr(u8)]
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub enum Error {
      #(#variants = #values),*
    }

    impl Error {
      /// Returns the error code name.
      pub fn as_str(&self) -> &'static str {
        match self {
          #(Error::#variants => #names),*
        }
      }
    }

    impl Default for Error {
      fn default() -> Self { Error::#first }
    }

    impl TryFrom<u8> for Error {
      type Error = u8;

      fn try_from(value: u8) -> Result<Self, u8> {
        match value {
          #(#values => Ok(Error::#variants),)*
          _ => Err(value),
        }
      }
    }

    impl core::fmt::Display for Error {
      fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result { f.write_str(self.as_str()) }
    }
  })
}

/// Generates the method constants, the list of their names and the function
/// mapping a method name to its value.
pub fn generate_methods() -> TokenStream {
  let methods = methods();
  let count = methods.len();

  let constants: Vec<_> = methods.iter().map(|x| method_constant(x)).collect();
  let values: Vec<_> = (0..count).map(|x| x as u8).collect();
  let literals: Vec<_> = methods
    .iter()
    .map(|x| LitByteStr::new(x.as_bytes(), Span::call_site()))
    .collect();

  TokenStream::from(quote! {
    #(pub const #constants: u8 = #values;)*

    /// The names of all supported methods, indexed by their value.
    pub const METHODS: [&str; #count] = [#(#methods),*];

    /// Maps a method name to its value.
    #[inline(always)]
    pub fn find_method(name: &[u8]) -> Option<u8> {
      match name {
        #(#literals => Some(#constants),)*
        _ => None,
      }
    }
  })
}
