use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, Expr, Ident};

use crate::definitions::variant;
use crate::parsing::{Failure, StateDefinition, StringLength, Target};

/// Matchers which can be used with `consume!`.
const CONSUMABLE: [&str; 7] = ["digit", "hex_digit", "token", "token_value", "token_value_quoted", "url", "ws"];

/// Defines a new state.
///
/// The state is a function receiving the parser and the data still to be
/// analyzed. It returns how many bytes it consumed or `SUSPEND`.
pub fn state(input: TokenStream) -> TokenStream {
  let definition = parse_macro_input!(input as StateDefinition);
  let function = quote::format_ident!("state_{}", definition.name);
  let statements = definition.body;

  TokenStream::from(quote! {
    #[inline(always)]
    #[allow(unused_variables)]
    fn #function (parser: &mut Parser, data: &[u8]) -> isize {
      #(#statements)*
    }
  })
}

/// Returns the length of an input string, adjusted by an optional modifier.
pub fn string_length(input: TokenStream) -> TokenStream {
  let definition = parse_macro_input!(input as StringLength);

  let len = (definition.value.value().len() as isize + definition.delta) as usize;

  TokenStream::from(quote! { #len })
}

/// Marks a certain number of characters as used, staying in the same state.
pub fn advance(input: TokenStream) -> TokenStream {
  let amount = parse_macro_input!(input as Expr);

  TokenStream::from(quote! { { return (#amount) as isize; } })
}

/// Moves the parser to a new state and marks a certain number of characters as
/// used. When the number is omitted, one character is used.
pub fn move_to(input: TokenStream) -> TokenStream {
  let definition = parse_macro_input!(input as Target);
  let state = variant(&definition.name);

  let advance = match definition.amount {
    Some(expr) => quote! { (#expr) as isize },
    None => quote! { 1 },
  };

  TokenStream::from(quote! { { return parser.move_to(State::#state, #advance); } })
}

/// Marks the parser as suspended, waiting for more data.
pub fn suspend() -> TokenStream { TokenStream::from(quote! { { return SUSPEND; } }) }

/// Marks the parser as failed, setting an error code and an error message.
pub fn fail(input: TokenStream) -> TokenStream {
  let definition = parse_macro_input!(input as Failure);
  let error = variant(&definition.code);
  let message = definition.description;

  TokenStream::from(quote! { { return parser.fail(Error::#error, #message); } })
}

/// Tries to detect the longest prefix of the data matching the provided
/// selector.
///
/// The `consumed` variable will contain the length of the prefix.
///
/// If all input data matched the selector, the state is suspended to wait for
/// the character terminating the prefix.
pub fn consume(input: TokenStream) -> TokenStream {
  let definition = parse_macro_input!(input as Ident);
  let name = definition.to_string();

  if !CONSUMABLE.contains(&name.as_str()) {
    return syn::Error::new(definition.span(), format!("unsupported consumed type {}", name))
      .to_compile_error()
      .into();
  }

  TokenStream::from(quote! {
    let max = data.len();
    #[allow(unused_mut)]
    let mut consumed = 0;

    while consumed < max && matches!(data[consumed], #definition!()) {
      consumed += 1;
    }

    if consumed == max {
      return SUSPEND;
    }
  })
}

/// Invokes one of the user defined callbacks, eventually attaching a view of
/// the first N bytes of the data. If the callback returns a non zero value,
/// the parser fails and the state returns. The state also returns if the
/// callback failed the parser on its own.
pub fn callback(input: TokenStream) -> TokenStream {
  let definition = parse_macro_input!(input as Target);
  let callback = &definition.name;
  let error_message = format!("Callback {} failed with non zero return value.", callback);

  let payload = match definition.amount {
    Some(length) => quote! { &data[..(#length) as usize] },
    None => quote! { &[] },
  };

  TokenStream::from(quote! {
    if let Some(cb) = parser.callbacks.#callback {
      if cb(parser, #payload) != 0 {
        return parser.fail(Error::CallbackError, #error_message);
      }

      if parser.state == State::Error {
        return SUSPEND;
      }
    }
  })
}
