use proc_macro::TokenStream;
use proc_macro2::{Span, TokenStream as TokenStream2};
use quote::{format_ident, quote};
use syn::{parse_macro_input, LitByte, LitChar, LitInt, LitStr};

use crate::definitions::methods;

/// A set of bytes, described as inclusive ranges plus single bytes.
struct ByteClass {
  ranges: &'static [(u8, u8)],
  bytes: &'static [u8],
}

const DIGIT: (u8, u8) = (b'0', b'9');
const UPPERCASE: (u8, u8) = (b'A', b'Z');
const LOWERCASE: (u8, u8) = (b'a', b'z');

// RFC 9110 section 5.6.2
const TOKEN: ByteClass = ByteClass {
  ranges: &[DIGIT, UPPERCASE, LOWERCASE],
  bytes: b"!#$%&'*+-.^_`|~",
};

// RFC 9110 section 5.5 - HTAB, SP, VCHAR and obs-text
const FIELD_VALUE: ByteClass = ByteClass {
  ranges: &[(0x21, 0x7e), (0x80, 0xff)],
  bytes: b"\t ",
};

// RFC 3986 appendix A - unreserved, reserved and the percent sign
const URL: ByteClass = ByteClass {
  ranges: &[DIGIT, UPPERCASE, LOWERCASE],
  bytes: b"-._~:/?#[]@!$&'()*+,;=%",
};

// RFC 9110 section 5.6.3
const OWS: ByteClass = ByteClass {
  ranges: &[],
  bytes: b"\t ",
};

const HEX_DIGIT: ByteClass = ByteClass {
  ranges: &[DIGIT, (b'A', b'F'), (b'a', b'f')],
  bytes: &[],
};

const DECIMAL_DIGIT: ByteClass = ByteClass {
  ranges: &[DIGIT],
  bytes: &[],
};

/// Builds the pattern matching any byte of the class.
fn class_pattern(class: &ByteClass) -> TokenStream {
  let span = Span::call_site();

  let ranges = class.ranges.iter().map(|(from, to)| {
    let (from, to) = (LitByte::new(*from, span), LitByte::new(*to, span));
    quote! { #from..=#to }
  });

  let bytes = class.bytes.iter().map(|b| {
    let b = LitByte::new(*b, span);
    quote! { #b }
  });

  let alternatives: Vec<TokenStream2> = ranges.chain(bytes).collect();

  TokenStream::from(quote! { #(#alternatives)|* })
}

fn sequence_pattern(bytes: &[TokenStream2], tail: TokenStream2) -> TokenStream {
  TokenStream::from(quote! { [#(#bytes,)* #tail] })
}

pub fn char(input: TokenStream) -> TokenStream {
  let character = parse_macro_input!(input as LitChar);

  let Ok(value) = u8::try_from(character.value()) else {
    return syn::Error::new(character.span(), "only ASCII characters can be matched")
      .to_compile_error()
      .into();
  };

  let byte = LitByte::new(value, character.span());

  TokenStream::from(quote! { #byte })
}

pub fn digit() -> TokenStream { class_pattern(&DECIMAL_DIGIT) }

pub fn hex_digit() -> TokenStream { class_pattern(&HEX_DIGIT) }

pub fn token() -> TokenStream { class_pattern(&TOKEN) }

pub fn token_value() -> TokenStream { class_pattern(&FIELD_VALUE) }

/// The DQUOTE and the backslash are included, the state validates them.
pub fn token_value_quoted() -> TokenStream { class_pattern(&FIELD_VALUE) }

pub fn ws() -> TokenStream { class_pattern(&OWS) }

pub fn url() -> TokenStream { class_pattern(&URL) }

pub fn string(input: TokenStream) -> TokenStream {
  let literal = parse_macro_input!(input as LitStr);
  let bytes: Vec<_> = literal
    .value()
    .bytes()
    .map(|b| {
      let b = LitByte::new(b, literal.span());
      quote! { #b }
    })
    .collect();

  sequence_pattern(&bytes, quote! { .. })
}

/// Letters match in both cases, anything else as is.
pub fn case_insensitive_string(input: TokenStream) -> TokenStream {
  let literal = parse_macro_input!(input as LitStr);
  let bytes: Vec<_> = literal
    .value()
    .bytes()
    .map(|b| {
      let lower = LitByte::new(b.to_ascii_lowercase(), literal.span());

      if b.is_ascii_alphabetic() {
        let upper = LitByte::new(b.to_ascii_uppercase(), literal.span());
        quote! { #upper | #lower }
      } else {
        quote! { #lower }
      }
    })
    .collect();

  sequence_pattern(&bytes, quote! { .. })
}

pub fn crlf() -> TokenStream { TokenStream::from(quote! { [b'\r', b'\n', ..] }) }

pub fn double_crlf() -> TokenStream { TokenStream::from(quote! { [b'\r', b'\n', b'\r', b'\n', ..] }) }

/// Any method of `methods.yml`, followed by a space.
pub fn method() -> TokenStream {
  let alternatives: Vec<TokenStream2> = methods()
    .iter()
    .map(|method| {
      let bytes = method.bytes().map(|b| LitByte::new(b, Span::call_site()));
      quote! { [#(#bytes,)* b' ', ..] }
    })
    .collect();

  TokenStream::from(quote! { #(#alternatives)|* })
}

/// Any N bytes. States use it as the failure arm once N bytes are available
/// and no other arm matched.
pub fn otherwise(input: TokenStream) -> TokenStream {
  let literal = parse_macro_input!(input as LitInt);

  let length = match literal.base10_parse::<usize>() {
    Ok(length) if length > 0 => length,
    _ => {
      return syn::Error::new(literal.span(), "expected a positive length")
        .to_compile_error()
        .into()
    }
  };

  let placeholders: Vec<_> = (0..length).map(|i| format_ident!("_byte{}", i)).collect();

  TokenStream::from(quote! { [#(#placeholders,)* ..] })
}
