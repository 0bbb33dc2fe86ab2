use syn::parse::{Parse, ParseStream};
use syn::punctuated::Punctuated;
use syn::{Block, Error, Expr, ExprLit, ExprUnary, Ident, Lit, LitStr, Result, Stmt, Token, UnOp};

/// Parses an optional `, <T>` tail, as in `move_to!(state)` and
/// `move_to!(state, 2)`.
fn optional_tail<T: Parse>(input: ParseStream) -> Result<Option<T>> {
  if input.is_empty() {
    return Ok(None);
  }

  input.parse::<Token![,]>()?;
  input.parse().map(Some)
}

/// The names given to a generator, as in `generate_errors!(NONE, ...)`.
pub struct NameList {
  pub names: Vec<Ident>,
}

impl Parse for NameList {
  fn parse(input: ParseStream) -> Result<Self> {
    let names = Punctuated::<Ident, Token![,]>::parse_terminated(input)?;

    if names.is_empty() {
      return Err(input.error("expected at least one name"));
    }

    Ok(NameList {
      names: names.into_iter().collect(),
    })
  }
}

/// A name followed by an optional amount. `move_to!` names a state and
/// `callback!` names a callback, the amount being respectively the advance and
/// the length of the payload.
pub struct Target {
  pub name: Ident,
  pub amount: Option<Expr>,
}

impl Parse for Target {
  fn parse(input: ParseStream) -> Result<Self> {
    let name = input.parse()?;
    let amount = optional_tail(input)?;

    Ok(Target { name, amount })
  }
}

/// The arguments of `fail!`: an error code and its description.
pub struct Failure {
  pub code: Ident,
  pub description: Expr,
}

impl Parse for Failure {
  fn parse(input: ParseStream) -> Result<Self> {
    let code = input.parse()?;
    input.parse::<Token![,]>()?;
    let description = input.parse()?;

    Ok(Failure { code, description })
  }
}

/// The arguments of `state!`: the state name and the body of its function.
pub struct StateDefinition {
  pub name: Ident,
  pub body: Vec<Stmt>,
}

impl Parse for StateDefinition {
  fn parse(input: ParseStream) -> Result<Self> {
    let name = input.parse()?;
    input.parse::<Token![,]>()?;
    let block: Block = input.parse()?;

    Ok(StateDefinition { name, body: block.stmts })
  }
}

/// The arguments of `string_length!`: a string and a signed delta applied to
/// its length.
pub struct StringLength {
  pub value: LitStr,
  pub delta: isize,
}

impl Parse for StringLength {
  fn parse(input: ParseStream) -> Result<Self> {
    let value = input.parse()?;

    let delta = match optional_tail::<Expr>(input)? {
      Some(expr) => integer(&expr)?,
      None => 0,
    };

    Ok(StringLength { value, delta })
  }
}

/// Evaluates an integer literal, eventually negated.
fn integer(expr: &Expr) -> Result<isize> {
  match expr {
    Expr::Lit(ExprLit { lit: Lit::Int(value), .. }) => value.base10_parse(),
    Expr::Unary(ExprUnary {
      op: UnOp::Neg(_), expr, ..
    }) => integer(expr).map(|value| -value),
    other => Err(Error::new_spanned(other, "expected an integer")),
  }
}
