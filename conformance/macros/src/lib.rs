//! `#[conformance(name = "category.case", description = "...")]`
//!
//! Registers the annotated function in the `scmi-conformance` inventory. The
//! function must have the signature
//! `fn(&mut TestCaseRunner<'_>) -> CaseOutcome`.

use proc_macro::TokenStream;
use proc_macro2::{Delimiter, Ident, Literal, Span, TokenStream as TokenStream2, TokenTree};
use quote::{quote, quote_spanned};

#[proc_macro_attribute]
pub fn conformance(attr: TokenStream, item: TokenStream) -> TokenStream {
    let attr = TokenStream2::from(attr);
    let item = TokenStream2::from(item);

    match expand(attr, item.clone()) {
        Ok(tokens) => tokens.into(),
        Err((span, message)) => {
            let error = quote_spanned! { span => ::core::compile_error!(#message); };
            quote! { #item #error }.into()
        }
    }
}

type Error = (Span, String);

struct Args {
    name: Literal,
    description: Literal,
}

fn expand(attr: TokenStream2, item: TokenStream2) -> Result<TokenStream2, Error> {
    let args = parse_args(attr)?;
    let func = function_name(&item)?;
    let Args { name, description } = args;

    Ok(quote! {
        #item

        ::inventory::submit! {
            crate::ConformanceTest {
                name: #name,
                description: #description,
                func: #func,
            }
        }
    })
}

/// `key = "value"` pairs separated by commas.
fn parse_args(attr: TokenStream2) -> Result<Args, Error> {
    let mut name = None;
    let mut description = None;
    let mut tokens = attr.into_iter().peekable();

    while let Some(tree) = tokens.next() {
        let key = match tree {
            TokenTree::Ident(key) => key,
            other => {
                return Err((other.span(), "expected `name` or `description`".to_string()));
            }
        };
        match tokens.next() {
            Some(TokenTree::Punct(p)) if p.as_char() == '=' => {}
            _ => return Err((key.span(), format!("expected `=` after `{key}`"))),
        }
        let value = match tokens.next() {
            Some(TokenTree::Literal(lit)) if lit.to_string().starts_with('"') => lit,
            _ => return Err((key.span(), format!("`{key}` takes a string literal"))),
        };

        match key.to_string().as_str() {
            "name" => {
                let text = value.to_string();
                let text = text.trim_matches('"');
                if !text.contains('.') || text.starts_with('.') || text.ends_with('.') {
                    return Err((value.span(), "name must be `category.case`".to_string()));
                }
                name = Some(value);
            }
            "description" => description = Some(value),
            other => return Err((key.span(), format!("unknown argument `{other}`"))),
        }

        match tokens.next() {
            None => break,
            Some(TokenTree::Punct(p)) if p.as_char() == ',' => {}
            Some(tree) => return Err((tree.span(), "expected `,`".to_string())),
        }
    }

    let name = name.ok_or((Span::call_site(), "missing `name = \"...\"`".to_string()))?;
    Ok(Args {
        name,
        description: description.unwrap_or_else(|| Literal::string("")),
    })
}

/// The identifier following `fn`, skipping attributes, visibility and
/// qualifiers.
fn function_name(item: &TokenStream2) -> Result<Ident, Error> {
    let mut tokens = item.clone().into_iter();
    while let Some(tree) = tokens.next() {
        match tree {
            TokenTree::Ident(ident) if ident == "fn" => {
                return match tokens.next() {
                    Some(TokenTree::Ident(name)) => Ok(name),
                    _ => Err((ident.span(), "expected function name".to_string())),
                };
            }
            TokenTree::Group(group) if group.delimiter() == Delimiter::Brace => break,
            _ => {}
        }
    }
    Err((
        Span::call_site(),
        "#[conformance] applies to functions".to_string(),
    ))
}
