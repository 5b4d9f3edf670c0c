//! `choices!`: compile-time choice trees for treeselect.
//!
//! ```ignore
//! use treeselect::choices;
//!
//! let tree = choices! {
//!     region => "Region" {
//!         north => "North" {
//!             "store-12" => "Store 12";
//!         }
//!         south;               // label defaults to the key
//!     }
//!     online => "Online";
//! };
//! ```
//!
//! Keys are identifiers or string literals. Sibling keys are checked during
//! expansion, so the resulting tree needs no runtime validation.

use std::collections::HashSet;

use proc_macro::TokenStream;
use proc_macro2::{Span, TokenStream as TokenStream2};
use quote::quote;
use syn::ext::IdentExt;
use syn::parse::{Parse, ParseStream};
use syn::{braced, token, Error, Ident, LitStr, Result, Token};

use proc_macro_crate::{crate_name, FoundCrate};

/// Path separator; also splits the stored selection.
const STORAGE_SEPARATOR: char = '/';

/// Separator between a text line's path and its label.
const LABEL_SEPARATOR: &str = " : ";

/// Key of the selected option inside a nested form value.
const VALUE_KEY: &str = "value";

struct Node {
    key: String,
    key_span: Span,
    label: Option<LitStr>,
    children: Vec<Node>,
}

struct ChoicesInput {
    nodes: Vec<Node>,
}

impl Parse for ChoicesInput {
    fn parse(input: ParseStream) -> Result<Self> {
        let nodes = parse_nodes(input)?;
        Ok(Self { nodes })
    }
}

fn parse_key(input: ParseStream) -> Result<(String, Span)> {
    if input.peek(LitStr) {
        let lit: LitStr = input.parse()?;
        Ok((lit.value(), lit.span()))
    } else {
        let ident: Ident = input.call(Ident::parse_any)?;
        Ok((ident.to_string(), ident.span()))
    }
}

fn parse_nodes(input: ParseStream) -> Result<Vec<Node>> {
    let mut nodes = Vec::new();
    while !input.is_empty() {
        let (key, key_span) = parse_key(input)?;

        // Optional label: key => "Label"
        let label = if input.peek(Token![=>]) {
            input.parse::<Token![=>]>()?;
            Some(input.parse::<LitStr>()?)
        } else {
            None
        };

        // Children or semicolon
        let children = if input.peek(token::Brace) {
            let content;
            braced!(content in input);
            parse_nodes(&content)?
        } else {
            input.parse::<Token![;]>()?;
            Vec::new()
        };

        nodes.push(Node {
            key,
            key_span,
            label,
            children,
        });
    }
    Ok(nodes)
}

// =============================================================================
// Validation (runs at macro expansion time)
// =============================================================================

/// Keys must write out as choice text and read back unchanged, and must not
/// collide with form value names.
fn key_problem(key: &str) -> Option<&'static str> {
    if key.is_empty() {
        Some("is empty")
    } else if key.trim() != key {
        Some("has surrounding whitespace")
    } else if key.contains(STORAGE_SEPARATOR) {
        Some("contains reserved '/'")
    } else if format!(" {key} ").contains(LABEL_SEPARATOR) {
        Some("contains reserved ' : '")
    } else if key.contains(['\n', '\r']) {
        Some("contains a line break")
    } else if key == VALUE_KEY {
        Some("is reserved")
    } else if key.contains(['[', ']']) {
        Some("contains reserved brackets")
    } else {
        None
    }
}

fn validate(nodes: &[Node], parent: &str) -> Result<()> {
    let mut seen = HashSet::new();
    for node in nodes {
        if let Some(problem) = key_problem(&node.key) {
            return Err(Error::new(
                node.key_span,
                format!("choice key '{}' {}", node.key, problem),
            ));
        }
        if !seen.insert(node.key.as_str()) {
            let under = if parent.is_empty() {
                "at root level".to_string()
            } else {
                format!("under '{}'", parent)
            };
            return Err(Error::new(
                node.key_span,
                format!("duplicate choice key '{}' {}", node.key, under),
            ));
        }
        if let Some(label) = &node.label {
            let value = label.value();
            if value.trim().is_empty() {
                return Err(Error::new(label.span(), "choice label cannot be empty"));
            }
            if value.trim() != value || value.contains(['\n', '\r']) {
                return Err(Error::new(
                    label.span(),
                    "choice label cannot have surrounding whitespace or line breaks",
                ));
            }
        }

        let path = if parent.is_empty() {
            node.key.clone()
        } else {
            format!("{}/{}", parent, node.key)
        };
        validate(&node.children, &path)?;
    }
    Ok(())
}

// =============================================================================
// Crate path resolution
// =============================================================================

fn treeselect_crate_path() -> TokenStream2 {
    match crate_name("treeselect") {
        Ok(FoundCrate::Itself) => quote!(::treeselect),
        Ok(FoundCrate::Name(name)) => {
            let ident = Ident::new(&name, Span::call_site());
            quote!(::#ident)
        }
        Err(_) => quote!(::treeselect),
    }
}

// =============================================================================
// Code generation
// =============================================================================

/// Each node becomes a `Choice::__branch(key, label, children)` call; the
/// label defaults to the key, matching placeholder ancestors in decoded text.
fn generate_choices(nodes: &[Node], ts_crate: &TokenStream2) -> Vec<TokenStream2> {
    nodes
        .iter()
        .map(|node| {
            let key = LitStr::new(&node.key, node.key_span);
            let label = node.label.clone().unwrap_or_else(|| key.clone());
            let children = generate_choices(&node.children, ts_crate);
            quote! {
                #ts_crate::Choice::__branch(#key, #label, ::std::vec![#(#children),*])
            }
        })
        .collect()
}

fn expand(input: ChoicesInput, ts_crate: &TokenStream2) -> Result<TokenStream2> {
    validate(&input.nodes, "")?;
    let roots = generate_choices(&input.nodes, ts_crate);
    Ok(quote! {
        #ts_crate::ChoiceTree::__from_macro(::std::vec![#(#roots),*])
    })
}

// =============================================================================
// Entry point
// =============================================================================

#[proc_macro]
pub fn choices(input: TokenStream) -> TokenStream {
    let input = syn::parse_macro_input!(input as ChoicesInput);
    let ts_crate = treeselect_crate_path();
    match expand(input, &ts_crate) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expand_str(src: &str) -> Result<String> {
        let input: ChoicesInput = syn::parse_str(src)?;
        expand(input, &quote!(::treeselect)).map(|t| t.to_string())
    }

    #[test]
    fn same_key_under_different_parents_is_allowed() {
        let code = expand_str("a { x; } b { x; }").unwrap();
        assert_eq!(code.matches("\"x\"").count(), 4); // key and default label, twice
    }

    #[test]
    fn duplicate_siblings_are_rejected() {
        let err = expand_str("a { x; x => \"Again\"; }").unwrap_err();
        assert!(err.to_string().contains("duplicate choice key 'x' under 'a'"));

        let err = expand_str("a; a;").unwrap_err();
        assert!(err.to_string().contains("at root level"));
    }

    #[test]
    fn string_keys_and_labels() {
        let code = expand_str("\"store-12\" => \"Store 12\";").unwrap();
        assert!(code.contains("\"store-12\""));
        assert!(code.contains("\"Store 12\""));
    }

    #[test]
    fn reserved_characters_are_rejected() {
        assert!(expand_str("\"a/b\";").is_err());
        assert!(expand_str("\"\";").is_err());
        assert!(expand_str("a => \" \";").is_err());
    }

    #[test]
    fn keys_touching_label_separator_are_rejected() {
        for src in ["\": x\";", "\"x :\";", "\":\";", "a { \"b : c\"; }"] {
            let err = expand_str(src).unwrap_err();
            assert!(err.to_string().contains("reserved ' : '"), "{src}: {err}");
        }
        assert!(expand_str("\":x\"; \"x:\";").is_ok());
    }

    #[test]
    fn form_keys_are_rejected() {
        assert!(expand_str("value;").unwrap_err().to_string().contains("is reserved"));
        assert!(expand_str("a { \"b[1]\"; }").is_err());
        assert!(expand_str("values;").is_ok());
    }

    #[test]
    fn padded_labels_are_rejected() {
        assert!(expand_str("a => \" A\";").is_err());
        assert!(expand_str("a => \"A\\nB\";").is_err());
    }

    #[test]
    fn keyword_keys_parse() {
        assert!(expand_str("type => \"Type\"; match;").is_ok());
    }
}
