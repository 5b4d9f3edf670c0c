//! # Hierarchical choice fields (treeselect)
//!
//! A tree of labeled choices, authored as path-per-line text, selected one
//! depth at a time through a cascade of dependent dropdowns and stored as a
//! single `/`-delimited path.
//!
//! ## Pieces
//!
//! ```text
//!   editor text ──decode──▶ ChoiceTree ──encode──▶ editor text
//!                               │
//!   stored "a/b" ──▶ SelectionPath ──resolve──▶ Level per depth
//!                               │
//!                               └──select_inputs──▶ rendered selectors
//! ```
//!
//! - [`codec`] converts between text and [`ChoiceTree`].
//! - [`resolve`](mod@resolve) derives the visible selectors for a selection.
//! - [`field`] wraps both behind the load/save/validate operations a host
//!   field framework calls; [`plugin`] registers the field type explicitly.
//!
//! ```
//! use treeselect::{decode, encode, resolve, SelectionPath};
//!
//! let tree = decode("region : Region\nregion/north : North\n").unwrap();
//! let levels = resolve(&tree, &SelectionPath::parse("region")).levels;
//! assert_eq!(levels.len(), 2);
//! assert_eq!(levels[1].options[0].label, "North");
//! assert_eq!(encode(&tree).unwrap(), "region : Region\nregion / north : North\n");
//! ```

pub mod codec;
pub mod error;
pub mod field;
pub mod form;
pub mod path;
pub mod plugin;
pub mod render;
pub mod resolve;
pub mod tree;

pub use codec::{decode, decode_with, encode, DecodeOptions, Decoded, OnMalformed};
pub use error::{ChoiceError, FieldError};
pub use field::{FieldSettings, FormattedValue, ReturnFormat, TreeSelectField};
pub use path::SelectionPath;
pub use plugin::{FieldPlugin, FieldTypeRegistry, PluginSettings, TreeSelectPlugin};
pub use render::{select_inputs, SelectInput};
pub use resolve::{resolve, BrokenPath, CascadeResolver, ChoiceOption, Level, Resolution};
pub use tree::{Choice, ChoiceEntry, ChoiceTree};

/// Build a [`ChoiceTree`] at compile time; sibling keys are checked during
/// expansion.
pub use treeselect_macro::choices;
