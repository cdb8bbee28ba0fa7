#![forbid(unsafe_code)]

//! Path-addressed widget state tree.
//!
//! Every control the host declares lives in a [`NodeTree`], keyed by its
//! [`PathKey`](tweakui_core::path::PathKey). Missing ancestor folders are
//! created on first use; declaring the same path again returns the same
//! [`NodeId`].
//!
//! ```
//! use tweakui_core::path::PathKey;
//! use tweakui_tree::{NodeKind, NodeTree};
//!
//! let mut tree = NodeTree::new();
//! let path = PathKey::parse("fx/bloom/strength").unwrap();
//! let a = tree.insert_at_path(&path, NodeKind::slider(1.0)).unwrap();
//! let b = tree.insert_at_path(&path, NodeKind::slider(1.0)).unwrap();
//! assert_eq!(a, b);
//! assert_eq!(tree.len(), 4); // root, fx, bloom, strength
//! ```

pub mod error;
pub mod layout;
pub mod node;
pub mod tree;
pub mod value;

pub use error::{TreeError, TreeResult, ValueError};
pub use layout::LayoutMetrics;
pub use node::{
    Button, ColorPicker, Folder, Gradient, ImagePicker, Node, NodeId, NodeKind, NodeResponse,
    NodeVariant, SaveEntry, Slider, Toggle,
};
pub use tree::{Declared, NodeTree};
pub use value::{Color, GradientStop, NodeValue};
