//! Low-level text helpers for the picker workspace.

pub mod chars;
