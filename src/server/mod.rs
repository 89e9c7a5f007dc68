//! TCP listener that hands each accepted socket to its own connection task.

pub mod listener;
