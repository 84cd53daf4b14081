//! Implementation of search problems.
//!
//! These expose concrete problem definitions where from a given state we can
//! find the moves that take us to new states.

pub mod tile_puzzle;
