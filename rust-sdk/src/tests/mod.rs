use super::*;

mod common;

pub mod selection_tests;
