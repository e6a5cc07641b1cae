#![no_std]

mod treasury;

pub use treasury::*;

#[cfg(test)]
mod test_allowance;
