pub mod db;

pub use db::{LocalFlags, Storage};

#[cfg(test)]
mod tests;
