pub mod cleanup;
pub mod hasher;
pub mod manager;
