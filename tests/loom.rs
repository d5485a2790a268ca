#![cfg(loom)]

#[path = "loom/handle.rs"]
mod handle;

#[path = "loom/publish.rs"]
mod publish;
