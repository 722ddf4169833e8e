#![forbid(unsafe_code)]

mod determinism;
mod host;
