//! Typed bindings for the protocol contracts this tooling talks to. The
//! bindings are attach-by-address only; deployment goes through the
//! compiled-artifacts package at runtime, so the ABIs here list just the
//! functions the orchestration actually calls.

pub mod wrappers;
