//! Workspace tooling package. It exists so `rusty-hook` can install the
//! pre-commit hooks; the library and CLI live under `crates/`.
