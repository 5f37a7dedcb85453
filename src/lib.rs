//! Keeper: sandboxed, git-backed project storage for automation agents.
//!
//! Each project is a directory under a configured root with its own git
//! history. Agents reach it through a fixed catalog of named commands
//! ([`commands::CommandRegistry`]), served over HTTP ([`api`]), MCP ([`mcp`])
//! or the `keeper` CLI. Every mutation is committed individually.

pub mod api;
pub mod commands;
pub mod config;
pub mod error;
pub mod mcp;
pub mod models;
pub mod sandbox;
pub mod store;
