//! Core application logic, independent of the Discord framework.
//!
//! Everything here is driven through explicit seams ([`crate::api::bank::BankApi`],
//! [`scanner::ProjectLookup`], [`dispatch::MusicAdapter`], [`reply::ReplySink`])
//! so the whole command surface is testable without a gateway or a network.

/// Single entry point for all commands, shared by both front-ends
pub mod dispatch;
/// Fixed-point coin arithmetic on 8-fractional-digit decimal strings
pub mod money;
/// Response/notification sink abstraction over the platform reply channel
pub mod reply;
/// Randomized Castle project identifier scanner
pub mod scanner;
/// Per-user banking sessions and their flat-file token mirror
pub mod session;
