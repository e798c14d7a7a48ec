//! waffle is a project skeleton generator.
//! It renders a tree of templates into a project directory, driven by a small
//! JSON configuration, and is operated through a nested command line.

/// OpenAPI description kept in sync with the project configuration
pub mod api;

/// The waffle command line: application state and command handlers
pub mod app;

/// Hierarchical command dispatch with per-command flags and usage text
pub mod command;

/// Project configuration (waffle.json)
pub mod config;

/// Error types and handling for the waffle application
pub mod error;

/// Logger setup
pub mod logger;

/// User input and interaction handling
pub mod prompt;

/// Template discovery, rendering and post-processing
/// Handles:
/// - `.tmpl` resources and their output names
/// - `!` hidden and `$` private markers
/// - language-aware formatting of rendered files
pub mod template;

/// Git repository integration
pub mod vcs;
