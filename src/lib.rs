//! Course Downloader Core Library
//!
//! This library downloads every lesson video of an online course: it fetches
//! the course catalog entry, resolves each lesson's streaming manifest at the
//! configured quality, and supervises an external remux tool (ffmpeg) that
//! writes one `.mp4` per lesson.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`auth`] - Authentication cookie shared by every request of a run
//! - [`api`] - Catalog and video API client
//! - [`manifest`] - Lesson manifest resolution and quality selection
//! - [`download`] - Bandwidth throttle, remux supervision and per-lesson tasks
//! - [`queue`] - Bounded-concurrency task queue
//! - [`course`] - Whole-course orchestration
//! - [`config`] - Layered settings (file, environment, CLI)

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod api;
pub mod auth;
pub mod config;
pub mod course;
pub mod download;
pub mod manifest;
pub mod model;
pub mod platform;
pub mod queue;

// Re-export commonly used types
pub use api::{ApiError, CatalogClient};
pub use auth::AuthContext;
pub use config::{ConfigError, FileConfig, Settings};
pub use course::{CourseDownloader, CourseError, LessonFailure, RunPhase, RunSummary};
pub use download::{
    LessonDownloader, LessonError, RemuxError, RemuxOptions, Remuxer, RequestHeaders, Throttle,
};
pub use manifest::{ManifestResolver, ManifestUrl, Quality, ResolveError};
pub use model::{Course, Lesson};
pub use platform::Platform;
pub use queue::{DEFAULT_CONCURRENCY, QueueError, TaskOutcome, TaskQueue, TaskReport};
