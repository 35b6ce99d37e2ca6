//! Per-lesson downloading: throttling, remux supervision and output naming.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use course_downloader::download::{RemuxOptions, Remuxer, Throttle};
//!
//! // One throttle for the whole run, shared by every remux.
//! let throttle = Arc::new(Throttle::unlimited());
//! let remuxer = Remuxer::new(RemuxOptions::default(), throttle);
//! ```

mod error;
mod filename;
mod lesson;
mod remux;
mod throttle;

pub use error::{LessonError, RemuxError};
pub use filename::{course_dir, lesson_file_name};
pub use lesson::LessonDownloader;
pub use remux::{RemuxOptions, RemuxOutcome, Remuxer, RequestHeaders, build_args};
pub use throttle::{MAX_CHUNK_BYTES, Throttle, copy_throttled};
