//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

use course_downloader::FileConfig;
use course_downloader::config::AUTH_TOKEN_ENV;

/// Download every lesson video of an online course.
///
/// Each lesson is remuxed to `<output-dir>/<course title>/<index>_<title>.mp4`
/// by an external ffmpeg process. Settings are read from the config file, then
/// the environment, then these flags.
#[derive(Parser, Debug)]
#[command(name = "course-downloader")]
#[command(author, version, about)]
pub struct Args {
    /// Course URL or slug, e.g. https://frontendmasters.com/courses/rust/
    pub course: Option<String>,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,

    /// Path to a TOML config file (default: $XDG_CONFIG_HOME/course-downloader/config.toml)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Authentication cookie value
    #[arg(short = 't', long, env = AUTH_TOKEN_ENV, hide_env_values = true)]
    pub token: Option<String>,

    /// Video quality: 2160, 1440, 1080, 720 or 360 [default: 1080]
    #[arg(short = 'Q', long)]
    pub quality: Option<u32>,

    /// Maximum concurrent lesson downloads (1-100) [default: 1]
    #[arg(short = 'c', long, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub concurrency: Option<u8>,

    /// Aggregate bandwidth cap in bytes per second, 0 to disable [default: 1000000]
    #[arg(short = 'b', long, value_name = "BYTES_PER_SEC")]
    pub bandwidth_limit: Option<u64>,

    /// Root directory for course folders [default: .]
    #[arg(short = 'o', long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Remux program to run [default: ffmpeg]
    #[arg(long, value_name = "PATH")]
    pub ffmpeg: Option<PathBuf>,

    /// Kill a lesson's remux after this many seconds, 0 to disable
    #[arg(long, value_name = "SECS")]
    pub remux_timeout: Option<u64>,

    /// Forward the remux program's stdout
    #[arg(long)]
    pub passthrough_stdout: bool,

    /// Exit with status 2 when any lesson fails
    #[arg(long)]
    pub fail_on_error: bool,

    /// Override the catalog API base URL
    #[arg(long, hide = true)]
    pub api_base_url: Option<String>,

    /// Override the site origin used for Origin/Referer and the cookie domain
    #[arg(long, hide = true)]
    pub site_origin: Option<String>,
}

impl Args {
    /// The CLI layer of the configuration. Unset flags stay `None`.
    #[must_use]
    pub fn overrides(&self) -> FileConfig {
        FileConfig {
            auth_token: self.token.clone(),
            course_url: self.course.clone(),
            quality: self.quality,
            concurrency: self.concurrency.map(usize::from),
            bandwidth_limit: self.bandwidth_limit,
            download_dir: self.output_dir.clone(),
            ffmpeg_path: self.ffmpeg.clone(),
            remux_timeout_secs: self.remux_timeout,
            passthrough_stdout: self.passthrough_stdout.then_some(true),
            fail_on_error: self.fail_on_error.then_some(true),
            api_base_url: self.api_base_url.clone(),
            site_origin: self.site_origin.clone(),
        }
    }
}
