#![deny(
    missing_docs,
    unsafe_code,
    rustdoc::invalid_rust_codeblocks,
    rustdoc::broken_intra_doc_links,
    missing_copy_implementations,
    unused_doc_comments
)]

//! Stack backtrace capture for faultstack faults.
//!
//! A [`Fault`] accepts its backtrace as opaque, pre-formatted text. This
//! crate produces that text: it walks the current stack, drops frames that
//! belong to the error machinery or the runtime, and renders what is left
//! one frame per line.
//!
//! # Quick Start
//!
//! ```rust
//! use faultstack_backtrace::CapturedFault;
//! use faultstack::Fault;
//!
//! fn load_checkpoint() -> Result<(), Fault> {
//!     Err(Fault::captured("checkpoint header is truncated"))
//! }
//!
//! let fault = load_checkpoint().unwrap_err();
//! // The concise message never contains the backtrace.
//! assert_eq!(fault.concise_message(), "checkpoint header is truncated");
//! ```
//!
//! The full message then looks similar to:
//!
//! ```text
//! checkpoint header is truncated
//! (most recent call first):
//! load_checkpoint - /build/src/main.rs:5
//! main            - /build/src/main.rs:9
//! note: 12 frame(s) omitted. For a complete backtrace, set RUST_BACKTRACE=full.
//! ```
//!
//! # Environment Variables
//!
//! - `RUST_BACKTRACE=full` - Disables filtering and shows full paths
//! - `FAULTSTACK_BACKTRACE` - Comma-separated options:
//!   - `full_paths` - Show full file paths in backtraces
//!   - `off` - Do not capture backtraces at all; faults get an empty
//!     backtrace
//!
//! # Path privacy
//!
//! By default, backtrace paths are shortened for readability, but this may
//! still expose private file system structure when a path is not recognized
//! as belonging to a known prefix (e.g., RUST_SRC). If that is a concern, use
//! the `--remap-path-prefix` option of `rustc`:
//!
//! ```sh
//! export RUSTFLAGS="--remap-path-prefix=$HOME=/home/user --remap-path-prefix=$PWD=/build"
//! ```
//!
//! # Filtering
//!
//! ```rust
//! use faultstack_backtrace::BacktraceFilter;
//!
//! let filter = BacktraceFilter {
//!     skipped_initial_crates: &["faultstack", "faultstack-backtrace"],
//!     skipped_middle_crates: &["rayon", "rayon-core"],
//!     skipped_final_crates: &["std"],
//!     max_entry_count: 15,
//!     show_full_path: false,
//! };
//! let text = faultstack_backtrace::capture_string(&filter);
//! # let _ = text;
//! ```

use std::{borrow::Cow, fmt, sync::OnceLock};

use backtrace::BytesOrWideString;
use faultstack::{CallerId, Fault};

#[doc(hidden)]
pub use faultstack;

/// Stack backtrace information.
///
/// Contains a collection of stack frames representing the call stack at the
/// point of capture. The [`Display`](fmt::Display) implementation produces
/// the text stored in faults; the alternate form (`{:#}`) shows full paths.
///
/// ```rust
/// use faultstack_backtrace::{Backtrace, BacktraceFilter};
///
/// if let Some(bt) = Backtrace::capture(&BacktraceFilter::DEFAULT) {
///     println!("Captured {} entries:\n{bt}", bt.entries.len());
/// }
/// ```
#[derive(Debug)]
pub struct Backtrace {
    /// The entries in the backtrace, ordered from most recent to oldest.
    pub entries: Vec<BacktraceEntry>,
    /// Total number of frames that were omitted due to filtering.
    pub total_omitted_frames: usize,
}

/// A single entry in a stack backtrace.
#[derive(Debug)]
pub enum BacktraceEntry {
    /// A normal stack frame.
    Frame(Frame),
    /// A group of omitted frames from a specific crate.
    OmittedFrames {
        /// Number of omitted frames.
        count: usize,
        /// The name of the crate whose frames were omitted.
        skipped_crate: &'static str,
    },
}

/// A single stack frame in a backtrace.
#[derive(Debug)]
pub struct Frame {
    /// The demangled symbol name for this frame.
    pub sym_demangled: String,
    /// File path information for this frame, if available.
    pub frame_path: Option<FramePath>,
    /// Line number in the source file, if available.
    pub lineno: Option<u32>,
}

/// File path information for a stack frame.
#[derive(Debug)]
pub struct FramePath {
    /// The raw file path from the debug information.
    pub raw_path: String,
    /// The crate name if detected from the path.
    pub crate_name: Option<Cow<'static, str>>,
    /// Common path prefix information for shortening display.
    pub split_path: Option<FramePrefix>,
}

/// A known prefix split off a frame path.
#[derive(Debug)]
pub struct FramePrefix {
    /// The kind of prefix: `"RUST_SRC"` for standard library paths,
    /// `"CARGO"` for Cargo registry crate paths, `"FAULTSTACK"` for this
    /// library's own paths.
    pub prefix_kind: &'static str,
    /// The full prefix path that was removed from the original path.
    pub prefix: String,
    /// The remaining path after the prefix was removed.
    ///
    /// Example: `"indexmap-2.12.1/src/map/core/entry.rs"`
    pub suffix: String,
}

/// Extracts the last path segment of a demangled symbol, ignoring anything
/// nested in `<...>` or `{...}` except closure markers.
fn get_function_name(s: &str) -> &str {
    let mut word_start = 0usize;
    let mut word_end = 0usize;
    let mut angle_nesting_level = 0u64;
    let mut curly_nesting_level = 0u64;
    let mut potential_function_arrow = false;
    let mut inside_word = false;

    for (i, c) in s.char_indices() {
        if curly_nesting_level == 0 && angle_nesting_level == 0 {
            if !inside_word && unicode_ident::is_xid_start(c) {
                word_start = i;
                inside_word = true;
            } else if inside_word && !unicode_ident::is_xid_continue(c) {
                word_end = i;
                inside_word = false;
            }
        }

        let was_potential_function_arrow = potential_function_arrow;
        potential_function_arrow = c == '-';

        if c == '<' {
            angle_nesting_level = angle_nesting_level.saturating_add(1);
        } else if c == '>' && !was_potential_function_arrow {
            angle_nesting_level = angle_nesting_level.saturating_sub(1);
        } else if c == '{' {
            curly_nesting_level = curly_nesting_level.saturating_add(1);
            if !inside_word && curly_nesting_level == 1 && angle_nesting_level == 0 {
                word_start = i;
                inside_word = true;
            }
        } else if c == '}' {
            curly_nesting_level = curly_nesting_level.saturating_sub(1);
            if inside_word && curly_nesting_level == 0 {
                word_end = i + 1;
                inside_word = false;
            }
        }
    }

    if word_start < word_end {
        &s[word_start..word_end]
    } else {
        &s[word_start..]
    }
}

impl fmt::Display for Backtrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const MAX_UNWRAPPED_SYM_LENGTH: usize = 25;
        let show_full_path = f.alternate();

        let mut max_seen_length = 0;
        for entry in &self.entries {
            if let BacktraceEntry::Frame(frame) = entry {
                let sym = get_function_name(&frame.sym_demangled);
                if sym.len() <= MAX_UNWRAPPED_SYM_LENGTH && sym.len() > max_seen_length {
                    max_seen_length = sym.len();
                }
            }
        }

        let mut first = true;
        let mut line_break = |f: &mut fmt::Formatter<'_>| -> fmt::Result {
            if !first {
                writeln!(f)?;
            }
            first = false;
            Ok(())
        };

        for entry in &self.entries {
            line_break(f)?;
            match entry {
                BacktraceEntry::OmittedFrames {
                    count,
                    skipped_crate,
                } => {
                    write!(
                        f,
                        "... omitted {count} frame(s) from crate '{skipped_crate}' ..."
                    )?;
                }
                BacktraceEntry::Frame(frame) => {
                    let sym = get_function_name(&frame.sym_demangled);

                    if sym.len() <= MAX_UNWRAPPED_SYM_LENGTH {
                        write!(f, "{sym:<max_seen_length$} - ")?;
                    } else {
                        write!(f, "{sym}\n   - ")?;
                    }

                    if let Some(path) = &frame.frame_path {
                        if show_full_path {
                            write!(f, "{}", path.raw_path)?;
                        } else if let Some(split_path) = &path.split_path {
                            write!(f, "[..]/{}", split_path.suffix)?;
                        } else {
                            write!(f, "{}", path.raw_path)?;
                        }

                        if let Some(lineno) = frame.lineno {
                            write!(f, ":{lineno}")?;
                        }
                    }
                }
            }
        }

        if self.total_omitted_frames > 0 {
            line_break(f)?;
            write!(
                f,
                "note: {} frame(s) omitted. For a complete backtrace, set RUST_BACKTRACE=full.",
                self.total_omitted_frames
            )?;
        }

        Ok(())
    }
}

/// Configuration for filtering frames from certain crates in a backtrace.
///
/// ```rust
/// use faultstack_backtrace::BacktraceFilter;
///
/// let filter = BacktraceFilter {
///     max_entry_count: 10,
///     ..BacktraceFilter::DEFAULT
/// };
/// ```
#[derive(Copy, Clone, Debug)]
pub struct BacktraceFilter {
    /// Crates whose frames are hidden when they appear at the beginning of a
    /// backtrace.
    pub skipped_initial_crates: &'static [&'static str],
    /// Crates whose frames are collapsed when they appear in the middle of a
    /// backtrace.
    pub skipped_middle_crates: &'static [&'static str],
    /// Crates whose frames are hidden when they appear at the end of a
    /// backtrace.
    pub skipped_final_crates: &'static [&'static str],
    /// Maximum number of entries to include in the backtrace.
    pub max_entry_count: usize,
    /// Whether to show full file paths in the rendered text.
    pub show_full_path: bool,
}

impl BacktraceFilter {
    /// Default backtrace filter settings.
    pub const DEFAULT: Self = Self {
        skipped_initial_crates: &[
            "backtrace",
            "faultstack",
            "faultstack-backtrace",
            "core",
            "std",
            "alloc",
        ],
        skipped_middle_crates: &["std", "core", "alloc", "rayon", "rayon-core"],
        skipped_final_crates: &["std", "core", "alloc", "rayon", "rayon-core"],
        max_entry_count: 20,
        show_full_path: false,
    };

    /// No filtering at all.
    pub const FULL: Self = Self {
        skipped_initial_crates: &[],
        skipped_middle_crates: &[],
        skipped_final_crates: &[],
        max_entry_count: usize::MAX,
        show_full_path: true,
    };

    /// The filter selected by `RUST_BACKTRACE` and `FAULTSTACK_BACKTRACE`.
    ///
    /// `RUST_BACKTRACE=full` disables all filtering; `full_paths` in
    /// `FAULTSTACK_BACKTRACE` turns on full paths. The environment is read
    /// once per process.
    pub fn from_env() -> Self {
        let env_options = EnvOptions::get();
        if env_options.rust_backtrace_full {
            BacktraceFilter {
                show_full_path: env_options.show_full_path,
                ..Self::FULL
            }
        } else {
            BacktraceFilter {
                show_full_path: env_options.show_full_path,
                ..Self::DEFAULT
            }
        }
    }
}

impl Default for BacktraceFilter {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
struct EnvOptions {
    rust_backtrace_full: bool,
    show_full_path: bool,
    disabled: bool,
}

impl EnvOptions {
    fn get() -> &'static Self {
        static FAULTSTACK_FLAGS: OnceLock<EnvOptions> = OnceLock::new();

        FAULTSTACK_FLAGS.get_or_init(|| {
            let rust_backtrace = std::env::var_os("RUST_BACKTRACE");
            let faultstack_backtrace = std::env::var_os("FAULTSTACK_BACKTRACE");
            Self::parse(
                rust_backtrace.as_deref().map(|v| v.to_string_lossy()).as_deref(),
                faultstack_backtrace
                    .as_deref()
                    .map(|v| v.to_string_lossy())
                    .as_deref(),
            )
        })
    }

    fn parse(rust_backtrace: Option<&str>, faultstack_backtrace: Option<&str>) -> Self {
        let rust_backtrace_full = rust_backtrace == Some("full");
        let mut options = EnvOptions {
            rust_backtrace_full,
            show_full_path: rust_backtrace_full,
            disabled: false,
        };
        if let Some(var) = faultstack_backtrace {
            for v in var.split(',').map(str::trim) {
                if v.eq_ignore_ascii_case("full_paths") {
                    options.show_full_path = true;
                } else if v.eq_ignore_ascii_case("off") {
                    options.disabled = true;
                }
            }
        }
        options
    }
}

// Debug info keeps whatever separator the build host used.
const SEPARATORS: [char; 2] = ['/', '\\'];

/// Manifest directories of the crates whose frames belong to faultstack
/// itself. Debug info records absolute source paths, and so does Cargo for
/// `CARGO_MANIFEST_DIR`.
const OWN_CRATES: [(&str, &str); 2] = [
    (env!("CARGO_MANIFEST_DIR"), "faultstack-backtrace"),
    (faultstack::__private::FAULTSTACK_MANIFEST_DIR, "faultstack"),
];

/// Returns the byte offset of the separator in front of the crate directory
/// name when `path` is a source file of the crate rooted at `manifest_dir`.
fn own_crate_split(path: &str, manifest_dir: &str) -> Option<usize> {
    let rest = path.strip_prefix(manifest_dir)?.strip_prefix(SEPARATORS)?;
    let in_src = rest
        .strip_prefix("src")
        .is_some_and(|rest| rest.starts_with(SEPARATORS));
    in_src.then(|| manifest_dir.rfind(SEPARATORS).unwrap_or(0))
}

impl Backtrace {
    /// Captures the current stack backtrace, applying `filter`.
    ///
    /// Returns `None` when no frame could be resolved at all, which is the
    /// case in binaries built without debug information.
    pub fn capture(filter: &BacktraceFilter) -> Option<Self> {
        let mut initial_filtering = !filter.skipped_initial_crates.is_empty();
        let mut entries: Vec<BacktraceEntry> = Vec::new();
        let mut total_omitted_frames = 0;

        let mut delayed_omitted_frame: Option<Frame> = None;
        let mut currently_omitted_crate_name: Option<&'static str> = None;
        let mut currently_omitted_frames = 0;

        backtrace::trace(|frame| {
            backtrace::resolve_frame(frame, |symbol| {
                // Frames without symbol names or filenames are not useful.
                let (Some(sym), Some(filename_raw)) = (symbol.name(), symbol.filename_raw()) else {
                    return;
                };

                if entries.len() >= filter.max_entry_count {
                    total_omitted_frames += 1;
                    return;
                }

                let frame_path = FramePath::new(filename_raw);

                if initial_filtering {
                    if let Some(cur_crate_name) = &frame_path.crate_name
                        && filter.skipped_initial_crates.contains(&&**cur_crate_name)
                    {
                        total_omitted_frames += 1;
                        return;
                    } else {
                        initial_filtering = false;
                    }
                }

                if let Some(cur_crate_name) = &frame_path.crate_name
                    && let Some(currently_omitted_crate_name) = &currently_omitted_crate_name
                    && cur_crate_name == currently_omitted_crate_name
                {
                    delayed_omitted_frame = None;
                    currently_omitted_frames += 1;
                    total_omitted_frames += 1;
                    return;
                }

                if let Some(currently_omitted_crate_name) = currently_omitted_crate_name.take() {
                    if let Some(delayed_frame) = delayed_omitted_frame.take() {
                        entries.push(BacktraceEntry::Frame(delayed_frame));
                    } else {
                        entries.push(BacktraceEntry::OmittedFrames {
                            count: currently_omitted_frames,
                            skipped_crate: currently_omitted_crate_name,
                        });
                    }
                    currently_omitted_frames = 0;
                }

                if let Some(cur_crate_name) = &frame_path.crate_name
                    && let Some(skipped_crate) = filter
                        .skipped_middle_crates
                        .iter()
                        .find(|&crate_name| crate_name == cur_crate_name)
                {
                    currently_omitted_crate_name = Some(skipped_crate);
                    currently_omitted_frames = 1;
                    total_omitted_frames += 1;
                    delayed_omitted_frame = Some(Frame {
                        sym_demangled: format!("{sym:#}"),
                        frame_path: Some(frame_path),
                        lineno: symbol.lineno(),
                    });
                    return;
                }

                entries.push(BacktraceEntry::Frame(Frame {
                    sym_demangled: format!("{sym:#}"),
                    frame_path: Some(frame_path),
                    lineno: symbol.lineno(),
                }));
            });

            true
        });

        if let Some(currently_omitted_crate_name) = currently_omitted_crate_name.take() {
            if let Some(delayed_frame) = delayed_omitted_frame.take() {
                entries.push(BacktraceEntry::Frame(delayed_frame));
            } else {
                entries.push(BacktraceEntry::OmittedFrames {
                    count: currently_omitted_frames,
                    skipped_crate: currently_omitted_crate_name,
                });
            }
        }

        total_omitted_frames += trim_final_entries(&mut entries, filter);

        if entries.is_empty() && total_omitted_frames == 0 {
            None
        } else {
            Some(Self {
                entries,
                total_omitted_frames,
            })
        }
    }

    /// Renders the backtrace the way it is stored in faults.
    pub fn to_fault_text(&self, show_full_path: bool) -> String {
        if show_full_path {
            format!("{self:#}")
        } else {
            format!("{self}")
        }
    }
}

/// Process entry points that sit below `main` on glibc targets.
const LIBC_ENTRY_POINTS: &[&str] = &["__libc_start_call_main", "__libc_start_main_impl"];

impl Frame {
    fn crate_name(&self) -> Option<&str> {
        self.frame_path.as_ref()?.crate_name.as_deref()
    }

    fn is_runtime_tail(&self, filter: &BacktraceFilter) -> bool {
        self.crate_name()
            .is_some_and(|name| filter.skipped_final_crates.contains(&name))
            || LIBC_ENTRY_POINTS.contains(&self.sym_demangled.as_str())
    }
}

/// Pops runtime frames off the end of `entries`, returning how many frames
/// were dropped.
fn trim_final_entries(entries: &mut Vec<BacktraceEntry>, filter: &BacktraceFilter) -> usize {
    let mut omitted = 0;
    while let Some(last) = entries.last() {
        omitted += match last {
            BacktraceEntry::Frame(frame) if frame.is_runtime_tail(filter) => 1,
            BacktraceEntry::OmittedFrames {
                skipped_crate,
                count,
            } if filter.skipped_final_crates.contains(skipped_crate) => *count,
            _ => break,
        };
        entries.pop();
    }
    omitted
}

impl FramePath {
    fn new(path: BytesOrWideString<'_>) -> Self {
        Self::from_path_str(path.to_str_lossy().into_owned())
    }

    fn from_path_str(path_str: String) -> Self {
        static REGEXES: OnceLock<[regex::Regex; 2]> = OnceLock::new();
        let [std_regex, registry_regex] = REGEXES.get_or_init(|| {
            [
                // Matches Rust standard library paths:
                // - /lib/rustlib/src/rust/library/{std|core|alloc}/src/...
                // - /rustc/{40-char-hash}/library/{std|core|alloc}/src/...
                regex::Regex::new(
                    r"(?:/lib/rustlib/src/rust|^/rustc/[0-9a-f]{40})/library/(std|core|alloc)/src/.*$",
                )
                .expect("built-in regex pattern for std library paths should be valid"),
                // Matches Cargo registry paths:
                // - /.cargo/registry/src/{index}-{16-char-hash}/{crate}-{version}/src/...
                regex::Regex::new(
                    r"/\.cargo/registry/src/[^/]+-[0-9a-f]{16}/([^./]+)-[0-9]+\.[^/]*/src/.*$",
                )
                .expect("built-in regex pattern for cargo registry paths should be valid"),
            ]
        });

        let known_prefix = if let Some(captures) = std_regex.captures(&path_str) {
            captures
                .get(1)
                .map(|c| (c.start(), Cow::Owned(c.as_str().to_string()), "RUST_SRC"))
        } else if let Some(captures) = registry_regex.captures(&path_str) {
            captures
                .get(1)
                .map(|c| (c.start(), Cow::Owned(c.as_str().to_string()), "CARGO"))
        } else {
            None
        };

        if let Some((split, crate_name, prefix_kind)) = known_prefix {
            let (prefix, suffix) = (&path_str[..split - 1], &path_str[split..]);
            return Self {
                split_path: Some(FramePrefix {
                    prefix_kind,
                    prefix: prefix.to_string(),
                    suffix: suffix.to_string(),
                }),
                crate_name: Some(crate_name),
                raw_path: path_str,
            };
        }

        for (manifest_dir, crate_name) in OWN_CRATES {
            if let Some(split) = own_crate_split(&path_str, manifest_dir) {
                let (prefix, suffix) = path_str.split_at(split);
                return Self {
                    split_path: Some(FramePrefix {
                        prefix_kind: "FAULTSTACK",
                        prefix: prefix.to_string(),
                        suffix: suffix.trim_start_matches(SEPARATORS).to_string(),
                    }),
                    crate_name: Some(Cow::Borrowed(crate_name)),
                    raw_path: path_str,
                };
            }
        }

        Self {
            raw_path: path_str,
            crate_name: None,
            split_path: None,
        }
    }
}

/// Captures the current backtrace with `filter` and renders it as fault
/// text.
///
/// Returns an empty string when nothing could be captured, or when
/// `FAULTSTACK_BACKTRACE=off` is set. An empty string means "no backtrace"
/// to [`Fault`].
pub fn capture_string(filter: &BacktraceFilter) -> String {
    if EnvOptions::get().disabled {
        return String::new();
    }
    Backtrace::capture(filter)
        .map(|backtrace| backtrace.to_fault_text(filter.show_full_path))
        .unwrap_or_default()
}

/// Constructors that build a [`Fault`] with a freshly captured backtrace.
///
/// The capture uses [`BacktraceFilter::from_env`].
pub trait CapturedFault: Sized {
    /// Like [`Fault::new`], with the current backtrace.
    fn captured(message: impl Into<String>) -> Self;

    /// Like [`Fault::with_caller`], with the current backtrace.
    fn captured_with_caller(message: impl Into<String>, caller: CallerId) -> Self;

    /// Like [`Fault::check_failed`], with the current backtrace.
    ///
    /// ```rust
    /// use faultstack::Fault;
    /// use faultstack_backtrace::CapturedFault;
    ///
    /// let fault = Fault::check_failed_captured("conv.rs", 40, "groups > 0", "");
    /// assert_eq!(fault.concise_message(), "groups > 0 CHECK FAILED at conv.rs:40");
    /// ```
    fn check_failed_captured(
        file: &str,
        line: u32,
        condition: &str,
        message: impl Into<String>,
    ) -> Self;
}

impl CapturedFault for Fault {
    fn captured(message: impl Into<String>) -> Self {
        Fault::new(message, capture_string(&BacktraceFilter::from_env()))
    }

    fn captured_with_caller(message: impl Into<String>, caller: CallerId) -> Self {
        Fault::with_caller(
            message,
            capture_string(&BacktraceFilter::from_env()),
            caller,
        )
    }

    fn check_failed_captured(
        file: &str,
        line: u32,
        condition: &str,
        message: impl Into<String>,
    ) -> Self {
        Fault::check_failed(
            file,
            line,
            condition,
            message,
            capture_string(&BacktraceFilter::from_env()),
        )
    }
}

/// Creates a [`Fault`] with a captured backtrace.
///
/// The arguments are interpreted like those of [`format!()`].
///
/// ```rust
/// let fault = faultstack_backtrace::fault_with_backtrace!("bad stride {}", 0);
/// assert_eq!(fault.concise_message(), "bad stride 0");
/// ```
#[macro_export]
macro_rules! fault_with_backtrace {
    ($($arg:tt)+) => {
        <$crate::faultstack::Fault as $crate::CapturedFault>::captured(
            ::std::format!($($arg)+)
        )
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_function_name() {
        assert_eq!(get_function_name("faultstack::fault::Fault::new"), "new");
        assert_eq!(
            get_function_name("<alloc::vec::Vec<T> as core::ops::drop::Drop>::drop"),
            "drop"
        );
        assert_eq!(
            get_function_name("kernels::gather::{{closure}}"),
            "{{closure}}"
        );
        assert_eq!(get_function_name("main"), "main");
    }

    #[test]
    fn test_env_parsing() {
        assert_eq!(EnvOptions::parse(None, None), EnvOptions::default());
        assert_eq!(
            EnvOptions::parse(Some("full"), None),
            EnvOptions {
                rust_backtrace_full: true,
                show_full_path: true,
                disabled: false,
            }
        );
        assert_eq!(
            EnvOptions::parse(Some("1"), Some("FULL_PATHS, off")),
            EnvOptions {
                rust_backtrace_full: false,
                show_full_path: true,
                disabled: true,
            }
        );
    }

    #[test]
    fn test_std_path_is_recognized() {
        let path = FramePath::from_path_str(
            "/rustc/0123456789abcdef0123456789abcdef01234567/library/std/src/rt.rs".to_string(),
        );
        assert_eq!(path.crate_name.as_deref(), Some("std"));
        let split = path.split_path.unwrap();
        assert_eq!(split.prefix_kind, "RUST_SRC");
        assert_eq!(split.suffix, "std/src/rt.rs");
    }

    #[test]
    fn test_registry_path_is_recognized() {
        let path = FramePath::from_path_str(
            "/home/u/.cargo/registry/src/index.crates.io-1949cf8c6b5b557f/rayon-core-1.12.1/src/job.rs"
                .to_string(),
        );
        assert_eq!(path.crate_name.as_deref(), Some("rayon-core"));
        let split = path.split_path.unwrap();
        assert_eq!(split.prefix_kind, "CARGO");
        assert_eq!(split.suffix, "rayon-core-1.12.1/src/job.rs");
    }

    #[test]
    fn test_own_path_is_recognized() {
        let raw = format!("{}/src/lib.rs", env!("CARGO_MANIFEST_DIR"));
        let path = FramePath::from_path_str(raw.clone());
        assert_eq!(path.raw_path, raw);
        assert_eq!(path.crate_name.as_deref(), Some("faultstack-backtrace"));
        let split = path.split_path.unwrap();
        assert_eq!(split.prefix_kind, "FAULTSTACK");
        assert!(split.suffix.ends_with("/src/lib.rs"));
        assert!(!split.suffix.starts_with('/'));
        assert_eq!(format!("{}/{}", split.prefix, split.suffix), raw);

        let core = format!(
            "{}/src/fault.rs",
            faultstack::__private::FAULTSTACK_MANIFEST_DIR
        );
        let path = FramePath::from_path_str(core);
        assert_eq!(path.crate_name.as_deref(), Some("faultstack"));
    }

    #[test]
    fn test_sibling_directory_is_not_own_crate() {
        let raw = format!("{}-extra/src/lib.rs", env!("CARGO_MANIFEST_DIR"));
        assert!(FramePath::from_path_str(raw).crate_name.is_none());
        let raw = format!("{}/tests/capture.rs", env!("CARGO_MANIFEST_DIR"));
        assert!(FramePath::from_path_str(raw).crate_name.is_none());
    }

    #[inline(never)]
    fn load_checkpoint() -> Fault {
        Fault::captured("checkpoint header is truncated")
    }

    #[test]
    fn test_captured_backtrace_starts_at_raise_site() {
        if EnvOptions::get().rust_backtrace_full {
            return;
        }
        let fault = load_checkpoint();
        // Empty without debug info or with FAULTSTACK_BACKTRACE=off.
        let Some(first) = fault.backtrace().lines().next() else {
            return;
        };
        let function = first.split(" - ").next().unwrap_or(first).trim();
        for internal in ["trace", "capture", "capture_string", "captured"] {
            assert_ne!(function, internal, "backtrace starts inside faultstack: {first}");
        }
        assert!(fault.backtrace().contains("load_checkpoint"));
    }

    #[test]
    fn test_unknown_path() {
        let path = FramePath::from_path_str("/opt/vendor/blas.c".to_string());
        assert!(path.crate_name.is_none());
        assert!(path.split_path.is_none());
    }

    fn frame(sym: &str, path: &str, lineno: u32) -> BacktraceEntry {
        BacktraceEntry::Frame(Frame {
            sym_demangled: sym.to_string(),
            frame_path: Some(FramePath::from_path_str(path.to_string())),
            lineno: Some(lineno),
        })
    }

    #[test]
    fn test_display_layout() {
        let backtrace = Backtrace {
            entries: vec![
                frame("app::load", "/build/src/load.rs", 12),
                BacktraceEntry::OmittedFrames {
                    count: 3,
                    skipped_crate: "rayon-core",
                },
                frame("app::main", "/build/src/main.rs", 4),
            ],
            total_omitted_frames: 5,
        };

        assert_eq!(
            backtrace.to_string(),
            "load - /build/src/load.rs:12\n\
             ... omitted 3 frame(s) from crate 'rayon-core' ...\n\
             main - /build/src/main.rs:4\n\
             note: 5 frame(s) omitted. For a complete backtrace, set RUST_BACKTRACE=full."
        );
    }

    #[test]
    fn test_display_shortens_known_prefixes() {
        let backtrace = Backtrace {
            entries: vec![frame(
                "std::rt::lang_start",
                "/rustc/0123456789abcdef0123456789abcdef01234567/library/std/src/rt.rs",
                9,
            )],
            total_omitted_frames: 0,
        };
        assert_eq!(
            backtrace.to_fault_text(false),
            "lang_start - [..]/std/src/rt.rs:9"
        );
        assert!(backtrace.to_fault_text(true).contains("/rustc/0123456789abcdef"));
    }

    #[test]
    fn test_trim_final_entries() {
        let mut entries = vec![
            frame("app::main", "/build/src/main.rs", 4),
            frame(
                "std::rt::lang_start",
                "/rustc/0123456789abcdef0123456789abcdef01234567/library/std/src/rt.rs",
                9,
            ),
            BacktraceEntry::OmittedFrames {
                count: 2,
                skipped_crate: "std",
            },
        ];
        let omitted = trim_final_entries(&mut entries, &BacktraceFilter::DEFAULT);
        assert_eq!(omitted, 3);
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_max_entry_count_zero_omits_everything() {
        let filter = BacktraceFilter {
            max_entry_count: 0,
            ..BacktraceFilter::FULL
        };
        if let Some(backtrace) = Backtrace::capture(&filter) {
            assert!(backtrace.entries.is_empty());
            assert!(backtrace.total_omitted_frames > 0);
            assert!(backtrace.to_string().starts_with("note: "));
        }
    }

    #[test]
    fn test_captured_fault_keeps_concise_message_clean() {
        let fault = Fault::captured("boom");
        assert_eq!(fault.concise_message(), "boom");
        assert!(fault.full_message().starts_with("boom"));
        let caller = CallerId::new(7);
        assert_eq!(Fault::captured_with_caller("boom", caller).caller(), caller);
    }
}
