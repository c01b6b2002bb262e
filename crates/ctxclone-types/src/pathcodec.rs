//! Path codec (C2): encode/decode project paths to/from the Claude Code
//! `projects/<encodedFolder>` naming, plus the display-only decode.
//!
//! Encoding is lossless (every `/` becomes `-`, including the leading one).
//! Decoding is lossy: an original path segment containing a literal `-`
//! cannot be distinguished from a `/` substitution, so the decoded form is
//! display-only. Callers must always keep the original `folder` string for
//! filesystem operations — see `ProjectRef` in `domain::project`.

/// Encode an absolute filesystem path into the on-disk folder name Claude
/// Code uses under `projects/`.
pub fn encode_claude_folder(cwd: &str) -> String {
    cwd.replace('/', "-")
}

/// Best-effort, lossy decode of an encoded folder name back into a
/// human-readable path. Not guaranteed to round-trip; display only.
pub fn decode_claude_folder(folder: &str) -> String {
    folder.replace('-', "/")
}
