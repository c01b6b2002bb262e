mod io;
mod mapper;
mod schema;

pub use io::{
    extract_claude_header, parse_claude_entries, parse_claude_session, render_claude_session,
    ClaudeHeader,
};
