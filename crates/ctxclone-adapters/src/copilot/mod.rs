mod io;
mod mapper;
mod schema;

pub use io::{
    extract_copilot_header, parse_copilot_entries, parse_copilot_session, read_workspace_folder,
    render_copilot_session, CopilotHeader,
};
