//! Help text constants for es-glance commands.

/// Help text displayed for the /help command.
pub const HELP_TEXT: &str = r#"Available commands:
  <question>                 - Draft a query from a natural-language question
  /ask <question>            - Same as above
  /help                      - Show this help message
  /quit, /exit               - Exit the application

Connection commands:
  /connect <url> [user [password]] - Connect to a search store
  /indices                   - List collections
  /use <collection>          - Select a collection
  /disconnect                - Drop the current connection
  /fields [collection...]    - Show the selected collection's fields, or load several

Draft commands:
  /show                      - Show the current query draft
  /edit <text>               - Replace the draft
  /append <text>             - Append a line to the draft
  /run                       - Execute the draft

Results:
  /sample [rows]             - Show the first documents (1-200, default 10)
  /flatten on|off            - Expose nested fields as dotted columns
  /export [path]             - Write the results as CSV
  /status                    - Show connection, draft and result state"#;
